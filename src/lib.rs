pub mod app;
pub mod config;
pub mod controller;
pub mod host;
pub mod input;
pub mod metrics;
pub mod overlay;
pub mod preset;
pub mod preview;
pub mod session;
pub mod settings;
pub mod sim;
pub mod terminal;
