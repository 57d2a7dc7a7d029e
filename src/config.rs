use crate::settings::{ActivationMode, AdjustMode, OwnershipPolicy, Settings};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rate-governor",
    version,
    about = "Terminal demo of a rate controller sharing a clock with a simulated host"
)]
pub struct Config {
    /// Settings file (key=value); defaults to $XDG_CONFIG_HOME/rate_governor/settings.txt
    #[arg(long)]
    pub settings: Option<PathBuf>,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Let the simulated host start cutscenes on its own.
    #[arg(long, default_value_t = false)]
    pub chaos: bool,

    #[arg(long)]
    pub chaos_seed: Option<u64>,

    #[arg(long, default_value_t = 8.0)]
    pub chaos_gap_secs: f32,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the effective settings and exit.
    #[arg(long, default_value_t = false)]
    pub dump_settings: bool,

    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    #[arg(long, value_enum)]
    pub activation: Option<ActivationArg>,

    #[arg(long, value_enum)]
    pub adjust: Option<AdjustArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Absorb,
    #[value(alias = "in_charge", alias = "incharge")]
    InCharge,
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActivationArg {
    Toggle,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AdjustArg {
    #[value(alias = "continuous")]
    Scale,
    #[value(alias = "preset")]
    Presets,
}

impl From<PolicyArg> for OwnershipPolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Absorb => Self::Absorb,
            PolicyArg::InCharge => Self::InCharge,
            PolicyArg::Overwrite => Self::Overwrite,
        }
    }
}

impl From<ActivationArg> for ActivationMode {
    fn from(v: ActivationArg) -> Self {
        match v {
            ActivationArg::Toggle => Self::Toggle,
            ActivationArg::Hold => Self::Hold,
        }
    }
}

impl From<AdjustArg> for AdjustMode {
    fn from(v: AdjustArg) -> Self {
        match v {
            AdjustArg::Scale => Self::Scale,
            AdjustArg::Presets => Self::Presets,
        }
    }
}

impl Config {
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings
            .clone()
            .or_else(crate::settings::settings_storage_path)
    }

    /// Command-line flags win over the settings file.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(p) = self.policy {
            settings.policy = p.into();
        }
        if let Some(a) = self.activation {
            settings.activation = a.into();
        }
        if let Some(a) = self.adjust {
            settings.adjust = a.into();
        }
    }
}
