use crate::preset::{DEFAULT_PRESET_EPSILON, PresetSet};
use crate::preview::DEFAULT_PREVIEW_SECS;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_RECONCILE_EPSILON: f32 = 0.0001;
pub const DEFAULT_CAPTURE_EPSILON: f32 = 0.05;
/// 1/√√2: four presses halve (or double) the multiplier.
pub const DEFAULT_SCALE_FACTOR: f32 = 0.840_896_4;
pub const DEFAULT_NEUTRAL_RATE: f32 = 1.0;
pub const DEFAULT_METRICS_INTERVAL_SECS: f32 = 1.0;
pub const DEFAULT_INITIAL_PERCENT: f32 = 30.0;
pub const DEFAULT_PRESETS: &str = "30,50,65,80";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationMode {
    #[default]
    Toggle,
    Hold,
}

impl ActivationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toggle" => Some(Self::Toggle),
            "hold" => Some(Self::Hold),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Hold => "hold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdjustMode {
    #[default]
    Scale,
    Presets,
}

impl AdjustMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scale" | "continuous" => Some(Self::Scale),
            "presets" | "preset" => Some(Self::Presets),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scale => "scale",
            Self::Presets => "presets",
        }
    }
}

/// How the controller treats values it did not write itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnershipPolicy {
    /// Adopt the external value as the new baseline.
    #[default]
    Absorb,
    /// Tolerate host values at or below the target, clamp anything above it.
    InCharge,
    /// Keep the baseline captured at activation and rewrite the target every tick.
    Overwrite,
}

impl OwnershipPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absorb" => Some(Self::Absorb),
            "in_charge" | "in-charge" | "incharge" => Some(Self::InCharge),
            "overwrite" => Some(Self::Overwrite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absorb => "absorb",
            Self::InCharge => "in_charge",
            Self::Overwrite => "overwrite",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub toggle_control: String,
    pub increase_control: String,
    pub decrease_control: String,
    pub activation: ActivationMode,
    pub adjust: AdjustMode,
    pub presets: PresetSet,
    pub scale_factor: f32,
    pub initial_percent: f32,
    pub preview_secs: f32,
    pub policy: OwnershipPolicy,
    pub reconcile_epsilon: f32,
    pub preset_epsilon: f32,
    pub capture_epsilon: f32,
    pub neutral_rate: f32,
    pub metrics_interval_secs: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            toggle_control: "space".to_string(),
            increase_control: "up".to_string(),
            decrease_control: "down".to_string(),
            activation: ActivationMode::Toggle,
            adjust: AdjustMode::Scale,
            presets: PresetSet::parse(DEFAULT_PRESETS),
            scale_factor: DEFAULT_SCALE_FACTOR,
            initial_percent: DEFAULT_INITIAL_PERCENT,
            preview_secs: DEFAULT_PREVIEW_SECS,
            policy: OwnershipPolicy::Absorb,
            reconcile_epsilon: DEFAULT_RECONCILE_EPSILON,
            preset_epsilon: DEFAULT_PRESET_EPSILON,
            capture_epsilon: DEFAULT_CAPTURE_EPSILON,
            neutral_rate: DEFAULT_NEUTRAL_RATE,
            metrics_interval_secs: DEFAULT_METRICS_INTERVAL_SECS,
        }
    }
}

/// A settings entry that was skipped in favour of its default.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsIssue {
    Syntax { line: usize, message: String },
    UnknownKey { line: usize, key: String },
    InvalidValue { line: usize, key: &'static str, value: String },
    RejectedPreset { line: usize, entry: String },
}

impl fmt::Display for SettingsIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { line, message } => write!(f, "line {line}: {message}"),
            Self::UnknownKey { line, key } => write!(f, "line {line}: unknown key '{key}'"),
            Self::InvalidValue { line, key, value } => {
                write!(f, "line {line}: invalid value for {key}: '{value}', using default")
            }
            Self::RejectedPreset { line, entry } => {
                write!(f, "line {line}: skipped preset entry '{entry}'")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    Io(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub issues: Vec<SettingsIssue>,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<LoadedSettings, SettingsError> {
        let Some(path) = path else {
            return Ok(LoadedSettings {
                settings: Self::default(),
                issues: Vec::new(),
            });
        };

        let text = match std::fs::read_to_string(path) {
            Ok(v) => v,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedSettings {
                    settings: Self::default(),
                    issues: Vec::new(),
                });
            }
            Err(err) => return Err(SettingsError::Io(err.to_string())),
        };

        Ok(Self::parse(&text))
    }

    /// Parses `key=value` lines. Anything malformed keeps its default and is
    /// reported as an issue; parsing itself never fails.
    pub fn parse(text: &str) -> LoadedSettings {
        let mut settings = Self::default();
        let mut issues = Vec::new();

        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key_raw, value_raw)) = line.split_once('=') else {
                issues.push(SettingsIssue::Syntax {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
                continue;
            };
            let key = key_raw.trim();
            let value = value_raw.trim();
            let invalid = |key: &'static str| SettingsIssue::InvalidValue {
                line: line_no,
                key,
                value: value.to_string(),
            };

            match key {
                "toggle_control" => match parse_control(value) {
                    Some(v) => settings.toggle_control = v,
                    None => issues.push(invalid("toggle_control")),
                },
                "increase_control" => match parse_control(value) {
                    Some(v) => settings.increase_control = v,
                    None => issues.push(invalid("increase_control")),
                },
                "decrease_control" => match parse_control(value) {
                    Some(v) => settings.decrease_control = v,
                    None => issues.push(invalid("decrease_control")),
                },
                "activation" => match ActivationMode::parse(value) {
                    Some(v) => settings.activation = v,
                    None => issues.push(invalid("activation")),
                },
                "adjust" => match AdjustMode::parse(value) {
                    Some(v) => settings.adjust = v,
                    None => issues.push(invalid("adjust")),
                },
                "policy" => match OwnershipPolicy::parse(value) {
                    Some(v) => settings.policy = v,
                    None => issues.push(invalid("policy")),
                },
                "presets" => {
                    let (presets, rejected) = PresetSet::parse_reporting(value);
                    for entry in rejected {
                        issues.push(SettingsIssue::RejectedPreset {
                            line: line_no,
                            entry,
                        });
                    }
                    settings.presets = presets;
                }
                "scale_factor" => match parse_f32_in(value, |v| v > 0.0 && v < 1.0) {
                    Some(v) => settings.scale_factor = v,
                    None => issues.push(invalid("scale_factor")),
                },
                "initial_percent" => match parse_f32_in(value, |v| v > 0.0) {
                    Some(v) => settings.initial_percent = v,
                    None => issues.push(invalid("initial_percent")),
                },
                "preview_secs" => match parse_f32_in(value, |v| v > 0.0) {
                    Some(v) => settings.preview_secs = v,
                    None => issues.push(invalid("preview_secs")),
                },
                "reconcile_epsilon" => match parse_f32_in(value, |v| v > 0.0 && v < 1.0) {
                    Some(v) => settings.reconcile_epsilon = v,
                    None => issues.push(invalid("reconcile_epsilon")),
                },
                "preset_epsilon" => match parse_f32_in(value, |v| v >= 0.0 && v < 1.0) {
                    Some(v) => settings.preset_epsilon = v,
                    None => issues.push(invalid("preset_epsilon")),
                },
                "capture_epsilon" => match parse_f32_in(value, |v| v >= 0.0 && v < 1.0) {
                    Some(v) => settings.capture_epsilon = v,
                    None => issues.push(invalid("capture_epsilon")),
                },
                "neutral_rate" => match parse_f32_in(value, |v| v > 0.0) {
                    Some(v) => settings.neutral_rate = v,
                    None => issues.push(invalid("neutral_rate")),
                },
                "metrics_interval_secs" => match parse_f32_in(value, |v| v > 0.0) {
                    Some(v) => settings.metrics_interval_secs = v,
                    None => issues.push(invalid("metrics_interval_secs")),
                },
                _ => issues.push(SettingsIssue::UnknownKey {
                    line: line_no,
                    key: key.to_string(),
                }),
            }
        }

        LoadedSettings { settings, issues }
    }

    pub fn to_text(&self) -> String {
        [
            "# rate_governor settings v1".to_string(),
            format!("toggle_control={}", self.toggle_control),
            format!("increase_control={}", self.increase_control),
            format!("decrease_control={}", self.decrease_control),
            format!("activation={}", self.activation.as_str()),
            format!("adjust={}", self.adjust.as_str()),
            format!("presets={}", self.presets.to_text()),
            format!("scale_factor={}", self.scale_factor),
            format!("initial_percent={}", self.initial_percent),
            format!("preview_secs={}", self.preview_secs),
            format!("policy={}", self.policy.as_str()),
            format!("reconcile_epsilon={}", self.reconcile_epsilon),
            format!("preset_epsilon={}", self.preset_epsilon),
            format!("capture_epsilon={}", self.capture_epsilon),
            format!("neutral_rate={}", self.neutral_rate),
            format!("metrics_interval_secs={}", self.metrics_interval_secs),
        ]
        .join("\n")
    }
}

impl LoadedSettings {
    pub fn log_issues(&self) {
        for issue in &self.issues {
            warn!(%issue, "settings entry ignored");
        }
    }
}

pub fn settings_storage_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("rate_governor").join("settings.txt"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("rate_governor")
            .join("settings.txt"),
    )
}

fn parse_control(raw: &str) -> Option<String> {
    let v = raw.trim().to_ascii_lowercase();
    if v.is_empty() || v.contains(char::is_whitespace) {
        return None;
    }
    Some(v)
}

fn parse_f32_in(raw: &str, valid: impl Fn(f32) -> bool) -> Option<f32> {
    let v = raw.trim().parse::<f32>().ok()?;
    (v.is_finite() && valid(v)).then_some(v)
}
