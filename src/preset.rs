pub const MIN_PRESET_PERCENT: f32 = 1.0;
pub const MAX_PRESET_PERCENT: f32 = 1000.0;
pub const DEFAULT_PRESET_EPSILON: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

/// Ascending list of target percentages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetSet {
    values: Vec<f32>,
}

impl PresetSet {
    pub fn new(values: impl IntoIterator<Item = f32>) -> Self {
        let mut values = values
            .into_iter()
            .filter_map(sanitize_percent)
            .collect::<Vec<_>>();
        values.sort_by(|a, b| a.total_cmp(b));
        Self { values }
    }

    pub fn parse(raw: &str) -> Self {
        Self::parse_reporting(raw).0
    }

    /// Parses a comma-separated list, returning the rejected tokens alongside.
    pub fn parse_reporting(raw: &str) -> (Self, Vec<String>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match token.trim_end_matches('%').trim().parse::<f32>() {
                Ok(v) if sanitize_percent(v).is_some() => accepted.push(v),
                _ => rejected.push(token.to_string()),
            }
        }
        (Self::new(accepted), rejected)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn next(&self, current: f32, direction: Direction) -> Option<f32> {
        self.next_with_epsilon(current, direction, DEFAULT_PRESET_EPSILON)
    }

    pub fn next_with_epsilon(&self, current: f32, direction: Direction, epsilon: f32) -> Option<f32> {
        let eps = epsilon.abs();
        match direction {
            Direction::Increase => self.values.iter().copied().find(|&v| v > current + eps),
            Direction::Decrease => self.values.iter().rev().copied().find(|&v| v < current - eps),
        }
    }

    pub fn to_text(&self) -> String {
        self.values
            .iter()
            .map(|v| format_percent(*v))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn sanitize_percent(v: f32) -> Option<f32> {
    if !v.is_finite() || v <= 0.0 {
        return None;
    }
    Some(v.clamp(MIN_PRESET_PERCENT, MAX_PRESET_PERCENT))
}

fn format_percent(v: f32) -> String {
    if (v - v.round()).abs() < 1e-4 {
        format!("{}", v.round() as i64)
    } else {
        format!("{v}")
    }
}
