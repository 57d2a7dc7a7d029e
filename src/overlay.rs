use crate::controller::Snapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLabel {
    pub text: String,
    /// 1.0 while control is active, fading with the preview otherwise.
    pub alpha: f32,
}

pub fn hud_label(snapshot: &Snapshot) -> Option<OverlayLabel> {
    if !snapshot.is_visible() {
        return None;
    }
    let alpha = if snapshot.active {
        1.0
    } else {
        snapshot.preview_fraction.clamp(0.0, 1.0)
    };
    Some(OverlayLabel {
        text: format!("{}%", snapshot.rounded_percentage()),
        alpha,
    })
}

/// Grey level for a label drawn over a black terminal background.
pub fn label_grey(alpha: f32) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}
