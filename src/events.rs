use crate::state::Position3D;
use serde::Serialize;

/// Which deviation a cue corrects. Priority order on a tick is
/// position, then alignment, then tempo; at most one fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceKind {
    Position,
    Alignment,
    Tempo,
    Confirmation,
}

/// Every sound the engine can make. Each label maps to a fixed
/// generator recipe in the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CueLabel {
    Left,
    Right,
    Up,
    Down,
    Forward,
    Back,
    RotateLeft,
    RotateRight,
    SlowDown,
    SpeedUp,
    Confirmation,
    Startup,
    Shutdown,
}

impl CueLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CueLabel::Left => "left",
            CueLabel::Right => "right",
            CueLabel::Up => "up",
            CueLabel::Down => "down",
            CueLabel::Forward => "forward",
            CueLabel::Back => "back",
            CueLabel::RotateLeft => "rotate_left",
            CueLabel::RotateRight => "rotate_right",
            CueLabel::SlowDown => "slow_down",
            CueLabel::SpeedUp => "speed_up",
            CueLabel::Confirmation => "confirmation",
            CueLabel::Startup => "startup",
            CueLabel::Shutdown => "shutdown",
        }
    }

    /// Unit direction the cue should appear to come from.
    pub fn direction(&self) -> Position3D {
        const DIAG: f32 = std::f32::consts::FRAC_1_SQRT_2;
        match self {
            CueLabel::Left => Position3D::new(-1.0, 0.0, 0.0),
            CueLabel::Right => Position3D::new(1.0, 0.0, 0.0),
            CueLabel::Up => Position3D::new(0.0, 1.0, 0.0),
            CueLabel::Down => Position3D::new(0.0, -1.0, 0.0),
            CueLabel::Forward => Position3D::new(0.0, 0.0, 1.0),
            CueLabel::Back => Position3D::new(0.0, 0.0, -1.0),
            CueLabel::RotateLeft => Position3D::new(-DIAG, 0.0, DIAG),
            CueLabel::RotateRight => Position3D::new(DIAG, 0.0, DIAG),
            _ => Position3D::new(0.0, 0.0, 1.0),
        }
    }
}

/// One correction selected by a controller tick, ready for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuidanceEvent {
    pub kind: GuidanceKind,
    pub label: CueLabel,
    /// Spatialization target, listener-relative.
    pub target: Position3D,
    /// Distance in meters used for attenuation. Position cues carry the
    /// live position error; other cues sit at a nominal one meter.
    pub distance: f32,
}

impl GuidanceEvent {
    pub fn new(kind: GuidanceKind, label: CueLabel, distance: f32) -> Self {
        Self {
            kind,
            label,
            target: label.direction(),
            distance,
        }
    }

    pub fn startup() -> Self {
        Self::new(GuidanceKind::Confirmation, CueLabel::Startup, 1.0)
    }

    pub fn shutdown() -> Self {
        Self::new(GuidanceKind::Confirmation, CueLabel::Shutdown, 1.0)
    }

    pub fn confirmation() -> Self {
        Self::new(GuidanceKind::Confirmation, CueLabel::Confirmation, 1.0)
    }
}
