use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// A point in meters relative to the listener's head.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl Sub for Position3D {
    type Output = Position3D;

    fn sub(self, rhs: Position3D) -> Position3D {
        Position3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Listener head rotation as a unit quaternion. Identity when head
/// tracking is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Orientation {
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotate a vector by this quaternion (v' = q v q*).
    pub fn rotate(&self, v: Position3D) -> Position3D {
        // t = 2 * (q.xyz × v); v' = v + w*t + q.xyz × t
        let tx = 2.0 * (self.y * v.z - self.z * v.y);
        let ty = 2.0 * (self.z * v.x - self.x * v.z);
        let tz = 2.0 * (self.x * v.y - self.y * v.x);
        Position3D::new(
            v.x + self.w * tx + (self.y * tz - self.z * ty),
            v.y + self.w * ty + (self.z * tx - self.x * tz),
            v.z + self.w * tz + (self.x * ty - self.y * tx),
        )
    }

    /// Rotate a world-anchored vector into the listener's frame.
    pub fn rotate_inverse(&self, v: Position3D) -> Position3D {
        self.conjugate().rotate(v)
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::identity()
    }
}

/// Latest snapshot of the tracked swing. Single writer (the tracking
/// collaborator), read once per controller tick behind one lock so the
/// three fields never tear.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GuidanceState {
    pub club_position: Position3D,
    pub target_alignment_deg: f32,
    pub swing_tempo: f32,
}

/// Acoustic environment the player is in; selects an effects profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Outdoor,
    Indoor,
    DrivingRange,
    PuttingGreen,
}

/// Read-only observability snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineStats {
    pub active: bool,
    pub last_event_kind: Option<crate::events::GuidanceKind>,
    pub processing_time_ms: f32,
    pub head_tracking_available: bool,
    pub environment: Environment,
    pub write_failures: u64,
}
