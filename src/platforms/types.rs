//! Placement data types

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Which layer a platform belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformLayer {
    Ground,
    Sky(usize),
}

impl PlatformLayer {
    pub fn is_ground(&self) -> bool {
        matches!(self, PlatformLayer::Ground)
    }
}

impl std::fmt::Display for PlatformLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformLayer::Ground => write!(f, "Ground"),
            PlatformLayer::Sky(i) => write!(f, "Sky {}", i + 1),
        }
    }
}

/// A platform as placed by the generator. Frozen once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedPlatform {
    pub candidate_id: String,
    pub position: Vec3,
    /// Rotation about the up axis, degrees
    pub yaw: f32,
    /// Terrain normal under the platform (ground layer only)
    pub ground_normal: Option<Vec3>,
    pub scale: f32,
    pub layer: PlatformLayer,
}

impl PlacedPlatform {
    /// Full orientation: yaw about the local up axis, with up aligned to the
    /// ground normal when there is one.
    pub fn rotation(&self) -> Quat {
        let tilt = match self.ground_normal {
            Some(normal) => Quat::from_rotation_arc(Vec3::Y, normal.normalize()),
            None => Quat::IDENTITY,
        };
        tilt * Quat::from_rotation_y(self.yaw.to_radians())
    }

    pub fn up(&self) -> Vec3 {
        self.rotation() * Vec3::Y
    }
}

/// Parameters for one sky layer's scan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub index: usize,
    pub base_height: f32,
    pub height_variance: f32,
    pub spawn_chance: f32,
    pub spawn_entropy: f32,
}

/// One spawn draw in a sky layer scan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnTrial {
    /// Acceptance probability at the time of the draw
    pub chance: f32,
    pub accepted: bool,
}

/// What happened while scanning one sky layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkyLayerReport {
    pub layer: LayerDescriptor,
    pub trials: Vec<SpawnTrial>,
    /// Indices into the arena's platform list
    pub placed: Vec<usize>,
}

/// Start and exit platforms. Each is assigned at most once; later writes are
/// ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaMarkers {
    start: Option<usize>,
    exit: Option<usize>,
}

impl ArenaMarkers {
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    pub fn exit(&self) -> Option<usize> {
        self.exit
    }

    /// Returns whether the write took effect.
    pub fn assign_start(&mut self, platform: usize) -> bool {
        assign_once(&mut self.start, platform)
    }

    /// Returns whether the write took effect.
    pub fn assign_exit(&mut self, platform: usize) -> bool {
        assign_once(&mut self.exit, platform)
    }
}

fn assign_once(slot: &mut Option<usize>, value: usize) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_first_write_wins() {
        let mut markers = ArenaMarkers::default();
        assert!(markers.assign_start(3));
        assert!(!markers.assign_start(7));
        assert_eq!(markers.start(), Some(3));
        assert_eq!(markers.exit(), None);
        assert!(markers.assign_exit(9));
        assert!(!markers.assign_exit(1));
        assert_eq!(markers.exit(), Some(9));
    }

    #[test]
    fn test_rotation_aligns_up_with_normal() {
        let normal = Vec3::new(0.3, 1.0, -0.2).normalize();
        let platform = PlacedPlatform {
            candidate_id: "ground_platform".into(),
            position: Vec3::ZERO,
            yaw: 127.0,
            ground_normal: Some(normal),
            scale: 1.0,
            layer: PlatformLayer::Ground,
        };
        assert!((platform.up() - normal).length() < 1e-5);
    }

    #[test]
    fn test_sky_platform_stays_upright() {
        let platform = PlacedPlatform {
            candidate_id: "sky_platform".into(),
            position: Vec3::new(10.0, 80.0, 10.0),
            yaw: 0.0,
            ground_normal: None,
            scale: 1.0,
            layer: PlatformLayer::Sky(2),
        };
        assert!((platform.up() - Vec3::Y).length() < 1e-6);
        assert_eq!(platform.layer.to_string(), "Sky 3");
    }
}
