//! Camera / culling seam.
//!
//! Frustum math lives with the caller; the core only asks whether a box is
//! visible and where the viewer is.

use glam::Vec3;

use crate::types::CameraType;

/// External view provider.
pub trait ViewCamera {
  /// Viewer position in world space.
  fn position(&self) -> Vec3;

  /// Detail radius; larger values keep more detail at a distance.
  fn view_radius(&self) -> f32;

  /// Visibility slot this camera records into.
  fn camera_type(&self) -> CameraType;

  /// Whether the axis-aligned box `min..max` intersects the view volume.
  fn is_box_visible(&self, min: Vec3, max: Vec3) -> bool;
}
