//! roam_terrain - engine independent ROAM heightfield tessellation
//!
//! Real-time Optimally Adapting Meshes: the terrain is cut into square
//! patches, each covered by two right isosceles base triangles. Every frame
//! the base triangles are split recursively where the precomputed height
//! variance, weighted by camera distance, exceeds a threshold. Forced splits
//! keep neighboring triangles (inside and across patches) crack-free.
//!
//! # Features
//!
//! - **Node pools**: one fixed-size arena per worker and pass kind, reset per
//!   frame; exhaustion degrades detail instead of failing
//! - **Variance trees**: implicit binary trees of per-triangle height error,
//!   rebuilt only for patches whose heights changed
//! - **Concurrent passes**: normal and shadow meshes update side by side on
//!   the rayon pool
//!
//! # Example
//!
//! ```ignore
//! use roam_terrain::{GridHeightMap, PassKind, RoamTerrain, TerrainConfig};
//!
//! let heights = GridHeightMap::from_fn(512, 512, |x, z| terrain_height(x, z));
//! let mut terrain = RoamTerrain::new(heights, TerrainConfig::default())?;
//!
//! let stats = terrain.update(PassKind::Normal, &camera, frame);
//! for patch in terrain.mesh(PassKind::Normal).patches() {
//!   upload(patch.buffers());
//! }
//! ```

pub mod camera;
pub mod config;
pub mod constants;
pub mod error;
pub mod heightmap;
pub mod types;

// Triangle bintrees, node pools and variance
pub mod tritree;

// Patch grid and per-frame orchestration
pub mod mesh;
pub mod patch;
pub mod terrain;

pub mod metrics;
pub mod render_mode;

#[cfg(test)]
mod test_utils;

// Re-export commonly used items
pub use camera::ViewCamera;
pub use config::{LodConfig, PoolConfig, RetessellateConfig, TerrainConfig};
pub use constants::{PATCH_SIZE, VARIANCE_DEPTH};
pub use error::TerrainError;
pub use heightmap::{GridHeightMap, HeightMap};
pub use mesh::{RoamMesh, TessellationStats};
pub use patch::{Patch, PatchTessellation, PoolBinding};
pub use render_mode::{render_mode, switch_render_mode, RenderMode};
pub use terrain::RoamTerrain;
pub use tritree::{NodeId, PoolRegistry, TriCorners, TriNodePool, TriTreeNode};
pub use types::{CameraType, MeshBuffers, PassKind, Rect};
