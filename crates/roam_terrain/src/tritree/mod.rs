//! Binary triangle trees (bintrees) for ROAM tessellation.
//!
//! Each patch is a diamond of two right-isosceles base triangles. A split
//! cuts a triangle along the line from its apex to its hypotenuse midpoint,
//! producing two half-size right triangles.
//!
//! - [`TriNodePool`] / [`PoolRegistry`]: pooled node storage, one pool per
//!   worker per pass kind.
//! - [`split`] / [`Tessellator`]: forced-split refinement driven by variance.
//! - [`VarianceBuilder`]: precomputed per-triangle error bounds.

mod corners;
mod node;
mod pool;
mod split;
mod variance;
mod walk;

pub use corners::TriCorners;
pub use node::{NodeId, TriTreeNode};
pub use pool::{current_worker, PoolRegistry, TriNodePool};
pub use split::{split, Tessellator};
pub use variance::{VarianceBuilder, VarianceTree};
pub use walk::{count_nodes, for_each_leaf};
