//! Patch layout and tree-addressing constants.
//!
//! # Patch Layout
//!
//! ```text
//!   (x, z)                  (x+S, z)
//!     A────────────────────────R, L'
//!     │                     ╱  │
//!     │   base left      ╱     │      S = PATCH_SIZE heightmap quads
//!     │               ╱        │      (S + 1)² corner samples / vertices
//!     │            ╱           │
//!     │         ╱              │      base left:  L=(x, z+S) R=(x+S, z) A=(x, z)
//!     │      ╱     base right  │      base right: L'=(x+S, z) R'=(x, z+S) A'=(x+S, z+S)
//!     │   ╱                    │
//!   L, R'──────────────────────A'
//!   (x, z+S)                (x+S, z+S)
//! ```
//!
//! The shared diagonal is the hypotenuse of both base triangles, so the two
//! roots are each other's base neighbor (a diamond).
//!
//! # Tree Addressing
//!
//! Variance trees are flat arrays indexed by binary path: the root is address
//! 1, the children of address `a` are `2a` (left) and `2a + 1` (right). A
//! node at depth `d` (root depth 1) has an address in `[2^(d-1), 2^d)`, so an
//! array of `2^VARIANCE_DEPTH` slots holds every node down to depth
//! `VARIANCE_DEPTH`. Slot 0 is never used.

/// Heightmap quads per patch side.
pub const PATCH_SIZE: i32 = 128;

/// Vertices per patch side (corner samples).
pub const PATCH_VERTS: i32 = PATCH_SIZE + 1;

/// Total vertices per patch.
pub const PATCH_VERTEX_COUNT: usize = (PATCH_VERTS * PATCH_VERTS) as usize;

/// Depth of the variance tree; should be near sqrt(PATCH_SIZE) + 1.
pub const VARIANCE_DEPTH: u32 = 12;

/// Slots per variance tree (one per addressable node, slot 0 unused).
pub const VARIANCE_NODES: usize = 1 << VARIANCE_DEPTH;

/// Address of a base triangle in its variance tree.
pub const ROOT_ADDRESS: usize = 1;

/// Hypotenuse span (in grid units) below which variance is not refined.
///
/// Variance is only computed down to 4x4 blocks; finer triangles keep a
/// variance of zero and are never split by error.
pub const MIN_VARIANCE_SPAN: i32 = 4;

/// Node slots reserved per pool.
///
/// A reasonable baseline for most maps but not guaranteed to suffice at every
/// detail level on every map; exhaustion degrades gracefully.
pub const NEW_POOL_SIZE: usize = 1 << 20;

/// Pool size that simulates fast exhaustion (debugging).
pub const DEBUG_POOL_SIZE: usize = 1 << 2;

/// Check whether a variance-tree address has a storage slot.
#[inline(always)]
pub const fn is_addressable(addr: usize) -> bool {
  addr >= ROOT_ADDRESS && addr < VARIANCE_NODES
}

/// Depth of a variance-tree address (root = 1).
#[inline(always)]
pub const fn address_depth(addr: usize) -> u32 {
  usize::BITS - addr.leading_zeros()
}

/// Grid-vertex index of a world grid position inside the patch at `origin`.
#[inline(always)]
pub const fn vertex_index(origin_x: i32, origin_z: i32, x: i32, z: i32) -> u32 {
  ((z - origin_z) * PATCH_VERTS + (x - origin_x)) as u32
}
