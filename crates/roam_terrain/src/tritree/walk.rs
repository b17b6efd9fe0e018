//! Depth-first leaf traversal.

use smallvec::SmallVec;

use super::corners::TriCorners;
use super::node::NodeId;
use super::pool::TriNodePool;

/// Visit every leaf below `root` in depth-first order, left child first.
///
/// Uses an explicit stack; a bintree over one patch is at most a few dozen
/// levels deep, so the stack normally stays inline.
pub fn for_each_leaf(
  pool: &TriNodePool,
  root: NodeId,
  corners: TriCorners,
  mut visit: impl FnMut(NodeId, &TriCorners),
) {
  let mut stack: SmallVec<[(NodeId, TriCorners); 32]> = SmallVec::new();
  stack.push((root, corners));

  while let Some((tri, corners)) = stack.pop() {
    match pool[tri].children {
      Some((lc, rc)) => {
        let (left, right) = corners.children();
        stack.push((rc, right));
        stack.push((lc, left));
      }
      None => visit(tri, &corners),
    }
  }
}

/// Number of nodes (branches and leaves) below and including `root`.
pub fn count_nodes(pool: &TriNodePool, root: NodeId) -> usize {
  let mut stack: SmallVec<[NodeId; 32]> = SmallVec::new();
  stack.push(root);
  let mut count = 0;

  while let Some(tri) = stack.pop() {
    count += 1;
    if let Some((lc, rc)) = pool[tri].children {
      stack.push(rc);
      stack.push(lc);
    }
  }
  count
}
