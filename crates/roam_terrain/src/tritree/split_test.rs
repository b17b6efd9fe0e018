use glam::IVec2;

use super::*;
use crate::config::LodConfig;
use crate::constants::PATCH_SIZE;
use crate::test_utils::{assert_conforming, collect_leaves, collect_nodes, diamond};
use crate::tritree::{TriTreeNode, VarianceBuilder};

fn patch_roots(pool: &mut TriNodePool) -> [(NodeId, TriCorners); 2] {
  let (left, right) = diamond(pool);
  [
    (left, TriCorners::patch_left(IVec2::ZERO)),
    (right, TriCorners::patch_right(IVec2::ZERO)),
  ]
}

/// Descend along `path` (false = left child), splitting every node on the
/// way.
fn split_path(pool: &mut TriNodePool, root: NodeId, path: &[bool]) -> NodeId {
  let mut tri = root;
  for &go_right in path {
    assert!(split(pool, tri), "split along path should succeed");
    let (lc, rc) = pool[tri].children.unwrap();
    tri = if go_right { rc } else { lc };
  }
  tri
}

// =========================================================================
// split Tests - wiring
// =========================================================================

#[test]
fn test_split_branch_is_noop() {
  let mut pool = TriNodePool::new(16);
  let (a, _) = pool.allocate().unwrap();

  assert!(split(&mut pool, a));
  let used = pool.used();
  assert!(split(&mut pool, a), "Splitting a branch succeeds trivially");
  assert_eq!(pool.used(), used, "No allocation for an existing branch");
}

#[test]
fn test_split_isolated_leaf_links_siblings() {
  let mut pool = TriNodePool::new(16);
  let (a, _) = pool.allocate().unwrap();

  assert!(split(&mut pool, a));

  let (lc, rc) = pool[a].children.unwrap();
  assert_eq!(pool[lc].left_neighbor, Some(rc));
  assert_eq!(pool[rc].right_neighbor, Some(lc));
  assert_eq!(pool[lc].base_neighbor, None);
  assert_eq!(pool[rc].base_neighbor, None);
  assert_eq!(pool[lc].right_neighbor, None, "Border leg stays unlinked");
  assert_eq!(pool[rc].left_neighbor, None, "Border leg stays unlinked");
}

/// Splitting one half of a diamond splits the other half and cross-links
/// the four children.
#[test]
fn test_diamond_splits_together() {
  let mut pool = TriNodePool::new(16);
  let (a, b) = diamond(&mut pool);

  assert!(split(&mut pool, a));

  assert!(pool[a].is_branch());
  assert!(pool[b].is_branch(), "Diamond partner must split too");

  let (alc, arc) = pool[a].children.unwrap();
  let (blc, brc) = pool[b].children.unwrap();
  assert_eq!(pool[alc].right_neighbor, Some(brc));
  assert_eq!(pool[arc].left_neighbor, Some(blc));
  assert_eq!(pool[blc].right_neighbor, Some(arc));
  assert_eq!(pool[brc].left_neighbor, Some(alc));
  assert_eq!(pool.used(), 6);
}

/// Splitting a deep triangle forces coarser neighbors to split first.
#[test]
fn test_forced_split_keeps_mesh_conforming() {
  let mut pool = TriNodePool::new(4096);
  let roots = patch_roots(&mut pool);

  // Deep into one corner of the left half; many neighbors are coarser.
  let deep = split_path(&mut pool, roots[0].0, &[false, true, false, true, true, false, true]);
  assert!(split(&mut pool, deep));

  assert_conforming(
    &collect_leaves(&pool, &roots),
    IVec2::ZERO,
    IVec2::splat(PATCH_SIZE),
  );
}

/// A leaf's base neighbor is never a branch: coarser neighbors get relinked
/// to their children when they split.
#[test]
fn test_leaf_base_neighbors_are_leaves() {
  let mut pool = TriNodePool::new(4096);
  let roots = patch_roots(&mut pool);
  split_path(&mut pool, roots[1].0, &[true, true, false, false, true, false]);

  for &(root, _) in &roots {
    for tri in collect_nodes(&pool, root) {
      if pool[tri].is_branch() {
        continue;
      }
      if let Some(base) = pool[tri].base_neighbor {
        assert!(pool[base].is_leaf(), "Leaf {:?} has a split base neighbor", tri);
      }
    }
  }
}

// =========================================================================
// split Tests - exhaustion
// =========================================================================

fn isolated_leaf(pool: &TriNodePool, roots: &[NodeId]) -> Option<NodeId> {
  roots
    .iter()
    .flat_map(|&root| collect_nodes(pool, root))
    .find(|&tri| pool[tri].is_leaf() && pool[tri].base_neighbor.is_none())
}

/// With K free pairs left, exactly K single splits succeed; the next one
/// fails and leaves every node untouched.
#[test]
fn test_exactly_free_pairs_splits_succeed() {
  let free_pairs = 20;
  let mut pool = TriNodePool::new(2 + 2 * free_pairs);
  let (x, y) = pool.allocate().unwrap();

  for i in 0..free_pairs {
    let leaf = isolated_leaf(&pool, &[x, y]).expect("border leaf exists");
    assert!(split(&mut pool, leaf), "Split {} should succeed", i);
  }
  assert!(pool.out_of_nodes());

  let leaf = isolated_leaf(&pool, &[x, y]).expect("border leaf exists");
  let before: Vec<TriTreeNode> = (0..pool.used())
    .map(|i| pool[NodeId::from_index(i)])
    .collect();

  assert!(!split(&mut pool, leaf), "Split beyond capacity must fail");

  let after: Vec<TriTreeNode> = (0..pool.used())
    .map(|i| pool[NodeId::from_index(i)])
    .collect();
  assert_eq!(before, after, "Failed split must leave the tree unchanged");
}

/// A diamond needs two pairs; with one left neither half splits.
#[test]
fn test_diamond_split_is_atomic() {
  let mut pool = TriNodePool::new(4);
  let (a, b) = diamond(&mut pool);

  assert_eq!(pool.free_pairs(), 1);
  assert!(!split(&mut pool, a));
  assert!(pool[a].is_leaf());
  assert!(pool[b].is_leaf(), "No half-split diamond");
  assert_eq!(pool.used(), 2, "Nothing allocated");
}

// =========================================================================
// Tessellator Tests
// =========================================================================

fn filled_variance(value: f32) -> VarianceTree {
  // Pseudo-random bumps so every level has some interpolation error.
  let heights = crate::heightmap::GridHeightMap::from_fn(PATCH_SIZE, PATCH_SIZE, |x, z| {
    value * ((x * 37 + z * 91) % 17) as f32 / 16.0
  });
  let mut tree = VarianceTree::new();
  VarianceBuilder::new(&heights, &mut tree, false).build(&TriCorners::patch_left(IVec2::ZERO));
  tree
}

#[test]
fn test_zero_variance_never_splits() {
  let mut pool = TriNodePool::new(64);
  let roots = patch_roots(&mut pool);
  let variance = VarianceTree::new();

  let mut tess = Tessellator::new(&mut pool, &variance, &LodConfig::DEFAULT, 1.0);
  tess.tessellate(roots[0].0, roots[0].1);

  assert_eq!(tess.splits(), 0);
  assert_eq!(pool.used(), 2);
}

/// Rough terrain at full detail refines down to the variance depth limit and
/// stays conforming.
#[test]
fn test_full_detail_stays_conforming_and_bounded() {
  let mut pool = TriNodePool::new(1 << 16);
  let roots = patch_roots(&mut pool);
  let variance = filled_variance(10.0);

  for &(root, corners) in &roots {
    let mut tess = Tessellator::new(&mut pool, &variance, &LodConfig::DEFAULT, 1.0);
    tess.tessellate(root, corners);
    assert_eq!(tess.failed_splits(), 0);
  }

  let leaves = collect_leaves(&pool, &roots);
  assert_conforming(&leaves, IVec2::ZERO, IVec2::splat(PATCH_SIZE));
  assert!(
    leaves.iter().all(|t| t.size() >= 2),
    "Refinement stops at the variance depth (span 2)"
  );
}

/// Re-running refinement over an already refined tree changes nothing.
#[test]
fn test_repeated_tessellation_is_idempotent() {
  let mut pool = TriNodePool::new(1 << 16);
  let roots = patch_roots(&mut pool);
  let variance = filled_variance(3.0);

  let run = |pool: &mut TriNodePool| {
    for &(root, corners) in &roots {
      Tessellator::new(pool, &variance, &LodConfig::DEFAULT, 0.05).tessellate(root, corners);
    }
  };

  run(&mut pool);
  let used = pool.used();
  let snapshot: Vec<TriTreeNode> = (0..used).map(|i| pool[NodeId::from_index(i)]).collect();

  run(&mut pool);
  assert_eq!(pool.used(), used, "Second pass allocates nothing");
  let again: Vec<TriTreeNode> = (0..used).map(|i| pool[NodeId::from_index(i)]).collect();
  assert_eq!(snapshot, again, "Neighbor links unchanged");
}

/// Exhaustion is counted, not fatal, and the partial mesh is still valid.
#[test]
fn test_exhaustion_counts_failures() {
  let mut pool = TriNodePool::new(64);
  let roots = patch_roots(&mut pool);
  let variance = filled_variance(10.0);

  let mut failed = 0;
  for &(root, corners) in &roots {
    let mut tess = Tessellator::new(&mut pool, &variance, &LodConfig::DEFAULT, 1.0);
    tess.tessellate(root, corners);
    failed += tess.failed_splits();
  }

  assert!(failed > 0, "Tiny pool must run dry");
  assert!(pool.free_pairs() <= 1);
  assert_conforming(
    &collect_leaves(&pool, &roots),
    IVec2::ZERO,
    IVec2::splat(PATCH_SIZE),
  );
}
