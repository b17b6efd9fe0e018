//! Node pools - fixed-capacity arenas for triangle-tree nodes.
//!
//! Tessellation allocates thousands of node pairs per frame, so nodes are
//! handed out from a bump arena and never freed individually: resetting the
//! pool invalidates every node at once, whatever the tree shapes were.
//!
//! One pool exists per worker context per pass kind ([`PoolRegistry`]), so
//! the hot path never takes a lock.

use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU64, Ordering};

use super::node::{NodeId, TriTreeNode};
use crate::config::{validate_capacity, PoolConfig};
use crate::error::TerrainError;
use crate::types::PassKind;

/// Source of pool epochs, unique across all pools.
static EPOCH_COUNTER: AtomicU64 = AtomicU64::new(1);

#[inline]
fn next_epoch() -> u64 {
  EPOCH_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Bump arena of [`TriTreeNode`] slots.
///
/// The cursor only moves forward between resets. Slots are materialized
/// lazily, so a large capacity costs address space, not memory, until used.
pub struct TriNodePool {
  nodes: Vec<TriTreeNode>,
  capacity: usize,
  /// Index of the next free slot.
  next: usize,
  /// Highest cursor value seen since creation.
  peak: usize,
  /// Changes on every reset; ids issued under another epoch are stale.
  epoch: u64,
}

impl TriNodePool {
  /// Create a pool of `capacity` node slots.
  ///
  /// Odd capacities waste the last slot; use [`TriNodePool::with_config`] for
  /// validated sizes.
  pub fn new(capacity: usize) -> Self {
    Self {
      nodes: Vec::with_capacity(capacity),
      capacity,
      next: 0,
      peak: 0,
      epoch: next_epoch(),
    }
  }

  /// Create a pool from a validated configuration.
  pub fn with_config(config: &PoolConfig) -> Result<Self, TerrainError> {
    config.validate()?;
    Ok(Self::new(config.capacity))
  }

  /// Invalidate every issued node; the pool starts handing out slot 0 again.
  #[inline]
  pub fn reset(&mut self) {
    self.next = 0;
    self.epoch = next_epoch();
  }

  /// Identity of the current allocation cycle. Unique per pool and per
  /// reset, so holders of node ids can tell whether they are still valid.
  #[inline]
  pub fn epoch(&self) -> u64 {
    self.epoch
  }

  /// Hand out the next two free slots, cleared to unlinked leaves.
  ///
  /// Returns `None` and leaves the cursor unchanged when fewer than two slots
  /// remain.
  pub fn allocate(&mut self) -> Option<(NodeId, NodeId)> {
    if self.out_of_nodes() {
      return None;
    }

    let left = self.take_slot();
    let right = self.take_slot();
    self.peak = self.peak.max(self.next);
    Some((left, right))
  }

  #[inline]
  fn take_slot(&mut self) -> NodeId {
    let index = self.next;
    if index < self.nodes.len() {
      self.nodes[index] = TriTreeNode::default();
    } else {
      self.nodes.push(TriTreeNode::default());
    }
    self.next += 1;
    NodeId::from_index(index)
  }

  /// Whether the next allocation would fail.
  #[inline]
  pub fn out_of_nodes(&self) -> bool {
    self.next + 2 > self.capacity
  }

  /// Node pairs that can still be allocated.
  #[inline]
  pub fn free_pairs(&self) -> usize {
    (self.capacity - self.next.min(self.capacity)) / 2
  }

  /// Total node slots.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Slots issued since the last reset.
  #[inline]
  pub fn used(&self) -> usize {
    self.next
  }

  /// High-water mark of issued slots since creation.
  #[inline]
  pub fn peak_used(&self) -> usize {
    self.peak
  }

  /// Checked access; `None` for ids not issued since the last reset.
  #[inline]
  pub fn get(&self, id: NodeId) -> Option<&TriTreeNode> {
    if id.index() < self.next {
      self.nodes.get(id.index())
    } else {
      None
    }
  }
}

impl Index<NodeId> for TriNodePool {
  type Output = TriTreeNode;

  #[inline]
  fn index(&self, id: NodeId) -> &Self::Output {
    debug_assert!(id.index() < self.next, "stale node id {:?}", id);
    &self.nodes[id.index()]
  }
}

impl IndexMut<NodeId> for TriNodePool {
  #[inline]
  fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
    debug_assert!(id.index() < self.next, "stale node id {:?}", id);
    &mut self.nodes[id.index()]
  }
}

/// Index of the calling worker: the rayon thread index, or 0 outside rayon.
#[inline]
pub fn current_worker() -> usize {
  rayon::current_thread_index().unwrap_or(0)
}

/// One node pool per worker context per pass kind.
///
/// Created once at render-pass setup; each pass resets its pools before
/// rebuilding its triangulation. Workers never share a pool.
pub struct PoolRegistry {
  /// Indexed by `PassKind::index()`, then worker.
  pools: [Vec<TriNodePool>; 2],
}

impl PoolRegistry {
  /// Create `workers` pools per pass kind, each sized by `config`.
  pub fn new(workers: usize, config: PoolConfig) -> Result<Self, TerrainError> {
    if workers == 0 {
      return Err(TerrainError::NoWorkers);
    }
    config.validate()?;

    let make = || (0..workers).map(|_| TriNodePool::new(config.capacity)).collect();
    Ok(Self {
      pools: [make(), make()],
    })
  }

  /// (Re)create every worker's pool for `pass` with `capacity` slots.
  ///
  /// Must not be called while node ids from these pools are still in use.
  pub fn init_pools(&mut self, pass: PassKind, capacity: usize) -> Result<(), TerrainError> {
    validate_capacity(capacity)?;

    let workers = self.worker_count();
    self.pools[pass.index()] = (0..workers).map(|_| TriNodePool::new(capacity)).collect();
    tracing::info!(?pass, capacity, workers, "initialized triangle node pools");
    Ok(())
  }

  /// Reset every worker's pool for `pass`.
  pub fn reset_all(&mut self, pass: PassKind) {
    for pool in &mut self.pools[pass.index()] {
      pool.reset();
    }
  }

  /// Pool of the calling worker for `pass`.
  ///
  /// Threads outside the rayon pool map to worker 0; rayon workers beyond
  /// the registry size wrap around.
  pub fn get_pool(&mut self, pass: PassKind) -> &mut TriNodePool {
    let slot = self.worker_slot();
    &mut self.pools[pass.index()][slot]
  }

  /// Worker slot the calling thread maps to.
  #[inline]
  pub fn worker_slot(&self) -> usize {
    current_worker() % self.worker_count()
  }

  pub fn pool(&self, pass: PassKind, worker: usize) -> Option<&TriNodePool> {
    self.pools[pass.index()].get(worker)
  }

  pub fn pool_mut(&mut self, pass: PassKind, worker: usize) -> Option<&mut TriNodePool> {
    self.pools[pass.index()].get_mut(worker)
  }

  /// All worker pools of one pass.
  pub fn pools_mut(&mut self, pass: PassKind) -> &mut [TriNodePool] {
    &mut self.pools[pass.index()]
  }

  /// Normal and shadow pool sets at once, for running both passes
  /// concurrently.
  pub fn split_passes_mut(&mut self) -> (&mut [TriNodePool], &mut [TriNodePool]) {
    let [normal, shadow] = &mut self.pools;
    (normal, shadow)
  }

  pub fn worker_count(&self) -> usize {
    self.pools[0].len()
  }

  /// Slot capacity of the pools of `pass`.
  pub fn capacity(&self, pass: PassKind) -> usize {
    self.pools[pass.index()]
      .first()
      .map(|p| p.capacity())
      .unwrap_or(0)
  }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
