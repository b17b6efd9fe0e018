//! Process-wide render-mode selector.
//!
//! Only affects how generated buffers are consumed by the external draw
//! path; the tree and variance algorithms never look at it.

use std::sync::atomic::{AtomicU8, Ordering};

/// How patch geometry is handed to the graphics device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RenderMode {
  /// Vertex/index buffer objects.
  Vbo = 1,
  /// Display lists.
  DisplayList = 2,
  /// Client-side vertex arrays.
  VertexArray = 3,
}

impl RenderMode {
  fn from_raw(raw: u8) -> Self {
    match raw {
      2 => RenderMode::DisplayList,
      3 => RenderMode::VertexArray,
      _ => RenderMode::Vbo,
    }
  }

  /// Next mode in the switch cycle (VBO -> DL -> VA -> VBO).
  pub fn next(self) -> Self {
    match self {
      RenderMode::Vbo => RenderMode::DisplayList,
      RenderMode::DisplayList => RenderMode::VertexArray,
      RenderMode::VertexArray => RenderMode::Vbo,
    }
  }
}

static RENDER_MODE: AtomicU8 = AtomicU8::new(RenderMode::Vbo as u8);

/// Current process-wide render mode.
#[inline]
pub fn render_mode() -> RenderMode {
  RenderMode::from_raw(RENDER_MODE.load(Ordering::Relaxed))
}

/// Switch to `mode`, or cycle to the next mode when `None`.
///
/// Returns the mode now in effect. Patches notice the change through
/// `Patch::needs_vertex_upload` and re-upload their vertices.
pub fn switch_render_mode(mode: Option<RenderMode>) -> RenderMode {
  let next = mode.unwrap_or_else(|| render_mode().next());
  let prev = RenderMode::from_raw(RENDER_MODE.swap(next as u8, Ordering::Relaxed));
  if prev != next {
    tracing::info!(from = ?prev, to = ?next, "switched terrain render mode");
  }
  next
}
