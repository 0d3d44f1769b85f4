//! Nesting limit for new nodes.

/// Default maximum depth. The root record sits at depth 0.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Caps how deep new nodes may be attached.
///
/// Set once per process from configuration; never varies per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthPolicy {
    max_depth: usize,
}

impl DepthPolicy {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether a parent at `depth` may receive a child.
    /// The child would sit at `depth + 1`, which must not exceed the maximum.
    pub fn can_attach_at(&self, depth: usize) -> bool {
        depth < self.max_depth
    }
}

impl Default for DepthPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
