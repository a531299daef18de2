//! Engine configuration.

use crate::stack::{DEFAULT_RED_ZONE, DEFAULT_STACK_GROWTH};

/// Tunables for an [`Engine`](crate::Engine).
///
/// ```text
/// let config = EngineConfig::default().widen_to_ancestors(false);
/// let engine = Engine::with_config(registry, config);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Reuse or generate adapters against the most general ancestor class
    /// that satisfies the shape, so sibling subclasses share one factory.
    pub widen_to_ancestors: bool,
    /// Remaining stack below which compatibility recursion grows the stack.
    pub stack_red_zone: usize,
    /// Bytes added per stack extension.
    pub stack_growth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            widen_to_ancestors: true,
            stack_red_zone: DEFAULT_RED_ZONE,
            stack_growth: DEFAULT_STACK_GROWTH,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn widen_to_ancestors(mut self, enabled: bool) -> Self {
        self.widen_to_ancestors = enabled;
        self
    }

    #[must_use]
    pub fn stack_red_zone(mut self, bytes: usize) -> Self {
        self.stack_red_zone = bytes;
        self
    }

    #[must_use]
    pub fn stack_growth(mut self, bytes: usize) -> Self {
        self.stack_growth = bytes;
        self
    }
}
