//! Stack growth for deep compatibility recursion.
//!
//! Compatibility checks recurse through parameter and return types of every
//! member of every nested shape. Wide, deeply nested shapes can exhaust the
//! default thread stack, so each recursion step runs under
//! [`ensure_sufficient_stack`].
//!
//! - **Native targets**: `stacker::maybe_grow` with the sizes from
//!   [`EngineConfig`](crate::EngineConfig).
//! - **WASM targets**: no-op passthrough.

/// Default red zone (100KB): grow when less than this remains.
pub const DEFAULT_RED_ZONE: usize = 100 * 1024;

/// Default growth size (1MB) per extension.
pub const DEFAULT_STACK_GROWTH: usize = 1024 * 1024;

/// Run `f`, growing the stack first if fewer than `red_zone` bytes remain.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(red_zone: usize, growth: usize, f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(red_zone, growth, f)
}

/// WASM version - just call directly (WASM has its own stack management).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(_red_zone: usize, _growth: usize, f: impl FnOnce() -> R) -> R {
    f()
}
