//! Optional tracing hooks for the capture and cycle paths.
//!
//! The engine instruments its hot loop sparingly: one span per cycle plus a
//! handful of events on the failure paths. With the `tracing` feature off,
//! both macros compile away and the crate carries no tracing dependency.

/// Opens an info-level span around a unit of work such as a match cycle.
///
/// Use as `let _span = trace_span!("match_cycle", regions = n).entered();`.
/// Without the `tracing` feature the expression yields a [`NoopSpan`] so the
/// call site needs no `cfg`.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Emits an info-level event, optionally with `key = value` fields.
///
/// `tracing::info!` requires a message argument after a `name:` override, so
/// both arms supply an empty one. With the feature disabled, field values are
/// still evaluated to keep unused-variable warnings consistent across builds.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+, "")
    };
    ($name:expr) => {
        tracing::info!(name: $name, "")
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

pub(crate) use trace_event;
pub(crate) use trace_span;

/// Stand-in returned by `trace_span!` when the `tracing` feature is off.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Mirrors `tracing::Span::entered` so call sites read identically.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
