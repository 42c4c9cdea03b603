//! A minimal progress-reporting trait for long-running pack operations
//! (`init`, `set`, `inc`, `add_child`). No terminal rendering lives in this
//! crate; that belongs to a porcelain frontend.

/// Something that can report discrete progress, optionally nested under a
/// parent via [`Progress::add_child`].
pub trait Progress: Send {
    type SubProgress: Progress;

    /// Declare the total amount of work, if known, and a unit label.
    fn init(&mut self, max: Option<usize>, unit: Option<&'static str>);

    /// Set the current step count directly.
    fn set(&mut self, step: usize);

    /// Advance the step count by one.
    fn inc(&mut self) {
        self.inc_by(1);
    }

    /// Advance the step count by `n`.
    fn inc_by(&mut self, n: usize);

    /// Create a child progress tracker with its own name.
    fn add_child(&mut self, name: impl Into<String>) -> Self::SubProgress;

    /// Log a throughput line; a no-op by default.
    fn show_throughput(&mut self, _start: std::time::Instant, _steps: u32, _unit: &str) {}
}

/// A [`Progress`] implementation that does nothing, used wherever a caller
/// doesn't want progress reporting.
#[derive(Clone, Copy, Default)]
pub struct Discard;

impl Progress for Discard {
    type SubProgress = Discard;

    fn init(&mut self, _max: Option<usize>, _unit: Option<&'static str>) {}
    fn set(&mut self, _step: usize) {}
    fn inc_by(&mut self, _n: usize) {}
    fn add_child(&mut self, _name: impl Into<String>) -> Self::SubProgress {
        Discard
    }
}
