//! Loading progress reporting

/// Receives `(label, fraction)` updates while an arena is generated.
pub trait ProgressSink {
    fn report(&mut self, label: &str, fraction: f32);
}

impl<F: FnMut(&str, f32)> ProgressSink for F {
    fn report(&mut self, label: &str, fraction: f32) {
        self(label, fraction)
    }
}

/// Forwards progress to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&mut self, label: &str, fraction: f32) {
        log::info!("[{:>3.0}%] {}", fraction * 100.0, label);
    }
}

/// Records every update (loading screens poll the last entry).
#[derive(Debug, Default, Clone)]
pub struct ProgressLog {
    pub entries: Vec<(String, f32)>,
}

impl ProgressLog {
    pub fn last(&self) -> Option<&(String, f32)> {
        self.entries.last()
    }
}

impl ProgressSink for ProgressLog {
    fn report(&mut self, label: &str, fraction: f32) {
        self.entries.push((label.to_string(), fraction));
    }
}

/// Wraps a sink and keeps fractions non-decreasing within one arena.
pub struct MonotonicProgress<S> {
    inner: S,
    last: f32,
}

impl<S: ProgressSink> MonotonicProgress<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, last: 0.0 }
    }

    pub fn fraction(&self) -> f32 {
        self.last
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ProgressSink> ProgressSink for MonotonicProgress<S> {
    fn report(&mut self, label: &str, fraction: f32) {
        self.last = fraction.clamp(0.0, 1.0).max(self.last);
        self.inner.report(label, self.last);
    }
}
