/// Derives the published upload percentage from transfer byte counters.
///
/// Published values are non-decreasing and stay below 100 until the upload
/// settles; completion is signalled by the percentage disappearing, never by
/// latching at 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadProgressTracker {
    last: Option<f64>,
    halted: bool,
}

impl UploadProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw percentage; `None` unless both counters are known and non-zero.
    pub fn percent(loaded: u64, total: Option<u64>) -> Option<f64> {
        match total {
            Some(total) if total > 0 && loaded > 0 => {
                Some((loaded as f64 * 100.0 / total as f64).min(100.0))
            }
            _ => None,
        }
    }

    /// Feed a progress tick; returns the value to publish, if any.
    pub fn observe(&mut self, loaded: u64, total: Option<u64>) -> Option<f64> {
        if self.halted {
            return None;
        }

        let percent = Self::percent(loaded, total)?;
        if percent >= 100.0 {
            return None;
        }
        if matches!(self.last, Some(last) if percent <= last) {
            return None;
        }

        self.last = Some(percent);
        Some(percent)
    }

    /// Stop publishing; used once the server answered with a failure status.
    pub fn halt(&mut self) {
        self.halted = true;
    }
}
