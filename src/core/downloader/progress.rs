use std::sync::atomic::{AtomicU32, Ordering};

/// Progress of an operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Work is happening but its extent is unknown.
    Indeterminate,
    /// Fraction done, in `[0, 1]`.
    Fraction(f32),
}

impl Progress {
    pub fn fraction(value: f32) -> Self {
        Progress::Fraction(value.clamp(0.0, 1.0))
    }
}

/// Receives progress updates from the installer.
///
/// May be called from a worker task while being observed elsewhere, hence
/// `Send + Sync`. Any `Fn(Option<&str>, Progress)` closure is a sink.
pub trait ProgressSink: Send + Sync {
    /// `message` is `None` to keep the last status message.
    fn update(&self, message: Option<&str>, progress: Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(Option<&str>, Progress) + Send + Sync,
{
    fn update(&self, message: Option<&str>, progress: Progress) {
        self(message, progress)
    }
}

impl<'a> dyn ProgressSink + 'a {
    pub fn set(&self, fraction: f32) {
        self.update(None, Progress::fraction(fraction));
    }

    pub fn status(&self, message: &str, progress: Progress) {
        self.update(Some(message), progress);
    }

    /// Scope this sink to `[start, end]` of the overall operation.
    pub fn subprogress(&self, start: f32, end: f32) -> SubProgress<'_> {
        SubProgress {
            outer: self,
            start,
            end,
        }
    }
}

/// A sink that maps `[0, 1]` linearly onto a sub-range of another sink.
pub struct SubProgress<'a> {
    outer: &'a dyn ProgressSink,
    start: f32,
    end: f32,
}

impl ProgressSink for SubProgress<'_> {
    fn update(&self, message: Option<&str>, progress: Progress) {
        let mapped = match progress {
            Progress::Indeterminate => Progress::Indeterminate,
            Progress::Fraction(p) => {
                Progress::Fraction(self.start + (self.end - self.start) * p.clamp(0.0, 1.0))
            }
        };
        self.outer.update(message, mapped);
    }
}

/// Discards every update.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _message: Option<&str>, _progress: Progress) {}
}

const INDETERMINATE_BITS: u32 = u32::MAX;

/// Lock-free sink holding the latest fraction, readable from any thread.
#[derive(Debug)]
pub struct AtomicProgress {
    bits: AtomicU32,
}

impl Default for AtomicProgress {
    fn default() -> Self {
        Self {
            bits: AtomicU32::new(0f32.to_bits()),
        }
    }
}

impl AtomicProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest reported progress.
    pub fn get(&self) -> Progress {
        match self.bits.load(Ordering::Acquire) {
            INDETERMINATE_BITS => Progress::Indeterminate,
            bits => Progress::Fraction(f32::from_bits(bits)),
        }
    }
}

impl ProgressSink for AtomicProgress {
    fn update(&self, _message: Option<&str>, progress: Progress) {
        let bits = match progress {
            Progress::Indeterminate => INDETERMINATE_BITS,
            Progress::Fraction(p) => p.to_bits(),
        };
        self.bits.store(bits, Ordering::Release);
    }
}
