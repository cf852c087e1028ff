//! Monotonic progress reporting

use crate::platform::ProgressSink;
use std::sync::{Arc, Mutex};

/// Forwards progress to a sink, dropping any value below the last one sent
pub struct ProgressTracker {
    sink: Arc<dyn ProgressSink>,
    last: Mutex<Option<u8>>,
}

impl ProgressTracker {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            last: Mutex::new(None),
        }
    }

    /// Report `percent` (clamped to 100); returns whether it was forwarded
    pub fn report(&self, percent: u8, message: &str) -> bool {
        let percent = percent.min(100);
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if matches!(*last, Some(previous) if percent < previous) {
            return false;
        }
        *last = Some(percent);
        self.sink.report_progress(percent, message);
        true
    }

    /// Highest percentage forwarded so far
    pub fn current(&self) -> u8 {
        match self.last.lock() {
            Ok(guard) => guard.unwrap_or(0),
            Err(poisoned) => poisoned.into_inner().unwrap_or(0),
        }
    }
}

/// Slice of the overall percentage allotted to one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSpan {
    start: u8,
    end: u8,
}

impl ProgressSpan {
    pub fn new(start: u8, end: u8) -> Self {
        Self {
            start: start.min(end),
            end: end.max(start),
        }
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    /// Percentage after `completed` of `total` units; never under-reports a finished unit
    pub fn at(&self, completed: usize, total: usize) -> u8 {
        if total == 0 || completed >= total {
            return self.end;
        }
        let width = (self.end - self.start) as usize;
        self.start + (width * completed / total) as u8
    }
}
