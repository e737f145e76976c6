//! Call timing record shared with outer middleware.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

/// Wall-clock start and finish of one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallTiming {
    pub start_call_time: Option<DateTime<Utc>>,
    pub finish_call_time: Option<DateTime<Utc>>,
}

impl CallTiming {
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finish_call_time? - self.start_call_time?)
    }
}

/// Shared handle placed in response extensions.
///
/// Streamed calls finish after the response head is sent, so readers see
/// whatever has been recorded at the time they look.
#[derive(Debug, Clone, Default)]
pub struct CallTimingHandle(Arc<Mutex<CallTiming>>);

impl CallTimingHandle {
    pub fn mark_start(&self) {
        self.update(|t| t.start_call_time = Some(Utc::now()));
    }

    pub fn mark_finish(&self) {
        self.update(|t| t.finish_call_time = Some(Utc::now()));
    }

    pub fn snapshot(&self) -> CallTiming {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut CallTiming)) {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner));
    }
}
