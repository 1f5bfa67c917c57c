//! Navigation seam. In a browser this would set `window.location`; natively
//! the CLI prints the target, and tests record it.

use std::sync::Mutex;

pub trait Navigator: Send + Sync {
    fn redirect(&self, target: &str);
}

/// Records every redirect in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        self.lock().clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.redirects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, target: &str) {
        self.lock().push(target.to_owned());
    }
}
