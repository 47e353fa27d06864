use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::domain::Mode;
use tokio::sync::Notify;

/// Set-only signal asking a running response matrix measurement to stop.
///
/// Clones share the same flag; the arbiter sets it and the measurement
/// worker polls or awaits it.
#[derive(Debug, Clone, Default)]
pub struct InterruptEvent {
    inner: Arc<InterruptInner>,
}

#[derive(Debug, Default)]
struct InterruptInner {
    flag: AtomicBool,
    notify: Notify,
}

impl InterruptEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_set(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.inner.flag.store(false, Ordering::SeqCst);
    }

    /// Resolves once the event is set. Returns immediately if it already is.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Default)]
pub struct OrbitCorrection {
    pub(crate) mode: Mode,
}

impl OrbitCorrection {
    pub fn mode(&self) -> Mode {
        self.mode
    }
}

#[derive(Debug, Default)]
pub struct RespmMeasurement {
    pub(crate) mode: Mode,
    pub(crate) interrupt: InterruptEvent,
}

impl RespmMeasurement {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn interrupt(&self) -> &InterruptEvent {
        &self.interrupt
    }
}

/// Orbit acquisition buffer settings.
///
/// The mode is reserved: no arbitrated write changes it, so it reads `Idle`
/// and releasing this worker is a no-op.
#[derive(Debug)]
pub struct OrbitMeasurement {
    pub(crate) mode: Mode,
    pub(crate) n_samples: u32,
    pub(crate) max_length: u32,
}

impl OrbitMeasurement {
    pub fn new(max_length: u32, n_samples: u32) -> Self {
        Self {
            mode: Mode::Idle,
            n_samples,
            max_length,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn n_samples(&self) -> u32 {
        self.n_samples
    }

    pub fn max_length(&self) -> u32 {
        self.max_length
    }
}

#[derive(Debug, Default)]
pub struct VarUpdate {
    pub(crate) mode: Mode,
}

impl VarUpdate {
    pub fn mode(&self) -> Mode {
        self.mode
    }
}

#[cfg(test)]
#[path = "tests/workers_tests.rs"]
mod tests;
