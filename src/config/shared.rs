use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::config::{ConfSnapshot, MpConf};
use crate::errors::MpConfResult;

/// A configuration shared between threads.
///
/// Every access runs under one lock, so checking whether a credential is
/// set and setting it happen atomically: two threads racing on the same
/// field cannot both succeed.
#[derive(Debug, Default)]
pub struct SharedConf {
    inner: Mutex<MpConf>,
}

impl SharedConf {
    pub fn new(conf: MpConf) -> Self {
        Self {
            inner: Mutex::new(conf),
        }
    }

    /// The process-wide instance, created empty on first use.
    pub fn global() -> &'static SharedConf {
        static GLOBAL: OnceLock<SharedConf> = OnceLock::new();
        GLOBAL.get_or_init(SharedConf::default)
    }

    fn lock(&self) -> MutexGuard<'_, MpConf> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            log::warn!("Shared configuration lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn read<T>(&self, f: impl FnOnce(&MpConf) -> T) -> T {
        f(&self.lock())
    }

    pub fn update<T>(&self, f: impl FnOnce(&mut MpConf) -> MpConfResult<T>) -> MpConfResult<T> {
        f(&mut self.lock())
    }

    pub fn get(&self) -> MpConf {
        self.lock().clone()
    }

    pub fn snapshot(&self) -> ConfSnapshot {
        self.lock().snapshot()
    }

    pub fn reset(&self) {
        self.lock().reset();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use super::*;
    use crate::config::DEFAULT_BASE_URL;

    #[test]
    fn test_racing_setters_only_one_wins() {
        let shared = SharedConf::default();
        let threads = 8;
        let barrier = Barrier::new(threads);
        let successes = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|index| {
                    let shared = &shared;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        shared
                            .update(|conf| conf.set_client_id(format!("client-{}", index)))
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|won| *won)
                .count()
        });
        assert_eq!(successes, 1);
        assert!(shared.read(|conf| conf.client_id().is_some()));
    }

    #[test]
    fn test_update_and_reset() {
        let shared = SharedConf::new(MpConf::new());
        shared
            .update(|conf| {
                conf.set_base_url("http://localhost:8080");
                conf.set_app_id("42")
            })
            .unwrap();
        assert_eq!(shared.get().app_id(), Some("42"));
        assert_eq!(shared.snapshot().base_url, "http://localhost:8080");
        shared.reset();
        assert_eq!(shared.get(), MpConf::default());
        assert_eq!(shared.snapshot().base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_global_is_a_single_instance() {
        let first = SharedConf::global() as *const SharedConf;
        let second = SharedConf::global() as *const SharedConf;
        assert_eq!(first, second);
    }
}
