//! Lazily populated wide-pack cache with scatter/gather loading.

use crate::error::LoadError;

use super::key::{PackKey, PackKeySet};

/// Load state of one high-byte slot.
enum Slot<T> {
    Unloaded,
    Loaded(T),
    /// A load was attempted and failed. Never retried.
    Failed,
}

/// One slot per possible high byte. Packs are never evicted.
pub struct PackCache<T> {
    slots: Vec<Slot<T>>,
}

impl<T> PackCache<T> {
    pub fn new() -> Self {
        Self {
            slots: (0..=u8::MAX).map(|_| Slot::Unloaded).collect(),
        }
    }

    pub fn get(&self, key: PackKey) -> Option<&T> {
        match &self.slots[usize::from(key.0)] {
            Slot::Loaded(pack) => Some(pack),
            Slot::Unloaded | Slot::Failed => None,
        }
    }

    pub fn is_failed(&self, key: PackKey) -> bool {
        matches!(self.slots[usize::from(key.0)], Slot::Failed)
    }

    pub fn loaded_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Loaded(_)))
            .count()
    }

    /// Load every key in `keys` whose slot has never been attempted.
    ///
    /// `fetch` runs concurrently, one scoped thread per key, and the call
    /// blocks until all of them have settled. Successful results are then
    /// handed to `build` one at a time on the calling thread. A failed
    /// fetch marks its slot failed without affecting siblings; the failures
    /// are returned in key order.
    pub fn ensure<D, F, B>(
        &mut self,
        keys: &PackKeySet,
        fetch: F,
        mut build: B,
    ) -> Vec<(PackKey, LoadError)>
    where
        D: Send,
        F: Fn(PackKey) -> Result<D, LoadError> + Sync,
        B: FnMut(PackKey, D) -> T,
    {
        let missing: Vec<PackKey> = keys
            .iter()
            .filter(|&k| matches!(self.slots[usize::from(k.0)], Slot::Unloaded))
            .collect();
        if missing.is_empty() {
            return Vec::new();
        }
        log::debug!("glyph packs: loading {} ({})", missing.len(), join_keys(&missing));

        let mut failures = Vec::new();
        for (key, result) in fetch_all(&missing, &fetch) {
            let slot = &mut self.slots[usize::from(key.0)];
            match result {
                Ok(decoded) => *slot = Slot::Loaded(build(key, decoded)),
                Err(e) => {
                    log::warn!("glyph pack {key}: {e}");
                    *slot = Slot::Failed;
                    failures.push((key, e));
                }
            }
        }
        failures
    }
}

impl<T> Default for PackCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `fetch` for every key in parallel and collect results in input order.
fn fetch_all<D, F>(keys: &[PackKey], fetch: &F) -> Vec<(PackKey, Result<D, LoadError>)>
where
    D: Send,
    F: Fn(PackKey) -> Result<D, LoadError> + Sync,
{
    std::thread::scope(|s| {
        let jobs: Vec<_> = keys
            .iter()
            .map(|&key| (key, s.spawn(move || fetch(key))))
            .collect();
        jobs.into_iter()
            .map(|(key, job)| {
                let result = job.join().unwrap_or_else(|_| {
                    Err(LoadError::Fetch {
                        name: key.file_name(),
                        reason: "load job panicked".to_owned(),
                    })
                });
                (key, result)
            })
            .collect()
    })
}

fn join_keys(keys: &[PackKey]) -> String {
    keys.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}
