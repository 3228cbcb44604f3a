use std::collections::HashSet;
use std::sync::{Condvar, Mutex};

use hoard_core::LootId;

use crate::error::StoreError;

/// Per-instance exclusion.
///
/// Value changes and new appraisals on the same instance run one at a time;
/// different instances never contend. Only instances currently held are
/// tracked, so the set is empty whenever no work is in flight.
#[derive(Debug, Default)]
pub struct InstanceLocks {
    held: Mutex<HashSet<LootId>>,
    released: Condvar,
}

impl InstanceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `loot_id` is free, then hold it until the guard drops.
    pub fn acquire(&self, loot_id: LootId) -> Result<InstanceGuard<'_>, StoreError> {
        let mut held = self.held.lock().map_err(|_| StoreError::Poisoned)?;
        while held.contains(&loot_id) {
            held = self.released.wait(held).map_err(|_| StoreError::Poisoned)?;
        }
        held.insert(loot_id);
        Ok(InstanceGuard {
            locks: self,
            loot_id,
        })
    }

    /// Number of instances currently held.
    pub fn held(&self) -> usize {
        self.held
            .lock()
            .map(|held| held.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

#[must_use = "the instance is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct InstanceGuard<'a> {
    locks: &'a InstanceLocks,
    loot_id: LootId,
}

impl Drop for InstanceGuard<'_> {
    fn drop(&mut self) {
        // Removing one id cannot leave the set inconsistent, so a poisoned
        // lock is still safe to clean up.
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        held.remove(&self.loot_id);
        drop(held);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn released_instances_are_forgotten() {
        let locks = InstanceLocks::new();
        let a = LootId::new();
        let b = LootId::new();
        {
            let _ga = locks.acquire(a).unwrap();
            let _gb = locks.acquire(b).unwrap();
            assert_eq!(locks.held(), 2);
        }
        assert_eq!(locks.held(), 0);

        for _ in 0..100 {
            let _g = locks.acquire(LootId::new()).unwrap();
        }
        assert_eq!(locks.held(), 0);
    }

    #[test]
    fn same_instance_waits_for_release() {
        let locks = InstanceLocks::new();
        let id = LootId::new();
        let second_entered = AtomicBool::new(false);

        let guard = locks.acquire(id).unwrap();
        thread::scope(|s| {
            s.spawn(|| {
                let _g = locks.acquire(id).unwrap();
                second_entered.store(true, Ordering::SeqCst);
            });
            thread::sleep(Duration::from_millis(50));
            assert!(!second_entered.load(Ordering::SeqCst));
            drop(guard);
        });
        assert!(second_entered.load(Ordering::SeqCst));
        assert_eq!(locks.held(), 0);
    }
}
