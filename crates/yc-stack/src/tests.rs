//! Unit tests for yc-stack.

use yc_core::Column;

use crate::{LockEvent, StackError, StackLockTable};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn col(bay: u16, row: u16) -> Column {
    Column::new(bay, row)
}

fn released_to(events: &[LockEvent<u32>], who: u32) -> Vec<Column> {
    events
        .iter()
        .filter_map(|e| match *e {
            LockEvent::Released { who: w, column, .. } if w == who => Some(column),
            _ => None,
        })
        .collect()
}

// ── Acquire ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod acquire {
    use super::*;

    #[test]
    fn free_columns_are_granted_together() {
        let mut t = StackLockTable::new();
        let mut ev = Vec::new();
        assert!(t.acquire(0.0, 1u32, &[col(1, 0), col(2, 0)], &mut ev));
        assert_eq!(t.holder(col(1, 0)), Some(1));
        assert_eq!(t.holder(col(2, 0)), Some(1));
        assert_eq!(ev.len(), 2);
        assert!(ev.iter().all(|e| matches!(e, LockEvent::AcquireSuccess { who: 1, .. })));
    }

    #[test]
    fn failure_locks_nothing_and_registers_waits() {
        let mut t = StackLockTable::new();
        let mut ev = Vec::new();
        assert!(t.acquire(0.0, 1u32, &[col(2, 0)], &mut ev));
        ev.clear();

        assert!(!t.acquire(1.0, 2u32, &[col(1, 0), col(2, 0), col(3, 0)], &mut ev));
        assert!(!t.is_locked(col(1, 0)));
        assert!(!t.is_locked(col(3, 0)));
        assert_eq!(t.waiters(col(2, 0)), vec![2]);
        assert_eq!(ev, vec![LockEvent::AcquireFail { time: 1.0, who: 2, column: col(2, 0) }]);
    }

    #[test]
    fn reacquiring_own_column_succeeds() {
        let mut t = StackLockTable::new();
        assert!(t.acquire(0.0, 7u32, &[col(4, 1)], &mut ()));
        assert!(t.acquire(1.0, 7u32, &[col(4, 1), col(5, 1)], &mut ()));
        assert_eq!(t.held_by(7), vec![col(4, 1), col(5, 1)]);
    }

    #[test]
    fn duplicate_columns_are_one_lock() {
        let mut t = StackLockTable::new();
        let mut ev = Vec::new();
        assert!(t.acquire(0.0, 1u32, &[col(1, 1), col(1, 1)], &mut ev));
        assert_eq!(ev.len(), 1);
        assert_eq!(t.locked_count(), 1);
    }
}

// ── Release ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod release {
    use super::*;

    #[test]
    fn each_waiter_hears_once_per_column() {
        let mut t = StackLockTable::new();
        assert!(t.acquire(0.0, 1u32, &[col(1, 0), col(2, 0)], &mut ()));
        // Waiter 2 fails twice on the same columns; waiter 3 on one column.
        assert!(!t.acquire(1.0, 2u32, &[col(1, 0), col(2, 0)], &mut ()));
        assert!(!t.acquire(2.0, 2u32, &[col(1, 0), col(2, 0)], &mut ()));
        assert!(!t.acquire(2.0, 3u32, &[col(2, 0)], &mut ()));

        let mut ev = Vec::new();
        assert_eq!(t.release(5.0, 1, &[col(1, 0), col(2, 0)], &mut ev).unwrap(), 2);
        assert_eq!(released_to(&ev, 2), vec![col(1, 0), col(2, 0)]);
        assert_eq!(released_to(&ev, 3), vec![col(2, 0)]);
        assert!(t.waiters(col(2, 0)).is_empty());

        // A second release notifies nobody.
        ev.clear();
        assert_eq!(t.release(6.0, 1, &[col(1, 0)], &mut ev).unwrap(), 0);
        assert!(ev.is_empty());
    }

    #[test]
    fn release_by_other_holder_is_refused() {
        let mut t = StackLockTable::new();
        assert!(t.acquire(0.0, 1u32, &[col(1, 0)], &mut ()));
        assert!(t.acquire(0.0, 2u32, &[col(2, 0)], &mut ()));
        let err = t.release(1.0, 2, &[col(1, 0), col(2, 0)], &mut ()).unwrap_err();
        assert!(matches!(err, StackError::NotHolder { .. }));
        assert_eq!(t.holder(col(1, 0)), Some(1));
        assert_eq!(t.holder(col(2, 0)), Some(2));
    }

    #[test]
    fn released_column_can_be_acquired_by_waiter() {
        let mut t = StackLockTable::new();
        assert!(t.acquire(0.0, 1u32, &[col(3, 2)], &mut ()));
        assert!(!t.acquire(0.0, 2u32, &[col(3, 2)], &mut ()));
        t.release_all(4.0, 1, &mut ()).unwrap();
        assert!(t.acquire(4.0, 2u32, &[col(3, 2)], &mut ()));
        assert_eq!(t.holder(col(3, 2)), Some(2));
    }

    #[test]
    fn cancel_wait_removes_waiter_everywhere() {
        let mut t = StackLockTable::new();
        assert!(t.acquire(0.0, 1u32, &[col(1, 0), col(2, 0)], &mut ()));
        assert!(!t.acquire(0.0, 9u32, &[col(1, 0), col(2, 0)], &mut ()));
        t.cancel_wait(9);
        let mut ev = Vec::new();
        t.release_all(1.0, 1, &mut ev).unwrap();
        assert!(released_to(&ev, 9).is_empty());
    }

    #[test]
    fn at_most_one_holder_under_interleaving() {
        let mut t = StackLockTable::new();
        let sets: [&[Column]; 4] = [
            &[col(0, 0), col(1, 0)],
            &[col(1, 0), col(2, 0)],
            &[col(2, 0), col(3, 0)],
            &[col(3, 0), col(0, 0)],
        ];
        let mut granted: Vec<u32> = Vec::new();
        for (who, cols) in sets.iter().enumerate() {
            if t.acquire(0.0, who as u32, cols, &mut ()) {
                granted.push(who as u32);
            }
        }
        // Only non-overlapping sets can be granted simultaneously.
        assert_eq!(granted, vec![0, 2]);
        for c in 0..4 {
            let holders = granted
                .iter()
                .filter(|&&w| t.held_by(w).contains(&col(c, 0)))
                .count();
            assert!(holders <= 1);
        }
    }
}
