//! The per-block column lock table.

use std::collections::BTreeSet;
use std::fmt::Debug;

use tracing::{debug, warn};
use yc_core::Column;

use crate::{LockListener, StackError, StackResult};

#[cfg(feature = "fx-hash")]
type ColumnMap<V> = rustc_hash::FxHashMap<Column, V>;
#[cfg(not(feature = "fx-hash"))]
type ColumnMap<V> = std::collections::HashMap<Column, V>;

#[derive(Clone, Debug)]
struct ColumnLock<W> {
    holder:  Option<W>,
    waiters: BTreeSet<W>,
}

impl<W> Default for ColumnLock<W> {
    fn default() -> Self {
        Self { holder: None, waiters: BTreeSet::new() }
    }
}

/// Exclusive locks on stacking columns, one holder per column, each with a
/// set of waiters.
///
/// Acquisition is all-or-nothing: either every requested column is granted
/// or none is, and the acquirer is registered as waiter on every column that
/// was held by someone else.  Releasing a column notifies each of its
/// waiters exactly once and clears the wait set; a waiter that still needs
/// the column must acquire again.
#[derive(Clone, Debug)]
pub struct StackLockTable<W> {
    columns: ColumnMap<ColumnLock<W>>,
}

impl<W> Default for StackLockTable<W> {
    fn default() -> Self {
        Self { columns: ColumnMap::default() }
    }
}

impl<W: Ord + Copy + Debug> StackLockTable<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self, column: Column) -> Option<W> {
        self.columns.get(&column).and_then(|c| c.holder)
    }

    #[inline]
    pub fn is_locked(&self, column: Column) -> bool {
        self.holder(column).is_some()
    }

    /// Waiters of `column`, in ascending order.
    pub fn waiters(&self, column: Column) -> Vec<W> {
        self.columns
            .get(&column)
            .map(|c| c.waiters.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Columns held by `who`, sorted.
    pub fn held_by(&self, who: W) -> Vec<Column> {
        let mut out: Vec<Column> = self
            .columns
            .iter()
            .filter(|(_, c)| c.holder == Some(who))
            .map(|(col, _)| *col)
            .collect();
        out.sort_unstable();
        out
    }

    /// Number of locked columns.
    pub fn locked_count(&self) -> usize {
        self.columns.values().filter(|c| c.holder.is_some()).count()
    }

    /// Try to lock every column in `columns` for `who`.
    ///
    /// Columns already held by `who` count as granted.  On failure nothing is
    /// locked, `who` waits on each blocking column and the listener hears
    /// `on_acquire_fail` for each of them.  On success the listener hears
    /// `on_acquire_success` for each column.
    pub fn acquire<L: LockListener<W>>(
        &mut self,
        time:     f64,
        who:      W,
        columns:  &[Column],
        listener: &mut L,
    ) -> bool {
        let mut wanted: Vec<Column> = columns.to_vec();
        wanted.sort_unstable();
        wanted.dedup();

        let blocked: Vec<Column> = wanted
            .iter()
            .copied()
            .filter(|col| self.holder(*col).is_some_and(|h| h != who))
            .collect();

        if !blocked.is_empty() {
            for col in blocked {
                self.columns.entry(col).or_default().waiters.insert(who);
                debug!(?who, column = %col, "stack lock busy");
                listener.on_acquire_fail(time, who, col);
            }
            return false;
        }

        for col in wanted {
            let lock = self.columns.entry(col).or_default();
            lock.holder = Some(who);
            lock.waiters.remove(&who);
            listener.on_acquire_success(time, who, col);
        }
        true
    }

    /// Unlock `columns` held by `releaser` and notify their waiters.
    ///
    /// Fails without changing anything if any column is held by someone
    /// else.  Columns that are not locked at all are skipped with a warning.
    /// Returns the number of columns unlocked.
    pub fn release<L: LockListener<W>>(
        &mut self,
        time:     f64,
        releaser: W,
        columns:  &[Column],
        listener: &mut L,
    ) -> StackResult<usize> {
        let mut targets: Vec<Column> = columns.to_vec();
        targets.sort_unstable();
        targets.dedup();

        for col in &targets {
            if let Some(holder) = self.holder(*col) {
                if holder != releaser {
                    return Err(StackError::not_holder(*col, holder, releaser));
                }
            }
        }

        let mut released = 0;
        for col in targets {
            let Some(lock) = self.columns.get_mut(&col).filter(|l| l.holder.is_some()) else {
                warn!(?releaser, column = %col, "release of a column that is not locked");
                continue;
            };
            lock.holder = None;
            let waiters = std::mem::take(&mut lock.waiters);
            self.columns.remove(&col);
            released += 1;
            for w in waiters {
                listener.on_resource_release(time, w, col);
            }
        }
        Ok(released)
    }

    /// Release everything `who` holds.
    pub fn release_all<L: LockListener<W>>(
        &mut self,
        time:     f64,
        who:      W,
        listener: &mut L,
    ) -> StackResult<usize> {
        let held = self.held_by(who);
        self.release(time, who, &held, listener)
    }

    /// Drop `who` from every wait set (e.g. when it gives up for good).
    pub fn cancel_wait(&mut self, who: W) {
        self.columns.retain(|_, lock| {
            lock.waiters.remove(&who);
            lock.holder.is_some() || !lock.waiters.is_empty()
        });
    }
}
