//! Where submitted requests wait for a scheduler.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use yc_core::{EquipmentId, LaneId, RequestId};

use crate::{Request, RequestError, RequestResult, RequestState};

#[cfg(feature = "fx-hash")]
type SlotMap<V> = rustc_hash::FxHashMap<RequestId, V>;
#[cfg(not(feature = "fx-hash"))]
type SlotMap<V> = std::collections::HashMap<RequestId, V>;

/// The queue a pooled request sits in.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PoolSlot {
    /// Any unit may take it.
    Free,
    /// Reserved for one unit.
    Local(EquipmentId),
    /// FIFO at an access lane.
    Access(LaneId),
}

/// Free pool, per-unit pools and per-lane FIFO queues of one block.
///
/// A lane queue only offers its head, and only once the request queued
/// ahead of it (its predecessor) has started.  Ordered collections keep
/// candidate order deterministic.
#[derive(Clone, Debug, Default)]
pub struct RequestPool {
    free:   BTreeSet<RequestId>,
    local:  BTreeMap<EquipmentId, BTreeSet<RequestId>>,
    access: BTreeMap<LaneId, VecDeque<RequestId>>,
    slots:  SlotMap<PoolSlot>,
}

impl RequestPool {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, id: RequestId) -> Option<PoolSlot> {
        self.slots.get(&id).copied()
    }

    /// Queue `req`: in its unit's pool when bound, else at its lane, else
    /// in the free pool.  Lane queueing records the predecessor on `req`.
    pub fn push<H>(&mut self, req: &mut Request<H>) -> RequestResult<PoolSlot> {
        if self.slots.contains_key(&req.id) {
            return Err(RequestError::AlreadyQueued(req.id));
        }
        let slot = match (req.equipment, req.lane()) {
            (Some(eq), _) => {
                self.local.entry(eq).or_default().insert(req.id);
                PoolSlot::Local(eq)
            }
            (None, Some(lane)) => {
                let queue = self.access.entry(lane).or_default();
                req.predecessor = queue.back().copied();
                queue.push_back(req.id);
                PoolSlot::Access(lane)
            }
            (None, None) => {
                self.free.insert(req.id);
                PoolSlot::Free
            }
        };
        self.slots.insert(req.id, slot);
        Ok(slot)
    }

    /// Remove `id` from whichever queue holds it.
    pub fn pop(&mut self, id: RequestId) -> RequestResult<PoolSlot> {
        let slot = self.slots.remove(&id).ok_or(RequestError::NotQueued(id))?;
        match slot {
            PoolSlot::Free => {
                self.free.remove(&id);
            }
            PoolSlot::Local(eq) => {
                if let Some(set) = self.local.get_mut(&eq) {
                    set.remove(&id);
                }
            }
            PoolSlot::Access(lane) => {
                if let Some(queue) = self.access.get_mut(&lane) {
                    queue.retain(|r| *r != id);
                }
            }
        }
        Ok(slot)
    }

    /// Everything queued, in queue order.
    pub fn all(&self) -> Vec<RequestId> {
        let mut out: Vec<RequestId> = self.free.iter().copied().collect();
        out.extend(self.local.values().flat_map(|s| s.iter().copied()));
        out.extend(self.access.values().flat_map(|q| q.iter().copied()));
        out
    }

    /// Candidates for `equipment`: its own pool, the free pool, and every
    /// lane head whose predecessor has started (or is gone).
    pub fn available<F>(&self, equipment: EquipmentId, state_of: F) -> Vec<RequestId>
    where
        F: Fn(RequestId) -> Option<(RequestState, Option<RequestId>)>,
    {
        let mut out: Vec<RequestId> = self
            .local
            .get(&equipment)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        out.extend(self.free.iter().copied());
        for queue in self.access.values() {
            let Some(&head) = queue.front() else { continue };
            let pred_started = match state_of(head).and_then(|(_, pred)| pred) {
                None => true,
                Some(pred) => state_of(pred).is_none_or(|(s, _)| s.has_started()),
            };
            if pred_started {
                out.push(head);
            }
        }
        out
    }
}
