//! Per-block request dispatcher.

use tracing::debug;
use yc_core::{EquipmentId, RequestId};

use crate::{PoolSlot, Request, RequestPool, RequestResult, RequestState};

/// Which schedulers must look at the pool after a change.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Wake {
    Equipment(EquipmentId),
    All,
}

/// Front door of a block's request pool.
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    pool: RequestPool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn pool(&self) -> &RequestPool {
        &self.pool
    }

    /// Queue `req`, making it ready first when `ready` is set.  Returns the
    /// schedulers to wake.
    pub fn submit<H>(&mut self, time: f64, req: &mut Request<H>, ready: bool) -> RequestResult<Wake> {
        if ready {
            req.ready(time)?;
        }
        let slot = self.pool.push(req)?;
        debug!(id = %req.id, kind = %req.kind(), ?slot, ready, "request submitted");
        Ok(Self::wake_for(req))
    }

    /// Schedulers to wake when `req` changes (e.g. becomes ready).
    pub fn wake_for<H>(req: &Request<H>) -> Wake {
        match req.equipment {
            Some(eq) => Wake::Equipment(eq),
            None => Wake::All,
        }
    }

    /// Ready candidates for `equipment`.
    pub fn candidates<F>(&self, equipment: EquipmentId, state_of: F) -> Vec<RequestId>
    where
        F: Fn(RequestId) -> Option<(RequestState, Option<RequestId>)>,
    {
        self.pool
            .available(equipment, &state_of)
            .into_iter()
            .filter(|id| state_of(*id).is_some_and(|(s, _)| s.is_ready()))
            .collect()
    }

    /// Take `id` out of the pool (it has been scheduled or abandoned).
    pub fn take(&mut self, id: RequestId) -> RequestResult<PoolSlot> {
        self.pool.pop(id)
    }

    pub fn is_queued(&self, id: RequestId) -> bool {
        self.pool.slot(id).is_some()
    }
}
