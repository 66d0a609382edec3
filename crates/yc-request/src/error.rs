use thiserror::Error;
use yc_core::RequestId;

use crate::{RequestKind, RequestState, Signal};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{id}: cannot {action} from state {from}")]
    InvalidTransition { id: RequestId, from: RequestState, action: &'static str },

    #[error("signal {signal} is not defined for {kind} requests")]
    SignalNotAllowed { kind: RequestKind, signal: Signal },

    #[error("{0} is not queued in this pool")]
    NotQueued(RequestId),

    #[error("{0} is already queued")]
    AlreadyQueued(RequestId),
}

pub type RequestResult<T> = Result<T, RequestError>;
