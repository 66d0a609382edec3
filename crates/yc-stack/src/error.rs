use std::fmt::Debug;

use thiserror::Error;
use yc_core::Column;

#[derive(Debug, Error)]
pub enum StackError {
    #[error("column {column} is held by {holder}, not by {releaser}")]
    NotHolder { column: Column, holder: String, releaser: String },
}

impl StackError {
    pub(crate) fn not_holder<W: Debug>(column: Column, holder: W, releaser: W) -> Self {
        StackError::NotHolder {
            column,
            holder: format!("{holder:?}"),
            releaser: format!("{releaser:?}"),
        }
    }
}

pub type StackResult<T> = Result<T, StackError>;
