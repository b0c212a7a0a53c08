//! Errors raised by the settings store

use nnvis_types::ValueKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("setting `{key}` holds {expected} values, refusing to store {found}")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("a model update needs at least one layer")]
    EmptyTopology,
    #[error("the session is closed for good, `Closed` cannot be unset")]
    SessionClosed,
    #[error("`{key}` is only written by a model update request")]
    ModelUpdateOnly { key: String },
    #[error("action index {0} is outside the action selector")]
    InvalidAction(i64),
    #[error("`{key}` cannot be removed")]
    NotRemovable { key: String },
}
