use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use crate::money::Money;

/// Errors surfaced by the ledger engine.
///
/// Every variant is terminal for the call that produced it: validation runs
/// before any write, so a failed call leaves no partial state behind.
/// Storage failures propagate as-is, retrying is the caller's decision.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("amount must be a positive value")]
    InvalidAmount,
    #[error("description must not be blank")]
    EmptyDescription,
    #[error("member '{0}' does not belong to the group")]
    UnknownMember(String),
    #[error("shares sum to {shares} but the expense amount is {amount}")]
    ShareMismatch { shares: Money, amount: Money },
    #[error("a settlement needs two distinct members")]
    SameMember,
    #[error("group '{0}' not found")]
    GroupNotFound(String),
    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount => "InvalidAmount",
            LedgerError::EmptyDescription => "EmptyDescription",
            LedgerError::UnknownMember(_) => "UnknownMember",
            LedgerError::ShareMismatch { .. } => "ShareMismatch",
            LedgerError::SameMember => "SameMember",
            LedgerError::GroupNotFound(_) => "GroupNotFound",
            LedgerError::Storage(_) => "StorageUnavailable",
        }
    }
}

impl From<mongodb::error::Error> for LedgerError {
    fn from(err: mongodb::error::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    kind: &'a str,
    message: String,
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        })
    }
}
