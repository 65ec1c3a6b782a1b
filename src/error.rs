//! Error taxonomy
//!
//! One enum covers ledger validation, loan business rules, and broker
//! (cross-node) failures, so every API surface reports the same tagged
//! kinds. `code()` is the wire-level error name, `http_status()` the
//! suggested response status.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::directory::CustomerRank;

#[derive(Error, Debug, Clone)]
pub enum BankError {
    // === Request validation ===
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("The amount of money being transferred must be positive, amount set: {0}")]
    NonPositiveAmount(Decimal),

    #[error("Attempted to send funds from '{0}' to '{0}' but these are the same")]
    SameAccount(Uuid),

    // === Business rules ===
    #[error("Could not find account: {0}")]
    AccountNotFound(Uuid),

    #[error("Origin account has: '{balance}' but attempted to transfer: '{requested}'")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error("Not able to operate on an account you do not own")]
    NotOwnAccount,

    #[error("Loan ID of {0} was not found in the customer's transaction history")]
    InvalidLoan(Uuid),

    #[error("The outstanding loan is of value: {outstanding} and the customer attempted to repay: {requested}")]
    ExcessRepayment {
        outstanding: Decimal,
        requested: Decimal,
    },

    #[error("Only customers with the rank of 'Silver' or 'Gold' may take loans. This customer has the rank of: {0}")]
    WrongRank(CustomerRank),

    // === Store ===
    #[error("A ledger entry with transaction id {0} already exists")]
    DuplicateId(Uuid),

    #[error("{0}")]
    NotFound(String),

    // === Cross-node coordination ===
    #[error("Peer bank is unavailable: {0}")]
    PeerUnavailable(String),

    #[error("Transfer aborted, pending legs have been compensated: {0}")]
    TransferAborted(String),

    // === Catch-all, never swallowed ===
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl BankError {
    /// Wire-level error name, used as the `error` field of error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            BankError::Validation(_) => "ValidationError",
            BankError::NonPositiveAmount(_) => "NonPositiveAmount",
            BankError::SameAccount(_) => "SameAccountError",
            BankError::AccountNotFound(_) => "AccountNotFoundError",
            BankError::InsufficientFunds { .. } => "InsufficientFunds",
            BankError::NotOwnAccount => "NotOwnAccountError",
            BankError::InvalidLoan(_) => "InvalidLoan",
            BankError::ExcessRepayment { .. } => "ExcessRepaymentError",
            BankError::WrongRank(_) => "WrongAccountRank",
            BankError::DuplicateId(_) => "DuplicateId",
            BankError::NotFound(_) => "NotFoundError",
            BankError::PeerUnavailable(_) => "PeerUnavailable",
            BankError::TransferAborted(_) => "TransferAborted",
            BankError::Unexpected(_) => "UnexpectedError",
        }
    }

    /// Suggested HTTP status for this error class.
    pub fn http_status(&self) -> u16 {
        match self {
            BankError::NonPositiveAmount(_) => 422,
            BankError::Validation(_)
            | BankError::SameAccount(_)
            | BankError::AccountNotFound(_)
            | BankError::InvalidLoan(_)
            | BankError::ExcessRepayment { .. }
            | BankError::DuplicateId(_) => 400,
            BankError::NotOwnAccount | BankError::WrongRank(_) => 403,
            BankError::InsufficientFunds { .. } => 409,
            BankError::NotFound(_) => 404,
            BankError::PeerUnavailable(_) | BankError::TransferAborted(_) => 503,
            BankError::Unexpected(_) => 500,
        }
    }
}

impl From<crate::money::MoneyError> for BankError {
    fn from(e: crate::money::MoneyError) -> Self {
        BankError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BankError::SameAccount(Uuid::nil()).code(),
            "SameAccountError"
        );
        assert_eq!(
            BankError::InsufficientFunds {
                balance: Decimal::from(400),
                requested: Decimal::from(500),
            }
            .code(),
            "InsufficientFunds"
        );
        assert_eq!(
            BankError::PeerUnavailable("node b".into()).code(),
            "PeerUnavailable"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(
            BankError::NonPositiveAmount(Decimal::ZERO).http_status(),
            422
        );
        assert_eq!(BankError::AccountNotFound(Uuid::nil()).http_status(), 400);
        assert_eq!(
            BankError::InsufficientFunds {
                balance: Decimal::ZERO,
                requested: Decimal::ONE,
            }
            .http_status(),
            409
        );
        assert_eq!(BankError::TransferAborted("leg".into()).http_status(), 503);
        assert_eq!(BankError::Unexpected("boom".into()).http_status(), 500);
    }
}
