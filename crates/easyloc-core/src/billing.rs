//! Billing rows: individual payments against a contract.

use serde::{Deserialize, Serialize};

/// A payment recorded against a contract.
///
/// `contract_id` is a real foreign key, enforced by the relational store.
/// A contract is fully paid once the sum of its billing amounts reaches its
/// price; partial payments are the normal case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Billing {
    /// Store-assigned identifier.
    pub id: i64,

    /// The contract this payment belongs to.
    pub contract_id: i64,

    /// Amount paid.
    pub amount: f64,
}
