//! Result rows and argument types for the rental analytics queries.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;

/// Contract column a grouping query may use.
///
/// Closed set replacing the original free-text field name: anything other
/// than the two uid columns is rejected at parse time, before a query is
/// built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    /// Group by `vehicle_uid`.
    VehicleUid,

    /// Group by `customer_uid`.
    CustomerUid,
}

impl GroupField {
    /// The column name this field resolves to.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::VehicleUid => "vehicle_uid",
            Self::CustomerUid => "customer_uid",
        }
    }
}

impl FromStr for GroupField {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vehicle_uid" => Ok(Self::VehicleUid),
            "customer_uid" => Ok(Self::CustomerUid),
            other => Err(ArgumentError::InvalidGroupField(other.to_string())),
        }
    }
}

/// Average return delay for one customer or vehicle.
///
/// Only late contracts contribute: the average is taken among delayed
/// rentals, not across all rentals of the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageDelay {
    /// The grouping key (a customer or vehicle uid).
    pub uid: String,

    /// Mean delay past the scheduled end, in minutes.
    pub avg_delay_minutes: f64,
}

/// Number of contracts held by one grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCount {
    /// The grouping key (a customer or vehicle uid).
    pub uid: String,

    /// How many contracts reference it.
    pub contracts: i64,
}
