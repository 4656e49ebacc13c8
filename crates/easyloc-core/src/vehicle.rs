//! Vehicle master data.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;

/// A vehicle document.
///
/// Vehicles live in the document store, keyed by a caller-supplied `uid`.
/// The licence plate should be unique in practice but is not enforced;
/// lookups by plate return the first match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Caller-assigned identifier, immutable after creation.
    pub uid: String,

    /// Registration plate.
    pub licence_plate: String,

    /// Optional free-text notes.
    pub informations: Option<String>,

    /// Odometer reading in kilometres. Non-negative by convention,
    /// monotonically non-decreasing in practice, neither enforced here.
    pub km: i64,
}

/// A partial update for a vehicle.
///
/// `informations` is a clearable field: `None` leaves it untouched,
/// `Some(None)` clears it, `Some(Some(text))` replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleUpdate {
    /// New licence plate, if changing.
    pub licence_plate: Option<String>,

    /// New free-text notes, if changing (clearable).
    pub informations: Option<Option<String>>,

    /// New odometer reading, if changing.
    pub km: Option<i64>,
}

impl VehicleUpdate {
    /// Check whether this update changes anything at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.licence_plate.is_none() && self.informations.is_none() && self.km.is_none()
    }

    /// Apply the update to a vehicle in place.
    ///
    /// Returns `true` if any field value actually changed.
    pub fn apply_to(&self, vehicle: &mut Vehicle) -> bool {
        let mut changed = false;
        if let Some(v) = &self.licence_plate {
            changed |= vehicle.licence_plate != *v;
            vehicle.licence_plate.clone_from(v);
        }
        if let Some(v) = &self.informations {
            changed |= vehicle.informations != *v;
            vehicle.informations.clone_from(v);
        }
        if let Some(v) = self.km {
            changed |= vehicle.km != v;
            vehicle.km = v;
        }
        changed
    }
}

/// Direction of a kilometre-threshold count.
///
/// Closed set: any other caller input must be rejected at parse time,
/// before a query is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KmDirection {
    /// Strictly greater than the threshold.
    Gt,

    /// Strictly less than the threshold.
    Lt,
}

impl FromStr for KmDirection {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            other => Err(ArgumentError::InvalidKmDirection(other.to_string())),
        }
    }
}

impl KmDirection {
    /// Whether `km` satisfies the comparison against `threshold`.
    #[must_use]
    pub const fn matches(self, km: i64, threshold: i64) -> bool {
        match self {
            Self::Gt => km > threshold,
            Self::Lt => km < threshold,
        }
    }
}
