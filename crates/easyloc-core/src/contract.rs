//! Rental contracts and their derived predicates.
//!
//! A contract links a vehicle and a customer by soft reference (plain-string
//! uids into the document store, no enforced integrity) and carries the
//! rental window. Lateness, activity and delay are defined here once and
//! shared by every storage backend.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Grace period before a returned rental counts as late, in minutes.
///
/// A contract returned exactly at `loc_end_datetime + 60min` is on time;
/// the lateness boundary is strict.
pub const LATE_GRACE_MINUTES: i64 = 60;

/// A rental contract row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Store-assigned identifier.
    pub id: i64,

    /// Soft reference to `Vehicle.uid` in the document store.
    pub vehicle_uid: String,

    /// Soft reference to `Customer.uid` in the document store.
    pub customer_uid: String,

    /// When the contract was signed.
    pub sign_datetime: NaiveDateTime,

    /// Scheduled start of the rental.
    pub loc_begin_datetime: NaiveDateTime,

    /// Scheduled end of the rental.
    pub loc_end_datetime: NaiveDateTime,

    /// Actual return time; `None` while the rental is still open.
    pub returning_datetime: Option<NaiveDateTime>,

    /// Agreed price. Non-negative by convention.
    pub price: f64,
}

impl Contract {
    /// Whether the vehicle was returned more than the grace period after
    /// the scheduled end.
    #[must_use]
    pub fn is_late(&self) -> bool {
        self.returning_datetime.is_some_and(|returned| {
            returned > self.loc_end_datetime + Duration::minutes(LATE_GRACE_MINUTES)
        })
    }

    /// Whether the rental is running at `now`: it has begun and the vehicle
    /// has not been returned.
    #[must_use]
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.loc_begin_datetime <= now && self.returning_datetime.is_none()
    }

    /// Delay past the scheduled end in whole minutes, if the vehicle was
    /// returned after it. On-time and open contracts yield `None`.
    #[must_use]
    pub fn delay_minutes(&self) -> Option<i64> {
        let returned = self.returning_datetime?;
        let minutes = (returned - self.loc_end_datetime).num_minutes();
        (minutes > 0).then_some(minutes)
    }
}

/// Fields for creating a contract; the store assigns the `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContract {
    /// Soft reference to `Vehicle.uid`.
    pub vehicle_uid: String,

    /// Soft reference to `Customer.uid`.
    pub customer_uid: String,

    /// When the contract was signed.
    pub sign_datetime: NaiveDateTime,

    /// Scheduled start of the rental.
    pub loc_begin_datetime: NaiveDateTime,

    /// Scheduled end of the rental.
    pub loc_end_datetime: NaiveDateTime,

    /// Actual return time, usually `None` at creation.
    pub returning_datetime: Option<NaiveDateTime>,

    /// Agreed price.
    pub price: f64,
}

impl NewContract {
    /// Attach a store-assigned id, producing the persisted row.
    #[must_use]
    pub fn into_contract(self, id: i64) -> Contract {
        Contract {
            id,
            vehicle_uid: self.vehicle_uid,
            customer_uid: self.customer_uid,
            sign_datetime: self.sign_datetime,
            loc_begin_datetime: self.loc_begin_datetime,
            loc_end_datetime: self.loc_end_datetime,
            returning_datetime: self.returning_datetime,
            price: self.price,
        }
    }
}

/// A partial update for a contract.
///
/// `returning_datetime` is clearable: `Some(None)` reopens the rental,
/// `Some(Some(t))` records the return, `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractUpdate {
    /// New vehicle reference, if changing.
    pub vehicle_uid: Option<String>,

    /// New customer reference, if changing.
    pub customer_uid: Option<String>,

    /// New signature time, if changing.
    pub sign_datetime: Option<NaiveDateTime>,

    /// New scheduled start, if changing.
    pub loc_begin_datetime: Option<NaiveDateTime>,

    /// New scheduled end, if changing.
    pub loc_end_datetime: Option<NaiveDateTime>,

    /// New return time, if changing (clearable).
    pub returning_datetime: Option<Option<NaiveDateTime>>,

    /// New price, if changing.
    pub price: Option<f64>,
}

impl ContractUpdate {
    /// Check whether this update changes anything at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicle_uid.is_none()
            && self.customer_uid.is_none()
            && self.sign_datetime.is_none()
            && self.loc_begin_datetime.is_none()
            && self.loc_end_datetime.is_none()
            && self.returning_datetime.is_none()
            && self.price.is_none()
    }

    /// Apply the update to a contract in place. The `id` never changes.
    ///
    /// Returns `true` if any field value actually changed.
    pub fn apply_to(&self, contract: &mut Contract) -> bool {
        let mut changed = false;
        if let Some(v) = &self.vehicle_uid {
            changed |= contract.vehicle_uid != *v;
            contract.vehicle_uid.clone_from(v);
        }
        if let Some(v) = &self.customer_uid {
            changed |= contract.customer_uid != *v;
            contract.customer_uid.clone_from(v);
        }
        if let Some(v) = self.sign_datetime {
            changed |= contract.sign_datetime != v;
            contract.sign_datetime = v;
        }
        if let Some(v) = self.loc_begin_datetime {
            changed |= contract.loc_begin_datetime != v;
            contract.loc_begin_datetime = v;
        }
        if let Some(v) = self.loc_end_datetime {
            changed |= contract.loc_end_datetime != v;
            contract.loc_end_datetime = v;
        }
        if let Some(v) = self.returning_datetime {
            changed |= contract.returning_datetime != v;
            contract.returning_datetime = v;
        }
        if let Some(v) = self.price {
            changed |= (contract.price - v).abs() > f64::EPSILON;
            contract.price = v;
        }
        changed
    }
}
