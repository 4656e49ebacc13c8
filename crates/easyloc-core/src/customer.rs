//! Customer master data.

use serde::{Deserialize, Serialize};

/// A customer document.
///
/// Customers live in the document store and are keyed by a caller-supplied
/// `uid`, never by the store's native identifier. Uniqueness of `uid` is
/// advisory: the repository does not reject duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Caller-assigned identifier, immutable after creation.
    pub uid: String,

    /// First name.
    pub first_name: String,

    /// Second (family) name.
    pub second_name: String,

    /// Postal address.
    pub address: String,

    /// Driving permit number.
    pub permit_number: String,
}

/// A partial update for a customer.
///
/// Only fields set to `Some` are written; everything else keeps its prior
/// value. The `uid` itself cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdate {
    /// New first name, if changing.
    pub first_name: Option<String>,

    /// New second name, if changing.
    pub second_name: Option<String>,

    /// New address, if changing.
    pub address: Option<String>,

    /// New permit number, if changing.
    pub permit_number: Option<String>,
}

impl CustomerUpdate {
    /// Check whether this update changes anything at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.second_name.is_none()
            && self.address.is_none()
            && self.permit_number.is_none()
    }

    /// Apply the update to a customer in place.
    ///
    /// Returns `true` if any field value actually changed.
    pub fn apply_to(&self, customer: &mut Customer) -> bool {
        let mut changed = false;
        if let Some(v) = &self.first_name {
            changed |= customer.first_name != *v;
            customer.first_name.clone_from(v);
        }
        if let Some(v) = &self.second_name {
            changed |= customer.second_name != *v;
            customer.second_name.clone_from(v);
        }
        if let Some(v) = &self.address {
            changed |= customer.address != *v;
            customer.address.clone_from(v);
        }
        if let Some(v) = &self.permit_number {
            changed |= customer.permit_number != *v;
            customer.permit_number.clone_from(v);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Customer {
        Customer {
            uid: "cus-1".into(),
            first_name: "Ada".into(),
            second_name: "Lovelace".into(),
            address: "12 rue des Maths".into(),
            permit_number: "PERMIT-42".into(),
        }
    }

    #[test]
    fn apply_changes_only_supplied_fields() {
        let mut customer = sample();
        let update = CustomerUpdate {
            address: Some("1 avenue du Calcul".into()),
            ..CustomerUpdate::default()
        };

        assert!(update.apply_to(&mut customer));
        assert_eq!(customer.address, "1 avenue du Calcul");
        assert_eq!(customer.first_name, "Ada");
        assert_eq!(customer.permit_number, "PERMIT-42");
    }

    #[test]
    fn apply_with_current_values_is_a_noop() {
        let mut customer = sample();
        let update = CustomerUpdate {
            first_name: Some("Ada".into()),
            ..CustomerUpdate::default()
        };

        assert!(!update.apply_to(&mut customer));
        assert_eq!(customer, sample());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(CustomerUpdate::default().is_empty());
        let update = CustomerUpdate {
            second_name: Some("Byron".into()),
            ..CustomerUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
