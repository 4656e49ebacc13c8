//! In-process storage implementing every trait.
//!
//! Backs the test suite and serves as the reference implementation of the
//! analytics definitions: both sides share the predicates on
//! `easyloc_core::Contract`, so the SQL backend and this one must answer
//! identically. The relational rules are enforced here too — a payment
//! needs an existing contract, and a contract with live payments cannot be
//! deleted.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use easyloc_core::{
    AverageDelay, Billing, Contract, ContractCount, ContractUpdate, Customer, CustomerUpdate,
    GroupField, KmDirection, NewContract, Vehicle, VehicleUpdate,
};

use crate::error::{Result, StoreError};
use crate::{BillingStore, ContractStore, CustomerStore, RentalAnalytics, VehicleStore};

#[derive(Debug, Default)]
struct Inner {
    customers: Vec<Customer>,
    vehicles: Vec<Vehicle>,
    contracts: BTreeMap<i64, Contract>,
    billings: BTreeMap<i64, Billing>,
    next_contract_id: i64,
    next_billing_id: i64,
    next_document_id: u64,
}

impl Inner {
    fn paid_sum(&self, contract_id: i64) -> f64 {
        self.billings
            .values()
            .filter(|billing| billing.contract_id == contract_id)
            .map(|billing| billing.amount)
            .sum()
    }
}

/// In-memory storage for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[allow(clippy::cast_precision_loss)]
fn average_delays<'a, I, K>(contracts: I, key: K) -> Vec<AverageDelay>
where
    I: Iterator<Item = &'a Contract>,
    K: Fn(&Contract) -> &str,
{
    let mut groups: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for contract in contracts.filter(|c| c.is_late()) {
        if let Some(minutes) = contract.delay_minutes() {
            let entry = groups.entry(key(contract).to_string()).or_default();
            entry.0 += minutes;
            entry.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|(uid, (sum, count))| AverageDelay {
            uid,
            avg_delay_minutes: sum as f64 / count as f64,
        })
        .collect()
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn create_customer(&self, customer: &Customer) -> Result<String> {
        let mut inner = self.inner.lock().await;
        inner.next_document_id += 1;
        let id = format!("mem-{}", inner.next_document_id);
        inner.customers.push(customer.clone());
        Ok(id)
    }

    async fn get_customer(&self, uid: &str) -> Result<Option<Customer>> {
        let inner = self.inner.lock().await;
        Ok(inner.customers.iter().find(|c| c.uid == uid).cloned())
    }

    async fn find_customers_by_name(
        &self,
        first_name: &str,
        second_name: &str,
    ) -> Result<Vec<Customer>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .customers
            .iter()
            .filter(|c| c.first_name == first_name && c.second_name == second_name)
            .cloned()
            .collect())
    }

    async fn update_customer(&self, uid: &str, update: &CustomerUpdate) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.customers.iter_mut().find(|c| c.uid == uid) {
            Some(customer) => Ok(update.apply_to(customer)),
            None => Ok(false),
        }
    }

    async fn delete_customer(&self, uid: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.customers.iter().position(|c| c.uid == uid) {
            Some(index) => {
                inner.customers.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl VehicleStore for MemoryStore {
    async fn create_vehicle(&self, vehicle: &Vehicle) -> Result<String> {
        let mut inner = self.inner.lock().await;
        inner.next_document_id += 1;
        let id = format!("mem-{}", inner.next_document_id);
        inner.vehicles.push(vehicle.clone());
        Ok(id)
    }

    async fn get_vehicle(&self, uid: &str) -> Result<Option<Vehicle>> {
        let inner = self.inner.lock().await;
        Ok(inner.vehicles.iter().find(|v| v.uid == uid).cloned())
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<Vehicle>> {
        let inner = self.inner.lock().await;
        // First match wins when plates are duplicated.
        Ok(inner
            .vehicles
            .iter()
            .find(|v| v.licence_plate == plate)
            .cloned())
    }

    async fn count_vehicles_by_km(&self, threshold: i64, direction: KmDirection) -> Result<u64> {
        let inner = self.inner.lock().await;
        let count = inner
            .vehicles
            .iter()
            .filter(|v| direction.matches(v.km, threshold))
            .count();
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn update_vehicle(&self, uid: &str, update: &VehicleUpdate) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.vehicles.iter_mut().find(|v| v.uid == uid) {
            Some(vehicle) => Ok(update.apply_to(vehicle)),
            None => Ok(false),
        }
    }

    async fn delete_vehicle(&self, uid: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.vehicles.iter().position(|v| v.uid == uid) {
            Some(index) => {
                inner.vehicles.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ContractStore for MemoryStore {
    async fn create_contract(&self, contract: NewContract) -> Result<Contract> {
        let mut inner = self.inner.lock().await;
        inner.next_contract_id += 1;
        let id = inner.next_contract_id;
        let contract = contract.into_contract(id);
        inner.contracts.insert(id, contract.clone());
        Ok(contract)
    }

    async fn get_contract(&self, id: i64) -> Result<Option<Contract>> {
        let inner = self.inner.lock().await;
        Ok(inner.contracts.get(&id).cloned())
    }

    async fn update_contract(&self, id: i64, update: &ContractUpdate) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.contracts.get_mut(&id) {
            Some(contract) => Ok(update.apply_to(contract)),
            None => Ok(false),
        }
    }

    async fn delete_contract(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        if !inner.contracts.contains_key(&id) {
            return Ok(false);
        }
        // Block-if-exists, mirroring the RESTRICT foreign key.
        if inner.billings.values().any(|b| b.contract_id == id) {
            return Err(StoreError::ConstraintViolation(format!(
                "billing rows still reference contract {id}"
            )));
        }
        inner.contracts.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn create_payment(&self, contract_id: i64, amount: f64) -> Result<Billing> {
        let mut inner = self.inner.lock().await;
        if !inner.contracts.contains_key(&contract_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "contract {contract_id} does not exist"
            )));
        }
        inner.next_billing_id += 1;
        let billing = Billing {
            id: inner.next_billing_id,
            contract_id,
            amount,
        };
        inner.billings.insert(billing.id, billing.clone());
        Ok(billing)
    }

    async fn get_payment(&self, id: i64) -> Result<Option<Billing>> {
        let inner = self.inner.lock().await;
        Ok(inner.billings.get(&id).cloned())
    }

    async fn update_payment_amount(&self, id: i64, amount: f64) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.billings.get_mut(&id) {
            Some(billing) => {
                let changed = (billing.amount - amount).abs() > f64::EPSILON;
                billing.amount = amount;
                Ok(changed)
            }
            None => Ok(false),
        }
    }

    async fn delete_payment(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        Ok(inner.billings.remove(&id).is_some())
    }
}

#[async_trait]
impl RentalAnalytics for MemoryStore {
    async fn contracts_by_customer(&self, customer_uid: &str) -> Result<Vec<Contract>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .contracts
            .values()
            .filter(|c| c.customer_uid == customer_uid)
            .cloned()
            .collect())
    }

    async fn contracts_by_vehicle(&self, vehicle_uid: &str) -> Result<Vec<Contract>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .contracts
            .values()
            .filter(|c| c.vehicle_uid == vehicle_uid)
            .cloned()
            .collect())
    }

    async fn active_contracts(&self, customer_uid: &str) -> Result<Vec<Contract>> {
        let now = chrono::Utc::now().naive_utc();
        let inner = self.inner.lock().await;
        Ok(inner
            .contracts
            .values()
            .filter(|c| c.customer_uid == customer_uid && c.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn late_contracts(&self) -> Result<Vec<Contract>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .contracts
            .values()
            .filter(|c| c.is_late())
            .cloned()
            .collect())
    }

    async fn payments_for_contract(&self, contract_id: i64) -> Result<Vec<Billing>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .billings
            .values()
            .filter(|b| b.contract_id == contract_id)
            .cloned()
            .collect())
    }

    async fn is_fully_paid(&self, contract_id: i64) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .contracts
            .get(&contract_id)
            .is_some_and(|contract| inner.paid_sum(contract_id) >= contract.price))
    }

    async fn unpaid_contracts(&self) -> Result<Vec<Contract>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .contracts
            .values()
            .filter(|c| inner.paid_sum(c.id) < c.price)
            .cloned()
            .collect())
    }

    async fn count_delays(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<u64> {
        let inner = self.inner.lock().await;
        let count = inner
            .contracts
            .values()
            .filter(|c| c.is_late() && c.loc_end_datetime >= start && c.loc_end_datetime <= end)
            .count();
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn avg_delay_by_customer(&self) -> Result<Vec<AverageDelay>> {
        let inner = self.inner.lock().await;
        Ok(average_delays(inner.contracts.values(), |c| {
            c.customer_uid.as_str()
        }))
    }

    async fn avg_delay_by_vehicle(&self) -> Result<Vec<AverageDelay>> {
        let inner = self.inner.lock().await;
        Ok(average_delays(inner.contracts.values(), |c| {
            c.vehicle_uid.as_str()
        }))
    }

    async fn group_contracts_by(&self, field: GroupField) -> Result<Vec<ContractCount>> {
        let inner = self.inner.lock().await;
        let mut groups: BTreeMap<String, i64> = BTreeMap::new();
        for contract in inner.contracts.values() {
            let key = match field {
                GroupField::VehicleUid => &contract.vehicle_uid,
                GroupField::CustomerUid => &contract.customer_uid,
            };
            *groups.entry(key.clone()).or_default() += 1;
        }
        Ok(groups
            .into_iter()
            .map(|(uid, contracts)| ContractCount { uid, contracts })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};

    fn dt(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn customer(uid: &str, first: &str, second: &str) -> Customer {
        Customer {
            uid: uid.into(),
            first_name: first.into(),
            second_name: second.into(),
            address: "12 rue des Maths".into(),
            permit_number: format!("PERMIT-{uid}"),
        }
    }

    fn vehicle(uid: &str, plate: &str, km: i64) -> Vehicle {
        Vehicle {
            uid: uid.into(),
            licence_plate: plate.into(),
            informations: None,
            km,
        }
    }

    fn rental(
        vehicle_uid: &str,
        customer_uid: &str,
        end: NaiveDateTime,
        returned: Option<NaiveDateTime>,
        price: f64,
    ) -> NewContract {
        NewContract {
            vehicle_uid: vehicle_uid.into(),
            customer_uid: customer_uid.into(),
            sign_datetime: dt(1, 9, 0),
            loc_begin_datetime: dt(1, 10, 0),
            loc_end_datetime: end,
            returning_datetime: returned,
            price,
        }
    }

    #[tokio::test]
    async fn customer_crud_roundtrip() {
        let store = MemoryStore::new();
        let ada = customer("cus-1", "Ada", "Lovelace");

        store.create_customer(&ada).await.unwrap();
        assert_eq!(store.get_customer("cus-1").await.unwrap(), Some(ada));

        let update = CustomerUpdate {
            address: Some("1 avenue du Calcul".into()),
            ..CustomerUpdate::default()
        };
        assert!(store.update_customer("cus-1", &update).await.unwrap());

        let updated = store.get_customer("cus-1").await.unwrap().unwrap();
        assert_eq!(updated.address, "1 avenue du Calcul");
        assert_eq!(updated.first_name, "Ada");

        assert!(store.delete_customer("cus-1").await.unwrap());
        assert_eq!(store.get_customer("cus-1").await.unwrap(), None);
        // Second delete reports false, not an error.
        assert!(!store.delete_customer("cus-1").await.unwrap());
    }

    #[tokio::test]
    async fn customer_update_with_current_values_is_noop() {
        let store = MemoryStore::new();
        store
            .create_customer(&customer("cus-1", "Ada", "Lovelace"))
            .await
            .unwrap();

        let update = CustomerUpdate {
            first_name: Some("Ada".into()),
            ..CustomerUpdate::default()
        };
        assert!(!store.update_customer("cus-1", &update).await.unwrap());
    }

    #[tokio::test]
    async fn update_of_missing_customer_returns_false() {
        let store = MemoryStore::new();
        let update = CustomerUpdate {
            address: Some("somewhere".into()),
            ..CustomerUpdate::default()
        };
        assert!(!store.update_customer("ghost", &update).await.unwrap());
    }

    #[tokio::test]
    async fn find_customers_by_name_matches_both_fields() {
        let store = MemoryStore::new();
        store
            .create_customer(&customer("cus-1", "Ada", "Lovelace"))
            .await
            .unwrap();
        store
            .create_customer(&customer("cus-2", "Ada", "Byron"))
            .await
            .unwrap();
        store
            .create_customer(&customer("cus-3", "Ada", "Lovelace"))
            .await
            .unwrap();

        let found = store
            .find_customers_by_name("Ada", "Lovelace")
            .await
            .unwrap();
        let mut uids: Vec<_> = found.iter().map(|c| c.uid.as_str()).collect();
        uids.sort_unstable();
        assert_eq!(uids, ["cus-1", "cus-3"]);
    }

    #[tokio::test]
    async fn vehicle_plate_lookup_and_km_count() {
        let store = MemoryStore::new();
        store
            .create_vehicle(&vehicle("veh-1", "AB-123-CD", 30000))
            .await
            .unwrap();
        store
            .create_vehicle(&vehicle("veh-2", "EF-456-GH", 5000))
            .await
            .unwrap();
        store
            .create_vehicle(&vehicle("veh-3", "IJ-789-KL", 10000))
            .await
            .unwrap();

        let found = store.find_vehicle_by_plate("EF-456-GH").await.unwrap();
        assert_eq!(found.unwrap().uid, "veh-2");
        assert!(store
            .find_vehicle_by_plate("ZZ-000-ZZ")
            .await
            .unwrap()
            .is_none());

        // Strict comparisons: km = 10000 matches neither direction.
        assert_eq!(
            store
                .count_vehicles_by_km(10000, KmDirection::Gt)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .count_vehicles_by_km(10000, KmDirection::Lt)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn vehicle_update_clears_informations() {
        let store = MemoryStore::new();
        let mut veh = vehicle("veh-1", "AB-123-CD", 15000);
        veh.informations = Some("first hand".into());
        store.create_vehicle(&veh).await.unwrap();

        let update = VehicleUpdate {
            informations: Some(None),
            km: Some(30000),
            ..VehicleUpdate::default()
        };
        assert!(store.update_vehicle("veh-1", &update).await.unwrap());

        let updated = store.get_vehicle("veh-1").await.unwrap().unwrap();
        assert_eq!(updated.informations, None);
        assert_eq!(updated.km, 30000);
        assert_eq!(updated.licence_plate, "AB-123-CD");
    }

    #[tokio::test]
    async fn contract_crud_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let first = store
            .create_contract(rental("veh-1", "cus-1", dt(2, 10, 0), None, 100.0))
            .await
            .unwrap();
        let second = store
            .create_contract(rental("veh-2", "cus-2", dt(3, 10, 0), None, 200.0))
            .await
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let update = ContractUpdate {
            price: Some(150.0),
            returning_datetime: Some(Some(dt(2, 9, 0))),
            ..ContractUpdate::default()
        };
        assert!(store.update_contract(first.id, &update).await.unwrap());

        let updated = store.get_contract(first.id).await.unwrap().unwrap();
        assert_eq!(updated.price, 150.0);
        assert_eq!(updated.returning_datetime, Some(dt(2, 9, 0)));
        // Unspecified fields keep their prior values.
        assert_eq!(updated.vehicle_uid, "veh-1");
        assert_eq!(updated.loc_end_datetime, dt(2, 10, 0));

        assert!(store.delete_contract(first.id).await.unwrap());
        assert_eq!(store.get_contract(first.id).await.unwrap(), None);
        assert!(!store.delete_contract(first.id).await.unwrap());
    }

    #[tokio::test]
    async fn payment_against_missing_contract_is_a_constraint_violation() {
        let store = MemoryStore::new();
        let result = store.create_payment(999, 50.0).await;
        assert!(matches!(result, Err(StoreError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn contract_delete_is_blocked_while_payments_exist() {
        let store = MemoryStore::new();
        let contract = store
            .create_contract(rental("veh-1", "cus-1", dt(2, 10, 0), None, 100.0))
            .await
            .unwrap();
        let payment = store.create_payment(contract.id, 40.0).await.unwrap();

        let blocked = store.delete_contract(contract.id).await;
        assert!(matches!(blocked, Err(StoreError::ConstraintViolation(_))));

        assert!(store.delete_payment(payment.id).await.unwrap());
        assert!(store.delete_contract(contract.id).await.unwrap());
    }

    #[tokio::test]
    async fn fully_paid_semantics() {
        let store = MemoryStore::new();
        let unpaid = store
            .create_contract(rental("veh-1", "cus-1", dt(2, 10, 0), None, 100.0))
            .await
            .unwrap();
        let free = store
            .create_contract(rental("veh-1", "cus-1", dt(2, 10, 0), None, 0.0))
            .await
            .unwrap();

        // Zero payments against a positive price.
        assert!(!store.is_fully_paid(unpaid.id).await.unwrap());
        // Price of zero is fully paid regardless of payments.
        assert!(store.is_fully_paid(free.id).await.unwrap());
        // A missing contract is false, not an error.
        assert!(!store.is_fully_paid(999).await.unwrap());

        store.create_payment(unpaid.id, 60.0).await.unwrap();
        assert!(!store.is_fully_paid(unpaid.id).await.unwrap());
        store.create_payment(unpaid.id, 40.0).await.unwrap();
        assert!(store.is_fully_paid(unpaid.id).await.unwrap());
    }

    #[tokio::test]
    async fn unpaid_contracts_scenario() {
        let store = MemoryStore::new();
        let a = store
            .create_contract(rental("veh-1", "cus-1", dt(2, 10, 0), None, 100.0))
            .await
            .unwrap();
        let b = store
            .create_contract(rental("veh-2", "cus-2", dt(2, 10, 0), None, 100.0))
            .await
            .unwrap();
        store.create_payment(b.id, 100.0).await.unwrap();

        let unpaid = store.unpaid_contracts().await.unwrap();
        let ids: Vec<_> = unpaid.iter().map(|c| c.id).collect();
        assert_eq!(ids, [a.id]);
        assert!(store.is_fully_paid(b.id).await.unwrap());
    }

    #[tokio::test]
    async fn lateness_boundary_in_late_contracts() {
        let store = MemoryStore::new();
        let end = dt(2, 10, 0);
        // Returned exactly one hour after the end: on time.
        store
            .create_contract(rental("veh-1", "cus-1", end, Some(end + Duration::minutes(60)), 100.0))
            .await
            .unwrap();
        // Sixty-one minutes: late.
        let late = store
            .create_contract(rental("veh-2", "cus-2", end, Some(end + Duration::minutes(61)), 100.0))
            .await
            .unwrap();
        // Still open: never late.
        store
            .create_contract(rental("veh-3", "cus-3", end, None, 100.0))
            .await
            .unwrap();

        let found = store.late_contracts().await.unwrap();
        let ids: Vec<_> = found.iter().map(|c| c.id).collect();
        assert_eq!(ids, [late.id]);
    }

    #[tokio::test]
    async fn count_delays_bounds_are_inclusive() {
        let store = MemoryStore::new();
        for day in [2, 3, 4] {
            let end = dt(day, 10, 0);
            store
                .create_contract(rental("veh-1", "cus-1", end, Some(end + Duration::hours(3)), 50.0))
                .await
                .unwrap();
        }

        // Window covering exactly the first two scheduled ends.
        let counted = store.count_delays(dt(2, 10, 0), dt(3, 10, 0)).await.unwrap();
        assert_eq!(counted, 2);

        let all = store.count_delays(dt(1, 0, 0), dt(5, 0, 0)).await.unwrap();
        assert_eq!(all, 3);

        let none = store.count_delays(dt(5, 0, 0), dt(6, 0, 0)).await.unwrap();
        assert_eq!(none, 0);
    }

    #[tokio::test]
    async fn average_delay_excludes_on_time_contracts() {
        let store = MemoryStore::new();
        let end = dt(2, 10, 0);
        // Three hours late: 180 minutes.
        store
            .create_contract(rental("veh-1", "cus-1", end, Some(end + Duration::hours(3)), 100.0))
            .await
            .unwrap();
        // Thirty minutes past the end: inside the grace period, excluded
        // from both numerator and denominator.
        store
            .create_contract(rental("veh-1", "cus-1", end, Some(end + Duration::minutes(30)), 100.0))
            .await
            .unwrap();
        // Late rental of another vehicle and customer: 90 minutes.
        store
            .create_contract(rental("veh-2", "cus-2", end, Some(end + Duration::minutes(90)), 100.0))
            .await
            .unwrap();

        let by_vehicle = store.avg_delay_by_vehicle().await.unwrap();
        assert_eq!(by_vehicle.len(), 2);
        assert_eq!(by_vehicle[0].uid, "veh-1");
        assert!((by_vehicle[0].avg_delay_minutes - 180.0).abs() < f64::EPSILON);
        assert_eq!(by_vehicle[1].uid, "veh-2");
        assert!((by_vehicle[1].avg_delay_minutes - 90.0).abs() < f64::EPSILON);

        let by_customer = store.avg_delay_by_customer().await.unwrap();
        assert_eq!(by_customer.len(), 2);
        assert_eq!(by_customer[0].uid, "cus-1");
        assert!((by_customer[0].avg_delay_minutes - 180.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn active_contracts_reflect_reopening() {
        let store = MemoryStore::new();
        let past = Utc::now().naive_utc() - Duration::days(1);
        let future = Utc::now().naive_utc() + Duration::days(1);

        let mut open = rental("veh-1", "cus-1", past + Duration::hours(8), None, 100.0);
        open.loc_begin_datetime = past;
        let open = store.create_contract(open).await.unwrap();

        let mut not_begun = rental("veh-2", "cus-1", future + Duration::hours(8), None, 100.0);
        not_begun.loc_begin_datetime = future;
        store.create_contract(not_begun).await.unwrap();

        let active = store.active_contracts("cus-1").await.unwrap();
        let ids: Vec<_> = active.iter().map(|c| c.id).collect();
        assert_eq!(ids, [open.id]);

        // Returning the vehicle removes it from the active set.
        let update = ContractUpdate {
            returning_datetime: Some(Some(past + Duration::hours(9))),
            ..ContractUpdate::default()
        };
        store.update_contract(open.id, &update).await.unwrap();
        assert!(store.active_contracts("cus-1").await.unwrap().is_empty());

        // Clearing the return time reopens the rental.
        let reopen = ContractUpdate {
            returning_datetime: Some(None),
            ..ContractUpdate::default()
        };
        store.update_contract(open.id, &reopen).await.unwrap();
        let active = store.active_contracts("cus-1").await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn grouping_and_partitioning() {
        let store = MemoryStore::new();
        store
            .create_contract(rental("veh-1", "cus-1", dt(2, 10, 0), None, 100.0))
            .await
            .unwrap();
        store
            .create_contract(rental("veh-1", "cus-2", dt(2, 10, 0), None, 100.0))
            .await
            .unwrap();
        store
            .create_contract(rental("veh-2", "cus-1", dt(2, 10, 0), None, 100.0))
            .await
            .unwrap();

        let by_vehicle = store
            .group_contracts_by(GroupField::VehicleUid)
            .await
            .unwrap();
        assert_eq!(
            by_vehicle,
            [
                ContractCount {
                    uid: "veh-1".into(),
                    contracts: 2
                },
                ContractCount {
                    uid: "veh-2".into(),
                    contracts: 1
                },
            ]
        );

        let by_customer = store
            .group_contracts_by(GroupField::CustomerUid)
            .await
            .unwrap();
        assert_eq!(by_customer[0].contracts, 2);

        let of_customer = store.contracts_by_customer("cus-1").await.unwrap();
        assert_eq!(of_customer.len(), 2);
        let of_vehicle = store.contracts_by_vehicle("veh-2").await.unwrap();
        assert_eq!(of_vehicle.len(), 1);
    }

    #[tokio::test]
    async fn payments_listed_per_contract() {
        let store = MemoryStore::new();
        let a = store
            .create_contract(rental("veh-1", "cus-1", dt(2, 10, 0), None, 100.0))
            .await
            .unwrap();
        let b = store
            .create_contract(rental("veh-2", "cus-2", dt(2, 10, 0), None, 100.0))
            .await
            .unwrap();
        store.create_payment(a.id, 30.0).await.unwrap();
        store.create_payment(a.id, 20.0).await.unwrap();
        store.create_payment(b.id, 10.0).await.unwrap();

        let payments = store.payments_for_contract(a.id).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert!(payments.iter().all(|p| p.contract_id == a.id));

        let payment = payments[0].clone();
        assert!(store
            .update_payment_amount(payment.id, 35.0)
            .await
            .unwrap());
        let reread = store.get_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(reread.amount, 35.0);
        // Re-writing the same amount is a no-op.
        assert!(!store
            .update_payment_amount(payment.id, 35.0)
            .await
            .unwrap());
    }
}
