//! Storage layer for the EasyLoc rental data layer.
//!
//! Master data (customers, vehicles) lives in a document store; contracts
//! and billing rows live in a relational store. The two are linked only by
//! soft references: plain-string uids with no enforced integrity and no
//! atomicity across stores. Each operation is a single request/response
//! exchange against one store; there are no multi-call transactions.
//!
//! # Backends
//!
//! - [`MongoStore`]: customers and vehicles, collections `Customer` and
//!   `Vehicle`
//! - [`MySqlStore`]: contracts, billing and all analytics queries
//! - [`MemoryStore`]: in-process implementation of every trait, used by the
//!   test suite and as the reference for the analytics definitions
//!
//! Store handles are injected at construction; the surrounding process owns
//! their lifetime.
//!
//! # Example
//!
//! ```no_run
//! use easyloc_store::{MemoryStore, CustomerStore};
//! use easyloc_core::Customer;
//!
//! # async fn demo() -> easyloc_store::Result<()> {
//! let store = MemoryStore::new();
//! store
//!     .create_customer(&Customer {
//!         uid: "cus-1".into(),
//!         first_name: "Ada".into(),
//!         second_name: "Lovelace".into(),
//!         address: "12 rue des Maths".into(),
//!         permit_number: "PERMIT-42".into(),
//!     })
//!     .await?;
//! let found = store.get_customer("cus-1").await?;
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod mysql;
pub mod schema;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use mysql::MySqlStore;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use easyloc_core::{
    AverageDelay, Billing, Contract, ContractCount, ContractUpdate, Customer, CustomerUpdate,
    GroupField, KmDirection, NewContract, Vehicle, VehicleUpdate,
};

/// CRUD over customer documents, keyed by the caller-supplied `uid`.
///
/// Duplicate uids are not rejected here; uniqueness is advisory.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Insert a customer document.
    ///
    /// Returns the store-native identifier of the new document as a string
    /// (not the application `uid`).
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn create_customer(&self, customer: &Customer) -> Result<String>;

    /// Get a customer by `uid`. Absence is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn get_customer(&self, uid: &str) -> Result<Option<Customer>>;

    /// All customers matching both names exactly. Order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn find_customers_by_name(
        &self,
        first_name: &str,
        second_name: &str,
    ) -> Result<Vec<Customer>>;

    /// Apply a partial update to the customer with this `uid`.
    ///
    /// Returns `true` iff a document matched and was actually modified;
    /// re-writing the current values is a no-op and returns `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn update_customer(&self, uid: &str, update: &CustomerUpdate) -> Result<bool>;

    /// Delete the customer with this `uid`.
    ///
    /// Returns `true` iff a document was removed; a second delete of the
    /// same `uid` returns `false`, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn delete_customer(&self, uid: &str) -> Result<bool>;
}

/// CRUD over vehicle documents, plus plate lookup and odometer counting.
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Insert a vehicle document. Returns the store-native identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn create_vehicle(&self, vehicle: &Vehicle) -> Result<String>;

    /// Get a vehicle by `uid`. Absence is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn get_vehicle(&self, uid: &str) -> Result<Option<Vehicle>>;

    /// Find a vehicle by exact licence plate.
    ///
    /// At most one result; the first match wins if duplicates exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<Vehicle>>;

    /// Count vehicles whose odometer is strictly above (`Gt`) or strictly
    /// below (`Lt`) the threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn count_vehicles_by_km(&self, threshold: i64, direction: KmDirection) -> Result<u64>;

    /// Apply a partial update to the vehicle with this `uid`.
    ///
    /// Returns `true` iff a document matched and was actually modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn update_vehicle(&self, uid: &str, update: &VehicleUpdate) -> Result<bool>;

    /// Delete the vehicle with this `uid`. Returns `true` iff removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn delete_vehicle(&self, uid: &str) -> Result<bool>;
}

/// CRUD over contract rows. The store assigns the integer `id`.
#[async_trait]
pub trait ContractStore: Send + Sync {
    /// Insert a contract and return the persisted row with its new `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn create_contract(&self, contract: NewContract) -> Result<Contract>;

    /// Get a contract by `id`. Absence is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn get_contract(&self, id: i64) -> Result<Option<Contract>>;

    /// Apply a partial update; unspecified fields keep their prior values.
    ///
    /// Returns `true` iff a row matched and was actually modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn update_contract(&self, id: i64, update: &ContractUpdate) -> Result<bool>;

    /// Delete the contract with this `id`. Returns `true` iff removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConstraintViolation` if billing rows still
    /// reference the contract (deletes do not cascade).
    async fn delete_contract(&self, id: i64) -> Result<bool>;
}

/// CRUD over billing rows (payments against a contract).
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Record a payment against a contract.
    ///
    /// The contract's existence is not pre-checked here; the relational
    /// foreign key is the enforcement mechanism.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConstraintViolation` if `contract_id` does not
    /// reference an existing contract.
    async fn create_payment(&self, contract_id: i64, amount: f64) -> Result<Billing>;

    /// Get a billing row by `id`. Absence is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn get_payment(&self, id: i64) -> Result<Option<Billing>>;

    /// Replace the amount of a billing row.
    ///
    /// Returns `true` iff a row matched and was actually modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn update_payment_amount(&self, id: i64, amount: f64) -> Result<bool>;

    /// Delete the billing row with this `id`. Returns `true` iff removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn delete_payment(&self, id: i64) -> Result<bool>;
}

/// Read-only derived queries over contracts and billing.
///
/// The definitions are deliberately asymmetric; see each method. "Late"
/// always means returned more than one hour past the scheduled end, with a
/// strict boundary.
#[async_trait]
pub trait RentalAnalytics: Send + Sync {
    /// All contracts of a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn contracts_by_customer(&self, customer_uid: &str) -> Result<Vec<Contract>>;

    /// All contracts of a vehicle.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn contracts_by_vehicle(&self, vehicle_uid: &str) -> Result<Vec<Contract>>;

    /// Contracts of a customer that have begun and are not yet returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn active_contracts(&self, customer_uid: &str) -> Result<Vec<Contract>>;

    /// All late contracts.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn late_contracts(&self) -> Result<Vec<Contract>>;

    /// All payments recorded against a contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn payments_for_contract(&self, contract_id: i64) -> Result<Vec<Billing>>;

    /// Whether the summed payments reach the contract price.
    ///
    /// A missing contract is `false`, not an error; zero payments sum to 0,
    /// so a zero-priced contract is always fully paid.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn is_fully_paid(&self, contract_id: i64) -> Result<bool>;

    /// Contracts whose paid sum is strictly below their price.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn unpaid_contracts(&self) -> Result<Vec<Contract>>;

    /// Number of late contracts whose scheduled end falls in
    /// `[start, end]`, both bounds inclusive.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn count_delays(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<u64>;

    /// Average delay in minutes per customer, over late contracts only.
    ///
    /// On-time contracts are excluded from both the sum and the count, so
    /// this is the mean delay among delayed rentals.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn avg_delay_by_customer(&self) -> Result<Vec<AverageDelay>>;

    /// Average delay in minutes per vehicle, over late contracts only.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn avg_delay_by_vehicle(&self) -> Result<Vec<AverageDelay>>;

    /// Contract counts grouped by one of the two uid columns.
    ///
    /// The field is a closed enum; free-text field names must be parsed
    /// (and possibly rejected) before reaching this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    async fn group_contracts_by(&self, field: GroupField) -> Result<Vec<ContractCount>>;
}
