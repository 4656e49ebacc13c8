//! MongoDB backend for customer and vehicle master data.
//!
//! Documents are keyed by the application-level `uid` field, never by the
//! store's `_id`. Collections keep the capitalized names of the deployed
//! database (`Customer`, `Vehicle`). Uniqueness of `uid` is advisory: no
//! unique index is created and duplicates are not rejected.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection, Database};

use easyloc_core::{Customer, CustomerUpdate, KmDirection, Vehicle, VehicleUpdate};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::{CustomerStore, VehicleStore};

/// Collection holding customer documents.
const CUSTOMER_COLLECTION: &str = "Customer";

/// Collection holding vehicle documents.
const VEHICLE_COLLECTION: &str = "Vehicle";

/// MongoDB-backed storage for the document side.
pub struct MongoStore {
    customers: Collection<Customer>,
    vehicles: Collection<Vehicle>,
}

impl MongoStore {
    /// Wrap an existing database handle.
    #[must_use]
    pub fn new(db: &Database) -> Self {
        Self {
            customers: db.collection(CUSTOMER_COLLECTION),
            vehicles: db.collection(VEHICLE_COLLECTION),
        }
    }

    /// Connect to MongoDB and verify the server responds to a ping.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the server cannot be reached.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.mongo_url).await?;
        let db = client.database(&config.mongo_database);
        db.run_command(doc! { "ping": 1 }).await?;
        tracing::info!(database = %config.mongo_database, "connected to MongoDB");
        Ok(Self::new(&db))
    }
}

/// Render an insert result's `_id` as a string.
fn inserted_id_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

/// `$set` document for a customer update; empty when nothing changes.
fn customer_set(update: &CustomerUpdate) -> Document {
    let mut set = Document::new();
    if let Some(v) = &update.first_name {
        set.insert("first_name", v.as_str());
    }
    if let Some(v) = &update.second_name {
        set.insert("second_name", v.as_str());
    }
    if let Some(v) = &update.address {
        set.insert("address", v.as_str());
    }
    if let Some(v) = &update.permit_number {
        set.insert("permit_number", v.as_str());
    }
    set
}

/// `$set` document for a vehicle update. A cleared `informations` is
/// written as an explicit null so the field does not keep its old value.
fn vehicle_set(update: &VehicleUpdate) -> Document {
    let mut set = Document::new();
    if let Some(v) = &update.licence_plate {
        set.insert("licence_plate", v.as_str());
    }
    if let Some(v) = &update.informations {
        match v {
            Some(text) => set.insert("informations", text.as_str()),
            None => set.insert("informations", Bson::Null),
        };
    }
    if let Some(v) = update.km {
        set.insert("km", v);
    }
    set
}

#[async_trait]
impl CustomerStore for MongoStore {
    async fn create_customer(&self, customer: &Customer) -> Result<String> {
        let result = self.customers.insert_one(customer).await?;
        Ok(inserted_id_string(&result.inserted_id))
    }

    async fn get_customer(&self, uid: &str) -> Result<Option<Customer>> {
        let found = self.customers.find_one(doc! { "uid": uid }).await?;
        Ok(found)
    }

    async fn find_customers_by_name(
        &self,
        first_name: &str,
        second_name: &str,
    ) -> Result<Vec<Customer>> {
        let cursor = self
            .customers
            .find(doc! { "first_name": first_name, "second_name": second_name })
            .await?;
        let customers = cursor.try_collect().await?;
        Ok(customers)
    }

    async fn update_customer(&self, uid: &str, update: &CustomerUpdate) -> Result<bool> {
        let set = customer_set(update);
        if set.is_empty() {
            return Ok(false);
        }
        let result = self
            .customers
            .update_one(doc! { "uid": uid }, doc! { "$set": set })
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn delete_customer(&self, uid: &str) -> Result<bool> {
        let result = self.customers.delete_one(doc! { "uid": uid }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl VehicleStore for MongoStore {
    async fn create_vehicle(&self, vehicle: &Vehicle) -> Result<String> {
        let result = self.vehicles.insert_one(vehicle).await?;
        Ok(inserted_id_string(&result.inserted_id))
    }

    async fn get_vehicle(&self, uid: &str) -> Result<Option<Vehicle>> {
        let found = self.vehicles.find_one(doc! { "uid": uid }).await?;
        Ok(found)
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<Vehicle>> {
        let found = self
            .vehicles
            .find_one(doc! { "licence_plate": plate })
            .await?;
        Ok(found)
    }

    async fn count_vehicles_by_km(&self, threshold: i64, direction: KmDirection) -> Result<u64> {
        let comparison = match direction {
            KmDirection::Gt => doc! { "$gt": threshold },
            KmDirection::Lt => doc! { "$lt": threshold },
        };
        let count = self
            .vehicles
            .count_documents(doc! { "km": comparison })
            .await?;
        Ok(count)
    }

    async fn update_vehicle(&self, uid: &str, update: &VehicleUpdate) -> Result<bool> {
        let set = vehicle_set(update);
        if set.is_empty() {
            return Ok(false);
        }
        let result = self
            .vehicles
            .update_one(doc! { "uid": uid }, doc! { "$set": set })
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn delete_vehicle(&self, uid: &str) -> Result<bool> {
        let result = self.vehicles.delete_one(doc! { "uid": uid }).await?;
        Ok(result.deleted_count > 0)
    }
}
