//! MySQL backend for contracts, billing and analytics.
//!
//! All analytics definitions are pushed down to SQL so the database does
//! the aggregation; the memory backend mirrors them in Rust. Lateness uses
//! the shared grace period from `easyloc_core`, bound as a parameter so the
//! two backends cannot drift.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::mysql::{MySql, MySqlPool, MySqlRow};
use sqlx::{QueryBuilder, Row};

use easyloc_core::{
    AverageDelay, Billing, Contract, ContractCount, ContractUpdate, GroupField, NewContract,
    LATE_GRACE_MINUTES,
};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::{BillingStore, ContractStore, RentalAnalytics};

/// Column list shared by every contract SELECT.
const CONTRACT_COLUMNS: &str = "id, vehicle_uid, customer_uid, sign_datetime, \
     loc_begin_datetime, loc_end_datetime, returning_datetime, price";

/// MySQL-backed storage for the relational side.
///
/// Holds a connection pool injected at construction; every call checks a
/// connection out for the duration of one statement.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Connect to MySQL using the given connection string.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(url).await?;
        tracing::info!("connected to MySQL");
        Ok(Self::new(pool))
    }

    /// Create the `contract` and `billing` tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in schema::all_tables() {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("relational schema ensured");
        Ok(())
    }
}

fn contract_from_row(row: &MySqlRow) -> sqlx::Result<Contract> {
    Ok(Contract {
        id: row.try_get("id")?,
        vehicle_uid: row.try_get("vehicle_uid")?,
        customer_uid: row.try_get("customer_uid")?,
        sign_datetime: row.try_get("sign_datetime")?,
        loc_begin_datetime: row.try_get("loc_begin_datetime")?,
        loc_end_datetime: row.try_get("loc_end_datetime")?,
        returning_datetime: row.try_get("returning_datetime")?,
        price: row.try_get("price")?,
    })
}

fn contracts_from_rows(rows: &[MySqlRow]) -> Result<Vec<Contract>> {
    rows.iter()
        .map(contract_from_row)
        .collect::<sqlx::Result<Vec<_>>>()
        .map_err(StoreError::from)
}

fn billing_from_row(row: &MySqlRow) -> sqlx::Result<Billing> {
    Ok(Billing {
        id: row.try_get("id")?,
        contract_id: row.try_get("contract_id")?,
        amount: row.try_get("amount")?,
    })
}

fn insert_id(raw: u64) -> Result<i64> {
    i64::try_from(raw).map_err(|_| StoreError::Serialization("insert id out of range".into()))
}

#[async_trait]
impl ContractStore for MySqlStore {
    async fn create_contract(&self, contract: NewContract) -> Result<Contract> {
        let result = sqlx::query(
            "INSERT INTO contract (vehicle_uid, customer_uid, sign_datetime, \
             loc_begin_datetime, loc_end_datetime, returning_datetime, price) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&contract.vehicle_uid)
        .bind(&contract.customer_uid)
        .bind(contract.sign_datetime)
        .bind(contract.loc_begin_datetime)
        .bind(contract.loc_end_datetime)
        .bind(contract.returning_datetime)
        .bind(contract.price)
        .execute(&self.pool)
        .await?;

        let id = insert_id(result.last_insert_id())?;
        Ok(contract.into_contract(id))
    }

    async fn get_contract(&self, id: i64) -> Result<Option<Contract>> {
        let row = sqlx::query(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contract WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(contract_from_row)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn update_contract(&self, id: i64, update: &ContractUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut builder = QueryBuilder::<MySql>::new("UPDATE contract SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(v) = &update.vehicle_uid {
                set.push("vehicle_uid = ").push_bind_unseparated(v);
            }
            if let Some(v) = &update.customer_uid {
                set.push("customer_uid = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.sign_datetime {
                set.push("sign_datetime = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.loc_begin_datetime {
                set.push("loc_begin_datetime = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.loc_end_datetime {
                set.push("loc_end_datetime = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.returning_datetime {
                set.push("returning_datetime = ").push_bind_unseparated(v);
            }
            if let Some(v) = update.price {
                set.push("price = ").push_bind_unseparated(v);
            }
        }
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_contract(&self, id: i64) -> Result<bool> {
        // The RESTRICT foreign key turns a delete of a billed contract
        // into a ConstraintViolation here.
        let result = sqlx::query("DELETE FROM contract WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BillingStore for MySqlStore {
    async fn create_payment(&self, contract_id: i64, amount: f64) -> Result<Billing> {
        let result = sqlx::query("INSERT INTO billing (contract_id, amount) VALUES (?, ?)")
            .bind(contract_id)
            .bind(amount)
            .execute(&self.pool)
            .await;
        let result = match result {
            Ok(r) => r,
            Err(e) => {
                let err = StoreError::from(e);
                if matches!(err, StoreError::ConstraintViolation(_)) {
                    tracing::warn!(contract_id, "payment rejected: unknown contract");
                }
                return Err(err);
            }
        };

        let id = insert_id(result.last_insert_id())?;
        Ok(Billing {
            id,
            contract_id,
            amount,
        })
    }

    async fn get_payment(&self, id: i64) -> Result<Option<Billing>> {
        let row = sqlx::query("SELECT id, contract_id, amount FROM billing WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(billing_from_row)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn update_payment_amount(&self, id: i64, amount: f64) -> Result<bool> {
        let result = sqlx::query("UPDATE billing SET amount = ? WHERE id = ?")
            .bind(amount)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_payment(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM billing WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RentalAnalytics for MySqlStore {
    async fn contracts_by_customer(&self, customer_uid: &str) -> Result<Vec<Contract>> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contract WHERE customer_uid = ? ORDER BY id"
        ))
        .bind(customer_uid)
        .fetch_all(&self.pool)
        .await?;
        contracts_from_rows(&rows)
    }

    async fn contracts_by_vehicle(&self, vehicle_uid: &str) -> Result<Vec<Contract>> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contract WHERE vehicle_uid = ? ORDER BY id"
        ))
        .bind(vehicle_uid)
        .fetch_all(&self.pool)
        .await?;
        contracts_from_rows(&rows)
    }

    async fn active_contracts(&self, customer_uid: &str) -> Result<Vec<Contract>> {
        let now = chrono::Utc::now().naive_utc();
        let rows = sqlx::query(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contract \
             WHERE customer_uid = ? AND loc_begin_datetime <= ? \
             AND returning_datetime IS NULL ORDER BY id"
        ))
        .bind(customer_uid)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        contracts_from_rows(&rows)
    }

    async fn late_contracts(&self) -> Result<Vec<Contract>> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contract \
             WHERE returning_datetime IS NOT NULL \
             AND returning_datetime > DATE_ADD(loc_end_datetime, INTERVAL ? MINUTE) \
             ORDER BY id"
        ))
        .bind(LATE_GRACE_MINUTES)
        .fetch_all(&self.pool)
        .await?;
        contracts_from_rows(&rows)
    }

    async fn payments_for_contract(&self, contract_id: i64) -> Result<Vec<Billing>> {
        let rows = sqlx::query(
            "SELECT id, contract_id, amount FROM billing WHERE contract_id = ? ORDER BY id",
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(billing_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }

    async fn is_fully_paid(&self, contract_id: i64) -> Result<bool> {
        let price: Option<f64> = sqlx::query_scalar("SELECT price FROM contract WHERE id = ?")
            .bind(contract_id)
            .fetch_optional(&self.pool)
            .await?;

        // A missing contract is never fully paid.
        let Some(price) = price else {
            return Ok(false);
        };

        let paid: f64 = sqlx::query_scalar(
            "SELECT CAST(COALESCE(SUM(amount), 0) AS DOUBLE) FROM billing WHERE contract_id = ?",
        )
        .bind(contract_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(paid >= price)
    }

    async fn unpaid_contracts(&self) -> Result<Vec<Contract>> {
        // Single aggregating join instead of the per-contract scan; same
        // rows, one round trip.
        let rows = sqlx::query(
            "SELECT c.id, c.vehicle_uid, c.customer_uid, c.sign_datetime, \
             c.loc_begin_datetime, c.loc_end_datetime, c.returning_datetime, c.price \
             FROM contract c \
             LEFT JOIN billing b ON b.contract_id = c.id \
             GROUP BY c.id, c.vehicle_uid, c.customer_uid, c.sign_datetime, \
             c.loc_begin_datetime, c.loc_end_datetime, c.returning_datetime, c.price \
             HAVING COALESCE(SUM(b.amount), 0) < c.price \
             ORDER BY c.id",
        )
        .fetch_all(&self.pool)
        .await?;
        contracts_from_rows(&rows)
    }

    async fn count_delays(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contract \
             WHERE returning_datetime IS NOT NULL \
             AND returning_datetime > DATE_ADD(loc_end_datetime, INTERVAL ? MINUTE) \
             AND loc_end_datetime BETWEEN ? AND ?",
        )
        .bind(LATE_GRACE_MINUTES)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn avg_delay_by_customer(&self) -> Result<Vec<AverageDelay>> {
        self.average_delays(GroupField::CustomerUid).await
    }

    async fn avg_delay_by_vehicle(&self) -> Result<Vec<AverageDelay>> {
        self.average_delays(GroupField::VehicleUid).await
    }

    async fn group_contracts_by(&self, field: GroupField) -> Result<Vec<ContractCount>> {
        // The column name comes from a closed enum, never from caller text.
        let column = field.column();
        let rows = sqlx::query(&format!(
            "SELECT {column} AS uid, COUNT(*) AS contracts \
             FROM contract GROUP BY {column} ORDER BY {column}"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ContractCount {
                    uid: row.try_get("uid")?,
                    contracts: row.try_get("contracts")?,
                })
            })
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }
}

impl MySqlStore {
    /// Shared query for the two average-delay groupings.
    ///
    /// Late contracts only: on-time rentals appear in neither the sum nor
    /// the count.
    async fn average_delays(&self, field: GroupField) -> Result<Vec<AverageDelay>> {
        let column = field.column();
        let rows = sqlx::query(&format!(
            "SELECT {column} AS uid, \
             CAST(AVG(TIMESTAMPDIFF(MINUTE, loc_end_datetime, returning_datetime)) AS DOUBLE) \
             AS avg_delay_minutes \
             FROM contract \
             WHERE returning_datetime IS NOT NULL \
             AND returning_datetime > DATE_ADD(loc_end_datetime, INTERVAL ? MINUTE) \
             GROUP BY {column} ORDER BY {column}"
        ))
        .bind(LATE_GRACE_MINUTES)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(AverageDelay {
                    uid: row.try_get("uid")?,
                    avg_delay_minutes: row.try_get("avg_delay_minutes")?,
                })
            })
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(StoreError::from)
    }
}
