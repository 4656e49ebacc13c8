//! Relational schema definitions.
//!
//! Two tables: `contract` and `billing`, with the only enforced relation of
//! the whole system — the `billing.contract_id` foreign key. It is declared
//! `ON DELETE RESTRICT`: a contract with live billing rows cannot be
//! deleted (block-if-exists, no cascade).

/// DDL statements, in creation order.
pub mod ddl {
    /// The `contract` table. Ids are store-assigned; the two uid columns
    /// are soft references into the document store.
    pub const CONTRACT: &str = "\
CREATE TABLE IF NOT EXISTS contract (
    id                  BIGINT       NOT NULL AUTO_INCREMENT PRIMARY KEY,
    vehicle_uid         VARCHAR(255) NOT NULL,
    customer_uid        VARCHAR(255) NOT NULL,
    sign_datetime       DATETIME     NOT NULL,
    loc_begin_datetime  DATETIME     NOT NULL,
    loc_end_datetime    DATETIME     NOT NULL,
    returning_datetime  DATETIME     NULL,
    price               DOUBLE       NOT NULL
)";

    /// The `billing` table. `contract_id` is the enforced foreign key.
    pub const BILLING: &str = "\
CREATE TABLE IF NOT EXISTS billing (
    id           BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    contract_id  BIGINT NOT NULL,
    amount       DOUBLE NOT NULL,
    CONSTRAINT fk_billing_contract FOREIGN KEY (contract_id)
        REFERENCES contract (id) ON DELETE RESTRICT
)";
}

/// Returns all DDL statements in dependency order.
#[must_use]
pub fn all_tables() -> Vec<&'static str> {
    vec![ddl::CONTRACT, ddl::BILLING]
}
