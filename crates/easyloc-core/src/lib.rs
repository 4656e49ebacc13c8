//! Core domain types for the EasyLoc rental data layer.
//!
//! This crate holds the plain types shared by every storage backend:
//!
//! - **Documents**: [`Customer`], [`Vehicle`] with their typed partial
//!   updates, keyed by a caller-supplied string `uid`
//! - **Relational rows**: [`Contract`], [`Billing`], store-assigned ids
//! - **Analytics**: [`GroupField`], [`AverageDelay`], [`ContractCount`]
//!
//! Contracts reference vehicles and customers by **soft reference**: the
//! `vehicle_uid` / `customer_uid` strings are expected to match documents in
//! the other store, but nothing enforces it and nothing cascades across
//! stores. The only enforced relation is the Billing → Contract foreign key
//! inside the relational store.
//!
//! Derived predicates (lateness with its one-hour grace period, activity,
//! delay in minutes) live on [`Contract`] so every backend answers them
//! identically.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod analytics;
pub mod billing;
pub mod contract;
pub mod customer;
pub mod error;
pub mod vehicle;

pub use analytics::{AverageDelay, ContractCount, GroupField};
pub use billing::Billing;
pub use contract::{Contract, ContractUpdate, NewContract, LATE_GRACE_MINUTES};
pub use customer::{Customer, CustomerUpdate};
pub use error::ArgumentError;
pub use vehicle::{KmDirection, Vehicle, VehicleUpdate};
