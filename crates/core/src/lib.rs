#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Theaterkasse reservation service.
//!
//! This crate hosts the data model, configuration handling, ledger
//! persistence, and the admission control rules used by the HTTP
//! frontend and any future frontends.

pub mod admission;
pub mod config;
pub mod ledger;
pub mod models;

pub use admission::{
    AdmissionController, AdmissionError, AdmissionReceipt, ReservationRequest, StatusView,
};
pub use config::AppConfig;
pub use ledger::{JsonLedgerStore, LedgerStore, MemoryLedgerStore};
pub use models::{Day, DayStatus, Ledger, Reservation, MAX_PERSONS_PER_DAY};
