//! Payment Callbacks - Verified, idempotent ingestion of payment provider callbacks
//!
//! This crate receives asynchronous payment notifications from Duitku, Tripay
//! and Xendit, authenticates each one against the provider's signature scheme,
//! normalizes it into a provider-agnostic event and applies it to order state
//! at most once.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
