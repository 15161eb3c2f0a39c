//! Credential storage for PassVault.
//!
//! This module provides a trait-based interface over the relational store of
//! users and their site credentials, and a SQLite implementation of it.
//!
//! # Design Principles
//! - Ciphertext in, ciphertext out: the store never sees plaintext secrets
//! - Owner scoping: credential mutations are always filtered by owner
//! - Integrity in the database: foreign keys and cascades are enforced by SQLite

pub mod models;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use models::{SiteCredential, StoreStats, User};
pub use sqlite::SqliteStore;
pub use store::CredentialStore;
