//! Outbound adapters implementing the driven ports: PostgreSQL persistence,
//! the in-memory store and mail delivery.

pub mod mail;
pub mod memory;
pub mod persistence;
