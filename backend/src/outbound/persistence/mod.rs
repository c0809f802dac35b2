//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories translate between Diesel rows (`models.rs`, `schema.rs`) and
//! domain types and keep no business rules of their own: the booking
//! repository delegates every admission and transition decision to
//! `domain::lifecycle` inside its transaction.
//!
//! # Example
//!
//! ```ignore
//! use hall_booking::outbound::persistence::{DbPool, DieselBookingRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/bookings")).await?;
//! let repo = DieselBookingRepository::new(pool);
//! ```

mod diesel_booking_repository;
mod diesel_error_mapping;
mod diesel_room_repository;
mod diesel_settings_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_room_repository::DieselRoomRepository;
pub use diesel_settings_repository::DieselSettingsRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
