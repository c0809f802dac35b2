//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, notifier) are implemented in
//! `crate::outbound`; driving ports (commands, queries, authenticator) are
//! implemented by domain services and consumed by `crate::inbound`.

mod macros;
pub(crate) use macros::{define_port_error, define_store_error};

mod admin_authenticator;
mod booking_command;
mod booking_notifier;
mod booking_query;
mod booking_repository;
mod room_repository;
mod settings_command;
mod settings_repository;

#[cfg(test)]
pub use admin_authenticator::MockAdminAuthenticator;
pub use admin_authenticator::AdminAuthenticator;
#[cfg(test)]
pub use booking_command::MockBookingCommand;
pub use booking_command::{
    BookingCommand, CreateBookingResponse, EmailDecision, EmailDecisionOutcome,
};
#[cfg(test)]
pub use booking_notifier::MockBookingNotifier;
pub use booking_notifier::{BookingNotifier, NotificationError};
#[cfg(test)]
pub use booking_query::MockBookingQuery;
pub use booking_query::{
    BookingLogEntry, BookingQuery, DEFAULT_LOG_LIMIT, ListBookingsRequest, MAX_LOG_LIMIT,
};
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{BookingRepository, BookingRepositoryError, BookingWriteError};
#[cfg(test)]
pub use room_repository::MockRoomRepository;
pub use room_repository::{RoomRepository, RoomRepositoryError};
#[cfg(test)]
pub use settings_command::MockSettingsCommand;
pub use settings_command::{NotificationSettings, SettingsCommand};
#[cfg(test)]
pub use settings_repository::MockSettingsRepository;
pub use settings_repository::{SettingsRepository, SettingsRepositoryError};
