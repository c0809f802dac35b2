//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the embedded migrations exactly. Regenerate
//! with `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Bookable rooms. Seeded with one room on first start.
    rooms (id) {
        id -> Int8,
        name -> Varchar,
        description -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Booking requests and their lifecycle state.
    ///
    /// Rows are never physically deleted; `is_active` and `deleted_at`
    /// implement soft deletion.
    bookings (id) {
        id -> Int8,
        room_id -> Int8,
        starts_at -> Timestamptz,
        ends_at -> Timestamptz,
        requester_name -> Varchar,
        requester_email -> Varchar,
        purpose -> Nullable<Varchar>,
        /// One of `pending`, `confirmed` or `rejected`.
        status -> Varchar,
        is_active -> Bool,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Operational key/value settings.
    settings (key) {
        key -> Varchar,
        value -> Varchar,
        description -> Nullable<Varchar>,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(bookings -> rooms (room_id));
diesel::allow_tables_to_appear_in_same_query!(bookings, rooms, settings);
