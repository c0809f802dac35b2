//! HTTP inbound adapter exposing the booking API and email link pages.

pub mod admin;
pub mod bookings;
pub mod error;
pub mod health;
pub mod rate_limit;
pub mod rooms;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod token_links;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register the JSON API. Mount under `/api` inside the session middleware.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(validation::json_config())
        .app_data(validation::query_config())
        .service(rooms::list_rooms)
        .service(bookings::list_bookings)
        .service(bookings::create_booking)
        .service(bookings::confirm_booking)
        .service(bookings::reject_booking)
        .service(bookings::delete_booking)
        .service(admin::verify_pin)
        .service(admin::logout)
        .service(admin::list_logs)
        .service(admin::get_stats)
        .service(admin::get_settings)
        .service(admin::update_hall_contact_email);
}

/// Register the email link pages and health probes at the root.
pub fn configure_pages(cfg: &mut web::ServiceConfig) {
    cfg.service(token_links::confirm_link)
        .service(token_links::reject_link)
        .service(token_links::cancel_link)
        .service(health::ready)
        .service(health::live);
}
