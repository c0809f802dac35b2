//! Shared validation helpers for inbound HTTP adapters.

use actix_web::web;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::json;

use crate::domain::{BookingValidationError, Error};

/// Naive timestamps are read as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidTimestamp,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

pub(crate) const ROOM_ID: FieldName = FieldName::new("roomId");
pub(crate) const START: FieldName = FieldName::new("start");
pub(crate) const END: FieldName = FieldName::new("end");
pub(crate) const NAME: FieldName = FieldName::new("name");
pub(crate) const EMAIL: FieldName = FieldName::new("email");
pub(crate) const PURPOSE: FieldName = FieldName::new("purpose");

fn field_error(field: FieldName, message: impl Into<String>, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("missing required field: {name}"),
        ErrorCode::MissingField,
    )
}

/// Unwrap an optional payload field, treating blank strings as missing.
pub(crate) fn require_text(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| missing_field_error(field))
}

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn invalid_timestamp_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("{name} must be an ISO 8601 timestamp")).with_details(json!({
        "field": name,
        "value": value,
        "code": ErrorCode::InvalidTimestamp.as_str(),
    }))
}

/// Parse RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS]` read as UTC.
pub(crate) fn parse_timestamp(value: &str, field: FieldName) -> Result<DateTime<Utc>, Error> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| invalid_timestamp_error(field, value))
}

/// JSON body settings reporting malformed payloads as `invalid_request`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid JSON payload: {err}")).into()
    })
}

/// Query string settings reporting malformed parameters as `invalid_request`.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid query string: {err}")).into()
    })
}

/// Attach the offending field to a domain validation failure.
pub(crate) fn map_booking_validation_error(err: BookingValidationError) -> Error {
    let field = match err {
        BookingValidationError::EmptyInterval => END,
        BookingValidationError::EmptyName | BookingValidationError::NameTooLong { .. } => NAME,
        BookingValidationError::InvalidEmail | BookingValidationError::EmailTooLong { .. } => {
            EMAIL
        }
        BookingValidationError::PurposeTooLong { .. } => PURPOSE,
    };
    field_error(field, err.to_string(), ErrorCode::InvalidValue)
}
