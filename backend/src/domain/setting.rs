//! Operational key/value settings.

use serde::Serialize;

/// Key holding the secondary notification address for the hall contact.
pub const HALL_CONTACT_EMAIL_KEY: &str = "hall_contact_email";
/// Description stored alongside [`HALL_CONTACT_EMAIL_KEY`].
pub const HALL_CONTACT_EMAIL_DESCRIPTION: &str =
    "Email address of the person responsible for the hall";

/// A stored setting row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

impl Setting {
    /// Build a setting row.
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description,
        }
    }
}
