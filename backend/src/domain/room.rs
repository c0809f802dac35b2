//! Bookable rooms.

use serde::Serialize;

use super::RoomId;

/// Maximum characters accepted for a room name.
pub const ROOM_NAME_MAX: usize = 100;
/// Maximum characters accepted for a room description.
pub const ROOM_DESCRIPTION_MAX: usize = 500;

/// Validation failures for room fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomValidationError {
    #[error("room name must not be empty")]
    EmptyName,
    #[error("room name must be at most {} characters", ROOM_NAME_MAX)]
    NameTooLong,
    #[error("room description must be at most {} characters", ROOM_DESCRIPTION_MAX)]
    DescriptionTooLong,
}

/// Fields for a room that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    name: String,
    description: Option<String>,
}

impl NewRoom {
    /// Validate name and description lengths.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, RoomValidationError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(RoomValidationError::EmptyName);
        }
        if name.chars().count() > ROOM_NAME_MAX {
            return Err(RoomValidationError::NameTooLong);
        }
        if description
            .as_deref()
            .is_some_and(|text| text.chars().count() > ROOM_DESCRIPTION_MAX)
        {
            return Err(RoomValidationError::DescriptionTooLong);
        }
        Ok(Self { name, description })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A stored room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    id: RoomId,
    name: String,
    description: Option<String>,
}

impl Room {
    /// Attach a stored identifier to validated fields.
    #[must_use]
    pub fn new(id: RoomId, fields: NewRoom) -> Self {
        Self {
            id,
            name: fields.name,
            description: fields.description,
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
