use crate::{error::ApiError, events::repo_types::EventFields};

const MIN_NAME_LEN: usize = 3;
const MIN_DESCRIPTION_LEN: usize = 10;
const MIN_LOCATION_LEN: usize = 3;

/// Request body for creating or replacing an event.
pub type EventRequest = EventFields;

pub fn validate_event(body: &EventRequest) -> Result<(), ApiError> {
    let checks = [
        ("name", &body.name, MIN_NAME_LEN),
        ("description", &body.description, MIN_DESCRIPTION_LEN),
        ("location", &body.location, MIN_LOCATION_LEN),
    ];
    for (field, value, min) in checks {
        if value.trim().chars().count() < min {
            return Err(ApiError::Validation(format!(
                "{field} must be at least {min} characters"
            )));
        }
    }
    Ok(())
}
