//! Pure mapping from repository errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404
/// - `AlreadyExists`, `Conflict` -> 409
/// - `ConnectionFailed` -> 503
/// - `QueryFailed`, `Serialization` -> 500
/// - `InvalidData` -> 400
///
/// ```
/// use mediverse_core::storage::{repository_error_to_status_code, RepositoryError};
///
/// let error = RepositoryError::conflict("slot already booked");
/// assert_eq!(repository_error_to_status_code(&error), 409);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::Conflict(_) => 409,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_) => 500,
        RepositoryError::Serialization(_) => 500,
        RepositoryError::InvalidData(_) => 400,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let error = RepositoryError::not_found("Appointment", "a-1");
        assert_eq!(repository_error_to_status_code(&error), 404);
    }

    #[test]
    fn test_duplicates_and_conflicts_map_to_409() {
        let error = RepositoryError::AlreadyExists {
            entity_type: "Rating",
            id: "appt-1".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&error), 409);
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::conflict("already used")),
            409
        );
    }

    #[test]
    fn test_connection_failed_maps_to_503() {
        let error = RepositoryError::ConnectionFailed("database is locked".to_string());
        assert_eq!(repository_error_to_status_code(&error), 503);
    }

    #[test]
    fn test_internal_failures_map_to_500() {
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::QueryFailed("x".to_string())),
            500
        );
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::Serialization("x".to_string())),
            500
        );
    }

    #[test]
    fn test_invalid_data_maps_to_400() {
        let error = RepositoryError::InvalidData("unknown status".to_string());
        assert_eq!(repository_error_to_status_code(&error), 400);
    }
}
