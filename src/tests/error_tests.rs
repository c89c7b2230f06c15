#[cfg(test)]
mod tests {
    use crate::error::{AppError, FieldError};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::io;

    #[test]
    fn test_app_error_display() {
        let error = AppError::BadRequest("Invalid input".to_string());
        assert_eq!(format!("{}", error), "Bad request: Invalid input");

        let error = AppError::NotFound("Resource not found".to_string());
        assert_eq!(format!("{}", error), "Not found: Resource not found");

        let error = AppError::RateLimited { retry_after_seconds: 60 };
        assert_eq!(format!("{}", error), "Rate limited. Retry after 60 seconds");

        let error = AppError::NotConfigured("missing key".to_string());
        assert_eq!(format!("{}", error), "Not configured: missing key");
    }

    #[test]
    fn test_app_error_into_response() {
        let error = AppError::BadRequest("Test error".to_string());
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);

        let error = AppError::NotFound("Not found".to_string());
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);

        let error = AppError::ServiceUnavailable("Service down".to_string());
        assert_eq!(error.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let error = AppError::RateLimited { retry_after_seconds: 30 };
        assert_eq!(error.into_response().status(), StatusCode::TOO_MANY_REQUESTS);

        let error = AppError::Snapshot("missing file".to_string());
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let error = AppError::Validation(vec![FieldError::new("email", "required")]);
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();

        match app_error {
            AppError::IoError(msg) => {
                assert!(msg.contains("File not found"));
            }
            _ => panic!("Expected IoError variant"),
        }
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let app_error: AppError = sqlx::Error::RowNotFound.into();
        match app_error {
            AppError::NotFound(msg) => assert!(msg.contains("Record not found")),
            _ => panic!("Expected NotFound variant"),
        }
    }

    #[test]
    fn test_mask_email() {
        use crate::mailer::mask_email;
        assert_eq!(mask_email("jane.doe@example.org"), "ja***@example.org");
        assert_eq!(mask_email("a@b.co"), "a***@b.co");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
