pub mod api;
pub mod config;
pub mod db;
pub mod demo;
pub mod domain;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod query;
pub mod repo;
pub mod validate;
pub mod workspace;

#[cfg(test)]
mod tests {
    use super::error::{AppError, FieldError};

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("DB_TEST", "db failed").with_retryable(true);
        assert_eq!(err.code, "DB_TEST");
        assert_eq!(err.message, "db failed");
        assert!(err.retryable);
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn app_error_status_follows_code() {
        let validation = AppError::validation(vec![FieldError::new("page", "bad")]);
        assert_eq!(validation.status(), 400);
        assert_eq!(AppError::not_found("gone").status(), 404);
    }
}
