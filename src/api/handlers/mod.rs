pub mod admin;
pub mod admin_content;
pub mod auth;
pub mod content;
pub mod forms;
pub mod root;
pub mod shuttle;

use crate::{domain::Locale, error::AppError};

/// Resolves the `:locale` path segment; unknown locales are not routes.
pub(crate) fn path_locale(locale: &str) -> Result<Locale, AppError> {
    Locale::from_str(locale).ok_or_else(|| AppError::NotFound("Page not found".to_string()))
}
