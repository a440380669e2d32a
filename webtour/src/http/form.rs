use std::collections::HashMap;

use super::error::AppError;

pub type FormData = HashMap<String, String>;

/// Form field that must be present. The value is trimmed and may be empty.
pub fn field<'a>(form: &'a FormData, name: &'static str) -> Result<&'a str, AppError> {
    form.get(name)
        .map(|value| value.trim())
        .ok_or(AppError::MissingFormField(name))
}

/// Like [`field`], but a blank value counts as missing.
pub fn required<'a>(form: &'a FormData, name: &'static str) -> Result<&'a str, AppError> {
    field(form, name).and_then(|value| {
        if value.is_empty() {
            Err(AppError::MissingFormField(name))
        } else {
            Ok(value)
        }
    })
}
