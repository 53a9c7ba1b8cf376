use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart};

use crate::types::errors::{ApiError, ApiResult, FieldErrors};

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// A fully buffered multipart body: text fields and file parts by name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn collect(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read '{name}': {e}")))?;
                    form.files.insert(name, UploadedFile { file_name, bytes });
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read '{name}': {e}")))?;
                    form.texts.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.texts.get(key).map(String::as_str)
    }

    pub fn take_file(&mut self, key: &str) -> Option<UploadedFile> {
        self.files.remove(key)
    }

    /// Checkbox-style boolean. Absent means `false`.
    pub fn flag(&self, errors: &mut FieldErrors, key: &str) -> bool {
        match self.text(key).map(|v| v.trim().to_ascii_lowercase()) {
            None => false,
            Some(v) => match v.as_str() {
                "true" | "1" | "on" | "yes" => true,
                "false" | "0" | "off" | "no" | "" => false,
                _ => {
                    errors.add(key, "Must be a valid boolean.");
                    false
                }
            },
        }
    }

    /// Positive integer id field; records an error when missing or malformed.
    pub fn id(&self, errors: &mut FieldErrors, key: &str) -> Option<i64> {
        match self.text(key).map(str::trim).filter(|v| !v.is_empty()) {
            None => {
                errors.add(key, "This field is required.");
                None
            }
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add(key, "A valid integer is required.");
                    None
                }
            },
        }
    }
}
