//! Collects a multipart form into text fields and file parts.

use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart, http::StatusCode};

use crate::uploads::UploadError;

pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Default)]
pub struct MultipartForm {
    pub text: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn collect(mut multipart: Multipart, max_bytes: usize) -> Result<Self, UploadError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| malformed(e, max_bytes))? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                // An empty file input is sent as a part without a file name.
                Some(file_name) if !file_name.is_empty() => {
                    let bytes = field.bytes().await.map_err(|e| malformed(e, max_bytes))?;
                    form.files.insert(name, UploadedFile { file_name, bytes });
                }
                Some(_) => {}
                None => {
                    let value = field.text().await.map_err(|e| malformed(e, max_bytes))?;
                    form.text.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> String {
        self.text.get(name).cloned().unwrap_or_default()
    }

    pub fn optional_text(&self, name: &str) -> Option<String> {
        self.text.get(name).cloned()
    }

    pub fn file(&self, name: &str) -> Result<&UploadedFile, UploadError> {
        self.files.get(name).ok_or(UploadError::Empty)
    }
}

fn malformed(err: axum::extract::multipart::MultipartError, max_bytes: usize) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge {
            max_mib: max_bytes.div_ceil(1024 * 1024),
        }
    } else {
        UploadError::Malformed(err.body_text())
    }
}
