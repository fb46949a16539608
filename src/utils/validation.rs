use thiserror::Error;

/// Content type recorded when the client does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

/// Reduces a client-supplied name to its final path component and replaces
/// characters that are reserved in object keys or on common filesystems.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from file name: {}", filename);
    }

    if name.is_empty() || name == "." || name == ".." {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.len() > 255 {
        return Err(ValidationError {
            code: "FILENAME_TOO_LONG",
            message: "Filename exceeds 255 bytes".to_string(),
        });
    }

    Ok(sanitized)
}

/// Falls back to [`DEFAULT_CONTENT_TYPE`] for a missing or blank type.
pub fn content_type_or_default(declared: Option<&str>) -> String {
    match declared.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => DEFAULT_CONTENT_TYPE.to_string(),
    }
}
