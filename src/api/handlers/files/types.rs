use utoipa::ToSchema;

/// Multipart form accepted by upload and update. Documentation only; the
/// handlers read the parts directly off the stream.
#[derive(ToSchema)]
pub struct UploadForm {
    /// File content. The part's file name and content type are recorded.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Free-form description stored with the record.
    pub description: Option<String>,
}

#[derive(serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
