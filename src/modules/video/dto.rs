use utoipa::ToSchema;

/// Multipart body of the upload endpoint, for the OpenAPI document only.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadVideoForm {
    /// The video file. Must be sent as `video/mp4`.
    #[schema(value_type = String, format = Binary)]
    pub video: Vec<u8>,
}
