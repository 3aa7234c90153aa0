use crate::adapters::object_store::ObjectUpload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    pub part_number: i32,
    pub e_tag: Option<String>,
}

/// Low-level multipart calls against the destination store. Sequencing,
/// part splitting and abort handling live in [`crate::multipart`].
pub trait MultipartUploader {
    /// Starts a multipart upload and returns its upload id.
    fn create(&self, upload: ObjectUpload<'_>) -> Result<String, String>;

    fn upload_part(
        &self,
        upload: ObjectUpload<'_>,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<UploadedPart, String>;

    fn complete(
        &self,
        upload: ObjectUpload<'_>,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> Result<(), String>;

    fn abort(&self, upload: ObjectUpload<'_>, upload_id: &str) -> Result<(), String>;
}
