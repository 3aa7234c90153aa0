use std::io::Read;

use tracing::warn;

use crate::adapters::multipart::{MultipartUploader, UploadedPart};
use crate::adapters::object_store::ObjectUpload;

/// Streams `body` as a multipart upload of fixed-size parts, read
/// sequentially. An empty body is sent as a single empty part. Any failure
/// after the upload was created aborts it before the error is returned.
///
/// Returns the number of parts written.
pub fn upload_in_parts(
    uploader: &dyn MultipartUploader,
    upload: ObjectUpload<'_>,
    body: &mut dyn Read,
    part_size_bytes: u64,
) -> Result<usize, String> {
    let upload_id = uploader.create(upload)?;

    let result = upload_parts(uploader, upload, &upload_id, body, part_size_bytes);
    if result.is_err() {
        if let Err(error) = uploader.abort(upload, &upload_id) {
            warn!(
                component = "object_publisher",
                event = "multipart_abort_failed",
                key = upload.key,
                upload_id = %upload_id,
                error = %error,
            );
        }
    }
    result
}

fn upload_parts(
    uploader: &dyn MultipartUploader,
    upload: ObjectUpload<'_>,
    upload_id: &str,
    body: &mut dyn Read,
    part_size_bytes: u64,
) -> Result<usize, String> {
    let mut parts: Vec<UploadedPart> = Vec::new();
    let mut part_number = 1i32;

    loop {
        let mut buffer = Vec::with_capacity(part_size_bytes as usize);
        let read = (&mut *body)
            .take(part_size_bytes)
            .read_to_end(&mut buffer)
            .map_err(|error| format!("failed to read archive entry: {error}"))?;
        if read == 0 && part_number > 1 {
            break;
        }

        let part = uploader
            .upload_part(upload, upload_id, part_number, buffer)
            .map_err(|error| format!("upload part {part_number} failed: {error}"))?;
        parts.push(part);

        if (read as u64) < part_size_bytes {
            break;
        }
        part_number += 1;
    }

    let count = parts.len();
    uploader
        .complete(upload, upload_id, parts)
        .map_err(|error| format!("complete multipart upload failed: {error}"))?;
    Ok(count)
}
