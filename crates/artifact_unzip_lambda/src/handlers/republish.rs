use tracing::info;

use crate::adapters::object_store::{ObjectPublisher, ObjectUpload};
use crate::archive::ArtifactArchive;
use crate::runtime::contract::BUCKET_OWNER_FULL_CONTROL_ACL;
use crate::runtime::error::JobError;
use crate::runtime::params::Configuration;
use crate::runtime::storage_keys::destination_object_key;

/// A republication that stopped early. `published_keys` lists the objects
/// written before the failure; they are left in the destination bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepublishError {
    pub error: JobError,
    pub published_keys: Vec<String>,
}

/// Uploads every archive entry, in order, to `{key_prefix}/{entry}` in the
/// destination bucket. Stops at the first failure; objects already written
/// stay in place.
pub fn republish_entries(
    config: &Configuration,
    archive: &mut ArtifactArchive,
    publisher: &dyn ObjectPublisher,
) -> Result<Vec<String>, RepublishError> {
    let mut published_keys = Vec::with_capacity(archive.len());

    while let Some(entry) = archive.next_entry() {
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                return Err(RepublishError {
                    error,
                    published_keys,
                })
            }
        };
        let key = destination_object_key(&config.key_prefix, entry.name());
        let size = entry.size();

        let uploaded = publisher.put_object(
            ObjectUpload {
                bucket: &config.bucket,
                key: &key,
                acl: BUCKET_OWNER_FULL_CONTROL_ACL,
                content_length: size,
            },
            &mut entry,
        );
        if let Err(message) = uploaded {
            // A damaged entry surfaces through the publisher's read of the body.
            let error = match entry.read_error() {
                Some(read_error) => JobError::extraction(format!(
                    "failed to read zip entry {}: {read_error}",
                    entry.name()
                )),
                None => JobError::Upload {
                    bucket: config.bucket.clone(),
                    key,
                    message,
                },
            };
            return Err(RepublishError {
                error,
                published_keys,
            });
        }

        info!(
            component = "republisher",
            event = "entry_published",
            bucket = %config.bucket,
            key = %key,
            bytes = size,
        );
        published_keys.push(key);
    }

    Ok(published_keys)
}
