use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use tracing::info;

use crate::adapters::artifact_source::ArtifactSource;
use crate::runtime::contract::SourceArtifactRef;
use crate::runtime::error::JobError;

const TEMP_FILE_PREFIX: &str = "codepipeline";

/// Downloaded artifact on local disk. The file is removed when this value drops.
#[derive(Debug)]
pub struct FetchedArtifact {
    path: TempPath,
    bytes: u64,
}

impl FetchedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// Streams the source artifact into a fresh temporary file using the
/// artifact-scoped source. The write handle is closed before returning.
pub fn fetch_artifact(
    source_ref: &SourceArtifactRef,
    source: &dyn ArtifactSource,
    temp_dir: Option<&Path>,
) -> Result<FetchedArtifact, JobError> {
    let dir: PathBuf = temp_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);
    let mut file = Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(".zip")
        .tempfile_in(&dir)
        .map_err(|error| {
            JobError::fetch(format!(
                "failed to create temporary artifact file in {}: {error}",
                dir.display()
            ))
        })?;

    let location = &source_ref.location;
    let bytes = source
        .download_to(source_ref, file.as_file_mut())
        .map_err(|error| {
            JobError::fetch(format!(
                "failed to download s3://{}/{}: {error}",
                location.bucket_name, location.object_key
            ))
        })?;

    file.as_file_mut()
        .flush()
        .map_err(|error| JobError::fetch(format!("failed to flush artifact file: {error}")))?;

    info!(
        component = "artifact_fetcher",
        event = "artifact_downloaded",
        artifact = %source_ref.name,
        bucket = %location.bucket_name,
        key = %location.object_key,
        bytes,
    );

    Ok(FetchedArtifact {
        path: file.into_temp_path(),
        bytes,
    })
}
