use std::path::PathBuf;

use thiserror::Error;

pub const TEMP_DIR_ENV: &str = "ARTIFACT_TEMP_DIR";
pub const MULTIPART_THRESHOLD_ENV: &str = "UPLOAD_MULTIPART_THRESHOLD_BYTES";
pub const PART_SIZE_ENV: &str = "UPLOAD_PART_SIZE_BYTES";

pub const DEFAULT_MULTIPART_THRESHOLD_BYTES: u64 = 16 * 1024 * 1024;
pub const DEFAULT_PART_SIZE_BYTES: u64 = 8 * 1024 * 1024;
/// S3 rejects non-final multipart parts below 5 MiB.
pub const MIN_PART_SIZE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Process-level knobs read from the Lambda environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub temp_dir: Option<PathBuf>,
    pub upload: UploadSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSettings {
    pub multipart_threshold_bytes: u64,
    pub part_size_bytes: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            multipart_threshold_bytes: DEFAULT_MULTIPART_THRESHOLD_BYTES,
            part_size_bytes: DEFAULT_PART_SIZE_BYTES,
        }
    }
}

impl RuntimeSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let temp_dir = lookup(TEMP_DIR_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let multipart_threshold_bytes =
            parse_bytes(MULTIPART_THRESHOLD_ENV, lookup(MULTIPART_THRESHOLD_ENV))?
                .unwrap_or(DEFAULT_MULTIPART_THRESHOLD_BYTES);
        let part_size_bytes = parse_bytes(PART_SIZE_ENV, lookup(PART_SIZE_ENV))?
            .unwrap_or(DEFAULT_PART_SIZE_BYTES)
            .max(MIN_PART_SIZE_BYTES);

        Ok(Self {
            temp_dir,
            upload: UploadSettings {
                multipart_threshold_bytes,
                part_size_bytes,
            },
        })
    }
}

fn parse_bytes(name: &'static str, value: Option<String>) -> Result<Option<u64>, SettingsError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(Some(parsed)),
        _ => Err(SettingsError::InvalidNumber { name, value: raw }),
    }
}
