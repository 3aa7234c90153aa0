use serde::{Deserialize, Serialize};

use crate::contract::truncate_chars;
use crate::error::JobError;

pub const DEFAULT_NOTIFICATION_SUBJECT: &str = "CodePipeline artifact published";
pub const MAX_NOTIFICATION_SUBJECT_CHARS: usize = 100;

/// Raw `UserParameters` blob as configured on the pipeline action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserParameters {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub key_prefix: String,
    #[serde(default)]
    pub notification_subject: Option<String>,
    #[serde(default)]
    pub notification_sns_topic_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
    pub topic_arn: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub bucket: String,
    pub key_prefix: String,
    pub notification: Option<NotificationTarget>,
}

pub fn resolve_configuration(raw: &str) -> Result<Configuration, JobError> {
    if raw.trim().is_empty() {
        return Err(JobError::configuration("missing user params"));
    }

    let params: UserParameters = serde_json::from_str(raw)
        .map_err(|error| JobError::configuration(format!("invalid user params: {error}")))?;

    if params.bucket.trim().is_empty() {
        return Err(JobError::configuration("missing 'bucket' in user params"));
    }
    if params.key_prefix.trim().is_empty() {
        return Err(JobError::configuration(
            "missing 'key_prefix' in user params",
        ));
    }

    let notification = params
        .notification_sns_topic_arn
        .filter(|arn| !arn.trim().is_empty())
        .map(|topic_arn| NotificationTarget {
            topic_arn,
            subject: resolve_subject(params.notification_subject.as_deref()),
        });

    Ok(Configuration {
        bucket: params.bucket,
        key_prefix: params.key_prefix,
        notification,
    })
}

fn resolve_subject(subject: Option<&str>) -> String {
    match subject.map(str::trim) {
        Some(value) if !value.is_empty() => {
            truncate_chars(value, MAX_NOTIFICATION_SUBJECT_CHARS).to_string()
        }
        _ => DEFAULT_NOTIFICATION_SUBJECT.to_string(),
    }
}
