use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::JobError;

pub const S3_LOCATION_TYPE: &str = "S3";
pub const BUCKET_OWNER_FULL_CONTROL_ACL: &str = "bucket-owner-full-control";
pub const JOB_FAILED_FAILURE_TYPE: &str = "JobFailed";
pub const MAX_FAILURE_MESSAGE_CHARS: usize = 5_000;
pub const MAX_EXECUTION_SUMMARY_CHARS: usize = 2_048;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodePipelineEvent {
    #[serde(rename = "CodePipeline.job")]
    pub job: CodePipelineJob,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodePipelineJob {
    pub id: String,
    #[serde(rename = "accountId", default)]
    pub account_id: Option<String>,
    pub data: JobData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobData {
    #[serde(rename = "actionConfiguration")]
    pub action_configuration: ActionConfiguration,
    #[serde(rename = "inputArtifacts", default)]
    pub input_artifacts: Vec<Artifact>,
    #[serde(rename = "outputArtifacts", default)]
    pub output_artifacts: Vec<Artifact>,
    #[serde(rename = "artifactCredentials")]
    pub artifact_credentials: ArtifactCredentials,
    #[serde(rename = "continuationToken", default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionConfiguration {
    pub configuration: ActionConfigurationValues,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionConfigurationValues {
    #[serde(rename = "FunctionName", default)]
    pub function_name: Option<String>,
    #[serde(rename = "UserParameters", default)]
    pub user_parameters: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub revision: Option<String>,
    pub location: ArtifactLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactLocation {
    #[serde(rename = "type")]
    pub location_type: String,
    #[serde(rename = "s3Location", default)]
    pub s3_location: Option<S3Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Location {
    #[serde(rename = "bucketName")]
    pub bucket_name: String,
    #[serde(rename = "objectKey")]
    pub object_key: String,
}

/// Short-lived credentials scoped to the input artifact location.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactCredentials {
    #[serde(rename = "accessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "secretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "sessionToken")]
    pub session_token: String,
}

impl fmt::Debug for ArtifactCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArtifactRef {
    pub name: String,
    pub location: S3Location,
    pub credentials: ArtifactCredentials,
}

/// Picks the first input artifact and checks that it lives in S3.
pub fn resolve_source_artifact(data: &JobData) -> Result<SourceArtifactRef, JobError> {
    let Some(artifact) = data.input_artifacts.first() else {
        return Err(JobError::fetch("missing source artifacts"));
    };

    if artifact.location.location_type != S3_LOCATION_TYPE {
        return Err(JobError::fetch(
            "location type of first artifact is not of type S3",
        ));
    }

    let location = artifact
        .location
        .s3_location
        .clone()
        .ok_or_else(|| JobError::fetch("first artifact is missing its s3Location"))?;

    Ok(SourceArtifactRef {
        name: artifact.name.clone(),
        location,
        credentials: data.artifact_credentials.clone(),
    })
}

/// Cuts `text` to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
