use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapters::artifact_source::ArtifactSource;
use crate::adapters::job_status::JobStatusClient;
use crate::adapters::notification::NotificationPublisher;
use crate::adapters::object_store::ObjectPublisher;
use crate::archive::ArtifactArchive;
use crate::fetch::fetch_artifact;
use crate::handlers::notify::notify_published;
use crate::handlers::report::JobReporter;
use crate::handlers::republish::republish_entries;
use crate::runtime::contract::{resolve_source_artifact, CodePipelineJob};
use crate::runtime::error::JobError;
use crate::runtime::params::{resolve_configuration, Configuration};
use crate::runtime::storage_keys::destination_uri;
use crate::settings::RuntimeSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Init,
    ParamsResolved,
    Fetched,
    Extracted,
    Republished,
    Notified,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Init => "init",
            Self::ParamsResolved => "params_resolved",
            Self::Fetched => "fetched",
            Self::Extracted => "extracted",
            Self::Republished => "republished",
            Self::Notified => "notified",
        };
        f.write_str(label)
    }
}

/// External collaborators for one invocation. The artifact source reads with
/// the artifact's scoped credentials; everything else uses the function's own
/// identity.
#[derive(Clone, Copy)]
pub struct JobCollaborators<'a> {
    pub artifact_source: &'a dyn ArtifactSource,
    pub object_publisher: &'a dyn ObjectPublisher,
    pub notification_publisher: &'a dyn NotificationPublisher,
    pub job_status: &'a dyn JobStatusClient,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobResponse {
    pub job_id: String,
    pub status: String,
    pub published_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<JobFailure>,
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: String,
    pub stage: JobStage,
    pub message: String,
}

/// The terminal report could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandlerError {
    pub job_id: String,
    pub message: String,
}

impl fmt::Display for JobHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job {}: {}", self.job_id, self.message)
    }
}

impl std::error::Error for JobHandlerError {}

struct CompletedJob {
    config: Configuration,
    published_keys: Vec<String>,
}

struct StageFailure {
    stage: JobStage,
    error: JobError,
    published_keys: Vec<String>,
}

/// Runs the republication job and reports its outcome exactly once.
///
/// All stage errors are collected into a single `Result` and the terminal
/// report happens in one place below; nothing runs after it.
pub fn handle_job(
    job: &CodePipelineJob,
    settings: &RuntimeSettings,
    collaborators: &JobCollaborators<'_>,
) -> Result<JobResponse, JobHandlerError> {
    info!(
        component = "job_handler",
        event = "job_started",
        job_id = %job.id,
        input_artifacts = job.data.input_artifacts.len(),
    );

    let outcome = run_job(job, settings, collaborators);

    let reporter = JobReporter::new(collaborators.job_status, &job.id);
    let (report, response) = match outcome {
        Ok(completed) => {
            let summary = format!(
                "published {} object(s) to {}",
                completed.published_keys.len(),
                destination_uri(&completed.config.bucket, &completed.config.key_prefix)
            );
            (
                reporter.report_success(&summary),
                build_response(job, "succeeded", completed.published_keys, None),
            )
        }
        Err(failure) => (
            reporter.report_failure(&failure.error),
            build_response(
                job,
                "failed",
                failure.published_keys,
                Some(JobFailure {
                    kind: failure.error.kind().to_string(),
                    stage: failure.stage,
                    message: failure.error.to_string(),
                }),
            ),
        ),
    };

    report.map_err(|message| JobHandlerError {
        job_id: job.id.clone(),
        message,
    })?;
    Ok(response)
}

fn run_job(
    job: &CodePipelineJob,
    settings: &RuntimeSettings,
    collaborators: &JobCollaborators<'_>,
) -> Result<CompletedJob, StageFailure> {
    let mut stage = JobStage::Init;
    let at = |stage: JobStage| {
        move |error: JobError| StageFailure {
            stage,
            error,
            published_keys: Vec::new(),
        }
    };

    let config = resolve_configuration(&job.data.action_configuration.configuration.user_parameters)
        .map_err(at(stage))?;
    enter_stage(&job.id, &mut stage, JobStage::ParamsResolved);

    let source_ref = resolve_source_artifact(&job.data).map_err(at(stage))?;
    let artifact = fetch_artifact(
        &source_ref,
        collaborators.artifact_source,
        settings.temp_dir.as_deref(),
    )
    .map_err(at(stage))?;
    enter_stage(&job.id, &mut stage, JobStage::Fetched);

    let mut archive = ArtifactArchive::open(artifact.path()).map_err(at(stage))?;
    enter_stage(&job.id, &mut stage, JobStage::Extracted);

    let published_keys = republish_entries(&config, &mut archive, collaborators.object_publisher)
        .map_err(|failure| StageFailure {
            stage,
            error: failure.error,
            published_keys: failure.published_keys,
        })?;
    drop(archive);
    drop(artifact);
    enter_stage(&job.id, &mut stage, JobStage::Republished);

    notify_published(
        &config,
        &job.id,
        &published_keys,
        collaborators.notification_publisher,
    )
    .map_err(|error| StageFailure {
        stage,
        error,
        published_keys: published_keys.clone(),
    })?;
    enter_stage(&job.id, &mut stage, JobStage::Notified);

    Ok(CompletedJob {
        config,
        published_keys,
    })
}

fn enter_stage(job_id: &str, current: &mut JobStage, next: JobStage) {
    *current = next;
    info!(
        component = "job_handler",
        event = "stage_entered",
        job_id,
        stage = %next,
    );
}

fn build_response(
    job: &CodePipelineJob,
    status: &str,
    published_keys: Vec<String>,
    failure: Option<JobFailure>,
) -> JobResponse {
    JobResponse {
        job_id: job.id.clone(),
        status: status.to_string(),
        published_keys,
        failure,
        completed_at: chrono::Utc::now().to_rfc3339(),
    }
}
