#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::sync::Mutex;

use artifact_unzip_lambda::adapters::artifact_source::ArtifactSource;
use artifact_unzip_lambda::adapters::job_status::JobStatusClient;
use artifact_unzip_lambda::adapters::notification::NotificationPublisher;
use artifact_unzip_lambda::adapters::object_store::{ObjectPublisher, ObjectUpload};
use artifact_unzip_lambda::handlers::job::JobCollaborators;
use artifact_unzip_lambda::runtime::contract::{CodePipelineEvent, CodePipelineJob, SourceArtifactRef};
use serde_json::{json, Value};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const JOB_ID: &str = "0f7a1b2c-3d4e-5f60-7182-93a4b5c6d7e8";

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(*name, FileOptions::default())
            .expect("start zip entry");
        writer.write_all(body).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// One stored entry whose body has a byte flipped after its CRC was written.
pub fn zip_with_damaged_entry(name: &str, body: &[u8]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(
            name,
            FileOptions::default().compression_method(CompressionMethod::Stored),
        )
        .expect("start zip entry");
    writer.write_all(body).expect("write zip entry");
    let mut bytes = writer.finish().expect("finish zip").into_inner();

    let offset = bytes
        .windows(body.len())
        .position(|window| window == body)
        .expect("stored body in container");
    bytes[offset + body.len() / 2] ^= 0x20;
    bytes
}

pub fn event_json(user_parameters: &str) -> Value {
    json!({
        "CodePipeline.job": {
            "id": JOB_ID,
            "accountId": "111111111111",
            "data": {
                "actionConfiguration": {
                    "configuration": {
                        "FunctionName": "artifact-unzip",
                        "UserParameters": user_parameters
                    }
                },
                "inputArtifacts": [
                    {
                        "location": {
                            "s3Location": {
                                "bucketName": "codepipeline-artifacts",
                                "objectKey": "pipeline/BuildOutput/abc123.zip"
                            },
                            "type": "S3"
                        },
                        "revision": "abc123",
                        "name": "BuildOutput"
                    }
                ],
                "outputArtifacts": [],
                "artifactCredentials": {
                    "secretAccessKey": "artifact-secret",
                    "sessionToken": "artifact-session",
                    "accessKeyId": "ASIAARTIFACT"
                },
                "continuationToken": "token"
            }
        }
    })
}

pub fn job_from(value: Value) -> CodePipelineJob {
    serde_json::from_value::<CodePipelineEvent>(value)
        .expect("event should decode")
        .job
}

pub fn job(user_parameters: &str) -> CodePipelineJob {
    job_from(event_json(user_parameters))
}

pub struct FakeArtifactSource {
    body: Result<Vec<u8>, String>,
    requests: Mutex<Vec<SourceArtifactRef>>,
}

impl FakeArtifactSource {
    pub fn serving(body: Vec<u8>) -> Self {
        Self {
            body: Ok(body),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            body: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SourceArtifactRef> {
        self.requests.lock().expect("poisoned mutex").clone()
    }
}

impl ArtifactSource for FakeArtifactSource {
    fn download_to(
        &self,
        artifact: &SourceArtifactRef,
        sink: &mut dyn Write,
    ) -> Result<u64, String> {
        self.requests
            .lock()
            .expect("poisoned mutex")
            .push(artifact.clone());
        let body = self.body.clone()?;
        sink.write_all(&body).map_err(|error| error.to_string())?;
        Ok(body.len() as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub bucket: String,
    pub key: String,
    pub acl: String,
    pub content_length: u64,
    pub body: Vec<u8>,
}

pub struct FakeObjectPublisher {
    attempts: Mutex<Vec<String>>,
    uploads: Mutex<Vec<RecordedUpload>>,
    fail_on_attempt: Option<usize>,
}

impl FakeObjectPublisher {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            fail_on_attempt: None,
        }
    }

    /// Fails the n-th upload call (1-based).
    pub fn failing_on_attempt(attempt: usize) -> Self {
        Self {
            fail_on_attempt: Some(attempt),
            ..Self::new()
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().expect("poisoned mutex").clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().expect("poisoned mutex").clone()
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads().into_iter().map(|upload| upload.key).collect()
    }
}

impl ObjectPublisher for FakeObjectPublisher {
    fn put_object(&self, upload: ObjectUpload<'_>, body: &mut dyn Read) -> Result<(), String> {
        let attempt = {
            let mut attempts = self.attempts.lock().expect("poisoned mutex");
            attempts.push(upload.key.to_string());
            attempts.len()
        };
        if self.fail_on_attempt == Some(attempt) {
            return Err("InternalError: We encountered an internal error".to_string());
        }

        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes)
            .map_err(|error| error.to_string())?;
        self.uploads
            .lock()
            .expect("poisoned mutex")
            .push(RecordedUpload {
                bucket: upload.bucket.to_string(),
                key: upload.key.to_string(),
                acl: upload.acl.to_string(),
                content_length: upload.content_length,
                body: bytes,
            });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedNotification {
    pub topic_arn: String,
    pub subject: String,
    pub message: String,
}

pub struct FakeNotifier {
    published: Mutex<Vec<PublishedNotification>>,
    fail: bool,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<PublishedNotification> {
        self.published.lock().expect("poisoned mutex").clone()
    }
}

impl NotificationPublisher for FakeNotifier {
    fn publish(&self, topic_arn: &str, subject: &str, message: &str) -> Result<(), String> {
        if self.fail {
            return Err("NotFound: Topic does not exist".to_string());
        }
        self.published
            .lock()
            .expect("poisoned mutex")
            .push(PublishedNotification {
                topic_arn: topic_arn.to_string(),
                subject: subject.to_string(),
                message: message.to_string(),
            });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    Success {
        job_id: String,
        summary: String,
    },
    Failure {
        job_id: String,
        failure_type: String,
        message: String,
    },
}

pub struct FakeJobStatus {
    reports: Mutex<Vec<StatusReport>>,
    unavailable: bool,
}

impl FakeJobStatus {
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            unavailable: true,
        }
    }

    pub fn reports(&self) -> Vec<StatusReport> {
        self.reports.lock().expect("poisoned mutex").clone()
    }

    pub fn single_failure_message(&self) -> String {
        match self.reports().as_slice() {
            [StatusReport::Failure { message, .. }] => message.clone(),
            other => panic!("expected exactly one failure report, got {other:?}"),
        }
    }

    fn record(&self, report: StatusReport) -> Result<(), String> {
        self.reports.lock().expect("poisoned mutex").push(report);
        if self.unavailable {
            return Err("ThrottlingException: Rate exceeded".to_string());
        }
        Ok(())
    }
}

impl JobStatusClient for FakeJobStatus {
    fn put_job_success(&self, job_id: &str, summary: &str) -> Result<(), String> {
        self.record(StatusReport::Success {
            job_id: job_id.to_string(),
            summary: summary.to_string(),
        })
    }

    fn put_job_failure(
        &self,
        job_id: &str,
        failure_type: &str,
        message: &str,
    ) -> Result<(), String> {
        self.record(StatusReport::Failure {
            job_id: job_id.to_string(),
            failure_type: failure_type.to_string(),
            message: message.to_string(),
        })
    }
}

/// All four collaborators for one simulated invocation.
pub struct Harness {
    pub source: FakeArtifactSource,
    pub publisher: FakeObjectPublisher,
    pub notifier: FakeNotifier,
    pub job_status: FakeJobStatus,
}

impl Harness {
    pub fn serving(archive: Vec<u8>) -> Self {
        Self {
            source: FakeArtifactSource::serving(archive),
            publisher: FakeObjectPublisher::new(),
            notifier: FakeNotifier::new(),
            job_status: FakeJobStatus::new(),
        }
    }

    pub fn collaborators(&self) -> JobCollaborators<'_> {
        JobCollaborators {
            artifact_source: &self.source,
            object_publisher: &self.publisher,
            notification_publisher: &self.notifier,
            job_status: &self.job_status,
        }
    }
}
