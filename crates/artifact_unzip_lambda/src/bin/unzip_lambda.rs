use std::io::{Read, Write};

use artifact_unzip_lambda::adapters::artifact_source::ArtifactSource;
use artifact_unzip_lambda::adapters::job_status::JobStatusClient;
use artifact_unzip_lambda::adapters::multipart::{MultipartUploader, UploadedPart};
use artifact_unzip_lambda::adapters::notification::NotificationPublisher;
use artifact_unzip_lambda::adapters::object_store::{ObjectPublisher, ObjectUpload};
use artifact_unzip_lambda::handlers::job::{handle_job, JobCollaborators, JobResponse};
use artifact_unzip_lambda::multipart::upload_in_parts;
use artifact_unzip_lambda::runtime::contract::{CodePipelineEvent, SourceArtifactRef};
use artifact_unzip_lambda::settings::{RuntimeSettings, UploadSettings};
use artifact_unzip_lambda::telemetry::init_logging;
use aws_sdk_codepipeline::types::{ExecutionDetails, FailureDetails, FailureType};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

const ARTIFACT_CREDENTIALS_PROVIDER: &str = "codepipeline-artifact-credentials";

/// Reads input artifacts with the job's artifact credentials. A client is
/// built per download so the function's own identity is never used here.
struct ScopedS3ArtifactSource {
    base_config: aws_config::SdkConfig,
}

impl ArtifactSource for ScopedS3ArtifactSource {
    fn download_to(
        &self,
        artifact: &SourceArtifactRef,
        sink: &mut dyn Write,
    ) -> Result<u64, String> {
        let credentials = Credentials::new(
            artifact.credentials.access_key_id.clone(),
            artifact.credentials.secret_access_key.clone(),
            Some(artifact.credentials.session_token.clone()),
            None,
            ARTIFACT_CREDENTIALS_PROVIDER,
        );
        let s3_config = aws_sdk_s3::config::Builder::from(&self.base_config)
            .credentials_provider(credentials)
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_config);
        let bucket = artifact.location.bucket_name.clone();
        let key = artifact.location.object_key.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut output = client
                    .get_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|error| format!("get object failed: {}", DisplayErrorContext(&error)))?;

                let mut written = 0u64;
                while let Some(chunk) = output
                    .body
                    .try_next()
                    .await
                    .map_err(|error| format!("failed to read object body: {error}"))?
                {
                    sink.write_all(&chunk)
                        .map_err(|error| format!("failed to write artifact file: {error}"))?;
                    written += chunk.len() as u64;
                }
                Ok::<u64, String>(written)
            })
        })
    }
}

struct S3ObjectPublisher {
    client: aws_sdk_s3::Client,
    upload: UploadSettings,
}

impl ObjectPublisher for S3ObjectPublisher {
    fn put_object(&self, upload: ObjectUpload<'_>, body: &mut dyn Read) -> Result<(), String> {
        if upload.content_length > self.upload.multipart_threshold_bytes {
            return upload_in_parts(self, upload, body, self.upload.part_size_bytes).map(|_| ());
        }

        let mut buffer = Vec::with_capacity(upload.content_length as usize);
        body.read_to_end(&mut buffer)
            .map_err(|error| format!("failed to read archive entry: {error}"))?;
        let client = self.client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(upload.bucket)
                    .key(upload.key)
                    .acl(ObjectCannedAcl::from(upload.acl))
                    .content_length(buffer.len() as i64)
                    .body(ByteStream::from(buffer))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("put object failed: {}", DisplayErrorContext(&error)))
            })
        })
    }
}

impl MultipartUploader for S3ObjectPublisher {
    fn create(&self, upload: ObjectUpload<'_>) -> Result<String, String> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let created = self
                    .client
                    .create_multipart_upload()
                    .bucket(upload.bucket)
                    .key(upload.key)
                    .acl(ObjectCannedAcl::from(upload.acl))
                    .send()
                    .await
                    .map_err(|error| {
                        format!(
                            "create multipart upload failed: {}",
                            DisplayErrorContext(&error)
                        )
                    })?;
                created
                    .upload_id()
                    .map(str::to_string)
                    .ok_or_else(|| "create multipart upload returned no upload id".to_string())
            })
        })
    }

    fn upload_part(
        &self,
        upload: ObjectUpload<'_>,
        upload_id: &str,
        part_number: i32,
        body: Vec<u8>,
    ) -> Result<UploadedPart, String> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                self.client
                    .upload_part()
                    .bucket(upload.bucket)
                    .key(upload.key)
                    .upload_id(upload_id)
                    .part_number(part_number)
                    .body(ByteStream::from(body))
                    .send()
                    .await
                    .map(|output| UploadedPart {
                        part_number,
                        e_tag: output.e_tag().map(str::to_string),
                    })
                    .map_err(|error| DisplayErrorContext(&error).to_string())
            })
        })
    }

    fn complete(
        &self,
        upload: ObjectUpload<'_>,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> Result<(), String> {
        let completed_parts: Vec<CompletedPart> = parts
            .into_iter()
            .map(|part| {
                CompletedPart::builder()
                    .set_e_tag(part.e_tag)
                    .part_number(part.part_number)
                    .build()
            })
            .collect();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                self.client
                    .complete_multipart_upload()
                    .bucket(upload.bucket)
                    .key(upload.key)
                    .upload_id(upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(completed_parts))
                            .build(),
                    )
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| DisplayErrorContext(&error).to_string())
            })
        })
    }

    fn abort(&self, upload: ObjectUpload<'_>, upload_id: &str) -> Result<(), String> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                self.client
                    .abort_multipart_upload()
                    .bucket(upload.bucket)
                    .key(upload.key)
                    .upload_id(upload_id)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| DisplayErrorContext(&error).to_string())
            })
        })
    }
}

struct SnsNotificationPublisher {
    client: aws_sdk_sns::Client,
}

impl NotificationPublisher for SnsNotificationPublisher {
    fn publish(&self, topic_arn: &str, subject: &str, message: &str) -> Result<(), String> {
        let client = self.client.clone();
        let topic_arn = topic_arn.to_string();
        let subject = subject.to_string();
        let message = message.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .publish()
                    .topic_arn(topic_arn)
                    .subject(subject)
                    .message(message)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        format!(
                            "sns publish failed: {}",
                            aws_sdk_sns::error::DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }
}

struct CodePipelineJobStatus {
    client: aws_sdk_codepipeline::Client,
}

impl JobStatusClient for CodePipelineJobStatus {
    fn put_job_success(&self, job_id: &str, summary: &str) -> Result<(), String> {
        let client = self.client.clone();
        let job_id = job_id.to_string();
        let details = ExecutionDetails::builder()
            .summary(summary)
            .percent_complete(100)
            .build();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_job_success_result()
                    .job_id(job_id)
                    .execution_details(details)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        aws_sdk_codepipeline::error::DisplayErrorContext(&error).to_string()
                    })
            })
        })
    }

    fn put_job_failure(
        &self,
        job_id: &str,
        failure_type: &str,
        message: &str,
    ) -> Result<(), String> {
        let client = self.client.clone();
        let job_id = job_id.to_string();
        let details = FailureDetails::builder()
            .r#type(FailureType::from(failure_type))
            .message(message)
            .build()
            .map_err(|error| format!("invalid failure details: {error}"))?;

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_job_failure_result()
                    .job_id(job_id)
                    .failure_details(details)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        aws_sdk_codepipeline::error::DisplayErrorContext(&error).to_string()
                    })
            })
        })
    }
}

struct RuntimeDependencies {
    settings: RuntimeSettings,
    artifact_source: ScopedS3ArtifactSource,
    object_publisher: S3ObjectPublisher,
    notification_publisher: SnsNotificationPublisher,
    job_status: CodePipelineJobStatus,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<JobResponse, Error> {
    let payload: CodePipelineEvent = serde_json::from_value(event.payload)
        .map_err(|error| Error::from(format!("invalid CodePipeline job event: {error}")))?;

    let collaborators = JobCollaborators {
        artifact_source: &deps.artifact_source,
        object_publisher: &deps.object_publisher,
        notification_publisher: &deps.notification_publisher,
        job_status: &deps.job_status,
    };

    handle_job(&payload.job, &deps.settings, &collaborators).map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let settings = RuntimeSettings::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        artifact_source: ScopedS3ArtifactSource {
            base_config: aws_config.clone(),
        },
        object_publisher: S3ObjectPublisher {
            client: aws_sdk_s3::Client::new(&aws_config),
            upload: settings.upload,
        },
        notification_publisher: SnsNotificationPublisher {
            client: aws_sdk_sns::Client::new(&aws_config),
        },
        job_status: CodePipelineJobStatus {
            client: aws_sdk_codepipeline::Client::new(&aws_config),
        },
        settings,
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
