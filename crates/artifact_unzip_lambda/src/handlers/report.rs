use tracing::{error, info};

use crate::adapters::job_status::JobStatusClient;
use crate::runtime::contract::{
    truncate_chars, JOB_FAILED_FAILURE_TYPE, MAX_EXECUTION_SUMMARY_CHARS,
    MAX_FAILURE_MESSAGE_CHARS,
};
use crate::runtime::error::JobError;

/// Terminal status reporter for one job. Both report methods consume the
/// reporter, so at most one report is sent per job.
pub struct JobReporter<'a> {
    client: &'a dyn JobStatusClient,
    job_id: &'a str,
}

impl<'a> JobReporter<'a> {
    pub fn new(client: &'a dyn JobStatusClient, job_id: &'a str) -> Self {
        Self { client, job_id }
    }

    pub fn report_success(self, summary: &str) -> Result<(), String> {
        let summary = truncate_chars(summary, MAX_EXECUTION_SUMMARY_CHARS);
        info!(
            component = "job_reporter",
            event = "job_reported",
            job_id = self.job_id,
            summary,
        );
        self.client
            .put_job_success(self.job_id, summary)
            .map_err(|error| format!("failed to report job success: {error}"))
    }

    pub fn report_failure(self, failure: &JobError) -> Result<(), String> {
        let message = failure.to_string();
        let message = truncate_chars(&message, MAX_FAILURE_MESSAGE_CHARS);
        error!(
            component = "job_reporter",
            event = "job_failed",
            job_id = self.job_id,
            error_kind = failure.kind(),
            error = message,
        );
        self.client
            .put_job_failure(self.job_id, JOB_FAILED_FAILURE_TYPE, message)
            .map_err(|error| format!("failed to report job failure: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Report {
        Success(String, String),
        Failure(String, String, String),
    }

    struct RecordingStatusClient {
        reports: Mutex<Vec<Report>>,
    }

    impl RecordingStatusClient {
        fn new() -> Self {
            Self {
                reports: Mutex::new(Vec::new()),
            }
        }

        fn reports(&self) -> Vec<Report> {
            self.reports.lock().expect("poisoned mutex").clone()
        }
    }

    impl JobStatusClient for RecordingStatusClient {
        fn put_job_success(&self, job_id: &str, summary: &str) -> Result<(), String> {
            self.reports
                .lock()
                .expect("poisoned mutex")
                .push(Report::Success(job_id.to_string(), summary.to_string()));
            Ok(())
        }

        fn put_job_failure(
            &self,
            job_id: &str,
            failure_type: &str,
            message: &str,
        ) -> Result<(), String> {
            self.reports.lock().expect("poisoned mutex").push(Report::Failure(
                job_id.to_string(),
                failure_type.to_string(),
                message.to_string(),
            ));
            Ok(())
        }
    }

    struct UnavailableStatusClient;

    impl JobStatusClient for UnavailableStatusClient {
        fn put_job_success(&self, _job_id: &str, _summary: &str) -> Result<(), String> {
            Err("ServiceUnavailable".to_string())
        }

        fn put_job_failure(
            &self,
            _job_id: &str,
            _failure_type: &str,
            _message: &str,
        ) -> Result<(), String> {
            Err("ServiceUnavailable".to_string())
        }
    }

    #[test]
    fn reports_failure_as_job_failed() {
        let client = RecordingStatusClient::new();
        JobReporter::new(&client, "job-1")
            .report_failure(&JobError::configuration("missing user params"))
            .expect("report should succeed");

        assert_eq!(
            client.reports(),
            vec![Report::Failure(
                "job-1".to_string(),
                "JobFailed".to_string(),
                "missing user params".to_string(),
            )]
        );
    }

    #[test]
    fn truncates_long_failure_messages() {
        let client = RecordingStatusClient::new();
        let long_message = "x".repeat(MAX_FAILURE_MESSAGE_CHARS + 100);
        JobReporter::new(&client, "job-1")
            .report_failure(&JobError::extraction(long_message))
            .expect("report should succeed");

        match &client.reports()[0] {
            Report::Failure(_, _, message) => {
                assert_eq!(message.chars().count(), MAX_FAILURE_MESSAGE_CHARS)
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[test]
    fn reports_success_with_summary() {
        let client = RecordingStatusClient::new();
        JobReporter::new(&client, "job-1")
            .report_success("published 2 object(s) to s3://dest-bucket/builds/42")
            .expect("report should succeed");

        assert_eq!(
            client.reports(),
            vec![Report::Success(
                "job-1".to_string(),
                "published 2 object(s) to s3://dest-bucket/builds/42".to_string(),
            )]
        );
    }

    #[test]
    fn surfaces_status_api_errors() {
        let error = JobReporter::new(&UnavailableStatusClient, "job-1")
            .report_success("done")
            .expect_err("report should fail");
        assert_eq!(error, "failed to report job success: ServiceUnavailable");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("poisoned mutex").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs(run: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .without_time()
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, run);

        let bytes = logs.0.lock().expect("poisoned mutex").clone();
        String::from_utf8(bytes).expect("logs should be utf-8")
    }

    #[test]
    fn terminal_reports_log_their_outcome_event() {
        let client = RecordingStatusClient::new();

        let success_logs = capture_logs(|| {
            JobReporter::new(&client, "job-1")
                .report_success("published 1 object(s) to s3://dest-bucket/builds/42")
                .expect("report should succeed");
        });
        assert!(success_logs.contains(r#""event":"job_reported""#));
        assert!(success_logs.contains(r#""job_id":"job-1""#));

        let failure_logs = capture_logs(|| {
            JobReporter::new(&client, "job-2")
                .report_failure(&JobError::configuration("missing user params"))
                .expect("report should succeed");
        });
        assert!(failure_logs.contains(r#""event":"job_failed""#));
        assert!(failure_logs.contains(r#""error_kind":"ConfigurationError""#));
    }
}
