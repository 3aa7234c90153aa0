pub trait JobStatusClient {
    fn put_job_success(&self, job_id: &str, summary: &str) -> Result<(), String>;

    fn put_job_failure(&self, job_id: &str, failure_type: &str, message: &str)
        -> Result<(), String>;
}
