pub mod artifact_source;
pub mod job_status;
pub mod multipart;
pub mod notification;
pub mod object_store;
