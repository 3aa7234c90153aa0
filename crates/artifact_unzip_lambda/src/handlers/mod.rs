pub mod job;
pub mod notify;
pub mod report;
pub mod republish;
