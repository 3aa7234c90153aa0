use tracing::info;

use crate::adapters::notification::NotificationPublisher;
use crate::runtime::error::JobError;
use crate::runtime::notification::build_notification;
use crate::runtime::params::Configuration;

/// Publishes the completion message when a topic is configured. Returns
/// whether a message was sent.
pub fn notify_published(
    config: &Configuration,
    job_id: &str,
    published_keys: &[String],
    publisher: &dyn NotificationPublisher,
) -> Result<bool, JobError> {
    let Some(target) = config.notification.as_ref() else {
        return Ok(false);
    };

    let message = build_notification(target, job_id, published_keys);
    publisher
        .publish(&message.topic_arn, &message.subject, &message.body)
        .map_err(|error| {
            JobError::notification(format!(
                "failed to publish notification to {}: {error}",
                message.topic_arn
            ))
        })?;

    info!(
        component = "notifier",
        event = "notification_published",
        job_id,
        topic_arn = %message.topic_arn,
        keys = published_keys.len(),
    );
    Ok(true)
}
