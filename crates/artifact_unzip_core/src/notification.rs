use crate::params::NotificationTarget;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub topic_arn: String,
    pub subject: String,
    pub body: String,
}

/// Job id on the first line, then one published key per line in upload order.
pub fn build_notification(
    target: &NotificationTarget,
    job_id: &str,
    published_keys: &[String],
) -> NotificationMessage {
    let mut body = String::from(job_id);
    for key in published_keys {
        body.push('\n');
        body.push_str(key);
    }

    NotificationMessage {
        topic_arn: target.topic_arn.clone(),
        subject: target.subject.clone(),
        body,
    }
}
