use super::models::Notification;
use crate::client::{build_http_client, Error, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;

/// Transport for completion notifications. Delivery is best-effort: the
/// caller is expected to log and swallow failures.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

pub struct NtfyNotifier {
    client: Client,
    url: String,
    topic: String,
}

impl NtfyNotifier {
    pub fn new<U: Into<String>, T: Into<String>>(url: U, topic: T) -> Self {
        Self {
            client: build_http_client(true),
            url: url.into().trim_end_matches('/').to_string(),
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let url = format!("{}/{}", self.url, self.topic);
        let response = self
            .client
            .post(&url)
            .header("Title", &notification.title)
            .header("Tags", notification.tags)
            .header("Priority", notification.priority.to_string())
            .body(notification.body.clone())
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Http(response.status()))
        }
    }
}
