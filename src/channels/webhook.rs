//! Webhook sink: POSTs announcements as `{"content": ...}` JSON.
//!
//! Works with chat-platform incoming webhooks that accept a `content` field.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::channels::AnnouncementSink;
use crate::error::ChannelError;
use crate::pipeline::types::Announcement;

/// Outbound webhook. The URL embeds a credential, so it is kept secret.
pub struct WebhookSink {
    url: SecretString,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: SecretString) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }

    /// JSON body for an announcement.
    pub fn body(announcement: &Announcement) -> serde_json::Value {
        serde_json::json!({ "content": announcement.payload() })
    }
}

#[async_trait]
impl AnnouncementSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, announcement: &Announcement) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.url.expose_secret())
            .json(&Self::body(announcement))
            .send()
            .await
            .map_err(|e| ChannelError::Http(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "webhook".into(),
                reason: format!("{status}: {detail}"),
            });
        }

        tracing::debug!(code = %announcement.code, "Announcement delivered via webhook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn announcement() -> Announcement {
        Announcement {
            code: "ABCDEF12".into(),
            expiry: None,
            is_vip: false,
            recurring: false,
        }
    }

    #[test]
    fn body_carries_rendered_payload() {
        let body = WebhookSink::body(&announcement());
        assert_eq!(
            body["content"],
            "New gift code! `ABCDEF12` — redeem until unbekannt"
        );
    }

    /// One-shot HTTP server answering with `status_line`; returns the request text.
    async fn serve_once(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut request = String::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.push_str(&String::from_utf8_lossy(&buf[..n]));
                if let Some(idx) = request.find("\r\n\r\n") {
                    let body_len = request[..idx]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= idx + 4 + body_len {
                        break;
                    }
                }
            }
            let response = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            request
        });
        (format!("http://{addr}/hook"), handle)
    }

    #[tokio::test]
    async fn delivers_json_to_webhook() {
        let (url, server) = serve_once("HTTP/1.1 204 No Content").await;
        let sink = WebhookSink::new(SecretString::from(url));

        sink.deliver(&announcement()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /hook"));
        assert!(request.contains("ABCDEF12"));
    }

    #[tokio::test]
    async fn non_success_status_is_send_failure() {
        let (url, server) = serve_once("HTTP/1.1 500 Internal Server Error").await;
        let sink = WebhookSink::new(SecretString::from(url));

        let err = sink.deliver(&announcement()).await.unwrap_err();
        assert!(matches!(err, ChannelError::SendFailed { .. }));
        server.await.unwrap();
    }
}
