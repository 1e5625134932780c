// SPDX-License-Identifier: AGPL-3.0-or-later

//! Outgoing email: Mailgun when configured, a local file outbox otherwise.
//!
//! The outbox transport writes each message as an `.html` file under the
//! data directory, which keeps local development working without any mail
//! credentials.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;

use crate::config::AppConfig;
use crate::storage::StoragePaths;

const MAILGUN_API_BASE: &str = "https://api.mailgun.net/v3";

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("failed to write outbox message: {0}")]
    Outbox(#[from] std::io::Error),

    #[error("Mailgun request failed: {0}")]
    Mailgun(String),
}

#[derive(Debug, Clone)]
enum EmailTransport {
    /// Drop messages as files under the data directory.
    Outbox(PathBuf),
    Mailgun { api_key: String, domain: String },
}

#[derive(Debug, Clone)]
pub struct EmailSender {
    transport: EmailTransport,
    from: String,
    http: Client,
}

impl EmailSender {
    /// Pick the transport from configuration. Mailgun needs both an API key
    /// and a domain; anything less falls back to the file outbox.
    pub fn from_config(config: &AppConfig, paths: &StoragePaths) -> Self {
        let transport = match (&config.mailgun_api_key, &config.mailgun_domain) {
            (Some(api_key), Some(domain)) => EmailTransport::Mailgun {
                api_key: api_key.clone(),
                domain: domain.clone(),
            },
            _ => {
                tracing::info!(
                    outbox = %paths.outbox_dir().display(),
                    "Mailgun not configured, using file outbox"
                );
                EmailTransport::Outbox(paths.outbox_dir())
            }
        };

        Self {
            transport,
            from: config.mail_from.clone(),
            http: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Send one HTML message.
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        match &self.transport {
            EmailTransport::Outbox(dir) => self.send_to_outbox(dir, to, subject, html),
            EmailTransport::Mailgun { api_key, domain } => {
                self.send_via_mailgun(api_key, domain, to, subject, html)
                    .await
            }
        }
    }

    fn send_to_outbox(
        &self,
        dir: &PathBuf,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), EmailError> {
        fs::create_dir_all(dir)?;

        let file_name = format!(
            "{}-{}.html",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            sanitize_file_name(to)
        );
        let body = format!(
            "<!-- To: {to} -->\n<!-- From: {} -->\n<!-- Subject: {subject} -->\n{html}",
            self.from
        );
        fs::write(dir.join(&file_name), body)?;

        tracing::info!(to = %to, file = %file_name, "Wrote email to outbox");
        Ok(())
    }

    async fn send_via_mailgun(
        &self,
        api_key: &str,
        domain: &str,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), EmailError> {
        let mut form = HashMap::new();
        form.insert("from", self.from.as_str());
        form.insert("to", to);
        form.insert("subject", subject);
        form.insert("html", html);

        let response = self
            .http
            .post(format!("{MAILGUN_API_BASE}/{domain}/messages"))
            .basic_auth("api", Some(api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| EmailError::Mailgun(format!("send failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Mailgun(format!(
                "send returned {status}: {body}"
            )));
        }

        Ok(())
    }
}

/// Keep only filesystem-safe characters from a recipient address.
fn sanitize_file_name(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitize_file_name_replaces_unsafe_chars() {
        assert_eq!(sanitize_file_name("a@x.com"), "a_x.com");
        assert_eq!(sanitize_file_name("../../etc"), ".._.._etc");
    }

    #[tokio::test]
    async fn outbox_transport_writes_a_file() {
        let dir = TempDir::new().unwrap();
        let paths = StoragePaths::new(dir.path());
        let sender = EmailSender::from_config(&AppConfig::default(), &paths);

        sender
            .send("player@x.com", "Verify your account", "<p>Hi</p>")
            .await
            .unwrap();

        let entries: Vec<_> = fs::read_dir(paths.outbox_dir())
            .unwrap()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(entries.len(), 1);

        let content = fs::read_to_string(entries[0].path()).unwrap();
        assert!(content.contains("To: player@x.com"));
        assert!(content.contains("Subject: Verify your account"));
        assert!(content.contains("<p>Hi</p>"));
    }
}
