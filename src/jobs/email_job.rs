//! Account emails (verification, password reset) as queued jobs.
//!
//! Without `SMTP_HOST` the worker writes the message to the log, which is how
//! development and CI environments read their links.

use serde::{Deserialize, Serialize};
use std::env;

use crate::config::{RESET_TOKEN_TTL_HOURS, VERIFICATION_TOKEN_TTL_HOURS};
use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailJob {
    pub to: String,
    pub subject: String,
    /// HTML body
    pub body: String,
    /// Overrides `SMTP_FROM`
    #[serde(default)]
    pub from: Option<String>,
}

impl EmailJob {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            from: None,
        }
    }

    /// Link to `{frontend}/verify-email?token=...`.
    pub fn verification(to: &str, frontend_url: &str, token: &str) -> Self {
        let link = format!("{}/verify-email?token={}", frontend_url.trim_end_matches('/'), token);
        Self::new(
            to,
            "Verify Your Email Address",
            format!(
                "<h1>Welcome to Estate Market!</h1>\
                 <p>Please click the link below to verify your email address:</p>\
                 <a href=\"{link}\">Verify Email</a>\
                 <p>This link will expire in {VERIFICATION_TOKEN_TTL_HOURS} hours.</p>"
            ),
        )
    }

    /// Link to `{frontend}/reset-password?token=...`.
    pub fn password_reset(to: &str, frontend_url: &str, token: &str) -> Self {
        let link = format!("{}/reset-password?token={}", frontend_url.trim_end_matches('/'), token);
        Self::new(
            to,
            "Password Reset Request",
            format!(
                "<h1>Password Reset Request</h1>\
                 <p>You requested to reset your password. Click the link below to proceed:</p>\
                 <a href=\"{link}\">Reset Password</a>\
                 <p>This link will expire in {RESET_TOKEN_TTL_HOURS} hour.</p>\
                 <p>If you didn't request this, please ignore this email.</p>"
            ),
        )
    }
}

struct SmtpSettings {
    host: Option<String>,
    from: String,
}

impl SmtpSettings {
    fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@estate-market.local".to_string()),
        }
    }
}

pub async fn email_job_handler(job: EmailJob) -> Result<(), AppError> {
    let settings = SmtpSettings::from_env();
    let from = job.from.as_deref().unwrap_or(&settings.from);

    tracing::info!(to = %job.to, from = %from, subject = %job.subject, "Processing email job");

    match settings.host {
        None => {
            tracing::warn!("SMTP not configured, logging email instead of sending");
            tracing::info!(
                "=== EMAIL (not sent) ===\nFrom: {}\nTo: {}\nSubject: {}\n\n{}\n========================",
                from,
                job.to,
                job.subject,
                job.body
            );
        }
        Some(host) => {
            // TODO: hand the message to an SMTP transport once one is added to the stack.
            tracing::warn!(smtp_host = %host, to = %job.to, "No SMTP transport available, email dropped");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email_links_frontend() {
        let job = EmailJob::verification("ana@example.com", "http://app.test/", "abc123");
        assert_eq!(job.to, "ana@example.com");
        assert_eq!(job.subject, "Verify Your Email Address");
        assert!(job.body.contains("http://app.test/verify-email?token=abc123"));
        assert!(job.body.contains("24 hours"));
    }

    #[test]
    fn test_reset_email_links_frontend() {
        let job = EmailJob::password_reset("ana@example.com", "http://app.test", "tok");
        assert!(job.body.contains("http://app.test/reset-password?token=tok"));
        assert!(job.from.is_none());
    }

    #[tokio::test]
    async fn test_handler_logs_without_smtp() {
        let job = EmailJob::new("ana@example.com", "Hi", "<p>body</p>");
        assert!(email_job_handler(job).await.is_ok());
    }
}
