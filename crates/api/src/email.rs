//! Transactional email delivery
//!
//! Sends account emails via the Resend HTTP API. Delivery is fire-and-forget:
//! handlers spawn the send so a slow mail provider never blocks a response,
//! and failures are logged rather than surfaced to the client.

use crate::users::User;

/// Email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Resend API key; empty disables sending
    pub resend_api_key: String,
    /// From address for emails
    pub email_from: String,
    /// Base URL embedded into account links
    pub public_url: String,
}

/// Account email service
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.resend_api_key.is_empty()
    }

    /// Send an email via Resend API
    async fn send_email(&self, to: &str, subject: &str, html: &str) {
        if !self.is_enabled() {
            tracing::warn!("Email not configured, skipping: {}", subject);
            return;
        }

        let body = serde_json::json!({
            "from": self.config.email_from,
            "to": [to],
            "subject": subject,
            "html": html
        });

        let response = self
            .client
            .post("https://api.resend.com/emails")
            .header(
                "Authorization",
                format!("Bearer {}", self.config.resend_api_key),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(to = %to, subject = %subject, "Email sent");
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                tracing::error!(status = %status, body = %body, "Failed to send email");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to send email");
            }
        }
    }

    /// Verification email with the verify link and a companion resend link.
    pub async fn send_verification_email(
        &self,
        user: &User,
        verify_token: &str,
        resend_token: &str,
    ) {
        let verify_link = format!("{}/account/verify/{}", self.config.public_url, verify_token);
        let resend_link = format!(
            "{}/account/resend-verification/{}",
            self.config.public_url, resend_token
        );

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif;">
  <h2>Verify your email address</h2>
  <p>Hi {name},</p>
  <p>Please confirm your email address to activate your Herodex account.</p>
  <p><a href="{verify_link}">Verify your email</a> (valid for one hour)</p>
  <p style="color: #666; font-size: 14px;">
    Link expired? <a href="{resend_link}">Request a new verification email</a>.
  </p>
</body>
</html>"#,
            name = user.name(),
        );

        self.send_email(&user.email, "Verify your email address", &html)
            .await;
    }

    /// Password reset email with the confirm link.
    pub async fn send_password_reset_email(&self, email: &str, reset_token: &str) {
        let link = format!(
            "{}/account/password-reset-confirm/{}",
            self.config.public_url, reset_token
        );

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif;">
  <h2>Reset your password</h2>
  <p>A password reset was requested for this address.</p>
  <p><a href="{link}">Choose a new password</a> (valid for thirty minutes)</p>
  <p style="color: #666; font-size: 14px;">
    If you did not request this, you can safely ignore this email.
  </p>
</body>
</html>"#,
        );

        self.send_email(email, "Reset Your Password", &html).await;
    }
}
