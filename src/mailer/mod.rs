//! Outbound mail via the Resend API.
//!
//! Messages are sent on behalf of a member: their display name goes in the
//! from line, their address in reply-to, and a standard footer is appended so
//! recipients know where the mail came from.

use serde::Deserialize;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::Member;

pub struct Mailer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    from_address: String,
}

#[derive(Deserialize)]
struct ResendError {
    message: Option<String>,
}

fn footer(sender_name: &str) -> String {
    format!(
        "\n\n-- Sent by {} via Fireside Bookgroup.\n\
         We are a small but vibrant group of readers in Puhoi, New Zealand.\n\
         If you don't want to be contacted, or think this was sent in error, \
         please email the webmaster.\n",
        sender_name
    )
}

impl Mailer {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_base: config.resend_api_base.clone(),
            api_key: config.resend_api_key.clone(),
            from_address: config.email_from.clone(),
        }
    }

    /// Send one message to the given recipients. Returns the count sent.
    pub async fn send(
        &self,
        sender: &Member,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<usize, AppError> {
        let sender_name = sender.display_name();
        let payload = serde_json::json!({
            "from": format!("{} <{}>", sender_name, self.from_address),
            "to": recipients,
            "reply_to": sender.email,
            "subject": subject.trim(),
            "text": format!("{}{}", body.trim(), footer(&sender_name)),
        });

        let response = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ResendError>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Resend API error".to_string());
            return Err(AppError::Upstream(format!(
                "Mail send failed ({}): {}",
                status, message
            )));
        }

        tracing::info!("Sent \"{}\" to {} recipients", subject.trim(), recipients.len());
        Ok(recipients.len())
    }
}
