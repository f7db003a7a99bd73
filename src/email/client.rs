use crate::error::LaunchpadError;
use crate::utils::logging::mask_email;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// A fully rendered message ready for the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Transactional email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message and return the provider's message id.
    async fn send(&self, email: &OutboundEmail) -> Result<String, LaunchpadError>;
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Resend-compatible HTTP mailer. Sends are not retried; a failure is logged by the caller.
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: Url,
    auth: HeaderValue,
    from: String,
}

impl ResendMailer {
    pub fn new(
        client: reqwest::Client,
        api_url: Url,
        api_key: &str,
        from: impl Into<String>,
    ) -> Result<Self, LaunchpadError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            LaunchpadError::UnexpectedError("email api key is not a valid header value".to_string())
        })?;
        auth.set_sensitive(true);

        Ok(Self {
            client,
            api_url,
            auth,
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String, LaunchpadError> {
        let body = SendRequest {
            from: &self.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let resp = self
            .client
            .post(self.api_url.clone())
            .header(AUTHORIZATION, self.auth.clone())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let preview = resp.text().await.unwrap_or_default();
            warn!(
                %status,
                to = %mask_email(&email.to),
                body = %format!("{preview:.200}"),
                "Email provider rejected message"
            );
            return Err(LaunchpadError::UpstreamStatus(status));
        }

        let SendResponse { id } = resp.json().await?;
        debug!(to = %mask_email(&email.to), provider_id = %id, "Email accepted by provider");
        Ok(id)
    }
}
