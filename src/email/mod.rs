//! Outbound transactional email: transport, templates and logged delivery.

pub mod client;
pub mod templates;

pub use client::{Mailer, OutboundEmail, ResendMailer};
pub use templates::{RenderedEmail, Templates};

use crate::db::{DbActorHandle, EmailLogCreate};
use crate::utils::logging::mask_email;
use std::sync::Arc;
use tracing::{info, warn};

/// Send one rendered email and record the attempt in `email_logs`.
///
/// Returns `true` when the provider accepted the message. Failures are logged
/// and recorded, never propagated.
pub async fn deliver(
    mailer: &dyn Mailer,
    db: &DbActorHandle,
    recipient: &str,
    email: RenderedEmail,
) -> bool {
    let outbound = OutboundEmail {
        to: recipient.to_string(),
        subject: email.subject,
        html: email.html,
    };

    let (log, sent) = match mailer.send(&outbound).await {
        Ok(provider_id) => {
            info!(to = %mask_email(recipient), template = %email.template, "Email sent");
            (
                EmailLogCreate::sent(recipient, &email.template, Some(provider_id)),
                true,
            )
        }
        Err(e) => {
            warn!(
                to = %mask_email(recipient),
                template = %email.template,
                error = %e,
                "Email send failed"
            );
            (
                EmailLogCreate::failed(recipient, &email.template, e.to_string()),
                false,
            )
        }
    };

    if let Err(e) = db.record_email(log).await {
        warn!(
            to = %mask_email(recipient),
            template = %email.template,
            error = %e,
            "Failed to record email log"
        );
    }
    sent
}

/// Fire-and-forget [`deliver`] for request handlers.
pub fn spawn_deliver(
    mailer: Arc<dyn Mailer>,
    db: DbActorHandle,
    recipient: String,
    email: RenderedEmail,
) {
    tokio::spawn(async move {
        deliver(mailer.as_ref(), &db, &recipient, email).await;
    });
}
