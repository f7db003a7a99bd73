use crate::config::ChatConfig;
use crate::error::{IsRetryable, LaunchpadError};
use axum::response::{
    IntoResponse,
    sse::{Event, KeepAlive, Sse},
};
use backon::{ExponentialBuilder, Retryable};
use eventsource_stream::Eventsource;
use futures::{Stream, TryStreamExt};
use launchpad_schema::chat::ChatCompletionRequest;
use launchpad_schema::{ChatMessage, ChatRole};
use reqwest::header::{ACCEPT, HeaderValue};
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{debug, error, info};
use url::Url;

const SSE_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Streaming chat completions against an OpenAI-compatible upstream.
pub struct ChatProxy {
    client: reqwest::Client,
    api_url: Url,
    api_key: String,
    model: String,
    system_prompt: String,
    max_messages: usize,
    max_message_chars: usize,
    max_tokens: Option<u32>,
    retry_policy: ExponentialBuilder,
}

impl ChatProxy {
    /// `None` when no API key is configured.
    pub fn new(cfg: &ChatConfig, client: reqwest::Client) -> Option<Self> {
        let api_key = cfg.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300))
            .with_max_times(cfg.retry_max_times)
            .with_jitter();

        Some(Self {
            client,
            api_url: cfg.api_url.clone(),
            api_key: api_key.to_string(),
            model: cfg.model.clone(),
            system_prompt: cfg.system_prompt.clone(),
            max_messages: cfg.max_messages,
            max_message_chars: cfg.max_message_chars,
            max_tokens: cfg.max_tokens,
            retry_policy,
        })
    }

    pub fn validate(&self, messages: &[ChatMessage]) -> Result<(), LaunchpadError> {
        validate_messages(messages, self.max_messages, self.max_message_chars)
    }

    /// Open the upstream stream. Connect failures and 5xx answers are retried;
    /// once a 2xx arrives the body is handed back untouched.
    pub async fn open_stream(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<reqwest::Response, LaunchpadError> {
        let mut all = Vec::with_capacity(messages.len() + 1);
        all.push(ChatMessage {
            role: ChatRole::System,
            content: self.system_prompt.clone(),
        });
        all.extend(messages);

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: all,
            stream: true,
            max_tokens: self.max_tokens,
        };

        let this = self;
        let body = &body;
        let op = move || async move {
            let resp = this
                .client
                .post(this.api_url.clone())
                .bearer_auth(&this.api_key)
                .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
                .json(body)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let preview = resp.text().await.unwrap_or_default();
                debug!(%status, body = %format!("{preview:.200}"), "Chat upstream error");
                return Err(LaunchpadError::UpstreamStatus(status));
            }
            Ok(resp)
        };

        let resp = op
            .retry(self.retry_policy)
            .when(|e| e.is_retryable())
            .notify(|err, dur| {
                info!(error = %err, retry_in = ?dur, "Retrying chat upstream");
            })
            .await?;

        info!(model = %self.model, "Chat stream opened");
        Ok(resp)
    }
}

pub fn validate_messages(
    messages: &[ChatMessage],
    max_messages: usize,
    max_chars: usize,
) -> Result<(), LaunchpadError> {
    if messages.is_empty() || messages.len() > max_messages {
        return Err(LaunchpadError::validation(
            "INVALID_MESSAGES",
            format!("Between 1 and {max_messages} messages are required."),
        ));
    }
    for m in messages {
        if m.role == ChatRole::System {
            return Err(LaunchpadError::validation(
                "INVALID_ROLE",
                "Only user and assistant messages are accepted.",
            ));
        }
        if m.content.trim().is_empty() || m.content.chars().count() > max_chars {
            return Err(LaunchpadError::validation(
                "INVALID_MESSAGES",
                format!("Message content must be 1 to {max_chars} characters."),
            ));
        }
    }
    Ok(())
}

/// Relay the upstream SSE body to the client with an idle timeout.
pub fn relay_stream(upstream_resp: reqwest::Response) -> impl IntoResponse {
    let raw_stream = upstream_resp.bytes_stream().eventsource();
    let timed_stream =
        transform_stream(raw_stream)
            .timeout(SSE_IDLE_TIMEOUT)
            .map(|item| match item {
                Ok(Ok(event)) => Ok(event),
                Ok(Err(e)) => Err(LaunchpadError::StreamProtocolError(e.to_string())),
                Err(_) => {
                    error!("Upstream chat SSE stream timed out (idle > 60s)");
                    Err(LaunchpadError::StreamProtocolError(
                        "Stream idle timeout".to_string(),
                    ))
                }
            });

    Sse::new(timed_stream).keep_alive(KeepAlive::default())
}

/// Forward upstream `data:` payloads as-is, dropping empty events.
pub fn transform_stream<I, E>(s: I) -> impl Stream<Item = Result<Event, E>>
where
    I: Stream<Item = Result<eventsource_stream::Event, E>>,
{
    s.try_filter_map(move |upstream_event| async move {
        if upstream_event.data.is_empty() {
            return Ok(None);
        }
        Ok(Some(Event::default().data(upstream_event.data)))
    })
}
