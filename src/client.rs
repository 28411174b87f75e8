use crate::config::Credentials;
use crate::error::{Error, Result, TransportError};
use crate::models::Button;
use crate::validator::MessageValidator;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// HTTP method used for the send-button call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Post,
    Get,
}

/// Body of a `/send-button` request.
#[derive(Debug, Serialize)]
pub struct SendButtonPayload<'a> {
    pub api_key: &'a str,
    pub sender: &'a str,
    pub number: &'a str,
    pub message: &'a str,
    pub url: &'a str,
    pub button: &'a [Button],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<&'a str>,
}

impl SendButtonPayload<'_> {
    /// Flat key/value pairs for a GET request. `button` is carried as a JSON
    /// array string.
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let buttons = serde_json::to_string(self.button).unwrap_or_else(|_| "[]".to_string());
        let mut pairs = vec![
            ("api_key", self.api_key.to_string()),
            ("sender", self.sender.to_string()),
            ("number", self.number.to_string()),
            ("message", self.message.to_string()),
            ("url", self.url.to_string()),
            ("button", buttons),
        ];
        if let Some(footer) = self.footer {
            pairs.push(("footer", footer.to_string()));
        }
        pairs
    }
}

/// Client for sending button messages through the messaging API.
///
/// Every call is a single attempt: no retries, no idempotency key.
#[derive(Debug, Clone)]
pub struct MessageClient {
    http: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl MessageClient {
    pub fn new(credentials: Credentials, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Request)?;

        Ok(Self {
            http,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/send-button", self.base_url)
    }

    pub fn create_reply_button(&self, display_text: &str) -> Button {
        Button::reply(display_text)
    }

    pub fn create_call_button(&self, display_text: &str, phone_number: &str) -> Button {
        Button::call(display_text, phone_number)
    }

    pub fn create_url_button(&self, display_text: &str, url: &str) -> Button {
        Button::url(display_text, url)
    }

    pub fn create_copy_button(&self, display_text: &str, copy_code: &str) -> Button {
        Button::copy(display_text, copy_code)
    }

    /// Send a message with buttons.
    ///
    /// Validation runs first; an invalid request fails with
    /// [`Error::Validation`] and never reaches the network. A non-2xx status
    /// or a success body that is not JSON is a [`TransportError`].
    pub async fn send_button_message(
        &self,
        recipient: &str,
        message: &str,
        buttons: &[Button],
        media_url: &str,
        footer: Option<&str>,
        method: HttpMethod,
    ) -> Result<serde_json::Value> {
        let (is_valid, errors) = MessageValidator::validate_send_request(
            self.credentials.api_key(),
            self.credentials.sender(),
            recipient,
            message,
            buttons,
            media_url,
            footer,
        );
        if !is_valid {
            return Err(Error::Validation(errors));
        }

        let payload = SendButtonPayload {
            api_key: self.credentials.api_key(),
            sender: self.credentials.sender(),
            number: recipient,
            message,
            url: media_url,
            button: buttons,
            footer: footer.filter(|f| !f.is_empty()),
        };

        let endpoint = self.endpoint();
        debug!("{:?} {} for {}", method, endpoint, recipient);

        let request = match method {
            HttpMethod::Post => self
                .http
                .post(&endpoint)
                .header("Content-Type", "application/json")
                .json(&payload),
            HttpMethod::Get => self.http.get(&endpoint).query(&payload.query_pairs()),
        };

        let response = request.send().await.map_err(TransportError::Request)?;

        let status = response.status();
        let body = response.text().await.map_err(TransportError::Request)?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        serde_json::from_str(&body)
            .map_err(|source| TransportError::MalformedBody { body, source }.into())
    }

    /// Send a message with a single reply button.
    pub async fn send_simple_message(
        &self,
        recipient: &str,
        message: &str,
        media_url: &str,
        reply_button_text: &str,
        footer: Option<&str>,
    ) -> Result<serde_json::Value> {
        let buttons = [self.create_reply_button(reply_button_text)];
        self.send_button_message(
            recipient,
            message,
            &buttons,
            media_url,
            footer,
            HttpMethod::Post,
        )
        .await
    }

    /// Send a message with reply and call buttons, plus a website button when
    /// `website_url` is given.
    pub async fn send_contact_message(
        &self,
        recipient: &str,
        message: &str,
        media_url: &str,
        call_number: &str,
        website_url: Option<&str>,
        footer: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mut buttons = vec![
            self.create_reply_button("Reply"),
            self.create_call_button("Call Us", call_number),
        ];

        if let Some(url) = website_url.filter(|u| !u.is_empty()) {
            buttons.push(self.create_url_button("Visit Website", url));
        }

        self.send_button_message(
            recipient,
            message,
            &buttons,
            media_url,
            footer,
            HttpMethod::Post,
        )
        .await
    }
}
