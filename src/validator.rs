//! Pre-flight validation for outbound button messages.
//!
//! Every check runs before a network call is attempted. Validation never
//! stops at the first problem: all violations are collected so a caller can
//! fix a request in one pass.

use crate::models::Button;
use regex::Regex;
use std::sync::OnceLock;

/// Maximum number of buttons the messaging API accepts on one message.
pub const MAX_BUTTONS: usize = 3;

/// Maximum message body length, in characters, after trimming.
pub const MAX_MESSAGE_CHARS: usize = 1600;

/// Maximum footer length, in characters, after trimming.
pub const MAX_FOOTER_CHARS: usize = 60;

/// Outcome of validating a message request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validator for message requests.
pub struct MessageValidator;

static URL_REGEX: OnceLock<Regex> = OnceLock::new();

impl MessageValidator {
    /// `+` followed by at least 9 digits, or at least 10 digits, after trimming.
    pub fn validate_phone_number(phone: &str) -> bool {
        let phone = phone.trim();
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

        match phone.strip_prefix('+') {
            Some(rest) => all_digits(rest) && phone.len() >= 10,
            None => all_digits(phone) && phone.len() >= 10,
        }
    }

    pub fn validate_message_content(message: &str) -> bool {
        let message = message.trim();
        !message.is_empty() && message.chars().count() <= MAX_MESSAGE_CHARS
    }

    /// An empty set is valid.
    pub fn validate_buttons(buttons: &[Button]) -> bool {
        Self::button_problems(buttons).is_empty()
    }

    /// Every reason a button set is rejected, in button order.
    pub fn button_problems(buttons: &[Button]) -> Vec<String> {
        let mut problems = Vec::new();

        if buttons.len() > MAX_BUTTONS {
            problems.push(format!(
                "too many buttons ({} > {})",
                buttons.len(),
                MAX_BUTTONS
            ));
        }

        for (i, button) in buttons.iter().enumerate() {
            if button.display_text().trim().is_empty() {
                problems.push(format!("button {} has no display text", i + 1));
            }
            if let Some((field, value)) = button.required_field() {
                if value.trim().is_empty() {
                    problems.push(format!(
                        "{} button {} is missing {}",
                        button.kind(),
                        i + 1,
                        field
                    ));
                }
            }
        }

        problems
    }

    pub fn validate_url(url: &str) -> bool {
        if url.is_empty() {
            return false;
        }

        let regex = URL_REGEX.get_or_init(|| {
            Regex::new(concat!(
                r"(?i)^https?://",
                r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?",
                r"|localhost",
                r"|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
                r"(?::\d+)?",
                r"(?:/?|[/?]\S+)$",
            ))
            .expect("URL pattern is valid")
        });

        regex.is_match(url)
    }

    pub fn validate_footer(footer: &str) -> bool {
        footer.trim().chars().count() <= MAX_FOOTER_CHARS
    }

    /// Validate a complete message request.
    ///
    /// An empty `media_url` or a `None` footer is not checked.
    pub fn validate_message_request(
        recipient: &str,
        message: &str,
        buttons: &[Button],
        media_url: &str,
        footer: Option<&str>,
    ) -> ValidationReport {
        let mut errors = Vec::new();

        if !Self::validate_phone_number(recipient) {
            errors.push("Invalid recipient phone number".to_string());
        }

        if !Self::validate_message_content(message) {
            errors.push("Invalid message content".to_string());
        }

        for problem in Self::button_problems(buttons) {
            errors.push(format!("Invalid button configuration: {}", problem));
        }

        if !media_url.is_empty() && !Self::validate_url(media_url) {
            errors.push("Invalid media URL".to_string());
        }

        if let Some(footer) = footer {
            if !Self::validate_footer(footer) {
                errors.push(format!(
                    "Footer text too long (max {} characters)",
                    MAX_FOOTER_CHARS
                ));
            }
        }

        ValidationReport::from_errors(errors)
    }

    /// Validate credentials plus the message request.
    pub fn validate_send_request(
        api_key: &str,
        sender: &str,
        recipient: &str,
        message: &str,
        buttons: &[Button],
        media_url: &str,
        footer: Option<&str>,
    ) -> (bool, Vec<String>) {
        let mut errors = Vec::new();

        if api_key.trim().is_empty() {
            errors.push("API key is required".to_string());
        }

        if sender.trim().is_empty() {
            errors.push("Sender is required".to_string());
        }

        let report =
            Self::validate_message_request(recipient, message, buttons, media_url, footer);
        errors.extend(report.errors);

        (errors.is_empty(), errors)
    }
}
