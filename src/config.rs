use crate::error::Error;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Placeholder values shipped in sample environments. A configuration still
/// carrying them is treated as unset.
pub const API_KEY_PLACEHOLDER: &str = "your_api_key_here";
pub const SENDER_PLACEHOLDER: &str = "6281222xxxxxx";

pub const DEFAULT_BASE_URL: &str = "https://clients.blackserver.in";

#[derive(Debug, Clone)]
pub struct Config {
    // Messaging API
    pub api_key: String,
    pub sender: String,
    pub base_url: String,
    pub request_timeout_secs: u64,

    // Recipient ledger and templates
    pub pending_file: String,
    pub sent_file: String,
    pub templates_file: String,

    // Media attachments
    pub media_base_url: String,
    pub media_image_count: u32,

    // Pacing between sends
    pub delay_min_secs: u64,
    pub delay_max_secs: u64,
}

/// API credentials. Built once from [`Config`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    sender: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            sender: sender.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            // Messaging API
            api_key: std::env::var("MESSAGE_API_KEY")
                .unwrap_or_else(|_| API_KEY_PLACEHOLDER.to_string()),
            sender: std::env::var("MESSAGE_SENDER")
                .unwrap_or_else(|_| SENDER_PLACEHOLDER.to_string()),
            base_url: std::env::var("MESSAGE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            request_timeout_secs: match env_parse("REQUEST_TIMEOUT_SECS", 30) {
                0 => 30,
                secs => secs,
            },

            // Recipient ledger and templates
            pending_file: std::env::var("PENDING_NUMBERS_FILE")
                .unwrap_or_else(|_| "number.txt".to_string()),
            sent_file: std::env::var("SENT_NUMBERS_FILE")
                .unwrap_or_else(|_| "sent.txt".to_string()),
            templates_file: std::env::var("TEMPLATES_FILE")
                .unwrap_or_else(|_| "promotional_templates.json".to_string()),

            // Media attachments
            media_base_url: std::env::var("MEDIA_BASE_URL")
                .unwrap_or_else(|_| "https://blacksms.in/assets/images".to_string()),
            media_image_count: env_parse("MEDIA_IMAGE_COUNT", 15),

            // Pacing
            delay_min_secs: env_parse("SEND_DELAY_MIN_SECS", 60),
            delay_max_secs: env_parse("SEND_DELAY_MAX_SECS", 300),
        }
    }

    /// Names of credential fields that are empty or still placeholders.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.api_key.trim().is_empty() || self.api_key == API_KEY_PLACEHOLDER {
            missing.push("API_KEY".to_string());
        }
        if self.sender.trim().is_empty() || self.sender == SENDER_PLACEHOLDER {
            missing.push("SENDER".to_string());
        }
        missing
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn ensure_valid(&self) -> Result<(), Error> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Configuration { missing })
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.api_key, &self.sender)
    }

    /// HTTP timeout, never below one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Inter-send wait range. An inverted range is swapped.
    pub fn pacing(&self) -> RangeInclusive<Duration> {
        let (lo, hi) = if self.delay_min_secs <= self.delay_max_secs {
            (self.delay_min_secs, self.delay_max_secs)
        } else {
            (self.delay_max_secs, self.delay_min_secs)
        };
        Duration::from_secs(lo)..=Duration::from_secs(hi)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
