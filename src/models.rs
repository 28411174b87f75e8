use serde::{Deserialize, Serialize};
use std::fmt;

/// The four button kinds the messaging API understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonType {
    Reply,
    Call,
    Url,
    Copy,
}

impl ButtonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonType::Reply => "reply",
            ButtonType::Call => "call",
            ButtonType::Url => "url",
            ButtonType::Copy => "copy",
        }
    }
}

impl fmt::Display for ButtonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interactive button attached to a message.
///
/// Serializes to the wire shape `{type, displayText, phoneNumber|url|copyCode}`.
/// The variant-specific field is omitted when empty, and a Reply button carries
/// none. Deserializing a Call, Url or Copy button without its field fails, so a
/// template catalog with an incomplete button is rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Button {
    Reply {
        #[serde(rename = "displayText")]
        display_text: String,
    },
    Call {
        #[serde(rename = "displayText")]
        display_text: String,
        #[serde(rename = "phoneNumber", skip_serializing_if = "String::is_empty")]
        phone_number: String,
    },
    Url {
        #[serde(rename = "displayText")]
        display_text: String,
        #[serde(skip_serializing_if = "String::is_empty")]
        url: String,
    },
    Copy {
        #[serde(rename = "displayText")]
        display_text: String,
        #[serde(rename = "copyCode", skip_serializing_if = "String::is_empty")]
        copy_code: String,
    },
}

impl Button {
    pub fn reply(display_text: impl Into<String>) -> Self {
        Button::Reply {
            display_text: display_text.into(),
        }
    }

    pub fn call(display_text: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Button::Call {
            display_text: display_text.into(),
            phone_number: phone_number.into(),
        }
    }

    pub fn url(display_text: impl Into<String>, url: impl Into<String>) -> Self {
        Button::Url {
            display_text: display_text.into(),
            url: url.into(),
        }
    }

    pub fn copy(display_text: impl Into<String>, copy_code: impl Into<String>) -> Self {
        Button::Copy {
            display_text: display_text.into(),
            copy_code: copy_code.into(),
        }
    }

    pub fn kind(&self) -> ButtonType {
        match self {
            Button::Reply { .. } => ButtonType::Reply,
            Button::Call { .. } => ButtonType::Call,
            Button::Url { .. } => ButtonType::Url,
            Button::Copy { .. } => ButtonType::Copy,
        }
    }

    pub fn display_text(&self) -> &str {
        match self {
            Button::Reply { display_text }
            | Button::Call { display_text, .. }
            | Button::Url { display_text, .. }
            | Button::Copy { display_text, .. } => display_text,
        }
    }

    /// The field this variant requires, paired with its wire name.
    /// `None` for Reply buttons.
    pub fn required_field(&self) -> Option<(&'static str, &str)> {
        match self {
            Button::Reply { .. } => None,
            Button::Call { phone_number, .. } => Some(("phoneNumber", phone_number)),
            Button::Url { url, .. } => Some(("url", url)),
            Button::Copy { copy_code, .. } => Some(("copyCode", copy_code)),
        }
    }
}
