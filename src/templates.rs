//! Promotional template catalog, rotation and media selection.

use crate::error::{Error, Result};
use crate::models::Button;
use crate::validator::MessageValidator;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A pre-authored message body, footer and button set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

impl Template {
    /// Every reason this template could never pass send validation.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !MessageValidator::validate_message_content(&self.message) {
            problems.push("invalid message content".to_string());
        }
        if let Some(footer) = &self.footer {
            if !MessageValidator::validate_footer(footer) {
                problems.push("footer text too long".to_string());
            }
        }
        problems.extend(MessageValidator::button_problems(&self.buttons));
        for button in &self.buttons {
            if let Button::Url { url, .. } = button {
                if !url.is_empty() && !MessageValidator::validate_url(url) {
                    problems.push(format!("invalid button URL: {}", url));
                }
            }
        }

        problems
    }
}

/// The full set of templates, validated once when loaded.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Build a catalog, rejecting it if any template is unusable.
    pub fn new(templates: Vec<Template>) -> Result<Self> {
        let problems: Vec<String> = templates
            .iter()
            .flat_map(|t| {
                t.problems()
                    .into_iter()
                    .map(move |p| format!("{}: {}", t.name, p))
            })
            .collect();

        if !problems.is_empty() {
            return Err(Error::Template(problems.join("; ")));
        }

        Ok(Self { templates })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let templates: Vec<Template> = serde_json::from_str(json)
            .map_err(|e| Error::Template(format!("could not decode catalog: {}", e)))?;
        Self::new(templates)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::storage(path, e))?;
        let catalog = Self::from_json_str(&content)?;
        info!("Loaded {} templates from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Shuffle once and hand out templates cyclically.
    pub fn rotation<R: Rng + ?Sized>(&self, rng: &mut R) -> TemplateRotation {
        let mut order = self.templates.clone();
        order.shuffle(rng);
        TemplateRotation { order }
    }
}

/// A fixed, shuffled template order. Recipient `i` gets `order[i % len]`.
#[derive(Debug, Clone)]
pub struct TemplateRotation {
    order: Vec<Template>,
}

impl TemplateRotation {
    pub fn for_index(&self, index: usize) -> Option<&Template> {
        if self.order.is_empty() {
            return None;
        }
        self.order.get(index % self.order.len())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Numbered images hosted under a base URL: `{base}/{n}.jpg` for `n` in
/// `1..=count`.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    base_url: String,
    count: u32,
}

impl MediaLibrary {
    pub fn new(base_url: &str, count: u32) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            count: count.max(1),
        }
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let n = rng.gen_range(1..=self.count);
        format!("{}/{}.jpg", self.base_url, n)
    }
}

// ==================== Built-in templates ====================

pub fn welcome_message() -> Template {
    Template {
        name: "welcome".to_string(),
        message: "🎉 Welcome aboard! We're excited to have you. As a thank you, we've added free credit to your account so you can try our services.".to_string(),
        footer: Some("Your journey to better communication starts here!".to_string()),
        buttons: vec![
            Button::url("Get Started", "https://example.com/signup"),
            Button::reply("Need Help?"),
        ],
    }
}

pub fn promotional_message(offer: &str, promo_code: &str) -> Template {
    Template {
        name: "promotional".to_string(),
        message: format!(
            "✨ Special Offer! {}. Use the code below to claim your discount.",
            offer
        ),
        footer: Some("Limited time offer. Don't miss out!".to_string()),
        buttons: vec![
            Button::copy(format!("Copy Code: {}", promo_code), promo_code),
            Button::url("View Pricing", "https://example.com/pricing"),
        ],
    }
}

pub fn pricing_info_message(sales_number: &str) -> Template {
    Template {
        name: "pricing_info".to_string(),
        message: "Lowest price guaranteed! Bulk SMS and WhatsApp messaging plans for every volume. Check out our detailed pricing plan.".to_string(),
        footer: Some("Volume discounts available.".to_string()),
        buttons: vec![
            Button::url("Full Pricing Table", "https://example.com/pricing"),
            Button::call("Contact Sales", sales_number),
            Button::reply("Custom Plan?"),
        ],
    }
}

pub fn otp_message(otp_code: &str) -> Template {
    Template {
        name: "otp".to_string(),
        message: format!(
            "Your secure OTP is: {}. This code is valid for 10 minutes. Please do not share it with anyone.",
            otp_code
        ),
        footer: Some("Security is our priority.".to_string()),
        buttons: vec![Button::reply("Resend OTP")],
    }
}

pub fn support_contact_message(support_number: &str) -> Template {
    Template {
        name: "support_contact".to_string(),
        message: "Need assistance? Our team is here to help! You can reach us via call or check our FAQ for quick answers.".to_string(),
        footer: Some("We're here to help 24/7.".to_string()),
        buttons: vec![
            Button::call("Call Support", support_number),
            Button::url("Read FAQ", "https://example.com/faq"),
            Button::url("Contact on Telegram", "https://t.me/example_support"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn template(name: &str) -> Template {
        Template {
            name: name.to_string(),
            message: format!("Message from {}", name),
            footer: None,
            buttons: vec![Button::reply("Reply")],
        }
    }

    // ==================== Catalog Loading Tests ====================

    #[test]
    fn test_from_json_str() {
        let json = r#"[
            {
                "name": "offer",
                "message": "Big sale today",
                "footer": "T&C apply",
                "buttons": [
                    {"type": "copy", "displayText": "Copy Code", "copyCode": "SALE"},
                    {"type": "url", "displayText": "Shop", "url": "https://example.com/shop"}
                ]
            },
            {"name": "plain", "message": "Hello there"}
        ]"#;

        let catalog = TemplateCatalog::from_json_str(json).expect("Should load");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.templates()[0].buttons[0], Button::copy("Copy Code", "SALE"));
        assert_eq!(catalog.templates()[0].footer.as_deref(), Some("T&C apply"));
        assert!(catalog.templates()[1].buttons.is_empty());
        assert!(catalog.templates()[1].footer.is_none());
    }

    #[test]
    fn test_catalog_rejects_button_without_required_field() {
        let json = r#"[{"name": "broken", "message": "Hi", "buttons": [{"type": "call", "displayText": "Call"}]}]"#;
        let err = TemplateCatalog::from_json_str(json).expect_err("Should fail");
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_catalog_rejects_invalid_json() {
        let err = TemplateCatalog::from_json_str("{not json").expect_err("Should fail");
        assert!(err.to_string().contains("could not decode catalog"));
    }

    #[test]
    fn test_catalog_lists_every_problem() {
        let mut too_many = template("too_many");
        too_many.buttons = vec![Button::reply("a"); 4];
        let mut long_footer = template("long_footer");
        long_footer.footer = Some("x".repeat(61));
        let mut empty = template("empty");
        empty.message = "  ".to_string();

        let err = TemplateCatalog::new(vec![too_many, long_footer, empty, template("fine")])
            .expect_err("Should fail");
        let text = err.to_string();
        assert!(text.contains("too_many: too many buttons"));
        assert!(text.contains("long_footer: footer text too long"));
        assert!(text.contains("empty: invalid message content"));
        assert!(!text.contains("fine"));
    }

    #[test]
    fn test_catalog_rejects_bad_button_url() {
        let mut bad = template("bad_url");
        bad.buttons = vec![Button::url("Visit", "example.com")];
        let err = TemplateCatalog::new(vec![bad]).expect_err("Should fail");
        assert!(err.to_string().contains("invalid button URL"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, r#"[{{"name": "a", "message": "Hello"}}]"#).expect("write");

        let catalog = TemplateCatalog::load(file.path()).expect("Should load");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.templates()[0].name, "a");
    }

    #[test]
    fn test_load_missing_file_is_storage_error() {
        let err = TemplateCatalog::load("/nonexistent/templates.json").expect_err("Should fail");
        assert!(matches!(err, Error::Storage { .. }));
    }

    // ==================== Rotation Tests ====================

    #[test]
    fn test_rotation_assigns_by_index_mod_len() {
        let catalog = TemplateCatalog::new(vec![template("a"), template("b")]).expect("valid");
        let mut rng = StdRng::seed_from_u64(7);
        let rotation = catalog.rotation(&mut rng);

        let names: Vec<&str> = (0..5)
            .map(|i| rotation.for_index(i).expect("template").name.as_str())
            .collect();

        assert_eq!(names[0], names[2]);
        assert_eq!(names[2], names[4]);
        assert_eq!(names[1], names[3]);
        assert_ne!(names[0], names[1]);
    }

    #[test]
    fn test_rotation_is_a_permutation() {
        let templates: Vec<Template> = (0..6).map(|i| template(&format!("t{}", i))).collect();
        let catalog = TemplateCatalog::new(templates).expect("valid");
        let mut rng = StdRng::seed_from_u64(42);
        let rotation = catalog.rotation(&mut rng);

        let mut names: Vec<String> = (0..6)
            .map(|i| rotation.for_index(i).expect("template").name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["t0", "t1", "t2", "t3", "t4", "t5"]);
        assert_eq!(rotation.len(), 6);
    }

    #[test]
    fn test_empty_rotation() {
        let rotation = TemplateCatalog::default().rotation(&mut StdRng::seed_from_u64(1));
        assert!(rotation.is_empty());
        assert!(rotation.for_index(3).is_none());
    }

    // ==================== Media Tests ====================

    #[test]
    fn test_media_pick_in_range() {
        let media = MediaLibrary::new("https://example.com/images/", 15);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let url = media.pick(&mut rng);
            let n: u32 = url
                .strip_prefix("https://example.com/images/")
                .and_then(|s| s.strip_suffix(".jpg"))
                .and_then(|s| s.parse().ok())
                .expect("numbered image");
            assert!((1..=15).contains(&n));
            assert!(MessageValidator::validate_url(&url));
        }
    }

    #[test]
    fn test_media_zero_count_still_picks() {
        let media = MediaLibrary::new("https://example.com/img", 0);
        assert_eq!(media.pick(&mut StdRng::seed_from_u64(0)), "https://example.com/img/1.jpg");
    }

    // ==================== Built-in Template Tests ====================

    #[test]
    fn test_builtin_templates_are_valid() {
        let catalog = TemplateCatalog::new(vec![
            welcome_message(),
            promotional_message("20% off all plans", "SAVE20"),
            pricing_info_message("+15555550100"),
            otp_message("482913"),
            support_contact_message("+15555550100"),
        ])
        .expect("built-in templates should validate");
        assert_eq!(catalog.len(), 5);
    }

    #[test]
    fn test_promotional_message_embeds_offer_and_code() {
        let template = promotional_message("20% off", "SAVE20");
        assert!(template.message.contains("20% off"));
        assert_eq!(template.buttons[0], Button::copy("Copy Code: SAVE20", "SAVE20"));
    }

    #[test]
    fn test_otp_message_embeds_code() {
        assert!(otp_message("123456").message.contains("123456"));
    }
}
