//! Template check binary - validates the template catalog without sending
//!
//! Usage:
//!   cargo run --bin check-templates
//!   cargo run --bin check-templates -- 919876543210   # sample recipient
//!
//! Reads TEMPLATES_FILE, MEDIA_BASE_URL and MEDIA_IMAGE_COUNT from the
//! environment (see config.rs). Credentials are not required.

use anyhow::{Context, Result};
use promo_sender::{
    client::SendButtonPayload,
    config::Config,
    templates::{MediaLibrary, TemplateCatalog},
    validator::MessageValidator,
};
use tracing::info;

const SAMPLE_RECIPIENT: &str = "9999999999";

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("check_templates=info".parse()?),
        )
        .init();

    let config = Config::from_env();
    let recipient = std::env::args()
        .nth(1)
        .unwrap_or_else(|| SAMPLE_RECIPIENT.to_string());

    let catalog = TemplateCatalog::load(&config.templates_file)
        .with_context(|| format!("Template catalog {} is not usable", config.templates_file))?;

    let media = MediaLibrary::new(&config.media_base_url, config.media_image_count);
    let media_url = media.pick(&mut rand::thread_rng());

    for template in catalog.templates() {
        let report = MessageValidator::validate_message_request(
            &recipient,
            &template.message,
            &template.buttons,
            &media_url,
            template.footer.as_deref(),
        );

        println!("\n{}", "=".repeat(60));
        println!(
            "{} [{}]",
            template.name,
            if report.valid { "ok" } else { "INVALID" }
        );
        for error in &report.errors {
            println!("  - {}", error);
        }

        let payload = SendButtonPayload {
            api_key: "<api_key>",
            sender: "<sender>",
            number: &recipient,
            message: &template.message,
            url: &media_url,
            button: &template.buttons,
            footer: template.footer.as_deref(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }

    info!("✓ Checked {} templates", catalog.len());
    Ok(())
}
