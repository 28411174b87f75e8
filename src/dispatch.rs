//! Sequential send loop with randomized pacing.

use crate::client::{HttpMethod, MessageClient};
use crate::error::Result;
use crate::ledger::RecipientLedger;
use crate::templates::{MediaLibrary, Template, TemplateCatalog};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Result of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientOutcome {
    pub number: String,
    pub template: String,
    pub delivery: Delivery,
}

#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub outcomes: Vec<RecipientOutcome>,
    pub interrupted: bool,
}

impl DispatchReport {
    fn new(total: usize) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            total,
            outcomes: Vec::new(),
            interrupted: false,
        }
    }

    pub fn sent(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.delivery == Delivery::Sent)
            .map(|o| o.number.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.delivery {
            Delivery::Failed(reason) => Some((o.number.as_str(), reason.as_str())),
            Delivery::Sent => None,
        })
    }

    /// Recipients never attempted because the run stopped early.
    pub fn not_attempted(&self) -> usize {
        self.total - self.outcomes.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} sent, {} failed, {} not attempted{} in {}s",
            self.sent().count(),
            self.failed().count(),
            self.not_attempted(),
            if self.interrupted { " (interrupted)" } else { "" },
            (self.finished_at - self.started_at).num_seconds()
        )
    }
}

/// Sends one templated message per pending recipient, in ledger order.
///
/// Recipient `i` gets template `i mod n` of a single shuffle of the catalog.
/// Successful sends move the recipient to the sent list. Validation and
/// transport failures are reported and the loop moves on; storage failures
/// stop the run. Between sends the loop waits a uniformly random duration
/// from `pacing`, and a shutdown signal ends that wait at once. An in-flight
/// send is always allowed to finish so the ledger stays consistent.
pub struct Dispatcher<'a, R: Rng = StdRng> {
    client: &'a MessageClient,
    ledger: &'a mut RecipientLedger,
    catalog: &'a TemplateCatalog,
    media: MediaLibrary,
    pacing: RangeInclusive<Duration>,
    method: HttpMethod,
    shutdown: watch::Receiver<bool>,
    rng: R,
}

impl<'a, R: Rng> Dispatcher<'a, R> {
    pub fn new(
        client: &'a MessageClient,
        ledger: &'a mut RecipientLedger,
        catalog: &'a TemplateCatalog,
        media: MediaLibrary,
        pacing: RangeInclusive<Duration>,
        shutdown: watch::Receiver<bool>,
        rng: R,
    ) -> Self {
        Self {
            client,
            ledger,
            catalog,
            media,
            pacing,
            method: HttpMethod::Post,
            shutdown,
            rng,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub async fn run(&mut self) -> Result<DispatchReport> {
        let recipients = self.ledger.pending().to_vec();
        let mut report = DispatchReport::new(recipients.len());

        if recipients.is_empty() || self.catalog.is_empty() {
            warn!(
                "Nothing to send ({} recipients, {} templates)",
                recipients.len(),
                self.catalog.len()
            );
            return Ok(report);
        }

        let rotation = self.catalog.rotation(&mut self.rng);
        info!(
            "📨 Starting the sending loop: {} recipients, {} templates",
            recipients.len(),
            rotation.len()
        );

        for (i, number) in recipients.iter().enumerate() {
            if self.shutdown_requested() {
                report.interrupted = true;
                break;
            }

            let Some(template) = rotation.for_index(i) else {
                break;
            };

            let delivery = self.deliver(number, template).await?;
            report.outcomes.push(RecipientOutcome {
                number: number.clone(),
                template: template.name.clone(),
                delivery,
            });

            let Some(next) = recipients.get(i + 1) else {
                break;
            };

            if self.shutdown_requested() {
                report.interrupted = true;
                break;
            }

            let delay = self.rng.gen_range(self.pacing.clone());
            info!("➡️ Next message will be sent to: {}", next);
            info!("⏳ Waiting {} before the next send", format_wait(delay));

            if !self.wait(delay).await {
                report.interrupted = true;
                break;
            }
        }

        report.finished_at = Utc::now();
        if report.interrupted {
            warn!("🛑 Sending interrupted: {}", report.summary());
        } else {
            info!("✓ Sending loop finished: {}", report.summary());
        }

        Ok(report)
    }

    /// One attempt for one recipient. Only storage errors escape.
    async fn deliver(&mut self, number: &str, template: &Template) -> Result<Delivery> {
        info!("Sending to {} using template '{}'", number, template.name);

        let media_url = self.media.pick(&mut self.rng);
        let result = self
            .client
            .send_button_message(
                number,
                &template.message,
                &template.buttons,
                &media_url,
                template.footer.as_deref(),
                self.method,
            )
            .await;

        match result {
            Ok(response) => {
                if let Err(e) = self.ledger.mark_sent(number) {
                    error!("Sent to {} but could not update the ledger: {}", number, e);
                    return Err(e);
                }
                info!("✓ Message sent successfully to {}", number);
                debug!("Response: {}", response);
                Ok(Delivery::Sent)
            }
            Err(e) if e.is_per_recipient() => {
                error!("❌ Failed to send message to {}: {}", number, e);
                Ok(Delivery::Failed(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Returns `false` if shutdown was requested before `delay` elapsed.
    async fn wait(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = wait_for_shutdown(&mut self.shutdown) => false,
        }
    }
}

/// Resolves once shutdown is signalled. Never resolves if the sender is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn format_wait(delay: Duration) -> String {
    let secs = delay.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
