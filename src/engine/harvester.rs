//! Harvester
//!
//! Feeds one controller's records into a sink in batches.

use super::controller::PaginationController;
use super::transport::Transport;
use super::types::{HarvestConfig, HarvestStats, PageOutcome};
use crate::error::Result;
use crate::pagination::StopReason;
use crate::sink::{RecordSink, SinkTarget};
use crate::types::JsonValue;
use futures::StreamExt;
use std::time::Instant;
use tracing::{info, warn};

/// Harvests exactly one resource into a sink
pub struct Harvester<T> {
    controller: PaginationController<T>,
    config: HarvestConfig,
}

impl<T: Transport> Harvester<T> {
    /// Create a harvester with the default configuration
    pub fn new(controller: PaginationController<T>) -> Self {
        Self {
            controller,
            config: HarvestConfig::default(),
        }
    }

    /// Set harvest configuration
    #[must_use]
    pub fn with_config(mut self, config: HarvestConfig) -> Self {
        self.config = config;
        self
    }

    /// The underlying controller
    pub fn controller(&self) -> &PaginationController<T> {
        &self.controller
    }

    /// Run the harvest to completion
    pub async fn run(&mut self, sink: &mut dyn RecordSink) -> Result<HarvestStats> {
        let start = Instant::now();
        let descriptor = self.controller.descriptor();
        let target = SinkTarget::new(&descriptor.name, descriptor.write_mode)
            .with_primary_key(descriptor.primary_key.clone());

        info!(
            resource = %target.resource,
            strategy = self.controller.strategy(),
            mode = %target.write_mode,
            "Starting harvest"
        );

        sink.open(&target).await?;

        let mut stats = HarvestStats::new();
        let mut buffer: Vec<JsonValue> = Vec::with_capacity(self.config.batch_size);
        let batch_size = self.config.batch_size.max(1);
        let max_records = self.config.max_records;
        let mut emitted = 0usize;

        {
            let mut pages = Box::pin(self.controller.pages());
            while let Some(outcome) = pages.next().await {
                let outcome = outcome?;
                stats.add_page();
                let stop = outcome.stop_reason().cloned();
                let mut records = match outcome {
                    PageOutcome::Fail(_) => Vec::new(),
                    other => other.into_records(),
                };

                let mut limit_hit = false;
                if let Some(max) = max_records {
                    let room = max.saturating_sub(emitted);
                    if records.len() >= room {
                        records.truncate(room);
                        limit_hit = true;
                    }
                }
                emitted += records.len();
                buffer.extend(records);

                if buffer.len() >= batch_size {
                    for chunk in buffer.chunks(batch_size) {
                        sink.write(chunk).await?;
                    }
                    buffer.clear();
                }

                if let Some(reason) = stop {
                    stats.stop_reason = Some(reason);
                    break;
                }
                if limit_hit {
                    stats.stop_reason = Some(StopReason::RecordLimit);
                    break;
                }
            }
        }

        if !buffer.is_empty() {
            sink.write(&buffer).await?;
        }
        stats.records = sink.close().await?;

        if let Some(tracker) = self.controller.tracker() {
            stats.filtered = tracker.seen_count();
            stats.unreadable_cursor = tracker.unreadable_count();
            stats.final_cursor = Some(tracker.current_value().to_string());
        }
        stats.duration_ms = start.elapsed().as_millis() as u64;

        if stats.truncated() {
            warn!(
                resource = %target.resource,
                records = stats.records,
                pages = stats.pages,
                reason = ?stats.stop_reason,
                "Harvest ended early; earlier records were kept"
            );
        } else {
            info!(
                resource = %target.resource,
                records = stats.records,
                pages = stats.pages,
                filtered = stats.filtered,
                duration_ms = stats.duration_ms,
                "Harvest complete"
            );
        }

        Ok(stats)
    }
}

impl<T> std::fmt::Debug for Harvester<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("controller", &self.controller)
            .field("config", &self.config)
            .finish()
    }
}
