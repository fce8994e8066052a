//! One hook invocation, end to end
//!
//! ```text
//! stdin line ──► RawEvent ──► NormalizerRegistry ──► SessionKey ──► TerminationPolicy
//!                                                                       │
//!                ┌────────────────────────┬─────────────────────────────┤
//!                ▼                        ▼                             ▼
//!          append buffer      append + drain buffer            take LastScanId
//!                                    │                                  │
//!                                    ▼                                  ▼
//!                               ScanBuilder                    PATCH session end
//!                                    │
//!                                    ▼
//!                          DeliveryCoordinator ──► ScanArchive (verbose)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use intentra_core::{Config, HookPipeline};
//!
//! let config = Config::load().unwrap_or_default();
//! let pipeline = HookPipeline::from_config(&config);
//! pipeline.handle("cursor", "stop", r#"{"conversation_id":"c1"}"#)?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::db::ScanArchive;
use crate::delivery::{DeliveryCoordinator, DeliveryOutcome, FileCredentials, SessionEndUpdate};
use crate::device;
use crate::error::Result;
use crate::hooks::{NormalizerRegistry, RawEvent};
use crate::scanner::ScanBuilder;
use crate::session::{policy_for, sweep_stale, BufferedEvent, Disposition, SessionKey, SessionStore};
use crate::types::{Event, Scan, Tool};

/// What a single invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Input line was empty or not a JSON object
    Ignored,
    /// Event appended to its session buffer
    Buffered,
    /// Terminal event with nothing buffered before it
    EmptySession,
    /// Session finalized into a scan
    ScanProduced {
        scan_id: String,
        delivery: DeliveryOutcome,
    },
    /// Session-end data sent for a previously delivered scan
    SessionEndPatched { scan_id: String, accepted: bool },
    /// Session-end event with no delivered scan to attach to
    SessionEndIgnored,
}

pub struct HookPipeline {
    registry: NormalizerRegistry,
    store: SessionStore,
    builder: ScanBuilder,
    delivery: DeliveryCoordinator,
    buffer_ttl: Duration,
    archive_path: Option<PathBuf>,
}

impl HookPipeline {
    pub fn new(store: SessionStore, builder: ScanBuilder, delivery: DeliveryCoordinator) -> Self {
        Self {
            registry: NormalizerRegistry::new(),
            store,
            builder,
            delivery,
            buffer_ttl: crate::session::DEFAULT_BUFFER_TTL,
            archive_path: None,
        }
    }

    /// Pipeline wired to the user's config, credentials and device id.
    pub fn from_config(config: &Config) -> Self {
        let device_id = device::device_id(&Config::data_dir());
        let delivery = DeliveryCoordinator::new(
            config.api.clone(),
            config.server.clone(),
            Box::new(FileCredentials::in_config_dir(&Config::config_dir())),
            device_id.clone(),
        );

        let mut pipeline = Self::new(
            SessionStore::new(config.buffer_dir()),
            ScanBuilder::new(device_id),
            delivery,
        )
        .with_buffer_ttl(Duration::from_secs(config.hooks.buffer_ttl_minutes * 60));

        if config.is_debug() {
            pipeline = pipeline.with_archive(Config::archive_path());
        }
        pipeline
    }

    pub fn with_buffer_ttl(mut self, ttl: Duration) -> Self {
        self.buffer_ttl = ttl;
        self
    }

    /// Keep every built scan in a local archive at `path`.
    pub fn with_archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive_path = Some(path.into());
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Handle one hook invocation.
    ///
    /// Only session store failures are returned; malformed input and delivery
    /// problems are absorbed.
    pub fn handle(&self, tool: &str, native_name: &str, line: &str) -> Result<HookOutcome> {
        let swept = sweep_stale(self.store.dir(), self.buffer_ttl);
        if swept.removed > 0 {
            tracing::debug!(removed = swept.removed, "Removed stale session files");
        }

        let Some(raw) = RawEvent::decode(line) else {
            tracing::debug!(tool, hook = native_name, "Ignoring malformed hook input");
            return Ok(HookOutcome::Ignored);
        };

        let event = self.registry.normalize(tool, native_name, &raw);
        let key = self
            .store
            .resolve_key(SessionKey::for_event(&event, self.builder.device_id()));
        let disposition = policy_for(Tool::parse(key.tool())).classify(event.event_type);

        tracing::debug!(
            session = %key,
            hook = native_name,
            event_type = event.event_type.as_str(),
            ?disposition,
            "Hook event"
        );

        match disposition {
            Disposition::Buffer => {
                self.store.append(&key, &BufferedEvent::new(event, raw))?;
                Ok(HookOutcome::Buffered)
            }
            Disposition::Terminal => {
                self.store.append(&key, &BufferedEvent::new(event, raw))?;
                self.finalize(&key)
            }
            Disposition::SessionEndMetadata => self.record_session_end(&key, &event),
        }
    }

    fn finalize(&self, key: &SessionKey) -> Result<HookOutcome> {
        let entries = self.store.drain(key)?;
        if entries.len() < 2 {
            tracing::debug!(session = %key, "Terminal event without a buffered session");
            return Ok(HookOutcome::EmptySession);
        }

        let events = entries.into_iter().map(|entry| entry.event).collect();
        let Some(scan) = self.builder.build(key.tool(), events) else {
            return Ok(HookOutcome::EmptySession);
        };

        let delivery = self.delivery.deliver(&scan);
        if delivery == DeliveryOutcome::Direct {
            self.store.save_last_scan_id(key, &scan.id)?;
        }
        self.archive(&scan, delivery);

        Ok(HookOutcome::ScanProduced {
            scan_id: scan.id,
            delivery,
        })
    }

    fn record_session_end(&self, key: &SessionKey, event: &Event) -> Result<HookOutcome> {
        let Some(scan_id) = self.store.take_last_scan_id(key)? else {
            return Ok(HookOutcome::SessionEndIgnored);
        };

        let update = SessionEndUpdate {
            session_end_reason: event.session_end_reason.clone(),
            session_duration_ms: event.duration_ms,
        };
        let accepted = if update.is_empty() {
            tracing::debug!(scan_id = %scan_id, "Session end carried no data");
            false
        } else {
            self.delivery.patch_session_end(&scan_id, &update)
        };

        Ok(HookOutcome::SessionEndPatched { scan_id, accepted })
    }

    fn archive(&self, scan: &Scan, delivery: DeliveryOutcome) {
        let Some(path) = &self.archive_path else {
            return;
        };

        let result = ScanArchive::open(path).and_then(|archive| {
            archive.migrate()?;
            archive.save_scan(scan, delivery)
        });
        if let Err(e) = result {
            tracing::warn!(scan_id = %scan.id, error = %e, "Failed to archive scan");
        }
    }
}
