//! Escalation controller for a single document preview.
//!
//! Every open starts in `Primary`. A primary failure holds `Escalating` for a
//! fixed delay, then commits to the raster stream (CDN assets) or the native
//! frame. Later steps only move toward broader compatibility; the sole way
//! back to `Primary` is an explicit reset from the external viewer.

mod clock;
mod mode;
mod timer;
mod transitions;

pub use clock::{Clock, ManualClock, SystemClock};
pub use mode::{ImagePage, PreviewMode, StrategyView};
pub use timer::{SharedController, spawn_wake};
pub use transitions::{PreviewEffect, PreviewEvent};

use crate::cancellation::CancellationToken;
use crate::cdn::CdnTransformer;
use crate::config::PreviewConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// `(url, page_count)` handed over by the library when a document is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSeed {
    pub url: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingEscalation {
    pub(crate) ticket: u64,
    pub(crate) deadline: Instant,
}

pub struct PreviewController {
    source_url: String,
    is_cdn_asset: bool,
    resolved_page_count: usize,
    mode: PreviewMode,
    pending: Option<PendingEscalation>,
    next_ticket: u64,
    delay: Duration,
    cdn: CdnTransformer,
    clock: Arc<dyn Clock>,
    token: CancellationToken,
}

impl PreviewController {
    pub fn new(
        seed: PreviewSeed,
        cdn: CdnTransformer,
        delay: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let is_cdn_asset = cdn.is_cdn_hosted(&seed.url);
        info!(
            url = %seed.url,
            pages = seed.page_count,
            cdn = is_cdn_asset,
            "Opening preview"
        );
        Self {
            source_url: seed.url,
            is_cdn_asset,
            resolved_page_count: seed.page_count.max(1),
            mode: PreviewMode::Primary,
            pending: None,
            next_ticket: 0,
            delay,
            cdn,
            clock,
            token: CancellationToken::new(),
        }
    }

    pub fn from_config(seed: PreviewSeed, config: &PreviewConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            seed,
            CdnTransformer::new(config),
            config.escalation_delay(),
            clock,
        )
    }

    /// Continue ticket numbering after `last_issued`, so wakes scheduled by
    /// an earlier preview never match a ticket issued by this one.
    pub fn resume_tickets_after(mut self, last_issued: u64) -> Self {
        self.next_ticket = self.next_ticket.max(last_issued);
        self
    }

    /// Highest escalation ticket this controller has handed out.
    pub fn last_ticket(&self) -> u64 {
        self.next_ticket
    }

    /// Feed one signal through the state machine.
    ///
    /// Events reaching a disposed controller are dropped.
    pub fn apply(&mut self, event: PreviewEvent) -> Vec<PreviewEffect> {
        if self.token.is_cancelled() {
            debug!(url = %self.source_url, ?event, "Ignoring event for disposed preview");
            return Vec::new();
        }
        self.transition(event)
    }

    /// Close the preview. Pending wakes become no-ops.
    pub fn dispose(&mut self) {
        if !self.token.cancel() {
            return;
        }
        self.pending = None;
        debug!(url = %self.source_url, mode = %self.mode, "Preview disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn mode(&self) -> PreviewMode {
        self.mode
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn is_cdn_asset(&self) -> bool {
        self.is_cdn_asset
    }

    pub fn resolved_page_count(&self) -> usize {
        self.resolved_page_count
    }

    /// Ticket and remaining time of the in-flight escalation, if any.
    pub fn pending_wake(&self) -> Option<(u64, Duration)> {
        self.pending.map(|pending| {
            (
                pending.ticket,
                pending.deadline.saturating_duration_since(self.clock.now()),
            )
        })
    }

    /// The single strategy the presentation layer should have mounted.
    pub fn view(&self) -> StrategyView {
        match self.mode {
            PreviewMode::Primary => StrategyView::Embedded {
                url: self.source_url.clone(),
                page_count: self.resolved_page_count,
            },
            PreviewMode::Escalating => StrategyView::Optimizing,
            PreviewMode::ImageStream => StrategyView::ImageStream {
                pages: (0..self.resolved_page_count)
                    .map(|idx| ImagePage {
                        number: idx + 1,
                        url: self
                            .cdn
                            .page_raster_url(&self.source_url, idx)
                            .unwrap_or_else(|| self.source_url.clone()),
                    })
                    .collect(),
            },
            PreviewMode::NativeFrame => StrategyView::NativeFrame {
                url: self.cdn.native_frame_url(&self.source_url),
            },
            PreviewMode::ExternalViewer => StrategyView::ExternalViewer {
                url: self.cdn.external_viewer_url(&self.source_url),
            },
        }
    }
}
