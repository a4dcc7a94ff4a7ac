use super::{PendingEscalation, PreviewController, PreviewMode};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Signals reported by the presentation layer, the user, or a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewEvent {
    PrimaryLoaded { page_count: usize },
    PrimaryFailed { reason: String },
    /// Re-check the escalation deadline against the clock.
    Tick,
    /// A scheduled wake for the given escalation ticket went off.
    WakeFired { ticket: u64 },
    /// The mounted fallback did not display the document.
    StrategyFailed,
    BroaderCompatibilityRequested,
    NativeFrameRequested,
    ResetRequested,
}

/// Work the host must perform outside the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewEffect {
    /// Deliver `WakeFired { ticket }` (or a `Tick`) once `after` has elapsed.
    ScheduleWake { ticket: u64, after: Duration },
    /// Dismount the current strategy and mount this one.
    Mount(PreviewMode),
}

impl PreviewController {
    pub(super) fn transition(&mut self, event: PreviewEvent) -> Vec<PreviewEffect> {
        match event {
            PreviewEvent::PrimaryLoaded { page_count } => self.on_primary_loaded(page_count),
            PreviewEvent::PrimaryFailed { reason } => self.on_primary_failed(&reason),
            PreviewEvent::Tick => self.on_tick(),
            PreviewEvent::WakeFired { ticket } => self.on_wake(ticket),
            PreviewEvent::StrategyFailed => self.on_strategy_failed(),
            PreviewEvent::BroaderCompatibilityRequested => {
                self.manual_step(PreviewMode::NativeFrame, PreviewMode::ExternalViewer)
            }
            PreviewEvent::NativeFrameRequested => {
                self.manual_step(PreviewMode::ExternalViewer, PreviewMode::NativeFrame)
            }
            PreviewEvent::ResetRequested => {
                self.manual_step(PreviewMode::ExternalViewer, PreviewMode::Primary)
            }
        }
    }

    fn on_primary_loaded(&mut self, page_count: usize) -> Vec<PreviewEffect> {
        if self.mode != PreviewMode::Primary {
            debug!(
                mode = %self.mode,
                "Ignoring late primary load after escalation"
            );
            return Vec::new();
        }
        if page_count == 0 {
            warn!(
                url = %self.source_url,
                kept = self.resolved_page_count,
                "Primary renderer reported zero pages; keeping previous count"
            );
            return Vec::new();
        }
        if page_count != self.resolved_page_count {
            info!(
                url = %self.source_url,
                from = self.resolved_page_count,
                to = page_count,
                "Primary renderer resolved page count"
            );
            self.resolved_page_count = page_count;
        }
        Vec::new()
    }

    fn on_primary_failed(&mut self, reason: &str) -> Vec<PreviewEffect> {
        if self.mode != PreviewMode::Primary {
            debug!(
                mode = %self.mode,
                reason,
                "Ignoring primary failure outside primary mode"
            );
            return Vec::new();
        }
        self.next_ticket = self.next_ticket.wrapping_add(1);
        let ticket = self.next_ticket;
        let after = self.delay;
        self.pending = Some(PendingEscalation {
            ticket,
            deadline: self.clock.now() + after,
        });
        self.mode = PreviewMode::Escalating;
        warn!(
            url = %self.source_url,
            reason,
            ticket,
            delay_ms = after.as_millis() as u64,
            "Primary renderer failed; escalating"
        );
        vec![
            PreviewEffect::Mount(PreviewMode::Escalating),
            PreviewEffect::ScheduleWake { ticket, after },
        ]
    }

    fn on_tick(&mut self) -> Vec<PreviewEffect> {
        let Some(pending) = self.pending else {
            return Vec::new();
        };
        if self.clock.now() < pending.deadline {
            return Vec::new();
        }
        self.commit_fallback(pending.ticket)
    }

    fn on_wake(&mut self, ticket: u64) -> Vec<PreviewEffect> {
        match self.pending {
            Some(pending) if pending.ticket == ticket => self.commit_fallback(ticket),
            _ => {
                debug!(
                    ticket,
                    current = self.next_ticket,
                    "Ignoring stale escalation wake"
                );
                Vec::new()
            }
        }
    }

    fn commit_fallback(&mut self, ticket: u64) -> Vec<PreviewEffect> {
        self.pending = None;
        let next = if self.is_cdn_asset {
            PreviewMode::ImageStream
        } else {
            PreviewMode::NativeFrame
        };
        info!(
            url = %self.source_url,
            ticket,
            cdn = self.is_cdn_asset,
            to = %next,
            "Escalation delay elapsed; mounting fallback"
        );
        self.mode = next;
        vec![PreviewEffect::Mount(next)]
    }

    fn on_strategy_failed(&mut self) -> Vec<PreviewEffect> {
        match self.mode {
            PreviewMode::Primary => self.on_primary_failed("strategy failure signal"),
            PreviewMode::ImageStream => self.enter(PreviewMode::NativeFrame, "image stream failed"),
            PreviewMode::NativeFrame => {
                self.enter(PreviewMode::ExternalViewer, "native frame failed")
            }
            PreviewMode::Escalating | PreviewMode::ExternalViewer => {
                debug!(mode = %self.mode, "Ignoring failure signal; nothing further to escalate to");
                Vec::new()
            }
        }
    }

    fn manual_step(&mut self, from: PreviewMode, to: PreviewMode) -> Vec<PreviewEffect> {
        if self.mode != from {
            debug!(
                mode = %self.mode,
                requested = %to,
                "Ignoring manual transition not available from current mode"
            );
            return Vec::new();
        }
        self.enter(to, "manual request")
    }

    fn enter(&mut self, to: PreviewMode, cause: &str) -> Vec<PreviewEffect> {
        info!(
            url = %self.source_url,
            from = %self.mode,
            to = %to,
            cause,
            "Preview strategy changed"
        );
        self.mode = to;
        vec![PreviewEffect::Mount(to)]
    }
}
