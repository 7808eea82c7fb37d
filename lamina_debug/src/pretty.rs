// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use lamina_core::trace::{
    BarrierEvent, BarrierReason, CommitEvent, ContextLossEvent, RateLimiterAction,
    RateLimiterEvent, SkipReason, TraceSink, UpdateSkippedEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, returning the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub(crate) fn reason_name(reason: BarrierReason) -> &'static str {
    match reason {
        BarrierReason::Reassign => "reassign",
        BarrierReason::Modify => "modify",
        BarrierReason::Detach => "detach",
        BarrierReason::Destroy => "destroy",
    }
}

pub(crate) fn action_name(action: RateLimiterAction) -> &'static str {
    match action {
        RateLimiterAction::Start => "start",
        RateLimiterAction::Stop => "stop",
    }
}

pub(crate) fn skip_name(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::ClientDropped => "client-dropped",
        SkipReason::ClientBusy => "client-busy",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_barrier(&mut self, e: &BarrierEvent) {
        let _ = writeln!(
            self.writer,
            "[barrier] layer={} texture={} reason={}",
            e.layer.index(),
            e.texture.0,
            reason_name(e.reason),
        );
    }

    fn on_rate_limiter(&mut self, e: &RateLimiterEvent) {
        let _ = writeln!(
            self.writer,
            "[limiter:{}] layer={} context={}",
            action_name(e.action),
            e.layer.index(),
            e.context.0,
        );
    }

    fn on_context_loss(&mut self, e: &ContextLossEvent) {
        let what = if e.status.is_lost() { "LOST" } else { "recovered" };
        let _ = writeln!(
            self.writer,
            "[context] layer={} context={} {what} ({:?})",
            e.layer.index(),
            e.context.0,
            e.status,
        );
    }

    fn on_update_skipped(&mut self, e: &UpdateSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[update:skipped] layer={} context={} reason={}",
            e.layer.index(),
            e.context.0,
            skip_name(e.reason),
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let _ = writeln!(
            self.writer,
            "[commit] gen={} pushed={} created={} destroyed={} blocking={}",
            e.generation, e.pushed, e.created, e.destroyed, e.blocks_pending_commit,
        );
    }
}
