// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON Lines trace output.
//!
//! [`JsonLinesSink`] writes each event as a single-line JSON object with a
//! `"event"` discriminator, so a trace can be filtered with `jq` or loaded
//! line by line.

use std::io::Write;

use serde_json::{Value, json};

use lamina_core::trace::{
    BarrierEvent, CommitEvent, ContextLossEvent, RateLimiterEvent, TraceSink, UpdateSkippedEvent,
};

use crate::pretty::{action_name, reason_name, skip_name};

/// Writes one JSON object per event to a [`Write`](std::io::Write)
/// destination.
pub struct JsonLinesSink<W: Write = Box<dyn Write>> {
    writer: W,
    /// Sequence number of the next event.
    seq: u64,
}

impl<W: Write> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

impl JsonLinesSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer, seq: 0 }
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer, seq: 0 }
    }

    /// Consumes the sink, returning the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, name: &str, args: Value) {
        let line = json!({
            "seq": self.seq,
            "event": name,
            "args": args,
        });
        self.seq += 1;
        if serde_json::to_writer(&mut self.writer, &line).is_ok() {
            let _ = self.writer.write_all(b"\n");
        }
    }
}

impl<W: Write> TraceSink for JsonLinesSink<W> {
    fn on_barrier(&mut self, e: &BarrierEvent) {
        self.emit(
            "barrier",
            json!({
                "layer": e.layer.index(),
                "generation": e.layer.generation(),
                "texture": e.texture.0,
                "reason": reason_name(e.reason),
            }),
        );
    }

    fn on_rate_limiter(&mut self, e: &RateLimiterEvent) {
        self.emit(
            "rate_limiter",
            json!({
                "layer": e.layer.index(),
                "context": e.context.0,
                "action": action_name(e.action),
            }),
        );
    }

    fn on_context_loss(&mut self, e: &ContextLossEvent) {
        self.emit(
            "context_loss",
            json!({
                "layer": e.layer.index(),
                "context": e.context.0,
                "lost": e.status.is_lost(),
                "status": format!("{:?}", e.status),
            }),
        );
    }

    fn on_update_skipped(&mut self, e: &UpdateSkippedEvent) {
        self.emit(
            "update_skipped",
            json!({
                "layer": e.layer.index(),
                "context": e.context.0,
                "reason": skip_name(e.reason),
            }),
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.emit(
            "commit",
            json!({
                "generation": e.generation,
                "pushed": e.pushed,
                "created": e.created,
                "destroyed": e.destroyed,
                "blocks_pending_commit": e.blocks_pending_commit,
            }),
        );
    }
}
