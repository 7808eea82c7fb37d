// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the texture-layer protocol.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`LayerTree`](crate::layer::LayerTree) calls whenever it crosses a
//! synchronization point: an acquisition barrier, a rate-limiter start or
//! stop, a context-loss transition, a skipped client update, or a commit. All method bodies default
//! to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing and installed sinks are
//! dropped immediately. When **on**, each method performs a single `Option`
//! branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use alloc::boxed::Box;

use crate::client::ResetStatus;
use crate::layer::{ContextId, LayerId, TextureId};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a layer invoked the host's acquisition barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BarrierReason {
    /// A committed texture id is being replaced by a different one.
    Reassign,
    /// The pixels behind the current texture id are about to be overwritten.
    Modify,
    /// The layer is leaving its host.
    Detach,
    /// The layer is being destroyed while attached.
    Destroy,
}

/// Whether a rate limiter was started or stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RateLimiterAction {
    /// `start_rate_limiter` was issued.
    Start,
    /// `stop_rate_limiter` was issued.
    Stop,
}

/// Why a client-driven layer skipped its client during an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The client was dropped before the layer.
    ClientDropped,
    /// The client was already borrowed, e.g. the update was reentered from
    /// inside `prepare_texture`.
    ClientBusy,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted just before a layer calls
/// [`acquire_layer_textures`](crate::host::LayerTreeHost::acquire_layer_textures).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierEvent {
    /// The layer that requested the barrier.
    pub layer: LayerId,
    /// The texture id that was visible to the compositor.
    pub texture: TextureId,
    /// What the layer is about to do with it.
    pub reason: BarrierReason,
}

/// Emitted when a layer starts or stops its client's rate limiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimiterEvent {
    /// The layer issuing the call.
    pub layer: LayerId,
    /// The throttled context.
    pub context: ContextId,
    /// Start or stop.
    pub action: RateLimiterAction,
}

/// Emitted when an update flips a layer's context-lost state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextLossEvent {
    /// The affected layer.
    pub layer: LayerId,
    /// The client's context.
    pub context: ContextId,
    /// The status that caused the transition. `NoError` means recovery.
    pub status: ResetStatus,
}

/// Emitted when an update leaves a client-driven layer's texture and reset
/// status untouched because its client could not be called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateSkippedEvent {
    /// The affected layer.
    pub layer: LayerId,
    /// The client's context.
    pub context: ContextId,
    /// Why the client was not called.
    pub reason: SkipReason,
}

/// Emitted when a commit finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitEvent {
    /// The compositor tree generation produced by the commit.
    pub generation: u64,
    /// Number of layers whose properties were pushed.
    pub pushed: u32,
    /// Number of compositor twins created.
    pub created: u32,
    /// Number of compositor twins destroyed.
    pub destroyed: u32,
    /// Whether any committed layer blocks pending commits.
    pub blocks_pending_commit: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a layer tree.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called before an acquisition barrier.
    fn on_barrier(&mut self, e: &BarrierEvent) {
        _ = e;
    }

    /// Called after a rate limiter is started or stopped.
    fn on_rate_limiter(&mut self, e: &RateLimiterEvent) {
        _ = e;
    }

    /// Called when a layer's context is lost or recovered.
    fn on_context_loss(&mut self, e: &ContextLossEvent) {
        _ = e;
    }

    /// Called when an update could not call a layer's client.
    fn on_update_skipped(&mut self, e: &UpdateSkippedEvent) {
        _ = e;
    }

    /// Called when a commit finishes.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Owning wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns whether events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Removes and returns the installed sink, if any.
    #[inline]
    pub fn take(&mut self) -> Option<Box<dyn TraceSink>> {
        #[cfg(feature = "trace")]
        {
            self.sink.take()
        }
        #[cfg(not(feature = "trace"))]
        {
            None
        }
    }

    /// Emits a [`BarrierEvent`].
    #[inline]
    pub fn barrier(&mut self, e: &BarrierEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_barrier(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RateLimiterEvent`].
    #[inline]
    pub fn rate_limiter(&mut self, e: &RateLimiterEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_rate_limiter(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ContextLossEvent`].
    #[inline]
    pub fn context_loss(&mut self, e: &ContextLossEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_context_loss(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`UpdateSkippedEvent`].
    #[inline]
    pub fn update_skipped(&mut self, e: &UpdateSkippedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_update_skipped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
