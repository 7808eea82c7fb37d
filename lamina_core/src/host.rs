// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for layer trees.
//!
//! A *host* orchestrates the commit pipeline between the content thread,
//! which owns the [`LayerTree`](crate::layer::LayerTree), and the compositor
//! thread, which owns the committed [`CompositorTree`](crate::layer::CompositorTree).
//! Texture layers depend on two host services:
//!
//! - **Acquisition barrier**: [`acquire_layer_textures`](LayerTreeHost::acquire_layer_textures)
//!   blocks until no pending compositor draw can reference a texture that
//!   was committed before the call. Layers call it before reassigning,
//!   overwriting in place, or releasing a committed texture.
//!
//! - **Rate limiting**: [`start_rate_limiter`](LayerTreeHost::start_rate_limiter)
//!   and [`stop_rate_limiter`](LayerTreeHost::stop_rate_limiter) register a
//!   periodic throttle, tied to the host's frame cadence, on a client's GPU
//!   context. Hosts can use [`RateLimiterSet`] to keep these calls
//!   idempotent.
//!
//! # Commit loop pseudocode
//!
//! ```rust,ignore
//! fn on_frame(tree: &mut LayerTree<MyHost>, staging: &mut CompositorTree) -> Result<(), MyError> {
//!     // Update: client-driven layers prepare this frame's textures.
//!     let mut queue = ResourceUpdateQueue::new();
//!     tree.update(&mut queue);
//!
//!     // Commit: the content side is borrowed for the whole commit.
//!     let _report = tree.begin_commit().push_properties_to(staging).finish();
//!
//!     // Hand the snapshot to the compositor thread.
//!     tree.host_mut().ok_or(MyError::Detached)?.submit(staging, queue)?;
//!     Ok(())
//! }
//! ```

use alloc::collections::BTreeSet;

use crate::layer::ContextId;

/// Services a host provides to the layers attached to it.
pub trait LayerTreeHost {
    /// Blocks until it is safe to repurpose or free any texture that was
    /// visible to the compositor before this call.
    ///
    /// This is the only blocking point in the layer contract. It has no
    /// failure path: callers wait.
    fn acquire_layer_textures(&mut self);

    /// Starts (or re-arms) the frame-cadence throttle for `context`.
    ///
    /// Must tolerate being called for a context that is already limited.
    fn start_rate_limiter(&mut self, context: ContextId);

    /// Stops the throttle for `context`.
    ///
    /// Must tolerate being called for a context that is not limited.
    fn stop_rate_limiter(&mut self, context: ContextId);

    /// Requests that a commit be scheduled.
    fn set_needs_commit(&mut self) {}
}

/// Idempotent bookkeeping of which contexts currently have a rate limiter.
#[derive(Clone, Debug, Default)]
pub struct RateLimiterSet {
    active: BTreeSet<ContextId>,
}

impl RateLimiterSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `context` as limited. Returns `true` if it was not already.
    pub fn start(&mut self, context: ContextId) -> bool {
        self.active.insert(context)
    }

    /// Marks `context` as no longer limited. Returns `true` if it was.
    pub fn stop(&mut self, context: ContextId) -> bool {
        self.active.remove(&context)
    }

    /// Returns whether `context` is currently limited.
    #[must_use]
    pub fn is_active(&self, context: ContextId) -> bool {
        self.active.contains(&context)
    }

    /// Returns the number of limited contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns `true` if no context is limited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Iterates over limited contexts in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.active.iter().copied()
    }
}
