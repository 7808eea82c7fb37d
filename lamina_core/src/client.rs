// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content-producer contract for texture layers.
//!
//! A [`TextureLayerClient`] is whatever renders into a GPU texture on behalf
//! of a texture layer: a canvas or a video decoder. Once per update
//! cycle the layer asks the client to [prepare](TextureLayerClient::prepare_texture)
//! a texture and then polls the client's [`GraphicsContext`] for a reset.
//!
//! # Ownership
//!
//! Layers never own their client. A client-driven layer is created from a
//! [`SharedClient`] and keeps only a [`Weak`](alloc::rc::Weak) reference to
//! it. Keeping the client alive for as long as the layer exists is the
//! content producer's responsibility; if the client is dropped early, the
//! layer's updates silently become no-ops.

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::layer::{ContextId, TextureId};
use crate::resource::ResourceUpdateQueue;

/// Graphics reset status reported by a GPU context.
///
/// Any status other than [`NoError`](Self::NoError) means the context (and
/// every texture it produced) has been lost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResetStatus {
    /// The context is healthy.
    #[default]
    NoError,
    /// The context was reset because of something it did.
    GuiltyContextReset,
    /// The context was reset because of another context.
    InnocentContextReset,
    /// The context was reset for an unknown reason.
    UnknownContextReset,
}

impl ResetStatus {
    /// Returns `true` for any status other than [`NoError`](Self::NoError).
    #[inline]
    #[must_use]
    pub const fn is_lost(self) -> bool {
        !matches!(self, Self::NoError)
    }
}

/// A GPU context as seen by a texture layer.
pub trait GraphicsContext {
    /// The handle hosts use to key rate limiters for this context.
    ///
    /// Must be stable for the lifetime of the context.
    fn id(&self) -> ContextId;

    /// Polls the context's reset status.
    fn reset_status(&self) -> ResetStatus;
}

/// Produces textures for a client-driven texture layer.
pub trait TextureLayerClient {
    /// Prepares this cycle's texture and returns its handle.
    ///
    /// Called at most once per update cycle. The client may enqueue
    /// asynchronous upload or copy work into `queue`, but the returned id
    /// must be valid by the time this returns.
    ///
    /// The client must not be borrowed while its layer is updated. If it is
    /// (for instance because the update was started from inside this method),
    /// the layer keeps its previous texture and reset status for that cycle
    /// and reports an [`UpdateSkippedEvent`](crate::trace::UpdateSkippedEvent).
    fn prepare_texture(&mut self, queue: &mut ResourceUpdateQueue) -> TextureId;

    /// Returns the client's GPU context.
    ///
    /// The context must be the same object for the lifetime of the client.
    fn context(&self) -> &dyn GraphicsContext;
}

/// A client handle as passed to
/// [`LayerTree::create_texture_layer`](crate::layer::LayerTree::create_texture_layer).
pub type SharedClient = Rc<RefCell<dyn TextureLayerClient>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_error_is_healthy() {
        assert!(!ResetStatus::NoError.is_lost());
        assert!(ResetStatus::GuiltyContextReset.is_lost());
        assert!(ResetStatus::InnocentContextReset.is_lost());
        assert!(ResetStatus::UnknownContextReset.is_lost());
    }
}
