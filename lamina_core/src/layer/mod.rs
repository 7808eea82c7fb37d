// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer tree data model.
//!
//! A *layer* is a node in a compositing tree. Each layer has:
//!
//! - An identity ([`LayerId`]), a generational handle that becomes stale when
//!   the layer is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - **Base properties** set by the caller: [`bounds`](LayerTree::set_bounds),
//!   [`is_drawable`](LayerTree::set_is_drawable), and a pending
//!   [display rect](LayerTree::set_needs_display_rect).
//! - A *kind*. [Texture layers](LayerTree::create_texture_layer) present a
//!   texture produced elsewhere and override the base behavior at three
//!   points: whether they draw, what happens when they leave their host, and
//!   what they push to the compositor.
//!
//! The content side lives in a [`LayerTree`]. At commit time its state is
//! copied into a [`CompositorTree`] of [`LayerImpl`] twins, which the
//! compositor draws from until the next commit.
//!
//! # Dirty tracking
//!
//! Mutations mark the corresponding channel (see [`dirty`](crate::dirty)):
//!
//! - **PROPERTIES**: anything that must be pushed at the next commit.
//! - **DISPLAY**: a pending repaint, consumed by [`LayerTree::update`].
//! - **TOPOLOGY**: structural and host-membership changes.

mod commit;
mod compositor;
mod id;
mod texture;
mod traverse;
mod tree;

pub use commit::{Commit, CommitReport, PushedCommit};
pub use compositor::{CompositorTree, LayerImpl, TextureLayerImpl};
pub use id::{ContextId, INVALID, LayerId, TextureId};
pub use texture::TextureLayerState;
pub use traverse::Children;
pub use tree::LayerTree;
