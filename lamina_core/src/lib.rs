// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture-backed compositor layers and their cross-thread commit protocol.
//!
//! `lamina_core` provides a content-side layer tree whose texture layers
//! present GPU textures produced outside the compositor (a canvas or a
//! video decoder). It is `no_std` compatible (with `alloc`) and stores
//! layers struct-of-arrays with generational index handles.
//!
//! # Architecture
//!
//! The content thread mutates a [`LayerTree`](layer::LayerTree). Once per
//! frame it updates the tree and commits it into a
//! [`CompositorTree`](layer::CompositorTree), which the compositor thread
//! draws from:
//!
//! ```text
//!   TextureLayerClient ──► LayerTree::update() ──► ResourceUpdateQueue
//!                               │
//!                               ▼
//!   LayerTree::begin_commit() ──► push_properties_to() ──► CompositorTree
//!                                                               │
//!                 ┌─────────────────────────────────────────────┘
//!                 ▼
//!   CompositorTree::append_quads() ──► TextureDrawQuad
//! ```
//!
//! Between commits the compositor may still be sampling the last committed
//! texture. Before a texture layer replaces or overwrites it, the layer asks
//! its [`LayerTreeHost`](host::LayerTreeHost) for an acquisition barrier.
//!
//! **[`layer`]**: the content tree, texture layers, the commit, and the
//! compositor twin tree.
//!
//! **[`client`]**: the [`TextureLayerClient`](client::TextureLayerClient)
//! capability that produces textures, and its graphics context.
//!
//! **[`host`]**: the [`LayerTreeHost`](host::LayerTreeHost) capability
//! (acquisition barrier, rate limiters, commit requests).
//!
//! **[`resource`]**: uploads queued by clients during an update.
//!
//! **[`quad`]**: textured draw quads emitted by the compositor tree.
//!
//! **[`dirty`]**: dirty channels via `understory_dirty`.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! protocol instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod client;
pub mod dirty;
pub mod host;
pub mod layer;
pub mod quad;
pub mod resource;
pub mod trace;

#[cfg(test)]
mod testing;
