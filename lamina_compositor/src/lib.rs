// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A threaded [`LayerTreeHost`](lamina_core::host::LayerTreeHost) for
//! `lamina_core` layer trees.
//!
//! [`ThreadedHost`] runs a compositor on a dedicated thread. The content
//! thread keeps the [`LayerTree`](lamina_core::layer::LayerTree); each
//! [`commit`] hands a snapshot of the committed
//! [`CompositorTree`](lamina_core::layer::CompositorTree) to the compositor
//! thread, which draws it every time [`ThreadedHost::draw_frame`] is called.
//! Drawn frames are delivered on a channel as [`DrawnFrame`]s.
//!
//! ```text
//!   content thread                         compositor thread
//!   ──────────────                         ─────────────────
//!   commit() ───── Commit(snapshot) ─────► active tree
//!   draw_frame() ─ Draw ─────────────────► append_quads() ──► DrawnFrame
//!   set_texture_id() ─ AcquireTextures ──► stop sampling, ack
//!        (blocks until acked) ◄──────────────────┘
//! ```
//!
//! # Acquisition barrier
//!
//! [`acquire_layer_textures`](lamina_core::host::LayerTreeHost::acquire_layer_textures)
//! is a round trip: the request is queued behind any pending draws, and the
//! compositor thread acknowledges it only after it has stopped sampling
//! committed textures. Until the next commit, frames are drawn without
//! texture quads. Subsequent barriers before that commit return immediately.
//!
//! If the compositor thread has exited, the barrier returns immediately:
//! nothing can sample the textures any more.

mod config;
mod error;
mod host;
mod thread;

pub use config::CompositorConfig;
pub use error::HostError;
pub use host::{ThreadedHost, commit};
pub use thread::DrawnFrame;
