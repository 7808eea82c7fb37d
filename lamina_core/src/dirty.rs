// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The content-side [`LayerTree`](crate::layer::LayerTree) uses multi-channel
//! dirty tracking (via [`understory_dirty`]) to remember which layers changed
//! between commits. All channels are local-only: nothing a texture layer
//! pushes is inherited, so no dependency edges are registered.
//!
//! - [`PROPERTIES`]: a pushed property changed. Drained by
//!   [`Commit::push_properties_to`](crate::layer::Commit::push_properties_to),
//!   which pushes exactly the drained layers (plus any layer whose
//!   compositor twin had to be created).
//! - [`DISPLAY`]: the layer was invalidated with
//!   [`set_needs_display_rect`](crate::layer::LayerTree::set_needs_display_rect).
//!   Drained by [`update`](crate::layer::LayerTree::update), which clears the
//!   pending-display state.
//! - [`TOPOLOGY`]: parent/child links or host attachment changed. Drained at
//!   commit to decide whether the compositor's draw order must be rebuilt.

use understory_dirty::Channel;

/// Draw-affecting properties changed and must be pushed at the next commit.
pub const PROPERTIES: Channel = Channel::new(0);

/// The layer has a pending invalidation.
pub const DISPLAY: Channel = Channel::new(1);

/// Tree topology or host attachment changed.
pub const TOPOLOGY: Channel = Channel::new(2);
