// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending texture uploads and copies.
//!
//! Clients fill a [`ResourceUpdateQueue`] while preparing textures; the host
//! executes it before the next draw. Core never executes the queue itself.

use alloc::vec::Vec;

use kurbo::{Rect, Size};

use crate::layer::TextureId;

/// A single pending GPU resource operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResourceUpdate {
    /// Replace the full contents of `texture`.
    FullUpload {
        /// Destination texture.
        texture: TextureId,
        /// Size of the uploaded image in texels.
        size: Size,
    },
    /// Replace the contents of `rect` within `texture`.
    PartialUpload {
        /// Destination texture.
        texture: TextureId,
        /// Destination region in texels.
        rect: Rect,
    },
    /// Copy the contents of `source` into `dest`.
    Copy {
        /// Texture to read from.
        source: TextureId,
        /// Texture to write to.
        dest: TextureId,
    },
}

impl ResourceUpdate {
    /// Returns the texture this operation writes to.
    #[must_use]
    pub const fn target(&self) -> TextureId {
        match *self {
            Self::FullUpload { texture, .. } | Self::PartialUpload { texture, .. } => texture,
            Self::Copy { dest, .. } => dest,
        }
    }
}

/// An ordered queue of [`ResourceUpdate`]s for one update cycle.
#[derive(Clone, Debug, Default)]
pub struct ResourceUpdateQueue {
    updates: Vec<ResourceUpdate>,
}

impl ResourceUpdateQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a full-texture upload.
    pub fn append_full_upload(&mut self, texture: TextureId, size: Size) {
        self.updates.push(ResourceUpdate::FullUpload { texture, size });
    }

    /// Appends an upload of a sub-rectangle.
    pub fn append_partial_upload(&mut self, texture: TextureId, rect: Rect) {
        self.updates.push(ResourceUpdate::PartialUpload { texture, rect });
    }

    /// Appends a texture-to-texture copy.
    pub fn append_copy(&mut self, source: TextureId, dest: TextureId) {
        self.updates.push(ResourceUpdate::Copy { source, dest });
    }

    /// Returns the number of queued operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Iterates over queued operations in submission order.
    pub fn iter(&self) -> core::slice::Iter<'_, ResourceUpdate> {
        self.updates.iter()
    }

    /// Removes and yields every queued operation in submission order.
    pub fn drain(&mut self) -> alloc::vec::Drain<'_, ResourceUpdate> {
        self.updates.drain(..)
    }

    /// Discards every queued operation.
    pub fn clear(&mut self) {
        self.updates.clear();
    }
}
