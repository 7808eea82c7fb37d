// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Textured draw quads.
//!
//! A [`TextureDrawQuad`] is what the draw stage emits for one committed
//! texture layer. Per-corner data is ordered bottom-left, top-left,
//! top-right, bottom-right, matching
//! [`LayerTree::set_vertex_opacity`](crate::layer::LayerTree::set_vertex_opacity).

use kurbo::{Point, Rect};

use crate::layer::{LayerId, TextureId};

/// Index of the bottom-left corner in per-vertex arrays.
pub const BOTTOM_LEFT: usize = 0;
/// Index of the top-left corner in per-vertex arrays.
pub const TOP_LEFT: usize = 1;
/// Index of the top-right corner in per-vertex arrays.
pub const TOP_RIGHT: usize = 2;
/// Index of the bottom-right corner in per-vertex arrays.
pub const BOTTOM_RIGHT: usize = 3;

/// One textured rectangle ready for drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureDrawQuad {
    /// The layer that produced the quad.
    pub layer: LayerId,
    /// Destination rectangle in layer space (y grows downward).
    pub rect: Rect,
    /// The sampled texture.
    pub texture: TextureId,
    /// Sampled region in normalized texture coordinates.
    pub uv_rect: Rect,
    /// Per-corner opacity.
    pub vertex_opacity: [f32; 4],
    /// Whether the texture's rows are stored bottom-up.
    pub flipped: bool,
    /// Whether color channels are premultiplied by alpha.
    pub premultiplied_alpha: bool,
}

impl TextureDrawQuad {
    /// Returns the destination corners in per-vertex order.
    #[must_use]
    pub fn vertices(&self) -> [Point; 4] {
        let r = self.rect;
        [
            Point::new(r.x0, r.y1),
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
        ]
    }

    /// Returns the texture coordinate sampled at each vertex.
    ///
    /// When `flipped` is set the v axis is mirrored, so the bottom edge of
    /// the quad samples `uv_rect.y0`.
    #[must_use]
    pub fn tex_coords(&self) -> [Point; 4] {
        let uv = self.uv_rect;
        let (top, bottom) = if self.flipped {
            (uv.y1, uv.y0)
        } else {
            (uv.y0, uv.y1)
        };
        [
            Point::new(uv.x0, bottom),
            Point::new(uv.x0, top),
            Point::new(uv.x1, top),
            Point::new(uv.x1, bottom),
        ]
    }

    /// Returns the opacity at `corner` (one of the index constants).
    #[must_use]
    pub fn opacity_at(&self, corner: usize) -> f32 {
        self.vertex_opacity[corner]
    }

    /// Returns `true` if every corner is fully transparent.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.vertex_opacity.iter().all(|o| *o <= 0.0)
    }
}
