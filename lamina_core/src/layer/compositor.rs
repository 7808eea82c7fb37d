// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor-side twins of committed layers.
//!
//! A [`CompositorTree`] is the read-only snapshot the compositor thread draws
//! from. It is only written by
//! [`Commit::push_properties_to`](super::Commit::push_properties_to) while
//! the content side is borrowed, so the compositor never observes a torn
//! snapshot. The tree is `Clone + Send` so a host can hand a copy to another
//! thread once the commit finishes.
//!
//! Twins are created when a layer first appears in a commit and destroyed in
//! the first commit after the layer is destroyed or loses its host.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};

use super::id::{LayerId, TextureId};
use crate::quad::TextureDrawQuad;

/// Committed texture-layer state, as consumed by the draw stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureLayerImpl {
    pub(crate) flipped: bool,
    pub(crate) uv_rect: Rect,
    pub(crate) vertex_opacity: [f32; 4],
    pub(crate) premultiplied_alpha: bool,
    pub(crate) texture_id: TextureId,
}

impl Default for TextureLayerImpl {
    fn default() -> Self {
        Self {
            flipped: true,
            uv_rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            vertex_opacity: [1.0; 4],
            premultiplied_alpha: true,
            texture_id: TextureId::NONE,
        }
    }
}

impl TextureLayerImpl {
    /// Whether the texture is sampled upside down.
    #[must_use]
    pub fn flipped(&self) -> bool {
        self.flipped
    }

    /// The sampled region in normalized texture coordinates.
    #[must_use]
    pub fn uv_rect(&self) -> Rect {
        self.uv_rect
    }

    /// Per-corner opacity as `[bottom_left, top_left, top_right, bottom_right]`.
    #[must_use]
    pub fn vertex_opacity(&self) -> [f32; 4] {
        self.vertex_opacity
    }

    /// Whether color channels are premultiplied by alpha.
    #[must_use]
    pub fn premultiplied_alpha(&self) -> bool {
        self.premultiplied_alpha
    }

    /// The committed texture.
    #[must_use]
    pub fn texture_id(&self) -> TextureId {
        self.texture_id
    }
}

/// The committed state of one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerImpl {
    pub(crate) id: LayerId,
    pub(crate) bounds: Size,
    pub(crate) draws_content: bool,
    pub(crate) update_rect: Option<Rect>,
    pub(crate) texture: Option<TextureLayerImpl>,
}

impl LayerImpl {
    fn new(id: LayerId, is_texture: bool) -> Self {
        Self {
            id,
            bounds: Size::ZERO,
            draws_content: false,
            update_rect: None,
            texture: is_texture.then(TextureLayerImpl::default),
        }
    }

    /// The content-side layer this twin belongs to.
    #[must_use]
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Bounds in layer space.
    #[must_use]
    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Whether the layer was drawable when committed.
    #[must_use]
    pub fn draws_content(&self) -> bool {
        self.draws_content
    }

    /// The region invalidated since the previous commit of this layer.
    #[must_use]
    pub fn update_rect(&self) -> Option<Rect> {
        self.update_rect
    }

    /// Texture state, for texture layers.
    #[must_use]
    pub fn texture(&self) -> Option<&TextureLayerImpl> {
        self.texture.as_ref()
    }

    /// Builds the textured quad for this layer, if it has anything to draw.
    #[must_use]
    pub fn texture_quad(&self) -> Option<TextureDrawQuad> {
        let t = self.texture.as_ref()?;
        if !self.draws_content || t.texture_id.is_none() {
            return None;
        }
        Some(TextureDrawQuad {
            layer: self.id,
            rect: Rect::from_origin_size(Point::ZERO, self.bounds),
            texture: t.texture_id,
            uv_rect: t.uv_rect,
            vertex_opacity: t.vertex_opacity,
            flipped: t.flipped,
            premultiplied_alpha: t.premultiplied_alpha,
        })
    }
}

/// Compositor-side snapshot of the committed layer tree.
#[derive(Clone, Debug, Default)]
pub struct CompositorTree {
    /// Twins indexed by content-side slot.
    pub(crate) slots: Vec<Option<LayerImpl>>,
    /// Committed layers in draw (depth-first pre-order) order.
    pub(crate) draw_order: Vec<LayerId>,
    pub(crate) generation: u64,
}

impl CompositorTree {
    /// Creates an empty tree at generation 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of commits pushed into this tree.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the number of committed layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.draw_order.len()
    }

    /// Returns `true` if no layer is committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draw_order.is_empty()
    }

    /// Returns the twin of `id`, if `id` was committed.
    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<&LayerImpl> {
        self.slots
            .get(id.idx as usize)?
            .as_ref()
            .filter(|twin| twin.id == id)
    }

    /// Returns the texture twin of `id`, if `id` was committed as a texture
    /// layer.
    #[must_use]
    pub fn texture_layer(&self, id: LayerId) -> Option<&TextureLayerImpl> {
        self.get(id)?.texture()
    }

    /// Iterates over committed layers in draw order.
    pub fn iter(&self) -> impl Iterator<Item = &LayerImpl> + '_ {
        self.draw_order.iter().filter_map(|id| self.get(*id))
    }

    /// Appends a quad for every drawable texture layer, in draw order.
    pub fn append_quads(&self, out: &mut Vec<TextureDrawQuad>) {
        out.extend(self.iter().filter_map(LayerImpl::texture_quad));
    }

    // -- Commit support --

    /// Returns whether `id` currently has a twin.
    pub(crate) fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    /// Creates (or replaces) the twin for `id`.
    pub(crate) fn create(&mut self, id: LayerId, is_texture: bool) -> &mut LayerImpl {
        let idx = id.idx as usize;
        if self.slots.len() <= idx {
            self.slots.resize(idx + 1, None);
        }
        self.slots[idx].insert(LayerImpl::new(id, is_texture))
    }

    pub(crate) fn twin_mut(&mut self, id: LayerId) -> Option<&mut LayerImpl> {
        self.slots
            .get_mut(id.idx as usize)?
            .as_mut()
            .filter(|twin| twin.id == id)
    }

    /// Destroys every twin for which `keep` returns `false`. Returns how many
    /// were destroyed.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(LayerId) -> bool) -> u32 {
        let mut destroyed = 0;
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|twin| !keep(twin.id)) {
                *slot = None;
                destroyed += 1;
            }
        }
        destroyed
    }
}
