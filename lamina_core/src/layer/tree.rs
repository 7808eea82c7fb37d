// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays content-side layer storage with allocation, topology,
//! host attachment, and base-layer properties.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker};

use super::id::{INVALID, LayerId};
use super::texture::TextureLayer;
use super::traverse::Children;
use crate::client::SharedClient;
use crate::dirty;
use crate::host::LayerTreeHost;
use crate::resource::ResourceUpdateQueue;
use crate::trace::{BarrierReason, TraceSink, Tracer};

/// What a layer draws, and which overrides of the base behavior apply.
#[derive(Debug)]
pub(crate) enum LayerKind {
    /// A base layer with no content of its own.
    Plain,
    /// A layer that presents an externally produced texture.
    Texture(TextureLayer),
}

/// Struct-of-arrays storage for the content side of a layer tree.
///
/// Layers are addressed by [`LayerId`] handles. Internally, each layer
/// occupies a slot in parallel arrays. Destroyed layers are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// The tree owns its host. A layer *has a host* when a host is attached and
/// the layer is in the subtree of the [root](Self::set_root); every change to
/// that relation runs the layer's host-change hook, which is where texture
/// layers guard their committed textures.
///
/// All methods must be called from the content thread. Panics on stale
/// handles.
#[derive(Debug)]
pub struct LayerTree<H: LayerTreeHost> {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Base properties --
    pub(crate) kind: Vec<LayerKind>,
    pub(crate) bounds: Vec<Size>,
    pub(crate) is_drawable: Vec<bool>,
    pub(crate) needs_display: Vec<bool>,
    pub(crate) update_rect: Vec<Option<Rect>>,
    pub(crate) attached: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Host --
    pub(crate) root: u32,
    pub(crate) host: Option<H>,
    pub(crate) commit_requested: bool,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Diagnostics --
    pub(crate) tracer: Tracer,
}

impl<H: LayerTreeHost> Default for LayerTree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: LayerTreeHost> LayerTree<H> {
    /// Creates an empty tree with no root and no host.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            bounds: Vec::new(),
            is_drawable: Vec::new(),
            needs_display: Vec::new(),
            update_rect: Vec::new(),
            attached: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
            host: None,
            commit_requested: false,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            tracer: Tracer::none(),
        }
    }

    // -- Allocation API --

    /// Creates a new plain layer and returns its handle.
    ///
    /// The layer starts with zero bounds, drawable, with no parent.
    pub fn create_layer(&mut self) -> LayerId {
        self.allocate(LayerKind::Plain)
    }

    /// Creates a new texture layer.
    ///
    /// With `Some(client)` the layer is *client-driven*: every
    /// [`update`](Self::update) asks the client for a texture. With `None`
    /// the layer is *fixed-id*: its texture is assigned with
    /// [`set_texture_id`](Self::set_texture_id). The mode cannot change
    /// afterwards.
    ///
    /// The layer keeps only a weak reference to the client. The client must
    /// outlive the layer; if it does not, updates become no-ops.
    pub fn create_texture_layer(&mut self, client: Option<&SharedClient>) -> LayerId {
        self.allocate(LayerKind::Texture(TextureLayer::new(client)))
    }

    /// Destroys a layer, freeing its slot for reuse.
    ///
    /// If the layer has a host, it is detached first: a texture layer with an
    /// outstanding texture passes through the acquisition barrier, and any
    /// rate limiter it started is stopped. A commit is then requested so the
    /// compositor drops the layer's twin.
    ///
    /// # Panics
    ///
    /// Panics if the layer has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy layer with children"
        );

        let was_attached = self.attached[idx as usize];
        self.set_layer_tree_host_at(idx, false, BarrierReason::Destroy);

        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::TOPOLOGY);
            self.set_needs_commit_at(p);
        } else if was_attached {
            // The root: its twins must be torn down by the next commit.
            self.request_commit();
        }
        if self.root == idx {
            self.root = INVALID;
        }

        self.dirty.remove_key(idx);
        self.kind[idx as usize] = LayerKind::Plain;

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;

        self.free_list.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Sets (or clears) the root layer.
    ///
    /// When a host is attached, the old root's subtree is detached from it
    /// and the new root's subtree is attached.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the new root has a parent.
    pub fn set_root(&mut self, root: Option<LayerId>) {
        let new_root = match root {
            Some(id) => {
                self.validate(id);
                assert!(
                    self.parent[id.idx as usize] == INVALID,
                    "root layer cannot have a parent"
                );
                id.idx
            }
            None => INVALID,
        };
        if new_root == self.root {
            return;
        }

        if self.root != INVALID {
            let old = self.root;
            self.detach_subtree(old, BarrierReason::Detach);
            self.dirty.mark(old, dirty::TOPOLOGY);
        }
        self.root = new_root;
        if new_root != INVALID {
            self.attach_subtree(new_root);
            self.dirty.mark(new_root, dirty::TOPOLOGY);
        }
        self.request_commit();
    }

    /// Returns the root layer, if any.
    #[must_use]
    pub fn root(&self) -> Option<LayerId> {
        (self.root != INVALID).then(|| self.id_at(self.root))
    }

    /// Adds `child` as the last child of `parent`.
    ///
    /// If `parent` has a host, `child`'s subtree is attached to it.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `child` is the root.
    pub fn add_child(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(c != self.root, "root layer cannot have a parent");

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.dirty.mark(p, dirty::TOPOLOGY);
        if self.attached[p as usize] {
            self.attach_subtree(c);
        }
        self.set_needs_commit_at(p);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: LayerId, sibling: LayerId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(c != self.root, "root layer cannot have a parent");
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.dirty.mark(p, dirty::TOPOLOGY);
        if self.attached[p as usize] {
            self.attach_subtree(c);
        }
        self.set_needs_commit_at(p);
    }

    /// Removes `child` from its current parent.
    ///
    /// If the child had a host, its subtree is detached from it.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer has no parent.
    pub fn remove_from_parent(&mut self, child: LayerId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "layer has no parent");

        let p = self.parent[c as usize];
        self.detach_subtree(c, BarrierReason::Detach);
        self.unlink_from_parent(c);

        self.dirty.mark(p, dirty::TOPOLOGY);
        self.set_needs_commit_at(p);
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a layer.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Children<'_, H> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    // -- Host API --

    /// Attaches `host` to the tree, returning the previously attached host.
    ///
    /// A previous host is detached first, so layers guard their textures
    /// against the *old* host before switching.
    pub fn attach_host(&mut self, host: H) -> Option<H> {
        let old = self.detach_host();
        self.host = Some(host);
        if self.root != INVALID {
            self.attach_subtree(self.root);
        }
        self.request_commit();
        old
    }

    /// Detaches and returns the host, running every attached layer's
    /// host-change hook against it first.
    pub fn detach_host(&mut self) -> Option<H> {
        if self.root != INVALID {
            self.detach_subtree(self.root, BarrierReason::Detach);
        }
        self.commit_requested = false;
        self.host.take()
    }

    /// Returns the attached host.
    #[must_use]
    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    /// Returns the attached host mutably.
    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.host.as_mut()
    }

    /// Returns whether the layer currently has a host.
    #[must_use]
    pub fn has_host(&self, id: LayerId) -> bool {
        self.validate(id);
        self.attached[id.idx as usize]
    }

    /// Returns whether any attached layer requested a commit since the last
    /// one finished.
    #[must_use]
    pub fn needs_commit(&self) -> bool {
        self.commit_requested
    }

    // -- Diagnostics --

    /// Installs a trace sink, replacing any previous one.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer = Tracer::new(sink);
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.tracer.take()
    }

    // -- Base property API --

    /// Sets the layer's bounds in layer space.
    pub fn set_bounds(&mut self, id: LayerId, bounds: Size) {
        self.validate(id);
        self.bounds[id.idx as usize] = bounds;
        self.set_needs_commit_at(id.idx);
    }

    /// Returns the layer's bounds.
    #[must_use]
    pub fn bounds(&self, id: LayerId) -> Size {
        self.validate(id);
        self.bounds[id.idx as usize]
    }

    /// Sets whether the base layer allows drawing at all.
    pub fn set_is_drawable(&mut self, id: LayerId, drawable: bool) {
        self.validate(id);
        self.is_drawable[id.idx as usize] = drawable;
        self.set_needs_commit_at(id.idx);
    }

    /// Returns whether the base layer allows drawing.
    #[must_use]
    pub fn is_drawable(&self, id: LayerId) -> bool {
        self.validate(id);
        self.is_drawable[id.idx as usize]
    }

    /// Returns whether the layer draws anything.
    ///
    /// For plain layers this is the base [`is_drawable`](Self::is_drawable)
    /// flag. Texture layers additionally require a client or a texture, and a
    /// context that has not been lost.
    #[must_use]
    pub fn draws_content(&self, id: LayerId) -> bool {
        self.validate(id);
        self.draws_content_at(id.idx)
    }

    /// Invalidates `rect` (in layer space).
    ///
    /// Accumulates the rect into the layer's update rect and schedules a
    /// commit if the layer draws. A rate-limited texture layer that draws
    /// (re)arms its client's rate limiter here.
    pub fn set_needs_display_rect(&mut self, id: LayerId, rect: Rect) {
        self.validate(id);
        let idx = id.idx;

        if rect.area() > 0.0 {
            let slot = &mut self.update_rect[idx as usize];
            *slot = Some(slot.map_or(rect, |r| r.union(rect)));
            self.needs_display[idx as usize] = true;
            self.dirty.mark(idx, dirty::DISPLAY);
        }
        if self.draws_content_at(idx) {
            self.set_needs_commit_at(idx);
        }

        if matches!(self.kind[idx as usize], LayerKind::Texture(_)) {
            self.texture_needs_display_at(idx);
        }
    }

    /// Invalidates the layer's full bounds.
    pub fn set_needs_display(&mut self, id: LayerId) {
        let bounds = self.bounds(id);
        self.set_needs_display_rect(id, Rect::from_origin_size(Point::ZERO, bounds));
    }

    /// Returns whether the layer has an invalidation not yet consumed by
    /// [`update`](Self::update).
    #[must_use]
    pub fn needs_display(&self, id: LayerId) -> bool {
        self.validate(id);
        self.needs_display[id.idx as usize]
    }

    /// Returns the region invalidated since the last commit.
    #[must_use]
    pub fn update_rect(&self, id: LayerId) -> Option<Rect> {
        self.validate(id);
        self.update_rect[id.idx as usize]
    }

    /// Returns whether the layer must be accounted for before a pending
    /// commit may be considered complete.
    ///
    /// Always `true` for texture layers, whose textures may be single- or
    /// double-buffered; `false` for plain layers.
    #[must_use]
    pub fn blocks_pending_commit(&self, id: LayerId) -> bool {
        self.validate(id);
        matches!(self.kind[id.idx as usize], LayerKind::Texture(_))
    }

    // -- Update API --

    /// Updates every layer that has a host, in tree order.
    ///
    /// Client-driven texture layers ask their client for this cycle's texture
    /// (see [`update_layer`](Self::update_layer)). Pending-display state is
    /// cleared.
    pub fn update(&mut self, queue: &mut ResourceUpdateQueue) {
        for idx in self.attached_order() {
            self.update_at(idx, queue);
        }
        let _: Vec<u32> = self
            .dirty
            .drain(dirty::DISPLAY)
            .deterministic()
            .run()
            .collect();
    }

    /// Updates a single layer, whether or not it has a host.
    ///
    /// For a client-driven texture layer this records the client's texture
    /// directly (the synchronized production path, so no acquisition barrier)
    /// and polls the client's context for a reset. Fixed-id and plain layers
    /// only clear their pending-display flag.
    pub fn update_layer(&mut self, id: LayerId, queue: &mut ResourceUpdateQueue) {
        self.validate(id);
        self.update_at(id.idx, queue);
    }

    // -- Crate-internal helpers --

    /// Returns the live handle for slot `idx`.
    pub(crate) fn id_at(&self, idx: u32) -> LayerId {
        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns the slots that have a host, depth-first pre-order from the
    /// root.
    pub(crate) fn attached_order(&self) -> Vec<u32> {
        let mut order = Vec::new();
        if self.host.is_some() && self.root != INVALID {
            self.collect_subtree(self.root, &mut order);
        }
        order
    }

    pub(crate) fn draws_content_at(&self, idx: u32) -> bool {
        let base = self.is_drawable[idx as usize];
        match &self.kind[idx as usize] {
            LayerKind::Plain => base,
            LayerKind::Texture(t) => t.draws_content(base),
        }
    }

    /// Marks `idx` for the next push and, if it has a host, asks the host
    /// for a commit.
    pub(crate) fn set_needs_commit_at(&mut self, idx: u32) {
        self.dirty.mark(idx, dirty::PROPERTIES);
        if self.attached[idx as usize] {
            self.request_commit();
        }
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: LayerId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale LayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn request_commit(&mut self) {
        if let Some(host) = &mut self.host {
            self.commit_requested = true;
            host.set_needs_commit();
        }
    }

    fn allocate(&mut self, kind: LayerKind) -> LayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped on destroy.
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.kind[idx as usize] = kind;
            self.bounds[idx as usize] = Size::ZERO;
            self.is_drawable[idx as usize] = true;
            self.needs_display[idx as usize] = false;
            self.update_rect[idx as usize] = None;
            self.attached[idx as usize] = false;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.bounds.push(Size::ZERO);
            self.is_drawable.push(true);
            self.needs_display.push(false);
            self.update_rect.push(None);
            self.attached.push(false);
            self.generation.push(0);
            idx
        };

        self.dirty.mark(idx, dirty::PROPERTIES);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.id_at(idx)
    }

    fn update_at(&mut self, idx: u32, queue: &mut ResourceUpdateQueue) {
        if matches!(self.kind[idx as usize], LayerKind::Texture(_)) {
            self.update_texture_at(idx, queue);
        }
        self.needs_display[idx as usize] = false;
    }

    /// Runs the host-change hook on every layer of the subtree at `idx`.
    fn attach_subtree(&mut self, idx: u32) {
        if self.host.is_none() {
            return;
        }
        let mut subtree = Vec::new();
        self.collect_subtree(idx, &mut subtree);
        for i in subtree {
            self.set_layer_tree_host_at(i, true, BarrierReason::Detach);
        }
    }

    fn detach_subtree(&mut self, idx: u32, reason: BarrierReason) {
        let mut subtree = Vec::new();
        self.collect_subtree(idx, &mut subtree);
        for i in subtree {
            self.set_layer_tree_host_at(i, false, reason);
        }
    }

    /// The base host-change hook, with the texture-layer override applied
    /// before a layer leaves its host.
    fn set_layer_tree_host_at(&mut self, idx: u32, attached: bool, reason: BarrierReason) {
        if self.attached[idx as usize] == attached {
            return;
        }
        if !attached && matches!(self.kind[idx as usize], LayerKind::Texture(_)) {
            self.texture_host_detaching_at(idx, reason);
        }
        self.attached[idx as usize] = attached;
        self.dirty.mark(idx, dirty::TOPOLOGY);
        if attached {
            self.dirty.mark(idx, dirty::PROPERTIES);
        }
    }

    /// Depth-first pre-order collection starting from `idx`.
    fn collect_subtree(&self, idx: u32, out: &mut Vec<u32>) {
        out.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.collect_subtree(child, out);
            child = self.next_sibling[child as usize];
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

impl<H: LayerTreeHost> Drop for LayerTree<H> {
    /// Tears down every attached layer against the host before the host
    /// itself is dropped.
    fn drop(&mut self) {
        for idx in self.attached_order() {
            self.set_layer_tree_host_at(idx, false, BarrierReason::Destroy);
        }
    }
}
