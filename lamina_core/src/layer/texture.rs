// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture layers: content-side state and GPU-resource transitions.
//!
//! A texture layer surfaces an externally produced GPU texture. It is either
//! *client-driven* (a [`TextureLayerClient`] prepares a texture on every
//! update) or *fixed-id* (the producer assigns texture ids directly). The
//! mode is chosen at construction and never changes.
//!
//! # Guarding committed textures
//!
//! Once a texture id has been committed, the compositor thread may still be
//! drawing with it. Every content-side operation that would repurpose the id,
//! overwrite its pixels in place, or stop presenting it first calls
//! [`acquire_layer_textures`](LayerTreeHost::acquire_layer_textures):
//!
//! | operation                                       | barrier when                                    |
//! |-------------------------------------------------|-------------------------------------------------|
//! | [`set_texture_id`](LayerTree::set_texture_id)   | current id non-zero and the layer has a host    |
//! | [`will_modify_texture`](LayerTree::will_modify_texture) | has a host and drawable now or at last commit |
//! | detaching from the host                         | current id non-zero                             |
//! | [`destroy_layer`](LayerTree::destroy_layer)     | has a host and current id non-zero              |
//!
//! # Rate limiting
//!
//! With [`set_rate_limit_context`](LayerTree::set_rate_limit_context)
//! enabled, a drawable client-driven layer starts its client's rate limiter
//! on every invalidation. The layer remembers that it has a limiter
//! outstanding and issues exactly one stop for it when rate limiting is
//! disabled, when it leaves its host, or when it is destroyed.

use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::fmt;

use kurbo::Rect;

use super::compositor::LayerImpl;
use super::id::{ContextId, LayerId, TextureId};
use super::tree::{LayerKind, LayerTree};
use crate::client::{SharedClient, TextureLayerClient};
use crate::dirty;
use crate::host::LayerTreeHost;
use crate::resource::ResourceUpdateQueue;
use crate::trace::{
    BarrierEvent, BarrierReason, ContextLossEvent, RateLimiterAction, RateLimiterEvent,
    SkipReason, UpdateSkippedEvent,
};

/// Where a texture layer's texture comes from.
pub(crate) enum TextureSource {
    /// Prepared by a client on every update.
    Client {
        client: Weak<RefCell<dyn TextureLayerClient>>,
        /// Captured at construction; stable for the client's lifetime.
        context: ContextId,
    },
    /// Assigned with `set_texture_id`.
    Fixed,
}

impl fmt::Debug for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client { client, context } => f
                .debug_struct("Client")
                .field("alive", &(client.strong_count() > 0))
                .field("context", context)
                .finish(),
            Self::Fixed => f.write_str("Fixed"),
        }
    }
}

/// The observable state of a texture layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureLayerState {
    /// Fixed-id layer with no texture assigned.
    Empty,
    /// Client-driven layer whose context is healthy.
    ClientBound,
    /// Fixed-id layer with a texture assigned.
    FixedId,
    /// Client-driven layer whose context reported a reset at the last update.
    Lost,
}

/// Content-side state of a texture layer.
#[derive(Debug)]
pub(crate) struct TextureLayer {
    pub(crate) source: TextureSource,
    pub(crate) texture_id: TextureId,
    pub(crate) flipped: bool,
    pub(crate) uv_rect: Rect,
    /// Indexed bottom-left, top-left, top-right, bottom-right.
    pub(crate) vertex_opacity: [f32; 4],
    pub(crate) premultiplied_alpha: bool,
    pub(crate) rate_limit_context: bool,
    /// A `start_rate_limiter` was issued with no matching stop yet.
    pub(crate) rate_limiter_active: bool,
    pub(crate) context_lost: bool,
    /// Whether the last pushed snapshot was drawable.
    pub(crate) content_committed: bool,
}

impl TextureLayer {
    pub(crate) fn new(client: Option<&SharedClient>) -> Self {
        let source = match client {
            Some(client) => TextureSource::Client {
                context: client.borrow().context().id(),
                client: Rc::downgrade(client),
            },
            None => TextureSource::Fixed,
        };
        Self {
            source,
            texture_id: TextureId::NONE,
            flipped: true,
            uv_rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            vertex_opacity: [1.0; 4],
            premultiplied_alpha: true,
            rate_limit_context: false,
            rate_limiter_active: false,
            context_lost: false,
            content_committed: false,
        }
    }

    /// The client's context, for client-driven layers.
    pub(crate) fn context(&self) -> Option<ContextId> {
        match self.source {
            TextureSource::Client { context, .. } => Some(context),
            TextureSource::Fixed => None,
        }
    }

    /// `(client present || texture present) && !context_lost && base`.
    pub(crate) fn draws_content(&self, base: bool) -> bool {
        let has_source = self.context().is_some() || self.texture_id.is_some();
        has_source && !self.context_lost && base
    }

    fn state(&self) -> TextureLayerState {
        match (&self.source, self.context_lost, self.texture_id.is_some()) {
            (TextureSource::Client { .. }, true, _) => TextureLayerState::Lost,
            (TextureSource::Client { .. }, false, _) => TextureLayerState::ClientBound,
            (TextureSource::Fixed, _, true) => TextureLayerState::FixedId,
            (TextureSource::Fixed, _, false) => TextureLayerState::Empty,
        }
    }
}

impl<H: LayerTreeHost> LayerTree<H> {
    // -- Draw-state setters --

    /// Sets whether the texture is sampled upside down.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not a texture layer.
    pub fn set_flipped(&mut self, id: LayerId, flipped: bool) {
        self.texture_mut(id).flipped = flipped;
        self.set_needs_commit_at(id.idx);
    }

    /// Sets the sampled region in normalized texture coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not a texture layer.
    pub fn set_uv_rect(&mut self, id: LayerId, uv_rect: Rect) {
        self.texture_mut(id).uv_rect = uv_rect;
        self.set_needs_commit_at(id.idx);
    }

    /// Sets per-corner opacity.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not a texture layer.
    pub fn set_vertex_opacity(
        &mut self,
        id: LayerId,
        bottom_left: f32,
        top_left: f32,
        top_right: f32,
        bottom_right: f32,
    ) {
        // Indexing follows the quad's vertex winding:
        // 1--2
        // |  |
        // 0--3
        self.texture_mut(id).vertex_opacity = [bottom_left, top_left, top_right, bottom_right];
        self.set_needs_commit_at(id.idx);
    }

    /// Sets whether the texture's color channels are premultiplied by alpha.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not a texture layer.
    pub fn set_premultiplied_alpha(&mut self, id: LayerId, premultiplied: bool) {
        self.texture_mut(id).premultiplied_alpha = premultiplied;
        self.set_needs_commit_at(id.idx);
    }

    // -- Resource transitions --

    /// Enables or disables throttling of the client's context to the host's
    /// frame cadence.
    ///
    /// Disabling stops an outstanding rate limiter immediately. Enabling only
    /// records the flag; the limiter starts on the next invalidation of a
    /// drawable layer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not a texture layer.
    pub fn set_rate_limit_context(&mut self, id: LayerId, enable: bool) {
        if !enable && self.texture(id).rate_limit_context {
            self.stop_rate_limiter_at(id.idx);
        }
        self.texture_mut(id).rate_limit_context = enable;
    }

    /// Assigns the texture the layer presents.
    ///
    /// Does nothing if `texture` is already assigned. Otherwise, if a texture
    /// is assigned and the layer has a host, the host's acquisition barrier
    /// runs *before* the new id is stored.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not a texture layer.
    pub fn set_texture_id(&mut self, id: LayerId, texture: TextureId) {
        let current = self.texture(id).texture_id;
        if current == texture {
            return;
        }
        if current.is_some() && self.attached[id.idx as usize] {
            self.acquire_textures_at(id.idx, current, BarrierReason::Reassign);
        }
        self.texture_mut(id).texture_id = texture;
        self.set_needs_commit_at(id.idx);
    }

    /// Announces that the pixels behind the current texture id are about to
    /// be overwritten in place.
    ///
    /// If the layer has a host and is drawable now or was drawable at the last
    /// commit, the host's acquisition barrier runs and the layer is treated
    /// as no longer committed until its next push.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not a texture layer.
    pub fn will_modify_texture(&mut self, id: LayerId) {
        let idx = id.idx;
        let (texture, committed) = {
            let t = self.texture(id);
            (t.texture_id, t.content_committed)
        };
        if self.attached[idx as usize] && (self.draws_content_at(idx) || committed) {
            self.acquire_textures_at(idx, texture, BarrierReason::Modify);
            self.texture_mut(id).content_committed = false;
            self.dirty.mark(idx, dirty::PROPERTIES);
        }
    }

    // -- Getters --

    /// Returns whether the layer is a texture layer.
    #[must_use]
    pub fn is_texture_layer(&self, id: LayerId) -> bool {
        self.validate(id);
        matches!(self.kind[id.idx as usize], LayerKind::Texture(_))
    }

    /// Returns the texture layer's state.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer is not a texture layer.
    #[must_use]
    pub fn texture_layer_state(&self, id: LayerId) -> TextureLayerState {
        self.texture(id).state()
    }

    /// Returns the client's context, for client-driven layers.
    #[must_use]
    pub fn texture_context(&self, id: LayerId) -> Option<ContextId> {
        self.texture(id).context()
    }

    /// Returns the assigned texture.
    #[must_use]
    pub fn texture_id(&self, id: LayerId) -> TextureId {
        self.texture(id).texture_id
    }

    /// Returns whether the texture is sampled upside down.
    #[must_use]
    pub fn flipped(&self, id: LayerId) -> bool {
        self.texture(id).flipped
    }

    /// Returns the sampled region in normalized texture coordinates.
    #[must_use]
    pub fn uv_rect(&self, id: LayerId) -> Rect {
        self.texture(id).uv_rect
    }

    /// Returns per-corner opacity as `[bottom_left, top_left, top_right, bottom_right]`.
    #[must_use]
    pub fn vertex_opacity(&self, id: LayerId) -> [f32; 4] {
        self.texture(id).vertex_opacity
    }

    /// Returns whether color channels are premultiplied by alpha.
    #[must_use]
    pub fn premultiplied_alpha(&self, id: LayerId) -> bool {
        self.texture(id).premultiplied_alpha
    }

    /// Returns whether the client's context is throttled.
    #[must_use]
    pub fn rate_limit_context(&self, id: LayerId) -> bool {
        self.texture(id).rate_limit_context
    }

    /// Returns whether the client's context reported a reset at the last
    /// update.
    #[must_use]
    pub fn context_lost(&self, id: LayerId) -> bool {
        self.texture(id).context_lost
    }

    /// Returns whether the last pushed snapshot was drawable.
    #[must_use]
    pub fn content_committed(&self, id: LayerId) -> bool {
        self.texture(id).content_committed
    }

    // -- Hook overrides and commit support --

    /// `set_needs_display_rect` override: (re)arm the rate limiter.
    pub(crate) fn texture_needs_display_at(&mut self, idx: u32) {
        let id = self.id_at(idx);
        let t = self.texture(id);
        if t.rate_limit_context
            && t.context().is_some()
            && self.attached[idx as usize]
            && self.draws_content_at(idx)
        {
            self.start_rate_limiter_at(idx);
        }
    }

    /// `set_layer_tree_host` override, run while the layer still has its
    /// old host.
    pub(crate) fn texture_host_detaching_at(&mut self, idx: u32, reason: BarrierReason) {
        let texture = self.texture(self.id_at(idx)).texture_id;
        if texture.is_some() {
            self.acquire_textures_at(idx, texture, reason);
        }
        self.stop_rate_limiter_at(idx);
    }

    /// `update` override for texture layers.
    pub(crate) fn update_texture_at(&mut self, idx: u32, queue: &mut ResourceUpdateQueue) {
        let id = self.id_at(idx);
        let (client, context) = match &self.texture(id).source {
            TextureSource::Client { client, context } => (client.upgrade(), *context),
            TextureSource::Fixed => return,
        };
        let Some(client) = client else {
            self.trace_update_skipped(id, context, SkipReason::ClientDropped);
            return;
        };
        let Ok(mut client) = client.try_borrow_mut() else {
            self.trace_update_skipped(id, context, SkipReason::ClientBusy);
            return;
        };
        let texture = client.prepare_texture(queue);
        let status = client.context().reset_status();
        drop(client);

        let lost = status.is_lost();
        let t = self.texture_mut(id);
        let lost_changed = t.context_lost != lost;
        let changed = lost_changed || t.texture_id != texture;
        t.texture_id = texture;
        t.context_lost = lost;

        if lost_changed {
            self.tracer.context_loss(&ContextLossEvent {
                layer: id,
                context,
                status,
            });
        }
        if changed {
            self.dirty.mark(idx, dirty::PROPERTIES);
        }
    }

    /// Pushes texture state into the compositor twin and records whether the
    /// pushed snapshot is drawable.
    pub(crate) fn push_texture_properties_at(&mut self, idx: u32, target: &mut LayerImpl) {
        let id = self.id_at(idx);
        let draws_content = self.draws_content_at(idx);
        let t = self.texture_mut(id);
        if let Some(twin) = target.texture.as_mut() {
            twin.flipped = t.flipped;
            twin.uv_rect = t.uv_rect;
            twin.vertex_opacity = t.vertex_opacity;
            twin.premultiplied_alpha = t.premultiplied_alpha;
            twin.texture_id = t.texture_id;
        }
        t.content_committed = draws_content;
    }

    // -- Internal helpers --

    fn texture(&self, id: LayerId) -> &TextureLayer {
        self.validate(id);
        match &self.kind[id.idx as usize] {
            LayerKind::Texture(t) => t,
            LayerKind::Plain => panic!("not a texture layer: {id:?}"),
        }
    }

    fn texture_mut(&mut self, id: LayerId) -> &mut TextureLayer {
        self.validate(id);
        match &mut self.kind[id.idx as usize] {
            LayerKind::Texture(t) => t,
            LayerKind::Plain => panic!("not a texture layer: {id:?}"),
        }
    }

    fn acquire_textures_at(&mut self, idx: u32, texture: TextureId, reason: BarrierReason) {
        let layer = self.id_at(idx);
        self.tracer.barrier(&BarrierEvent {
            layer,
            texture,
            reason,
        });
        if let Some(host) = &mut self.host {
            host.acquire_layer_textures();
        }
    }

    fn trace_update_skipped(&mut self, layer: LayerId, context: ContextId, reason: SkipReason) {
        self.tracer.update_skipped(&UpdateSkippedEvent {
            layer,
            context,
            reason,
        });
    }

    fn start_rate_limiter_at(&mut self, idx: u32) {
        let id = self.id_at(idx);
        let Some(context) = self.texture(id).context() else {
            return;
        };
        let Some(host) = &mut self.host else {
            return;
        };
        host.start_rate_limiter(context);
        self.texture_mut(id).rate_limiter_active = true;
        self.tracer.rate_limiter(&RateLimiterEvent {
            layer: id,
            context,
            action: RateLimiterAction::Start,
        });
    }

    /// Stops the limiter only if this layer has one outstanding.
    fn stop_rate_limiter_at(&mut self, idx: u32) {
        let id = self.id_at(idx);
        let t = self.texture(id);
        let (true, Some(context)) = (t.rate_limiter_active, t.context()) else {
            return;
        };
        if let Some(host) = &mut self.host {
            host.stop_rate_limiter(context);
        }
        self.texture_mut(id).rate_limiter_active = false;
        self.tracer.rate_limiter(&RateLimiterEvent {
            layer: id,
            context,
            action: RateLimiterAction::Stop,
        });
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::Rect;

    use super::*;
    use crate::client::ResetStatus;
    use crate::layer::CompositorTree;
    use crate::testing::{FakeClient, HostCall, RecordingHost, shared};

    type Tree = LayerTree<RecordingHost>;

    /// A tree with a host and a single texture layer as root.
    fn attached_tree(client: Option<&SharedClient>) -> (Tree, LayerId) {
        let mut tree = Tree::new();
        let layer = tree.create_texture_layer(client);
        tree.set_root(Some(layer));
        tree.attach_host(RecordingHost::default());
        (tree, layer)
    }

    fn calls(tree: &Tree) -> &[HostCall] {
        &tree.host().unwrap().calls
    }

    #[test]
    fn defaults() {
        let mut tree = Tree::new();
        let id = tree.create_texture_layer(None);
        assert!(tree.flipped(id));
        assert_eq!(tree.uv_rect(id), Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(tree.vertex_opacity(id), [1.0; 4]);
        assert!(tree.premultiplied_alpha(id));
        assert!(!tree.rate_limit_context(id));
        assert_eq!(tree.texture_id(id), TextureId::NONE);
        assert_eq!(tree.texture_layer_state(id), TextureLayerState::Empty);
        assert!(!tree.draws_content(id), "no client and no texture");
    }

    #[test]
    fn client_update_records_texture() {
        let client = FakeClient::new(ContextId(1), TextureId(7));
        let mut tree = Tree::new();
        let id = tree.create_texture_layer(Some(&shared(&client)));
        assert_eq!(tree.texture_layer_state(id), TextureLayerState::ClientBound);

        let mut queue = ResourceUpdateQueue::new();
        tree.update_layer(id, &mut queue);

        assert_eq!(tree.texture_id(id), TextureId(7));
        assert!(!tree.context_lost(id));
        assert!(tree.draws_content(id));
        assert_eq!(client.borrow().prepared, 1);
        assert_eq!(queue.len(), 1, "client uploads into the queue");
    }

    #[test]
    fn context_reset_stops_drawing_until_recovery() {
        let client = FakeClient::new(ContextId(1), TextureId(7));
        let mut tree = Tree::new();
        let id = tree.create_texture_layer(Some(&shared(&client)));
        let mut queue = ResourceUpdateQueue::new();
        tree.update_layer(id, &mut queue);
        assert!(tree.draws_content(id));

        client.borrow().context.status.set(ResetStatus::GuiltyContextReset);
        tree.update_layer(id, &mut queue);
        assert!(tree.context_lost(id));
        assert!(!tree.draws_content(id));
        assert_eq!(tree.texture_layer_state(id), TextureLayerState::Lost);

        client.borrow().context.status.set(ResetStatus::NoError);
        tree.update_layer(id, &mut queue);
        assert!(!tree.context_lost(id));
        assert!(tree.draws_content(id));
        assert_eq!(tree.texture_layer_state(id), TextureLayerState::ClientBound);
    }

    #[test]
    fn draws_content_requires_base_drawable() {
        let mut tree = Tree::new();
        let id = tree.create_texture_layer(None);
        tree.set_texture_id(id, TextureId(3));
        assert!(tree.draws_content(id));
        tree.set_is_drawable(id, false);
        assert!(!tree.draws_content(id));
    }

    #[test]
    fn update_ignores_dropped_client() {
        let client = FakeClient::new(ContextId(1), TextureId(7));
        let mut tree = Tree::new();
        let id = tree.create_texture_layer(Some(&shared(&client)));
        drop(client);

        let mut queue = ResourceUpdateQueue::new();
        tree.update_layer(id, &mut queue);
        assert_eq!(tree.texture_id(id), TextureId::NONE);
        assert!(queue.is_empty());
    }

    #[test]
    fn update_skips_borrowed_client() {
        let client = FakeClient::new(ContextId(1), TextureId(7));
        let mut tree = Tree::new();
        let id = tree.create_texture_layer(Some(&shared(&client)));

        let held = client.borrow();
        let mut queue = ResourceUpdateQueue::new();
        tree.update_layer(id, &mut queue);
        drop(held);
        assert_eq!(tree.texture_id(id), TextureId::NONE);
        assert_eq!(client.borrow().prepared, 0);

        tree.update_layer(id, &mut queue);
        assert_eq!(tree.texture_id(id), TextureId(7));
    }

    #[test]
    fn fixed_layer_update_is_noop() {
        let mut tree = Tree::new();
        let id = tree.create_texture_layer(None);
        tree.set_texture_id(id, TextureId(4));
        let mut queue = ResourceUpdateQueue::new();
        tree.update_layer(id, &mut queue);
        assert_eq!(tree.texture_id(id), TextureId(4));
        assert_eq!(tree.texture_layer_state(id), TextureLayerState::FixedId);
    }

    #[test]
    fn reassigning_texture_acquires_before_storing() {
        let (mut tree, id) = attached_tree(None);
        tree.set_texture_id(id, TextureId(7));
        assert_eq!(tree.host().unwrap().count(HostCall::AcquireLayerTextures), 0);
        tree.host_mut().unwrap().calls.clear();

        tree.set_texture_id(id, TextureId(9));
        assert_eq!(tree.texture_id(id), TextureId(9));
        // The barrier is issued before the store, whose commit request follows.
        assert_eq!(
            calls(&tree),
            &[HostCall::AcquireLayerTextures, HostCall::SetNeedsCommit]
        );
    }

    #[test]
    fn same_texture_twice_is_idempotent() {
        let (mut tree, id) = attached_tree(None);
        tree.set_texture_id(id, TextureId(7));
        tree.host_mut().unwrap().calls.clear();

        tree.set_texture_id(id, TextureId(7));
        assert!(calls(&tree).is_empty(), "no barrier and no commit request");
    }

    #[test]
    fn reassigning_without_host_skips_barrier() {
        let mut tree = Tree::new();
        let id = tree.create_texture_layer(None);
        tree.set_texture_id(id, TextureId(7));
        tree.set_texture_id(id, TextureId(9));
        assert_eq!(tree.texture_id(id), TextureId(9));
        assert!(tree.host().is_none());
    }

    #[test]
    fn vertex_opacity_keeps_winding_order() {
        let (mut tree, id) = attached_tree(None);
        tree.set_texture_id(id, TextureId(1));
        tree.set_vertex_opacity(id, 0.1, 0.2, 0.3, 0.4);

        let mut twins = CompositorTree::new();
        let _ = tree.begin_commit().push_properties_to(&mut twins).finish();
        let twin = twins.texture_layer(id).unwrap();
        assert_eq!(twin.vertex_opacity(), [0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn draw_state_setters_reach_the_twin() {
        let (mut tree, id) = attached_tree(None);
        tree.set_texture_id(id, TextureId(1));
        let mut twins = CompositorTree::new();
        let _ = tree.begin_commit().push_properties_to(&mut twins).finish();
        tree.host_mut().unwrap().calls.clear();

        let uv = Rect::new(0.25, 0.25, 0.5, 0.75);
        tree.set_flipped(id, false);
        tree.set_uv_rect(id, uv);
        tree.set_premultiplied_alpha(id, false);
        assert_eq!(calls(&tree), &[HostCall::SetNeedsCommit; 3]);
        assert!(tree.needs_commit());

        let report = tree.begin_commit().push_properties_to(&mut twins).finish();
        assert_eq!(report.pushed, [id]);
        let twin = twins.texture_layer(id).unwrap();
        assert!(!twin.flipped());
        assert_eq!(twin.uv_rect(), uv);
        assert!(!twin.premultiplied_alpha());
        assert_eq!(twin.texture_id(), TextureId(1));
    }

    #[test]
    fn will_modify_texture_acquires_when_committed() {
        let (mut tree, id) = attached_tree(None);
        tree.set_texture_id(id, TextureId(7));
        let mut twins = CompositorTree::new();
        let _ = tree.begin_commit().push_properties_to(&mut twins).finish();
        assert!(tree.content_committed(id));

        // Not drawable any more, but the last commit was.
        tree.set_is_drawable(id, false);
        tree.host_mut().unwrap().calls.clear();
        tree.will_modify_texture(id);
        assert_eq!(calls(&tree), &[HostCall::AcquireLayerTextures]);
        assert!(!tree.content_committed(id));

        // Neither drawable nor committed: nothing left to guard.
        tree.will_modify_texture(id);
        assert_eq!(tree.host().unwrap().count(HostCall::AcquireLayerTextures), 1);
    }

    #[test]
    fn will_modify_texture_without_host_does_nothing() {
        let mut tree = Tree::new();
        let id = tree.create_texture_layer(None);
        tree.set_texture_id(id, TextureId(7));
        tree.will_modify_texture(id);
        assert!(!tree.content_committed(id));
    }

    #[test]
    fn rate_limiter_starts_on_display_and_stops_on_disable() {
        let client = FakeClient::new(ContextId(5), TextureId(7));
        let (mut tree, id) = attached_tree(Some(&shared(&client)));
        tree.set_rate_limit_context(id, true);
        assert_eq!(tree.host().unwrap().count(HostCall::StartRateLimiter(ContextId(5))), 0);

        tree.set_needs_display_rect(id, Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(tree.host().unwrap().count(HostCall::StartRateLimiter(ContextId(5))), 1);

        tree.set_rate_limit_context(id, false);
        assert_eq!(tree.host().unwrap().count(HostCall::StopRateLimiter(ContextId(5))), 1);
        assert!(tree.host().unwrap().limiters.is_empty());
    }

    #[test]
    fn disabling_unstarted_limiter_issues_no_stop() {
        let client = FakeClient::new(ContextId(5), TextureId(7));
        let (mut tree, id) = attached_tree(Some(&shared(&client)));
        tree.set_rate_limit_context(id, true);
        tree.set_rate_limit_context(id, false);
        assert_eq!(tree.host().unwrap().count(HostCall::StopRateLimiter(ContextId(5))), 0);
    }

    #[test]
    fn lost_context_does_not_arm_limiter() {
        let client = FakeClient::new(ContextId(5), TextureId(7));
        let (mut tree, id) = attached_tree(Some(&shared(&client)));
        client.borrow().context.status.set(ResetStatus::UnknownContextReset);
        let mut queue = ResourceUpdateQueue::new();
        tree.update(&mut queue);
        tree.set_rate_limit_context(id, true);
        tree.set_needs_display_rect(id, Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(tree.host().unwrap().count(HostCall::StartRateLimiter(ContextId(5))), 0);
    }

    #[test]
    fn fixed_layer_never_rate_limits() {
        let (mut tree, id) = attached_tree(None);
        tree.set_texture_id(id, TextureId(3));
        tree.set_rate_limit_context(id, true);
        tree.set_needs_display_rect(id, Rect::new(0.0, 0.0, 4.0, 4.0));
        assert!(tree.host().unwrap().limiters.is_empty());
    }

    #[test]
    fn detaching_acquires_and_stops_limiter() {
        let client = FakeClient::new(ContextId(2), TextureId(7));
        let mut tree = Tree::new();
        let root = tree.create_layer();
        let id = tree.create_texture_layer(Some(&shared(&client)));
        tree.add_child(root, id);
        tree.set_root(Some(root));
        tree.attach_host(RecordingHost::default());
        let mut queue = ResourceUpdateQueue::new();
        tree.update(&mut queue);
        tree.set_rate_limit_context(id, true);
        tree.set_needs_display(id);
        tree.host_mut().unwrap().calls.clear();

        tree.remove_from_parent(id);
        assert_eq!(
            calls(&tree),
            &[
                HostCall::AcquireLayerTextures,
                HostCall::StopRateLimiter(ContextId(2)),
                HostCall::SetNeedsCommit,
            ]
        );

        // Re-detaching through another path issues nothing further.
        tree.host_mut().unwrap().calls.clear();
        tree.destroy_layer(id);
        assert!(calls(&tree).is_empty());
    }

    #[test]
    fn switching_hosts_acquires_on_old_host() {
        let (mut tree, id) = attached_tree(None);
        tree.set_texture_id(id, TextureId(7));
        let old = tree.attach_host(RecordingHost::default()).unwrap();
        assert_eq!(old.count(HostCall::AcquireLayerTextures), 1);
        assert_eq!(tree.host().unwrap().count(HostCall::AcquireLayerTextures), 0);
    }

    #[test]
    fn empty_layer_detaches_without_barrier() {
        let (mut tree, _id) = attached_tree(None);
        let old = tree.detach_host().unwrap();
        assert_eq!(old.count(HostCall::AcquireLayerTextures), 0);
    }

    #[test]
    fn destroy_acquires_and_stops_limiter() {
        let client = FakeClient::new(ContextId(9), TextureId(7));
        let (mut tree, id) = attached_tree(Some(&shared(&client)));
        let mut queue = ResourceUpdateQueue::new();
        tree.update(&mut queue);
        tree.set_rate_limit_context(id, true);
        tree.set_needs_display(id);
        tree.set_bounds(id, kurbo::Size::new(8.0, 8.0));
        tree.set_needs_display(id);
        tree.host_mut().unwrap().calls.clear();

        tree.destroy_layer(id);
        assert_eq!(
            calls(&tree),
            &[
                HostCall::AcquireLayerTextures,
                HostCall::StopRateLimiter(ContextId(9)),
                HostCall::SetNeedsCommit,
            ]
        );
        assert!(tree.host().unwrap().limiters.is_empty());
        assert!(tree.needs_commit());
    }

    #[test]
    fn dropping_tree_tears_down_attached_layers() {
        let client = FakeClient::new(ContextId(4), TextureId(7));
        let (mut tree, id) = attached_tree(Some(&shared(&client)));
        let log = tree.host().unwrap().log.clone();
        let mut queue = ResourceUpdateQueue::new();
        tree.update(&mut queue);
        tree.set_rate_limit_context(id, true);
        tree.set_bounds(id, kurbo::Size::new(8.0, 8.0));
        tree.set_needs_display(id);
        drop(tree);

        let log = log.borrow();
        let starts = log
            .iter()
            .filter(|c| **c == HostCall::StartRateLimiter(ContextId(4)))
            .count();
        let stops = log
            .iter()
            .filter(|c| **c == HostCall::StopRateLimiter(ContextId(4)))
            .count();
        assert!(starts >= 1);
        assert_eq!(stops, 1, "exactly one stop for the outstanding limiter");
        assert_eq!(log.last(), Some(&HostCall::StopRateLimiter(ContextId(4))));
    }

    #[test]
    fn stops_never_exceed_starts() {
        let client = FakeClient::new(ContextId(6), TextureId(7));
        let (mut tree, id) = attached_tree(Some(&shared(&client)));
        let mut queue = ResourceUpdateQueue::new();
        tree.update(&mut queue);
        tree.set_bounds(id, kurbo::Size::new(8.0, 8.0));

        let script: Vec<(bool, bool)> = vec![
            (true, true),
            (false, false),
            (false, true),
            (true, false),
            (true, true),
            (true, true),
            (false, false),
            (false, false),
        ];
        for (enable, display) in script {
            tree.set_rate_limit_context(id, enable);
            if display {
                tree.set_needs_display(id);
            }
            let host = tree.host().unwrap();
            let starts = host.count(HostCall::StartRateLimiter(ContextId(6)));
            let stops = host.count(HostCall::StopRateLimiter(ContextId(6)));
            assert!(stops <= starts, "{stops} stops after {starts} starts");
        }
    }

    #[test]
    #[should_panic(expected = "not a texture layer")]
    fn texture_ops_on_plain_layer_panic() {
        let mut tree = Tree::new();
        let id = tree.create_layer();
        tree.set_texture_id(id, TextureId(1));
    }
}
