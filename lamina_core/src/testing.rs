// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles for hosts and clients.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use kurbo::Size;

use crate::client::{GraphicsContext, ResetStatus, SharedClient, TextureLayerClient};
use crate::host::{LayerTreeHost, RateLimiterSet};
use crate::layer::{ContextId, TextureId};
use crate::resource::ResourceUpdateQueue;

/// A call received by [`RecordingHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HostCall {
    AcquireLayerTextures,
    StartRateLimiter(ContextId),
    StopRateLimiter(ContextId),
    SetNeedsCommit,
}

/// A host that records every call in order.
///
/// `calls` can be cleared by tests; `log` is shared so it survives the host
/// being dropped together with its tree.
#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    pub(crate) calls: Vec<HostCall>,
    pub(crate) log: Rc<RefCell<Vec<HostCall>>>,
    pub(crate) limiters: RateLimiterSet,
}

impl RecordingHost {
    pub(crate) fn count(&self, call: HostCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    fn record(&mut self, call: HostCall) {
        self.calls.push(call);
        self.log.borrow_mut().push(call);
    }
}

impl LayerTreeHost for RecordingHost {
    fn acquire_layer_textures(&mut self) {
        self.record(HostCall::AcquireLayerTextures);
    }

    fn start_rate_limiter(&mut self, context: ContextId) {
        self.limiters.start(context);
        self.record(HostCall::StartRateLimiter(context));
    }

    fn stop_rate_limiter(&mut self, context: ContextId) {
        self.limiters.stop(context);
        self.record(HostCall::StopRateLimiter(context));
    }

    fn set_needs_commit(&mut self) {
        self.record(HostCall::SetNeedsCommit);
    }
}

/// A context whose reset status tests can flip.
#[derive(Debug)]
pub(crate) struct FakeContext {
    pub(crate) id: ContextId,
    pub(crate) status: Cell<ResetStatus>,
}

impl GraphicsContext for FakeContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn reset_status(&self) -> ResetStatus {
        self.status.get()
    }
}

/// A client that always prepares the same texture with a full upload.
#[derive(Debug)]
pub(crate) struct FakeClient {
    pub(crate) context: FakeContext,
    pub(crate) texture: TextureId,
    pub(crate) prepared: u32,
}

impl FakeClient {
    pub(crate) fn new(context: ContextId, texture: TextureId) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            context: FakeContext {
                id: context,
                status: Cell::new(ResetStatus::NoError),
            },
            texture,
            prepared: 0,
        }))
    }
}

impl TextureLayerClient for FakeClient {
    fn prepare_texture(&mut self, queue: &mut ResourceUpdateQueue) -> TextureId {
        self.prepared += 1;
        queue.append_full_upload(self.texture, Size::new(16.0, 16.0));
        self.texture
    }

    fn context(&self) -> &dyn GraphicsContext {
        &self.context
    }
}

/// Erases a concrete client into the handle layers are created from.
pub(crate) fn shared(client: &Rc<RefCell<FakeClient>>) -> SharedClient {
    client.clone()
}
