// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The content-side handle to the compositor thread.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use lamina_core::host::{LayerTreeHost, RateLimiterSet};
use lamina_core::layer::{CommitReport, CompositorTree, ContextId, LayerTree};
use lamina_core::resource::ResourceUpdateQueue;

use crate::config::CompositorConfig;
use crate::error::HostError;
use crate::thread::{self as compositor, DrawnFrame, Message, Shared};

/// A [`LayerTreeHost`] backed by a compositor thread.
///
/// Owned by the [`LayerTree`] it hosts and used from the content thread
/// only. Dropping the host shuts the compositor thread down and joins it.
pub struct ThreadedHost {
    messages: Sender<Message>,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
    limiters: RateLimiterSet,
    throttle: Box<dyn FnMut(ContextId)>,
    /// Last acquisition ticket issued.
    ticket: u64,
    /// Set once a barrier has completed since the last submit.
    textures_acquired: bool,
    barriers: u64,
    commit_requests: u64,
}

impl fmt::Debug for ThreadedHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadedHost")
            .field("limiters", &self.limiters)
            .field("ticket", &self.ticket)
            .field("textures_acquired", &self.textures_acquired)
            .field("barriers", &self.barriers)
            .field("commit_requests", &self.commit_requests)
            .finish_non_exhaustive()
    }
}

impl ThreadedHost {
    /// Spawns the compositor thread.
    ///
    /// `throttle` is called on the content thread, once per
    /// [`draw_frame`](Self::draw_frame), for every context with an active
    /// rate limiter. Returns the host and the receiving end of the drawn
    /// frame channel.
    pub fn spawn(
        config: CompositorConfig,
        throttle: impl FnMut(ContextId) + 'static,
    ) -> Result<(Self, Receiver<DrawnFrame>), HostError> {
        let (messages, inbox) = mpsc::channel();
        let (frames, drawn) = mpsc::channel();
        let shared = Arc::new(Shared::new());

        let mut builder = thread::Builder::new().name(config.thread_name.into_owned());
        if let Some(bytes) = config.stack_size {
            builder = builder.stack_size(bytes);
        }
        let remote = Arc::clone(&shared);
        let thread = builder
            .spawn(move || compositor::run(inbox, remote, frames))
            .map_err(HostError::Spawn)?;

        let host = Self {
            messages,
            shared,
            thread: Some(thread),
            limiters: RateLimiterSet::new(),
            throttle: Box::new(throttle),
            ticket: 0,
            textures_acquired: false,
            barriers: 0,
            commit_requests: 0,
        };
        Ok((host, drawn))
    }

    /// Hands a committed snapshot and its resource updates to the
    /// compositor thread.
    ///
    /// Textures released by an earlier barrier become drawable again once
    /// the compositor has switched to this snapshot.
    pub fn submit(
        &mut self,
        tree: &CompositorTree,
        queue: ResourceUpdateQueue,
    ) -> Result<(), HostError> {
        self.send(Message::Commit(Box::new(tree.clone()), queue))?;
        self.textures_acquired = false;
        Ok(())
    }

    /// Runs the rate-limiter throttles and asks the compositor thread to
    /// draw a frame.
    pub fn draw_frame(&mut self) -> Result<(), HostError> {
        for context in self.limiters.iter() {
            (self.throttle)(context);
        }
        self.send(Message::Draw)
    }

    /// Returns the contexts with an active rate limiter.
    #[must_use]
    pub fn rate_limiters(&self) -> &RateLimiterSet {
        &self.limiters
    }

    /// Returns how many acquisition barriers waited on the compositor.
    #[must_use]
    pub fn barriers(&self) -> u64 {
        self.barriers
    }

    /// Returns how many commit requests the host has received.
    #[must_use]
    pub fn commit_requests(&self) -> u64 {
        self.commit_requests
    }

    /// Returns whether the compositor thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn send(&self, message: Message) -> Result<(), HostError> {
        self.messages.send(message).map_err(|_| HostError::Disconnected)
    }
}

impl LayerTreeHost for ThreadedHost {
    fn acquire_layer_textures(&mut self) {
        if self.textures_acquired {
            return;
        }
        self.ticket += 1;
        if self.send(Message::AcquireTextures(self.ticket)).is_ok() {
            self.shared.wait_for(self.ticket);
            self.barriers += 1;
        }
        self.textures_acquired = true;
    }

    fn start_rate_limiter(&mut self, context: ContextId) {
        self.limiters.start(context);
    }

    fn stop_rate_limiter(&mut self, context: ContextId) {
        self.limiters.stop(context);
    }

    fn set_needs_commit(&mut self) {
        self.commit_requests += 1;
    }
}

impl Drop for ThreadedHost {
    fn drop(&mut self) {
        _ = self.messages.send(Message::Shutdown);
        if let Some(thread) = self.thread.take() {
            _ = thread.join();
        }
    }
}

/// Runs one full frame of the content side: updates `tree`, commits it into
/// `staging`, and submits the snapshot to the tree's host.
pub fn commit(
    tree: &mut LayerTree<ThreadedHost>,
    staging: &mut CompositorTree,
) -> Result<CommitReport, HostError> {
    if tree.host().is_none() {
        return Err(HostError::Detached);
    }
    let mut queue = ResourceUpdateQueue::new();
    tree.update(&mut queue);
    let report = tree.begin_commit().push_properties_to(staging).finish();
    tree.host_mut()
        .ok_or(HostError::Detached)?
        .submit(staging, queue)?;
    Ok(report)
}
