// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compositor thread and the state it shares with the content thread.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use lamina_core::layer::CompositorTree;
use lamina_core::quad::TextureDrawQuad;
use lamina_core::resource::ResourceUpdateQueue;

/// A frame drawn by the compositor thread.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawnFrame {
    /// Zero-based index of the frame.
    pub frame_index: u64,
    /// Generation of the compositor tree the frame was drawn from.
    pub generation: u64,
    /// Texture quads in draw order.
    pub quads: Vec<TextureDrawQuad>,
    /// Whether committed textures were released to the content side, in
    /// which case no texture quads were drawn.
    pub textures_acquired: bool,
    /// Number of resource updates applied with the tree the frame was drawn
    /// from.
    pub resource_updates: usize,
}

pub(crate) enum Message {
    Commit(Box<CompositorTree>, ResourceUpdateQueue),
    AcquireTextures(u64),
    Draw,
    Shutdown,
}

#[derive(Debug)]
struct BarrierState {
    /// Highest acquisition ticket acknowledged.
    acked: u64,
    running: bool,
}

/// Barrier acknowledgements flowing back to the content thread.
#[derive(Debug)]
pub(crate) struct Shared {
    state: Mutex<BarrierState>,
    cond: Condvar,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(BarrierState {
                acked: 0,
                running: true,
            }),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ack(&self, ticket: u64) {
        let mut state = self.lock();
        state.acked = state.acked.max(ticket);
        drop(state);
        self.cond.notify_all();
    }

    fn stop(&self) {
        self.lock().running = false;
        self.cond.notify_all();
    }

    /// Blocks until `ticket` is acknowledged or the compositor thread exits.
    pub(crate) fn wait_for(&self, ticket: u64) {
        let mut state = self.lock();
        while state.acked < ticket && state.running {
            state = self
                .cond
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Marks the thread as stopped on any exit, including unwinding.
struct RunningGuard(Arc<Shared>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Compositor thread body.
pub(crate) fn run(messages: Receiver<Message>, shared: Arc<Shared>, frames: Sender<DrawnFrame>) {
    let _guard = RunningGuard(Arc::clone(&shared));
    let mut active = CompositorTree::new();
    let mut resource_updates = 0;
    let mut acquired = false;
    let mut frame_index = 0;

    for message in messages {
        match message {
            Message::Commit(tree, mut queue) => {
                active = *tree;
                resource_updates = queue.drain().count();
                acquired = false;
            }
            Message::AcquireTextures(ticket) => {
                acquired = true;
                shared.ack(ticket);
            }
            Message::Draw => {
                let mut quads = Vec::new();
                if !acquired {
                    active.append_quads(&mut quads);
                }
                let frame = DrawnFrame {
                    frame_index,
                    generation: active.generation(),
                    quads,
                    textures_acquired: acquired,
                    resource_updates,
                };
                frame_index += 1;
                // Nobody listening is not an error; keep honoring barriers.
                _ = frames.send(frame);
            }
            Message::Shutdown => break,
        }
    }
}
