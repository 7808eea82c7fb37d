// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The commit: copying content-side state into the compositor twin tree.
//!
//! A commit is an explicit phase token rather than an implicit rendezvous:
//!
//! 1. [`LayerTree::begin_commit`] returns a [`Commit`] that borrows the tree
//!    mutably, so nothing on the content side can change until the commit is
//!    finished.
//! 2. [`Commit::push_properties_to`] synchronizes the twin tree's structure
//!    and pushes the properties of every dirty or newly created layer.
//! 3. [`PushedCommit::finish`] clears the pending commit request and returns
//!    a [`CommitReport`].
//!
//! The push drains two dirty channels:
//!
//! 1. **TOPOLOGY**: twins of destroyed or detached layers are dropped,
//!    missing twins are created, and the draw order is rebuilt.
//! 2. **PROPERTIES**: base and texture properties are copied for each dirty
//!    layer that has a host. Dirty marks on layers without a host are
//!    discarded; they are re-marked when the layer is attached.

use alloc::vec::Vec;

use super::compositor::CompositorTree;
use super::id::LayerId;
use super::tree::{LayerKind, LayerTree};
use crate::dirty;
use crate::host::LayerTreeHost;
use crate::trace::CommitEvent;

/// The outcome of a finished commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// The compositor tree generation the commit produced.
    pub generation: u64,
    /// Layers whose properties were pushed, in draw order.
    pub pushed: Vec<LayerId>,
    /// Number of twins created.
    pub created: u32,
    /// Number of twins destroyed.
    pub destroyed: u32,
    /// Whether the draw order was rebuilt.
    pub topology_changed: bool,
    /// Whether any committed layer blocks pending commits.
    pub blocks_pending_commit: bool,
}

/// A commit in progress. See the [module docs](self).
#[derive(Debug)]
#[must_use = "a commit does nothing until its properties are pushed"]
pub struct Commit<'a, H: LayerTreeHost> {
    tree: &'a mut LayerTree<H>,
}

/// A commit whose properties have been pushed but which has not yet been
/// acknowledged.
#[derive(Debug)]
#[must_use = "call `finish` to complete the commit"]
pub struct PushedCommit<'a, H: LayerTreeHost> {
    tree: &'a mut LayerTree<H>,
    report: CommitReport,
}

impl<H: LayerTreeHost> LayerTree<H> {
    /// Starts a commit.
    ///
    /// Call [`update`](Self::update) first so client-driven texture layers
    /// have produced this cycle's texture.
    pub fn begin_commit(&mut self) -> Commit<'_, H> {
        Commit { tree: self }
    }
}

impl<'a, H: LayerTreeHost> Commit<'a, H> {
    /// Pushes every pending change into `target`.
    pub fn push_properties_to(self, target: &mut CompositorTree) -> PushedCommit<'a, H> {
        let tree = self.tree;
        let order = tree.attached_order();

        let topology: Vec<u32> = tree
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        let mut dirty_props: Vec<u32> = tree
            .dirty
            .drain(dirty::PROPERTIES)
            .deterministic()
            .run()
            .collect();
        dirty_props.sort_unstable();

        let destroyed = target.retain(|id| tree.is_alive(id) && tree.attached[id.idx as usize]);

        let mut report = CommitReport {
            destroyed,
            ..CommitReport::default()
        };
        for &idx in &order {
            let id = tree.id_at(idx);
            let is_new = !target.contains(id);
            if is_new {
                let is_texture = matches!(tree.kind[idx as usize], LayerKind::Texture(_));
                target.create(id, is_texture);
                report.created += 1;
            }
            if is_new || dirty_props.binary_search(&idx).is_ok() {
                tree.push_layer_properties_at(idx, target);
                report.pushed.push(id);
            }
            report.blocks_pending_commit |=
                matches!(tree.kind[idx as usize], LayerKind::Texture(_));
        }

        report.topology_changed = !topology.is_empty() || report.created > 0 || destroyed > 0;
        if report.topology_changed {
            target.draw_order = order.iter().map(|&idx| tree.id_at(idx)).collect();
        }
        target.generation += 1;
        report.generation = target.generation;

        PushedCommit { tree, report }
    }
}

impl<H: LayerTreeHost> PushedCommit<'_, H> {
    /// Returns the report so far.
    #[must_use]
    pub fn report(&self) -> &CommitReport {
        &self.report
    }

    /// Completes the commit.
    pub fn finish(self) -> CommitReport {
        let Self { tree, report } = self;
        tree.commit_requested = false;
        tree.tracer.commit(&CommitEvent {
            generation: report.generation,
            pushed: u32::try_from(report.pushed.len()).unwrap_or(u32::MAX),
            created: report.created,
            destroyed: report.destroyed,
            blocks_pending_commit: report.blocks_pending_commit,
        });
        report
    }
}

impl<H: LayerTreeHost> LayerTree<H> {
    /// Copies the base properties of `idx`, then the texture properties for
    /// texture layers.
    fn push_layer_properties_at(&mut self, idx: u32, target: &mut CompositorTree) {
        let id = self.id_at(idx);
        let draws_content = self.draws_content_at(idx);
        let Some(twin) = target.twin_mut(id) else {
            return;
        };
        twin.bounds = self.bounds[idx as usize];
        twin.draws_content = draws_content;
        twin.update_rect = self.update_rect[idx as usize].take();
        if matches!(self.kind[idx as usize], LayerKind::Texture(_)) {
            self.push_texture_properties_at(idx, twin);
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Size};

    use super::*;
    use crate::layer::TextureId;
    use crate::testing::RecordingHost;

    type Tree = LayerTree<RecordingHost>;

    fn commit(tree: &mut Tree, twins: &mut CompositorTree) -> CommitReport {
        tree.begin_commit().push_properties_to(twins).finish()
    }

    fn hosted_tree() -> (Tree, LayerId, LayerId) {
        let mut tree = Tree::new();
        let root = tree.create_layer();
        let tex = tree.create_texture_layer(None);
        tree.add_child(root, tex);
        tree.set_root(Some(root));
        tree.attach_host(RecordingHost::default());
        (tree, root, tex)
    }

    #[test]
    fn first_commit_creates_twins_in_draw_order() {
        let (mut tree, root, tex) = hosted_tree();
        let mut twins = CompositorTree::new();
        let report = commit(&mut tree, &mut twins);

        assert_eq!(report.generation, 1);
        assert_eq!(report.created, 2);
        assert_eq!(report.destroyed, 0);
        assert_eq!(report.pushed, [root, tex]);
        assert!(report.topology_changed);
        assert!(report.blocks_pending_commit);
        let order: Vec<LayerId> = twins.iter().map(|l| l.id()).collect();
        assert_eq!(order, [root, tex]);
        assert!(twins.texture_layer(root).is_none());
        assert!(twins.texture_layer(tex).is_some());
        assert!(!tree.needs_commit());
    }

    #[test]
    fn only_dirty_layers_are_pushed() {
        let (mut tree, _root, tex) = hosted_tree();
        let mut twins = CompositorTree::new();
        commit(&mut tree, &mut twins);

        let report = commit(&mut tree, &mut twins);
        assert!(report.pushed.is_empty());
        assert!(!report.topology_changed);
        assert_eq!(report.generation, 2);

        tree.set_bounds(tex, Size::new(4.0, 8.0));
        tree.set_texture_id(tex, TextureId(3));
        assert!(tree.needs_commit());
        let report = commit(&mut tree, &mut twins);
        assert_eq!(report.pushed, [tex]);
        let twin = twins.get(tex).unwrap();
        assert_eq!(twin.bounds(), Size::new(4.0, 8.0));
        assert_eq!(twin.texture().unwrap().texture_id(), TextureId(3));
    }

    #[test]
    fn removed_and_destroyed_layers_lose_their_twins() {
        let (mut tree, root, tex) = hosted_tree();
        let mut twins = CompositorTree::new();
        commit(&mut tree, &mut twins);

        tree.remove_from_parent(tex);
        let report = commit(&mut tree, &mut twins);
        assert_eq!(report.destroyed, 1);
        assert!(twins.get(tex).is_none());
        assert_eq!(twins.len(), 1);

        tree.add_child(root, tex);
        let report = commit(&mut tree, &mut twins);
        assert_eq!(report.created, 1);
        assert!(twins.get(tex).is_some());

        tree.remove_from_parent(tex);
        tree.destroy_layer(tex);
        let reused = tree.create_texture_layer(None);
        assert_eq!(reused.index(), tex.index());
        let report = commit(&mut tree, &mut twins);
        assert_eq!(report.destroyed, 1);
        assert_eq!(report.created, 0);
        assert!(twins.get(tex).is_none());
        assert!(twins.get(reused).is_none());
    }

    #[test]
    fn update_rect_is_consumed_by_push() {
        let (mut tree, root, _tex) = hosted_tree();
        tree.set_bounds(root, Size::new(10.0, 10.0));
        tree.set_needs_display(root);
        let mut twins = CompositorTree::new();
        commit(&mut tree, &mut twins);
        assert_eq!(
            twins.get(root).unwrap().update_rect(),
            Some(Rect::new(0.0, 0.0, 10.0, 10.0))
        );
        assert_eq!(tree.update_rect(root), None);
    }

    #[test]
    fn detached_tree_commits_nothing() {
        let mut tree = Tree::new();
        let layer = tree.create_texture_layer(None);
        tree.set_root(Some(layer));
        let mut twins = CompositorTree::new();
        let report = commit(&mut tree, &mut twins);
        assert!(twins.is_empty());
        assert!(report.pushed.is_empty());
        assert!(!report.blocks_pending_commit);
    }
}
