// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, LayerId};
use super::tree::LayerTree;
use crate::host::LayerTreeHost;

/// An iterator over the direct children of a layer.
///
/// Created by [`LayerTree::children`].
#[derive(Debug)]
pub struct Children<'a, H: LayerTreeHost> {
    tree: &'a LayerTree<H>,
    current: u32,
}

impl<'a, H: LayerTreeHost> Children<'a, H> {
    pub(crate) fn new(tree: &'a LayerTree<H>, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl<H: LayerTreeHost> Iterator for Children<'_, H> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.id_at(idx))
    }
}
