//! Arena-backed operator tree shared by logical and physical plans.
//!
//! Nodes live in a `Vec` and refer to each other through [`NodeId`] handles,
//! so rewrite passes relink handles instead of moving boxed subtrees. A
//! node removed from the tree stays in the arena but is no longer reachable
//! from the root; every traversal starts at the root.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;
use core::ops::{Index, IndexMut};

/// Handle to a node of a [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
struct Slot<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A rooted tree with single-parent nodes.
#[derive(Clone, Debug)]
pub struct Tree<T> {
    slots: Vec<Slot<T>>,
    root: NodeId,
}

impl<T> Tree<T> {
    /// Creates a tree holding only `root`.
    pub fn new(root: T) -> Self {
        Self {
            slots: alloc::vec![Slot {
                value: root,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    /// Adds a detached node.
    pub fn add(&mut self, value: T) -> NodeId {
        self.slots.push(Slot {
            value,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.slots.len() - 1)
    }

    /// Appends detached `child` to `parent`'s children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_child(parent, self.slots[parent.0].children.len(), child);
    }

    /// Inserts detached `child` at `pos` among `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, pos: usize, child: NodeId) {
        debug_assert!(self.slots[child.0].parent.is_none(), "node already attached");
        debug_assert!(child != self.root, "root cannot become a child");
        self.slots[child.0].parent = Some(parent);
        self.slots[parent.0].children.insert(pos, child);
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Makes detached `id` the root.
    pub fn set_root(&mut self, id: NodeId) {
        debug_assert!(self.slots[id.0].parent.is_none());
        self.root = id;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    pub fn get(&self, id: NodeId) -> &T {
        &self.slots[id.0].value
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.slots[id.0].value
    }

    /// Unlinks `id` from its parent. Returns its former position.
    pub fn detach(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.slots[id.0].parent.take()?;
        let siblings = &mut self.slots[parent.0].children;
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings.remove(pos);
        Some((parent, pos))
    }

    /// Puts detached `new` where `old` is, detaching `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        match self.detach(old) {
            Some((parent, pos)) => self.insert_child(parent, pos, new),
            None => self.set_root(new),
        }
    }

    /// Puts detached `new` where `node` is and makes `node` its last child.
    pub fn insert_above(&mut self, node: NodeId, new: NodeId) {
        self.replace(node, new);
        self.add_child(new, node);
    }

    /// Removes `id`, moving its children into its place in order. The root
    /// can only be spliced out when it has a single child. Returns false if
    /// nothing changed.
    pub fn splice(&mut self, id: NodeId) -> bool {
        let children = core::mem::take(&mut self.slots[id.0].children);
        match self.slots[id.0].parent {
            None if children.len() != 1 => {
                self.slots[id.0].children = children;
                false
            }
            None => {
                self.slots[children[0].0].parent = None;
                self.root = children[0];
                true
            }
            Some(_) => {
                let Some((parent, pos)) = self.detach(id) else {
                    self.slots[id.0].children = children;
                    return false;
                };
                for (offset, child) in children.into_iter().enumerate() {
                    self.slots[child.0].parent = None;
                    self.insert_child(parent, pos + offset, child);
                }
                true
            }
        }
    }

    /// Nodes of the subtree under `id` in pre-order.
    pub fn pre_order_from(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    /// All reachable nodes in pre-order.
    pub fn pre_order(&self) -> Vec<NodeId> {
        self.pre_order_from(self.root)
    }

    /// Leaves of the subtree under `id`, left to right.
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        self.pre_order_from(id)
            .into_iter()
            .filter(|n| self.children(*n).is_empty())
            .collect()
    }

    /// Number of reachable nodes.
    pub fn len(&self) -> usize {
        self.pre_order().len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Renders the tree one node per line, prefixed by one `-` per level.
    pub fn render(&self, label: impl Fn(&T) -> String) -> String {
        let mut out = String::new();
        let mut stack = alloc::vec![(self.root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            for _ in 0..depth {
                out.push('-');
            }
            let _ = writeln!(out, "{}", label(self.get(node)));
            stack.extend(self.children(node).iter().rev().map(|c| (*c, depth + 1)));
        }
        out
    }
}

impl<T> Index<NodeId> for Tree<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<NodeId> for Tree<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.get_mut(id)
    }
}
