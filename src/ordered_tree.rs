//! OrderedTree: arena-backed red-black tree used as the content of one bucket.
//!
//! Nodes live in a `SlotMap` and refer to each other by generational key.
//! Children are reachable only through their parent's `children` array;
//! `parent` is a back-reference consulted during rotation and fixup and is
//! never used to free anything. Removing a node from the arena is the only
//! way a node is dropped.
//!
//! Invariants (checked by the in-crate property tests):
//! - the root is black;
//! - no red node has a red child;
//! - every root-to-empty path crosses the same number of black nodes;
//! - the in-order key sequence is strictly increasing.

use crate::error::InsertError;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::mem;
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left,
    Right,
}

impl Dir {
    #[inline]
    fn opposite(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }

    #[inline]
    fn index(self) -> usize {
        match self {
            Dir::Left => 0,
            Dir::Right => 1,
        }
    }
}

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    parent: Option<DefaultKey>,
    children: [Option<DefaultKey>; 2],
}

/// A red-black tree keyed by `K: Ord`.
///
/// Insert, delete and lookup are O(log n); traversal yields keys in
/// ascending order.
#[derive(Clone)]
pub struct OrderedTree<K, V> {
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    root: Option<DefaultKey>,
}

impl<K, V> OrderedTree<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Drops every node. The arena keeps its allocation for reuse.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// In-order `(key, value)` pairs.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            walk: InOrder::new(&self.nodes, self.root),
            remaining: self.nodes.len(),
        }
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Values in ascending key order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// In-order `(key, &mut value)` pairs.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        // Rank every node by in-order position, then hand out the arena's
        // disjoint mutable borrows in that order.
        let mut rank: SecondaryMap<DefaultKey, usize> = SecondaryMap::with_capacity(self.nodes.len());
        for (i, (id, _)) in InOrder::new(&self.nodes, self.root).enumerate() {
            rank.insert(id, i);
        }
        let mut ordered: Vec<Option<(&K, &mut V)>> = (0..self.nodes.len()).map(|_| None).collect();
        for (id, node) in self.nodes.iter_mut() {
            ordered[rank[id]] = Some((&node.key, &mut node.value));
        }
        IterMut {
            it: ordered.into_iter(),
        }
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    fn in_order_ids(&self) -> Vec<DefaultKey> {
        InOrder::new(&self.nodes, self.root).map(|(id, _)| id).collect()
    }

    #[inline]
    fn is_red(&self, id: Option<DefaultKey>) -> bool {
        id.is_some_and(|id| self.nodes[id].color == Color::Red)
    }

    /// Which side of `parent` holds `child`.
    #[inline]
    fn side_of(&self, child: DefaultKey, parent: DefaultKey) -> Dir {
        if self.nodes[parent].children[0] == Some(child) {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    fn leftmost(&self, mut id: DefaultKey) -> DefaultKey {
        while let Some(left) = self.nodes[id].children[0] {
            id = left;
        }
        id
    }

    /// Point `parent`'s link to `old` (or the root) at `new`.
    fn replace_child(&mut self, parent: Option<DefaultKey>, old: DefaultKey, new: Option<DefaultKey>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let side = self.side_of(old, p);
                self.nodes[p].children[side.index()] = new;
            }
        }
    }

    /// Rotate the subtree rooted at `top` towards `dir`: the child on the
    /// opposite side takes `top`'s place and `top` becomes its `dir` child.
    /// Returns the new subtree root.
    fn rotate(&mut self, top: DefaultKey, dir: Dir) -> DefaultKey {
        let parent = self.nodes[top].parent;
        let pivot = self.nodes[top].children[dir.opposite().index()]
            .expect("rotation pivot must exist");
        let middle = self.nodes[pivot].children[dir.index()];

        self.nodes[top].children[dir.opposite().index()] = middle;
        if let Some(m) = middle {
            self.nodes[m].parent = Some(top);
        }
        self.replace_child(parent, top, Some(pivot));
        self.nodes[pivot].parent = parent;
        self.nodes[pivot].children[dir.index()] = Some(top);
        self.nodes[top].parent = Some(pivot);
        pivot
    }

    fn insert_fixup(&mut self, mut node: DefaultKey) {
        while let Some(mut parent) = self.nodes[node].parent {
            if self.nodes[parent].color == Color::Black {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(grand) = self.nodes[parent].parent else {
                break;
            };
            let side = self.side_of(parent, grand);
            let uncle = self.nodes[grand].children[side.opposite().index()];

            if let Some(u) = uncle.filter(|&u| self.nodes[u].color == Color::Red) {
                self.nodes[u].color = Color::Black;
                self.nodes[parent].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                node = grand;
                continue;
            }

            if self.side_of(node, parent) != side {
                // Inner grandchild: turn the zig-zag into a straight line.
                self.rotate(parent, side);
                mem::swap(&mut node, &mut parent);
            }
            self.nodes[parent].color = Color::Black;
            self.nodes[grand].color = Color::Red;
            self.rotate(grand, side.opposite());
            break;
        }
        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
    }

    /// Restore black height after a black node was unlinked. `x` took the
    /// removed node's place (possibly empty) under `parent`.
    fn delete_fixup(&mut self, mut x: Option<DefaultKey>, mut parent: Option<DefaultKey>) {
        while let Some(p) = parent {
            if self.is_red(x) {
                break;
            }
            let x_side = if self.nodes[p].children[0] == x {
                Dir::Left
            } else {
                Dir::Right
            };
            let s_side = x_side.opposite();
            let mut sibling = self.nodes[p].children[s_side.index()]
                .expect("doubly-black position always has a sibling");

            if self.nodes[sibling].color == Color::Red {
                self.nodes[sibling].color = Color::Black;
                self.nodes[p].color = Color::Red;
                self.rotate(p, x_side);
                sibling = self.nodes[p].children[s_side.index()]
                    .expect("red sibling has two black children");
            }

            let near = self.nodes[sibling].children[x_side.index()];
            let far = self.nodes[sibling].children[s_side.index()];
            if !self.is_red(near) && !self.is_red(far) {
                self.nodes[sibling].color = Color::Red;
                x = Some(p);
                parent = self.nodes[p].parent;
                continue;
            }

            if !self.is_red(far) {
                if let Some(n) = near {
                    self.nodes[n].color = Color::Black;
                }
                self.nodes[sibling].color = Color::Red;
                sibling = self.rotate(sibling, s_side);
            }

            let parent_color = self.nodes[p].color;
            self.nodes[sibling].color = parent_color;
            self.nodes[p].color = Color::Black;
            if let Some(f) = self.nodes[sibling].children[s_side.index()] {
                self.nodes[f].color = Color::Black;
            }
            self.rotate(p, x_side);
            x = self.root;
            break;
        }
        if let Some(x) = x {
            self.nodes[x].color = Color::Black;
        }
    }
}

impl<K, V> OrderedTree<K, V>
where
    K: Ord,
{
    fn find<Q>(&self, key: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.nodes[id];
            cur = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.children[0],
                Ordering::Greater => node.children[1],
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    /// Insert a new node. A present key is rejected and the tree is left
    /// untouched; use [`update`](Self::update) to replace a value.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let mut parent = None;
        let mut side = Dir::Left;
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.nodes[id];
            side = match key.cmp(&node.key) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => return Err(InsertError::DuplicateKey),
            };
            parent = Some(id);
            cur = node.children[side.index()];
        }

        let id = self.nodes.insert(Node {
            key,
            value,
            color: Color::Red,
            parent,
            children: [None, None],
        });
        match parent {
            None => self.root = Some(id),
            Some(p) => self.nodes[p].children[side.index()] = Some(id),
        }
        self.insert_fixup(id);
        Ok(())
    }

    /// Replace the value stored under `key` in place.
    ///
    /// Returns `Ok(previous)` when the key is present; otherwise hands
    /// `value` back as `Err(value)`.
    pub fn update<Q>(&mut self, key: &Q, value: V) -> Result<V, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.find(key) {
            Some(id) => Ok(mem::replace(&mut self.nodes[id].value, value)),
            None => Err(value),
        }
    }

    /// Remove `key`, returning its entry.
    ///
    /// A node with two children keeps its position: its in-order successor's
    /// entry moves into it and the successor node is unlinked instead.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let target = self.find(key)?;
        let spliced = match self.nodes[target].children {
            [Some(_), Some(right)] => self.leftmost(right),
            _ => target,
        };

        // `spliced` has at most one child.
        let node = &self.nodes[spliced];
        let child = node.children[0].or(node.children[1]);
        let parent = node.parent;
        let color = node.color;

        if let Some(c) = child {
            self.nodes[c].parent = parent;
        }
        self.replace_child(parent, spliced, child);
        let removed = self
            .nodes
            .remove(spliced)
            .expect("spliced node must be live");

        let entry = if spliced == target {
            (removed.key, removed.value)
        } else {
            let t = &mut self.nodes[target];
            (
                mem::replace(&mut t.key, removed.key),
                mem::replace(&mut t.value, removed.value),
            )
        };

        if color == Color::Black {
            self.delete_fixup(child, parent);
        }
        Some(entry)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).map(|id| &self.nodes[id].value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).map(|id| {
            let node = &self.nodes[id];
            (&node.key, &node.value)
        })
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let id = self.find(key)?;
        Some(&mut self.nodes[id].value)
    }

    /// Smallest key and its value.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.root.map(|r| {
            let node = &self.nodes[self.leftmost(r)];
            (&node.key, &node.value)
        })
    }
}

impl<K, V> Default for OrderedTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Stack-based in-order walk over the arena.
struct InOrder<'a, K, V> {
    nodes: &'a SlotMap<DefaultKey, Node<K, V>>,
    stack: Vec<DefaultKey>,
}

impl<'a, K, V> InOrder<'a, K, V> {
    fn new(nodes: &'a SlotMap<DefaultKey, Node<K, V>>, root: Option<DefaultKey>) -> Self {
        let mut walk = InOrder {
            nodes,
            stack: Vec::new(),
        };
        walk.push_left_spine(root);
        walk
    }

    fn push_left_spine(&mut self, mut cur: Option<DefaultKey>) {
        while let Some(id) = cur {
            self.stack.push(id);
            cur = self.nodes[id].children[0];
        }
    }
}

impl<'a, K, V> Iterator for InOrder<'a, K, V> {
    type Item = (DefaultKey, &'a Node<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let nodes = self.nodes;
        let node = &nodes[id];
        self.push_left_spine(node.children[1]);
        Some((id, node))
    }
}

/// Borrowing in-order iterator over an `OrderedTree`.
pub struct Iter<'a, K, V> {
    walk: InOrder<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (_, node) = self.walk.next()?;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Mutable in-order iterator over an `OrderedTree`.
pub struct IterMut<'a, K, V> {
    it: std::vec::IntoIter<Option<(&'a K, &'a mut V)>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().flatten()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning in-order iterator; consumes the tree.
pub struct IntoIter<K, V> {
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    order: std::vec::IntoIter<DefaultKey>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.order.next()?;
        self.nodes.remove(id).map(|n| (n.key, n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> IntoIterator for OrderedTree<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        let order = self.in_order_ids();
        IntoIter {
            nodes: self.nodes,
            order: order.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedTree<K, V> {
    /// Later duplicates replace earlier values.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = OrderedTree::new();
        for (k, v) in iter {
            if let Err(v) = tree.update(&k, v) {
                let _ = tree.insert(k, v);
            }
        }
        tree
    }
}

#[cfg(test)]
impl<K: Ord, V> OrderedTree<K, V> {
    /// Panics on any red-black or ordering violation; returns the black
    /// height (empty positions count as one).
    pub(crate) fn check_invariants(&self) -> usize {
        assert!(!self.is_red(self.root), "root must be black");
        if let Some(r) = self.root {
            assert_eq!(self.nodes[r].parent, None, "root has no parent");
        }
        let height = self.check_subtree(self.root);
        let keys: Vec<&K> = self.keys().collect();
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "in-order keys must be strictly increasing"
        );
        assert_eq!(keys.len(), self.len(), "every arena node is reachable");
        height
    }

    fn check_subtree(&self, id: Option<DefaultKey>) -> usize {
        let Some(id) = id else {
            return 1;
        };
        let node = &self.nodes[id];
        for child in node.children.into_iter().flatten() {
            assert_eq!(self.nodes[child].parent, Some(id), "parent link mismatch");
            if node.color == Color::Red {
                assert_eq!(self.nodes[child].color, Color::Black, "red node with red child");
            }
        }
        let left = self.check_subtree(node.children[0]);
        let right = self.check_subtree(node.children[1]);
        assert_eq!(left, right, "black height differs between subtrees");
        left + usize::from(node.color == Color::Black)
    }
}
