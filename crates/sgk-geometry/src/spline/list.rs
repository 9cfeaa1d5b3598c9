//! Doubly-linked list stored in a slot map arena.
//!
//! Node ids stay valid across insertions and removals of other nodes, so
//! callers can hold on to a control point while the list around it changes.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct NodeId;
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct NodeList<T> {
    nodes: SlotMap<NodeId, Node<T>>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

impl<T> Default for NodeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeList<T> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id).map(|n| &n.value)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id).map(|n| &mut n.value)
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.next
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.prev
    }

    pub fn push_back(&mut self, value: T) -> NodeId {
        let id = self.nodes.insert(Node {
            value,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    pub fn push_front(&mut self, value: T) -> NodeId {
        let id = self.nodes.insert(Node {
            value,
            prev: None,
            next: self.head,
        });
        match self.head {
            Some(head) => self.nodes[head].prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        id
    }

    /// Insert `value` directly before `at`. Returns `None` if `at` is stale.
    pub fn insert_before(&mut self, at: NodeId, value: T) -> Option<NodeId> {
        let prev = self.nodes.get(at)?.prev;
        let id = self.nodes.insert(Node {
            value,
            prev,
            next: Some(at),
        });
        self.nodes[at].prev = Some(id);
        match prev {
            Some(p) => self.nodes[p].next = Some(id),
            None => self.head = Some(id),
        }
        Some(id)
    }

    /// Insert `value` directly after `at`. Returns `None` if `at` is stale.
    pub fn insert_after(&mut self, at: NodeId, value: T) -> Option<NodeId> {
        let next = self.nodes.get(at)?.next;
        let id = self.nodes.insert(Node {
            value,
            prev: Some(at),
            next,
        });
        self.nodes[at].next = Some(id);
        match next {
            Some(n) => self.nodes[n].prev = Some(id),
            None => self.tail = Some(id),
        }
        Some(id)
    }

    /// Unlink and return the value of `id`.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let node = self.nodes.remove(id)?;
        match node.prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node.value)
    }

    /// Id of the `index`-th node from the head.
    pub fn nth_id(&self, index: usize) -> Option<NodeId> {
        self.ids().nth(index)
    }

    /// Position of `id` counted from the head.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.ids().position(|n| n == id)
    }

    /// Reverse the traversal order in place. Ids are unchanged.
    pub fn reverse(&mut self) {
        for node in self.nodes.values_mut() {
            std::mem::swap(&mut node.prev, &mut node.next);
        }
        std::mem::swap(&mut self.head, &mut self.tail);
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn ids(&self) -> NodeIds<'_, T> {
        NodeIds {
            list: self,
            current: self.head,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.ids().map(move |id| (id, &self.nodes[id].value))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<T> FromIterator<T> for NodeList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for value in iter {
            list.push_back(value);
        }
        list
    }
}

impl<T> std::ops::Index<NodeId> for NodeList<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        &self.nodes[id].value
    }
}

/// Iterator over node ids from head to tail (follows `next` links).
pub struct NodeIds<'a, T> {
    list: &'a NodeList<T>,
    current: Option<NodeId>,
}

impl<'a, T> Iterator for NodeIds<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.current?;
        self.current = self.list.next(cur);
        Some(cur)
    }
}
