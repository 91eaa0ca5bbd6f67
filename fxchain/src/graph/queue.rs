//! Execution queue: a singly linked FIFO of node handles in pooled links.
//!
//! The queue is built once per graph and doubles as the breadth-first
//! frontier while it is being built: the scheduler walks it with a cursor
//! while appending behind the tail. Afterwards it is only read.

use crate::pool::{LinkHandle, LinkPool, NodeHandle};

/// One pooled queue entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueLink {
    pub(crate) node: Option<NodeHandle>,
    pub(crate) next: Option<LinkHandle>,
}

impl QueueLink {
    /// Node this entry schedules.
    pub fn node(&self) -> Option<NodeHandle> {
        self.node
    }

    /// Following entry.
    pub fn next(&self) -> Option<LinkHandle> {
        self.next
    }
}

/// Fixed visitation order of a built graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutionQueue {
    head: Option<LinkHandle>,
    tail: Option<LinkHandle>,
    len: usize,
}

impl ExecutionQueue {
    /// An empty queue.
    pub const fn new() -> Self {
        ExecutionQueue {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// First entry.
    pub fn head(&self) -> Option<LinkHandle> {
        self.head
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append `node`. `None` if the link pool is exhausted; the queue is
    /// unchanged in that case.
    pub fn push(&mut self, links: &mut LinkPool, node: NodeHandle) -> Option<LinkHandle> {
        let link = links.acquire(QueueLink {
            node: Some(node),
            next: None,
        })?;
        match self.tail {
            Some(tail) => links.get_mut(tail).next = Some(link),
            None => self.head = Some(link),
        }
        self.tail = Some(link);
        self.len += 1;
        Some(link)
    }

    /// Nodes in execution order.
    pub fn iter<'a>(&self, links: &'a LinkPool) -> Iter<'a> {
        Iter {
            links,
            cursor: self.head,
        }
    }

    /// Return every link to the pool and empty the queue.
    pub fn release(&mut self, links: &mut LinkPool) {
        let mut cursor = self.head;
        while let Some(link) = cursor {
            cursor = links.get(link).next;
            links.release(link);
        }
        *self = ExecutionQueue::new();
    }
}

/// Iterator over the scheduled nodes of an [`ExecutionQueue`].
pub struct Iter<'a> {
    links: &'a LinkPool,
    cursor: Option<LinkHandle>,
}

impl Iterator for Iter<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        loop {
            let link = self.links.get(self.cursor?);
            self.cursor = link.next;
            if let Some(node) = link.node {
                return Some(node);
            }
        }
    }
}
