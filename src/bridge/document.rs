//! The slice of the page DOM the script-tag transport touches.

use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Handle to an element of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub usize);

pub trait Document: Send + Sync + 'static {
    /// Create a detached `<script src=..>` element.
    fn create_script(&self, src: &str) -> ElementId;

    /// First script element in document order.
    fn first_script(&self) -> Option<ElementId>;

    fn head(&self) -> Option<ElementId>;

    /// Insert `element` as the previous sibling of `reference`.
    fn insert_before(&self, element: ElementId, reference: ElementId) -> bool;

    fn append_child(&self, parent: ElementId, element: ElementId) -> bool;

    /// Detach and destroy `element`. Unknown ids are ignored.
    fn remove(&self, element: ElementId);
}

// ============================================
// IN-MEMORY DOCUMENT
// ============================================

struct Node {
    tag: &'static str,
    src: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

struct Tree {
    nodes: HashMap<ElementId, Node>,
    next_id: usize,
    root: ElementId,
    head: Option<ElementId>,
    body: ElementId,
}

impl Tree {
    fn alloc(&mut self, tag: &'static str, src: Option<String>) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                tag,
                src,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    fn attach(&mut self, parent: ElementId, child: ElementId, index: Option<usize>) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            match index {
                Some(i) => node.children.insert(i, child),
                None => node.children.push(child),
            }
        }
    }

    /// Elements in document order (pre-order from the root)
    fn walk(&self) -> Vec<ElementId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    fn is_connected(&self, mut id: ElementId) -> bool {
        loop {
            if id == self.root {
                return true;
            }
            match self.nodes.get(&id).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }
}

/// Arena-backed document for tests and the developer binary.
///
/// Connecting a script element "loads" it: its `src` is published on the
/// [`requests`](MemoryDocument::requests) channel, which is what a host
/// intercepting the page's requests observes.
pub struct MemoryDocument {
    tree: Mutex<Tree>,
    loads_tx: Sender<String>,
    loads_rx: Receiver<String>,
}

impl MemoryDocument {
    /// `<html><head></head><body></body></html>`
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A document without `<head>`, for exercising insertion failures.
    pub fn without_head() -> Self {
        Self::build(false)
    }

    fn build(with_head: bool) -> Self {
        let mut tree = Tree {
            nodes: HashMap::new(),
            next_id: 0,
            root: ElementId(0),
            head: None,
            body: ElementId(0),
        };
        let root = tree.alloc("html", None);
        tree.root = root;
        if with_head {
            let head = tree.alloc("head", None);
            tree.attach(root, head, None);
            tree.head = Some(head);
        }
        let body = tree.alloc("body", None);
        tree.attach(root, body, None);
        tree.body = body;

        let (loads_tx, loads_rx) = async_channel::unbounded();
        Self {
            tree: Mutex::new(tree),
            loads_tx,
            loads_rx,
        }
    }

    /// Add one of the page's own scripts to `<body>`. Page scripts are
    /// considered loaded already and do not reach the host.
    pub fn add_page_script(&self, src: &str) -> ElementId {
        let mut tree = self.tree.lock();
        let id = tree.alloc("script", Some(src.to_string()));
        let body = tree.body;
        tree.attach(body, id, None);
        id
    }

    /// URLs of script elements loaded by the page, in load order.
    pub fn requests(&self) -> Receiver<String> {
        self.loads_rx.clone()
    }

    /// `src` of every connected script, in document order.
    pub fn script_srcs(&self) -> Vec<String> {
        let tree = self.tree.lock();
        tree.walk()
            .into_iter()
            .filter_map(|id| tree.nodes.get(&id))
            .filter(|node| node.tag == "script")
            .filter_map(|node| node.src.clone())
            .collect()
    }

    pub fn script_count(&self) -> usize {
        let tree = self.tree.lock();
        tree.nodes.values().filter(|node| node.tag == "script").count()
    }

    fn load(&self, element: ElementId) {
        let src = {
            let tree = self.tree.lock();
            tree.nodes.get(&element).and_then(|n| n.src.clone())
        };
        if let Some(src) = src {
            // We hold a receiver, so the channel never closes
            let _ = self.loads_tx.try_send(src);
        }
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn create_script(&self, src: &str) -> ElementId {
        self.tree.lock().alloc("script", Some(src.to_string()))
    }

    fn first_script(&self) -> Option<ElementId> {
        let tree = self.tree.lock();
        tree.walk()
            .into_iter()
            .find(|id| tree.nodes.get(id).is_some_and(|n| n.tag == "script"))
    }

    fn head(&self) -> Option<ElementId> {
        self.tree.lock().head
    }

    fn insert_before(&self, element: ElementId, reference: ElementId) -> bool {
        {
            let mut tree = self.tree.lock();
            let Some(parent) = tree.nodes.get(&reference).and_then(|n| n.parent) else {
                return false;
            };
            let Some(index) = tree
                .nodes
                .get(&parent)
                .and_then(|p| p.children.iter().position(|c| *c == reference))
            else {
                return false;
            };
            tree.attach(parent, element, Some(index));
            if !tree.is_connected(element) {
                return true;
            }
        }
        self.load(element);
        true
    }

    fn append_child(&self, parent: ElementId, element: ElementId) -> bool {
        {
            let mut tree = self.tree.lock();
            if !tree.nodes.contains_key(&parent) {
                return false;
            }
            tree.attach(parent, element, None);
            if !tree.is_connected(element) {
                return true;
            }
        }
        self.load(element);
        true
    }

    fn remove(&self, element: ElementId) {
        let mut tree = self.tree.lock();
        if element == tree.root {
            return;
        }
        let Some(node) = tree.nodes.remove(&element) else {
            return;
        };
        if let Some(parent) = node.parent.and_then(|p| tree.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != element);
        }
        let mut orphans = node.children;
        while let Some(id) = orphans.pop() {
            if let Some(child) = tree.nodes.remove(&id) {
                orphans.extend(child.children);
            }
        }
    }
}
