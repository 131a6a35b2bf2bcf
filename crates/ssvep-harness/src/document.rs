#![forbid(unsafe_code)]

//! In-memory document.
//!
//! Nodes live in an arena and are never freed; removing a node only detaches
//! it, so stale handles stay valid for assertions. Every child-list change
//! is recorded as a [`MutationNote`] that [`FakeDocument::take_mutations`]
//! drains.

use ssvep_core::{DocumentHost, ElementInfo, HostError, MutationNote, Period, Positioning, Rect};

/// Handle to a node of a [`FakeDocument`]. Equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    label: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Rect,
    click_handler: bool,
    tab_index: bool,
    position: Positioning,
    inline_relative: bool,
    border_period: Option<Period>,
    /// Set only on engine overlay nodes.
    overlay_period: Option<Period>,
    fail_inspect: bool,
    fail_overlay: bool,
}

impl Node {
    fn new(tag: &str, label: String, parent: Option<NodeId>, rect: Rect) -> Self {
        Self {
            tag: tag.to_string(),
            label,
            parent,
            children: Vec::new(),
            rect,
            click_handler: false,
            tab_index: false,
            position: Positioning::Static,
            inline_relative: false,
            border_period: None,
            overlay_period: None,
            fail_inspect: false,
            fail_overlay: false,
        }
    }

    fn is_overlay(&self) -> bool {
        self.overlay_period.is_some()
    }
}

/// A document tree with a viewport.
#[derive(Debug, Clone)]
pub struct FakeDocument {
    nodes: Vec<Node>,
    viewport: Rect,
    mutations: MutationNote,
}

impl FakeDocument {
    /// Empty document with a `body` filling a `width` x `height` viewport.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let viewport = Rect::from_size(width, height);
        Self {
            nodes: vec![Node::new("body", "body".to_string(), None, viewport)],
            viewport,
            mutations: MutationNote::default(),
        }
    }

    /// Document holding `count` buttons labelled `B1..` laid out in rows
    /// inside an 800 x 600 viewport.
    #[must_use]
    pub fn with_buttons(count: usize) -> (Self, Vec<NodeId>) {
        let mut doc = Self::new(800.0, 600.0);
        let buttons = (0..count).map(|i| doc.add_button(i)).collect();
        doc.take_mutations();
        (doc, buttons)
    }

    #[must_use]
    pub fn body(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a labelled element under `parent`.
    pub fn append(&mut self, parent: NodeId, tag: &str, label: &str, rect: Rect) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Node::new(tag, label.to_string(), Some(parent), rect));
        self.nodes[parent.0].children.push(id);
        if self.is_connected(parent) {
            self.mutations.merge(MutationNote {
                engine_nodes: 0,
                foreign_nodes: 1,
            });
        }
        id
    }

    /// Append a labelled element under `body`.
    pub fn add(&mut self, tag: &str, label: &str, rect: Rect) -> NodeId {
        self.append(self.body(), tag, label, rect)
    }

    /// Append button `B{index + 1}` on a 10-per-row grid of 60 x 30 cells.
    pub fn add_button(&mut self, index: usize) -> NodeId {
        let col = (index % 10) as f64;
        let row = (index / 10) as f64;
        let rect = Rect::new(10.0 + col * 60.0, 10.0 + row * 30.0, 50.0, 20.0);
        self.add("button", &format!("B{}", index + 1), rect)
    }

    /// Detach `id` (and its subtree) from its parent.
    pub fn remove(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        let connected = self.is_connected(parent);
        self.nodes[parent.0].children.retain(|&c| c != id);
        if connected {
            let note = if self.nodes[id.0].is_overlay() {
                MutationNote {
                    engine_nodes: 1,
                    foreign_nodes: 0,
                }
            } else {
                MutationNote {
                    engine_nodes: 0,
                    foreign_nodes: 1,
                }
            };
            self.mutations.merge(note);
        }
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
        self.nodes[id.0].rect = rect;
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    pub fn set_click_handler(&mut self, id: NodeId, present: bool) {
        self.nodes[id.0].click_handler = present;
    }

    pub fn set_tab_index(&mut self, id: NodeId, present: bool) {
        self.nodes[id.0].tab_index = present;
    }

    /// Set the computed positioning the element reports.
    pub fn set_position(&mut self, id: NodeId, position: Positioning) {
        self.nodes[id.0].position = position;
    }

    /// Make every later `inspect` of `id` fail.
    pub fn fail_inspect(&mut self, id: NodeId) {
        self.nodes[id.0].fail_inspect = true;
    }

    /// Make every later `attach_overlay` on `id` fail.
    pub fn fail_overlay(&mut self, id: NodeId) {
        self.nodes[id.0].fail_overlay = true;
    }

    // -- Queries ---------------------------------------------------------------

    /// Whether `id` is reachable from `body`.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut cursor = id;
        loop {
            if cursor == self.body() {
                return true;
            }
            match self.nodes[cursor.0].parent {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    #[must_use]
    pub fn label(&self, id: NodeId) -> &str {
        &self.nodes[id.0].label
    }

    /// Border period if the element carries the engine's border mark.
    #[must_use]
    pub fn border_period(&self, id: NodeId) -> Option<Period> {
        self.nodes[id.0].border_period
    }

    #[must_use]
    pub fn is_marked(&self, id: NodeId) -> bool {
        self.nodes[id.0].border_period.is_some()
    }

    /// Periods of the engine overlays attached to `id`.
    #[must_use]
    pub fn overlays(&self, id: NodeId) -> Vec<Period> {
        self.nodes[id.0]
            .children
            .iter()
            .filter_map(|c| self.nodes[c.0].overlay_period)
            .collect()
    }

    /// Whether the engine set inline `position: relative`.
    #[must_use]
    pub fn is_promoted(&self, id: NodeId) -> bool {
        self.nodes[id.0].inline_relative
    }

    /// Connected non-overlay nodes in document order.
    #[must_use]
    pub fn connected_elements(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| !self.nodes[id.0].is_overlay())
            .collect()
    }

    /// Connected elements carrying a mark or an overlay, in document order.
    #[must_use]
    pub fn marked_elements(&self) -> Vec<NodeId> {
        self.connected_elements()
            .into_iter()
            .filter(|&id| self.is_marked(id) || !self.overlays(id).is_empty())
            .collect()
    }

    /// Drain the child-list changes recorded since the last call.
    pub fn take_mutations(&mut self) -> MutationNote {
        std::mem::take(&mut self.mutations)
    }

    fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.body()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    fn connected(&self, id: NodeId) -> Result<&Node, HostError> {
        if self.is_connected(id) {
            Ok(&self.nodes[id.0])
        } else {
            Err(HostError::Detached)
        }
    }
}

impl DocumentHost for FakeDocument {
    type Element = NodeId;

    fn elements(&self) -> Vec<NodeId> {
        self.preorder()
    }

    fn viewport(&self) -> Rect {
        self.viewport
    }

    fn inspect(&self, element: &NodeId) -> Result<ElementInfo, HostError> {
        let node = self.connected(*element)?;
        if node.fail_inspect {
            return Err(HostError::Js("getBoundingClientRect threw".to_string()));
        }
        Ok(ElementInfo {
            tag: node.tag.clone(),
            has_click_handler: node.click_handler,
            has_tab_index: node.tab_index,
            rect: node.rect,
        })
    }

    fn decorated(&self) -> Vec<NodeId> {
        self.marked_elements()
    }

    fn strip(&mut self, element: &NodeId) -> Result<(), HostError> {
        self.nodes[element.0].border_period = None;
        let overlays: Vec<NodeId> = self.nodes[element.0]
            .children
            .iter()
            .copied()
            .filter(|c| self.nodes[c.0].is_overlay())
            .collect();
        for overlay in overlays {
            self.remove(overlay);
        }
        Ok(())
    }

    fn mark_border(&mut self, element: &NodeId, period: Period) -> Result<(), HostError> {
        self.connected(*element)?;
        self.nodes[element.0].border_period = Some(period);
        Ok(())
    }

    fn positioning(&self, element: &NodeId) -> Result<Positioning, HostError> {
        let node = self.connected(*element)?;
        Ok(if node.inline_relative {
            Positioning::Relative
        } else {
            node.position
        })
    }

    fn promote_relative(&mut self, element: &NodeId) -> Result<(), HostError> {
        self.connected(*element)?;
        self.nodes[element.0].inline_relative = true;
        Ok(())
    }

    fn attach_overlay(&mut self, element: &NodeId, period: Period) -> Result<(), HostError> {
        let node = self.connected(*element)?;
        if node.fail_overlay {
            return Err(HostError::Detached);
        }
        let rect = node.rect;
        let id = NodeId(self.nodes.len());
        let mut overlay = Node::new("div", "overlay".to_string(), Some(*element), rect);
        overlay.overlay_period = Some(period);
        self.nodes.push(overlay);
        self.nodes[element.0].children.push(id);
        self.mutations.merge(MutationNote {
            engine_nodes: 1,
            foreign_nodes: 0,
        });
        Ok(())
    }

    fn describe(&self, element: &NodeId) -> String {
        self.nodes[element.0].label.clone()
    }
}
