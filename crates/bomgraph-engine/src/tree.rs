//! The BOM tree: one root item expanded through chosen recipes.
//!
//! Nodes live in an arena; index 0 is the root. Quantities are per edge
//! and are only multiplied together when counting.

use bomgraph_core::{CoItem, CoProcess, Item, Process};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub type NodeIndex = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub item: Item,
    pub co_item: CoItem,
    /// Recipe turning `item` into `co_item`; `None` for a dangling co-item.
    pub co_process: Option<CoProcess>,
    /// Recipe producing `item`; `None` for raw or purchased items.
    pub process: Option<Process>,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    /// `/root/child/...` by item name; repeated sibling names get `#n`.
    pub path: String,
    /// Quantity per one parent.
    pub qty: f64,
    pub role: String,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BomTree {
    nodes: Vec<Node>,
}

impl BomTree {
    pub(crate) fn push(&mut self, node: Node) -> NodeIndex {
        let index = self.nodes.len();
        if let Some(parent) = node.parent {
            self.nodes[parent].children.push(index);
        }
        self.nodes.push(node);
        index
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Nodes in pre-order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Flattened usage: total quantity per item qualifier.
    ///
    /// Assemblies count as themselves as well as through their children.
    pub fn count(&self) -> BTreeMap<String, f64> {
        let mut counter = BTreeMap::new();
        if let Some(root) = self.root() {
            self.count_into(0, root.qty, &mut counter);
        }
        counter
    }

    fn count_into(&self, index: NodeIndex, multiplier: f64, counter: &mut BTreeMap<String, f64>) {
        let node = &self.nodes[index];
        *counter.entry(node.item.qualifier.clone()).or_insert(0.0) += multiplier;
        for &child in &node.children {
            self.count_into(child, self.nodes[child].qty * multiplier, counter);
        }
    }

    /// `parent-digest:child-digest` lines, one per edge, in pre-order.
    pub fn export(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            if let Some(parent) = node.parent {
                let _ = writeln!(out, "{}:{}", self.nodes[parent].item.digest, node.item.digest);
            }
        }
        out
    }

    /// Indented text, two spaces per level.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.nodes.is_empty() {
            self.render_into(0, 0, &mut out);
        }
        out
    }

    fn render_into(&self, index: NodeIndex, depth: usize, out: &mut String) {
        let node = &self.nodes[index];
        let _ = write!(out, "{}{} x{}", "  ".repeat(depth), node.item.qualifier, node.qty);
        if !node.role.is_empty() {
            let _ = write!(out, " [{}]", node.role);
        }
        out.push('\n');
        for &child in &node.children {
            self.render_into(child, depth + 1, out);
        }
    }
}
