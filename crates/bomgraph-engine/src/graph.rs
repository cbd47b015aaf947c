//! The persisted form of a built tree.
//!
//! Items and nodes get uuid identities. Digests say what an entity is;
//! ids say which entity it is across rebuilds, and are carried forward by
//! [`BomGraph::reference`](crate::reference).

use bomgraph_catalog::atomic::atomic_write;
use bomgraph_core::Digest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::error::EngineError;
use crate::tree::BomTree;

/// Characters outside the hex alphabet, used to split part-number clashes.
const PART_NUMBER_SUFFIXES: &str = "ghijklmnopqrstuvwxyz";

const ARTIFACT_MODE: u32 = 0o644;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphItem {
    pub id: Uuid,
    pub digest: Digest,
    pub qualifier: String,
    pub name: String,
    #[serde(default)]
    pub part_number: String,
    /// Set when `part_number` was generated rather than authored.
    #[serde(default)]
    pub part_number_generated: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: Uuid,
    pub item: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uuid>,
    #[serde(default)]
    pub children: Vec<Uuid>,
    pub path: String,
    pub qty: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<Digest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomGraph {
    /// Root node id.
    pub root: Uuid,
    pub items: BTreeMap<Uuid, GraphItem>,
    pub nodes: BTreeMap<Uuid, GraphNode>,
    /// Item id to the ids of nodes using it, sorted.
    pub usage: BTreeMap<Uuid, Vec<Uuid>>,
    #[serde(default)]
    pub qualifier_index: BTreeMap<String, Uuid>,
    #[serde(default)]
    pub part_number_index: BTreeMap<String, Uuid>,
    #[serde(default)]
    pub path_index: BTreeMap<String, Uuid>,
}

impl BomGraph {
    /// Assign fresh ids to a built tree. Items are shared by digest.
    pub fn from_tree(tree: &BomTree) -> Result<Self, EngineError> {
        let mut items: BTreeMap<Uuid, GraphItem> = BTreeMap::new();
        let mut by_digest: BTreeMap<Digest, Uuid> = BTreeMap::new();
        let node_ids: Vec<Uuid> = tree.nodes().iter().map(|_| Uuid::new_v4()).collect();
        let mut nodes = BTreeMap::new();

        for (index, node) in tree.nodes().iter().enumerate() {
            let item_id = *by_digest.entry(node.item.digest.clone()).or_insert_with(|| {
                let id = Uuid::new_v4();
                items.insert(
                    id,
                    GraphItem {
                        id,
                        digest: node.item.digest.clone(),
                        qualifier: node.item.qualifier.clone(),
                        name: node.item.content.name.clone(),
                        part_number: node.item.content.part_number.clone(),
                        part_number_generated: false,
                        source: node.item.content.source.clone(),
                    },
                );
                id
            });
            let id = node_ids[index];
            nodes.insert(
                id,
                GraphNode {
                    id,
                    item: item_id,
                    parent: node.parent.map(|parent| node_ids[parent]),
                    children: node.children.iter().map(|&child| node_ids[child]).collect(),
                    path: node.path.clone(),
                    qty: node.qty,
                    role: node.role.clone(),
                    process: node.process.as_ref().map(|p| p.digest.clone()),
                },
            );
        }

        let root = *node_ids
            .first()
            .ok_or_else(|| EngineError::NotFound("empty tree".to_string()))?;
        let mut graph = Self {
            root,
            items,
            nodes,
            usage: BTreeMap::new(),
            qualifier_index: BTreeMap::new(),
            part_number_index: BTreeMap::new(),
            path_index: BTreeMap::new(),
        };
        graph.rebuild_indices();
        Ok(graph)
    }

    /// Recompute usage and the three lookup indices from items and nodes.
    ///
    /// Items without a part number get one generated from their id.
    pub fn rebuild_indices(&mut self) {
        self.usage.clear();
        for node in self.nodes.values() {
            self.usage.entry(node.item).or_default().push(node.id);
        }
        for ids in self.usage.values_mut() {
            ids.sort();
        }

        self.qualifier_index = self
            .items
            .values()
            .map(|item| (item.qualifier.clone(), item.id))
            .collect();
        self.path_index = self
            .nodes
            .values()
            .map(|node| (node.path.clone(), node.id))
            .collect();

        self.part_number_index.clear();
        for item in self.items.values() {
            if !item.part_number.is_empty() {
                self.part_number_index.insert(item.part_number.clone(), item.id);
            }
        }
        let pending: Vec<Uuid> = self
            .items
            .values()
            .filter(|item| item.part_number.is_empty())
            .map(|item| item.id)
            .collect();
        for id in pending {
            let part_number = generate_part_number(&self.part_number_index, id);
            self.part_number_index.insert(part_number.clone(), id);
            if let Some(item) = self.items.get_mut(&id) {
                item.part_number = part_number;
                item.part_number_generated = true;
            }
        }
    }

    pub fn root_node(&self) -> Option<&GraphNode> {
        self.nodes.get(&self.root)
    }

    pub fn item_by_qualifier(&self, qualifier: &str) -> Option<&GraphItem> {
        self.qualifier_index
            .get(qualifier)
            .and_then(|id| self.items.get(id))
    }

    pub fn node_by_path(&self, path: &str) -> Option<&GraphNode> {
        self.path_index.get(path).and_then(|id| self.nodes.get(id))
    }

    pub fn to_json_pretty(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Artifact {
            path: String::new(),
            message: e.to_string(),
        })
    }

    /// Write the graph as indented JSON, replacing `path` atomically.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        let mut rendered = self.to_json_pretty()?;
        rendered.push('\n');
        atomic_write(path, rendered.as_bytes(), ARTIFACT_MODE)?;
        Ok(())
    }

    /// Read a saved graph. Indices are rebuilt rather than trusted.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let artifact_error = |message: String| EngineError::Artifact {
            path: path.display().to_string(),
            message,
        };
        let raw = fs::read_to_string(path).map_err(|e| artifact_error(e.to_string()))?;
        let mut graph: Self = serde_json::from_str(&raw).map_err(|e| artifact_error(e.to_string()))?;
        graph.rebuild_indices();
        Ok(graph)
    }
}

/// First uuid segment, or that segment with its last character swapped for
/// a non-hex suffix when another item already holds it.
pub fn generate_part_number(index: &BTreeMap<String, Uuid>, id: Uuid) -> String {
    let rendered = id.to_string();
    let short = rendered.split('-').next().unwrap_or(&rendered).to_string();
    match index.get(&short) {
        Some(existing) if *existing != id => {
            let stem = &short[..short.len() - 1];
            for suffix in PART_NUMBER_SUFFIXES.chars() {
                let candidate = format!("{stem}{suffix}");
                match index.get(&candidate) {
                    Some(existing) if *existing != id => continue,
                    _ => return candidate,
                }
            }
            short
        }
        _ => short,
    }
}
