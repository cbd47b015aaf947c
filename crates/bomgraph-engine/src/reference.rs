//! Carry stable identities from a previous graph onto a fresh build.
//!
//! Items align by qualifier and nodes by path: exact matches first, then
//! greedy edit-distance matching of whatever is left on each side.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use uuid::Uuid;

use crate::graph::{BomGraph, GraphItem, GraphNode};
use crate::matching::greedy_match;

impl BomGraph {
    /// A copy of `self` whose items and nodes take the ids of their
    /// counterparts in `reference`.
    ///
    /// Matched items also inherit the reference part number, authored or
    /// generated. Unmatched entities keep their ids.
    pub fn reference(&self, reference: &BomGraph) -> BomGraph {
        let item_map = align(
            self.items.values().map(|item| (item.id, item.qualifier.as_str())),
            reference.items.values().map(|item| (item.id, item.qualifier.as_str())),
            '.',
        );
        let node_map = align(
            self.nodes.values().map(|node| (node.id, node.path.as_str())),
            reference.nodes.values().map(|node| (node.id, node.path.as_str())),
            '/',
        );
        debug!(
            items = item_map.len(),
            nodes = node_map.len(),
            "aligned graph against reference"
        );

        let item_id = |id: Uuid| item_map.get(&id).copied().unwrap_or(id);
        let node_id = |id: Uuid| node_map.get(&id).copied().unwrap_or(id);

        let items: BTreeMap<Uuid, GraphItem> = self
            .items
            .values()
            .map(|item| {
                let mut copy = item.clone();
                copy.id = item_id(item.id);
                match item_map.get(&item.id).and_then(|id| reference.items.get(id)) {
                    Some(previous) => {
                        copy.part_number = previous.part_number.clone();
                        copy.part_number_generated = previous.part_number_generated;
                    }
                    None if item.part_number_generated => {
                        copy.part_number.clear();
                        copy.part_number_generated = false;
                    }
                    None => {}
                }
                (copy.id, copy)
            })
            .collect();

        let nodes: BTreeMap<Uuid, GraphNode> = self
            .nodes
            .values()
            .map(|node| {
                let copy = GraphNode {
                    id: node_id(node.id),
                    item: item_id(node.item),
                    parent: node.parent.map(node_id),
                    children: node.children.iter().copied().map(node_id).collect(),
                    ..node.clone()
                };
                (copy.id, copy)
            })
            .collect();

        let mut graph = BomGraph {
            root: node_id(self.root),
            items,
            nodes,
            usage: BTreeMap::new(),
            qualifier_index: BTreeMap::new(),
            part_number_index: BTreeMap::new(),
            path_index: BTreeMap::new(),
        };
        graph.rebuild_indices();
        graph
    }
}

/// Map current ids to reference ids by key. Each reference id is claimed
/// at most once.
fn align<'a>(
    current: impl Iterator<Item = (Uuid, &'a str)>,
    reference: impl Iterator<Item = (Uuid, &'a str)>,
    separator: char,
) -> BTreeMap<Uuid, Uuid> {
    let current: Vec<(Uuid, &str)> = current.collect();
    let reference: Vec<(Uuid, &str)> = reference.collect();
    let by_key: BTreeMap<&str, Uuid> = reference.iter().map(|&(id, key)| (key, id)).collect();

    let mut mapping = BTreeMap::new();
    let mut claimed = BTreeSet::new();
    let mut rest = Vec::new();
    for &(id, key) in &current {
        match by_key.get(key) {
            Some(&previous) if claimed.insert(previous) => {
                mapping.insert(id, previous);
            }
            _ => rest.push((id, key)),
        }
    }

    let pool: Vec<(Uuid, &str)> = reference
        .into_iter()
        .filter(|(id, _)| !claimed.contains(id))
        .collect();
    let src: Vec<Vec<String>> = rest.iter().map(|(_, key)| tokenize(key, separator)).collect();
    let dst: Vec<Vec<String>> = pool.iter().map(|(_, key)| tokenize(key, separator)).collect();
    for (s, d) in greedy_match(&src, &dst) {
        mapping.insert(rest[s].0, pool[d].0);
    }
    mapping
}

fn tokenize(key: &str, separator: char) -> Vec<String> {
    key.split(separator)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
