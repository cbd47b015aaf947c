//! Expand a root item into a [`BomTree`] by ranked recipe selection.

use bomgraph_catalog::Catalog;
use bomgraph_core::{CoItem, Digest, Item};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::compile::single_co_item;
use crate::error::EngineError;
use crate::ranker::Ranker;
use crate::tree::{BomTree, Node, NodeIndex};

pub struct Builder<'a> {
    catalog: &'a Catalog,
    ranker: &'a dyn Ranker,
}

impl<'a> Builder<'a> {
    pub fn new(catalog: &'a Catalog, ranker: &'a dyn Ranker) -> Self {
        Self { catalog, ranker }
    }

    /// Build the tree rooted at `root`.
    ///
    /// Missing recipes end a branch. An item whose expansion needs itself
    /// fails with [`EngineError::CyclicProduction`].
    pub fn build(&self, root: &Digest) -> Result<BomTree, EngineError> {
        let item = self.catalog.get_item(root)?;
        let co_item = self.catalog.get_co_item(&single_co_item(self.catalog, &item)?)?;
        let mut tree = BomTree::default();
        let mut stack = Vec::new();
        self.expand(&mut tree, &mut stack, co_item, None, 1.0, String::new())?;
        Ok(tree)
    }

    fn expand(
        &self,
        tree: &mut BomTree,
        stack: &mut Vec<Digest>,
        co_item: CoItem,
        parent: Option<NodeIndex>,
        qty: f64,
        role: String,
    ) -> Result<(), EngineError> {
        let co_processes = self.catalog.get_item_co_processes(&co_item.digest)?;
        if co_processes.len() > 1 {
            warn!(
                qualifier = %co_item.qualifier,
                candidates = co_processes.len(),
                "multiple co-processes produce co-item; ranking"
            );
        }
        let co_process = if co_processes.is_empty() {
            info!(qualifier = %co_item.qualifier, "no co-process produces co-item");
            None
        } else {
            Some(self.ranker.top_co_process(co_processes)?)
        };

        let item_digest = match &co_process {
            Some(co_process) => match co_process.input.as_slice() {
                [line] => line.item.clone(),
                inputs => {
                    return Err(EngineError::Unsupported(format!(
                        "co-process `{}` has {} inputs",
                        co_process.qualifier,
                        inputs.len()
                    )));
                }
            },
            None => co_item.item.clone(),
        };
        let item = self.catalog.get_item(&item_digest)?;
        if stack.contains(&item.digest) {
            return Err(EngineError::CyclicProduction(item.qualifier));
        }

        let processes = self.catalog.get_item_processes(&item.digest)?;
        let process = if co_process.is_none() {
            None
        } else if processes.is_empty() {
            info!(qualifier = %item.qualifier, "no process produces item");
            None
        } else {
            if processes.len() > 1 {
                warn!(
                    qualifier = %item.qualifier,
                    candidates = processes.len(),
                    "multiple processes produce item; ranking"
                );
            }
            Some(self.ranker.top_process(processes)?)
        };

        let path = match parent {
            Some(parent) => child_path(tree, parent, &item),
            None => format!("/{}", item.content.name),
        };
        let index = tree.push(Node {
            item: item.clone(),
            co_item,
            co_process,
            process: process.clone(),
            parent,
            children: Vec::new(),
            path,
            qty,
            role,
        });

        let Some(process) = process else {
            return Ok(());
        };
        stack.push(item.digest.clone());
        for line in &process.input {
            let child = self.catalog.get_co_item(&line.item)?;
            self.expand(tree, stack, child, Some(index), line.qty, line.role.clone())?;
        }
        stack.pop();
        Ok(())
    }
}

/// Parent path plus the child's item name, with `#n` on repeated names.
fn child_path(tree: &BomTree, parent: NodeIndex, item: &Item) -> String {
    let Some(parent) = tree.node(parent) else {
        return format!("/{}", item.content.name);
    };
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for &sibling in &parent.children {
        if let Some(node) = tree.node(sibling) {
            *seen.entry(node.item.content.name.as_str()).or_default() += 1;
        }
    }
    match seen.get(item.content.name.as_str()) {
        Some(count) => format!("{}/{}#{}", parent.path, item.content.name, count + 1),
        None => format!("{}/{}", parent.path, item.content.name),
    }
}
