//! Flattened usage reports over a [`BomGraph`].

use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::EngineError;
use crate::graph::BomGraph;

const HEADER: [&str; 4] = ["Part ID", "Part Number", "Name", "Quantity"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    pub part_id: Uuid,
    pub part_number: String,
    pub name: String,
    pub qualifier: String,
    pub quantity: f64,
}

impl BomGraph {
    /// Total quantity per item id, multiplying edge quantities from the root.
    pub fn count(&self) -> BTreeMap<Uuid, f64> {
        let mut counter = BTreeMap::new();
        let mut pending = vec![(self.root, 1.0)];
        while let Some((id, multiplier)) = pending.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let total = node.qty * multiplier;
            *counter.entry(node.item).or_insert(0.0) += total;
            pending.extend(node.children.iter().map(|&child| (child, total)));
        }
        counter
    }

    /// One row per used item, ordered by qualifier.
    pub fn usage_rows(&self) -> Vec<UsageRow> {
        let mut rows: Vec<UsageRow> = self
            .count()
            .into_iter()
            .filter_map(|(id, quantity)| {
                let item = self.items.get(&id)?;
                Some(UsageRow {
                    part_id: item.id,
                    part_number: item.part_number.clone(),
                    name: item.name.clone(),
                    qualifier: item.qualifier.clone(),
                    quantity,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.qualifier.cmp(&b.qualifier));
        rows
    }
}

/// Header plus one line per row, fields joined by `separator`.
pub fn render_delimited(rows: &[UsageRow], separator: char) -> String {
    let mut out = String::new();
    push_record(&mut out, separator, HEADER.iter().map(|field| field.to_string()));
    for row in rows {
        push_record(
            &mut out,
            separator,
            [
                row.part_id.to_string(),
                row.part_number.clone(),
                row.name.clone(),
                format!("{:.2}", row.quantity),
            ]
            .into_iter(),
        );
    }
    out
}

/// Qualifier to quantity, as indented JSON.
pub fn render_json(rows: &[UsageRow]) -> Result<String, EngineError> {
    let map: BTreeMap<&str, f64> = rows
        .iter()
        .map(|row| (row.qualifier.as_str(), row.quantity))
        .collect();
    serde_json::to_string_pretty(&map).map_err(|e| EngineError::Artifact {
        path: String::new(),
        message: e.to_string(),
    })
}

fn push_record(out: &mut String, separator: char, fields: impl Iterator<Item = String>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(&quote(&field, separator));
    }
    out.push('\n');
}

fn quote(field: &str, separator: char) -> String {
    if field.contains(separator) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
