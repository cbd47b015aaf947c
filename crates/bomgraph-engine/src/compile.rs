//! Block-to-symbol compilation.
//!
//! Blocks are compiled on demand and memoized by [`SymbolId`]: the first
//! request compiles the block (recursively compiling whatever it
//! references) and writes the result through [`Catalog::add`]; later
//! requests hit the cache. Compiling an item also synthesizes its co-item,
//! its co-process, and, when it lists components, its implicit process.

use bomgraph_catalog::Catalog;
use bomgraph_core::{
    BomLine, CoItem, CoProcess, Companion, Contract, DEFAULT_ROLE, Derivation, DerivationKind,
    Digest, FileReference, Item, ItemContent, Process, Symbol, companion_qualifier,
};
use bomgraph_source::{Block, SourceError, SymbolId, SymbolTable, Value, qualify};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::EngineError;

/// Prefix marking a file reference in an item's `ref` attribute.
pub const FILE_REF_PREFIX: &str = "file:";

/// One `{ role, ref, qty }` entry before resolution.
#[derive(Debug, Clone, PartialEq)]
struct LineSpec {
    role: String,
    reference: Vec<String>,
    qty: f64,
}

/// Compiles raw blocks from a [`SymbolTable`] into a [`Catalog`].
pub struct Compiler<'a> {
    table: &'a SymbolTable,
    catalog: &'a mut Catalog,
    cache: BTreeMap<SymbolId, Digest>,
    in_progress: BTreeSet<SymbolId>,
}

impl<'a> Compiler<'a> {
    pub fn new(table: &'a SymbolTable, catalog: &'a mut Catalog) -> Self {
        Self {
            table,
            catalog,
            cache: BTreeMap::new(),
            in_progress: BTreeSet::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &*self.catalog
    }

    /// Compile every block, in module load order then declaration order.
    pub fn compile_all(&mut self) -> Result<Vec<Digest>, EngineError> {
        self.table
            .blocks()
            .into_iter()
            .map(|id| self.compile(id))
            .collect()
    }

    /// Compile one block, or return its cached digest.
    pub fn compile(&mut self, id: SymbolId) -> Result<Digest, EngineError> {
        if let Some(digest) = self.cache.get(&id) {
            return Ok(digest.clone());
        }
        let table = self.table;
        let qualifier = table
            .qualifier(id)
            .ok_or_else(|| EngineError::NotFound(format!("symbol {id:?}")))?;
        let block = table
            .block(id)
            .ok_or_else(|| EngineError::NotFound(format!("`{qualifier}` is not a block")))?;
        if !self.in_progress.insert(id) {
            return Err(EngineError::CyclicReference(qualifier));
        }

        let module = table.module_path(id.module).to_string();
        let result = match block.kind.as_str() {
            "item" => self.compile_item(&module, &qualifier, block),
            "process" => self.compile_process(&module, &qualifier, block),
            "contract" => self.compile_contract(&qualifier, block),
            other => Err(invalid(&qualifier, format!("cannot compile `{other}` block"))),
        };
        self.in_progress.remove(&id);

        let digest = result?;
        self.cache.insert(id, digest.clone());
        Ok(digest)
    }

    /// Resolve a dotted reference from `module` to a digest.
    ///
    /// Sources win: the reference is looked up in the symbol table and
    /// compiled on demand. Only names the sources do not declare fall back
    /// to the catalog's qualifier index.
    pub fn resolve(&mut self, module: &str, path: &[String]) -> Result<Digest, EngineError> {
        match self.table.resolve(module, path) {
            Ok(id) => self.compile(id),
            Err(SourceError::Unresolved { .. }) => {
                let qualifier = qualify(module, &path.join("."));
                self.catalog
                    .find_digest(&qualifier)
                    .cloned()
                    .ok_or(EngineError::NotFound(qualifier))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Resolve a reference that must name an item.
    pub fn resolve_item(&mut self, module: &str, path: &[String]) -> Result<Item, EngineError> {
        let digest = self.resolve(module, path)?;
        Ok(self.catalog.get_item(&digest)?)
    }

    /// The single co-item of an item.
    pub fn co_item_of(&self, item: &Item) -> Result<Digest, EngineError> {
        single_co_item(self.catalog, item)
    }

    fn compile_item(
        &mut self,
        module: &str,
        qualifier: &str,
        block: &Block,
    ) -> Result<Digest, EngineError> {
        let name = block.name().unwrap_or_default().to_string();

        let require = self.resolve_contracts(module, qualifier, block, "require")?;
        let implement = self.resolve_contracts(module, qualifier, block, "implement")?;
        let derivation = self.resolve_derivation(module, qualifier, block)?;

        let mut inputs = Vec::new();
        for line in line_specs(qualifier, block, "from")? {
            let component = self.resolve_item(module, &line.reference)?;
            let co_item = self.co_item_of(&component)?;
            inputs.push(BomLine::new(line.role, co_item, line.qty));
        }

        let item = Item {
            qualifier: qualifier.to_string(),
            content: ItemContent {
                name,
                source: block.str_attr("source").unwrap_or_default().to_string(),
                part_number: block.str_attr("part_number").unwrap_or_default().to_string(),
                references: file_references(qualifier, block)?,
                details: details(qualifier, block)?,
            },
            derivation,
            require,
            implement,
            ..Item::default()
        };
        let item_digest = self.catalog.add(&Symbol::from(item))?;

        let co_item_digest = self.catalog.add(&Symbol::from(CoItem {
            qualifier: companion_qualifier(qualifier, Companion::CoItem),
            item: item_digest.clone(),
            ..CoItem::default()
        }))?;
        self.catalog.add(&Symbol::from(CoProcess {
            qualifier: companion_qualifier(qualifier, Companion::CoProcess),
            input: vec![BomLine::new(DEFAULT_ROLE, item_digest.clone(), 1.0)],
            output: vec![BomLine::new(DEFAULT_ROLE, co_item_digest, 1.0)],
            ..CoProcess::default()
        }))?;
        debug!(qualifier, %item_digest, "synthesized co-item and co-process");

        if !inputs.is_empty() {
            let process = self.catalog.add(&Symbol::from(Process {
                qualifier: companion_qualifier(qualifier, Companion::Process),
                input: inputs,
                output: vec![BomLine::new(DEFAULT_ROLE, item_digest.clone(), 1.0)],
                ..Process::default()
            }))?;
            debug!(qualifier, %process, "synthesized implicit process");
        }
        Ok(item_digest)
    }

    fn compile_process(
        &mut self,
        module: &str,
        qualifier: &str,
        block: &Block,
    ) -> Result<Digest, EngineError> {
        let mut input = Vec::new();
        for line in line_specs(qualifier, block, "input")? {
            let item = self.resolve_item(module, &line.reference)?;
            let co_item = self.co_item_of(&item)?;
            input.push(BomLine::new(line.role, co_item, line.qty));
        }

        let mut output = Vec::new();
        for line in line_specs(qualifier, block, "output")? {
            let item = self.resolve_item(module, &line.reference)?;
            let role = if line.role.is_empty() {
                DEFAULT_ROLE.to_string()
            } else {
                line.role
            };
            output.push(BomLine::new(role, item.digest, line.qty));
        }

        let predecessor = match block.attr("predecessor") {
            Some(value) => {
                let path = reference_path(qualifier, "predecessor", value)?;
                let digest = self.resolve(module, &path)?;
                self.catalog.get_process(&digest)?;
                Some(digest)
            }
            None => None,
        };

        let process = Process {
            qualifier: qualifier.to_string(),
            cycle_time: block.num_attr("cycle").unwrap_or_default(),
            input,
            output,
            predecessor,
            ..Process::default()
        };
        Ok(self.catalog.add(&Symbol::from(process))?)
    }

    fn compile_contract(&mut self, qualifier: &str, block: &Block) -> Result<Digest, EngineError> {
        let params = block
            .attrs
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect();
        let contract = Contract {
            qualifier: qualifier.to_string(),
            name: block.name().unwrap_or_default().to_string(),
            params,
            ..Contract::default()
        };
        Ok(self.catalog.add(&Symbol::from(contract))?)
    }

    fn resolve_contracts(
        &mut self,
        module: &str,
        qualifier: &str,
        block: &Block,
        key: &str,
    ) -> Result<Vec<Digest>, EngineError> {
        let Some(value) = block.attr(key) else {
            return Ok(Vec::new());
        };
        let refs = match value {
            Value::List(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        let mut digests = Vec::new();
        for value in refs {
            let path = reference_path(qualifier, key, value)?;
            let digest = self.resolve(module, &path)?;
            self.catalog.get_contract(&digest)?;
            digests.push(digest);
        }
        Ok(digests)
    }

    fn resolve_derivation(
        &mut self,
        module: &str,
        qualifier: &str,
        block: &Block,
    ) -> Result<Option<Derivation>, EngineError> {
        let Some(value) = block.attr("derived_from") else {
            return Ok(None);
        };
        let path = reference_path(qualifier, "derived_from", value)?;
        let derived_from = self.resolve_item(module, &path)?.digest;
        let kind = match block.str_attr("derivation") {
            Some(raw) => raw
                .parse::<DerivationKind>()
                .map_err(|message| invalid(qualifier, message))?,
            None => DerivationKind::Change,
        };
        Ok(Some(Derivation { derived_from, kind }))
    }
}

/// The single co-item of an item, as recorded in the catalog.
pub(crate) fn single_co_item(catalog: &Catalog, item: &Item) -> Result<Digest, EngineError> {
    let co_items = catalog.get_co_items(&item.digest)?;
    match co_items.as_slice() {
        [only] => Ok(only.digest.clone()),
        [] => Err(EngineError::NotFound(format!(
            "co-item of `{}`",
            item.qualifier
        ))),
        many => Err(EngineError::Unsupported(format!(
            "`{}` has {} co-items",
            item.qualifier,
            many.len()
        ))),
    }
}

fn invalid(qualifier: &str, message: impl Into<String>) -> EngineError {
    EngineError::InvalidBlock {
        qualifier: qualifier.to_string(),
        message: message.into(),
    }
}

fn reference_path(qualifier: &str, key: &str, value: &Value) -> Result<Vec<String>, EngineError> {
    value
        .as_path()
        .ok_or_else(|| invalid(qualifier, format!("`{key}` must be a reference, found {value}")))
}

/// Read a list of `{ role, name, ref, qty }` objects. `role` falls back to
/// `name`; `qty` defaults to 1.
fn line_specs(qualifier: &str, block: &Block, key: &str) -> Result<Vec<LineSpec>, EngineError> {
    let Some(value) = block.attr(key) else {
        return Ok(Vec::new());
    };
    let entries = value
        .as_list()
        .ok_or_else(|| invalid(qualifier, format!("`{key}` must be a list")))?;

    entries
        .iter()
        .map(|entry| {
            let object = entry
                .as_object()
                .ok_or_else(|| invalid(qualifier, format!("`{key}` entries must be objects")))?;
            let reference = object
                .get("ref")
                .ok_or_else(|| invalid(qualifier, format!("`{key}` entry without `ref`")))
                .and_then(|value| reference_path(qualifier, "ref", value))?;
            let role = object
                .get("role")
                .or_else(|| object.get("name"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let qty = match object.get("qty") {
                Some(Value::Num(qty)) if *qty > 0.0 => *qty,
                Some(other) => {
                    return Err(invalid(
                        qualifier,
                        format!("`{key}` quantity must be a positive number, found {other}"),
                    ));
                }
                None => 1.0,
            };
            Ok(LineSpec {
                role,
                reference,
                qty,
            })
        })
        .collect()
}

fn details(
    qualifier: &str,
    block: &Block,
) -> Result<BTreeMap<String, serde_json::Value>, EngineError> {
    let Some(value) = block.attr("details") else {
        return Ok(BTreeMap::new());
    };
    let object = value
        .as_object()
        .ok_or_else(|| invalid(qualifier, "`details` must be an object"))?;
    Ok(object
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect())
}

/// Item `ref` attribute: one string or a list of strings. `file:` refs are
/// hashed relative to the declaring file.
fn file_references(qualifier: &str, block: &Block) -> Result<Vec<FileReference>, EngineError> {
    let Some(value) = block.attr("ref") else {
        return Ok(Vec::new());
    };
    let raw = match value {
        Value::List(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    raw.iter()
        .map(|value| {
            let reference = value
                .as_str()
                .ok_or_else(|| invalid(qualifier, format!("`ref` must be a string, found {value}")))?;
            Ok(match reference.strip_prefix(FILE_REF_PREFIX) {
                Some(path) => FileReference {
                    reference: reference.to_string(),
                    path: path.to_string(),
                    digest: hash_file(qualifier, &block.dir().join(path)),
                },
                None => FileReference {
                    reference: reference.to_string(),
                    path: String::new(),
                    digest: String::new(),
                },
            })
        })
        .collect()
}

fn hash_file(qualifier: &str, path: &Path) -> String {
    match File::open(path).and_then(Digest::from_reader) {
        Ok(digest) => digest.to_string(),
        Err(error) => {
            warn!(qualifier, path = %path.display(), %error, "cannot hash referenced file");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomgraph_source::parse_str;

    fn block(source: &str) -> Block {
        parse_str(source, "unit.bpo")
            .expect("parse")
            .into_iter()
            .next()
            .expect("one block")
    }

    #[test]
    fn line_specs_default_role_and_qty() {
        let b = block("item \"bike\" { from = [{ ref = wheel }, { name = \"rear\", ref = wheel, qty = 2 }] }");
        let specs = line_specs(".bike", &b, "from").expect("specs");
        assert_eq!(specs[0].qty, 1.0);
        assert_eq!(specs[0].role, "");
        assert_eq!(specs[1].role, "rear");
        assert_eq!(specs[1].reference, vec!["wheel".to_string()]);
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let b = block("item \"bike\" { from = [{ ref = wheel, qty = 0 }] }");
        assert!(matches!(
            line_specs(".bike", &b, "from"),
            Err(EngineError::InvalidBlock { .. })
        ));
    }

    #[test]
    fn missing_ref_is_rejected() {
        let b = block("process \"p\" { input = [{ qty = 1 }] }");
        let err = line_specs(".p", &b, "input").expect_err("missing ref");
        assert!(err.to_string().contains("without `ref`"));
    }

    #[test]
    fn unreadable_file_reference_has_empty_digest() {
        let b = block("item \"bolt\" { ref = [\"file:does-not-exist.step\", \"https://example.com/bolt\"] }");
        let refs = file_references(".bolt", &b).expect("refs");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].path, "does-not-exist.step");
        assert!(refs[0].digest.is_empty());
        assert!(refs[1].path.is_empty());
    }

    #[test]
    fn details_must_be_an_object() {
        let b = block("item \"bolt\" { details = [1, 2] }");
        assert!(details(".bolt", &b).is_err());
        let ok = block("item \"bolt\" { details = { finish = \"zinc\", grade = 8.8 } }");
        let map = details(".bolt", &ok).expect("details");
        assert_eq!(map["finish"], serde_json::json!("zinc"));
    }
}
