//! Module scopes and name resolution.
//!
//! Modules and their entries live in flat arenas addressed by [`ModuleId`]
//! and [`SymbolId`]. An import is just an entry pointing at another module,
//! so resolving `parts.bolt` from the root module walks the `parts` import
//! entry into the `parts` module and looks up `bolt` there.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::block::Block;
use crate::error::SourceError;

/// Path of the module that holds top-level sources.
pub const ROOT_MODULE: &str = ".";

pub type ModuleId = usize;

/// Handle to one registered entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId {
    pub module: ModuleId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A raw, uncompiled block.
    Block(Block),
    /// Indirection into another module, by module path.
    Import { target: String },
}

#[derive(Debug, Default)]
struct Module {
    path: String,
    names: BTreeMap<String, usize>,
    entries: Vec<(String, Entry)>,
}

/// Qualifier for `name` declared in `module`. The root module renders as
/// the empty prefix, so `bolt` in the root is `.bolt`.
pub fn qualify(module: &str, name: &str) -> String {
    let prefix = if module == ROOT_MODULE { "" } else { module };
    format!("{prefix}.{name}")
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    modules: Vec<Module>,
    by_path: BTreeMap<String, ModuleId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the module at `path`, creating an empty scope if needed.
    pub fn module(&mut self, path: &str) -> ModuleId {
        if let Some(id) = self.by_path.get(path) {
            return *id;
        }
        let id = self.modules.len();
        self.modules.push(Module {
            path: path.to_string(),
            ..Module::default()
        });
        self.by_path.insert(path.to_string(), id);
        id
    }

    pub fn module_id(&self, path: &str) -> Option<ModuleId> {
        self.by_path.get(path).copied()
    }

    pub fn module_path(&self, id: ModuleId) -> &str {
        self.modules.get(id).map_or("", |m| m.path.as_str())
    }

    /// Module paths in load order.
    pub fn module_paths(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.path.as_str())
    }

    /// Register `entry` as `name` in `module`.
    pub fn add_symbol(
        &mut self,
        module: &str,
        name: &str,
        entry: Entry,
    ) -> Result<SymbolId, SourceError> {
        let module_id = self.module(module);
        let scope = &mut self.modules[module_id];
        if scope.names.contains_key(name) {
            return Err(SourceError::DuplicateSymbol {
                module: module.to_string(),
                name: name.to_string(),
            });
        }
        let index = scope.entries.len();
        scope.names.insert(name.to_string(), index);
        scope.entries.push((name.to_string(), entry));
        debug!(module, name, "registered symbol");
        Ok(SymbolId {
            module: module_id,
            index,
        })
    }

    pub fn get(&self, id: SymbolId) -> Option<&Entry> {
        self.modules
            .get(id.module)
            .and_then(|m| m.entries.get(id.index))
            .map(|(_, entry)| entry)
    }

    pub fn name(&self, id: SymbolId) -> Option<&str> {
        self.modules
            .get(id.module)
            .and_then(|m| m.entries.get(id.index))
            .map(|(name, _)| name.as_str())
    }

    /// Qualifier of a registered entry.
    pub fn qualifier(&self, id: SymbolId) -> Option<String> {
        let name = self.name(id)?;
        Some(qualify(self.module_path(id.module), name))
    }

    /// Resolve a dotted path starting in `module`, following imports.
    ///
    /// The path must end on a block; ending on an import names a module and
    /// is unresolved. Re-entering a module already walked through is a
    /// cyclic import.
    pub fn resolve(&self, module: &str, path: &[String]) -> Result<SymbolId, SourceError> {
        let unresolved = || SourceError::Unresolved {
            module: module.to_string(),
            reference: path.join("."),
        };
        let mut current = self
            .module_id(module)
            .ok_or_else(|| SourceError::UnknownModule(module.to_string()))?;
        let mut visited = BTreeSet::from([current]);

        for (position, segment) in path.iter().enumerate() {
            let scope = &self.modules[current];
            let index = *scope.names.get(segment).ok_or_else(unresolved)?;
            let last = position + 1 == path.len();
            match &scope.entries[index].1 {
                Entry::Block(_) if last => {
                    return Ok(SymbolId {
                        module: current,
                        index,
                    });
                }
                Entry::Block(_) => return Err(unresolved()),
                Entry::Import { target } => {
                    if last {
                        return Err(unresolved());
                    }
                    let next = self
                        .module_id(target)
                        .ok_or_else(|| SourceError::UnknownModule(target.clone()))?;
                    if !visited.insert(next) {
                        return Err(SourceError::CyclicImport(target.clone()));
                    }
                    current = next;
                }
            }
        }
        Err(unresolved())
    }

    /// Every block in module load order, then declaration order.
    pub fn blocks(&self) -> Vec<SymbolId> {
        let mut out = Vec::new();
        for (module, scope) in self.modules.iter().enumerate() {
            for (index, (_, entry)) in scope.entries.iter().enumerate() {
                if matches!(entry, Entry::Block(_)) {
                    out.push(SymbolId { module, index });
                }
            }
        }
        out
    }

    pub fn block(&self, id: SymbolId) -> Option<&Block> {
        match self.get(id)? {
            Entry::Block(block) => Some(block),
            Entry::Import { .. } => None,
        }
    }
}

/// Lexical position while reading sources: the chain of imports that led
/// to the file being read. The head is the current module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserContext {
    import_stack: Vec<String>,
}

impl Default for ParserContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserContext {
    pub fn new() -> Self {
        Self {
            import_stack: vec![ROOT_MODULE.to_string()],
        }
    }

    /// Context for reading `path`, failing if it is already being imported.
    pub fn import(&self, path: &str) -> Result<Self, SourceError> {
        if self.import_stack.iter().any(|existing| existing == path) {
            return Err(SourceError::CyclicImport(path.to_string()));
        }
        let mut import_stack = self.import_stack.clone();
        import_stack.push(path.to_string());
        Ok(Self { import_stack })
    }

    pub fn current_module(&self) -> &str {
        self.import_stack
            .last()
            .map_or(ROOT_MODULE, String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.import_stack.len()
    }

    pub fn name_to_qualifier(&self, name: &str) -> String {
        qualify(self.current_module(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn block(name: &str) -> Entry {
        Entry::Block(Block {
            kind: "item".into(),
            labels: vec![name.into()],
            attrs: BTreeMap::new(),
            file: PathBuf::from("test.bpo"),
            line: 1,
        })
    }

    fn path(raw: &str) -> Vec<String> {
        raw.split('.').map(str::to_string).collect()
    }

    #[test]
    fn duplicate_name_in_one_module_is_rejected() {
        let mut table = SymbolTable::new();
        table.add_symbol(ROOT_MODULE, "bolt", block("bolt")).expect("first");
        let err = table
            .add_symbol(ROOT_MODULE, "bolt", block("bolt"))
            .expect_err("duplicate");
        assert!(matches!(err, SourceError::DuplicateSymbol { .. }));
        table.add_symbol("parts", "bolt", block("bolt")).expect("other module");
    }

    #[test]
    fn resolve_follows_imports() {
        let mut table = SymbolTable::new();
        let bolt = table.add_symbol("lib/parts", "bolt", block("bolt")).expect("add");
        table
            .add_symbol(
                ROOT_MODULE,
                "parts",
                Entry::Import {
                    target: "lib/parts".into(),
                },
            )
            .expect("add import");

        assert_eq!(table.resolve(ROOT_MODULE, &path("parts.bolt")).expect("resolve"), bolt);
        assert_eq!(table.qualifier(bolt).as_deref(), Some("lib/parts.bolt"));
        assert!(matches!(
            table.resolve(ROOT_MODULE, &path("parts")),
            Err(SourceError::Unresolved { .. })
        ));
        assert!(matches!(
            table.resolve(ROOT_MODULE, &path("parts.nut")),
            Err(SourceError::Unresolved { .. })
        ));
    }

    #[test]
    fn resolve_detects_import_loops() {
        let mut table = SymbolTable::new();
        table
            .add_symbol("a", "b", Entry::Import { target: "b".into() })
            .expect("a imports b");
        table
            .add_symbol("b", "a", Entry::Import { target: "a".into() })
            .expect("b imports a");
        let err = table
            .resolve("a", &path("b.a.b.x"))
            .expect_err("loop must fail");
        assert!(matches!(err, SourceError::CyclicImport(_)));
    }

    #[test]
    fn blocks_are_listed_in_load_then_declaration_order() {
        let mut table = SymbolTable::new();
        table.add_symbol(ROOT_MODULE, "z", block("z")).expect("add");
        table
            .add_symbol(ROOT_MODULE, "lib", Entry::Import { target: "lib".into() })
            .expect("add");
        table.add_symbol(ROOT_MODULE, "a", block("a")).expect("add");
        table.add_symbol("lib", "m", block("m")).expect("add");

        let names: Vec<_> = table
            .blocks()
            .into_iter()
            .filter_map(|id| table.qualifier(id))
            .collect();
        assert_eq!(names, vec![".z", ".a", "lib.m"]);
    }

    #[test]
    fn context_tracks_current_module_and_qualifiers() {
        let root = ParserContext::new();
        assert_eq!(root.current_module(), ROOT_MODULE);
        assert_eq!(root.name_to_qualifier("bike"), ".bike");

        let parts = root.import("parts").expect("import");
        assert_eq!(parts.current_module(), "parts");
        assert_eq!(parts.name_to_qualifier("bolt"), "parts.bolt");
        assert_eq!(root.depth(), 1);
    }

    #[test]
    fn context_rejects_cyclic_import() {
        let ctx = ParserContext::new()
            .import("a")
            .and_then(|c| c.import("b"))
            .and_then(|c| c.import("c"))
            .expect("acyclic chain of depth three");
        assert_eq!(ctx.depth(), 4);
        assert!(matches!(ctx.import("a"), Err(SourceError::CyclicImport(p)) if p == "a"));
    }
}
