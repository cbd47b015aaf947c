//! The catalog: digest-addressed object blobs plus in-memory index maps.
//!
//! Layout under the catalog root:
//!
//! ```text
//! config.toml
//! index
//! types
//! process
//! objects/<2 hex>/<digest>
//! ```
//!
//! Index logs are read fully at [`Catalog::open`]. Every mutation goes
//! through [`Catalog::add`], which writes the blob durably before appending
//! any index line that points at it.

use bomgraph_core::{CoItem, CoProcess, Contract, Digest, Item, Process, Symbol, SymbolKind};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::atomic::{append_line, atomic_write};
use crate::config::{CONFIG_FILE, CatalogConfig, DEFAULT_OBJECT_MODE};
use crate::error::CatalogError;
use crate::index::{
    PROCESS_LOG, QUALIFIER_LOG, RecipeEntry, RecipeLink, TYPE_LOG, load_qualifiers, load_recipes,
    load_types, qualifier_line, recipe_line, type_line,
};

pub const OBJECTS_DIR: &str = "objects";

/// Content-addressed store for one catalog directory.
///
/// Assumes a single writer. Two processes appending to the same catalog
/// will interleave index lines.
#[derive(Debug)]
pub struct Catalog {
    root: PathBuf,
    config: CatalogConfig,
    qualifiers: BTreeMap<String, Digest>,
    types: BTreeMap<Digest, SymbolKind>,
    /// Output item -> processes producing it, in log order.
    processes: BTreeMap<Digest, Vec<Digest>>,
    /// Output co-item -> co-processes producing it, in log order.
    co_processes: BTreeMap<Digest, Vec<Digest>>,
    /// Input item -> co-processes consuming it.
    consumers: BTreeMap<Digest, Vec<Digest>>,
}

impl Catalog {
    /// Create the catalog layout at `root` (idempotent) and open it.
    pub fn init(root: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let root = root.as_ref();
        let objects = root.join(OBJECTS_DIR);
        fs::create_dir_all(&objects)
            .map_err(|e| CatalogError::Io(format!("{}: {e}", objects.display())))?;
        for log in [QUALIFIER_LOG, TYPE_LOG, PROCESS_LOG] {
            let path = root.join(log);
            if !path.exists() {
                atomic_write(&path, b"", DEFAULT_OBJECT_MODE)?;
            }
        }
        if !root.join(CONFIG_FILE).exists() {
            CatalogConfig::default().save(root)?;
        }
        Self::open(root)
    }

    /// Open an existing catalog, reading `config.toml` if present.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let config = CatalogConfig::load(root.as_ref())?;
        Self::open_with_config(root, config)
    }

    pub fn open_with_config(
        root: impl AsRef<Path>,
        config: CatalogConfig,
    ) -> Result<Self, CatalogError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(CatalogError::Io(format!(
                "{}: catalog directory does not exist",
                root.display()
            )));
        }

        let mut catalog = Self {
            qualifiers: BTreeMap::new(),
            types: BTreeMap::new(),
            processes: BTreeMap::new(),
            co_processes: BTreeMap::new(),
            consumers: BTreeMap::new(),
            root,
            config,
        };

        for (qualifier, digest) in load_qualifiers(&catalog.root.join(QUALIFIER_LOG))? {
            catalog.qualifiers.insert(qualifier, digest);
        }
        for (digest, kind) in load_types(&catalog.root.join(TYPE_LOG))? {
            catalog.types.insert(digest, kind);
        }
        for entry in load_recipes(&catalog.root.join(PROCESS_LOG))? {
            catalog.link_recipe(&entry);
        }

        let co_process_digests: Vec<Digest> =
            catalog.co_processes.values().flatten().cloned().collect();
        for digest in co_process_digests {
            let co_process = catalog.get_co_process(&digest)?;
            catalog.link_consumers(&co_process);
        }

        debug!(
            root = %catalog.root.display(),
            qualifiers = catalog.qualifiers.len(),
            objects = catalog.types.len(),
            "opened catalog"
        );
        Ok(catalog)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Number of qualifiers in the main index.
    pub fn len(&self) -> usize {
        self.qualifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qualifiers.is_empty()
    }

    /// Number of typed objects.
    pub fn object_count(&self) -> usize {
        self.types.len()
    }

    /// Qualifier -> digest pairs in qualifier order.
    pub fn qualifiers(&self) -> impl Iterator<Item = (&str, &Digest)> {
        self.qualifiers.iter().map(|(q, d)| (q.as_str(), d))
    }

    pub fn object_path(&self, digest: &Digest) -> PathBuf {
        self.root
            .join(OBJECTS_DIR)
            .join(digest.shard())
            .join(digest.as_str())
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        self.types.contains_key(digest)
    }

    /// Store a symbol and index it. Returns the content digest.
    ///
    /// Re-adding identical content writes nothing: the blob is kept and
    /// each index append is skipped when the mapping is already present.
    pub fn add(&mut self, symbol: &Symbol) -> Result<Digest, CatalogError> {
        let digest = symbol.compute_digest()?;
        let kind = symbol.kind();

        let path = self.object_path(&digest);
        if !path.exists() {
            let bytes = symbol.to_canonical_bytes()?;
            atomic_write(&path, &bytes, self.config.catalog.object_mode)?;
            debug!(%digest, %kind, qualifier = symbol.qualifier(), "wrote object");
        }

        if self.types.get(&digest) != Some(&kind) {
            append_line(&self.root.join(TYPE_LOG), &type_line(&digest, kind))?;
            self.types.insert(digest.clone(), kind);
        }

        let qualifier = symbol.qualifier();
        if !qualifier.is_empty() && self.qualifiers.get(qualifier) != Some(&digest) {
            append_line(
                &self.root.join(QUALIFIER_LOG),
                &qualifier_line(qualifier, &digest),
            )?;
            self.qualifiers.insert(qualifier.to_string(), digest.clone());
        }

        match symbol {
            Symbol::Process(process) => {
                for line in &process.output {
                    self.record_recipe(RecipeEntry {
                        link: RecipeLink::Process,
                        output: line.item.clone(),
                        recipe: digest.clone(),
                    })?;
                }
            }
            Symbol::CoProcess(co_process) => {
                for line in &co_process.output {
                    self.record_recipe(RecipeEntry {
                        link: RecipeLink::CoProcess,
                        output: line.item.clone(),
                        recipe: digest.clone(),
                    })?;
                }
                let mut sealed = co_process.clone();
                sealed.digest = digest.clone();
                self.link_consumers(&sealed);
            }
            _ => {}
        }

        Ok(digest)
    }

    /// Load any symbol by digest.
    ///
    /// A missing blob is [`CatalogError::NotFound`]; a blob without a type
    /// entry is [`CatalogError::MissingType`].
    pub fn get(&self, digest: &Digest) -> Result<Symbol, CatalogError> {
        let path = self.object_path(digest);
        if !path.exists() {
            return Err(CatalogError::NotFound(digest.to_string()));
        }
        let kind = *self
            .types
            .get(digest)
            .ok_or_else(|| CatalogError::MissingType(digest.to_string()))?;
        let bytes =
            fs::read(&path).map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
        Ok(Symbol::from_canonical_bytes(kind, digest.clone(), &bytes)?)
    }

    pub fn get_item(&self, digest: &Digest) -> Result<Item, CatalogError> {
        Ok(self.get(digest)?.into_item()?)
    }

    pub fn get_co_item(&self, digest: &Digest) -> Result<CoItem, CatalogError> {
        Ok(self.get(digest)?.into_co_item()?)
    }

    pub fn get_process(&self, digest: &Digest) -> Result<Process, CatalogError> {
        Ok(self.get(digest)?.into_process()?)
    }

    pub fn get_co_process(&self, digest: &Digest) -> Result<CoProcess, CatalogError> {
        Ok(self.get(digest)?.into_co_process()?)
    }

    pub fn get_contract(&self, digest: &Digest) -> Result<Contract, CatalogError> {
        Ok(self.get(digest)?.into_contract()?)
    }

    /// Digest currently bound to a qualifier, if any.
    pub fn find_digest(&self, qualifier: &str) -> Option<&Digest> {
        self.qualifiers.get(qualifier)
    }

    /// Load the symbol currently bound to a qualifier.
    pub fn find(&self, qualifier: &str) -> Result<Symbol, CatalogError> {
        let digest = self
            .find_digest(qualifier)
            .ok_or_else(|| CatalogError::NotFound(qualifier.to_string()))?;
        self.get(digest)
    }

    /// Whether `qualifier` still names `digest`. Recipes whose qualifier has
    /// since been bound to newer content are superseded.
    fn is_current(&self, qualifier: &str, digest: &Digest) -> bool {
        qualifier.is_empty() || self.qualifiers.get(qualifier) == Some(digest)
    }

    /// Current processes producing `item`, in the order they were recorded.
    pub fn get_item_processes(&self, item: &Digest) -> Result<Vec<Process>, CatalogError> {
        let mut processes = Vec::new();
        for digest in self.processes.get(item).into_iter().flatten() {
            let process = self.get_process(digest)?;
            if self.is_current(&process.qualifier, digest) {
                processes.push(process);
            } else {
                debug!(%digest, qualifier = %process.qualifier, "skipping superseded process");
            }
        }
        Ok(processes)
    }

    /// Current co-processes producing `co_item`, in the order they were
    /// recorded.
    pub fn get_item_co_processes(&self, co_item: &Digest) -> Result<Vec<CoProcess>, CatalogError> {
        let mut co_processes = Vec::new();
        for digest in self.co_processes.get(co_item).into_iter().flatten() {
            let co_process = self.get_co_process(digest)?;
            if self.is_current(&co_process.qualifier, digest) {
                co_processes.push(co_process);
            } else {
                debug!(%digest, qualifier = %co_process.qualifier, "skipping superseded co-process");
            }
        }
        Ok(co_processes)
    }

    /// Co-items an item turns into through its co-processes.
    ///
    /// Co-processes with more than one output are rejected.
    pub fn get_co_items(&self, item: &Digest) -> Result<Vec<CoItem>, CatalogError> {
        let mut seen: Vec<Digest> = Vec::new();
        for digest in self.consumers.get(item).into_iter().flatten() {
            let co_process = self.get_co_process(digest)?;
            if !self.is_current(&co_process.qualifier, digest) {
                continue;
            }
            if co_process.output.len() != 1 {
                return Err(CatalogError::Unsupported(format!(
                    "co-process {digest} has {} outputs",
                    co_process.output.len()
                )));
            }
            let output = &co_process.output[0].item;
            if !seen.contains(output) {
                seen.push(output.clone());
            }
        }
        seen.iter().map(|digest| self.get_co_item(digest)).collect()
    }

    /// Items feeding a co-item through its co-processes.
    ///
    /// Co-processes with more than one input are rejected.
    pub fn get_items(&self, co_item: &Digest) -> Result<Vec<Item>, CatalogError> {
        let mut seen: Vec<Digest> = Vec::new();
        for co_process in self.get_item_co_processes(co_item)? {
            if co_process.input.len() != 1 {
                return Err(CatalogError::Unsupported(format!(
                    "co-process {} has {} inputs",
                    co_process.digest,
                    co_process.input.len()
                )));
            }
            let input = &co_process.input[0].item;
            if !seen.contains(input) {
                seen.push(input.clone());
            }
        }
        seen.iter().map(|digest| self.get_item(digest)).collect()
    }

    fn record_recipe(&mut self, entry: RecipeEntry) -> Result<(), CatalogError> {
        let known = self
            .recipe_index(entry.link)
            .get(&entry.output)
            .is_some_and(|recipes| recipes.contains(&entry.recipe));
        if known {
            return Ok(());
        }
        append_line(&self.root.join(PROCESS_LOG), &recipe_line(&entry))?;
        self.link_recipe(&entry);
        Ok(())
    }

    fn recipe_index(&self, link: RecipeLink) -> &BTreeMap<Digest, Vec<Digest>> {
        match link {
            RecipeLink::Process => &self.processes,
            RecipeLink::CoProcess => &self.co_processes,
        }
    }

    fn link_recipe(&mut self, entry: &RecipeEntry) {
        let index = match entry.link {
            RecipeLink::Process => &mut self.processes,
            RecipeLink::CoProcess => &mut self.co_processes,
        };
        let recipes = index.entry(entry.output.clone()).or_default();
        if !recipes.contains(&entry.recipe) {
            recipes.push(entry.recipe.clone());
        }
    }

    fn link_consumers(&mut self, co_process: &CoProcess) {
        for line in &co_process.input {
            let consumers = self.consumers.entry(line.item.clone()).or_default();
            if !consumers.contains(&co_process.digest) {
                consumers.push(co_process.digest.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bomgraph_core::{
        BomLine, Companion, DEFAULT_ROLE, ItemContent, SymbolError, companion_qualifier,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    struct TempCatalog {
        root: PathBuf,
    }

    impl TempCatalog {
        fn new(prefix: &str) -> Self {
            let unique = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock should be after unix epoch")
                .as_nanos();
            let root = std::env::temp_dir().join(format!(
                "bomgraph-catalog-{prefix}-{}-{unique}",
                std::process::id()
            ));
            Self { root }
        }
    }

    impl Drop for TempCatalog {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    fn item(qualifier: &str, name: &str) -> Symbol {
        Symbol::from(Item::new(
            qualifier,
            ItemContent {
                name: name.to_string(),
                ..ItemContent::default()
            },
        ))
    }

    fn line_count(path: &Path) -> usize {
        fs::read_to_string(path)
            .expect("log should read")
            .lines()
            .count()
    }

    /// Add an item with its co-item and co-process, as the compiler does.
    fn add_with_companions(catalog: &mut Catalog, qualifier: &str, name: &str) -> (Digest, Digest) {
        let item_digest = catalog.add(&item(qualifier, name)).expect("add item");
        let co_item = Symbol::from(CoItem {
            qualifier: companion_qualifier(qualifier, Companion::CoItem),
            item: item_digest.clone(),
            ..CoItem::default()
        });
        let co_item_digest = catalog.add(&co_item).expect("add co-item");
        let co_process = Symbol::from(CoProcess {
            qualifier: companion_qualifier(qualifier, Companion::CoProcess),
            input: vec![BomLine::new(DEFAULT_ROLE, item_digest.clone(), 1.0)],
            output: vec![BomLine::new(DEFAULT_ROLE, co_item_digest.clone(), 1.0)],
            ..CoProcess::default()
        });
        catalog.add(&co_process).expect("add co-process");
        (item_digest, co_item_digest)
    }

    #[test]
    fn init_creates_layout_and_default_config() {
        let temp = TempCatalog::new("init");
        let catalog = Catalog::init(&temp.root).expect("init");
        assert!(catalog.is_empty());
        for name in [QUALIFIER_LOG, TYPE_LOG, PROCESS_LOG, "config.toml", OBJECTS_DIR] {
            assert!(temp.root.join(name).exists(), "{name} should exist");
        }
        Catalog::init(&temp.root).expect("second init is harmless");
    }

    #[test]
    fn open_missing_directory_fails() {
        let temp = TempCatalog::new("missing");
        assert!(matches!(
            Catalog::open(&temp.root),
            Err(CatalogError::Io(_))
        ));
    }

    #[test]
    fn add_is_idempotent_on_identical_content() {
        let temp = TempCatalog::new("idempotent");
        let mut catalog = Catalog::init(&temp.root).expect("init");
        let first = catalog.add(&item(".bolt", "bolt")).expect("add");
        let second = catalog.add(&item(".bolt", "bolt")).expect("re-add");
        assert_eq!(first, second);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.object_count(), 1);
        assert_eq!(line_count(&temp.root.join(QUALIFIER_LOG)), 1);
        assert_eq!(line_count(&temp.root.join(TYPE_LOG)), 1);
    }

    #[test]
    fn same_content_under_two_qualifiers_reads_back_each_name() {
        let temp = TempCatalog::new("two-names");
        let mut catalog = Catalog::init(&temp.root).expect("init");
        let a = catalog.add(&item(".bolt", "bolt")).expect("add");
        let b = catalog.add(&item("spares.bolt", "bolt")).expect("add");
        assert_ne!(a, b);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.object_count(), 2);
        assert_eq!(catalog.get(&a).expect("get").qualifier(), ".bolt");
        assert_eq!(catalog.get(&b).expect("get").qualifier(), "spares.bolt");
    }

    #[test]
    fn every_kind_round_trips_through_get() {
        let temp = TempCatalog::new("roundtrip");
        let mut catalog = Catalog::init(&temp.root).expect("init");
        let bolt = catalog.add(&item(".bolt", "bolt")).expect("add");

        let mut contract = Contract {
            qualifier: ".m6".to_string(),
            name: "m6".to_string(),
            ..Contract::default()
        };
        contract.params.insert("pitch".to_string(), "1.0".to_string());

        let symbols = vec![
            item(".nut", "nut"),
            Symbol::from(CoItem {
                qualifier: "__implicit__.bolt.coitem".to_string(),
                item: bolt.clone(),
                ..CoItem::default()
            }),
            Symbol::from(Process {
                qualifier: ".press".to_string(),
                cycle_time: 3.0,
                input: vec![BomLine::new("stock", bolt.clone(), 2.0)],
                output: vec![BomLine::new(DEFAULT_ROLE, bolt.clone(), 1.0)],
                ..Process::default()
            }),
            Symbol::from(CoProcess {
                qualifier: "__implicit__.bolt.coprocess".to_string(),
                input: vec![BomLine::new(DEFAULT_ROLE, bolt.clone(), 1.0)],
                output: vec![BomLine::new(DEFAULT_ROLE, bolt, 1.0)],
                ..CoProcess::default()
            }),
            Symbol::from(contract),
        ];

        for symbol in symbols {
            let digest = catalog.add(&symbol).expect("add");
            let sealed = symbol.clone().seal().expect("seal");
            assert_eq!(catalog.get(&digest).expect("get"), sealed);
            assert_eq!(
                catalog.find(symbol.qualifier()).expect("find"),
                sealed,
                "qualifier lookup for {}",
                symbol.qualifier()
            );
        }
    }

    #[test]
    fn indices_survive_reopen() {
        let temp = TempCatalog::new("reopen");
        let (item_digest, co_item_digest) = {
            let mut catalog = Catalog::init(&temp.root).expect("init");
            add_with_companions(&mut catalog, ".wheel", "wheel")
        };

        let catalog = Catalog::open(&temp.root).expect("reopen");
        assert_eq!(catalog.find_digest(".wheel"), Some(&item_digest));
        let co_items = catalog.get_co_items(&item_digest).expect("co-items");
        assert_eq!(co_items.len(), 1);
        assert_eq!(co_items[0].digest, co_item_digest);
        let items = catalog.get_items(&co_item_digest).expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].digest, item_digest);
    }

    #[test]
    fn companion_invariant_holds_for_each_item() {
        let temp = TempCatalog::new("companions");
        let mut catalog = Catalog::init(&temp.root).expect("init");
        let (wheel, wheel_co) = add_with_companions(&mut catalog, ".wheel", "wheel");
        let (frame, _) = add_with_companions(&mut catalog, ".frame", "frame");

        let co_items = catalog.get_co_items(&wheel).expect("co-items");
        assert_eq!(co_items.len(), 1);
        assert_eq!(co_items[0].item, wheel);
        assert_eq!(co_items[0].qualifier, "__implicit__.wheel.coitem");
        assert_eq!(catalog.get_item_co_processes(&wheel_co).expect("cp").len(), 1);
        assert_eq!(catalog.get_co_items(&frame).expect("co-items").len(), 1);
    }

    #[test]
    fn item_processes_follow_output_lines() {
        let temp = TempCatalog::new("processes");
        let mut catalog = Catalog::init(&temp.root).expect("init");
        let (wheel, _) = add_with_companions(&mut catalog, ".wheel", "wheel");
        let (_, spoke_co) = add_with_companions(&mut catalog, ".spoke", "spoke");

        let process = Symbol::from(Process {
            qualifier: "__implicit__.wheel.process".to_string(),
            input: vec![BomLine::new("spoke", spoke_co, 32.0)],
            output: vec![BomLine::new(DEFAULT_ROLE, wheel.clone(), 1.0)],
            ..Process::default()
        });
        let digest = catalog.add(&process).expect("add process");
        catalog.add(&process).expect("re-add process");

        let processes = catalog.get_item_processes(&wheel).expect("processes");
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].digest, digest);
        assert_eq!(line_count(&temp.root.join(PROCESS_LOG)), 3);
    }

    #[test]
    fn missing_blob_and_missing_type_are_distinct() {
        let temp = TempCatalog::new("missing-type");
        let mut catalog = Catalog::init(&temp.root).expect("init");
        let digest = catalog.add(&item(".bolt", "bolt")).expect("add");

        let absent = Digest::from_bytes(b"nothing stored here");
        assert!(catalog.get(&absent).expect_err("absent").is_not_found());

        fs::write(temp.root.join(TYPE_LOG), "").expect("truncate types");
        let reopened = Catalog::open(&temp.root).expect("reopen");
        assert!(matches!(
            reopened.get(&digest),
            Err(CatalogError::MissingType(_))
        ));
    }

    #[test]
    fn typed_getter_rejects_wrong_kind() {
        let temp = TempCatalog::new("mismatch");
        let mut catalog = Catalog::init(&temp.root).expect("init");
        let digest = catalog.add(&item(".bolt", "bolt")).expect("add");
        assert!(matches!(
            catalog.get_process(&digest),
            Err(CatalogError::Symbol(SymbolError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn malformed_index_fails_open() {
        let temp = TempCatalog::new("malformed");
        Catalog::init(&temp.root).expect("init");
        fs::write(temp.root.join(QUALIFIER_LOG), "no-separator-here\n").expect("corrupt");
        assert!(matches!(
            Catalog::open(&temp.root),
            Err(CatalogError::MalformedIndex { line: 1, .. })
        ));
    }

    #[test]
    fn later_qualifier_binding_wins() {
        let temp = TempCatalog::new("rebind");
        let mut catalog = Catalog::init(&temp.root).expect("init");
        catalog.add(&item(".bolt", "bolt")).expect("add");
        let newer = catalog.add(&item(".bolt", "bolt-v2")).expect("rebind");
        drop(catalog);

        let reopened = Catalog::open(&temp.root).expect("reopen");
        assert_eq!(reopened.find_digest(".bolt"), Some(&newer));
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.object_count(), 2);
    }

    #[test]
    fn rebound_process_qualifier_supersedes_old_recipe() {
        let temp = TempCatalog::new("superseded");
        let mut catalog = Catalog::init(&temp.root).expect("init");
        let (kit, _) = add_with_companions(&mut catalog, ".kit", "kit");
        let (_, old_bolt) = add_with_companions(&mut catalog, "old.bolt", "bolt");
        let (_, new_bolt) = add_with_companions(&mut catalog, "new.bolt", "bolt");

        let recipe = |input: Digest| {
            Symbol::from(Process {
                qualifier: "__implicit__.kit.process".to_string(),
                input: vec![BomLine::new(DEFAULT_ROLE, input, 4.0)],
                output: vec![BomLine::new(DEFAULT_ROLE, kit.clone(), 1.0)],
                ..Process::default()
            })
        };
        catalog.add(&recipe(old_bolt)).expect("old recipe");
        let current = catalog.add(&recipe(new_bolt.clone())).expect("new recipe");
        drop(catalog);

        let reopened = Catalog::open(&temp.root).expect("reopen");
        let processes = reopened.get_item_processes(&kit).expect("processes");
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].digest, current);
        assert_eq!(processes[0].input[0].item, new_bolt);
    }

    #[test]
    fn multi_output_co_process_is_unsupported() {
        let temp = TempCatalog::new("multi-output");
        let mut catalog = Catalog::init(&temp.root).expect("init");
        let bolt = catalog.add(&item(".bolt", "bolt")).expect("add");
        let first = catalog
            .add(&Symbol::from(CoItem {
                qualifier: "a".to_string(),
                item: bolt.clone(),
                ..CoItem::default()
            }))
            .expect("add");
        let second = catalog
            .add(&Symbol::from(CoItem {
                qualifier: "b".to_string(),
                item: Digest::from_bytes(b"other"),
                ..CoItem::default()
            }))
            .expect("add");
        catalog
            .add(&Symbol::from(CoProcess {
                qualifier: "split".to_string(),
                input: vec![BomLine::new(DEFAULT_ROLE, bolt.clone(), 1.0)],
                output: vec![
                    BomLine::new(DEFAULT_ROLE, first, 1.0),
                    BomLine::new(DEFAULT_ROLE, second, 1.0),
                ],
                ..CoProcess::default()
            }))
            .expect("add");

        let err = catalog.get_co_items(&bolt).expect_err("two outputs");
        assert!(matches!(err, CatalogError::Unsupported(_)));
        assert!(err.to_string().starts_with("not implemented"));
    }
}
