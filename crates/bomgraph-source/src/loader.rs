//! Walk a source tree into a [`SymbolTable`].
//!
//! The entry point may be a folder (every `.bpo` file in it, sorted by name)
//! or a single file. `import "path"` reads the folder `path` (or the file
//! `path.bpo`) relative to the source root into a module named by `path`,
//! and binds the last path component as a name in the importing module.

use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::block::Block;
use crate::error::SourceError;
use crate::parse::parse_file;
use crate::symbols::{Entry, ParserContext, SymbolTable};

pub const EXTENSION: &str = "bpo";

/// Block kinds compiled into catalog symbols.
pub const SYMBOL_KINDS: [&str; 3] = ["item", "process", "contract"];

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("label regex must compile"))
}

/// A `state` block: a previously exported graph to reference against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRef {
    pub name: String,
    pub path: PathBuf,
}

/// Everything read from one source tree.
#[derive(Debug, Default)]
pub struct SourceTree {
    pub root: PathBuf,
    pub symbols: SymbolTable,
    pub states: Vec<StateRef>,
    pub files: Vec<PathBuf>,
}

/// Load a folder or a single `.bpo` file.
pub fn load(path: impl AsRef<Path>) -> Result<SourceTree, SourceError> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|e| SourceError::io(path, e))?;
    let root = if metadata.is_dir() {
        path.to_path_buf()
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    let mut loader = Loader {
        tree: SourceTree {
            root,
            ..SourceTree::default()
        },
        loaded: BTreeSet::new(),
    };
    let ctx = ParserContext::new();
    loader.tree.symbols.module(ctx.current_module());
    if metadata.is_dir() {
        loader.load_folder(&ctx, path)?;
    } else {
        loader.load_file(&ctx, path)?;
    }
    debug!(
        root = %loader.tree.root.display(),
        files = loader.tree.files.len(),
        "loaded sources"
    );
    Ok(loader.tree)
}

/// Check a block label against identifier syntax.
pub fn validate_label(kind: &str, label: &str) -> Result<(), SourceError> {
    if label_re().is_match(label) {
        Ok(())
    } else {
        Err(SourceError::InvalidLabel {
            kind: kind.to_string(),
            label: label.to_string(),
        })
    }
}

/// Check an import path: `/`-separated segments, each a valid label.
pub fn validate_import(path: &str) -> Result<(), SourceError> {
    if path.split('/').all(|segment| label_re().is_match(segment)) {
        Ok(())
    } else {
        Err(SourceError::InvalidLabel {
            kind: "import".to_string(),
            label: path.to_string(),
        })
    }
}

struct Loader {
    tree: SourceTree,
    loaded: BTreeSet<String>,
}

impl Loader {
    fn load_folder(&mut self, ctx: &ParserContext, dir: &Path) -> Result<(), SourceError> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| SourceError::io(dir, e))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION)
            })
            .collect();
        files.sort();
        for file in files {
            self.load_file(ctx, &file)?;
        }
        Ok(())
    }

    fn load_file(&mut self, ctx: &ParserContext, file: &Path) -> Result<(), SourceError> {
        debug!(file = %file.display(), module = ctx.current_module(), "reading source");
        self.tree.files.push(file.to_path_buf());
        for block in parse_file(file)? {
            self.register(ctx, block)?;
        }
        Ok(())
    }

    fn register(&mut self, ctx: &ParserContext, block: Block) -> Result<(), SourceError> {
        let Some(name) = block.name().map(str::to_string) else {
            return Err(invalid(&block, "missing label"));
        };
        match block.kind.as_str() {
            "import" => self.import(ctx, &name),
            "state" => {
                validate_label(&block.kind, &name)?;
                let file = block
                    .str_attr("file")
                    .ok_or_else(|| invalid(&block, "missing `file` attribute"))?;
                self.tree.states.push(StateRef {
                    name,
                    path: block.dir().join(file),
                });
                Ok(())
            }
            kind if SYMBOL_KINDS.contains(&kind) => {
                validate_label(kind, &name)?;
                self.tree
                    .symbols
                    .add_symbol(ctx.current_module(), &name, Entry::Block(block))?;
                Ok(())
            }
            other => {
                warn!(
                    file = %block.file.display(),
                    line = block.line,
                    kind = other,
                    "skipping unknown block kind"
                );
                Ok(())
            }
        }
    }

    fn import(&mut self, ctx: &ParserContext, path: &str) -> Result<(), SourceError> {
        validate_import(path)?;
        let module_name = path.rsplit('/').next().unwrap_or(path);
        let inner = ctx.import(path)?;
        self.tree.symbols.add_symbol(
            ctx.current_module(),
            module_name,
            Entry::Import {
                target: path.to_string(),
            },
        )?;
        if !self.loaded.insert(path.to_string()) {
            return Ok(());
        }
        self.tree.symbols.module(path);

        let dir = self.tree.root.join(path);
        if dir.is_dir() {
            return self.load_folder(&inner, &dir);
        }
        let file = dir.with_extension(EXTENSION);
        if file.is_file() {
            return self.load_file(&inner, &file);
        }
        Err(SourceError::Io {
            path: dir,
            message: "import target is neither a folder nor a .bpo file".to_string(),
        })
    }
}

fn invalid(block: &Block, message: &str) -> SourceError {
    SourceError::InvalidBlock {
        file: block.file.clone(),
        kind: block.kind.clone(),
        message: message.to_string(),
    }
}
