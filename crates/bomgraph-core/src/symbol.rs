//! Symbols: the immutable, digest-identified objects of a catalog.
//!
//! Every symbol carries a human-facing `qualifier` (a mutable lookup key)
//! and a `digest` (its identity). The digest covers the symbol kind and its
//! content but never the qualifier, so renaming alone cannot fork identity.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::digest::{Digest, canonical_bytes, canonical_value};
use crate::error::SymbolError;

/// Namespace prefix for companions synthesized from an item.
pub const IMPLICIT_NAMESPACE: &str = "__implicit__";

/// Role given to the single output line of an implicit process.
pub const DEFAULT_ROLE: &str = "default";

/// Type tag recorded in the catalog's type index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Item,
    CoItem,
    Process,
    CoProcess,
    Contract,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Item => "item",
            SymbolKind::CoItem => "coitem",
            SymbolKind::Process => "process",
            SymbolKind::CoProcess => "coprocess",
            SymbolKind::Contract => "contract",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "item" => Ok(SymbolKind::Item),
            "coitem" => Ok(SymbolKind::CoItem),
            "process" => Ok(SymbolKind::Process),
            "coprocess" => Ok(SymbolKind::CoProcess),
            "contract" => Ok(SymbolKind::Contract),
            other => Err(SymbolError::UnknownKind(other.to_string())),
        }
    }
}

/// How an item relates to the item it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationKind {
    Supersession,
    Interchangeable,
    Variant,
    Change,
}

impl FromStr for DerivationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supersession" => Ok(DerivationKind::Supersession),
            "interchangeable" => Ok(DerivationKind::Interchangeable),
            "variant" => Ok(DerivationKind::Variant),
            "change" => Ok(DerivationKind::Change),
            other => Err(format!(
                "unknown derivation kind `{other}` (expected supersession, interchangeable, variant or change)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derivation {
    pub derived_from: Digest,
    pub kind: DerivationKind,
}

/// An external file attached to an item, pinned by its content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    #[serde(rename = "ref")]
    pub reference: String,
    pub path: String,
    #[serde(default)]
    pub digest: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemContent {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<FileReference>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

/// An immutable snapshot of a part or assembly.
///
/// Any change to content, derivation, or contracts produces a new item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub qualifier: String,
    pub content: ItemContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation: Option<Derivation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require: Vec<Digest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implement: Vec<Digest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<Digest>,
    #[serde(skip)]
    pub digest: Digest,
}

impl Item {
    pub fn new(qualifier: impl Into<String>, content: ItemContent) -> Self {
        Self {
            qualifier: qualifier.into(),
            content,
            ..Self::default()
        }
    }
}

/// Consumption token for an item. Recipes consume co-items, never items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoItem {
    pub qualifier: String,
    pub item: Digest,
    #[serde(skip)]
    pub digest: Digest,
}

/// A quantified reference to a consumed or produced entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    #[serde(default)]
    pub role: String,
    pub item: Digest,
    pub qty: f64,
}

impl BomLine {
    pub fn new(role: impl Into<String>, item: Digest, qty: f64) -> Self {
        Self {
            role: role.into(),
            item,
            qty,
        }
    }
}

/// A recipe: consumes input co-items, produces output items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub qualifier: String,
    #[serde(default)]
    pub cycle_time: f64,
    #[serde(default)]
    pub input: Vec<BomLine>,
    #[serde(default)]
    pub output: Vec<BomLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predecessor: Option<Digest>,
    #[serde(skip)]
    pub digest: Digest,
}

/// The identity recipe turning an item into its co-item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoProcess {
    pub qualifier: String,
    pub input: Vec<BomLine>,
    pub output: Vec<BomLine>,
    #[serde(skip)]
    pub digest: Digest,
}

/// A named, parameterized capability or requirement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub qualifier: String,
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(skip)]
    pub digest: Digest,
}

/// Which companion of an item a qualifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Companion {
    CoItem,
    CoProcess,
    Process,
}

/// Qualifier of an item's synthesized companion, under the implicit namespace.
pub fn companion_qualifier(item_qualifier: &str, companion: Companion) -> String {
    let suffix = match companion {
        Companion::CoItem => "coitem",
        Companion::CoProcess => "coprocess",
        Companion::Process => "process",
    };
    format!(
        "{IMPLICIT_NAMESPACE}.{}.{suffix}",
        item_qualifier.trim_start_matches('.')
    )
}

/// Whether a qualifier lives under the implicit namespace.
pub fn is_implicit(qualifier: &str) -> bool {
    qualifier.starts_with(IMPLICIT_NAMESPACE)
}

/// Any catalog object.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Item(Item),
    CoItem(CoItem),
    Process(Process),
    CoProcess(CoProcess),
    Contract(Contract),
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Item(_) => SymbolKind::Item,
            Symbol::CoItem(_) => SymbolKind::CoItem,
            Symbol::Process(_) => SymbolKind::Process,
            Symbol::CoProcess(_) => SymbolKind::CoProcess,
            Symbol::Contract(_) => SymbolKind::Contract,
        }
    }

    pub fn qualifier(&self) -> &str {
        match self {
            Symbol::Item(s) => &s.qualifier,
            Symbol::CoItem(s) => &s.qualifier,
            Symbol::Process(s) => &s.qualifier,
            Symbol::CoProcess(s) => &s.qualifier,
            Symbol::Contract(s) => &s.qualifier,
        }
    }

    pub fn digest(&self) -> &Digest {
        match self {
            Symbol::Item(s) => &s.digest,
            Symbol::CoItem(s) => &s.digest,
            Symbol::Process(s) => &s.digest,
            Symbol::CoProcess(s) => &s.digest,
            Symbol::Contract(s) => &s.digest,
        }
    }

    fn set_digest(&mut self, digest: Digest) {
        match self {
            Symbol::Item(s) => s.digest = digest,
            Symbol::CoItem(s) => s.digest = digest,
            Symbol::Process(s) => s.digest = digest,
            Symbol::CoProcess(s) => s.digest = digest,
            Symbol::Contract(s) => s.digest = digest,
        }
    }

    fn to_json(&self) -> Result<Value, SymbolError> {
        match self {
            Symbol::Item(s) => canonical_value(s),
            Symbol::CoItem(s) => canonical_value(s),
            Symbol::Process(s) => canonical_value(s),
            Symbol::CoProcess(s) => canonical_value(s),
            Symbol::Contract(s) => canonical_value(s),
        }
    }

    /// Digest over `{kind, content}`, where content is the full symbol,
    /// qualifier included.
    pub fn compute_digest(&self) -> Result<Digest, SymbolError> {
        let content = self.to_json()?;
        Digest::of(&json!({ "kind": self.kind().as_str(), "content": content }))
    }

    /// Compute the digest and store it on the symbol.
    pub fn seal(mut self) -> Result<Self, SymbolError> {
        let digest = self.compute_digest()?;
        self.set_digest(digest);
        Ok(self)
    }

    /// Blob bytes: the full symbol, qualifier included, key-sorted.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, SymbolError> {
        canonical_bytes(&self.to_json()?)
    }

    /// Decode blob bytes. The kind comes from the catalog's type index and
    /// the digest from the lookup key; neither is embedded in the blob.
    pub fn from_canonical_bytes(
        kind: SymbolKind,
        digest: Digest,
        bytes: &[u8],
    ) -> Result<Self, SymbolError> {
        fn decode<T: DeserializeOwned>(
            kind: SymbolKind,
            digest: &Digest,
            bytes: &[u8],
        ) -> Result<T, SymbolError> {
            serde_json::from_slice(bytes).map_err(|e| SymbolError::Deserialize {
                kind,
                digest: digest.to_string(),
                message: e.to_string(),
            })
        }

        let mut symbol = match kind {
            SymbolKind::Item => Symbol::Item(decode(kind, &digest, bytes)?),
            SymbolKind::CoItem => Symbol::CoItem(decode(kind, &digest, bytes)?),
            SymbolKind::Process => Symbol::Process(decode(kind, &digest, bytes)?),
            SymbolKind::CoProcess => Symbol::CoProcess(decode(kind, &digest, bytes)?),
            SymbolKind::Contract => Symbol::Contract(decode(kind, &digest, bytes)?),
        };
        symbol.set_digest(digest);
        Ok(symbol)
    }

    fn mismatch(&self, expected: SymbolKind) -> SymbolError {
        SymbolError::TypeMismatch {
            digest: self.digest().to_string(),
            expected,
            actual: self.kind(),
        }
    }

    pub fn into_item(self) -> Result<Item, SymbolError> {
        match self {
            Symbol::Item(item) => Ok(item),
            other => Err(other.mismatch(SymbolKind::Item)),
        }
    }

    pub fn into_co_item(self) -> Result<CoItem, SymbolError> {
        match self {
            Symbol::CoItem(co_item) => Ok(co_item),
            other => Err(other.mismatch(SymbolKind::CoItem)),
        }
    }

    pub fn into_process(self) -> Result<Process, SymbolError> {
        match self {
            Symbol::Process(process) => Ok(process),
            other => Err(other.mismatch(SymbolKind::Process)),
        }
    }

    pub fn into_co_process(self) -> Result<CoProcess, SymbolError> {
        match self {
            Symbol::CoProcess(co_process) => Ok(co_process),
            other => Err(other.mismatch(SymbolKind::CoProcess)),
        }
    }

    pub fn into_contract(self) -> Result<Contract, SymbolError> {
        match self {
            Symbol::Contract(contract) => Ok(contract),
            other => Err(other.mismatch(SymbolKind::Contract)),
        }
    }
}

impl From<Item> for Symbol {
    fn from(value: Item) -> Self {
        Symbol::Item(value)
    }
}

impl From<CoItem> for Symbol {
    fn from(value: CoItem) -> Self {
        Symbol::CoItem(value)
    }
}

impl From<Process> for Symbol {
    fn from(value: Process) -> Self {
        Symbol::Process(value)
    }
}

impl From<CoProcess> for Symbol {
    fn from(value: CoProcess) -> Self {
        Symbol::CoProcess(value)
    }
}

impl From<Contract> for Symbol {
    fn from(value: Contract) -> Self {
        Symbol::Contract(value)
    }
}
