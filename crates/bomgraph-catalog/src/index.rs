//! Append-only index logs.
//!
//! Three colon-separated logs sit at the catalog root:
//!
//! ```text
//! index    <qualifier>:<digest>
//! types    <digest>:<kind>
//! process  <process|coprocess>:<output digest>:<recipe digest>
//! ```
//!
//! Later lines win, so a qualifier re-pointed at new content only needs an
//! append. Lines with the wrong field count are a hard error.

use bomgraph_core::{Digest, SymbolKind};
use std::fs;
use std::path::Path;

use crate::error::CatalogError;

pub const QUALIFIER_LOG: &str = "index";
pub const TYPE_LOG: &str = "types";
pub const PROCESS_LOG: &str = "process";

const SEPARATOR: char = ':';

/// Which recipe kind a process-log line records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeLink {
    Process,
    CoProcess,
}

impl RecipeLink {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeLink::Process => "process",
            RecipeLink::CoProcess => "coprocess",
        }
    }
}

/// One parsed line of the process log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeEntry {
    pub link: RecipeLink,
    pub output: Digest,
    pub recipe: Digest,
}

pub fn qualifier_line(qualifier: &str, digest: &Digest) -> String {
    format!("{qualifier}{SEPARATOR}{digest}")
}

pub fn type_line(digest: &Digest, kind: SymbolKind) -> String {
    format!("{digest}{SEPARATOR}{kind}")
}

pub fn recipe_line(entry: &RecipeEntry) -> String {
    format!(
        "{}{SEPARATOR}{}{SEPARATOR}{}",
        entry.link.as_str(),
        entry.output,
        entry.recipe
    )
}

fn read_records(path: &Path, fields: usize) -> Result<Vec<(usize, Vec<String>)>, CatalogError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw =
        fs::read_to_string(path).map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
    let mut records = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parts: Vec<String> = trimmed.split(SEPARATOR).map(str::to_string).collect();
        if parts.len() != fields {
            return Err(malformed(
                path,
                line_no + 1,
                format!("expected {fields} fields, found {}", parts.len()),
            ));
        }
        records.push((line_no + 1, parts));
    }
    Ok(records)
}

fn malformed(path: &Path, line: usize, message: impl Into<String>) -> CatalogError {
    CatalogError::MalformedIndex {
        path: path.display().to_string(),
        line,
        message: message.into(),
    }
}

fn parse_digest(path: &Path, line: usize, raw: &str) -> Result<Digest, CatalogError> {
    Digest::parse(raw).map_err(|e| malformed(path, line, e.to_string()))
}

/// Load `qualifier:digest` pairs in file order.
pub fn load_qualifiers(path: &Path) -> Result<Vec<(String, Digest)>, CatalogError> {
    read_records(path, 2)?
        .into_iter()
        .map(|(line, fields)| {
            let digest = parse_digest(path, line, &fields[1])?;
            Ok((fields[0].clone(), digest))
        })
        .collect()
}

/// Load `digest:kind` pairs in file order.
pub fn load_types(path: &Path) -> Result<Vec<(Digest, SymbolKind)>, CatalogError> {
    read_records(path, 2)?
        .into_iter()
        .map(|(line, fields)| {
            let digest = parse_digest(path, line, &fields[0])?;
            let kind = fields[1]
                .parse::<SymbolKind>()
                .map_err(|e| malformed(path, line, e.to_string()))?;
            Ok((digest, kind))
        })
        .collect()
}

/// Load recipe links in file order.
pub fn load_recipes(path: &Path) -> Result<Vec<RecipeEntry>, CatalogError> {
    read_records(path, 3)?
        .into_iter()
        .map(|(line, fields)| {
            let link = match fields[0].as_str() {
                "process" => RecipeLink::Process,
                "coprocess" => RecipeLink::CoProcess,
                other => {
                    return Err(malformed(
                        path,
                        line,
                        format!("unknown recipe link `{other}`"),
                    ));
                }
            };
            Ok(RecipeEntry {
                link,
                output: parse_digest(path, line, &fields[1])?,
                recipe: parse_digest(path, line, &fields[2])?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(prefix: &str, contents: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "bomgraph-index-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::write(&path, contents).expect("fixture should write");
        path
    }

    fn hex(byte: &str) -> String {
        byte.repeat(32)
    }

    #[test]
    fn missing_log_loads_empty() {
        let path = std::env::temp_dir().join("bomgraph-index-definitely-missing");
        assert!(load_qualifiers(&path).expect("missing is empty").is_empty());
    }

    #[test]
    fn qualifier_log_keeps_file_order() {
        let path = temp_file(
            "qualifiers",
            &format!(".bike:{}\n\n.wheel:{}\n", hex("aa"), hex("bb")),
        );
        let entries = load_qualifiers(&path).expect("log should parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, ".bike");
        assert_eq!(entries[1].1.as_str(), hex("bb"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let path = temp_file("fields", &format!(".bike:{}:extra\n", hex("aa")));
        let err = load_qualifiers(&path).expect_err("three fields must fail");
        assert!(matches!(err, CatalogError::MalformedIndex { line: 1, .. }));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_type_tag_is_malformed() {
        let path = temp_file("types", &format!("{}:widget\n", hex("aa")));
        let err = load_types(&path).expect_err("unknown kind must fail");
        assert!(matches!(err, CatalogError::MalformedIndex { .. }));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn recipe_log_parses_both_links() {
        let path = temp_file(
            "recipes",
            &format!(
                "process:{}:{}\ncoprocess:{}:{}\n",
                hex("01"),
                hex("02"),
                hex("03"),
                hex("04")
            ),
        );
        let entries = load_recipes(&path).expect("log should parse");
        assert_eq!(entries[0].link, RecipeLink::Process);
        assert_eq!(entries[1].link, RecipeLink::CoProcess);
        assert_eq!(recipe_line(&entries[1]), format!("coprocess:{}:{}", hex("03"), hex("04")));
        let _ = fs::remove_file(path);
    }
}
