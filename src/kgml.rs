use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, Node, ParsingOptions};
use tracing::debug;

use crate::domain::{CompoundCode, PathwayCode, PathwayCompoundRow};
use crate::error::KeggError;

static COMPOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"C[0-9]{5}").expect("compound pattern is valid"));

/// How a single KGML `<entry>` contributes to a pathway row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// `type="compound"`. `prefixed` is false when the name lacked the `cpd:` prefix.
    Compound {
        codes: Vec<CompoundCode>,
        prefixed: bool,
    },
    Other,
}

/// KGML files carry a DOCTYPE, so DTDs have to be accepted.
pub fn parse_kgml<'a>(pathway: &PathwayCode, text: &'a str) -> Result<Document<'a>, KeggError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options).map_err(|err| KeggError::MalformedMarkup {
        pathway: pathway.to_string(),
        reason: err.to_string(),
    })
}

/// Pathway code declared by the document root, e.g. `path:hsa00010` -> `hsa00010`.
pub fn document_pathway_code(document: &Document<'_>) -> Option<String> {
    document
        .root_element()
        .attribute("name")
        .map(|name| name.strip_prefix("path:").unwrap_or(name).to_string())
}

pub fn compound_matches(text: &str) -> Vec<CompoundCode> {
    COMPOUND_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

pub fn classify_entry(pathway: &PathwayCode, entry: Node<'_, '_>) -> Result<EntryKind, KeggError> {
    let malformed = |attribute: &str| KeggError::MalformedMarkup {
        pathway: pathway.to_string(),
        reason: format!(
            "entry {} has no `{attribute}` attribute",
            entry.attribute("id").unwrap_or("?")
        ),
    };
    let kind = entry.attribute("type").ok_or_else(|| malformed("type"))?;
    let name = entry.attribute("name").ok_or_else(|| malformed("name"))?;
    if kind != "compound" {
        return Ok(EntryKind::Other);
    }

    let (stripped, prefixed) = match name.strip_prefix("cpd:") {
        Some(rest) => (rest, true),
        None => (name, false),
    };
    Ok(EntryKind::Compound {
        codes: compound_matches(stripped),
        prefixed,
    })
}

pub fn extract_compounds(
    pathway: &PathwayCode,
    document: &Document<'_>,
) -> Result<PathwayCompoundRow, KeggError> {
    let mut row = PathwayCompoundRow::new(pathway.clone());
    let entries = document
        .root_element()
        .children()
        .filter(|node| node.is_element() && node.has_tag_name("entry"));

    for entry in entries {
        match classify_entry(pathway, entry)? {
            EntryKind::Compound { codes, prefixed } => {
                if !prefixed {
                    debug!(
                        pathway = %pathway,
                        name = entry.attribute("name").unwrap_or_default(),
                        "compound entry without cpd: prefix"
                    );
                }
                row.compounds.extend(codes);
            }
            EntryKind::Other => {}
        }
    }
    Ok(row)
}

pub fn extract_from_kgml(
    pathway: &PathwayCode,
    text: &str,
) -> Result<PathwayCompoundRow, KeggError> {
    let document = parse_kgml(pathway, text)?;
    extract_compounds(pathway, &document)
}

/// Drops repeated compounds, keeping the first occurrence of each.
pub fn dedup_compounds(row: &mut PathwayCompoundRow) {
    let mut seen = HashSet::new();
    row.compounds.retain(|code| seen.insert(code.clone()));
}
