use anyhow::{Result, bail};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::catalog::RULE_ALL;
use crate::{Catalog, MetaPattern, Pattern, RuleSet};

#[derive(Deserialize)]
struct RawCatalog {
    images_folder: String,
    patterns: Vec<RawMetaPattern>,
}

#[derive(Deserialize)]
struct RawMetaPattern {
    id: u32,
    name: String,
    is_walkable: u8,
    #[serde(default)]
    tags: Vec<String>,
    weight: f32,
    #[serde(default)]
    patterns: Vec<RawPattern>,
    #[serde(default)]
    rules: RawRules,
}

#[derive(Deserialize)]
struct RawPattern {
    image_path: String,
    weight: f32,
}

#[derive(Deserialize, Default)]
struct RawRules {
    #[serde(default)]
    up: Vec<RuleEntry>,
    #[serde(default)]
    down: Vec<RuleEntry>,
    #[serde(default)]
    left: Vec<RuleEntry>,
    #[serde(default)]
    right: Vec<RuleEntry>,
}

/// A rule entry is either a uid or a text rule (tag, `"all"`, or a
/// string-form integer, which counts as a uid).
#[derive(Deserialize)]
#[serde(untagged)]
enum RuleEntry {
    Uid(u32),
    Text(String),
}

impl Catalog {
    /// Load a catalog from a JSON file (see the crate-level format notes).
    ///
    /// # Errors
    ///
    /// Fails on unreadable files and on everything [`Self::from_json`]
    /// rejects.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build a catalog from a JSON payload: create every pattern, expand
    /// text rules into explicit uid sets, then validate. The consistency
    /// report is logged and retained, but asymmetries do not fail the
    /// load; callers may inspect them through [`Self::validation`].
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, duplicate or unknown uids, and
    /// non-positive weights.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        build(&raw)
    }
}

fn build(raw: &RawCatalog) -> Result<Catalog> {
    let mut uids = BTreeSet::new();
    for pattern in &raw.patterns {
        if !uids.insert(pattern.id) {
            bail!("duplicate pattern uid {}", pattern.id);
        }
        if pattern.weight <= 0.0 {
            bail!("pattern {} has non-positive weight", pattern.id);
        }
    }

    let mut patterns = Vec::with_capacity(raw.patterns.len());
    for raw_pattern in &raw.patterns {
        let mut pattern =
            MetaPattern::new(raw_pattern.id, raw_pattern.name.as_str(), raw_pattern.weight);
        pattern.is_walkable = raw_pattern.is_walkable != 0;
        pattern.tags = raw_pattern.tags.iter().cloned().collect();
        pattern.patterns = raw_pattern
            .patterns
            .iter()
            .map(|variant| {
                Pattern::new(
                    format!("{}{}", raw.images_folder, variant.image_path),
                    variant.weight,
                )
            })
            .collect();
        pattern.rules = RuleSet::from_sets(
            resolve_entries(&raw_pattern.rules.up, raw)?,
            resolve_entries(&raw_pattern.rules.down, raw)?,
            resolve_entries(&raw_pattern.rules.left, raw)?,
            resolve_entries(&raw_pattern.rules.right, raw)?,
        );
        patterns.push(pattern);
    }

    let catalog = Catalog::new(patterns);
    let report = catalog.validation();
    if report.is_ok() {
        log::info!("{report}");
    } else {
        log::error!("{report}");
    }
    Ok(catalog)
}

/// Expand one direction's rule list into an explicit uid set.
fn resolve_entries(entries: &[RuleEntry], raw: &RawCatalog) -> Result<BTreeSet<u32>> {
    let mut resolved = BTreeSet::new();
    for entry in entries {
        match entry {
            RuleEntry::Uid(uid) => {
                resolved.insert(resolve_uid(*uid, raw)?);
            }
            RuleEntry::Text(text) => {
                // String-form integers are uids in disguise.
                if let Ok(uid) = text.parse::<u32>() {
                    resolved.insert(resolve_uid(uid, raw)?);
                } else if text == RULE_ALL {
                    resolved.extend(raw.patterns.iter().map(|pattern| pattern.id));
                } else {
                    let tagged: Vec<u32> = raw
                        .patterns
                        .iter()
                        .filter(|pattern| pattern.tags.iter().any(|tag| tag == text))
                        .map(|pattern| pattern.id)
                        .collect();
                    if tagged.is_empty() {
                        log::warn!("zero patterns with tag: {text}");
                    }
                    resolved.extend(tagged);
                }
            }
        }
    }
    Ok(resolved)
}

fn resolve_uid(uid: u32, raw: &RawCatalog) -> Result<u32> {
    if raw.patterns.iter().any(|pattern| pattern.id == uid) {
        Ok(uid)
    } else {
        bail!("rule references unknown pattern uid {uid}")
    }
}
