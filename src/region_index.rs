// src/region_index.rs
//
// Term index: normalized anatomical term -> regions carrying that term.

use crate::analysis_data::Region;
use regex::Regex;
use std::collections::HashMap;

/// Anatomical family substrings and the plural category term each maps to.
/// Evaluated independently per label, in this order.
pub const CATEGORY_TERMS: &[(&str, &str)] = &[
    ("cuneiform", "cuneiforms"),
    ("metatarsal", "metatarsals"),
    ("phalanx", "phalanges"),
    ("tendon", "tendons"),
    ("ligament", "ligaments"),
    ("joint", "joints"),
];

/// Plural phrases that count as a mention of a region whose label contains
/// the family word. Superset of `CATEGORY_TERMS` used by the report generator.
pub const MENTION_PLURALS: &[(&str, &str)] = &[
    ("cuneiform", "cuneiforms"),
    ("metatarsal", "metatarsals"),
    ("phalanx", "phalanges"),
    ("tarsal", "tarsal bones"),
    ("tendon", "tendons"),
    ("ligament", "ligaments"),
    ("joint", "joints"),
];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TermIndex {
    entries: Vec<TermEntry>,
    positions: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TermEntry {
    pub term: String,
    pub regions: Vec<Region>,
}

impl TermIndex {
    /// Build the index from the mentioned regions, in region list order.
    /// Keys keep the order in which they were first inserted.
    pub fn build(regions: &[Region]) -> Self {
        let mut index = TermIndex::default();

        for region in regions.iter().filter(|r| r.mentioned) {
            if !region.is_labeled() {
                log::warn!(
                    "Region {} ({}) is mentioned but has no label; not indexed",
                    region.number,
                    region.id
                );
                continue;
            }

            let label = region.normalized_label();
            index.insert(&label, region);

            // malformed regions keep their exact label only
            if region.bbox.is_none() {
                log::warn!(
                    "Region {} ({}) has no valid bbox; skipping category terms",
                    region.number,
                    label
                );
                continue;
            }
            for (family, category) in CATEGORY_TERMS {
                if label.contains(family) {
                    index.insert(category, region);
                }
            }
        }

        log::debug!(
            "Built term index: {} terms from {} regions",
            index.len(),
            regions.len()
        );
        index
    }

    fn insert(&mut self, term: &str, region: &Region) {
        match self.positions.get(term) {
            Some(&pos) => self.entries[pos].regions.push(region.clone()),
            None => {
                self.positions.insert(term.to_string(), self.entries.len());
                self.entries.push(TermEntry {
                    term: term.to_string(),
                    regions: vec![region.clone()],
                });
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, term: &str) -> Option<&[Region]> {
        self.positions
            .get(term)
            .map(|&pos| self.entries[pos].regions.as_slice())
    }

    /// Keys in enumeration order.
    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.term.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TermEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every term that links to the given region ordinal.
    pub fn terms_for_region(&self, number: u32) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.regions.iter().any(|r| r.number == number))
            .map(|e| e.term.as_str())
            .collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-insensitive pattern for `phrase` as a whole word.
///
/// `\b` is only anchored on an edge whose character is a word character, so
/// phrases like "talus (left)" still match.
pub fn word_pattern(phrase: &str) -> String {
    let starts_word = phrase.chars().next().map(is_word_char).unwrap_or(false);
    let ends_word = phrase.chars().last().map(is_word_char).unwrap_or(false);
    format!(
        "(?i){}{}{}",
        if starts_word { r"\b" } else { "" },
        regex::escape(phrase),
        if ends_word { r"\b" } else { "" }
    )
}

/// Case-insensitive, word-bounded search for `phrase` in `text`.
fn contains_word(text: &str, phrase: &str) -> bool {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return false;
    }
    match Regex::new(&word_pattern(phrase)) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            log::warn!("Could not build mention pattern for '{}': {}", phrase, e);
            false
        }
    }
}

/// Whether the diagnosis mentions a region label, either literally or
/// through the plural of one of the label's family words.
pub fn detect_mention(diagnosis: &str, label: &str) -> bool {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return false;
    }
    if contains_word(diagnosis, &label) {
        return true;
    }

    label.split_whitespace().any(|word| {
        MENTION_PLURALS
            .iter()
            .any(|(family, plural)| word == *family && contains_word(diagnosis, plural))
    })
}

/// Fill the `mentioned` flag of the regions at `positions` from the diagnosis.
pub fn apply_mentions(diagnosis: &str, regions: &mut [Region], positions: &[usize]) {
    for &pos in positions {
        if let Some(region) = regions.get_mut(pos) {
            region.mentioned = detect_mention(diagnosis, &region.label);
            if region.mentioned {
                log::debug!("Region {} ({}) mentioned in diagnosis", region.number, region.label);
            }
        }
    }
}
