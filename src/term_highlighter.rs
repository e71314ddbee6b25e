// src/term_highlighter.rs
use crate::analysis_data::Region;
use crate::region_index::{word_pattern, TermIndex};
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Byte offsets into the scanned text.
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub kind: SegmentKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    Plain,
    Term { term: String, regions: Vec<Region> },
}

impl Segment {
    fn plain(text: &str, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            text: text[start..end].to_string(),
            kind: SegmentKind::Plain,
        }
    }

    pub fn is_term(&self) -> bool {
        matches!(self.kind, SegmentKind::Term { .. })
    }

    /// Region ordinals this segment links to, first occurrence order, no duplicates.
    pub fn region_numbers(&self) -> Vec<u32> {
        match &self.kind {
            SegmentKind::Plain => Vec::new(),
            SegmentKind::Term { regions, .. } => {
                let mut numbers: Vec<u32> = Vec::with_capacity(regions.len());
                for region in regions {
                    if !numbers.contains(&region.number) {
                        numbers.push(region.number);
                    }
                }
                numbers
            }
        }
    }

    pub fn region_labels(&self) -> Vec<String> {
        match &self.kind {
            SegmentKind::Plain => Vec::new(),
            SegmentKind::Term { regions, .. } => {
                regions.iter().map(|r| r.display_label()).collect()
            }
        }
    }
}

struct Accepted<'a> {
    start: usize,
    end: usize,
    term: &'a str,
    regions: &'a [Region],
}

fn overlaps(accepted: &[Accepted<'_>], start: usize, end: usize) -> bool {
    accepted.iter().any(|a| start < a.end && a.start < end)
}

fn term_pattern(term: &str) -> Option<Regex> {
    match Regex::new(&word_pattern(term)) {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("Skipping term '{}': {}", term, e);
            None
        }
    }
}

/// Split `text` into plain and term segments that cover it exactly.
///
/// Longer terms claim text first; a candidate occurrence that intersects an
/// already accepted range is dropped. Equal-length terms keep index order.
pub fn highlight(text: &str, index: &TermIndex) -> Vec<Segment> {
    if text.is_empty() || index.is_empty() {
        return vec![Segment::plain(text, 0, text.len())];
    }

    let mut entries: Vec<_> = index.iter().collect();
    // stable: ties stay in enumeration order
    entries.sort_by(|a, b| b.term.chars().count().cmp(&a.term.chars().count()));

    let mut accepted: Vec<Accepted<'_>> = Vec::new();
    for entry in entries {
        if entry.term.trim().is_empty() {
            continue;
        }
        let Some(re) = term_pattern(&entry.term) else {
            continue;
        };
        for m in re.find_iter(text) {
            if overlaps(&accepted, m.start(), m.end()) {
                continue;
            }
            accepted.push(Accepted {
                start: m.start(),
                end: m.end(),
                term: &entry.term,
                regions: &entry.regions,
            });
        }
    }

    accepted.sort_by_key(|a| a.start);

    let mut segments = Vec::with_capacity(accepted.len() * 2 + 1);
    let mut cursor = 0;
    for a in accepted {
        if a.start > cursor {
            segments.push(Segment::plain(text, cursor, a.start));
        }
        segments.push(Segment {
            start: a.start,
            end: a.end,
            text: text[a.start..a.end].to_string(),
            kind: SegmentKind::Term {
                term: a.term.to_string(),
                regions: a.regions.to_vec(),
            },
        });
        cursor = a.end;
    }
    if cursor < text.len() {
        segments.push(Segment::plain(text, cursor, text.len()));
    }

    segments
}
