/*
// src/report_parser.rs
//
// Line-based splitter for generated diagnosis reports. Section boundaries
// are whole-line headers (FINDINGS / IMPRESSION / RECOMMENDATIONS) or
// numbered list items; everything else is folded into the current section.
*/

use crate::region_index::TermIndex;
use crate::term_highlighter::{highlight, Segment};
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedSection {
    pub title: Option<Vec<Segment>>,
    pub content: Vec<Segment>,
}

enum Header {
    Named(String),
    Numbered(String),
}

struct HeaderPatterns {
    named: Regex,
    numbered: Regex,
}

impl HeaderPatterns {
    fn new() -> Option<Self> {
        let named = Regex::new(r"(?i)^(findings|impression|recommendations):?$").ok()?;
        let numbered = Regex::new(r"^\d+\. ").ok()?;
        Some(Self { named, numbered })
    }

    fn classify(&self, line: &str) -> Option<Header> {
        if let Some(caps) = self.named.captures(line) {
            return Some(Header::Named(caps[1].to_uppercase()));
        }
        if self.numbered.is_match(line) {
            return Some(Header::Numbered(line.to_string()));
        }
        None
    }
}

/// Split a diagnosis report into titled sections.
///
/// Blank lines are dropped and content lines are joined with single spaces.
/// Text before the first header becomes an untitled leading section.
pub fn split_sections(text: &str) -> Vec<ReportSection> {
    let Some(patterns) = HeaderPatterns::new() else {
        log::error!("Report header patterns failed to compile");
        return fallback_sections(text);
    };

    let mut sections = Vec::new();
    let mut current: Option<ReportSection> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match patterns.classify(line) {
            Some(header) => {
                if let Some(section) = current.take() {
                    sections.push(section);
                }
                let title = match header {
                    Header::Named(name) => name,
                    Header::Numbered(item) => item,
                };
                current = Some(ReportSection {
                    title: Some(title),
                    content: String::new(),
                });
            }
            None => {
                let section = current.get_or_insert_with(|| ReportSection {
                    title: None,
                    content: String::new(),
                });
                if !section.content.is_empty() {
                    section.content.push(' ');
                }
                section.content.push_str(line);
            }
        }
    }

    if let Some(section) = current.take() {
        sections.push(section);
    }

    sections
}

fn fallback_sections(text: &str) -> Vec<ReportSection> {
    let content = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if content.is_empty() {
        Vec::new()
    } else {
        vec![ReportSection {
            title: None,
            content,
        }]
    }
}

/// Run term highlighting over the title and content of every section.
pub fn highlight_sections(sections: &[ReportSection], index: &TermIndex) -> Vec<HighlightedSection> {
    sections
        .iter()
        .map(|section| HighlightedSection {
            title: section.title.as_deref().map(|t| highlight(t, index)),
            content: highlight(&section.content, index),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_data::Region;

    fn titles(sections: &[ReportSection]) -> Vec<Option<&str>> {
        sections.iter().map(|s| s.title.as_deref()).collect()
    }

    #[test]
    fn test_named_headers() {
        let report = "FINDINGS:\nThe talus is intact.\n\nMild effusion.\nimpression\nNo fracture.\nRecommendations:\nFollow up.";
        let sections = split_sections(report);

        assert_eq!(
            titles(&sections),
            vec![Some("FINDINGS"), Some("IMPRESSION"), Some("RECOMMENDATIONS")]
        );
        assert_eq!(sections[0].content, "The talus is intact. Mild effusion.");
        assert_eq!(sections[1].content, "No fracture.");
        assert_eq!(sections[2].content, "Follow up.");
    }

    #[test]
    fn test_leading_untitled_section() {
        let report = "MRI of the left ankle.\n   Sagittal view.  \nFINDINGS\nNormal.";
        let sections = split_sections(report);

        assert_eq!(titles(&sections), vec![None, Some("FINDINGS")]);
        assert_eq!(sections[0].content, "MRI of the left ankle. Sagittal view.");
    }

    #[test]
    fn test_numbered_items() {
        let report = "IMPRESSION:\n1. Talus contusion.\nLikely traumatic.\n2. Intact cuneiforms.\n3.No space here";
        let sections = split_sections(report);

        assert_eq!(
            titles(&sections),
            vec![
                Some("IMPRESSION"),
                Some("1. Talus contusion."),
                Some("2. Intact cuneiforms.")
            ]
        );
        assert_eq!(sections[0].content, "");
        assert_eq!(sections[1].content, "Likely traumatic.");
        assert_eq!(sections[2].content, "3.No space here");
    }

    #[test]
    fn test_header_words_inside_lines_are_content() {
        let sections = split_sections("Findings are unremarkable.\nIMPRESSION: normal");
        assert_eq!(titles(&sections), vec![None]);
        assert_eq!(
            sections[0].content,
            "Findings are unremarkable. IMPRESSION: normal"
        );
    }

    #[test]
    fn test_empty_report() {
        assert!(split_sections("").is_empty());
        assert!(split_sections("\n  \n\t\n").is_empty());
    }

    #[test]
    fn test_highlight_sections() {
        let index = TermIndex::build(&[Region::new(1, "talus").with_mentioned(true)]);
        let sections = split_sections("FINDINGS:\nTalus edema.\n1. talus contusion");
        let highlighted = highlight_sections(&sections, &index);

        assert_eq!(highlighted.len(), 2);
        assert_eq!(highlighted[0].content.iter().filter(|s| s.is_term()).count(), 1);
        let title = highlighted[1].title.as_ref().unwrap();
        assert!(title.iter().any(|s| s.is_term() && s.text == "talus"));
    }
}
