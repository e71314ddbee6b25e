// src/linked_analysis.rs
//
// Everything derived from one loaded analysis, swapped as a unit.

use crate::analysis_data::AnalysisResult;
use crate::overlay::{legend_entries, overlay_rects, ImageSize, LegendEntry, OverlayRect};
use crate::region_index::TermIndex;
use crate::report_parser::{highlight_sections, split_sections, HighlightedSection};
use crate::selection::{ActiveSelection, SelectionState};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct LinkedAnalysis {
    pub result: Rc<AnalysisResult>,
    pub index: Rc<TermIndex>,
    pub sections: Rc<Vec<HighlightedSection>>,
    selection: SelectionState,
}

impl LinkedAnalysis {
    pub fn new(result: AnalysisResult) -> Self {
        let index = TermIndex::build(&result.regions);
        let sections = highlight_sections(&split_sections(&result.diagnosis), &index);
        log::debug!(
            "Linked analysis: {} terms, {} report sections",
            index.len(),
            sections.len()
        );

        Self {
            result: Rc::new(result),
            index: Rc::new(index),
            sections: Rc::new(sections),
            selection: SelectionState::default(),
        }
    }

    pub fn active(&self) -> &ActiveSelection {
        self.selection.active()
    }

    pub fn is_pinned(&self) -> bool {
        self.selection.is_pinned()
    }

    pub fn hover_enter(&mut self, numbers: Vec<u32>) -> bool {
        self.selection
            .hover_enter(ActiveSelection::from_numbers(numbers))
    }

    pub fn hover_leave(&mut self) -> bool {
        self.selection.hover_leave()
    }

    pub fn toggle_pin(&mut self, numbers: Vec<u32>) -> bool {
        self.selection
            .toggle_pin(ActiveSelection::from_numbers(numbers))
    }

    pub fn clear_pin(&mut self) -> bool {
        self.selection.clear_pin()
    }

    /// Drop both the hovered and the pinned selection.
    pub fn clear_selection(&mut self) -> bool {
        let changed = !self.active().is_none();
        self.selection.reset();
        changed
    }

    pub fn overlays(&self, image: Option<ImageSize>) -> Vec<OverlayRect> {
        overlay_rects(self.active(), &self.result.regions, image)
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        let mut entries = legend_entries(&self.result.regions, self.active());
        for entry in &mut entries {
            entry.terms = self
                .index
                .terms_for_region(entry.number)
                .into_iter()
                .map(str::to_string)
                .collect();
        }
        entries
    }
}
