// src/selection.rs
//
// Active region selection shared by the report text and the image side.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveSelection {
    #[default]
    None,
    Regions(Vec<u32>),
}

impl ActiveSelection {
    /// Empty input collapses to `None`; duplicates are dropped, order kept.
    pub fn from_numbers<I: IntoIterator<Item = u32>>(numbers: I) -> Self {
        let mut unique = Vec::new();
        for n in numbers {
            if !unique.contains(&n) {
                unique.push(n);
            }
        }
        if unique.is_empty() {
            ActiveSelection::None
        } else {
            ActiveSelection::Regions(unique)
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ActiveSelection::None)
    }

    pub fn numbers(&self) -> &[u32] {
        match self {
            ActiveSelection::None => &[],
            ActiveSelection::Regions(numbers) => numbers,
        }
    }

    pub fn contains(&self, number: u32) -> bool {
        self.numbers().contains(&number)
    }

    pub fn intersects(&self, numbers: &[u32]) -> bool {
        numbers.iter().any(|n| self.contains(*n))
    }
}

/// Hover plus click-to-pin state.
///
/// While something is pinned, hovering is ignored and the pin stays active.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    hovered: ActiveSelection,
    pinned: ActiveSelection,
}

impl SelectionState {
    pub fn active(&self) -> &ActiveSelection {
        if self.pinned.is_none() {
            &self.hovered
        } else {
            &self.pinned
        }
    }

    pub fn is_pinned(&self) -> bool {
        !self.pinned.is_none()
    }

    /// Returns true when the active selection changed.
    pub fn hover_enter(&mut self, selection: ActiveSelection) -> bool {
        if self.is_pinned() || self.hovered == selection {
            return false;
        }
        self.hovered = selection;
        true
    }

    pub fn hover_leave(&mut self) -> bool {
        self.hover_enter(ActiveSelection::None)
    }

    /// Pin `selection`, or unpin when it is already the pinned one.
    pub fn toggle_pin(&mut self, selection: ActiveSelection) -> bool {
        if self.pinned == selection {
            self.pinned = ActiveSelection::None;
        } else {
            self.pinned = selection;
        }
        true
    }

    pub fn clear_pin(&mut self) -> bool {
        if self.pinned.is_none() {
            return false;
        }
        self.pinned = ActiveSelection::None;
        true
    }

    pub fn reset(&mut self) {
        self.hovered = ActiveSelection::None;
        self.pinned = ActiveSelection::None;
    }
}
