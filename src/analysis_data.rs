// src/analysis_data.rs
use serde::{Deserialize, Serialize};

/// Grey used by the pipeline for regions without an assigned colour.
pub const FALLBACK_COLOR: Rgb = Rgb(128, 128, 128);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub image_reference: String,
    pub regions: Vec<Region>,
    pub diagnosis: String,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub filename: String,
    pub num_regions: Option<usize>,
    pub mentioned_regions: Option<usize>,
    // Declared source dimensions, informational only
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub number: u32,
    pub label: String,
    pub mentioned: bool,
    pub color: Rgb,
    pub bbox: Option<BoundingBox>,
    pub center: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Axis-aligned box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl AnalysisResult {
    pub fn mentioned_count(&self) -> usize {
        self.regions.iter().filter(|r| r.mentioned).count()
    }

    /// True when the declared mentioned count (if any) agrees with the regions.
    pub fn metadata_consistent(&self) -> bool {
        match self.metadata.mentioned_regions {
            Some(declared) => declared == self.mentioned_count(),
            None => true,
        }
    }
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            filename: String::new(),
            num_regions: None,
            mentioned_regions: None,
            width: None,
            height: None,
        }
    }
}

impl Region {
    pub fn new(number: u32, label: &str) -> Self {
        Self {
            id: format!("region_{}", number),
            number,
            label: label.to_string(),
            mentioned: false,
            color: FALLBACK_COLOR,
            bbox: None,
            center: None,
        }
    }

    pub fn with_mentioned(mut self, mentioned: bool) -> Self {
        self.mentioned = mentioned;
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.center = Some(bbox.center());
        self.bbox = Some(bbox);
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// Lower-cased, trimmed label used as the term index key.
    pub fn normalized_label(&self) -> String {
        self.label.trim().to_lowercase()
    }

    pub fn is_labeled(&self) -> bool {
        !self.label.trim().is_empty()
    }

    pub fn display_label(&self) -> String {
        if self.is_labeled() {
            self.label.trim().to_string()
        } else {
            format!("unlabeled region {}", self.number)
        }
    }
}

impl Rgb {
    /// Accepts `[r, g, b]`; anything else yields `None`.
    pub fn from_slice(channels: &[u8]) -> Option<Self> {
        match channels {
            [r, g, b] => Some(Rgb(*r, *g, *b)),
            _ => None,
        }
    }

    pub fn to_css(&self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Option<Self> {
        let all_finite = [left, top, right, bottom].iter().all(|v| v.is_finite());
        if all_finite && left < right && top < bottom {
            Some(Self {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// Parse `[x1, y1, x2, y2]`.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [left, top, right, bottom] => Self::new(*left, *top, *right, *bottom),
            _ => None,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.left + self.width() / 2.0,
            self.top + self.height() / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_validation() {
        assert!(BoundingBox::new(100.0, 150.0, 300.0, 450.0).is_some());
        assert!(BoundingBox::new(300.0, 150.0, 100.0, 450.0).is_none());
        assert!(BoundingBox::new(0.0, 10.0, 10.0, 10.0).is_none());
        assert!(BoundingBox::new(0.0, f64::NAN, 10.0, 10.0).is_none());
        assert!(BoundingBox::from_slice(&[1.0, 2.0, 3.0]).is_none());

        let bbox = BoundingBox::from_slice(&[100.0, 150.0, 300.0, 450.0]).unwrap();
        assert_eq!(bbox.width(), 200.0);
        assert_eq!(bbox.height(), 300.0);
        assert_eq!(bbox.center(), (200.0, 300.0));
    }

    #[test]
    fn test_region_labels() {
        let region = Region::new(4, "  Medial Cuneiform ");
        assert_eq!(region.normalized_label(), "medial cuneiform");
        assert_eq!(region.id, "region_4");
        assert!(region.is_labeled());

        let blank = Region::new(5, "   ");
        assert!(!blank.is_labeled());
        assert_eq!(blank.display_label(), "unlabeled region 5");
    }

    #[test]
    fn test_metadata_consistency() {
        let mut result = AnalysisResult::default();
        result.regions = vec![
            Region::new(1, "talus").with_mentioned(true),
            Region::new(2, "calcaneus"),
        ];
        assert!(result.metadata_consistent());

        result.metadata.mentioned_regions = Some(1);
        assert!(result.metadata_consistent());

        result.metadata.mentioned_regions = Some(2);
        assert!(!result.metadata_consistent());
        assert_eq!(result.mentioned_count(), 1);
    }

    #[test]
    fn test_rgb() {
        assert_eq!(Rgb::from_slice(&[1, 2, 3]), Some(Rgb(1, 2, 3)));
        assert_eq!(Rgb::from_slice(&[1, 2]), None);
        assert_eq!(Rgb(255, 0, 10).to_css(), "rgb(255, 0, 10)");
    }
}
