// src/overlay.rs
use crate::analysis_data::{Region, Rgb};
use crate::selection::ActiveSelection;

/// Natural (intrinsic) pixel size of the loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    /// `None` until the browser reports real dimensions.
    pub fn loaded(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }
}

/// Highlight rectangle positioned in percent of the natural image size.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRect {
    pub number: u32,
    pub label: String,
    pub left_pct: f64,
    pub top_pct: f64,
    pub width_pct: f64,
    pub height_pct: f64,
}

impl OverlayRect {
    pub fn css_position(&self) -> String {
        format!(
            "left: {:.4}%; top: {:.4}%; width: {:.4}%; height: {:.4}%;",
            self.left_pct, self.top_pct, self.width_pct, self.height_pct
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub number: u32,
    pub label: String,
    pub color: Rgb,
    pub active: bool,
    /// Report terms that link to this region.
    pub terms: Vec<String>,
}

/// One rectangle per selected region, in selection order.
///
/// Ordinals missing from `regions` and regions without a usable bbox are
/// skipped. Nothing is produced before the image size is known.
pub fn overlay_rects(
    selection: &ActiveSelection,
    regions: &[Region],
    image: Option<ImageSize>,
) -> Vec<OverlayRect> {
    let Some(size) = image else {
        return Vec::new();
    };
    let w = size.width as f64;
    let h = size.height as f64;

    let mut rects = Vec::new();
    for &number in selection.numbers() {
        let Some(region) = regions.iter().find(|r| r.number == number) else {
            log::debug!("Selection references unknown region {}", number);
            continue;
        };
        let Some(bbox) = region.bbox else {
            log::warn!("Region {} ({}) has no valid bbox; no overlay", number, region.id);
            continue;
        };

        rects.push(OverlayRect {
            number,
            label: region.display_label(),
            left_pct: bbox.left / w * 100.0,
            top_pct: bbox.top / h * 100.0,
            width_pct: bbox.width() / w * 100.0,
            height_pct: bbox.height() / h * 100.0,
        });
    }
    rects
}

/// Legend rows for every mentioned region, in region list order.
pub fn legend_entries(regions: &[Region], selection: &ActiveSelection) -> Vec<LegendEntry> {
    regions
        .iter()
        .filter(|r| r.mentioned)
        .map(|r| LegendEntry {
            number: r.number,
            label: r.display_label(),
            color: r.color,
            active: selection.contains(r.number),
            terms: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_data::BoundingBox;

    fn boxed(number: u32, label: &str, bbox: [f64; 4]) -> Region {
        Region::new(number, label)
            .with_mentioned(true)
            .with_bbox(BoundingBox::from_slice(&bbox).unwrap())
    }

    #[test]
    fn test_percent_geometry() {
        let regions = vec![boxed(1, "talus", [100.0, 150.0, 300.0, 450.0])];
        let rects = overlay_rects(
            &ActiveSelection::from_numbers([1]),
            &regions,
            ImageSize::loaded(800, 600),
        );

        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].left_pct, 12.5);
        assert_eq!(rects[0].top_pct, 25.0);
        assert_eq!(rects[0].width_pct, 25.0);
        assert_eq!(rects[0].height_pct, 50.0);
        assert_eq!(
            rects[0].css_position(),
            "left: 12.5000%; top: 25.0000%; width: 25.0000%; height: 50.0000%;"
        );
    }

    #[test]
    fn test_no_overlays_before_load() {
        let regions = vec![boxed(1, "talus", [100.0, 150.0, 300.0, 450.0])];
        let selection = ActiveSelection::from_numbers([1]);

        assert!(ImageSize::loaded(0, 600).is_none());
        assert!(overlay_rects(&selection, &regions, ImageSize::loaded(0, 0)).is_empty());
        assert!(overlay_rects(&selection, &regions, None).is_empty());

        // same selection once the image reports its size
        assert_eq!(
            overlay_rects(&selection, &regions, ImageSize::loaded(800, 600)).len(),
            1
        );
    }

    #[test]
    fn test_unknown_and_malformed_regions_skipped() {
        let regions = vec![
            boxed(1, "talus", [0.0, 0.0, 10.0, 10.0]),
            Region::new(2, "navicular").with_mentioned(true),
            boxed(3, "cuboid", [10.0, 10.0, 20.0, 20.0]),
        ];
        let selection = ActiveSelection::from_numbers([3, 2, 42, 1]);
        let rects = overlay_rects(&selection, &regions, ImageSize::loaded(100, 100));

        assert_eq!(rects.iter().map(|r| r.number).collect::<Vec<_>>(), vec![3, 1]);
        assert!(overlay_rects(&ActiveSelection::None, &regions, ImageSize::loaded(100, 100)).is_empty());
    }

    #[test]
    fn test_legend_lists_mentioned_regions() {
        let regions = vec![
            boxed(1, "talus", [0.0, 0.0, 10.0, 10.0]).with_color(Rgb(200, 10, 10)),
            Region::new(2, "calcaneus"),
            boxed(3, "medial cuneiform", [10.0, 10.0, 20.0, 20.0]),
        ];
        let legend = legend_entries(&regions, &ActiveSelection::from_numbers([3]));

        assert_eq!(legend.len(), 2);
        assert_eq!(legend[0].label, "talus");
        assert_eq!(legend[0].color, Rgb(200, 10, 10));
        assert!(!legend[0].active);
        assert_eq!(legend[1].number, 3);
        assert!(legend[1].active);
    }
}
