/*
// src/analysis_parser.rs
//
// serde_json based loader for analysis payloads. Two shapes are accepted:
// - the viewer payload served by the backend (`diagnosis` is a string)
// - the raw pipeline `data.json` (`image_info`, `diagnosis.full_report`)
// Individual regions are parsed leniently so one bad entry never drops the rest.
*/

use crate::analysis_data::*;
use crate::region_index::apply_mentions;
use crate::utils::resolve_image_reference;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct RawRegion {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    number: Value,
    #[serde(default)]
    label: Value,
    #[serde(default, alias = "mentioned_in_diagnosis")]
    mentioned: Value,
    #[serde(default)]
    color: Value,
    #[serde(default)]
    bbox: Value,
    #[serde(default)]
    center: Value,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    filename: Value,
    #[serde(default)]
    num_regions: Value,
    #[serde(default)]
    mentioned_regions: Value,
    #[serde(default)]
    width: Value,
    #[serde(default)]
    height: Value,
}

#[derive(Debug, Deserialize)]
struct ViewerPayload {
    #[serde(default, alias = "visualization", alias = "image")]
    image_reference: Value,
    #[serde(default)]
    regions: Value,
    #[serde(default)]
    diagnosis: Value,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Deserialize)]
struct PipelinePayload {
    #[serde(default)]
    image_info: Value,
    #[serde(default)]
    regions: Value,
    #[serde(default)]
    diagnosis: Value,
}

#[derive(Debug, Default, Deserialize)]
struct PipelineDiagnosis {
    #[serde(default)]
    full_report: Value,
    #[serde(default)]
    num_mentioned: Value,
}

/// Parse an analysis payload fetched from `payload_path`.
///
/// Relative image references are resolved next to the payload.
pub fn parse_analysis_json(json: &str, payload_path: &str) -> Result<AnalysisResult, String> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| format!("Invalid analysis JSON: {}", e))?;

    if !value.is_object() {
        return Err("Analysis payload must be a JSON object".to_string());
    }

    let is_pipeline = value.get("image_info").is_some()
        || value.get("diagnosis").map(Value::is_object).unwrap_or(false);

    // every field is a Value, so only a non-object could fail here
    let result = if is_pipeline {
        let payload: PipelinePayload = serde_json::from_value(value)
            .map_err(|e| format!("Unrecognised pipeline payload: {}", e))?;
        from_pipeline(payload, payload_path)
    } else {
        let payload: ViewerPayload = serde_json::from_value(value)
            .map_err(|e| format!("Unrecognised analysis payload: {}", e))?;
        from_viewer(payload, payload_path)
    };

    if !result.metadata_consistent() {
        log::warn!(
            "Metadata declares {:?} mentioned regions but {} are flagged",
            result.metadata.mentioned_regions,
            result.mentioned_count()
        );
    }
    log::info!(
        "Parsed analysis '{}': {} regions, {} mentioned",
        result.metadata.filename,
        result.regions.len(),
        result.mentioned_count()
    );

    Ok(result)
}

fn from_viewer(payload: ViewerPayload, payload_path: &str) -> AnalysisResult {
    let diagnosis = text(&payload.diagnosis);
    let meta: RawMetadata = lenient(payload.metadata, "metadata");
    let regions = convert_regions(raw_regions(payload.regions), &diagnosis);
    let image_reference = payload
        .image_reference
        .as_str()
        .map(|r| resolve_image_reference(payload_path, r))
        .unwrap_or_default();

    AnalysisResult {
        image_reference,
        regions,
        diagnosis,
        metadata: convert_metadata(&meta, None),
    }
}

fn from_pipeline(payload: PipelinePayload, payload_path: &str) -> AnalysisResult {
    let (diagnosis, declared_mentions) = match payload.diagnosis {
        Value::String(report) => (report, None),
        other => {
            let diag: PipelineDiagnosis = lenient(other, "diagnosis");
            (text(&diag.full_report), count(&diag.num_mentioned))
        }
    };
    let info: RawMetadata = lenient(payload.image_info, "image_info");
    let regions = convert_regions(raw_regions(payload.regions), &diagnosis);
    let metadata = convert_metadata(&info, declared_mentions);

    AnalysisResult {
        image_reference: resolve_image_reference(payload_path, &metadata.filename),
        regions,
        diagnosis,
        metadata,
    }
}

/// Deserialize an optional sub-object, falling back to its default.
fn lenient<T: Default + serde::de::DeserializeOwned>(value: Value, what: &str) -> T {
    if value.is_null() {
        return T::default();
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed {}: {}", what, e);
        T::default()
    })
}

fn raw_regions(value: Value) -> Vec<RawRegion> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        other => {
            log::warn!("Expected a region list, found {}", other);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value::<RawRegion>(item) {
            Ok(raw) => Some(raw),
            Err(e) => {
                log::warn!("Skipping region at position {}: {}", idx, e);
                None
            }
        })
        .collect()
}

fn convert_metadata(raw: &RawMetadata, declared_mentions: Option<usize>) -> AnalysisMetadata {
    AnalysisMetadata {
        filename: text(&raw.filename),
        num_regions: count(&raw.num_regions),
        mentioned_regions: declared_mentions.or_else(|| count(&raw.mentioned_regions)),
        width: dimension(&raw.width),
        height: dimension(&raw.height),
    }
}

fn convert_regions(raw: Vec<RawRegion>, diagnosis: &str) -> Vec<Region> {
    let mut regions = Vec::with_capacity(raw.len());
    let mut undetermined = Vec::new();

    for (idx, r) in raw.into_iter().enumerate() {
        let number = match r.number.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) if n > 0 => n,
            _ => {
                let fallback = idx as u32 + 1;
                log::warn!("Region at position {} has no valid number; using {}", idx, fallback);
                fallback
            }
        };

        let label = text(&r.label);
        if label.trim().is_empty() {
            log::warn!("Region {} has no label", number);
        }

        let color = channels(&r.color)
            .and_then(|c| Rgb::from_slice(&c))
            .unwrap_or(FALLBACK_COLOR);

        let mentioned = flag(&r.mentioned);
        if mentioned.is_none() {
            if !r.mentioned.is_null() {
                log::warn!("Region {} has an unreadable mention flag: {}", number, r.mentioned);
            }
            undetermined.push(regions.len());
        }

        let mut region = Region::new(number, &label)
            .with_mentioned(mentioned.unwrap_or(false))
            .with_color(color);

        match numbers(&r.bbox).and_then(|v| BoundingBox::from_slice(&v)) {
            Some(bbox) => region = region.with_bbox(bbox),
            None => log::warn!("Region {} has an invalid bbox: {}", number, r.bbox),
        }
        if let Some([x, y]) = numbers(&r.center).as_deref() {
            region.center = Some((*x, *y));
        }
        if let Some(id) = identifier(&r.id) {
            region.id = id;
        }

        regions.push(region);
    }

    if !undetermined.is_empty() {
        log::debug!(
            "Deriving mention flags for {} regions from the report",
            undetermined.len()
        );
        apply_mentions(diagnosis, &mut regions, &undetermined);
    }

    regions
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

fn count(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|n| usize::try_from(n).ok())
}

fn dimension(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

/// Ids may arrive as strings or bare numbers.
fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Mention flags as booleans, 0/1, or "true"/"false".
fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn numbers(value: &Value) -> Option<Vec<f64>> {
    value.as_array()?.iter().map(Value::as_f64).collect()
}

fn channels(value: &Value) -> Option<Vec<u8>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWER_PAYLOAD: &str = r#"{
        "visualization": "data:image/png;base64,AAAA",
        "regions": [
            {"id": "region_1", "number": 1, "label": "talus", "mentioned": true,
             "color": [230, 25, 75], "bbox": [100, 150, 300, 450], "center": [200, 300]},
            {"id": "region_2", "number": 2, "label": "calcaneus", "mentioned": false,
             "color": [60, 180, 75], "bbox": [10, 10, 50, 50], "center": [30, 30]}
        ],
        "diagnosis": "FINDINGS:\nThe talus is intact.",
        "metadata": {"filename": "ankle.png", "num_regions": 2, "mentioned_regions": 1}
    }"#;

    const PIPELINE_PAYLOAD: &str = r#"{
        "image_info": {"filename": "ankle.png", "num_regions": 3, "width": 800, "height": 600},
        "regions": [
            {"id": "region_1", "number": 1, "label": "medial cuneiform",
             "mentioned_in_diagnosis": true, "bbox": [1, 2, 3, 4], "center": [2, 3],
             "area": 4, "color": [1, 2, 3], "confidence": 0.9, "stability": 0.8},
            {"id": "region_2", "number": 2, "label": "navicular",
             "mentioned_in_diagnosis": false, "bbox": [5, 6, 7, 8], "color": [4, 5, 6]}
        ],
        "diagnosis": {"full_report": "Cuneiforms intact.", "mentioned_regions": ["medial cuneiform"], "num_mentioned": 1}
    }"#;

    #[test]
    fn test_parse_viewer_payload() {
        let result = parse_analysis_json(VIEWER_PAYLOAD, "public/demo/ankle/result.json").unwrap();

        assert_eq!(result.image_reference, "data:image/png;base64,AAAA");
        assert_eq!(result.regions.len(), 2);
        assert_eq!(result.regions[0].label, "talus");
        assert!(result.regions[0].mentioned);
        assert_eq!(result.regions[0].color, Rgb(230, 25, 75));
        assert_eq!(
            result.regions[0].bbox,
            BoundingBox::new(100.0, 150.0, 300.0, 450.0)
        );
        assert_eq!(result.regions[0].center, Some((200.0, 300.0)));
        assert_eq!(result.metadata.filename, "ankle.png");
        assert_eq!(result.metadata.mentioned_regions, Some(1));
        assert!(result.metadata_consistent());
    }

    #[test]
    fn test_parse_pipeline_payload() {
        let result = parse_analysis_json(PIPELINE_PAYLOAD, "public/demo/ankle/data.json").unwrap();

        assert_eq!(result.image_reference, "/public/demo/ankle/ankle.png");
        assert_eq!(result.diagnosis, "Cuneiforms intact.");
        assert_eq!(result.metadata.width, Some(800));
        assert_eq!(result.metadata.mentioned_regions, Some(1));
        assert!(result.regions[0].mentioned);
        assert!(!result.regions[1].mentioned);
        // center derived from bbox when absent
        assert_eq!(result.regions[1].center, Some((6.0, 7.0)));
    }

    #[test]
    fn test_malformed_regions_are_kept_but_degraded() {
        let json = r#"{
            "image_reference": "scan.png",
            "regions": [
                {"number": 1, "label": "talus", "mentioned": true, "bbox": [300, 150, 100, 450]},
                {"number": 2, "label": null, "mentioned": true, "bbox": "bad", "color": [999, 0, 0]},
                {"number": 3, "label": "navicular", "mentioned": true, "bbox": [0, 0, 5, 5]}
            ],
            "diagnosis": null
        }"#;
        let result = parse_analysis_json(json, "cases/one.json").unwrap();

        assert_eq!(result.image_reference, "/cases/scan.png");
        assert_eq!(result.regions.len(), 3);
        assert!(result.regions[0].bbox.is_none());
        assert_eq!(result.regions[1].label, "");
        assert_eq!(result.regions[1].color, FALLBACK_COLOR);
        assert_eq!(result.regions[1].id, "region_2");
        assert!(result.regions[2].bbox.is_some());
        assert_eq!(result.diagnosis, "");
    }

    #[test]
    fn test_loosely_typed_region_does_not_drop_others() {
        let json = r#"{
            "image_reference": "scan.png",
            "regions": [
                {"id": "region_1", "number": 1, "label": "talus", "mentioned": true, "bbox": [0, 0, 5, 5]},
                {"id": 2, "number": 2, "label": "navicular", "mentioned": 1, "bbox": [5, 5, 9, 9]},
                {"id": ["x"], "number": 3, "label": "calcaneus", "mentioned": "maybe"},
                "not a region",
                {"number": 5, "label": "cuboid", "mentioned": false}
            ],
            "diagnosis": "Talus intact. Calcaneus unremarkable.",
            "metadata": {"filename": 7, "num_regions": "four", "mentioned_regions": 2}
        }"#;
        let result = parse_analysis_json(json, "scan.json").unwrap();

        let ids: Vec<_> = result.regions.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["region_1", "2", "region_3", "region_5"]);
        assert!(result.regions[0].mentioned);
        assert!(result.regions[1].mentioned);
        // unreadable flag falls back to the report
        assert!(result.regions[2].mentioned);
        assert!(!result.regions[3].mentioned);

        assert_eq!(result.metadata.filename, "");
        assert_eq!(result.metadata.num_regions, None);
        assert_eq!(result.metadata.mentioned_regions, Some(2));
    }

    #[test]
    fn test_pipeline_with_plain_report_and_bad_info() {
        let json = r#"{
            "image_info": "ankle.png",
            "regions": {"number": 1},
            "diagnosis": {"full_report": "Talus intact.", "num_mentioned": "one"}
        }"#;
        let result = parse_analysis_json(json, "public/demo/data.json").unwrap();
        assert!(result.regions.is_empty());
        assert_eq!(result.diagnosis, "Talus intact.");
        assert_eq!(result.image_reference, "");

        let json = r#"{"image_info": {"filename": "a.png"}, "diagnosis": "Talus intact."}"#;
        let result = parse_analysis_json(json, "public/demo/data.json").unwrap();
        assert_eq!(result.diagnosis, "Talus intact.");
        assert_eq!(result.image_reference, "/public/demo/a.png");
    }

    #[test]
    fn test_missing_mention_flags_are_derived() {
        let json = r#"{
            "image": "scan.png",
            "regions": [
                {"number": 1, "label": "lateral cuneiform", "bbox": [0, 0, 5, 5]},
                {"number": 2, "label": "talus", "bbox": [0, 0, 5, 5]},
                {"label": "peroneus longus tendon"}
            ],
            "diagnosis": "Mild edema about the cuneiforms. Peroneus longus tendon intact."
        }"#;
        let result = parse_analysis_json(json, "scan.json").unwrap();

        assert!(result.regions[0].mentioned);
        assert!(!result.regions[1].mentioned);
        assert!(result.regions[2].mentioned);
        assert_eq!(result.regions[2].number, 3);
    }

    #[test]
    fn test_invalid_payloads() {
        assert!(parse_analysis_json("not json", "x.json").is_err());
        assert!(parse_analysis_json("[1, 2]", "x.json").is_err());

        let empty = parse_analysis_json("{}", "x.json").unwrap();
        assert!(empty.regions.is_empty());
        assert_eq!(empty.diagnosis, "");
    }
}
