// src/viewer_config.rs
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH: &str = "public/viewer.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub cases: Vec<CaseInfo>,
    #[serde(default)]
    pub default_case: Option<String>,
    #[serde(default)]
    pub highlight: HighlightStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseInfo {
    pub id: String,
    pub label: String,
    /// Analysis payload, relative to the site root.
    pub data_path: String,
}

/// Single style shared by every overlay, whatever the region colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightStyle {
    #[serde(default = "default_fill")]
    pub fill: String,
    #[serde(default = "default_stroke")]
    pub stroke: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
}

fn default_title() -> String {
    "Medical Clarity".to_string()
}
fn default_fill() -> String {
    "rgba(255, 255, 0, 0.35)".to_string()
}
fn default_stroke() -> String {
    "yellow".to_string()
}
fn default_stroke_width() -> u32 {
    2
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            fill: default_fill(),
            stroke: default_stroke(),
            stroke_width: default_stroke_width(),
        }
    }
}

impl HighlightStyle {
    pub fn css(&self) -> String {
        format!(
            "background: {}; border: {}px solid {};",
            self.fill, self.stroke_width, self.stroke
        )
    }
}

impl ViewerConfig {
    pub fn parse(json: &str) -> Result<Self, String> {
        let config: ViewerConfig =
            serde_json::from_str(json).map_err(|e| format!("Invalid viewer config: {}", e))?;
        if config.cases.is_empty() {
            return Err("Viewer config lists no cases".to_string());
        }
        Ok(config)
    }

    pub fn get_case(&self, id: &str) -> Option<&CaseInfo> {
        self.cases.iter().find(|c| c.id == id)
    }

    /// The configured default case, or the first one listed.
    pub fn initial_case(&self) -> Option<&CaseInfo> {
        self.default_case
            .as_deref()
            .and_then(|id| self.get_case(id))
            .or_else(|| self.cases.first())
    }
}

impl CaseInfo {
    pub fn new(id: &str, label: &str, data_path: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            data_path: data_path.to_string(),
        }
    }
}

// Configuration used when no manifest is deployed
pub struct ConfigRegistry;

impl ConfigRegistry {
    pub fn builtin() -> ViewerConfig {
        ViewerConfig {
            title: default_title(),
            cases: vec![CaseInfo::new(
                "ankle",
                "Ankle MRI (demo)",
                "public/demo/ankle/data.json",
            )],
            default_case: Some("ankle".to_string()),
            highlight: HighlightStyle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config() {
        let config = ConfigRegistry::builtin();
        assert_eq!(config.initial_case().unwrap().id, "ankle");
        assert_eq!(config.highlight.fill, "rgba(255, 255, 0, 0.35)");
    }

    #[test]
    fn test_parse_with_defaults() {
        let config = ViewerConfig::parse(
            r#"{"cases": [
                {"id": "knee", "label": "Knee", "data_path": "public/demo/knee/data.json"},
                {"id": "ankle", "label": "Ankle", "data_path": "public/demo/ankle/data.json"}
            ], "highlight": {"fill": "rgba(0, 255, 255, 0.3)"}}"#,
        )
        .unwrap();

        assert_eq!(config.title, "Medical Clarity");
        assert_eq!(config.initial_case().unwrap().id, "knee");
        assert_eq!(config.highlight.fill, "rgba(0, 255, 255, 0.3)");
        assert_eq!(config.highlight.stroke, "yellow");
        assert_eq!(config.get_case("ankle").unwrap().label, "Ankle");
    }

    #[test]
    fn test_default_case_falls_back_to_first() {
        let mut config = ConfigRegistry::builtin();
        config.cases.push(CaseInfo::new("knee", "Knee", "k.json"));
        config.default_case = Some("knee".to_string());
        assert_eq!(config.initial_case().unwrap().id, "knee");

        config.default_case = Some("missing".to_string());
        assert_eq!(config.initial_case().unwrap().id, "ankle");
    }

    #[test]
    fn test_parse_errors() {
        assert!(ViewerConfig::parse("{").is_err());
        assert!(ViewerConfig::parse(r#"{"cases": []}"#).is_err());
    }

    #[test]
    fn test_highlight_css() {
        let css = HighlightStyle::default().css();
        assert_eq!(css, "background: rgba(255, 255, 0, 0.35); border: 2px solid yellow;");
    }
}
