use serde::{Deserialize, Serialize};

/// Per-note card styling. Colours are `#rgb` or `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub background_color: String,
    pub text_color: String,
    pub use_gradient: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient_end: Option<String>,
    pub border_radius: u32,
    pub elevation: u32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".to_string(),
            text_color: "#000000".to_string(),
            use_gradient: false,
            gradient_start: None,
            gradient_end: None,
            border_radius: 8,
            elevation: 4,
        }
    }
}
