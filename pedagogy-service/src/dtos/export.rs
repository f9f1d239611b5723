use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExportRequest {
    #[serde(rename = "htmlContent", default)]
    #[validate(length(min = 1, message = "htmlContent is required"))]
    pub html_content: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ExportRequest {
    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Documento Educativo")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub encoding: Option<String>,
}

impl ExportParams {
    pub fn wants_base64(&self) -> bool {
        self.encoding
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case("base64"))
    }
}

/// JSON form of an export, returned with `?encoding=base64`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub success: bool,
    pub filename: String,
    pub content_type: String,
    pub data: String,
}
