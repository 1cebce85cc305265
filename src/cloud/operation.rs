//! Operation catalog
//!
//! Every document transformation is a `POST /documents/<category>/<name>`
//! with a JSON payload and a `{taskId}` response. This module owns the
//! endpoint paths, the payload shapes and the checks that must pass
//! before anything is submitted.

use crate::cloud::ApiRequest;
use crate::error::{Error, Result};
use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A validated submission, ready to hand to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    endpoint: &'static str,
    payload: Value,
}

/// Office and image formats that can be turned into a PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Word,
    Excel,
    PowerPoint,
    Text,
    Image,
}

/// Formats a PDF can be converted into (besides images)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Word,
    Excel,
    PowerPoint,
    Html,
    Text,
}

/// A document reference with an optional open password
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    /// Document ID returned by upload_document or a previous operation
    pub document_id: String,
    /// Password if this PDF is password-protected
    #[serde(default)]
    pub password: Option<String>,
}

/// Page size in points (1 point = 1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PageDimension {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PageRotation {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "90")]
    Deg90,
    #[serde(rename = "180")]
    Deg180,
    #[serde(rename = "270")]
    Deg270,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageMode {
    SinglePage,
    MultiplePage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalingMode {
    Scale,
    NoScale,
}

/// Layout options for HTML and web page rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    /// Page dimensions (default: A4, 595x842)
    #[serde(default)]
    pub dimension: Option<PageDimension>,
    /// Page rotation (default: NONE)
    #[serde(default)]
    pub rotation: Option<PageRotation>,
    /// Content layout mode (default: MULTIPLE_PAGE)
    #[serde(default)]
    pub page_mode: Option<PageMode>,
    /// Content scaling (default: SCALE)
    #[serde(default)]
    pub scaling_mode: Option<ScalingMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    Jpg,
    Png,
    Tiff,
    Bmp,
}

/// Options for rendering PDF pages to images
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// Output image format (default: PNG)
    #[serde(default)]
    pub image_format: Option<ImageFormat>,
    /// Resolution in DPI, 72 to 300 (default: 150)
    #[serde(default)]
    pub dpi: Option<u32>,
    /// Page ranges to convert (e.g., "1-3,5,7-9")
    #[serde(default)]
    pub page_ranges: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitStrategy {
    /// Chunks of `pageCount` pages each
    ByPageCount,
    /// One file per entry of `pageRanges`
    ByPageRanges,
    /// One file per page
    EveryPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractType {
    Text,
    Images,
    Pages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompressionLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageOperationType {
    Rotate,
    Delete,
    Reorder,
}

/// One page-level edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageOperation {
    /// Type of operation
    #[serde(rename = "type")]
    pub kind: PageOperationType,
    /// Target page index (0-based)
    pub page_index: u32,
    /// Rotation angle in degrees: 90, 180 or 270 (ROTATE only)
    #[serde(default)]
    pub rotation: Option<u32>,
    /// New position index (REORDER only)
    #[serde(default)]
    pub target_index: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatermarkType {
    Text,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatermarkPosition {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkConfig {
    /// Watermark text, or the documentId of an uploaded image for IMAGE
    pub content: String,
    /// Watermark type (default: TEXT)
    #[serde(default, rename = "type")]
    pub kind: Option<WatermarkType>,
    /// Watermark position (default: CENTER)
    #[serde(default)]
    pub position: Option<WatermarkPosition>,
    /// Opacity 0.0-1.0 (default: 0.5)
    #[serde(default)]
    pub opacity: Option<f64>,
    /// Rotation angle in degrees
    #[serde(default)]
    pub rotation: Option<f64>,
    /// Font size in points (TEXT only)
    #[serde(default)]
    pub font_size: Option<f64>,
    /// Text color in hex (e.g., "#FF0000")
    #[serde(default)]
    pub color: Option<String>,
    /// Pages to watermark (e.g., "1-3,5", default: all)
    #[serde(default)]
    pub page_ranges: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionConfig {
    /// Password required to open the document
    #[serde(default)]
    pub user_password: Option<String>,
    /// Password required to change permissions
    #[serde(default)]
    pub owner_password: Option<String>,
    /// Permissions to grant (e.g., ["PRINT", "COPY_CONTENT"])
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

impl ProtectionConfig {
    pub fn has_user_password(&self) -> bool {
        self.user_password.as_deref().is_some_and(|p| !p.is_empty())
    }

    pub fn has_owner_password(&self) -> bool {
        self.owner_password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

impl Operation {
    fn new(endpoint: &'static str, payload: Value) -> Self {
        Self {
            endpoint,
            payload: prune_nulls(payload),
        }
    }

    /// Endpoint path relative to the API base URL
    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn to_request(&self) -> ApiRequest {
        ApiRequest::post_json(self.endpoint, self.payload.clone())
    }

    // ---- creation ----

    pub fn create_pdf(format: SourceFormat, document_id: &str) -> Result<Self> {
        let endpoint = match format {
            SourceFormat::Word => "/documents/create/pdf-from-word",
            SourceFormat::Excel => "/documents/create/pdf-from-excel",
            SourceFormat::PowerPoint => "/documents/create/pdf-from-ppt",
            SourceFormat::Text => "/documents/create/pdf-from-text",
            SourceFormat::Image => "/documents/create/pdf-from-image",
        };
        Ok(Self::new(
            endpoint,
            json!({ "documentId": document_id_arg(document_id)? }),
        ))
    }

    pub fn pdf_from_html(document_id: &str, layout: Option<&PageLayout>) -> Result<Self> {
        Ok(Self::new(
            "/documents/create/pdf-from-html",
            json!({ "documentId": document_id_arg(document_id)?, "config": layout }),
        ))
    }

    pub fn pdf_from_url(url: &str, layout: Option<&PageLayout>) -> Result<Self> {
        let parsed = url::Url::parse(url.trim()).map_err(|e| invalid(format!("Invalid URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("URL must use http or https: {}", url)));
        }
        Ok(Self::new(
            "/documents/create/pdf-from-url",
            json!({ "url": parsed.as_str(), "config": layout }),
        ))
    }

    // ---- conversion ----

    pub fn convert_pdf(format: TargetFormat, document_id: &str, password: Option<&str>) -> Result<Self> {
        let endpoint = match format {
            TargetFormat::Word => "/documents/convert/pdf-to-word",
            TargetFormat::Excel => "/documents/convert/pdf-to-excel",
            TargetFormat::PowerPoint => "/documents/convert/pdf-to-ppt",
            TargetFormat::Html => "/documents/convert/pdf-to-html",
            TargetFormat::Text => "/documents/convert/pdf-to-text",
        };
        Ok(Self::new(
            endpoint,
            json!({ "documentId": document_id_arg(document_id)?, "password": password }),
        ))
    }

    pub fn pdf_to_image(
        document_id: &str,
        config: Option<&ImageConfig>,
        password: Option<&str>,
    ) -> Result<Self> {
        if let Some(dpi) = config.and_then(|c| c.dpi) {
            if !(72..=300).contains(&dpi) {
                return Err(invalid(format!("dpi must be between 72 and 300, got {}", dpi)));
            }
        }
        Ok(Self::new(
            "/documents/convert/pdf-to-image",
            json!({
                "documentId": document_id_arg(document_id)?,
                "config": config,
                "password": password,
            }),
        ))
    }

    // ---- manipulation ----

    pub fn split(
        document_id: &str,
        strategy: SplitStrategy,
        page_count: Option<u32>,
        page_ranges: Option<&[String]>,
        password: Option<&str>,
    ) -> Result<Self> {
        match strategy {
            SplitStrategy::ByPageCount if page_count.map_or(true, |n| n == 0) => {
                return Err(invalid("pageCount (at least 1) is required for BY_PAGE_COUNT"));
            }
            SplitStrategy::ByPageRanges if page_ranges.map_or(true, |r| r.is_empty()) => {
                return Err(invalid("pageRanges is required for BY_PAGE_RANGES"));
            }
            _ => {}
        }
        Ok(Self::new(
            "/documents/modify/pdf-split",
            json!({
                "documentId": document_id_arg(document_id)?,
                "splitStrategy": strategy,
                "pageCount": page_count,
                "pageRanges": page_ranges,
                "password": password,
            }),
        ))
    }

    pub fn extract(
        document_id: &str,
        extract_type: ExtractType,
        page_ranges: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self> {
        let config = page_ranges.map(|ranges| json!({ "pageRanges": ranges }));
        Ok(Self::new(
            "/documents/modify/pdf-extract",
            json!({
                "documentId": document_id_arg(document_id)?,
                "extractType": extract_type,
                "config": config,
                "password": password,
            }),
        ))
    }

    pub fn flatten(document_id: &str, password: Option<&str>) -> Result<Self> {
        Ok(Self::new(
            "/documents/modify/pdf-flatten",
            json!({ "documentId": document_id_arg(document_id)?, "password": password }),
        ))
    }

    pub fn compress(document_id: &str, level: CompressionLevel, password: Option<&str>) -> Result<Self> {
        Ok(Self::new(
            "/documents/modify/pdf-compress",
            json!({
                "documentId": document_id_arg(document_id)?,
                "compressionLevel": level,
                "password": password,
            }),
        ))
    }

    pub fn manipulate(
        document_id: &str,
        operations: &[PageOperation],
        password: Option<&str>,
    ) -> Result<Self> {
        if operations.is_empty() {
            return Err(invalid("operations must contain at least one entry"));
        }
        for (i, op) in operations.iter().enumerate() {
            match op.kind {
                PageOperationType::Rotate if !matches!(op.rotation, Some(90 | 180 | 270)) => {
                    return Err(invalid(format!(
                        "operations[{}]: ROTATE needs rotation of 90, 180 or 270",
                        i
                    )));
                }
                PageOperationType::Reorder if op.target_index.is_none() => {
                    return Err(invalid(format!("operations[{}]: REORDER needs targetIndex", i)));
                }
                _ => {}
            }
        }
        Ok(Self::new(
            "/documents/modify/pdf-manipulate",
            json!({
                "documentId": document_id_arg(document_id)?,
                "operations": operations,
                "password": password,
            }),
        ))
    }

    // ---- enhancement ----

    /// Combine documents in the given order
    pub fn merge(documents: &[DocumentRef]) -> Result<Self> {
        if documents.len() < 2 {
            return Err(invalid(format!(
                "At least 2 documents are required to merge, got {}",
                documents.len()
            )));
        }
        for doc in documents {
            document_id_arg(&doc.document_id)?;
        }
        Ok(Self::new(
            "/documents/enhance/pdf-combine",
            json!({ "documents": documents }),
        ))
    }

    pub fn watermark(document_id: &str, config: &WatermarkConfig, password: Option<&str>) -> Result<Self> {
        if config.content.trim().is_empty() {
            return Err(invalid("Watermark content must not be empty"));
        }
        if let Some(opacity) = config.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(invalid(format!("opacity must be between 0.0 and 1.0, got {}", opacity)));
            }
        }
        Ok(Self::new(
            "/documents/enhance/pdf-watermark",
            json!({
                "documentId": document_id_arg(document_id)?,
                "config": config,
                "password": password,
            }),
        ))
    }

    // ---- security ----

    /// Empty passwords count as absent and are not sent
    pub fn protect(document_id: &str, config: &ProtectionConfig) -> Result<Self> {
        if !config.has_user_password() && !config.has_owner_password() {
            return Err(invalid("At least one of userPassword or ownerPassword is required"));
        }
        let config = ProtectionConfig {
            user_password: config.user_password.clone().filter(|p| !p.is_empty()),
            owner_password: config.owner_password.clone().filter(|p| !p.is_empty()),
            permissions: config.permissions.clone(),
        };
        Ok(Self::new(
            "/documents/security/pdf-protect",
            json!({ "documentId": document_id_arg(document_id)?, "config": config }),
        ))
    }

    pub fn remove_password(document_id: &str, password: &str) -> Result<Self> {
        if password.is_empty() {
            return Err(invalid("password is required to remove protection"));
        }
        Ok(Self::new(
            "/documents/security/pdf-remove-password",
            json!({ "documentId": document_id_arg(document_id)?, "password": password }),
        ))
    }

    // ---- optimization ----

    pub fn linearize(document_id: &str) -> Result<Self> {
        Ok(Self::new(
            "/documents/optimize/pdf-linearize",
            json!({ "documentId": document_id_arg(document_id)? }),
        ))
    }

    // ---- analysis ----

    /// Property extraction; the result comes back as task `resultData`
    pub fn pdf_properties(document_id: &str, include_extended_info: bool, include_page_info: bool) -> Result<Self> {
        Ok(Self::new(
            "/documents/analyze/get-pdf-properties",
            json!({
                "documentId": document_id_arg(document_id)?,
                "config": {
                    "includeExtendedInfo": include_extended_info,
                    "includePageInfo": include_page_info,
                },
            }),
        ))
    }

    pub fn compare(first: &DocumentRef, second: &DocumentRef) -> Result<Self> {
        document_id_arg(&first.document_id)?;
        document_id_arg(&second.document_id)?;
        Ok(Self::new(
            "/documents/analyze/pdf-compare",
            json!({ "document1": first, "document2": second }),
        ))
    }

    pub fn ocr(
        document_id: &str,
        languages: Option<&[String]>,
        page_ranges: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self> {
        let config = (languages.is_some() || page_ranges.is_some())
            .then(|| json!({ "languages": languages, "pageRanges": page_ranges }));
        Ok(Self::new(
            "/documents/analyze/pdf-ocr",
            json!({
                "documentId": document_id_arg(document_id)?,
                "config": config,
                "password": password,
            }),
        ))
    }

    pub fn structural_analysis(document_id: &str, password: Option<&str>) -> Result<Self> {
        Ok(Self::new(
            "/documents/analyze/pdf-structural-analysis",
            json!({ "documentId": document_id_arg(document_id)?, "password": password }),
        ))
    }

    // ---- forms ----

    pub fn export_form_data(document_id: &str, password: Option<&str>) -> Result<Self> {
        Ok(Self::new(
            "/documents/forms/export-pdf-form-data",
            json!({ "documentId": document_id_arg(document_id)?, "password": password }),
        ))
    }

    /// Fill form fields. `form_data` is sent as given: explicit nulls in it
    /// are field values, not absent options.
    pub fn import_form_data(
        document_id: &str,
        form_data: &Map<String, Value>,
        password: Option<&str>,
    ) -> Result<Self> {
        let mut op = Self::new(
            "/documents/forms/import-pdf-form-data",
            json!({ "documentId": document_id_arg(document_id)?, "password": password }),
        );
        if let Value::Object(payload) = &mut op.payload {
            payload.insert("formData".to_string(), Value::Object(form_data.clone()));
        }
        Ok(op)
    }
}

/// Drop `null` object members recursively so absent options are omitted
/// from the payload rather than sent as `null`.
pub fn prune_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, prune_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(prune_nulls).collect()),
        other => other,
    }
}

fn document_id_arg(document_id: &str) -> Result<&str> {
    if document_id.trim().is_empty() {
        return Err(invalid("documentId must not be empty"));
    }
    Ok(document_id)
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidParams {
        reason: reason.into(),
    }
}
