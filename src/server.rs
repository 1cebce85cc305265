//! MCP Server implementation using rmcp

use crate::cloud::{
    CloudClient, CompressionLevel, DocumentRef, ExtractType, ImageConfig, Operation, PageLayout,
    PageOperation, ProtectionConfig, SourceFormat, SplitStrategy, Task, TaskEngine, TaskStatus,
    TargetFormat, WatermarkConfig,
};
use crate::config::ServerConfig;
use crate::envelope::{respond, Success};
use crate::error::{Error, TASK_FAILED_DEFAULT_MESSAGE};
use crate::source::{resolve_base64, resolve_path};
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    schemars::JsonSchema,
    tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Document lifecycle parameters
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentParams {
    /// Local path of the file to upload
    #[serde(default)]
    pub path: Option<String>,
    /// Base64-encoded file content (alternative to path)
    #[serde(default)]
    pub file_content: Option<String>,
    /// File name (required with fileContent, optional with path)
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadDocumentParams {
    /// Document ID to download (from upload or an operation result)
    pub document_id: String,
    /// Path where the downloaded file is saved
    pub output_path: String,
    /// Optional file name hint passed to the service
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocumentParams {
    /// Document ID to delete
    pub document_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusParams {
    /// Task ID returned by an operation
    pub task_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaitForTaskParams {
    /// Task ID to keep waiting on
    pub task_id: String,
    /// Seconds to wait before giving up (default: server setting, 300)
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

// ============================================================================
// Operation parameters
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentParams {
    /// Document ID of the uploaded file
    pub document_id: String,
    /// Seconds to wait for the task (default: 300)
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PdfDocumentParams {
    /// Document ID of the uploaded PDF
    pub document_id: String,
    /// Password if the PDF is password-protected
    #[serde(default)]
    pub password: Option<String>,
    /// Seconds to wait for the task (default: 300)
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HtmlToPdfParams {
    /// Document ID of the uploaded HTML file
    pub document_id: String,
    /// Page layout options
    #[serde(default)]
    pub config: Option<PageLayout>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UrlToPdfParams {
    /// Web page URL to convert
    pub url: String,
    /// Page layout options
    #[serde(default)]
    pub config: Option<PageLayout>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PdfToImageParams {
    pub document_id: String,
    /// Image conversion options
    #[serde(default)]
    pub config: Option<ImageConfig>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SplitParams {
    pub document_id: String,
    /// BY_PAGE_COUNT, BY_PAGE_RANGES or EVERY_PAGE
    pub split_strategy: SplitStrategy,
    /// Pages per chunk (required for BY_PAGE_COUNT)
    #[serde(default)]
    pub page_count: Option<u32>,
    /// Page ranges such as ["1-3", "4-10"] (required for BY_PAGE_RANGES)
    #[serde(default)]
    pub page_ranges: Option<Vec<String>>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractParams {
    pub document_id: String,
    /// TEXT, IMAGES or PAGES
    pub extract_type: ExtractType,
    /// Page ranges to extract from (e.g., "1-3,5,7-9")
    #[serde(default)]
    pub page_ranges: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompressParams {
    pub document_id: String,
    /// HIGH, MEDIUM or LOW
    pub compression_level: CompressionLevel,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManipulateParams {
    pub document_id: String,
    /// Page operations, applied in order
    pub operations: Vec<PageOperation>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeParams {
    /// PDFs to merge in order (minimum 2)
    pub documents: Vec<DocumentRef>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkParams {
    pub document_id: String,
    #[serde(flatten)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProtectParams {
    pub document_id: String,
    #[serde(flatten)]
    pub protection: ProtectionConfig,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemovePasswordParams {
    pub document_id: String,
    /// Current password of the PDF
    pub password: String,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertiesParams {
    pub document_id: String,
    /// Include fonts, signatures, encryption details (default: true)
    #[serde(default = "default_true")]
    pub include_extended_info: bool,
    /// Include per-page dimensions, rotation, scan detection (default: true)
    #[serde(default = "default_true")]
    pub include_page_info: bool,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompareParams {
    /// First PDF document ID
    pub document_id1: String,
    /// Second PDF document ID
    pub document_id2: String,
    #[serde(default)]
    pub password1: Option<String>,
    #[serde(default)]
    pub password2: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OcrParams {
    pub document_id: String,
    /// Language codes (e.g., ["en-US", "es-ES"], default: ["en-US"])
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    /// Pages to OCR (e.g., "1-5,10", default: all)
    #[serde(default)]
    pub page_ranges: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportFormDataParams {
    pub document_id: String,
    /// Form field names mapped to values; nested objects address hierarchical fields
    pub form_data: Map<String, Value>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Foxit PDF cloud MCP Server
#[derive(Clone)]
pub struct PdfCloudServer {
    client: CloudClient,
    engine: TaskEngine<CloudClient>,
    tool_router: ToolRouter<Self>,
    /// Server configuration
    config: Arc<ServerConfig>,
}

#[tool_router]
impl PdfCloudServer {
    /// Create a server from configuration
    pub fn with_config(config: ServerConfig) -> crate::error::Result<Self> {
        let client = CloudClient::new(&config.api, config.max_download_bytes)?;
        let engine = TaskEngine::from_config(client.clone(), &config.api);
        Ok(Self {
            client,
            engine,
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        })
    }

    // ---- document lifecycle ----

    #[tool(description = "Upload a document for processing. Returns a documentId used by every other tool.

Supported inputs: PDF, Word, Excel, PowerPoint, images, text and HTML files (max 100MB).
Provide either `path` (local file) or `fileContent` (base64) together with `fileName`.
Always call this first before running any PDF operation.")]
    async fn upload_document(&self, Parameters(params): Parameters<UploadDocumentParams>) -> String {
        respond("upload_document", "UPLOAD_FAILED", self.process_upload(&params).await)
    }

    #[tool(description = "Download a document (an upload or an operation result) and save it to outputPath.")]
    async fn download_document(
        &self,
        Parameters(params): Parameters<DownloadDocumentParams>,
    ) -> String {
        respond("download_document", "DOWNLOAD_FAILED", self.process_download(&params).await)
    }

    #[tool(description = "Delete a document from the cloud service. Permanent; use it to clean up uploads and results you no longer need.")]
    async fn delete_document(&self, Parameters(params): Parameters<DeleteDocumentParams>) -> String {
        let outcome = self
            .client
            .delete_document(&params.document_id)
            .await
            .map(|()| {
                Success::new(format!("Document {} deleted successfully", params.document_id))
                    .with("documentId", &params.document_id)
            });
        respond("delete_document", "DELETE_FAILED", outcome)
    }

    #[tool(description = "Read the current status of a task once, without waiting.")]
    async fn get_task_status(&self, Parameters(params): Parameters<TaskStatusParams>) -> String {
        respond("get_task_status", "TASK_STATUS_FAILED", self.process_task_status(&params).await)
    }

    #[tool(description = "Wait for a previously submitted task to finish. Use this after a TASK_TIMEOUT: the task keeps running on the server and can be picked up again by its taskId.")]
    async fn wait_for_task(&self, Parameters(params): Parameters<WaitForTaskParams>) -> String {
        let outcome = self
            .engine
            .wait(&params.task_id, wait_timeout(params.timeout_seconds))
            .await
            .map(|task| Success::from_task(&task, "Task completed successfully"));
        respond("wait_for_task", "TASK_WAIT_FAILED", outcome)
    }

    // ---- creation ----

    #[tool(description = "Convert a Word document (DOC, DOCX) to PDF. Upload the file first, then download the result by its documentId.")]
    async fn pdf_from_word(&self, Parameters(params): Parameters<DocumentParams>) -> String {
        self.create_pdf(
            "pdf_from_word",
            SourceFormat::Word,
            &params,
            "Word document converted to PDF successfully",
        )
        .await
    }

    #[tool(description = "Convert an Excel spreadsheet (XLS, XLSX) to PDF.")]
    async fn pdf_from_excel(&self, Parameters(params): Parameters<DocumentParams>) -> String {
        self.create_pdf(
            "pdf_from_excel",
            SourceFormat::Excel,
            &params,
            "Excel converted to PDF successfully",
        )
        .await
    }

    #[tool(description = "Convert a PowerPoint presentation (PPT, PPTX) to PDF.")]
    async fn pdf_from_ppt(&self, Parameters(params): Parameters<DocumentParams>) -> String {
        self.create_pdf(
            "pdf_from_ppt",
            SourceFormat::PowerPoint,
            &params,
            "PowerPoint converted to PDF successfully",
        )
        .await
    }

    #[tool(description = "Convert a plain text file to PDF.")]
    async fn pdf_from_text(&self, Parameters(params): Parameters<DocumentParams>) -> String {
        self.create_pdf(
            "pdf_from_text",
            SourceFormat::Text,
            &params,
            "Text file converted to PDF successfully",
        )
        .await
    }

    #[tool(description = "Convert an image (PNG, JPEG, TIFF, BMP, GIF) or a ZIP of images to PDF.")]
    async fn pdf_from_image(&self, Parameters(params): Parameters<DocumentParams>) -> String {
        self.create_pdf(
            "pdf_from_image",
            SourceFormat::Image,
            &params,
            "Image(s) converted to PDF successfully",
        )
        .await
    }

    #[tool(description = "Convert an uploaded HTML file to PDF. Optional config: dimension {width, height} in points, rotation (NONE, 90, 180, 270), pageMode (SINGLE_PAGE, MULTIPLE_PAGE), scalingMode (SCALE, NO_SCALE).")]
    async fn pdf_from_html(&self, Parameters(params): Parameters<HtmlToPdfParams>) -> String {
        let outcome = self
            .process_operation(
                Operation::pdf_from_html(&params.document_id, params.config.as_ref()),
                params.timeout_seconds,
                "HTML converted to PDF successfully",
            )
            .await;
        respond("pdf_from_html", "CONVERSION_FAILED", outcome)
    }

    #[tool(description = "Render a web page (http/https URL) to PDF. No upload needed. Accepts the same config as pdf_from_html.")]
    async fn pdf_from_url(&self, Parameters(params): Parameters<UrlToPdfParams>) -> String {
        let outcome = self
            .process_operation(
                Operation::pdf_from_url(&params.url, params.config.as_ref()),
                params.timeout_seconds,
                "Web page converted to PDF successfully",
            )
            .await
            .map(|s| s.with("url", &params.url));
        respond("pdf_from_url", "CONVERSION_FAILED", outcome)
    }

    // ---- conversion ----

    #[tool(description = "Convert a PDF to an editable Word document (DOCX).")]
    async fn pdf_to_word(&self, Parameters(params): Parameters<PdfDocumentParams>) -> String {
        self.convert_pdf(
            "pdf_to_word",
            TargetFormat::Word,
            &params,
            "PDF converted to Word successfully",
        )
        .await
    }

    #[tool(description = "Convert a PDF to an Excel spreadsheet (XLSX); tables become worksheets.")]
    async fn pdf_to_excel(&self, Parameters(params): Parameters<PdfDocumentParams>) -> String {
        self.convert_pdf(
            "pdf_to_excel",
            TargetFormat::Excel,
            &params,
            "PDF converted to Excel successfully",
        )
        .await
    }

    #[tool(description = "Convert a PDF to a PowerPoint presentation (PPTX), one slide per page.")]
    async fn pdf_to_ppt(&self, Parameters(params): Parameters<PdfDocumentParams>) -> String {
        self.convert_pdf(
            "pdf_to_ppt",
            TargetFormat::PowerPoint,
            &params,
            "PDF converted to PowerPoint successfully",
        )
        .await
    }

    #[tool(description = "Convert a PDF to HTML.")]
    async fn pdf_to_html(&self, Parameters(params): Parameters<PdfDocumentParams>) -> String {
        self.convert_pdf(
            "pdf_to_html",
            TargetFormat::Html,
            &params,
            "PDF converted to HTML successfully",
        )
        .await
    }

    #[tool(description = "Extract the text of a PDF into a plain text file.")]
    async fn pdf_to_text(&self, Parameters(params): Parameters<PdfDocumentParams>) -> String {
        self.convert_pdf(
            "pdf_to_text",
            TargetFormat::Text,
            &params,
            "PDF converted to text successfully",
        )
        .await
    }

    #[tool(description = "Render PDF pages to images. Optional config: imageFormat (JPG, PNG, TIFF, BMP; default PNG), dpi (72-300, default 150), pageRanges (e.g. \"1-3,5\").")]
    async fn pdf_to_image(&self, Parameters(params): Parameters<PdfToImageParams>) -> String {
        let outcome = self
            .process_operation(
                Operation::pdf_to_image(
                    &params.document_id,
                    params.config.as_ref(),
                    params.password.as_deref(),
                ),
                params.timeout_seconds,
                "PDF converted to image(s) successfully",
            )
            .await
            .map(|s| match &params.config {
                Some(config) => s.with("config", config),
                None => s,
            });
        respond("pdf_to_image", "CONVERSION_FAILED", outcome)
    }

    // ---- manipulation ----

    #[tool(description = "Split a PDF into multiple files, returned as a ZIP.

Strategies: BY_PAGE_COUNT (needs pageCount), BY_PAGE_RANGES (needs pageRanges such as [\"1-3\", \"4-10\"]), EVERY_PAGE.")]
    async fn pdf_split(&self, Parameters(params): Parameters<SplitParams>) -> String {
        let outcome = self
            .process_operation(
                Operation::split(
                    &params.document_id,
                    params.split_strategy,
                    params.page_count,
                    params.page_ranges.as_deref(),
                    params.password.as_deref(),
                ),
                params.timeout_seconds,
                "PDF split successfully",
            )
            .await
            .map(|s| s.with("strategy", params.split_strategy));
        respond("pdf_split", "SPLIT_FAILED", outcome)
    }

    #[tool(description = "Extract TEXT, IMAGES or PAGES from a PDF, optionally limited to pageRanges (e.g. \"1-3,5\").")]
    async fn pdf_extract(&self, Parameters(params): Parameters<ExtractParams>) -> String {
        let outcome = self
            .process_operation(
                Operation::extract(
                    &params.document_id,
                    params.extract_type,
                    params.page_ranges.as_deref(),
                    params.password.as_deref(),
                ),
                params.timeout_seconds,
                "Content extracted successfully",
            )
            .await
            .map(|s| s.with("extractType", params.extract_type));
        respond("pdf_extract", "EXTRACT_FAILED", outcome)
    }

    #[tool(description = "Flatten form fields and annotations into static page content.")]
    async fn pdf_flatten(&self, Parameters(params): Parameters<PdfDocumentParams>) -> String {
        let outcome = self
            .process_operation(
                Operation::flatten(&params.document_id, params.password.as_deref()),
                params.timeout_seconds,
                "PDF flattened successfully",
            )
            .await;
        respond("pdf_flatten", "FLATTEN_FAILED", outcome)
    }

    #[tool(description = "Reduce PDF file size. compressionLevel: HIGH (smallest), MEDIUM, LOW (best quality).")]
    async fn pdf_compress(&self, Parameters(params): Parameters<CompressParams>) -> String {
        let outcome = self
            .process_operation(
                Operation::compress(
                    &params.document_id,
                    params.compression_level,
                    params.password.as_deref(),
                ),
                params.timeout_seconds,
                "PDF compressed successfully",
            )
            .await
            .map(|s| s.with("compressionLevel", params.compression_level));
        respond("pdf_compress", "COMPRESS_FAILED", outcome)
    }

    #[tool(description = "Rotate, delete or reorder pages.

Each operation: {type: ROTATE|DELETE|REORDER, pageIndex (0-based), rotation (90/180/270, ROTATE only), targetIndex (REORDER only)}.")]
    async fn pdf_manipulate(&self, Parameters(params): Parameters<ManipulateParams>) -> String {
        let count = params.operations.len();
        let outcome = self
            .process_operation(
                Operation::manipulate(
                    &params.document_id,
                    &params.operations,
                    params.password.as_deref(),
                ),
                params.timeout_seconds,
                &format!("PDF manipulated successfully with {} operations", count),
            )
            .await
            .map(|s| s.with("operationsCount", count));
        respond("pdf_manipulate", "MANIPULATE_FAILED", outcome)
    }

    // ---- enhancement ----

    #[tool(description = "Combine two or more PDFs into one, in the given order. Each entry is {documentId, password?}.")]
    async fn pdf_merge(&self, Parameters(params): Parameters<MergeParams>) -> String {
        let count = params.documents.len();
        let outcome = self
            .process_operation(
                Operation::merge(&params.documents),
                params.timeout_seconds,
                &format!("{} PDFs merged successfully", count),
            )
            .await
            .map(|s| s.with("documentsCount", count));
        respond("pdf_merge", "MERGE_FAILED", outcome)
    }

    #[tool(description = "Add a text or image watermark. For IMAGE, upload the image first and pass its documentId as content. Position: CENTER, TOP_LEFT, TOP_RIGHT, BOTTOM_LEFT, BOTTOM_RIGHT.")]
    async fn pdf_watermark(&self, Parameters(params): Parameters<WatermarkParams>) -> String {
        let outcome = self
            .process_operation(
                Operation::watermark(
                    &params.document_id,
                    &params.watermark,
                    params.password.as_deref(),
                ),
                params.timeout_seconds,
                "Watermark added successfully",
            )
            .await;
        respond("pdf_watermark", "WATERMARK_FAILED", outcome)
    }

    // ---- security ----

    #[tool(description = "Password-protect a PDF. Give a userPassword (to open), an ownerPassword (to change permissions), or both. Permissions such as PRINT, COPY_CONTENT, MODIFY_CONTENT, FILL_FORMS, MODIFY_ANNOTATIONS.")]
    async fn pdf_protect(&self, Parameters(params): Parameters<ProtectParams>) -> String {
        let config = &params.protection;
        let outcome = self
            .process_operation(
                Operation::protect(&params.document_id, config),
                params.timeout_seconds,
                "PDF protected successfully",
            )
            .await
            .map(|s| {
                s.with(
                    "protection",
                    serde_json::json!({
                        "hasUserPassword": config.has_user_password(),
                        "hasOwnerPassword": config.has_owner_password(),
                        "permissions": config.permissions.clone().unwrap_or_default(),
                    }),
                )
            });
        respond("pdf_protect", "PROTECT_FAILED", outcome)
    }

    #[tool(description = "Remove password protection and permission restrictions. Requires the current password.")]
    async fn pdf_remove_password(
        &self,
        Parameters(params): Parameters<RemovePasswordParams>,
    ) -> String {
        let outcome = self
            .process_operation(
                Operation::remove_password(&params.document_id, &params.password),
                params.timeout_seconds,
                "Password removed successfully",
            )
            .await;
        respond("pdf_remove_password", "REMOVE_PASSWORD_FAILED", outcome)
    }

    // ---- optimization ----

    #[tool(description = "Linearize a PDF for fast web view (page-at-a-time loading).")]
    async fn pdf_linearize(&self, Parameters(params): Parameters<DocumentParams>) -> String {
        let outcome = self
            .process_operation(
                Operation::linearize(&params.document_id),
                params.timeout_seconds,
                "PDF linearized successfully",
            )
            .await;
        respond("pdf_linearize", "LINEARIZE_FAILED", outcome)
    }

    // ---- analysis ----

    #[tool(description = "Read PDF properties: page count and sizes, version, encryption, signatures, fonts, metadata and per-page details.

Returns the properties as JSON directly; there is nothing to download.")]
    async fn get_pdf_properties(&self, Parameters(params): Parameters<PropertiesParams>) -> String {
        let outcome = match Operation::pdf_properties(
            &params.document_id,
            params.include_extended_info,
            params.include_page_info,
        ) {
            Ok(op) => self.run_operation(&op, params.timeout_seconds).await,
            Err(e) => Err(e),
        }
        .map(|task| {
            Success::new("PDF properties extracted successfully")
                .with_task_id(task.task_id.clone())
                .with("properties", task.result_data)
        });
        respond("get_pdf_properties", "ANALYSIS_FAILED", outcome)
    }

    #[tool(description = "Compare two PDFs and produce a PDF report highlighting added, removed and modified content.")]
    async fn pdf_compare(&self, Parameters(params): Parameters<CompareParams>) -> String {
        let first = DocumentRef {
            document_id: params.document_id1.clone(),
            password: params.password1.clone(),
        };
        let second = DocumentRef {
            document_id: params.document_id2.clone(),
            password: params.password2.clone(),
        };
        let outcome = self
            .process_operation(
                Operation::compare(&first, &second),
                params.timeout_seconds,
                "PDFs compared successfully",
            )
            .await;
        respond("pdf_compare", "COMPARE_FAILED", outcome)
    }

    #[tool(description = "Run OCR on a scanned or image-based PDF to make it searchable. languages uses codes such as en-US, de-DE, fr-FR, ja-JP, zh-CN (default: [\"en-US\"]).")]
    async fn pdf_ocr(&self, Parameters(params): Parameters<OcrParams>) -> String {
        let outcome = self
            .process_operation(
                Operation::ocr(
                    &params.document_id,
                    params.languages.as_deref(),
                    params.page_ranges.as_deref(),
                    params.password.as_deref(),
                ),
                params.timeout_seconds,
                "OCR completed successfully",
            )
            .await
            .map(|s| {
                let languages = params
                    .languages
                    .clone()
                    .unwrap_or_else(|| vec!["en-US".to_string()]);
                s.with("languages", languages)
            });
        respond("pdf_ocr", "OCR_FAILED", outcome)
    }

    #[tool(description = "Analyze document structure (headings, paragraphs, tables, images, forms). The result is a ZIP with a JSON analysis and extracted assets.")]
    async fn pdf_structural_analysis(
        &self,
        Parameters(params): Parameters<PdfDocumentParams>,
    ) -> String {
        let outcome = self
            .process_operation(
                Operation::structural_analysis(&params.document_id, params.password.as_deref()),
                params.timeout_seconds,
                "Structural analysis completed",
            )
            .await;
        respond("pdf_structural_analysis", "ANALYSIS_FAILED", outcome)
    }

    // ---- forms ----

    #[tool(description = "Export the filled form field values of a PDF as a JSON document.")]
    async fn export_pdf_form_data(
        &self,
        Parameters(params): Parameters<PdfDocumentParams>,
    ) -> String {
        let outcome = self
            .process_operation(
                Operation::export_form_data(&params.document_id, params.password.as_deref()),
                params.timeout_seconds,
                "Form data exported successfully",
            )
            .await;
        respond("export_pdf_form_data", "EXPORT_FORM_FAILED", outcome)
    }

    #[tool(description = "Fill PDF form fields from a JSON object; keys are field names, nested objects address hierarchical fields.")]
    async fn import_pdf_form_data(
        &self,
        Parameters(params): Parameters<ImportFormDataParams>,
    ) -> String {
        let outcome = self
            .process_operation(
                Operation::import_form_data(
                    &params.document_id,
                    &params.form_data,
                    params.password.as_deref(),
                ),
                params.timeout_seconds,
                "Form data imported successfully",
            )
            .await
            .map(|s| s.with("fieldsCount", params.form_data.len()));
        respond("import_pdf_form_data", "IMPORT_FORM_FAILED", outcome)
    }
}

fn wait_timeout(seconds: Option<u64>) -> Option<Duration> {
    seconds.map(Duration::from_secs)
}

impl PdfCloudServer {
    /// Submit `operation` once and wait for its task
    async fn run_operation(
        &self,
        operation: &Operation,
        timeout_seconds: Option<u64>,
    ) -> crate::error::Result<Task> {
        self.engine
            .submit_and_wait(
                || self.client.submit(operation),
                wait_timeout(timeout_seconds),
            )
            .await
    }

    async fn process_operation(
        &self,
        operation: crate::error::Result<Operation>,
        timeout_seconds: Option<u64>,
        action: &str,
    ) -> crate::error::Result<Success> {
        let task = self.run_operation(&operation?, timeout_seconds).await?;
        Ok(Success::from_task(&task, action))
    }

    async fn create_pdf(
        &self,
        tool: &str,
        format: SourceFormat,
        params: &DocumentParams,
        action: &str,
    ) -> String {
        let outcome = self
            .process_operation(
                Operation::create_pdf(format, &params.document_id),
                params.timeout_seconds,
                action,
            )
            .await;
        respond(tool, "CONVERSION_FAILED", outcome)
    }

    async fn convert_pdf(
        &self,
        tool: &str,
        format: TargetFormat,
        params: &PdfDocumentParams,
        action: &str,
    ) -> String {
        let outcome = self
            .process_operation(
                Operation::convert_pdf(format, &params.document_id, params.password.as_deref()),
                params.timeout_seconds,
                action,
            )
            .await;
        respond(tool, "CONVERSION_FAILED", outcome)
    }

    async fn process_upload(&self, params: &UploadDocumentParams) -> crate::error::Result<Success> {
        let max = self.config.max_upload_bytes;
        let file = match (&params.path, &params.file_content) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidParams {
                    reason: "Provide either path or fileContent, not both".to_string(),
                })
            }
            (Some(path), None) => {
                let path = self.validate_path_access(path)?;
                resolve_path(&path, params.file_name.as_deref(), max)?
            }
            (None, Some(content)) => resolve_base64(content, params.file_name.as_deref(), max)?,
            (None, None) => {
                return Err(Error::InvalidParams {
                    reason: "Must provide either path or fileContent".to_string(),
                })
            }
        };

        let document_id = self.client.upload_document(&file.file_name, file.data).await?;
        Ok(Success::new(format!(
            "Document uploaded successfully. Use documentId '{}' in other operations.",
            document_id
        ))
        .with("documentId", &document_id)
        .with("fileName", &file.file_name))
    }

    async fn process_download(
        &self,
        params: &DownloadDocumentParams,
    ) -> crate::error::Result<Success> {
        // Reject a forbidden destination before fetching anything
        self.validate_output_path_access(&params.output_path)?;

        let data = self
            .client
            .download_document(&params.document_id, params.filename.as_deref())
            .await?;
        let size = data.len();
        self.write_output(&params.output_path, &data).await?;

        Ok(Success::new(format!(
            "Document downloaded successfully to {}",
            params.output_path
        ))
        .with("documentId", &params.document_id)
        .with("outputPath", &params.output_path)
        .with("size", size))
    }

    async fn process_task_status(&self, params: &TaskStatusParams) -> crate::error::Result<Success> {
        let mut task = self.client.get_task(&params.task_id).await?;
        if task.task_id.is_empty() {
            task.task_id = params.task_id.clone();
        }

        let summary = match task.status {
            TaskStatus::Completed => "Task completed".to_string(),
            TaskStatus::Failed => format!(
                "Task failed: {}",
                task.error
                    .as_ref()
                    .and_then(|e| e.message.as_deref())
                    .unwrap_or(TASK_FAILED_DEFAULT_MESSAGE)
            ),
            other => format!("Task is {} ({}% complete)", other.as_str(), task.progress),
        };

        let mut success = Success::from_task(&task, &summary)
            .with("status", task.status)
            .with("progress", task.progress);
        if let Some(error) = &task.error {
            success = success.with("taskError", error);
        }
        Ok(success)
    }

    /// Validate that a path is within allowed resource directories.
    /// If no resource_dirs are configured, all paths are allowed.
    fn validate_path_access(&self, path: &str) -> crate::error::Result<PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(PathBuf::from(path));
        }

        let canonical = std::fs::canonicalize(path).map_err(|_| Error::PathAccessDenied {
            path: path.to_string(),
        })?;

        if self.within_resource_dirs(&canonical) {
            Ok(canonical)
        } else {
            Err(Error::PathAccessDenied {
                path: path.to_string(),
            })
        }
    }

    /// Validate that an output path is within allowed resource directories.
    /// Canonicalizes the parent directory since the output file may not exist yet.
    fn validate_output_path_access(&self, path: &str) -> crate::error::Result<PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(PathBuf::from(path));
        }

        let path_obj = Path::new(path);
        let parent = match path_obj.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let file_name = path_obj.file_name().ok_or_else(|| Error::PathAccessDenied {
            path: path.to_string(),
        })?;

        let canonical_parent = std::fs::canonicalize(parent).map_err(|_| Error::PathAccessDenied {
            path: path.to_string(),
        })?;
        let canonical_target = canonical_parent.join(file_name);

        if self.within_resource_dirs(&canonical_target) {
            Ok(canonical_target)
        } else {
            Err(Error::PathAccessDenied {
                path: path.to_string(),
            })
        }
    }

    fn within_resource_dirs(&self, canonical: &Path) -> bool {
        self.config.resource_dirs.iter().any(|dir| {
            std::fs::canonicalize(dir)
                .map(|canonical_dir| canonical.starts_with(canonical_dir))
                .unwrap_or(false)
        })
    }

    /// Write downloaded data to a file path, with sandbox validation.
    async fn write_output(&self, output_path: &str, data: &[u8]) -> crate::error::Result<()> {
        let path = self.validate_output_path_access(output_path)?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(&path, data).await?;
        Ok(())
    }
}

#[tool_handler]
impl ServerHandler for PdfCloudServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Foxit PDF cloud tools. Workflow: upload_document to get a documentId, run an \
                 operation (convert, merge, split, protect, watermark, OCR, ...) which waits for \
                 the cloud task and returns a resultDocumentId, then download_document to save \
                 the result. Operations that time out keep running remotely; resume them with \
                 wait_for_task."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    tracing::info!(
        base_url = %config.api.base_url,
        resource_dirs = config.resource_dirs.len(),
        "Foxit PDF MCP Server starting"
    );
    let server = PdfCloudServer::with_config(config)?;

    tracing::info!("Foxit PDF MCP Server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
