//! Foxit PDF cloud API access
//!
//! - [`Transport`]: authenticated HTTP with 429 backoff
//! - [`CloudClient`]: document and task endpoints
//! - [`TaskEngine`]: submit once, poll to a terminal state
//! - [`Operation`]: the catalog of document operations

mod client;
mod engine;
mod operation;
mod retry;
mod task;
mod transport;

pub use client::CloudClient;
pub use engine::{TaskEngine, TaskStatusSource};
pub use operation::{
    prune_nulls, CompressionLevel, DocumentRef, ExtractType, ImageConfig, ImageFormat, Operation,
    PageDimension, PageLayout, PageMode, PageOperation, PageOperationType, PageRotation,
    ProtectionConfig, ScalingMode, SourceFormat, SplitStrategy, TargetFormat, WatermarkConfig,
    WatermarkPosition, WatermarkType,
};
pub use retry::RetryPolicy;
pub use task::{DocumentUpload, Task, TaskError, TaskStatus, TaskSubmission};
pub use transport::{ApiRequest, RequestBody, Transport};
