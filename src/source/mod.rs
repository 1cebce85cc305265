//! Local file sources for uploads

pub mod resolver;

pub use resolver::{resolve_base64, resolve_path, ResolvedFile};
