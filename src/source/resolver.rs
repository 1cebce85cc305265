//! Resolve upload input into bytes and a file name

use crate::error::{Error, Result};
use base64::Engine;
use std::path::Path;

/// File content ready for a multipart upload
#[derive(Debug)]
pub struct ResolvedFile {
    pub data: Vec<u8>,
    pub file_name: String,
}

/// Read a local file, refusing anything larger than `max_bytes`.
///
/// `file_name` overrides the name derived from the path.
pub fn resolve_path<P: AsRef<Path>>(
    path: P,
    file_name: Option<&str>,
    max_bytes: u64,
) -> Result<ResolvedFile> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }

    // Check size before reading the whole file
    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(Error::FileTooLarge {
            size,
            max_size: max_bytes,
        });
    }

    let data = std::fs::read(path)?;
    let file_name = match file_name.filter(|n| !n.trim().is_empty()) {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string()),
    };

    Ok(ResolvedFile { data, file_name })
}

/// Decode base64 file content; a file name is mandatory here
pub fn resolve_base64(content: &str, file_name: Option<&str>, max_bytes: u64) -> Result<ResolvedFile> {
    let file_name = file_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| Error::InvalidParams {
            reason: "fileName is required when using fileContent".to_string(),
        })?;

    // Line-wrapped base64 is common in pasted content
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let data = base64::engine::general_purpose::STANDARD.decode(compact)?;

    if data.len() as u64 > max_bytes {
        return Err(Error::FileTooLarge {
            size: data.len() as u64,
            max_size: max_bytes,
        });
    }

    Ok(ResolvedFile {
        data,
        file_name: file_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_resolve_path_not_found() {
        let result = resolve_path("/nonexistent/path/file.pdf", None, 1024);
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_resolve_path_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_path(dir.path(), None, 1024);
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_resolve_path_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        file.write_all(b"word content").unwrap();

        let resolved = resolve_path(file.path(), None, 1024).unwrap();
        assert_eq!(resolved.data, b"word content");
        assert!(resolved.file_name.ends_with(".docx"));

        let renamed = resolve_path(file.path(), Some("report.docx"), 1024).unwrap();
        assert_eq!(renamed.file_name, "report.docx");
    }

    #[test]
    fn test_resolve_path_too_large() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();

        let result = resolve_path(file.path(), None, 32);
        assert!(matches!(
            result,
            Err(Error::FileTooLarge {
                size: 64,
                max_size: 32
            })
        ));
    }

    #[test]
    fn test_resolve_base64() {
        // "Hello World"
        let resolved = resolve_base64("SGVsbG8g\nV29ybGQ=", Some("hello.txt"), 1024).unwrap();
        assert_eq!(resolved.data, b"Hello World");
        assert_eq!(resolved.file_name, "hello.txt");
    }

    #[test]
    fn test_resolve_base64_requires_file_name() {
        let result = resolve_base64("SGVsbG8gV29ybGQ=", None, 1024);
        assert!(matches!(result, Err(Error::InvalidParams { .. })));
        let result = resolve_base64("SGVsbG8gV29ybGQ=", Some(" "), 1024);
        assert!(matches!(result, Err(Error::InvalidParams { .. })));
    }

    #[test]
    fn test_resolve_base64_invalid_base64() {
        let result = resolve_base64("not valid base64!!!", Some("a.pdf"), 1024);
        assert!(matches!(result, Err(Error::Base64Decode(_))));
    }

    #[test]
    fn test_resolve_base64_too_large() {
        let result = resolve_base64("SGVsbG8gV29ybGQ=", Some("a.txt"), 4);
        assert!(matches!(result, Err(Error::FileTooLarge { .. })));
    }
}
