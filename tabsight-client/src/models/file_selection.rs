//! Files chosen for upload and the advisory checks applied to them

use crate::error::UploadError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabsight_common::config::UploadConfig;

/// Extensions the analysis service understands
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Where a file's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// One selected file: name, byte size and declared (MIME) type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    name: String,
    size: u64,
    content_type: String,
    source: FileSource,
}

impl FileHandle {
    /// Describe a file on disk. Reads metadata only, not contents.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::FileRead {
                name: path.display().to_string(),
                reason: "path has no file name".to_string(),
            })?;

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| UploadError::FileRead {
                name: name.clone(),
                reason: e.to_string(),
            })?;

        if !metadata.is_file() {
            return Err(UploadError::FileRead {
                name,
                reason: "not a regular file".to_string(),
            });
        }

        Ok(Self {
            content_type: content_type_for(&name).to_string(),
            name,
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// In-memory file content
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let bytes: Vec<u8> = bytes.into();
        Self {
            content_type: content_type_for(&name).to_string(),
            size: bytes.len() as u64,
            name,
            source: FileSource::Bytes(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Lowercased extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    pub fn has_supported_extension(&self) -> bool {
        self.extension()
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Load the file content for encoding
    pub async fn read_contents(&self) -> Result<Vec<u8>, UploadError> {
        match &self.source {
            FileSource::Bytes(bytes) => Ok(bytes.to_vec()),
            FileSource::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|e| UploadError::FileRead {
                        name: self.name.clone(),
                        reason: e.to_string(),
                    })
            }
        }
    }
}

fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match ext.as_deref() {
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        _ => "application/octet-stream",
    }
}

/// Advisory client-side checks run before any network call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadPolicy {
    pub enforce_file_types: bool,
    pub max_file_bytes: Option<u64>,
}

impl From<&UploadConfig> for UploadPolicy {
    fn from(config: &UploadConfig) -> Self {
        Self {
            enforce_file_types: config.enforce_file_types,
            max_file_bytes: config.max_file_bytes.filter(|limit| *limit > 0),
        }
    }
}

/// Ordered files for one upload attempt. Replaced wholesale on re-selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileSelection {
    files: Vec<FileHandle>,
}

impl FileSelection {
    pub fn new(files: Vec<FileHandle>) -> Self {
        Self { files }
    }

    /// Describe every path, in order
    pub async fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, UploadError> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(FileHandle::from_path(path).await?);
        }
        Ok(Self { files })
    }

    pub fn files(&self) -> &[FileHandle] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(FileHandle::size).sum()
    }

    /// First violated precondition, if any. Pure: no I/O.
    pub fn check(&self, policy: &UploadPolicy) -> Result<(), UploadError> {
        if self.files.is_empty() {
            return Err(UploadError::EmptySelection);
        }

        for file in &self.files {
            if policy.enforce_file_types && !file.has_supported_extension() {
                return Err(UploadError::UnsupportedFileType {
                    name: file.name.clone(),
                    extension: file.extension().unwrap_or_default(),
                });
            }

            if let Some(limit) = policy.max_file_bytes {
                if file.size > limit {
                    return Err(UploadError::FileTooLarge {
                        name: file.name.clone(),
                        size: file.size,
                        limit,
                    });
                }
            }
        }

        Ok(())
    }
}

impl FromIterator<FileHandle> for FileSelection {
    fn from_iter<I: IntoIterator<Item = FileHandle>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(FileHandle::from_bytes("a.csv", "x").content_type(), "text/csv");
        assert_eq!(
            FileHandle::from_bytes("b.XLSX", "x").content_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(
            FileHandle::from_bytes("c.xls", "x").content_type(),
            "application/vnd.ms-excel"
        );
        assert_eq!(
            FileHandle::from_bytes("notes", "x").content_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_empty_selection_always_rejected() {
        let selection = FileSelection::default();
        assert_eq!(
            selection.check(&UploadPolicy::default()),
            Err(UploadError::EmptySelection)
        );
    }

    #[test]
    fn test_file_types_advisory_by_default() {
        let selection: FileSelection = vec![FileHandle::from_bytes("report.pdf", "x")]
            .into_iter()
            .collect();
        assert!(selection.check(&UploadPolicy::default()).is_ok());

        let strict = UploadPolicy {
            enforce_file_types: true,
            max_file_bytes: None,
        };
        assert_eq!(
            selection.check(&strict),
            Err(UploadError::UnsupportedFileType {
                name: "report.pdf".to_string(),
                extension: "pdf".to_string(),
            })
        );
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let strict = UploadPolicy {
            enforce_file_types: true,
            max_file_bytes: None,
        };
        let selection = FileSelection::new(vec![
            FileHandle::from_bytes("DATA.CSV", "a,b"),
            FileHandle::from_bytes("sheet.Xlsx", "x"),
        ]);
        assert!(selection.check(&strict).is_ok());
    }

    #[test]
    fn test_size_limit() {
        let selection = FileSelection::new(vec![FileHandle::from_bytes("big.csv", vec![0u8; 11])]);
        let policy = UploadPolicy {
            enforce_file_types: false,
            max_file_bytes: Some(10),
        };
        assert_eq!(
            selection.check(&policy),
            Err(UploadError::FileTooLarge {
                name: "big.csv".to_string(),
                size: 11,
                limit: 10,
            })
        );
    }

    #[test]
    fn test_zero_limit_disables_size_check() {
        let config = UploadConfig {
            enforce_file_types: false,
            max_file_bytes: Some(0),
        };
        assert_eq!(UploadPolicy::from(&config).max_file_bytes, None);
    }

    #[tokio::test]
    async fn test_from_path_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "age,bmi\n42,23.1\n").unwrap();

        let handle = FileHandle::from_path(&path).await.unwrap();
        assert_eq!(handle.name(), "data.csv");
        assert_eq!(handle.size(), 16);
        assert_eq!(handle.content_type(), "text/csv");
        assert_eq!(handle.read_contents().await.unwrap(), b"age,bmi\n42,23.1\n");
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileHandle::from_path(dir.path().join("absent.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::FileRead { ref name, .. } if name == "absent.csv"));
    }
}
