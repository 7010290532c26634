use bytes::Bytes;

/// A file submitted under the `file` field of an upload request.
///
/// The name doubles as the storage key when the batch is persisted.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type,
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One entry of the `file` field. Entries without a filename are plain
/// form values rather than files.
#[derive(Debug, Clone)]
pub enum UploadEntry {
    File(UploadedFile),
    Text { value: String },
}

impl UploadEntry {
    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            UploadEntry::File(file) => Some(file),
            UploadEntry::Text { .. } => None,
        }
    }
}
