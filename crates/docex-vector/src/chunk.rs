//! Document chunk record.

use serde::{Deserialize, Serialize};

use crate::schema::field;

/// One row of a document-chunk collection.
///
/// Field names serialize exactly as the collection schema declares them, so
/// a chunk can be sent as a Milvus row without remapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique chunk id (UUID).
    pub id: String,
    /// Dense embedding of the chunk text.
    pub embedding: Vec<f32>,
    /// Original full file path.
    pub file_path: String,
    /// File name only.
    pub file_name: String,
    /// 0-based position of the chunk within its file.
    pub chunk_index: i64,
    /// Support topic label.
    pub category: String,
    /// Preview of the chunk content.
    pub text: String,
}

impl DocumentChunk {
    /// String-valued fields paired with their schema field names.
    pub(crate) fn varchar_values(&self) -> [(&'static str, &str); 5] {
        [
            (field::ID, &self.id),
            (field::FILE_PATH, &self.file_path),
            (field::FILE_NAME, &self.file_name),
            (field::CATEGORY, &self.category),
            (field::TEXT, &self.text),
        ]
    }
}
