//! The fixed document-chunk collection schema.
//!
//! Every collection provisioned by this crate has the same seven fields:
//!
//! ```text
//! id           VarChar(100)   primary key, UUID
//! embedding    FloatVector    dimension fixed at creation
//! file_path    VarChar(512)
//! file_name    VarChar(255)
//! chunk_index  Int64          0-based position within the file
//! category     VarChar(100)
//! text         VarChar(2000)  chunk preview
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::chunk::DocumentChunk;
use crate::error::{VectorError, VectorResult};

/// Default embedding dimension.
pub const DEFAULT_DIMENSION: usize = 768;

/// Largest vector dimension Milvus accepts for a float vector field.
pub const MAX_DIMENSION: usize = 32_768;

/// Description stored on every provisioned collection.
pub const COLLECTION_DESCRIPTION: &str =
    "Customer support documents collection with enhanced metadata";

/// Field names of the document-chunk schema.
pub mod field {
    /// Primary key.
    pub const ID: &str = "id";
    /// Dense vector.
    pub const EMBEDDING: &str = "embedding";
    /// Original full file path.
    pub const FILE_PATH: &str = "file_path";
    /// File name only.
    pub const FILE_NAME: &str = "file_name";
    /// Chunk position within the file.
    pub const CHUNK_INDEX: &str = "chunk_index";
    /// Support topic label.
    pub const CATEGORY: &str = "category";
    /// Chunk text preview.
    pub const TEXT: &str = "text";
}

/// Scalar and vector types used by the schema.
///
/// The string forms are the Milvus RESTful API type names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// Variable-length string with a maximum length.
    VarChar,
    /// Fixed-dimension vector of 32-bit floats.
    FloatVector,
}

/// A single field of a collection schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field name.
    pub name: String,
    /// Field type.
    pub data_type: DataType,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Whether this field is the primary key.
    #[serde(default)]
    pub is_primary: bool,
    /// Maximum length in characters, for `VarChar` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Vector dimension, for `FloatVector` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
}

impl FieldSchema {
    /// Creates a `VarChar` primary key field.
    pub fn primary_varchar(
        name: impl Into<String>,
        description: impl Into<String>,
        max_length: usize,
    ) -> Self {
        Self {
            is_primary: true,
            ..Self::varchar(name, description, max_length)
        }
    }

    /// Creates a `VarChar` field.
    pub fn varchar(
        name: impl Into<String>,
        description: impl Into<String>,
        max_length: usize,
    ) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::VarChar,
            description: description.into(),
            is_primary: false,
            max_length: Some(max_length),
            dim: None,
        }
    }

    /// Creates an `Int64` field.
    pub fn int64(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Int64,
            description: description.into(),
            is_primary: false,
            max_length: None,
            dim: None,
        }
    }

    /// Creates a `FloatVector` field.
    pub fn float_vector(
        name: impl Into<String>,
        description: impl Into<String>,
        dim: usize,
    ) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::FloatVector,
            description: description.into(),
            is_primary: false,
            max_length: None,
            dim: Some(dim),
        }
    }

    /// Type label for operator output, e.g. `FloatVector(768)`.
    pub fn type_label(&self) -> String {
        match (self.data_type, self.dim) {
            (DataType::FloatVector, Some(dim)) => format!("{}({dim})", self.data_type),
            (DataType::FloatVector, None) => format!("{}(?)", self.data_type),
            _ => self.data_type.to_string(),
        }
    }
}

/// Collection schema descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Collection description.
    pub description: String,
    /// Ordered field list.
    pub fields: Vec<FieldSchema>,
    /// Whether the server generates primary keys.
    #[serde(default)]
    pub auto_id: bool,
    /// Whether rows may carry fields outside the schema.
    #[serde(default)]
    pub enable_dynamic_field: bool,
}

impl CollectionSchema {
    /// Creates an empty schema with a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            fields: Vec::new(),
            auto_id: false,
            enable_dynamic_field: false,
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the primary key field.
    pub fn primary_field(&self) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.is_primary)
    }

    /// Returns the first vector field.
    pub fn vector_field(&self) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.data_type == DataType::FloatVector)
    }

    /// Dimension of the vector field, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.vector_field().and_then(|f| f.dim)
    }

    /// Checks the structural invariants of the descriptor.
    ///
    /// Exactly one primary key, unique field names, and a vector field
    /// with a dimension in `1..=MAX_DIMENSION`.
    pub fn validate(&self) -> VectorResult<()> {
        let mut names = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(VectorError::invalid_schema("field name cannot be empty"));
            }
            if !names.insert(field.name.as_str()) {
                return Err(VectorError::invalid_schema(format!(
                    "duplicate field '{}'",
                    field.name
                )));
            }
            if field.data_type == DataType::VarChar && field.max_length.is_none_or(|l| l == 0) {
                return Err(VectorError::invalid_schema(format!(
                    "varchar field '{}' needs a positive max_length",
                    field.name
                )));
            }
        }

        match self.fields.iter().filter(|f| f.is_primary).count() {
            1 => {}
            n => {
                return Err(VectorError::invalid_schema(format!(
                    "expected exactly one primary key field, found {n}"
                )));
            }
        }

        let dim = self
            .vector_field()
            .ok_or_else(|| VectorError::invalid_schema("schema has no vector field"))?
            .dim
            .unwrap_or(0);
        if dim == 0 || dim > MAX_DIMENSION {
            return Err(VectorError::invalid_schema(format!(
                "vector dimension must be within 1..={MAX_DIMENSION}, got {dim}"
            )));
        }

        Ok(())
    }

    /// Checks a record against this schema before it is sent to the server.
    pub fn validate_record(&self, chunk: &DocumentChunk) -> VectorResult<()> {
        if let Some(expected) = self.dimension()
            && chunk.embedding.len() != expected
        {
            return Err(VectorError::dimension_mismatch(
                expected,
                chunk.embedding.len(),
            ));
        }

        for (name, value) in chunk.varchar_values() {
            let Some(max_length) = self.field(name).and_then(|f| f.max_length) else {
                continue;
            };
            let actual = value.chars().count();
            if actual > max_length {
                return Err(VectorError::field_too_long(name, max_length, actual));
            }
        }

        Ok(())
    }
}

/// Builds the document-chunk schema for the given embedding dimension.
pub fn define_schema(dimension: usize) -> CollectionSchema {
    CollectionSchema::new(COLLECTION_DESCRIPTION)
        .with_field(FieldSchema::primary_varchar(
            field::ID,
            "Unique chunk ID (UUID recommended)",
            100,
        ))
        .with_field(FieldSchema::float_vector(
            field::EMBEDDING,
            "Dense vector embeddings",
            dimension,
        ))
        .with_field(FieldSchema::varchar(
            field::FILE_PATH,
            "Original full file path",
            512,
        ))
        .with_field(FieldSchema::varchar(
            field::FILE_NAME,
            "Filename (e.g., 'guide.md')",
            255,
        ))
        .with_field(FieldSchema::int64(
            field::CHUNK_INDEX,
            "Position of chunk within file (0-based)",
        ))
        .with_field(FieldSchema::varchar(
            field::CATEGORY,
            "Support category (e.g., 'installation', 'troubleshooting')",
            100,
        ))
        .with_field(FieldSchema::varchar(
            field::TEXT,
            "Chunk text preview",
            2000,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(dim: usize) -> DocumentChunk {
        DocumentChunk {
            id: "8b7c3c1e-2f61-4c55-9d0e-1f6a3b8e2d10".to_owned(),
            embedding: vec![0.5; dim],
            file_path: "/docs/support/guide.md".to_owned(),
            file_name: "guide.md".to_owned(),
            chunk_index: 0,
            category: "installation".to_owned(),
            text: "Install the agent first.".to_owned(),
        }
    }

    #[test]
    fn default_schema_has_seven_fields() {
        let schema = define_schema(DEFAULT_DIMENSION);
        let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "id",
                "embedding",
                "file_path",
                "file_name",
                "chunk_index",
                "category",
                "text"
            ]
        );
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn vector_field_has_requested_dimension() {
        let schema = define_schema(768);
        let vector = schema.vector_field().unwrap();
        assert_eq!(vector.name, field::EMBEDDING);
        assert_eq!(vector.dim, Some(768));
        assert_eq!(schema.dimension(), Some(768));
    }

    #[test]
    fn primary_key_is_unique() {
        let schema = define_schema(768);
        let primaries: Vec<_> = schema.fields.iter().filter(|f| f.is_primary).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].name, field::ID);
        assert_eq!(primaries[0].data_type, DataType::VarChar);
        assert_eq!(primaries[0].max_length, Some(100));
    }

    #[test]
    fn define_schema_is_pure() {
        assert_eq!(define_schema(384), define_schema(384));
        assert_ne!(define_schema(384), define_schema(768));
    }

    #[test]
    fn validate_rejects_second_primary_key() {
        let schema = define_schema(8).with_field(FieldSchema::primary_varchar("alt", "", 10));
        assert!(matches!(
            schema.validate(),
            Err(VectorError::InvalidSchema(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_dimension() {
        assert!(define_schema(0).validate().is_err());
        assert!(define_schema(MAX_DIMENSION + 1).validate().is_err());
        assert!(define_schema(MAX_DIMENSION).validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let schema = define_schema(8).with_field(FieldSchema::int64(field::CHUNK_INDEX, ""));
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate field 'chunk_index'"));
    }

    #[test]
    fn record_dimension_must_match() {
        let schema = define_schema(4);
        assert!(schema.validate_record(&chunk(4)).is_ok());
        assert!(matches!(
            schema.validate_record(&chunk(3)),
            Err(VectorError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn record_strings_respect_max_length() {
        let schema = define_schema(4);
        let mut record = chunk(4);
        record.text = "é".repeat(2000);
        assert!(schema.validate_record(&record).is_ok());

        record.category = "c".repeat(101);
        assert!(matches!(
            schema.validate_record(&record),
            Err(VectorError::FieldTooLong { max_length: 100, actual: 101, .. })
        ));
    }

    #[test]
    fn type_label_includes_dimension() {
        let schema = define_schema(768);
        assert_eq!(schema.fields[0].type_label(), "VarChar");
        assert_eq!(schema.fields[1].type_label(), "FloatVector(768)");
        assert_eq!(schema.fields[4].type_label(), "Int64");
    }

    #[test]
    fn data_type_parses_rest_names() {
        assert_eq!("VarChar".parse::<DataType>().unwrap(), DataType::VarChar);
        assert_eq!("floatvector".parse::<DataType>().unwrap(), DataType::FloatVector);
        assert!("BinaryVector".parse::<DataType>().is_err());
    }
}
