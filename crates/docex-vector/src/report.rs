//! Collection state report for operator inspection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::index::IndexInfo;
use crate::schema::{CollectionSchema, FieldSchema};

const RULE_WIDTH: usize = 60;

/// One schema field as shown in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    /// Field name.
    pub name: String,
    /// Type label, e.g. `FloatVector(768)`.
    pub data_type: String,
    /// Whether the field is the primary key.
    pub is_primary: bool,
}

impl From<&FieldSchema> for FieldReport {
    fn from(field: &FieldSchema) -> Self {
        Self {
            name: field.name.clone(),
            data_type: field.type_label(),
            is_primary: field.is_primary,
        }
    }
}

/// Snapshot of a collection: row count, fields and indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionReport {
    /// Collection name.
    pub collection: String,
    /// Persisted row count.
    pub row_count: u64,
    /// Schema fields in declaration order.
    pub fields: Vec<FieldReport>,
    /// Indexes on the collection.
    pub indexes: Vec<IndexInfo>,
}

impl CollectionReport {
    /// Assembles a report from its parts.
    pub fn new(
        collection: impl Into<String>,
        row_count: u64,
        schema: &CollectionSchema,
        indexes: Vec<IndexInfo>,
    ) -> Self {
        Self {
            collection: collection.into(),
            row_count,
            fields: schema.fields.iter().map(FieldReport::from).collect(),
            indexes,
        }
    }
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "Collection Verification")?;
        writeln!(f, "{rule}")?;
        writeln!(f)?;
        writeln!(f, "Collection Name: {}", self.collection)?;
        writeln!(f, "Number of Entities: {}", self.row_count)?;
        writeln!(f)?;

        writeln!(f, "Schema Fields:")?;
        for field in &self.fields {
            write!(f, "  - {}: {}", field.name, field.data_type)?;
            if field.is_primary {
                write!(f, " (Primary Key)")?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;

        writeln!(f, "Indexes:")?;
        if self.indexes.is_empty() {
            writeln!(f, "  No indexes found. Create an index for efficient search.")?;
        }
        for index in &self.indexes {
            writeln!(f, "  - Field: {}", index.field_name)?;
            writeln!(f, "    Type: {}", index.index_type)?;
            writeln!(f, "    Metric: {}", index.metric_type)?;
        }
        writeln!(f)?;
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexParams, MetricType};
    use crate::schema::define_schema;

    #[test]
    fn renders_fields_and_indexes() {
        let report = CollectionReport::new(
            "support_docs_v1",
            5,
            &define_schema(768),
            vec![IndexInfo::from(&IndexParams::hnsw("embedding", MetricType::L2))],
        );
        let text = report.to_string();

        assert!(text.contains("Collection Name: support_docs_v1"));
        assert!(text.contains("Number of Entities: 5"));
        assert!(text.contains("  - id: VarChar (Primary Key)"));
        assert!(text.contains("  - embedding: FloatVector(768)"));
        assert!(text.contains("    Type: HNSW"));
        assert!(text.contains("    Metric: L2"));
    }

    #[test]
    fn warns_without_indexes() {
        let report = CollectionReport::new("c", 0, &define_schema(4), Vec::new());
        assert!(report.to_string().contains("No indexes found"));
    }

    #[test]
    fn serializes_as_json() {
        let report = CollectionReport::new("c", 2, &define_schema(4), Vec::new());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["collection"], "c");
        assert_eq!(value["row_count"], 2);
        assert_eq!(value["fields"][1]["data_type"], "FloatVector(4)");
        assert_eq!(value["fields"][0]["is_primary"], true);
    }
}
