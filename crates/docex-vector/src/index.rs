//! Vector index parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// HNSW maximum graph degree.
pub const HNSW_M: u32 = 16;

/// HNSW search width used while building the graph.
pub const HNSW_EF_CONSTRUCTION: u32 = 200;

/// Distance metric of a vector index.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[strum(ascii_case_insensitive)]
pub enum MetricType {
    /// Euclidean distance.
    #[default]
    L2,
    /// Inner product.
    IP,
}

/// Index algorithm.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum IndexType {
    /// Hierarchical navigable small world graph.
    #[default]
    #[serde(rename = "HNSW")]
    #[strum(serialize = "HNSW")]
    Hnsw,
}

/// Parameters for building an index on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParams {
    /// Indexed field.
    pub field_name: String,
    /// Index name, unique within the collection.
    pub index_name: String,
    /// Index algorithm.
    pub index_type: IndexType,
    /// Distance metric.
    pub metric_type: MetricType,
    /// Algorithm build parameters, as the server expects them.
    pub params: BTreeMap<String, String>,
}

impl IndexParams {
    /// HNSW index with the fixed build parameters (`M = 16`, `efConstruction = 200`).
    pub fn hnsw(field_name: impl Into<String>, metric_type: MetricType) -> Self {
        let field_name = field_name.into();
        Self {
            index_name: field_name.clone(),
            field_name,
            index_type: IndexType::Hnsw,
            metric_type,
            params: BTreeMap::from([
                ("M".to_owned(), HNSW_M.to_string()),
                ("efConstruction".to_owned(), HNSW_EF_CONSTRUCTION.to_string()),
            ]),
        }
    }
}

/// Index metadata as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Indexed field.
    pub field_name: String,
    /// Index name.
    pub index_name: String,
    /// Index algorithm, e.g. `HNSW`.
    pub index_type: String,
    /// Distance metric, e.g. `L2`.
    pub metric_type: String,
}

impl From<&IndexParams> for IndexInfo {
    fn from(params: &IndexParams) -> Self {
        Self {
            field_name: params.field_name.clone(),
            index_name: params.index_name.clone(),
            index_type: params.index_type.to_string(),
            metric_type: params.metric_type.to_string(),
        }
    }
}
