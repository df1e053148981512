//! Request and response bodies of the Milvus RESTful API v2.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chunk::DocumentChunk;
use crate::error::{VectorError, VectorResult};
use crate::index::{IndexInfo, IndexParams};
use crate::schema::{CollectionSchema, DataType, FieldSchema};

/// Codes the server uses for success, depending on version.
const SUCCESS_CODES: [i64; 2] = [0, 200];

/// Prometheus gauge whose `version` label carries the server version.
const BUILD_INFO_METRIC: &str = "milvus_build_info";

/// Extracts the server version from a Prometheus text exposition.
pub(crate) fn build_version(metrics: &str) -> Option<String> {
    metrics
        .lines()
        .filter(|line| line.starts_with(BUILD_INFO_METRIC))
        .find_map(|line| {
            let labels = line.split_once('{')?.1.split_once('}')?.0;
            labels.split(',').find_map(|label| {
                let (key, value) = label.split_once('=')?;
                let value = value.trim().trim_matches('"');
                (key.trim() == "version" && !value.is_empty()).then(|| value.to_owned())
            })
        })
}

/// Common `{code, message, data}` envelope of every response.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Returns the payload or the server's error.
    pub fn into_data(self) -> VectorResult<Option<T>> {
        if SUCCESS_CODES.contains(&self.code) {
            Ok(self.data)
        } else {
            Err(VectorError::server(
                self.code,
                self.message.unwrap_or_else(|| "no message".to_owned()),
            ))
        }
    }
}

/// Body addressing the database only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DatabaseRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<&'a str>,
}

/// Body addressing one collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionRequest<'a> {
    pub collection_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<&'a str>,
}

/// Body addressing one index of a collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IndexRequest<'a> {
    pub collection_name: &'a str,
    pub index_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateCollectionRequest<'a> {
    pub collection_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<&'a str>,
    pub description: &'a str,
    pub schema: SchemaBody<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaBody<'a> {
    pub auto_id: bool,
    pub enabled_dynamic_field: bool,
    pub fields: Vec<FieldBody<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FieldBody<'a> {
    pub field_name: &'a str,
    pub data_type: DataType,
    pub is_primary: bool,
    pub description: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub element_type_params: BTreeMap<&'static str, String>,
}

impl<'a> CreateCollectionRequest<'a> {
    pub fn new(name: &'a str, db_name: Option<&'a str>, schema: &'a CollectionSchema) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|field| {
                let mut element_type_params = BTreeMap::new();
                if let Some(max_length) = field.max_length {
                    element_type_params.insert("max_length", max_length.to_string());
                }
                if let Some(dim) = field.dim {
                    element_type_params.insert("dim", dim.to_string());
                }
                FieldBody {
                    field_name: &field.name,
                    data_type: field.data_type,
                    is_primary: field.is_primary,
                    description: &field.description,
                    element_type_params,
                }
            })
            .collect();

        Self {
            collection_name: name,
            db_name,
            description: &schema.description,
            schema: SchemaBody {
                auto_id: schema.auto_id,
                enabled_dynamic_field: schema.enable_dynamic_field,
                fields,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateIndexRequest<'a> {
    pub collection_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<&'a str>,
    pub index_params: [IndexParamsBody<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IndexParamsBody<'a> {
    pub field_name: &'a str,
    pub index_name: &'a str,
    pub metric_type: String,
    pub params: BTreeMap<&'a str, String>,
}

impl<'a> CreateIndexRequest<'a> {
    pub fn new(collection: &'a str, db_name: Option<&'a str>, index: &'a IndexParams) -> Self {
        let mut params: BTreeMap<&str, String> = index
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        params.insert("index_type", index.index_type.to_string());

        Self {
            collection_name: collection,
            db_name,
            index_params: [IndexParamsBody {
                field_name: &index.field_name,
                index_name: &index.index_name,
                metric_type: index.metric_type.to_string(),
                params,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertRequest<'a> {
    pub collection_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<&'a str>,
    pub data: &'a [DocumentChunk],
}

#[derive(Debug, Deserialize)]
pub(crate) struct HasCollection {
    pub has: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionStats {
    #[serde(default)]
    pub row_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertResult {
    #[serde(default)]
    pub insert_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IndexDescription {
    pub field_name: String,
    pub index_name: String,
    #[serde(default)]
    pub index_type: String,
    #[serde(default)]
    pub metric_type: String,
}

impl From<IndexDescription> for IndexInfo {
    fn from(index: IndexDescription) -> Self {
        Self {
            field_name: index.field_name,
            index_name: index.index_name,
            index_type: index.index_type,
            metric_type: index.metric_type,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionDescription {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub auto_id: bool,
    #[serde(default)]
    pub enable_dynamic_field: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FieldDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<KeyValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeyValue {
    pub key: String,
    pub value: String,
}

impl FieldDescription {
    fn param(&self, key: &str) -> VectorResult<Option<usize>> {
        self.params
            .iter()
            .find(|p| p.key == key)
            .map(|p| {
                p.value.parse().map_err(|_| {
                    VectorError::invalid_schema(format!(
                        "field '{}' has non-numeric {key} '{}'",
                        self.name, p.value
                    ))
                })
            })
            .transpose()
    }
}

impl TryFrom<CollectionDescription> for CollectionSchema {
    type Error = VectorError;

    fn try_from(description: CollectionDescription) -> VectorResult<Self> {
        let fields = description
            .fields
            .into_iter()
            .map(|field| {
                let data_type: DataType = field.data_type.parse().map_err(|_| {
                    VectorError::invalid_schema(format!(
                        "field '{}' has unsupported type '{}'",
                        field.name, field.data_type
                    ))
                })?;
                let max_length = field.param("max_length")?;
                let dim = field.param("dim")?;
                Ok(FieldSchema {
                    name: field.name,
                    data_type,
                    description: field.description,
                    is_primary: field.primary_key,
                    max_length,
                    dim,
                })
            })
            .collect::<VectorResult<Vec<_>>>()?;

        Ok(Self {
            description: description.description,
            fields,
            auto_id: description.auto_id,
            enable_dynamic_field: description.enable_dynamic_field,
        })
    }
}
