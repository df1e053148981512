//! Milvus backend over the RESTful API v2.
//!
//! Requests go to `http://{host}:{port}/v2/vectordb/...` on the same port
//! as the gRPC endpoint. The bearer token is either `user:password` or an
//! API key.

mod client;
mod wire;

pub use client::{MilvusConnector, MilvusRestBackend};
