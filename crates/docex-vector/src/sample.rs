//! Placeholder rows for an empty collection.
//!
//! Embeddings are uniform random noise standing in for a real embedding
//! model. Rows produced here are test fixtures and carry no meaning for
//! similarity search.

use rand::Rng;
use uuid::Uuid;

use crate::chunk::DocumentChunk;

/// Categories the sample rows rotate through.
pub const SAMPLE_CATEGORIES: [&str; 5] = [
    "installation",
    "troubleshooting",
    "billing",
    "features",
    "api",
];

/// File names the sample rows rotate through.
pub const SAMPLE_FILE_NAMES: [&str; 5] = [
    "getting-started.md",
    "troubleshooting-guide.md",
    "billing-faq.md",
    "feature-overview.md",
    "api-reference.md",
];

/// Synthesizes `count` rows with random `dimension`-long embeddings.
pub fn sample_chunks(count: usize, dimension: usize) -> Vec<DocumentChunk> {
    sample_chunks_with_rng(&mut rand::rng(), count, dimension)
}

/// Like [`sample_chunks`], drawing embeddings from `rng`.
pub fn sample_chunks_with_rng<R: Rng>(
    rng: &mut R,
    count: usize,
    dimension: usize,
) -> Vec<DocumentChunk> {
    (0..count)
        .map(|i| {
            let file_name = SAMPLE_FILE_NAMES[i % SAMPLE_FILE_NAMES.len()];
            let category = SAMPLE_CATEGORIES[i % SAMPLE_CATEGORIES.len()];
            DocumentChunk {
                id: Uuid::new_v4().to_string(),
                embedding: (0..dimension).map(|_| rng.random::<f32>()).collect(),
                file_path: format!("/docs/support/{file_name}"),
                file_name: file_name.to_owned(),
                chunk_index: i as i64,
                category: category.to_owned(),
                text: format!(
                    "This is sample chunk {} from {file_name}. Category: {category}. \
                     In a real scenario, this would contain actual document content.",
                    i + 1
                ),
            }
        })
        .collect()
}
