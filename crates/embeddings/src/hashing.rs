use akasha_core::Result;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Offline embeddings provider based on feature hashing.
///
/// Words (or single chars for non-ASCII scripts) are hashed into a fixed
/// number of buckets and the counts are L2-normalised, so texts sharing
/// vocabulary get a high cosine similarity. Used for development and tests
/// when no embedding API is available.
pub struct HashingEmbeddingProvider {
    embedding_dim: usize,
}

impl HashingEmbeddingProvider {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    pub fn with_standard_dimension() -> Self {
        Self::new(256)
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.embedding_dim];
        if self.embedding_dim == 0 {
            return embedding;
        }

        for token in tokens(text) {
            let bucket = (fnv1a(&token) % self.embedding_dim as u64) as usize;
            embedding[bucket] += 1.0;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        embedding
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_dim
    }
}

fn tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if word.is_ascii() {
            tokens.push(word.to_ascii_lowercase());
        } else {
            tokens.extend(word.chars().map(|c| c.to_lowercase().collect::<String>()));
        }
    }
    tokens
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
