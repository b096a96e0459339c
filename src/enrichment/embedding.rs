//! Embedding job

use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use tracing::{debug, instrument};

use super::{EnrichError, Enricher};
use crate::catalog::{DerivedField, DerivedValue, PendingItem};
use crate::model::Client;

/// Text embedded for an item: name, description and category
pub fn embedding_text(item: &PendingItem) -> String {
    format!(
        "{} | {} | {}",
        item.name,
        item.description.as_deref().unwrap_or_default(),
        item.category.as_deref().unwrap_or_default()
    )
}

/// Computes item embeddings with the client's embedding model
pub struct EmbeddingEnricher<'a, C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    client: &'a Client<C, E>,
    dimensions: usize,
}

impl<'a, C, E> EmbeddingEnricher<'a, C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    /// `dimensions` must equal the store's embedding length
    pub fn new(client: &'a Client<C, E>, dimensions: usize) -> Self {
        Self { client, dimensions }
    }
}

impl<C, E> Enricher for EmbeddingEnricher<'_, C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    const FIELD: DerivedField = DerivedField::Embedding;

    #[instrument(skip(self, item), fields(item_id = item.item_id))]
    async fn compute(&self, item: &PendingItem) -> Result<DerivedValue, EnrichError> {
        let embedding = self
            .client
            .embedding()
            .embed_texts(vec![embedding_text(item)])
            .await?
            .into_iter()
            .next()
            .ok_or(EnrichError::EmptyOutput(item.item_id))?;

        // Models return f64; the store holds f32
        let vector: Vec<f32> = embedding.vec.iter().map(|v| *v as f32).collect();
        if vector.len() != self.dimensions {
            return Err(EnrichError::DimensionMismatch {
                item_id: item.item_id,
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        debug!("Embedded item {}", item.item_id);
        Ok(DerivedValue::Embedding(vector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock_model::{MockCompletionModel, MockEmbeddingModel};

    fn pending(description: Option<&str>, category: Option<&str>) -> PendingItem {
        PendingItem {
            item_id: 1,
            name: "Dune".to_string(),
            description: description.map(str::to_string),
            category: category.map(str::to_string),
            satellite_id: None,
        }
    }

    #[test]
    fn test_embedding_text() {
        assert_eq!(
            embedding_text(&pending(Some("Spice"), Some("Sci-Fi"))),
            "Dune | Spice | Sci-Fi"
        );
        assert_eq!(embedding_text(&pending(None, None)), "Dune |  | ");
    }

    #[tokio::test]
    async fn test_compute_is_deterministic() {
        let mock = MockEmbeddingModel::new(3);
        let client = Client::with_models(MockCompletionModel::new(), mock.clone());
        let job = EmbeddingEnricher::new(&client, 3);
        let item = pending(Some("Spice"), Some("Sci-Fi"));

        let first = job.compute(&item).await.unwrap();
        let second = job.compute(&item).await.unwrap();
        assert_eq!(first, second);

        let expected: Vec<f32> = mock
            .vector_for(&embedding_text(&item))
            .into_iter()
            .map(|v| v as f32)
            .collect();
        assert_eq!(first, DerivedValue::Embedding(expected));
    }
}
