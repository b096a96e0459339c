//! Summary job

use rig::completion::CompletionModel;
use rig::embeddings::EmbeddingModel;
use rig::message::AssistantContent;
use tracing::{debug, instrument};

use super::{EnrichError, Enricher, EnrichmentConfig};
use crate::catalog::{DerivedField, DerivedValue, PendingItem};
use crate::model::Client;

/// User prompt asking for a short marketing blurb
pub fn summary_prompt(name: &str, description: Option<&str>) -> String {
    format!(
        "Write a catchy marketing summary (≤ 40 words) for this book:\nTitle: {}\nDescription: {}",
        name,
        description.unwrap_or_default()
    )
}

/// Generates item summaries with the client's completion model
pub struct SummaryEnricher<'a, C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    client: &'a Client<C, E>,
    config: &'a EnrichmentConfig,
}

impl<'a, C, E> SummaryEnricher<'a, C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    pub fn new(client: &'a Client<C, E>, config: &'a EnrichmentConfig) -> Self {
        Self { client, config }
    }
}

impl<C, E> Enricher for SummaryEnricher<'_, C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    const FIELD: DerivedField = DerivedField::Summary;

    #[instrument(skip(self, item), fields(item_id = item.item_id))]
    async fn compute(&self, item: &PendingItem) -> Result<DerivedValue, EnrichError> {
        let prompt = summary_prompt(&item.name, item.description.as_deref());
        let response = self
            .client
            .completion()
            .completion_request(prompt)
            .preamble(self.config.summary_preamble.clone())
            .max_tokens(self.config.summary_max_tokens)
            .temperature(self.config.summary_temperature)
            .send()
            .await?;

        let summary = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect::<Vec<&str>>()
            .join("\n")
            .trim()
            .to_string();

        if summary.is_empty() {
            return Err(EnrichError::EmptyOutput(item.item_id));
        }

        debug!("Summarized item {}", item.item_id);
        Ok(DerivedValue::Summary(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock_model::{MockCompletionModel, MockEmbeddingModel};

    #[test]
    fn test_summary_prompt() {
        assert_eq!(
            summary_prompt("Dune", Some("Spice")),
            "Write a catchy marketing summary (≤ 40 words) for this book:\nTitle: Dune\nDescription: Spice"
        );
        assert!(summary_prompt("Dune", None).ends_with("Description: "));
    }

    #[tokio::test]
    async fn test_compute_trims_output() {
        let completion = MockCompletionModel::new();
        completion.set_text_response("\n Epic desert saga. \n").await;
        let client = Client::with_models(completion, MockEmbeddingModel::new(2));
        let config = EnrichmentConfig::default();

        let item = PendingItem {
            item_id: 9,
            name: "Dune".to_string(),
            description: None,
            category: None,
            satellite_id: Some(1),
        };
        let value = SummaryEnricher::new(&client, &config)
            .compute(&item)
            .await
            .unwrap();

        assert_eq!(value, DerivedValue::Summary("Epic desert saga.".to_string()));
        assert_eq!(client.completion().calls(), 1);
    }
}
