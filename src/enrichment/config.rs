//! # Enrichment Configuration Module
//!
//! Settings for the two enrichment jobs: the embedding dimensionality the
//! store was created with, and the generation parameters of the summary
//! prompt.
//!
//! ## Key Components
//!
//! - `EnrichmentConfig`: Embedding and summary parameters
//! - `EnrichmentConfigBuilder`: Builder pattern implementation for easier configuration

/// Dimensionality of the reference embedding model
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

/// Configuration for the enrichment jobs
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Dimensions of the embedding vectors; must match the store
    pub embedding_dimensions: usize,

    /// Upper bound on generated summary tokens
    pub summary_max_tokens: u64,

    /// Sampling temperature for summaries
    pub summary_temperature: f64,

    /// System preamble for the summary model
    pub summary_preamble: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            summary_max_tokens: 80,
            summary_temperature: 0.8,
            summary_preamble: "You are a creative book marketer.".to_string(),
        }
    }
}

/// Builder for EnrichmentConfig
#[derive(Debug, Default)]
pub struct EnrichmentConfigBuilder {
    config: EnrichmentConfig,
}

impl EnrichmentConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EnrichmentConfig::default(),
        }
    }

    /// Set the embedding dimensions
    pub fn embedding_dimensions(mut self, embedding_dimensions: usize) -> Self {
        self.config.embedding_dimensions = embedding_dimensions;
        self
    }

    /// Set the summary token limit
    pub fn summary_max_tokens(mut self, summary_max_tokens: u64) -> Self {
        self.config.summary_max_tokens = summary_max_tokens;
        self
    }

    /// Set the summary temperature
    pub fn summary_temperature(mut self, summary_temperature: f64) -> Self {
        self.config.summary_temperature = summary_temperature;
        self
    }

    /// Set the summary preamble
    pub fn summary_preamble(mut self, summary_preamble: impl Into<String>) -> Self {
        self.config.summary_preamble = summary_preamble.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> EnrichmentConfig {
        self.config
    }
}

impl EnrichmentConfig {
    /// Create a new builder
    pub fn builder() -> EnrichmentConfigBuilder {
        EnrichmentConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnrichmentConfig::default();
        assert_eq!(config.embedding_dimensions, 384);
        assert_eq!(config.summary_max_tokens, 80);
        assert_eq!(config.summary_temperature, 0.8);
    }

    #[test]
    fn test_builder() {
        let config = EnrichmentConfig::builder()
            .embedding_dimensions(8)
            .summary_max_tokens(40)
            .summary_preamble("Be brief.")
            .build();
        assert_eq!(config.embedding_dimensions, 8);
        assert_eq!(config.summary_max_tokens, 40);
        assert_eq!(config.summary_preamble, "Be brief.");
    }
}
