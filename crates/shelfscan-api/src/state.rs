//! Application state.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use shelfscan_store::{DatabaseConfig, PgProductStore, ProductStore};
use shelfscan_vision::{ClassifierConfig, OnnxClassifier, PreprocessConfig, Preprocessor, Recognizer};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub recognizer: Arc<Recognizer>,
    pub products: Arc<dyn ProductStore>,
}

impl AppState {
    pub fn new(config: ApiConfig, recognizer: Recognizer, products: Arc<dyn ProductStore>) -> Self {
        Self {
            config,
            recognizer: Arc::new(recognizer),
            products,
        }
    }

    /// Load the model and configure the database pool from the environment.
    ///
    /// Fails on missing configuration or an unloadable model. The database
    /// itself is not contacted.
    pub fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let db_config = DatabaseConfig::from_env().context("Invalid database configuration")?;
        let products = PgProductStore::connect_lazy(&db_config)
            .context("Failed to configure product store")?;

        let preprocess_config =
            PreprocessConfig::from_env().context("Invalid preprocessing configuration")?;
        let classifier_config =
            ClassifierConfig::from_env().context("Invalid classifier configuration")?;
        info!(
            model = %classifier_config.model_path,
            width = preprocess_config.width,
            height = preprocess_config.height,
            "Loading classifier"
        );

        let preprocessor =
            Preprocessor::new(preprocess_config).context("Invalid preprocessing configuration")?;
        let classifier = OnnxClassifier::load(classifier_config).context("Failed to load classifier")?;
        let recognizer = Recognizer::new(preprocessor, Arc::new(classifier));

        Ok(Self::new(config, recognizer, Arc::new(products)))
    }
}
