//! Wiring of the runtime components from configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use pagemind_config::{Config, ConfigLoader, StoreConfig};
use pagemind_model_openai_compat::OpenAiCompatModel;
use pagemind_protocols::{KeyValueStore, LanguageModel, Response};
use pagemind_runtime::chat::CHAT_CHUNK_BUDGET;
use pagemind_runtime::{
    ChatHistory, Dispatcher, ExtensionState, FileStore, ModelSessionPool, PipelineSettings,
    Pipelines, RetryPolicy, RetryingInvoker, StoreSweeper,
};

/// Runtime components shared by the commands.
pub(crate) struct App {
    pub state: Arc<ExtensionState>,
    pub pipelines: Arc<Pipelines>,
    pub store: Option<Arc<dyn KeyValueStore>>,
    store_config: StoreConfig,
}

impl App {
    pub fn build(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let model: Arc<dyn LanguageModel> = Arc::new(OpenAiCompatModel::new(&config.model)?);
        Ok(Self::with_model(model, config))
    }

    pub fn with_model(model: Arc<dyn LanguageModel>, config: &Config) -> Self {
        let pool = Arc::new(ModelSessionPool::new(model.clone()));
        let invoker = Arc::new(RetryingInvoker::new(model, RetryPolicy::from(&config.retry)));
        let state = Arc::new(ExtensionState::new(
            pool.clone(),
            invoker.clone(),
            CHAT_CHUNK_BUDGET,
        ));
        let pipelines = Arc::new(Pipelines::new(
            pool,
            invoker,
            PipelineSettings::from(&config.chunking),
        ));

        let store = config.store.enabled.then(|| {
            let path = store_path(&config.store);
            info!("Using store at {}", path.display());
            Arc::new(FileStore::new(path)) as Arc<dyn KeyValueStore>
        });

        Self {
            state,
            pipelines,
            store,
            store_config: config.store.clone(),
        }
    }

    pub fn dispatcher(&self, progress: UnboundedSender<Response>) -> Dispatcher {
        let dispatcher =
            Dispatcher::new(self.state.clone(), self.pipelines.clone()).with_progress(progress);
        match &self.store {
            Some(store) => dispatcher.with_history(Arc::new(ChatHistory::new(
                store.clone(),
                Duration::from_secs(self.store_config.ttl_hours * 60 * 60),
            ))),
            None => dispatcher,
        }
    }

    pub fn sweeper(&self) -> Option<StoreSweeper> {
        self.store
            .as_ref()
            .map(|store| StoreSweeper::from_config(store.clone(), &self.store_config))
    }
}

fn store_path(config: &StoreConfig) -> PathBuf {
    PathBuf::from(ConfigLoader::expand_path(&config.path.to_string_lossy()))
}
