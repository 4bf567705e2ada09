pub mod admin;
pub mod chat;
pub mod fallback;
pub mod rerank;
pub mod retrieve;
pub mod store;
pub mod vector;

mod error;

pub use admin::{CreateFragmentRequest, ReindexReport, UpdateFragmentRequest};
pub use chat::{AnswerMode, ChatRequest, ChatResponse, ChatSource};
pub use error::{Error, Result};
pub use retrieve::{DegradeReason, RetrieveOptions, SearchOutcome};
pub use store::{FragmentStore, VectorIndex};

use std::{future::Future, pin::Pin, sync::Arc};

use folio_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use folio_providers::{
	embedding,
	llm::{self, ChatMessage},
};
use folio_storage::{db::Db, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, folio_providers::Result<Vec<Vec<f32>>>>;
}

pub trait ChatProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, folio_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub chat: Arc<dyn ChatProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, chat: Arc<dyn ChatProvider>) -> Self {
		Self { embedding, chat }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), chat: provider }
	}
}

/// The retrieval core with every collaborator passed in at construction.
pub struct FolioService {
	pub cfg: Config,
	pub store: Arc<dyn FragmentStore>,
	/// `None` when no vector index is configured; vector search then reports the index as
	/// unavailable and retrieval runs on the lexical fallback.
	pub index: Option<Arc<dyn VectorIndex>>,
	pub providers: Providers,
}
impl FolioService {
	pub fn new(cfg: Config, db: Db, qdrant: Option<QdrantStore>) -> Self {
		let index = qdrant.map(|store| Arc::new(store) as Arc<dyn VectorIndex>);

		Self { cfg, store: Arc::new(db), index, providers: Providers::default() }
	}

	pub fn with_parts(
		cfg: Config,
		store: Arc<dyn FragmentStore>,
		index: Option<Arc<dyn VectorIndex>>,
		providers: Providers,
	) -> Self {
		Self { cfg, store, index, providers }
	}

	pub(crate) fn embedding_dim(&self) -> usize {
		self.cfg.providers.embedding.dimensions as usize
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, folio_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
impl ChatProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, folio_providers::Result<String>> {
		Box::pin(llm::complete(cfg, messages))
	}
}
