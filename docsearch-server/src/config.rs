//! Process configuration from command-line flags and environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use docsearch_rag::chroma::{DEFAULT_DATABASE, DEFAULT_TENANT};
use docsearch_rag::config::DEFAULT_COLLECTION;
use docsearch_rag::{
    ChromaVectorStore, GeminiClient, InMemoryVectorStore, RagConfig, SearchService, VectorStore,
};

/// Which vector store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// A Chroma server reached over HTTP.
    Chroma,
    /// An in-process store; contents are lost on exit.
    Memory,
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Gemini API key used for embeddings and generation.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,

    #[arg(long, env = "CHROMA_SERVER_HOST", default_value = "localhost")]
    pub chroma_host: String,

    #[arg(long, env = "CHROMA_SERVER_PORT", default_value_t = 8000)]
    pub chroma_port: u16,

    #[arg(long, env = "CHROMA_TENANT", default_value = DEFAULT_TENANT)]
    pub chroma_tenant: String,

    #[arg(long, env = "CHROMA_DATABASE", default_value = DEFAULT_DATABASE)]
    pub chroma_database: String,

    #[arg(long, env = "DOCSEARCH_STORE", value_enum, default_value_t = StoreKind::Chroma)]
    pub store: StoreKind,

    #[arg(long, env = "DOCSEARCH_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Scraped corpus loaded into an empty collection at startup.
    #[arg(long, env = "DOCSEARCH_CORPUS", default_value = "vitess_docs.yaml")]
    pub corpus: PathBuf,

    #[arg(long, env = "DOCSEARCH_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Emit logs as JSON lines.
    #[arg(long, env = "DOCSEARCH_LOG_JSON")]
    pub log_json: bool,
}

impl ServerConfig {
    fn vector_store(&self) -> anyhow::Result<Arc<dyn VectorStore>> {
        Ok(match self.store {
            StoreKind::Chroma => Arc::new(
                ChromaVectorStore::from_host(&self.chroma_host, self.chroma_port)
                    .context("invalid Chroma address")?
                    .with_tenant(&self.chroma_tenant)
                    .with_database(&self.chroma_database),
            ),
            StoreKind::Memory => Arc::new(InMemoryVectorStore::new()),
        })
    }

    /// Assemble the search service from this configuration.
    pub fn build_service(&self) -> anyhow::Result<SearchService> {
        let gemini =
            Arc::new(GeminiClient::new(&self.gemini_api_key).context("invalid Gemini settings")?);
        let config = RagConfig::builder().collection(&self.collection).build()?;

        Ok(SearchService::builder()
            .config(config)
            .embedding_provider(gemini.clone())
            .generator(gemini)
            .vector_store(self.vector_store()?)
            .build()?)
    }
}

/// Arguments of a one-off search from the command line.
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// The question to search for.
    pub query: String,

    /// Documentation version; short forms like `v21.0` are expanded.
    #[arg(long, short = 'v', default_value = docsearch_rag::DEFAULT_VERSION)]
    pub doc_version: String,

    #[arg(long, short = 'n', default_value_t = docsearch_rag::planner::DEFAULT_N_RESULTS)]
    pub n_results: usize,

    /// Leave common-resource pages out of the results.
    #[arg(long)]
    pub no_resources: bool,

    /// Rewrite the query with the language model before searching.
    #[arg(long)]
    pub enhance: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load the corpus if needed and serve the HTTP API (the default).
    Serve,
    /// Answer one question and print the result.
    Search(SearchArgs),
}

/// Versioned documentation search.
#[derive(Debug, Clone, Parser)]
#[command(name = "docsearch", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub config: ServerConfig,

    #[command(subcommand)]
    pub command: Option<Command>,
}
