//! HTTP API and command line for versioned documentation search.
//!
//! Serves a [`SearchService`](docsearch_rag::SearchService) over axum:
//!
//! | route | operation |
//! |-------|-----------|
//! | `POST /query` | filtered search |
//! | `POST /rawquery-cli` | search and cited answer |
//! | `POST /enhance-query-cli` | rewritten search and cited answer |
//! | `GET /versions` | known and stored version labels |
//! | `GET /chromadb-stats` | collection statistics |
//! | `GET /inspect` | sampled records |
//! | `POST /test` | raw query embedding |
//! | `POST /testgeminiflash` | raw completion |

pub mod config;
pub mod error;
pub mod server;
pub mod telemetry;

pub use config::{Cli, Command, SearchArgs, ServerConfig, StoreKind};
pub use error::{ApiError, ApiResult};
pub use server::{AppState, app_router, run_server};
pub use telemetry::init_tracing;
