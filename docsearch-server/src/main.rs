use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use docsearch_rag::{Reference, SearchRequest, SearchService, full_version_label, load_corpus};
use docsearch_server::{AppState, Cli, Command, SearchArgs, init_tracing, run_server};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.config.log_json);

    let service = Arc::new(cli.config.build_service()?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            populate(&service, &cli.config.corpus).await;
            run_server(cli.config.bind, AppState::new(service)).await
        }
        Command::Search(args) => search(&service, args).await,
    }
}

/// Load the corpus into an empty collection. Failures are logged and the
/// server starts anyway.
async fn populate(service: &SearchService, corpus: &Path) {
    let documents = match load_corpus(corpus).await {
        Ok(documents) => documents,
        Err(e) => {
            warn!(error = %e, "corpus unavailable, serving whatever the store holds");
            Vec::new()
        }
    };

    if let Err(e) = service.ingest_if_empty(&documents).await {
        error!(error = %e, "startup ingestion failed");
    }
}

async fn search(service: &SearchService, args: SearchArgs) -> anyhow::Result<()> {
    let request = SearchRequest::new(args.query)
        .with_version(full_version_label(&args.doc_version))
        .with_n_results(args.n_results)
        .with_include_resources(!args.no_resources);

    let (summary, references) = if args.enhance {
        let response = service.enhanced_search(&request).await?;
        println!("Enhanced query: {}\n", response.enhanced_query);
        (response.summary, response.references)
    } else {
        let response = service.summarize(&request).await?;
        (response.summary, response.references)
    };

    println!("{summary}");
    print_references(&references);
    Ok(())
}

fn print_references(references: &[Reference]) {
    if references.is_empty() {
        return;
    }
    println!("\nSources:");
    for reference in references {
        println!("[{}] {} {}", reference.number, reference.title, reference.url);
    }
}
