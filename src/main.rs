// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, create an API client and a file
//   cache, then hand everything to the flow.
// - Returns `anyhow::Result` so transport errors print with context.

use clap::Parser;
use docquery_cli::api::ApiClient;
use docquery_cli::cache::FileStore;
use docquery_cli::flow::{run_flow, FlowArgs, AUTH_FILE};
use std::path::{Path, PathBuf};

/// Upload a document to the document-intelligence service and extract
/// information from it with a natural-language query. Each remote call's
/// JSON response is cached to a local `<prefix>_<step>.json` file so
/// re-runs skip steps that already succeeded.
#[derive(Parser)]
#[command(name = "docquery-cli", version)]
struct Cli {
    /// Username for authentication; with --api_key, credentials are
    /// stored for future runs.
    #[arg(long)]
    username: Option<String>,

    /// API key for authentication.
    #[arg(long = "api_key")]
    api_key: Option<String>,

    /// Configuration file to upload before the document.
    #[arg(long = "config_file")]
    config_file: Option<PathBuf>,

    /// Filename prefix namespacing the cache files for this run.
    #[arg(long = "prefix_name", default_value = "docquery")]
    prefix_name: String,

    /// Path of the document to upload for indexing.
    #[arg(long = "document_path")]
    document_path: Option<PathBuf>,

    /// Whether to overwrite embeddings already stored for the document.
    #[arg(long, value_parser = ["yes", "no"], default_value = "no")]
    overwrite: String,

    /// Run the information-extraction step.
    #[arg(long = "extract_information")]
    extract_information: bool,

    /// New or pre-existing index name holding the document.
    #[arg(long = "index_name")]
    index_name: Option<String>,

    /// Query to run against the indexed document.
    #[arg(long)]
    query: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Base URL comes from `DOCQUERY_API_URL` or defaults to localhost.
    let api = ApiClient::from_env()?;
    let cache = FileStore::new(".", &cli.prefix_name);

    let args = FlowArgs {
        username: cli.username,
        api_key: cli.api_key,
        config_file: cli.config_file,
        document_path: cli.document_path,
        overwrite: cli.overwrite,
        extract_information: cli.extract_information,
        index_name: cli.index_name,
        query: cli.query,
    };
    run_flow(&api, &cache, &args, Path::new(AUTH_FILE))?;
    Ok(())
}
