// Flow layer: the sequential authenticate -> config -> upload -> extract
// orchestration. Each step logs server-side failures to stdout and
// returns a falsy value so the caller can abort the rest of the flow;
// transport errors propagate as `anyhow::Error`.

use crate::api::{AuthInfo, ExtractResponse, RemoteService, UploadResponse};
use crate::cache::{read_json_file, write_json_file, CacheStore};
use anyhow::Result;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Cache key for the upload step; the file backend turns this into
/// `<prefix>_upload_document.json`.
pub const UPLOAD_KEY: &str = "upload_document";
/// Cache key for the extraction step.
pub const EXTRACT_KEY: &str = "extract_information";
/// Credentials file, unprefixed: one set of credentials serves every run.
pub const AUTH_FILE: &str = "authentication.json";

/// Everything the flow needs from the command line.
pub struct FlowArgs {
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub config_file: Option<PathBuf>,
    pub document_path: Option<PathBuf>,
    pub overwrite: String,
    pub extract_information: bool,
    pub index_name: Option<String>,
    pub query: Option<String>,
}

/// Spinner shown while a blocking remote call is in flight.
fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Authenticate against the remote service. On success returns the token
/// and, if `store_info` is set, persists the credentials verbatim to
/// `auth_file`; on a failed response logs the message and returns `None`.
pub fn authenticate<R: RemoteService>(
    remote: &R,
    info: &AuthInfo,
    store_info: bool,
    auth_file: &Path,
) -> Result<Option<String>> {
    let resp = remote.authenticate(info)?;
    if !resp.success {
        println!("Authentication error: {}", resp.message);
        return Ok(None);
    }
    let token = match resp.token {
        Some(token) => token,
        None => {
            println!("Authentication error: server reported success but returned no token");
            return Ok(None);
        }
    };
    println!("Authentication successful");
    if store_info {
        write_json_file(auth_file, &serde_json::to_value(info)?)?;
        println!("Authentication information is stored in {}", auth_file.display());
    }
    Ok(Some(token))
}

/// Upload a document for indexing, short-circuited by the cache.
///
/// Returns `None` when the document path does not exist (no network call
/// is made), `Some(false)` on a failed server response, and the `indexed`
/// flag otherwise. A cache hit returns the cached flag without touching
/// the network.
pub fn upload_document<R: RemoteService, C: CacheStore>(
    remote: &R,
    cache: &C,
    token: &str,
    document_path: &Path,
    index_name: &str,
    overwrite: &str,
) -> Result<Option<bool>> {
    if !document_path.exists() {
        println!("Document doesn't exist - {}", document_path.display());
        return Ok(None);
    }
    if let Some(cached) = cache.load(UPLOAD_KEY)? {
        let resp: UploadResponse = serde_json::from_value(cached)?;
        println!("Returning from cache {}", cache.describe(UPLOAD_KEY));
        return Ok(Some(resp.indexed));
    }

    let pb = spinner("Indexing the document ...");
    let time_start = Instant::now();
    let result = remote.upload_document(token, document_path, index_name, overwrite);
    // Clear the spinner before a transport error prints.
    pb.finish_and_clear();
    let resp = result?;

    if !resp.success {
        println!("Upload document error: {}", resp.message);
        return Ok(Some(false));
    }
    println!(
        "The document is indexed successfully from path: {}",
        document_path.display()
    );
    cache.store(UPLOAD_KEY, &serde_json::to_value(&resp)?)?;
    println!("The response is stored in {}", cache.describe(UPLOAD_KEY));
    println!(
        "Indexing document time: {:.2} secs",
        time_start.elapsed().as_secs_f64()
    );
    println!(
        "A Boolean flag indicating whether the document is indexed is: {}",
        resp.indexed
    );
    println!("Likely next steps:");
    println!(
        "    docquery-cli --extract_information --index_name {} --query \"...\"",
        index_name
    );
    Ok(Some(resp.indexed))
}

/// Extract an answer for `query` from the named index, short-circuited by
/// the cache. On a failed server response logs the message, writes no
/// cache entry and returns `None`; otherwise returns the answer together
/// with the full response.
pub fn extract_information<R: RemoteService, C: CacheStore>(
    remote: &R,
    cache: &C,
    token: &str,
    query: &str,
    index_name: &str,
) -> Result<Option<(Option<String>, ExtractResponse)>> {
    if let Some(cached) = cache.load(EXTRACT_KEY)? {
        let resp: ExtractResponse = serde_json::from_value(cached)?;
        println!("Returning from cache {}", cache.describe(EXTRACT_KEY));
        return Ok(Some((resp.answer.clone(), resp)));
    }

    let pb = spinner("Extracting information ...");
    let time_start = Instant::now();
    let result = remote.extract_information(token, query, index_name);
    pb.finish_and_clear();
    let resp = result?;

    if !resp.success {
        println!("Information extraction error: {}", resp.message);
        return Ok(None);
    }
    println!("Information extracted successfully");
    cache.store(EXTRACT_KEY, &serde_json::to_value(&resp)?)?;
    println!("The response is stored in {}", cache.describe(EXTRACT_KEY));
    println!(
        "Information extracting time: {:.2} secs",
        time_start.elapsed().as_secs_f64()
    );
    if let Some(answer) = &resp.answer {
        println!("The answer retrieved for the provided query is: {}", answer);
    }
    Ok(Some((resp.answer.clone(), resp)))
}

/// Resolve credentials: inline flags win and are persisted after a
/// successful authentication; otherwise fall back to the stored auth
/// file; failing that, prompt interactively.
fn resolve_credentials(args: &FlowArgs, auth_file: &Path) -> Result<(AuthInfo, bool)> {
    if let (Some(username), Some(api_key)) = (&args.username, &args.api_key) {
        return Ok((
            AuthInfo {
                username: username.clone(),
                api_key: Some(api_key.clone()),
                password: None,
            },
            true,
        ));
    }
    if auth_file.exists() {
        let info: AuthInfo = serde_json::from_value(read_json_file(auth_file)?)?;
        return Ok((info, false));
    }
    println!("Please authenticate to proceed");
    let username: String = Input::new().with_prompt("Username").interact_text()?;
    let api_key: String = Password::new().with_prompt("API key").interact()?;
    Ok((
        AuthInfo {
            username,
            api_key: Some(api_key),
            password: None,
        },
        true,
    ))
}

/// Run the full flow: authenticate, optionally upload a config file, then
/// the document upload and extraction steps as requested by the flags.
/// Any falsy step result aborts the remainder.
pub fn run_flow<R: RemoteService, C: CacheStore>(
    remote: &R,
    cache: &C,
    args: &FlowArgs,
    auth_file: &Path,
) -> Result<()> {
    let (info, store_info) = resolve_credentials(args, auth_file)?;
    let token = match authenticate(remote, &info, store_info, auth_file)? {
        Some(token) => token,
        None => return Ok(()),
    };

    if let Some(config_file) = &args.config_file {
        println!("Uploading the configuration file ...");
        let resp = remote.upload_config(&token, config_file)?;
        if !resp.success {
            println!("Configuration file upload error: {}", resp.message);
            return Ok(());
        }
        println!("Configuration file is uploaded successfully");
    }

    if let Some(document_path) = &args.document_path {
        let index_name = match &args.index_name {
            Some(name) => name,
            None => {
                println!("Please provide the index name");
                return Ok(());
            }
        };
        let indexed = upload_document(
            remote,
            cache,
            &token,
            document_path,
            index_name,
            &args.overwrite,
        )?;
        if indexed != Some(true) {
            return Ok(());
        }
    }

    if args.extract_information {
        let query = match &args.query {
            Some(query) => query,
            None => {
                println!("Please provide the query to be asked in double quotes");
                return Ok(());
            }
        };
        let index_name = match &args.index_name {
            Some(name) => name,
            None => {
                println!("Please provide the index_name that was mentioned while uploading the document");
                return Ok(());
            }
        };
        extract_information(remote, cache, &token, query, index_name)?;
    }
    Ok(())
}
