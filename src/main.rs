//! docfs - drive the filesystem document repository from the command line.

use bytes::Bytes;
use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use docfs_config::{Parameters, keys};
use docfs_storage::metadata::encode_all;
use docfs_storage::repository::ContentStream;
use docfs_storage::{CachingFileSystemReader, DocumentCache, FileSystemReader, FileSystemWriter};
use docfs_storage::{RepositoryReader, RepositoryWriter};
use exn::ResultExt;
use futures::TryStreamExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Display, Error)]
enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("repository operation failed")]
    Repository,
    #[display("could not write output")]
    Output,
}
type Result<T> = std::result::Result<T, exn::Exn<ErrorKind>>;

#[derive(Parser, Debug)]
#[command(name = "docfs")]
#[command(about = "Expose a local directory as a document repository")]
#[command(version)]
struct Args {
    /// Configuration file (TOML, YAML or JSON); defaults to the user config directory
    #[arg(short, long, env = "DOCFS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List documents as JSON lines
    List {
        /// Directory (or single file) to enumerate
        #[arg(long)]
        source: Option<PathBuf>,
        /// Only documents modified at or after this epoch millisecond
        #[arg(long)]
        start: Option<i64>,
        /// Only documents modified at or before this epoch millisecond
        #[arg(long)]
        end: Option<i64>,
        /// Also fetch each document's metadata, through the enumeration cache
        #[arg(long)]
        with_metadata: bool,
    },
    /// Print a document's metadata as JSON
    Metadata {
        /// Document id (its path)
        id: String,
    },
    /// Copy a document's content to stdout
    Binary {
        /// Document id (its path)
        id: String,
    },
    /// Delete a document
    Delete {
        /// Document id (its path)
        id: String,
        #[arg(long)]
        all_versions: bool,
    },
    /// Write a local file into an output directory, with a metadata sidecar
    Put {
        /// File to copy
        file: PathBuf,
        /// Output root
        #[arg(long)]
        output: Option<PathBuf>,
        /// Parent path to place the file under, inside the output root
        #[arg(long, default_value = "")]
        parent: String,
        /// Write the sidecar as `key=value` properties instead of XML
        #[arg(long)]
        properties: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<()> {
    let mut params = docfs_config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    tracing::debug!(?params, "Loaded parameters");

    match args.command {
        Commands::List { source, start, end, with_metadata } => {
            if let Some(source) = source {
                params.insert(keys::FILE_PATH, source.to_string_lossy().into_owned());
            }
            if let Some(start) = start {
                params.insert(keys::START_TIME, start);
            }
            if let Some(end) = end {
                params.insert(keys::END_TIME, end);
            }
            list(&params, with_metadata).await
        },
        Commands::Metadata { id } => {
            let reader = FileSystemReader::new();
            let metadata = reader.document_metadata(&id, &params).await.or_raise(|| ErrorKind::Repository)?;
            println!("{}", serde_json::to_string_pretty(&encode_all(&metadata)).or_raise(|| ErrorKind::Output)?);
            Ok(())
        },
        Commands::Binary { id } => {
            let reader = FileSystemReader::new();
            let mut details = reader.document_binary(&id, &params).await.or_raise(|| ErrorKind::Repository)?;
            let mut stdout = tokio::io::stdout();
            let bytes = tokio::io::copy(&mut details.content, &mut stdout).await.or_raise(|| ErrorKind::Output)?;
            tracing::debug!(id = %id, bytes, mime_type = %details.mime_type, "Copied document content");
            Ok(())
        },
        Commands::Delete { id, all_versions } => {
            params.insert(keys::ALL_VERSIONS, all_versions);
            FileSystemReader::new().delete_document(&id, &params).await.or_raise(|| ErrorKind::Repository)
        },
        Commands::Put { file, output, parent, properties } => {
            if let Some(output) = output {
                params.insert(keys::FILE_PATH, output.to_string_lossy().into_owned());
            }
            if properties {
                params.insert(keys::METADATA_AS_XML, false);
            }
            put(file, parent, &params).await
        },
    }
}

async fn list(params: &Parameters, with_metadata: bool) -> Result<()> {
    let reader = CachingFileSystemReader::new(Arc::new(DocumentCache::new()));
    let mut documents = reader.documents(params);
    while let Some(document) = documents.try_next().await.or_raise(|| ErrorKind::Repository)? {
        let mut line = serde_json::to_value(&document).or_raise(|| ErrorKind::Output)?;
        if with_metadata {
            let metadata = reader.document_metadata(&document.id, params).await.or_raise(|| ErrorKind::Repository)?;
            line["metadata"] = serde_json::to_value(encode_all(&metadata)).or_raise(|| ErrorKind::Output)?;
        }
        println!("{line}");
    }
    Ok(())
}

async fn put(file: PathBuf, parent: String, params: &Parameters) -> Result<()> {
    let id = file.to_string_lossy().into_owned();
    // Describe the source file with an unfiltered reader of its own.
    let source_params = Parameters::default().with(keys::FILE_PATH, id.clone());
    let reader = FileSystemReader::new();
    let Some(document) = reader.document(&id, &source_params).await.or_raise(|| ErrorKind::Repository)? else {
        return Ok(());
    };
    let metadata = reader.document_metadata(&id, &source_params).await.or_raise(|| ErrorKind::Repository)?;
    let handle = tokio::fs::File::open(&file).await.or_raise(|| ErrorKind::Repository)?;
    let content: ContentStream<'_, Bytes> = Box::pin(ReaderStream::new(handle));

    let document = docfs_storage::Document { parent_path: parent, ..document };
    let written = FileSystemWriter::new()
        .write_document(document, metadata, content, params)
        .await
        .or_raise(|| ErrorKind::Repository)?;
    println!("{}", serde_json::to_string(&written).or_raise(|| ErrorKind::Output)?);
    Ok(())
}
