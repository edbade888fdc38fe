//! rag-indexer CLI application
//!
//! Command-line interface for the rag-indexer library.

use clap::{Args, Parser, Subcommand};
use rag_indexer::config::Config;
use rag_indexer::corpus::{gather_chapters, gather_folder, ChapterSelection};
use rag_indexer::qdrant::QdrantClient;
use rag_indexer::{Indexer, IndexerOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rag-indexer")]
#[command(about = "Index an annotated text corpus into Qdrant with resumable checkpoints")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the chapter tree (scenes, media sidecars, repo documents)
    Chapters {
        /// Chapter selection: all, N or N-M
        #[arg(long, default_value = "all")]
        chapter: String,

        /// Corpus root (overrides the configured root)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Skip media-sidecar metadata files
        #[arg(long)]
        no_media: bool,

        /// Skip root-level repository documents
        #[arg(long)]
        no_repo_docs: bool,

        /// Comma-separated repository document extensions
        #[arg(long, value_delimiter = ',')]
        repo_extensions: Option<Vec<String>>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Index every matching file under an arbitrary folder
    Folder {
        /// Folder to index
        root: PathBuf,

        /// Comma-separated file extensions to include
        #[arg(long, value_delimiter = ',', default_value = "md,txt")]
        extensions: Vec<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Show collection status and point count
    Status {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum chunk length in characters
    #[arg(long)]
    max_chars: Option<usize>,

    /// Overlap characters at hard-split boundaries
    #[arg(long)]
    overlap: Option<usize>,

    /// Chunks per embed+upsert batch
    #[arg(long, default_value = "8")]
    batch_size: usize,

    /// Delete and recreate the collection before indexing
    #[arg(long)]
    reset: bool,

    /// Gather and chunk only; print the plan without network calls
    #[arg(long)]
    dry_run: bool,

    /// Checkpoint file location
    #[arg(long, default_value = "rag_checkpoint.json")]
    checkpoint_file: PathBuf,

    /// Ignore any existing checkpoint
    #[arg(long)]
    no_resume: bool,

    /// Keep the checkpoint file after a completed run
    #[arg(long)]
    keep_checkpoint: bool,
}

impl CommonArgs {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(max_chars) = self.max_chars {
            config.chunking.max_chars = max_chars;
        }
        if let Some(overlap) = self.overlap {
            config.chunking.overlap = overlap;
        }
        Ok(config)
    }

    fn options(&self) -> IndexerOptions {
        IndexerOptions {
            batch_size: self.batch_size,
            reset: self.reset,
            dry_run: self.dry_run,
            resume: !self.no_resume,
            keep_checkpoint: self.keep_checkpoint,
            checkpoint_file: self.checkpoint_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chapters {
            chapter,
            root,
            no_media,
            no_repo_docs,
            repo_extensions,
            common,
        } => {
            let mut config = common.load_config()?;
            if let Some(root) = root {
                config.content.root = root.to_string_lossy().to_string();
            }
            if no_media {
                config.content.include_media = false;
            }
            if no_repo_docs {
                config.content.include_repo_docs = false;
            }
            if let Some(extensions) = repo_extensions {
                config.content.repo_extensions = extensions;
            }

            let selection: ChapterSelection = chapter.parse()?;
            let scope = format!("chapters:{}", selection.describe());

            println!("📚 Gathering chapters ({})...", selection.describe());
            let documents = gather_chapters(&config.content, selection)?;
            println!("   {} documents found", documents.len());

            let indexer = Indexer::new(config, common.options());
            let stats = indexer.run(documents, &scope).await?;
            report(&stats);
        }
        Commands::Folder {
            root,
            extensions,
            common,
        } => {
            let config = common.load_config()?;
            let scope = format!("folder:{}", root.display());

            println!("📂 Gathering folder {}...", root.display());
            let documents = gather_folder(&root, &extensions)?;
            println!("   {} documents found", documents.len());

            let indexer = Indexer::new(config, common.options());
            let stats = indexer.run(documents, &scope).await?;
            report(&stats);
        }
        Commands::Status { config } => {
            let config = Config::load(config.as_deref())?;
            let client = QdrantClient::new(&config.qdrant)?;

            if !client.collection_exists().await? {
                println!("Collection {} does not exist", client.collection());
                return Ok(());
            }
            let info = client.collection_info().await?;
            println!("Collection: {}", client.collection());
            println!("   Points:  {}", info.points_count);
            if let Some(status) = info.status {
                println!("   Status:  {}", status);
            }
        }
    }

    Ok(())
}

fn report(stats: &rag_indexer::IndexingStats) {
    if stats.skipped {
        println!("⏭️  Skipped: nothing to index");
        return;
    }
    println!("✅ Indexing complete!");
    println!("   📄 Documents: {}", stats.total_documents);
    println!("   📊 Chunks:    {}", stats.total_chunks);
    println!("   ⬆️  Upserted:  {}", stats.indexed_chunks);
    println!("   ⏱️  Time:      {:.2}s", stats.processing_time);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["rag-indexer", "chapters", "--chapter", "3-9", "--dry-run"]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from([
            "rag-indexer",
            "folder",
            "/tmp/corpus",
            "--extensions",
            "md,txt,json",
            "--batch-size",
            "16",
        ]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from(["rag-indexer", "status"]);
        assert!(cli.is_ok());
    }
}
