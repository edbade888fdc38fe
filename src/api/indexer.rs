//! Indexer driver
//!
//! Run lifecycle: chunk the gathered documents, probe the embedding
//! dimension, ensure the collection, decide where to start from the
//! checkpoint, then loop embed → upsert → checkpoint until done. A failed
//! batch aborts the run and leaves the checkpoint in place, so the next
//! invocation resumes after the last durable batch. Batches run strictly
//! sequentially; there is never more than one request in flight.

use crate::checkpoint::{plan_resume, Checkpoint, CheckpointStore, ResumePlan, RunSignature};
use crate::config::Config;
use crate::corpus::{chunk_documents, Document, DocumentChunk};
use crate::embedding::EmbeddingClient;
use crate::error::Result;
use crate::qdrant::{point_from_chunk, QdrantClient};
use crate::text::TextChunker;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Run options, resolved from CLI flags
#[derive(Debug, Clone)]
pub struct IndexerOptions {
    /// Chunks embedded and upserted per batch
    pub batch_size: usize,

    /// Delete and recreate the collection before indexing
    pub reset: bool,

    /// Gather and chunk only; print the plan without any network calls
    pub dry_run: bool,

    /// Honor an existing checkpoint (disabled by `--no-resume`)
    pub resume: bool,

    /// Keep the checkpoint file after a completed run
    pub keep_checkpoint: bool,

    /// Checkpoint file location
    pub checkpoint_file: PathBuf,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            batch_size: 8,
            reset: false,
            dry_run: false,
            resume: true,
            keep_checkpoint: false,
            checkpoint_file: PathBuf::from("rag_checkpoint.json"),
        }
    }
}

/// Outcome of an indexing run
#[derive(Debug, Clone)]
pub struct IndexingStats {
    /// Documents gathered from the corpus
    pub total_documents: usize,

    /// Chunks produced from those documents
    pub total_chunks: usize,

    /// Chunks embedded and upserted by this run
    pub indexed_chunks: usize,

    /// True when the run was skipped as already complete
    pub skipped: bool,

    /// Wall-clock processing time in seconds
    pub processing_time: f64,
}

/// High-level indexing driver
pub struct Indexer {
    config: Config,
    options: IndexerOptions,
}

impl Indexer {
    /// Create a driver from configuration and run options
    pub fn new(config: Config, options: IndexerOptions) -> Self {
        Self { config, options }
    }

    /// Index the gathered documents. `scope` identifies the input set for
    /// the run signature, e.g. `chapters:3-9` or `folder:/data/corpus`.
    pub async fn run(&self, documents: Vec<Document>, scope: &str) -> Result<IndexingStats> {
        let start_time = std::time::Instant::now();
        let total_documents = documents.len();

        let chunker = TextChunker::new(self.config.chunking.clone());
        let chunks = chunk_documents(&documents, &chunker);
        log::info!(
            "{} documents -> {} chunks (max_chars={}, overlap={})",
            total_documents,
            chunks.len(),
            self.config.chunking.max_chars,
            self.config.chunking.overlap
        );

        if self.options.dry_run {
            print_plan(&chunks);
            return Ok(IndexingStats {
                total_documents,
                total_chunks: chunks.len(),
                indexed_chunks: 0,
                skipped: false,
                processing_time: start_time.elapsed().as_secs_f64(),
            });
        }

        if chunks.is_empty() {
            log::warn!("nothing to index");
            return Ok(IndexingStats {
                total_documents,
                total_chunks: 0,
                indexed_chunks: 0,
                skipped: true,
                processing_time: start_time.elapsed().as_secs_f64(),
            });
        }

        let signature = RunSignature::compute(&self.config, scope);
        let embedder = EmbeddingClient::new(self.config.embedding.clone())?;
        let qdrant = QdrantClient::new(&self.config.qdrant)?;
        let store = CheckpointStore::new(&self.options.checkpoint_file);

        let dimension = embedder.probe_dimension().await?;
        qdrant
            .ensure_collection(dimension, &self.config.qdrant.distance, self.options.reset)
            .await?;

        if self.options.reset {
            // The collection was just emptied; any old progress is meaningless
            store.clear()?;
        }

        let checkpoint = if self.options.resume && !self.options.reset {
            store.load()?
        } else {
            None
        };
        let existing_points = if checkpoint.is_none() && !self.options.reset {
            qdrant.count_points().await?
        } else {
            0
        };

        let start_index = match plan_resume(
            checkpoint.as_ref(),
            &signature,
            chunks.len(),
            existing_points,
        ) {
            ResumePlan::Skip => {
                println!("Already indexed, nothing to do.");
                return Ok(IndexingStats {
                    total_documents,
                    total_chunks: chunks.len(),
                    indexed_chunks: 0,
                    skipped: true,
                    processing_time: start_time.elapsed().as_secs_f64(),
                });
            }
            ResumePlan::Resume(index) => index,
            ResumePlan::Start => 0,
        };

        let indexed = self
            .index_chunks(&chunks, start_index, &signature, &embedder, &qdrant, &store)
            .await?;

        if self.options.keep_checkpoint {
            log::info!("keeping checkpoint at {}", store.path().display());
        } else {
            store.clear()?;
        }

        Ok(IndexingStats {
            total_documents,
            total_chunks: chunks.len(),
            indexed_chunks: indexed,
            skipped: false,
            processing_time: start_time.elapsed().as_secs_f64(),
        })
    }

    /// Embed and upsert chunks batch by batch, checkpointing after each one.
    async fn index_chunks(
        &self,
        chunks: &[DocumentChunk],
        start_index: usize,
        signature: &RunSignature,
        embedder: &EmbeddingClient,
        qdrant: &QdrantClient,
        store: &CheckpointStore,
    ) -> Result<usize> {
        let batch_size = self.options.batch_size.max(1);
        let progress = ProgressBar::new(chunks.len() as u64);
        progress.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} chunks [{elapsed_precise}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_position(start_index as u64);

        let mut indexed = 0usize;
        let mut index = start_index;
        while index < chunks.len() {
            let end = (index + batch_size).min(chunks.len());
            let batch = &chunks[index..end];

            let vectors = self.embed_batch(embedder, batch).await?;

            let indexed_at = Utc::now();
            let mut points = Vec::with_capacity(batch.len());
            for (chunk, vector) in batch.iter().zip(vectors) {
                points.push(point_from_chunk(chunk, vector, indexed_at)?);
            }
            qdrant.upsert_points(&points).await?;

            store.save(&Checkpoint {
                signature: signature.as_str().to_string(),
                next_index: end,
                total_docs: chunks.len(),
                updated_at: Utc::now(),
            })?;

            indexed += batch.len();
            progress.set_position(end as u64);
            log::debug!("batch {}..{} upserted", index, end);
            index = end;
        }

        progress.finish_with_message("done");
        log::info!("indexed {} chunks", indexed);
        Ok(indexed)
    }

    /// Embed one batch, falling back to one-chunk-at-a-time when the server
    /// rejects the batch as too large. A single chunk that still fails is a
    /// hard error.
    async fn embed_batch(
        &self,
        embedder: &EmbeddingClient,
        batch: &[DocumentChunk],
    ) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        match embedder.embed(&texts).await {
            Ok(vectors) => Ok(vectors),
            Err(err) if err.is_input_too_large() && texts.len() > 1 => {
                log::warn!("batch too large for embedding server, retrying one chunk at a time");
                let mut vectors = Vec::with_capacity(texts.len());
                for text in &texts {
                    let mut single = embedder.embed(std::slice::from_ref(text)).await?;
                    vectors.push(single.remove(0));
                }
                Ok(vectors)
            }
            Err(err) => Err(err),
        }
    }
}

/// Print the dry-run plan: chunk counts per kind and per chapter.
fn print_plan(chunks: &[DocumentChunk]) {
    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_chapter: BTreeMap<u32, usize> = BTreeMap::new();
    for chunk in chunks {
        *by_kind.entry(chunk.payload.kind.as_str()).or_insert(0) += 1;
        if let Some(chapter) = chunk.payload.chapter {
            *by_chapter.entry(chapter).or_insert(0) += 1;
        }
    }

    println!("Dry run: {} chunks would be indexed", chunks.len());
    for (kind, count) in &by_kind {
        println!("  kind {:8} {:6} chunks", kind, count);
    }
    for (chapter, count) in &by_chapter {
        println!("  chapter {:4} {:6} chunks", chapter, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DocumentPayload;

    fn document(path_rel: &str, text: &str) -> Document {
        Document {
            text: text.to_string(),
            payload: DocumentPayload {
                chapter: Some(1),
                scene: Some("scene".to_string()),
                kind: "scene".to_string(),
                source: "scene.txt".to_string(),
                path: format!("/corpus/{}", path_rel),
                path_rel: path_rel.to_string(),
                mtime: 0,
                size: text.len() as u64,
            },
        }
    }

    #[test]
    fn test_default_options() {
        let options = IndexerOptions::default();
        assert_eq!(options.batch_size, 8);
        assert!(options.resume);
        assert!(!options.reset);
        assert!(!options.dry_run);
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_network_calls() {
        // Unroutable endpoints: the run only succeeds because dry-run stops
        // before the dimension probe.
        let mut config = Config::default();
        config.embedding.endpoint = "http://192.0.2.1:1/api/embeddings".to_string();
        config.qdrant.url = "http://192.0.2.1:1".to_string();

        let options = IndexerOptions {
            dry_run: true,
            ..Default::default()
        };
        let indexer = Indexer::new(config, options);

        let documents = vec![
            document("chapters/01/a.txt", "First scene text."),
            document("chapters/01/b.txt", "Second scene text."),
        ];
        let stats = indexer.run(documents, "chapters:all").await.unwrap();
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.total_chunks, 2);
        assert_eq!(stats.indexed_chunks, 0);
        assert!(!stats.skipped);
    }

    #[tokio::test]
    async fn test_empty_corpus_short_circuits() {
        let mut config = Config::default();
        config.embedding.endpoint = "http://192.0.2.1:1/api/embeddings".to_string();
        config.qdrant.url = "http://192.0.2.1:1".to_string();

        let indexer = Indexer::new(config, IndexerOptions::default());
        let stats = indexer.run(Vec::new(), "chapters:all").await.unwrap();
        assert!(stats.skipped);
        assert_eq!(stats.total_chunks, 0);
    }
}
