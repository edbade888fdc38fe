//! Chunking property tests
//!
//! Covers the chunk-length bound, the hard-split overlap guarantee and the
//! paragraph-bounded split behavior end to end from files on disk.

use rag_indexer::corpus::{chunk_documents, gather_folder};
use rag_indexer::text::{chunk_text, TextChunker};
use rag_indexer::config::ChunkingConfig;
use std::fs;

#[test]
fn every_chunk_respects_max_chars() -> Result<(), Box<dyn std::error::Error>> {
    let inputs = [
        "word ".repeat(1000),
        "Paragraph one.\n\n".repeat(80),
        "nosplitshere".repeat(50),
        "mixed content\n\nwith a very long paragraph ".repeat(40),
    ];

    for text in &inputs {
        for (max_chars, overlap) in [(1800, 200), (300, 50), (64, 16), (10, 3)] {
            let chunks = chunk_text(text, max_chars, overlap);
            for chunk in &chunks {
                assert!(
                    chunk.chars().count() <= max_chars,
                    "chunk of {} chars exceeds max {}",
                    chunk.chars().count(),
                    max_chars
                );
            }
        }
    }
    Ok(())
}

#[test]
fn five_hundred_char_file_splits_into_two_overlapping_chunks(
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let text: String = ('a'..='z').cycle().take(500).collect();
    fs::write(dir.path().join("scene.txt"), &text)?;

    let documents = gather_folder(dir.path(), &["txt".to_string()])?;
    assert_eq!(documents.len(), 1);

    let chunker = TextChunker::new(ChunkingConfig {
        max_chars: 300,
        overlap: 50,
    });
    let chunks = chunk_documents(&documents, &chunker);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[1].chunk_index, 1);

    // Second chunk starts with the last 50 characters of the first
    let tail: String = chunks[0].text.chars().skip(250).collect();
    assert_eq!(tail.chars().count(), 50);
    assert!(chunks[1].text.starts_with(&tail));
    Ok(())
}

#[test]
fn paragraph_bounded_files_split_at_the_paragraph() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let para_a = "a".repeat(250);
    let para_b = "b".repeat(240);
    fs::write(
        dir.path().join("scene.txt"),
        format!("{}\n\n{}", para_a, para_b),
    )?;

    let documents = gather_folder(dir.path(), &["txt".to_string()])?;
    let chunker = TextChunker::new(ChunkingConfig {
        max_chars: 300,
        overlap: 50,
    });
    let chunks = chunk_documents(&documents, &chunker);

    assert_eq!(chunks.len(), 2);
    // No carried-over overlap when the split falls on a paragraph boundary
    assert_eq!(chunks[0].text, para_a);
    assert_eq!(chunks[1].text, para_b);
    Ok(())
}

#[test]
fn chunk_hashes_track_content() {
    let text = "Alpha paragraph.\n\nBeta paragraph.";
    let chunks_a = chunk_text(text, 20, 5);
    let chunks_b = chunk_text(text, 20, 5);
    assert_eq!(chunks_a, chunks_b);

    let changed = chunk_text("Alpha paragraph.\n\nGamma paragraph.", 20, 5);
    assert_ne!(chunks_a, changed);
}
