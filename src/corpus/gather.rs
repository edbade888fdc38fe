//! Corpus tree walkers
//!
//! Two gathering modes: the structured chapter tree (`<root>/chapters/NN/`
//! with global documents at the root) and an arbitrary folder. Both produce
//! [`Document`]s in a deterministic path order so that checkpoint indices are
//! stable across runs.

use crate::config::ContentConfig;
use crate::corpus::{Document, DocumentPayload};
use crate::error::{IndexerError, Result};
use std::path::Path;
use std::str::FromStr;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

/// Extensions treated as scene text inside chapter folders
const SCENE_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Extensions treated as media-sidecar metadata inside chapter folders
const MEDIA_EXTENSIONS: &[&str] = &["json", "csv", "srt", "vtt"];

/// Which chapters to gather
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterSelection {
    /// Every chapter folder under the root
    All,
    /// A single chapter number
    Single(u32),
    /// An inclusive chapter range
    Range(u32, u32),
}

impl ChapterSelection {
    /// True when the given chapter number is selected
    pub fn contains(&self, chapter: u32) -> bool {
        match *self {
            ChapterSelection::All => true,
            ChapterSelection::Single(n) => chapter == n,
            ChapterSelection::Range(lo, hi) => chapter >= lo && chapter <= hi,
        }
    }

    /// Stable textual form, used in the run signature
    pub fn describe(&self) -> String {
        match *self {
            ChapterSelection::All => "all".to_string(),
            ChapterSelection::Single(n) => n.to_string(),
            ChapterSelection::Range(lo, hi) => format!("{}-{}", lo, hi),
        }
    }
}

impl FromStr for ChapterSelection {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(ChapterSelection::All);
        }
        if let Some((lo, hi)) = s.split_once('-') {
            let lo: u32 = lo.trim().parse().map_err(|_| bad_selection(s))?;
            let hi: u32 = hi.trim().parse().map_err(|_| bad_selection(s))?;
            if lo > hi {
                return Err(bad_selection(s));
            }
            return Ok(ChapterSelection::Range(lo, hi));
        }
        let n: u32 = s.parse().map_err(|_| bad_selection(s))?;
        Ok(ChapterSelection::Single(n))
    }
}

fn bad_selection(s: &str) -> IndexerError {
    IndexerError::Corpus(format!(
        "invalid chapter selection '{}': expected all, N or N-M",
        s
    ))
}

/// Gather scene files, optional media sidecars and root-level repository
/// documents from the chapter tree.
pub fn gather_chapters(content: &ContentConfig, selection: ChapterSelection) -> Result<Vec<Document>> {
    let root = Path::new(&content.root);
    if !root.is_dir() {
        return Err(IndexerError::Corpus(format!(
            "corpus root not found: {}",
            root.display()
        )));
    }

    let mut documents = Vec::new();

    let chapters_dir = root.join("chapters");
    if chapters_dir.is_dir() {
        for entry in WalkDir::new(&chapters_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| IndexerError::Corpus(e.to_string()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(chapter) = parse_chapter_number(&name) else {
                log::warn!("skipping non-chapter folder {}", name);
                continue;
            };
            if !selection.contains(chapter) {
                continue;
            }
            gather_chapter_folder(root, entry.path(), chapter, content, &mut documents)?;
        }
    } else {
        log::warn!("no chapters/ directory under {}", root.display());
    }

    if content.include_repo_docs {
        gather_repo_docs(root, content, &mut documents)?;
    }

    documents.sort_by(|a, b| a.payload.path_rel.cmp(&b.payload.path_rel));
    log::info!("gathered {} documents from chapter tree", documents.len());
    Ok(documents)
}

/// Gather every matching file under an arbitrary folder.
pub fn gather_folder(root: &Path, extensions: &[String]) -> Result<Vec<Document>> {
    if !root.is_dir() {
        return Err(IndexerError::Corpus(format!(
            "folder not found: {}",
            root.display()
        )));
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| IndexerError::Corpus(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = file_extension(entry.path()) else {
            continue;
        };
        if !extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            continue;
        }
        if let Some(document) = read_document(root, entry.path(), None, None, "file")? {
            documents.push(document);
        }
    }

    documents.sort_by(|a, b| a.payload.path_rel.cmp(&b.payload.path_rel));
    log::info!(
        "gathered {} documents from {}",
        documents.len(),
        root.display()
    );
    Ok(documents)
}

/// Collect scene and media files from one chapter folder.
fn gather_chapter_folder(
    root: &Path,
    chapter_dir: &Path,
    chapter: u32,
    content: &ContentConfig,
    documents: &mut Vec<Document>,
) -> Result<()> {
    for entry in WalkDir::new(chapter_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| IndexerError::Corpus(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = file_extension(entry.path()) else {
            continue;
        };

        let (kind, scene) = if SCENE_EXTENSIONS.contains(&ext.as_str()) {
            let scene = entry
                .path()
                .file_stem()
                .map(|s| s.to_string_lossy().to_string());
            ("scene", scene)
        } else if MEDIA_EXTENSIONS.contains(&ext.as_str()) {
            if !content.include_media {
                continue;
            }
            ("media", None)
        } else {
            continue;
        };

        if let Some(document) = read_document(root, entry.path(), Some(chapter), scene, kind)? {
            documents.push(document);
        }
    }
    Ok(())
}

/// Collect repository documents directly under the corpus root.
fn gather_repo_docs(
    root: &Path,
    content: &ContentConfig,
    documents: &mut Vec<Document>,
) -> Result<()> {
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| IndexerError::Corpus(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = file_extension(entry.path()) else {
            continue;
        };
        if !content
            .repo_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&ext))
        {
            continue;
        }
        if let Some(document) = read_document(root, entry.path(), None, None, "doc")? {
            documents.push(document);
        }
    }
    Ok(())
}

/// Read one source file into a [`Document`]. Unreadable or non-UTF-8 files
/// are skipped with a warning rather than failing the whole gather.
fn read_document(
    root: &Path,
    path: &Path,
    chapter: Option<u32>,
    scene: Option<String>,
    kind: &str,
) -> Result<Option<Document>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("skipping unreadable file {}: {}", path.display(), e);
            return Ok(None);
        }
    };
    if text.trim().is_empty() {
        log::warn!("skipping empty file {}", path.display());
        return Ok(None);
    }

    let metadata = std::fs::metadata(path)?;
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let path_rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(Some(Document {
        text,
        payload: DocumentPayload {
            chapter,
            scene,
            kind: kind.to_string(),
            source,
            path: path.to_string_lossy().to_string(),
            path_rel,
            mtime,
            size: metadata.len(),
        },
    }))
}

/// Parse the chapter number from a folder name's trailing digits, so both
/// `07` and `chapter_07` resolve to 7.
fn parse_chapter_number(name: &str) -> Option<u32> {
    let digits: String = name
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
