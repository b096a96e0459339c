//! Raw page cache
//!
//! Fetched bodies are written verbatim (UTF-8) into a flat directory.
//! Catalogue pages are named `catalogue_page_{N}.html` and item pages
//! `book_{slug}.html`, where the slug is the second-to-last path segment of
//! the item URL. The crawler only appends; the ingestor only reads.

use std::{io, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error as CrateError;

/// Filename prefix of cached item pages
pub const ITEM_PAGE_PREFIX: &str = "book_";

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base path for storage
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(".folio/raw_html"),
        }
    }
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL for storage: {0}")]
    InvalidUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for CrateError {
    fn from(err: StorageError) -> Self {
        CrateError::Storage(err.to_string())
    }
}

type Result<T> = std::result::Result<T, StorageError>;

/// A cached page read back from storage
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    /// Logical name (the filename)
    pub name: String,

    /// Full page body
    pub body: String,
}

/// Storage manager for raw pages
#[derive(Debug, Clone)]
pub struct Storage {
    config: StorageConfig,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    /// Create a new storage with default configuration
    pub fn new() -> Self {
        Self {
            config: StorageConfig::default(),
        }
    }

    /// Create a new storage with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Directory holding the cached pages
    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    /// Gets the storage path for a logical name
    fn get_storage_path(&self, name: &str) -> PathBuf {
        self.config.base_path.join(name)
    }

    /// Creates necessary directories for storage
    async fn ensure_directories(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Stores a page body under the given name, replacing any previous copy
    pub async fn store(&self, name: &str, body: &str) -> Result<PathBuf> {
        let storage_path = self.get_storage_path(name);
        self.ensure_directories(&storage_path).await?;
        fs::write(&storage_path, body).await?;
        debug!("Saved {} bytes to {}", body.len(), storage_path.display());
        Ok(storage_path)
    }

    /// Loads a page body by name
    pub async fn load(&self, name: &str) -> Result<String> {
        let storage_path = self.get_storage_path(name);
        match fs::read_to_string(&storage_path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads every cached item page, sorted by name
    ///
    /// Files that are not item pages (catalogue pages, stray files) are
    /// ignored. A missing cache directory yields `NotFound`.
    pub async fn load_item_pages(&self) -> Result<Vec<CachedPage>> {
        let base_path = &self.config.base_path;
        if !fs::try_exists(base_path).await? {
            return Err(StorageError::NotFound(format!(
                "No cached pages in {}",
                base_path.display()
            )));
        }

        let mut names = Vec::new();
        let mut dir_entries = fs::read_dir(base_path).await?;
        while let Some(entry) = dir_entries.next_entry().await? {
            if let Some(file_name) = entry.file_name().to_str() {
                if is_item_page(file_name) {
                    names.push(file_name.to_string());
                }
            }
        }
        names.sort();

        let mut pages = Vec::with_capacity(names.len());
        for name in names {
            match self.load(&name).await {
                Ok(body) => pages.push(CachedPage { name, body }),
                Err(e) => warn!("Failed to load cached page {}: {}", name, e),
            }
        }
        Ok(pages)
    }
}

/// Cache filename for a numbered catalogue page
pub fn catalogue_filename(page: u32) -> String {
    format!("catalogue_page_{}.html", page)
}

/// Cache filename for an item page URL
///
/// Item URLs look like `.../catalogue/a-light-in-the-attic_1000/index.html`;
/// the slug is the directory segment just before the last one.
pub fn item_filename(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();

    if segments.len() < 2 {
        return Err(StorageError::InvalidUrl(url.to_string()));
    }

    let slug = segments[segments.len() - 2];
    if slug.is_empty() {
        return Err(StorageError::InvalidUrl(url.to_string()));
    }
    Ok(format!("{}{}.html", ITEM_PAGE_PREFIX, slug))
}

/// Whether a cache filename names an item page
pub fn is_item_page(name: &str) -> bool {
    name.starts_with(ITEM_PAGE_PREFIX) && name.ends_with(".html")
}
