//! Read-through population of the movie cache.
//!
//! Catalog reads that find nothing locally page through the source, fetch the
//! details of every hit and upsert them by movie id. Source failures are
//! logged and the read is served from whatever the store holds; store
//! failures are returned to the caller.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::source::{MovieSource, SourceError};
use crate::db::{Database, Movie, StoreError};

/// Upper bound on source pages fetched while serving a single browse request.
const MAX_PAGES_PER_REQUEST: u32 = 10;

pub struct CachePopulator {
    db: Database,
    source: Arc<dyn MovieSource>,
    seed_query: String,
    /// Next source page of the seed query. Shared by all browse requests and
    /// held for the whole fill so two requests never fetch the same page.
    browse_page: Mutex<u32>,
}

impl CachePopulator {
    pub fn new(db: Database, source: Arc<dyn MovieSource>, seed_query: String) -> Self {
        Self {
            db,
            source,
            seed_query,
            browse_page: Mutex::new(1),
        }
    }

    /// A page of cached movies, filling the cache from the seed query until
    /// the page is non-empty or the source runs dry.
    pub async fn browse(&self, limit: i64, offset: i64) -> Result<Vec<Movie>, StoreError> {
        let rows = self.db.movies().list(limit, offset).await?;
        if !rows.is_empty() {
            return Ok(rows);
        }

        let mut page = self.browse_page.lock().await;
        for _ in 0..MAX_PAGES_PER_REQUEST {
            // Another request may have filled the cache while we waited.
            let rows = self.db.movies().list(limit, offset).await?;
            if !rows.is_empty() {
                return Ok(rows);
            }

            let ids = match self.source.search(&self.seed_query, *page).await {
                Ok(ids) => ids,
                Err(e) => {
                    log_source_error("seed search", &e);
                    break;
                }
            };
            if ids.is_empty() {
                tracing::info!(page = *page, "Movie source exhausted");
                break;
            }

            let stored = self.store_details(&ids).await?;
            tracing::info!(page = *page, stored, "Cached movies from source");
            *page += 1;
        }

        self.db.movies().list(limit, offset).await
    }

    /// Movies whose title contains `keyword`. When the first source hit for
    /// the keyword is not cached yet, the first result page is cached first.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Movie>, StoreError> {
        let keyword = keyword.trim();
        if !keyword.is_empty() {
            match self.source.search(keyword, 1).await {
                Ok(ids) => {
                    if let Some(first) = ids.first() {
                        if !self.db.movies().exists(first).await? {
                            let stored = self.store_details(&ids).await?;
                            tracing::info!(stored, "Cached movies for search");
                        }
                    }
                }
                Err(e) => log_source_error("keyword search", &e),
            }
        }
        self.db.movies().search_title(keyword).await
    }

    /// Fetch and upsert each id. Returns how many were stored; ids whose
    /// details cannot be fetched are skipped.
    async fn store_details(&self, ids: &[String]) -> Result<usize, StoreError> {
        let mut stored = 0;
        for id in ids {
            match self.source.details(id).await {
                Ok(details) => {
                    self.db.movies().upsert(&details.into_movie()).await?;
                    stored += 1;
                }
                Err(e) => log_source_error("details", &e),
            }
        }
        Ok(stored)
    }
}

fn log_source_error(context: &str, e: &SourceError) {
    match e {
        SourceError::Disabled => tracing::debug!("Movie source {} skipped: {}", context, e),
        _ => tracing::warn!("Movie source {} failed: {}", context, e),
    }
}
