use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source returned an error: {0}")]
    Api(String),
    #[error("no movie source configured")]
    Disabled,
}

/// One entry of a movie's ratings list.
#[derive(Debug, Clone, Deserialize)]
pub struct Rating {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Full upstream record for one movie, as delivered by the source.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    #[serde(rename = "imdbID")]
    pub movie_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Actors")]
    pub actors: Option<String>,
    #[serde(rename = "Genre")]
    pub genre: Option<String>,
    #[serde(rename = "Runtime")]
    pub runtime: Option<String>,
    #[serde(rename = "Rated")]
    pub age_rating: Option<String>,
    #[serde(rename = "Ratings", default)]
    pub ratings: Vec<Rating>,
    #[serde(rename = "Poster")]
    pub poster_url: Option<String>,
    #[serde(rename = "Released")]
    pub released: Option<String>,
    #[serde(rename = "Director")]
    pub director: Option<String>,
    #[serde(rename = "Plot")]
    pub plot: Option<String>,
}

/// A paged movie search plus per-movie detail lookup.
#[async_trait]
pub trait MovieSource: Send + Sync {
    /// Movie ids on `page` (1-based) of the results for `keyword`. An empty
    /// list means the results are exhausted.
    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<String>, SourceError>;

    async fn details(&self, movie_id: &str) -> Result<MovieDetails, SourceError>;
}

/// Source used when no API key is configured. Every call fails, so the
/// catalog only serves what is already cached.
pub struct DisabledSource;

#[async_trait]
impl MovieSource for DisabledSource {
    async fn search(&self, _keyword: &str, _page: u32) -> Result<Vec<String>, SourceError> {
        Err(SourceError::Disabled)
    }

    async fn details(&self, _movie_id: &str) -> Result<MovieDetails, SourceError> {
        Err(SourceError::Disabled)
    }
}
