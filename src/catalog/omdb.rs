//! OMDb (`https://www.omdbapi.com/`) client.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::source::{MovieDetails, MovieSource, SourceError};

pub const DEFAULT_OMDB_URL: &str = "https://www.omdbapi.com/";

pub struct OmdbClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "imdbID")]
    imdb_id: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(rename = "Search", default)]
    search: Vec<SearchHit>,
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
}

impl OmdbClient {
    pub fn new(base_url: Url, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("apikey", &self.api_key);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        url
    }

    async fn get_text(&self, url: Url) -> Result<String, SourceError> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

fn parse_search(body: &str) -> Result<Vec<String>, SourceError> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Api(e.to_string()))?;
    if parsed.response == "True" {
        return Ok(parsed.search.into_iter().map(|hit| hit.imdb_id).collect());
    }
    match parsed.error {
        // Paging past the last result page reports "Movie not found!".
        Some(e) if e.contains("not found") => Ok(Vec::new()),
        Some(e) => Err(SourceError::Api(e)),
        None => Err(SourceError::Api("unexpected response".to_string())),
    }
}

fn parse_details(body: &str) -> Result<MovieDetails, SourceError> {
    if let Ok(err) = serde_json::from_str::<ErrorResponse>(body) {
        if err.response == "False" {
            return Err(SourceError::Api(
                err.error.unwrap_or_else(|| "unexpected response".to_string()),
            ));
        }
    }
    serde_json::from_str(body).map_err(|e| SourceError::Api(e.to_string()))
}

#[async_trait]
impl MovieSource for OmdbClient {
    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<String>, SourceError> {
        let page = page.to_string();
        let url = self.url(&[("s", keyword), ("type", "movie"), ("page", &page)]);
        parse_search(&self.get_text(url).await?)
    }

    async fn details(&self, movie_id: &str) -> Result<MovieDetails, SourceError> {
        let url = self.url(&[("i", movie_id)]);
        parse_details(&self.get_text(url).await?)
    }
}
