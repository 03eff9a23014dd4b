//! Mapping of upstream records onto cached movie rows.

use chrono::NaiveDate;

use super::source::{MovieDetails, Rating};
use crate::db::Movie;

pub const IMDB_SOURCE: &str = "Internet Movie Database";
pub const ROTTEN_TOMATOES_SOURCE: &str = "Rotten Tomatoes";
pub const METACRITIC_SOURCE: &str = "Metacritic";

/// The value reported by `source`, if the list has one.
pub fn pick_rating(ratings: &[Rating], source: &str) -> Option<String> {
    ratings
        .iter()
        .find(|r| r.source == source)
        .map(|r| r.value.clone())
        .filter(|v| !v.is_empty())
}

/// `"14 Jun 2013"` -> `"2013-06-14"`. `N/A` and anything unparseable are
/// unknown.
pub fn parse_release_date(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    NaiveDate::parse_from_str(raw, "%d %b %Y")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

impl MovieDetails {
    pub fn into_movie(self) -> Movie {
        Movie {
            imdb_rating: pick_rating(&self.ratings, IMDB_SOURCE),
            rotten_tomatoes_rating: pick_rating(&self.ratings, ROTTEN_TOMATOES_SOURCE),
            metacritic_rating: pick_rating(&self.ratings, METACRITIC_SOURCE),
            release_date: parse_release_date(self.released.as_deref()),
            movie_id: self.movie_id,
            title: self.title,
            actors: self.actors,
            genre: self.genre,
            runtime: self.runtime,
            age_rating: self.age_rating,
            poster_url: self.poster_url,
            director: self.director,
            description: self.plot,
            user_rating: None,
        }
    }
}
