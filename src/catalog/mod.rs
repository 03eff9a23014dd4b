//! Local movie cache, filled on demand from an external metadata source.

mod normalize;
mod omdb;
mod populator;
mod source;

pub use normalize::{parse_release_date, pick_rating};
pub use omdb::{DEFAULT_OMDB_URL, OmdbClient};
pub use populator::CachePopulator;
pub use source::{DisabledSource, MovieDetails, MovieSource, Rating, SourceError};
