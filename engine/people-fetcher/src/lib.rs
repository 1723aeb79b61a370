//! People Fetcher
//!
//! Loads the TMDb "popular people" listing into the `people` table. Each
//! listed person's details are fetched, reduced to a [`PersonRecord`] and
//! inserted with `ON CONFLICT (id) DO NOTHING`, so re-running never touches
//! rows that already exist. Only page 1 of the listing is loaded; there is
//! no pagination, retry, or rate-limit handling.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod transform;

pub use config::{CommitMode, FetcherConfig};
pub use error::{FetcherError, Result};
pub use fetcher::{PersonSource, TmdbClient};
pub use models::*;
pub use pipeline::{check_api, populate, PeoplePipeline};
pub use store::{PeopleStore, PgPeopleStore};
