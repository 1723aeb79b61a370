//! Fetch-transform-load run: list popular people, fetch each person's
//! details, derive a [`PersonRecord`](crate::models::PersonRecord) and insert
//! it. Everything happens strictly in listing order, one request at a time.

use crate::config::{CommitMode, FetcherConfig};
use crate::error::{FetcherError, Result};
use crate::fetcher::{PersonSource, TmdbClient};
use crate::models::{PersonSummary, RunSummary};
use crate::store::{PeopleStore, PgPeopleStore};
use tracing::{info, warn};

/// Pipeline settings taken from [`FetcherConfig`]
#[derive(Debug, Clone)]
pub struct PeoplePipeline {
    image_base_url: String,
    page: u32,
    commit_mode: CommitMode,
}

impl PeoplePipeline {
    pub fn new(config: &FetcherConfig) -> Self {
        Self {
            image_base_url: config.tmdb.image_base_url.clone(),
            page: config.pipeline.page,
            commit_mode: config.pipeline.commit_mode,
        }
    }

    /// Run the pipeline against an already opened store.
    ///
    /// A listing failure aborts before anything is written. Detail failures
    /// skip that person only. A storage error aborts the run; with
    /// [`CommitMode::AtEnd`] nothing from the run is committed.
    pub async fn run<S, W>(&self, source: &S, store: &mut W) -> Result<RunSummary>
    where
        S: PersonSource + ?Sized,
        W: PeopleStore + ?Sized,
    {
        let people = source.popular_people(self.page).await?;
        info!("Found {} popular people to process", people.len());

        let mut summary = RunSummary { listed: people.len(), ..Default::default() };

        for person in &people {
            self.process_person(source, store, person, &mut summary).await?;
        }

        store.commit().await?;

        info!(
            "Successfully populated people table: {} inserted, {} already present, {} skipped",
            summary.inserted, summary.already_present, summary.skipped
        );
        Ok(summary)
    }

    async fn process_person<S, W>(
        &self,
        source: &S,
        store: &mut W,
        person: &PersonSummary,
        summary: &mut RunSummary,
    ) -> Result<()>
    where
        S: PersonSource + ?Sized,
        W: PeopleStore + ?Sized,
    {
        let Some(person_id) = person.person_id() else {
            summary.skipped += 1;
            return Ok(());
        };

        let details = match source.person_details(person_id).await {
            Ok(details) => details,
            Err(e @ FetcherError::DetailFetch { .. }) => {
                warn!("{}; skipping", e);
                summary.skipped += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let record = details.to_person_record(person_id, &self.image_base_url);
        let inserted = store.insert_person(&record).await?;

        if self.commit_mode == CommitMode::PerItem {
            store.commit().await?;
        }

        let name = record.name.as_deref().unwrap_or("<unnamed>");
        if inserted {
            summary.inserted += 1;
            info!("Processed: {} ({})", name, record.id);
        } else {
            summary.already_present += 1;
            info!("Already present, left untouched: {} ({})", name, record.id);
        }

        Ok(())
    }

    /// Run the pipeline, then release the store on every exit path
    pub async fn run_and_close<S, W>(&self, source: &S, store: &mut W) -> Result<RunSummary>
    where
        S: PersonSource + ?Sized,
        W: PeopleStore + ?Sized,
    {
        let result = self.run(source, store).await;
        store.close().await;
        result
    }
}

/// Validate the configuration, connect, run the pipeline and disconnect.
///
/// The database connection is opened before the first API call, so a
/// connection failure never reaches TMDb.
pub async fn populate(config: &FetcherConfig) -> Result<RunSummary> {
    config.validate()?;
    let source = TmdbClient::new(&config.tmdb, config.api_key()?)?;

    let mut store = PgPeopleStore::connect(&config.database).await?;

    PeoplePipeline::new(config).run_and_close(&source, &mut store).await
}

/// Fetch the popular listing only, to verify the API key. Does not touch the
/// database.
pub async fn check_api(config: &FetcherConfig) -> Result<Vec<PersonSummary>> {
    let source = TmdbClient::new(&config.tmdb, config.api_key()?)?;
    source.popular_people(config.pipeline.page).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PersonDetails, PersonRecord};
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::Mutex;

    const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

    #[derive(Default)]
    struct FakeSource {
        listing: Vec<PersonSummary>,
        listing_fails: bool,
        details: HashMap<i64, PersonDetails>,
        failing: HashSet<i64>,
        detail_calls: Mutex<Vec<i64>>,
    }

    impl FakeSource {
        fn with_people(people: &[(i64, &str)]) -> Self {
            let mut source = FakeSource::default();
            for (id, name) in people {
                source.listing.push(PersonSummary { id: Some(*id), ..Default::default() });
                source.details.insert(*id, details(*id, name));
            }
            source
        }

        fn calls(&self) -> Vec<i64> {
            self.detail_calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl PersonSource for FakeSource {
        async fn popular_people(&self, page: u32) -> Result<Vec<PersonSummary>> {
            assert_eq!(page, 1);
            if self.listing_fails {
                return Err(FetcherError::fetch("status 401 Unauthorized"));
            }
            Ok(self.listing.clone())
        }

        async fn person_details(&self, person_id: i64) -> Result<PersonDetails> {
            self.detail_calls.lock().unwrap().push(person_id);
            if self.failing.contains(&person_id) {
                return Err(FetcherError::detail_fetch(person_id, "status 404 Not Found"));
            }
            self.details
                .get(&person_id)
                .cloned()
                .ok_or_else(|| FetcherError::detail_fetch(person_id, "unknown"))
        }
    }

    #[derive(Default)]
    struct FakeStore {
        committed: BTreeMap<i64, PersonRecord>,
        pending: BTreeMap<i64, PersonRecord>,
        fail_on: Option<i64>,
        commits: usize,
        closed: bool,
    }

    #[async_trait::async_trait]
    impl PeopleStore for FakeStore {
        async fn insert_person(&mut self, record: &PersonRecord) -> Result<bool> {
            if self.fail_on == Some(record.id) {
                return Err(FetcherError::Storage(sqlx::Error::Protocol(
                    "value too long for type character varying(255)".to_string(),
                )));
            }
            if self.committed.contains_key(&record.id) || self.pending.contains_key(&record.id) {
                return Ok(false);
            }
            self.pending.insert(record.id, record.clone());
            Ok(true)
        }

        async fn commit(&mut self) -> Result<()> {
            self.commits += 1;
            self.committed.append(&mut self.pending);
            Ok(())
        }

        async fn close(&mut self) {
            self.pending.clear();
            self.closed = true;
        }
    }

    fn details(id: i64, name: &str) -> PersonDetails {
        PersonDetails {
            id: Some(id),
            name: Some(name.to_string()),
            birthday: Some("1980-01-15".to_string()),
            deathday: None,
            profile_path: Some(format!("/{id}.jpg")),
            biography: Some(format!("{name} is an actor.")),
            place_of_birth: Some("Toronto, Ontario, Canada".to_string()),
        }
    }

    fn pipeline(commit_mode: CommitMode) -> PeoplePipeline {
        PeoplePipeline { image_base_url: IMAGE_BASE.to_string(), page: 1, commit_mode }
    }

    #[tokio::test]
    async fn test_example_person_is_stored() {
        let mut source = FakeSource::default();
        source.listing.push(PersonSummary { id: Some(42), ..Default::default() });
        source.details.insert(
            42,
            PersonDetails {
                id: Some(42),
                name: Some("Jane Doe".to_string()),
                birthday: Some("1975-03-02".to_string()),
                deathday: None,
                profile_path: Some("/abc.jpg".to_string()),
                biography: Some("An actor.".to_string()),
                place_of_birth: Some("Austin, Texas, USA".to_string()),
            },
        );
        let mut store = FakeStore::default();

        let summary = pipeline(CommitMode::AtEnd).run(&source, &mut store).await.unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(
            store.committed[&42],
            PersonRecord {
                id: 42,
                name: Some("Jane Doe".to_string()),
                birth_year: Some(1975),
                death_year: None,
                photo: Some(format!("{IMAGE_BASE}/abc.jpg")),
                bio: Some("An actor.".to_string()),
                nationality: Some("USA".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_failed_detail_skips_only_that_person() {
        let mut source = FakeSource::with_people(&[(1, "Ann"), (2, "Bob"), (3, "Cid")]);
        source.failing.insert(2);
        let mut store = FakeStore::default();

        let summary = pipeline(CommitMode::AtEnd).run(&source, &mut store).await.unwrap();

        assert_eq!(
            summary,
            RunSummary { listed: 3, inserted: 2, already_present: 0, skipped: 1 }
        );
        assert_eq!(store.committed.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() {
        let source = FakeSource::with_people(&[(1, "Ann"), (2, "Bob")]);
        let mut store = FakeStore::default();
        let pipeline = pipeline(CommitMode::AtEnd);

        pipeline.run(&source, &mut store).await.unwrap();
        let after_first = store.committed.clone();

        // Upstream data changed, stored rows must not.
        let mut changed = FakeSource::with_people(&[(1, "Ann Renamed"), (2, "Bob")]);
        changed.details.get_mut(&2).unwrap().biography = None;
        let summary = pipeline.run(&changed, &mut store).await.unwrap();

        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.already_present, 2);
        assert_eq!(store.committed, after_first);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_before_details() {
        let mut source = FakeSource::with_people(&[(1, "Ann")]);
        source.listing_fails = true;
        let mut store = FakeStore::default();

        let err = pipeline(CommitMode::AtEnd).run_and_close(&source, &mut store).await.unwrap_err();

        assert!(matches!(err, FetcherError::Fetch { .. }));
        assert_eq!(err.exit_code(), 2);
        assert!(source.calls().is_empty());
        assert!(store.committed.is_empty());
        assert!(store.closed);
    }

    #[tokio::test]
    async fn test_entries_without_id_are_skipped() {
        let mut source = FakeSource::with_people(&[(5, "Eve")]);
        source.listing.insert(0, PersonSummary { id: None, ..Default::default() });
        source.listing.push(PersonSummary { id: Some(0), ..Default::default() });
        let mut store = FakeStore::default();

        let summary = pipeline(CommitMode::AtEnd).run(&source, &mut store).await.unwrap();

        assert_eq!(summary.listed, 3);
        assert_eq!(summary.skipped, 2);
        assert_eq!(source.calls(), vec![5]);
    }

    #[tokio::test]
    async fn test_details_fetched_in_listing_order() {
        let source = FakeSource::with_people(&[(30, "C"), (10, "A"), (20, "B")]);
        let mut store = FakeStore::default();

        pipeline(CommitMode::AtEnd).run(&source, &mut store).await.unwrap();

        assert_eq!(source.calls(), vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn test_storage_error_discards_batch_when_committing_at_end() {
        let source = FakeSource::with_people(&[(1, "Ann"), (2, "Bob"), (3, "Cid")]);
        let mut store = FakeStore { fail_on: Some(3), ..Default::default() };

        let err = pipeline(CommitMode::AtEnd).run_and_close(&source, &mut store).await.unwrap_err();

        assert!(matches!(err, FetcherError::Storage(_)));
        assert_eq!(err.exit_code(), 3);
        assert!(store.committed.is_empty());
        assert_eq!(store.commits, 0);
        assert!(store.closed);
    }

    #[tokio::test]
    async fn test_per_item_commit_keeps_earlier_rows() {
        let source = FakeSource::with_people(&[(1, "Ann"), (2, "Bob"), (3, "Cid")]);
        let mut store = FakeStore { fail_on: Some(3), ..Default::default() };

        let result = pipeline(CommitMode::PerItem).run_and_close(&source, &mut store).await;

        assert!(result.is_err());
        assert_eq!(store.committed.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert!(store.closed);
    }

    #[tokio::test]
    async fn test_success_closes_store() {
        let source = FakeSource::with_people(&[(1, "Ann")]);
        let mut store = FakeStore::default();

        let summary = pipeline(CommitMode::AtEnd).run_and_close(&source, &mut store).await.unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(store.commits, 1);
        assert!(store.closed);
    }

    #[tokio::test]
    async fn test_populate_rejects_missing_api_key_before_io() {
        let config = FetcherConfig::default();
        let err = populate(&config).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
