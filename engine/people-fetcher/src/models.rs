use crate::transform::{extract_nationality, extract_year, profile_photo_url};
use serde::{Deserialize, Serialize};

/// TMDb `/person/popular` response page
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PopularPeoplePage {
    #[serde(default)]
    pub page: Option<u32>,

    #[serde(default)]
    pub results: Vec<PersonSummary>,

    #[serde(default)]
    pub total_pages: Option<u32>,

    #[serde(default)]
    pub total_results: Option<u32>,
}

/// Entry in the popular people listing
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PersonSummary {
    pub id: Option<i64>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub known_for_department: Option<String>,

    #[serde(default)]
    pub popularity: Option<f64>,
}

impl PersonSummary {
    /// Identifier to look up, if the entry carries a usable one
    pub fn person_id(&self) -> Option<i64> {
        self.id.filter(|id| *id != 0)
    }
}

/// TMDb `/person/{id}` response
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PersonDetails {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: Option<String>,

    /// `YYYY-MM-DD`
    #[serde(default)]
    pub birthday: Option<String>,

    /// `YYYY-MM-DD`
    #[serde(default)]
    pub deathday: Option<String>,

    #[serde(default)]
    pub profile_path: Option<String>,

    #[serde(default)]
    pub biography: Option<String>,

    #[serde(default)]
    pub place_of_birth: Option<String>,
}

/// Row in the `people` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    pub id: i64,
    pub name: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub photo: Option<String>,
    pub bio: Option<String>,
    /// Last segment of the place of birth. A heuristic label, not validated
    /// against any list of countries.
    pub nationality: Option<String>,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Entries returned by the listing
    pub listed: usize,

    /// Rows newly written
    pub inserted: usize,

    /// Rows whose id was already stored and left untouched
    pub already_present: usize,

    /// Entries without an id or whose detail request failed
    pub skipped: usize,
}

impl PersonDetails {
    /// Convert to database record
    ///
    /// `fallback_id` is the listing id, used when the detail body omits its own.
    pub fn to_person_record(&self, fallback_id: i64, image_base_url: &str) -> PersonRecord {
        PersonRecord {
            id: self.id.filter(|id| *id != 0).unwrap_or(fallback_id),
            name: self.name.clone(),
            birth_year: extract_year(self.birthday.as_deref()),
            death_year: extract_year(self.deathday.as_deref()),
            photo: profile_photo_url(image_base_url, self.profile_path.as_deref()),
            bio: self.biography.clone(),
            nationality: extract_nationality(self.place_of_birth.as_deref()),
        }
    }
}
