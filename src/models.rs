use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const NO_IMAGE: &str = "No Image";
pub const NOT_AVAILABLE: &str = "N/A";

/// A movie as the catalog API returns it. Only `id` is required; every field we
/// do not model is kept in `extra` so the record survives a round trip intact.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieRecord {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MovieRecord {
    pub fn new(id: i64, title: &str) -> Self {
        Self {
            id,
            title: Some(title.to_string()),
            poster_path: None,
            release_date: None,
            vote_average: None,
            extra: Map::new(),
        }
    }
}

/// The persisted projection of a favourited movie.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<&MovieRecord> for MovieSummary {
    fn from(movie: &MovieRecord) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone().unwrap_or_default(),
            poster_path: movie.poster_path.clone(),
            release_date: movie.release_date.clone(),
            vote_average: movie.vote_average,
        }
    }
}

/// One page of movie records plus the pagination metadata.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MoviePage {
    #[serde(default)]
    pub results: Vec<MovieRecord>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl MoviePage {
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// View model for a single movie tile, with placeholders already applied.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MovieCard {
    pub id: i64,
    pub title: String,
    pub poster_url: Option<String>,
    pub poster_placeholder: Option<&'static str>,
    pub release_date: String,
    pub year: String,
    pub rating: String,
    pub favourite: bool,
}

impl MovieCard {
    pub fn new(
        id: i64,
        title: Option<&str>,
        poster_path: Option<&str>,
        release_date: Option<&str>,
        vote_average: Option<f64>,
        favourite: bool,
    ) -> Self {
        let poster_url = poster_url(poster_path);
        Self {
            id,
            title: title.unwrap_or_default().to_string(),
            poster_placeholder: poster_url.is_none().then_some(NO_IMAGE),
            poster_url,
            release_date: release_date.unwrap_or_default().to_string(),
            year: year_label(release_date),
            rating: rating_label(vote_average),
            favourite,
        }
    }

    pub fn from_record(movie: &MovieRecord, favourite: bool) -> Self {
        Self::new(
            movie.id,
            movie.title.as_deref(),
            movie.poster_path.as_deref(),
            movie.release_date.as_deref(),
            movie.vote_average,
            favourite,
        )
    }

    pub fn from_summary(movie: &MovieSummary) -> Self {
        Self::new(
            movie.id,
            Some(&movie.title),
            movie.poster_path.as_deref(),
            movie.release_date.as_deref(),
            movie.vote_average,
            true,
        )
    }
}

pub fn poster_url(path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{POSTER_BASE}{p}"))
}

pub fn year_label(date: Option<&str>) -> String {
    date.and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .map(|y| y.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

// A zero rating means "not rated yet" upstream.
pub fn rating_label(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(v) if v != 0.0 => format!("{v:.1}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_tolerates_missing_fields_and_keeps_extras() {
        let value = json!({ "id": 7, "overview": "text", "genre_ids": [18] });
        let record: MovieRecord = serde_json::from_value(value.clone()).expect("record");
        assert_eq!(record.id, 7);
        assert!(record.title.is_none());
        assert!(record.poster_path.is_none());
        assert_eq!(record.extra.get("overview"), Some(&json!("text")));

        let back = serde_json::to_value(&record).expect("serialize");
        assert_eq!(back.get("genre_ids"), Some(&json!([18])));
    }

    #[test]
    fn summary_keeps_only_the_five_fields() {
        let record: MovieRecord = serde_json::from_value(json!({
            "id": 5,
            "title": "X",
            "poster_path": "/x.jpg",
            "release_date": "2020-01-01",
            "vote_average": 7.25,
            "popularity": 99.0
        }))
        .expect("record");
        let summary = MovieSummary::from(&record);
        let value = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": 5,
                "title": "X",
                "poster_path": "/x.jpg",
                "release_date": "2020-01-01",
                "vote_average": 7.25
            })
        );
    }

    #[test]
    fn card_uses_placeholders_for_unknown_values() {
        let card = MovieCard::from_record(&MovieRecord::new(1, "Untitled"), false);
        assert_eq!(card.poster_url, None);
        assert_eq!(card.poster_placeholder, Some(NO_IMAGE));
        assert_eq!(card.year, NOT_AVAILABLE);
        assert_eq!(card.rating, NOT_AVAILABLE);
    }

    #[test]
    fn card_formats_known_values() {
        let mut record = MovieRecord::new(2, "Dune");
        record.poster_path = Some("/dune.jpg".to_string());
        record.release_date = Some("2021-09-15".to_string());
        record.vote_average = Some(7.78);
        let card = MovieCard::from_record(&record, true);
        assert_eq!(
            card.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/dune.jpg")
        );
        assert_eq!(card.poster_placeholder, None);
        assert_eq!(card.year, "2021");
        assert_eq!(card.rating, "7.8");
        assert!(card.favourite);
    }

    #[test]
    fn labels_treat_empty_and_zero_as_unknown() {
        assert_eq!(year_label(Some("")), NOT_AVAILABLE);
        assert_eq!(rating_label(Some(0.0)), NOT_AVAILABLE);
        assert_eq!(poster_url(Some("")), None);
    }

    #[test]
    fn page_reports_more_until_last() {
        let page: MoviePage =
            serde_json::from_value(json!({ "results": [], "page": 1, "total_pages": 2 }))
                .expect("page");
        assert!(page.has_more());
        let empty: MoviePage = serde_json::from_value(json!({})).expect("page");
        assert!(!empty.has_more());
        assert!(empty.results.is_empty());
    }
}
