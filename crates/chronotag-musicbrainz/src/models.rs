// SPDX-License-Identifier: GPL-3.0-or-later

use chronotag_domain::leading_year;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recording search response. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordingSearchResponse {
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

/// Recording (track) returned by a search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recording {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    /// Search score (0-100).
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub releases: Vec<ReleaseRef>,
}

/// Release a recording appears on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseRef {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    /// Release date (YYYY, YYYY-MM, or YYYY-MM-DD).
    #[serde(default)]
    pub date: Option<String>,
}

/// Every parseable release year across all recordings of a search response.
pub fn years_from_search(response: &RecordingSearchResponse) -> Vec<i32> {
    response
        .recordings
        .iter()
        .flat_map(|recording| recording.releases.iter())
        .filter_map(|release| release.date.as_deref())
        .filter_map(leading_year)
        .collect()
}

/// Search query parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Lucene query string.
    pub query: String,
    /// Maximum number of results (default 25, max 100).
    pub limit: Option<u32>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
        }
    }

    /// Query for a recording: the title as a free-text phrase, the artist as a field filter.
    ///
    /// Both values must be non-empty; callers check this before searching.
    pub fn recording(title: &str, artist: &str) -> Self {
        Self::new(format!(
            "\"{}\" AND artist:\"{}\"",
            escape_phrase(title.trim()),
            escape_phrase(artist.trim())
        ))
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

fn escape_phrase(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> RecordingSearchResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn recording_query_combines_title_and_artist_filter() {
        let query = SearchQuery::recording("Song B", "Artist A");
        assert_eq!(query.query, "\"Song B\" AND artist:\"Artist A\"");
    }

    #[test]
    fn recording_query_escapes_quotes() {
        let query = SearchQuery::recording("The \"Hit\"", "AC\\DC");
        assert_eq!(query.query, "\"The \\\"Hit\\\"\" AND artist:\"AC\\\\DC\"");
    }

    #[test]
    fn years_collected_across_recordings_and_releases() {
        let response = parse(serde_json::json!({
            "recordings": [
                {"title": "Song B", "releases": [{"date": "2005"}, {"date": "2011-06-01"}]},
                {"title": "Song B (live)", "releases": [{"date": "2003-09"}]}
            ]
        }));

        let mut years = years_from_search(&response);
        years.sort();
        assert_eq!(years, vec![2003, 2005, 2011]);
    }

    #[test]
    fn unparseable_and_missing_dates_are_ignored() {
        let response = parse(serde_json::json!({
            "recordings": [
                {"releases": [{"date": ""}, {"date": "unknown"}, {"title": "No date"}]},
                {"title": "No releases"}
            ]
        }));

        assert!(years_from_search(&response).is_empty());
    }

    #[test]
    fn missing_recordings_yields_no_years() {
        let response = parse(serde_json::json!({"created": "2026-01-08T12:00:00.000Z"}));
        assert!(years_from_search(&response).is_empty());
    }
}
