// Core structs: Track, TrackTable, categories and error types
use crate::utils::deserialize_flag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One row of the cleaned dataset, as read from disk. Extra columns are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackRecord {
    #[serde(alias = "track_id")]
    pub id: String,
    #[serde(alias = "track_genre")]
    pub genre: String,
    pub popularity: f64,
    pub duration_min: f64,
    #[serde(deserialize_with = "deserialize_flag")]
    pub explicit: bool,
}

/// Fixed-width bins over the popularity score: 0,20,40,60,80,100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PopularityCategory {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl PopularityCategory {
    pub const ALL: [PopularityCategory; 5] = [
        PopularityCategory::VeryLow,
        PopularityCategory::Low,
        PopularityCategory::Medium,
        PopularityCategory::High,
        PopularityCategory::VeryHigh,
    ];

    /// Upper edges are inclusive. Zero lands in the first bin, anything above 80 in the last.
    pub fn from_score(score: f64) -> Self {
        if score <= 20.0 {
            PopularityCategory::VeryLow
        } else if score <= 40.0 {
            PopularityCategory::Low
        } else if score <= 60.0 {
            PopularityCategory::Medium
        } else if score <= 80.0 {
            PopularityCategory::High
        } else {
            PopularityCategory::VeryHigh
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PopularityCategory::VeryLow => "Very Low",
            PopularityCategory::Low => "Low",
            PopularityCategory::Medium => "Medium",
            PopularityCategory::High => "High",
            PopularityCategory::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for PopularityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bins over duration in minutes: 0,2,3,4,5,inf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DurationCategory {
    #[serde(rename = "Very Short")]
    VeryShort,
    Short,
    Medium,
    Long,
    #[serde(rename = "Very Long")]
    VeryLong,
}

impl DurationCategory {
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes <= 2.0 {
            DurationCategory::VeryShort
        } else if minutes <= 3.0 {
            DurationCategory::Short
        } else if minutes <= 4.0 {
            DurationCategory::Medium
        } else if minutes <= 5.0 {
            DurationCategory::Long
        } else {
            DurationCategory::VeryLong
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DurationCategory::VeryShort => "Very Short",
            DurationCategory::Short => "Short",
            DurationCategory::Medium => "Medium",
            DurationCategory::Long => "Long",
            DurationCategory::VeryLong => "Very Long",
        }
    }
}

impl fmt::Display for DurationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A track with its derived categories.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub genre: String,
    pub popularity: f64,
    pub duration_min: f64,
    pub explicit: bool,
    pub popularity_category: PopularityCategory,
    pub duration_category: DurationCategory,
}

impl From<TrackRecord> for Track {
    fn from(record: TrackRecord) -> Self {
        Track {
            popularity_category: PopularityCategory::from_score(record.popularity),
            duration_category: DurationCategory::from_minutes(record.duration_min),
            id: record.id,
            genre: record.genre,
            popularity: record.popularity,
            duration_min: record.duration_min,
            explicit: record.explicit,
        }
    }
}

/// The in-memory table an analysis session works on. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct TrackTable {
    tracks: Vec<Track>,
}

impl TrackTable {
    pub fn from_records(records: impl IntoIterator<Item = TrackRecord>) -> Self {
        Self {
            tracks: records.into_iter().map(Track::from).collect(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks grouped by genre, genres in lexical order.
    pub fn by_genre(&self) -> BTreeMap<&str, Vec<&Track>> {
        let mut groups: BTreeMap<&str, Vec<&Track>> = BTreeMap::new();
        for track in &self.tracks {
            groups.entry(track.genre.as_str()).or_default().push(track);
        }
        groups
    }
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("input file {} not found. Place the raw tracks CSV at {}", .path.display(), .path.display())]
    MissingInput { path: PathBuf },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed row at line {line}: expected {expected} fields, found {found}")]
    MalformedRow { line: u64, expected: usize, found: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("sample is empty")]
    EmptySample,
    #[error("at least two groups are required, got {0}")]
    NotEnoughGroups(usize),
    #[error("not enough observations for {groups} groups: {observations}")]
    NotEnoughObservations { groups: usize, observations: usize },
    #[error("within-group variance is zero")]
    ZeroVariance,
    #[error("distribution error: {0}")]
    Distribution(String),
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("drawing error: {0}")]
    Draw(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("track table is not loaded, call load() first")]
    NotLoaded,
    #[error("{operation} failed: {source}")]
    Computation {
        operation: &'static str,
        #[source]
        source: StatsError,
    },
    #[error("failed to write {operation} chart: {source}")]
    Chart {
        operation: &'static str,
        #[source]
        source: ChartError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
