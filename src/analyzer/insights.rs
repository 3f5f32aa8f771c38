// Business insights and playlist recommendations derived from the loaded table.
use crate::analyzer::stats;
use crate::analyzer::track_analysis::{TrackAnalyzer, values};
use crate::model::{AnalysisError, PopularityCategory, Track};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

pub const TOP_GENRES: usize = 5;
/// Tracks at or above this popularity count as hits for the duration insight.
pub const HIT_POPULARITY: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreScore {
    pub genre: String,
    pub mean_popularity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdealDuration {
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessInsights {
    /// Highest mean popularity first.
    pub top_genres: Vec<GenreScore>,
    pub ideal_duration: IdealDuration,
    /// Point-biserial correlation of the explicit flag with popularity.
    pub explicit_impact: Option<f64>,
    pub popularity_distribution: BTreeMap<PopularityCategory, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplicitGuidance {
    Moderate,
    Maintain,
}

impl ExplicitGuidance {
    pub fn label(&self) -> &'static str {
        match self {
            ExplicitGuidance::Moderate => "Moderate",
            ExplicitGuidance::Maintain => "Maintain",
        }
    }
}

/// Percent of a playlist drawn from each pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistSplit {
    pub popular: u8,
    pub trending: u8,
    pub discovery: u8,
}

impl Default for PlaylistSplit {
    fn default() -> Self {
        PlaylistSplit {
            popular: 40,
            trending: 30,
            discovery: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistComposition {
    pub recommended_genres: Vec<String>,
    pub ideal_duration: String,
    pub suggested_split: PlaylistSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentStrategy {
    pub explicit_content: ExplicitGuidance,
    pub duration_focus: String,
    pub diversity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub playlist: PlaylistComposition,
    pub content_strategy: ContentStrategy,
}

impl Recommendations {
    pub fn from_insights(insights: &BusinessInsights) -> Self {
        let explicit_content = match insights.explicit_impact {
            Some(r) if r < 0.0 => ExplicitGuidance::Moderate,
            _ => ExplicitGuidance::Maintain,
        };
        let ideal_duration = match insights.ideal_duration.mean {
            Some(minutes) => format!("{:.2} minutes", minutes),
            None => "n/a".to_string(),
        };

        Recommendations {
            playlist: PlaylistComposition {
                recommended_genres: insights.top_genres.iter().map(|g| g.genre.clone()).collect(),
                ideal_duration,
                suggested_split: PlaylistSplit::default(),
            },
            content_strategy: ContentStrategy {
                explicit_content,
                duration_focus: "Prioritize tracks between 2-4 minutes".to_string(),
                diversity: format!("Include at least {} different genres", insights.top_genres.len()),
            },
        }
    }
}

impl TrackAnalyzer {
    pub fn business_insights(&self) -> Result<BusinessInsights, AnalysisError> {
        let table = self.table()?;

        let mut top_genres: Vec<GenreScore> = table
            .by_genre()
            .into_iter()
            .filter_map(|(genre, tracks)| {
                Some(GenreScore {
                    genre: genre.to_string(),
                    mean_popularity: stats::mean(&values(&tracks, |t| t.popularity))?,
                })
            })
            .collect();
        top_genres.sort_by(|a, b| {
            b.mean_popularity
                .total_cmp(&a.mean_popularity)
                .then_with(|| a.genre.cmp(&b.genre))
        });
        top_genres.truncate(TOP_GENRES);

        let hits: Vec<&Track> = table
            .tracks()
            .iter()
            .filter(|t| t.popularity >= HIT_POPULARITY)
            .collect();
        let hit_durations = values(&hits, |t| t.duration_min);

        let flags: Vec<bool> = table.tracks().iter().map(|t| t.explicit).collect();
        let popularity: Vec<f64> = table.tracks().iter().map(|t| t.popularity).collect();

        let mut popularity_distribution: BTreeMap<PopularityCategory, usize> =
            PopularityCategory::ALL.iter().map(|&c| (c, 0)).collect();
        for track in table.tracks() {
            *popularity_distribution.entry(track.popularity_category).or_default() += 1;
        }

        let insights = BusinessInsights {
            top_genres,
            ideal_duration: IdealDuration {
                mean: stats::mean(&hit_durations),
                median: stats::median(&hit_durations),
            },
            explicit_impact: stats::point_biserial(&flags, &popularity),
            popularity_distribution,
        };
        debug!("Business insights: {:?}", insights);
        Ok(insights)
    }

    pub fn recommendations(&self) -> Result<Recommendations, AnalysisError> {
        Ok(Recommendations::from_insights(&self.business_insights()?))
    }
}
