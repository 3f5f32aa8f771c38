use crate::analyzer::stats::{self, AnovaResult, ChiSquareResult, Summary};
use crate::chart::{
    ACCENT, Axis, BarTrace, BoxVisibility, Chart, ErrorBars, FOREGROUND, HeatmapTrace, Line, Marker, MarkerColor,
    ScatterTrace, Series, Trace, ViolinTrace, accent_scale,
};
use crate::model::{AnalysisError, PopularityCategory, StatsError, Track, TrackRecord, TrackTable};
use crate::utils::round2;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::report::Operation;

/// Genres with fewer tracks are left out of the popularity scatter.
pub const MIN_GENRE_TRACKS: usize = 5;
/// Genres with fewer tracks are left out of the explicit-content ranking.
pub const MIN_EXPLICIT_TRACKS: usize = 10;
pub const TOP_EXPLICIT_GENRES: usize = 10;
pub const CONFIDENCE_LEVEL: f64 = 0.95;

const CORRELATION_LABELS: [&str; 2] = ["Popularity", "Duration (min)"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenrePopularity {
    pub genre: String,
    pub popularity_mean: f64,
    pub popularity_std: Option<f64>,
    pub track_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplicitShare {
    pub genre: String,
    pub explicit_fraction: f64,
    pub explicit_percentage: f64,
    pub track_count: usize,
}

/// Aggregates for one popularity category. Means are absent when the category is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularityTrend {
    pub category: PopularityCategory,
    pub track_count: usize,
    pub count_percentage: f64,
    pub mean_duration: Option<f64>,
    pub explicit_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub variables: Vec<String>,
    pub correlations: Vec<Vec<f64>>,
    pub anova: AnovaResult,
    pub chi2: ChiSquareResult,
    /// Share of each popularity category within a genre, in percent.
    pub genre_trends: BTreeMap<String, BTreeMap<PopularityCategory, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreSuccess {
    pub genre: String,
    pub popularity_mean: f64,
    pub popularity_std: Option<f64>,
    pub track_count: usize,
    pub duration_mean: f64,
    pub explicit_mean: f64,
    /// Half-width of the 95% interval around `popularity_mean`.
    pub ci_95: Option<f64>,
}

/// An analysis session over the cleaned tracks table.
pub struct TrackAnalyzer {
    data_path: PathBuf,
    visualization_dir: PathBuf,
    table: Option<TrackTable>,
}

impl TrackAnalyzer {
    /// Binds the cleaned-table path and creates the artifact directory.
    pub fn new(data_path: impl Into<PathBuf>, visualization_dir: impl Into<PathBuf>) -> Result<Self, AnalysisError> {
        let visualization_dir = visualization_dir.into();
        fs::create_dir_all(&visualization_dir)?;
        info!("Visualization directory ready at {}", visualization_dir.display());

        Ok(Self {
            data_path: data_path.into(),
            visualization_dir,
            table: None,
        })
    }

    /// A session that is already loaded with `table`.
    pub fn from_table(table: TrackTable, visualization_dir: impl Into<PathBuf>) -> Result<Self, AnalysisError> {
        let mut analyzer = Self::new(PathBuf::new(), visualization_dir)?;
        analyzer.table = Some(table);
        Ok(analyzer)
    }

    pub fn visualization_dir(&self) -> &Path {
        &self.visualization_dir
    }

    /// Reads the cleaned CSV, derives the category fields and keeps the table.
    pub fn load(&mut self) -> Result<&TrackTable, AnalysisError> {
        info!("Loading processed data from {}", self.data_path.display());
        let mut reader = csv::Reader::from_path(&self.data_path)?;
        let records = reader
            .deserialize::<TrackRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        let table = TrackTable::from_records(records);
        info!("Loaded {} tracks", table.len());

        Ok(&*self.table.insert(table))
    }

    pub fn table(&self) -> Result<&TrackTable, AnalysisError> {
        self.table.as_ref().ok_or(AnalysisError::NotLoaded)
    }

    pub fn genre_popularity_stats(&self) -> Result<Vec<GenrePopularity>, AnalysisError> {
        let table = self.table()?;
        let rows = table
            .by_genre()
            .into_iter()
            .filter(|(_, tracks)| tracks.len() >= MIN_GENRE_TRACKS)
            .filter_map(|(genre, tracks)| {
                let popularity = values(&tracks, |t| t.popularity);
                Some(GenrePopularity {
                    genre: genre.to_string(),
                    popularity_mean: round2(stats::mean(&popularity)?),
                    popularity_std: stats::sample_std(&popularity).map(round2),
                    track_count: tracks.len(),
                })
            })
            .collect::<Vec<_>>();
        debug!("{} genres with at least {} tracks", rows.len(), MIN_GENRE_TRACKS);
        Ok(rows)
    }

    pub fn analyze_genre_popularity(&self) -> Result<(Vec<GenrePopularity>, Chart), AnalysisError> {
        let rows = self.genre_popularity_stats()?;
        let chart = genre_popularity_chart(&rows);
        Ok((rows, chart))
    }

    /// Genres ranked by explicit share, most explicit first, at most ten.
    pub fn explicit_by_genre_stats(&self) -> Result<Vec<ExplicitShare>, AnalysisError> {
        let table = self.table()?;
        let mut shares: Vec<ExplicitShare> = table
            .by_genre()
            .into_iter()
            .filter(|(_, tracks)| tracks.len() >= MIN_EXPLICIT_TRACKS)
            .map(|(genre, tracks)| {
                let explicit = tracks.iter().filter(|t| t.explicit).count();
                let fraction = explicit as f64 / tracks.len() as f64;
                ExplicitShare {
                    genre: genre.to_string(),
                    explicit_fraction: fraction,
                    explicit_percentage: fraction * 100.0,
                    track_count: tracks.len(),
                }
            })
            .collect();

        shares.sort_by(|a, b| {
            b.explicit_percentage
                .total_cmp(&a.explicit_percentage)
                .then_with(|| a.genre.cmp(&b.genre))
        });
        shares.truncate(TOP_EXPLICIT_GENRES);
        Ok(shares)
    }

    pub fn analyze_explicit_by_genre(&self) -> Result<(Vec<ExplicitShare>, Chart), AnalysisError> {
        let shares = self.explicit_by_genre_stats()?;
        let chart = explicit_chart(&shares);
        Ok((shares, chart))
    }

    pub fn duration_summary(&self) -> Result<Summary, AnalysisError> {
        let table = self.table()?;
        let durations: Vec<f64> = table.tracks().iter().map(|t| t.duration_min).collect();
        stats::describe(&durations).ok_or_else(|| failed(Operation::DurationDistribution)(StatsError::EmptySample))
    }

    pub fn analyze_duration_distribution(&self) -> Result<Chart, AnalysisError> {
        let table = self.table()?;
        Ok(duration_chart(table.tracks().iter().map(|t| t.duration_min).collect()))
    }

    /// One entry per popularity category, in category order, empty ones included.
    pub fn popularity_trends_stats(&self) -> Result<Vec<PopularityTrend>, AnalysisError> {
        let table = self.table()?;
        let total = table.len();

        Ok(PopularityCategory::ALL
            .iter()
            .map(|&category| {
                let members: Vec<&Track> = table
                    .tracks()
                    .iter()
                    .filter(|t| t.popularity_category == category)
                    .collect();
                let explicit = values(&members, |t| if t.explicit { 1.0 } else { 0.0 });
                PopularityTrend {
                    category,
                    track_count: members.len(),
                    count_percentage: if total == 0 {
                        0.0
                    } else {
                        members.len() as f64 / total as f64 * 100.0
                    },
                    mean_duration: stats::mean(&values(&members, |t| t.duration_min)),
                    explicit_percentage: stats::mean(&explicit).map(|m| m * 100.0),
                }
            })
            .collect())
    }

    pub fn analyze_popularity_trends(&self) -> Result<(Vec<PopularityTrend>, Chart), AnalysisError> {
        let trends = self.popularity_trends_stats()?;
        let chart = popularity_trends_chart(&trends);
        Ok((trends, chart))
    }

    /// Pearson matrix, ANOVA across genres, chi-square of genre vs explicit and
    /// per-genre category shares.
    pub fn correlation_report(&self) -> Result<CorrelationReport, AnalysisError> {
        let table = self.table()?;
        let fail = failed(Operation::Correlations);
        if table.is_empty() {
            return Err(fail(StatsError::EmptySample));
        }

        let popularity: Vec<f64> = table.tracks().iter().map(|t| t.popularity).collect();
        let durations: Vec<f64> = table.tracks().iter().map(|t| t.duration_min).collect();
        let r = stats::compute_correlation(&popularity, &durations).ok_or_else(|| fail(StatsError::ZeroVariance))?;

        let groups = table.by_genre();
        let popularity_by_genre: Vec<Vec<f64>> = groups.values().map(|tracks| values(tracks, |t| t.popularity)).collect();
        let anova = stats::one_way_anova(&popularity_by_genre).map_err(&fail)?;
        let chi2 = stats::chi2_contingency(&explicit_contingency(&groups)).map_err(&fail)?;

        let genre_trends = groups
            .iter()
            .map(|(genre, tracks)| {
                let shares = PopularityCategory::ALL
                    .iter()
                    .map(|&category| {
                        let count = tracks.iter().filter(|t| t.popularity_category == category).count();
                        (category, count as f64 / tracks.len() as f64 * 100.0)
                    })
                    .collect();
                (genre.to_string(), shares)
            })
            .collect();

        Ok(CorrelationReport {
            variables: vec!["popularity".to_string(), "duration_min".to_string()],
            correlations: vec![vec![1.0, r], vec![r, 1.0]],
            anova,
            chi2,
            genre_trends,
        })
    }

    pub fn analyze_correlations(&self) -> Result<(CorrelationReport, Chart), AnalysisError> {
        let report = self.correlation_report()?;
        let chart = correlation_chart(&report);
        Ok((report, chart))
    }

    /// Per-genre success metrics, rounded to two decimals, with a normal 95% interval.
    pub fn genre_success_stats(&self) -> Result<Vec<GenreSuccess>, AnalysisError> {
        let table = self.table()?;
        let mut rows = Vec::new();

        for (genre, tracks) in table.by_genre() {
            let popularity = values(&tracks, |t| t.popularity);
            let (Some(popularity_mean), Some(duration_mean), Some(explicit_mean)) = (
                stats::mean(&popularity),
                stats::mean(&values(&tracks, |t| t.duration_min)),
                stats::mean(&values(&tracks, |t| if t.explicit { 1.0 } else { 0.0 })),
            ) else {
                continue;
            };

            let popularity_mean = round2(popularity_mean);
            let popularity_std = stats::sample_std(&popularity).map(round2);
            let ci_95 = popularity_std
                .map(|std| stats::normal_ci_half_width(std, tracks.len(), CONFIDENCE_LEVEL))
                .transpose()
                .map_err(failed(Operation::SuccessFactors))?;

            rows.push(GenreSuccess {
                genre: genre.to_string(),
                popularity_mean,
                popularity_std,
                track_count: tracks.len(),
                duration_mean: round2(duration_mean),
                explicit_mean: round2(explicit_mean),
                ci_95,
            });
        }
        Ok(rows)
    }

    pub fn analyze_genre_success_factors(&self) -> Result<(Vec<GenreSuccess>, Chart), AnalysisError> {
        let rows = self.genre_success_stats()?;
        let chart = success_chart(&rows);
        Ok((rows, chart))
    }
}

/// Maps a statistics failure to an analysis error carrying the operation name.
pub(crate) fn failed(operation: Operation) -> impl Fn(StatsError) -> AnalysisError {
    move |source| AnalysisError::Computation {
        operation: operation.name(),
        source,
    }
}

pub(crate) fn values(tracks: &[&Track], field: impl Fn(&Track) -> f64) -> Vec<f64> {
    tracks.iter().map(|t| field(t)).collect()
}

/// Genre x explicit counts. Columns nobody falls into are left out.
fn explicit_contingency(groups: &BTreeMap<&str, Vec<&Track>>) -> Vec<Vec<f64>> {
    let counts: Vec<[f64; 2]> = groups
        .values()
        .map(|tracks| {
            let explicit = tracks.iter().filter(|t| t.explicit).count();
            [(tracks.len() - explicit) as f64, explicit as f64]
        })
        .collect();
    let present: Vec<usize> = (0..2).filter(|&col| counts.iter().any(|row| row[col] > 0.0)).collect();

    counts
        .iter()
        .map(|row| present.iter().map(|&col| row[col]).collect())
        .collect()
}

fn genre_popularity_chart(rows: &[GenrePopularity]) -> Chart {
    let means: Vec<f64> = rows.iter().map(|r| r.popularity_mean).collect();
    let max_count = rows.iter().map(|r| r.track_count).max().unwrap_or(1).max(1) as f64;
    let sizes = rows
        .iter()
        .map(|r| 10.0 + 30.0 * r.track_count as f64 / max_count)
        .collect();

    let mut chart = Chart::new("Popularity vs. Track Count by Genre").with_trace(Trace::Scatter(ScatterTrace {
        name: "Genres".to_string(),
        x: Series::Numbers(means.clone()),
        y: rows.iter().map(|r| Some(r.track_count as f64)).collect(),
        mode: "markers".to_string(),
        marker: Some(Marker {
            color: Some(MarkerColor::Values(means)),
            size: Some(sizes),
            colorscale: Some(accent_scale()),
            showscale: Some(true),
            line: Some(Line {
                color: Some(ACCENT.to_string()),
                width: Some(1.0),
            }),
        }),
        line: None,
        customdata: Some(rows.iter().map(|r| r.genre.clone()).collect()),
        hovertemplate: Some(
            "Genre: %{customdata}<br>Mean popularity: %{x:.1f}<br>Tracks: %{y}<extra></extra>".to_string(),
        ),
        yaxis: None,
    }));
    chart.layout.xaxis = Some(Axis::titled("Mean popularity"));
    chart.layout.yaxis = Some(Axis::titled("Track count"));
    chart
}

fn explicit_chart(shares: &[ExplicitShare]) -> Chart {
    let mut chart = Chart::new("Explicit Content Share by Genre (Top 10)").with_trace(Trace::Bar(BarTrace {
        name: "Explicit tracks (%)".to_string(),
        x: Series::Labels(shares.iter().map(|s| s.genre.clone()).collect()),
        y: shares.iter().map(|s| s.explicit_percentage).collect(),
        marker: Some(solid(ACCENT)),
        error_y: None,
        yaxis: None,
    }));
    chart.layout.xaxis = Some(Axis::titled("Genre"));
    chart.layout.yaxis = Some(Axis::titled("Explicit tracks (%)"));
    chart
}

fn duration_chart(durations: Vec<f64>) -> Chart {
    let mut chart = Chart::new("Track Duration Distribution").with_trace(Trace::Violin(ViolinTrace {
        name: "Distribution".to_string(),
        y: durations,
        box_plot: BoxVisibility { visible: true },
        line: Some(Line {
            color: Some(ACCENT.to_string()),
            width: None,
        }),
        fillcolor: Some("rgba(29, 185, 84, 0.3)".to_string()),
    }));
    chart.layout.yaxis = Some(Axis::titled("Duration (minutes)"));
    chart.layout.showlegend = Some(false);
    chart
}

fn popularity_trends_chart(trends: &[PopularityTrend]) -> Chart {
    let labels: Vec<String> = trends.iter().map(|t| t.category.label().to_string()).collect();

    let mut chart = Chart::new("Popularity vs. Duration")
        .with_trace(Trace::Bar(BarTrace {
            name: "% of all tracks".to_string(),
            x: Series::Labels(labels.clone()),
            y: trends.iter().map(|t| t.count_percentage).collect(),
            marker: Some(solid(ACCENT)),
            error_y: None,
            yaxis: Some("y".to_string()),
        }))
        .with_trace(Trace::Scatter(ScatterTrace {
            name: "Mean duration (min)".to_string(),
            x: Series::Labels(labels),
            y: trends.iter().map(|t| t.mean_duration).collect(),
            mode: "lines+markers".to_string(),
            marker: None,
            line: Some(Line {
                color: Some(FOREGROUND.to_string()),
                width: None,
            }),
            customdata: None,
            hovertemplate: None,
            yaxis: Some("y2".to_string()),
        }));
    chart.layout.xaxis = Some(Axis::titled("Popularity category"));
    chart.layout.yaxis = Some(Axis::titled("Share of tracks (%)"));
    chart.layout.yaxis2 = Some(Axis::secondary("Mean duration (min)"));
    chart.layout.barmode = Some("group".to_string());
    chart
}

fn correlation_chart(report: &CorrelationReport) -> Chart {
    let labels: Vec<String> = CORRELATION_LABELS.iter().map(|l| l.to_string()).collect();

    let mut chart = Chart::new("Correlation Matrix").with_trace(Trace::Heatmap(HeatmapTrace {
        x: labels.clone(),
        y: labels,
        z: report.correlations.clone(),
        colorscale: accent_scale(),
        showscale: true,
        texttemplate: Some("%{z:.2f}".to_string()),
        hovertemplate: Some("%{x} x %{y}<br>Correlation: %{z:.2f}<extra></extra>".to_string()),
    }));
    chart.layout.xaxis = Some(Axis::titled("Variables"));
    chart.layout.yaxis = Some(Axis::titled("Variables"));
    chart.layout.width = Some(600);
    chart.layout.height = Some(500);
    chart
}

fn success_chart(rows: &[GenreSuccess]) -> Chart {
    let genres: Vec<String> = rows.iter().map(|r| r.genre.clone()).collect();

    let mut chart = Chart::new("Genre Success Factors")
        .with_trace(Trace::Bar(BarTrace {
            name: "Mean popularity".to_string(),
            x: Series::Labels(genres.clone()),
            y: rows.iter().map(|r| r.popularity_mean).collect(),
            marker: Some(solid(ACCENT)),
            error_y: Some(ErrorBars {
                kind: "data".to_string(),
                array: rows.iter().map(|r| r.ci_95.unwrap_or(0.0)).collect(),
                visible: true,
                color: Some(FOREGROUND.to_string()),
            }),
            yaxis: None,
        }))
        .with_trace(Trace::Scatter(ScatterTrace {
            name: "Mean duration (min)".to_string(),
            x: Series::Labels(genres),
            y: rows.iter().map(|r| Some(r.duration_mean)).collect(),
            mode: "lines+markers".to_string(),
            marker: None,
            line: Some(Line {
                color: Some(FOREGROUND.to_string()),
                width: None,
            }),
            customdata: None,
            hovertemplate: None,
            yaxis: Some("y2".to_string()),
        }));
    chart.layout.yaxis = Some(Axis::titled("Mean popularity"));
    chart.layout.yaxis2 = Some(Axis::secondary("Mean duration (min)"));
    chart.layout.showlegend = Some(true);
    chart
}

fn solid(color: &str) -> Marker {
    Marker {
        color: Some(MarkerColor::Solid(color.to_string())),
        ..Default::default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    pub(crate) fn record(id: usize, genre: &str, popularity: f64, duration_min: f64, explicit: bool) -> TrackRecord {
        TrackRecord {
            id: format!("t{}", id),
            genre: genre.to_string(),
            popularity,
            duration_min,
            explicit,
        }
    }

    /// Genre "a" has five tracks at mean popularity 80, "b" has twelve, "c" three.
    pub(crate) fn sample_table() -> TrackTable {
        let mut records = Vec::new();
        for (i, p) in [70.0, 75.0, 80.0, 85.0, 90.0].into_iter().enumerate() {
            records.push(record(i, "a", p, 3.0 + i as f64 * 0.1, false));
        }
        for i in 0..12 {
            records.push(record(100 + i, "b", 20.0 + i as f64 * 3.0, 2.0 + i as f64 * 0.25, i % 3 == 0));
        }
        for i in 0..3 {
            records.push(record(200 + i, "c", 50.0 + i as f64, 4.5, true));
        }
        TrackTable::from_records(records)
    }

    fn analyzer(dir: &Path) -> TrackAnalyzer {
        TrackAnalyzer::from_table(sample_table(), dir.join("viz")).unwrap()
    }

    #[test]
    fn operations_fail_before_load() {
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::new(dir.path().join("missing.csv"), dir.path().join("viz")).unwrap();
        assert!(dir.path().join("viz").is_dir());
        assert!(matches!(analyzer.genre_popularity_stats(), Err(AnalysisError::NotLoaded)));
        assert!(matches!(analyzer.analyze_correlations(), Err(AnalysisError::NotLoaded)));
    }

    #[test]
    fn load_reads_cleaned_csv_and_derives_categories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.csv");
        fs::write(
            &path,
            "track_id,track_genre,popularity,duration_ms,duration_min,explicit\n\
             x,pop,0,120000,2.0,False\n\
             y,pop,81,300000,5.0,True\n",
        )
        .unwrap();

        let mut analyzer = TrackAnalyzer::new(&path, dir.path().join("viz")).unwrap();
        let table = analyzer.load().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.tracks()[0].popularity_category, PopularityCategory::VeryLow);
        assert_eq!(table.tracks()[1].popularity_category, PopularityCategory::VeryHigh);
        assert!(table.tracks()[1].explicit);
    }

    #[test]
    fn genre_popularity_keeps_genres_with_five_tracks() {
        let dir = tempdir().unwrap();
        let rows = analyzer(dir.path()).genre_popularity_stats().unwrap();

        assert!(rows.iter().all(|r| r.track_count >= MIN_GENRE_TRACKS));
        assert!(rows.iter().all(|r| r.genre != "c"));
        let a = rows.iter().find(|r| r.genre == "a").unwrap();
        assert_eq!(a.popularity_mean, 80.0);
        assert_eq!(a.track_count, 5);
        assert_eq!(a.popularity_std, Some(7.91));
    }

    #[test]
    fn explicit_ranking_filters_sorts_and_truncates() {
        let mut records = Vec::new();
        for g in 0..12 {
            for i in 0..10 {
                records.push(record(g * 100 + i, &format!("g{:02}", g), 50.0, 3.0, i < g.min(10)));
            }
        }
        for i in 0..9 {
            records.push(record(5000 + i, "tiny", 50.0, 3.0, true));
        }
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::from_table(TrackTable::from_records(records), dir.path()).unwrap();

        let shares = analyzer.explicit_by_genre_stats().unwrap();
        assert_eq!(shares.len(), TOP_EXPLICIT_GENRES);
        assert!(shares.iter().all(|s| s.track_count >= MIN_EXPLICIT_TRACKS && s.genre != "tiny"));
        assert!(shares.windows(2).all(|w| w[0].explicit_percentage >= w[1].explicit_percentage));
        // g10 and g11 both sit at 100%, ties go by name
        assert_eq!(shares[0].genre, "g10");
        assert_eq!(shares[1].genre, "g11");
    }

    #[test]
    fn popularity_trends_cover_every_category() {
        let dir = tempdir().unwrap();
        let trends = analyzer(dir.path()).popularity_trends_stats().unwrap();

        assert_eq!(trends.len(), 5);
        let total: f64 = trends.iter().map(|t| t.count_percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
        for trend in &trends {
            assert_eq!(trend.mean_duration.is_none(), trend.track_count == 0);
        }
    }

    #[test]
    fn correlation_report_has_unit_diagonal_and_all_tests() {
        let dir = tempdir().unwrap();
        let (report, chart) = analyzer(dir.path()).analyze_correlations().unwrap();

        assert_eq!(report.correlations[0][0], 1.0);
        assert_eq!(report.correlations[0][1], report.correlations[1][0]);
        assert!(report.anova.p_value >= 0.0 && report.anova.p_value <= 1.0);
        assert_eq!(report.chi2.dof, 2);
        let shares: f64 = report.genre_trends["a"].values().sum();
        assert!((shares - 100.0).abs() < 1e-9);
        assert_eq!(chart.layout.width, Some(600));
    }

    #[test]
    fn constant_explicit_flag_gives_degenerate_chi_square() {
        let records: Vec<TrackRecord> = (0..10)
            .map(|i| record(i, if i < 5 { "a" } else { "b" }, 40.0 + (i * 7 % 10) as f64, 3.0 + i as f64 * 0.2, false))
            .collect();
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::from_table(TrackTable::from_records(records), dir.path()).unwrap();

        let report = analyzer.correlation_report().unwrap();
        assert_eq!(report.chi2.dof, 0);
        assert_eq!(report.chi2.chi2, 0.0);
        assert_eq!(report.chi2.p_value, 1.0);
    }

    #[test]
    fn success_factors_carry_confidence_intervals() {
        let dir = tempdir().unwrap();
        let (rows, chart) = analyzer(dir.path()).analyze_genre_success_factors().unwrap();

        assert_eq!(rows.len(), 3);
        let a = &rows[0];
        assert_eq!(a.genre, "a");
        let expected = 1.959963984540054 * 7.91 / 5f64.sqrt();
        assert!((a.ci_95.unwrap() - expected).abs() < 1e-6);
        assert_eq!(a.explicit_mean, 0.0);
        assert!(chart.layout.yaxis2.is_some());
    }

    #[test]
    fn duration_summary_needs_tracks() {
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::from_table(TrackTable::default(), dir.path()).unwrap();
        assert!(matches!(
            analyzer.duration_summary(),
            Err(AnalysisError::Computation {
                source: StatsError::EmptySample,
                ..
            })
        ));
    }
}
