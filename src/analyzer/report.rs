use crate::analyzer::stats::Summary;
use crate::analyzer::track_analysis::{
    CorrelationReport, ExplicitShare, GenrePopularity, GenreSuccess, PopularityTrend, TrackAnalyzer,
};
use crate::chart::html::HtmlWriter;
use crate::chart::svg::SvgWriter;
use crate::chart::{Chart, ChartWriter};
use crate::model::AnalysisError;
use serde::Serialize;
use tracing::{error, info};

/// The fixed menu of chart-producing analyses, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[serde(rename = "genre_popularity")]
    GenrePopularity,
    #[serde(rename = "explicit_analysis")]
    ExplicitByGenre,
    DurationDistribution,
    PopularityTrends,
    #[serde(rename = "correlation_matrix")]
    Correlations,
    SuccessFactors,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::GenrePopularity,
        Operation::ExplicitByGenre,
        Operation::DurationDistribution,
        Operation::PopularityTrends,
        Operation::Correlations,
        Operation::SuccessFactors,
    ];

    /// Artifact base name, also used to tag reports and page elements.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GenrePopularity => "genre_popularity",
            Operation::ExplicitByGenre => "explicit_analysis",
            Operation::DurationDistribution => "duration_distribution",
            Operation::PopularityTrends => "popularity_trends",
            Operation::Correlations => "correlation_matrix",
            Operation::SuccessFactors => "success_factors",
        }
    }
}

/// Typed metrics of one operation, tagged with the operation name when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", content = "metrics", rename_all = "snake_case")]
pub enum AnalysisReport {
    GenrePopularity(Vec<GenrePopularity>),
    ExplicitAnalysis(Vec<ExplicitShare>),
    DurationDistribution(Summary),
    PopularityTrends(Vec<PopularityTrend>),
    CorrelationMatrix(CorrelationReport),
    SuccessFactors(Vec<GenreSuccess>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visualization {
    pub operation: Operation,
    pub report: AnalysisReport,
    pub chart: Chart,
}

impl TrackAnalyzer {
    /// Runs one operation, returning its metrics and chart.
    pub fn run(&self, operation: Operation) -> Result<Visualization, AnalysisError> {
        let (report, chart) = match operation {
            Operation::GenrePopularity => {
                let (rows, chart) = self.analyze_genre_popularity()?;
                (AnalysisReport::GenrePopularity(rows), chart)
            }
            Operation::ExplicitByGenre => {
                let (shares, chart) = self.analyze_explicit_by_genre()?;
                (AnalysisReport::ExplicitAnalysis(shares), chart)
            }
            Operation::DurationDistribution => {
                let summary = self.duration_summary()?;
                (AnalysisReport::DurationDistribution(summary), self.analyze_duration_distribution()?)
            }
            Operation::PopularityTrends => {
                let (trends, chart) = self.analyze_popularity_trends()?;
                (AnalysisReport::PopularityTrends(trends), chart)
            }
            Operation::Correlations => {
                let (report, chart) = self.analyze_correlations()?;
                (AnalysisReport::CorrelationMatrix(report), chart)
            }
            Operation::SuccessFactors => {
                let (rows, chart) = self.analyze_genre_success_factors()?;
                (AnalysisReport::SuccessFactors(rows), chart)
            }
        };

        Ok(Visualization {
            operation,
            report,
            chart,
        })
    }

    /// Runs every operation and writes `<name>.html` and `<name>.svg` for each.
    /// Stops at the first failure; artifacts already written are kept.
    pub fn save_visualizations(&self) -> Result<Vec<Visualization>, AnalysisError> {
        info!("Generating visualizations...");
        let writers: [&dyn ChartWriter; 2] = [&HtmlWriter, &SvgWriter];
        let mut saved = Vec::with_capacity(Operation::ALL.len());

        for operation in Operation::ALL {
            let visualization = self.run(operation).inspect_err(|e| {
                error!("Failed to generate {}: {}", operation.name(), e);
            })?;

            for writer in writers {
                let path = writer
                    .write_named(&visualization.chart, self.visualization_dir(), operation.name())
                    .map_err(|source| AnalysisError::Chart {
                        operation: operation.name(),
                        source,
                    })
                    .inspect_err(|e| error!("{}", e))?;
                info!("Saved {} to {}", operation.name(), path.display());
            }
            saved.push(visualization);
        }

        info!("All {} visualizations saved", saved.len());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::track_analysis::tests::sample_table;
    use crate::model::TrackTable;
    use serde_json::Value;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reports_are_tagged_with_operation_name() {
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::from_table(sample_table(), dir.path()).unwrap();

        for operation in Operation::ALL {
            let visualization = analyzer.run(operation).unwrap();
            let value = serde_json::to_value(&visualization.report).unwrap();
            assert_eq!(value["operation"], operation.name());
            assert_eq!(serde_json::to_value(operation).unwrap(), operation.name());
        }
    }

    #[test]
    fn saves_every_artifact_in_order() {
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::from_table(sample_table(), dir.path().join("viz")).unwrap();

        let saved = analyzer.save_visualizations().unwrap();
        let order: Vec<Operation> = saved.iter().map(|v| v.operation).collect();
        assert_eq!(order, Operation::ALL.to_vec());
        for operation in Operation::ALL {
            for extension in ["html", "svg"] {
                let path = dir.path().join("viz").join(format!("{}.{}", operation.name(), extension));
                assert!(path.is_file(), "missing {}", path.display());
            }
        }
    }

    #[test]
    fn repeated_runs_produce_identical_metrics() {
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::from_table(sample_table(), dir.path()).unwrap();

        let first = serde_json::to_string(&analyzer.save_visualizations().unwrap()).unwrap();
        let html = fs::read(dir.path().join("success_factors.html")).unwrap();
        let second = serde_json::to_string(&analyzer.save_visualizations().unwrap()).unwrap();

        assert_eq!(first, second);
        assert_eq!(html, fs::read(dir.path().join("success_factors.html")).unwrap());
    }

    #[test]
    fn batch_stops_at_first_failure() {
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::from_table(TrackTable::default(), dir.path()).unwrap();

        let err = analyzer.save_visualizations().unwrap_err();
        assert!(matches!(err, AnalysisError::Computation { operation: "duration_distribution", .. }));
        // the two operations before it already wrote their artifacts
        assert!(dir.path().join("explicit_analysis.html").is_file());
        assert!(!dir.path().join("popularity_trends.html").exists());
    }

    #[test]
    fn correlation_report_serializes_category_keys() {
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::from_table(sample_table(), dir.path()).unwrap();

        let visualization = analyzer.run(Operation::Correlations).unwrap();
        let value: Value = serde_json::to_value(&visualization.report).unwrap();
        assert!(value["metrics"]["genre_trends"]["b"]["Very Low"].is_number());
        assert_eq!(value["metrics"]["chi2"]["dof"], 2);
    }
}
