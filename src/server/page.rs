// server/page.rs

use crate::analyzer::insights::{BusinessInsights, Recommendations};
use crate::analyzer::track_analysis::GenreSuccess;
use crate::analyzer::{AnalysisReport, Operation, TrackAnalyzer};
use crate::chart::html::{PLOTLY_JS_CDN, script_safe};
use crate::chart::theme::apply_dark_theme;
use crate::model::AnalysisError;
use crate::utils::{escape_html, format_optional};
use chrono::{DateTime, Utc};
use std::fmt::Write;
use tracing::{info, warn};

/// Everything the page shows. Each part is optional so a failed operation
/// only blanks its own section.
#[derive(Debug, Default)]
pub struct PageContent {
    /// Themed figure JSON per operation, in presentation order.
    pub charts: Vec<(Operation, String)>,
    pub insights: Option<BusinessInsights>,
    pub recommendations: Option<Recommendations>,
    pub success_metrics: Option<Vec<GenreSuccess>>,
    pub generated_at: Option<DateTime<Utc>>,
}

/// Runs every operation for the page. Failures are logged and skipped.
pub fn collect_content(analyzer: &TrackAnalyzer) -> Result<PageContent, AnalysisError> {
    analyzer.table()?;
    let mut content = PageContent {
        generated_at: Some(Utc::now()),
        ..Default::default()
    };

    for operation in Operation::ALL {
        let mut visualization = match analyzer.run(operation) {
            Ok(v) => v,
            Err(e) => {
                warn!("Skipping {} on the page: {}", operation.name(), e);
                continue;
            }
        };
        apply_dark_theme(&mut visualization.chart);
        match visualization.chart.to_json() {
            Ok(json) => content.charts.push((operation, json)),
            Err(e) => warn!("Skipping {} on the page: {}", operation.name(), e),
        }
        if let AnalysisReport::SuccessFactors(rows) = visualization.report {
            content.success_metrics = Some(rows);
        }
    }

    match analyzer.business_insights() {
        Ok(insights) => {
            content.recommendations = Some(Recommendations::from_insights(&insights));
            content.insights = Some(insights);
        }
        Err(e) => warn!("Skipping insights on the page: {}", e),
    }

    info!("Page content ready: {} charts", content.charts.len());
    Ok(content)
}

/// The full page, or a page with every section empty when the session cannot be read.
pub fn render_page(analyzer: &TrackAnalyzer) -> String {
    match collect_content(analyzer) {
        Ok(content) => render(&content),
        Err(e) => {
            warn!("Failed to render page: {}", e);
            render(&PageContent::default())
        }
    }
}

fn chart_title(operation: Operation) -> &'static str {
    match operation {
        Operation::GenrePopularity => "Genre popularity",
        Operation::ExplicitByGenre => "Explicit content",
        Operation::DurationDistribution => "Duration distribution",
        Operation::PopularityTrends => "Popularity trends",
        Operation::Correlations => "Correlations",
        Operation::SuccessFactors => "Success factors",
    }
}

pub fn render(content: &PageContent) -> String {
    let mut body = String::new();

    for (operation, _) in &content.charts {
        let _ = write!(
            body,
            r#"
        <section class="chart-card">
            <h2>{}</h2>
            <div id="{}" class="chart"></div>
        </section>"#,
            chart_title(*operation),
            operation.name()
        );
    }
    if let Some(insights) = &content.insights {
        body.push_str(&render_insights(insights));
    }
    if let Some(recommendations) = &content.recommendations {
        body.push_str(&render_recommendations(recommendations));
    }
    if let Some(rows) = &content.success_metrics {
        body.push_str("\n        <section>\n            <h2>Success metrics by genre</h2>\n");
        body.push_str(&success_table(rows));
        body.push_str("\n        </section>");
    }

    let mut scripts = String::new();
    for (operation, json) in &content.charts {
        let _ = write!(
            scripts,
            "\n        {{ const figure = {}; Plotly.newPlot('{}', figure.data, figure.layout, {{responsive: true}}); }}",
            script_safe(json),
            operation.name()
        );
    }

    let generated = content
        .generated_at
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Track Insights</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css">
    <script src="{plotly}"></script>
    <style>
        body {{ background: #121212; color: #FFFFFF; }}
        h1, h2 {{ color: #1DB954; }}
        .chart-card {{ margin: 2rem 0; }}
        .chart {{ min-height: 450px; }}
    </style>
</head>
<body>
    <header class="text-center">
        <img src="static/img/header.png" alt="" class="img-fluid">
        <h1>Track Insights</h1>
    </header>
    <main class="container">{body}
    </main>
    <footer class="text-center my-4">
        <a href="https://www.linkedin.com/"><img src="static/icons/linkedin_logo.png" alt="LinkedIn" height="32"></a>
        <a href="https://www.instagram.com/"><img src="static/icons/instagram_logo.png" alt="Instagram" height="32"></a>
        <a href="https://github.com/"><img src="static/icons/github_logo.png" alt="GitHub" height="32"></a>
        <p class="small">{generated}</p>
    </footer>
    <script>{scripts}
    </script>
</body>
</html>
"#,
        plotly = PLOTLY_JS_CDN,
        body = body,
        generated = escape_html(&generated),
        scripts = scripts
    )
}

fn render_insights(insights: &BusinessInsights) -> String {
    let mut html = String::from("\n        <section>\n            <h2>Insights</h2>\n            <h3>Top genres</h3>\n            <ol>");
    for genre in &insights.top_genres {
        let _ = write!(
            html,
            "\n                <li>{}: {:.1}</li>",
            escape_html(&genre.genre),
            genre.mean_popularity
        );
    }
    let _ = write!(
        html,
        r#"
            </ol>
            <p>Ideal duration of popular tracks: mean {} min, median {} min</p>
            <p>Explicit content impact on popularity: {}</p>
            <h3>Popularity distribution</h3>
            <ul>"#,
        format_optional(insights.ideal_duration.mean, 2),
        format_optional(insights.ideal_duration.median, 2),
        format_optional(insights.explicit_impact, 3)
    );
    for (category, count) in &insights.popularity_distribution {
        let _ = write!(html, "\n                <li>{}: {}</li>", category, count);
    }
    html.push_str("\n            </ul>\n        </section>");
    html
}

fn render_recommendations(recommendations: &Recommendations) -> String {
    let playlist = &recommendations.playlist;
    let strategy = &recommendations.content_strategy;
    let genres: Vec<String> = playlist.recommended_genres.iter().map(|g| escape_html(g)).collect();

    format!(
        r#"
        <section>
            <h2>Recommendations</h2>
            <h3>Playlist composition</h3>
            <p>Recommended genres: {}</p>
            <p>Ideal duration: {}</p>
            <p>Suggested split: {}% popular, {}% trending, {}% discovery</p>
            <h3>Content strategy</h3>
            <p>Explicit content: {}</p>
            <p>{}</p>
            <p>{}</p>
        </section>"#,
        genres.join(", "),
        escape_html(&playlist.ideal_duration),
        playlist.suggested_split.popular,
        playlist.suggested_split.trending,
        playlist.suggested_split.discovery,
        strategy.explicit_content.label(),
        escape_html(&strategy.duration_focus),
        escape_html(&strategy.diversity)
    )
}

pub fn success_table(rows: &[GenreSuccess]) -> String {
    let mut html = String::from(
        r#"<table class="table table-dark table-striped">
    <thead>
        <tr><th>Genre</th><th>Mean popularity</th><th>Std</th><th>Tracks</th><th>Mean duration (min)</th><th>Explicit share</th><th>CI 95%</th></tr>
    </thead>
    <tbody>"#,
    );
    for row in rows {
        let _ = write!(
            html,
            "\n        <tr><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{}</td></tr>",
            escape_html(&row.genre),
            row.popularity_mean,
            format_optional(row.popularity_std, 2),
            row.track_count,
            row.duration_mean,
            row.explicit_mean,
            format_optional(row.ci_95, 2)
        );
    }
    html.push_str("\n    </tbody>\n</table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::track_analysis::tests::sample_table;
    use crate::model::TrackTable;
    use tempfile::tempdir;

    #[test]
    fn page_embeds_every_chart_and_metrics_table() {
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::from_table(sample_table(), dir.path()).unwrap();

        let html = render_page(&analyzer);
        for operation in Operation::ALL {
            assert!(html.contains(&format!("id=\"{}\"", operation.name())));
        }
        assert!(html.contains("table table-dark table-striped"));
        assert!(html.contains("#121212"));
        assert!(html.contains("Recommended genres: a, c, b"));
    }

    #[test]
    fn failed_operations_are_skipped() {
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::from_table(TrackTable::default(), dir.path()).unwrap();

        let content = collect_content(&analyzer).unwrap();
        let names: Vec<&str> = content.charts.iter().map(|(op, _)| op.name()).collect();
        assert!(names.contains(&"genre_popularity"));
        assert!(!names.contains(&"duration_distribution"));
        assert!(!names.contains(&"correlation_matrix"));
        assert!(content.insights.is_some());
    }

    #[test]
    fn unloaded_session_renders_empty_page() {
        let dir = tempdir().unwrap();
        let analyzer = TrackAnalyzer::new(dir.path().join("none.csv"), dir.path()).unwrap();

        let html = render_page(&analyzer);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains("<section class=\"chart-card\">"));
        assert!(!html.contains("Plotly.newPlot("));
        assert!(!html.contains("<table"));
    }
}
