mod analyzer;
mod chart;
mod config;
mod etl;
mod model;
mod server;
mod utils;

use analyzer::{AnalysisReport, TrackAnalyzer};
use clap::{Parser, Subcommand};
use config::{AppConfig, load_config};
use etl::DataLoader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "track-insights", about = "Track dataset analysis and report server")]
struct Cli {
    /// Path to the JSON config file. Defaults are used when it does not exist.
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean the raw CSV into the processed table.
    Process,
    /// Generate every chart artifact and print the statistical results.
    Analyze,
    /// Serve the report page.
    Serve,
    /// Write the report page and static tree as a static site.
    Export,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match read_config(&cli.config) {
        Some(cfg) => cfg,
        None => return ExitCode::FAILURE,
    };

    let ok = match cli.command {
        Command::Process => process(&config),
        Command::Analyze => analyze(&config),
        Command::Serve => serve(config).await,
        Command::Export => export(&config),
    };
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn read_config(path: &Path) -> Option<AppConfig> {
    if !path.exists() {
        warn!("Config {} not found, using defaults", path.display());
        return Some(AppConfig::default());
    }
    match load_config(path) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            None
        }
    }
}

fn process(config: &AppConfig) -> bool {
    let loader = DataLoader::new(&config.raw_data_path, &config.processed_data_path);
    match loader.process() {
        Ok((table, diagnostics)) => {
            info!(
                "✅ Cleaned {} of {} rows into {}",
                table.len(),
                diagnostics.row_count,
                config.processed_data_path.display()
            );
            true
        }
        Err(e) => {
            error!("Processing failed: {}", e);
            false
        }
    }
}

fn load_session(config: &AppConfig) -> Option<TrackAnalyzer> {
    let mut analyzer = match TrackAnalyzer::new(&config.processed_data_path, &config.visualization_dir) {
        Ok(a) => a,
        Err(e) => {
            error!("Failed to prepare analyzer: {}", e);
            return None;
        }
    };
    if let Err(e) = analyzer.load() {
        error!("Failed to load {}: {}", config.processed_data_path.display(), e);
        return None;
    }
    Some(analyzer)
}

fn analyze(config: &AppConfig) -> bool {
    let Some(analyzer) = load_session(config) else {
        return false;
    };

    let visualizations = match analyzer.save_visualizations() {
        Ok(v) => v,
        Err(e) => {
            error!("Visualization batch aborted: {}", e);
            return false;
        }
    };

    for visualization in &visualizations {
        match &visualization.report {
            AnalysisReport::CorrelationMatrix(report) => {
                info!("ANOVA genre vs popularity: F = {:.3}, p = {:.3}", report.anova.f_statistic, report.anova.p_value);
                info!(
                    "Chi-square genre vs explicit: chi2 = {:.3}, p = {:.3}, dof = {}",
                    report.chi2.chi2, report.chi2.p_value, report.chi2.dof
                );
            }
            AnalysisReport::SuccessFactors(rows) => {
                info!("Success metrics by genre:");
                for row in rows {
                    info!(
                        "{}: mean {:.2} ± {} over {} tracks, {:.2} min, explicit {:.2}",
                        row.genre,
                        row.popularity_mean,
                        utils::format_optional(row.ci_95, 2),
                        row.track_count,
                        row.duration_mean,
                        row.explicit_mean
                    );
                }
            }
            _ => {}
        }
    }

    match analyzer.recommendations() {
        Ok(recommendations) => match serde_json::to_string_pretty(&recommendations) {
            Ok(json) => info!("Recommendations:\n{}", json),
            Err(e) => warn!("Failed to serialize recommendations: {}", e),
        },
        Err(e) => warn!("Recommendations unavailable: {}", e),
    }
    true
}

async fn serve(config: AppConfig) -> bool {
    if let Err(e) = server::site::ensure_static_files(&config.static_dir, &config.assets) {
        warn!("Static asset bootstrap failed: {}", e);
    }

    let mut analyzer = match TrackAnalyzer::new(&config.processed_data_path, &config.visualization_dir) {
        Ok(a) => a,
        Err(e) => {
            error!("Failed to prepare analyzer: {}", e);
            return false;
        }
    };
    match analyzer.load().map(|table| table.len()) {
        Ok(tracks) => {
            info!("Session loaded with {} tracks", tracks);
            if let Err(e) = analyzer.save_visualizations() {
                warn!("Startup visualization batch failed: {}", e);
            }
        }
        Err(e) => warn!("Failed to load {}, the page will be empty: {}", config.processed_data_path.display(), e),
    }

    let app = server::make_app(Arc::new(analyzer), &config.static_dir);
    match server::run_server(app, &config.server.host, config.server.port).await {
        Ok(()) => true,
        Err(e) => {
            error!("Server error: {}", e);
            false
        }
    }
}

fn export(config: &AppConfig) -> bool {
    let Some(analyzer) = load_session(config) else {
        return false;
    };
    match server::site::export_static_site(&analyzer, &config.static_dir, &config.site_dir) {
        Ok(index) => {
            info!("✅ Static site written to {}", index.display());
            true
        }
        Err(e) => {
            error!("Static export failed: {}", e);
            false
        }
    }
}
