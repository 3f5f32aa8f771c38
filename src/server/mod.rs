// Server module: page rendering, HTTP routes and the static site.

pub mod page;
pub mod site;

use crate::analyzer::TrackAnalyzer;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::{error, info};

#[derive(Clone)]
pub struct ServerState {
    pub analyzer: Arc<TrackAnalyzer>,
}

/// `/` renders the page, `/static/*` serves the static tree.
pub fn make_app(analyzer: Arc<TrackAnalyzer>, static_dir: &Path) -> Router {
    let state = ServerState { analyzer };

    Router::new()
        .route("/", get(index))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

async fn index(State(state): State<ServerState>) -> Response {
    let analyzer = state.analyzer.clone();
    match tokio::task::spawn_blocking(move || page::render_page(&analyzer)).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Page render task failed: {}", e);
            (StatusCode::OK, Html(page::render(&page::PageContent::default()))).into_response()
        }
    }
}

pub async fn run_server(app: Router, host: &str, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("🚀 Serving on http://{}:{}", host, port);
    axum::serve(listener, app).await
}
