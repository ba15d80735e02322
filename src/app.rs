#![cfg(feature = "web")]

use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use handlebars::{Handlebars, TemplateError};
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::pages;
use crate::reviews::{self, FileReviewStore, ReviewRepository};
use crate::templates;

/// State shared by every handler
pub struct AppState {
    pub config: Config,
    pub reviews: Arc<dyn ReviewRepository>,
    templates: Handlebars<'static>,
}

impl AppState {
    /// State backed by the review workbook named in `config`
    pub fn new(config: Config) -> Result<Self, TemplateError> {
        let reviews = Arc::new(FileReviewStore::new(config.reviews_file.clone()));
        Self::with_repository(config, reviews)
    }

    /// State with an explicit review repository
    pub fn with_repository(
        config: Config,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            config,
            reviews,
            templates: templates::registry()?,
        })
    }

    /// Render a page template, or a bare 500 if the template fails
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Response {
        match self.templates.render(name, context) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!("failed to render template '{name}': {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Build the router for every page, the review endpoints and `/static`
pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(pages::home))
        .route("/news", get(pages::news))
        .route("/cases", get(pages::cases))
        .route("/resources", get(pages::resources))
        .route("/about", get(pages::about))
        .route("/statistics", get(pages::statistics))
        .route("/debug", get(pages::debug))
        .route("/reviews", get(reviews::reviews_page))
        .route("/reviews/add", post(reviews::add_review))
        .route("/reviews/delete/:id", post(reviews::delete_review))
        .nest_service("/static", static_files)
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.listen_addr();
    let state = Arc::new(AppState::new(config)?);

    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
