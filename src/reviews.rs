#[cfg(feature = "web")]
use crate::app::AppState;
use crate::password::{hash_password, verify_password};
use crate::saving::{load_reviews, save_reviews};
#[cfg(feature = "web")]
use axum::{
    Form, Json,
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Local;
use log::{error, info};
#[cfg(feature = "web")]
use serde::Deserialize;
use serde::Serialize;
use std::path::{Path, PathBuf};
#[cfg(feature = "web")]
use std::sync::Arc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// A user-submitted review
///
/// Records are created by [`ReviewRepository::add`] and never modified
/// afterwards; deletion is the only other lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRecord {
    /// Store-unique id, `max(existing) + 1`
    pub id: u64,

    /// Display name given by the submitter
    pub author: String,

    /// Review text
    pub content: String,

    /// Local submission time, `YYYY-MM-DD HH:MM:SS`
    pub created_at: String,

    /// Argon2 hash of the deletion password
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Failures of the review workbook itself
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on review store: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write review workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to read review workbook: {0}")]
    Read(#[from] calamine::XlsxError),

    #[error("review workbook has no '{0}' sheet")]
    MissingSheet(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Outcome of a rejected delete request
#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("리뷰를 찾을 수 없습니다.")]
    NotFound,

    #[error("비밀번호가 일치하지 않습니다.")]
    Unauthorized,

    #[error("삭제 중 오류가 발생했습니다.")]
    Internal(#[from] StoreError),
}

impl DeleteError {
    /// HTTP status reported for this outcome
    pub fn status_code(&self) -> u16 {
        match self {
            DeleteError::NotFound => 404,
            DeleteError::Unauthorized => 401,
            DeleteError::Internal(_) => 500,
        }
    }
}

/// Storage capability used by the review pages
pub trait ReviewRepository: Send + Sync {
    /// All reviews, highest id first
    fn list(&self) -> Vec<ReviewRecord>;

    /// Append a review and return it with its assigned id
    fn add(&self, author: &str, content: &str, password: &str)
    -> Result<ReviewRecord, StoreError>;

    /// Remove review `id` if `password` matches its stored hash
    fn delete(&self, id: u64, password: &str) -> Result<(), DeleteError>;
}

/// Review store backed by a single workbook file
///
/// Every operation reads the whole file and every mutation rewrites it.
/// The mutex serializes these cycles so concurrent requests cannot lose
/// each other's updates.
pub struct FileReviewStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileReviewStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, a panicking holder cannot corrupt it.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReviewRepository for FileReviewStore {
    fn list(&self) -> Vec<ReviewRecord> {
        let _guard = self.guard();

        let mut records = match load_reviews(&self.path) {
            Ok(Some(records)) => records,
            Ok(None) => {
                info!("initializing review store at {}", self.path.display());
                if let Err(e) = save_reviews(&[], &self.path) {
                    error!("failed to initialize review store: {e}");
                }
                Vec::new()
            }
            Err(e) => {
                error!("failed to read review store {}: {e}", self.path.display());
                Vec::new()
            }
        };

        records.sort_by(|a, b| b.id.cmp(&a.id));
        records
    }

    fn add(
        &self,
        author: &str,
        content: &str,
        password: &str,
    ) -> Result<ReviewRecord, StoreError> {
        let password_hash = hash_password(password).map_err(|e| StoreError::Hash(e.to_string()))?;

        let _guard = self.guard();
        let mut records = load_reviews(&self.path)?.unwrap_or_default();

        let record = ReviewRecord {
            id: records.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            author: author.to_string(),
            content: content.to_string(),
            created_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            password_hash,
        };

        records.push(record.clone());
        save_reviews(&records, &self.path)?;

        info!("added review {}", record.id);
        Ok(record)
    }

    fn delete(&self, id: u64, password: &str) -> Result<(), DeleteError> {
        let _guard = self.guard();

        let mut records = load_reviews(&self.path)?.ok_or(DeleteError::NotFound)?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(DeleteError::NotFound)?;

        if !verify_password(password, &records[index].password_hash) {
            return Err(DeleteError::Unauthorized);
        }

        records.remove(index);
        save_reviews(&records, &self.path)?;

        info!("deleted review {id}");
        Ok(())
    }
}

// Web handler functions below (only compiled with "web" feature)

/// Review submission form
#[cfg(feature = "web")]
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub name: String,
    pub content: String,
    pub password: String,
}

/// Review deletion form
#[cfg(feature = "web")]
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub password: String,
}

/// Query string of the review page
#[cfg(feature = "web")]
#[derive(Debug, Default, Deserialize)]
pub struct ReviewsQuery {
    pub error: Option<String>,
}

/// JSON body returned by the delete endpoint
#[cfg(feature = "web")]
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Query value set on the redirect when a review could not be saved
#[cfg(feature = "web")]
pub const SAVE_FAILED: &str = "save-failed";

/// Render the review list, newest first
#[cfg(feature = "web")]
pub async fn reviews_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReviewsQuery>,
) -> Response {
    let store = Arc::clone(&state.reviews);
    let reviews = tokio::task::spawn_blocking(move || store.list())
        .await
        .unwrap_or_else(|e| {
            error!("review listing task failed: {e}");
            Vec::new()
        });
    let save_failed = query.error.as_deref() == Some(SAVE_FAILED);

    state.render(
        "reviews",
        &serde_json::json!({
            "page": "reviews",
            "reviews": reviews,
            "save_failed": save_failed,
        }),
    )
}

/// Handle a new review submission
///
/// Always redirects back to the review list. A failed save is logged and
/// flagged on the redirect so the page can tell the user.
#[cfg(feature = "web")]
pub async fn add_review(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ReviewForm>,
) -> Redirect {
    let store = Arc::clone(&state.reviews);
    let added = tokio::task::spawn_blocking(move || {
        store.add(&form.name, &form.content, &form.password)
    })
    .await;

    match added {
        Ok(Ok(_)) => Redirect::to("/reviews"),
        Ok(Err(e)) => {
            error!("failed to add review: {e}");
            Redirect::to(&format!("/reviews?error={SAVE_FAILED}"))
        }
        Err(e) => {
            error!("review submission task failed: {e}");
            Redirect::to(&format!("/reviews?error={SAVE_FAILED}"))
        }
    }
}

/// Handle a password-gated review deletion
///
/// An id that is not a review id at all is reported like an unknown one, so
/// the page script always receives the JSON body.
#[cfg(feature = "web")]
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let result = match id.parse::<u64>() {
        Ok(id) => {
            let store = Arc::clone(&state.reviews);
            tokio::task::spawn_blocking(move || store.delete(id, &form.password))
                .await
                .unwrap_or_else(|e| {
                    error!("review deletion task failed: {e}");
                    Err(DeleteError::Internal(StoreError::Io(std::io::Error::other(
                        e.to_string(),
                    ))))
                })
        }
        Err(_) => Err(DeleteError::NotFound),
    };

    let (status, body) = match result {
        Ok(()) => (
            StatusCode::OK,
            DeleteResponse {
                success: true,
                message: "리뷰가 삭제되었습니다.".to_string(),
            },
        ),
        Err(e) => {
            if let DeleteError::Internal(cause) = &e {
                error!("failed to delete review {id}: {cause}");
            }
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                DeleteResponse {
                    success: false,
                    message: e.to_string(),
                },
            )
        }
    };

    (status, Json(body)).into_response()
}
