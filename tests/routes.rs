#![cfg(feature = "web")]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::fs;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

use support_site::app::{AppState, router};
use support_site::config::Config;
use support_site::datasets::{AGE_BREAKDOWN, YEARLY_SUPPORT};
use support_site::reviews::DeleteResponse;

struct Site {
    dir: TempDir,
    state: Arc<AppState>,
}

impl Site {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let static_dir = dir.path().join("static");
        fs::create_dir_all(&data_dir).unwrap();
        fs::create_dir_all(static_dir.join("css")).unwrap();
        fs::write(static_dir.join("css").join("style.css"), "body { margin: 0; }").unwrap();

        let config = Config {
            port: 0,
            reviews_file: data_dir.join("reviews.xlsx"),
            data_dir,
            static_dir,
        };
        let state = Arc::new(AppState::new(config).unwrap());
        Self { dir, state }
    }

    fn app(&self) -> Router {
        router(Arc::clone(&self.state))
    }

    async fn get(&self, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.app().oneshot(request).await.unwrap()
    }

    async fn post_form(&self, uri: &str, form: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.app().oneshot(request).await.unwrap()
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn home_embeds_fixed_age_distribution() {
    let site = Site::new();
    let response = site.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"["10대","20대","30대","40대","50대","60대 이상"]"#));
    assert!(html.contains("[120,450,390,260,150,45]"));
}

#[tokio::test]
async fn static_pages_render() {
    let site = Site::new();
    for uri in ["/resources", "/about", "/news", "/cases"] {
        let response = site.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn news_without_data_file_renders_empty_list() {
    let site = Site::new();
    let html = body_text(site.get("/news").await).await;
    assert!(html.contains("등록된 뉴스가 없습니다."));
}

#[tokio::test]
async fn statistics_uses_fallbacks_when_files_are_missing() {
    let site = Site::new();
    let html = body_text(site.get("/statistics").await).await;

    assert!(html.contains(
        r#"{"labels":["10대","20대","30대"],"series_names":["촬영형","유포형"],"series_values":[[10,20,15],[5,15,10]]}"#
    ));
    assert!(html.contains(
        r#"{"labels":[2022,2023,2024],"series_names":["상담","법률지원"],"series_values":[[100,150,200],[50,80,120]]}"#
    ));
}

#[tokio::test]
async fn statistics_reads_cp949_sources() {
    let site = Site::new();
    let data_dir = &site.state.config.data_dir;

    let (age, _, _) = encoding_rs::EUC_KR.encode("연령대,불법촬영,유포\n10대,7,3\n20대,9,4\n");
    fs::write(AGE_BREAKDOWN.path(data_dir), age).unwrap();
    let (support, _, _) =
        encoding_rs::EUC_KR.encode("연도,전체,상담,삭제지원\n합계,50,20,30\n2023,20,8,12\n2024,30,12,18\n");
    fs::write(YEARLY_SUPPORT.path(data_dir), support).unwrap();

    let html = body_text(site.get("/statistics").await).await;

    assert!(html.contains(
        r#"{"labels":["10대","20대"],"series_names":["불법촬영","유포"],"series_values":[[7,9],[3,4]]}"#
    ));
    assert!(html.contains(
        r#"{"labels":[2023,2024],"series_names":["상담","삭제지원"],"series_values":[[8,12],[12,18]]}"#
    ));
}

#[tokio::test]
async fn review_lifecycle_over_http() {
    let site = Site::new();

    let response = site
        .post_form("/reviews/add", "name=Kim&content=helpful&password=pw1")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/reviews");

    site.post_form("/reviews/add", "name=Lee&content=thanks&password=pw2")
        .await;

    let html = body_text(site.get("/reviews").await).await;
    let lee = html.find("thanks").unwrap();
    let kim = html.find("helpful").unwrap();
    assert!(lee < kim, "newest review should come first");
    assert!(!html.contains("argon2"));

    let response = site.post_form("/reviews/delete/1", "password=wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: DeleteResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(!body.success);

    let response = site.post_form("/reviews/delete/1", "password=pw1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: DeleteResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body.success);

    let html = body_text(site.get("/reviews").await).await;
    assert!(html.contains("thanks"));
    assert!(!html.contains("helpful"));
}

#[tokio::test]
async fn deleting_missing_review_is_404() {
    let site = Site::new();
    let response = site.post_form("/reviews/delete/42", "password=pw").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: DeleteResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(!body.success);
    assert_eq!(body.message, "리뷰를 찾을 수 없습니다.");
}

#[tokio::test]
async fn malformed_review_id_gets_json_not_found() {
    let site = Site::new();
    site.post_form("/reviews/add", "name=Kim&content=helpful&password=pw1")
        .await;

    for uri in ["/reviews/delete/abc", "/reviews/delete/-1", "/reviews/delete/1.0"] {
        let response = site.post_form(uri, "password=pw1").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let body: DeleteResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(!body.success);
        assert_eq!(body.message, "리뷰를 찾을 수 없습니다.");
    }

    let html = body_text(site.get("/reviews").await).await;
    assert!(html.contains("helpful"));
}

#[tokio::test]
async fn multi_line_review_is_shown_without_escapes() {
    let site = Site::new();
    site.post_form("/reviews/add", "name=Kim&content=first%0D%0Asecond&password=pw1")
        .await;

    let html = body_text(site.get("/reviews").await).await;
    assert!(html.contains("first\r\nsecond"));
    assert!(!html.contains("_x000D_"));
}

#[tokio::test]
async fn failed_add_redirects_with_error_notice() {
    let site = Site::new();
    fs::write(&site.state.config.reviews_file, b"not a workbook").unwrap();

    let response = site
        .post_form("/reviews/add", "name=Kim&content=helpful&password=pw1")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/reviews?error=save-failed");

    let html = body_text(site.get("/reviews?error=save-failed").await).await;
    assert!(html.contains("후기를 저장하지 못했습니다."));
}

#[tokio::test]
async fn debug_reports_static_files() {
    let site = Site::new();
    let response = site.get("/debug").await;
    assert_eq!(response.status(), StatusCode::OK);

    let report: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(report["static_exists"], true);
    assert_eq!(report["static_css_files"], serde_json::json!(["style.css"]));
    assert_eq!(report["css_file_size"], 19);
    assert_eq!(report["css_preview"], "body { margin: 0; }");
    assert_eq!(report["data_exists"], true);
    assert!(site.dir.path().exists());
}

#[tokio::test]
async fn static_assets_are_served() {
    let site = Site::new();
    let response = site.get("/static/css/style.css").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "body { margin: 0; }");
}
