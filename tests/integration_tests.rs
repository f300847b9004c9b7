//! Integration tests for paperscope
//!
//! These tests drive the HTTP client and the feed components against a
//! mocked corpus service.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use paperscope::feed::{Browser, Phase, SavedCollectionStore};
use paperscope::models::{Filters, SearchQuery, Tab, TimeWindow};
use paperscope::query::compose;
use paperscope::session::{RecordingGate, SessionGate};
use paperscope::{ApiError, CorpusApi, HttpApi};

fn api_for(server: &ServerGuard) -> Arc<HttpApi> {
    Arc::new(HttpApi::new(&server.url(), Duration::from_secs(5)).expect("valid mock url"))
}

fn paper_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "created": 1_700_000_000i64,
        "title": title,
        "abstract": "An abstract.",
        "authors": [{"name": "A. Author"}, {"name": "B. Author"}],
        "doi": null,
        "journal_ref": null,
        "primary_category": "cs.LG",
        "categories": ["cs.LG", "stat.ML"],
        "affiliations": ["Example Lab"],
        "favorite": false
    })
}

fn papers_body(ids: &[&str]) -> String {
    let papers: Vec<_> = ids
        .iter()
        .map(|id| paper_json(id, &format!("Paper {id}")))
        .collect();
    json!({ "papers": papers, "cutoff": 1_699_000_000i64 }).to_string()
}

#[tokio::test]
async fn test_fetch_page_parses_papers() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/papers")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("offset".into(), "0".into()),
            Matcher::UrlEncoded("time".into(), "last_week".into()),
            Matcher::UrlEncoded("tab".into(), "all".into()),
            Matcher::UrlEncoded("query".into(), "quantum".into()),
            Matcher::UrlEncoded("query_type".into(), "full_text".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(papers_body(&["2401.00001", "2401.00002"]))
        .create_async()
        .await;

    let api = api_for(&server);
    let params = compose(
        &SearchQuery::full_text("quantum"),
        &Filters::for_window(TimeWindow::LastWeek),
        Tab::All,
        0,
    );
    let page = api.fetch_page(&params).await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.papers.len(), 2);
    assert_eq!(page.papers[0].authors.len(), 2);
    assert_eq!(page.cutoff, Some(1_699_000_000));
}

#[tokio::test]
async fn test_non_200_read_is_server_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/papers")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let api = api_for(&server);
    let params = compose(&SearchQuery::default(), &Filters::default(), Tab::All, 0);
    let err = api.fetch_page(&params).await.unwrap_err();

    match err {
        ApiError::ServerRejected { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected ServerRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_403_maps_to_unauthorized() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/api/saved")
        .with_status(403)
        .create_async()
        .await;

    let api = api_for(&server);
    let err = api.delete_collection("some-id").await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_browser_paginates_until_empty_page() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/papers")
        .match_query(Matcher::AllOf(vec![Matcher::UrlEncoded(
            "offset".into(),
            "0".into(),
        )]))
        .with_status(200)
        .with_body(papers_body(&["a", "b", "c"]))
        .create_async()
        .await;
    let tail = server
        .mock("GET", "/api/papers")
        .match_query(Matcher::AllOf(vec![Matcher::UrlEncoded(
            "offset".into(),
            "3".into(),
        )]))
        .with_status(200)
        .with_body(papers_body(&[]))
        .expect(1)
        .create_async()
        .await;

    let api = api_for(&server);
    let mut browser = Browser::new(api, Arc::new(RecordingGate::new()));
    browser.refresh().await;
    assert_eq!(browser.engine().items().len(), 3);
    assert!(!browser.engine().is_exhausted());

    browser.load_more().await;
    assert!(browser.engine().is_exhausted());

    // Exhausted stream: no further request reaches the server
    browser.load_more().await;
    tail.assert_async().await;
}

#[tokio::test]
async fn test_fetch_failure_leaves_items_and_surfaces_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/papers")
        .match_query(Matcher::AllOf(vec![Matcher::UrlEncoded(
            "offset".into(),
            "0".into(),
        )]))
        .with_status(200)
        .with_body(papers_body(&["a", "b"]))
        .create_async()
        .await;
    server
        .mock("GET", "/api/papers")
        .match_query(Matcher::AllOf(vec![Matcher::UrlEncoded(
            "offset".into(),
            "2".into(),
        )]))
        .with_status(502)
        .create_async()
        .await;

    let api = api_for(&server);
    let mut browser = Browser::new(api, Arc::new(RecordingGate::new()));
    browser.refresh().await;
    browser.load_more().await;

    assert_eq!(browser.engine().phase(), Phase::Error);
    assert_eq!(browser.engine().items().len(), 2);
    assert!(!browser.engine().is_exhausted());
}

#[tokio::test]
async fn test_saved_delete_403_fires_gate() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/saved")
        .with_status(200)
        .with_body(
            json!({
                "saved_queries": [{
                    "id": "q-1",
                    "description": "ml digest",
                    "query": {"value": "transformers", "type": "full_text"},
                    "filters": {"time": "last_week", "categories": ["cs.LG"], "affiliations": []}
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("DELETE", "/api/saved")
        .match_body(Matcher::Json(json!({"query_id": "q-1"})))
        .with_status(403)
        .create_async()
        .await;

    let api = api_for(&server);
    let gate = Arc::new(RecordingGate::new());
    let mut store = SavedCollectionStore::new(api, Arc::clone(&gate) as Arc<dyn SessionGate>);
    store.list().await.unwrap();
    assert_eq!(store.entries().len(), 1);

    let err = store.remove_at(0).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(gate.logout_count(), 1);
    assert!(store.entries().is_empty());
}

#[tokio::test]
async fn test_save_collection_posts_flat_form() {
    let mut server = Server::new_async().await;
    let post = server
        .mock("POST", "/api/saved")
        .match_body(Matcher::Json(json!({
            "description": "weekly ml",
            "time": "last_week",
            "search_string": "transformers",
            "search_type": "full_text",
            "categories": ["cs.LG"],
            "affiliations": []
        })))
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("GET", "/api/saved")
        .with_status(200)
        .with_body(json!({"saved_queries": []}).to_string())
        .create_async()
        .await;

    let api = api_for(&server);
    let mut store = SavedCollectionStore::new(api, Arc::new(RecordingGate::new()));
    store
        .add(
            "weekly ml",
            &SearchQuery::full_text("transformers"),
            &Filters::for_window(TimeWindow::LastWeek).with_categories(["cs.LG"]),
        )
        .await
        .unwrap();

    post.assert_async().await;
}

#[tokio::test]
async fn test_favorite_toggle_updates_live_items() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/papers")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(papers_body(&["2401.00007"]))
        .create_async()
        .await;
    server
        .mock("POST", "/api/users/favorites")
        .match_body(Matcher::Json(json!({"paper_id": "2401.00007"})))
        .with_status(200)
        .create_async()
        .await;

    let api = api_for(&server);
    let mut browser = Browser::new(api, Arc::new(RecordingGate::new()));
    browser.refresh().await;
    assert!(!browser.engine().items()[0].favorite);

    browser.toggle_favorite("2401.00007", true).await.unwrap();
    assert!(browser.engine().items()[0].favorite);
}

#[tokio::test]
async fn test_login_captures_and_replays_session_cookie() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/login")
        .match_body(Matcher::Json(json!({"name": "ada", "password": "pw"})))
        .with_status(200)
        .with_header("set-cookie", "session=abc123; Path=/; HttpOnly")
        .create_async()
        .await;
    let authed = server
        .mock("GET", "/api/saved")
        .match_header("cookie", "session=abc123")
        .with_status(200)
        .with_body(json!({"saved_queries": []}).to_string())
        .create_async()
        .await;

    let api = api_for(&server);
    let cookie = api.login("ada", "pw").await.unwrap();
    assert_eq!(cookie, "session=abc123");

    api.saved_collections().await.unwrap();
    authed.assert_async().await;
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/categories")
        .with_status(200)
        .with_body(json!({"categories": ["cs.LG", "math.CO"]}).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/api/organizations")
        .with_status(200)
        .with_body(json!({"organizations": ["MIT", "Bell Labs"]}).to_string())
        .create_async()
        .await;

    let api = api_for(&server);
    assert_eq!(api.categories().await.unwrap(), ["cs.LG", "math.CO"]);
    assert_eq!(api.organizations().await.unwrap(), ["MIT", "Bell Labs"]);
}

#[tokio::test]
async fn test_login_check_reports_user() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/logincheck")
        .with_status(200)
        .with_body(json!({"logged_in": true, "user": "ada"}).to_string())
        .create_async()
        .await;

    let api = api_for(&server);
    let status = api.login_check().await.unwrap();
    assert!(status.logged_in);
    assert_eq!(status.user.as_deref(), Some("ada"));
}
