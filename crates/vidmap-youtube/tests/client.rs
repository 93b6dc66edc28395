//! Integration tests for `YoutubeClient` using wiremock HTTP mocks.

use vidmap_core::geo::haversine_km;
use vidmap_core::Coordinate;
use vidmap_youtube::{LocationQuery, VideoClientSettings, VideoError, YoutubeClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> VideoClientSettings {
    VideoClientSettings {
        max_retries: 0,
        backoff_base_ms: 0,
        region_code: Some("ES".to_string()),
        ..VideoClientSettings::default()
    }
}

fn test_client(base_url: &str) -> YoutubeClient {
    YoutubeClient::with_base_url("test-key", settings(), base_url)
        .expect("client construction should not fail")
}

fn sevilla() -> Coordinate {
    Coordinate::new(37.3891, -5.9845).expect("valid coordinate")
}

fn query(text: &str, page_token: Option<&str>) -> LocationQuery {
    LocationQuery {
        center: sevilla(),
        place_name: "Sevilla, Andalucía, España".to_string(),
        query: text.to_string(),
        page_token: page_token.map(str::to_string),
    }
}

fn search_body(ids: &[&str], next: Option<&str>) -> serde_json::Value {
    let items: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": { "kind": "youtube#video", "videoId": id },
                "snippet": { "title": format!("Video {id}"), "channelTitle": "Canal Sur" }
            })
        })
        .collect();
    let mut body = serde_json::json!({ "items": items });
    if let Some(token) = next {
        body["nextPageToken"] = serde_json::json!(token);
    }
    body
}

fn details_body(entries: &[(&str, Option<(f64, f64)>)]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = entries
        .iter()
        .map(|(id, location)| {
            let mut item = serde_json::json!({
                "id": id,
                "snippet": {
                    "title": format!("Video {id}"),
                    "channelTitle": "Canal Sur",
                    "publishedAt": "2024-04-01T10:00:00Z",
                    "thumbnails": { "medium": { "url": format!("https://i.ytimg.com/vi/{id}/mq.jpg") } }
                },
                "statistics": { "viewCount": "1500" },
                "contentDetails": { "duration": "PT4M13S" }
            });
            if let Some((lat, lng)) = location {
                item["recordingDetails"] =
                    serde_json::json!({ "location": { "latitude": lat, "longitude": lng } });
            }
            item
        })
        .collect();
    serde_json::json!({ "items": items })
}

fn quota_body() -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": 403,
            "message": "The request cannot be completed because you have exceeded your quota.",
            "errors": [{ "reason": "quotaExceeded", "domain": "youtube.quota" }]
        }
    })
}

#[tokio::test]
async fn search_by_location_returns_enriched_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("part", "snippet"))
        .and(query_param("type", "video"))
        .and(query_param("q", "flamenco"))
        .and(query_param("location", "37.3891,-5.9845"))
        .and(query_param("locationRadius", "50km"))
        .and(query_param("regionCode", "ES"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["a1", "b2"], Some("NEXT"))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("id", "a1,b2"))
        .and(query_param(
            "part",
            "snippet,statistics,contentDetails,recordingDetails",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_body(&[("a1", None), ("b2", None)])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let page = client
        .search_by_location(&query("flamenco", None))
        .await
        .expect("search should succeed");

    assert_eq!(page.next_page_token.as_deref(), Some("NEXT"));
    assert!(page.has_more());
    assert_eq!(page.results.len(), 2);
    let first = &page.results[0];
    assert_eq!(first.external_video_id, "a1");
    assert_eq!(first.view_count, 1500);
    assert_eq!(first.duration_iso8601.as_deref(), Some("PT4M13S"));
    assert_eq!(
        first.thumbnail_url.as_deref(),
        Some("https://i.ytimg.com/vi/a1/mq.jpg")
    );
    assert!(first.is_search_result);
    assert!(page.results.iter().all(|r| !r.confirmed_location));
    for result in &page.results {
        assert!(haversine_km(sevilla(), result.coordinate) <= 2.0 + 1e-9);
    }
}

#[tokio::test]
async fn blank_query_uses_leading_place_name_and_forwards_page_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Sevilla"))
        .and(query_param("pageToken", "CAUQAA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&[], None)))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let page = client
        .search_by_location(&query("   ", Some("CAUQAA")))
        .await
        .expect("search should succeed");

    assert!(page.results.is_empty());
    assert!(!page.has_more());
}

#[tokio::test]
async fn verified_hits_replace_the_batch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["a1", "b2", "c3"], None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_body(&[
            ("a1", None),
            ("b2", Some((37.39, -5.99))),
            ("c3", None),
        ])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let page = client
        .search_by_location(&query("catedral", None))
        .await
        .expect("search should succeed");

    assert_eq!(page.results.len(), 1);
    let verified = &page.results[0];
    assert_eq!(verified.external_video_id, "b2");
    assert!(verified.confirmed_location);
    assert!(verified.recording_location.is_some());
    assert!(haversine_km(sevilla(), verified.coordinate) <= 2.0 + 1e-9);
}

#[tokio::test]
async fn failed_details_lookup_degrades_to_unconfirmed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["a1"], None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let page = client
        .search_by_location(&query("tapas", None))
        .await
        .expect("details failure must not fail the search");

    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].title, "Video a1");
    assert!(!page.results[0].confirmed_location);
}

#[tokio::test]
async fn quota_error_on_search_is_distinguished() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(quota_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .search_by_location(&query("museos", None))
        .await
        .unwrap_err();
    assert!(
        matches!(err, VideoError::QuotaExceeded(ref reason) if reason == "quotaExceeded"),
        "expected QuotaExceeded, got: {err:?}"
    );
}

#[tokio::test]
async fn quota_error_on_details_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["a1"], None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .search_by_location(&query("museos", None))
        .await
        .unwrap_err();
    assert!(matches!(err, VideoError::QuotaExceeded(_)), "got: {err:?}");
}

#[tokio::test]
async fn fetch_trending_marks_results_as_chart_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("chart", "mostPopular"))
        .and(query_param("regionCode", "MX"))
        .and(query_param("maxResults", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_body(&[("t1", None), ("t2", None)])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let anchor = Coordinate::new(19.43, -99.13).expect("valid coordinate");
    let results = client
        .fetch_trending("mx", anchor)
        .await
        .expect("trending should succeed");

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| !r.is_search_result));
    assert!(results.iter().all(|r| !r.confirmed_location));
    assert!(results
        .iter()
        .all(|r| haversine_km(anchor, r.coordinate) <= 2.0 + 1e-9));
}

#[tokio::test]
async fn fetch_trending_forbidden_is_quota_exceeded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(403).set_body_json(quota_body()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .fetch_trending("ES", sevilla())
        .await
        .unwrap_err();
    assert!(matches!(err, VideoError::QuotaExceeded(_)), "got: {err:?}");
}

#[tokio::test]
async fn search_text_returns_summaries_without_location_bias() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "paella valenciana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["p1"], Some("P2"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_body(&[("p1", None)])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let page = client
        .search_text("paella valenciana", None)
        .await
        .expect("text search should succeed");

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].external_video_id, "p1");
    assert_eq!(page.next_page_token.as_deref(), Some("P2"));

    let requests = server.received_requests().await.expect("recording enabled");
    let search_request = requests
        .iter()
        .find(|r| r.url.path() == "/search")
        .expect("search request");
    assert!(
        !search_request.url.query_pairs().any(|(k, _)| k == "location"),
        "text search must not send a location filter"
    );
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_body(&[("t1", None)])))
        .mount(&server)
        .await;

    let client = YoutubeClient::with_base_url(
        "test-key",
        VideoClientSettings {
            max_retries: 2,
            ..settings()
        },
        &server.uri(),
    )
    .expect("client construction should not fail");

    let results = client
        .fetch_trending("ES", sevilla())
        .await
        .expect("should succeed after one retry");
    assert_eq!(results.len(), 1);
}
