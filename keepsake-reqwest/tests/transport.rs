//! Integration tests for ReqwestTransport using wiremock.

use keepsake::{
    CachePolicy, Client, ClientConfig, ErrorAction, FetchError, MemoryBackend, ResourceAddress,
    Transport,
};
use keepsake_reqwest::ReqwestTransport;
use serde::Deserialize;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Article {
    id: u64,
    title: String,
}

fn transport(server: &MockServer) -> ReqwestTransport {
    ReqwestTransport::new(reqwest::Client::new()).base_url(server.uri())
}

#[tokio::test]
async fn test_body_returned_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ \"id\" : 1 }\n"))
        .expect(1)
        .mount(&server)
        .await;

    let body = transport(&server)
        .get(&ResourceAddress::new("/raw"))
        .await
        .unwrap();
    assert_eq!(body.as_ref(), b"{ \"id\" : 1 }\n");
}

#[tokio::test]
async fn test_error_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let error = transport(&server)
        .get(&ResourceAddress::new("/missing"))
        .await
        .unwrap_err();
    assert_eq!(error.status(), Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));
}

#[tokio::test]
async fn test_query_parameters_reach_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles"))
        .and(query_param("page", "2"))
        .and(query_param("q", "rust & tokio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 2,
            "title": "Found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder()
        .backend(MemoryBackend::new())
        .transport(transport(&server))
        .build();
    let address = ResourceAddress::builder("/articles")
        .param("q", "rust & tokio")
        .param("page", 2)
        .build();

    let article: Article = client
        .fetch(&address, CachePolicy::FreshOrFail, None)
        .await
        .unwrap();
    assert_eq!(
        article,
        Article {
            id: 2,
            title: "Found".into()
        }
    );
}

#[tokio::test]
async fn test_server_outage_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1,
            "title": "Cached"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/articles/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = Client::builder()
        .backend(MemoryBackend::new())
        .transport(transport(&server))
        .config(ClientConfig::default().error_action(ErrorAction::IgnoreAndNotify))
        .build();
    let mut notices = client.subscribe();
    let address = ResourceAddress::new("/articles/1");

    let first: Article = client.get(&address).await.unwrap();
    let second: Article = client.get(&address).await.unwrap();
    assert_eq!(first, second);
    assert!(notices.try_recv().unwrap().entry().is_some());

    let error = client
        .fetch::<Article>(&address, CachePolicy::FreshOrFail, None)
        .await
        .unwrap_err();
    let FetchError::Transport(error) = error else {
        panic!("expected transport error, got {error:?}");
    };
    assert_eq!(error.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
}
