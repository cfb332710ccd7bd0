#![allow(clippy::unwrap_used)]

use anyhow::Result;
use registrar::{
    config::AppConfig,
    events::{EventBus, LoginRedirect, UiEvent, LOGIN_PATH, SESSION_EXPIRED_NOTICE},
    gateway::{ApiGateway, ApiRequest, ErrorBody, Gateway, GatewayError},
    session::SessionStore,
};
use secrecy::SecretString;
use serde_json::json;
use std::{net::TcpListener, sync::Arc, time::Duration};
use tokio::sync::broadcast::error::TryRecvError;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        api_base_url: format!("{}/api", server.uri()),
        ..AppConfig::default()
    }
}

fn authenticated_store() -> Arc<SessionStore> {
    let store = SessionStore::in_memory();
    store
        .set(SecretString::from("abc123".to_string()), json!({"id": 1}))
        .unwrap();
    Arc::new(store)
}

#[tokio::test]
async fn attaches_bearer_token_when_session_present() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(header("Authorization", "Bearer abc123"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = ApiGateway::new(&config_for(&server), authenticated_store(), EventBus::new())?;
    let payload = gateway.send(ApiRequest::get("/user")).await?;

    assert_eq!(payload, json!({"id": 1, "name": "Ada"}));
    Ok(())
}

#[tokio::test]
async fn sends_anonymous_request_without_token() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let store = Arc::new(SessionStore::in_memory());
    let gateway = ApiGateway::new(&config_for(&server), store, EventBus::new())?;
    gateway.send(ApiRequest::get("/public")).await?;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    let agent = requests[0]
        .headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(agent.starts_with("registrar/"));
    Ok(())
}

#[tokio::test]
async fn empty_token_sends_no_authorization_header() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;

    let store = Arc::new(SessionStore::in_memory());
    store.set(SecretString::from(String::new()), json!({"id": 1}))?;
    assert!(!store.is_authenticated());

    let gateway = ApiGateway::new(&config_for(&server), store, EventBus::new())?;
    gateway.send(ApiRequest::get("/user")).await?;

    let Some(requests) = server.received_requests().await else {
        panic!("request recording disabled");
    };
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    Ok(())
}

#[tokio::test]
async fn unauthorized_clears_session_and_signals_once() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthenticated."})))
        .mount(&server)
        .await;

    let store = authenticated_store();
    let events = EventBus::new();
    events.set_location("/orders");
    let mut rx = events.subscribe();
    let gateway = ApiGateway::new(&config_for(&server), store.clone(), events)?;

    let result = gateway.send(ApiRequest::get("/orders")).await;

    assert_eq!(
        result,
        Err(GatewayError::Server {
            status: 401,
            body: ErrorBody::Message("Unauthenticated.".to_string()),
            session_expired: true,
        })
    );
    assert!(store.get().is_none());
    assert!(store.user().is_none());
    assert_eq!(
        rx.try_recv()?,
        UiEvent::SessionExpired {
            redirect: Some(LoginRedirect {
                path: LOGIN_PATH.to_string(),
                notice: SESSION_EXPIRED_NOTICE.to_string(),
            })
        }
    );
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    Ok(())
}

#[tokio::test]
async fn every_unauthorized_response_signals() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    // already anonymous: nothing to clear, but the signal still fires
    let store = Arc::new(SessionStore::in_memory());
    let events = EventBus::new();
    let mut rx = events.subscribe();
    let gateway = ApiGateway::new(&config_for(&server), store.clone(), events)?;

    for _ in 0..2 {
        let result = gateway.send(ApiRequest::get("/orders")).await;
        assert!(matches!(
            result,
            Err(GatewayError::Server {
                status: 401,
                session_expired: true,
                ..
            })
        ));
    }

    assert!(matches!(rx.try_recv()?, UiEvent::SessionExpired { .. }));
    assert!(matches!(rx.try_recv()?, UiEvent::SessionExpired { .. }));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    assert!(!store.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn unauthorized_on_login_page_does_not_redirect() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})))
        .mount(&server)
        .await;

    let events = EventBus::new();
    events.set_location(LOGIN_PATH);
    let mut rx = events.subscribe();
    let gateway = ApiGateway::new(&config_for(&server), authenticated_store(), events)?;

    let result = gateway
        .send(ApiRequest::post("/login").json(json!({"email": "a@b.c"})))
        .await;

    assert!(result.is_err());
    assert_eq!(rx.try_recv()?, UiEvent::SessionExpired { redirect: None });
    Ok(())
}

#[tokio::test]
async fn server_error_leaves_session_intact() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let store = authenticated_store();
    let events = EventBus::new();
    let mut rx = events.subscribe();
    let gateway = ApiGateway::new(&config_for(&server), store.clone(), events)?;

    let result = gateway.send(ApiRequest::get("/orders")).await;

    assert_eq!(
        result,
        Err(GatewayError::Server {
            status: 503,
            body: ErrorBody::Unknown(Some("upstream unavailable".to_string())),
            session_expired: false,
        })
    );
    assert!(store.is_authenticated());
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    Ok(())
}

#[tokio::test]
async fn empty_success_body_decodes_to_null() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let gateway = ApiGateway::new(&config_for(&server), authenticated_store(), EventBus::new())?;
    let payload = gateway.send(ApiRequest::post("/logout")).await?;

    assert_eq!(payload, serde_json::Value::Null);
    Ok(())
}

#[tokio::test]
async fn slow_response_times_out_as_network_error() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = AppConfig {
        timeout: Duration::from_millis(100),
        ..config_for(&server)
    };
    let store = authenticated_store();
    let gateway = ApiGateway::new(&config, store.clone(), EventBus::new())?;

    let result = gateway.send(ApiRequest::get("/slow")).await;

    assert!(matches!(
        result,
        Err(GatewayError::Network {
            timed_out: true,
            ..
        })
    ));
    assert!(store.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn connection_refused_is_network_error() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.port()
    };

    let config = AppConfig {
        api_base_url: format!("http://127.0.0.1:{port}/api"),
        ..AppConfig::default()
    };
    let gateway = ApiGateway::new(&config, authenticated_store(), EventBus::new())?;

    let result = gateway.send(ApiRequest::get("/user")).await;

    assert!(matches!(
        result,
        Err(GatewayError::Network {
            timed_out: false,
            ..
        })
    ));
    Ok(())
}
