#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use url::Url;

use mission_portal::config::{
    AppConfig, Environment, IdentityConfig, ServerConfig, SessionConfig, UpstreamConfig,
};

pub const ACCESS_TOKEN: &str = "spo-token";
pub const RESOURCE_ID: &str = "https://contoso.sharepoint.com";
pub const AUTH_CODE: &str = "good-code";
pub const COOKIE_NAME: &str = "mp_session";

/// Bind an axum router on an ephemeral loopback port
pub async fn serve(router: Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{}", addr))
}

/// An address nothing listens on
pub async fn closed_port_url() -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

pub fn mission(id: Value, title: &str, launch: &str, commander: &str) -> Value {
    json!({
        "ID": id,
        "Title": title,
        "Rocket": "Saturn V",
        "LaunchDate": launch,
        "Commander": commander,
        "SrPilotCmPilot": "Michael Collins",
        "PilotLmPilot": "Buzz Aldrin"
    })
}

/// Records in the order the list returns them for `$orderby=LaunchDate`
pub fn fixtures() -> Vec<Value> {
    vec![
        mission(json!("8"), "Apollo 8", "1968-12-21T12:51:00Z", "Frank Borman"),
        mission(json!(11), "Apollo 11", "1969-07-16T13:32:00Z", "Neil Armstrong"),
        mission(json!("13"), "Apollo 13", "1970-04-11T19:13:00Z", "Jim Lovell"),
    ]
}

/// Stand-in for the SharePoint list REST endpoint
///
/// `/items` lists, `/items(<id>)` reads one record. Requests need the bearer
/// token (401 otherwise) and `Accept: application/json` (406 otherwise).
/// Prefixes change behaviour:
/// `/empty`, `/broken` (non-JSON body), `/slow` (answers after 3s),
/// `/forbidden` (403).
#[derive(Clone, Default)]
pub struct MockUpstream {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub async fn spawn() -> Result<Self> {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .fallback(upstream_handler)
            .with_state(requests.clone());
        let base_url = serve(router).await?;
        Ok(Self { base_url, requests })
    }

    pub fn endpoint(&self, prefix: &str) -> Url {
        Url::parse(&format!("{}{}/items", self.base_url, prefix)).expect("mock endpoint")
    }

    /// Path and query of every request received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log").clone()
    }
}

async fn upstream_handler(
    State(requests): State<Arc<Mutex<Vec<String>>>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    requests.lock().expect("request log").push(target);

    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", ACCESS_TOKEN))
        .unwrap_or(false);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);
    if !wants_json {
        return StatusCode::NOT_ACCEPTABLE.into_response();
    }

    let path = uri.path();
    let (prefix, rest) = match path.find("/items") {
        Some(idx) => (&path[..idx], &path[idx..]),
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    match prefix {
        "/forbidden" => return StatusCode::FORBIDDEN.into_response(),
        "/broken" => return (StatusCode::OK, "<html>maintenance</html>").into_response(),
        "/slow" => tokio::time::sleep(Duration::from_secs(3)).await,
        _ => {}
    }

    if rest == "/items" {
        let value = if prefix == "/empty" { Vec::new() } else { fixtures() };
        return Json(json!({ "value": value })).into_response();
    }

    let id = rest
        .strip_prefix("/items(")
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or_default();
    let found = fixtures().into_iter().find(|record| match &record["ID"] {
        Value::String(s) => s == id,
        other => other.to_string() == id,
    });
    match found {
        Some(record) => Json(record).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Stand-in for the identity provider's token endpoint at `/token`
pub struct MockIdentityProvider {
    pub base_url: String,
}

impl MockIdentityProvider {
    pub async fn spawn() -> Result<Self> {
        let router = Router::new().route("/token", post(token_handler));
        let base_url = serve(router).await?;
        Ok(Self { base_url })
    }

    pub fn authorize_url(&self) -> Url {
        Url::parse(&format!("{}/authorize", self.base_url)).expect("authorize url")
    }

    pub fn token_url(&self) -> Url {
        Url::parse(&format!("{}/token", self.base_url)).expect("token url")
    }
}

async fn token_handler(Form(form): Form<HashMap<String, String>>) -> Response {
    let grant = form.get("grant_type").map(String::as_str);
    let code = form.get("code").map(String::as_str);

    if grant != Some("authorization_code") || code != Some(AUTH_CODE) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "AADSTS70008: The provided authorization code has expired."
            })),
        )
            .into_response();
    }

    let id_token = encode(
        &Header::default(),
        &json!({ "oid": "0f1e2d3c", "name": "Gene Kranz", "aud": "portal", "exp": 4102444800u64 }),
        &EncodingKey::from_secret(b"provider-signing-key"),
    )
    .expect("id token");

    Json(json!({
        "token_type": "Bearer",
        "access_token": ACCESS_TOKEN,
        "expires_in": "3599",
        "id_token": id_token,
        "resource": form.get("resource").cloned().unwrap_or_default()
    }))
    .into_response()
}

pub fn upstream_config(endpoint: Url) -> UpstreamConfig {
    UpstreamConfig {
        endpoint: Some(endpoint),
        resource_id: RESOURCE_ID.to_string(),
        timeout_secs: 5,
    }
}

pub fn app_config(upstream: &MockUpstream, idp: &MockIdentityProvider) -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        server: ServerConfig {
            port: 0,
            enable_cors: false,
        },
        upstream: upstream_config(upstream.endpoint("")),
        identity: IdentityConfig {
            authorize_url: Some(idp.authorize_url()),
            token_url: Some(idp.token_url()),
            client_id: "portal".to_string(),
            client_secret: "portal-secret".to_string(),
            redirect_uri: "http://localhost/auth/callback".to_string(),
        },
        session: SessionConfig {
            secret: "integration-test-secret-0123456789abcdef".to_string(),
            cookie_name: COOKIE_NAME.to_string(),
            ttl_hours: 1,
            secure_cookie: false,
        },
    }
}

/// HTTP client that hands redirects back to the test instead of following them
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("test client")
}

pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// `name=value` part of the response's Set-Cookie header for `name`
pub fn cookie_pair(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
        .find(|pair| pair.starts_with(&prefix))
}

pub fn challenge_cookie_name() -> String {
    format!("{}_challenge", COOKIE_NAME)
}
