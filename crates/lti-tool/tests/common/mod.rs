//! Shared harness: a tool router wired to a mocked platform.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lti_tool::config::Config;
use lti_tool::lti::ToolConfig;
use lti_tool::models::claims::claim;
use lti_tool::server::ToolServer;

pub const ISSUER: &str = "https://platform.example";
pub const CLIENT_ID: &str = "tool-client-1";
pub const DEPLOYMENT_ID: &str = "deployment-1";
pub const COURSE_ID: &str = "course-v1:edX+DemoX+Demo_Course";
pub const PLATFORM_KID: &str = "platform-key-1";
pub const TOOL_KID: &str = "En9tLMHfiyIMkPltIntzvZMQ0JpJH_PKbLWIQ90EMbE";
pub const TOOL_BASE_URL: &str = "http://tool.test";

pub const PLATFORM_PRIVATE: &str = include_str!("../fixtures/platform_private.pem");
pub const PLATFORM_JWKS: &str = include_str!("../fixtures/platform_jwks.json");
pub const TOOL_PUBLIC: &str = include_str!("../fixtures/tool_public.pem");

pub fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Tool configuration pointing every platform endpoint at `platform_uri`.
pub fn tool_config(platform_uri: &str) -> ToolConfig {
    let json = json!({
        ISSUER: [{
            "default": true,
            "client_id": CLIENT_ID,
            "auth_login_url": format!("{platform_uri}/auth"),
            "auth_token_url": format!("{platform_uri}/token"),
            "key_set_url": format!("{platform_uri}/jwks"),
            "private_key_file": "tool_private.pem",
            "public_key_file": "tool_public.pem",
            "deployment_ids": [DEPLOYMENT_ID]
        }]
    });
    ToolConfig::from_json(&json.to_string(), &fixtures()).unwrap()
}

pub fn build_router(tool_config: ToolConfig) -> Router {
    build_router_with(Config::for_testing(TOOL_BASE_URL), tool_config)
}

pub fn build_router_with(config: Config, tool_config: ToolConfig) -> Router {
    ToolServer::with_tool_config(config, tool_config).unwrap().router()
}

/// Mock platform serving its key set.
pub async fn platform() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLATFORM_JWKS))
        .mount(&server)
        .await;
    server
}

/// Sign launch claims with the platform key.
pub fn sign(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PLATFORM_PRIVATE.as_bytes()).unwrap();
    jsonwebtoken::encode(&header, claims, &key).unwrap()
}

/// Claims of a learner's resource link launch.
pub fn resource_link_claims(nonce: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "iss": ISSUER,
        "aud": CLIENT_ID,
        "sub": "student-42",
        "iat": now,
        "exp": now + 300,
        "nonce": nonce,
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        (claim::MESSAGE_TYPE): "LtiResourceLinkRequest",
        (claim::VERSION): "1.3.0",
        (claim::DEPLOYMENT_ID): DEPLOYMENT_ID,
        (claim::TARGET_LINK_URI): format!("{TOOL_BASE_URL}/launch"),
        (claim::ROLES): ["http://purl.imsglobal.org/vocab/lis/v2/membership#Learner"],
        (claim::CONTEXT): {"id": COURSE_ID, "title": "Demo Course"},
        (claim::RESOURCE_LINK): {"id": "resource-link-1", "title": "Unit 1 Quiz"},
        (claim::TOOL_PLATFORM): {"name": "Open edX", "guid": "platform-guid"},
        (claim::CUSTOM): {"difficulty": "hard"}
    })
}

/// Add an AGS endpoint claim granting `scopes`.
pub fn with_ags(mut claims: Value, scopes: &[&str], lineitem: Option<String>, lineitems: Option<String>) -> Value {
    claims[claim::AGS_ENDPOINT] = json!({
        "scope": scopes,
        "lineitem": lineitem,
        "lineitems": lineitems,
    });
    claims
}

/// A login that has been redirected to the platform.
#[derive(Debug)]
pub struct Login {
    pub state: String,
    pub nonce: String,
    pub location: String,
    pub cookies: Vec<String>,
}

/// `GET /login` as the platform would start it.
pub async fn login(app: &Router) -> Login {
    let uri = format!(
        "/login?{}",
        serde_urlencoded::to_string([("iss", ISSUER), ("login_hint", "student-42"), ("lti_message_hint", "m-1")])
            .unwrap()
    );
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    let query: HashMap<String, String> = url::Url::parse(&location).unwrap().query_pairs().into_owned().collect();

    Login {
        state: query["state"].clone(),
        nonce: query["nonce"].clone(),
        location,
        cookies: set_cookies(&response),
    }
}

/// `POST /launch` with the given token, state and cookies.
pub async fn launch(app: &Router, id_token: &str, state: &str, cookies: &[String]) -> Response<Body> {
    let body = serde_urlencoded::to_string([("id_token", id_token), ("state", state)]).unwrap();
    let mut request = Request::post("/launch").header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if !cookies.is_empty() {
        request = request.header(header::COOKIE, cookies.join("; "));
    }
    app.clone().oneshot(request.body(Body::from(body)).unwrap()).await.unwrap()
}

/// Login then launch a learner; returns the session cookies.
pub async fn launched_session(app: &Router, claims: impl FnOnce(&str) -> Value) -> Vec<String> {
    let login = login(app).await;
    let token = sign(&claims(&login.nonce), PLATFORM_KID);
    let response = launch(app, &token, &login.state, &login.cookies).await;
    assert_eq!(response.status(), StatusCode::OK);
    set_cookies(&response)
}

pub async fn get(app: &Router, uri: &str, cookies: &[String]) -> Response<Body> {
    let mut request = Request::get(uri);
    if !cookies.is_empty() {
        request = request.header(header::COOKIE, cookies.join("; "));
    }
    app.clone().oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: String, cookies: &[String]) -> Response<Body> {
    let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if !cookies.is_empty() {
        request = request.header(header::COOKIE, cookies.join("; "));
    }
    app.clone().oneshot(request.body(Body::from(body)).unwrap()).await.unwrap()
}

/// `name=value` pairs set by the response, skipping removals.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter(|pair| !pair.ends_with('='))
        .map(str::to_string)
        .collect()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
