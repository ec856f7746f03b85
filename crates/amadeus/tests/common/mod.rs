//! Common test utilities for integration tests

use std::collections::HashMap;

use amadeus::{Client, Options};
use serde_json::json;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/v1/security/oauth2/token";

/// Options pointing the client at a local mock server over plain HTTP
pub fn local_options(server: &MockServer) -> Options {
    Options::new()
        .client_id("123")
        .client_secret("234")
        .host("127.0.0.1")
        .port(server.address().port())
        .ssl(false)
}

/// Builds a client that ignores the process environment
pub fn local_client(server: &MockServer) -> Client {
    Client::with_env(local_options(server), &HashMap::<String, String>::new())
        .expect("client should build")
}

/// Mounts a token endpoint that expects the client-credentials form body
/// and must be hit exactly `times` times
pub async fn mount_token(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string(
            "grant_type=client_credentials&client_id=123&client_secret=234",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": token, "expires_in": 1799 })),
        )
        .expect(times)
        .mount(server)
        .await;
}
