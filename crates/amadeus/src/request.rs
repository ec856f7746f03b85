//! Wire-level request construction
//!
//! A `Request` is built once from a logical call and never changes afterwards.
//! Everything the transport needs (scheme, query path, headers, body) is
//! derived in [`Request::new`]; no I/O happens here.

use std::fmt;

use serde_json::Value;

/// Endpoints that behave as GET but must be sent as POST to carry large bodies
pub const METHOD_OVERRIDE_PATHS: [&str; 6] = [
    "/v2/shopping/flight-offers",
    "/v1/shopping/seatmaps",
    "/v1/shopping/availability/flight-availabilities",
    "/v2/shopping/flight-offers/prediction",
    "/v1/shopping/flight-offers/pricing",
    "/v1/shopping/flight-offers/upselling",
];

pub const LIBRARY_NAME: &str = "amadeus-rust";
pub const PLATFORM: &str = "rust";

/// Version of this library, reported in the User-Agent
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const ACCEPT: &str = "application/json, application/vnd.amadeus+json";
const VENDOR_JSON: &str = "application/vnd.amadeus+json";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Platform version reported in the User-Agent
///
/// This is the crate's declared minimum supported Rust version
/// (`rust-version` in its manifest), not the compiler that built it.
pub fn language_version() -> &'static str {
    match option_env!("CARGO_PKG_RUST_VERSION") {
        Some(version) if !version.is_empty() => version,
        _ => "unknown",
    }
}

/// HTTP verb of a logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for building a [`Request`]
#[derive(Debug, Clone)]
pub struct RequestParams {
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    pub verb: Verb,
    pub path: String,
    pub params: Value,
    pub bearer_token: Option<String>,
    pub client_version: String,
    pub language_version: String,
    pub app_id: Option<String>,
    pub app_version: Option<String>,
}

/// Body to send with a request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// Already form-urlencoded (token requests)
    Form(String),
    /// Serialized by the transport as the declared vendor JSON type
    Json(Value),
}

impl RequestBody {
    /// Serializes the body for the wire. A JSON string is sent verbatim so
    /// callers can pass pre-encoded payloads.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Form(form) => Some(form.clone().into_bytes()),
            RequestBody::Json(Value::String(raw)) => Some(raw.clone().into_bytes()),
            RequestBody::Json(value) => Some(value.to_string().into_bytes()),
        }
    }
}

/// Connection options handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportOptions {
    pub host: String,
    pub port: u16,
    /// `https:` or `http:`
    pub protocol: String,
    pub path: String,
    pub method: Verb,
    pub headers: Vec<(String, String)>,
}

/// A fully compiled API request
#[derive(Clone)]
pub struct Request {
    host: String,
    port: u16,
    ssl: bool,
    scheme: &'static str,
    verb: Verb,
    path: String,
    params: Value,
    query_path: String,
    bearer_token: Option<String>,
    client_version: String,
    language_version: String,
    app_id: Option<String>,
    app_version: Option<String>,
    headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(input: RequestParams) -> Self {
        let scheme = if input.ssl { "https" } else { "http" };
        let query_path = full_query_path(input.verb, &input.path, &input.params);

        let mut request = Self {
            host: input.host,
            port: input.port,
            ssl: input.ssl,
            scheme,
            verb: input.verb,
            path: input.path,
            params: input.params,
            query_path,
            bearer_token: input.bearer_token.filter(|token| !token.is_empty()),
            client_version: input.client_version,
            language_version: input.language_version,
            app_id: input.app_id.filter(|id| !id.is_empty()),
            app_version: input.app_version,
            headers: Vec::new(),
        };

        request.headers = request.build_headers();
        request
    }

    fn build_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("User-Agent".to_string(), self.user_agent()),
            ("Accept".to_string(), ACCEPT.to_string()),
        ];

        if let Some(token) = &self.bearer_token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let content_type = if self.is_token_request() {
            FORM_URLENCODED
        } else {
            VENDOR_JSON
        };
        headers.push(("Content-Type".to_string(), content_type.to_string()));

        if self.verb == Verb::Post && METHOD_OVERRIDE_PATHS.contains(&self.path.as_str()) {
            headers.push(("X-HTTP-Method-Override".to_string(), "GET".to_string()));
        }

        headers
    }

    /// Format: `library/version language/version[ app/version]`
    fn user_agent(&self) -> String {
        let user_agent = format!(
            "{LIBRARY_NAME}/{} {PLATFORM}/{}",
            self.client_version, self.language_version
        );
        match &self.app_id {
            Some(app_id) => format!(
                "{user_agent} {app_id}/{}",
                self.app_version.as_deref().unwrap_or_default()
            ),
            None => user_agent,
        }
    }

    // POST without a bearer token only happens when fetching the token itself
    fn is_token_request(&self) -> bool {
        self.verb == Verb::Post && self.bearer_token.is_none()
    }

    pub fn body(&self) -> RequestBody {
        if self.verb != Verb::Post {
            RequestBody::Empty
        } else if self.bearer_token.is_none() {
            RequestBody::Form(encode_params(&self.params))
        } else {
            RequestBody::Json(self.params.clone())
        }
    }

    pub fn options(&self) -> TransportOptions {
        TransportOptions {
            host: self.host.clone(),
            port: self.port,
            protocol: format!("{}:", self.scheme),
            path: self.query_path.clone(),
            method: self.verb,
            headers: self.headers.clone(),
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn ssl(&self) -> bool {
        self.ssl
    }

    pub fn scheme(&self) -> &'static str {
        self.scheme
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn query_path(&self) -> &str {
        &self.query_path
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    pub fn client_version(&self) -> &str {
        &self.client_version
    }

    pub fn language_version(&self) -> &str {
        &self.language_version
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    pub fn app_version(&self) -> Option<&str> {
        self.app_version.as_deref()
    }
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for Request {
    /// Hides the bearer token, the `Authorization` header and the form params
    /// of token requests, which carry the client secret
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case("authorization") {
                    (name.as_str(), REDACTED)
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();
        let params: &dyn fmt::Debug = if self.is_token_request() {
            &REDACTED
        } else {
            &self.params
        };

        f.debug_struct("Request")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("scheme", &self.scheme)
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("query_path", &self.query_path)
            .field("params", params)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| REDACTED))
            .field("client_version", &self.client_version)
            .field("language_version", &self.language_version)
            .field("app_id", &self.app_id)
            .field("app_version", &self.app_version)
            .field("headers", &headers)
            .finish()
    }
}

fn full_query_path(verb: Verb, path: &str, params: &Value) -> String {
    if verb == Verb::Post {
        return path.to_string();
    }
    format!("{path}?{}", encode_params(params))
}

/// Encodes params as a query string in bracket notation: nested objects become
/// `a[b]=c`, arrays become `a[0]=x`, and null values become `key=`.
/// Only a top-level object produces pairs.
pub fn encode_params(params: &Value) -> String {
    let mut pairs = Vec::new();
    if let Value::Object(map) = params {
        for (key, value) in map {
            push_pairs(&mut pairs, key.clone(), value);
        }
    }
    pairs.join("&")
}

fn push_pairs(pairs: &mut Vec<String>, key: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (child, value) in map {
                push_pairs(pairs, format!("{key}[{child}]"), value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                push_pairs(pairs, format!("{key}[{index}]"), value);
            }
        }
        Value::Null => pairs.push(format!("{}=", urlencoding::encode(&key))),
        Value::String(text) => pairs.push(format!(
            "{}={}",
            urlencoding::encode(&key),
            urlencoding::encode(text)
        )),
        scalar => pairs.push(format!(
            "{}={}",
            urlencoding::encode(&key),
            urlencoding::encode(&scalar.to_string())
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(verb: Verb, path: &str, params: Value, token: Option<&str>) -> RequestParams {
        RequestParams {
            host: "test.api.amadeus.com".to_string(),
            port: 443,
            ssl: true,
            verb,
            path: path.to_string(),
            params,
            bearer_token: token.map(str::to_string),
            client_version: "1.2.3".to_string(),
            language_version: "1.75".to_string(),
            app_id: None,
            app_version: None,
        }
    }

    fn get(path: &str, query: Value) -> Request {
        Request::new(params(Verb::Get, path, query, Some("token")))
    }

    #[test]
    fn language_version_is_declared_msrv() {
        assert_eq!(language_version(), "1.75");
    }

    #[test]
    fn debug_output_hides_credentials() {
        let token_request = Request::new(params(
            Verb::Post,
            "/v1/security/oauth2/token",
            json!({ "grant_type": "client_credentials", "client_secret": "s3cr3t" }),
            None,
        ));
        let api_request = get("/foo", json!({ "keyword": "LON" }));

        let token_debug = format!("{token_request:#?}");
        let api_debug = format!("{api_request:?}");

        assert!(!token_debug.contains("s3cr3t"));
        assert!(token_debug.contains("<redacted>"));
        assert!(!api_debug.contains("Bearer token"));
        assert!(api_debug.contains("\"Authorization\", \"<redacted>\""));
        assert!(api_debug.contains("LON"));
    }

    #[test]
    fn get_appends_query_to_path() {
        let request = get("/foo/bar", json!({ "baz": "qux" }));
        assert_eq!(request.query_path(), "/foo/bar?baz=qux");
    }

    #[test]
    fn post_keeps_path_unmodified() {
        let request = Request::new(params(
            Verb::Post,
            "/foo/bar",
            json!({ "baz": "qux" }),
            Some("token"),
        ));
        assert_eq!(request.query_path(), "/foo/bar");
    }

    #[test]
    fn delete_appends_query_to_path() {
        let request = Request::new(params(
            Verb::Delete,
            "/v1/booking/flight-orders/abc",
            json!({}),
            Some("token"),
        ));
        assert_eq!(request.query_path(), "/v1/booking/flight-orders/abc?");
        assert_eq!(request.body(), RequestBody::Empty);
    }

    #[test]
    fn scheme_follows_ssl() {
        let secure = get("/foo", json!({}));
        assert_eq!(secure.scheme(), "https");
        assert_eq!(secure.options().protocol, "https:");

        let mut input = params(Verb::Get, "/foo", json!({}), Some("token"));
        input.ssl = false;
        let plain = Request::new(input);
        assert_eq!(plain.scheme(), "http");
        assert_eq!(plain.options().protocol, "http:");
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let request = get(
            "/v1/reference-data/locations",
            json!({ "keyword": "new york", "subType": "CITY,AIRPORT", "page[limit]": 5 }),
        );
        assert_eq!(
            request.query_path(),
            concat!(
                "/v1/reference-data/locations?keyword=new%20york",
                "&subType=CITY%2CAIRPORT&page%5Blimit%5D=5"
            )
        );
    }

    #[test]
    fn nested_params_use_bracket_keys() {
        let encoded = encode_params(&json!({
            "page": { "offset": 10 },
            "ids": ["a", "b"],
            "flag": true,
            "none": null
        }));
        assert_eq!(
            encoded,
            "page%5Boffset%5D=10&ids%5B0%5D=a&ids%5B1%5D=b&flag=true&none="
        );
    }

    #[test]
    fn non_object_params_encode_to_nothing() {
        assert_eq!(encode_params(&Value::Null), "");
        assert_eq!(encode_params(&json!("raw")), "");
    }

    #[test]
    fn default_headers_are_present() {
        let request = get("/foo", json!({}));
        assert_eq!(
            request.header("user-agent"),
            Some("amadeus-rust/1.2.3 rust/1.75")
        );
        assert_eq!(
            request.header("Accept"),
            Some("application/json, application/vnd.amadeus+json")
        );
    }

    #[test]
    fn user_agent_includes_custom_app() {
        let mut input = params(Verb::Get, "/foo", json!({}), Some("token"));
        input.app_id = Some("cli".to_string());
        input.app_version = Some("0.9".to_string());
        let request = Request::new(input);

        assert_eq!(
            request.header("User-Agent"),
            Some("amadeus-rust/1.2.3 rust/1.75 cli/0.9")
        );
    }

    #[test]
    fn bearer_token_adds_authorization_and_vendor_content_type() {
        let request = get("/foo", json!({}));
        assert_eq!(request.header("Authorization"), Some("Bearer token"));
        assert_eq!(
            request.header("Content-Type"),
            Some("application/vnd.amadeus+json")
        );
    }

    #[test]
    fn token_request_is_form_encoded() {
        let request = Request::new(params(
            Verb::Post,
            "/v1/security/oauth2/token",
            json!({
                "grant_type": "client_credentials",
                "client_id": "123",
                "client_secret": "234"
            }),
            None,
        ));

        assert!(request.header("Authorization").is_none());
        assert_eq!(
            request.header("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(
            request.body(),
            RequestBody::Form(
                "grant_type=client_credentials&client_id=123&client_secret=234".to_string()
            )
        );
    }

    #[test]
    fn unauthenticated_get_uses_vendor_content_type() {
        let request = Request::new(params(Verb::Get, "/foo", json!({}), None));
        assert_eq!(
            request.header("Content-Type"),
            Some("application/vnd.amadeus+json")
        );
    }

    #[test]
    fn authenticated_post_passes_params_through_as_json() {
        let body = json!({ "data": { "type": "flight-order" } });
        let request = Request::new(params(
            Verb::Post,
            "/v1/booking/flight-orders",
            body.clone(),
            Some("token"),
        ));

        assert_eq!(request.body(), RequestBody::Json(body.clone()));
        assert_eq!(
            request.body().to_bytes(),
            Some(body.to_string().into_bytes())
        );
    }

    #[test]
    fn raw_json_string_is_sent_verbatim() {
        let raw = r#"{"originDestinations":[]}"#;
        let request = Request::new(params(
            Verb::Post,
            "/v2/shopping/flight-offers",
            Value::String(raw.to_string()),
            Some("token"),
        ));
        assert_eq!(request.body().to_bytes(), Some(raw.as_bytes().to_vec()));
    }

    #[test]
    fn get_has_no_body() {
        assert_eq!(get("/foo", json!({ "a": 1 })).body().to_bytes(), None);
    }

    #[test]
    fn post_to_override_path_adds_method_override() {
        for path in METHOD_OVERRIDE_PATHS {
            let request = Request::new(params(Verb::Post, path, json!({}), Some("token")));
            assert_eq!(
                request.header("X-HTTP-Method-Override"),
                Some("GET"),
                "missing override for {path}"
            );
        }
    }

    #[test]
    fn post_to_other_path_has_no_method_override() {
        let request = Request::new(params(
            Verb::Post,
            "/v1/booking/flight-orders",
            json!({}),
            Some("token"),
        ));
        assert!(request.header("X-HTTP-Method-Override").is_none());
    }

    #[test]
    fn get_to_override_path_has_no_method_override() {
        let request = get("/v2/shopping/flight-offers", json!({}));
        assert!(request.header("X-HTTP-Method-Override").is_none());
    }

    #[test]
    fn options_mirror_request() {
        let request = get("/foo", json!({ "a": "b" }));
        let options = request.options();

        assert_eq!(options.host, "test.api.amadeus.com");
        assert_eq!(options.port, 443);
        assert_eq!(options.path, "/foo?a=b");
        assert_eq!(options.method, Verb::Get);
        assert_eq!(options.headers, request.headers().to_vec());
    }

    #[test]
    fn verb_display_matches_wire_name() {
        assert_eq!(Verb::Get.to_string(), "GET");
        assert_eq!(Verb::Post.to_string(), "POST");
        assert_eq!(Verb::Delete.to_string(), "DELETE");
    }
}
