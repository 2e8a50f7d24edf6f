//! Transport primitives for the open-platform HTTP API.
//!
//! [`Transport`] is the client's only dependency on an HTTP stack. Implementations perform
//! exactly one network call per invocation and never retry, time out, or interpret the
//! payload; those concerns belong to the request client layered on top. The crate ships
//! [`ReqwestTransport`] behind the `reqwest` feature, and downstream crates can plug in any
//! other stack by implementing the trait.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::CONTENT_TYPE;
// self
use crate::{_prelude::*, error::TransportError};

/// Endpoint serving the production open-platform API.
pub const OPEN_PLATFORM_ENDPOINT: &str = "https://api.weixin.qq.com";

/// JSON object carrying request parameters for both query and body serialization.
pub type JsonParams = serde_json::Map<String, JsonValue>;

/// Boxed future returned by [`Transport`] implementations.
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// HTTP methods used by the platform API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
}
impl Method {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Abstraction over HTTP transports executing raw platform calls.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Issues a single HTTP call against the remote API.
	///
	/// `path` must start with `/`; violations fail before any network call. For GET requests
	/// `params` are serialized into the query string; for POST requests they are JSON-encoded
	/// into the body. The bearer token, when present, always travels as the `access_token`
	/// query parameter.
	fn request<'a>(
		&'a self,
		method: Method,
		path: &'a str,
		access_token: Option<&'a str>,
		params: &'a JsonParams,
	) -> TransportFuture<'a, RawResponse>;
}

/// Opaque response captured from the transport layer.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// HTTP status code returned by the platform.
	pub status: u16,
	/// Content-Type header value, when present.
	pub content_type: Option<String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Returns `true` when the Content-Type header indicates a JSON body.
	pub fn is_json(&self) -> bool {
		self.content_type
			.as_deref()
			.and_then(|value| value.split(';').next())
			.map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
			.unwrap_or(false)
	}

	/// Decodes the body as JSON into `T`.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::ResponseParse { source, status: Some(self.status) })
	}
}

/// Thin reqwest-backed [`Transport`] bound to a fixed API endpoint.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	endpoint: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Creates a transport bound to the provided endpoint with a default reqwest client.
	pub fn new(endpoint: Url) -> Self {
		Self::with_client(ReqwestClient::default(), endpoint)
	}

	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, endpoint: Url) -> Self {
		Self { client, endpoint }
	}

	/// Creates a transport bound to the production [`OPEN_PLATFORM_ENDPOINT`].
	pub fn open_platform() -> Result<Self, TransportError> {
		Ok(Self::new(Url::parse(OPEN_PLATFORM_ENDPOINT)?))
	}

	/// Endpoint every request path is resolved against.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn request<'a>(
		&'a self,
		method: Method,
		path: &'a str,
		access_token: Option<&'a str>,
		params: &'a JsonParams,
	) -> TransportFuture<'a, RawResponse> {
		Box::pin(async move {
			let request = match method {
				Method::Get => {
					let url = prepare_url(&self.endpoint, path, access_token, Some(params))?;

					self.client.get(url)
				},
				Method::Post => {
					let url = prepare_url(&self.endpoint, path, access_token, None)?;

					self.client.post(url).json(params)
				},
			};
			let response = request.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let content_type = response
				.headers()
				.get(CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned);
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(RawResponse { status, content_type, body })
		})
	}
}

/// Validates the path and composes the full request URL.
pub(crate) fn prepare_url(
	endpoint: &Url,
	path: &str,
	access_token: Option<&str>,
	query_params: Option<&JsonParams>,
) -> Result<Url, TransportError> {
	if !path.starts_with('/') {
		return Err(TransportError::InvalidPath { path: path.to_owned() });
	}

	let mut url = endpoint.join(path)?;

	{
		let mut pairs = url.query_pairs_mut();

		if let Some(params) = query_params {
			for (key, value) in params {
				pairs.append_pair(key, &query_value(value));
			}
		}
		if let Some(token) = access_token {
			pairs.append_pair("access_token", token);
		}
	}

	Ok(url)
}

fn query_value(value: &JsonValue) -> String {
	match value {
		JsonValue::String(text) => text.clone(),
		JsonValue::Null => String::new(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoint() -> Url {
		Url::parse("https://api.example.test").expect("Endpoint fixture should parse.")
	}

	fn params(value: JsonValue) -> JsonParams {
		value.as_object().cloned().expect("Parameter fixture should be a JSON object.")
	}

	#[test]
	fn prepare_url_rejects_paths_without_leading_slash() {
		let err = prepare_url(&endpoint(), "cgi-bin/token", None, None)
			.expect_err("Paths without a leading slash must be rejected.");

		assert!(matches!(err, TransportError::InvalidPath { path } if path == "cgi-bin/token"));
	}

	#[test]
	fn prepare_url_serializes_query_params_and_token() {
		let query = params(serde_json::json!({
			"appid": "wx-demo",
			"grant_type": "client_credential",
		}));
		let url = prepare_url(&endpoint(), "/cgi-bin/token", Some("token-1"), Some(&query))
			.expect("URL should compose for a valid path.");

		assert_eq!(url.path(), "/cgi-bin/token");
		assert_eq!(
			url.query(),
			Some("appid=wx-demo&grant_type=client_credential&access_token=token-1"),
		);
	}

	#[test]
	fn prepare_url_stringifies_non_string_values() {
		let query = params(serde_json::json!({ "force_refresh": true, "offset": 3 }));
		let url = prepare_url(&endpoint(), "/demo", None, Some(&query))
			.expect("URL should compose for a valid path.");

		assert_eq!(url.query(), Some("force_refresh=true&offset=3"));
	}

	#[test]
	fn prepare_url_keeps_token_out_of_post_query() {
		let url = prepare_url(&endpoint(), "/cgi-bin/upload", Some("token-2"), None)
			.expect("URL should compose for a valid path.");

		assert_eq!(url.query(), Some("access_token=token-2"));
	}

	#[test]
	fn is_json_inspects_content_type_only() {
		let json = RawResponse {
			status: 200,
			content_type: Some("application/json; charset=utf-8".into()),
			body: b"{}".to_vec(),
		};
		let image = RawResponse {
			status: 200,
			content_type: Some("image/jpeg".into()),
			body: b"\xff\xd8\xff".to_vec(),
		};
		let missing = RawResponse { status: 200, content_type: None, body: Vec::new() };

		assert!(json.is_json());
		assert!(!image.is_json());
		assert!(!missing.is_json());
	}

	#[test]
	fn json_decoding_reports_parse_failures() {
		let response = RawResponse {
			status: 200,
			content_type: Some("application/json".into()),
			body: b"not-json".to_vec(),
		};
		let err = response
			.json::<JsonValue>()
			.expect_err("Malformed JSON bodies must fail to decode.");

		assert!(matches!(err, Error::ResponseParse { status: Some(200), .. }));
	}
}
