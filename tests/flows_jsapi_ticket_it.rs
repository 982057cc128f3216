// std
use std::io;
// crates.io
use httpmock::prelude::*;
// self
use jssdk_broker::{
	_preludet::*,
	auth::{AppCredentials, AppId, CredentialKind, CredentialRecord},
	error::TransientError,
	flows::Broker,
	http::{ApiHttpClient, ApiResponse, HttpFuture},
	provider::{ApiEndpoint, ProviderDescriptor},
	store::{BrokerStore, EvictOutcome, MemoryStore, StoreError, StoreFuture, StoreKey},
};

const APP_ID: &str = "wx-ticket-it";
const APP_SECRET: &str = "secret-ticket-it";
const TOKEN_BODY: &str = "{\"access_token\":\"chain-token\",\"expires_in\":7200}";
const TICKET_BODY: &str =
	"{\"errcode\":0,\"errmsg\":\"ok\",\"ticket\":\"chain-ticket\",\"expires_in\":7200}";

fn key(app_id: &str, kind: CredentialKind) -> StoreKey {
	let app_id = AppId::new(app_id).expect("App identifier should be valid for ticket tests.");

	StoreKey::new(&app_id, kind)
}

fn mock_descriptor(server: &MockServer) -> ProviderDescriptor {
	test_descriptor(&server.base_url())
}

/// Scripted transport that records every requested URL.
struct ScriptedClient {
	calls: Mutex<Vec<Url>>,
	responses: Mutex<Vec<Result<ApiResponse, io::Error>>>,
}
impl ScriptedClient {
	fn new(responses: Vec<Result<ApiResponse, io::Error>>) -> Self {
		Self { calls: Mutex::new(Vec::new()), responses: Mutex::new(responses) }
	}

	fn calls(&self) -> Vec<Url> {
		self.calls.lock().clone()
	}
}
impl ApiHttpClient for ScriptedClient {
	type TransportError = io::Error;

	fn get(&self, url: Url) -> HttpFuture<'_, Self::TransportError> {
		self.calls.lock().push(url);

		let next = {
			let mut responses = self.responses.lock();

			if responses.is_empty() {
				Err(io::Error::other("No scripted response left."))
			} else {
				responses.remove(0)
			}
		};

		Box::pin(async move { next })
	}
}

fn scripted_broker_with_store(
	store: Arc<dyn BrokerStore>,
	client: Arc<ScriptedClient>,
) -> Broker<ScriptedClient> {
	let descriptor = ProviderDescriptor::wechat().expect("Default descriptor should build.");
	let credentials = AppCredentials::new(APP_ID, APP_SECRET)
		.expect("Test application credentials should be valid.");

	Broker::with_http_client(store, descriptor, credentials, client)
}

fn scripted_broker(
	responses: Vec<Result<ApiResponse, io::Error>>,
) -> (Broker<ScriptedClient>, Arc<ScriptedClient>, Arc<MemoryStore>) {
	let client = Arc::new(ScriptedClient::new(responses));
	let store = Arc::new(MemoryStore::default());
	let broker = scripted_broker_with_store(store.clone(), client.clone());

	(broker, client, store)
}

fn seeded_record(
	kind: CredentialKind,
	value: &str,
	issued_ago: Duration,
	lifetime: Duration,
) -> CredentialRecord {
	let app_id = AppId::new(APP_ID).expect("App identifier should be valid for ticket tests.");

	CredentialRecord::builder(app_id, kind)
		.value(value)
		.issued_at(OffsetDateTime::now_utc() - issued_ago)
		.expires_in(lifetime)
		.build()
		.expect("Seeded record should build.")
}

/// Transport that stores a newer token while the ticket request is in flight, then rejects
/// the token it was handed.
struct RacingClient {
	store: Arc<MemoryStore>,
	calls: Mutex<Vec<Url>>,
}
impl ApiHttpClient for RacingClient {
	type TransportError = io::Error;

	fn get(&self, url: Url) -> HttpFuture<'_, Self::TransportError> {
		let is_ticket = url.path().ends_with("/getticket");
		let store = self.store.clone();

		self.calls.lock().push(url);

		Box::pin(async move {
			if !is_ticket {
				return Ok(ApiResponse::ok(
					"{\"access_token\":\"rejected-token\",\"expires_in\":7200}",
				));
			}

			store
				.save(seeded_record(
					CredentialKind::AccessToken,
					"newer-token",
					Duration::ZERO,
					Duration::hours(2),
				))
				.await
				.map_err(io::Error::other)?;

			Ok(ApiResponse::ok("{\"errcode\":40001,\"errmsg\":\"invalid credential\"}"))
		})
	}
}

/// Memory store whose conditional eviction always fails.
struct BrokenEvictStore(MemoryStore);
impl BrokerStore for BrokenEvictStore {
	fn save(&self, record: CredentialRecord) -> StoreFuture<'_, ()> {
		self.0.save(record)
	}

	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CredentialRecord>> {
		self.0.fetch(key)
	}

	fn evict<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CredentialRecord>> {
		self.0.evict(key)
	}

	fn compare_and_evict<'a>(
		&'a self,
		_key: &'a StoreKey,
		_expected: &'a str,
	) -> StoreFuture<'a, EvictOutcome> {
		Box::pin(async { Err(StoreError::Backend { message: "cache unreachable".into() }) })
	}
}

fn query_value(url: &Url, name: &str) -> Option<String> {
	url.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
}

#[tokio::test]
async fn jsapi_ticket_calls_token_then_ticket_with_same_token() {
	let (broker, client, _store) = scripted_broker(vec![
		Ok(ApiResponse::ok(TOKEN_BODY)),
		Ok(ApiResponse::ok(TICKET_BODY)),
	]);
	let ticket = broker.jsapi_ticket().await.expect("Chained ticket request should succeed.");
	let calls = client.calls();

	assert_eq!(ticket.expose(), "chain-ticket");
	assert_eq!(calls.len(), 2);
	assert_eq!(calls[0].path(), "/cgi-bin/token");
	assert_eq!(calls[1].path(), "/cgi-bin/ticket/getticket");
	assert_eq!(query_value(&calls[1], "type").as_deref(), Some("jsapi"));
	assert_eq!(query_value(&calls[1], "access_token").as_deref(), Some("chain-token"));
}

#[tokio::test]
async fn jsapi_ticket_stops_after_transport_failure() {
	let (broker, client, _store) =
		scripted_broker(vec![Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))]);
	let err = broker.jsapi_ticket().await.expect_err("Transport failures should surface.");

	assert!(matches!(err, Error::Transport(_)));
	assert!(err.is_retryable());
	assert_eq!(client.calls().len(), 1);
	assert_eq!(broker.ticket_metrics.failures(), 1);
	assert_eq!(broker.ticket_metrics.fetches(), 0);
}

#[tokio::test]
async fn expired_ticket_reuses_live_token() {
	let (broker, client, store) = scripted_broker(vec![Ok(ApiResponse::ok(TICKET_BODY))]);

	store
		.save(seeded_record(
			CredentialKind::AccessToken,
			"live-token",
			Duration::minutes(10),
			Duration::hours(2),
		))
		.await
		.expect("Seeding the token should succeed.");
	store
		.save(seeded_record(
			CredentialKind::JsapiTicket,
			"expired-ticket",
			Duration::hours(3),
			Duration::hours(2),
		))
		.await
		.expect("Seeding the ticket should succeed.");

	let ticket = broker.jsapi_ticket().await.expect("Expired ticket should be re-acquired.");
	let calls = client.calls();

	assert_eq!(ticket.expose(), "chain-ticket");
	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].path(), "/cgi-bin/ticket/getticket");
	assert_eq!(query_value(&calls[0], "access_token").as_deref(), Some("live-token"));
	assert_eq!(broker.token_metrics.cache_hits(), 1);
	assert_eq!(broker.token_metrics.fetches(), 0);

	let stored = store
		.fetch(&key(APP_ID, CredentialKind::JsapiTicket))
		.await
		.expect("Store fetch should succeed.")
		.expect("Fresh ticket should be cached.");

	assert_eq!(stored.value.expose(), "chain-ticket");
	assert!(!stored.is_expired());
}

#[tokio::test]
async fn live_ticket_outlives_expired_token_without_calls() {
	let (broker, client, store) = scripted_broker(Vec::new());

	store
		.save(seeded_record(
			CredentialKind::AccessToken,
			"expired-token",
			Duration::hours(3),
			Duration::hours(2),
		))
		.await
		.expect("Seeding the token should succeed.");
	store
		.save(seeded_record(
			CredentialKind::JsapiTicket,
			"live-ticket",
			Duration::minutes(5),
			Duration::hours(2),
		))
		.await
		.expect("Seeding the ticket should succeed.");

	let ticket = broker.jsapi_ticket().await.expect("Live ticket should be served from cache.");

	assert_eq!(ticket.expose(), "live-ticket");
	assert!(client.calls().is_empty());
	assert_eq!(broker.token_metrics.attempts(), 0);
}

#[tokio::test]
async fn rejected_token_eviction_keeps_newer_token() {
	let store = Arc::new(MemoryStore::default());
	let client = Arc::new(RacingClient { store: store.clone(), calls: Mutex::new(Vec::new()) });
	let descriptor = ProviderDescriptor::wechat().expect("Default descriptor should build.");
	let credentials = AppCredentials::new(APP_ID, APP_SECRET)
		.expect("Test application credentials should be valid.");
	let broker: Broker<RacingClient> =
		Broker::with_http_client(store.clone(), descriptor, credentials, client.clone());
	let err = broker.jsapi_ticket().await.expect_err("Rejected access tokens should surface.");

	assert!(matches!(err, Error::InvalidAccessToken { errcode: 40001, .. }));
	assert_eq!(client.calls.lock().len(), 2);

	let token = store
		.fetch(&key(APP_ID, CredentialKind::AccessToken))
		.await
		.expect("Store fetch should succeed.")
		.expect("Newer token should survive the eviction.");

	assert_eq!(token.value.expose(), "newer-token");
}

#[tokio::test]
async fn failed_eviction_still_reports_rejected_token() {
	let client = Arc::new(ScriptedClient::new(vec![
		Ok(ApiResponse::ok(TOKEN_BODY)),
		Ok(ApiResponse::ok("{\"errcode\":42001,\"errmsg\":\"access_token expired\"}")),
	]));
	let broker = scripted_broker_with_store(
		Arc::new(BrokenEvictStore(MemoryStore::default())),
		client.clone(),
	);
	let err = broker.jsapi_ticket().await.expect_err("Rejected access tokens should surface.");

	assert!(matches!(err, Error::InvalidAccessToken { errcode: 42001, .. }));
	assert_eq!(client.calls().len(), 2);
}

#[tokio::test]
async fn jsapi_ticket_caches_and_reuses_cached_token() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server), APP_ID, APP_SECRET);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token").query_param("appid", APP_ID);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let ticket_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/ticket/getticket")
				.query_param("type", "jsapi")
				.query_param("access_token", "chain-token");
			then.status(200).header("content-type", "application/json").body(TICKET_BODY);
		})
		.await;

	broker.access_token().await.expect("Warm-up token request should succeed.");

	let first = broker.jsapi_ticket().await.expect("Initial ticket request should succeed.");
	let second = broker.jsapi_ticket().await.expect("Cached ticket request should succeed.");

	assert_eq!(first.expose(), "chain-ticket");
	assert_eq!(second.expose(), "chain-ticket");

	token_mock.assert_calls_async(1).await;
	ticket_mock.assert_calls_async(1).await;

	assert_eq!(store.len(), 2);
	assert_eq!(broker.ticket_metrics.cache_hits(), 1);
}

#[tokio::test]
async fn jsapi_ticket_skips_ticket_call_when_token_fails() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server), APP_ID, APP_SECRET);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40125,\"errmsg\":\"invalid appsecret\"}");
		})
		.await;
	let ticket_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/ticket/getticket");
			then.status(200).header("content-type", "application/json").body(TICKET_BODY);
		})
		.await;
	let err = broker.jsapi_ticket().await.expect_err("Token failures should propagate.");

	assert!(matches!(err, Error::InvalidCredentials { errcode: 40125, .. }));
	assert!(store.is_empty());

	token_mock.assert_calls_async(1).await;
	ticket_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn jsapi_ticket_invalid_token_evicts_cached_token() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server), APP_ID, APP_SECRET);
	let seeded = CredentialRecord::builder(broker.app_id().clone(), CredentialKind::AccessToken)
		.value("revoked-token")
		.expires_in(Duration::hours(1))
		.build()
		.expect("Seeded token record should build.");

	store.save(seeded).await.expect("Seeding the store should succeed.");

	let ticket_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/ticket/getticket").query_param("access_token", "revoked-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40001,\"errmsg\":\"invalid credential\"}");
		})
		.await;
	let err = broker.jsapi_ticket().await.expect_err("Rejected access tokens should surface.");

	assert!(matches!(err, Error::InvalidAccessToken { errcode: 40001, .. }));
	assert!(err.is_retryable());
	assert!(store.is_empty());

	ticket_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn jsapi_ticket_requires_errcode() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server), APP_ID, APP_SECRET);
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let _ticket_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/ticket/getticket");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"ticket\":\"unchecked-ticket\",\"expires_in\":7200}");
		})
		.await;
	let err = broker.jsapi_ticket().await.expect_err("Tickets without errcode are untrusted.");

	assert!(matches!(
		err,
		Error::Transient(TransientError::MissingField {
			endpoint: ApiEndpoint::Ticket,
			field: "errcode",
		})
	));
	assert!(
		store
			.fetch(&key(APP_ID, CredentialKind::JsapiTicket))
			.await
			.expect("Store fetch should succeed.")
			.is_none()
	);
}

#[tokio::test]
async fn jsapi_ticket_rejection_is_not_cached() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server), APP_ID, APP_SECRET);
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let ticket_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/ticket/getticket");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":48001,\"errmsg\":\"api unauthorized\"}");
		})
		.await;

	for _ in 0..2 {
		let err = broker.jsapi_ticket().await.expect_err("Rejected tickets should surface.");

		assert!(matches!(
			err,
			Error::Rejected { endpoint: ApiEndpoint::Ticket, errcode: 48001, .. }
		));
	}

	ticket_mock.assert_calls_async(2).await;

	assert!(
		store
			.fetch(&key(APP_ID, CredentialKind::JsapiTicket))
			.await
			.expect("Store fetch should succeed.")
			.is_none()
	);
	assert!(
		store
			.fetch(&key(APP_ID, CredentialKind::AccessToken))
			.await
			.expect("Store fetch should succeed.")
			.is_some()
	);
}

#[tokio::test]
async fn jsapi_ticket_isolates_apps_sharing_a_store() {
	let server = MockServer::start_async().await;
	let (first, store) =
		build_reqwest_test_broker(mock_descriptor(&server), "wx-first", "secret-first");
	let second_credentials = AppCredentials::new("wx-second", "secret-second")
		.expect("Second application credentials should be valid.");
	let second: ReqwestTestBroker = Broker::with_http_client(
		store.clone(),
		mock_descriptor(&server),
		second_credentials,
		test_reqwest_http_client(),
	);
	let first_token = server
		.mock_async(|when, then| {
			when.method(GET).path("/token").query_param("appid", "wx-first");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"first-token\",\"expires_in\":7200}");
		})
		.await;
	let second_token = server
		.mock_async(|when, then| {
			when.method(GET).path("/token").query_param("appid", "wx-second");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"second-token\",\"expires_in\":7200}");
		})
		.await;
	let first_ticket = server
		.mock_async(|when, then| {
			when.method(GET).path("/ticket/getticket").query_param("access_token", "first-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":0,\"errmsg\":\"ok\",\"ticket\":\"first-ticket\"}");
		})
		.await;
	let second_ticket = server
		.mock_async(|when, then| {
			when.method(GET).path("/ticket/getticket").query_param("access_token", "second-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":0,\"errmsg\":\"ok\",\"ticket\":\"second-ticket\"}");
		})
		.await;

	assert_eq!(
		first.jsapi_ticket().await.expect("First app ticket should succeed.").expose(),
		"first-ticket"
	);
	assert_eq!(
		second.jsapi_ticket().await.expect("Second app ticket should succeed.").expose(),
		"second-ticket"
	);

	first_token.assert_calls_async(1).await;
	second_token.assert_calls_async(1).await;
	first_ticket.assert_calls_async(1).await;
	second_ticket.assert_calls_async(1).await;

	assert_eq!(store.len(), 4);
}
