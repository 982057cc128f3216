//! Demonstrates signing page URLs with the default reqwest transport and in-memory store,
//! against a local mock of the token and ticket endpoints.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use jssdk_broker::{
	auth::AppCredentials,
	flows::Broker,
	http::ReqwestHttpClient,
	provider::ProviderDescriptor,
	store::{BrokerStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token").query_param("grant_type", "client_credential");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"expires_in\":7200}");
		})
		.await;
	let ticket_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/ticket/getticket").query_param("access_token", "demo-access");
			then.status(200).header("content-type", "application/json").body(
				"{\"errcode\":0,\"errmsg\":\"ok\",\"ticket\":\"demo-ticket\",\"expires_in\":7200}",
			);
		})
		.await;
	let store: Arc<dyn BrokerStore> = Arc::new(MemoryStore::default());
	let descriptor =
		ProviderDescriptor::builder().base_url(Url::parse(&server.base_url())?).build()?;
	let broker = <Broker<ReqwestHttpClient>>::with_http_client(
		store,
		descriptor,
		AppCredentials::new("wx-demo-app", "demo-secret")?,
		ReqwestHttpClient::default(),
	);

	for page in ["https://example.com/", "https://example.com/article?id=7#comments"] {
		let package = broker.sign_package(page).await?;

		println!("{}", serde_json::to_string_pretty(&package)?);
	}

	token_mock.assert_async().await;
	ticket_mock.assert_async().await;

	Ok(())
}
