//! Walks a PG-owner session against a mock backend: login, an expired access token that
//! the client refreshes transparently, and logout.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use pg_auth_client::{
	client::ReqwestAuthClient,
	config::ClientConfig,
	navigation::FnNavigator,
	services::Service,
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth-service/login");
			then.status(200)
				.header("set-cookie", "accessToken=expired; Path=/; HttpOnly")
				.header("set-cookie", "refreshToken=demo-refresh; Path=/; HttpOnly")
				.body(r#"{"name":"Asha","role":"owner"}"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/room-service/rooms").header("authorization", "Bearer expired");
			then.status(401).body(r#"{"message":"jwt expired"}"#);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth-service/refresh-token");
			then.status(200).body(r#"{"accessToken":"renewed"}"#);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/room-service/rooms").header("authorization", "Bearer renewed");
			then.status(200).body(r#"[{"number":"101","beds":3},{"number":"102","beds":2}]"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth-service/logout");
			then.status(204);
		})
		.await;

	let config = ClientConfig::builder(server.base_url()).build()?;
	let client = ReqwestAuthClient::new(config, Arc::new(MemoryStore::default())).with_navigator(
		Arc::new(FnNavigator(|path: &str| println!("Session expired; navigate to {path}."))),
	);
	let profile: Value =
		client.login(&json!({ "email": "owner@pg.test", "password": "hunter2" })).await?;

	println!("Signed in as {profile}.");

	let rooms: Value = client.service(Service::Room).get("rooms").await?;

	println!("Rooms: {rooms}.");
	println!(
		"Refresh calls: {}, replays: {}.",
		refresh.calls_async().await,
		client.refresh_metrics.replays()
	);

	client.logout().await?;

	println!("Signed out; stored credentials: {:?}.", client.credentials().await?);

	Ok(())
}
