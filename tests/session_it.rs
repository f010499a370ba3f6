#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use pg_auth_client::{
	_preludet::*,
	auth::CredentialPair,
	config::ClientConfig,
	http,
	services::Service,
};

fn config(server: &MockServer) -> ClientConfig {
	ClientConfig::builder(server.base_url())
		.build()
		.expect("Client configuration for the mock server should be valid.")
}

#[derive(Debug, Deserialize)]
struct Profile {
	name: String,
	role: String,
}

#[tokio::test]
async fn login_stores_tokens_from_the_body() {
	let server = MockServer::start_async().await;
	let (client, store, _) = build_reqwest_test_client(config(&server), None);
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth-service/login")
				.header_missing("authorization")
				.json_body(json!({ "email": "owner@pg.test", "password": "hunter2" }));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"accessToken":"a1","refreshToken":"r1","name":"Asha","role":"owner"}"#);
		})
		.await;
	let profile: Profile = client
		.login(&json!({ "email": "owner@pg.test", "password": "hunter2" }))
		.await
		.expect("Login should succeed.");

	login.assert_async().await;

	assert_eq!(profile.name, "Asha");
	assert_eq!(profile.role, "owner");

	let stored = store.snapshot().expect("Login should store the issued credentials.");

	assert_eq!(stored.access_token.expose(), "a1");
	assert_eq!(stored.refresh_token.as_ref().map(|secret| secret.expose()), Some("r1"));
}

#[tokio::test]
async fn login_captures_cookie_issued_tokens() {
	let server = MockServer::start_async().await;
	let (client, store, _) = build_reqwest_test_client(config(&server), None);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth-service/login");
			then.status(200)
				.header("set-cookie", "accessToken=cookie-a1; Path=/; HttpOnly; SameSite=Lax")
				.body(r#"{"refreshToken":"r1"}"#);
		})
		.await;

	let _: Value = client
		.login(&json!({ "phone": "9000000000", "otp": "1234" }))
		.await
		.expect("Login should succeed.");
	let stored = store.snapshot().expect("Login should store the issued credentials.");

	assert_eq!(stored.access_token.expose(), "cookie-a1");
	assert_eq!(stored.refresh_token.as_ref().map(|secret| secret.expose()), Some("r1"));
}

#[tokio::test]
async fn failed_login_is_not_intercepted() {
	let server = MockServer::start_async().await;
	let (client, store, navigator) = build_reqwest_test_client(config(&server), None);
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth-service/refresh-token");
			then.status(200).body(r#"{"accessToken":"never"}"#);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth-service/login");
			then.status(401).body(r#"{"message":"Invalid email or password"}"#);
		})
		.await;

	let err = client
		.login::<_, Value>(&json!({ "email": "owner@pg.test", "password": "wrong" }))
		.await
		.expect_err("Bad credentials should fail.");

	refresh.assert_calls_async(0).await;

	assert!(err.is_unauthorized());
	assert!(store.snapshot().is_none());
	assert_eq!(navigator.count(), 0);
}

#[tokio::test]
async fn logout_clears_credentials_even_when_the_server_fails() {
	let server = MockServer::start_async().await;
	let seed = CredentialPair::new("a1").with_refresh_token("r1");
	let (client, store, _) = build_reqwest_test_client(config(&server), Some(seed));
	let logout = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth-service/logout")
				.header("cookie", "accessToken=a1; refreshToken=r1");
			then.status(503).body("maintenance");
		})
		.await;
	let err = client.logout().await.expect_err("The server failure should be reported.");

	logout.assert_async().await;

	assert_eq!(err.status(), Some(503));
	assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn me_and_service_handles_attach_credentials() {
	let server = MockServer::start_async().await;
	let seed = CredentialPair::new("a1").with_refresh_token("r1");
	let (client, _, _) = build_reqwest_test_client(config(&server), Some(seed));
	let me = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/auth-service/me")
				.header("authorization", "Bearer a1")
				.header("cookie", "accessToken=a1; refreshToken=r1");
			then.status(200).body(r#"{"name":"Asha","role":"owner"}"#);
		})
		.await;
	let rooms = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/room-service/rooms")
				.query_param("propertyId", "p1")
				.header("authorization", "Bearer a1")
				.json_body(json!({ "number": "101", "beds": 3 }));
			then.status(201).body(r#"{"id":"room-101"}"#);
		})
		.await;
	let profile: Profile = client.me().await.expect("Profile fetch should succeed.");
	let room = client.service(Service::Room);
	let spec = room
		.spec(http::Method::Post, "rooms")
		.query("propertyId", "p1")
		.json(&json!({ "number": "101", "beds": 3 }))
		.expect("Room body should encode.");
	let created: Value = room.request(spec).await.expect("Room creation should succeed.");

	me.assert_async().await;
	rooms.assert_async().await;

	assert_eq!(profile.name, "Asha");
	assert_eq!(created["id"], "room-101");
}
