#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
// self
use facebook_graph::{_preludet::*, auth::Token, graph::Params};

fn user_client(server: &MockServer) -> ReqwestTestClient {
	build_reqwest_test_client(&server.base_url(), "app-it", "secret-it")
		.auth(&Token::new("user-token"), None)
}

#[tokio::test]
async fn user_requests_id_and_email() {
	let server = MockServer::start_async().await;
	let client = user_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v21.0/me")
				.header("authorization", "Bearer user-token")
				.query_param("fields", "id,email");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"10001\",\"email\":\"jane@example.com\"}");
		})
		.await;
	let user = client.user().await.expect("Profile lookup should succeed.");

	mock.assert_async().await;

	assert_eq!(user.id, "10001");
	assert_eq!(user.email.as_deref(), Some("jane@example.com"));
}

#[tokio::test]
async fn user_without_email_permission_decodes() {
	let server = MockServer::start_async().await;
	let client = user_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v21.0/me");
			then.status(200).header("content-type", "application/json").body("{\"id\":\"10001\"}");
		})
		.await;
	let user = client.user().await.expect("Profile lookup should succeed.");

	mock.assert_async().await;

	assert!(user.email.is_none());
}

#[tokio::test]
async fn me_and_ad_accounts_forward_params() {
	let server = MockServer::start_async().await;
	let client = user_client(&server);
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/v21.0/me").query_param("fields", "name");
			then.status(200).header("content-type", "application/json").body("{\"name\":\"Jane\"}");
		})
		.await;
	let accounts = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v21.0/me/adaccounts")
				.query_param("fields", "account_id,name");
			then.status(200).header("content-type", "application/json").body(
				"{\"data\":[{\"account_id\":\"9876\",\"name\":\"Main\",\"id\":\"act_9876\"}]}",
			);
		})
		.await;
	let profile = client.me(Params::fields(["name"])).await.expect("Me lookup should succeed.");

	me.assert_async().await;

	assert_eq!(profile.get("name"), Some(&Value::from("Jane")));

	let listed = client
		.ad_accounts(Params::fields(["account_id", "name"]))
		.await
		.expect("Ad account listing should succeed.");

	accounts.assert_async().await;

	assert_eq!(listed.get_path("data.0.id"), Some(&Value::from("act_9876")));
}

#[tokio::test]
async fn expired_tokens_surface_oauth_exceptions() {
	let server = MockServer::start_async().await;
	let client = user_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v21.0/me");
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":{\"message\":\"Error validating access token.\",\"type\":\"OAuthException\",\"code\":190,\"error_subcode\":463}}",
			);
		})
		.await;
	let err = client.me(Params::new()).await.expect_err("Expired token must fail.");

	mock.assert_async().await;

	match err {
		Error::Api(api) => {
			assert_eq!(api.code, 190);
			assert_eq!(api.kind, "OAuthException");
			assert_eq!(api.status, Some(400));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}
