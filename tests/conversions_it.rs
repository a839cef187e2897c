#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
// self
use facebook_graph::{
	_preludet::*,
	auth::{AdAccountId, DatasetId, Token},
	client::UploadEventsResponse,
	graph::Params,
};

fn user_client(server: &MockServer) -> ReqwestTestClient {
	build_reqwest_test_client(&server.base_url(), "app-it", "secret-it")
		.auth(&Token::new("user-token"), None)
}

fn dataset_id() -> DatasetId {
	DatasetId::new("55501").expect("Dataset fixture should be valid.")
}

#[tokio::test]
async fn dataset_and_account_datasets() {
	let server = MockServer::start_async().await;
	let client = user_client(&server);
	let account = AdAccountId::new("9876").expect("Account fixture should be valid.");
	let one = server
		.mock_async(|when, then| {
			when.method(GET).path("/v21.0/55501").query_param("fields", "id,name");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"55501\",\"name\":\"Store pixel\"}");
		})
		.await;
	let all = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v21.0/act_9876/adspixels")
				.header("authorization", "Bearer user-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":[{\"id\":\"55501\"}]}");
		})
		.await;
	let dataset = client
		.dataset(&dataset_id(), Params::fields(["id", "name"]))
		.await
		.expect("Dataset lookup should succeed.");

	one.assert_async().await;

	assert_eq!(dataset.get("name"), Some(&Value::from("Store pixel")));

	let datasets =
		client.datasets(&account, Params::new()).await.expect("Dataset listing should succeed.");

	all.assert_async().await;

	assert_eq!(datasets.get_path("data.0.id"), Some(&Value::from("55501")));
}

#[tokio::test]
async fn upload_events_posts_data_as_json_text() {
	let server = MockServer::start_async().await;
	let client = user_client(&server);
	let events = serde_json::json!([{ "event_name": "Purchase", "event_time": 1_700_000_000 }]);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v21.0/55501/events")
				.form_urlencoded_tuple("test_event_code", "TEST123")
				.form_urlencoded_tuple(
					"data",
					"[{\"event_name\":\"Purchase\",\"event_time\":1700000000}]",
				);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"events_received\":1,\"messages\":[],\"fbtrace_id\":\"AbC\"}");
		})
		.await;
	let result = client
		.upload_events(
			&dataset_id(),
			Params::new().with("data", events).with("test_event_code", "TEST123"),
		)
		.await
		.expect("Event upload should succeed.");

	mock.assert_async().await;

	let reply: UploadEventsResponse = result.decode().expect("Upload reply should decode.");

	assert_eq!(reply.events_received, 1);
	assert_eq!(reply.fbtrace_id.as_deref(), Some("AbC"));
}

#[tokio::test]
async fn upload_events_surfaces_invalid_parameter_errors() {
	let server = MockServer::start_async().await;
	let client = user_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v21.0/55501/events");
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":{\"message\":\"Invalid parameter\",\"type\":\"OAuthException\",\"code\":100,\"error_subcode\":2804003,\"error_user_title\":\"Event time too old\",\"fbtrace_id\":\"Zz\"}}",
			);
		})
		.await;
	let err = client
		.upload_events(&dataset_id(), Params::new())
		.await
		.expect_err("Rejected upload must fail.");

	mock.assert_async().await;

	match err {
		Error::Api(api) => {
			assert_eq!(api.error_subcode, Some(2_804_003));
			assert_eq!(api.error_user_title.as_deref(), Some("Event time too old"));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}
