mod common;
use common::utils::spawn_app;

#[tokio::test]
async fn backend_health_working() {
    let test_app = spawn_app().await;

    let response = test_app
        .client
        .get(test_app.url("/backend_health"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());

    let json_response: serde_json::Value = response.json().await.expect("Cannot turn into a json.");
    assert_eq!(json_response["status"], "ok");
    assert_eq!(json_response["service"], "gymtrack-backend");
}
