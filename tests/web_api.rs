use std::net::SocketAddr;

use axum::Router;
use gto_trainer::web;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};
use uuid::Uuid;

#[derive(Deserialize)]
struct SessionCreated {
    session_id: Uuid,
}

#[tokio::test]
async fn web_api_supports_session_flow() -> anyhow::Result<()> {
    let app: Router = web::router();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base_url = format!("http://{}", addr);
    let client = Client::builder().build()?;

    sleep(Duration::from_millis(25)).await;

    let created: SessionCreated = client
        .post(format!("{}/api/sessions", base_url))
        .json(&json!({ "hands": 1, "mc_trials": 80, "rival_style": "balanced" }))
        .send()
        .await?
        .json()
        .await?;

    let node: Value = client.get(format!("{}/api/sessions/{}", base_url, created.session_id)).send().await?.json().await?;
    assert_eq!(node["done"], json!(false));
    let options = node["options"].as_array().expect("options array");
    assert!(!options.is_empty());

    let next: Value = client
        .post(format!("{}/api/sessions/{}/choices", base_url, created.session_id))
        .json(&json!({ "choice_index": 0 }))
        .send()
        .await?
        .json()
        .await?;
    assert!(next["next"]["done"].is_boolean());

    server.abort();
    let _ = server.await;
    Ok(())
}
