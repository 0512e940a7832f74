//! Integration tests against a live Postgres instance.
//!
//! Gated behind `#[ignore]` so the default `cargo test` run does not require
//! live infrastructure; run with `cargo test -- --ignored` against a
//! `DATABASE_URL` pointing at a scratch database.

use ytx_models::{Artifact, Engine, Fingerprint, JobRecord, Segment};
use ytx_store::{StoreClient, StoreConfig};

async fn connect() -> StoreClient {
    let config = StoreConfig { database_url: std::env::var("DATABASE_URL").unwrap(), ..StoreConfig::default() };
    let client = StoreClient::connect(&config).await.expect("connect");
    client.migrate().await.expect("migrate");
    client
}

#[tokio::test]
#[ignore]
async fn upsert_then_get_artifact_round_trips() {
    let client = connect().await;
    let fingerprint = Fingerprint::canonicalise("dQw4w9WgXcQ", None, None).unwrap();
    let artifact = Artifact::new(
        fingerprint.clone(),
        Some("title".into()),
        Engine::Primary,
        vec![Segment { text: "hi".into(), start_seconds: 0.0, duration_seconds: 1.0 }],
        42,
        chrono::Duration::seconds(3600),
    );

    client.upsert_artifact(&artifact).await.unwrap();
    let fetched = client.get_artifact(&fingerprint).await.unwrap().unwrap();
    assert_eq!(fetched.integrity, artifact.integrity);
}

#[tokio::test]
#[ignore]
async fn job_upsert_and_fetch() {
    let client = connect().await;
    let fingerprint = Fingerprint::canonicalise("dQw4w9WgXcQ", None, None).unwrap();
    let mut job = JobRecord::new(fingerprint, None);
    client.upsert_job(&job).await.unwrap();

    job.mark_running();
    client.upsert_job(&job).await.unwrap();

    let fetched = client.get_job(job.job_id.as_str()).await.unwrap().unwrap();
    assert_eq!(fetched.status, job.status);
}
