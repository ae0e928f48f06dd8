//! Status records expire after the configured TTL

mod common;

use std::time::Duration;

use common::StubFetcher;
use scrape_worker::cache::{CacheClient, MokaCacheService};
use scrape_worker::messaging::InMemoryQueueClient;
use scrape_worker::models::{CacheRecord, JobState, ScrapeJobMessage};
use scrape_worker::worker::{ScrapeWorker, WorkerSettings};

#[tokio::test]
async fn test_record_present_then_expired() {
    let client = CacheClient::new(MokaCacheService::new(100));
    let key = "scrape_job:00022244000175";

    client
        .set(key, &CacheRecord::in_progress(), Some(Duration::from_millis(100)))
        .await
        .unwrap();
    let present: Option<CacheRecord> = client.get(key).await.unwrap();
    assert_eq!(present.map(|r| r.status), Some(JobState::InProgress));

    tokio::time::sleep(Duration::from_millis(300)).await;
    let gone: Option<CacheRecord> = client.get(key).await.unwrap();
    assert!(gone.is_none());
}

#[tokio::test]
async fn test_rewrite_refreshes_expiry() {
    let client = CacheClient::new(MokaCacheService::new(100));
    let key = "scrape_job:00012377000160";
    let ttl = Some(Duration::from_millis(250));

    client.set(key, &CacheRecord::in_progress(), ttl).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    client.set(key, &CacheRecord::in_progress(), ttl).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let record: Option<CacheRecord> = client.get(key).await.unwrap();
    assert!(record.is_some());
}

#[tokio::test]
async fn test_worker_records_use_configured_ttl() {
    let cache = MokaCacheService::new(100);
    let worker = ScrapeWorker::new(
        InMemoryQueueClient::new("test"),
        cache.clone(),
        StubFetcher::new().with_fields("00022244000175", &[("Name", "Acme")]),
        WorkerSettings {
            cache_ttl: Duration::from_millis(100),
            ..WorkerSettings::default()
        },
    );

    let job = ScrapeJobMessage::new("00022244000175").unwrap();
    let record = worker.process_job(&job).await;
    assert_eq!(record.status, JobState::Completed);

    let reader = CacheClient::new(cache);
    let stored: Option<CacheRecord> = reader.get(&job.cache_key()).await.unwrap();
    assert_eq!(stored, Some(record));

    tokio::time::sleep(Duration::from_millis(300)).await;
    let expired: Option<CacheRecord> = reader.get(&job.cache_key()).await.unwrap();
    assert!(expired.is_none());
}
