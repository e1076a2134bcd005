use storage::{CatalogCache, JsonFileCache, DEFAULT_CACHE_FILE_NAME};

const API_PAYLOAD: &str = r#"[
  {
    "name": "India",
    "capital": "New Delhi",
    "flags": {"svg": "https://flagcdn.com/in.svg", "png": "https://flagcdn.com/w320/in.png"},
    "region": "Asia",
    "currencies": [{"code": "INR", "name": "Indian rupee", "symbol": "₹"}],
    "alpha2Code": "IN",
    "population": 1380004385
  },
  {
    "name": "Antarctica",
    "region": "Polar",
    "alpha2Code": "AQ"
  }
]"#;

#[tokio::test]
async fn cache_reads_raw_api_payload_and_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(DEFAULT_CACHE_FILE_NAME);
    std::fs::write(&path, API_PAYLOAD).expect("seed payload");

    let first = JsonFileCache::new(&path);
    let catalog = first.load().await.expect("catalog from api payload");
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog[0].currencies[0].symbol, "₹");
    assert!(catalog[1].currencies.is_empty());

    first.save(&catalog).await;

    let reopened = JsonFileCache::in_dir(dir.path(), DEFAULT_CACHE_FILE_NAME);
    let reloaded = reopened.load().await.expect("catalog after reopen");
    assert_eq!(reloaded, catalog);
}
