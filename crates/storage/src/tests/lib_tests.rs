use super::*;
use shared::domain::{CountryCode, Currency, Flags};

fn india() -> Country {
    Country {
        name: "India".to_string(),
        capital: Some("New Delhi".to_string()),
        flags: Some(Flags {
            svg: None,
            png: Some("https://flagcdn.com/in.png".to_string()),
        }),
        region: Some("Asia".to_string()),
        currencies: vec![Currency {
            code: "INR".to_string(),
            name: "Rupee".to_string(),
            symbol: "₹".to_string(),
        }],
        country_code: CountryCode::new("IN"),
    }
}

fn canada() -> Country {
    Country {
        name: "Canada".to_string(),
        capital: Some("Ottawa".to_string()),
        flags: Some(Flags {
            svg: None,
            png: Some("https://flagcdn.com/ca.png".to_string()),
        }),
        region: Some("Americas".to_string()),
        currencies: vec![Currency {
            code: "CAD".to_string(),
            name: "Canadian Dollar".to_string(),
            symbol: "$".to_string(),
        }],
        country_code: CountryCode::new("CA"),
    }
}

#[tokio::test]
async fn save_then_load_returns_same_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = JsonFileCache::in_dir(dir.path(), DEFAULT_CACHE_FILE_NAME);

    cache.save(&[india(), canada()]).await;
    let loaded = cache.load().await.expect("cached catalog");

    assert_eq!(loaded, vec![india(), canada()]);
}

#[tokio::test]
async fn missing_file_is_a_miss() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = JsonFileCache::in_dir(dir.path(), DEFAULT_CACHE_FILE_NAME);

    assert!(cache.read_countries().await.expect("read").is_none());
    assert!(cache.load().await.is_none());
}

#[tokio::test]
async fn corrupt_file_is_a_miss_not_an_error_to_callers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = JsonFileCache::in_dir(dir.path(), DEFAULT_CACHE_FILE_NAME);
    std::fs::write(cache.path(), b"{not json").expect("seed corrupt file");

    assert!(cache.read_countries().await.is_err());
    assert!(cache.load().await.is_none());
}

#[tokio::test]
async fn save_overwrites_previous_catalog_wholesale() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = JsonFileCache::in_dir(dir.path(), DEFAULT_CACHE_FILE_NAME);

    cache.save(&[india(), canada()]).await;
    cache.save(&[canada()]).await;

    assert_eq!(cache.load().await.expect("catalog"), vec![canada()]);
    assert_eq!(entries_in(dir.path()), vec![DEFAULT_CACHE_FILE_NAME.to_string()]);
}

#[tokio::test]
async fn save_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("documents").join("app");
    let cache = JsonFileCache::in_dir(&nested, DEFAULT_CACHE_FILE_NAME);

    cache.save(&[india()]).await;

    assert!(nested.join(DEFAULT_CACHE_FILE_NAME).exists());
}

#[tokio::test]
async fn empty_catalog_round_trips_as_empty_list() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = JsonFileCache::in_dir(dir.path(), DEFAULT_CACHE_FILE_NAME);

    cache.save(&[]).await;

    assert_eq!(cache.load().await, Some(Vec::new()));
}

#[tokio::test]
async fn save_into_unwritable_location_is_swallowed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file, not a dir").expect("blocker");
    let cache = JsonFileCache::in_dir(&blocker, DEFAULT_CACHE_FILE_NAME);

    cache.save(&[india()]).await;

    assert!(cache.write_countries(&[india()]).await.is_err());
    assert!(cache.load().await.is_none());
}

#[tokio::test]
async fn concurrent_saves_leave_one_complete_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = JsonFileCache::in_dir(dir.path(), DEFAULT_CACHE_FILE_NAME);
    let second = first.clone();

    for _ in 0..10 {
        let a = tokio::spawn({
            let cache = first.clone();
            async move { cache.write_countries(&[india(), canada()]).await }
        });
        let b = tokio::spawn({
            let cache = second.clone();
            async move { cache.write_countries(&[canada()]).await }
        });
        a.await.expect("join").expect("first writer");
        b.await.expect("join").expect("second writer");

        let loaded = first.read_countries().await.expect("read").expect("catalog");
        assert!(loaded == vec![india(), canada()] || loaded == vec![canada()]);
    }
    assert_eq!(entries_in(dir.path()), vec![DEFAULT_CACHE_FILE_NAME.to_string()]);
}

#[tokio::test]
async fn persist_replaces_target_contents() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join(DEFAULT_CACHE_FILE_NAME);
    std::fs::write(&target, b"stale").expect("seed target");

    persist_atomically(&target, b"[]").expect("persist");

    assert_eq!(std::fs::read(&target).expect("read"), b"[]");
}

fn entries_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
