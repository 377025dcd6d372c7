//! Startup wiring of the per-collection services.

use docapi::store::CancelToken;
use docapi::{DatabaseSettings, Doujin, Services, Setting, Source, Stats, User};
use tempfile::TempDir;

#[tokio::test]
async fn test_collections_are_isolated_from_each_other() {
    let services = Services::connect(&DatabaseSettings::in_memory()).unwrap();
    let cancel = CancelToken::new();

    services.users.create(User::new(1), &cancel).await.unwrap();
    services
        .settings
        .create(
            Setting {
                id: None,
                name: "language".into(),
                value: "en".into(),
            },
            &cancel,
        )
        .await
        .unwrap();

    assert_eq!(services.users.count(&cancel).await.unwrap(), 1);
    assert_eq!(services.settings.count(&cancel).await.unwrap(), 1);
    assert_eq!(services.stats.count(&cancel).await.unwrap(), 0);
    assert_eq!(services.doujins.count(&cancel).await.unwrap(), 0);
    assert_eq!(services.logs.count(&cancel).await.unwrap(), 0);
}

#[tokio::test]
async fn test_keyed_lookups_per_entity() {
    let services = Services::connect(&DatabaseSettings::in_memory()).unwrap();
    let cancel = CancelToken::new();

    services
        .stats
        .create(
            Stats {
                id: None,
                name: "downloads".into(),
                value: 3,
                updated_at: 0,
            },
            &cancel,
        )
        .await
        .unwrap();
    services
        .doujins
        .create(
            Doujin {
                id: None,
                url: "https://example.org/g/42".into(),
                title: "Example".into(),
                source: Source::EHentai,
                tags: vec!["tag".into()],
                pages: 20,
                telegraph_url: None,
            },
            &cancel,
        )
        .await
        .unwrap();

    let stats = services
        .stats
        .find_by_key("downloads".to_string(), &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.value, 3);

    let doujin = services
        .doujins
        .find_by_key("https://example.org/g/42".to_string(), &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doujin.pages, 20);
    assert_eq!(doujin.source, Source::EHentai);
}

#[tokio::test]
async fn test_redb_store_survives_reconnect() {
    let dir = TempDir::new().unwrap();
    let settings = DatabaseSettings {
        connection_string: format!("redb://{}", dir.path().join("docapi.redb").display()),
        ..DatabaseSettings::default()
    };
    let cancel = CancelToken::new();

    let id = {
        let services = Services::connect(&settings).unwrap();
        let user = services
            .users
            .create(User::new(9).with_username("persisted"), &cancel)
            .await
            .unwrap();
        services.close().unwrap();
        user.id.unwrap()
    };

    let services = Services::connect(&settings).unwrap();
    let user = services.users.find_by_id(&id, &cancel).await.unwrap().unwrap();
    assert_eq!(user.username.as_deref(), Some("persisted"));
}

#[test]
fn test_bad_connection_string_fails_at_startup() {
    let settings = DatabaseSettings {
        connection_string: "redb://".into(),
        ..DatabaseSettings::default()
    };
    assert!(Services::connect(&settings).is_err());
}
