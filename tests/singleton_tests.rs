use maps_loader::environment::{Environment, InMemoryEnvironment};
use maps_loader::system::reload::{
    CoordinatorStore, ReloadCoordinator, get_coordinator, get_or_create_coordinator,
};
use maps_loader::{ApiOptions, LoaderError, LocaleSignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

#[cfg(test)]
mod global_store_tests {
    use super::*;

    // The only test in this binary touching the process-wide store
    #[tokio::test]
    async fn test_process_wide_coordinator_is_created_once() {
        assert!(get_coordinator().is_none());

        let first_env = InMemoryEnvironment::new();
        let locale = LocaleSignal::new("en");
        let first = get_or_create_coordinator(
            Arc::new(first_env.clone()),
            ApiOptions::new("first-key"),
            &locale,
        )
        .unwrap();

        let second_env = InMemoryEnvironment::new();
        let other_locale = LocaleSignal::new("ko");
        let second = get_or_create_coordinator(
            Arc::new(second_env.clone()),
            ApiOptions::new("second-key").with_libraries(["places"]),
            &other_locale,
        )
        .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &get_coordinator().unwrap()));

        let ns = timeout(WAIT, second.current_handle()).await.unwrap().unwrap();
        assert_eq!(ns.language(), Some("en"));

        // Later arguments are ignored entirely
        assert!(second_env.ops().is_empty());
        assert!(second_env.head_nodes().is_empty());
        let scripts = first_env.scripts_from("maps.googleapis.com");
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("key=first-key"));
    }
}

#[cfg(test)]
mod local_store_tests {
    use super::*;

    #[tokio::test]
    async fn test_store_returns_same_instance() {
        let store = CoordinatorStore::new();
        assert!(store.get().is_none());

        let env = InMemoryEnvironment::new();
        let locale = LocaleSignal::new("en");
        let a = store
            .get_or_create(Arc::new(env.clone()), ApiOptions::new("k"), &locale)
            .unwrap();
        let b = store
            .get_or_create(Arc::new(env.clone()), ApiOptions::new("k"), &locale)
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.locale().unwrap().get(), "en");

        timeout(WAIT, a.current_handle().wait())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(env.injected_count(), 1);
    }

    #[test]
    fn test_store_outside_runtime_stays_empty() {
        let store = CoordinatorStore::new();
        let env = InMemoryEnvironment::new();
        let locale = LocaleSignal::new("en");

        let result = store.get_or_create(Arc::new(env.clone()), ApiOptions::new("k"), &locale);
        assert!(matches!(result, Err(LoaderError::Configuration(_))));
        assert!(store.get().is_none());
        assert!(store.locale().is_none());
        assert!(env.ops().is_empty());
    }

    #[tokio::test]
    async fn test_separate_stores_follow_one_locale() {
        let locale = LocaleSignal::new("en");
        let left_env = InMemoryEnvironment::new();
        let right_env = InMemoryEnvironment::new();

        let left = CoordinatorStore::new().get_or_create(
            Arc::new(left_env.clone()),
            ApiOptions::new("k"),
            &locale,
        )
        .unwrap();
        let right = CoordinatorStore::new().get_or_create(
            Arc::new(right_env.clone()),
            ApiOptions::new("k"),
            &locale,
        )
        .unwrap();
        let mut left_events = left.subscribe();
        let mut right_events = right.subscribe();

        locale.set("sv");
        for events in [&mut left_events, &mut right_events] {
            loop {
                let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
                if !matches!(event, maps_loader::system::reload::ReloadEvent::Started { .. }) {
                    break;
                }
            }
        }

        assert!(left_env.scripts_from("maps.googleapis.com")[0].contains("language=sv"));
        assert!(right_env.scripts_from("maps.googleapis.com")[0].contains("language=sv"));
    }
}
