use maps_loader::environment::{EnvOp, Environment, HeadNode, InMemoryEnvironment, ScriptBehavior};
use maps_loader::system::reload::{
    DefaultReloadCoordinator, ReloadCoordinator, ReloadEvent, ReloadPhase,
};
use maps_loader::{ApiOptions, LocaleSignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const SDK_HOST: &str = "maps.googleapis.com";
const WAIT: Duration = Duration::from_secs(2);

fn start(env: &InMemoryEnvironment, locale: &LocaleSignal) -> Arc<DefaultReloadCoordinator> {
    DefaultReloadCoordinator::start(
        Arc::new(env.clone()),
        ApiOptions::new("test-key").with_libraries(["places", "marker"]),
        locale,
    )
    .unwrap()
}

/// Waits for `count` reloads to finish, successful or not
async fn finished_reloads(
    events: &mut tokio::sync::broadcast::Receiver<ReloadEvent>,
    count: usize,
) -> Vec<ReloadEvent> {
    let mut finished = Vec::new();
    while finished.len() < count {
        let event = timeout(WAIT, events.recv())
            .await
            .expect("timed out waiting for reload")
            .expect("event channel closed");
        if !matches!(event, ReloadEvent::Started { .. }) {
            finished.push(event);
        }
    }
    finished
}

fn position(ops: &[EnvOp], predicate: impl Fn(&EnvOp) -> bool) -> usize {
    ops.iter()
        .position(predicate)
        .expect("operation not recorded")
}

#[cfg(test)]
mod initial_load_tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_load_uses_current_locale() {
        let env = InMemoryEnvironment::new();
        let locale = LocaleSignal::new("de");
        let coordinator = start(&env, &locale);

        let ns = timeout(WAIT, coordinator.current_handle())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ns.language(), Some("de"));
        assert!(ns.has_library("places"));
        assert!(ns.has_library("marker"));

        let scripts = env.scripts_from(SDK_HOST);
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("language=de"));
        assert!(scripts[0].contains("libraries=places%2Cmarker"));
        assert!(scripts[0].ends_with("callback=google.maps.__ib__"));
    }

    #[tokio::test]
    async fn test_script_carries_page_nonce() {
        let env = InMemoryEnvironment::new().with_nonce("n0nce");
        let locale = LocaleSignal::new("en");
        let coordinator = start(&env, &locale);
        timeout(WAIT, coordinator.current_handle().wait())
            .await
            .unwrap()
            .unwrap();

        let nonce = env.ops().into_iter().find_map(|op| match op {
            EnvOp::ScriptInjected { nonce, .. } => Some(nonce),
            _ => None,
        });
        assert_eq!(nonce, Some(Some("n0nce".to_string())));
    }

    #[tokio::test]
    async fn test_failed_library_rejects_handle() {
        let env = InMemoryEnvironment::new();
        env.fail_library("marker");
        let locale = LocaleSignal::new("en");
        let coordinator = start(&env, &locale);

        let err = timeout(WAIT, coordinator.current_handle().wait())
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, maps_loader::LoaderError::LibraryImport(_)));
        assert!(coordinator.is_available());
    }
}

#[cfg(test)]
mod locale_change_tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_to_new_locale() {
        let env = InMemoryEnvironment::new();
        let locale = LocaleSignal::new("en");
        let coordinator = start(&env, &locale);
        let mut events = coordinator.subscribe();
        timeout(WAIT, coordinator.current_handle().wait())
            .await
            .unwrap()
            .unwrap();

        assert!(locale.set("fr"));
        let finished = finished_reloads(&mut events, 1).await;
        assert!(matches!(finished[0], ReloadEvent::Completed { .. }));

        let scripts = env.scripts_from(SDK_HOST);
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("language=fr"));
        assert!(!scripts[0].contains("language=en"));

        let ns = coordinator.current_handle().wait().await.unwrap();
        assert_eq!(ns.language(), Some("fr"));
        assert!(coordinator.is_available());

        // The SDK's leftovers from the first load are gone, the second load's remain
        let nodes = env.head_nodes();
        let links = nodes
            .iter()
            .filter(|(_, node)| matches!(node, HeadNode::Link(_)))
            .count();
        let styles = nodes
            .iter()
            .filter(|(_, node)| matches!(node, HeadNode::Style(_)))
            .count();
        assert_eq!(links, 1);
        assert_eq!(styles, 2);
    }

    #[tokio::test]
    async fn test_rapid_changes_run_in_order() {
        let env = InMemoryEnvironment::new();
        let locale = LocaleSignal::new("en");
        let coordinator = start(&env, &locale);
        let mut events = coordinator.subscribe();

        locale.set("fr");
        locale.set("de");

        let finished = finished_reloads(&mut events, 2).await;
        let locales: Vec<String> = finished
            .iter()
            .map(|event| match event {
                ReloadEvent::Completed { result } => result.locale.clone(),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(locales, vec!["fr", "de"]);

        assert_eq!(env.injected_count(), 3);
        let scripts = env.scripts_from(SDK_HOST);
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("language=de"));

        let status = coordinator.status();
        assert_eq!(status.locale, "de");
        assert_eq!(status.reload_count, 2);
        assert_eq!(status.phase, ReloadPhase::Ready);
        assert!(coordinator.is_available());
    }

    #[tokio::test]
    async fn test_same_locale_does_not_reload() {
        let env = InMemoryEnvironment::new();
        let locale = LocaleSignal::new("en");
        let coordinator = start(&env, &locale);
        let mut events = coordinator.subscribe();
        timeout(WAIT, coordinator.current_handle().wait())
            .await
            .unwrap()
            .unwrap();

        assert!(!locale.set("en"));
        assert!(
            timeout(Duration::from_millis(100), events.recv())
                .await
                .is_err()
        );
        assert_eq!(env.injected_count(), 1);
    }

    #[tokio::test]
    async fn test_new_handle_is_published_to_watchers() {
        let env = InMemoryEnvironment::new();
        let locale = LocaleSignal::new("en");
        let coordinator = start(&env, &locale);
        let mut handles = coordinator.handles();
        assert_eq!(handles.borrow_and_update().generation(), 1);

        locale.set("it");
        timeout(WAIT, handles.changed()).await.unwrap().unwrap();
        let handle = handles.borrow_and_update().clone();
        assert_eq!(handle.generation(), 2);
        assert_eq!(handle.language(), "it");

        let ns = timeout(WAIT, handle.wait()).await.unwrap().unwrap();
        assert_eq!(ns.language(), Some("it"));
    }
}

#[cfg(test)]
mod ordering_tests {
    use super::*;

    #[tokio::test]
    async fn test_reload_waits_for_pending_load() {
        let env = InMemoryEnvironment::new().with_behavior(ScriptBehavior::Hold);
        let locale = LocaleSignal::new("en");
        let coordinator = start(&env, &locale);

        timeout(WAIT, env.wait_for_injections(1)).await.unwrap();
        locale.set("fr");
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Nothing is torn down while the first load is still in flight
        let ops = env.ops();
        assert!(!ops.iter().any(|op| matches!(op, EnvOp::Tick)));
        assert!(!ops.iter().any(|op| matches!(op, EnvOp::NodeRemoved { .. })));
        assert!(coordinator.is_available());
        assert_eq!(env.injected_count(), 1);
        assert!(!coordinator.current_handle().is_settled());

        assert_eq!(env.complete_pending(), 1);
        timeout(WAIT, env.wait_for_injections(2)).await.unwrap();
        assert_eq!(env.complete_pending(), 1);
        timeout(WAIT, coordinator.wait_until_available())
            .await
            .unwrap();

        let ns = timeout(WAIT, coordinator.current_handle().wait())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ns.language(), Some("fr"));
    }

    #[tokio::test]
    async fn test_availability_brackets_reload() {
        let env = InMemoryEnvironment::new();
        let locale = LocaleSignal::new("en");
        let coordinator = start(&env, &locale);
        timeout(WAIT, coordinator.current_handle().wait())
            .await
            .unwrap()
            .unwrap();

        env.set_script_behavior(ScriptBehavior::Hold);
        let mut availability = coordinator.availability();
        locale.set("pt");

        timeout(WAIT, availability.wait_for(|available| !*available))
            .await
            .unwrap()
            .unwrap();
        timeout(WAIT, env.wait_for_injections(2)).await.unwrap();

        // Torn down and reinjected, but not loaded yet
        assert!(!coordinator.is_available());
        assert_eq!(coordinator.status().phase, ReloadPhase::Reloading);
        let pending = coordinator.current_handle();
        assert_eq!(pending.generation(), 2);
        assert!(!pending.is_settled());

        let ops = env.ops();
        let tick = position(&ops, |op| matches!(op, EnvOp::Tick));
        let removed = position(&ops, |op| {
            matches!(op, EnvOp::NodeRemoved { tag: "script", .. })
        });
        let deleted = position(&ops, |op| {
            matches!(op, EnvOp::GlobalDeleted { path } if path == "google.maps")
        });
        let reinjected = ops
            .iter()
            .enumerate()
            .filter(|(_, op)| matches!(op, EnvOp::ScriptInjected { .. }))
            .map(|(index, _)| index)
            .nth(1)
            .unwrap();
        assert!(tick < removed);
        assert!(removed < reinjected);
        assert!(deleted < reinjected);

        env.complete_pending();
        timeout(WAIT, coordinator.wait_until_available())
            .await
            .unwrap();
        assert!(pending.is_settled());
        assert!(pending.try_result().unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_failed_reload_is_retried_manually() {
        let env = InMemoryEnvironment::new();
        let locale = LocaleSignal::new("en");
        let coordinator = start(&env, &locale);
        let mut events = coordinator.subscribe();

        env.set_script_behavior(ScriptBehavior::Fail);
        locale.set("nl");
        let finished = finished_reloads(&mut events, 1).await;
        match &finished[0] {
            ReloadEvent::Failed { locale, error, .. } => {
                assert_eq!(locale, "nl");
                assert!(error.contains("could not load"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(coordinator.is_available());
        assert!(coordinator.current_handle().wait().await.is_err());

        env.set_script_behavior(ScriptBehavior::Execute);
        let result = coordinator.reload("nl").await.unwrap();
        assert!(result.success);
        let ns = coordinator.current_handle().wait().await.unwrap();
        assert_eq!(ns.language(), Some("nl"));
    }
}
