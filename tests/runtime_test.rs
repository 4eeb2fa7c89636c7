//! UiRuntime wiring, deferred instantiation and shutdown

use futures::future::AbortHandle;
use std::any::Any;

use ui_lifecycle::{
    ConfigError, DirectoryError, EventBus, FrameworkConfig, HeadlessInstantiator, NoopNotifier, Panel,
    PanelBehavior, PanelKey, PanelState, PoolConfig, UiRuntime,
};

#[derive(Default)]
struct Blank;

impl PanelBehavior for Blank {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn headless() -> std::rc::Rc<std::cell::RefCell<HeadlessInstantiator>> {
    HeadlessInstantiator::new("Canvas")
        .with_resource("UI/Menu")
        .with_resource("UI/Settings")
        .with_resource("UI/Toast")
        .shared()
}

fn toast() -> Panel {
    Panel::poolable("Toast", "UI/Toast", "Toast", Blank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_rejects_invalid_config() {
        let mut config = FrameworkConfig::default();
        config.pools.push(PoolConfig::new("Toast").with_preload(5).with_max(1));
        let result = UiRuntime::new(config, headless(), NoopNotifier);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_configured_pool_uses_config_section() {
        let mut config = FrameworkConfig::default();
        config.pools.push(PoolConfig::new("Toast").with_preload(2).with_max(3));
        let mut runtime = UiRuntime::new(config, headless(), NoopNotifier).unwrap();
        assert!(runtime.pools().is_initialized());

        runtime.register_configured_pool("Toast", toast).unwrap();
        runtime.register_configured_pool("Other", toast).unwrap();
        assert_eq!(runtime.pools().stats("Toast").unwrap().max_count, 3);
        assert_eq!(runtime.pools().stats("Other").unwrap().max_count, 100);
    }

    #[test]
    fn test_session_and_shutdown() {
        println!("🧪 full session then shutdown");
        let shared = headless();
        let bus = EventBus::shared(16);
        let mut runtime = UiRuntime::new(FrameworkConfig::default(), shared.clone(), bus.clone()).unwrap();
        runtime
            .register_panel_pool(PoolConfig::new("Toast").with_preload(1).with_max(2), toast)
            .unwrap();

        let menu = runtime.open(Panel::plain("Menu", "UI/Menu", Blank), None).unwrap();
        let settings = runtime
            .open(Panel::reusable("Settings", "UI/Settings", Blank), Some(&menu))
            .unwrap();
        runtime.close(&settings).unwrap();
        let toast_key = runtime.open_pooled("Toast", Some(&menu)).unwrap();
        assert_eq!(runtime.directory().state_of(&menu), Some(PanelState::Paused));

        let summary = runtime.shutdown();
        assert_eq!(summary.panels_closed, 1);
        assert_eq!(summary.cached_destroyed, 1);
        assert_eq!(summary.pooled_released, 1);

        assert!(runtime.directory().live_keys().is_empty());
        assert!(!runtime.directory().is_live(&toast_key));
        assert!(runtime.pools().is_empty());
        assert!(!runtime.pools().is_initialized());
        assert_eq!(shared.borrow().live_visual_count(), 0, "所有视觉对象都已销毁");
        assert_eq!(runtime.stats_report(), "no pools registered");
    }

    #[tokio::test]
    async fn test_open_async_registers_after_load() {
        let shared = headless();
        let mut runtime = UiRuntime::new(FrameworkConfig::default(), shared.clone(), NoopNotifier).unwrap();

        let (_handle, registration) = AbortHandle::new_pair();
        let key = runtime
            .open_async(Panel::plain("Menu", "UI/Menu", Blank), None, &shared, registration)
            .await
            .unwrap();

        assert!(runtime.directory().is_live(&key));
        assert_eq!(runtime.directory().state_of(&key), Some(PanelState::Active));
        let visual = runtime.directory().get_visual_handle(&key).unwrap();
        assert_eq!(shared.borrow().is_visible(visual), Some(true));
    }

    #[tokio::test]
    async fn test_cancelled_open_leaves_nothing_behind() {
        let shared = headless();
        let mut runtime = UiRuntime::new(FrameworkConfig::default(), shared.clone(), NoopNotifier).unwrap();
        let menu = runtime.open(Panel::plain("Menu", "UI/Menu", Blank), None).unwrap();

        let (handle, registration) = AbortHandle::new_pair();
        handle.abort();
        let result = runtime
            .open_async(
                Panel::reusable("Settings", "UI/Settings", Blank),
                Some(&menu),
                &shared,
                registration,
            )
            .await;

        assert_eq!(
            result,
            Err(DirectoryError::Cancelled {
                key: "Settings".to_string()
            })
        );
        let settings = PanelKey::new("Settings");
        assert!(!runtime.directory().is_live(&settings));
        assert!(!runtime.directory().is_cached(&settings));
        assert_eq!(runtime.directory().state_of(&menu), Some(PanelState::Active), "父面板未被暂停");
        assert_eq!(shared.borrow().live_visual_count(), 1);
    }

    #[tokio::test]
    async fn test_async_open_missing_resource() {
        let shared = headless();
        let mut runtime = UiRuntime::new(FrameworkConfig::default(), shared.clone(), NoopNotifier).unwrap();
        let (_handle, registration) = AbortHandle::new_pair();
        let result = runtime
            .open_async(Panel::plain("Ghost", "UI/Ghost", Blank), None, &shared, registration)
            .await;
        assert!(matches!(result, Err(DirectoryError::ResourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_async_open_hits_reuse_cache() {
        let shared = headless();
        let mut runtime = UiRuntime::new(FrameworkConfig::default(), shared.clone(), NoopNotifier).unwrap();
        let key = runtime
            .open(Panel::reusable("Settings", "UI/Settings", Blank), None)
            .unwrap();
        runtime.close(&key).unwrap();

        // 缓存命中不需要加载，取消也不影响
        let (handle, registration) = AbortHandle::new_pair();
        handle.abort();
        let reopened = runtime
            .open_async(Panel::reusable("Settings", "UI/Settings", Blank), None, &shared, registration)
            .await
            .unwrap();
        assert_eq!(reopened, key);
        assert_eq!(shared.borrow().live_visual_count(), 1);
    }
}
