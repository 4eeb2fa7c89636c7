use futures::future::AbortHandle;
use std::any::Any;

use ui_lifecycle::gui::PooledList;
use ui_lifecycle::{
    init_logging, ConfigManager, EventBus, HeadlessInstantiator, Panel, PanelBehavior, PanelKey, PoolConfig,
    UiEvent, UiRuntime,
};

// ==================== 演示面板 ====================

struct MainMenu;

impl PanelBehavior for MainMenu {
    fn on_pause(&mut self) {
        println!("  [MainMenu] 暂停");
    }

    fn on_resume(&mut self) {
        println!("  [MainMenu] 恢复");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
struct Settings {
    use_count: u32,
}

impl PanelBehavior for Settings {
    fn model_init(&mut self, key: &PanelKey) {
        println!("  [{}] 初始化", key);
    }

    fn on_activate(&mut self, key: &PanelKey) {
        self.use_count += 1;
        println!("  [{}] 第 {} 次激活", key, self.use_count);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
struct Toast {
    message: String,
}

impl PanelBehavior for Toast {
    fn reset_poolable_state(&mut self) {
        self.message.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Loading;

impl PanelBehavior for Loading {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut manager = ConfigManager::new();
    manager.load_or_default();
    let config = manager.config().clone();
    init_logging(config.log_level());

    println!("UI Lifecycle v{}", ui_lifecycle::VERSION);

    let headless = HeadlessInstantiator::new(config.directory.root_container.clone())
        .with_resource("UI/MainMenu")
        .with_resource("UI/Settings")
        .with_resource("UI/Toast")
        .with_resource("UI/Loading")
        .shared();
    let bus = EventBus::shared(256);

    let mut runtime = UiRuntime::new(config, headless.clone(), bus.clone())?;
    runtime.register_configured_pool("Toast", || Panel::poolable("Toast", "UI/Toast", "Toast", Toast::default()))?;

    // 嵌套面板: 子面板打开时父面板暂停
    println!("== 嵌套面板 ==");
    let menu = runtime.open(Panel::plain("MainMenu", "UI/MainMenu", MainMenu), None)?;
    let settings_key = PanelKey::new("Settings");
    let new_settings = || Panel::reusable("Settings", "UI/Settings", Settings::default());
    runtime.open_with(&settings_key, Some(&menu), new_settings)?;
    println!("  MainMenu 状态: {:?}", runtime.directory().state_of(&menu));

    // 可复用面板: 关闭后进入复用缓存，再次打开不重复初始化
    println!("== 复用缓存 ==");
    runtime.close(&settings_key)?;
    println!("  缓存中的面板: {:?}", runtime.directory().cached_keys());
    runtime.open_with(&settings_key, Some(&menu), new_settings)?;
    runtime.close(&settings_key)?;

    // 池化面板: 关闭时清除作用域监听器并返回对象池
    println!("== 池化面板 ==");
    let toast = runtime.open_pooled("Toast", None)?;
    if let Some(behavior) = runtime.directory_mut().behavior_mut::<Toast>(&toast) {
        behavior.message = "保存成功".to_string();
    }
    bus.subscribe_scoped("refresh", toast.as_str(), |event| println!("  收到事件 {}", event.name));
    bus.publish(UiEvent::new("refresh").with_source(toast.as_str()));
    bus.process_all_events();
    runtime.close(&toast)?;
    println!("  {} 的监听器: {}", toast, bus.scoped_listener_count(toast.as_str()));

    // 异步加载: 完成后才登记；取消时不留任何登记
    println!("== 异步加载 ==");
    let (_handle, registration) = AbortHandle::new_pair();
    let loading = runtime
        .open_async(Panel::plain("Loading", "UI/Loading", Loading), None, &headless, registration)
        .await?;
    println!("  {} 已打开", loading);
    runtime.close(&loading)?;

    let (handle, registration) = AbortHandle::new_pair();
    handle.abort();
    match runtime
        .open_async(Panel::plain("Loading", "UI/Loading", Loading), None, &headless, registration)
        .await
    {
        Ok(key) => println!("  {} 已打开", key),
        Err(error) => println!("  {}", error),
    }

    // 池化列表: 行频繁增删时复用
    println!("== 池化列表 ==");
    let list_config = runtime
        .config()
        .pool("ListItem")
        .cloned()
        .unwrap_or_else(|| PoolConfig::new("ListItem"));
    let mut inventory = PooledList::new(list_config)?;
    let potion = inventory.add_item(1, "Potion", 3)?;
    inventory.add_item(2, "Sword", 1)?;
    inventory.remove_item(potion);
    inventory.add_item(3, "Shield", 2)?;
    println!("  {:?} ({})", inventory.labels(), inventory.stats());

    println!("{}", runtime.stats_report());
    println!("{}", serde_json::to_string_pretty(&runtime.directory().snapshot())?);

    let summary = runtime.shutdown();
    println!(
        "已关闭: 面板 {}，缓存 {}，池化 {}，剩余视觉对象 {}",
        summary.panels_closed,
        summary.cached_destroyed,
        summary.pooled_released,
        headless.borrow().live_visual_count()
    );
    Ok(())
}
