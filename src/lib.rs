// 核心模块
pub mod app;
pub mod config;
pub mod events;
pub mod gui;
pub mod pool;

// 重新导出主要类型
pub use app::{ShutdownSummary, UiRuntime};
pub use config::{ConfigError, ConfigManager, FrameworkConfig, OverflowPolicy, PoolConfig};
pub use events::{EventBus, EventNotifier, NoopNotifier, UiEvent};
pub use gui::{
    AsyncInstantiator, ClosePolicy, DirectoryError, DirectoryResult, HeadlessInstantiator, Instantiator,
    Panel, PanelBehavior, PanelDirectory, PanelKey, PanelKind, PanelState, VisualHandle,
};
pub use pool::{EntityId, Pool, PoolError, PoolRegistry, PoolResult, PoolStats, Poolable, Pooled, Rejected};

/// 库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 初始化日志系统
///
/// `level` 作为全局过滤级别，`RUST_LOG` 中的模块级设置仍然生效。已经安装过日志器时静默跳过
pub fn init_logging(level: log::LevelFilter) {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init();
}
