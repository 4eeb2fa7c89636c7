/// UI运行时
///
/// 把对象池注册表和面板目录作为显式的进程级状态组合在一起:
/// 启动时按配置创建一次，关闭时统一拆除，调用方通过引用访问而不是全局单例

use futures::future::AbortRegistration;

use crate::config::{ConfigError, FrameworkConfig, PoolConfig};
use crate::events::EventNotifier;
use crate::gui::{AsyncInstantiator, DirectoryResult, Instantiator, Panel, PanelDirectory, PanelKey};
use crate::pool::{PoolResult, PoolRegistry};

/// 关闭运行时的汇总信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownSummary {
    pub panels_closed: usize,
    pub cached_destroyed: usize,
    pub pooled_released: usize,
}

pub struct UiRuntime {
    config: FrameworkConfig,
    pools: PoolRegistry,
    directory: PanelDirectory,
}

impl UiRuntime {
    pub fn new<I, N>(config: FrameworkConfig, instantiator: I, events: N) -> Result<Self, ConfigError>
    where
        I: Instantiator + 'static,
        N: EventNotifier + 'static,
    {
        config.validate().map_err(ConfigError::Invalid)?;

        let mut pools = PoolRegistry::new();
        pools.initialize();
        let directory = PanelDirectory::new(config.directory.root_container.clone(), instantiator, events);

        log::info!("{} 运行时已启动", config.system.name);
        Ok(Self {
            config,
            pools,
            directory,
        })
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub fn pools(&self) -> &PoolRegistry {
        &self.pools
    }

    pub fn pools_mut(&mut self) -> &mut PoolRegistry {
        &mut self.pools
    }

    pub fn directory(&self) -> &PanelDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut PanelDirectory {
        &mut self.directory
    }

    /// 注册面板对象池
    pub fn register_panel_pool<F>(&mut self, config: PoolConfig, factory: F) -> PoolResult<()>
    where
        F: FnMut() -> Panel + 'static,
    {
        self.pools.register_pool(config, factory)
    }

    /// 按配置文件中的 `[[pools]]` 段注册面板对象池，未配置的键使用默认参数
    pub fn register_configured_pool<F>(&mut self, key: &str, factory: F) -> PoolResult<()>
    where
        F: FnMut() -> Panel + 'static,
    {
        let config = self
            .config
            .pool(key)
            .cloned()
            .unwrap_or_else(|| PoolConfig::new(key));
        self.register_panel_pool(config, factory)
    }

    pub fn open(&mut self, panel: Panel, parent: Option<&PanelKey>) -> DirectoryResult<PanelKey> {
        self.directory.open(panel, parent)
    }

    pub fn open_with<F>(&mut self, key: &PanelKey, parent: Option<&PanelKey>, make: F) -> DirectoryResult<PanelKey>
    where
        F: FnOnce() -> Panel,
    {
        self.directory.open_with(key, parent, make)
    }

    pub async fn open_async(
        &mut self,
        panel: Panel,
        parent: Option<&PanelKey>,
        loader: &dyn AsyncInstantiator,
        abort: AbortRegistration,
    ) -> DirectoryResult<PanelKey> {
        self.directory.open_async(panel, parent, loader, abort).await
    }

    pub fn open_pooled(&mut self, pool_key: &str, parent: Option<&PanelKey>) -> DirectoryResult<PanelKey> {
        self.directory.open_pooled(&mut self.pools, pool_key, parent)
    }

    pub fn close(&mut self, key: &PanelKey) -> DirectoryResult<()> {
        self.directory.close(&mut self.pools, key)
    }

    pub fn force_destroy(&mut self, key: &PanelKey) -> DirectoryResult<()> {
        self.directory.force_destroy(&mut self.pools, key)
    }

    pub fn stats_report(&self) -> String {
        self.pools.stats_report()
    }

    /// 关闭所有面板、清空复用缓存、清空所有对象池
    ///
    /// 对象池释放出的休眠面板连同视觉对象一起销毁
    pub fn shutdown(&mut self) -> ShutdownSummary {
        let panels_closed = self.directory.close_all(&mut self.pools);
        let cached_destroyed = self.directory.clear_reuse_cache();

        let mut pooled_released = 0;
        for released in self.pools.clear_all() {
            match released.downcast::<Panel>() {
                Ok(panel) => {
                    self.directory.release_dormant(*panel);
                    pooled_released += 1;
                }
                Err(_) => log::debug!("对象池释放的非面板对象直接丢弃"),
            }
        }

        let summary = ShutdownSummary {
            panels_closed,
            cached_destroyed,
            pooled_released,
        };
        log::info!("运行时已关闭: {:?}", summary);
        summary
    }
}
