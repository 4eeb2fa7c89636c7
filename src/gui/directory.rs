/// 面板目录
///
/// 持有面板的权威映射:
/// - 活跃面板 `live` 与其视觉对象 `visuals`
/// - 复用缓存 `reuse_cache`，存放已隐藏但未销毁的可复用面板
///
/// 同一个键任何时刻最多出现在 `live` 与 `reuse_cache` 之一中。
/// 父子关系: 父面板拥有子面板键的列表，子面板只记录父面板的键，关闭时先拆除子面板。

use futures::future::{AbortRegistration, Abortable};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

use super::instantiator::{AsyncInstantiator, Instantiator, VisualHandle};
use super::panel::{ClosePolicy, Panel, PanelBehavior, PanelKey, PanelKind, PanelState};
use crate::events::EventNotifier;
use crate::pool::{EntityId, PoolError, PoolRegistry, Pooled};

/// 面板目录错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("面板不存在: {key}")]
    PanelNotFound { key: String },

    #[error("资源不存在: {path}")]
    ResourceNotFound { path: String },

    #[error("根容器不存在")]
    RootContainerNotFound,

    #[error("面板已打开: {key}")]
    AlreadyOpen { key: String },

    #[error("父面板未打开: {key}")]
    ParentNotFound { key: String },

    #[error("面板加载已取消: {key}")]
    Cancelled { key: String },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

pub struct PanelDirectory {
    instantiator: Box<dyn Instantiator>,
    events: Box<dyn EventNotifier>,
    root_container: String,
    visuals: HashMap<PanelKey, VisualHandle>,
    live: HashMap<PanelKey, Panel>,
    reuse_cache: HashMap<PanelKey, Panel>,
    pooled_sequence: u64,
}

impl PanelDirectory {
    pub fn new<I, N>(root_container: impl Into<String>, instantiator: I, events: N) -> Self
    where
        I: Instantiator + 'static,
        N: EventNotifier + 'static,
    {
        Self {
            instantiator: Box::new(instantiator),
            events: Box::new(events),
            root_container: root_container.into(),
            visuals: HashMap::new(),
            live: HashMap::new(),
            reuse_cache: HashMap::new(),
            pooled_sequence: 0,
        }
    }

    pub fn root_container(&self) -> &str {
        &self.root_container
    }

    /// 打开面板
    ///
    /// 复用缓存中已有同键实例时直接重新激活，传入的新实例被丢弃
    pub fn open(&mut self, panel: Panel, parent: Option<&PanelKey>) -> DirectoryResult<PanelKey> {
        let key = panel.key().clone();
        self.open_with(&key, parent, move || panel)
    }

    /// 打开面板，只在复用缓存未命中时才调用 `make` 构造新实例
    pub fn open_with<F>(&mut self, key: &PanelKey, parent: Option<&PanelKey>, make: F) -> DirectoryResult<PanelKey>
    where
        F: FnOnce() -> Panel,
    {
        self.check_open(key, parent)?;

        if let Some(key) = self.reopen_cached(key, parent) {
            return Ok(key);
        }

        let panel = make();
        let visual = self.create_visual(panel.path())?;
        Ok(self.install(panel, visual, parent))
    }

    /// 异步打开面板
    ///
    /// 视觉对象由 `loader` 异步创建，`abort` 对应的 `AbortHandle` 可在加载完成前取消。
    /// 只有加载完成后才登记面板，取消时不留下任何登记
    pub async fn open_async(
        &mut self,
        panel: Panel,
        parent: Option<&PanelKey>,
        loader: &dyn AsyncInstantiator,
        abort: AbortRegistration,
    ) -> DirectoryResult<PanelKey> {
        let key = panel.key().clone();
        self.check_open(&key, parent)?;

        if let Some(key) = self.reopen_cached(&key, parent) {
            return Ok(key);
        }

        let root = self.find_root()?;
        let loaded = Abortable::new(loader.instantiate(panel.path(), root), abort).await;
        match loaded {
            Ok(Some(visual)) => Ok(self.install(panel, visual, parent)),
            Ok(None) => {
                log::warn!("面板 {} 的资源不存在: {}", key, panel.path());
                Err(DirectoryError::ResourceNotFound {
                    path: panel.path().to_string(),
                })
            }
            Err(_aborted) => {
                log::info!("面板 {} 的加载已取消", key);
                Err(DirectoryError::Cancelled { key: key.to_string() })
            }
        }
    }

    /// 从对象池打开可池化面板
    ///
    /// 首次使用的实例获得键 `"{pool_key}#{n}"` 并创建视觉对象；
    /// 复用的实例保留原来的键和随身携带的视觉对象，不再重复初始化。
    /// 序号跳过已被活跃面板或复用缓存占用的键；复用实例的旧键若已被占用则换新键
    pub fn open_pooled(
        &mut self,
        pools: &mut PoolRegistry,
        pool_key: &str,
        parent: Option<&PanelKey>,
    ) -> DirectoryResult<PanelKey> {
        if let Some(parent) = parent {
            self.check_parent(parent)?;
        }

        let pooled = pools.spawn_as::<Panel>(pool_key)?;
        let managed = pooled.is_managed();
        let (id, mut panel) = pooled.into_parts();
        if managed {
            panel.pool_ticket = Some(id);
        }

        if !panel.is_initialized() || self.is_key_taken(panel.key()) {
            let key = self.next_pooled_key(pool_key);
            panel.set_key(key);
        }

        let visual = match panel.visual.take() {
            Some(visual) => visual,
            None => match self.create_visual(panel.path()) {
                Ok(visual) => visual,
                Err(error) => {
                    if let Some(ticket) = panel.pool_ticket.take() {
                        if let Err(rejected) = pools.despawn(pool_key, Pooled::from_parts(ticket, panel)) {
                            log::warn!("面板无法返回对象池 {}: {}", pool_key, rejected.error);
                        }
                    }
                    return Err(error);
                }
            },
        };

        log::debug!("从对象池 {} 取出面板 {}", pool_key, panel.key());
        Ok(self.install(panel, visual, parent))
    }

    /// 关闭面板，按面板自身的关闭策略销毁、缓存或返回对象池
    pub fn close(&mut self, pools: &mut PoolRegistry, key: &PanelKey) -> DirectoryResult<()> {
        let Some(panel) = self.live.get(key) else {
            log::warn!("尝试关闭不存在的面板: {}", key);
            return Err(DirectoryError::PanelNotFound { key: key.to_string() });
        };

        let parent = panel.parent().cloned();
        if let Some(parent_key) = parent {
            self.detach_from_parent(&parent_key, key);
        }

        self.teardown(pools, key);
        Ok(())
    }

    /// 关闭所有根面板，子面板随之关闭
    pub fn close_all(&mut self, pools: &mut PoolRegistry) -> usize {
        let mut roots: Vec<PanelKey> = self
            .live
            .values()
            .filter(|panel| panel.parent().is_none())
            .map(|panel| panel.key().clone())
            .collect();
        roots.sort();

        let mut closed = 0;
        for key in roots {
            if self.close(pools, &key).is_ok() {
                closed += 1;
            }
        }
        closed
    }

    /// 强制销毁，绕过复用与池化策略
    ///
    /// 缓存中的面板直接销毁；活跃面板先关闭复用/池化标志，再按销毁路径关闭
    pub fn force_destroy(&mut self, pools: &mut PoolRegistry, key: &PanelKey) -> DirectoryResult<()> {
        if let Some(panel) = self.reuse_cache.remove(key) {
            self.destroy_cached(panel);
            return Ok(());
        }

        let Some(panel) = self.live.get_mut(key) else {
            log::warn!("尝试强制销毁不存在的面板: {}", key);
            return Err(DirectoryError::PanelNotFound { key: key.to_string() });
        };
        panel.set_reusable(false);
        panel.disable_pooling();
        self.close(pools, key)
    }

    /// 销毁复用缓存中的所有面板，返回销毁数量
    pub fn clear_reuse_cache(&mut self) -> usize {
        let cached: Vec<Panel> = self.reuse_cache.drain().map(|(_, panel)| panel).collect();
        let count = cached.len();
        for panel in cached {
            self.destroy_cached(panel);
        }
        if count > 0 {
            log::info!("已清空复用缓存，销毁 {} 个面板", count);
        }
        count
    }

    /// 设置活跃或缓存中面板的可复用标志
    pub fn set_reusable(&mut self, key: &PanelKey, reusable: bool) -> bool {
        let panel = match self.live.get_mut(key) {
            Some(panel) => panel,
            None => match self.reuse_cache.get_mut(key) {
                Some(panel) => panel,
                None => return false,
            },
        };
        panel.set_reusable(reusable)
    }

    pub fn get_instance(&self, key: &PanelKey) -> Option<&Panel> {
        self.live.get(key)
    }

    pub fn get_instance_mut(&mut self, key: &PanelKey) -> Option<&mut Panel> {
        self.live.get_mut(key)
    }

    pub fn get_visual_handle(&self, key: &PanelKey) -> Option<VisualHandle> {
        self.visuals.get(key).copied()
    }

    /// 按具体行为类型访问活跃面板
    pub fn behavior<B: PanelBehavior>(&self, key: &PanelKey) -> Option<&B> {
        self.live.get(key).and_then(|panel| panel.behavior::<B>())
    }

    pub fn behavior_mut<B: PanelBehavior>(&mut self, key: &PanelKey) -> Option<&mut B> {
        self.live.get_mut(key).and_then(|panel| panel.behavior_mut::<B>())
    }

    pub fn is_live(&self, key: &PanelKey) -> bool {
        self.live.contains_key(key)
    }

    pub fn is_cached(&self, key: &PanelKey) -> bool {
        self.reuse_cache.contains_key(key)
    }

    pub fn state_of(&self, key: &PanelKey) -> Option<PanelState> {
        self.live
            .get(key)
            .or_else(|| self.reuse_cache.get(key))
            .map(Panel::state)
    }

    pub fn live_keys(&self) -> Vec<PanelKey> {
        let mut keys: Vec<PanelKey> = self.live.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn cached_keys(&self) -> Vec<PanelKey> {
        let mut keys: Vec<PanelKey> = self.reuse_cache.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn cache_stats(&self) -> usize {
        self.reuse_cache.len()
    }

    /// 目录状态快照，用于诊断输出
    pub fn snapshot(&self) -> serde_json::Value {
        let live: Vec<serde_json::Value> = self
            .live_keys()
            .into_iter()
            .filter_map(|key| self.live.get(&key))
            .map(|panel| {
                json!({
                    "key": panel.key(),
                    "state": panel.state(),
                    "parent": panel.parent(),
                    "children": panel.children(),
                })
            })
            .collect();

        json!({
            "root_container": self.root_container,
            "live": live,
            "cached": self.cached_keys(),
        })
    }

    fn is_key_taken(&self, key: &PanelKey) -> bool {
        self.live.contains_key(key) || self.reuse_cache.contains_key(key)
    }

    /// 下一个未被活跃面板或复用缓存占用的池化面板键
    fn next_pooled_key(&mut self, pool_key: &str) -> PanelKey {
        loop {
            self.pooled_sequence += 1;
            let key = PanelKey::new(format!("{}#{}", pool_key, self.pooled_sequence));
            if !self.is_key_taken(&key) {
                return key;
            }
        }
    }

    fn check_open(&self, key: &PanelKey, parent: Option<&PanelKey>) -> DirectoryResult<()> {
        if self.live.contains_key(key) {
            log::warn!("面板 {} 已打开", key);
            return Err(DirectoryError::AlreadyOpen { key: key.to_string() });
        }
        match parent {
            Some(parent) => self.check_parent(parent),
            None => Ok(()),
        }
    }

    fn check_parent(&self, parent: &PanelKey) -> DirectoryResult<()> {
        if self.live.contains_key(parent) {
            Ok(())
        } else {
            log::warn!("父面板 {} 未打开", parent);
            Err(DirectoryError::ParentNotFound {
                key: parent.to_string(),
            })
        }
    }

    fn find_root(&self) -> DirectoryResult<VisualHandle> {
        self.instantiator
            .find_root_container(&self.root_container)
            .ok_or_else(|| {
                log::error!("找不到根容器 {}", self.root_container);
                DirectoryError::RootContainerNotFound
            })
    }

    fn create_visual(&mut self, path: &str) -> DirectoryResult<VisualHandle> {
        let root = self.find_root()?;
        self.instantiator.instantiate(path, root).ok_or_else(|| {
            log::warn!("资源不存在: {}", path);
            DirectoryError::ResourceNotFound {
                path: path.to_string(),
            }
        })
    }

    /// 复用缓存命中时重新激活，跳过初始化
    fn reopen_cached(&mut self, key: &PanelKey, parent: Option<&PanelKey>) -> Option<PanelKey> {
        let panel = self.reuse_cache.remove(key)?;
        let Some(visual) = self.visuals.get(key).copied() else {
            log::warn!("缓存面板 {} 缺少视觉对象，重新创建", key);
            self.destroy_panel(panel, None);
            return None;
        };

        log::debug!("复用缓存命中: {}", key);
        Some(self.install(panel, visual, parent))
    }

    /// 显示视觉对象、初始化(仅首次)、激活并登记为活跃面板
    fn install(&mut self, mut panel: Panel, visual: VisualHandle, parent: Option<&PanelKey>) -> PanelKey {
        let key = panel.key().clone();
        self.instantiator.set_visible(visual, true);
        self.visuals.insert(key.clone(), visual);

        if panel.initialize() {
            log::info!("面板 {} 创建完成", key);
        }
        panel.activate();

        if let Some(parent_key) = parent {
            panel.set_parent(Some(parent_key.clone()));
            if let Some(parent_panel) = self.live.get_mut(parent_key) {
                parent_panel.add_child(key.clone());
                parent_panel.pause();
            }
        }

        self.live.insert(key.clone(), panel);
        key
    }

    /// 从父面板移除子面板；父面板没有剩余子面板且自身没有父面板时恢复
    fn detach_from_parent(&mut self, parent_key: &PanelKey, child: &PanelKey) {
        let Some(parent) = self.live.get_mut(parent_key) else {
            return;
        };
        parent.remove_child(child);
        if parent.child_count() == 0 && parent.parent().is_none() {
            parent.resume();
        }
    }

    /// 拆除面板: 先递归拆除子面板，再按关闭策略处置
    fn teardown(&mut self, pools: &mut PoolRegistry, key: &PanelKey) {
        let Some(mut panel) = self.live.remove(key) else {
            return;
        };

        for child in panel.take_children() {
            self.teardown(pools, &child);
        }
        panel.set_parent(None);

        match panel.close_policy() {
            ClosePolicy::Destroy => {
                if let Some((pool_key, ticket)) = pool_ticket_of(&panel) {
                    if let Err(error) = pools.forget(&pool_key, ticket) {
                        log::warn!("面板 {} 无法从对象池注销: {}", key, error);
                    }
                }
                let visual = self.visuals.remove(key);
                self.destroy_panel(panel, visual);
            }
            ClosePolicy::CacheForReuse => {
                if let Some(visual) = self.visuals.get(key).copied() {
                    self.instantiator.set_visible(visual, false);
                }
                panel.deactivate();
                log::info!("面板 {} 已缓存", key);
                self.reuse_cache.insert(key.clone(), panel);
            }
            ClosePolicy::ReturnToPool { pool_key } => {
                self.return_to_pool(pools, &pool_key, panel);
            }
        }
    }

    fn return_to_pool(&mut self, pools: &mut PoolRegistry, pool_key: &str, mut panel: Panel) {
        let key = panel.key().clone();
        self.events.clear_listeners_scoped_to(key.as_str());

        let visual = self.visuals.remove(&key);
        if let Some(visual) = visual {
            self.instantiator.set_visible(visual, false);
        }

        let Some(ticket) = panel.pool_ticket.take() else {
            log::warn!("面板 {} 不是从对象池 {} 取出的，直接销毁", key, pool_key);
            self.destroy_panel(panel, visual);
            return;
        };

        panel.visual = visual;
        match pools.despawn(pool_key, Pooled::from_parts(ticket, panel)) {
            Ok(()) => log::debug!("面板 {} 已返回对象池 {}", key, pool_key),
            Err(rejected) => {
                log::warn!("面板 {} 无法返回对象池: {}，直接销毁", key, rejected.error);
                let (_, mut panel) = rejected.entity.into_parts();
                let visual = panel.visual.take();
                self.destroy_panel(panel, visual);
            }
        }
    }

    /// 销毁对象池释放出的休眠面板所携带的视觉对象
    pub(crate) fn release_dormant(&mut self, mut panel: Panel) {
        let visual = panel.visual.take();
        self.destroy_panel(panel, visual);
    }

    fn destroy_cached(&mut self, mut panel: Panel) {
        panel.set_reusable(false);
        let visual = self.visuals.remove(panel.key());
        self.destroy_panel(panel, visual);
    }

    fn destroy_panel(&mut self, mut panel: Panel, visual: Option<VisualHandle>) {
        panel.destroy();
        if let Some(visual) = visual {
            self.instantiator.destroy(visual);
        }
        log::info!("面板 {} 已销毁", panel.key());
    }
}

impl std::fmt::Debug for PanelDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelDirectory")
            .field("root_container", &self.root_container)
            .field("live", &self.live_keys())
            .field("cached", &self.cached_keys())
            .finish()
    }
}

/// 被销毁的池化面板需要从池的计数中移除
fn pool_ticket_of(panel: &Panel) -> Option<(String, EntityId)> {
    match (panel.kind(), panel.pool_ticket) {
        (PanelKind::Poolable { pool_key, .. }, Some(ticket)) => Some((pool_key.clone(), ticket)),
        _ => None,
    }
}
