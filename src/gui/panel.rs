/// 面板及其生命周期
///
/// 状态机:
/// `Created → Initialized → Active ⇄ Paused → (Deactivated | Pooled | Destroyed)`
///
/// 面板种类在构造时确定(普通 / 可复用 / 可池化)，关闭时通过 `close_policy()`
/// 告诉面板目录应当销毁、缓存还是返回对象池。

use serde::Serialize;
use std::any::Any;
use std::borrow::Borrow;
use std::fmt;

use super::instantiator::VisualHandle;
use crate::pool::{EntityId, Poolable};

/// 面板键，同一时刻只对应一个活跃实例
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PanelKey(String);

impl PanelKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PanelKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for PanelKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Borrow<str> for PanelKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// 面板实例唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PanelId(uuid::Uuid);

impl PanelId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

/// 面板生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PanelState {
    /// 已构造，尚未初始化
    Created,
    /// 模型/视图/控制器初始化完成
    Initialized,
    /// 可见且可交互
    Active,
    /// 有子面板打开，暂停交互但保持可见
    Paused,
    /// 可复用面板已隐藏并进入复用缓存
    Deactivated,
    /// 已返回对象池
    Pooled,
    /// 已销毁，不可再访问
    Destroyed,
}

/// 面板种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelKind {
    Plain,
    /// 关闭时缓存，`reusable == false` 时退化为销毁
    Reusable { reusable: bool },
    /// 关闭时返回 `pool_key` 对应的对象池，`pooled == false` 时退化为销毁
    Poolable { pool_key: String, pooled: bool },
}

/// 关闭策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosePolicy {
    Destroy,
    CacheForReuse,
    ReturnToPool { pool_key: String },
}

/// 面板内容的行为钩子
///
/// 所有钩子都有空的默认实现，具体面板只覆盖需要的部分
pub trait PanelBehavior: Any {
    /// 模型初始化，每个实例只调用一次
    fn model_init(&mut self, _key: &PanelKey) {}

    fn view_init(&mut self, _key: &PanelKey) {}

    fn controller_init(&mut self, _key: &PanelKey) {}

    /// 每次进入 Active(首次打开、缓存复用、从池中取出)时调用
    fn on_activate(&mut self, _key: &PanelKey) {}

    fn on_pause(&mut self) {}

    /// 暂停的父面板在最后一个子面板关闭后恢复时调用；从对象池取出不算恢复
    fn on_resume(&mut self) {}

    /// 进入复用缓存前重置状态
    fn reset_for_reuse(&mut self) {}

    /// 返回对象池前重置状态
    fn reset_poolable_state(&mut self) {}

    fn on_exit(&mut self) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub struct Panel {
    id: PanelId,
    key: PanelKey,
    path: String,
    kind: PanelKind,
    state: PanelState,
    parent: Option<PanelKey>,
    children: Vec<PanelKey>,
    initialized: bool,
    /// 在对象池中休眠时随面板保存的视觉对象
    pub(crate) visual: Option<VisualHandle>,
    pub(crate) pool_ticket: Option<EntityId>,
    behavior: Box<dyn PanelBehavior>,
}

impl Panel {
    pub fn new(
        key: impl Into<PanelKey>,
        path: impl Into<String>,
        kind: PanelKind,
        behavior: impl PanelBehavior,
    ) -> Self {
        Self {
            id: PanelId::generate(),
            key: key.into(),
            path: path.into(),
            kind,
            state: PanelState::Created,
            parent: None,
            children: Vec::new(),
            initialized: false,
            visual: None,
            pool_ticket: None,
            behavior: Box::new(behavior),
        }
    }

    pub fn plain(key: impl Into<PanelKey>, path: impl Into<String>, behavior: impl PanelBehavior) -> Self {
        Self::new(key, path, PanelKind::Plain, behavior)
    }

    pub fn reusable(key: impl Into<PanelKey>, path: impl Into<String>, behavior: impl PanelBehavior) -> Self {
        Self::new(key, path, PanelKind::Reusable { reusable: true }, behavior)
    }

    pub fn poolable(
        key: impl Into<PanelKey>,
        path: impl Into<String>,
        pool_key: impl Into<String>,
        behavior: impl PanelBehavior,
    ) -> Self {
        let kind = PanelKind::Poolable {
            pool_key: pool_key.into(),
            pooled: true,
        };
        Self::new(key, path, kind, behavior)
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn key(&self) -> &PanelKey {
        &self.key
    }

    pub(crate) fn set_key(&mut self, key: PanelKey) {
        self.key = key;
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> &PanelKind {
        &self.kind
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn parent(&self) -> Option<&PanelKey> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> &[PanelKey] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn behavior<B: PanelBehavior>(&self) -> Option<&B> {
        self.behavior.as_any().downcast_ref::<B>()
    }

    pub fn behavior_mut<B: PanelBehavior>(&mut self) -> Option<&mut B> {
        self.behavior.as_any_mut().downcast_mut::<B>()
    }

    /// 面板希望如何被关闭，读取实例自身的复用/池化标志
    pub fn close_policy(&self) -> ClosePolicy {
        match &self.kind {
            PanelKind::Plain => ClosePolicy::Destroy,
            PanelKind::Reusable { reusable: true } => ClosePolicy::CacheForReuse,
            PanelKind::Reusable { reusable: false } => ClosePolicy::Destroy,
            PanelKind::Poolable { pool_key, pooled: true } => ClosePolicy::ReturnToPool {
                pool_key: pool_key.clone(),
            },
            PanelKind::Poolable { pooled: false, .. } => ClosePolicy::Destroy,
        }
    }

    /// 设置是否可复用，非可复用面板返回 false
    pub fn set_reusable(&mut self, value: bool) -> bool {
        match &mut self.kind {
            PanelKind::Reusable { reusable } => {
                *reusable = value;
                true
            }
            _ => false,
        }
    }

    /// 关闭池化标志，此后关闭时走销毁路径
    pub(crate) fn disable_pooling(&mut self) {
        if let PanelKind::Poolable { pooled, .. } = &mut self.kind {
            *pooled = false;
        }
    }

    pub fn is_reusable(&self) -> bool {
        matches!(self.kind, PanelKind::Reusable { reusable: true })
    }

    pub fn can_transition_to(&self, next: PanelState) -> bool {
        use PanelState::*;
        matches!(
            (self.state, next),
            (Created, Initialized)
                | (Created, Pooled)
                | (Created, Destroyed)
                | (Initialized, Active)
                | (Initialized, Destroyed)
                | (Active, Paused)
                | (Active, Deactivated)
                | (Active, Pooled)
                | (Active, Destroyed)
                | (Paused, Active)
                | (Paused, Deactivated)
                | (Paused, Pooled)
                | (Paused, Destroyed)
                | (Deactivated, Active)
                | (Deactivated, Destroyed)
                | (Pooled, Active)
                | (Pooled, Destroyed)
        )
    }

    fn transition(&mut self, next: PanelState) -> bool {
        if !self.can_transition_to(next) {
            log::warn!("面板 {} 不能从 {:?} 转换到 {:?}", self.key, self.state, next);
            return false;
        }
        log::debug!("面板 {} 状态变更: {:?} -> {:?}", self.key, self.state, next);
        self.state = next;
        true
    }

    /// 一次性的模型/视图/控制器初始化，已初始化时返回 false
    pub(crate) fn initialize(&mut self) -> bool {
        if self.initialized {
            return false;
        }
        self.behavior.model_init(&self.key);
        self.behavior.view_init(&self.key);
        self.behavior.controller_init(&self.key);
        self.initialized = true;

        if self.state == PanelState::Created {
            self.transition(PanelState::Initialized);
        }
        true
    }

    /// 进入 Active 并触发激活钩子
    pub(crate) fn activate(&mut self) {
        if self.state != PanelState::Active && !self.transition(PanelState::Active) {
            return;
        }
        self.behavior.on_activate(&self.key);
    }

    /// 子面板打开时暂停，只有 Active 面板会被暂停
    pub(crate) fn pause(&mut self) -> bool {
        if self.state != PanelState::Active {
            return false;
        }
        self.transition(PanelState::Paused);
        self.behavior.on_pause();
        true
    }

    /// 恢复交互，仍有子面板时不恢复
    pub(crate) fn resume(&mut self) -> bool {
        if self.state != PanelState::Paused || !self.children.is_empty() {
            return false;
        }
        self.transition(PanelState::Active);
        self.behavior.on_resume();
        true
    }

    pub(crate) fn deactivate(&mut self) {
        if self.transition(PanelState::Deactivated) {
            self.behavior.reset_for_reuse();
        }
    }

    pub(crate) fn destroy(&mut self) {
        if self.transition(PanelState::Destroyed) {
            self.behavior.on_exit();
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<PanelKey>) {
        self.parent = parent;
    }

    pub(crate) fn add_child(&mut self, child: PanelKey) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: &PanelKey) -> bool {
        let before = self.children.len();
        self.children.retain(|c| c != child);
        before != self.children.len()
    }

    pub(crate) fn take_children(&mut self) -> Vec<PanelKey> {
        std::mem::take(&mut self.children)
    }
}

impl Poolable for Panel {
    // 复用实例的 on_activate 由目录在安装时调用
    fn on_spawn(&mut self) {
        self.transition(PanelState::Active);
    }

    fn on_despawn(&mut self) {
        self.parent = None;
        self.children.clear();
        if self.transition(PanelState::Pooled) {
            self.behavior.reset_poolable_state();
        }
    }
}

impl fmt::Debug for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panel")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("initialized", &self.initialized)
            .finish()
    }
}
