/// 通用UI对象池
///
/// 管理单一类型的可池化对象:
/// - 预加载 `preload_count` 个对象
/// - 无可用对象时按 `expand_step` 扩容，总数不超过 `max_count`
/// - 达到容量上限后按 `OverflowPolicy` 处理
/// - 通过 `EntityId` 识别重复回收和外来对象

use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::ops::{Deref, DerefMut};

use super::error::{PoolError, PoolResult, Rejected};
use super::poolable::Poolable;
use crate::config::{OverflowPolicy, PoolConfig};

/// 池化对象唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntityId(uuid::Uuid);

impl EntityId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 从池中取出的对象
///
/// 携带池内标识，回收时据此校验归属
#[derive(Debug)]
pub struct Pooled<T> {
    id: EntityId,
    managed: bool,
    value: T,
}

impl<T> Pooled<T> {
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// 溢出创建的对象不受池管理，无法回收
    pub fn is_managed(&self) -> bool {
        self.managed
    }

    pub(crate) fn into_parts(self) -> (EntityId, T) {
        (self.id, self.value)
    }

    pub(crate) fn from_parts(id: EntityId, value: T) -> Self {
        Self {
            id,
            managed: true,
            value,
        }
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// 池统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    pub available: usize,
    pub in_use: usize,
    pub total_created: usize,
    pub max_count: usize,
    /// 溢出策略下额外创建、不计入 total_created 的对象数
    pub overflow_created: usize,
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Available: {}, InUse: {}, Total: {}/{}",
            self.available, self.in_use, self.total_created, self.max_count
        )?;
        if self.overflow_created > 0 {
            write!(f, ", Overflow: {}", self.overflow_created)?;
        }
        Ok(())
    }
}

/// 对象工厂函数
pub type Factory<T> = Box<dyn FnMut() -> T>;

pub struct Pool<T: Poolable> {
    config: PoolConfig,
    factory: Factory<T>,
    available: VecDeque<Pooled<T>>,
    in_use: HashSet<EntityId>,
    total_created: usize,
    overflow_created: usize,
}

impl<T: Poolable> Pool<T> {
    /// 创建对象池并预加载 `preload_count` 个对象
    pub fn new<F>(config: PoolConfig, factory: F) -> PoolResult<Self>
    where
        F: FnMut() -> T + 'static,
    {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let mut pool = Self {
            factory: Box::new(factory),
            available: VecDeque::with_capacity(config.preload_count),
            in_use: HashSet::new(),
            total_created: 0,
            overflow_created: 0,
            config,
        };

        for _ in 0..pool.config.preload_count {
            let entity = pool.create();
            pool.available.push_back(entity);
        }

        log::debug!(
            "对象池 {} 预加载 {} 个对象",
            pool.config.key,
            pool.config.preload_count
        );
        Ok(pool)
    }

    pub fn key(&self) -> &str {
        &self.config.key
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// 创建一个新对象，立即回收以统一初始状态
    fn create(&mut self) -> Pooled<T> {
        let mut value = (self.factory)();
        value.on_despawn();
        self.total_created += 1;
        Pooled {
            id: EntityId::generate(),
            managed: true,
            value,
        }
    }

    /// 扩容，数量被截断到剩余容量
    fn expand(&mut self) -> usize {
        let remaining = self.config.max_count - self.total_created;
        let grow = self.config.expand_step.min(remaining);
        for _ in 0..grow {
            let entity = self.create();
            self.available.push_back(entity);
        }
        log::debug!(
            "对象池 {} 扩容 {} 个对象，当前总数 {}/{}",
            self.config.key,
            grow,
            self.total_created,
            self.config.max_count
        );
        grow
    }

    /// 从池中取出对象
    pub fn spawn(&mut self) -> PoolResult<Pooled<T>> {
        if self.available.is_empty() && self.total_created < self.config.max_count {
            self.expand();
        }

        let mut entity = match self.available.pop_front() {
            Some(entity) => entity,
            None => return self.spawn_overflow(),
        };

        self.in_use.insert(entity.id);
        entity.value.on_spawn();
        Ok(entity)
    }

    fn spawn_overflow(&mut self) -> PoolResult<Pooled<T>> {
        match self.config.overflow {
            OverflowPolicy::Reject => {
                log::warn!(
                    "对象池 {} 已达到最大容量 {}，拒绝创建对象",
                    self.config.key,
                    self.config.max_count
                );
                Err(PoolError::CapacityExceeded {
                    key: self.config.key.clone(),
                    max_count: self.config.max_count,
                })
            }
            OverflowPolicy::Unmanaged => {
                log::warn!(
                    "对象池 {} 已达到最大容量 {}，创建不受管理的溢出对象",
                    self.config.key,
                    self.config.max_count
                );
                let mut value = (self.factory)();
                value.on_spawn();
                self.overflow_created += 1;
                Ok(Pooled {
                    id: EntityId::generate(),
                    managed: false,
                    value,
                })
            }
        }
    }

    /// 将对象返回到池中
    ///
    /// 不在使用中的对象(重复回收、外来对象、溢出对象)被拒绝并交还调用方
    pub fn despawn(&mut self, mut entity: Pooled<T>) -> Result<(), Rejected<Pooled<T>>> {
        if !self.in_use.remove(&entity.id) {
            log::warn!(
                "尝试回收不属于对象池 {} 的对象 {}",
                self.config.key,
                entity.id
            );
            return Err(Rejected::new(
                PoolError::NotInUse {
                    key: self.config.key.clone(),
                },
                entity,
            ));
        }

        entity.value.on_despawn();
        self.available.push_back(entity);
        Ok(())
    }

    pub fn is_in_use(&self, id: EntityId) -> bool {
        self.in_use.contains(&id)
    }

    /// 放弃一个使用中的对象，调用方已自行销毁它
    ///
    /// 该对象不再计入 `total_created`，腾出的容量可被重新创建
    pub fn forget(&mut self, id: EntityId) -> bool {
        if !self.in_use.remove(&id) {
            return false;
        }
        self.total_created -= 1;
        log::debug!("对象池 {} 放弃对象 {}", self.config.key, id);
        true
    }

    /// 清空池，可用对象的所有权转交调用方
    ///
    /// 不再调用任何生命周期回调；仍在外部使用的对象此后无法回收
    pub fn clear(&mut self) -> Vec<T> {
        let drained: Vec<T> = self.available.drain(..).map(|p| p.value).collect();
        self.in_use.clear();
        self.total_created = 0;
        self.overflow_created = 0;
        log::debug!("对象池 {} 已清空", self.config.key);
        drained
    }

    /// 获取池状态信息
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.available.len(),
            in_use: self.in_use.len(),
            total_created: self.total_created,
            max_count: self.config.max_count,
            overflow_created: self.overflow_created,
        }
    }
}
