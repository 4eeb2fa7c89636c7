/// 对象池注册表
///
/// 以字符串键管理所有对象池。每个池是一个具体类型的 `Pool<T>`，
/// 通过 `ErasedPool` 以非泛型接口存放，提供两种等价视图:
/// - 静态类型视图: `spawn::<T>(key)` / `despawn::<T>(key, entity)`
/// - 动态视图: `spawn_dyn(key)` / `despawn_dyn(key, entity)`，只在运行时知道键时使用

use std::any::Any;
use std::collections::{BTreeMap, HashMap};

use super::error::{PoolError, PoolResult, Rejected};
use super::object_pool::{EntityId, Pool, PoolStats, Pooled};
use super::poolable::Poolable;
use crate::config::PoolConfig;

/// 类型擦除后的对象池接口
pub trait ErasedPool {
    fn key(&self) -> &str;

    /// 池内元素的类型名，仅用于诊断
    fn element_type(&self) -> &'static str;

    /// 取出对象，返回值为 `Box<Pooled<T>>`
    fn spawn_any(&mut self) -> PoolResult<Box<dyn Any>>;

    /// 回收 `Box<Pooled<T>>`，类型不符或不在使用中时原样交还
    fn despawn_any(&mut self, entity: Box<dyn Any>) -> Result<(), Rejected<Box<dyn Any>>>;

    fn stats(&self) -> PoolStats;

    /// 放弃使用中的对象，见 `Pool::forget`
    fn forget(&mut self, id: EntityId) -> bool;

    /// 清空池，返回可用对象(`Box<T>`)的所有权
    fn clear(&mut self) -> Vec<Box<dyn Any>>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Poolable + 'static> ErasedPool for Pool<T> {
    fn key(&self) -> &str {
        Pool::key(self)
    }

    fn element_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn spawn_any(&mut self) -> PoolResult<Box<dyn Any>> {
        self.spawn().map(|entity| Box::new(entity) as Box<dyn Any>)
    }

    fn despawn_any(&mut self, entity: Box<dyn Any>) -> Result<(), Rejected<Box<dyn Any>>> {
        match entity.downcast::<Pooled<T>>() {
            Ok(entity) => self
                .despawn(*entity)
                .map_err(|r| Rejected::new(r.error, Box::new(r.entity) as Box<dyn Any>)),
            Err(entity) => {
                log::warn!("对象类型与对象池 {} 不匹配", Pool::key(self));
                Err(Rejected::new(
                    PoolError::TypeMismatch {
                        key: Pool::key(self).to_string(),
                        expected: std::any::type_name::<T>(),
                    },
                    entity,
                ))
            }
        }
    }

    fn stats(&self) -> PoolStats {
        Pool::stats(self)
    }

    fn forget(&mut self, id: EntityId) -> bool {
        Pool::forget(self, id)
    }

    fn clear(&mut self) -> Vec<Box<dyn Any>> {
        Pool::clear(self)
            .into_iter()
            .map(|value| Box::new(value) as Box<dyn Any>)
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct PoolRegistry {
    pools: HashMap<String, Box<dyn ErasedPool>>,
    initialized: bool,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
            initialized: false,
        }
    }

    /// 标记注册表已初始化，重复调用无效果并返回 false
    pub fn initialize(&mut self) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        log::info!("PoolRegistry 初始化完成");
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 创建并注册对象池，已存在的键被拒绝，先注册者保留
    pub fn register_pool<T, F>(&mut self, config: PoolConfig, factory: F) -> PoolResult<()>
    where
        T: Poolable + 'static,
        F: FnMut() -> T + 'static,
    {
        if self.pools.contains_key(&config.key) {
            log::warn!("对象池 {} 已存在，跳过重复注册", config.key);
            return Err(PoolError::DuplicateRegistration { key: config.key });
        }

        let key = config.key.clone();
        let preload = config.preload_count;
        let pool = Pool::new(config, factory)?;
        self.pools.insert(key.clone(), Box::new(pool));

        log::info!("对象池 {} 初始化完成，预加载 {} 个对象", key, preload);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pools.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.pools.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    fn erased_mut(&mut self, key: &str) -> PoolResult<&mut Box<dyn ErasedPool>> {
        self.pools.get_mut(key).ok_or_else(|| {
            log::error!("对象池 {} 不存在", key);
            PoolError::NotFound {
                key: key.to_string(),
            }
        })
    }

    /// 获取具体类型的对象池
    pub fn pool<T: Poolable + 'static>(&self, key: &str) -> Option<&Pool<T>> {
        self.pools
            .get(key)
            .and_then(|pool| pool.as_any().downcast_ref::<Pool<T>>())
    }

    fn typed_mut<T: Poolable + 'static>(&mut self, key: &str) -> PoolResult<&mut Pool<T>> {
        self.erased_mut(key)?
            .as_any_mut()
            .downcast_mut::<Pool<T>>()
            .ok_or_else(|| PoolError::TypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// 从池中取出对象(静态类型视图)
    pub fn spawn<T: Poolable + 'static>(&mut self, key: &str) -> PoolResult<Pooled<T>> {
        self.typed_mut::<T>(key)?.spawn()
    }

    /// 将对象返回到池中(静态类型视图)
    pub fn despawn<T: Poolable + 'static>(
        &mut self,
        key: &str,
        entity: Pooled<T>,
    ) -> Result<(), Rejected<Pooled<T>>> {
        match self.typed_mut::<T>(key) {
            Ok(pool) => pool.despawn(entity),
            Err(error) => Err(Rejected::new(error, entity)),
        }
    }

    /// 通过键从池中取出对象(动态视图)，返回 `Box<Pooled<T>>`
    pub fn spawn_dyn(&mut self, key: &str) -> PoolResult<Box<dyn Any>> {
        self.erased_mut(key)?.spawn_any()
    }

    /// 通过键将对象返回到池中(动态视图)
    pub fn despawn_dyn(&mut self, key: &str, entity: Box<dyn Any>) -> Result<(), Rejected<Box<dyn Any>>> {
        match self.erased_mut(key) {
            Ok(pool) => pool.despawn_any(entity),
            Err(error) => Err(Rejected::new(error, entity)),
        }
    }

    /// 动态取出并还原为具体类型，类型不符时对象被放回池中
    pub fn spawn_as<T: Poolable + 'static>(&mut self, key: &str) -> PoolResult<Pooled<T>> {
        let entity = self.spawn_dyn(key)?;
        match entity.downcast::<Pooled<T>>() {
            Ok(entity) => Ok(*entity),
            Err(entity) => {
                // 原样放回，保持计数守恒
                if let Err(rejected) = self.despawn_dyn(key, entity) {
                    log::warn!("对象无法放回对象池 {}: {}", key, rejected.error);
                }
                Err(PoolError::TypeMismatch {
                    key: key.to_string(),
                    expected: std::any::type_name::<T>(),
                })
            }
        }
    }

    /// 放弃指定池中使用中的对象
    pub fn forget(&mut self, key: &str, id: EntityId) -> PoolResult<bool> {
        Ok(self.erased_mut(key)?.forget(id))
    }

    /// 获取指定池的统计信息
    pub fn stats(&self, key: &str) -> PoolResult<PoolStats> {
        self.pools
            .get(key)
            .map(|pool| pool.stats())
            .ok_or_else(|| PoolError::NotFound {
                key: key.to_string(),
            })
    }

    /// 获取所有池的统计信息
    pub fn all_stats(&self) -> BTreeMap<String, PoolStats> {
        self.pools
            .iter()
            .map(|(key, pool)| (key.clone(), pool.stats()))
            .collect()
    }

    /// 所有池统计信息的文本报告
    pub fn stats_report(&self) -> String {
        if self.pools.is_empty() {
            return "no pools registered".to_string();
        }

        let mut report = String::from("=== pool stats ===\n");
        for (key, stats) in self.all_stats() {
            report.push_str(&format!("{}: {}\n", key, stats));
        }
        report
    }

    /// 清空所有池并注销全部注册，返回可用对象的所有权供外部处置
    pub fn clear_all(&mut self) -> Vec<Box<dyn Any>> {
        let mut released = Vec::new();
        for pool in self.pools.values_mut() {
            released.extend(pool.clear());
        }
        self.pools.clear();
        self.initialized = false;

        log::info!("所有对象池已清空，释放 {} 个对象", released.len());
        released
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Toast {
        message: String,
        shown: bool,
    }

    impl Poolable for Toast {
        fn on_spawn(&mut self) {
            self.shown = true;
        }

        fn on_despawn(&mut self) {
            self.shown = false;
            self.message.clear();
        }
    }

    #[derive(Debug, Default)]
    struct Badge;

    impl Poolable for Badge {
        fn on_spawn(&mut self) {}
        fn on_despawn(&mut self) {}
    }

    fn registry() -> PoolRegistry {
        let mut registry = PoolRegistry::new();
        registry
            .register_pool(
                PoolConfig::new("Toast").with_preload(2).with_max(4).with_expand_step(2),
                Toast::default,
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut registry = PoolRegistry::new();
        assert!(registry.initialize());
        assert!(!registry.initialize());
        assert!(registry.is_initialized());
    }

    #[test]
    fn test_duplicate_registration_rejected_first_wins() {
        let mut registry = registry();
        let result = registry.register_pool(PoolConfig::new("Toast").with_preload(0).with_max(1), Toast::default);
        assert_eq!(
            result,
            Err(PoolError::DuplicateRegistration {
                key: "Toast".to_string()
            })
        );
        assert_eq!(registry.stats("Toast").unwrap().max_count, 4);
    }

    #[test]
    fn test_unknown_key_not_found() {
        let mut registry = registry();
        assert!(matches!(registry.spawn::<Toast>("Missing"), Err(PoolError::NotFound { .. })));
        assert!(matches!(registry.spawn_dyn("Missing"), Err(PoolError::NotFound { .. })));
        assert!(registry.stats("Missing").is_err());
    }

    #[test]
    fn test_typed_and_dynamic_views_share_one_store() {
        let mut registry = registry();

        let typed = registry.spawn::<Toast>("Toast").unwrap();
        let dynamic = registry.spawn_dyn("Toast").unwrap();
        assert_eq!(registry.stats("Toast").unwrap().in_use, 2);

        // 动态取出的对象可以用静态视图回收，反之亦然
        let dynamic = *dynamic.downcast::<Pooled<Toast>>().unwrap();
        registry.despawn("Toast", dynamic).unwrap();
        registry.despawn_dyn("Toast", Box::new(typed)).unwrap();

        let stats = registry.stats("Toast").unwrap();
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.available, 2);
    }

    #[test]
    fn test_type_mismatch() {
        let mut registry = registry();
        assert!(matches!(
            registry.spawn::<Badge>("Toast"),
            Err(PoolError::TypeMismatch { .. })
        ));
        assert!(matches!(
            registry.spawn_as::<Badge>("Toast"),
            Err(PoolError::TypeMismatch { .. })
        ));
        assert_eq!(registry.stats("Toast").unwrap().in_use, 0);

        let rejected = registry.despawn_dyn("Toast", Box::new(42u32)).unwrap_err();
        assert!(matches!(rejected.error, PoolError::TypeMismatch { .. }));
    }

    #[test]
    fn test_forget_through_registry() {
        let mut registry = registry();
        let toast = registry.spawn::<Toast>("Toast").unwrap();
        assert_eq!(registry.forget("Toast", toast.id()), Ok(true));
        assert_eq!(registry.forget("Toast", toast.id()), Ok(false));
        assert_eq!(registry.stats("Toast").unwrap().total_created, 1);
        assert!(registry.forget("Missing", toast.id()).is_err());
    }

    #[test]
    fn test_stats_report() {
        let mut registry = PoolRegistry::new();
        assert_eq!(registry.stats_report(), "no pools registered");

        registry
            .register_pool(PoolConfig::new("Badge").with_preload(1).with_max(1), Badge::default)
            .unwrap();
        let report = registry.stats_report();
        assert!(report.contains("Badge: Available: 1, InUse: 0, Total: 1/1"));
        assert_eq!(registry.all_stats().len(), 1);
    }

    #[test]
    fn test_clear_all_forgets_registrations() {
        let mut registry = registry();
        registry.initialize();
        let _held = registry.spawn::<Toast>("Toast").unwrap();

        let released = registry.clear_all();
        assert_eq!(released.len(), 1);
        assert!(released[0].downcast_ref::<Toast>().is_some());
        assert!(registry.is_empty());
        assert!(!registry.is_initialized());
        assert!(matches!(registry.spawn::<Toast>("Toast"), Err(PoolError::NotFound { .. })));
    }
}
