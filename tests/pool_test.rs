//! Object pool and pool registry behaviour through the public API

use ui_lifecycle::{OverflowPolicy, Pool, PoolConfig, PoolError, PoolRegistry, PoolStats, Poolable, Pooled};

#[derive(Debug, Default, Clone, PartialEq)]
struct Row {
    text: String,
    highlighted: bool,
    visible: bool,
}

impl Poolable for Row {
    fn on_spawn(&mut self) {
        self.visible = true;
    }

    fn on_despawn(&mut self) {
        *self = Row::default();
    }
}

fn conserved(stats: PoolStats) -> bool {
    stats.available + stats.in_use == stats.total_created && stats.total_created <= stats.max_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preload_two_max_three_step_one() {
        println!("🧪 preload=2, max=3, step=1");
        let mut pool = Pool::new(
            PoolConfig::new("Row").with_preload(2).with_max(3).with_expand_step(1),
            Row::default,
        )
        .unwrap();

        let a = pool.spawn().unwrap();
        let b = pool.spawn().unwrap();
        assert_eq!(pool.stats().total_created, 2, "从预加载对象取出，不扩容");

        let c = pool.spawn().unwrap();
        assert_eq!(pool.stats().total_created, 3);

        assert!(matches!(pool.spawn(), Err(PoolError::CapacityExceeded { max_count: 3, .. })));
        assert!(conserved(pool.stats()));

        for row in [a, b, c] {
            pool.despawn(row).unwrap();
        }
        assert_eq!(pool.stats().to_string(), "Available: 3, InUse: 0, Total: 3/3");
    }

    #[test]
    fn test_despawn_restores_defaults() {
        let mut pool = Pool::new(PoolConfig::new("Row").with_preload(1).with_max(1), Row::default).unwrap();

        let mut row = pool.spawn().unwrap();
        row.text = "stale".to_string();
        row.highlighted = true;
        pool.despawn(row).unwrap();

        let row = pool.spawn().unwrap();
        assert_eq!(
            *row,
            Row {
                visible: true,
                ..Row::default()
            }
        );
    }

    #[test]
    fn test_checked_out_entities_are_distinct() {
        let mut pool = Pool::new(PoolConfig::new("Row").with_preload(0).with_max(8).with_expand_step(3), Row::default)
            .unwrap();
        let held: Vec<Pooled<Row>> = (0..8).map(|_| pool.spawn().unwrap()).collect();

        let mut ids: Vec<_> = held.iter().map(|row| row.id().to_string()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert!(conserved(pool.stats()));
    }

    #[test]
    fn test_unmanaged_overflow_breaks_no_accounting() {
        let mut pool = Pool::new(
            PoolConfig::new("Row")
                .with_preload(1)
                .with_max(1)
                .with_overflow(OverflowPolicy::Unmanaged),
            Row::default,
        )
        .unwrap();

        let _managed = pool.spawn().unwrap();
        let extra = pool.spawn().unwrap();
        assert!(!extra.is_managed());

        let stats = pool.stats();
        assert!(conserved(stats));
        assert_eq!(stats.overflow_created, 1);
        assert!(stats.to_string().ends_with("Overflow: 1"));
    }

    #[test]
    fn test_registry_views_and_teardown() {
        let mut registry = PoolRegistry::new();
        assert!(registry.initialize());
        registry
            .register_pool(PoolConfig::new("Row").with_preload(2).with_max(2), Row::default)
            .unwrap();
        assert!(registry
            .register_pool(PoolConfig::new("Row").with_preload(0).with_max(9), Row::default)
            .is_err());

        let typed = registry.spawn::<Row>("Row").unwrap();
        let dynamic = registry.spawn_as::<Row>("Row").unwrap();
        assert!(registry.spawn_dyn("Row").is_err(), "两种视图共享同一个池");

        registry.despawn_dyn("Row", Box::new(typed)).unwrap();
        registry.despawn("Row", dynamic).unwrap();
        assert_eq!(registry.stats("Row").unwrap().available, 2);

        let released = registry.clear_all();
        assert_eq!(released.len(), 2);
        assert!(matches!(registry.spawn::<Row>("Row"), Err(PoolError::NotFound { .. })));
        assert_eq!(registry.stats_report(), "no pools registered");
    }
}
