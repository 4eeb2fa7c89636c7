/// 池化列表
///
/// 列表行是非面板的可池化UI元素，频繁增删时从 `Pool<ListItem>` 取出和回收

use std::collections::HashMap;

use crate::config::PoolConfig;
use crate::pool::{EntityId, Pool, PoolResult, PoolStats, Poolable, Pooled};

/// 列表行
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub visible: bool,
    pub alpha: f32,
    pub blocks_raycasts: bool,
    pub click_listener: bool,
    pub item_id: Option<u64>,
    pub name: String,
    pub count: u32,
}

impl Default for ListItem {
    fn default() -> Self {
        Self {
            visible: false,
            alpha: 1.0,
            blocks_raycasts: true,
            click_listener: false,
            item_id: None,
            name: String::new(),
            count: 0,
        }
    }
}

impl ListItem {
    pub fn set_data(&mut self, id: u64, name: impl Into<String>, count: u32) {
        self.item_id = Some(id);
        self.name = name.into();
        self.count = count;
    }

    pub fn label(&self) -> String {
        format!("{} x{}", self.name, self.count)
    }

    fn clear_data(&mut self) {
        self.item_id = None;
        self.name.clear();
        self.count = 0;
    }
}

impl Poolable for ListItem {
    fn on_spawn(&mut self) {
        self.visible = true;
        self.alpha = 1.0;
        self.blocks_raycasts = true;
        self.clear_data();
        self.click_listener = true;
    }

    fn on_despawn(&mut self) {
        self.click_listener = false;
        self.visible = false;
        self.clear_data();
    }
}

/// 使用对象池管理行的列表
pub struct PooledList {
    pool: Pool<ListItem>,
    rows: Vec<Pooled<ListItem>>,
    unmanaged: usize,
}

impl PooledList {
    pub fn new(config: PoolConfig) -> PoolResult<Self> {
        Ok(Self {
            pool: Pool::new(config, ListItem::default)?,
            rows: Vec::new(),
            unmanaged: 0,
        })
    }

    /// 添加一行，池耗尽时按溢出策略处理
    pub fn add_item(&mut self, id: u64, name: impl Into<String>, count: u32) -> PoolResult<EntityId> {
        let mut row = self.pool.spawn()?;
        row.set_data(id, name, count);
        if !row.is_managed() {
            self.unmanaged += 1;
        }

        let entity = row.id();
        self.rows.push(row);
        Ok(entity)
    }

    /// 移除一行并回收，行不存在时返回 false
    pub fn remove_item(&mut self, entity: EntityId) -> bool {
        let Some(pos) = self.rows.iter().position(|row| row.id() == entity) else {
            return false;
        };

        let row = self.rows.remove(pos);
        if !row.is_managed() {
            self.unmanaged -= 1;
            return true;
        }
        if let Err(rejected) = self.pool.despawn(row) {
            log::warn!("列表行回收失败: {}", rejected.error);
        }
        true
    }

    /// 回收所有行，返回回收数量
    pub fn clear_items(&mut self) -> usize {
        let rows: Vec<EntityId> = self.rows.iter().map(|row| row.id()).collect();
        let count = rows.len();
        for entity in rows {
            self.remove_item(entity);
        }
        count
    }

    pub fn items(&self) -> impl Iterator<Item = &ListItem> {
        self.rows.iter().map(|row| &**row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.items().map(ListItem::label).collect()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// 溢出策略下创建的、不受池管理的行数
    pub fn unmanaged_rows(&self) -> usize {
        self.unmanaged
    }

    /// 按名称统计行数
    pub fn counts_by_name(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for item in self.items() {
            *counts.entry(item.name.clone()).or_insert(0) += 1;
        }
        counts
    }
}
