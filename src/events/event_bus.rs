use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use super::event_types::UiEvent;

/// 事件处理器类型定义
pub type EventHandler = Rc<dyn Fn(&UiEvent)>;

/// 监听器标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// 事件通知服务
///
/// 面板回收进对象池时通过此接口清除作用域内的所有监听器，防止复用后残留旧订阅
pub trait EventNotifier {
    /// 清除作用域 `scope` 下的所有监听器，返回清除数量
    fn clear_listeners_scoped_to(&mut self, scope: &str) -> usize;
}

struct Listener {
    id: ListenerId,
    scope: Option<String>,
    handler: EventHandler,
}

#[derive(Debug, Default, Clone)]
pub struct EventBusStats {
    pub total_events_published: u64,
    pub total_events_processed: u64,
    pub events_dropped: u64,
    pub handler_errors: u64,
    pub listeners_cleared: u64,
}

/// UI事件总线
///
/// 事件先入队，再按发布顺序同步分发。队列满时丢弃最旧的事件。
///
/// 所有方法只需要 `&self`: 分发时不持有任何内部借用，处理器可以重入总线
/// (订阅、发布、清除作用域)，例如在点击事件中关闭池化面板
pub struct EventBus {
    events: RefCell<VecDeque<UiEvent>>,
    capacity: usize,
    listeners: RefCell<HashMap<String, Vec<Listener>>>,
    next_listener_id: Cell<u64>,
    stats: RefCell<EventBusStats>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: RefCell::new(VecDeque::with_capacity(capacity)),
            capacity,
            listeners: RefCell::new(HashMap::new()),
            next_listener_id: Cell::new(0),
            stats: RefCell::new(EventBusStats::default()),
        }
    }

    /// 创建可在多个协作者之间共享的事件总线
    pub fn shared(capacity: usize) -> Rc<Self> {
        Rc::new(Self::new(capacity))
    }

    fn add_listener(&self, event_name: &str, scope: Option<String>, handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_listener_id.get());
        self.next_listener_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(event_name.to_string())
            .or_insert_with(Vec::new)
            .push(Listener { id, scope, handler });
        id
    }

    /// 订阅事件，不属于任何作用域
    pub fn subscribe<F>(&self, event_name: &str, handler: F) -> ListenerId
    where
        F: Fn(&UiEvent) + 'static,
    {
        self.add_listener(event_name, None, Rc::new(handler))
    }

    /// 订阅事件并归属到作用域(通常是面板键)
    pub fn subscribe_scoped<F>(&self, event_name: &str, scope: &str, handler: F) -> ListenerId
    where
        F: Fn(&UiEvent) + 'static,
    {
        self.add_listener(event_name, Some(scope.to_string()), Rc::new(handler))
    }

    /// 取消订阅
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        for listeners in self.listeners.borrow_mut().values_mut() {
            if let Some(pos) = listeners.iter().position(|l| l.id == id) {
                listeners.remove(pos);
                return true;
            }
        }
        false
    }

    fn is_subscribed(&self, event_name: &str, id: ListenerId) -> bool {
        self.listeners
            .borrow()
            .get(event_name)
            .map_or(false, |listeners| listeners.iter().any(|l| l.id == id))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().values().map(Vec::len).sum()
    }

    pub fn scoped_listener_count(&self, scope: &str) -> usize {
        self.listeners
            .borrow()
            .values()
            .flatten()
            .filter(|l| l.scope.as_deref() == Some(scope))
            .count()
    }

    /// 发布事件到总线
    pub fn publish(&self, event: UiEvent) {
        let mut stats = self.stats.borrow_mut();
        stats.total_events_published += 1;

        let mut events = self.events.borrow_mut();
        if events.len() == self.capacity {
            events.pop_front();
            stats.events_dropped += 1;
        }
        events.push_back(event);
    }

    /// 处理单个事件
    ///
    /// 先取出处理器快照再释放借用；分发途中被清除的监听器不再被调用
    pub fn process_next_event(&self) -> bool {
        let Some(event) = self.events.borrow_mut().pop_front() else {
            return false;
        };

        let snapshot: Vec<(ListenerId, EventHandler)> = self
            .listeners
            .borrow()
            .get(&event.name)
            .map(|listeners| listeners.iter().map(|l| (l.id, l.handler.clone())).collect())
            .unwrap_or_default();

        let mut errors = 0;
        for (id, handler) in snapshot {
            if !self.is_subscribed(&event.name, id) {
                continue;
            }
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (*handler)(&event))).is_err() {
                errors += 1;
            }
        }

        let mut stats = self.stats.borrow_mut();
        stats.handler_errors += errors;
        stats.total_events_processed += 1;
        true
    }

    /// 处理所有待处理事件，包括处理途中新发布的事件
    pub fn process_all_events(&self) -> usize {
        let mut processed = 0;
        while self.process_next_event() {
            processed += 1;
        }
        processed
    }

    pub fn pending_events(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn stats(&self) -> EventBusStats {
        self.stats.borrow().clone()
    }

    /// 清除作用域下的所有监听器
    pub fn clear_scope(&self, scope: &str) -> usize {
        let mut cleared = 0;
        {
            let mut listeners = self.listeners.borrow_mut();
            for list in listeners.values_mut() {
                let before = list.len();
                list.retain(|l| l.scope.as_deref() != Some(scope));
                cleared += before - list.len();
            }
            listeners.retain(|_, list| !list.is_empty());
        }
        self.stats.borrow_mut().listeners_cleared += cleared as u64;

        if cleared > 0 {
            log::debug!("已清除作用域 {} 的 {} 个事件监听器", scope, cleared);
        }
        cleared
    }
}

impl EventNotifier for EventBus {
    fn clear_listeners_scoped_to(&mut self, scope: &str) -> usize {
        self.clear_scope(scope)
    }
}

impl EventNotifier for Rc<EventBus> {
    fn clear_listeners_scoped_to(&mut self, scope: &str) -> usize {
        self.clear_scope(scope)
    }
}

/// 不做任何事的通知服务
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl EventNotifier for NoopNotifier {
    fn clear_listeners_scoped_to(&mut self, _scope: &str) -> usize {
        0
    }
}
