/// 视觉对象实例化服务
///
/// 核心只通过这些接口接触宿主引擎: 按路径实例化、显示/隐藏、销毁、查找根容器

use async_trait::async_trait;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// 宿主引擎中视觉对象的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VisualHandle(u64);

impl VisualHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// 同步实例化服务
pub trait Instantiator {
    /// 查找挂载面板的根容器
    fn find_root_container(&self, name: &str) -> Option<VisualHandle>;

    /// 在根容器下实例化资源，资源不存在时返回 None
    fn instantiate(&mut self, path: &str, root: VisualHandle) -> Option<VisualHandle>;

    fn set_visible(&mut self, handle: VisualHandle, visible: bool);

    fn destroy(&mut self, handle: VisualHandle);
}

/// 异步实例化服务
///
/// 返回的 future 完成时才产生视觉对象；被丢弃(取消)时不得留下已创建的对象
#[async_trait(?Send)]
pub trait AsyncInstantiator {
    async fn instantiate(&self, path: &str, root: VisualHandle) -> Option<VisualHandle>;
}

impl<I: Instantiator> Instantiator for Rc<RefCell<I>> {
    fn find_root_container(&self, name: &str) -> Option<VisualHandle> {
        self.borrow().find_root_container(name)
    }

    fn instantiate(&mut self, path: &str, root: VisualHandle) -> Option<VisualHandle> {
        self.borrow_mut().instantiate(path, root)
    }

    fn set_visible(&mut self, handle: VisualHandle, visible: bool) {
        self.borrow_mut().set_visible(handle, visible)
    }

    fn destroy(&mut self, handle: VisualHandle) {
        self.borrow_mut().destroy(handle)
    }
}

/// 共享的同步实例化服务也可以作为异步加载器使用: 让出一次调度后再创建
#[async_trait(?Send)]
impl<I: Instantiator> AsyncInstantiator for Rc<RefCell<I>> {
    async fn instantiate(&self, path: &str, root: VisualHandle) -> Option<VisualHandle> {
        tokio::task::yield_now().await;
        self.borrow_mut().instantiate(path, root)
    }
}

#[derive(Debug, Clone)]
struct HeadlessVisual {
    path: String,
    visible: bool,
}

/// 无界面的内存实例化服务
///
/// 用于演示程序和测试: 记录已知资源、可见性和已销毁的句柄
#[derive(Debug)]
pub struct HeadlessInstantiator {
    root_name: String,
    resources: HashSet<String>,
    visuals: HashMap<VisualHandle, HeadlessVisual>,
    destroyed: HashSet<VisualHandle>,
    next_handle: u64,
}

const ROOT_HANDLE: VisualHandle = VisualHandle(0);

impl HeadlessInstantiator {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            resources: HashSet::new(),
            visuals: HashMap::new(),
            destroyed: HashSet::new(),
            next_handle: 1,
        }
    }

    pub fn with_resource(mut self, path: impl Into<String>) -> Self {
        self.register_resource(path);
        self
    }

    pub fn register_resource(&mut self, path: impl Into<String>) {
        self.resources.insert(path.into());
    }

    /// 包装成可共享的实例化服务
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn is_visible(&self, handle: VisualHandle) -> Option<bool> {
        self.visuals.get(&handle).map(|v| v.visible)
    }

    pub fn is_destroyed(&self, handle: VisualHandle) -> bool {
        self.destroyed.contains(&handle)
    }

    pub fn path_of(&self, handle: VisualHandle) -> Option<&str> {
        self.visuals.get(&handle).map(|v| v.path.as_str())
    }

    /// 尚未销毁的视觉对象数量
    pub fn live_visual_count(&self) -> usize {
        self.visuals.len()
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed.len()
    }
}

impl Instantiator for HeadlessInstantiator {
    fn find_root_container(&self, name: &str) -> Option<VisualHandle> {
        (name == self.root_name).then_some(ROOT_HANDLE)
    }

    fn instantiate(&mut self, path: &str, root: VisualHandle) -> Option<VisualHandle> {
        if root != ROOT_HANDLE || !self.resources.contains(path) {
            return None;
        }

        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.visuals.insert(
            handle,
            HeadlessVisual {
                path: path.to_string(),
                visible: false,
            },
        );
        Some(handle)
    }

    fn set_visible(&mut self, handle: VisualHandle, visible: bool) {
        match self.visuals.get_mut(&handle) {
            Some(visual) => visual.visible = visible,
            None => log::warn!("视觉对象 {:?} 不存在", handle),
        }
    }

    fn destroy(&mut self, handle: VisualHandle) {
        if self.visuals.remove(&handle).is_some() {
            self.destroyed.insert(handle);
        } else {
            log::warn!("重复销毁视觉对象 {:?}", handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_known_resource_only() {
        let mut headless = HeadlessInstantiator::new("Canvas").with_resource("UI/Settings");
        let root = headless.find_root_container("Canvas").unwrap();
        assert!(headless.find_root_container("Other").is_none());

        let handle = headless.instantiate("UI/Settings", root).unwrap();
        assert_eq!(headless.path_of(handle), Some("UI/Settings"));
        assert_eq!(headless.is_visible(handle), Some(false));
        assert!(headless.instantiate("UI/Missing", root).is_none());
    }

    #[test]
    fn test_visibility_and_destroy() {
        let mut headless = HeadlessInstantiator::new("Canvas").with_resource("UI/A");
        let root = headless.find_root_container("Canvas").unwrap();
        let handle = headless.instantiate("UI/A", root).unwrap();

        headless.set_visible(handle, true);
        assert_eq!(headless.is_visible(handle), Some(true));

        headless.destroy(handle);
        assert!(headless.is_destroyed(handle));
        assert_eq!(headless.live_visual_count(), 0);
        assert_eq!(headless.is_visible(handle), None);
    }

    #[tokio::test]
    async fn test_shared_instantiator_loads_async() {
        let shared = HeadlessInstantiator::new("Canvas").with_resource("UI/A").shared();
        let root = shared.find_root_container("Canvas").unwrap();

        let handle = AsyncInstantiator::instantiate(&shared, "UI/A", root).await;
        assert!(handle.is_some());
        assert_eq!(shared.borrow().live_visual_count(), 1);
    }
}
