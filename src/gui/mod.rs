/// GUI模块 - 面板生命周期与面板目录
pub mod directory;
pub mod instantiator;
pub mod list;
pub mod panel;

pub use directory::{DirectoryError, DirectoryResult, PanelDirectory};
pub use instantiator::{AsyncInstantiator, HeadlessInstantiator, Instantiator, VisualHandle};
pub use list::{ListItem, PooledList};
pub use panel::{ClosePolicy, Panel, PanelBehavior, PanelId, PanelKey, PanelKind, PanelState};
