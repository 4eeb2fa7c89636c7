use serde_json::Value;

/// UI事件
#[derive(Debug, Clone)]
pub struct UiEvent {
    /// 事件名称，监听器按名称订阅
    pub name: String,
    /// 发出事件的面板或元素
    pub source: Option<String>,
    pub payload: Value,
}

impl UiEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            payload: Value::Null,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}
