use thiserror::Error;

/// 对象池错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("对象池 {key} 不存在")]
    NotFound { key: String },

    #[error("对象池 {key} 已存在，拒绝重复注册")]
    DuplicateRegistration { key: String },

    #[error("对象池 {key} 已达到最大容量 {max_count}")]
    CapacityExceeded { key: String, max_count: usize },

    /// 重复回收或回收不属于此池的对象
    #[error("对象不属于对象池 {key} 或已被回收")]
    NotInUse { key: String },

    #[error("对象池 {key} 的元素类型不是 {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("对象池配置无效: {0}")]
    InvalidConfig(String),
}

/// 对象池操作结果
pub type PoolResult<T> = Result<T, PoolError>;

/// 被拒绝回收的对象，所有权交还给调用方
#[derive(Debug)]
pub struct Rejected<E> {
    pub error: PoolError,
    pub entity: E,
}

impl<E> Rejected<E> {
    pub fn new(error: PoolError, entity: E) -> Self {
        Self { error, entity }
    }

    pub fn into_entity(self) -> E {
        self.entity
    }
}

impl<E> std::fmt::Display for Rejected<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}
