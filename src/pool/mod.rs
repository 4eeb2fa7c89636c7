/// UI对象池模块
///
/// - `Poolable`: 可池化对象的生命周期接口
/// - `Pool<T>`: 单一类型的有界对象池
/// - `PoolRegistry`: 按键管理所有对象池，支持类型擦除的动态访问

pub mod error;
pub mod object_pool;
pub mod poolable;
pub mod registry;

pub use error::{PoolError, PoolResult, Rejected};
pub use object_pool::{EntityId, Factory, Pool, PoolStats, Pooled};
pub use poolable::Poolable;
pub use registry::{ErasedPool, PoolRegistry};
