/// 可池化对象接口
///
/// 任何需要被对象池管理的UI对象都实现此trait
pub trait Poolable {
    /// 从池中取出时调用: 恢复可见、重新启用交互
    fn on_spawn(&mut self);

    /// 返回池中时调用: 隐藏、清理状态，使对象回到构造后的默认数据
    fn on_despawn(&mut self);
}
