//! 世界 trait
//!
//! 定义仿真世界接口。

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：由业务层实现（例如数据中心/经纪人等）。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 每个事件执行完后调用
    fn on_tick(&mut self, _sim: &mut Simulator) {}

    /// 队列为空之外，世界自身是否仍有未完成的工作
    fn has_pending_work(&self) -> bool {
        false
    }

    /// `Simulator::run` 排空事件队列后调用一次（仿真完成信号）
    fn on_complete(&mut self, _sim: &mut Simulator) {}
}
