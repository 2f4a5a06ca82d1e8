//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。

use super::event::{Event, EventId};
use super::event_queue::EventQueue;
use super::time::SimTime;
use super::world::World;
use crate::error::SimError;
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    q: EventQueue,
    processed: u64,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 已执行的事件数（不含被取消的事件）
    pub fn processed_events(&self) -> u64 {
        self.processed
    }

    /// 队列中尚未被取消的事件数
    pub fn pending_events(&self) -> usize {
        self.q.len()
    }

    /// 事件队列占用的条目数（含尚未清理的已取消事件）
    pub fn queued_entries(&self) -> usize {
        self.q.heap_len()
    }

    /// 事件是否仍在等待执行（未执行且未被取消）
    pub fn is_scheduled(&self, id: EventId) -> bool {
        self.q.contains(id)
    }

    /// 调度事件在指定时间执行
    ///
    /// `at` 早于当前时间时返回 `LogicalTimeViolation`。
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) -> Result<EventId, SimError> {
        if at < self.now {
            return Err(SimError::LogicalTimeViolation { now: self.now, at });
        }
        let id = self.q.push(at, Box::new(ev));
        trace!(now = ?self.now, seq = id.0, queue_size = self.q.len(), "调度事件");
        Ok(id)
    }

    /// 调度一个“立即”事件（排在同一时刻已调度事件之后）
    pub fn schedule_now<E: Event>(&mut self, ev: E) -> EventId {
        self.q.push(self.now, Box::new(ev))
    }

    /// 调度一个相对当前时间延迟 `delay` 的事件
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) -> EventId {
        self.q.push(self.now.saturating_add(delay), Box::new(ev))
    }

    /// 取消一个尚未执行的事件；对已执行的事件无效果
    pub fn cancel(&mut self, id: EventId) {
        if self.q.cancel(id) {
            trace!(seq = id.0, "取消事件");
        }
    }

    /// 下一个存活事件的时间
    pub fn next_event_time(&mut self) -> Option<SimTime> {
        self.q.peek_time()
    }

    /// 执行最早的一个事件，并把时钟推进到它的时间戳。
    ///
    /// 队列为空时返回 `Ok(false)`。
    pub fn advance(&mut self, world: &mut dyn World) -> Result<bool, SimError> {
        let Some(item) = self.q.pop() else {
            return Ok(false);
        };
        self.now = item.at;
        self.processed += 1;

        debug!(
            event_num = self.processed,
            now = ?self.now,
            seq = item.seq,
            remaining_queue = self.q.len(),
            "执行事件"
        );

        item.ev.execute(self, world)?;
        world.on_tick(self);
        Ok(true)
    }

    /// 执行所有不晚于 `until` 的事件；时钟停在最后一个执行的事件上。
    pub fn advance_through(&mut self, until: SimTime, world: &mut dyn World) -> Result<(), SimError> {
        while self.next_event_time().is_some_and(|at| at <= until) {
            self.advance(world)?;
        }
        Ok(())
    }

    /// 运行直到事件队列为空或到达 `until`，然后把时钟推进到 `until`。
    ///
    /// 与 `run` 不同，这里不会发出完成信号。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) -> Result<(), SimError> {
        self.advance_through(until, world)?;
        self.now = self.now.max(until);
        Ok(())
    }

    /// 运行所有事件直到队列为空，然后通知世界仿真完成。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) -> Result<(), SimError> {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let start = self.processed;
        while self.advance(world)? {}
        world.on_complete(self);

        info!(
            total_events = self.processed - start,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
        Ok(())
    }

    /// 没有存活事件且世界没有未完成的工作
    pub fn is_done(&self, world: &dyn World) -> bool {
        self.q.is_empty() && !world.has_pending_work()
    }
}
