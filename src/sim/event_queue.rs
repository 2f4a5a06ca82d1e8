//! 事件队列
//!
//! 按 (时间, 序列号) 排序的最小堆，支持按句柄惰性取消。

use super::event::{Event, EventId};
use super::time::SimTime;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// 队列中的一个事件
pub struct ScheduledEvent {
    pub(crate) at: SimTime,
    pub(crate) seq: u64,
    pub(crate) ev: Box<dyn Event>,
}

impl ScheduledEvent {
    pub fn id(&self) -> EventId {
        EventId(self.seq)
    }
}

// 最早的时间先出；同一时刻按调度顺序（FIFO）
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

/// 已取消条目超过该数量且多于存活事件时，整体重建堆
const COMPACT_MIN_CANCELED: usize = 32;

/// 被取消的事件先留在堆里，出队时丢弃；堆中已取消条目过多时整体清理。
#[derive(Default)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
    /// 仍在堆中且未被取消的事件
    live: HashSet<u64>,
    canceled: HashSet<u64>,
    next_seq: u64,
}

impl EventQueue {
    pub fn push(&mut self, at: SimTime, ev: Box<dyn Event>) -> EventId {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(ScheduledEvent { at, seq, ev });
        self.live.insert(seq);
        EventId(seq)
    }

    /// 事件是否仍在队列中等待执行
    pub fn contains(&self, id: EventId) -> bool {
        self.live.contains(&id.0)
    }

    /// 标记取消；返回该事件是否仍在队列中
    pub fn cancel(&mut self, id: EventId) -> bool {
        if !self.live.remove(&id.0) {
            return false;
        }
        self.canceled.insert(id.0);
        if self.canceled.len() > self.live.len().max(COMPACT_MIN_CANCELED) {
            self.compact();
        }
        true
    }

    fn compact(&mut self) {
        let canceled = std::mem::take(&mut self.canceled);
        self.heap.retain(|item| !canceled.contains(&item.seq));
    }

    fn drop_canceled_top(&mut self) {
        while let Some(top) = self.heap.peek() {
            if !self.canceled.remove(&top.seq) {
                break;
            }
            self.heap.pop();
        }
    }

    /// 弹出下一个未被取消的事件
    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.drop_canceled_top();
        let item = self.heap.pop()?;
        self.live.remove(&item.seq);
        Some(item)
    }

    pub fn peek_time(&mut self) -> Option<SimTime> {
        self.drop_canceled_top();
        self.heap.peek().map(|item| item.at)
    }

    /// 未被取消的事件数
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// 堆中条目数，含尚未清理的已取消事件
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }
}
