//! # Scheduler 模块
//!
//! Host 侧的定时器队列。
//!
//! 核心不读时钟：每条 `Command::Schedule` 在这里登记一个绝对截止时刻，
//! 事件循环在下一个截止时刻前阻塞等待输入，到点后把令牌原样送回核心。
//!
//! 队列不做取消 —— 被取代的旧令牌照样到期送回，由核心的代数检查丢弃。

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use novel_runtime::TimerToken;

/// 一条待触发的截止时刻
#[derive(Debug, Clone, Copy)]
struct Entry {
    at: Instant,
    /// 同一时刻的入队顺序（保证触发顺序稳定）
    seq: u64,
    token: TimerToken,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.at.cmp(&other.at).then(self.seq.cmp(&other.seq))
    }
}

/// 定时器队列（最小堆）
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl TimerQueue {
    /// 创建空队列
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个延时令牌
    pub fn schedule(&mut self, token: TimerToken, delay: Duration) {
        let entry = Entry {
            at: Instant::now() + delay,
            seq: self.next_seq,
            token,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(entry));
    }

    /// 最近的截止时刻（队列为空时 None）
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(e)| e.at)
    }

    /// 弹出所有已到期的令牌（按截止时刻顺序）
    pub fn pop_due(&mut self, now: Instant) -> Vec<TimerToken> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.at > now {
                break;
            }
            let Reverse(entry) = self.heap.pop().expect("peek 刚确认过非空");
            due.push(entry.token);
        }
        due
    }

    /// 清空队列（会话结束）
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
