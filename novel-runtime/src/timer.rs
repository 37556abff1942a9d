//! # Timer 模块
//!
//! 可取消定时器的令牌模型。
//!
//! ## 设计说明
//!
//! 核心不持有时钟：需要延时的操作通过 [`crate::command::Command::Schedule`]
//! 请求 Host 在指定时长后回调 `TimerElapsed { token }`。
//!
//! 每个令牌携带用途（kind）和**代数**（generation）。任何使旧定时器失效的
//! 状态变更（换对白、换场景、关闭会话）都会递增对应用途的代数；
//! 回调送达时代数不匹配即视为过期，直接丢弃。Host 因此不需要实现取消 ——
//! 乱序/迟到的回调在核心侧就被拦下，不可能改写已被取代的状态。

use serde::{Deserialize, Serialize};

/// 定时器用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// 打字机节拍（每拍显示一个字符）
    TypeTick,
    /// 过渡提交（遮罩盖上后提交新场景位置）
    TransitionCommit,
    /// 过渡结束（遮罩淡出后清除过渡标志）
    TransitionReveal,
}

/// 定时器令牌
///
/// Host 原样保存并在到期时通过 `TimerElapsed` 传回。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken {
    /// 用途
    pub kind: TimerKind,
    /// 签发时的代数
    pub generation: u64,
}

/// 代数登记表
///
/// 每种用途一个单调递增的代数计数器。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRegistry {
    type_tick: u64,
    transition_commit: u64,
    transition_reveal: u64,
}

impl TimerRegistry {
    /// 创建登记表
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, kind: TimerKind) -> &mut u64 {
        match kind {
            TimerKind::TypeTick => &mut self.type_tick,
            TimerKind::TransitionCommit => &mut self.transition_commit,
            TimerKind::TransitionReveal => &mut self.transition_reveal,
        }
    }

    fn current(&self, kind: TimerKind) -> u64 {
        match kind {
            TimerKind::TypeTick => self.type_tick,
            TimerKind::TransitionCommit => self.transition_commit,
            TimerKind::TransitionReveal => self.transition_reveal,
        }
    }

    /// 签发新令牌
    ///
    /// 递增代数后返回，同用途的旧令牌随之全部过期。
    pub fn issue(&mut self, kind: TimerKind) -> TimerToken {
        let slot = self.slot(kind);
        *slot += 1;
        TimerToken {
            kind,
            generation: *slot,
        }
    }

    /// 使某一用途的所有未决令牌过期（不签发新令牌）
    pub fn invalidate(&mut self, kind: TimerKind) {
        *self.slot(kind) += 1;
    }

    /// 使所有未决令牌过期（会话结束/重开）
    pub fn invalidate_all(&mut self) {
        self.invalidate(TimerKind::TypeTick);
        self.invalidate(TimerKind::TransitionCommit);
        self.invalidate(TimerKind::TransitionReveal);
    }

    /// 令牌是否仍然有效
    pub fn is_current(&self, token: TimerToken) -> bool {
        token.generation == self.current(token.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_check() {
        let mut registry = TimerRegistry::new();
        let token = registry.issue(TimerKind::TypeTick);
        assert!(registry.is_current(token));
    }

    #[test]
    fn test_reissue_expires_old_token() {
        let mut registry = TimerRegistry::new();
        let old = registry.issue(TimerKind::TypeTick);
        let new = registry.issue(TimerKind::TypeTick);

        assert!(!registry.is_current(old));
        assert!(registry.is_current(new));
    }

    #[test]
    fn test_invalidate_without_issue() {
        let mut registry = TimerRegistry::new();
        let token = registry.issue(TimerKind::TransitionCommit);

        registry.invalidate(TimerKind::TransitionCommit);
        assert!(!registry.is_current(token));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut registry = TimerRegistry::new();
        let tick = registry.issue(TimerKind::TypeTick);
        registry.invalidate(TimerKind::TransitionCommit);

        // 其他用途的失效不影响打字机令牌
        assert!(registry.is_current(tick));
    }

    #[test]
    fn test_invalidate_all() {
        let mut registry = TimerRegistry::new();
        let a = registry.issue(TimerKind::TypeTick);
        let b = registry.issue(TimerKind::TransitionCommit);
        let c = registry.issue(TimerKind::TransitionReveal);

        registry.invalidate_all();
        assert!(!registry.is_current(a));
        assert!(!registry.is_current(b));
        assert!(!registry.is_current(c));
    }
}
