use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

/// # Summary
/// 时钟抽象。历史窗口的终点由它决定，测试中可以把“今天”固定下来。
pub trait TimeProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// 以当前时刻为终点、向前回溯 `span` 的 `(start, end)` 窗口
    fn lookback(&self, span: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.now();
        (end - span, end)
    }
}

/// 系统时钟
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 可手动拨动的时钟，供测试使用。
///
/// # Invariants
/// - 内部用 `RwLock` 保护，可跨线程共享。
/// - 锁中毒时沿用中毒前的值，不会 panic。
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// 直接设置当前时间
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        *self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = new_time;
    }

    /// 把时钟向后拨 `by`
    pub fn advance(&self, by: Duration) {
        let mut time = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *time += by;
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
