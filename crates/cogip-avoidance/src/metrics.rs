//! 避障线程指标
//!
//! 原子计数器，任何线程都可以无锁读取。

use std::sync::atomic::{AtomicU64, Ordering};

/// 避障线程实时指标
#[derive(Debug, Default)]
pub struct AvoidanceMetrics {
    /// 执行的周期数
    pub ticks_total: AtomicU64,
    /// 成功发布的路径数
    pub plans_total: AtomicU64,
    /// 阻塞次数（无路可走或规划失败）
    pub blocked_total: AtomicU64,
    /// 跳过的周期数（无位姿、防抖、速度标定等）
    pub skipped_total: AtomicU64,
    /// 因与上次发布过近而丢弃的目标
    pub stale_orders_dropped: AtomicU64,
    /// 周期超时次数
    ///
    /// 如果这个值持续增长，说明规划耗时超过了刷新周期。
    pub tick_overruns: AtomicU64,
    /// 规划过程中捕获的 panic 次数
    pub planning_panics: AtomicU64,
}

impl AvoidanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks_total: self.ticks_total.load(Ordering::Relaxed),
            plans_total: self.plans_total.load(Ordering::Relaxed),
            blocked_total: self.blocked_total.load(Ordering::Relaxed),
            skipped_total: self.skipped_total.load(Ordering::Relaxed),
            stale_orders_dropped: self.stale_orders_dropped.load(Ordering::Relaxed),
            tick_overruns: self.tick_overruns.load(Ordering::Relaxed),
            planning_panics: self.planning_panics.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.ticks_total.store(0, Ordering::Relaxed);
        self.plans_total.store(0, Ordering::Relaxed);
        self.blocked_total.store(0, Ordering::Relaxed);
        self.skipped_total.store(0, Ordering::Relaxed);
        self.stale_orders_dropped.store(0, Ordering::Relaxed);
        self.tick_overruns.store(0, Ordering::Relaxed);
        self.planning_panics.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub ticks_total: u64,
    pub plans_total: u64,
    pub blocked_total: u64,
    pub skipped_total: u64,
    pub stale_orders_dropped: u64,
    pub tick_overruns: u64,
    pub planning_panics: u64,
}

impl MetricsSnapshot {
    /// 阻塞周期占比（百分比），无周期时返回 0
    pub fn blocked_rate(&self) -> f64 {
        if self.ticks_total == 0 {
            return 0.0;
        }
        (self.blocked_total as f64 / self.ticks_total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_metrics_increment_and_reset() {
        let metrics = AvoidanceMetrics::new();
        metrics.ticks_total.fetch_add(10, Ordering::Relaxed);
        metrics.blocked_total.fetch_add(2, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks_total, 10);
        assert_eq!(snapshot.blocked_total, 2);
        assert!((snapshot.blocked_rate() - 20.0).abs() < 1e-9);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
        assert_eq!(metrics.snapshot().blocked_rate(), 0.0);
    }

    #[test]
    fn test_metrics_concurrent_updates() {
        let metrics = Arc::new(AvoidanceMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.plans_total.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.snapshot().plans_total, 4000);
    }
}
