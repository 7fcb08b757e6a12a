//! 过期订单清扫器
//!
//! 周期性地将超过支付窗口的 PENDING 订单置为 TIMEOUT 并释放其库存。
//! 注册为后台 Periodic 任务，在 `start_background_tasks()` 中启动。
//!
//! 每个订单在独立事务中处理：单个订单失败只记录日志，不影响本轮其余
//! 订单；下一轮会重试仍然 PENDING 且已过期的订单。

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::manager::OrderManager;

/// Expiry sweeper
///
/// Interval and expiry window are injected so tests can shrink them, and
/// `sweep_once` takes the current time explicitly, so tests do not need the
/// loop at all.
pub struct ExpirySweeper {
    manager: Arc<OrderManager>,
    /// How often a sweep runs
    interval: Duration,
    /// How long an order may stay PENDING before it is stale
    expiry: Duration,
    shutdown: CancellationToken,
}

impl ExpirySweeper {
    pub fn new(
        manager: Arc<OrderManager>,
        interval: Duration,
        expiry: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            manager,
            interval,
            expiry,
            shutdown,
        }
    }

    /// Run one sweep at the given instant; returns how many orders timed out
    pub fn sweep_once(&self, now: i64) -> usize {
        let cutoff = now - self.expiry.as_millis() as i64;
        match self.manager.expire_stale(now, cutoff) {
            Ok(expired) => expired,
            Err(e) => {
                tracing::error!(error = %e, "Expiry sweep failed");
                0
            }
        }
    }

    /// 主循环：固定周期触发，直到收到 shutdown 信号
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            expiry_secs = self.expiry.as_secs(),
            "Expiry sweeper started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    let now = shared::util::now_millis();
                    self.sweep_once(now);
                }
            }
        }

        tracing::info!("Expiry sweeper stopped");
    }
}
