//! 避障线程
//!
//! 每台机器人一个线程，以 `path_refresh_interval` 为周期运行 [`PathUpdater::tick`]：
//! 读取共享状态中的当前位姿、目标位姿与障碍，调用避障引擎，
//! 通过 crossbeam 通道发布 `path` / `pose_order` / `blocked` / `set_controller`。
//!
//! 单个周期失败（包括规划 panic）只会发布 `blocked`，线程继续运行。

use crossbeam_channel::Sender;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

use cogip_protocol::{
    AvoidanceStrategy, ControllerEnum, DynObstacle, DynRoundObstacle, PathPose, RobotId,
};

use crate::config::AvoidanceConfig;
use crate::context::AvoidanceContext;
use crate::engine::Avoidance;
use crate::error::AvoidanceError;
use crate::metrics::{AvoidanceMetrics, MetricsSnapshot};
use crate::table::Table;

/// 睡眠切片上限，保证退出标志能被及时看到
const SLEEP_SLICE: Duration = Duration::from_millis(20);

/// 避障线程发布的事件
#[derive(Debug, Clone, PartialEq)]
pub enum AvoidanceEvent {
    /// 新的避障路径（不含当前位置）
    Path(Vec<PathPose>),
    /// 下一个航点
    PoseOrder(PathPose),
    /// 无路可走
    Blocked,
    /// 控制器切换
    SetController(ControllerEnum),
}

/// 带机器人编号的事件
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerMessage {
    pub robot_id: RobotId,
    pub event: AvoidanceEvent,
}

/// 单个周期的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Exiting,
    NoPoseCurrent,
    NoPoseOrder,
    SpeedTest,
    /// 当前位姿已与目标重合
    OrderReached,
    /// 距上次规划移动不足阈值
    NotMoved,
    Blocked,
    /// 引擎返回单点路径
    AlreadyThere,
    /// 新航点与上次发布的过近或相同
    StaleOrder,
    Updated { path_len: usize },
}

/// 单台机器人的路径刷新逻辑（不含线程与节拍）
pub struct PathUpdater {
    robot_id: RobotId,
    engine: Avoidance,
    last_emitted: Option<PathPose>,
    seen_order_seq: u64,
}

impl PathUpdater {
    pub fn new(robot_id: RobotId, table: Table) -> Self {
        Self {
            robot_id,
            engine: Avoidance::new(table),
            last_emitted: None,
            seen_order_seq: 0,
        }
    }

    pub fn robot_id(&self) -> RobotId {
        self.robot_id
    }

    /// 执行一个周期
    ///
    /// `emit` 接收本周期发布的事件，顺序为 `SetController`（仅变化时）、`Path`、`PoseOrder`。
    pub fn tick(
        &mut self,
        ctx: &AvoidanceContext,
        metrics: &AvoidanceMetrics,
        emit: &mut dyn FnMut(AvoidanceEvent),
    ) -> TickOutcome {
        let inputs = &ctx.inputs;
        if inputs.is_exiting() {
            return TickOutcome::Exiting;
        }

        let order_seq = inputs.order_seq();
        if order_seq != self.seen_order_seq {
            self.seen_order_seq = order_seq;
            self.last_emitted = None;
            ctx.outputs.plan_marker.store(None);
        }

        let Some(current) = inputs.pose_current() else {
            return self.skip(metrics, TickOutcome::NoPoseCurrent, "no pose current");
        };
        let Some(order) = inputs.pose_order() else {
            return self.skip(metrics, TickOutcome::NoPoseOrder, "no pose order");
        };
        if inputs.is_speed_test() {
            return self.skip(metrics, TickOutcome::SpeedTest, "speed test");
        }

        let config = inputs.config.load_full();
        let marker = ctx.outputs.plan_marker();
        if marker.is_none() {
            self.last_emitted = None;
        }
        if let Some(marker) = marker {
            if current.is_close_to(&order, config.min_move_distance, config.min_angle_delta) {
                return self.skip(metrics, TickOutcome::OrderReached, "pose current and order too close");
            }
            let moved = current.vertex().distance(&marker);
            if moved > 0.0 && moved < config.min_move_distance {
                return self.skip(metrics, TickOutcome::NotMoved, "current pose too close to last plan");
            }
        }

        let strategy = inputs.avoidance_strategy();
        let obstacles = if strategy == AvoidanceStrategy::Disabled {
            Vec::new()
        } else {
            collect_obstacles(ctx, &current, &config)
        };

        let engine = &mut self.engine;
        let planned = catch_unwind(AssertUnwindSafe(|| {
            engine.get_path(&current, &order, &obstacles, strategy, &config)
        }));
        let mut path = match planned {
            Ok(path) => path,
            Err(_) => {
                error!("Avoidance {}: planning panicked", self.robot_id);
                metrics.planning_panics.fetch_add(1, Ordering::Relaxed);
                Vec::new()
            },
        };

        if path.is_empty() {
            debug!("Avoidance {}: no path found", self.robot_id);
            ctx.outputs.plan_marker.store(None);
            ctx.outputs.avoidance_path.store(Arc::new(Vec::new()));
            self.last_emitted = None;
            metrics.blocked_total.fetch_add(1, Ordering::Relaxed);
            emit(AvoidanceEvent::Blocked);
            return TickOutcome::Blocked;
        }

        for pose in &mut path {
            pose.allow_reverse = order.allow_reverse;
        }

        if path.len() == 1 {
            return self.skip(metrics, TickOutcome::AlreadyThere, "path has a single pose");
        }

        if let Some(last) = &self.last_emitted {
            let next = &path[1];
            let too_close = if next.bypass_final_orientation {
                last.distance(next) < config.min_move_distance
            } else {
                last.is_close_to(next, config.min_move_distance, config.min_angle_delta)
            };
            if too_close {
                metrics.stale_orders_dropped.fetch_add(1, Ordering::Relaxed);
                return self.skip(metrics, TickOutcome::StaleOrder, "new pose order too close");
            }
        }

        let controller = if path.len() > 2 {
            let heading = path[1].vertex().heading_to(&path[2].vertex());
            path[1].o = Some(heading.to_degrees());
            path[1].allow_reverse = true;
            strategy.intermediate_controller()
        } else {
            inputs.default_controller()
        };

        let next = path[1];
        if self.last_emitted == Some(next) {
            metrics.stale_orders_dropped.fetch_add(1, Ordering::Relaxed);
            return self.skip(metrics, TickOutcome::StaleOrder, "same pose order");
        }
        self.last_emitted = Some(next);
        ctx.outputs.plan_marker.store(Some(Arc::new(current.vertex())));

        let avoidance_path = path[1..].to_vec();
        ctx.outputs.avoidance_path.store(Arc::new(avoidance_path.clone()));
        if ctx.outputs.swap_controller(controller) != controller {
            emit(AvoidanceEvent::SetController(controller));
        }

        info!("Avoidance {}: update path ({} poses)", self.robot_id, avoidance_path.len());
        let path_len = avoidance_path.len();
        emit(AvoidanceEvent::Path(avoidance_path));
        emit(AvoidanceEvent::PoseOrder(next));
        metrics.plans_total.fetch_add(1, Ordering::Relaxed);
        TickOutcome::Updated { path_len }
    }

    fn skip(&self, metrics: &AvoidanceMetrics, outcome: TickOutcome, reason: &str) -> TickOutcome {
        debug!("Avoidance {}: skip path update ({})", self.robot_id, reason);
        metrics.skipped_total.fetch_add(1, Ordering::Relaxed);
        outcome
    }
}

/// 障碍 = 其他机器人（外切圆多边形）∪ 远离所有机器人的检测障碍
fn collect_obstacles(
    ctx: &AvoidanceContext,
    current: &PathPose,
    config: &AvoidanceConfig,
) -> Vec<DynObstacle> {
    let me = current.vertex();
    let others = ctx.fleet.others(ctx.robot_id);

    let mut obstacles: Vec<DynObstacle> = others
        .iter()
        .map(|p| {
            DynRoundObstacle::circumscribing(
                *p,
                config.robot_obstacle_radius(),
                config.obstacle_bb_vertices,
            )
            .into()
        })
        .collect();

    let detected = ctx.inputs.obstacles.load();
    obstacles.extend(
        detected
            .iter()
            .filter(|obstacle| {
                let center = obstacle.center();
                center.distance(&me) >= config.obstacle_min_distance
                    && others
                        .iter()
                        .all(|p| center.distance(p) >= config.obstacle_min_distance)
            })
            .cloned(),
    );
    obstacles
}

/// 避障线程主循环
///
/// # 参数
/// - `ctx`: 共享状态
/// - `table`: 场地（固定障碍已按阵营镜像）
/// - `events`: 事件发送端；接收端关闭时线程退出
/// - `metrics`: 指标
pub fn avoidance_loop(
    ctx: Arc<AvoidanceContext>,
    table: Table,
    events: Sender<WorkerMessage>,
    metrics: Arc<AvoidanceMetrics>,
) {
    let robot_id = ctx.robot_id;
    info!("Avoidance {}: thread started", robot_id);
    let mut updater = PathUpdater::new(robot_id, table);
    let mut start = Instant::now();

    loop {
        if ctx.inputs.is_exiting() {
            break;
        }

        let period = ctx.inputs.config.load().path_refresh_interval;
        let elapsed = start.elapsed();
        if elapsed > period {
            warn!(
                "Avoidance {}: tick took {:?} > {:?}",
                robot_id, elapsed, period
            );
            metrics.tick_overruns.fetch_add(1, Ordering::Relaxed);
        } else {
            sleep_unless_exiting(&ctx, period - elapsed);
        }
        start = Instant::now();

        let mut disconnected = false;
        let outcome = updater.tick(&ctx, &metrics, &mut |event| {
            if events.send(WorkerMessage { robot_id, event }).is_err() {
                disconnected = true;
            }
        });
        metrics.ticks_total.fetch_add(1, Ordering::Relaxed);
        trace!("Avoidance {}: {:?}", robot_id, outcome);

        if disconnected {
            warn!("Avoidance {}: event channel closed, exiting", robot_id);
            break;
        }
        if outcome == TickOutcome::Exiting {
            break;
        }
    }

    info!("Avoidance {}: thread exited", robot_id);
}

fn sleep_unless_exiting(ctx: &AvoidanceContext, duration: Duration) {
    let deadline = Instant::now() + duration;
    loop {
        if ctx.inputs.is_exiting() {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        spin_sleep::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

/// 在 `timeout` 内等待线程结束
///
/// 借一个辅助线程执行阻塞的 `join`，超时后放弃等待（辅助线程随原线程结束）。
fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration) -> Result<(), AvoidanceError> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let _ = tx.send(handle.join().is_ok());
    });
    match rx.recv_timeout(timeout) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AvoidanceError::WorkerPanicked),
        Err(_) => Err(AvoidanceError::JoinTimeout(timeout)),
    }
}

/// 避障线程句柄
///
/// Drop 时设置退出标志并在超时内等待线程结束。
pub struct AvoidanceWorker {
    ctx: Arc<AvoidanceContext>,
    metrics: Arc<AvoidanceMetrics>,
    handle: Option<JoinHandle<()>>,
}

impl AvoidanceWorker {
    /// 启动线程
    ///
    /// 会先清除共享状态中的退出标志，因此重启前必须先销毁旧句柄。
    pub fn spawn(
        ctx: Arc<AvoidanceContext>,
        table: Table,
        events: Sender<WorkerMessage>,
    ) -> Result<Self, AvoidanceError> {
        let metrics = Arc::new(AvoidanceMetrics::new());
        ctx.inputs.set_exiting(false);

        let thread_ctx = ctx.clone();
        let thread_metrics = metrics.clone();
        let handle = thread::Builder::new()
            .name(format!("avoidance-{}", ctx.robot_id))
            .spawn(move || avoidance_loop(thread_ctx, table, events, thread_metrics))?;

        Ok(Self {
            ctx,
            metrics,
            handle: Some(handle),
        })
    }

    pub fn robot_id(&self) -> RobotId {
        self.ctx.robot_id
    }

    pub fn context(&self) -> &Arc<AvoidanceContext> {
        &self.ctx
    }

    /// 线程是否仍在运行
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// 通知线程退出并等待（最多 2 秒）
    pub fn stop(&mut self) {
        self.ctx.inputs.set_exiting(true);

        let join_timeout = Duration::from_secs(2);
        if let Some(handle) = self.handle.take()
            && let Err(e) = join_with_timeout(handle, join_timeout)
        {
            error!("Avoidance {}: {}", self.ctx.robot_id, e);
        }
    }
}

impl Drop for AvoidanceWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
