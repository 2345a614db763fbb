//! 规划器与避障线程之间的共享状态
//!
//! 每台机器人一个 [`AvoidanceContext`]，分为两个方向：
//! - [`WorkerInputs`]：只由规划器一侧写入，线程只读
//! - [`WorkerOutputs`]：只由避障线程写入，规划器只读
//!
//! 每个键只有一个写方，读方拿到的都是不可变快照（`ArcSwap`），因此无需加锁。
//! 全队机器人的位置由 [`Fleet`] 提供，同样只有一个写方（入站路由）。

use arc_swap::{ArcSwap, ArcSwapOption};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use cogip_geometry::Vertex;
use cogip_protocol::{AvoidanceStrategy, ControllerEnum, DynObstacle, PathPose, RobotId};

use crate::config::AvoidanceConfig;

/// 全队机器人当前位置
#[derive(Debug, Default)]
pub struct Fleet {
    positions: ArcSwap<BTreeMap<RobotId, Vertex>>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新（或移除）一台机器人的位置
    pub fn update(&self, robot_id: RobotId, position: Option<Vertex>) {
        self.positions.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            match position {
                Some(p) => next.insert(robot_id, p),
                None => next.remove(&robot_id),
            };
            next
        });
    }

    pub fn snapshot(&self) -> Arc<BTreeMap<RobotId, Vertex>> {
        self.positions.load_full()
    }

    /// 除 `robot_id` 以外的机器人位置
    pub fn others(&self, robot_id: RobotId) -> Vec<Vertex> {
        self.positions
            .load()
            .iter()
            .filter(|(id, _)| **id != robot_id)
            .map(|(_, p)| *p)
            .collect()
    }

    pub fn clear(&self) {
        self.positions.store(Arc::new(BTreeMap::new()));
    }
}

/// 检测障碍快照
pub type ObstacleSnapshot = Vec<DynObstacle>;

/// 规划器 → 避障线程
#[derive(Debug)]
pub struct WorkerInputs {
    pub pose_current: ArcSwapOption<PathPose>,
    pose_order: ArcSwapOption<PathPose>,
    order_seq: AtomicU64,
    pub obstacles: ArcSwap<ObstacleSnapshot>,
    pub config: ArcSwap<AvoidanceConfig>,
    avoidance_strategy: AtomicU8,
    default_controller: AtomicU8,
    speed_test: AtomicBool,
    exiting: AtomicBool,
}

impl WorkerInputs {
    fn new(config: AvoidanceConfig) -> Self {
        Self {
            pose_current: ArcSwapOption::empty(),
            pose_order: ArcSwapOption::empty(),
            order_seq: AtomicU64::new(0),
            obstacles: ArcSwap::from_pointee(Vec::new()),
            config: ArcSwap::from_pointee(config),
            avoidance_strategy: AtomicU8::new(AvoidanceStrategy::default().as_u8()),
            default_controller: AtomicU8::new(ControllerEnum::default().as_u8()),
            speed_test: AtomicBool::new(false),
            exiting: AtomicBool::new(false),
        }
    }

    /// 发布新的位姿目标（`None` 表示取消）
    ///
    /// 每次发布都会递增序号，线程据此清除防抖标记。
    pub fn set_pose_order(&self, order: Option<PathPose>) {
        self.pose_order.store(order.map(Arc::new));
        self.order_seq.fetch_add(1, Ordering::Release);
    }

    pub fn pose_order(&self) -> Option<PathPose> {
        self.pose_order.load().as_deref().copied()
    }

    pub fn order_seq(&self) -> u64 {
        self.order_seq.load(Ordering::Acquire)
    }

    pub fn set_pose_current(&self, pose: Option<PathPose>) {
        self.pose_current.store(pose.map(Arc::new));
    }

    pub fn pose_current(&self) -> Option<PathPose> {
        self.pose_current.load().as_deref().copied()
    }

    pub fn avoidance_strategy(&self) -> AvoidanceStrategy {
        AvoidanceStrategy::from_u8(self.avoidance_strategy.load(Ordering::Relaxed))
    }

    pub fn set_avoidance_strategy(&self, strategy: AvoidanceStrategy) {
        self.avoidance_strategy.store(strategy.as_u8(), Ordering::Relaxed);
    }

    pub fn default_controller(&self) -> ControllerEnum {
        ControllerEnum::from_u8(self.default_controller.load(Ordering::Relaxed))
    }

    pub fn set_default_controller(&self, controller: ControllerEnum) {
        self.default_controller.store(controller.as_u8(), Ordering::Relaxed);
    }

    pub fn is_speed_test(&self) -> bool {
        self.speed_test.load(Ordering::Relaxed)
    }

    pub fn set_speed_test(&self, speed_test: bool) {
        self.speed_test.store(speed_test, Ordering::Relaxed);
    }

    pub fn is_exiting(&self) -> bool {
        self.exiting.load(Ordering::Acquire)
    }

    /// 设置退出标志；避障线程在下一个休眠片内结束
    pub fn set_exiting(&self, exiting: bool) {
        self.exiting.store(exiting, Ordering::Release);
    }
}

/// 避障线程 → 规划器
#[derive(Debug)]
pub struct WorkerOutputs {
    pub avoidance_path: ArcSwap<Vec<PathPose>>,
    /// 上一次成功规划时机器人所在位置
    pub plan_marker: ArcSwapOption<Vertex>,
    controller: AtomicU8,
}

impl WorkerOutputs {
    fn new() -> Self {
        Self {
            avoidance_path: ArcSwap::from_pointee(Vec::new()),
            plan_marker: ArcSwapOption::empty(),
            controller: AtomicU8::new(ControllerEnum::default().as_u8()),
        }
    }

    pub fn controller(&self) -> ControllerEnum {
        ControllerEnum::from_u8(self.controller.load(Ordering::Relaxed))
    }

    /// 写入控制器，返回旧值
    pub(crate) fn swap_controller(&self, controller: ControllerEnum) -> ControllerEnum {
        ControllerEnum::from_u8(self.controller.swap(controller.as_u8(), Ordering::Relaxed))
    }

    pub fn plan_marker(&self) -> Option<Vertex> {
        self.plan_marker.load().as_deref().copied()
    }
}

/// 单台机器人的共享状态
#[derive(Debug)]
pub struct AvoidanceContext {
    pub robot_id: RobotId,
    pub inputs: WorkerInputs,
    pub outputs: WorkerOutputs,
    pub fleet: Arc<Fleet>,
}

impl AvoidanceContext {
    pub fn new(robot_id: RobotId, config: AvoidanceConfig, fleet: Arc<Fleet>) -> Self {
        Self {
            robot_id,
            inputs: WorkerInputs::new(config),
            outputs: WorkerOutputs::new(),
            fleet,
        }
    }
}
