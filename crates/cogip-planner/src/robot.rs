//! 机器人会话
//!
//! 每台已连接的机器人一个 [`Robot`]：持有避障线程、共享状态、当前动作
//! 与待完成的位姿指令，以及阻塞计数、启动拉绳等状态。
//!
//! 钩子产生的步骤通过 [`PoseUpdate`] 交给规划器执行，新的位姿指令
//! 在步骤执行完之后才由规划器调用 [`Robot::publish_order`] 发布。

use crossbeam_channel::Sender;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use cogip_avoidance::{
    AvoidanceConfig, AvoidanceContext, AvoidanceWorker, Fleet, MetricsSnapshot, Table,
    WorkerMessage,
};
use cogip_protocol::{ControllerEnum, PathPose, RobotId};

use crate::actions::{Action, RobotView};
use crate::context::{GameContext, SupplyId};
use crate::error::PlannerError;
use crate::pose::{HookContext, Pose};
use crate::step::Step;

/// 机器人状态变化的结果
#[derive(Debug, Default, PartialEq)]
pub struct PoseUpdate {
    /// 需要规划器执行的步骤
    pub steps: Vec<Step>,
    /// 新的位姿指令，步骤执行完后发布
    pub order: Option<PathPose>,
    /// 当前动作已完成
    pub action_finished: bool,
}

/// 机器人会话
pub struct Robot {
    robot_id: RobotId,
    ctx: Arc<AvoidanceContext>,
    table: Table,
    worker: Option<AvoidanceWorker>,
    action: Option<Box<dyn Action>>,
    pose_order: Option<Pose>,
    pose_reached: bool,
    blocked_count: u32,
    parked: bool,
    starter_pushed: bool,
    carried: Option<SupplyId>,
    wait_until: Option<Instant>,
    last_path: Vec<PathPose>,
}

impl Robot {
    pub fn new(robot_id: RobotId, config: AvoidanceConfig, fleet: Arc<Fleet>, table: Table) -> Self {
        Self {
            robot_id,
            ctx: Arc::new(AvoidanceContext::new(robot_id, config, fleet)),
            table,
            worker: None,
            action: None,
            pose_order: None,
            pose_reached: true,
            blocked_count: 0,
            parked: false,
            starter_pushed: false,
            carried: None,
            wait_until: None,
            last_path: Vec::new(),
        }
    }

    pub fn robot_id(&self) -> RobotId {
        self.robot_id
    }

    pub fn context(&self) -> &Arc<AvoidanceContext> {
        &self.ctx
    }

    /// 启动（或重启）避障线程
    pub fn start_worker(&mut self, events: Sender<WorkerMessage>) -> Result<(), PlannerError> {
        // 旧线程必须先退出，新线程会清除退出标志
        self.worker = None;
        self.worker = Some(AvoidanceWorker::spawn(self.ctx.clone(), self.table.clone(), events)?);
        Ok(())
    }

    pub fn stop_worker(&mut self) {
        self.worker = None;
    }

    pub fn is_worker_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| w.is_alive())
    }

    pub fn worker_metrics(&self) -> Option<MetricsSnapshot> {
        self.worker.as_ref().map(|w| w.metrics())
    }

    pub fn pose_current(&self) -> Option<PathPose> {
        self.ctx.inputs.pose_current()
    }

    pub fn pose_order(&self) -> Option<&Pose> {
        self.pose_order.as_ref()
    }

    pub fn is_pose_reached(&self) -> bool {
        self.pose_reached
    }

    pub fn controller(&self) -> ControllerEnum {
        self.ctx.outputs.controller()
    }

    pub fn action_name(&self) -> Option<&str> {
        self.action.as_ref().map(|a| a.name())
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn blocked_count(&self) -> u32 {
        self.blocked_count
    }

    pub fn carried(&self) -> Option<SupplyId> {
        self.carried
    }

    pub fn is_parked(&self) -> bool {
        self.parked
    }

    pub fn starter_pushed(&self) -> bool {
        self.starter_pushed
    }

    pub fn set_starter(&mut self, pushed: bool) {
        self.starter_pushed = pushed;
    }

    pub fn last_path(&self) -> &[PathPose] {
        &self.last_path
    }

    pub fn set_last_path(&mut self, path: Vec<PathPose>) {
        self.last_path = path;
    }

    pub fn view(&self) -> RobotView {
        RobotView {
            robot_id: self.robot_id,
            pose_current: self.pose_current(),
            carried: self.carried,
        }
    }

    /// 设置起始位姿，丢弃当前动作与指令
    pub fn set_pose_start(&mut self, pose: PathPose) -> Option<Box<dyn Action>> {
        self.ctx.inputs.set_pose_current(Some(pose));
        self.ctx.inputs.set_pose_order(None);
        self.pose_order = None;
        self.pose_reached = true;
        self.blocked_count = 0;
        self.parked = false;
        self.carried = None;
        self.wait_until = None;
        self.last_path.clear();
        self.action.take()
    }

    /// 设置新动作并执行其 `before_action`
    ///
    /// WaitAction 会让机器人保持 `wait` 时长，期间不取位姿。
    pub fn set_action(
        &mut self,
        mut action: Box<dyn Action>,
        game: &mut GameContext,
        wait: Duration,
        now: Instant,
    ) -> PoseUpdate {
        let view = self.view();
        let steps = action.before_action(&view, game);
        if action.is_fallback() {
            self.wait_until = Some(now + wait);
        }
        info!("Robot {}: set action '{}'", self.robot_id, action.name());
        self.action = Some(action);
        PoseUpdate {
            steps,
            ..Default::default()
        }
    }

    /// 取出当前动作的下一个位姿并执行其 `before` 钩子
    ///
    /// 队列为空时结束当前动作。
    pub fn next_pose(&mut self, game: &mut GameContext) -> PoseUpdate {
        self.blocked_count = 0;
        let robot_id = self.robot_id;
        let pose_current = self.pose_current();

        let Some(action) = self.action.as_mut() else {
            self.pose_reached = true;
            return PoseUpdate::default();
        };
        let Some(pose) = action.core_mut().poses.pop_front() else {
            self.pose_reached = true;
            return self.finish_action(game);
        };

        let steps = {
            let mut hook_ctx = HookContext {
                robot_id,
                pose_current,
                carried: &mut self.carried,
                game,
                poses: &mut action.core_mut().poses,
            };
            pose.run_before(&mut hook_ctx)
        };
        let order = pose.path_pose();
        debug!("Robot {}: next pose {:?}", robot_id, order);
        self.pose_order = Some(pose);
        self.pose_reached = false;
        PoseUpdate {
            steps,
            order: Some(order),
            action_finished: false,
        }
    }

    /// 把指令写入共享状态，避障线程随后规划
    pub fn publish_order(&mut self, order: PathPose) {
        self.ctx.inputs.set_pose_order(Some(order));
    }

    /// 固件报告到达
    ///
    /// 若仍在避障路径的中间航点上，只执行 `intermediate` 钩子；
    /// 否则执行 `after` 钩子，队列空时结束当前动作。
    pub fn set_pose_reached(&mut self, game: &mut GameContext) -> PoseUpdate {
        if self.pose_reached {
            return PoseUpdate::default();
        }
        let robot_id = self.robot_id;
        let pose_current = self.pose_current();
        let intermediate = self.ctx.outputs.avoidance_path.load().len() > 1;

        let mut scratch = VecDeque::new();
        let poses = match self.action.as_mut() {
            Some(action) => &mut action.core_mut().poses,
            None => &mut scratch,
        };
        let mut hook_ctx = HookContext {
            robot_id,
            pose_current,
            carried: &mut self.carried,
            game,
            poses,
        };

        if intermediate {
            let steps = self
                .pose_order
                .as_ref()
                .map(|pose| pose.run_intermediate(&mut hook_ctx))
                .unwrap_or_default();
            debug!("Robot {}: intermediate pose reached", robot_id);
            return PoseUpdate {
                steps,
                ..Default::default()
            };
        }

        let mut steps = match self.pose_order.take() {
            Some(pose) => pose.run_after(&mut hook_ctx),
            None => Vec::new(),
        };
        self.pose_reached = true;
        self.ctx.inputs.set_pose_order(None);

        let action_done = self
            .action
            .as_ref()
            .is_some_and(|a| a.core().poses.is_empty() && !a.is_fallback());
        if action_done {
            let mut finished = self.finish_action(game);
            steps.append(&mut finished.steps);
            return PoseUpdate {
                steps,
                order: None,
                action_finished: true,
            };
        }
        PoseUpdate {
            steps,
            ..Default::default()
        }
    }

    fn finish_action(&mut self, game: &mut GameContext) -> PoseUpdate {
        let view = self.view();
        self.wait_until = None;
        match self.action.take() {
            Some(mut action) => {
                info!("Robot {}: action '{}' finished", self.robot_id, action.name());
                PoseUpdate {
                    steps: action.after_action(&view, game),
                    order: None,
                    action_finished: true,
                }
            },
            None => PoseUpdate::default(),
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.wait_until.is_some()
    }

    pub fn wait_expired(&self, now: Instant) -> bool {
        self.wait_until.is_some_and(|until| now >= until)
    }

    /// WaitAction 到期：结束它
    pub fn finish_wait(&mut self, game: &mut GameContext) -> PoseUpdate {
        if self.wait_until.is_none() {
            return PoseUpdate::default();
        }
        self.finish_action(game)
    }

    /// 记录一次阻塞，返回是否应回收当前动作
    pub fn on_blocked(&mut self, threshold: u32) -> bool {
        self.blocked_count += 1;
        let bypass = self
            .pose_order
            .as_ref()
            .is_some_and(|p| p.pose.bypass_anti_blocking);
        let recyclable = self.action.as_ref().is_some_and(|a| !a.is_fallback());
        debug!("Robot {}: blocked ({} times)", self.robot_id, self.blocked_count);
        self.blocked_count > threshold && !bypass && recyclable
    }

    /// 回收当前动作并清除指令
    pub fn recycle_action(&mut self, game: &mut GameContext) -> Option<Box<dyn Action>> {
        let mut action = self.action.take()?;
        action.recycle(self.robot_id, game);
        info!("Robot {}: action '{}' recycled", self.robot_id, action.name());
        self.pose_order = None;
        self.pose_reached = true;
        self.blocked_count = 0;
        self.ctx.inputs.set_pose_order(None);
        Some(action)
    }

    /// 停止移动，直到下一次设置起始位姿
    pub fn park(&mut self) -> Option<Box<dyn Action>> {
        self.parked = true;
        self.pose_order = None;
        self.pose_reached = true;
        self.wait_until = None;
        self.ctx.inputs.set_pose_order(None);
        self.action.take()
    }
}
