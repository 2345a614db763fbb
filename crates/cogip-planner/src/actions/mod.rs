//! 动作模型与选择
//!
//! 动作是一个 FIFO 位姿队列加上权重函数。机器人没有动作时，规划器在
//! 未回收的动作中选出权重最大的一个（并列时取插入顺序靠前者）并将其移出集合；
//! 全部权重为 0 时返回一个新的 [`WaitAction`]。
//!
//! 任何动作完成（包括 WaitAction 到期）都会清除全部动作的 `recycled` 标志。

pub mod approval;
pub mod back_and_forth;
pub mod game;
pub mod weight;

use std::collections::VecDeque;

use cogip_protocol::{PathPose, RobotId, Strategy};
use tracing::debug;

use crate::context::{GameContext, SupplyId};
use crate::pose::Pose;
use crate::step::Step;

pub use weight::WeightFn;

/// 权重函数看到的机器人状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotView {
    pub robot_id: RobotId,
    pub pose_current: Option<PathPose>,
    pub carried: Option<SupplyId>,
}

impl RobotView {
    pub fn new(robot_id: RobotId) -> Self {
        Self {
            robot_id,
            pose_current: None,
            carried: None,
        }
    }
}

/// 所有动作共有的状态
#[derive(Debug, Default)]
pub struct ActionCore {
    pub name: String,
    pub poses: VecDeque<Pose>,
    /// 被回收后暂不参与选择
    pub recycled: bool,
}

impl ActionCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_poses(name: impl Into<String>, poses: impl IntoIterator<Item = Pose>) -> Self {
        Self {
            name: name.into(),
            poses: poses.into_iter().collect(),
            recycled: false,
        }
    }
}

/// 比赛动作
pub trait Action: Send {
    fn core(&self) -> &ActionCore;

    fn core_mut(&mut self) -> &mut ActionCore;

    fn name(&self) -> &str {
        &self.core().name
    }

    /// 对该机器人的优先级，0 表示不可执行；必须是纯函数
    fn weight(&self, robot: &RobotView, game: &GameContext) -> f64;

    fn before_action(&mut self, _robot: &RobotView, _game: &mut GameContext) -> Vec<Step> {
        Vec::new()
    }

    fn after_action(&mut self, _robot: &RobotView, _game: &mut GameContext) -> Vec<Step> {
        Vec::new()
    }

    /// 阻塞后放回集合：释放占用的资源并标记为已回收
    fn recycle(&mut self, _robot_id: RobotId, _game: &mut GameContext) {
        self.core_mut().recycled = true;
    }

    /// 没有可选动作时使用的占位动作
    fn is_fallback(&self) -> bool {
        false
    }
}

/// 没有其他可选动作时使用：不移动，持续 `wait_duration`
#[derive(Debug)]
pub struct WaitAction {
    core: ActionCore,
}

impl Default for WaitAction {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitAction {
    pub fn new() -> Self {
        Self {
            core: ActionCore::new("Wait action"),
        }
    }
}

impl Action for WaitAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn weight(&self, _robot: &RobotView, _game: &GameContext) -> f64 {
        1.0
    }

    fn before_action(&mut self, robot: &RobotView, _game: &mut GameContext) -> Vec<Step> {
        debug!("Robot {}: WaitAction: before action", robot.robot_id);
        Vec::new()
    }

    fn after_action(&mut self, robot: &RobotView, _game: &mut GameContext) -> Vec<Step> {
        debug!("Robot {}: WaitAction: after action", robot.robot_id);
        Vec::new()
    }

    fn is_fallback(&self) -> bool {
        true
    }
}

/// 固定位姿列表 + 权重函数的简单动作
pub struct PoseListAction {
    core: ActionCore,
    weight: WeightFn,
}

impl PoseListAction {
    pub fn new(name: impl Into<String>, poses: impl IntoIterator<Item = Pose>, weight: WeightFn) -> Self {
        Self {
            core: ActionCore::with_poses(name, poses),
            weight,
        }
    }
}

impl Action for PoseListAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn weight(&self, robot: &RobotView, game: &GameContext) -> f64 {
        (self.weight)(robot, game)
    }
}

/// 一个策略的动作集合
#[derive(Default)]
pub struct Actions {
    items: Vec<Box<dyn Action>>,
}

impl Actions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Box<dyn Action>) {
        self.items.push(action);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Action> {
        self.items.iter().map(|a| a.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|a| a.name()).collect()
    }

    /// 选出权重最大的未回收动作并移出集合
    ///
    /// 并列时取靠前者；全部为 0 时返回新的 [`WaitAction`]。
    pub fn select(&mut self, robot: &RobotView, game: &GameContext) -> Box<dyn Action> {
        let mut best: Option<(usize, f64)> = None;
        for (index, action) in self.items.iter().enumerate() {
            if action.core().recycled {
                continue;
            }
            let weight = action.weight(robot, game);
            if weight > 0.0 && best.is_none_or(|(_, w)| weight > w) {
                best = Some((index, weight));
            }
        }

        match best {
            Some((index, weight)) => {
                let action = self.items.remove(index);
                debug!(
                    "Robot {}: selected action '{}' (weight {})",
                    robot.robot_id,
                    action.name(),
                    weight
                );
                action
            },
            None => {
                debug!("Robot {}: no eligible action, waiting", robot.robot_id);
                Box::new(WaitAction::new())
            },
        }
    }

    /// 清除所有动作的回收标志
    pub fn clear_recycled(&mut self) {
        for action in &mut self.items {
            action.core_mut().recycled = false;
        }
    }
}

/// 按策略构造动作集合
pub fn strategy_actions(strategy: Strategy, game: &GameContext) -> Actions {
    match strategy {
        Strategy::Approval => approval::actions(game),
        Strategy::Game => game::actions(game),
        Strategy::BackAndForth => back_and_forth::actions(),
        Strategy::AngularSpeedTest | Strategy::LinearSpeedTest => speed_test::actions(),
    }
}
