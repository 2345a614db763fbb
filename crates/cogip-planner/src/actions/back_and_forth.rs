//! 往返动作
//!
//! 动作开始时以机器人当前位置为准，计算其关于场地中心的对称位姿，
//! 之后在两点之间循环。

use cogip_protocol::PathPose;

use super::{Action, ActionCore, Actions, RobotView};
use crate::context::GameContext;
use crate::pose::{Pose, requeue_self};
use crate::step::Step;

pub struct BackAndForthAction {
    core: ActionCore,
    endpoints: Option<(Pose, Pose)>,
}

impl Default for BackAndForthAction {
    fn default() -> Self {
        Self::new()
    }
}

impl BackAndForthAction {
    pub fn new() -> Self {
        Self {
            core: ActionCore::new("BackAndForth action"),
            endpoints: None,
        }
    }

    fn compute_endpoints(current: &PathPose, game: &GameContext) -> (Pose, Pose) {
        let bounds = game.table().bounds;
        let opposite = Pose::new(
            bounds.x_min + bounds.x_max - current.x,
            bounds.y_min + bounds.y_max - current.y,
            current.o.map(|o| -o),
        )
        .with_speeds(66, 66)
        .on_after(requeue_self);
        let origin = Pose::from(*current).on_after(requeue_self);
        (opposite, origin)
    }
}

impl Action for BackAndForthAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn weight(&self, _robot: &RobotView, _game: &GameContext) -> f64 {
        1_000_000.0
    }

    fn before_action(&mut self, robot: &RobotView, game: &mut GameContext) -> Vec<Step> {
        if self.endpoints.is_none()
            && let Some(current) = robot.pose_current
        {
            self.endpoints = Some(Self::compute_endpoints(&current, game));
        }
        if let Some((opposite, origin)) = &self.endpoints {
            self.core.poses.push_back(opposite.clone());
            self.core.poses.push_back(origin.clone());
        }
        Vec::new()
    }

    fn recycle(&mut self, _robot_id: cogip_protocol::RobotId, _game: &mut GameContext) {
        // before_action 会重新放入两个端点
        self.core.poses.clear();
        self.core.recycled = true;
    }
}

pub fn actions() -> Actions {
    let mut actions = Actions::new();
    actions.push(Box::new(BackAndForthAction::new()));
    actions
}
