//! 验收动作：在场地两端之间往返

use super::weight::constant;
use super::{Actions, PoseListAction};
use crate::context::GameContext;
use crate::pose::Pose;

pub const APPROVAL_WEIGHT: f64 = 1_000_000.0;

/// 到达第二个位姿后重新填充两点队列，形成循环
pub fn actions(game: &GameContext) -> Actions {
    let bounds = game.table().bounds;
    let camp = game.camp;
    let y = bounds.y_min + 300.0;

    let first = Pose::adapted(camp, bounds.x_min + 300.0, y, Some(0.0)).with_speeds(66, 66);
    let loop_first = first.clone();
    let second = Pose::adapted(camp, bounds.x_max - 300.0, y, Some(180.0))
        .with_speeds(66, 66)
        .on_after(move |pose, ctx| {
            ctx.poses.push_back(loop_first.clone());
            ctx.poses.push_back(pose.clone());
            Vec::new()
        });

    let mut actions = Actions::new();
    actions.push(Box::new(PoseListAction::new(
        "Approval action",
        [first, second],
        constant(APPROVAL_WEIGHT),
    )));
    actions
}
