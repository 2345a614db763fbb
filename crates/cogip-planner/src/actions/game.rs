//! 比赛动作：收集物品并投放到投放区
//!
//! 每个启用的物品对应一个收集动作和一个投放动作。
//! 收集动作按距离加权，开始时认领物品，被回收时释放认领；
//! 投放动作只对携带该物品的机器人有效，投放后加分。

use std::collections::VecDeque;
use std::time::Duration;

use cogip_geometry::Vertex;
use cogip_protocol::{RobotId, SpeedEnum};

use super::weight::proximity_weight;
use super::{Action, ActionCore, Actions, RobotView};
use crate::context::{GameContext, SUPPLY_SCORE, SupplyId};
use crate::pose::{HookContext, Pose};
use crate::step::Step;

/// 夹爪执行器
pub const GRIP_ACTUATOR: u16 = 1;
pub const GRIP_OPEN: i32 = 0;
pub const GRIP_CLOSED: i32 = 100;

const GRIP_SETTLE: Duration = Duration::from_millis(500);
const STEP_BACK_DISTANCE: f64 = 100.0;

const COLLECT_MAX_WEIGHT: f64 = 1000.0;
const COLLECT_RANGE: f64 = 3600.0;
const DROP_WEIGHT: f64 = 2000.0;

fn normal_speed(pose: Pose) -> Pose {
    let speed: u8 = SpeedEnum::Normal.into();
    pose.with_speeds(speed, speed)
}

/// 收集一个物品
pub struct CollectSupplyAction {
    core: ActionCore,
    supply: SupplyId,
    position: Vertex,
}

impl CollectSupplyAction {
    pub fn new(supply: SupplyId, position: Vertex) -> Self {
        let mut action = Self {
            core: ActionCore::new(format!(
                "Collect supply {} at ({}, {})",
                supply, position.x as i64, position.y as i64
            )),
            supply,
            position,
        };
        action.core.poses = action.initial_poses();
        action
    }

    fn initial_poses(&self) -> VecDeque<Pose> {
        let supply = self.supply;
        let take = normal_speed(Pose::new(self.position.x, self.position.y, None))
            .with_allow_reverse(false)
            .on_before(|_, _| vec![Step::actuator(GRIP_ACTUATOR, GRIP_OPEN, GRIP_SETTLE)])
            .on_after(move |_, ctx| collect(supply, ctx));
        VecDeque::from([take])
    }
}

/// 到达物品：抓取并后退
fn collect(supply: SupplyId, ctx: &mut HookContext<'_>) -> Vec<Step> {
    if let Some(item) = ctx.game.supplies.get_mut(supply) {
        item.collected = true;
    }
    *ctx.carried = Some(supply);

    if let Some(current) = ctx.pose_current
        && let Some(o) = current.o
    {
        let back = current
            .vertex()
            .offset(o.to_radians(), -STEP_BACK_DISTANCE);
        ctx.poses.push_back(normal_speed(
            Pose::new(back.x, back.y, Some(o)).with_allow_reverse(true),
        ));
    }
    vec![Step::actuator(GRIP_ACTUATOR, GRIP_CLOSED, GRIP_SETTLE)]
}

impl Action for CollectSupplyAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn weight(&self, robot: &RobotView, game: &GameContext) -> f64 {
        if robot.carried.is_some() {
            return 0.0;
        }
        match game.supplies.get(self.supply) {
            Some(supply) if supply.is_available_for(robot.robot_id) => {
                proximity_weight(robot, &supply.position, COLLECT_MAX_WEIGHT, COLLECT_RANGE)
            },
            _ => 0.0,
        }
    }

    fn before_action(&mut self, robot: &RobotView, game: &mut GameContext) -> Vec<Step> {
        game.claim_supply(self.supply, robot.robot_id);
        Vec::new()
    }

    fn recycle(&mut self, robot_id: RobotId, game: &mut GameContext) {
        game.release_supply(self.supply, robot_id);
        self.core.poses = self.initial_poses();
        self.core.recycled = true;
    }
}

/// 把携带的物品放到投放区
pub struct DropSupplyAction {
    core: ActionCore,
    supply: SupplyId,
    zone: Vertex,
}

impl DropSupplyAction {
    pub fn new(supply: SupplyId, zone: Vertex) -> Self {
        let mut action = Self {
            core: ActionCore::new(format!("Drop supply {}", supply)),
            supply,
            zone,
        };
        action.core.poses = action.initial_poses();
        action
    }

    fn initial_poses(&self) -> VecDeque<Pose> {
        let supply = self.supply;
        let drop = normal_speed(Pose::new(self.zone.x, self.zone.y, None)).on_after(move |_, ctx| {
            if let Some(item) = ctx.game.supplies.get_mut(supply) {
                item.dropped = true;
            }
            *ctx.carried = None;
            vec![
                Step::actuator(GRIP_ACTUATOR, GRIP_OPEN, GRIP_SETTLE),
                Step::AddScore(SUPPLY_SCORE),
            ]
        });
        VecDeque::from([drop])
    }
}

impl Action for DropSupplyAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn weight(&self, robot: &RobotView, _game: &GameContext) -> f64 {
        if robot.carried == Some(self.supply) {
            DROP_WEIGHT
        } else {
            0.0
        }
    }

    fn recycle(&mut self, _robot_id: RobotId, _game: &mut GameContext) {
        self.core.poses = self.initial_poses();
        self.core.recycled = true;
    }
}

pub fn actions(game: &GameContext) -> Actions {
    let bounds = game.table().bounds;
    let zone = game.drop_zones.first().map(|z| z.position).unwrap_or_else(|| {
        Vertex::new(
            (bounds.x_min + bounds.x_max) / 2.0,
            (bounds.y_min + bounds.y_max) / 2.0,
        )
    });

    let mut actions = Actions::new();
    for supply in game.supplies.iter().filter(|s| s.enabled) {
        actions.push(Box::new(CollectSupplyAction::new(supply.id, supply.position)));
        actions.push(Box::new(DropSupplyAction::new(supply.id, zone)));
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogip_protocol::PathPose;

    fn robot_at(x: f64, y: f64) -> RobotView {
        RobotView {
            robot_id: 1,
            pose_current: Some(PathPose::new(x, y, Some(0.0))),
            carried: None,
        }
    }

    #[test]
    fn test_nearest_supply_is_selected_first() {
        let game = GameContext::default();
        let mut actions = actions(&game);
        assert_eq!(actions.len(), 6);

        let action = actions.select(&robot_at(1900.0, -500.0), &game);
        assert_eq!(action.name(), "Collect supply 1 at (2000, -500)");
    }

    #[test]
    fn test_collect_then_drop() {
        let mut game = GameContext::default();
        let mut actions = actions(&game);
        let mut robot = robot_at(900.0, -500.0);

        let mut collect_action = actions.select(&robot, &game);
        collect_action.before_action(&robot, &mut game);
        assert_eq!(game.supplies[0].claimed_by, Some(1));

        // 模拟到达
        let pose = collect_action.core_mut().poses.pop_front().unwrap();
        let mut carried = None;
        let steps = {
            let mut ctx = HookContext {
                robot_id: 1,
                pose_current: Some(PathPose::new(1000.0, -500.0, Some(0.0))),
                carried: &mut carried,
                game: &mut game,
                poses: &mut collect_action.core_mut().poses,
            };
            pose.run_after(&mut ctx)
        };
        assert_eq!(carried, Some(0));
        assert_eq!(steps, vec![Step::actuator(GRIP_ACTUATOR, GRIP_CLOSED, GRIP_SETTLE)]);
        let back = collect_action.core().poses[0].path_pose();
        assert!((back.x - 900.0).abs() < 1e-9);

        // 携带物品时只有对应的投放动作可选
        robot.carried = carried;
        let drop_action = actions.select(&robot, &game);
        assert_eq!(drop_action.name(), "Drop supply 0");
    }

    #[test]
    fn test_recycle_releases_claim() {
        let mut game = GameContext::default();
        let mut action = CollectSupplyAction::new(0, game.supplies[0].position);
        let robot = robot_at(900.0, -500.0);
        action.before_action(&robot, &mut game);
        action.core_mut().poses.clear();

        action.recycle(1, &mut game);
        assert!(action.core().recycled);
        assert_eq!(action.core().poses.len(), 1);
        assert_eq!(game.supplies[0].claimed_by, None);

        // 被其他机器人认领后对本机器人不可选
        game.claim_supply(0, 2);
        assert_eq!(action.weight(&robot, &game), 0.0);
    }
}
