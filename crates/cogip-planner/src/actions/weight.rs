//! 可组合的权重函数

use cogip_geometry::Vertex;
use cogip_protocol::RobotId;

use super::RobotView;
use crate::context::GameContext;

/// 权重函数
pub type WeightFn = Box<dyn Fn(&RobotView, &GameContext) -> f64 + Send + Sync>;

/// 固定权重
pub fn constant(value: f64) -> WeightFn {
    Box::new(move |_, _| value)
}

/// 仅对指定机器人生效，其余机器人权重为 0
pub fn only_robot(robot_id: RobotId, inner: WeightFn) -> WeightFn {
    Box::new(move |robot, game| {
        if robot.robot_id == robot_id {
            inner(robot, game)
        } else {
            0.0
        }
    })
}

/// 距离越近权重越高：`max * (range - d) / range`，超出 `range` 为 0
pub fn proximity_weight(robot: &RobotView, target: &Vertex, max: f64, range: f64) -> f64 {
    let Some(pose) = robot.pose_current else {
        return 0.0;
    };
    if range <= 0.0 {
        return 0.0;
    }
    let d = pose.vertex().distance(target);
    max * ((range - d) / range).clamp(0.0, 1.0)
}

/// [`proximity_weight`] 的闭包形式
pub fn proximity(target: Vertex, max: f64, range: f64) -> WeightFn {
    Box::new(move |robot, _| proximity_weight(robot, &target, max, range))
}
