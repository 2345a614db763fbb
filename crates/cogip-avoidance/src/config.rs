//! 避障配置
//!
//! 小的调参常量（20 mm、5°、机器人半径系数）都是经验值，全部放在配置中。

use std::time::Duration;

/// 避障配置
#[derive(Debug, Clone, PartialEq)]
pub struct AvoidanceConfig {
    /// 机器人宽度（mm）
    pub robot_width: f64,
    /// 障碍外扩比例（相对机器人宽度）
    pub obstacle_bb_margin: f64,
    /// 其他机器人包围多边形的顶点数
    pub obstacle_bb_vertices: usize,
    /// 可视图节点到起点的最大距离（mm）
    pub max_distance: f64,
    /// 路径刷新周期
    pub path_refresh_interval: Duration,
    /// 防抖距离阈值（mm）
    pub min_move_distance: f64,
    /// 防抖角度阈值（度）
    pub min_angle_delta: f64,
    /// 距离任一机器人小于该值的检测障碍被丢弃（mm）
    pub obstacle_min_distance: f64,
    /// 其他机器人视为半径 `robot_width / robot_radius_factor` 的圆
    pub robot_radius_factor: f64,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            robot_width: 225.0,
            obstacle_bb_margin: 0.2,
            obstacle_bb_vertices: 6,
            max_distance: 2500.0,
            path_refresh_interval: Duration::from_millis(200),
            min_move_distance: 20.0,
            min_angle_delta: 5.0,
            obstacle_min_distance: 150.0,
            robot_radius_factor: 1.5,
        }
    }
}

impl AvoidanceConfig {
    /// 障碍外扩距离
    pub fn expand(&self) -> f64 {
        self.robot_width * self.obstacle_bb_margin
    }

    /// 其他机器人作为障碍时的半径
    pub fn robot_obstacle_radius(&self) -> f64 {
        self.robot_width / self.robot_radius_factor
    }
}
