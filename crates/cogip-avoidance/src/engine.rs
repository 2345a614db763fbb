//! 避障引擎
//!
//! 在几何内核之上增加：
//! - 按 `(robot_width, margin)` 缓存的固定障碍外扩多边形，只在参数变化时重建
//! - 每次调用时把其他机器人与检测障碍转换为外扩多边形
//! - 起点或终点被障碍占据时直接返回空路径
//! - 用输入的起点/终点替换内核输出的首尾点，恢复朝向与速度信息

use tracing::{debug, warn};

use cogip_geometry::{EPSILON, ObstaclePolygon, VisibilityRoadMap};
use cogip_protocol::{AvoidanceStrategy, DynObstacle, PathPose};

use crate::config::AvoidanceConfig;
use crate::table::Table;

struct FixedObstacleCache {
    robot_width: f64,
    margin: f64,
    road_map: VisibilityRoadMap,
}

/// 避障引擎
pub struct Avoidance {
    table: Table,
    cache: Option<FixedObstacleCache>,
}

impl Avoidance {
    pub fn new(table: Table) -> Self {
        Self { table, cache: None }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// 获取（必要时重建）带固定障碍的可视图
    fn road_map(&mut self, config: &AvoidanceConfig) -> &VisibilityRoadMap {
        let stale = self.cache.as_ref().is_none_or(|cache| {
            cache.robot_width != config.robot_width || cache.margin != config.obstacle_bb_margin
        });
        if stale {
            self.cache = None;
        }
        let table = &self.table;
        &self
            .cache
            .get_or_insert_with(|| build_cache(table, config))
            .road_map
    }

    /// 计算从 `start` 到 `goal` 的路径
    ///
    /// 返回值约定：
    /// - `[]`：无路可走（起点/终点被占据、终点不可达、StopAndGo 需要绕行）
    /// - `[goal]`：已在目标位姿上
    /// - `[start, ..., goal]`：可行路径
    pub fn get_path(
        &mut self,
        start: &PathPose,
        goal: &PathPose,
        obstacles: &[DynObstacle],
        strategy: AvoidanceStrategy,
        config: &AvoidanceConfig,
    ) -> Vec<PathPose> {
        if strategy == AvoidanceStrategy::Disabled {
            return vec![*start, *goal];
        }

        if start.distance(goal) < EPSILON {
            if start.angle_delta(goal) < EPSILON {
                return vec![*goal];
            }
            // 原地转向
            return vec![*start, *goal];
        }

        let expand = config.expand();
        let dynamic: Vec<ObstaclePolygon> = obstacles
            .iter()
            .filter_map(|obstacle| match obstacle.to_polygon(expand) {
                Ok(polygon) => Some(polygon),
                Err(e) => {
                    warn!("Avoidance: skip malformed obstacle at {:?}: {}", obstacle.center(), e);
                    None
                },
            })
            .collect();

        let start_vertex = start.vertex();
        let goal_vertex = goal.vertex();
        let max_distance = config.max_distance;
        let road_map = self.road_map(config);

        let occupied = road_map
            .fixed_obstacles()
            .iter()
            .chain(dynamic.iter())
            .any(|p| p.expanded_contains(&start_vertex) || p.expanded_contains(&goal_vertex));
        if occupied {
            debug!("Avoidance: start or goal inside an obstacle");
            return Vec::new();
        }

        let points = road_map.planning(start_vertex, goal_vertex, &dynamic, max_distance);
        if points.len() < 2 {
            debug!("Avoidance: goal unreachable");
            return Vec::new();
        }

        let last = points.len() - 1;
        let path: Vec<PathPose> = points
            .iter()
            .enumerate()
            .map(|(i, point)| match i {
                0 => *start,
                i if i == last => *goal,
                _ => PathPose {
                    x: point.x,
                    y: point.y,
                    o: None,
                    max_speed_linear: goal.max_speed_linear,
                    max_speed_angular: goal.max_speed_angular,
                    allow_reverse: goal.allow_reverse,
                    bypass_final_orientation: true,
                    ..Default::default()
                },
            })
            .collect();

        if strategy == AvoidanceStrategy::StopAndGo && path.len() > 2 {
            debug!("Avoidance: stop and go, detour required");
            return Vec::new();
        }

        path
    }
}

fn build_cache(table: &Table, config: &AvoidanceConfig) -> FixedObstacleCache {
    let expand = config.expand();
    let fixed = table
        .fixed_obstacles
        .iter()
        .filter_map(|obstacle| match obstacle.to_polygon(expand) {
            Ok(polygon) => Some(polygon),
            Err(e) => {
                warn!("Avoidance: invalid fixed obstacle {:?}: {}", obstacle, e);
                None
            },
        })
        .collect();
    debug!(
        "Avoidance: rebuild fixed obstacles (robot_width={}, margin={})",
        config.robot_width, config.obstacle_bb_margin
    );
    FixedObstacleCache {
        robot_width: config.robot_width,
        margin: config.obstacle_bb_margin,
        road_map: VisibilityRoadMap::new(table.bounds.shrink(config.robot_width / 2.0), fixed),
    }
}
