//! 可视图路径规划（Visibility Road Map）
//!
//! 节点为起点、终点以及所有位于场地边界内、且不在任何障碍内部的外扩顶点；
//! 两个节点之间的边有效当且仅当线段不被任何障碍阻挡。
//! 在该图上以欧氏距离为权重运行 Dijkstra。

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dijkstra::shortest_path;
use crate::polygon::ObstaclePolygon;
use crate::vertex::Vertex;

/// 场地边界（闭区间，毫米）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn contains(&self, p: &Vertex) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    /// 四边各向内收缩 `margin`
    pub fn shrink(&self, margin: f64) -> Bounds {
        Bounds::new(
            self.x_min + margin,
            self.x_max - margin,
            self.y_min + margin,
            self.y_max - margin,
        )
    }
}

/// 可视图规划器
///
/// 固定障碍在构造时传入并长期持有；动态障碍在每次 [`planning`](Self::planning) 时传入。
#[derive(Debug, Clone)]
pub struct VisibilityRoadMap {
    bounds: Bounds,
    fixed_obstacles: Vec<ObstaclePolygon>,
}

impl VisibilityRoadMap {
    pub fn new(bounds: Bounds, fixed_obstacles: Vec<ObstaclePolygon>) -> Self {
        Self {
            bounds,
            fixed_obstacles,
        }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn fixed_obstacles(&self) -> &[ObstaclePolygon] {
        &self.fixed_obstacles
    }

    /// 计算从 `start` 到 `goal` 的路径
    ///
    /// - 距离起点不小于 `max_distance` 的节点会被剪除（终点除外）
    /// - 起点与终点重合时返回 `[goal]`
    /// - 终点不可达时返回 `[goal]`，调用方据此判定阻塞
    ///
    /// 成功时返回的点列以 `start` 开头、以 `goal` 结尾。
    pub fn planning(
        &self,
        start: Vertex,
        goal: Vertex,
        dynamic_obstacles: &[ObstaclePolygon],
        max_distance: f64,
    ) -> Vec<Vertex> {
        if start.coincides(&goal) {
            return vec![goal];
        }

        let obstacles: Vec<&ObstaclePolygon> = self
            .fixed_obstacles
            .iter()
            .chain(dynamic_obstacles.iter())
            .collect();

        let nodes = self.collect_nodes(start, goal, &obstacles, max_distance);
        let adjacency = build_adjacency(&nodes, &obstacles);
        trace!(
            nodes = nodes.len(),
            obstacles = obstacles.len(),
            "visibility graph built"
        );

        match shortest_path(&nodes, &adjacency, 0, 1) {
            Some(indices) => indices.into_iter().map(|i| nodes[i]).collect(),
            None => vec![goal],
        }
    }

    fn collect_nodes(
        &self,
        start: Vertex,
        goal: Vertex,
        obstacles: &[&ObstaclePolygon],
        max_distance: f64,
    ) -> Vec<Vertex> {
        let mut nodes = vec![start, goal];
        for obstacle in obstacles {
            for vertex in obstacle.expanded_vertices() {
                if !self.bounds.contains(vertex) {
                    continue;
                }
                if start.distance(vertex) >= max_distance {
                    continue;
                }
                if obstacles.iter().any(|o| o.expanded_contains(vertex)) {
                    continue;
                }
                nodes.push(*vertex);
            }
        }
        nodes
    }
}

fn build_adjacency(nodes: &[Vertex], obstacles: &[&ObstaclePolygon]) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); nodes.len()];
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let blocked = obstacles
                .iter()
                .any(|o| o.blocks_segment(&nodes[i], &nodes[j]));
            if !blocked {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
    }
    for neighbours in &mut adjacency {
        neighbours.sort_unstable();
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Bounds {
        Bounds::new(0.0, 3000.0, -1000.0, 1000.0)
    }

    #[test]
    fn test_straight_line_without_obstacles() {
        let map = VisibilityRoadMap::new(arena(), Vec::new());
        let path = map.planning(
            Vertex::new(225.0, -775.0),
            Vertex::new(1875.0, -775.0),
            &[],
            2500.0,
        );
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_detour_around_obstacle() {
        let obstacle =
            ObstaclePolygon::rectangle(Vertex::new(1000.0, 0.0), 0.0, 200.0, 400.0, 50.0).unwrap();
        let map = VisibilityRoadMap::new(arena(), vec![obstacle.clone()]);
        let start = Vertex::new(500.0, 0.0);
        let goal = Vertex::new(1500.0, 0.0);
        let path = map.planning(start, goal, &[], 3000.0);

        assert!(path.len() > 2, "{:?}", path);
        assert_eq!(path[0], start);
        assert_eq!(*path.last().unwrap(), goal);
        for leg in path.windows(2) {
            assert!(!obstacle.blocks_segment(&leg[0], &leg[1]));
        }
    }

    #[test]
    fn test_goal_inside_obstacle_returns_goal_only() {
        let obstacle =
            ObstaclePolygon::rectangle(Vertex::new(1000.0, 0.0), 0.0, 200.0, 200.0, 20.0).unwrap();
        let map = VisibilityRoadMap::new(arena(), vec![obstacle]);
        let goal = Vertex::new(1000.0, 0.0);
        let path = map.planning(Vertex::new(200.0, 0.0), goal, &[], 3000.0);
        assert_eq!(path, vec![goal]);
    }

    #[test]
    fn test_same_start_and_goal() {
        let map = VisibilityRoadMap::new(arena(), Vec::new());
        let p = Vertex::new(100.0, 100.0);
        assert!(map.planning(p, p, &[], 1000.0).len() <= 1);
    }

    #[test]
    fn test_max_distance_prunes_detour_nodes() {
        let obstacle =
            ObstaclePolygon::rectangle(Vertex::new(1000.0, 0.0), 0.0, 200.0, 400.0, 50.0).unwrap();
        let map = VisibilityRoadMap::new(arena(), vec![obstacle]);
        // 所有外扩顶点都在 max_distance 之外，只剩起点与终点
        let path = map.planning(Vertex::new(500.0, 0.0), Vertex::new(1500.0, 0.0), &[], 10.0);
        assert_eq!(path, vec![Vertex::new(1500.0, 0.0)]);
    }

    #[test]
    fn test_bounds_filter_nodes() {
        let obstacle =
            ObstaclePolygon::rectangle(Vertex::new(1000.0, 0.0), 0.0, 200.0, 400.0, 50.0).unwrap();
        // 场地上下边界紧贴障碍，外扩顶点都在边界外
        let tight = Bounds::new(0.0, 3000.0, -100.0, 100.0);
        let map = VisibilityRoadMap::new(tight, vec![obstacle]);
        let goal = Vertex::new(1500.0, 0.0);
        let path = map.planning(Vertex::new(500.0, 0.0), goal, &[], 3000.0);
        assert_eq!(path, vec![goal]);
    }

    #[test]
    fn test_bounds_shrink() {
        let b = arena().shrink(100.0);
        assert_eq!(b, Bounds::new(100.0, 2900.0, -900.0, 900.0));
        assert!(b.contains(&Vertex::new(100.0, 0.0)));
        assert!(!b.contains(&Vertex::new(99.0, 0.0)));
    }
}
