//! 欧氏权重最短路
//!
//! 基于 `pathfinding` crate 的 Dijkstra 实现。边权为节点间欧氏距离，
//! 按微米取整为 `u64`（`pathfinding` 要求代价满足 `Ord`）。
//! 后继节点按索引升序展开，相同输入总是得到相同输出。

use pathfinding::prelude::dijkstra;

use crate::vertex::Vertex;

/// 代价缩放系数（毫米 → 微米）
const COST_SCALE: f64 = 1000.0;

fn scaled_cost(a: &Vertex, b: &Vertex) -> u64 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cost = (a.distance(b) * COST_SCALE).round() as u64;
    cost
}

/// 在邻接表表示的图上求 `start` 到 `goal` 的最短节点序列
///
/// - `nodes`: 节点坐标
/// - `adjacency`: 每个节点的相邻节点索引（升序）
///
/// 不可达时返回 `None`。
pub fn shortest_path(
    nodes: &[Vertex],
    adjacency: &[Vec<usize>],
    start: usize,
    goal: usize,
) -> Option<Vec<usize>> {
    if start >= nodes.len() || goal >= nodes.len() || adjacency.len() != nodes.len() {
        return None;
    }
    dijkstra(
        &start,
        |&node| {
            adjacency[node]
                .iter()
                .map(move |&next| (next, scaled_cost(&nodes[node], &nodes[next])))
        },
        |&node| node == goal,
    )
    .map(|(path, _cost)| path)
}
