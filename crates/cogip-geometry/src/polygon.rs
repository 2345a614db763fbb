//! 障碍多边形
//!
//! `ObstaclePolygon` 保存一个闭合顶点环（首尾相同）以及按 `expand` 外扩后的顶点环。
//! 外扩规则：每个顶点沿其两条相邻边方向的角平分线的外法向平移 `expand`，
//! 使机器人在规划时可以被视为一个点。

use smallvec::SmallVec;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::EPSILON;
use crate::error::GeometryError;
use crate::segment::{point_strictly_inside_segment, segments_cross, signed_distance};
use crate::vertex::Vertex;

/// 闭合顶点环（首尾相同）
pub type Ring = SmallVec<[Vertex; 16]>;

/// 障碍多边形及其外扩结果
#[derive(Debug, Clone, PartialEq)]
pub struct ObstaclePolygon {
    ring: Ring,
    expanded: Ring,
    expand: f64,
    counter_clockwise: bool,
}

impl ObstaclePolygon {
    /// 从顶点序列创建多边形
    ///
    /// 顶点序列可以是开放的，也可以已经闭合；连续的重复顶点会被合并。
    ///
    /// # 错误
    ///
    /// - 去重后少于 3 个顶点：[`GeometryError::NotEnoughVertices`]
    /// - 坐标非有限值：[`GeometryError::NonFiniteCoordinate`]
    /// - `expand` 为负或非有限值：[`GeometryError::InvalidExpand`]
    /// - 所有顶点共线：[`GeometryError::Degenerate`]
    pub fn new<I>(vertices: I, expand: f64) -> Result<Self, GeometryError>
    where
        I: IntoIterator<Item = Vertex>,
    {
        if !expand.is_finite() || expand < 0.0 {
            return Err(GeometryError::InvalidExpand(expand));
        }

        let mut unique: Ring = SmallVec::new();
        for v in vertices {
            if !v.is_finite() {
                return Err(GeometryError::NonFiniteCoordinate { x: v.x, y: v.y });
            }
            if unique.last().is_some_and(|last: &Vertex| last.coincides(&v)) {
                continue;
            }
            unique.push(v);
        }
        while unique.len() > 1 && unique[0].coincides(&unique[unique.len() - 1]) {
            unique.pop();
        }
        if unique.len() < 3 {
            return Err(GeometryError::NotEnoughVertices {
                count: unique.len(),
            });
        }

        let area = signed_area(&unique);
        if area.abs() < EPSILON {
            return Err(GeometryError::Degenerate);
        }
        let counter_clockwise = area > 0.0;

        let n = unique.len();
        let mut expanded: Ring = SmallVec::with_capacity(n + 1);
        for i in 0..n {
            let prev = &unique[(i + n - 1) % n];
            let next = &unique[(i + 1) % n];
            expanded.push(offset_vertex(prev, &unique[i], next, expand, counter_clockwise));
        }

        let mut ring = unique;
        ring.push(ring[0]);
        expanded.push(expanded[0]);

        Ok(Self {
            ring,
            expanded,
            expand,
            counter_clockwise,
        })
    }

    /// 以中心、旋转角（度）和边长构造矩形
    pub fn rectangle(
        center: Vertex,
        angle_deg: f64,
        length_x: f64,
        length_y: f64,
        expand: f64,
    ) -> Result<Self, GeometryError> {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let hx = length_x / 2.0;
        let hy = length_y / 2.0;
        let corners = [(-hx, -hy), (hx, -hy), (hx, hy), (-hx, hy)];
        Self::new(
            corners.iter().map(|&(dx, dy)| {
                Vertex::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
            }),
            expand,
        )
    }

    /// 以圆心和半径构造外切正多边形（多边形完全包含该圆盘）
    pub fn circle(
        center: Vertex,
        radius: f64,
        vertex_count: usize,
        expand: f64,
    ) -> Result<Self, GeometryError> {
        Self::new(circumscribed_vertices(&center, radius, vertex_count), expand)
    }

    /// 原始顶点（不含闭合点）
    pub fn vertices(&self) -> &[Vertex] {
        &self.ring[..self.ring.len() - 1]
    }

    /// 闭合顶点环
    pub fn ring(&self) -> &[Vertex] {
        &self.ring
    }

    /// 外扩顶点（不含闭合点）
    pub fn expanded_vertices(&self) -> &[Vertex] {
        &self.expanded[..self.expanded.len() - 1]
    }

    /// 闭合外扩顶点环
    pub fn expanded_ring(&self) -> &[Vertex] {
        &self.expanded
    }

    pub fn expand(&self) -> f64 {
        self.expand
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.counter_clockwise
    }

    /// 点是否严格位于原始多边形内部
    pub fn contains(&self, p: &Vertex) -> bool {
        ring_contains(&self.ring, p)
    }

    /// 点是否严格位于外扩多边形内部
    pub fn expanded_contains(&self, p: &Vertex) -> bool {
        ring_contains(&self.expanded, p)
    }

    /// 线段 `a-b` 是否被外扩多边形阻挡
    ///
    /// 以下任一情况视为阻挡：
    /// - 与某条外扩边真相交
    /// - 某个外扩顶点严格落在线段内部
    /// - 线段中点严格位于外扩多边形内部（覆盖顶点到顶点的对角线）
    ///
    /// 共享端点不算阻挡，因此沿外扩边行走是允许的。
    pub fn blocks_segment(&self, a: &Vertex, b: &Vertex) -> bool {
        let crosses_edge = self
            .expanded
            .windows(2)
            .any(|edge| segments_cross(a, b, &edge[0], &edge[1]));
        if crosses_edge {
            return true;
        }
        if self
            .expanded_vertices()
            .iter()
            .any(|v| point_strictly_inside_segment(v, a, b))
        {
            return true;
        }
        ring_contains(&self.expanded, &a.midpoint(b))
    }
}

/// 以 `center` 为圆心、外切于半径 `radius` 圆的正多边形顶点（逆时针）
pub fn circumscribed_vertices(center: &Vertex, radius: f64, vertex_count: usize) -> Vec<Vertex> {
    if vertex_count < 3 {
        return Vec::new();
    }
    let step = 2.0 * PI / vertex_count as f64;
    let outer = radius / (step / 2.0).cos();
    (0..vertex_count)
        .map(|i| center.offset(step * i as f64, outer))
        .collect()
}

/// 鞋带公式求有向面积（逆时针为正）
fn signed_area(vertices: &[Vertex]) -> f64 {
    let n = vertices.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = &vertices[i];
            let b = &vertices[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

/// 沿角平分线外法向平移顶点
///
/// 平分线方向为 `atan2(sin p + sin n, cos p + cos n)`，其中 `p`、`n` 分别是
/// 入边和出边的方向角；外法向在顺时针环上是 `+π/2`，在逆时针环上是 `-π/2`。
fn offset_vertex(
    prev: &Vertex,
    vertex: &Vertex,
    next: &Vertex,
    expand: f64,
    counter_clockwise: bool,
) -> Vertex {
    let p = prev.heading_to(vertex);
    let n = vertex.heading_to(next);
    let bisector = (p.sin() + n.sin()).atan2(p.cos() + n.cos());
    let normal = if counter_clockwise {
        bisector - FRAC_PI_2
    } else {
        bisector + FRAC_PI_2
    };
    vertex.offset(normal, expand)
}

/// 偶奇射线法判定严格内部；落在边上的点视为外部
fn ring_contains(ring: &[Vertex], p: &Vertex) -> bool {
    for edge in ring.windows(2) {
        let (a, b) = (&edge[0], &edge[1]);
        if signed_distance(a, b, p).abs() < EPSILON && on_segment_span(p, a, b) {
            return false;
        }
    }

    let mut inside = false;
    for edge in ring.windows(2) {
        let (a, b) = (&edge[0], &edge[1]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn on_segment_span(p: &Vertex, a: &Vertex, b: &Vertex) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(expand: f64) -> ObstaclePolygon {
        ObstaclePolygon::new(
            [
                Vertex::new(0.0, 0.0),
                Vertex::new(100.0, 0.0),
                Vertex::new(100.0, 100.0),
                Vertex::new(0.0, 100.0),
            ],
            expand,
        )
        .unwrap()
    }

    #[test]
    fn test_ring_is_closed() {
        let polygon = square(10.0);
        let ring = polygon.ring();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
        assert_eq!(polygon.expanded_ring()[0], polygon.expanded_ring()[4]);
        assert_eq!(polygon.vertices().len(), 4);
    }

    #[test]
    fn test_closed_input_is_accepted() {
        let polygon = ObstaclePolygon::new(
            [
                Vertex::new(0.0, 0.0),
                Vertex::new(10.0, 0.0),
                Vertex::new(10.0, 10.0),
                Vertex::new(0.0, 0.0),
            ],
            0.0,
        )
        .unwrap();
        assert_eq!(polygon.vertices().len(), 3);
    }

    #[test]
    fn test_expand_moves_corners_outward() {
        let polygon = square(10.0);
        let expected = 10.0 / std::f64::consts::SQRT_2;
        let corner = polygon.expanded_vertices()[0];
        assert!((corner.x + expected).abs() < 1e-9, "{:?}", corner);
        assert!((corner.y + expected).abs() < 1e-9, "{:?}", corner);
        for v in polygon.expanded_vertices() {
            assert!(!polygon.contains(v));
        }
    }

    #[test]
    fn test_expand_is_outward_for_clockwise_ring() {
        let polygon = ObstaclePolygon::new(
            [
                Vertex::new(0.0, 0.0),
                Vertex::new(0.0, 100.0),
                Vertex::new(100.0, 100.0),
                Vertex::new(100.0, 0.0),
            ],
            10.0,
        )
        .unwrap();
        assert!(!polygon.is_counter_clockwise());
        let top_left = polygon.expanded_vertices()[1];
        assert!(top_left.x < 0.0 && top_left.y > 100.0, "{:?}", top_left);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            ObstaclePolygon::new([Vertex::new(0.0, 0.0), Vertex::new(1.0, 0.0)], 0.0),
            Err(GeometryError::NotEnoughVertices { count: 2 })
        );
        assert_eq!(
            ObstaclePolygon::new(
                [Vertex::new(0.0, 0.0), Vertex::new(1.0, 0.0), Vertex::new(2.0, 0.0)],
                0.0
            ),
            Err(GeometryError::Degenerate)
        );
        assert!(matches!(
            ObstaclePolygon::new(
                [Vertex::new(0.0, 0.0), Vertex::new(1.0, 0.0), Vertex::new(1.0, 1.0)],
                -1.0
            ),
            Err(GeometryError::InvalidExpand(_))
        ));
        assert!(matches!(
            ObstaclePolygon::new(
                [Vertex::new(f64::NAN, 0.0), Vertex::new(1.0, 0.0), Vertex::new(1.0, 1.0)],
                0.0
            ),
            Err(GeometryError::NonFiniteCoordinate { .. })
        ));
    }

    #[test]
    fn test_contains_is_strict() {
        let polygon = square(0.0);
        assert!(polygon.contains(&Vertex::new(50.0, 50.0)));
        assert!(!polygon.contains(&Vertex::new(0.0, 50.0)));
        assert!(!polygon.contains(&Vertex::new(100.0, 100.0)));
        assert!(!polygon.contains(&Vertex::new(150.0, 50.0)));
    }

    #[test]
    fn test_blocks_segment() {
        let polygon = square(10.0);
        // 穿过多边形
        assert!(polygon.blocks_segment(&Vertex::new(-50.0, 50.0), &Vertex::new(150.0, 50.0)));
        // 外扩顶点之间的对角线
        let ev = polygon.expanded_vertices();
        assert!(polygon.blocks_segment(&ev[0], &ev[2]));
        // 沿外扩边行走
        assert!(!polygon.blocks_segment(&ev[0], &ev[1]));
        // 远离多边形
        assert!(!polygon.blocks_segment(&Vertex::new(-50.0, 200.0), &Vertex::new(150.0, 200.0)));
    }

    #[test]
    fn test_margin_grazing_segment_is_blocked() {
        let polygon = square(10.0);
        let a = Vertex::new(-50.0, -3.0);
        let b = Vertex::new(150.0, -3.0);
        // 不碰原多边形，但穿过外扩边
        assert!(!polygon.contains(&Vertex::new(50.0, -3.0)));
        assert!(polygon.blocks_segment(&a, &b));
    }

    #[test]
    fn test_rectangle_rotation() {
        let rect = ObstaclePolygon::rectangle(Vertex::new(0.0, 0.0), 90.0, 200.0, 100.0, 0.0)
            .unwrap();
        assert!(rect.contains(&Vertex::new(0.0, 90.0)));
        assert!(!rect.contains(&Vertex::new(90.0, 0.0)));
    }

    #[test]
    fn test_circle_contains_disk() {
        let center = Vertex::new(500.0, 500.0);
        let polygon = ObstaclePolygon::circle(center, 100.0, 8, 0.0).unwrap();
        for i in 0..64 {
            let angle = i as f64 * std::f64::consts::TAU / 64.0;
            let on_circle = center.offset(angle, 99.9);
            assert!(polygon.contains(&on_circle), "angle {}", angle);
        }
    }
}
