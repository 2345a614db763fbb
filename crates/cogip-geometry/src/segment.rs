//! 线段相交判定
//!
//! 所有判定都基于点到直线的有向距离，容差为 [`EPSILON`](crate::EPSILON) 毫米，
//! 因此结果与线段长度的量纲无关。

use crate::EPSILON;
use crate::vertex::Vertex;

/// 点 `c` 相对有向直线 `a → b` 的有向距离（左正右负）
///
/// `a` 与 `b` 重合时返回 `c` 到 `a` 的距离，符号为正。
pub fn signed_distance(a: &Vertex, b: &Vertex, c: &Vertex) -> f64 {
    let length = a.distance(b);
    if length < EPSILON {
        return a.distance(c);
    }
    ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)) / length
}

fn side(a: &Vertex, b: &Vertex, c: &Vertex) -> i8 {
    let d = signed_distance(a, b, c);
    if d > EPSILON {
        1
    } else if d < -EPSILON {
        -1
    } else {
        0
    }
}

/// 两条线段是否真相交（proper crossing）
///
/// 只有当两条线段的内部在唯一一点交叉时返回 `true`；
/// 共享端点、端点落在另一条线段上、共线重叠都不算。
pub fn segments_cross(p1: &Vertex, p2: &Vertex, q1: &Vertex, q2: &Vertex) -> bool {
    let d1 = side(q1, q2, p1);
    let d2 = side(q1, q2, p2);
    let d3 = side(p1, p2, q1);
    let d4 = side(p1, p2, q2);
    d1 * d2 < 0 && d3 * d4 < 0
}

/// 点 `p` 是否严格落在线段 `a-b` 内部（不含端点）
pub fn point_strictly_inside_segment(p: &Vertex, a: &Vertex, b: &Vertex) -> bool {
    if p.coincides(a) || p.coincides(b) {
        return false;
    }
    if side(a, b, p) != 0 {
        return false;
    }
    let length_sq = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
    if length_sq < EPSILON * EPSILON {
        return false;
    }
    let t = ((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / length_sq;
    t > 0.0 && t < 1.0
}
