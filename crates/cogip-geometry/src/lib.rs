//! # COGIP Geometry
//!
//! 避障规划的几何内核（无 IO、无线程）
//!
//! ## 模块
//!
//! - `vertex`: 平面点（毫米）
//! - `segment`: 线段相交判定
//! - `polygon`: 障碍多边形及其外扩
//! - `dijkstra`: 欧氏权重最短路
//! - `visibility`: 可视图（Visibility Road Map）路径规划
//!
//! ## 坐标系
//!
//! 所有长度单位为毫米，角度在对外接口上使用度（°），内部计算使用弧度。

pub mod dijkstra;
mod error;
pub mod polygon;
pub mod segment;
pub mod vertex;
pub mod visibility;

pub use error::GeometryError;
pub use polygon::ObstaclePolygon;
pub use segment::{point_strictly_inside_segment, segments_cross};
pub use vertex::Vertex;
pub use visibility::{Bounds, VisibilityRoadMap};

/// 坐标比较容差（毫米）
pub const EPSILON: f64 = 1e-6;
