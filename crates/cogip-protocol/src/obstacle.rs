//! 障碍模型
//!
//! - [`StaticObstacle`]：场地上的固定矩形
//! - [`DynObstacle`]：检测到的动态障碍（圆形或矩形），附带预先计算的包围多边形 `bb`
//!
//! `bb` 在消息中是开放的顶点列表，转换为 [`ObstaclePolygon`] 时自动闭合。

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use cogip_geometry::polygon::circumscribed_vertices;
use cogip_geometry::{GeometryError, ObstaclePolygon, Vertex};

use crate::enums::CampColor;

/// 固定矩形障碍
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticObstacle {
    pub x: f64,
    pub y: f64,
    /// 旋转角（度）
    #[serde(default)]
    pub angle: f64,
    pub length_x: f64,
    pub length_y: f64,
}

impl StaticObstacle {
    pub const fn new(x: f64, y: f64, angle: f64, length_x: f64, length_y: f64) -> Self {
        Self {
            x,
            y,
            angle,
            length_x,
            length_y,
        }
    }

    /// 按阵营镜像（Y 与角度取反）
    pub fn adapted(self, camp: CampColor) -> Self {
        Self {
            y: camp.adapt_y(self.y),
            angle: camp.adapt_angle(Some(self.angle)).unwrap_or(self.angle),
            ..self
        }
    }

    pub fn center(&self) -> Vertex {
        Vertex::new(self.x, self.y)
    }

    pub fn to_polygon(&self, expand: f64) -> Result<ObstaclePolygon, GeometryError> {
        ObstaclePolygon::rectangle(self.center(), self.angle, self.length_x, self.length_y, expand)
    }
}

/// 圆形动态障碍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynRoundObstacle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    #[serde(default)]
    pub bb: Vec<Vertex>,
}

impl DynRoundObstacle {
    /// 由检测点创建，包围多边形半径为 `radius * (1 + bb_margin)`，顶点数 `bb_vertices`
    pub fn new(center: Vertex, radius: f64, bb_margin: f64, bb_vertices: usize) -> Self {
        let bb_radius = radius * (1.0 + bb_margin);
        let bb = (0..bb_vertices)
            .map(|i| center.offset(i as f64 * TAU / bb_vertices as f64, bb_radius))
            .collect();
        Self {
            x: center.x,
            y: center.y,
            radius,
            bb,
        }
    }

    /// 包围多边形外切于半径为 `radius` 的圆（用于把其他机器人视作障碍）
    pub fn circumscribing(center: Vertex, radius: f64, bb_vertices: usize) -> Self {
        Self {
            x: center.x,
            y: center.y,
            radius,
            bb: circumscribed_vertices(&center, radius, bb_vertices),
        }
    }
}

/// 矩形动态障碍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynRectObstacle {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub angle: f64,
    pub length_x: f64,
    pub length_y: f64,
    #[serde(default)]
    pub bb: Vec<Vertex>,
}

impl DynRectObstacle {
    /// 包围多边形为四个角点
    pub fn new(center: Vertex, angle: f64, length_x: f64, length_y: f64) -> Self {
        let bb = ObstaclePolygon::rectangle(center, angle, length_x, length_y, 0.0)
            .map(|polygon| polygon.vertices().to_vec())
            .unwrap_or_default();
        Self {
            x: center.x,
            y: center.y,
            angle,
            length_x,
            length_y,
            bb,
        }
    }
}

/// 动态障碍
///
/// JSON 中按字段区分：带 `length_x`/`length_y` 的是矩形，否则是圆形。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DynObstacle {
    Rect(DynRectObstacle),
    Round(DynRoundObstacle),
}

impl DynObstacle {
    pub fn center(&self) -> Vertex {
        match self {
            Self::Rect(rect) => Vertex::new(rect.x, rect.y),
            Self::Round(round) => Vertex::new(round.x, round.y),
        }
    }

    pub fn bounding_box(&self) -> &[Vertex] {
        match self {
            Self::Rect(rect) => &rect.bb,
            Self::Round(round) => &round.bb,
        }
    }

    /// 由 `bb` 构造外扩多边形
    pub fn to_polygon(&self, expand: f64) -> Result<ObstaclePolygon, GeometryError> {
        ObstaclePolygon::new(self.bounding_box().iter().copied(), expand)
    }
}

impl From<DynRoundObstacle> for DynObstacle {
    fn from(obstacle: DynRoundObstacle) -> Self {
        Self::Round(obstacle)
    }
}

impl From<DynRectObstacle> for DynObstacle {
    fn from(obstacle: DynRectObstacle) -> Self {
        Self::Rect(obstacle)
    }
}
