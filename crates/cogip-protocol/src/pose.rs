//! 路径位姿
//!
//! `PathPose` 是规划结果与消息中使用的位姿形式，不携带任何回调。

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

use cogip_geometry::Vertex;

/// 常用速度档位（最大速度的百分比）
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SpeedEnum {
    Low = 33,
    Normal = 66,
    Max = 100,
}

fn default_speed() -> u8 {
    SpeedEnum::Normal.into()
}

fn default_orientation() -> Option<f64> {
    Some(0.0)
}

fn default_true() -> bool {
    true
}

/// 路径位姿
///
/// JSON 形式：`{"x": .., "y": .., "O": .. | null, "max_speed_linear": .., ...}`。
/// 字段缺失时取默认值；`O` 缺失时为 `0.0`，显式 `null` 表示不约束朝向。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPose {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// 朝向（度）
    #[serde(rename = "O", default = "default_orientation")]
    pub o: Option<f64>,
    /// 最大线速度（百分比）
    #[serde(default = "default_speed")]
    pub max_speed_linear: u8,
    /// 最大角速度（百分比）
    #[serde(default = "default_speed")]
    pub max_speed_angular: u8,
    /// 允许倒车
    #[serde(default = "default_true")]
    pub allow_reverse: bool,
    /// 堵转时也上报到达
    #[serde(default)]
    pub bypass_anti_blocking: bool,
    /// 到达超时（毫秒），0 表示不限
    #[serde(default)]
    pub timeout_ms: u32,
    /// 不执行最终朝向调整
    #[serde(default)]
    pub bypass_final_orientation: bool,
}

impl Default for PathPose {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            o: default_orientation(),
            max_speed_linear: default_speed(),
            max_speed_angular: default_speed(),
            allow_reverse: true,
            bypass_anti_blocking: false,
            timeout_ms: 0,
            bypass_final_orientation: false,
        }
    }
}

impl PathPose {
    pub fn new(x: f64, y: f64, o: Option<f64>) -> Self {
        Self {
            x,
            y,
            o,
            ..Default::default()
        }
    }

    pub fn vertex(&self) -> Vertex {
        Vertex::new(self.x, self.y)
    }

    /// 平面距离（毫米）
    pub fn distance(&self, other: &PathPose) -> f64 {
        self.vertex().distance(&other.vertex())
    }

    /// 朝向差的绝对值（度，归一化到 `[0, 180]`）
    ///
    /// 任一方未约束朝向时返回 0。
    pub fn angle_delta(&self, other: &PathPose) -> f64 {
        match (self.o, other.o) {
            (Some(a), Some(b)) => {
                let delta = (a - b).rem_euclid(360.0);
                delta.min(360.0 - delta)
            },
            _ => 0.0,
        }
    }

    /// 位置与朝向都在阈值以内
    pub fn is_close_to(&self, other: &PathPose, distance_mm: f64, angle_deg: f64) -> bool {
        self.distance(other) < distance_mm && self.angle_delta(other) < angle_deg
    }

    pub fn with_speeds(mut self, linear: u8, angular: u8) -> Self {
        self.max_speed_linear = linear;
        self.max_speed_angular = angular;
        self
    }

    pub fn with_allow_reverse(mut self, allow_reverse: bool) -> Self {
        self.allow_reverse = allow_reverse;
        self
    }
}

impl From<Vertex> for PathPose {
    fn from(v: Vertex) -> Self {
        PathPose::new(v.x, v.y, None)
    }
}
