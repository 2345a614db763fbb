//! 规划器配置
//!
//! 所有可调参数集中在 [`Properties`] 中，可从 TOML 文件加载，
//! 也可在运行时通过 `config_updated` 事件逐项修改。
//! 每次修改都会整体校验，失败时保留原值。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::Path;
use std::time::Duration;

use cogip_avoidance::AvoidanceConfig;

use crate::error::PlannerError;

/// 规划器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Properties {
    /// 机器人宽度（mm）
    pub robot_width: f64,
    /// 检测障碍半径（mm）
    pub obstacle_radius: f64,
    /// 障碍包围盒外扩比例
    pub obstacle_bb_margin: f64,
    /// 障碍包围盒顶点数
    pub obstacle_bb_vertices: usize,
    /// 可视图节点到起点的最大距离（mm）
    pub max_distance: f64,
    /// 障碍广播周期（秒）
    pub obstacle_sender_interval: f64,
    /// 路径刷新周期（秒）
    pub path_refresh_interval: f64,
    /// 连续阻塞多少次后回收当前动作
    pub blocked_retry_threshold: u32,
    /// WaitAction 持续时间（秒）
    pub wait_duration: f64,
    /// 比赛时长（秒）
    pub game_duration: u32,
    /// 防抖距离（mm）
    pub min_move_distance: f64,
    /// 防抖角度（度）
    pub min_angle_delta: f64,
    /// 距离机器人小于该值的检测障碍被丢弃（mm）
    pub obstacle_min_distance: f64,
    /// 其他机器人视为半径 `robot_width / robot_radius_factor` 的圆
    pub robot_radius_factor: f64,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            robot_width: 225.0,
            obstacle_radius: 150.0,
            obstacle_bb_margin: 0.2,
            obstacle_bb_vertices: 6,
            max_distance: 2500.0,
            obstacle_sender_interval: 0.2,
            path_refresh_interval: 0.2,
            blocked_retry_threshold: 3,
            wait_duration: 2.0,
            game_duration: 100,
            min_move_distance: 20.0,
            min_angle_delta: 5.0,
            obstacle_min_distance: 150.0,
            robot_radius_factor: 1.5,
        }
    }
}

/// 各字段的取值范围（闭区间）
const PROPERTY_RANGES: [(&str, f64, f64); 14] = [
    ("robot_width", 50.0, 1000.0),
    ("obstacle_radius", 100.0, 1000.0),
    ("obstacle_bb_margin", 0.0, 1.0),
    ("obstacle_bb_vertices", 3.0, 20.0),
    ("max_distance", 0.0, 4000.0),
    ("obstacle_sender_interval", 0.1, 2.0),
    ("path_refresh_interval", 0.1, 2.0),
    ("blocked_retry_threshold", 0.0, 100.0),
    ("wait_duration", 0.0, 60.0),
    ("game_duration", 1.0, 600.0),
    ("min_move_distance", 0.0, 200.0),
    ("min_angle_delta", 0.0, 90.0),
    ("obstacle_min_distance", 0.0, 1000.0),
    ("robot_radius_factor", 0.5, 10.0),
];

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), PlannerError> {
    if !value.is_finite() || value < min || value > max {
        return Err(PlannerError::invalid(
            name,
            format!("{} is not within {}..={}", value, min, max),
        ));
    }
    Ok(())
}

fn as_f64(name: &str, value: &Value) -> Result<f64, PlannerError> {
    value
        .as_f64()
        .ok_or_else(|| PlannerError::invalid(name, format!("expected a number, got {}", value)))
}

fn as_u64(name: &str, value: &Value) -> Result<u64, PlannerError> {
    value.as_u64().ok_or_else(|| {
        PlannerError::invalid(name, format!("expected a non-negative integer, got {}", value))
    })
}

impl Properties {
    /// 从 TOML 文件加载并校验
    ///
    /// 文件中未出现的字段使用默认值。
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, PlannerError> {
        let content = std::fs::read_to_string(path)?;
        let properties: Properties = toml::from_str(&content)?;
        properties.validate()?;
        Ok(properties)
    }

    /// 检查所有字段的取值范围
    pub fn validate(&self) -> Result<(), PlannerError> {
        let values = self.values();
        for (name, min, max) in PROPERTY_RANGES {
            let value = values
                .get(name)
                .and_then(Value::as_f64)
                .ok_or_else(|| PlannerError::invalid(name, "missing value"))?;
            check_range(name, value, min, max)?;
        }
        Ok(())
    }

    fn values(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// 带当前值的配置描述（`config` 命令发给看板）
    pub fn schema(&self) -> Value {
        let values = self.values();
        let properties: Map<String, Value> = PROPERTY_RANGES
            .iter()
            .filter_map(|&(name, min, max)| {
                let value = values.get(name)?;
                let kind = if value.is_u64() { "integer" } else { "number" };
                Some((
                    name.to_string(),
                    json!({"type": kind, "minimum": min, "maximum": max, "value": value}),
                ))
            })
            .collect();
        json!({
            "namespace": "/planner",
            "type": "object",
            "properties": properties,
        })
    }

    /// 修改单个字段
    ///
    /// 新值校验失败时返回错误，原配置不变。
    pub fn update(&mut self, name: &str, value: &Value) -> Result<(), PlannerError> {
        let mut next = self.clone();
        match name {
            "robot_width" => next.robot_width = as_f64(name, value)?,
            "obstacle_radius" => next.obstacle_radius = as_f64(name, value)?,
            "obstacle_bb_margin" => next.obstacle_bb_margin = as_f64(name, value)?,
            "obstacle_bb_vertices" => next.obstacle_bb_vertices = as_u64(name, value)? as usize,
            "max_distance" => next.max_distance = as_f64(name, value)?,
            "obstacle_sender_interval" => next.obstacle_sender_interval = as_f64(name, value)?,
            "path_refresh_interval" => next.path_refresh_interval = as_f64(name, value)?,
            "blocked_retry_threshold" => {
                next.blocked_retry_threshold = u32::try_from(as_u64(name, value)?)
                    .map_err(|_| PlannerError::invalid(name, "value too large"))?
            },
            "wait_duration" => next.wait_duration = as_f64(name, value)?,
            "game_duration" => {
                next.game_duration = u32::try_from(as_u64(name, value)?)
                    .map_err(|_| PlannerError::invalid(name, "value too large"))?
            },
            "min_move_distance" => next.min_move_distance = as_f64(name, value)?,
            "min_angle_delta" => next.min_angle_delta = as_f64(name, value)?,
            "obstacle_min_distance" => next.obstacle_min_distance = as_f64(name, value)?,
            "robot_radius_factor" => next.robot_radius_factor = as_f64(name, value)?,
            _ => return Err(PlannerError::UnknownProperty(name.to_string())),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn obstacle_sender_period(&self) -> Duration {
        Duration::from_secs_f64(self.obstacle_sender_interval)
    }

    pub fn wait_period(&self) -> Duration {
        Duration::from_secs_f64(self.wait_duration)
    }

    /// 避障线程使用的配置
    pub fn to_avoidance_config(&self) -> AvoidanceConfig {
        AvoidanceConfig {
            robot_width: self.robot_width,
            obstacle_bb_margin: self.obstacle_bb_margin,
            obstacle_bb_vertices: self.obstacle_bb_vertices,
            max_distance: self.max_distance,
            path_refresh_interval: Duration::from_secs_f64(self.path_refresh_interval),
            min_move_distance: self.min_move_distance,
            min_angle_delta: self.min_angle_delta,
            obstacle_min_distance: self.obstacle_min_distance,
            robot_radius_factor: self.robot_radius_factor,
        }
    }
}
