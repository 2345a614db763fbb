//! 入站/出站事件
//!
//! 每个事件编码为一行 JSON：`{"event": "<name>", "data": {...}}`。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cogip_geometry::Vertex;

use crate::RobotId;
use crate::actuator::{ActuatorCommand, ActuatorState};
use crate::enums::ControllerEnum;
use crate::error::ProtocolError;
use crate::obstacle::DynObstacle;
use crate::pose::PathPose;
use crate::wizard::{WizardRequest, WizardResponse};

/// 检测器上报的单个障碍：完整的动态障碍，或仅有中心点
///
/// 仅有中心点时由规划器按配置的半径与包围多边形参数补全。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObstacleReport {
    Obstacle(DynObstacle),
    Point(Vertex),
}

/// 入站事件（固件、检测器、看板 → 规划器）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    PoseCurrent {
        robot_id: RobotId,
        pose: PathPose,
    },
    PoseReached {
        robot_id: RobotId,
    },
    Obstacles {
        robot_id: RobotId,
        obstacles: Vec<ObstacleReport>,
    },
    ActuatorState {
        robot_id: RobotId,
        state: ActuatorState,
    },
    StarterChanged {
        robot_id: RobotId,
        pushed: bool,
    },
    ConfigUpdated {
        name: String,
        value: Value,
    },
    WizardResponse(WizardResponse),
    RobotConnected {
        robot_id: RobotId,
    },
    RobotDisconnected {
        robot_id: RobotId,
    },
    Command {
        cmd: String,
    },
    Reset,
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PoseCurrent { .. } => "pose_current",
            Self::PoseReached { .. } => "pose_reached",
            Self::Obstacles { .. } => "obstacles",
            Self::ActuatorState { .. } => "actuator_state",
            Self::StarterChanged { .. } => "starter_changed",
            Self::ConfigUpdated { .. } => "config_updated",
            Self::WizardResponse(_) => "wizard_response",
            Self::RobotConnected { .. } => "robot_connected",
            Self::RobotDisconnected { .. } => "robot_disconnected",
            Self::Command { .. } => "command",
            Self::Reset => "reset",
        }
    }
}

/// 出站事件（规划器 → 固件、看板）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    PoseStart {
        robot_id: RobotId,
        pose: PathPose,
    },
    PoseOrder {
        robot_id: RobotId,
        pose: PathPose,
    },
    Path {
        robot_id: RobotId,
        path: Vec<Vertex>,
    },
    SetController {
        robot_id: RobotId,
        controller: ControllerEnum,
    },
    Blocked {
        robot_id: RobotId,
    },
    ActuatorCommand {
        robot_id: RobotId,
        command: ActuatorCommand,
    },
    Wizard(WizardRequest),
    CloseWizard,
    Score {
        score: i32,
    },
    Obstacles {
        obstacles: Vec<DynObstacle>,
    },
    /// 配置描述（含当前值），供看板生成表单
    Config(Value),
}

impl OutboundEvent {
    /// 事件所属机器人（广播事件返回 `None`）
    pub fn robot_id(&self) -> Option<RobotId> {
        match self {
            Self::PoseStart { robot_id, .. }
            | Self::PoseOrder { robot_id, .. }
            | Self::Path { robot_id, .. }
            | Self::SetController { robot_id, .. }
            | Self::Blocked { robot_id }
            | Self::ActuatorCommand { robot_id, .. } => Some(*robot_id),
            Self::Wizard(request) => request.robot_id,
            Self::CloseWizard | Self::Score { .. } | Self::Obstacles { .. } | Self::Config(_) => None,
        }
    }
}

/// 解析一行入站 JSON
pub fn decode_inbound(line: &str) -> Result<InboundEvent, ProtocolError> {
    Ok(serde_json::from_str(line.trim())?)
}

/// 编码一个出站事件为单行 JSON
pub fn encode_outbound(event: &OutboundEvent) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(event)?)
}
