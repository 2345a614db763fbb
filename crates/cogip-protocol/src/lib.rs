//! # COGIP Protocol
//!
//! 规划器与外部协作方（固件桥、检测器、看板）之间交换的数据模型（无 IO 依赖）
//!
//! ## 模块
//!
//! - `pose`: 路径位姿 `PathPose`
//! - `obstacle`: 静态矩形障碍与动态障碍
//! - `enums`: 控制器、避障策略、比赛策略、阵营颜色
//! - `actuator`: 执行器命令与状态
//! - `wizard`: 赛前向导消息
//! - `event`: 入站/出站事件及 JSON 编解码
//!
//! ## 单位
//!
//! 坐标为毫米（`f64`），角度为度（°），速度为机器人最大速度的百分比。

pub mod actuator;
pub mod enums;
mod error;
pub mod event;
pub mod obstacle;
pub mod pose;
pub mod wizard;

pub use actuator::{ActuatorCommand, ActuatorState};
pub use cogip_geometry::Vertex;
pub use enums::{AvoidanceStrategy, CampColor, ControllerEnum, Strategy};
pub use error::ProtocolError;
pub use event::{InboundEvent, ObstacleReport, OutboundEvent, decode_inbound, encode_outbound};
pub use obstacle::{DynObstacle, DynRectObstacle, DynRoundObstacle, StaticObstacle};
pub use pose::{PathPose, SpeedEnum};
pub use wizard::{WizardKind, WizardRequest, WizardResponse};

/// 机器人编号
pub type RobotId = u8;
