//! 钩子返回的声明式步骤
//!
//! 钩子本身是同步的，只描述要做什么；由规划器按顺序执行，
//! 其中 `Actuator` 与 `Delay` 会挂起当前处理函数。

use std::time::Duration;

use cogip_protocol::{ActuatorCommand, AvoidanceStrategy, OutboundEvent, PathPose};

/// 钩子步骤
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// 原样发出一个出站事件
    Emit(OutboundEvent),
    /// 发送执行器指令并等待确认，最多等待 `settle`
    Actuator {
        command: ActuatorCommand,
        settle: Duration,
    },
    /// 固定延时
    Delay(Duration),
    /// 切换全局避障策略
    SetAvoidance(AvoidanceStrategy),
    /// 重新设置机器人起始位姿（标定后）
    PoseStart(PathPose),
    /// 加分
    AddScore(i32),
}

impl Step {
    /// 执行器动作：发送后等待 `settle`
    pub fn actuator(id: u16, position: i32, settle: Duration) -> Self {
        Self::Actuator {
            command: ActuatorCommand::new(id, position),
            settle,
        }
    }
}
