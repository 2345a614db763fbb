//! 执行器命令与状态

use serde::{Deserialize, Serialize};

/// 执行器命令（发往固件）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    /// 执行器编号
    pub id: u16,
    /// 目标位置（执行器自身单位）
    pub position: i32,
}

/// 执行器状态（固件上报）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub id: u16,
    pub position: i32,
}

impl ActuatorCommand {
    pub const fn new(id: u16, position: i32) -> Self {
        Self { id, position }
    }

    /// 上报状态是否确认了本命令
    pub fn is_acknowledged_by(&self, state: &ActuatorState) -> bool {
        self.id == state.id && self.position == state.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledgement() {
        let command = ActuatorCommand::new(3, 120);
        assert!(command.is_acknowledged_by(&ActuatorState { id: 3, position: 120 }));
        assert!(!command.is_acknowledged_by(&ActuatorState { id: 3, position: 100 }));
        assert!(!command.is_acknowledged_by(&ActuatorState { id: 4, position: 120 }));
    }
}
