//! 规划器错误类型

use thiserror::Error;

use cogip_avoidance::AvoidanceError;
use cogip_protocol::{ProtocolError, RobotId};

/// 规划器错误
#[derive(Error, Debug)]
pub enum PlannerError {
    /// 配置值超出范围或类型错误
    #[error("Invalid property {name}: {reason}")]
    InvalidProperty { name: String, reason: String },

    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Avoidance error: {0}")]
    Avoidance(#[from] AvoidanceError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Unknown robot: {0}")]
    UnknownRobot(RobotId),

    #[error("Invalid start position: {0}")]
    InvalidStartPosition(u8),
}

impl PlannerError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidProperty {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::invalid("obstacle_radius", "must be within 100..=1000");
        assert_eq!(
            format!("{}", err),
            "Invalid property obstacle_radius: must be within 100..=1000"
        );
        assert_eq!(format!("{}", PlannerError::UnknownRobot(3)), "Unknown robot: 3");
        assert_eq!(
            format!("{}", PlannerError::UnknownProperty("foo".into())),
            "Unknown property: foo"
        );
    }
}
