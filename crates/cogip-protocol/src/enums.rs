//! 控制器、避障策略、比赛策略与阵营颜色
//!
//! 控制器与避障策略在消息中以整数编码（`num_enum`），比赛策略与阵营以名称编码。

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// 固件运动控制器
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive,
)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ControllerEnum {
    /// 四环 PID（默认）
    #[default]
    QuadPid = 0,
    /// 角速度标定
    AngularSpeedTest = 1,
    /// 线速度标定
    LinearSpeedTest = 2,
    /// 线性位姿控制关闭（仅朝向+速度）
    LinearPoseDisabled = 3,
}

impl ControllerEnum {
    /// 从 u8 转换，无效值返回 `QuadPid`
    pub fn from_u8(value: u8) -> Self {
        Self::try_from(value).unwrap_or_default()
    }

    pub fn as_u8(self) -> u8 {
        self.into()
    }
}

/// 避障策略：选择规划方式与下游控制器的组合
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, IntoPrimitive, TryFromPrimitive,
)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum AvoidanceStrategy {
    /// 不避障，直接驶向目标
    Disabled = 0,
    /// 可视图规划 + 四环 PID
    #[default]
    VisibilityRoadMapQuadPid = 1,
    /// 可视图规划 + 线性位姿关闭的控制器
    VisibilityRoadMapLinearPoseDisabled = 2,
    /// 只接受直线路径，需要绕行时停车等待
    StopAndGo = 3,
}

impl AvoidanceStrategy {
    pub const ALL: [AvoidanceStrategy; 4] = [
        Self::Disabled,
        Self::VisibilityRoadMapQuadPid,
        Self::VisibilityRoadMapLinearPoseDisabled,
        Self::StopAndGo,
    ];

    /// 从 u8 转换，无效值返回 `Disabled`
    pub fn from_u8(value: u8) -> Self {
        Self::try_from(value).unwrap_or(Self::Disabled)
    }

    pub fn as_u8(self) -> u8 {
        self.into()
    }

    /// 中间航段使用的控制器
    pub fn intermediate_controller(self) -> ControllerEnum {
        match self {
            Self::VisibilityRoadMapLinearPoseDisabled => ControllerEnum::LinearPoseDisabled,
            _ => ControllerEnum::QuadPid,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::VisibilityRoadMapQuadPid => "VisibilityRoadMapQuadPid",
            Self::VisibilityRoadMapLinearPoseDisabled => "VisibilityRoadMapLinearPoseDisabled",
            Self::StopAndGo => "StopAndGo",
        }
    }
}

impl fmt::Display for AvoidanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AvoidanceStrategy {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| ProtocolError::UnknownName {
                kind: "avoidance strategy",
                name: s.to_string(),
            })
    }
}

/// 比赛策略（决定动作集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    Approval,
    Game,
    #[default]
    BackAndForth,
    AngularSpeedTest,
    LinearSpeedTest,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Self::Approval,
        Self::Game,
        Self::BackAndForth,
        Self::AngularSpeedTest,
        Self::LinearSpeedTest,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Approval => "Approval",
            Self::Game => "Game",
            Self::BackAndForth => "BackAndForth",
            Self::AngularSpeedTest => "AngularSpeedTest",
            Self::LinearSpeedTest => "LinearSpeedTest",
        }
    }

    /// 速度标定策略（避障线程跳过规划）
    pub fn is_speed_test(self) -> bool {
        matches!(self, Self::AngularSpeedTest | Self::LinearSpeedTest)
    }

    /// 该策略下的默认控制器
    pub fn default_controller(self) -> ControllerEnum {
        match self {
            Self::AngularSpeedTest => ControllerEnum::AngularSpeedTest,
            Self::LinearSpeedTest => ControllerEnum::LinearSpeedTest,
            _ => ControllerEnum::QuadPid,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| ProtocolError::UnknownName {
                kind: "strategy",
                name: s.to_string(),
            })
    }
}

/// 阵营颜色
///
/// 所有静态位置都以黄色阵营定义；蓝色阵营对 Y 和角度取反。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampColor {
    Blue,
    #[default]
    Yellow,
}

impl CampColor {
    pub fn name(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Yellow => "yellow",
        }
    }

    pub fn adapt_y(self, y: f64) -> f64 {
        match self {
            Self::Yellow => y,
            Self::Blue => -y,
        }
    }

    pub fn adapt_angle(self, angle: Option<f64>) -> Option<f64> {
        match self {
            Self::Yellow => angle,
            Self::Blue => angle.map(|a| -a),
        }
    }
}

impl FromStr for CampColor {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blue" => Ok(Self::Blue),
            "yellow" => Ok(Self::Yellow),
            _ => Err(ProtocolError::UnknownName {
                kind: "camp",
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_wire_encoding() {
        assert_eq!(serde_json::to_string(&ControllerEnum::LinearPoseDisabled).unwrap(), "3");
        let decoded: ControllerEnum = serde_json::from_str("1").unwrap();
        assert_eq!(decoded, ControllerEnum::AngularSpeedTest);
        assert!(serde_json::from_str::<ControllerEnum>("7").is_err());
        assert_eq!(ControllerEnum::from_u8(42), ControllerEnum::QuadPid);
    }

    #[test]
    fn test_avoidance_strategy_conversions() {
        assert_eq!(AvoidanceStrategy::from_u8(3), AvoidanceStrategy::StopAndGo);
        assert_eq!(AvoidanceStrategy::from_u8(200), AvoidanceStrategy::Disabled);
        assert_eq!(
            "VisibilityRoadMapLinearPoseDisabled".parse::<AvoidanceStrategy>().unwrap(),
            AvoidanceStrategy::VisibilityRoadMapLinearPoseDisabled
        );
        assert!("Nope".parse::<AvoidanceStrategy>().is_err());
        assert_eq!(
            AvoidanceStrategy::VisibilityRoadMapLinearPoseDisabled.intermediate_controller(),
            ControllerEnum::LinearPoseDisabled
        );
        assert_eq!(
            AvoidanceStrategy::StopAndGo.intermediate_controller(),
            ControllerEnum::QuadPid
        );
    }

    #[test]
    fn test_strategy_default_controller() {
        assert_eq!(
            Strategy::AngularSpeedTest.default_controller(),
            ControllerEnum::AngularSpeedTest
        );
        assert_eq!(
            Strategy::LinearSpeedTest.default_controller(),
            ControllerEnum::LinearSpeedTest
        );
        assert_eq!(Strategy::Game.default_controller(), ControllerEnum::QuadPid);
        assert!(Strategy::LinearSpeedTest.is_speed_test());
        assert!(!Strategy::Approval.is_speed_test());
        assert_eq!("Game".parse::<Strategy>().unwrap(), Strategy::Game);
        assert_eq!(serde_json::to_string(&Strategy::BackAndForth).unwrap(), "\"BackAndForth\"");
    }

    #[test]
    fn test_camp_mirroring() {
        assert_eq!(CampColor::Yellow.adapt_y(-775.0), -775.0);
        assert_eq!(CampColor::Blue.adapt_y(-775.0), 775.0);
        assert_eq!(CampColor::Blue.adapt_angle(Some(90.0)), Some(-90.0));
        assert_eq!(CampColor::Blue.adapt_angle(None), None);
        assert_eq!("Blue".parse::<CampColor>().unwrap(), CampColor::Blue);
        assert_eq!(serde_json::to_string(&CampColor::Yellow).unwrap(), "\"yellow\"");
        assert_eq!(CampColor::default(), CampColor::Yellow);
    }
}
