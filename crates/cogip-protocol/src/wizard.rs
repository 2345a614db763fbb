//! 赛前向导消息

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::RobotId;

/// 向导输入类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardKind {
    Camp,
    ChoiceStr,
    ChoiceInteger,
    Boolean,
    Message,
}

/// 向导请求（发往看板）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WizardKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Value>,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robot_id: Option<RobotId>,
}

impl WizardRequest {
    pub fn new(name: impl Into<String>, kind: WizardKind, value: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            choices: Vec::new(),
            value,
            robot_id: None,
        }
    }

    pub fn with_choices(mut self, choices: Vec<Value>) -> Self {
        self.choices = choices;
        self
    }

    pub fn for_robot(mut self, robot_id: RobotId) -> Self {
        self.robot_id = Some(robot_id);
        self
    }
}

/// 向导应答（看板返回）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardResponse {
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub robot_id: Option<RobotId>,
}
