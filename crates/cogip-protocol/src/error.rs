//! 协议层错误类型定义

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// JSON 解析失败（格式错误或字段缺失）
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// 未知的控制器编号
    #[error("Unknown controller: {0}")]
    UnknownController(u8),

    /// 未知的避障策略编号
    #[error("Unknown avoidance strategy: {0}")]
    UnknownAvoidanceStrategy(u8),

    /// 未知的名称（策略、阵营等）
    #[error("Unknown {kind}: {name}")]
    UnknownName { kind: &'static str, name: String },
}
