//! 避障层错误类型定义

use cogip_geometry::GeometryError;
use std::time::Duration;
use thiserror::Error;

/// 避障层错误类型
#[derive(Error, Debug)]
pub enum AvoidanceError {
    /// 几何错误（障碍多边形非法）
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// 线程创建失败
    #[error("Failed to spawn avoidance thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// 事件通道已关闭（规划器退出）
    #[error("Event channel closed")]
    ChannelClosed,

    /// 线程在退出前 panic
    #[error("Avoidance thread panicked")]
    WorkerPanicked,

    /// 线程未在限定时间内退出
    #[error("Avoidance thread did not exit within {0:?}")]
    JoinTimeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avoidance_error_display() {
        let err = AvoidanceError::from(GeometryError::NotEnoughVertices { count: 1 });
        let msg = format!("{}", err);
        assert!(msg.starts_with("Geometry error"), "{}", msg);

        let err = AvoidanceError::from(std::io::Error::other("no threads"));
        assert!(format!("{}", err).contains("no threads"));

        assert_eq!(format!("{}", AvoidanceError::ChannelClosed), "Event channel closed");
        let err = AvoidanceError::JoinTimeout(Duration::from_secs(2));
        assert_eq!(format!("{}", err), "Avoidance thread did not exit within 2s");
    }
}
