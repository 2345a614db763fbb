//! 几何层错误类型定义

use thiserror::Error;

/// 几何层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// 多边形顶点数不足（去重后至少 3 个）
    #[error("Polygon needs at least 3 distinct vertices, got {count}")]
    NotEnoughVertices { count: usize },

    /// 坐标包含 NaN 或无穷大
    #[error("Non-finite coordinate: ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },

    /// 外扩距离非法（负数或非有限值）
    #[error("Invalid expand distance: {0}")]
    InvalidExpand(f64),

    /// 多边形面积为零（所有顶点共线）
    #[error("Degenerate polygon (zero area)")]
    Degenerate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_display() {
        let msg = format!("{}", GeometryError::NotEnoughVertices { count: 2 });
        assert!(msg.contains("at least 3"), "{}", msg);
        assert!(msg.contains('2'));

        let msg = format!("{}", GeometryError::InvalidExpand(-1.0));
        assert!(msg.contains("-1"), "{}", msg);

        let msg = format!("{}", GeometryError::Degenerate);
        assert!(msg.contains("zero area"));
    }
}
