//! 场地
//!
//! 场地为矩形边界加固定障碍列表。固定障碍以黄色阵营定义，
//! 在构造 [`Table`] 时按阵营镜像一次。

use serde::{Deserialize, Serialize};

use cogip_geometry::{Bounds, Vertex};
use cogip_protocol::{CampColor, StaticObstacle};

/// 可选场地
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TableKind {
    /// 训练场地（半场）
    Training,
    /// 比赛场地
    #[default]
    Game,
}

impl TableKind {
    pub fn bounds(self) -> Bounds {
        match self {
            Self::Training => Bounds::new(1500.0, 3000.0, -1000.0, 0.0),
            Self::Game => Bounds::new(0.0, 3000.0, -1000.0, 1000.0),
        }
    }
}

/// 黄色阵营下的固定障碍
pub const DEFAULT_FIXED_OBSTACLES: [StaticObstacle; 2] = [
    StaticObstacle::new(1000.0 - 450.0, 1.0, 0.0, 450.0, 450.0),
    StaticObstacle::new(1000.0 - 225.0, 800.0, 0.0, 450.0, 450.0),
];

/// 场地：边界 + 已按阵营镜像的固定障碍
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub kind: TableKind,
    pub bounds: Bounds,
    pub fixed_obstacles: Vec<StaticObstacle>,
}

impl Table {
    pub fn new(kind: TableKind, camp: CampColor, fixed_obstacles: &[StaticObstacle]) -> Self {
        Self {
            kind,
            bounds: kind.bounds(),
            fixed_obstacles: fixed_obstacles.iter().map(|o| o.adapted(camp)).collect(),
        }
    }

    /// 不含固定障碍的场地
    pub fn empty(kind: TableKind) -> Self {
        Self::new(kind, CampColor::default(), &[])
    }

    /// 点是否位于边界内（四边各收缩 `margin`）
    pub fn contains(&self, point: &Vertex, margin: f64) -> bool {
        self.bounds.shrink(margin).contains(point)
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new(TableKind::Game, CampColor::default(), &DEFAULT_FIXED_OBSTACLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_bounds() {
        let training = Table::empty(TableKind::Training);
        assert!(training.contains(&Vertex::new(2000.0, -500.0), 0.0));
        assert!(!training.contains(&Vertex::new(1000.0, -500.0), 0.0));
        assert!(!training.contains(&Vertex::new(1550.0, -500.0), 100.0));

        let game = Table::empty(TableKind::Game);
        assert!(game.contains(&Vertex::new(225.0, -775.0), 0.0));
    }

    #[test]
    fn test_fixed_obstacles_mirrored_once() {
        let yellow = Table::new(TableKind::Game, CampColor::Yellow, &DEFAULT_FIXED_OBSTACLES);
        let blue = Table::new(TableKind::Game, CampColor::Blue, &DEFAULT_FIXED_OBSTACLES);
        assert_eq!(yellow.fixed_obstacles[1].y, 800.0);
        assert_eq!(blue.fixed_obstacles[1].y, -800.0);
        assert_eq!(blue.fixed_obstacles[0].x, yellow.fixed_obstacles[0].x);
    }
}
