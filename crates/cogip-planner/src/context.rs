//! 比赛上下文
//!
//! [`GameContext`] 由规划器持有并按引用传递：阵营、场地、策略、比分、
//! 倒计时，以及按索引引用的比赛物品（[`Supply`]）。
//! 物品只存放在这里，机器人和动作只保存 [`SupplyId`]。

use cogip_avoidance::{Table, TableKind, table::DEFAULT_FIXED_OBSTACLES};
use cogip_geometry::Vertex;
use cogip_protocol::{AvoidanceStrategy, CampColor, ControllerEnum, PathPose, RobotId, Strategy};

use crate::error::PlannerError;

/// 物品索引
pub type SupplyId = usize;

/// 可收集物品
#[derive(Debug, Clone, PartialEq)]
pub struct Supply {
    pub id: SupplyId,
    pub position: Vertex,
    pub enabled: bool,
    /// 正在前往收集的机器人
    pub claimed_by: Option<RobotId>,
    pub collected: bool,
    pub dropped: bool,
}

impl Supply {
    /// 可以被 `robot_id` 认领
    pub fn is_available_for(&self, robot_id: RobotId) -> bool {
        self.enabled
            && !self.collected
            && self.claimed_by.is_none_or(|owner| owner == robot_id)
    }
}

/// 投放区
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropZone {
    pub position: Vertex,
}

/// 每次投放得分
pub const SUPPLY_SCORE: i32 = 3;

/// 可选起始位置数
pub const START_POSITION_COUNT: u8 = 5;

/// 比赛上下文
#[derive(Debug, Clone)]
pub struct GameContext {
    pub camp: CampColor,
    pub table_kind: TableKind,
    pub strategy: Strategy,
    pub avoidance_strategy: AvoidanceStrategy,
    pub playing: bool,
    pub score: i32,
    /// 剩余时间（秒）
    pub countdown: u32,
    pub game_duration: u32,
    pub supplies: Vec<Supply>,
    pub drop_zones: Vec<DropZone>,
}

impl Default for GameContext {
    fn default() -> Self {
        Self::new(100)
    }
}

impl GameContext {
    pub fn new(game_duration: u32) -> Self {
        let mut context = Self {
            camp: CampColor::default(),
            table_kind: TableKind::default(),
            strategy: Strategy::default(),
            avoidance_strategy: AvoidanceStrategy::default(),
            playing: false,
            score: 0,
            countdown: game_duration,
            game_duration,
            supplies: Vec::new(),
            drop_zones: Vec::new(),
        };
        context.reset();
        context
    }

    /// 重置比赛状态（阵营、场地、策略保持不变）
    pub fn reset(&mut self) {
        self.playing = false;
        self.score = 0;
        self.countdown = self.game_duration;
        self.create_supplies();
    }

    /// 当前场地，固定障碍已按阵营镜像
    pub fn table(&self) -> Table {
        Table::new(self.table_kind, self.camp, &DEFAULT_FIXED_OBSTACLES)
    }

    pub fn default_controller(&self) -> ControllerEnum {
        self.strategy.default_controller()
    }

    /// 第 `n` 个起始位姿（1 起），已按阵营镜像
    pub fn start_pose(&self, n: u8) -> Result<PathPose, PlannerError> {
        let (x, y, o) = match n {
            1 => (225.0, -775.0, 0.0),
            2 => (225.0, -225.0, 0.0),
            3 => (2775.0, -775.0, 180.0),
            4 => (2775.0, -225.0, 180.0),
            5 => (1500.0, -775.0, 90.0),
            _ => return Err(PlannerError::InvalidStartPosition(n)),
        };
        Ok(PathPose::new(x, self.camp.adapt_y(y), self.camp.adapt_angle(Some(o))))
    }

    /// 在当前场地内的起始位置编号
    pub fn available_start_positions(&self) -> Vec<u8> {
        let table = self.table();
        (1..=START_POSITION_COUNT)
            .filter(|&n| {
                self.start_pose(n)
                    .is_ok_and(|pose| table.contains(&pose.vertex(), 0.0))
            })
            .collect()
    }

    /// 认领物品，已被其他机器人认领时返回 false
    pub fn claim_supply(&mut self, id: SupplyId, robot_id: RobotId) -> bool {
        match self.supplies.get_mut(id) {
            Some(supply) if supply.is_available_for(robot_id) => {
                supply.claimed_by = Some(robot_id);
                true
            },
            _ => false,
        }
    }

    /// 释放 `robot_id` 对物品的认领
    pub fn release_supply(&mut self, id: SupplyId, robot_id: RobotId) {
        if let Some(supply) = self.supplies.get_mut(id)
            && supply.claimed_by == Some(robot_id)
            && !supply.collected
        {
            supply.claimed_by = None;
        }
    }

    /// 物品以黄色阵营定义
    fn create_supplies(&mut self) {
        let camp = self.camp;
        let positions = [
            (1000.0, -500.0, true),
            (2000.0, -500.0, true),
            (1500.0, -250.0, true),
            (1000.0, 500.0, false),
            (2000.0, 500.0, false),
        ];
        self.supplies = positions
            .iter()
            .enumerate()
            .map(|(id, &(x, y, enabled))| Supply {
                id,
                position: Vertex::new(x, camp.adapt_y(y)),
                enabled,
                claimed_by: None,
                collected: false,
                dropped: false,
            })
            .collect();
        self.drop_zones = vec![DropZone {
            position: Vertex::new(2700.0, camp.adapt_y(-700.0)),
        }];
    }
}
