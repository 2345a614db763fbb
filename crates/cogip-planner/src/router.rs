//! 入站路由
//!
//! 在读取侧直接处理高频事件，不经过规划器任务：
//! - `pose_current` 写入对应机器人的共享状态与全队位置
//! - `actuator_state` 写入执行器状态并唤醒等待者
//!
//! 这样规划器在等待执行器确认时，确认仍能到达。其余事件转发给规划器。

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use cogip_avoidance::{AvoidanceContext, Fleet};
use cogip_protocol::{InboundEvent, RobotId};

use crate::actuators::ActuatorStates;

/// 已连接机器人的共享状态表（规划器写，路由读）
#[derive(Debug, Default)]
pub struct ContextRegistry {
    contexts: RwLock<BTreeMap<RobotId, Arc<AvoidanceContext>>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, ctx: Arc<AvoidanceContext>) {
        self.contexts.write().insert(ctx.robot_id, ctx);
    }

    pub fn remove(&self, robot_id: RobotId) -> Option<Arc<AvoidanceContext>> {
        self.contexts.write().remove(&robot_id)
    }

    pub fn get(&self, robot_id: RobotId) -> Option<Arc<AvoidanceContext>> {
        self.contexts.read().get(&robot_id).cloned()
    }

    pub fn ids(&self) -> Vec<RobotId> {
        self.contexts.read().keys().copied().collect()
    }
}

/// 入站路由
#[derive(Debug, Clone)]
pub struct InboundRouter {
    registry: Arc<ContextRegistry>,
    fleet: Arc<Fleet>,
    actuators: Arc<ActuatorStates>,
    planner_tx: UnboundedSender<InboundEvent>,
}

impl InboundRouter {
    pub fn new(
        registry: Arc<ContextRegistry>,
        fleet: Arc<Fleet>,
        actuators: Arc<ActuatorStates>,
        planner_tx: UnboundedSender<InboundEvent>,
    ) -> Self {
        Self {
            registry,
            fleet,
            actuators,
            planner_tx,
        }
    }

    /// 处理一个入站事件；规划器已退出时返回 false
    pub fn route(&self, event: InboundEvent) -> bool {
        match event {
            InboundEvent::PoseCurrent { robot_id, pose } => {
                match self.registry.get(robot_id) {
                    Some(ctx) => {
                        trace!("Robot {}: pose current {:?}", robot_id, pose);
                        ctx.inputs.set_pose_current(Some(pose));
                        self.fleet.update(robot_id, Some(pose.vertex()));
                    },
                    None => debug!("Robot {}: pose current for unknown robot", robot_id),
                }
                true
            },
            InboundEvent::ActuatorState { robot_id, state } => {
                self.actuators.update(robot_id, state);
                true
            },
            event => self.planner_tx.send(event).is_ok(),
        }
    }
}
