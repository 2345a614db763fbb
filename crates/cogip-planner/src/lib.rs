//! 规划器模块
//!
//! 本模块提供比赛编排功能，包括：
//! - 动作模型（带权重的动作集合、位姿队列、生命周期钩子）
//! - 机器人会话（避障线程、指令发布、阻塞计数）
//! - 编排器（单任务事件循环、定时任务、命令与配置更新）
//! - 赛前向导
//!
//! # 数据流
//!
//! ```text
//! stdin ──▶ InboundRouter ──(pose_current / actuator_state)──▶ 共享状态
//!                 │
//!                 └──(其余事件)──▶ Planner ──▶ Outbox ──▶ stdout
//!                                     ▲
//!                      AvoidanceWorker┘
//! ```

pub mod actions;
pub mod actuators;
pub mod context;
mod error;
pub mod outbox;
pub mod planner;
pub mod pose;
pub mod properties;
pub mod robot;
pub mod router;
pub mod step;
pub mod wizard;

pub use actions::{Action, ActionCore, Actions, RobotView, WaitAction, strategy_actions};
pub use actuators::ActuatorStates;
pub use context::{GameContext, Supply, SupplyId};
pub use error::PlannerError;
pub use outbox::Outbox;
pub use planner::{Planner, TICK_PERIOD};
pub use pose::{HookContext, Pose, PoseHook};
pub use properties::Properties;
pub use robot::{PoseUpdate, Robot};
pub use router::{ContextRegistry, InboundRouter};
pub use step::Step;
pub use wizard::{GameWizard, WizardDecision, WizardState, WizardStep};
