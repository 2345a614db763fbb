//! 避障层模块
//!
//! 本模块提供机器人避障的运行时部分，包括：
//! - 避障引擎（固定障碍缓存、动态障碍转换、退化情况处理）
//! - 每台机器人一个的路径刷新线程（固定周期运行引擎）
//! - 规划器与线程之间的共享状态（ArcSwap 快照，每个键只有一个写方向）
//! - 原子计数器指标
//!
//! # 数据流
//!
//! ```text
//! Planner ──(pose_current / pose_order / obstacles)──▶ AvoidanceContext.inputs
//!                                                       │
//!                                                 avoidance_loop
//!                                                       │
//! Planner ◀──(AvoidanceEvent over crossbeam)──── AvoidanceContext.outputs
//! ```

pub mod config;
pub mod context;
pub mod engine;
mod error;
pub mod metrics;
pub mod table;
pub mod worker;

pub use config::AvoidanceConfig;
pub use context::{AvoidanceContext, Fleet, ObstacleSnapshot, WorkerInputs, WorkerOutputs};
pub use engine::Avoidance;
pub use error::AvoidanceError;
pub use metrics::{AvoidanceMetrics, MetricsSnapshot};
pub use table::{Table, TableKind};
pub use worker::{AvoidanceEvent, AvoidanceWorker, PathUpdater, TickOutcome, WorkerMessage, avoidance_loop};
