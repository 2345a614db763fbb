//! 带生命周期钩子的位姿
//!
//! [`Pose`] = 线上的 [`PathPose`] + 三个钩子：
//! - `before`：机器人开始前往该位姿前
//! - `after`：到达该位姿后
//! - `intermediate`：到达避障路径上的中间航点时
//!
//! 钩子同步执行，通过 [`HookContext`] 修改所属动作的位姿队列与比赛上下文，
//! 需要等待的动作以 [`Step`] 返回给规划器执行。

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use cogip_protocol::{CampColor, PathPose, RobotId};

use crate::context::{GameContext, SupplyId};
use crate::step::Step;

/// 钩子可访问的状态
pub struct HookContext<'a> {
    pub robot_id: RobotId,
    pub pose_current: Option<PathPose>,
    /// 机器人携带的物品
    pub carried: &'a mut Option<SupplyId>,
    pub game: &'a mut GameContext,
    /// 所属动作的位姿队列
    pub poses: &'a mut VecDeque<Pose>,
}

/// 位姿钩子，第一个参数为钩子所属的位姿
pub type PoseHook = Arc<dyn Fn(&Pose, &mut HookContext<'_>) -> Vec<Step> + Send + Sync>;

/// 动作中的位姿
#[derive(Clone, Default)]
pub struct Pose {
    pub pose: PathPose,
    before: Option<PoseHook>,
    after: Option<PoseHook>,
    intermediate: Option<PoseHook>,
}

impl fmt::Debug for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pose")
            .field("pose", &self.pose)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("intermediate", &self.intermediate.is_some())
            .finish()
    }
}

impl From<PathPose> for Pose {
    fn from(pose: PathPose) -> Self {
        Self {
            pose,
            ..Default::default()
        }
    }
}

impl Pose {
    pub fn new(x: f64, y: f64, o: Option<f64>) -> Self {
        PathPose::new(x, y, o).into()
    }

    /// 以黄色阵营定义的位姿，构造时按阵营镜像一次
    pub fn adapted(camp: CampColor, x: f64, y: f64, o: Option<f64>) -> Self {
        Self::new(x, camp.adapt_y(y), camp.adapt_angle(o))
    }

    /// 去掉钩子的线上形式
    pub fn path_pose(&self) -> PathPose {
        self.pose
    }

    pub fn with_speeds(mut self, linear: u8, angular: u8) -> Self {
        self.pose = self.pose.with_speeds(linear, angular);
        self
    }

    pub fn with_allow_reverse(mut self, allow_reverse: bool) -> Self {
        self.pose.allow_reverse = allow_reverse;
        self
    }

    pub fn with_bypass_anti_blocking(mut self, bypass: bool) -> Self {
        self.pose.bypass_anti_blocking = bypass;
        self
    }

    pub fn with_bypass_final_orientation(mut self, bypass: bool) -> Self {
        self.pose.bypass_final_orientation = bypass;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.pose.timeout_ms = timeout_ms;
        self
    }

    pub fn on_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Pose, &mut HookContext<'_>) -> Vec<Step> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    pub fn on_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Pose, &mut HookContext<'_>) -> Vec<Step> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }

    pub fn on_intermediate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Pose, &mut HookContext<'_>) -> Vec<Step> + Send + Sync + 'static,
    {
        self.intermediate = Some(Arc::new(hook));
        self
    }

    pub fn run_before(&self, ctx: &mut HookContext<'_>) -> Vec<Step> {
        self.before.as_ref().map(|hook| hook(self, ctx)).unwrap_or_default()
    }

    pub fn run_after(&self, ctx: &mut HookContext<'_>) -> Vec<Step> {
        self.after.as_ref().map(|hook| hook(self, ctx)).unwrap_or_default()
    }

    pub fn run_intermediate(&self, ctx: &mut HookContext<'_>) -> Vec<Step> {
        self.intermediate.as_ref().map(|hook| hook(self, ctx)).unwrap_or_default()
    }
}

/// 到达后把自身重新放回队尾（循环动作）
pub fn requeue_self(pose: &Pose, ctx: &mut HookContext<'_>) -> Vec<Step> {
    ctx.poses.push_back(pose.clone());
    Vec::new()
}
