//! 比赛编排器
//!
//! [`Planner`] 在单个 tokio 任务中运行，依次处理：
//! - 入站事件（由 [`InboundRouter`] 转发的慢路径事件）
//! - 避障线程事件（crossbeam 通道经桥接线程转入 tokio）
//! - 100ms 定时器（线程存活检查、等待到期、重新调度、障碍广播、倒计时）
//!
//! 每个处理函数执行到底；钩子产生的 [`Step`] 可能挂起当前处理函数
//! （执行器确认、固定延时），期间位姿与执行器状态仍由路由器直接写入。

use crossbeam_channel::{Receiver, Sender};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use cogip_avoidance::{AvoidanceEvent, Fleet, WorkerMessage};
use cogip_protocol::{
    AvoidanceStrategy, DynObstacle, DynRoundObstacle, InboundEvent, ObstacleReport, OutboundEvent,
    PathPose, RobotId, WizardResponse,
};
use serde_json::Value;

use crate::actions::{Actions, strategy_actions};
use crate::actuators::ActuatorStates;
use crate::context::GameContext;
use crate::error::PlannerError;
use crate::outbox::Outbox;
use crate::properties::Properties;
use crate::robot::{PoseUpdate, Robot};
use crate::router::{ContextRegistry, InboundRouter};
use crate::step::Step;
use crate::wizard::{GameWizard, WizardDecision, WizardState};

/// 定时器周期
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// 一次调度中最多连续尝试的动作数
const MAX_SCHEDULE_ATTEMPTS: usize = 4;

/// 比赛编排器
pub struct Planner {
    properties: Properties,
    game: GameContext,
    robots: BTreeMap<RobotId, Robot>,
    actions: Actions,
    /// 各机器人选择的起始位置编号
    start_positions: BTreeMap<RobotId, u8>,
    /// 各机器人检测到的障碍
    obstacles: BTreeMap<RobotId, Vec<DynObstacle>>,
    fleet: Arc<Fleet>,
    registry: Arc<ContextRegistry>,
    actuators: Arc<ActuatorStates>,
    outbox: Arc<Outbox>,
    worker_tx: Sender<WorkerMessage>,
    worker_rx: Receiver<WorkerMessage>,
    wizard: GameWizard,
    reschedule: BTreeSet<RobotId>,
    last_obstacle_broadcast: Instant,
    last_countdown: Instant,
}

impl Planner {
    pub fn new(properties: Properties) -> Self {
        let (worker_tx, worker_rx) = crossbeam_channel::unbounded();
        let game = GameContext::new(properties.game_duration);
        let actions = strategy_actions(game.strategy, &game);
        let now = Instant::now();
        Self {
            properties,
            game,
            robots: BTreeMap::new(),
            actions,
            start_positions: BTreeMap::new(),
            obstacles: BTreeMap::new(),
            fleet: Arc::new(Fleet::new()),
            registry: Arc::new(ContextRegistry::new()),
            actuators: Arc::new(ActuatorStates::new()),
            outbox: Arc::new(Outbox::new()),
            worker_tx,
            worker_rx,
            wizard: GameWizard::new(),
            reschedule: BTreeSet::new(),
            last_obstacle_broadcast: now,
            last_countdown: now,
        }
    }

    /// 创建入站路由，慢路径事件发往 `planner_tx`
    pub fn router(&self, planner_tx: mpsc::UnboundedSender<InboundEvent>) -> InboundRouter {
        InboundRouter::new(
            self.registry.clone(),
            self.fleet.clone(),
            self.actuators.clone(),
            planner_tx,
        )
    }

    pub fn outbox(&self) -> Arc<Outbox> {
        self.outbox.clone()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn game(&self) -> &GameContext {
        &self.game
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    pub fn robot(&self, robot_id: RobotId) -> Option<&Robot> {
        self.robots.get(&robot_id)
    }

    pub fn robot_ids(&self) -> Vec<RobotId> {
        self.robots.keys().copied().collect()
    }

    pub fn wizard(&self) -> &GameWizard {
        &self.wizard
    }

    pub fn fleet(&self) -> &Arc<Fleet> {
        &self.fleet
    }

    /// 避障线程事件（测试中可直接轮询）
    pub fn worker_events(&self) -> &Receiver<WorkerMessage> {
        &self.worker_rx
    }

    /// 主循环：直到 `shutdown` 置位或入站通道关闭
    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<InboundEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), PlannerError> {
        let (bridge_tx, mut worker_events) = mpsc::unbounded_channel();
        let bridge_rx = self.worker_rx.clone();
        thread::Builder::new()
            .name("worker-bridge".to_string())
            .spawn(move || {
                while let Ok(message) = bridge_rx.recv() {
                    if bridge_tx.send(message).is_err() {
                        break;
                    }
                }
            })?;

        let mut ticker = tokio::time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Planner started");

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                },
                event = inbound.recv() => match event {
                    Some(event) => self.handle_inbound(event).await,
                    None => break,
                },
                Some(message) = worker_events.recv() => self.handle_worker_message(message).await,
                _ = ticker.tick() => self.on_tick(Instant::now()).await,
            }
        }

        self.shutdown();
        Ok(())
    }

    /// 停止所有避障线程并关闭发件箱
    pub fn shutdown(&mut self) {
        info!("Planner stopping");
        let ids = self.robot_ids();
        for robot_id in ids {
            self.remove_robot(robot_id);
        }
        self.outbox.close();
    }

    pub async fn handle_inbound(&mut self, event: InboundEvent) {
        trace!("Inbound event: {}", event.name());
        match event {
            InboundEvent::PoseCurrent { robot_id, pose } => {
                if let Some(robot) = self.robots.get(&robot_id) {
                    robot.context().inputs.set_pose_current(Some(pose));
                    self.fleet.update(robot_id, Some(pose.vertex()));
                }
            },
            InboundEvent::ActuatorState { robot_id, state } => self.actuators.update(robot_id, state),
            InboundEvent::PoseReached { robot_id } => self.pose_reached(robot_id).await,
            InboundEvent::Obstacles { robot_id, obstacles } => self.set_obstacles(robot_id, obstacles),
            InboundEvent::StarterChanged { robot_id, pushed } => self.starter_changed(robot_id, pushed).await,
            InboundEvent::ConfigUpdated { name, value } => self.update_config(&name, &value),
            InboundEvent::WizardResponse(response) => self.wizard_response(response).await,
            InboundEvent::RobotConnected { robot_id } => {
                if let Err(e) = self.add_robot(robot_id) {
                    error!("Robot {}: failed to connect: {}", robot_id, e);
                }
            },
            InboundEvent::RobotDisconnected { robot_id } => self.remove_robot(robot_id),
            InboundEvent::Command { cmd } => self.command(&cmd).await,
            InboundEvent::Reset => {
                self.reset();
                if self.wizard.is_active() {
                    self.start_wizard();
                }
            },
        }
    }

    pub async fn handle_worker_message(&mut self, message: WorkerMessage) {
        let WorkerMessage { robot_id, event } = message;
        let Some(robot) = self.robots.get_mut(&robot_id) else {
            debug!("Robot {}: dropping worker event for unknown robot", robot_id);
            return;
        };
        match event {
            AvoidanceEvent::Path(path) => {
                let vertices = robot
                    .pose_current()
                    .into_iter()
                    .chain(path.iter().copied())
                    .map(|p| p.vertex())
                    .collect();
                robot.set_last_path(path);
                self.outbox.push(OutboundEvent::Path {
                    robot_id,
                    path: vertices,
                });
            },
            AvoidanceEvent::PoseOrder(pose) => {
                self.outbox.push(OutboundEvent::PoseOrder { robot_id, pose });
            },
            AvoidanceEvent::SetController(controller) => {
                self.outbox.push(OutboundEvent::SetController { robot_id, controller });
            },
            AvoidanceEvent::Blocked => {
                self.outbox.push(OutboundEvent::Blocked { robot_id });
                if robot.on_blocked(self.properties.blocked_retry_threshold)
                    && let Some(action) = robot.recycle_action(&mut self.game)
                {
                    self.actions.push(action);
                    self.reschedule.insert(robot_id);
                }
            },
        }
    }

    /// 定时任务
    pub async fn on_tick(&mut self, now: Instant) {
        for robot in self.robots.values_mut() {
            if !robot.is_worker_alive() {
                warn!("Robot {}: avoidance worker died, respawning", robot.robot_id());
                if let Err(e) = robot.start_worker(self.worker_tx.clone()) {
                    error!("Robot {}: failed to respawn avoidance worker: {}", robot.robot_id(), e);
                }
            }
        }

        let expired: Vec<RobotId> = self
            .robots
            .values()
            .filter(|r| r.wait_expired(now))
            .map(|r| r.robot_id())
            .collect();
        for robot_id in expired {
            if let Some(robot) = self.robots.get_mut(&robot_id) {
                let update = robot.finish_wait(&mut self.game);
                self.apply_update(robot_id, update).await;
                self.reschedule.insert(robot_id);
            }
        }

        let pending = std::mem::take(&mut self.reschedule);
        if self.game.playing {
            for robot_id in pending {
                self.schedule(robot_id).await;
            }
        }

        if now.duration_since(self.last_obstacle_broadcast) >= self.properties.obstacle_sender_period() {
            self.last_obstacle_broadcast = now;
            self.outbox.push(OutboundEvent::Obstacles {
                obstacles: self.all_obstacles(),
            });
        }

        if self.game.playing && now.duration_since(self.last_countdown) >= COUNTDOWN_PERIOD {
            self.last_countdown = now;
            self.game.countdown = self.game.countdown.saturating_sub(1);
            if self.game.countdown == 0 {
                self.end_game();
            }
        }
    }

    /// 连接机器人：创建会话、设置起始位姿并启动避障线程
    ///
    /// 已存在的同编号机器人会先被移除。
    pub fn add_robot(&mut self, robot_id: RobotId) -> Result<(), PlannerError> {
        if self.robots.contains_key(&robot_id) {
            self.remove_robot(robot_id);
        }
        let position = self.start_positions.get(&robot_id).copied().unwrap_or(robot_id);
        let start = self.game.start_pose(position).or_else(|_| self.game.start_pose(1))?;

        let mut robot = Robot::new(
            robot_id,
            self.properties.to_avoidance_config(),
            self.fleet.clone(),
            self.game.table(),
        );
        let ctx = robot.context().clone();
        ctx.inputs.set_avoidance_strategy(self.game.avoidance_strategy);
        ctx.inputs.set_default_controller(self.game.default_controller());
        ctx.inputs.set_speed_test(self.game.strategy.is_speed_test());
        ctx.inputs.obstacles.store(Arc::new(self.all_obstacles()));
        robot.set_pose_start(start);
        robot.start_worker(self.worker_tx.clone())?;

        self.fleet.update(robot_id, Some(start.vertex()));
        self.registry.insert(ctx);
        self.robots.insert(robot_id, robot);
        self.outbox.push(OutboundEvent::PoseStart { robot_id, pose: start });
        self.outbox.push(OutboundEvent::SetController {
            robot_id,
            controller: self.game.default_controller(),
        });
        info!("Robot {}: connected at start position {}", robot_id, position);
        Ok(())
    }

    pub fn remove_robot(&mut self, robot_id: RobotId) {
        let Some(mut robot) = self.robots.remove(&robot_id) else {
            return;
        };
        robot.stop_worker();
        self.registry.remove(robot_id);
        self.fleet.update(robot_id, None);
        self.obstacles.remove(&robot_id);
        self.actuators.clear_robot(robot_id);
        self.reschedule.remove(&robot_id);
        info!("Robot {}: disconnected", robot_id);
    }

    /// 重置比赛：停止所有线程，重建动作集合，按原编号重新连接机器人
    pub fn reset(&mut self) {
        info!("Planner reset");
        self.game.reset();
        self.actions = strategy_actions(self.game.strategy, &self.game);
        self.reschedule.clear();

        // 启动拉绳是硬件状态，重置后保留
        let starters: Vec<(RobotId, bool)> = self
            .robots
            .values()
            .map(|r| (r.robot_id(), r.starter_pushed()))
            .collect();
        for &(robot_id, _) in &starters {
            self.remove_robot(robot_id);
        }
        for (robot_id, pushed) in starters {
            if let Err(e) = self.add_robot(robot_id) {
                error!("Robot {}: failed to reconnect after reset: {}", robot_id, e);
                continue;
            }
            if let Some(robot) = self.robots.get_mut(&robot_id) {
                robot.set_starter(pushed);
            }
        }
        self.outbox.push(OutboundEvent::Score { score: self.game.score });
    }

    pub async fn command(&mut self, cmd: &str) {
        info!("Command: {}", cmd);
        match cmd {
            "play" => self.play().await,
            "stop" => {
                self.game.playing = false;
            },
            "next" => self.next().await,
            "reset" => {
                self.reset();
                if self.wizard.is_active() {
                    self.start_wizard();
                }
            },
            "wizard" => self.start_wizard(),
            "config" => self.outbox.push(OutboundEvent::Config(self.properties.schema())),
            _ => warn!("Unknown command: {}", cmd),
        }
    }

    async fn play(&mut self) {
        if self.game.playing {
            return;
        }
        self.game.playing = true;
        self.last_countdown = Instant::now();
        info!("Game started ({}s)", self.game.countdown);
        for robot_id in self.robot_ids() {
            self.pose_reached(robot_id).await;
        }
    }

    /// 单步模式：所有机器人都到达后，再前进一个位姿
    async fn next(&mut self) {
        if self.game.playing {
            return;
        }
        if !self.robots.values().all(|r| r.is_pose_reached()) {
            debug!("Next ignored: not all robots reached their pose");
            return;
        }
        for robot_id in self.robot_ids() {
            self.schedule(robot_id).await;
        }
    }

    fn end_game(&mut self) {
        self.game.playing = false;
        info!("Game over, score {}", self.game.score);
        for robot in self.robots.values_mut() {
            if let Some(action) = robot.park() {
                self.actions.push(action);
            }
        }
        self.outbox.push(OutboundEvent::Score { score: self.game.score });
    }

    async fn pose_reached(&mut self, robot_id: RobotId) {
        let Some(robot) = self.robots.get_mut(&robot_id) else {
            debug!("Robot {}: pose reached for unknown robot", robot_id);
            return;
        };
        let update = robot.set_pose_reached(&mut self.game);
        let reached = robot.is_pose_reached();
        self.apply_update(robot_id, update).await;
        if reached && self.game.playing {
            self.schedule(robot_id).await;
        }
    }

    /// 给机器人取下一个位姿，必要时选择新动作
    async fn schedule(&mut self, robot_id: RobotId) {
        for _ in 0..MAX_SCHEDULE_ATTEMPTS {
            let Some(robot) = self.robots.get_mut(&robot_id) else {
                return;
            };
            if robot.is_parked() || robot.is_waiting() {
                return;
            }
            if robot.has_action() {
                let update = robot.next_pose(&mut self.game);
                let has_order = update.order.is_some();
                self.apply_update(robot_id, update).await;
                if has_order {
                    return;
                }
                continue;
            }

            let view = robot.view();
            let action = self.actions.select(&view, &self.game);
            let fallback = action.is_fallback();
            let Some(robot) = self.robots.get_mut(&robot_id) else {
                return;
            };
            let update = robot.set_action(action, &mut self.game, self.properties.wait_period(), Instant::now());
            self.apply_update(robot_id, update).await;
            if fallback {
                return;
            }
        }
        debug!("Robot {}: no pose after {} attempts", robot_id, MAX_SCHEDULE_ATTEMPTS);
    }

    async fn apply_update(&mut self, robot_id: RobotId, update: PoseUpdate) {
        self.run_steps(robot_id, update.steps).await;
        if update.action_finished {
            self.actions.clear_recycled();
        }
        if let Some(order) = update.order {
            self.publish_order(robot_id, order);
        }
    }

    fn publish_order(&mut self, robot_id: RobotId, order: PathPose) {
        let Some(robot) = self.robots.get_mut(&robot_id) else {
            return;
        };
        robot.publish_order(order);
        // 速度标定时线程不规划，直接下发
        if self.game.strategy.is_speed_test() {
            self.outbox.push(OutboundEvent::PoseOrder { robot_id, pose: order });
        }
    }

    async fn run_steps(&mut self, robot_id: RobotId, steps: Vec<Step>) {
        for step in steps {
            match step {
                Step::Emit(event) => self.outbox.push(event),
                Step::Actuator { command, settle } => {
                    self.outbox.push(OutboundEvent::ActuatorCommand { robot_id, command });
                    if !self.actuators.wait_for(robot_id, &command, settle).await {
                        debug!(
                            "Robot {}: actuator {} not acknowledged within {:?}",
                            robot_id, command.id, settle
                        );
                    }
                },
                Step::Delay(duration) => tokio::time::sleep(duration).await,
                Step::SetAvoidance(strategy) => self.set_avoidance_strategy(strategy),
                Step::PoseStart(pose) => {
                    if let Some(robot) = self.robots.get(&robot_id) {
                        robot.context().inputs.set_pose_current(Some(pose));
                        self.fleet.update(robot_id, Some(pose.vertex()));
                        self.outbox.push(OutboundEvent::PoseStart { robot_id, pose });
                    }
                },
                Step::AddScore(points) => {
                    self.game.score += points;
                    self.outbox.push(OutboundEvent::Score { score: self.game.score });
                },
            }
        }
    }

    fn set_avoidance_strategy(&mut self, strategy: AvoidanceStrategy) {
        self.game.avoidance_strategy = strategy;
        for robot in self.robots.values() {
            robot.context().inputs.set_avoidance_strategy(strategy);
        }
        info!("Avoidance strategy: {}", strategy);
    }

    /// 保存检测结果，并把合并后的障碍写入每台机器人的共享状态
    fn set_obstacles(&mut self, robot_id: RobotId, reports: Vec<ObstacleReport>) {
        if !self.robots.contains_key(&robot_id) {
            debug!("Robot {}: obstacles for unknown robot", robot_id);
            return;
        }
        let props = &self.properties;
        let obstacles = reports
            .into_iter()
            .map(|report| match report {
                ObstacleReport::Obstacle(obstacle) => obstacle,
                ObstacleReport::Point(center) => DynRoundObstacle::new(
                    center,
                    props.obstacle_radius,
                    props.obstacle_bb_margin,
                    props.obstacle_bb_vertices,
                )
                .into(),
            })
            .collect();
        self.obstacles.insert(robot_id, obstacles);

        let merged = Arc::new(self.all_obstacles());
        for robot in self.robots.values() {
            robot.context().inputs.obstacles.store(merged.clone());
        }
    }

    fn all_obstacles(&self) -> Vec<DynObstacle> {
        self.obstacles.values().flatten().cloned().collect()
    }

    fn update_config(&mut self, name: &str, value: &Value) {
        if let Err(e) = self.properties.update(name, value) {
            warn!("Config update rejected: {}", e);
            return;
        }
        info!("Config updated: {} = {}", name, value);
        let config = Arc::new(self.properties.to_avoidance_config());
        for robot in self.robots.values() {
            robot.context().inputs.config.store(config.clone());
        }
        if name == "game_duration" {
            self.game.game_duration = self.properties.game_duration;
            if !self.game.playing {
                self.game.countdown = self.game.game_duration;
            }
        }
    }

    async fn starter_changed(&mut self, robot_id: RobotId, pushed: bool) {
        let Some(robot) = self.robots.get_mut(&robot_id) else {
            return;
        };
        robot.set_starter(pushed);
        debug!("Robot {}: starter {}", robot_id, if pushed { "inserted" } else { "pulled" });
        if !pushed && self.wizard.starter_pulled() {
            self.outbox.push(OutboundEvent::CloseWizard);
            self.reset();
            self.play().await;
        }
    }

    fn wizard_state(&self) -> WizardState {
        WizardState {
            camp: self.game.camp,
            strategy: self.game.strategy,
            avoidance_strategy: self.game.avoidance_strategy,
            robots: self
                .robots
                .keys()
                .map(|&id| (id, self.start_positions.get(&id).copied().unwrap_or(id)))
                .collect(),
            available_start_positions: self.game.available_start_positions(),
            starters_present: self.robots.values().all(|r| r.starter_pushed()),
        }
    }

    fn start_wizard(&mut self) {
        let state = self.wizard_state();
        if let Some(request) = self.wizard.start(&state) {
            self.outbox.push(OutboundEvent::Wizard(request));
        }
    }

    fn send_wizard_request(&mut self) {
        let state = self.wizard_state();
        if let Some(request) = self.wizard.request(&state) {
            self.outbox.push(OutboundEvent::Wizard(request));
        }
    }

    async fn wizard_response(&mut self, response: WizardResponse) {
        let state = self.wizard_state();
        let decision = match self.wizard.response(&response, &state) {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Wizard response '{}' rejected: {}", response.name, e);
                self.send_wizard_request();
                return;
            },
        };
        debug!("Wizard decision: {:?}", decision);
        match decision {
            WizardDecision::Ignore => return,
            WizardDecision::Camp(camp) => {
                if camp != self.game.camp {
                    self.game.camp = camp;
                    self.reset();
                }
            },
            WizardDecision::StartPosition { robot_id, position } => {
                self.start_positions.insert(robot_id, position);
                if let Err(e) = self.set_start_position(robot_id, position) {
                    warn!("Robot {}: {}", robot_id, e);
                }
            },
            WizardDecision::Strategy(strategy) => {
                if strategy != self.game.strategy {
                    self.game.strategy = strategy;
                    self.reset();
                }
            },
            WizardDecision::Avoidance(strategy) => self.set_avoidance_strategy(strategy),
            WizardDecision::Recheck | WizardDecision::Restart => {},
            WizardDecision::Play => {
                self.outbox.push(OutboundEvent::CloseWizard);
                self.reset();
                self.play().await;
                return;
            },
        }
        self.send_wizard_request();
    }

    fn set_start_position(&mut self, robot_id: RobotId, position: u8) -> Result<(), PlannerError> {
        let pose = self.game.start_pose(position)?;
        let robot = self
            .robots
            .get_mut(&robot_id)
            .ok_or(PlannerError::UnknownRobot(robot_id))?;
        if let Some(action) = robot.set_pose_start(pose) {
            self.actions.push(action);
        }
        self.fleet.update(robot_id, Some(pose.vertex()));
        self.outbox.push(OutboundEvent::PoseStart { robot_id, pose });
        Ok(())
    }
}

impl Drop for Planner {
    fn drop(&mut self) {
        for robot in self.robots.values_mut() {
            robot.stop_worker();
        }
    }
}
