//! 赛前向导
//!
//! 依次询问阵营、各机器人起始位置、比赛策略、避障策略，
//! 再确认启动拉绳已插入，最后等待确认或拉出拉绳开赛。
//!
//! 向导只维护步骤，不直接修改比赛状态：每个应答被翻译成
//! [`WizardDecision`]，由规划器执行。

use serde_json::{Value, json};

use cogip_protocol::{
    AvoidanceStrategy, CampColor, ProtocolError, RobotId, Strategy, WizardKind, WizardRequest,
    WizardResponse,
};

use crate::error::PlannerError;

const CAMP_REQUEST: &str = "Game Wizard: Choose Camp";
const START_POSITION_REQUEST: &str = "Game Wizard: Choose Start Position";
const STRATEGY_REQUEST: &str = "Game Wizard: Choose Strategy";
const AVOIDANCE_REQUEST: &str = "Game Wizard: Choose Avoidance";
const STARTER_REQUEST: &str = "Game Wizard: Starter Check";
const READY_REQUEST: &str = "Game Wizard: Ready to Start";

/// 向导步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    Idle,
    Camp,
    StartPose {
        index: usize,
    },
    Strategy,
    Avoidance,
    Starter,
    Ready,
}

/// 生成请求所需的比赛状态
#[derive(Debug, Clone)]
pub struct WizardState {
    pub camp: CampColor,
    pub strategy: Strategy,
    pub avoidance_strategy: AvoidanceStrategy,
    /// 已连接机器人及其当前起始位置编号
    pub robots: Vec<(RobotId, u8)>,
    pub available_start_positions: Vec<u8>,
    /// 所有机器人都已插入启动拉绳
    pub starters_present: bool,
}

/// 应答对应的决定
#[derive(Debug, Clone, PartialEq)]
pub enum WizardDecision {
    Camp(CampColor),
    StartPosition { robot_id: RobotId, position: u8 },
    Strategy(Strategy),
    Avoidance(AvoidanceStrategy),
    /// 重新检查，不改变状态
    Recheck,
    /// 关闭向导并开赛
    Play,
    /// 从头再来
    Restart,
    /// 与当前步骤无关的应答
    Ignore,
}

/// 向导状态机
#[derive(Debug, Default)]
pub struct GameWizard {
    step: WizardStep,
}

impl GameWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn is_active(&self) -> bool {
        self.step != WizardStep::Idle
    }

    pub fn close(&mut self) {
        self.step = WizardStep::Idle;
    }

    /// 从第一步开始
    pub fn start(&mut self, state: &WizardState) -> Option<WizardRequest> {
        self.step = WizardStep::Camp;
        self.request(state)
    }

    /// 当前步骤的请求
    ///
    /// 没有需要询问的内容时自动前进（例如没有机器人、拉绳都已插入）。
    pub fn request(&mut self, state: &WizardState) -> Option<WizardRequest> {
        loop {
            match self.step {
                WizardStep::Idle => return None,
                WizardStep::Camp => {
                    return Some(WizardRequest::new(
                        CAMP_REQUEST,
                        WizardKind::Camp,
                        json!(state.camp.name()),
                    ));
                },
                WizardStep::StartPose { index } => {
                    let Some(&(robot_id, position)) = state.robots.get(index) else {
                        self.step = WizardStep::Strategy;
                        continue;
                    };
                    let choices = state.available_start_positions.iter().map(|&n| json!(n)).collect();
                    return Some(
                        WizardRequest::new(
                            format!("{START_POSITION_REQUEST} {robot_id}"),
                            WizardKind::ChoiceInteger,
                            json!(position),
                        )
                        .with_choices(choices)
                        .for_robot(robot_id),
                    );
                },
                WizardStep::Strategy => {
                    let choices = Strategy::ALL.iter().map(|s| json!(s.name())).collect();
                    return Some(
                        WizardRequest::new(STRATEGY_REQUEST, WizardKind::ChoiceStr, json!(state.strategy.name()))
                            .with_choices(choices),
                    );
                },
                WizardStep::Avoidance => {
                    let choices = AvoidanceStrategy::ALL.iter().map(|s| json!(s.name())).collect();
                    return Some(
                        WizardRequest::new(
                            AVOIDANCE_REQUEST,
                            WizardKind::ChoiceStr,
                            json!(state.avoidance_strategy.name()),
                        )
                        .with_choices(choices),
                    );
                },
                WizardStep::Starter => {
                    if state.starters_present {
                        self.step = WizardStep::Ready;
                        continue;
                    }
                    return Some(WizardRequest::new(
                        STARTER_REQUEST,
                        WizardKind::Message,
                        json!("Insert the starter on every robot"),
                    ));
                },
                WizardStep::Ready => {
                    return Some(WizardRequest::new(READY_REQUEST, WizardKind::Boolean, json!(false)));
                },
            }
        }
    }

    /// 处理一个应答并前进到下一步
    pub fn response(
        &mut self,
        response: &WizardResponse,
        state: &WizardState,
    ) -> Result<WizardDecision, PlannerError> {
        if !response.name.starts_with("Game Wizard") {
            return Ok(WizardDecision::Ignore);
        }
        let decision = match self.step {
            WizardStep::Idle => WizardDecision::Ignore,
            WizardStep::Camp => {
                let camp = parse_name::<CampColor>(&response.value, "camp")?;
                self.step = WizardStep::StartPose { index: 0 };
                WizardDecision::Camp(camp)
            },
            WizardStep::StartPose { index } => {
                let robot_id = match response.robot_id {
                    Some(id) => id,
                    None => match state.robots.get(index) {
                        Some(&(id, _)) => id,
                        None => return Ok(WizardDecision::Ignore),
                    },
                };
                let position = parse_start_position(&response.value)?;
                if !state.available_start_positions.contains(&position) {
                    return Err(PlannerError::InvalidStartPosition(position));
                }
                self.step = WizardStep::StartPose { index: index + 1 };
                WizardDecision::StartPosition { robot_id, position }
            },
            WizardStep::Strategy => {
                let strategy = parse_name::<Strategy>(&response.value, "strategy")?;
                self.step = WizardStep::Avoidance;
                WizardDecision::Strategy(strategy)
            },
            WizardStep::Avoidance => {
                let avoidance = parse_name::<AvoidanceStrategy>(&response.value, "avoidance strategy")?;
                self.step = WizardStep::Starter;
                WizardDecision::Avoidance(avoidance)
            },
            WizardStep::Starter => WizardDecision::Recheck,
            WizardStep::Ready => match response.value {
                Value::Bool(true) => {
                    self.step = WizardStep::Idle;
                    WizardDecision::Play
                },
                _ => {
                    self.step = WizardStep::Camp;
                    WizardDecision::Restart
                },
            },
        };
        Ok(decision)
    }

    /// 拉出启动拉绳：处于最后一步时开赛
    pub fn starter_pulled(&mut self) -> bool {
        if self.step == WizardStep::Ready {
            self.step = WizardStep::Idle;
            true
        } else {
            false
        }
    }
}

fn parse_name<T>(value: &Value, kind: &'static str) -> Result<T, PlannerError>
where
    T: std::str::FromStr<Err = ProtocolError>,
{
    match value.as_str() {
        Some(name) => Ok(name.parse()?),
        None => Err(ProtocolError::UnknownName {
            kind,
            name: value.to_string(),
        }
        .into()),
    }
}

fn parse_start_position(value: &Value) -> Result<u8, PlannerError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or(PlannerError::InvalidStartPosition(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> WizardState {
        WizardState {
            camp: CampColor::Yellow,
            strategy: Strategy::BackAndForth,
            avoidance_strategy: AvoidanceStrategy::VisibilityRoadMapQuadPid,
            robots: vec![(1, 1), (2, 2)],
            available_start_positions: vec![1, 2, 3, 4, 5],
            starters_present: false,
        }
    }

    fn answer(name: &str, value: Value) -> WizardResponse {
        WizardResponse {
            name: name.to_string(),
            value,
            robot_id: None,
        }
    }

    #[test]
    fn test_full_sequence() {
        let mut wizard = GameWizard::new();
        let mut state = state();

        let request = wizard.start(&state).unwrap();
        assert_eq!(request.name, CAMP_REQUEST);
        assert_eq!(request.kind, WizardKind::Camp);
        assert_eq!(
            wizard.response(&answer(CAMP_REQUEST, json!("blue")), &state).unwrap(),
            WizardDecision::Camp(CampColor::Blue)
        );

        let request = wizard.request(&state).unwrap();
        assert_eq!(request.robot_id, Some(1));
        assert_eq!(request.choices.len(), 5);
        let decision = wizard.response(&answer(&request.name, json!(3)), &state).unwrap();
        assert_eq!(decision, WizardDecision::StartPosition { robot_id: 1, position: 3 });

        let request = wizard.request(&state).unwrap();
        assert_eq!(request.robot_id, Some(2));
        wizard.response(&answer(&request.name, json!("4")), &state).unwrap();

        assert_eq!(wizard.request(&state).unwrap().name, STRATEGY_REQUEST);
        assert_eq!(
            wizard.response(&answer(STRATEGY_REQUEST, json!("Game")), &state).unwrap(),
            WizardDecision::Strategy(Strategy::Game)
        );

        assert_eq!(wizard.request(&state).unwrap().name, AVOIDANCE_REQUEST);
        assert_eq!(
            wizard.response(&answer(AVOIDANCE_REQUEST, json!("StopAndGo")), &state).unwrap(),
            WizardDecision::Avoidance(AvoidanceStrategy::StopAndGo)
        );

        assert_eq!(wizard.request(&state).unwrap().kind, WizardKind::Message);
        assert_eq!(
            wizard.response(&answer(STARTER_REQUEST, json!(null)), &state).unwrap(),
            WizardDecision::Recheck
        );
        state.starters_present = true;
        assert_eq!(wizard.request(&state).unwrap().name, READY_REQUEST);
        assert_eq!(
            wizard.response(&answer(READY_REQUEST, json!(true)), &state).unwrap(),
            WizardDecision::Play
        );
        assert!(!wizard.is_active());
        assert!(wizard.request(&state).is_none());
    }

    #[test]
    fn test_no_robots_skips_start_positions() {
        let mut wizard = GameWizard::new();
        let mut state = state();
        state.robots.clear();
        wizard.start(&state);
        wizard.response(&answer(CAMP_REQUEST, json!("yellow")), &state).unwrap();
        assert_eq!(wizard.request(&state).unwrap().name, STRATEGY_REQUEST);
    }

    #[test]
    fn test_ready_declined_restarts() {
        let mut wizard = GameWizard::new();
        let mut state = state();
        state.robots.clear();
        state.starters_present = true;
        wizard.start(&state);
        wizard.response(&answer(CAMP_REQUEST, json!("yellow")), &state).unwrap();
        wizard.request(&state);
        wizard.response(&answer(STRATEGY_REQUEST, json!("Approval")), &state).unwrap();
        wizard.request(&state);
        wizard.response(&answer(AVOIDANCE_REQUEST, json!("Disabled")), &state).unwrap();
        assert_eq!(wizard.request(&state).unwrap().name, READY_REQUEST);
        assert_eq!(
            wizard.response(&answer(READY_REQUEST, json!(false)), &state).unwrap(),
            WizardDecision::Restart
        );
        assert_eq!(wizard.step(), WizardStep::Camp);
    }

    #[test]
    fn test_invalid_answers_keep_step() {
        let mut wizard = GameWizard::new();
        let state = state();
        wizard.start(&state);
        assert!(wizard.response(&answer(CAMP_REQUEST, json!("green")), &state).is_err());
        assert!(wizard.response(&answer(CAMP_REQUEST, json!(1)), &state).is_err());
        assert_eq!(wizard.step(), WizardStep::Camp);

        wizard.response(&answer(CAMP_REQUEST, json!("yellow")), &state).unwrap();
        let request = wizard.request(&state).unwrap();
        assert!(matches!(
            wizard.response(&answer(&request.name, json!(9)), &state),
            Err(PlannerError::InvalidStartPosition(9))
        ));
        assert_eq!(wizard.step(), WizardStep::StartPose { index: 0 });
    }

    #[test]
    fn test_foreign_responses_are_ignored() {
        let mut wizard = GameWizard::new();
        let state = state();
        wizard.start(&state);
        assert_eq!(
            wizard.response(&answer("Other", json!("blue")), &state).unwrap(),
            WizardDecision::Ignore
        );
        assert_eq!(wizard.step(), WizardStep::Camp);
    }

    #[test]
    fn test_starter_pull_only_when_ready() {
        let mut wizard = GameWizard::new();
        assert!(!wizard.starter_pulled());
        let mut state = state();
        state.robots.clear();
        state.starters_present = true;
        wizard.start(&state);
        assert!(!wizard.starter_pulled());
        wizard.response(&answer(CAMP_REQUEST, json!("yellow")), &state).unwrap();
        wizard.request(&state);
        wizard.response(&answer(STRATEGY_REQUEST, json!("Game")), &state).unwrap();
        wizard.request(&state);
        wizard.response(&answer(AVOIDANCE_REQUEST, json!("Disabled")), &state).unwrap();
        wizard.request(&state);
        assert!(wizard.starter_pulled());
        assert!(!wizard.is_active());
    }
}
