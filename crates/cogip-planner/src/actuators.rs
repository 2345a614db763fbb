//! 执行器状态与确认等待
//!
//! 入站路由写入固件上报的执行器状态；规划器执行 `Step::Actuator` 时
//! 在超时内等待对应状态出现。

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use cogip_protocol::{ActuatorCommand, ActuatorState, RobotId};

/// 各机器人执行器的最新状态
#[derive(Debug, Default)]
pub struct ActuatorStates {
    states: Mutex<HashMap<(RobotId, u16), ActuatorState>>,
    notify: Notify,
}

impl ActuatorStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, robot_id: RobotId, state: ActuatorState) {
        self.states.lock().insert((robot_id, state.id), state);
        self.notify.notify_waiters();
    }

    pub fn get(&self, robot_id: RobotId, id: u16) -> Option<ActuatorState> {
        self.states.lock().get(&(robot_id, id)).copied()
    }

    pub fn clear_robot(&self, robot_id: RobotId) {
        self.states.lock().retain(|(r, _), _| *r != robot_id);
    }

    fn is_acknowledged(&self, robot_id: RobotId, command: &ActuatorCommand) -> bool {
        self.get(robot_id, command.id)
            .is_some_and(|state| command.is_acknowledged_by(&state))
    }

    /// 等待执行器确认 `command`，超时返回 false
    pub async fn wait_for(&self, robot_id: RobotId, command: &ActuatorCommand, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_acknowledged(robot_id, command) {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.is_acknowledged(robot_id, command);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_acknowledgement() {
        let states = Arc::new(ActuatorStates::new());
        let command = ActuatorCommand::new(1, 100);

        let writer = {
            let states = states.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                states.update(1, ActuatorState { id: 1, position: 50 });
                tokio::time::sleep(Duration::from_millis(100)).await;
                states.update(1, ActuatorState { id: 1, position: 100 });
            })
        };

        let start = Instant::now();
        assert!(states.wait_for(1, &command, Duration::from_secs(1)).await);
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        writer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_times_out() {
        let states = ActuatorStates::new();
        states.update(2, ActuatorState { id: 1, position: 100 });

        // 其他机器人的状态不算确认
        let start = Instant::now();
        assert!(!states.wait_for(1, &ActuatorCommand::new(1, 100), Duration::from_millis(300)).await);
        assert_eq!(start.elapsed(), Duration::from_millis(300));

        states.clear_robot(2);
        assert_eq!(states.get(2, 1), None);
    }
}
