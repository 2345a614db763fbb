//! 出站队列
//!
//! 所有事件按推入顺序出队。位姿指令另有每台机器人一个的覆盖槽：
//! 槽为空时在队列中留一个占位，之后的新指令只替换槽内的值，
//! 占位到达队首时取出槽内最新的指令。

use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

use cogip_protocol::{OutboundEvent, PathPose, RobotId};

#[derive(Debug)]
enum Entry {
    Event(OutboundEvent),
    /// 对应机器人覆盖槽中的位姿指令
    PoseOrder(RobotId),
}

#[derive(Debug, Default)]
struct OutboxInner {
    pose_orders: BTreeMap<RobotId, PathPose>,
    queue: VecDeque<Entry>,
}

/// 出站队列
#[derive(Debug, Default)]
pub struct Outbox {
    inner: Mutex<OutboxInner>,
    notify: Notify,
    closed: AtomicBool,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: OutboundEvent) {
        {
            let mut inner = self.inner.lock();
            match event {
                OutboundEvent::PoseOrder { robot_id, pose } => {
                    if inner.pose_orders.insert(robot_id, pose).is_none() {
                        inner.queue.push_back(Entry::PoseOrder(robot_id));
                    }
                },
                event => inner.queue.push_back(Entry::Event(event)),
            }
        }
        self.notify.notify_one();
    }

    /// 按推入顺序取出下一个事件
    pub fn try_pop(&self) -> Option<OutboundEvent> {
        let mut inner = self.inner.lock();
        while let Some(entry) = inner.queue.pop_front() {
            match entry {
                Entry::Event(event) => return Some(event),
                Entry::PoseOrder(robot_id) => {
                    if let Some(pose) = inner.pose_orders.remove(&robot_id) {
                        return Some(OutboundEvent::PoseOrder { robot_id, pose });
                    }
                },
            }
        }
        None
    }

    /// 等待下一个事件；关闭且取空后返回 `None`
    pub async fn recv(&self) -> Option<OutboundEvent> {
        loop {
            if let Some(event) = self.try_pop() {
                return Some(event);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            self.notify.notified().await;
        }
    }

    /// 取出当前所有事件
    pub fn drain(&self) -> Vec<OutboundEvent> {
        std::iter::from_fn(|| self.try_pop()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn order(robot_id: RobotId, x: f64) -> OutboundEvent {
        OutboundEvent::PoseOrder {
            robot_id,
            pose: PathPose::new(x, 0.0, None),
        }
    }

    #[test]
    fn test_pose_orders_last_value_wins_in_place() {
        let outbox = Outbox::new();
        outbox.push(OutboundEvent::Score { score: 1 });
        outbox.push(order(1, 10.0));
        outbox.push(OutboundEvent::Blocked { robot_id: 2 });
        outbox.push(order(1, 20.0));
        outbox.push(order(2, 30.0));
        assert_eq!(outbox.len(), 4);

        // 机器人 1 的指令保留第一次入队的位置，值取最新
        assert_eq!(
            outbox.drain(),
            vec![
                OutboundEvent::Score { score: 1 },
                order(1, 20.0),
                OutboundEvent::Blocked { robot_id: 2 },
                order(2, 30.0),
            ]
        );
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_pose_order_does_not_overtake_prior_events() {
        let outbox = Outbox::new();
        let start = OutboundEvent::PoseStart {
            robot_id: 1,
            pose: PathPose::new(225.0, -775.0, Some(0.0)),
        };
        let controller = OutboundEvent::SetController {
            robot_id: 1,
            controller: cogip_protocol::ControllerEnum::LinearSpeedTest,
        };
        outbox.push(start.clone());
        outbox.push(controller.clone());
        outbox.push(order(1, 500.0));

        assert_eq!(outbox.drain(), vec![start, controller, order(1, 500.0)]);

        // 出队后再推入的指令重新排队
        outbox.push(order(1, 600.0));
        outbox.push(OutboundEvent::CloseWizard);
        outbox.push(order(1, 700.0));
        assert_eq!(outbox.drain(), vec![order(1, 700.0), OutboundEvent::CloseWizard]);
    }

    #[tokio::test]
    async fn test_recv_wakes_on_push_and_close() {
        let outbox = Arc::new(Outbox::new());
        let reader = {
            let outbox = outbox.clone();
            tokio::spawn(async move {
                let mut events = Vec::new();
                while let Some(event) = outbox.recv().await {
                    events.push(event);
                }
                events
            })
        };

        outbox.push(OutboundEvent::CloseWizard);
        tokio::task::yield_now().await;
        outbox.push(OutboundEvent::Score { score: 3 });
        outbox.close();

        let events = reader.await.unwrap();
        assert_eq!(events, vec![OutboundEvent::CloseWizard, OutboundEvent::Score { score: 3 }]);
    }
}
