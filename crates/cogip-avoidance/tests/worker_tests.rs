//! 避障线程集成测试
//!
//! 覆盖固定障碍、多机器人互避与真实线程下的事件流。

use cogip_avoidance::*;
use cogip_geometry::Vertex;
use cogip_protocol::{AvoidanceStrategy, PathPose};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn tick(updater: &mut PathUpdater, ctx: &AvoidanceContext) -> (TickOutcome, Vec<AvoidanceEvent>) {
    let metrics = AvoidanceMetrics::new();
    let mut events = Vec::new();
    let outcome = updater.tick(ctx, &metrics, &mut |e| events.push(e));
    (outcome, events)
}

/// 点到线段的距离
fn distance_to_segment(p: &Vertex, a: &Vertex, b: &Vertex) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance(&Vertex::new(a.x + t * dx, a.y + t * dy))
}

#[test]
fn test_direct_path_on_game_table() {
    let ctx = AvoidanceContext::new(1, AvoidanceConfig::default(), Arc::new(Fleet::new()));
    let mut updater = PathUpdater::new(1, Table::default());
    let goal = PathPose::new(1875.0, -775.0, Some(90.0));
    ctx.inputs.set_pose_current(Some(PathPose::new(225.0, -775.0, Some(0.0))));
    ctx.inputs.set_pose_order(Some(goal));

    let (outcome, events) = tick(&mut updater, &ctx);
    assert_eq!(outcome, TickOutcome::Updated { path_len: 1 });
    assert_eq!(events.last(), Some(&AvoidanceEvent::PoseOrder(goal)));
    assert_eq!(ctx.outputs.avoidance_path.load().as_slice(), &[goal]);
}

#[test]
fn test_goal_inside_fixed_obstacle_is_blocked() {
    let ctx = AvoidanceContext::new(1, AvoidanceConfig::default(), Arc::new(Fleet::new()));
    let mut updater = PathUpdater::new(1, Table::default());
    ctx.inputs.set_pose_current(Some(PathPose::new(225.0, -775.0, Some(0.0))));
    ctx.inputs.set_pose_order(Some(PathPose::new(550.0, 0.0, Some(0.0))));

    let (outcome, events) = tick(&mut updater, &ctx);
    assert_eq!(outcome, TickOutcome::Blocked);
    assert_eq!(events, vec![AvoidanceEvent::Blocked]);
}

#[test]
fn test_disabled_strategy_ignores_obstacles() {
    let ctx = AvoidanceContext::new(1, AvoidanceConfig::default(), Arc::new(Fleet::new()));
    ctx.inputs.set_avoidance_strategy(AvoidanceStrategy::Disabled);
    ctx.fleet.update(2, Some(Vertex::new(1000.0, -500.0)));
    let mut updater = PathUpdater::new(1, Table::default());
    let goal = PathPose::new(1500.0, -500.0, Some(0.0));
    ctx.inputs.set_pose_current(Some(PathPose::new(500.0, -500.0, Some(0.0))));
    ctx.inputs.set_pose_order(Some(goal));

    let (outcome, _) = tick(&mut updater, &ctx);
    assert_eq!(outcome, TickOutcome::Updated { path_len: 1 });
}

#[test]
fn test_robots_avoid_each_other() {
    let fleet = Arc::new(Fleet::new());
    let config = AvoidanceConfig::default();
    let ctx = AvoidanceContext::new(1, config.clone(), fleet.clone());
    let mut updater = PathUpdater::new(1, Table::empty(TableKind::Game));

    let start = PathPose::new(500.0, -500.0, Some(0.0));
    let goal = PathPose::new(1500.0, -500.0, Some(0.0));
    let other = Vertex::new(1000.0, -500.0);
    fleet.update(1, Some(start.vertex()));
    fleet.update(2, Some(other));
    ctx.inputs.set_pose_current(Some(start));
    ctx.inputs.set_pose_order(Some(goal));

    let (outcome, _) = tick(&mut updater, &ctx);
    assert!(matches!(outcome, TickOutcome::Updated { path_len } if path_len >= 2));

    let path = ctx.outputs.avoidance_path.load();
    let mut previous = start.vertex();
    for pose in path.iter() {
        let d = distance_to_segment(&other, &previous, &pose.vertex());
        assert!(d >= config.robot_obstacle_radius() - 1e-6, "segment too close: {}", d);
        previous = pose.vertex();
    }
    assert_eq!(path.last(), Some(&goal));
}

#[test]
fn test_stop_and_go_blocks_on_detour() {
    let fleet = Arc::new(Fleet::new());
    let ctx = AvoidanceContext::new(1, AvoidanceConfig::default(), fleet.clone());
    ctx.inputs.set_avoidance_strategy(AvoidanceStrategy::StopAndGo);
    fleet.update(2, Some(Vertex::new(1000.0, -500.0)));
    let mut updater = PathUpdater::new(1, Table::empty(TableKind::Game));
    ctx.inputs.set_pose_current(Some(PathPose::new(500.0, -500.0, Some(0.0))));
    ctx.inputs.set_pose_order(Some(PathPose::new(1500.0, -500.0, Some(0.0))));

    assert_eq!(tick(&mut updater, &ctx).0, TickOutcome::Blocked);
}

#[test]
fn test_worker_follows_moving_robot() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let config = AvoidanceConfig {
        path_refresh_interval: Duration::from_millis(5),
        ..Default::default()
    };
    let ctx = Arc::new(AvoidanceContext::new(1, config, Arc::new(Fleet::new())));
    ctx.inputs.set_pose_order(Some(PathPose::new(2500.0, -500.0, Some(0.0))));

    let worker = AvoidanceWorker::spawn(ctx.clone(), Table::empty(TableKind::Game), tx).unwrap();

    // 规划器侧持续写入当前位姿
    let writer_ctx = ctx.clone();
    let writer = thread::spawn(move || {
        for i in 0..50 {
            let x = 300.0 + i as f64 * 30.0;
            writer_ctx.inputs.set_pose_current(Some(PathPose::new(x, -500.0, Some(0.0))));
            thread::sleep(Duration::from_millis(2));
        }
    });
    writer.join().unwrap();
    thread::sleep(Duration::from_millis(50));
    drop(worker);

    let orders: Vec<_> = rx
        .try_iter()
        .filter(|m| matches!(m.event, AvoidanceEvent::PoseOrder(_)))
        .collect();
    assert!(!orders.is_empty());
    assert!(orders.iter().all(|m| m.robot_id == 1));
    assert!(ctx.inputs.is_exiting());
}

#[test]
fn test_worker_exits_when_receiver_dropped() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let config = AvoidanceConfig {
        path_refresh_interval: Duration::from_millis(5),
        ..Default::default()
    };
    let ctx = Arc::new(AvoidanceContext::new(4, config, Arc::new(Fleet::new())));
    ctx.inputs.set_pose_current(Some(PathPose::new(225.0, -775.0, Some(0.0))));
    ctx.inputs.set_pose_order(Some(PathPose::new(1875.0, -775.0, Some(90.0))));
    drop(rx);

    let worker = AvoidanceWorker::spawn(ctx, Table::empty(TableKind::Game), tx).unwrap();
    for _ in 0..100 {
        if !worker.is_alive() {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert!(!worker.is_alive());
}
