//! 动作选择属性测试

use cogip_planner::actions::PoseListAction;
use cogip_planner::actions::weight::constant;
use cogip_planner::*;
use proptest::prelude::*;

fn collection(weights: &[f64]) -> Actions {
    let mut actions = Actions::new();
    for (i, &weight) in weights.iter().enumerate() {
        actions.push(Box::new(PoseListAction::new(format!("action {i}"), Vec::<Pose>::new(), constant(weight))));
    }
    actions
}

proptest! {
    #[test]
    fn prop_selects_first_maximal_weight(weights in prop::collection::vec(prop_oneof![Just(0.0), 0.0..100.0f64, Just(50.0)], 1..12)) {
        let game = GameContext::default();
        let robot = RobotView::new(1);
        let mut actions = collection(&weights);
        let selected = actions.select(&robot, &game);

        let max = weights.iter().copied().fold(0.0, f64::max);
        if max > 0.0 {
            let first = weights.iter().position(|&w| w == max).unwrap();
            prop_assert_eq!(selected.name(), format!("action {first}"));
            prop_assert_eq!(actions.len(), weights.len() - 1);
        } else {
            prop_assert!(selected.is_fallback());
            prop_assert_eq!(actions.len(), weights.len());
        }
    }

    #[test]
    fn prop_recycled_actions_wait_until_cleared(count in 1usize..8) {
        let game = GameContext::default();
        let robot = RobotView::new(1);
        let mut actions = collection(&vec![1.0; count]);

        let mut taken = Vec::new();
        for _ in 0..count {
            let mut action = actions.select(&robot, &game);
            prop_assert!(!action.is_fallback());
            action.recycle(1, &mut GameContext::default());
            taken.push(action);
        }
        for action in taken {
            actions.push(action);
        }
        prop_assert!(actions.select(&robot, &game).is_fallback());

        actions.clear_recycled();
        prop_assert!(!actions.select(&robot, &game).is_fallback());
    }
}
