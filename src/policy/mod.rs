//! Policy trait and implementations.

pub mod random;
pub mod teacher;
pub mod trait_;

pub use random::RandomPolicy;
pub use teacher::TeacherPolicy;
pub use trait_::Policy;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use crate::graph::Point3;
    use crate::episode::Observation;
    use crate::sim::{NavigableLocation, PrimitiveAction};

    fn observation(teacher: PrimitiveAction, navigable: usize) -> Observation {
        let loc = NavigableLocation {
            viewpoint_id: "v".into(),
            rel_heading: 0.0,
            rel_elevation: 0.0,
            point: Point3::default(),
        };
        Observation {
            instr_id: "0_0".into(),
            scan: "s".into(),
            viewpoint: "v".into(),
            view_index: 12,
            heading: 0.0,
            elevation: 0.0,
            feature: FeatureVector::zeros(4),
            step: 0,
            navigable_locations: vec![loc; navigable],
            instructions: String::new(),
            instr_encoding: None,
            instr_length: None,
            teacher,
        }
    }

    #[test]
    fn teacher_policy_echoes_oracle() {
        let obs = vec![
            observation(PrimitiveAction::TURN_LEFT, 1),
            observation(PrimitiveAction::move_to(2), 3),
        ];
        let actions = TeacherPolicy::new().select_actions(&obs);
        assert_eq!(actions, vec![PrimitiveAction::TURN_LEFT, PrimitiveAction::move_to(2)]);
    }

    #[test]
    fn random_policy_returns_correct_count() {
        let mut policy = RandomPolicy::new(0);
        let obs = vec![observation(PrimitiveAction::NOOP, 2); 4];
        assert_eq!(policy.select_actions(&obs).len(), 4);
        assert_eq!(policy.name(), "random");
    }

    #[test]
    fn random_policy_never_moves_blind() {
        let mut policy = RandomPolicy::new(3);
        let obs = vec![observation(PrimitiveAction::NOOP, 1); 200];
        for a in policy.select_actions(&obs) {
            assert!(!a.is_move());
            assert!(!a.is_noop());
        }
    }

    #[test]
    fn random_policy_is_seeded() {
        let obs = vec![observation(PrimitiveAction::NOOP, 2); 32];
        let a = RandomPolicy::new(9).select_actions(&obs);
        let b = RandomPolicy::new(9).select_actions(&obs);
        assert_eq!(a, b);
    }
}
