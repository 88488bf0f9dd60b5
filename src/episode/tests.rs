//! Scenario tests driving the environment end to end on a small house.

use std::collections::HashSet;
use std::sync::Arc;

use super::*;
use crate::features::FeatureSource;
use crate::graph::{InMemoryConnectivity, NavGraph, NavGraphStore, Point3};
use crate::oracle::ShortestPathOracle;
use crate::sim::{
    Batch, GraphSimulatorFactory, Nesting, Pose, PrimitiveAction, SimError, Simulator,
    SimulatorFactory, SimulatorSettings,
};

/// Floor plan, all viewpoints at camera height 1.5 m:
///
/// ```text
///        b ---- c ---- e
///        |      |
///   f -- a ---- d
/// ```
///
/// `d` sits slightly south so `a → c` has a unique shortest path via `b`.
fn house() -> NavGraph {
    let mut g = NavGraph::new("house");
    for (id, x, y) in [
        ("a", 0.0, 0.0),
        ("b", 0.0, 3.0),
        ("c", 3.0, 3.0),
        ("d", 3.0, -1.0),
        ("e", 6.0, 3.0),
        ("f", -3.0, 0.0),
    ] {
        g.add_viewpoint(id, Point3::new(x, y, 1.5)).unwrap();
    }
    for (u, v) in [("a", "b"), ("b", "c"), ("c", "d"), ("a", "d"), ("c", "e"), ("a", "f")] {
        g.connect(u, v).unwrap();
    }
    g
}

fn annex() -> NavGraph {
    let mut g = NavGraph::new("annex");
    g.add_viewpoint("z", Point3::new(0.0, 0.0, 1.5)).unwrap();
    g
}

fn graphs() -> Arc<NavGraphStore> {
    let source = InMemoryConnectivity::new().with(house()).with(annex());
    Arc::new(NavGraphStore::load(&source, ["house", "annex"]).unwrap())
}

fn record(path_id: u64, path: &[&str], heading: f64, instructions: usize) -> PathRecord {
    PathRecord {
        scan: "house".into(),
        path: path.iter().map(|s| s.to_string()).collect(),
        heading,
        instructions: (0..instructions)
            .map(|i| format!("instruction {i} for path {path_id} {}", "word ".repeat(i)))
            .collect(),
        path_id: PathId::Int(path_id),
        distance: None,
    }
}

struct Words;

impl Tokenizer for Words {
    fn encode_sentence(&self, sentence: &str) -> (Vec<usize>, usize) {
        let ids: Vec<usize> = sentence.split_whitespace().map(str::len).collect();
        let len = ids.len();
        (ids, len)
    }
}

fn env_with(
    records: &[PathRecord],
    batch_size: usize,
    beam_size: usize,
    seed: u64,
) -> NavBatch<GraphSimulatorFactory> {
    let graphs = graphs();
    let tasks = mint_tasks(records, Some(&Words));
    let config = EnvConfig {
        batch_size,
        beam_size,
        seed,
        splits: vec!["train".into()],
    };
    NavBatch::new(
        config,
        tasks,
        Arc::clone(&graphs),
        FeatureSource::placeholder(),
        GraphSimulatorFactory::new(graphs),
    )
    .unwrap()
}

fn six_tasks() -> Vec<PathRecord> {
    vec![
        record(1, &["a", "b", "c"], 0.3, 2),
        record(2, &["d", "c", "e"], 2.0, 2),
        record(3, &["f", "a", "d"], 4.0, 2),
    ]
}

fn instr_ids(env: &NavBatch<GraphSimulatorFactory>) -> Vec<String> {
    env.batch().iter().map(|t| t.instr_id.clone()).collect()
}

#[cfg(test)]
mod sampling {
    use super::*;

    #[test]
    fn test_epoch_enumerates_pool_once() {
        let mut env = env_with(&six_tasks(), 2, 1, 10);
        let mut seen = Vec::new();
        for _ in 0..3 {
            env.reset(false, Nesting::Flat).unwrap();
            seen.extend(instr_ids(&env));
        }
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(seen.len(), 6);
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn test_same_seed_same_minibatches() {
        let mut a = env_with(&six_tasks(), 2, 1, 7);
        let mut b = env_with(&six_tasks(), 2, 1, 7);
        for _ in 0..8 {
            a.reset(false, Nesting::Flat).unwrap();
            b.reset(false, Nesting::Flat).unwrap();
            assert_eq!(instr_ids(&a), instr_ids(&b));
        }
    }

    #[test]
    fn test_wraparound_pool_of_five_batch_of_three() {
        let records = vec![
            record(1, &["a", "b", "c"], 0.0, 2),
            record(2, &["d", "c", "e"], 0.0, 2),
            record(3, &["f", "a", "d"], 0.0, 1),
        ];
        let mut env = env_with(&records, 3, 1, 10);

        env.reset(false, Nesting::Flat).unwrap();
        let first = instr_ids(&env);
        let tail: Vec<String> = env.pool().tasks()[3..]
            .iter()
            .map(|t| t.instr_id.clone())
            .collect();
        env.reset(false, Nesting::Flat).unwrap();
        let second = instr_ids(&env);

        let covered: HashSet<_> = first.iter().chain(&second).collect();
        assert_eq!(covered.len(), 5);
        assert_eq!(second[..2], tail[..]);

        // third draw continues the reshuffled order, fourth wraps again
        let reshuffled: Vec<String> = env
            .pool()
            .tasks()
            .iter()
            .map(|t| t.instr_id.clone())
            .collect();
        env.reset(false, Nesting::Flat).unwrap();
        assert_eq!(instr_ids(&env), reshuffled[1..4]);
        env.reset(false, Nesting::Flat).unwrap();
        assert_eq!(instr_ids(&env)[0], reshuffled[4]);
        assert_eq!(env.pool().cursor(), 2);
    }

    #[test]
    fn test_reset_epoch_replays_order() {
        let mut env = env_with(&six_tasks(), 2, 1, 3);
        env.reset(false, Nesting::Flat).unwrap();
        let first = instr_ids(&env);
        env.reset(false, Nesting::Flat).unwrap();
        env.reset_epoch();
        env.reset(false, Nesting::Flat).unwrap();
        assert_eq!(instr_ids(&env), first);
    }

    #[test]
    fn test_sorted_reset_uses_token_lengths() {
        let mut env = env_with(&six_tasks(), 6, 1, 5);
        env.reset(true, Nesting::Flat).unwrap();
        let lengths: Vec<usize> = env
            .batch()
            .iter()
            .map(|t| t.instr_length.unwrap())
            .collect();
        let mut sorted = lengths.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lengths, sorted);
    }
}

#[cfg(test)]
mod stepping {
    use super::*;

    #[test]
    fn test_noop_round_trips_pose() {
        let mut env = env_with(&six_tasks(), 2, 1, 1);
        let poses = env.reset(false, Nesting::Flat).unwrap();
        let noop = Batch::Flat(vec![PrimitiveAction::NOOP; 2]);
        assert_eq!(env.step(&poses, &noop).unwrap(), poses);
    }

    #[test]
    fn test_teacher_reaches_second_waypoint_first() {
        let records = vec![
            record(1, &["a", "b", "c"], 0.3, 1),
            record(2, &["d", "c", "e"], 2.0, 1),
        ];
        let mut env = env_with(&records, 2, 1, 10);
        let mut poses = env.reset(false, Nesting::Flat).unwrap();
        for (pose, task) in poses.as_flat().unwrap().iter().zip(env.batch()) {
            assert_eq!(pose.viewpoint_id, task.path[0]);
        }

        let mut moved = [false; 2];
        for _ in 0..20 {
            let obs = env.observe(&poses).unwrap().into_flat().unwrap();
            let actions: Vec<PrimitiveAction> = obs
                .iter()
                .zip(moved)
                .map(|(ob, done)| if done { PrimitiveAction::NOOP } else { ob.teacher })
                .collect();
            poses = env.step(&poses, &Batch::Flat(actions.clone())).unwrap();

            let current = poses.as_flat().unwrap();
            for (i, action) in actions.iter().enumerate() {
                let task = &env.batch()[i];
                if moved[i] {
                    continue;
                }
                if action.is_move() {
                    assert_eq!(current[i].viewpoint_id, task.path[1]);
                    moved[i] = true;
                } else {
                    assert_eq!(current[i].viewpoint_id, task.path[0]);
                }
            }
            if moved.iter().all(|m| *m) {
                return;
            }
        }
        panic!("teacher never moved both agents: {moved:?}");
    }

    #[test]
    fn test_observe_copies_instruction_encoding() {
        let mut env = env_with(&six_tasks(), 2, 1, 2);
        let poses = env.reset(false, Nesting::Flat).unwrap();
        let obs = env.observe(&poses).unwrap().into_flat().unwrap();
        for (ob, task) in obs.iter().zip(env.batch()) {
            assert_eq!(ob.instr_id, task.instr_id);
            assert_eq!(ob.instr_encoding, task.instr_encoding);
            assert_eq!(ob.instr_length, task.instr_length);
            assert_eq!(ob.step, 0);
            assert_eq!(ob.navigable_locations[0].viewpoint_id, ob.viewpoint);
        }
    }

    #[test]
    fn test_observe_rejects_pose_in_other_scan() {
        let mut env = env_with(&six_tasks(), 1, 1, 2);
        env.reset(false, Nesting::Flat).unwrap();
        let stray = Batch::Flat(vec![Pose::new("annex", "z", 0.0, 0.0)]);
        assert!(matches!(
            env.observe(&stray),
            Err(EpisodeError::ScanMismatch { agent: 0, .. })
        ));
    }

    #[test]
    fn test_simple_forward_uses_nearest_location() {
        let records = vec![record(1, &["a", "b", "c"], 0.0, 1)];
        let mut env = env_with(&records, 1, 1, 0);
        env.reset(false, Nesting::Flat).unwrap();
        env.simulators_mut()
            .make_simple_actions(&Batch::Flat(vec![0]))
            .unwrap();
        let poses = env.simulators_mut().current_poses(Nesting::Flat).unwrap();
        assert_eq!(poses.as_flat().unwrap()[0].viewpoint_id, "b");
    }
}

#[cfg(test)]
mod beams {
    use super::*;

    #[test]
    fn test_beamed_reset_has_single_slot() {
        let mut env = env_with(&six_tasks(), 2, 3, 4);
        let poses = env.reset(false, Nesting::Beamed).unwrap();
        let beams = poses.into_beamed().unwrap();
        assert_eq!(beams.len(), 2);
        assert!(beams.iter().all(|b| b.len() == 1));
    }

    #[test]
    fn test_beamed_observe_keeps_shape() {
        let mut env = env_with(&six_tasks(), 2, 2, 4);
        let start = env.reset(false, Nesting::Beamed).unwrap();
        let actions = Batch::Beamed(vec![vec![PrimitiveAction::TURN_RIGHT]; 2]);
        let turned = env.step(&start, &actions).unwrap();

        let widened = Batch::Beamed(
            start
                .into_beamed()
                .unwrap()
                .into_iter()
                .zip(turned.into_beamed().unwrap())
                .map(|(mut a, b)| {
                    a.extend(b);
                    a
                })
                .collect(),
        );
        let obs = env.observe(&widened).unwrap().into_beamed().unwrap();
        assert_eq!(obs.len(), 2);
        for (beam, task) in obs.iter().zip(env.batch()) {
            assert_eq!(beam.len(), 2);
            assert!(beam.iter().all(|ob| ob.instr_id == task.instr_id));
            assert_ne!(beam[0].heading, beam[1].heading);
        }
    }

    #[test]
    fn test_beam_wider_than_grid_rejected() {
        let mut env = env_with(&six_tasks(), 1, 1, 4);
        env.reset(false, Nesting::Flat).unwrap();
        let pose = Pose::new("house", "a", 0.0, 0.0);
        let poses = Batch::Beamed(vec![vec![pose.clone(), pose]]);
        assert!(matches!(
            env.observe(&poses),
            Err(EpisodeError::Sim(SimError::BeamOverflow { .. }))
        ));
    }
}

#[cfg(test)]
mod oracle_paths {
    use super::*;

    const MAX_TURNS_BETWEEN_MOVES: usize = 8;

    #[test]
    fn test_oracle_rollouts_follow_shortest_paths() {
        let graphs = graphs();
        let oracle = ShortestPathOracle::new(&graphs);
        let factory = GraphSimulatorFactory::new(Arc::clone(&graphs));
        let house = graphs.graph("house").unwrap();
        let ids: Vec<String> = house.viewpoints().map(|v| v.id.clone()).collect();
        let hops = |from: &str, to: &str| graphs.path_between("house", from, to).unwrap().len() - 1;

        for src in &ids {
            for dst in &ids {
                let mut sim = factory.create(&SimulatorSettings::default()).unwrap();
                sim.new_episode("house", src, 0.3, 0.0).unwrap();
                let mut since_move = 0;
                let mut arrived = false;

                for _ in 0..100 {
                    let state = sim.state().unwrap();
                    let action = oracle.teacher_action(&state, dst).unwrap();
                    if action.is_noop() {
                        assert_eq!(state.viewpoint_id(), dst);
                        arrived = true;
                        break;
                    }
                    let before = hops(state.viewpoint_id(), dst);
                    sim.make_action(action).unwrap();
                    if action.is_move() {
                        let after = sim.state().unwrap();
                        assert_eq!(hops(after.viewpoint_id(), dst), before - 1);
                        since_move = 0;
                    } else {
                        since_move += 1;
                        assert!(
                            since_move <= MAX_TURNS_BETWEEN_MOVES,
                            "{src} -> {dst}: stuck turning"
                        );
                    }
                }
                assert!(arrived, "{src} -> {dst}: never arrived");
            }
        }
    }

    #[test]
    fn test_oracle_climbs_a_staircase() {
        // `head` is about 63° above `foot`, `landing` level with `head`
        let mut g = NavGraph::new("stairs");
        g.add_viewpoint("foot", Point3::new(0.0, 0.0, 1.5)).unwrap();
        g.add_viewpoint("head", Point3::new(0.0, 1.0, 3.5)).unwrap();
        g.add_viewpoint("landing", Point3::new(0.0, 3.0, 3.5)).unwrap();
        g.connect("foot", "head").unwrap();
        g.connect("head", "landing").unwrap();
        let graphs =
            Arc::new(NavGraphStore::load(&InMemoryConnectivity::new().with(g), ["stairs"]).unwrap());
        let oracle = ShortestPathOracle::new(&graphs);
        let mut sim = GraphSimulatorFactory::new(Arc::clone(&graphs))
            .create(&SimulatorSettings::default())
            .unwrap();
        sim.new_episode("stairs", "foot", 0.0, 0.0).unwrap();

        let mut actions = Vec::new();
        for _ in 0..MAX_TURNS_BETWEEN_MOVES * 3 {
            let action = oracle.teacher_action(&sim.state().unwrap(), "landing").unwrap();
            if action.is_noop() {
                break;
            }
            sim.make_action(action).unwrap();
            actions.push(action);
        }
        assert_eq!(sim.state().unwrap().viewpoint_id(), "landing");
        assert_eq!(
            actions,
            vec![
                PrimitiveAction::LOOK_UP,
                PrimitiveAction::move_to(1),
                PrimitiveAction::move_to(1),
            ]
        );
    }

    #[test]
    fn test_oracle_levels_tilted_camera_first() {
        let graphs = graphs();
        let factory = GraphSimulatorFactory::new(Arc::clone(&graphs));
        let mut sim = factory.create(&SimulatorSettings::default()).unwrap();
        // looking down and away from b
        sim.new_episode("house", "a", 3.0, -0.5).unwrap();
        let action = ShortestPathOracle::new(&graphs)
            .teacher_action(&sim.state().unwrap(), "c")
            .unwrap();
        assert_eq!(action, PrimitiveAction::LOOK_UP);
    }
}
