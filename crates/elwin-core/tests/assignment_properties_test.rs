//! Statistical and structural properties of assignment over the example
//! configuration.

use std::collections::HashMap;

use elwin_core::example::{EXAMPLE_TEAM, example_namespaces_with_rng};
use elwin_core::{EngineConfig, Namespace, Registry, SEGMENT_COUNT, SegmentSet, UnitMap};
use rand::SeedableRng;
use rand::rngs::StdRng;

const USERS: usize = 10_000;

fn registry(seed: u64) -> Registry {
    let registry = Registry::new(EngineConfig::default());
    let namespaces = example_namespaces_with_rng(&mut StdRng::seed_from_u64(seed)).expect("example");
    registry.publish(namespaces).expect("publish");
    registry
}

fn user(i: usize) -> String {
    format!("user-{i:05}")
}

#[test]
fn t1_always_assigns_b_or_c() {
    let registry = registry(1);
    let mut counts: HashMap<String, usize> = HashMap::new();
    for i in 0..USERS {
        let resp = registry.resolve_user(EXAMPLE_TEAM, &user(i)).expect("resolve");
        let a = resp.value("uniform", "a").expect("t1 covers every segment");
        *counts.entry(a.to_string()).or_default() += 1;
    }
    assert_eq!(counts.len(), 2, "{counts:?}");
    for choice in ["b", "c"] {
        let share = counts[choice] as f64 / USERS as f64;
        assert!((0.45..0.55).contains(&share), "{choice}: {share}");
    }
}

#[test]
fn t2_weighted_two_to_one() {
    let registry = registry(2);
    let (mut on, mut off) = (0usize, 0usize);
    for i in 0..USERS {
        let resp = registry.resolve_user(EXAMPLE_TEAM, &user(i)).expect("resolve");
        match resp.value("weighted", "b") {
            Some("on") => on += 1,
            Some("off") => off += 1,
            other => panic!("unexpected {other:?}"),
        }
    }
    let ratio = on as f64 / off as f64;
    assert!((1.75..2.25).contains(&ratio), "on={on} off={off}");
}

#[test]
fn t3_assigns_about_half() {
    let registry = registry(3);
    let assigned = (0..USERS)
        .filter(|&i| {
            registry
                .resolve_user(EXAMPLE_TEAM, &user(i))
                .expect("resolve")
                .get("halfSegments")
                .is_some()
        })
        .count();
    let share = assigned as f64 / USERS as f64;
    assert!((0.42..0.58).contains(&share), "assigned share {share}");
}

#[test]
fn t4_params_are_independent_and_stable() {
    let registry = registry(4);
    let mut joint: HashMap<(String, String), usize> = HashMap::new();
    for i in 0..USERS {
        let id = user(i);
        let resp = registry.resolve_user(EXAMPLE_TEAM, &id).expect("resolve");
        let a = resp.value("multi", "a").expect("a").to_string();
        let b = resp.value("multi", "b").expect("b").to_string();
        let again = registry.resolve_user(EXAMPLE_TEAM, &id).expect("resolve");
        assert_eq!(resp, again);
        *joint.entry((a, b)).or_default() += 1;
    }
    assert_eq!(joint.len(), 4, "{joint:?}");

    // P(a = on | b) should not depend on b.
    for b in ["up", "down"] {
        let on = joint[&("on".to_string(), b.to_string())] as f64;
        let off = joint[&("off".to_string(), b.to_string())] as f64;
        let share = on / (on + off);
        assert!((0.44..0.56).contains(&share), "P(a=on | b={b}) = {share}");
    }
    let down: usize = joint.iter().filter(|((_, b), _)| b == "down").map(|(_, n)| n).sum();
    let share = down as f64 / USERS as f64;
    assert!((0.62..0.72).contains(&share), "P(b=down) = {share}");
}

#[test]
fn same_config_same_answers_across_registries() {
    let one = registry(9);
    let two = registry(9);
    for i in 0..500 {
        let id = user(i);
        assert_eq!(
            one.resolve_user(EXAMPLE_TEAM, &id).expect("one"),
            two.resolve_user(EXAMPLE_TEAM, &id).expect("two")
        );
    }
}

#[test]
fn unknown_team_gets_nothing() {
    let registry = registry(5);
    let resp = registry.resolve_user("nobody", "user-1").expect("resolve");
    assert!(resp.is_empty());
}

#[test]
fn missing_unit_hashes_as_empty_value() {
    let registry = registry(6);
    let none = registry.namespaces(EXAMPLE_TEAM, &UnitMap::new()).expect("resolve");
    let empty = registry.resolve_user(EXAMPLE_TEAM, "").expect("resolve");
    assert_eq!(none, empty);
    assert!(none.get("uniform").is_some());
}

fn crowded_namespace(seed: u64) -> Namespace {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ns = Namespace::new("crowded", EXAMPLE_TEAM, ["userid"]).expect("ns");
    for (i, n) in [40, 30, 20, 10, 5].into_iter().enumerate() {
        ns.add_experiment_with_rng(
            format!("e{i}"),
            vec![elwin_core::Param::uniform("p", ["x"]).expect("p")],
            n,
            &mut rng,
        )
        .expect("exp");
    }
    ns
}

#[test]
fn experiments_tile_the_namespace() {
    for seed in 0..20 {
        let ns = crowded_namespace(seed);
        ns.validate().expect("valid");
        let mut covered = *ns.segments();
        for (i, a) in ns.experiments().iter().enumerate() {
            for b in &ns.experiments()[i + 1..] {
                assert!(a.segments().is_disjoint(b.segments()));
            }
            assert!(a.segments().is_disjoint(ns.segments()));
            covered = covered.union(a.segments());
        }
        assert_eq!(covered, SegmentSet::full());
        assert_eq!(ns.segments().count(), SEGMENT_COUNT - 105);
    }
}

#[test]
fn at_most_one_experiment_per_namespace() {
    let ns = crowded_namespace(7);
    let mut per_experiment: HashMap<String, usize> = HashMap::new();
    let mut unassigned = 0;
    for i in 0..USERS {
        let units = UnitMap::from([("userid".to_string(), user(i))]);
        match ns.eval("choices", &ns.project(&units)).expect("eval") {
            Some(assignment) => *per_experiment.entry(assignment.experiment).or_default() += 1,
            None => unassigned += 1,
        }
    }
    let assigned: usize = per_experiment.values().sum();
    assert_eq!(assigned + unassigned, USERS);
    // e0 owns 40 of 128 segments, e4 owns 5.
    assert!(per_experiment["e0"] > per_experiment["e4"] * 4);
}

#[test]
fn sampling_is_fair_across_slots() {
    let mut rng = StdRng::seed_from_u64(42);
    let trials = 2_000;
    let mut hits = [0usize; SEGMENT_COUNT];
    for _ in 0..trials {
        let mut pool = SegmentSet::full();
        let picked = pool.sample(8, &mut rng).expect("sample");
        assert_eq!(picked.count(), 8);
        assert_eq!(pool.count(), SEGMENT_COUNT - 8);
        assert!(picked.is_disjoint(&pool));
        for slot in picked.iter() {
            hits[slot] += 1;
        }
    }
    // Expected 125 per slot.
    for (slot, &n) in hits.iter().enumerate() {
        assert!((70..=180).contains(&n), "slot {slot} hit {n} times");
    }
}
