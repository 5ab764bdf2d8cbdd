//! Shared fixtures for the elwin benches.

use elwin_core::{ConfigError, EngineConfig, Namespace, Param, Registry, UnitMap};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub const BENCH_TEAM: &str = "bench";

/// `count` namespaces for [`BENCH_TEAM`], each split between four
/// experiments of 24 segments with two params apiece. 32 segments stay free.
pub fn namespaces(count: usize, seed: u64) -> Result<Vec<Namespace>, ConfigError> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let mut ns = Namespace::new(format!("ns{i}"), BENCH_TEAM, ["userid", "device"])?;
            for e in 0..4 {
                ns.add_experiment_with_rng(
                    format!("ns{i}-e{e}"),
                    vec![
                        Param::uniform("color", ["red", "green", "blue"])?,
                        Param::weighted("size", ["s", "m", "l"], vec![1.0, 3.0, 1.0])?,
                    ],
                    24,
                    &mut rng,
                )?;
            }
            Ok(ns)
        })
        .collect()
}

/// A registry serving [`namespaces`].
pub fn registry(count: usize, seed: u64) -> Result<Registry, ConfigError> {
    let registry = Registry::new(EngineConfig::default());
    registry.publish(namespaces(count, seed)?)?;
    Ok(registry)
}

#[must_use]
pub fn units(user: u64) -> UnitMap {
    UnitMap::from([
        ("userid".to_string(), format!("user-{user}")),
        ("device".to_string(), "ios".to_string()),
    ])
}
