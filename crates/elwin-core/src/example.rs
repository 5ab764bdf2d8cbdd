//! Reference configuration: four namespaces for team `test`.
//!
//! - `t1`: experiment `uniform`, `a` in `{b, c}`, every segment.
//! - `t2`: experiment `weighted`, `b` in `{on, off}` weighted `[2, 1]`, every segment.
//! - `t3`: experiment `halfSegments`, `b` = `on`, half the segments.
//! - `t4`: experiment `multi`, `a` uniform `{on, off}` and `b` weighted
//!   `{up, down}` `[1, 2]`, every segment.

use rand::Rng;

use crate::error::ConfigError;
use crate::experiment::Param;
use crate::namespace::Namespace;
use crate::registry::USER_ID_UNIT;
use crate::segments::SEGMENT_COUNT;

pub const EXAMPLE_TEAM: &str = "test";

pub fn example_namespaces() -> Result<Vec<Namespace>, ConfigError> {
    example_namespaces_with_rng(&mut rand::thread_rng())
}

pub fn example_namespaces_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
) -> Result<Vec<Namespace>, ConfigError> {
    let mut t1 = Namespace::new("t1", EXAMPLE_TEAM, [USER_ID_UNIT])?;
    t1.add_experiment_with_rng(
        "uniform",
        vec![Param::uniform("a", ["b", "c"])?],
        SEGMENT_COUNT,
        rng,
    )?;

    let mut t2 = Namespace::new("t2", EXAMPLE_TEAM, [USER_ID_UNIT])?;
    t2.add_experiment_with_rng(
        "weighted",
        vec![Param::weighted("b", ["on", "off"], vec![2.0, 1.0])?],
        SEGMENT_COUNT,
        rng,
    )?;

    let mut t3 = Namespace::new("t3", EXAMPLE_TEAM, [USER_ID_UNIT])?;
    t3.add_experiment_with_rng(
        "halfSegments",
        vec![Param::uniform("b", ["on"])?],
        SEGMENT_COUNT / 2,
        rng,
    )?;

    let mut t4 = Namespace::new("t4", EXAMPLE_TEAM, [USER_ID_UNIT])?;
    t4.add_experiment_with_rng(
        "multi",
        vec![
            Param::uniform("a", ["on", "off"])?,
            Param::weighted("b", ["up", "down"], vec![1.0, 2.0])?,
        ],
        SEGMENT_COUNT,
        rng,
    )?;

    Ok(vec![t1, t2, t3, t4])
}
