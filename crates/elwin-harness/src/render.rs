//! Stable rendering of resolved assignments.
//!
//! JSON is the primary artifact; the plain form is one line per param, sorted
//! by experiment then param order, for eyeballing and diffs.

use std::collections::BTreeMap;

use elwin_core::{ParamValue, Response};
use serde::Serialize;

use crate::{HarnessError, OutputFormat};

#[derive(Debug, Serialize)]
struct ResolveOutput<'a> {
    team_id: &'a str,
    generation: u64,
    experiments: &'a BTreeMap<String, Vec<ParamValue>>,
}

pub fn render_response(
    team_id: &str,
    generation: u64,
    response: &Response,
    format: OutputFormat,
) -> Result<String, HarnessError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&ResolveOutput {
            team_id,
            generation,
            experiments: &response.experiments,
        })?),
        OutputFormat::Plain => Ok(render_plain(team_id, generation, response)),
    }
}

#[must_use]
pub fn render_plain(team_id: &str, generation: u64, response: &Response) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    writeln!(
        out,
        "team={team_id} generation={generation} experiments={}",
        response.len()
    )
    .ok();
    if response.is_empty() {
        writeln!(out, "(no assignments)").ok();
    }
    for (experiment, params) in &response.experiments {
        for param in params {
            writeln!(out, "{experiment:<24} {:<16} {}", param.name, param.value).ok();
        }
    }
    out
}
