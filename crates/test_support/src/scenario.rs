//! Render scenarios stored as TOML.
//!
//! ```toml
//! format = "verbatim-scenarios-v1"
//!
//! [[case]]
//! id = "basic"
//! template = "<div>{{ idomVerbatim html }}</div>"
//!
//! [[case.step]]
//! data = { html = "<h1>Hi</h1>" }
//! expect = "<div><h1>Hi</h1></div>"
//! structural_writes = 2
//! ```
//!
//! Steps of one case run in order against the same tree. A missing `data`
//! key is `null` in the template.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const SCENARIO_FORMAT_V1: &str = "verbatim-scenarios-v1";

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Patch a live tree.
    #[default]
    Dom,
    /// Render to a string.
    Text,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScenarioFile {
    pub format: String,
    #[serde(rename = "case", default)]
    pub cases: Vec<Scenario>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub template: String,
    #[serde(default)]
    pub backend: Backend,
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub data: serde_json::Value,
    pub expect: String,
    /// Expected number of insert/append/remove operations, when checked.
    #[serde(default)]
    pub structural_writes: Option<usize>,
}

/// Load and validate a scenario file. Panics with the file path on any error.
pub fn load_scenarios(path: &Path) -> Vec<Scenario> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read scenario file {path:?}: {err}"));
    let file: ScenarioFile = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse scenario file {path:?}: {err}"));
    assert_eq!(
        file.format, SCENARIO_FORMAT_V1,
        "unsupported scenario format in {path:?}"
    );
    let mut seen = BTreeSet::new();
    for case in &file.cases {
        assert!(
            seen.insert(case.id.as_str()),
            "duplicate scenario id in {path:?}: {}",
            case.id
        );
        assert!(
            !case.steps.is_empty(),
            "scenario {} in {path:?} has no steps",
            case.id
        );
    }
    file.cases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_tables_as_json_data() {
        let file: ScenarioFile = toml::from_str(
            r#"
            format = "verbatim-scenarios-v1"

            [[case]]
            id = "a"
            template = "<p>{{ v html }}</p>"
            backend = "text"

            [[case.step]]
            data = { html = "<b>x</b>", n = 3 }
            expect = "<p><b>x</b></p>"

            [[case.step]]
            expect = "<p></p>"
            structural_writes = 0
            "#,
        )
        .expect("parse");
        let case = &file.cases[0];
        assert_eq!(case.backend, Backend::Text);
        assert_eq!(case.steps[0].data["html"], "<b>x</b>");
        assert_eq!(case.steps[0].data["n"], 3);
        assert!(case.steps[1].data.is_null());
        assert_eq!(case.steps[1].structural_writes, Some(0));
    }
}
