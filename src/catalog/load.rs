use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::record::{FlowRecord, or_unknown};

/// Everything the diagram consumes from the flow catalogue service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalogue {
    pub flows: Vec<FlowRecord>,
    pub systems: Vec<String>,
    pub formats: Vec<String>,
    pub transmission_methods: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCatalogue {
    #[serde(default, alias = "data_flows")]
    flows: Vec<FlowRecord>,
    #[serde(default)]
    systems: Vec<String>,
    #[serde(default)]
    formats: Vec<String>,
    #[serde(default)]
    transmission_methods: Vec<String>,
}

impl Catalogue {
    fn assemble(raw: RawCatalogue) -> Self {
        let RawCatalogue {
            flows,
            systems,
            formats,
            transmission_methods,
        } = raw;

        let systems = if systems.is_empty() {
            sorted_unique(
                flows
                    .iter()
                    .flat_map(|flow| [flow.source().to_owned(), flow.target().to_owned()]),
            )
        } else {
            systems
        };
        let formats = if formats.is_empty() {
            sorted_unique(flows.iter().map(|flow| flow.format_label().to_owned()))
        } else {
            formats
        };
        let transmission_methods = if transmission_methods.is_empty() {
            sorted_unique(
                flows
                    .iter()
                    .map(|flow| flow.transmission_method.trim().to_owned())
                    .filter(|method| !method.is_empty()),
            )
        } else {
            transmission_methods
        };

        Self {
            flows,
            systems,
            formats,
            transmission_methods,
        }
    }

    pub fn flow(&self, flow_id: &str) -> Option<&FlowRecord> {
        self.flows.iter().find(|flow| flow.id == flow_id)
    }
}

fn sorted_unique(values: impl Iterator<Item = String>) -> Vec<String> {
    values
        .map(|value| or_unknown(&value).to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Accepts either a catalogue object (`{"flows": [...], "systems": [...]}`)
/// or a bare array of flow records.
pub fn parse_catalogue(raw: &str) -> Result<Catalogue> {
    let parsed: Value = serde_json::from_str(raw).context("invalid catalogue JSON")?;

    let raw_catalogue = match parsed {
        Value::Array(_) => RawCatalogue {
            flows: Vec::<FlowRecord>::deserialize(parsed)
                .context("invalid flow record array")?,
            ..RawCatalogue::default()
        },
        Value::Object(_) => {
            RawCatalogue::deserialize(parsed).context("invalid catalogue object")?
        }
        _ => return Err(anyhow!("unexpected JSON type for a flow catalogue")),
    };

    Ok(Catalogue::assemble(raw_catalogue))
}

pub fn load_catalogue(path: &Path) -> Result<Catalogue> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read flow catalogue {}", path.display()))?;
    let catalogue = parse_catalogue(&raw)
        .with_context(|| format!("failed to parse flow catalogue {}", path.display()))?;

    if catalogue.flows.is_empty() {
        tracing::warn!(path = %path.display(), "flow catalogue contains no flows");
    }
    tracing::info!(
        flows = catalogue.flows.len(),
        systems = catalogue.systems.len(),
        formats = catalogue.formats.len(),
        "loaded flow catalogue"
    );

    Ok(catalogue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_missing_lists_from_flows() {
        let catalogue = parse_catalogue(
            r#"[
                {"id": "1", "source_system": "VHP", "target_system": "MIRA", "format": "NOMINT",
                 "transmission_method": "AS4"},
                {"id": "2", "source_system": "MIRA", "target_system": "", "format": null}
            ]"#,
        )
        .expect("valid catalogue");

        assert_eq!(catalogue.systems, vec!["MIRA", "Unknown", "VHP"]);
        assert_eq!(catalogue.formats, vec!["NOMINT", "Unknown"]);
        assert_eq!(catalogue.transmission_methods, vec!["AS4"]);
    }

    #[test]
    fn keeps_explicit_system_list() {
        let catalogue = parse_catalogue(
            r#"{"flows": [], "systems": ["GAS-X-GRID", "Marktpartner"]}"#,
        )
        .expect("valid catalogue");

        assert_eq!(catalogue.systems, vec!["GAS-X-GRID", "Marktpartner"]);
        assert!(catalogue.flows.is_empty());
    }

    #[test]
    fn rejects_scalar_json() {
        assert!(parse_catalogue("42").is_err());
    }
}
