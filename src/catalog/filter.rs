use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::record::FlowRecord;

/// Exact-match criteria chosen in the filter bar. Unset criteria match all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlowFilter {
    pub source_system: Option<String>,
    pub target_system: Option<String>,
    pub format: Option<String>,
    pub transmission_method: Option<String>,
}

impl FlowFilter {
    pub fn is_empty(&self) -> bool {
        self.source_system.is_none()
            && self.target_system.is_none()
            && self.format.is_none()
            && self.transmission_method.is_none()
    }

    pub fn matches(&self, flow: &FlowRecord) -> bool {
        criterion_matches(self.source_system.as_deref(), flow.source())
            && criterion_matches(self.target_system.as_deref(), flow.target())
            && criterion_matches(self.format.as_deref(), flow.format_label())
            && criterion_matches(
                self.transmission_method.as_deref(),
                flow.transmission_method.trim(),
            )
    }

    pub fn apply<'a>(&self, flows: &'a [FlowRecord]) -> Vec<&'a FlowRecord> {
        flows.iter().filter(|flow| self.matches(flow)).collect()
    }
}

fn criterion_matches(criterion: Option<&str>, value: &str) -> bool {
    criterion.is_none_or(|expected| expected == value)
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn flow_score(matcher: &SkimMatcherV2, flow: &FlowRecord, query: &str) -> Option<i64> {
    let fields = [
        flow.id.as_str(),
        flow.name.as_str(),
        flow.description.as_str(),
        flow.source(),
        flow.target(),
        flow.format_label(),
        flow.transmission_method.as_str(),
    ];

    fields
        .into_iter()
        .chain(flow.process_steps.iter().map(|step| step.interface_id()))
        .filter(|text| !text.is_empty())
        .filter_map(|text| fuzzy_match_score(matcher, text, query))
        .max()
}

/// Free-text search over flows, best match first. An empty query returns
/// nothing rather than everything.
pub fn search_flows<'a>(flows: &'a [FlowRecord], query: &str) -> Vec<&'a FlowRecord> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = flows
        .iter()
        .enumerate()
        .filter_map(|(index, flow)| {
            flow_score(&matcher, flow, query).map(|score| (score, index, flow))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, flow)| flow).collect()
}

pub fn matching_systems<'a>(systems: &'a [String], query: &str) -> Vec<&'a str> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    systems
        .iter()
        .filter(|system| fuzzy_match_score(&matcher, system, query).is_some())
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ProcessStep, StepType};

    fn flows() -> Vec<FlowRecord> {
        vec![
            FlowRecord::new("1", "MIRA", "VHP", "NOMINT")
                .with_name("Nomination to hub")
                .with_transmission_method("AS4"),
            FlowRecord::new("2", "VHP", "Marktpartner", "NOMRES")
                .with_transmission_method("Email")
                .with_step(ProcessStep::new(StepType::Delivery, "EDI-Gateway")),
        ]
    }

    #[test]
    fn empty_filter_matches_everything() {
        let flows = flows();
        assert!(FlowFilter::default().is_empty());
        assert_eq!(FlowFilter::default().apply(&flows).len(), 2);
    }

    #[test]
    fn criteria_combine_conjunctively() {
        let flows = flows();
        let filter = FlowFilter {
            source_system: Some("VHP".to_owned()),
            transmission_method: Some("AS4".to_owned()),
            ..FlowFilter::default()
        };
        assert!(filter.apply(&flows).is_empty());

        let filter = FlowFilter {
            source_system: Some("VHP".to_owned()),
            ..FlowFilter::default()
        };
        let matched = filter.apply(&flows);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "2");
    }

    #[test]
    fn search_reaches_interface_names() {
        let flows = flows();
        let results = search_flows(&flows, "gateway");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "2");
        assert!(search_flows(&flows, "   ").is_empty());
    }

    #[test]
    fn system_search_is_case_insensitive() {
        let systems = vec!["GAS-X-GRID".to_owned(), "VHP".to_owned()];
        assert_eq!(matching_systems(&systems, "grid"), vec!["GAS-X-GRID"]);
    }
}
