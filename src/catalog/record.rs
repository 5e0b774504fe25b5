use serde::Deserialize;

/// Display name used wherever a flow record leaves a system or format blank.
pub const UNKNOWN: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepType {
    Reception,
    Delivery,
    Other(String),
}

impl StepType {
    pub fn label(&self) -> &str {
        match self {
            Self::Reception => "reception",
            Self::Delivery => "delivery",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl From<String> for StepType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "reception" => Self::Reception,
            "delivery" => Self::Delivery,
            _ => Self::Other(value),
        }
    }
}

impl<'de> Deserialize<'de> for StepType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Self::from(raw))
    }
}

impl Default for StepType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ProcessStep {
    #[serde(default)]
    pub step_type: StepType,
    #[serde(default, rename = "interface", deserialize_with = "nullable_string")]
    pub interface_name: String,
    #[serde(default)]
    pub position: Option<u32>,
}

impl ProcessStep {
    pub fn new(step_type: StepType, interface_name: impl Into<String>) -> Self {
        Self {
            step_type,
            interface_name: interface_name.into(),
            position: None,
        }
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn interface_id(&self) -> &str {
        self.interface_name.trim()
    }

    pub fn has_interface(&self) -> bool {
        !self.interface_id().is_empty()
    }
}

/// One data exchange between two systems, as delivered by the flow catalogue.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FlowRecord {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub source_system: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub target_system: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub format: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub transmission_method: String,
    #[serde(default, deserialize_with = "nullable_steps")]
    pub process_steps: Vec<ProcessStep>,
}

impl FlowRecord {
    pub fn new(
        id: impl Into<String>,
        source_system: impl Into<String>,
        target_system: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_system: source_system.into(),
            target_system: target_system.into(),
            format: format.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_transmission_method(mut self, method: impl Into<String>) -> Self {
        self.transmission_method = method.into();
        self
    }

    pub fn with_step(mut self, step: ProcessStep) -> Self {
        self.process_steps.push(step);
        self
    }

    pub fn node_id(&self) -> String {
        flow_node_id(&self.id)
    }

    pub fn source(&self) -> &str {
        or_unknown(&self.source_system)
    }

    pub fn target(&self) -> &str {
        or_unknown(&self.target_system)
    }

    pub fn format_label(&self) -> &str {
        or_unknown(&self.format)
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            self.name.as_str()
        }
    }

    pub fn touches(&self, system: &str) -> bool {
        self.source() == system || self.target() == system
    }

    /// Steps in traversal order: by `position` when every step carries one,
    /// record order otherwise.
    pub fn ordered_steps(&self) -> Vec<&ProcessStep> {
        let mut steps = self.process_steps.iter().collect::<Vec<_>>();
        if !steps.is_empty() && steps.iter().all(|step| step.position.is_some()) {
            steps.sort_by_key(|step| step.position.unwrap_or(0));
        }
        steps
    }

    /// Ordered steps that reference an interface; blank references are
    /// unresolvable and skipped.
    pub fn routed_steps(&self) -> Vec<&ProcessStep> {
        self.ordered_steps()
            .into_iter()
            .filter(|step| step.has_interface())
            .collect()
    }
}

pub fn flow_node_id(flow_id: &str) -> String {
    format!("flow-{flow_id}")
}

pub fn or_unknown(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() { UNKNOWN } else { trimmed }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_steps<'de, D>(deserializer: D) -> Result<Vec<ProcessStep>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ProcessStep>>::deserialize(deserializer)?.unwrap_or_default())
}

fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(id) => id,
        serde_json::Value::Number(id) => id.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_api_shaped_record() {
        let raw = r#"{
            "id": 7,
            "name": "Nomination",
            "source_system": "MIRA",
            "target_system": null,
            "format": "NOMINT",
            "process_steps": [
                {"step_type": "delivery", "interface": "IF-1", "position": 2},
                {"step_type": "reception", "interface": "IF-0", "position": 1}
            ]
        }"#;

        let record: FlowRecord = serde_json::from_str(raw).expect("valid record");
        assert_eq!(record.id, "7");
        assert_eq!(record.target(), UNKNOWN);
        assert_eq!(record.node_id(), "flow-7");

        let ordered = record
            .ordered_steps()
            .into_iter()
            .map(|step| step.interface_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ordered, vec!["IF-0", "IF-1"]);
        assert_eq!(record.ordered_steps()[0].step_type, StepType::Reception);
    }

    #[test]
    fn partial_positions_keep_record_order() {
        let record = FlowRecord::new("F", "A", "B", "X")
            .with_step(ProcessStep::new(StepType::Delivery, "IF-2").with_position(9))
            .with_step(ProcessStep::new(StepType::Reception, "IF-1"));

        let ordered = record
            .ordered_steps()
            .into_iter()
            .map(|step| step.interface_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ordered, vec!["IF-2", "IF-1"]);
    }

    #[test]
    fn blank_interfaces_are_not_routed() {
        let record = FlowRecord::new("F", "A", "B", "X")
            .with_step(ProcessStep::new(StepType::Delivery, "  "))
            .with_step(ProcessStep::new(StepType::Reception, "IF-1"));

        assert_eq!(record.routed_steps().len(), 1);
    }
}
