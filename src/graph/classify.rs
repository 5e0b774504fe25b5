/// Palette slot a classification group is painted with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    Primary,
    Secondary,
    Tertiary,
    Accent1,
    Accent2,
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SystemGroup {
    MarketPartnerSystem,
    ExternalPartner,
    NetworkOperation,
    BalanceGroupNetwork,
    VirtualHubPortal,
    Unclassified,
}

impl SystemGroup {
    pub fn color_slot(self) -> ColorSlot {
        match self {
            Self::MarketPartnerSystem => ColorSlot::Primary,
            Self::ExternalPartner => ColorSlot::Tertiary,
            Self::NetworkOperation => ColorSlot::Secondary,
            Self::BalanceGroupNetwork => ColorSlot::Accent1,
            Self::VirtualHubPortal => ColorSlot::Accent2,
            Self::Unclassified => ColorSlot::Neutral,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::MarketPartnerSystem => "Market Partner System",
            Self::ExternalPartner => "External Partner",
            Self::NetworkOperation => "Network Operation",
            Self::BalanceGroupNetwork => "Balance Group Network",
            Self::VirtualHubPortal => "Virtual Hub Portal",
            Self::Unclassified => "System",
        }
    }
}

// Order is precedence: the first rule with a matching marker wins.
const SYSTEM_RULES: [(&[&str], SystemGroup); 5] = [
    (&["MIRA", "MISA"], SystemGroup::MarketPartnerSystem),
    (&["Marktpartner"], SystemGroup::ExternalPartner),
    (&["GAS-X-GRID"], SystemGroup::NetworkOperation),
    (&["GAS-X-BKN", "GAS-X-BEN"], SystemGroup::BalanceGroupNetwork),
    (&["VHP"], SystemGroup::VirtualHubPortal),
];

const HUB_MARKERS: [&str; 3] = ["MIRA", "GAS-X", "VHP"];

pub fn classify_system(name: &str) -> SystemGroup {
    SYSTEM_RULES
        .iter()
        .find(|(markers, _)| markers.iter().any(|marker| name.contains(marker)))
        .map(|(_, group)| *group)
        .unwrap_or(SystemGroup::Unclassified)
}

/// Hub systems sit on the outer ring of the technical layout.
pub fn is_hub_system(name: &str) -> bool {
    HUB_MARKERS.iter().any(|marker| name.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        assert_eq!(classify_system("MIRA-Marktpartner"), SystemGroup::MarketPartnerSystem);
        assert_eq!(classify_system("Marktpartner VHP"), SystemGroup::ExternalPartner);
        assert_eq!(classify_system("GAS-X-BEN"), SystemGroup::BalanceGroupNetwork);
        assert_eq!(classify_system("GAS-X-GRID"), SystemGroup::NetworkOperation);
    }

    #[test]
    fn unmatched_and_blank_names_are_unclassified() {
        assert_eq!(classify_system("SAP"), SystemGroup::Unclassified);
        assert_eq!(classify_system(""), SystemGroup::Unclassified);
        assert_eq!(SystemGroup::Unclassified.color_slot(), ColorSlot::Neutral);
    }

    #[test]
    fn hubs_follow_their_own_markers() {
        assert!(is_hub_system("GAS-X-GRID"));
        assert!(is_hub_system("VHP Portal"));
        assert!(!is_hub_system("MISA"));
        assert!(!is_hub_system("Marktpartner"));
    }
}
