//! Selector kinds and the typed element query vocabulary.

use serde::{Deserialize, Serialize};

/// How a selector string is interpreted when resolving elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectorKind {
    /// Match by accessibility identifier (falling back to label); the default.
    #[default]
    AccessibilityId,
    /// Alias for [`SelectorKind::AccessibilityId`].
    Id,
    /// Class-chain query delegated verbatim to the driver.
    ClassChain,
    /// Raw attribute predicate, e.g. `label CONTAINS 'Sign'`.
    Predicate,
    /// Exact label match.
    Label,
    /// Label substring match.
    LabelContains,
    /// Exact value match.
    Value,
    /// Value substring match.
    ValueContains,
}

impl SelectorKind {
    /// Parses the wire name, accepting the `id` alias; unknown names fall back
    /// to the default kind, matching lenient request handling.
    pub fn parse(name: &str) -> SelectorKind {
        match name {
            "accessibilityId" | "id" => SelectorKind::AccessibilityId,
            "classChain" => SelectorKind::ClassChain,
            "predicate" => SelectorKind::Predicate,
            "label" => SelectorKind::Label,
            "labelContains" => SelectorKind::LabelContains,
            "value" => SelectorKind::Value,
            "valueContains" => SelectorKind::ValueContains,
            _ => SelectorKind::AccessibilityId,
        }
    }
}

/// Element type shortcuts understood by typed queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementType {
    Button,
    StaticText,
    TextField,
    SecureTextField,
    TextView,
    Image,
    Cell,
    Switch,
    Slider,
    Table,
    CollectionView,
    Other,
    /// Wildcard used by pickers and descendant queries.
    Any,
}

impl ElementType {
    /// Fixed probe order for accessibility-id resolution: cheap typed queries
    /// first, the expensive match-any-descendant query only as a fallback.
    pub const PROBE_ORDER: [ElementType; 12] = [
        ElementType::Button,
        ElementType::StaticText,
        ElementType::TextField,
        ElementType::SecureTextField,
        ElementType::TextView,
        ElementType::Image,
        ElementType::Cell,
        ElementType::Switch,
        ElementType::Slider,
        ElementType::Table,
        ElementType::CollectionView,
        ElementType::Other,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_an_alias_for_accessibility_id() {
        assert_eq!(SelectorKind::parse("id"), SelectorKind::AccessibilityId);
        assert_eq!(SelectorKind::parse("accessibilityId"), SelectorKind::AccessibilityId);
    }

    #[test]
    fn unknown_kind_falls_back_to_the_default() {
        assert_eq!(SelectorKind::parse("xpath"), SelectorKind::AccessibilityId);
        assert_eq!(SelectorKind::default(), SelectorKind::AccessibilityId);
    }

    #[test]
    fn probe_order_starts_with_buttons_and_ends_with_other() {
        assert_eq!(ElementType::PROBE_ORDER.first(), Some(&ElementType::Button));
        assert_eq!(ElementType::PROBE_ORDER.last(), Some(&ElementType::Other));
        assert_eq!(ElementType::PROBE_ORDER.len(), 12);
    }
}
