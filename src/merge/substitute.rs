use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::token::ResolvedTokenMap;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid"));

/// Replaces every `{{token}}` found in `maps` with its text. Placeholders no
/// map knows are left untouched. Earlier maps take precedence.
///
/// Used for previews; production callers substitute on their side.
pub fn substitute(text: &str, maps: &[&ResolvedTokenMap]) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            maps.iter()
                .find_map(|m| m.text(&caps[1]))
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Names of all placeholders in `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::token::{Token, TokenValue};

    #[test]
    fn test_substitute_known_and_unknown_placeholders() {
        let mut map = ResolvedTokenMap::new();
        map.insert(Token::parse("case_number"), TokenValue::resolved("CE-2024-001"));
        map.insert_unresolved(&Token::parse("loc_cf_21"));

        let out = substitute("Case {{case_number}} / {{ loc_cf_21 }} / {{unknown}}", &[&map]);
        assert_eq!(out, "Case CE-2024-001 / {{loc_cf_21}} / {{unknown}}");
    }

    #[test]
    fn test_earlier_map_wins() {
        let mut first = ResolvedTokenMap::new();
        first.insert(Token::parse("recipient_case_role"), TokenValue::resolved("Owner"));
        let mut second = ResolvedTokenMap::new();
        second.insert(Token::parse("recipient_case_role"), TokenValue::resolved("Tenant"));

        assert_eq!(substitute("{{recipient_case_role}}", &[&first, &second]), "Owner");
    }

    #[test]
    fn test_placeholders_in_order() {
        assert_eq!(
            placeholders("{{a}} text {{ b_2 }} {{a}}"),
            vec!["a".to_string(), "b_2".to_string(), "a".to_string()]
        );
    }
}
