use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::ContactId;

/// A merge-code name, stored without the surrounding braces.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(String);

impl Token {
    /// Accepts `case_number`, `{{case_number}}` or `{{ case_number }}`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let inner = trimmed
            .strip_prefix("{{")
            .and_then(|s| s.strip_suffix("}}"))
            .unwrap_or(trimmed);
        Token(inner.trim().to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// The placeholder as it appears in template text.
    pub fn literal(&self) -> String {
        format!("{{{{{}}}}}", self.0)
    }

    /// Numeric id of a dynamic token such as `loc_cf_21` for prefix `loc_cf_`.
    pub fn dynamic_id(&self, prefix: &str) -> Option<i64> {
        self.0.strip_prefix(prefix)?.parse().ok()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal())
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Token::parse(raw)
    }
}

/// Outcome of resolving one token.
///
/// `Unresolved` is kept distinct from an empty string until the map is
/// serialized, where it turns back into the literal placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    Resolved(String),
    Unresolved(Token),
}

impl TokenValue {
    pub fn resolved(value: impl Into<String>) -> Self {
        TokenValue::Resolved(value.into())
    }

    /// Resolved when `value` is present and non-blank, otherwise unresolved.
    pub fn or_unresolved(value: Option<String>, token: &Token) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => TokenValue::Resolved(v),
            _ => TokenValue::Unresolved(token.clone()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, TokenValue::Resolved(_))
    }

    /// Text to substitute into the template.
    pub fn text(&self) -> String {
        match self {
            TokenValue::Resolved(v) => v.clone(),
            TokenValue::Unresolved(token) => token.literal(),
        }
    }
}

/// `token -> value` for one rendering of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTokenMap {
    entries: BTreeMap<Token, TokenValue>,
}

impl ResolvedTokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: Token, value: TokenValue) {
        self.entries.insert(token, value);
    }

    pub fn insert_unresolved(&mut self, token: &Token) {
        self.entries.insert(token.clone(), TokenValue::Unresolved(token.clone()));
    }

    pub fn get(&self, token: &str) -> Option<&TokenValue> {
        self.entries.get(&Token::parse(token))
    }

    /// Substitution text for `token`, braces optional.
    pub fn text(&self, token: &str) -> Option<String> {
        self.get(token).map(TokenValue::text)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.get(token).is_some()
    }

    /// Key union; entries from `other` win on collision.
    pub fn merge(&mut self, other: ResolvedTokenMap) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unresolved_count(&self) -> usize {
        self.entries.values().filter(|v| !v.is_resolved()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Token, &TokenValue)> {
        self.entries.iter()
    }
}

impl Serialize for ResolvedTokenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (token, value) in &self.entries {
            map.serialize_entry(&token.literal(), &value.text())?;
        }
        map.end()
    }
}

/// One token map per contact for personalized categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerRecipientTokenMap {
    recipients: BTreeMap<ContactId, ResolvedTokenMap>,
}

impl PerRecipientTokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, contact_id: ContactId, tokens: ResolvedTokenMap) {
        self.recipients.insert(contact_id, tokens);
    }

    pub fn get(&self, contact_id: ContactId) -> Option<&ResolvedTokenMap> {
        self.recipients.get(&contact_id)
    }

    pub fn contact_ids(&self) -> Vec<ContactId> {
        self.recipients.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContactId, &ResolvedTokenMap)> {
        self.recipients.iter()
    }
}

impl Serialize for PerRecipientTokenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.recipients.len()))?;
        for (contact_id, tokens) in &self.recipients {
            map.serialize_entry(&contact_id.to_string(), tokens)?;
        }
        map.end()
    }
}
