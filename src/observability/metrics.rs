//! Metrics for merge-code resolution.
//!
//! Recorded through the `metrics` facade; without an installed recorder every
//! call is a no-op, so library users opt in by installing one.

use std::fmt;

/// Enum representing all metric names used by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    ResolutionsCompleted,
    ResolutionsFailed,
    TokensResolved,
    TokensUnresolved,
    RecipientsResolved,
    TablesRendered,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricName::ResolutionsCompleted => "notice_merge_resolutions_completed_total",
            MetricName::ResolutionsFailed => "notice_merge_resolutions_failed_total",
            MetricName::TokensResolved => "notice_merge_tokens_resolved_total",
            MetricName::TokensUnresolved => "notice_merge_tokens_unresolved_total",
            MetricName::RecipientsResolved => "notice_merge_recipients_resolved_total",
            MetricName::TablesRendered => "notice_merge_tables_rendered_total",
        };
        write!(f, "{}", name)
    }
}

pub mod merge {
    use super::MetricName;
    use crate::merge::{MergeCategory, ResolvedTokenMap};

    /// Record the resolved/unresolved split of one category's output
    pub fn category_resolved(category: MergeCategory, tokens: &ResolvedTokenMap) {
        let unresolved = tokens.unresolved_count();
        let resolved = tokens.len() - unresolved;
        ::metrics::counter!(MetricName::TokensResolved.to_string(), "category" => category.label())
            .increment(resolved as u64);
        ::metrics::counter!(MetricName::TokensUnresolved.to_string(), "category" => category.label())
            .increment(unresolved as u64);
    }

    pub fn recipients_resolved(count: usize) {
        ::metrics::counter!(MetricName::RecipientsResolved.to_string()).increment(count as u64);
    }

    pub fn table_rendered(table: &'static str) {
        ::metrics::counter!(MetricName::TablesRendered.to_string(), "table" => table).increment(1);
    }

    pub fn resolution_completed() {
        ::metrics::counter!(MetricName::ResolutionsCompleted.to_string()).increment(1);
    }

    /// Record a failed resolution by error kind
    pub fn resolution_failed(kind: &'static str) {
        ::metrics::counter!(MetricName::ResolutionsFailed.to_string(), "kind" => kind).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        for name in [
            MetricName::ResolutionsCompleted,
            MetricName::ResolutionsFailed,
            MetricName::TokensResolved,
            MetricName::TokensUnresolved,
            MetricName::RecipientsResolved,
            MetricName::TablesRendered,
        ] {
            let s = name.to_string();
            assert!(s.starts_with("notice_merge_") && s.ends_with("_total"), "{}", s);
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        merge::resolution_completed();
        merge::resolution_failed("invalid_request");
        merge::table_rendered("all_contacts");
    }
}
