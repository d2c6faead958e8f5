use std::sync::Arc;
use tracing::debug;

use super::MergeRequest;
use crate::app::ports::{ConfigRepository, MergeSnapshot};
use crate::config::DateFormats;
use crate::constants::*;
use crate::domain::{MunicipalCode, ResolutionAction};
use crate::error::{MergeError, Result};
use crate::merge::{ResolvedTokenMap, TableCategory, TokenValue};
use crate::observability::metrics;
use crate::render::TableSpec;

/// Resolves the municipal code tables for the violations cited in a notice.
pub struct MunicipalCodeTableResolver {
    config: Arc<dyn ConfigRepository>,
    dates: DateFormats,
}

impl MunicipalCodeTableResolver {
    pub fn new(snapshot: &MergeSnapshot, dates: DateFormats) -> Self {
        Self {
            config: snapshot.config.clone(),
            dates,
        }
    }

    pub async fn resolve_tables(&self, req: &MergeRequest<'_>) -> Result<ResolvedTokenMap> {
        let tokens = req.template.declared_tokens(TableCategory::MunicipalCode);

        let ids = req.context.unique_violation_ids();
        let violations = if ids.is_empty() {
            Vec::new()
        } else {
            self.config.configured_violations(req.agency_id, &ids).await?
        };
        if violations.is_empty() {
            return Err(MergeError::invalid(format!(
                "no configured violations match the open violations of case {}",
                req.case_id
            )));
        }

        // One entry per article, in violation order
        let mut codes: Vec<&MunicipalCode> = Vec::new();
        for code in violations.iter().filter_map(|v| v.municipal_code.as_ref()) {
            if !codes.iter().any(|c| c.article_number == code.article_number) {
                codes.push(code);
            }
        }

        let actions = &req.context.resolution_actions;
        let mut resolved = ResolvedTokenMap::new();
        for token in &tokens {
            let value = match token.name() {
                MUNICIPAL_CODE_DESCRIPTIONS => Some(description_table(&codes)?),
                MUNICIPAL_CODE_RESOLUTIONS_WITH_COMPLY_BY => {
                    self.resolution_table(&codes, actions, true)?
                }
                MUNICIPAL_CODE_RESOLUTIONS => self.resolution_table(&codes, actions, false)?,
                _ => None,
            };
            resolved.insert(token.clone(), TokenValue::or_unresolved(value, token));
        }

        debug!(
            "Resolved {} municipal code tables for case {} from {} articles and {} actions",
            resolved.len(),
            req.case_id,
            codes.len(),
            actions.len()
        );
        Ok(resolved)
    }

    /// Article / Resolution (/ Comply By) rows for each action whose article
    /// is cited. `None` when no action matches.
    fn resolution_table(
        &self,
        codes: &[&MunicipalCode],
        actions: &[ResolutionAction],
        with_comply_by: bool,
    ) -> Result<Option<String>> {
        let mut table = if with_comply_by {
            TableSpec::new(&CODE_RESOLUTION_WITH_COMPLY_BY_COLUMNS)
        } else {
            TableSpec::new(&CODE_RESOLUTION_COLUMNS)
        };

        for action in actions {
            let Some(code) = codes.iter().find(|c| c.article_number == action.article_number) else {
                continue;
            };
            let mut row = vec![code.article_number.clone(), code.resolution.clone()];
            if with_comply_by {
                row.push(
                    action
                        .comply_by_date
                        .map(|d| self.dates.numeric(d))
                        .unwrap_or_default(),
                );
            }
            table.push_row(row)?;
        }

        if table.is_empty() {
            return Ok(None);
        }
        metrics::merge::table_rendered("municipal_code_resolutions");
        Ok(Some(table.render()?))
    }
}

/// Article / Description, rendered even when no violation cites a code.
fn description_table(codes: &[&MunicipalCode]) -> Result<String> {
    let mut table = TableSpec::new(&CODE_DESCRIPTION_COLUMNS);
    for code in codes {
        table.push_row(vec![code.article_number.clone(), code.description.clone()])?;
    }
    metrics::merge::table_rendered("municipal_code_descriptions");
    Ok(table.render()?)
}
