use std::sync::Arc;
use tracing::debug;

use super::MergeRequest;
use crate::app::ports::{CaseRepository, MergeSnapshot, UserRepository};
use crate::config::DateFormats;
use crate::constants::*;
use crate::domain::{CaseRecord, Signature, UserProfile};
use crate::error::{MergeError, Result};
use crate::merge::{FieldCategory, ResolvedTokenMap, Token, TokenValue};

/// Resolves case facts, assignee and acting-user merge fields.
pub struct CaseInformationResolver {
    cases: Arc<dyn CaseRepository>,
    users: Arc<dyn UserRepository>,
    dates: DateFormats,
}

/// Everything the case fields are computed from, loaded up front.
struct CaseFacts {
    case: CaseRecord,
    assignee: Option<UserProfile>,
    signature: Option<Signature>,
    inspector: Option<UserProfile>,
}

impl CaseInformationResolver {
    pub fn new(snapshot: &MergeSnapshot, dates: DateFormats) -> Self {
        Self {
            cases: snapshot.cases.clone(),
            users: snapshot.users.clone(),
            dates,
        }
    }

    pub async fn resolve_fields(&self, req: &MergeRequest<'_>) -> Result<ResolvedTokenMap> {
        let tokens = req.template.declared_tokens(FieldCategory::CaseInformation);

        let case = self
            .cases
            .find_case(req.agency_id, req.case_id)
            .await?
            .ok_or_else(|| MergeError::invalid(format!("case {} not found", req.case_id)))?;

        let assignee = self.selected_assignee(req, &case).await?;
        let signature = self.users.signature(req.agency_id, req.acting_user.id).await?;
        let inspector = match req.context.next_inspection.as_ref().and_then(|n| n.assignee_id) {
            Some(id) => self.users.find_user(req.agency_id, id).await?,
            None => None,
        };

        let facts = CaseFacts {
            case,
            assignee,
            signature,
            inspector,
        };

        let mut resolved = ResolvedTokenMap::new();
        for token in &tokens {
            let value = self.field_value(token, &facts, req);
            resolved.insert(token.clone(), TokenValue::or_unresolved(value, token));
        }

        debug!(
            "Resolved {} case information fields for case {} ({} unresolved)",
            resolved.len(),
            req.case_id,
            resolved.unresolved_count()
        );
        Ok(resolved)
    }

    /// The assignee chosen in the merge context, which must be allowed to
    /// work the case's violation types.
    async fn selected_assignee(&self, req: &MergeRequest<'_>, case: &CaseRecord) -> Result<Option<UserProfile>> {
        let Some(assignee_id) = req.context.case_assignee_id else {
            return Ok(None);
        };

        let eligible = self
            .users
            .eligible_assignees(req.agency_id, &case.config_violation_ids)
            .await?;

        eligible
            .into_iter()
            .find(|u| u.id == assignee_id)
            .map(Some)
            .ok_or_else(|| {
                MergeError::invalid(format!(
                    "user {} is not an eligible assignee for case {}",
                    assignee_id, case.case_number
                ))
            })
    }

    fn field_value(&self, token: &Token, facts: &CaseFacts, req: &MergeRequest<'_>) -> Option<String> {
        let case = &facts.case;
        let created = case.created_at.date_naive();
        let inspection_date = req.context.next_inspection.as_ref().map(|n| n.planned_date);

        match token.name() {
            CASE_NUMBER => Some(case.case_number.clone()),
            ISSUE_DESCRIPTION => case.issue_description.clone(),
            CASE_CREATED_DATE => Some(self.dates.numeric(created)),
            CASE_CREATED_DATE_TEXT => Some(self.dates.spelled(created)),
            CASE_CLOSED_DATE => case.closed_at.map(|c| self.dates.numeric(c.date_naive())),
            CASE_ASSIGNEE_LAST_FIRST => facts.assignee.as_ref().map(UserProfile::last_first),
            CASE_ASSIGNEE_FIRST_LAST => facts.assignee.as_ref().map(UserProfile::first_last),
            USER_LAST_FIRST => Some(req.acting_user.last_first()),
            USER_FIRST_LAST => Some(req.acting_user.first_last()),
            USER_SIGNATURE => facts.signature.as_ref().map(|s| s.block_text.clone()),
            USER_SIGNATURE_IMAGE => facts.signature.as_ref().and_then(|s| s.image_url.clone()),
            NEXT_INSPECTION_DATE => inspection_date.map(|d| self.dates.numeric(d)),
            NEXT_INSPECTION_DATE_TEXT => inspection_date.map(|d| self.dates.spelled(d)),
            NEXT_INSPECTION_ASSIGNEE => facts.inspector.as_ref().map(UserProfile::first_last),
            _ => None,
        }
    }
}
