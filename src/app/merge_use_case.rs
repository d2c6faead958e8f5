use serde::Serialize;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

use crate::app::ports::SnapshotSource;
use crate::config::DateFormats;
use crate::domain::{AgencyId, CaseId, ContactId, MergeContext, NoticeTemplate, UserProfile};
use crate::error::{MergeError, Result};
use crate::merge::{self, FieldCategory, MergeCategory, PerRecipientTokenMap, ResolvedTokenMap, TableCategory};
use crate::observability::metrics;
use crate::resolvers::{
    CaseInformationResolver, ContactRecipientResolver, ContactTableResolver, LocationFieldResolver,
    LocationTableResolver, MergeRequest, MunicipalCodeTableResolver,
};

/// Tokens for one notice generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    /// Flat fields and tables shared by every rendering of the notice.
    pub tokens: ResolvedTokenMap,
    /// Personalized fields, present when the template references them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<PerRecipientTokenMap>,
}

impl MergeResult {
    /// Substitutes the resolved tokens into `text`, using `recipient`'s
    /// personalized fields when given.
    pub fn render(&self, text: &str, recipient: Option<ContactId>) -> String {
        let personal = recipient.and_then(|id| self.recipients.as_ref()?.get(id));
        match personal {
            Some(p) => merge::substitute(text, &[p, &self.tokens]),
            None => merge::substitute(text, &[&self.tokens]),
        }
    }
}

/// Use case resolving every merge code a notice template declares
pub struct NoticeMergeUseCase {
    source: Arc<dyn SnapshotSource>,
    dates: DateFormats,
}

impl NoticeMergeUseCase {
    pub fn new(source: Arc<dyn SnapshotSource>, dates: DateFormats) -> Self {
        Self { source, dates }
    }

    /// Create a use case with the default date formats
    pub fn with_default_dates(source: Arc<dyn SnapshotSource>) -> Self {
        Self::new(source, DateFormats::default())
    }

    /// Resolve all categories referenced by `template` for one case.
    ///
    /// Either every declared token comes back, resolved or literal, or the
    /// whole call fails.
    pub async fn resolve(
        &self,
        agency_id: AgencyId,
        case_id: CaseId,
        template: &NoticeTemplate,
        context: &MergeContext,
        acting_user: &UserProfile,
    ) -> Result<MergeResult> {
        let span = info_span!("resolve_notice", agency_id, case_id);
        let result = self
            .resolve_in_snapshot(agency_id, case_id, template, context, acting_user)
            .instrument(span)
            .await;

        match &result {
            Ok(_) => metrics::merge::resolution_completed(),
            Err(e) => metrics::merge::resolution_failed(e.kind()),
        }
        result
    }

    async fn resolve_in_snapshot(
        &self,
        agency_id: AgencyId,
        case_id: CaseId,
        template: &NoticeTemplate,
        context: &MergeContext,
        acting_user: &UserProfile,
    ) -> Result<MergeResult> {
        template.validate()?;
        if context.agency_id != agency_id || context.case_id != case_id {
            return Err(MergeError::invalid(format!(
                "merge context targets case {} of agency {}, request is for case {} of agency {}",
                context.case_id, context.agency_id, case_id, agency_id
            )));
        }

        let snapshot = self.source.open_snapshot(agency_id, case_id).await?;
        if snapshot.cases.find_case(agency_id, case_id).await?.is_none() {
            return Err(MergeError::invalid(format!("case {} not found", case_id)));
        }

        let categories = template.referenced_categories();
        let wants = |c: MergeCategory| categories.contains(&c);
        let req = MergeRequest::new(agency_id, case_id, template, context, acting_user);

        let case_resolver = CaseInformationResolver::new(&snapshot, self.dates.clone());
        let location_resolver = LocationFieldResolver::new(&snapshot);
        let recipient_resolver = ContactRecipientResolver::new(&snapshot);
        let contact_table_resolver = ContactTableResolver::new(&snapshot);
        let location_table_resolver = LocationTableResolver::new(&snapshot);
        let code_table_resolver = MunicipalCodeTableResolver::new(&snapshot, self.dates.clone());

        // Resolvers read disjoint data, so they run side by side
        let (
            mut case_information,
            mut location_fields,
            mut recipients,
            mut contact_tables,
            mut location_tables,
            mut code_tables,
        ) = tokio::try_join!(
            when(wants(FieldCategory::CaseInformation.into()), case_resolver.resolve_fields(&req)),
            when(wants(FieldCategory::Location.into()), location_resolver.resolve_fields(&req)),
            when(wants(FieldCategory::Recipient.into()), recipient_resolver.resolve_fields(&req)),
            when(wants(TableCategory::Contact.into()), contact_table_resolver.resolve_tables(&req)),
            when(wants(TableCategory::Location.into()), location_table_resolver.resolve_tables(&req)),
            when(wants(TableCategory::MunicipalCode.into()), code_table_resolver.resolve_tables(&req)),
        )?;

        let mut tokens = ResolvedTokenMap::new();
        let mut per_recipient = None;
        for category in &categories {
            let flat = match category {
                MergeCategory::Field(FieldCategory::CaseInformation) => case_information.take(),
                MergeCategory::Field(FieldCategory::Location) => location_fields.take(),
                MergeCategory::Field(FieldCategory::Recipient) => {
                    per_recipient = recipients.take();
                    continue;
                }
                MergeCategory::Table(TableCategory::Contact) => contact_tables.take(),
                MergeCategory::Table(TableCategory::Location) => location_tables.take(),
                MergeCategory::Table(TableCategory::MunicipalCode) => code_tables.take(),
            };
            let flat = flat.unwrap_or_default();
            metrics::merge::category_resolved(*category, &flat);
            tokens.merge(flat);
        }

        if let Some(recipients) = &per_recipient {
            check_recipient_selection(context, recipients)?;
            metrics::merge::recipients_resolved(recipients.len());
        }
        check_complete(template, &categories, &tokens, per_recipient.as_ref())?;

        info!(
            "Resolved {} tokens across {} categories ({} unresolved, {} recipients)",
            tokens.len(),
            categories.len(),
            tokens.unresolved_count(),
            per_recipient.as_ref().map(|r| r.len()).unwrap_or(0)
        );

        Ok(MergeResult {
            tokens,
            recipients: per_recipient,
        })
    }
}

/// Runs `fut` only for referenced categories.
async fn when<T, F>(wanted: bool, fut: F) -> Result<Option<T>>
where
    F: Future<Output = Result<T>>,
{
    if wanted {
        fut.await.map(Some)
    } else {
        Ok(None)
    }
}

/// Every selected recipient must be a contact on the case.
fn check_recipient_selection(context: &MergeContext, recipients: &PerRecipientTokenMap) -> Result<()> {
    match context
        .recipient_contact_ids
        .iter()
        .find(|id| recipients.get(**id).is_none())
    {
        Some(id) => Err(MergeError::invalid(format!(
            "recipient {} is not a contact on case {}",
            id, context.case_id
        ))),
        None => Ok(()),
    }
}

/// Guards the contract that no declared token is ever dropped.
fn check_complete(
    template: &NoticeTemplate,
    categories: &BTreeSet<MergeCategory>,
    tokens: &ResolvedTokenMap,
    recipients: Option<&PerRecipientTokenMap>,
) -> Result<()> {
    for category in categories {
        for token in template.declared_tokens(*category) {
            let present = if category.is_personalized() {
                recipients
                    .map(|r| r.iter().all(|(_, map)| map.contains(token.name())))
                    .unwrap_or(false)
            } else {
                tokens.contains(token.name())
            };
            if !present {
                return Err(MergeError::internal(
                    "Resolver omitted a declared merge code",
                    &format!("{} in {}", token, category),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::infra::in_memory::InMemoryStore;
    use crate::resolvers::test_support::*;

    fn use_case(store: InMemoryStore) -> NoticeMergeUseCase {
        NoticeMergeUseCase::with_default_dates(Arc::new(store))
    }

    fn notice() -> NoticeTemplate {
        serde_json::from_value(serde_json::json!({
            "content": "Dear {{recipient_name}}, case {{case_number}} at {{location_address}}. {{all_contacts}}",
            "mergeFields": {
                "Case Information": ["case_number"],
                "Location": ["location_address"],
                "Recipient": ["recipient_name", "recipient_con_cf_8"]
            },
            "mergeTables": {"Contact": ["all_contacts", "all_legal_entities"]},
            "footerSection": {
                "content": "{{user_first_last}}",
                "mergeFields": {"Case Information": ["user_first_last"]}
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolves_every_referenced_category() {
        let mut ctx = context();
        ctx.recipient_contact_ids = vec![KING_KONG, PING_PONG];

        let result = use_case(store())
            .resolve(AGENCY, CASE, &notice(), &ctx, &acting_user())
            .await
            .unwrap();

        assert_eq!(result.tokens.text(CASE_NUMBER).as_deref(), Some("CE-2024-0042"));
        assert_eq!(result.tokens.text(USER_FIRST_LAST).as_deref(), Some("Ada Lovelace"));
        assert!(result.tokens.contains(LOCATION_ADDRESS));
        assert!(result.tokens.contains(ALL_CONTACTS));
        assert!(result.tokens.contains(ALL_LEGAL_ENTITIES));
        // Personalized fields stay out of the flat map
        assert!(!result.tokens.contains(RECIPIENT_NAME));

        let recipients = result.recipients.as_ref().unwrap();
        assert_eq!(recipients.contact_ids(), vec![KING_KONG, PING_PONG]);
        assert_eq!(
            recipients.get(KING_KONG).unwrap().text("recipient_con_cf_8").as_deref(),
            Some("{{recipient_con_cf_8}}")
        );
    }

    #[tokio::test]
    async fn test_render_substitutes_per_recipient() {
        let ctx = context();
        let template = notice();
        let result = use_case(store())
            .resolve(AGENCY, CASE, &template, &ctx, &acting_user())
            .await
            .unwrap();

        let text = "Dear {{recipient_name}}, re {{case_number}}";
        assert_eq!(result.render(text, Some(PING_PONG)), "Dear Ping Pong, re CE-2024-0042");
        assert_eq!(result.render(text, None), "Dear {{recipient_name}}, re CE-2024-0042");
    }

    #[tokio::test]
    async fn test_unreferenced_categories_are_not_resolved() {
        // Case 101 has no contacts; a template without contact categories still resolves
        let mut ctx = context();
        ctx.case_id = BARE_CASE;
        let template = fields_template(FieldCategory::CaseInformation, &[CASE_NUMBER]);

        let result = use_case(store())
            .resolve(AGENCY, BARE_CASE, &template, &ctx, &acting_user())
            .await
            .unwrap();
        assert_eq!(result.tokens.len(), 1);
        assert!(result.recipients.is_none());
    }

    #[tokio::test]
    async fn test_missing_case_is_invalid_request() {
        let ctx = MergeContext::new(OTHER_AGENCY, CASE);
        let err = use_case(store())
            .resolve(OTHER_AGENCY, CASE, &notice(), &ctx, &acting_user())
            .await
            .unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[tokio::test]
    async fn test_context_for_another_case_is_invalid_request() {
        let ctx = MergeContext::new(AGENCY, BARE_CASE);
        let err = use_case(store())
            .resolve(AGENCY, CASE, &notice(), &ctx, &acting_user())
            .await
            .unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[tokio::test]
    async fn test_unknown_recipient_selection_is_invalid_request() {
        let mut ctx = context();
        ctx.recipient_contact_ids = vec![KING_KONG, 77];
        let err = use_case(store())
            .resolve(AGENCY, CASE, &notice(), &ctx, &acting_user())
            .await
            .unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[tokio::test]
    async fn test_resolver_failure_propagates_without_partial_result() {
        // Geodata lookup fails for case 101
        let mut ctx = context();
        ctx.case_id = BARE_CASE;
        let mut template = fields_template(FieldCategory::CaseInformation, &[CASE_NUMBER]);
        template
            .merge_fields
            .insert(FieldCategory::Location, vec![LOCATION_APN.to_string()]);

        let err = use_case(store())
            .resolve(AGENCY, BARE_CASE, &template, &ctx, &acting_user())
            .await
            .unwrap_err();
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_store_outage_is_internal_error() {
        let store = store();
        store.set_unavailable(true);
        let err = use_case(store)
            .resolve(AGENCY, CASE, &notice(), &context(), &acting_user())
            .await
            .unwrap_err();
        assert!(err.is_internal());
    }
}
