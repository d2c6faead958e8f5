use std::sync::Arc;
use tracing::debug;

use super::{role_slug, MergeRequest};
use crate::app::ports::{ContactRepository, MergeSnapshot};
use crate::constants::*;
use crate::domain::{CaseContact, ContactType};
use crate::error::{MergeError, Result};
use crate::merge::{ResolvedTokenMap, TableCategory, Token, TokenValue};
use crate::observability::metrics;
use crate::render::TableSpec;

/// Resolves contact tables, per-role names, and the bill-to and responsible
/// contact blocks.
pub struct ContactTableResolver {
    contacts: Arc<dyn ContactRepository>,
}

impl ContactTableResolver {
    pub fn new(snapshot: &MergeSnapshot) -> Self {
        Self {
            contacts: snapshot.contacts.clone(),
        }
    }

    pub async fn resolve_tables(&self, req: &MergeRequest<'_>) -> Result<ResolvedTokenMap> {
        let tokens = req.template.declared_tokens(TableCategory::Contact);

        let contacts = self.contacts.case_contacts(req.agency_id, req.case_id).await?;
        if contacts.is_empty() {
            return Err(MergeError::invalid(format!("case {} has no contacts", req.case_id)));
        }

        let responsible = if tokens.iter().any(is_responsible_token) {
            Some(responsible_contact(req, &contacts)?)
        } else {
            None
        };

        let mut resolved = ResolvedTokenMap::new();
        for token in &tokens {
            let value = match token.name() {
                ALL_CONTACTS => contact_table(contacts.iter())?,
                ALL_LEGAL_ENTITIES => {
                    contact_table(contacts.iter().filter(|c| c.contact_type == ContactType::LegalEntity))?
                }
                BILL_TO_NAME => billable(&contacts).map(CaseContact::display_name),
                BILL_TO_NAME_AND_ADDRESS => billable(&contacts).map(CaseContact::name_and_address),
                RESPONSIBLE_CONTACT_NAME => responsible.map(CaseContact::display_name),
                RESPONSIBLE_CONTACT_NAME_AND_ADDRESS => responsible.map(CaseContact::name_and_address),
                _ => by_role(token, &contacts),
            };
            resolved.insert(token.clone(), TokenValue::or_unresolved(value, token));
        }

        debug!(
            "Resolved {} contact tables for case {} ({} unresolved)",
            resolved.len(),
            req.case_id,
            resolved.unresolved_count()
        );
        Ok(resolved)
    }
}

fn is_responsible_token(token: &Token) -> bool {
    matches!(
        token.name(),
        RESPONSIBLE_CONTACT_NAME | RESPONSIBLE_CONTACT_NAME_AND_ADDRESS
    )
}

/// The contact selected as responsible, which must be on the case.
fn responsible_contact<'c>(req: &MergeRequest<'_>, contacts: &'c [CaseContact]) -> Result<&'c CaseContact> {
    let id = req
        .context
        .responsible_contact_id
        .ok_or_else(|| MergeError::invalid("template needs a responsible contact but none was selected"))?;
    contacts.iter().find(|c| c.contact_id == id).ok_or_else(|| {
        MergeError::invalid(format!("responsible contact {} is not on case {}", id, req.case_id))
    })
}

fn billable(contacts: &[CaseContact]) -> Option<&CaseContact> {
    contacts.iter().find(|c| c.is_billable)
}

/// Role / Name / Type / Address table. No rows means no table.
fn contact_table<'c>(contacts: impl Iterator<Item = &'c CaseContact>) -> Result<Option<String>> {
    let mut table = TableSpec::new(&CONTACT_TABLE_COLUMNS);
    for contact in contacts {
        table.push_row(vec![
            contact.case_role.clone(),
            contact.display_name(),
            contact.contact_type.to_string(),
            contact.mailing_address.single_line(),
        ])?;
    }
    if table.is_empty() {
        return Ok(None);
    }
    metrics::merge::table_rendered("contacts");
    Ok(Some(table.render()?))
}

/// `name_<role>` and `name_and_address_<role>`; contacts sharing a role are
/// listed together.
fn by_role(token: &Token, contacts: &[CaseContact]) -> Option<String> {
    // Checked first: name_and_address_ also starts with name_
    if let Some(role) = token.name().strip_prefix(NAME_AND_ADDRESS_BY_ROLE_PREFIX) {
        let blocks: Vec<String> = in_role(contacts, role).map(CaseContact::name_and_address).collect();
        return (!blocks.is_empty()).then(|| blocks.join("<br><br>"));
    }
    if let Some(role) = token.name().strip_prefix(NAME_BY_ROLE_PREFIX) {
        let names: Vec<String> = in_role(contacts, role).map(CaseContact::display_name).collect();
        return (!names.is_empty()).then(|| names.join(", "));
    }
    None
}

fn in_role<'c>(contacts: &'c [CaseContact], role: &'c str) -> impl Iterator<Item = &'c CaseContact> {
    contacts.iter().filter(move |c| role_slug(&c.case_role) == role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MergeContext;
    use crate::infra::in_memory::InMemoryStore;
    use crate::render::render_table;
    use crate::resolvers::test_support::*;

    async fn resolve_with(store: &InMemoryStore, context: &MergeContext, tokens: &[&str]) -> Result<ResolvedTokenMap> {
        let snapshot = store.open_snapshot(AGENCY, context.case_id).await.unwrap();
        let template = tables_template(TableCategory::Contact, tokens);
        let user = acting_user();
        let req = MergeRequest::new(AGENCY, context.case_id, &template, context, &user);
        ContactTableResolver::new(&snapshot).resolve_tables(&req).await
    }

    async fn resolve(tokens: &[&str]) -> Result<ResolvedTokenMap> {
        resolve_with(&store(), &context(), tokens).await
    }

    #[tokio::test]
    async fn test_all_contacts_table() {
        let map = resolve(&[ALL_CONTACTS]).await.unwrap();
        let expected = render_table(
            &CONTACT_TABLE_COLUMNS,
            &[
                vec!["Owner", "King Kong", "INDIVIDUAL", "12B High St, Huang Thai, Kin Toe, 12345"],
                vec!["Tenant", "Ping Pong", "LEGAL_ENTITY", "34 Low Rd, Sum Town, Kin Toe, 67890"],
            ],
        )
        .unwrap();
        assert_eq!(map.text(ALL_CONTACTS), Some(expected));
    }

    #[tokio::test]
    async fn test_legal_entity_table_filters_by_type() {
        let map = resolve(&[ALL_LEGAL_ENTITIES]).await.unwrap();
        let html = map.text(ALL_LEGAL_ENTITIES).unwrap();
        assert!(html.contains("<td>Ping Pong</td>"));
        assert!(!html.contains("King Kong"));
    }

    #[tokio::test]
    async fn test_no_legal_entities_leaves_token_literal() {
        let store = store();
        store
            .update(|data| data.contacts.retain(|c| c.contact.contact_type == ContactType::Individual))
            .unwrap();

        let map = resolve_with(&store, &context(), &[ALL_LEGAL_ENTITIES, ALL_CONTACTS]).await.unwrap();
        assert_eq!(map.text(ALL_LEGAL_ENTITIES).as_deref(), Some("{{all_legal_entities}}"));
        assert!(map.text(ALL_CONTACTS).unwrap().starts_with("<table"));
    }

    #[tokio::test]
    async fn test_per_role_tokens() {
        let map = resolve(&["name_owner", "name_and_address_tenant", "name_inspector"]).await.unwrap();
        assert_eq!(map.text("name_owner").as_deref(), Some("King Kong"));
        assert_eq!(
            map.text("name_and_address_tenant").as_deref(),
            Some("Ping Pong<br>34 Low Rd<br>Sum Town<br>Kin Toe<br>67890")
        );
        assert_eq!(map.text("name_inspector").as_deref(), Some("{{name_inspector}}"));
    }

    #[tokio::test]
    async fn test_bill_to_uses_billable_contact() {
        let map = resolve(&[BILL_TO_NAME, BILL_TO_NAME_AND_ADDRESS]).await.unwrap();
        assert_eq!(map.text(BILL_TO_NAME).as_deref(), Some("King Kong"));
        assert!(map.text(BILL_TO_NAME_AND_ADDRESS).unwrap().starts_with("King Kong<br>12B High St"));
    }

    #[tokio::test]
    async fn test_responsible_contact_must_be_on_case() {
        let mut context = context();
        context.responsible_contact_id = Some(PING_PONG);
        let map = resolve_with(&store(), &context, &[RESPONSIBLE_CONTACT_NAME]).await.unwrap();
        assert_eq!(map.text(RESPONSIBLE_CONTACT_NAME).as_deref(), Some("Ping Pong"));

        context.responsible_contact_id = Some(42);
        let err = resolve_with(&store(), &context, &[RESPONSIBLE_CONTACT_NAME]).await.unwrap_err();
        assert!(err.is_invalid_request());

        context.responsible_contact_id = None;
        let err = resolve_with(&store(), &context, &[RESPONSIBLE_CONTACT_NAME]).await.unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[tokio::test]
    async fn test_unselected_responsible_contact_is_fine_when_not_needed() {
        let map = resolve(&[ALL_CONTACTS]).await.unwrap();
        assert_eq!(map.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_contacts_is_invalid_request() {
        let mut context = context();
        context.case_id = BARE_CASE;
        let err = resolve_with(&store(), &context, &[ALL_CONTACTS]).await.unwrap_err();
        assert!(err.is_invalid_request());
    }
}
