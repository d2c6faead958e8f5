use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::MergeRequest;
use crate::app::ports::{ConfigRepository, ContactRepository, MergeSnapshot};
use crate::constants::*;
use crate::domain::{CaseContact, ContactType, CustomFieldDefinition, FieldId};
use crate::error::{MergeError, Result};
use crate::merge::{FieldCategory, PerRecipientTokenMap, ResolvedTokenMap, Token, TokenValue};
use crate::render::custom_field;

type DefinitionsByType = HashMap<ContactType, HashMap<FieldId, CustomFieldDefinition>>;

/// Resolves personalized merge fields: one token map per contact on the case.
pub struct ContactRecipientResolver {
    contacts: Arc<dyn ContactRepository>,
    config: Arc<dyn ConfigRepository>,
}

impl ContactRecipientResolver {
    pub fn new(snapshot: &MergeSnapshot) -> Self {
        Self {
            contacts: snapshot.contacts.clone(),
            config: snapshot.config.clone(),
        }
    }

    /// Keyed by every contact on the case, whichever recipients the notice
    /// run selected.
    pub async fn resolve_fields(&self, req: &MergeRequest<'_>) -> Result<PerRecipientTokenMap> {
        let tokens = req.template.declared_tokens(FieldCategory::Recipient);

        let contacts = self.contacts.case_contacts(req.agency_id, req.case_id).await?;
        if contacts.is_empty() {
            return Err(MergeError::invalid(format!("case {} has no contacts", req.case_id)));
        }

        let mut definitions: DefinitionsByType = HashMap::new();
        for contact_type in [ContactType::Individual, ContactType::LegalEntity] {
            let defs = self
                .config
                .contact_field_definitions(req.agency_id, contact_type)
                .await?
                .into_iter()
                .map(|d| (d.id, d))
                .collect();
            definitions.insert(contact_type, defs);
        }

        let mut recipients = PerRecipientTokenMap::new();
        for contact in &contacts {
            let mut resolved = ResolvedTokenMap::new();
            for token in &tokens {
                let value = field_value(token, contact, &definitions);
                resolved.insert(token.clone(), TokenValue::or_unresolved(value, token));
            }
            recipients.insert(contact.contact_id, resolved);
        }

        debug!(
            "Resolved {} recipient fields for {} contacts on case {}",
            tokens.len(),
            recipients.len(),
            req.case_id
        );
        Ok(recipients)
    }
}

fn field_value(token: &Token, contact: &CaseContact, definitions: &DefinitionsByType) -> Option<String> {
    if let Some(field_id) = token.dynamic_id(RECIPIENT_CUSTOM_FIELD_PREFIX) {
        // Only fields defined for this contact's type apply
        let definition = definitions.get(&contact.contact_type)?.get(&field_id)?;
        let raw = contact.custom_field_values.get(&field_id).map(String::as_str);
        return custom_field::format_with(definition, raw);
    }

    match token.name() {
        RECIPIENT_CASE_ROLE => Some(contact.case_role.clone()),
        RECIPIENT_CONTACT_TYPE => Some(contact.contact_type.to_string()),
        RECIPIENT_NAME => Some(contact.display_name()),
        RECIPIENT_EMAIL => contact.email.clone(),
        RECIPIENT_MAILING_ADDRESS => Some(contact.mailing_address.single_line()),
        RECIPIENT_WORK_PHONE => contact.work_phone.clone(),
        RECIPIENT_CELL_PHONE => contact.cell_phone.clone(),
        RECIPIENT_IS_VENDOR => Some((if contact.is_vendor { YES } else { NO }).to_string()),
        _ => None,
    }
}
