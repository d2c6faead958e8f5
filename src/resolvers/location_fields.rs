use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::MergeRequest;
use crate::app::ports::{ConfigRepository, LocationRepository, MergeSnapshot};
use crate::constants::*;
use crate::domain::{CustomFieldDefinition, FieldId, LocationCustomFieldValues, LocationSnapshot};
use crate::error::{MergeError, Result};
use crate::merge::{FieldCategory, ResolvedTokenMap, Token, TokenValue};
use crate::render::custom_field;

/// Resolves location merge fields, including `loc_cf_<id>` custom fields.
pub struct LocationFieldResolver {
    locations: Arc<dyn LocationRepository>,
    config: Arc<dyn ConfigRepository>,
}

struct LocationFacts {
    address: LocationSnapshot,
    flag_reason: Option<String>,
    apn: Option<String>,
    values: LocationCustomFieldValues,
    definitions: HashMap<FieldId, CustomFieldDefinition>,
}

impl LocationFieldResolver {
    pub fn new(snapshot: &MergeSnapshot) -> Self {
        Self {
            locations: snapshot.locations.clone(),
            config: snapshot.config.clone(),
        }
    }

    pub async fn resolve_fields(&self, req: &MergeRequest<'_>) -> Result<ResolvedTokenMap> {
        let tokens = req.template.declared_tokens(FieldCategory::Location);

        let address = self
            .locations
            .find_location(req.agency_id, req.case_id)
            .await?
            .ok_or_else(|| MergeError::invalid(format!("case {} not found", req.case_id)))?;

        let flag_reason = self.locations.latest_flag_reason(req.agency_id, req.case_id).await?;
        let values = self.locations.custom_field_values(req.agency_id, req.case_id).await?;
        // The APN is required data; a failed lookup fails the category
        let apn = self.locations.parcel_apn(req.agency_id, req.case_id).await?;
        let definitions = self
            .config
            .location_field_definitions(req.agency_id)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        let facts = LocationFacts {
            address,
            flag_reason,
            apn,
            values,
            definitions,
        };

        let mut resolved = ResolvedTokenMap::new();
        for token in &tokens {
            let value = field_value(token, &facts);
            resolved.insert(token.clone(), TokenValue::or_unresolved(value, token));
        }

        debug!(
            "Resolved {} location fields for case {} ({} unresolved)",
            resolved.len(),
            req.case_id,
            resolved.unresolved_count()
        );
        Ok(resolved)
    }
}

fn field_value(token: &Token, facts: &LocationFacts) -> Option<String> {
    if let Some(field_id) = token.dynamic_id(LOCATION_CUSTOM_FIELD_PREFIX) {
        let definition = facts.definitions.get(&field_id)?;
        return custom_field::format_with(definition, facts.values.get(field_id));
    }

    let address = &facts.address;
    match token.name() {
        LOCATION_STREET => Some(address.street.clone()),
        LOCATION_CITY => Some(address.city.clone()),
        LOCATION_STATE => Some(address.state.clone()),
        LOCATION_ZIP => Some(address.zip.clone()),
        LOCATION_ADDRESS => Some(address.single_line()),
        LOCATION_FLAG_REASON => facts.flag_reason.clone(),
        LOCATION_APN => facts.apn.clone(),
        _ => None,
    }
}
