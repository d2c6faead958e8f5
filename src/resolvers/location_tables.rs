use std::sync::Arc;
use tracing::debug;

use super::MergeRequest;
use crate::app::ports::{LocationRepository, MergeSnapshot};
use crate::constants::*;
use crate::error::{MergeError, Result};
use crate::merge::{ResolvedTokenMap, TableCategory, TokenValue};

/// Resolves the address blocks built from the case location.
pub struct LocationTableResolver {
    locations: Arc<dyn LocationRepository>,
}

impl LocationTableResolver {
    pub fn new(snapshot: &MergeSnapshot) -> Self {
        Self {
            locations: snapshot.locations.clone(),
        }
    }

    pub async fn resolve_tables(&self, req: &MergeRequest<'_>) -> Result<ResolvedTokenMap> {
        let tokens = req.template.declared_tokens(TableCategory::Location);

        let address = self
            .locations
            .find_location(req.agency_id, req.case_id)
            .await?
            .ok_or_else(|| MergeError::invalid(format!("case {} not found", req.case_id)))?;

        let mut resolved = ResolvedTokenMap::new();
        for token in &tokens {
            let value = match token.name() {
                LOCATION_ADDRESS_BLOCK => Some(address.stacked()),
                LOCATION_ADDRESS_LINE => Some(address.single_line()),
                _ => None,
            };
            resolved.insert(token.clone(), TokenValue::or_unresolved(value, token));
        }

        debug!("Resolved {} location tables for case {}", resolved.len(), req.case_id);
        Ok(resolved)
    }
}
