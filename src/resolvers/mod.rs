//! Category resolvers. Each one reads its own data domain through the
//! snapshot repositories and returns a complete map for the tokens the
//! template declares in its category, or an error.

pub mod case_information;
pub mod contact_recipient;
pub mod contact_tables;
pub mod location_fields;
pub mod location_tables;
pub mod municipal_code_tables;

pub use case_information::CaseInformationResolver;
pub use contact_recipient::ContactRecipientResolver;
pub use contact_tables::ContactTableResolver;
pub use location_fields::LocationFieldResolver;
pub use location_tables::LocationTableResolver;
pub use municipal_code_tables::MunicipalCodeTableResolver;

use crate::domain::{AgencyId, CaseId, MergeContext, NoticeTemplate, UserProfile};

/// Inputs shared by every resolver for one resolution call.
#[derive(Debug, Clone, Copy)]
pub struct MergeRequest<'a> {
    pub agency_id: AgencyId,
    pub case_id: CaseId,
    pub template: &'a NoticeTemplate,
    pub context: &'a MergeContext,
    pub acting_user: &'a UserProfile,
}

impl<'a> MergeRequest<'a> {
    pub fn new(
        agency_id: AgencyId,
        case_id: CaseId,
        template: &'a NoticeTemplate,
        context: &'a MergeContext,
        acting_user: &'a UserProfile,
    ) -> Self {
        Self {
            agency_id,
            case_id,
            template,
            context,
            acting_user,
        }
    }
}

/// Lower-snake-case form of a case role label, used in per-role token names:
/// `Property Owner` becomes `property_owner`.
pub fn role_slug(role: &str) -> String {
    let mut slug = String::with_capacity(role.len());
    let mut pending_sep = false;
    for ch in role.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests {
    use super::role_slug;

    #[test]
    fn test_role_slug() {
        assert_eq!(role_slug("Owner"), "owner");
        assert_eq!(role_slug("Property Owner"), "property_owner");
        assert_eq!(role_slug("  Co-Signer / Guarantor "), "co_signer_guarantor");
    }
}
