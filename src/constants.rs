/// Merge-code names understood by the resolvers.
/// Templates reference these as `{{name}}`; the bare names live here so every
/// resolver and test agrees on spelling.

// Case Information
pub const CASE_NUMBER: &str = "case_number";
pub const ISSUE_DESCRIPTION: &str = "issue_description";
pub const CASE_CREATED_DATE: &str = "case_created_date";
pub const CASE_CREATED_DATE_TEXT: &str = "case_created_date_text";
pub const CASE_CLOSED_DATE: &str = "case_closed_date";
pub const CASE_ASSIGNEE_LAST_FIRST: &str = "case_assignee_last_first";
pub const CASE_ASSIGNEE_FIRST_LAST: &str = "case_assignee_first_last";
pub const USER_LAST_FIRST: &str = "user_last_first";
pub const USER_FIRST_LAST: &str = "user_first_last";
pub const USER_SIGNATURE: &str = "user_signature";
pub const USER_SIGNATURE_IMAGE: &str = "user_signature_image";
pub const NEXT_INSPECTION_DATE: &str = "next_inspection_date";
pub const NEXT_INSPECTION_DATE_TEXT: &str = "next_inspection_date_text";
pub const NEXT_INSPECTION_ASSIGNEE: &str = "next_inspection_assignee";

// Location fields
pub const LOCATION_STREET: &str = "location_street";
pub const LOCATION_CITY: &str = "location_city";
pub const LOCATION_STATE: &str = "location_state";
pub const LOCATION_ZIP: &str = "location_zip";
pub const LOCATION_ADDRESS: &str = "location_address";
pub const LOCATION_FLAG_REASON: &str = "location_flag_reason";
pub const LOCATION_APN: &str = "location_apn";
pub const LOCATION_CUSTOM_FIELD_PREFIX: &str = "loc_cf_";

// Recipient fields
pub const RECIPIENT_CASE_ROLE: &str = "recipient_case_role";
pub const RECIPIENT_CONTACT_TYPE: &str = "recipient_contact_type";
pub const RECIPIENT_NAME: &str = "recipient_name";
pub const RECIPIENT_EMAIL: &str = "recipient_email";
pub const RECIPIENT_MAILING_ADDRESS: &str = "recipient_mailing_address";
pub const RECIPIENT_WORK_PHONE: &str = "recipient_work_phone";
pub const RECIPIENT_CELL_PHONE: &str = "recipient_cell_phone";
pub const RECIPIENT_IS_VENDOR: &str = "recipient_is_vendor";
pub const RECIPIENT_CUSTOM_FIELD_PREFIX: &str = "recipient_con_cf_";

// Contact tables
pub const ALL_CONTACTS: &str = "all_contacts";
pub const ALL_LEGAL_ENTITIES: &str = "all_legal_entities";
pub const NAME_BY_ROLE_PREFIX: &str = "name_";
pub const NAME_AND_ADDRESS_BY_ROLE_PREFIX: &str = "name_and_address_";
pub const BILL_TO_NAME: &str = "bill_to_name";
pub const BILL_TO_NAME_AND_ADDRESS: &str = "bill_to_name_and_address";
pub const RESPONSIBLE_CONTACT_NAME: &str = "responsible_contact_name";
pub const RESPONSIBLE_CONTACT_NAME_AND_ADDRESS: &str = "responsible_contact_name_and_address";

// Location tables
pub const LOCATION_ADDRESS_BLOCK: &str = "location_address_block";
pub const LOCATION_ADDRESS_LINE: &str = "location_address_line";

// Municipal code tables
pub const MUNICIPAL_CODE_DESCRIPTIONS: &str = "municipal_code_descriptions";
pub const MUNICIPAL_CODE_RESOLUTIONS_WITH_COMPLY_BY: &str = "municipal_code_resolutions_with_comply_by";
pub const MUNICIPAL_CODE_RESOLUTIONS: &str = "municipal_code_resolutions";

// Table column labels
pub const CONTACT_TABLE_COLUMNS: [&str; 4] = ["Role", "Name", "Type", "Address"];
pub const CODE_DESCRIPTION_COLUMNS: [&str; 2] = ["Article", "Description"];
pub const CODE_RESOLUTION_WITH_COMPLY_BY_COLUMNS: [&str; 3] = ["Article", "Resolution", "Comply By"];
pub const CODE_RESOLUTION_COLUMNS: [&str; 2] = ["Article", "Resolution"];

pub const YES: &str = "Yes";
pub const NO: &str = "No";
