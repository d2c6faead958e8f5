use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{MergeError, Result};
use crate::merge::{FieldCategory, MergeCategory, TableCategory, Token};

/// An agency-authored notice template and the merge codes it declares.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeTemplate {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub header_section: Option<TemplateSection>,
    #[serde(default)]
    pub footer_section: Option<TemplateSection>,
    #[serde(default)]
    pub merge_fields: BTreeMap<FieldCategory, Vec<String>>,
    #[serde(default)]
    pub merge_tables: BTreeMap<TableCategory, Vec<String>>,
}

/// Header or footer text, declaring its own subset of merge codes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSection {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub merge_fields: BTreeMap<FieldCategory, Vec<String>>,
    #[serde(default)]
    pub merge_tables: BTreeMap<TableCategory, Vec<String>>,
}

impl NoticeTemplate {
    fn sections(&self) -> impl Iterator<Item = &TemplateSection> {
        self.header_section.iter().chain(self.footer_section.iter())
    }

    /// Every (category, raw token) declaration across body, header and footer.
    fn declarations(&self) -> Vec<(MergeCategory, &str)> {
        let mut out = Vec::new();
        collect_declarations(&self.merge_fields, &self.merge_tables, &mut out);
        for section in self.sections() {
            collect_declarations(&section.merge_fields, &section.merge_tables, &mut out);
        }
        out
    }

    /// Categories referenced anywhere in the template.
    pub fn referenced_categories(&self) -> BTreeSet<MergeCategory> {
        self.declarations().into_iter().map(|(c, _)| c).collect()
    }

    pub fn references(&self, category: impl Into<MergeCategory>) -> bool {
        let category = category.into();
        self.declarations().iter().any(|(c, _)| *c == category)
    }

    /// Tokens declared for `category`, body first, without repeats.
    pub fn declared_tokens(&self, category: impl Into<MergeCategory>) -> Vec<Token> {
        let category = category.into();
        let mut tokens: Vec<Token> = Vec::new();
        for (c, raw) in self.declarations() {
            if c != category {
                continue;
            }
            let token = Token::parse(raw);
            if !token.name().is_empty() && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }

    /// Rejects a template that declares one token under two categories, or an
    /// empty token name.
    pub fn validate(&self) -> Result<()> {
        let mut owners: BTreeMap<Token, MergeCategory> = BTreeMap::new();
        for (category, raw) in self.declarations() {
            let token = Token::parse(raw);
            if token.name().is_empty() {
                return Err(MergeError::invalid(format!(
                    "template declares an empty merge code under {}",
                    category
                )));
            }
            match owners.get(&token) {
                Some(existing) if *existing != category => {
                    return Err(MergeError::invalid(format!(
                        "merge code {} is declared under both {} and {}",
                        token, existing, category
                    )));
                }
                Some(_) => {}
                None => {
                    owners.insert(token, category);
                }
            }
        }
        Ok(())
    }
}

fn collect_declarations<'a>(
    fields: &'a BTreeMap<FieldCategory, Vec<String>>,
    tables: &'a BTreeMap<TableCategory, Vec<String>>,
    out: &mut Vec<(MergeCategory, &'a str)>,
) {
    for (category, tokens) in fields {
        out.extend(tokens.iter().map(|t| (MergeCategory::Field(*category), t.as_str())));
    }
    for (category, tokens) in tables {
        out.extend(tokens.iter().map(|t| (MergeCategory::Table(*category), t.as_str())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_json(json: &str) -> NoticeTemplate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_referenced_categories_include_sections() {
        let template = template_json(
            r#"{
                "content": "Dear {{recipient_case_role}}",
                "mergeFields": {"Recipient": ["recipient_case_role"]},
                "headerSection": {
                    "content": "{{case_number}}",
                    "mergeFields": {"Case Information": ["{{case_number}}"]}
                },
                "footerSection": {
                    "content": "{{location_address_line}}",
                    "mergeTables": {"Location": ["location_address_line"]}
                }
            }"#,
        );

        let categories = template.referenced_categories();
        assert_eq!(categories.len(), 3);
        assert!(template.references(FieldCategory::CaseInformation));
        assert!(template.references(TableCategory::Location));
        assert!(!template.references(FieldCategory::Location));
    }

    #[test]
    fn test_declared_tokens_union_without_repeats() {
        let template = template_json(
            r#"{
                "mergeFields": {"Case Information": ["case_number", "{{issue_description}}"]},
                "headerSection": {"mergeFields": {"Case Information": ["{{case_number}}", "user_first_last"]}}
            }"#,
        );
        let names: Vec<String> = template
            .declared_tokens(FieldCategory::CaseInformation)
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["case_number", "issue_description", "user_first_last"]);
    }

    #[test]
    fn test_same_token_in_two_categories_is_rejected() {
        let template = template_json(
            r#"{
                "mergeFields": {"Location": ["location_city"]},
                "mergeTables": {"Location": ["{{location_city}}"]}
            }"#,
        );
        let err = template.validate().unwrap_err();
        assert!(err.is_invalid_request());
    }

    #[test]
    fn test_same_token_in_body_and_section_of_one_category_is_allowed() {
        let template = template_json(
            r#"{
                "mergeFields": {"Case Information": ["case_number"]},
                "footerSection": {"mergeFields": {"Case Information": ["case_number"]}}
            }"#,
        );
        assert!(template.validate().is_ok());
    }

    #[test]
    fn test_table_category_under_merge_fields_fails_to_parse() {
        let parsed = serde_json::from_str::<NoticeTemplate>(r#"{"mergeFields": {"Municipal Code": ["x"]}}"#);
        assert!(parsed.is_err());
    }
}
