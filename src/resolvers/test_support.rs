//! Shared fixture for resolver unit tests: the King Kong / Ping Pong case.

use std::collections::BTreeMap;

pub use crate::app::ports::SnapshotSource;
use crate::app::ports::MergeSnapshot;
use crate::domain::{MergeContext, NoticeTemplate, UserProfile};
use crate::infra::in_memory::{InMemoryStore, MergeFixture};
use crate::merge::{FieldCategory, TableCategory};

pub const AGENCY: i64 = 1;
pub const OTHER_AGENCY: i64 = 2;
pub const CASE: i64 = 100;
/// Case with no contacts and a failing geodata lookup.
pub const BARE_CASE: i64 = 101;
pub const KING_KONG: i64 = 1;
pub const PING_PONG: i64 = 2;
pub const ADA_LOVELACE: i64 = 5;
pub const GRACE_HOPPER: i64 = 6;
pub const ALAN_TURING: i64 = 7;
pub const EDSGER_DIJKSTRA: i64 = 8;

pub fn fixture() -> MergeFixture {
    serde_json::from_str(include_str!("../../tests/fixtures/king_kong_case.json")).unwrap()
}

pub fn store() -> InMemoryStore {
    InMemoryStore::new(fixture())
}

pub async fn snapshot() -> MergeSnapshot {
    store().open_snapshot(AGENCY, CASE).await.unwrap()
}

pub fn context() -> MergeContext {
    MergeContext::new(AGENCY, CASE)
}

pub fn acting_user() -> UserProfile {
    UserProfile {
        id: ADA_LOVELACE,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
    }
}

pub fn unsigned_user() -> UserProfile {
    UserProfile {
        id: EDSGER_DIJKSTRA,
        first_name: "Edsger".to_string(),
        last_name: "Dijkstra".to_string(),
    }
}

pub fn fields_template(category: FieldCategory, tokens: &[&str]) -> NoticeTemplate {
    let mut merge_fields = BTreeMap::new();
    merge_fields.insert(category, tokens.iter().map(|t| t.to_string()).collect());
    NoticeTemplate {
        merge_fields,
        ..NoticeTemplate::default()
    }
}

pub fn tables_template(category: TableCategory, tokens: &[&str]) -> NoticeTemplate {
    let mut merge_tables = BTreeMap::new();
    merge_tables.insert(category, tokens.iter().map(|t| t.to_string()).collect());
    NoticeTemplate {
        merge_tables,
        ..NoticeTemplate::default()
    }
}
