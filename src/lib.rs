pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

// Token vocabulary, substitution, and HTML rendering
pub mod merge;
pub mod render;

// Layered boundaries: ports and use case, adapters, resolvers
pub mod app;
pub mod infra;
pub mod resolvers;

// Domain data shapes shared across layers
pub mod domain;

pub mod observability;

pub use app::merge_use_case::{MergeResult, NoticeMergeUseCase};
pub use app::ports::{MergeSnapshot, SnapshotSource};
pub use domain::{MergeContext, NoticeTemplate, UserProfile};
pub use error::{MergeError, Result};
pub use merge::{MergeCategory, PerRecipientTokenMap, ResolvedTokenMap, Token, TokenValue};
