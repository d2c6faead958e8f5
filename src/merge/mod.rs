//! Token and category vocabulary shared by the resolvers and the orchestrator.

pub mod category;
pub mod substitute;
pub mod token;

pub use category::{FieldCategory, MergeCategory, TableCategory};
pub use substitute::substitute;
pub use token::{PerRecipientTokenMap, ResolvedTokenMap, Token, TokenValue};
