//! Core POP3 types.

mod capability;
mod maildrop;
mod status;

pub use capability::Capabilities;
pub use maildrop::{MaildropStat, MessageSummary, UniqueId};
pub use status::StatusLine;
