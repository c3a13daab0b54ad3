//! Messaging Client
//!
//! The three cooperating responsibilities of the messaging core, plus the
//! profile and wallet glue around them:
//!
//! - `friends` - the request/accept/reject/cancel lifecycle that gates who
//!   may message whom
//! - `conversations` - derives per-counterparty conversation summaries from
//!   the flat message table
//! - `channel` - keeps one conversation's message list live, ordered and
//!   deduplicated
//! - `profiles` - display-profile reads and avatar upload
//! - `wallet` - typed wrapper over the privileged coin-balance function
//!
//! Every operation takes the current user's identifier explicitly; nothing
//! reads ambient state.

pub mod channel;
pub mod conversations;
pub mod friends;
pub mod profiles;
pub mod wallet;

pub use channel::{channel_name, MessageChannel, MessageLog};
pub use conversations::{aggregate, ConversationsApi};
pub use friends::FriendsApi;
pub use profiles::ProfilesApi;
pub use wallet::WalletApi;
