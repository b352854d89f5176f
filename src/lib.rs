#![cfg_attr(not(test), no_std)]

// Declare modules at the crate root
pub mod cfg;
pub mod error;
pub mod identity;
pub mod mem;
pub mod topic;

pub use cfg::connection::ConnectionConfig;
pub use cfg::field::ConfigField;
pub use error::{Error, Rejected};
pub use identity::{DeviceIdentity, Phase, Subscriptions};
pub use topic::registry::{SubscriptionRegistry, MAX_SUBSCRIBED_TOPICS};
pub use topic::topics::{Topic, TopicKind, TopicSet};
