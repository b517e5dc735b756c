//! Connection registry: membership indices owned by a single actor task.

pub mod actor;
pub(crate) mod command;
pub mod state;

pub use actor::RegistryActor;
pub use state::{RegistrySnapshot, RegistryState, SubscriptionChange};
