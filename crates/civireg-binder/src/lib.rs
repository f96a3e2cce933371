// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod session;
mod timer;

pub use session::{BinderPhase, BinderSession, DEFAULT_QUIET_PERIOD};
pub use timer::{DebounceTimer, TimerToken};

use async_trait::async_trait;
use civireg_core::RegistryError;
use civireg_model::{Resident, ResidentId};

pub const CRATE_NAME: &str = "civireg-binder";

/// The directory surface a binder session needs. Ticket forms hand in the
/// real registry or a fake; the binder never mutates the directory.
#[async_trait]
pub trait ResidentLookup: Send + Sync {
    async fn search(&self, term: &str) -> Result<Vec<Resident>, RegistryError>;
    async fn get_by_id(&self, id: &ResidentId) -> Result<Resident, RegistryError>;
}
