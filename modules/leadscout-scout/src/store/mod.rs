pub mod memory;
pub mod postgres;

use std::sync::Arc;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::traits::{CredentialRepository, UsageRepository, UserRepository};

/// The three repositories the service needs, all backed by one store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub credentials: Arc<dyn CredentialRepository>,
    pub usage: Arc<dyn UsageRepository>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + CredentialRepository + UsageRepository + 'static,
    {
        Self {
            users: store.clone(),
            credentials: store.clone(),
            usage: store,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }
}
