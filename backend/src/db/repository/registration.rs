//! Registration persistence.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{NewRegistration, Registration, RegistrationFilter, RegistrationId};

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Fetch a registration by id, including archived ones.
    async fn get_registration(&self, id: RegistrationId) -> RepositoryResult<Registration>;

    /// Fetch several registrations in input order.
    ///
    /// Fails with `NotFound` naming the first unknown id.
    async fn get_registrations(&self, ids: &[RegistrationId]) -> RepositoryResult<Vec<Registration>>;

    /// List registrations matching `filter`, ordered by id.
    async fn list_registrations(&self, filter: &RegistrationFilter) -> RepositoryResult<Vec<Registration>>;

    /// Create a registration in the `registered` state with a fresh id.
    async fn insert_registration(&self, new: NewRegistration) -> RepositoryResult<Registration>;
}
