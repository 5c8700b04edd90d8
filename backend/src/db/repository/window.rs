//! Registration window persistence.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::RegistrationWindow;

#[async_trait]
pub trait WindowRepository: Send + Sync {
    /// Fetch the stored window exactly as persisted.
    ///
    /// The auto-close rule is *not* applied here; that is the service's job
    /// because it needs the current date. A repository that never had a
    /// window written returns a closed default.
    async fn get_window(&self) -> RepositoryResult<RegistrationWindow>;
}
