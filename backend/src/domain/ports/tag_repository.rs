//! Driven port for recipe tags.

use async_trait::async_trait;
use pagination::{Page, Paginated};

use super::StoreError;
use crate::domain::Tag;

/// Read access to tags. Tags are created implicitly when recipes use them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Page through tags ordered by name.
    async fn get_tags(&self, page: &Page) -> Result<Paginated<Tag>, StoreError>;
}
