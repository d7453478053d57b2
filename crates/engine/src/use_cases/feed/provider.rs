//! Feed batch fetching.

use std::sync::Arc;

use explore_domain::{CategoryId, ContentId, ContentItem};

use crate::infrastructure::ports::{FeedPort, FeedQuery, TransportError};

/// A prefetch starts once the viewer is this close to the end of the buffer.
pub const PREFETCH_REMAINING: usize = 3;

/// Fetches ranked batches, excluding everything already seen this session.
///
/// Pagination is by exclusion: every fetch uses offset 0 and sends the full
/// history, so the ranking service never returns a visited item.
#[derive(Clone)]
pub struct FeedProvider {
    port: Arc<dyn FeedPort>,
    page_size: u32,
}

impl FeedProvider {
    pub fn new(port: Arc<dyn FeedPort>, page_size: u32) -> Self {
        Self { port, page_size }
    }

    pub async fn fetch_batch(
        &self,
        history: &[ContentId],
        category_id: Option<CategoryId>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ContentItem>, TransportError> {
        let query = FeedQuery {
            history: history.to_vec(),
            category_id,
            limit,
            offset,
        };
        let items = self.port.fetch_batch(query).await?;
        tracing::debug!(
            excluded = history.len(),
            category_id = ?category_id.map(CategoryId::get),
            returned = items.len(),
            "Fetched feed batch"
        );
        Ok(items)
    }

    /// Next page at the configured size.
    pub async fn fetch_next(
        &self,
        history: &[ContentId],
        category_id: Option<CategoryId>,
    ) -> Result<Vec<ContentItem>, TransportError> {
        self.fetch_batch(history, category_id, self.page_size, 0)
            .await
    }

    /// True when `index` is within [`PREFETCH_REMAINING`] of the end of a
    /// buffer of `len` items.
    pub fn should_prefetch(index: usize, len: usize) -> bool {
        len > 0 && index + PREFETCH_REMAINING >= len
    }
}
