//! Author display join shared by the post and comment services.

use std::collections::{HashMap, HashSet};

use crate::domain::{AuthorSummary, UserId};
use crate::ports::UserRepository;

/// Resolved author summaries keyed by user id.
#[derive(Debug, Default)]
pub(crate) struct Authors(HashMap<UserId, AuthorSummary>);

impl Authors {
    /// Fetch every distinct author in one call.
    ///
    /// A failing lookup degrades to "Unknown user" placeholders instead of
    /// failing the whole read.
    pub(crate) async fn load(
        users: &dyn UserRepository,
        ids: impl IntoIterator<Item = UserId>,
    ) -> Self {
        let ids: Vec<UserId> = ids.into_iter().collect::<HashSet<_>>().into_iter().collect();
        if ids.is_empty() {
            return Self::default();
        }

        match users.find_many(&ids).await {
            Ok(found) => Self(found.iter().map(|u| (u.id, u.summary())).collect()),
            Err(e) => {
                tracing::warn!(error = %e, count = ids.len(), "Author lookup failed");
                Self::default()
            }
        }
    }

    pub(crate) fn get(&self, id: UserId) -> AuthorSummary {
        self.0
            .get(&id)
            .cloned()
            .unwrap_or_else(|| AuthorSummary::unknown(id))
    }
}
