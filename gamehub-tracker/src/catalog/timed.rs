use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{Catalog, CatalogError, CatalogGame, CatalogPage, CatalogQuery, CatalogTerm};

/// A catalog that gives up on lookups taking longer than `limit`
pub struct TimedCatalog {
    inner: Arc<dyn Catalog>,
    limit: Duration,
}

impl TimedCatalog {
    pub fn new(inner: Arc<dyn Catalog>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T, F>(&self, lookup: F) -> Result<T, CatalogError>
    where
        F: Future<Output = Result<T, CatalogError>>,
    {
        tokio::time::timeout(self.limit, lookup)
            .await
            .map_err(|_| CatalogError::TimedOut(self.limit))?
    }
}

#[async_trait]
impl Catalog for TimedCatalog {
    async fn game(&self, id: i64) -> Result<CatalogGame, CatalogError> {
        self.bounded(self.inner.game(id)).await
    }

    async fn search(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError> {
        self.bounded(self.inner.search(query)).await
    }

    async fn additions(&self, id: i64) -> Result<Vec<CatalogGame>, CatalogError> {
        self.bounded(self.inner.additions(id)).await
    }

    async fn genres(&self) -> Result<Vec<CatalogTerm>, CatalogError> {
        self.bounded(self.inner.genres()).await
    }

    async fn tags(&self) -> Result<Vec<CatalogTerm>, CatalogError> {
        self.bounded(self.inner.tags()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StalledCatalog;

    #[async_trait]
    impl Catalog for StalledCatalog {
        async fn game(&self, id: i64) -> Result<CatalogGame, CatalogError> {
            Ok(CatalogGame {
                id,
                name: "Hades".to_string(),
                ..Default::default()
            })
        }

        async fn search(&self, _query: &CatalogQuery) -> Result<CatalogPage, CatalogError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(CatalogError::NotFound)
        }

        async fn additions(&self, _id: i64) -> Result<Vec<CatalogGame>, CatalogError> {
            Ok(vec![])
        }

        async fn genres(&self) -> Result<Vec<CatalogTerm>, CatalogError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![])
        }

        async fn tags(&self) -> Result<Vec<CatalogTerm>, CatalogError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn gives_up_on_stalled_lookups() {
        let catalog = TimedCatalog::new(Arc::new(StalledCatalog), Duration::from_millis(20));

        assert!(matches!(
            catalog.search(&CatalogQuery::default()).await,
            Err(CatalogError::TimedOut(_))
        ));
        assert!(matches!(
            catalog.genres().await,
            Err(CatalogError::TimedOut(_))
        ));
        assert_eq!(catalog.game(7).await.unwrap().name, "Hades");
    }
}
