//! Balances resource: `/balance/`.

use async_trait::async_trait;

use super::ApiClient;
use crate::error::{Resource, Result};
use crate::models::{Balance, CreateBalanceRequest};

/// Remote balance operations, as seen by the stores.
#[async_trait]
pub trait BalanceService: Send + Sync {
    /// Fetch every recorded balance, in server order.
    async fn list(&self) -> Result<Vec<Balance>>;

    /// Record a balance; the returned value carries the server-assigned id.
    async fn create(&self, request: CreateBalanceRequest) -> Result<Balance>;

    /// Delete a balance by id.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// HTTP implementation of [`BalanceService`].
#[derive(Debug, Clone)]
pub struct BalanceApi {
    client: ApiClient,
}

impl BalanceApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BalanceService for BalanceApi {
    async fn list(&self) -> Result<Vec<Balance>> {
        self.client
            .get_json(Resource::Balances, "/balance/", &[])
            .await
    }

    async fn create(&self, request: CreateBalanceRequest) -> Result<Balance> {
        self.client
            .post_json(Resource::Balances, "/balance/", &request)
            .await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.client
            .delete(Resource::Balances, &format!("/balance/{id}"))
            .await
    }
}
