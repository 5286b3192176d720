use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use uuid::Uuid;

use crate::models::location::{GeoPoint, LocationUpdate};
use crate::models::order::{Order, OrderStatus, StatusUpdate};

const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("order service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("order service answered {status} for {path}")]
    Status { status: StatusCode, path: String },
}

/// The slice of the order service a tracking session talks to.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn fetch_order(&self, order_id: u64) -> Result<Order, ServiceError>;

    async fn update_status(
        &self,
        order_id: u64,
        status: OrderStatus,
        actor_id: Uuid,
    ) -> Result<Order, ServiceError>;

    async fn report_location(&self, order_id: u64, point: GeoPoint) -> Result<(), ServiceError>;
}

pub struct HttpOrderService {
    client: Client,
    base_url: String,
}

impl HttpOrderService {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn ensure_success(
    response: reqwest::Response,
    path: &str,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ServiceError::Status {
            status,
            path: path.to_string(),
        })
    }
}

#[async_trait]
impl OrderService for HttpOrderService {
    async fn fetch_order(&self, order_id: u64) -> Result<Order, ServiceError> {
        let path = format!("/orders/details/{order_id}");
        let response = self.client.get(self.url(&path)).send().await?;

        Ok(ensure_success(response, &path)?.json::<Order>().await?)
    }

    async fn update_status(
        &self,
        order_id: u64,
        status: OrderStatus,
        actor_id: Uuid,
    ) -> Result<Order, ServiceError> {
        let path = format!("/orders/{order_id}/status");
        let response = self
            .client
            .patch(self.url(&path))
            .header(USER_ID_HEADER, actor_id.to_string())
            .json(&StatusUpdate { status })
            .send()
            .await?;

        Ok(ensure_success(response, &path)?.json::<Order>().await?)
    }

    async fn report_location(&self, order_id: u64, point: GeoPoint) -> Result<(), ServiceError> {
        let path = format!("/orders/{order_id}/location");
        let response = self
            .client
            .post(self.url(&path))
            .json(&LocationUpdate::from(point))
            .send()
            .await?;

        ensure_success(response, &path)?;
        Ok(())
    }
}
