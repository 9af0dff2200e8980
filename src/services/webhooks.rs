//! Company webhook subscription operations.

use super::Resource;
use crate::client::MotiveClient;
use crate::errors::MotiveResult;
use crate::pagination::LazyPaginator;
use crate::types::{CompanyWebhook, CreateWebhookRequest, UpdateWebhookRequest};

/// Service for managing webhook subscriptions.
pub struct WebhooksService<'a> {
    resource: Resource<'a>,
}

impl<'a> WebhooksService<'a> {
    /// Creates a new webhooks service.
    pub fn new(client: &'a MotiveClient) -> Self {
        Self {
            resource: Resource::new(client, "company_webhooks", 2, "company_webhook", "company_webhooks"),
        }
    }

    /// Gets the underlying resource.
    pub fn resource(&self) -> &Resource<'a> {
        &self.resource
    }

    /// Lazily lists registered webhooks.
    pub fn list(&self) -> LazyPaginator<'a, CompanyWebhook> {
        self.resource.list()
    }

    /// Gets a webhook by ID.
    pub async fn get(&self, id: u64) -> MotiveResult<CompanyWebhook> {
        self.resource.find(id).await
    }

    /// Registers a webhook.
    pub async fn create(&self, request: &CreateWebhookRequest) -> MotiveResult<CompanyWebhook> {
        self.resource.create(request).await
    }

    /// Updates a webhook.
    pub async fn update(&self, id: u64, request: &UpdateWebhookRequest) -> MotiveResult<CompanyWebhook> {
        self.resource.update(id, request).await
    }

    /// Removes a webhook.
    pub async fn delete(&self, id: u64) -> MotiveResult<()> {
        self.resource.delete(id).await
    }
}
