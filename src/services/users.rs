//! User operations.

use super::Resource;
use crate::client::MotiveClient;
use crate::errors::MotiveResult;
use crate::pagination::{LazyPaginator, PaginatedResponse};
use crate::types::User;
use serde::Serialize;

/// Service for user operations.
pub struct UsersService<'a> {
    resource: Resource<'a>,
}

impl<'a> UsersService<'a> {
    /// Creates a new users service.
    pub fn new(client: &'a MotiveClient) -> Self {
        Self {
            resource: Resource::new(client, "users", 1, "user", "users"),
        }
    }

    /// Gets the underlying resource.
    pub fn resource(&self) -> &Resource<'a> {
        &self.resource
    }

    /// Lazily lists every user.
    pub fn list(&self) -> LazyPaginator<'a, User> {
        self.resource.list()
    }

    /// Lazily lists users with the driver role.
    pub fn drivers(&self) -> LazyPaginator<'a, User> {
        self.resource.list().with_param("role", "driver")
    }

    /// Fetches one page of users.
    pub async fn paginate(&self, page: u32, per_page: u32) -> MotiveResult<PaginatedResponse<User>> {
        self.resource.paginate(page, per_page).await
    }

    /// Gets a user by ID.
    pub async fn get(&self, id: u64) -> MotiveResult<User> {
        self.resource.find(id).await
    }

    /// Creates a user.
    pub async fn create<B: Serialize + ?Sized>(&self, request: &B) -> MotiveResult<User> {
        self.resource.create(request).await
    }

    /// Updates a user.
    pub async fn update<B: Serialize + ?Sized>(&self, id: u64, request: &B) -> MotiveResult<User> {
        self.resource.update(id, request).await
    }

    /// Deactivates a user.
    pub async fn deactivate(&self, id: u64) -> MotiveResult<User> {
        self.resource
            .update(id, &serde_json::json!({ "status": "deactivated" }))
            .await
    }
}
