//! Motive API service implementations.

mod users;
mod vehicles;
mod webhooks;

pub use users::*;
pub use vehicles::*;
pub use webhooks::*;

use crate::client::MotiveClient;
use crate::errors::MotiveResult;
use crate::pagination::{LazyPaginator, PaginatedResponse, Paginator};
use crate::response::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;

/// A REST resource under `v{version}/{base}`.
///
/// List responses carry items under the plural key, each wrapped in the
/// singular key (`{"vehicles": [{"vehicle": {...}}]}`); single-entity
/// responses use the singular key.
#[derive(Debug, Clone, Copy)]
pub struct Resource<'a> {
    client: &'a MotiveClient,
    base: &'static str,
    version: u8,
    singular: &'static str,
    plural: &'static str,
}

impl<'a> Resource<'a> {
    /// Creates a resource.
    pub fn new(
        client: &'a MotiveClient,
        base: &'static str,
        version: u8,
        singular: &'static str,
        plural: &'static str,
    ) -> Self {
        Self {
            client,
            base,
            version,
            singular,
            plural,
        }
    }

    /// Builds `v{version}/{base}[/{id}][/{action}]`.
    pub fn path(&self, id: Option<&str>, action: Option<&str>) -> String {
        let mut path = format!("v{}/{}", self.version, self.base);
        for segment in [id, action].into_iter().flatten() {
            path.push('/');
            path.push_str(segment.trim_matches('/'));
        }
        path
    }

    /// Gets the client.
    pub fn client(&self) -> &'a MotiveClient {
        self.client
    }

    /// Lazily walks every item.
    pub fn list<T: DeserializeOwned>(&self) -> LazyPaginator<'a, T> {
        self.client
            .lazy_paginator(self.path(None, None), self.plural)
            .with_item_key(self.singular)
    }

    /// Single-page paginator.
    pub fn paginator<T: DeserializeOwned>(&self) -> Paginator<'a, T> {
        self.client
            .paginator(self.path(None, None), self.plural)
            .with_item_key(self.singular)
    }

    /// Fetches one page.
    pub async fn paginate<T: DeserializeOwned>(
        &self,
        page: u32,
        per_page: u32,
    ) -> MotiveResult<PaginatedResponse<T>> {
        self.paginator().paginate(page, per_page).await
    }

    /// Gets one entity.
    pub async fn find<T: DeserializeOwned>(&self, id: impl Display) -> MotiveResult<T> {
        let response = self
            .client
            .get(&self.path(Some(&id.to_string()), None), &())
            .await?;
        self.entity(&response)
    }

    /// Creates an entity.
    pub async fn create<T, B>(&self, body: &B) -> MotiveResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.client.post(&self.path(None, None), body).await?;
        self.entity(&response)
    }

    /// Updates an entity.
    pub async fn update<T, B>(&self, id: impl Display, body: &B) -> MotiveResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .client
            .put(&self.path(Some(&id.to_string()), None), body)
            .await?;
        self.entity(&response)
    }

    /// Deletes an entity.
    pub async fn delete(&self, id: impl Display) -> MotiveResult<()> {
        self.client
            .delete(&self.path(Some(&id.to_string()), None))
            .await?;
        Ok(())
    }

    fn entity<T: DeserializeOwned>(&self, response: &Response) -> MotiveResult<T> {
        if response.json_key(self.singular).is_some() {
            response.decode_key(self.singular)
        } else {
            response.decode()
        }
    }
}
