//! Vehicle operations.

use super::Resource;
use crate::client::MotiveClient;
use crate::errors::MotiveResult;
use crate::pagination::{LazyPaginator, PaginatedResponse};
use crate::types::{Vehicle, VehicleLocation};
use serde::Serialize;

/// Service for vehicle operations.
pub struct VehiclesService<'a> {
    resource: Resource<'a>,
}

impl<'a> VehiclesService<'a> {
    /// Creates a new vehicles service.
    pub fn new(client: &'a MotiveClient) -> Self {
        Self {
            resource: Resource::new(client, "vehicles", 1, "vehicle", "vehicles"),
        }
    }

    /// Gets the underlying resource.
    pub fn resource(&self) -> &Resource<'a> {
        &self.resource
    }

    /// Lazily lists every vehicle.
    pub fn list(&self) -> LazyPaginator<'a, Vehicle> {
        self.resource.list()
    }

    /// Lists active vehicles only.
    pub fn list_active(&self) -> LazyPaginator<'a, Vehicle> {
        self.resource.list().with_param("status", "active")
    }

    /// Fetches one page of vehicles.
    pub async fn paginate(&self, page: u32, per_page: u32) -> MotiveResult<PaginatedResponse<Vehicle>> {
        self.resource.paginate(page, per_page).await
    }

    /// Gets a vehicle by ID.
    pub async fn get(&self, id: u64) -> MotiveResult<Vehicle> {
        self.resource.find(id).await
    }

    /// Creates a vehicle.
    pub async fn create<B: Serialize + ?Sized>(&self, request: &B) -> MotiveResult<Vehicle> {
        self.resource.create(request).await
    }

    /// Updates a vehicle.
    pub async fn update<B: Serialize + ?Sized>(&self, id: u64, request: &B) -> MotiveResult<Vehicle> {
        self.resource.update(id, request).await
    }

    /// Deletes a vehicle.
    pub async fn delete(&self, id: u64) -> MotiveResult<()> {
        self.resource.delete(id).await
    }

    /// Lazily lists recorded locations of a vehicle.
    pub fn locations(&self, id: u64) -> LazyPaginator<'a, VehicleLocation> {
        let path = self.resource.path(Some(&id.to_string()), Some("locations"));
        self.resource.client().lazy_paginator(path, "vehicle_locations")
    }
}
