//! Common test utilities for engine integration tests.
//!
//! Tests run against the in-memory device store with a short retry delay so
//! failure paths stay fast.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use camera_map_engine::services::RetryPolicy;
use camera_map_engine::SpatialEngine;
use domain::models::{Camera, Dvr, LocationSource};
use fake::faker::company::en::CompanyName;
use fake::faker::name::en::Name;
use fake::Fake;
use persistence::InMemoryDeviceStore;

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
    }
}

/// Engine over a fresh in-memory store; the store handle is returned for
/// seeding and fault injection.
pub fn setup() -> (SpatialEngine, InMemoryDeviceStore) {
    let store = InMemoryDeviceStore::new();
    let engine = SpatialEngine::new(Arc::new(store.clone()), fast_retry());
    (engine, store)
}

pub async fn seed_camera(store: &InMemoryDeviceStore, id: i64, position: Option<(f64, f64)>) {
    let name: String = Name().fake();
    let mut camera = Camera::new(id, name);
    if let Some((lat, lon)) = position {
        camera = camera.with_position(lat, lon);
    }
    store.insert_camera(camera).await;
}

pub async fn seed_inherited_camera(
    store: &InMemoryDeviceStore,
    id: i64,
    dvr_id: i64,
    position: (f64, f64),
) {
    let name: String = Name().fake();
    let mut camera = Camera::new(id, name).with_position(position.0, position.1);
    camera.dvr_id = Some(dvr_id);
    camera.location_source = LocationSource::Inherited;
    store.insert_camera(camera).await;
}

pub async fn seed_dvr(store: &InMemoryDeviceStore, id: i64, position: Option<(f64, f64)>) {
    let name: String = CompanyName().fake();
    let mut dvr = Dvr::new(id, name);
    if let Some((lat, lon)) = position {
        dvr = dvr.with_position(lat, lon);
    }
    store.insert_dvr(dvr).await;
}
