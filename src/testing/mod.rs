//! Fixture builders shared by unit tests

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::{
    Asset, Feature, Image, Job, Property, PropertyDetail, PropertyStatus, Space, SpaceDetail,
};
use crate::types::EntityType;

pub fn sample_property() -> Property {
    let now = Utc::now();
    Property {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        name: "Harbour View".to_string(),
        address: "12 Quay Street".to_string(),
        city: Some("Bristol".to_string()),
        postcode: Some("BS1 4DJ".to_string()),
        description: Some("Two-bed flat above the marina".to_string()),
        status: PropertyStatus::Active,
        splash_image_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_asset(space_id: Uuid, name: &str, position: i32) -> Asset {
    Asset {
        id: Uuid::new_v4(),
        space_id,
        name: name.to_string(),
        category: Some("appliance".to_string()),
        make: None,
        model: None,
        serial_number: None,
        notes: None,
        installed_on: None,
        position,
    }
}

fn space_detail(property_id: Uuid, name: &str, position: i32, assets: &[&str]) -> SpaceDetail {
    let space = Space {
        id: Uuid::new_v4(),
        property_id,
        name: name.to_string(),
        kind: Some("room".to_string()),
        floor: Some("1".to_string()),
        description: None,
        position,
    };
    let assets = assets
        .iter()
        .enumerate()
        .map(|(i, a)| sample_asset(space.id, a, i as i32))
        .collect();
    SpaceDetail { space, assets }
}

/// Kitchen (oven, fridge), bathroom (boiler), loft (empty)
pub fn sample_detail() -> PropertyDetail {
    let property = sample_property();
    let id = property.id;
    PropertyDetail {
        spaces: vec![
            space_detail(id, "Kitchen", 0, &["Oven", "Fridge"]),
            space_detail(id, "Bathroom", 1, &["Boiler"]),
            space_detail(id, "Loft", 2, &[]),
        ],
        features: vec![Feature {
            id: Uuid::new_v4(),
            property_id: id,
            name: "Parking".to_string(),
            value: Some("1 space".to_string()),
        }],
        property,
    }
}

pub fn sample_image(entity_type: EntityType, entity_id: Uuid, file_name: &str) -> Image {
    Image {
        id: Uuid::new_v4(),
        entity_type,
        entity_id,
        file_name: file_name.to_string(),
        content_type: "image/jpeg".to_string(),
        size_bytes: 1024,
        checksum: "00".repeat(32),
        url: format!("https://cdn.example.test/{}", file_name),
        created_at: Utc::now(),
    }
}

pub fn sample_job(property_id: Uuid, title: &str, starts_in_hours: i64, lasts_hours: i64) -> Job {
    let now = Utc::now();
    let starts_at = now + Duration::hours(starts_in_hours);
    Job {
        id: Uuid::new_v4(),
        property_id,
        title: title.to_string(),
        pin: "482913".to_string(),
        asset_ids: Vec::new(),
        contractor_name: Some("Ace Plumbing".to_string()),
        notes: None,
        starts_at,
        expires_at: starts_at + Duration::hours(lasts_hours),
        revoked_at: None,
        created_by: Uuid::new_v4(),
        created_at: now,
    }
}
