//! Request and response bodies of the map-delivery API.
//!
//! Field names follow the API's camelCase. Only the varying fields (device
//! id, bbox, import id, timestamps) are parameters; everything else is fixed
//! test data.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::StepError;

/// Product name and id sent with every import request.
pub const PRODUCT_NAME: &str = "mapprobe";

/// Item type used for delivery and status calls.
pub const ITEM_TYPE_MAP: &str = "map";

/// Formats a timestamp the way the API expects it.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serializes a request body.
///
/// # Errors
///
/// Fails if `payload` cannot be represented as JSON.
pub fn to_body<T: Serialize>(payload: &T) -> Result<Value, StepError> {
    Ok(serde_json::to_value(payload)?)
}

// ============================================================================
// Requests
// ============================================================================

/// `POST /api/login`
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    /// Account name.
    pub username: &'a str,
    /// Account password.
    pub password: &'a str,
}

/// `POST /api/map/import/create`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCreateRequest<'a> {
    /// Requesting device.
    pub device_id: &'a str,
    /// Requested map.
    pub map_properties: MapProperties<'a>,
}

/// Map description inside an import request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapProperties<'a> {
    /// Product name.
    pub product_name: &'a str,
    /// Product id.
    pub product_id: &'a str,
    /// Zoom level.
    pub zoom_level: u8,
    /// Bbox string.
    pub bounding_box: &'a str,
    /// Target resolution, 0 for native.
    pub target_resolution: u32,
    /// Only updates after this epoch, 0 for all.
    pub last_update_after: u64,
}

impl<'a> ImportCreateRequest<'a> {
    /// Builds the fixed import request for a device and bbox.
    pub fn new(device_id: &'a str, bounding_box: &'a str) -> Self {
        Self {
            device_id,
            map_properties: MapProperties {
                product_name: PRODUCT_NAME,
                product_id: PRODUCT_NAME,
                zoom_level: 12,
                bounding_box,
                target_resolution: 0,
                last_update_after: 0,
            },
        }
    }
}

/// `POST /api/delivery/updateDownloadStatus`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDownloadStatusRequest<'a> {
    /// Reporting device.
    pub device_id: &'a str,
    /// Import request id.
    pub catalog_id: &'a str,
    /// Download start time.
    pub download_start: String,
    /// Progress bit number.
    pub bit_number: u32,
    /// Downloaded amount.
    pub download_data: u32,
    /// Report time.
    pub current_time: String,
    /// Status label, e.g. `Start`.
    pub delivery_status: &'a str,
    /// Item type.
    #[serde(rename = "type")]
    pub item_type: &'a str,
}

impl<'a> UpdateDownloadStatusRequest<'a> {
    /// Builds a status report stamped with `now`.
    pub fn new(
        device_id: &'a str,
        catalog_id: &'a str,
        delivery_status: &'a str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id,
            catalog_id,
            download_start: timestamp(now),
            bit_number: 0,
            download_data: 32,
            current_time: timestamp(now),
            delivery_status,
            item_type: ITEM_TYPE_MAP,
        }
    }
}

/// `POST /api/delivery/prepareDelivery`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareDeliveryRequest<'a> {
    /// Import request id.
    pub catalog_id: &'a str,
    /// Requesting device.
    pub device_id: &'a str,
    /// Item type.
    pub item_type: &'a str,
}

/// `POST /api/map/inventory/updates`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUpdateRequest<'a> {
    /// Reporting device.
    pub device_id: &'a str,
    /// Catalog id to inventory state.
    pub inventory: BTreeMap<&'a str, &'a str>,
}

impl<'a> InventoryUpdateRequest<'a> {
    /// Reports one catalog id as delivered.
    pub fn delivered(device_id: &'a str, catalog_id: &'a str) -> Self {
        Self {
            device_id,
            inventory: BTreeMap::from([(catalog_id, "delivery")]),
        }
    }
}

/// `POST /api/device/discover`
///
/// A fixed device and map description. Only the device id and the
/// timestamps vary.
pub fn discovery_document(device_id: &str, now: DateTime<Utc>) -> Value {
    let ts = timestamp(now);
    json!({
        "discoveryType": "get-map",
        "general": {
            "personalDevice": {
                "name": "user-1",
                "idNumber": "idNumber-123",
                "personalNumber": "personalNumber-123"
            },
            "situationalDevice": {
                "weather": 23,
                "bandwidth": 30,
                "time": ts,
                "operativeState": true,
                "power": 94,
                "location": {"lat": "33.4", "long": "23.3", "alt": "344"}
            },
            "physicalDevice": {
                "OS": "android",
                "MAC": "00-B0-D0-63-C2-26",
                "IP": "129.2.3.4",
                "ID": device_id,
                "serialNumber": device_id,
                "possibleBandwidth": "Yes",
                "availableStorage": "38142328832"
            }
        },
        "softwareData": {
            "formation": "yatush",
            "platform": {
                "name": "Olar",
                "platformNumber": "1",
                "virtualSize": 0,
                "components": []
            }
        },
        "mapData": {
            "productId": "dummy product",
            "productName": "no-name",
            "productVersion": "3",
            "productType": "osm",
            "description": "bla-bla",
            "boundingBox": "1,2,3,4",
            "crs": "WGS84",
            "imagingTimeStart": ts,
            "imagingTimeEnd": ts,
            "creationDate": ts,
            "source": "DJI Mavic",
            "classification": "raster",
            "compartmentalization": "N/A",
            "region": "ME",
            "sensor": "CCD",
            "precisionLevel": "3.14",
            "resolution": "0.12"
        }
    })
}

// ============================================================================
// Responses
// ============================================================================

/// Body of a successful login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token.
    pub access_token: Option<String>,
}

/// Body of a successful import-create.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCreateResponse {
    /// Import transaction id.
    pub import_request_id: Option<String>,
}

/// Body of an import status query.
#[derive(Debug, Deserialize)]
pub struct ImportStatusResponse {
    /// Raw status value.
    pub status: Option<String>,
}

/// Body of a prepared-delivery query.
#[derive(Debug, Deserialize)]
pub struct PreparedDeliveryResponse {
    /// Asset URL, absolute or relative to the base URL.
    pub url: Option<String>,
}

/// Decodes a JSON response body.
///
/// # Errors
///
/// Fails if the body is not valid JSON for `T`.
pub fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, StepError> {
    Ok(serde_json::from_slice(body)?)
}
