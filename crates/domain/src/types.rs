//! Domain data types for feed synchronization
//!
//! Wire-facing types mirror the remote catalog API's JSON shapes; the
//! remote service owns `RemoteFeed` records, which the local process only
//! observes through read calls.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The canonical local feed definition, immutable per reconciliation
/// cycle. Exactly one configuration exists per merchant at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFeedConfig {
    /// Canonical location of the generated feed file
    pub feed_url: String,
    /// ISO 3166-1 alpha-2 country code
    pub country: String,
    /// Locale tag accepted by the remote API (e.g. `en-US`)
    pub locale: String,
    /// ISO 4217 currency code
    pub currency: String,
}

/// Status of a remote feed.
///
/// `DoesNotExist` is a local sentinel for "no matching feed"; it never
/// appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedStatus {
    Active,
    Inactive,
    Deleted,
    DoesNotExist,
}

impl FeedStatus {
    /// Whether the remote service is actively ingesting this feed
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// File format of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedFormat {
    Tsv,
    Csv,
    Xml,
}

/// Type of the catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogType {
    Retail,
    Hotel,
}

/// Default availability for products in a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductAvailability {
    InStock,
    OutOfStock,
    Preorder,
}

/// A feed registered with the remote service, observed via read calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFeed {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// The URL the remote service downloads the feed file from
    pub location: String,
    pub status: FeedStatus,
    pub format: FeedFormat,
    pub catalog_type: CatalogType,
    #[serde(default)]
    pub default_currency: Option<String>,
    #[serde(default)]
    pub default_locale: Option<String>,
    #[serde(default)]
    pub default_country: Option<String>,
    #[serde(default)]
    pub default_availability: Option<ProductAvailability>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for registering a new feed with the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFeedRequest {
    pub name: String,
    pub format: FeedFormat,
    pub location: String,
    pub catalog_type: CatalogType,
    pub default_currency: String,
    pub default_locale: String,
    pub default_country: String,
    pub default_availability: ProductAvailability,
}

/// One page of the remote feed listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedListPage {
    pub items: Vec<RemoteFeed>,
    #[serde(default)]
    pub bookmark: Option<String>,
}

/// Status of a feed processing run on the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Completed,
    CompletedEarly,
    Disapproved,
    Failed,
    Processing,
    QueuedForProcessing,
    UnderAppeal,
    UnderReview,
}

/// Product counts reported by a processing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCounts {
    #[serde(default)]
    pub original: Option<u64>,
    #[serde(default)]
    pub ingested: Option<u64>,
}

/// Ingestion issue counters keyed by issue code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionDetails {
    #[serde(default)]
    pub errors: BTreeMap<String, u64>,
    #[serde(default)]
    pub info: BTreeMap<String, u64>,
    #[serde(default)]
    pub warnings: BTreeMap<String, u64>,
}

/// Validation issue counters keyed by issue code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDetails {
    #[serde(default)]
    pub errors: BTreeMap<String, u64>,
    #[serde(default)]
    pub warnings: BTreeMap<String, u64>,
}

/// Report of one remote processing/ingestion run of the feed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub id: String,
    pub status: ProcessingStatus,
    #[serde(default)]
    pub product_counts: Option<ProductCounts>,
    #[serde(default)]
    pub ingestion_details: Option<IngestionDetails>,
    #[serde(default)]
    pub validation_details: Option<ValidationDetails>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of processing results, most recent first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResultsPage {
    pub items: Vec<ProcessingResult>,
    #[serde(default)]
    pub bookmark: Option<String>,
}

/// A per-item issue from a processing run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemIssue {
    #[serde(default)]
    pub item_number: u64,
    #[serde(default)]
    pub errors: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub warnings: BTreeMap<String, serde_json::Value>,
}

/// One page of per-item issues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemIssuesPage {
    pub items: Vec<ItemIssue>,
    #[serde(default)]
    pub bookmark: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_status_serializes_to_wire_strings() {
        assert_eq!(serde_json::to_string(&FeedStatus::Active).unwrap(), "\"ACTIVE\"");
        assert_eq!(serde_json::to_string(&FeedStatus::Inactive).unwrap(), "\"INACTIVE\"");
        assert_eq!(serde_json::to_string(&FeedStatus::Deleted).unwrap(), "\"DELETED\"");
    }

    #[test]
    fn remote_feed_deserializes_from_listing_item() {
        let json = r#"{
            "id": "278912",
            "name": "Created by FeedSync US-USD",
            "location": "https://shop.example/feed-abc123.xml",
            "status": "ACTIVE",
            "format": "XML",
            "catalog_type": "RETAIL",
            "default_currency": "USD",
            "default_locale": "en-US",
            "default_country": "US",
            "default_availability": "IN_STOCK",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-02T10:00:00Z"
        }"#;

        let feed: RemoteFeed = serde_json::from_str(json).unwrap();
        assert_eq!(feed.id, "278912");
        assert!(feed.status.is_active());
        assert_eq!(feed.format, FeedFormat::Xml);
        assert_eq!(feed.default_country.as_deref(), Some("US"));
        assert!(feed.created_at.is_some());
    }

    #[test]
    fn remote_feed_tolerates_missing_optional_fields() {
        let json = r#"{
            "id": "1",
            "location": "https://shop.example/feed.xml",
            "status": "INACTIVE",
            "format": "XML",
            "catalog_type": "RETAIL"
        }"#;

        let feed: RemoteFeed = serde_json::from_str(json).unwrap();
        assert_eq!(feed.name, None);
        assert_eq!(feed.default_locale, None);
        assert_eq!(feed.created_at, None);
    }

    #[test]
    fn create_feed_request_serializes_availability() {
        let request = CreateFeedRequest {
            name: "Created by FeedSync US-USD".to_string(),
            format: FeedFormat::Xml,
            location: "https://shop.example/feed.xml".to_string(),
            catalog_type: CatalogType::Retail,
            default_currency: "USD".to_string(),
            default_locale: "en-US".to_string(),
            default_country: "US".to_string(),
            default_availability: ProductAvailability::InStock,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["default_availability"], "IN_STOCK");
        assert_eq!(value["catalog_type"], "RETAIL");
    }

    #[test]
    fn processing_result_deserializes_counters() {
        let json = r#"{
            "id": "run-1",
            "status": "COMPLETED",
            "product_counts": {"original": 100, "ingested": 98},
            "ingestion_details": {"errors": {"LINE_LEVEL_ERROR": 2}},
            "validation_details": {"warnings": {"MISSING_IMAGE": 5}}
        }"#;

        let result: ProcessingResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.status, ProcessingStatus::Completed);
        assert_eq!(result.product_counts.unwrap().ingested, Some(98));
        assert_eq!(
            result.ingestion_details.unwrap().errors.get("LINE_LEVEL_ERROR"),
            Some(&2)
        );
    }
}
