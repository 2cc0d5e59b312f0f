//! Domain constants

use std::time::Duration;

/// Interval between scheduled reconciliation ticks
pub const REGISTRATION_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Delay before the first reconciliation tick after arming the schedule
pub const REGISTRATION_FIRST_RUN_DELAY: Duration = Duration::from_secs(10);

/// Initial (and minimum) delay before retrying a failed feed creation
pub const CREATE_FEED_DELAY_FLOOR: Duration = Duration::from_secs(60);

/// Maximum delay between feed creation retries
pub const CREATE_FEED_DELAY_CEILING: Duration = Duration::from_secs(6 * 60 * 60);

/// TTL for the cached remote feed listing
pub const FEEDS_CACHE_TTL: Duration = Duration::from_secs(60);

/// Remote error code meaning the merchant is already connected to the
/// platform through a different site.
pub const MERCHANT_CONNECTED_DIFF_PLATFORM_CODE: i64 = 4163;

/// Page size when fetching the most recent processing result
pub const RECENT_PROCESSING_RESULTS_PAGE_SIZE: u32 = 1;

/// Default page size when fetching per-item processing issues
pub const ITEM_ISSUES_PAGE_SIZE: u32 = 25;
