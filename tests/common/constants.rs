//! Shared constants for end-to-end tests

// ============================================================================
// Test Identities
// ============================================================================

/// Identity subject of the admin. Signed in first, so bootstrap makes it admin.
pub const ADMIN_SUBJECT: &str = "sub-admin";
pub const ADMIN_USER: &str = "admin";

/// Identity subject of the regular member.
pub const TEST_SUBJECT: &str = "sub-member";
pub const TEST_USER: &str = "testuser";

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Fixtures
// ============================================================================

/// 1x1 transparent PNG
pub const PNG_BYTES: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];
