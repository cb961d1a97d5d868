//! Unified error codes for the foodbiz service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Menu errors
//! - 8xxx: Customer errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the admin frontend
/// can switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (admin password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Admin login is not configured on this deployment
    AdminAuthNotConfigured = 1008,

    // ==================== 2xxx: Permission ====================
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no line items
    OrderEmpty = 4002,
    /// Line item quantity below one
    OrderInvalidQuantity = 4003,
    /// Delivery order without an address
    DeliveryAddressRequired = 4004,
    /// Unknown order status
    OrderInvalidStatus = 4005,

    // ==================== 5xxx: Payment ====================
    /// Payment provider credentials absent
    PaymentNotConfigured = 5002,
    /// Order has no payable line items
    CheckoutNoItems = 5003,
    /// Webhook signature failed verification
    WebhookSignatureInvalid = 5004,
    /// Webhook body is not a valid event
    WebhookPayloadInvalid = 5005,
    /// Payment provider returned an error
    PaymentProviderError = 5006,

    // ==================== 6xxx: Menu ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Menu item price is invalid
    MenuItemInvalidPrice = 6002,
    /// Menu week not found
    MenuWeekNotFound = 6101,
    /// Selling days contain an unknown weekday code
    MenuWeekInvalidSellingDays = 6102,

    // ==================== 8xxx: Customer ====================
    /// Customer not found
    CustomerNotFound = 8001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",
            ErrorCode::AdminAuthNotConfigured => "Admin authentication is not configured",

            // Permission
            ErrorCode::AdminRequired => "Admin role required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::OrderInvalidQuantity => "Quantity must be at least 1",
            ErrorCode::DeliveryAddressRequired => "Delivery address is required for delivery",
            ErrorCode::OrderInvalidStatus => "Invalid order status",

            // Payment
            ErrorCode::PaymentNotConfigured => "Payment provider is not configured",
            ErrorCode::CheckoutNoItems => "No valid items found in order",
            ErrorCode::WebhookSignatureInvalid => "Invalid webhook signature",
            ErrorCode::WebhookPayloadInvalid => "Invalid webhook payload",
            ErrorCode::PaymentProviderError => "Payment provider error",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemInvalidPrice => "Menu item price must not be negative",
            ErrorCode::MenuWeekNotFound => "Menu week not found",
            ErrorCode::MenuWeekInvalidSellingDays => "Selling days contain an unknown weekday",

            // Customer
            ErrorCode::CustomerNotFound => "Customer not found",

            // System
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1008 => Ok(ErrorCode::AdminAuthNotConfigured),

            // Permission
            2003 => Ok(ErrorCode::AdminRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::OrderInvalidQuantity),
            4004 => Ok(ErrorCode::DeliveryAddressRequired),
            4005 => Ok(ErrorCode::OrderInvalidStatus),

            // Payment
            5002 => Ok(ErrorCode::PaymentNotConfigured),
            5003 => Ok(ErrorCode::CheckoutNoItems),
            5004 => Ok(ErrorCode::WebhookSignatureInvalid),
            5005 => Ok(ErrorCode::WebhookPayloadInvalid),
            5006 => Ok(ErrorCode::PaymentProviderError),

            // Menu
            6001 => Ok(ErrorCode::MenuItemNotFound),
            6002 => Ok(ErrorCode::MenuItemInvalidPrice),
            6101 => Ok(ErrorCode::MenuWeekNotFound),
            6102 => Ok(ErrorCode::MenuWeekInvalidSellingDays),

            // Customer
            8001 => Ok(ErrorCode::CustomerNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
