/// Decimal places for monetary amounts exposed to callers.
pub const DECIMAL_PRECISION: u32 = 2;

/// Decimal places kept on internal lot and share arithmetic.
pub const ROUNDING_SCALE: u32 = 8;

/// Year basis for IRR time fractions (actual/365).
pub const DAYS_PER_YEAR: f64 = 365.0;
