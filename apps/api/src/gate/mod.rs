//! Request Gate — decides whether a caller may consume a feature.
//!
//! The gate only reads entitlement state. Counting a use is the pipeline's job
//! and happens after the provider call succeeds.

use crate::errors::AppError;
use crate::models::user::Entitlement;

pub mod middleware;

/// Number of quota-gated actions a free caller gets before upgrading.
pub const FREE_USAGE_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    /// Premium always passes; free passes while under `FREE_USAGE_LIMIT`.
    FreeQuota,
    /// Premium only, whatever the counter says.
    PremiumOnly,
}

impl AccessRule {
    pub fn check(&self, entitlement: &Entitlement) -> Result<(), AppError> {
        if entitlement.tier.is_premium() {
            return Ok(());
        }
        match self {
            AccessRule::FreeQuota if entitlement.free_usage < FREE_USAGE_LIMIT => Ok(()),
            AccessRule::FreeQuota => Err(AppError::quota_exceeded()),
            AccessRule::PremiumOnly => Err(AppError::premium_only()),
        }
    }
}
