use serde::{Deserialize, Serialize};

/// Subscription level of a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Premium,
    Free,
}

impl Tier {
    pub fn from_plan(plan: Option<&str>) -> Self {
        match plan {
            Some("premium") => Tier::Premium,
            _ => Tier::Free,
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, Tier::Premium)
    }
}

/// The authenticated identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

/// Per-request snapshot of the caller's subscription tier and free-usage counter.
/// Read once by the gate; the counter itself lives with the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub tier: Tier,
    pub free_usage: u32,
}

#[cfg(test)]
impl Entitlement {
    pub fn premium() -> Self {
        Self {
            tier: Tier::Premium,
            free_usage: 0,
        }
    }

    pub fn free(free_usage: u32) -> Self {
        Self {
            tier: Tier::Free,
            free_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_premium_plan_maps_to_premium() {
        assert_eq!(Tier::from_plan(Some("premium")), Tier::Premium);
        assert_eq!(Tier::from_plan(Some("free")), Tier::Free);
        assert_eq!(Tier::from_plan(Some("Premium")), Tier::Free);
        assert_eq!(Tier::from_plan(None), Tier::Free);
    }
}
