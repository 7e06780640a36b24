//! The action pipeline shared by every paid feature.
//!
//! Flow: access check → provider step → persist creation → count free use → respond.
//!
//! Persistence and usage accounting are best-effort. Once the provider has
//! produced content the caller gets it, even if the insert or the counter
//! write fails. A failed provider step stops the pipeline before either.

use std::future::Future;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::gate::AccessRule;
use crate::models::creation::{CreationType, NewCreation};
use crate::models::user::{Caller, Entitlement};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub content: String,
}

/// Static description of one action: who may run it and how its result is recorded.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub rule: AccessRule,
    pub creation_type: CreationType,
    /// Text stored in `creations.prompt`.
    pub prompt: String,
    pub publish: bool,
}

impl ActionSpec {
    pub fn new(rule: AccessRule, creation_type: CreationType, prompt: impl Into<String>) -> Self {
        Self {
            rule,
            creation_type,
            prompt: prompt.into(),
            publish: false,
        }
    }

    pub fn published(mut self, publish: bool) -> Self {
        self.publish = publish;
        self
    }
}

/// Runs `produce` if `entitlement` satisfies the action's rule, then records the result.
///
/// `produce` is not called at all when the check fails.
pub async fn run_action<F, Fut>(
    state: &AppState,
    caller: &Caller,
    entitlement: &Entitlement,
    spec: ActionSpec,
    produce: F,
) -> Result<ActionResponse, AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, AppError>>,
{
    if let Err(rejection) = spec.rule.check(entitlement) {
        warn!(
            "Blocked {} for user {}: tier={:?} free_usage={}",
            spec.creation_type, caller.user_id, entitlement.tier, entitlement.free_usage
        );
        return Err(rejection);
    }

    let content = produce().await?;

    let record = NewCreation {
        user_id: caller.user_id.clone(),
        prompt: spec.prompt,
        content: content.clone(),
        creation_type: spec.creation_type,
        publish: spec.publish,
    };
    match state.creations.insert(&record).await {
        Ok(id) => info!(
            "Stored {} creation {} for user {}",
            record.creation_type, id, caller.user_id
        ),
        Err(e) => error!(
            "Failed to store {} creation for user {}: {e}",
            record.creation_type, caller.user_id
        ),
    }

    if !entitlement.tier.is_premium() {
        // Read-modify-write against the snapshot taken by the gate.
        let next = entitlement.free_usage.saturating_add(1);
        if let Err(e) = state
            .identity
            .record_free_usage(&caller.user_id, next)
            .await
        {
            error!("Failed to record free usage for user {}: {e}", caller.user_id);
        }
    }

    Ok(ActionResponse {
        success: true,
        content,
    })
}
