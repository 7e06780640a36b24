// Paid features: text generation, image generation and editing, resume review.
// Each handler is configuration for `pipeline::run_action`; no handler owns
// its own control flow for gating, persistence, or usage accounting.

pub mod handlers;
pub mod pipeline;
pub mod uploads;
