// Prompt templates sent to the chat model.
// The article and blog-title actions forward the user's prompt verbatim.

/// Wraps extracted resume text. `{resume_text}` is substituted at call time.
pub const RESUME_REVIEW_PROMPT_TEMPLATE: &str = "Review the following resume and provide \
    constructive feedback on its strengths, weaknesses, and areas for improvement. \
    Resume Content:\n\n{resume_text}";

pub fn resume_review_prompt(resume_text: &str) -> String {
    RESUME_REVIEW_PROMPT_TEMPLATE.replace("{resume_text}", resume_text)
}
