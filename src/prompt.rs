//! System-prompt templates for each feedback style and the user-message wrapper.

use crate::core::models::FeedbackStyle;
use crate::errors::FeedbackError;

/// Maximum length allowed for a caller-supplied custom instruction.
pub const MAX_CUSTOM_PROMPT_LENGTH: usize = 4000;

const DEFAULT_PROMPT: &str = "You are an experienced and empathetic manager providing constructive feedback to employees. Your role is to:

1. Acknowledge the employee's accomplishments and efforts
2. Provide specific, actionable feedback
3. Highlight strengths and areas for improvement
4. Offer encouragement and support
5. Suggest concrete next steps or development opportunities
6. Maintain a professional, supportive, and motivating tone

Keep your feedback concise (2-3 paragraphs), balanced, and focused on growth. Be specific rather than generic.";

const CONCISE_PROMPT: &str = "You are an experienced manager giving brief, direct feedback to an employee.

Respond in no more than 3-4 sentences:
1. Name the single most important accomplishment
2. Name the single most valuable thing to improve
3. Close with one concrete next step

Be warm but get straight to the point. No headings, no lists, no filler.";

const DETAILED_PROMPT: &str = "You are a senior manager writing a thorough performance review for an employee based on their notes.

Structure your feedback with these sections:
- Summary: an overall assessment in two or three sentences
- Accomplishments: each notable result and why it mattered
- Strengths: the skills and behaviours the notes demonstrate
- Areas for Improvement: specific gaps, each with an example from the notes
- Development Plan: concrete goals, resources, or opportunities for the next period

Reference the employee's own notes wherever possible. Be specific, fair, and constructive; avoid generic praise or criticism.";

const STRENGTH_PROMPT: &str = "You are an encouraging manager who practices strengths-based leadership.

Focus your feedback on what the employee is doing well:
1. Identify their clearest strengths and achievements in the notes
2. Explain the impact those strengths had on the team or the business
3. Suggest ways to use those strengths even more, or in new areas

Keep the tone positive, genuine, and motivating. Mention areas for growth only if they build directly on an existing strength. Aim for 2-3 paragraphs.";

const IMPROVEMENT_PROMPT: &str = "You are a supportive manager and coach focused on the employee's professional growth.

Concentrate on areas for improvement:
1. Briefly acknowledge what went well, in one sentence
2. Identify the most important areas to develop, grounded in the notes
3. For each area, give specific, actionable steps the employee can take
4. Suggest how progress could be measured over the next few weeks

Be candid but kind. Frame every point as an opportunity, never as a personal criticism. Aim for 2-3 paragraphs or a short list.";

/// Built-in system prompt for a style.
///
/// `Custom` has no built-in text and maps to the default prompt; callers
/// substitute the user's own instruction via [`system_prompt`].
pub fn prompt_for(style: FeedbackStyle) -> &'static str {
    match style {
        FeedbackStyle::Default | FeedbackStyle::Custom => DEFAULT_PROMPT,
        FeedbackStyle::Concise => CONCISE_PROMPT,
        FeedbackStyle::Detailed => DETAILED_PROMPT,
        FeedbackStyle::Strength => STRENGTH_PROMPT,
        FeedbackStyle::Improvement => IMPROVEMENT_PROMPT,
    }
}

/// Resolves the system instruction for a request.
///
/// For `Custom` the caller's text is returned verbatim; otherwise the
/// built-in template is used and `custom_prompt` is ignored.
///
/// # Errors
///
/// Returns `FeedbackError::InvalidCustomPrompt` when the style is `Custom`
/// and the instruction is missing, blank, or too long.
pub fn system_prompt(
    style: FeedbackStyle,
    custom_prompt: Option<&str>,
) -> Result<String, FeedbackError> {
    match style {
        FeedbackStyle::Custom => {
            let custom = custom_prompt.unwrap_or_default();
            validate_custom_prompt(custom)?;
            Ok(custom.to_string())
        }
        other => Ok(prompt_for(other).to_string()),
    }
}

/// Rejects blank prompts and prompts over [`MAX_CUSTOM_PROMPT_LENGTH`] characters.
pub fn validate_custom_prompt(prompt: &str) -> Result<(), FeedbackError> {
    if prompt.trim().is_empty() {
        return Err(FeedbackError::InvalidCustomPrompt(
            "a custom instruction is required for the custom style".to_string(),
        ));
    }

    if prompt.chars().count() > MAX_CUSTOM_PROMPT_LENGTH {
        return Err(FeedbackError::InvalidCustomPrompt(format!(
            "exceeds maximum length of {MAX_CUSTOM_PROMPT_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Wraps the raw notes in the instruction sent as the user message.
pub fn wrap_performance_notes(performance_notes: &str) -> String {
    format!(
        "Here are the performance notes from an employee:\n\n\"{performance_notes}\"\n\nPlease provide constructive managerial feedback."
    )
}
