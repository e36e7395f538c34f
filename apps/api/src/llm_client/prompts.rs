// Shared prompt fragments. Each feature that calls the LLM keeps its own
// prompts.rs alongside it; this file holds what they have in common.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every prompt whose output is shown directly to the candidate.
pub const SECOND_PERSON_INSTRUCTION: &str = "\
    Address the candidate as \"you\", as if speaking to them directly. \
    Stop generating as soon as the requested output is complete.";

/// Fills `{placeholder}` slots in a prompt template.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}
