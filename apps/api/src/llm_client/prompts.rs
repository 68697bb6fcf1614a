// Shared prompt fragments. Each feature keeps its own prompts.rs alongside it;
// this file only holds cross-cutting instructions.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every analysis prompt so partial answers still parse.
pub const COMPLETE_OBJECT_INSTRUCTION: &str = "\
    Always return every field listed in the schema, even when you have nothing to report: \
    use an empty array for lists, 0 for numbers and an empty string for text. \
    Never rename fields and never wrap the object in another key.";
