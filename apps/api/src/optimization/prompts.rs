// Prompt constants for the Optimization module.

/// System prompt for structured regeneration. Replace `{schema}` and `{date_rules}` before sending.
pub const REGENERATE_SYSTEM: &str = r#"You are a professional resume writer and ATS optimization specialist. Return only valid JSON.

The resume must use exactly this structure:

{schema}

{date_rules}"#;

/// Regeneration task. Replace `{resume}`, `{suggestions}` and `{keyword_gaps}`.
pub const REGENERATE_PROMPT_TEMPLATE: &str = r#"TASK:
Given the following structured resume info, suggestions, and keyword gaps, generate a new, complete resume as a JSON object.
- If any section (projects, certifications, skills, awards, publications, volunteer, etc.) is missing or empty, INVENT plausible, relevant, and impressive content based on the rest of the resume and best practices for the target role.
- Do NOT leave any section empty. Every section must have at least one entry.
- Incorporate all suggestions and fill all keyword gaps.
- Use active, concise language.
- Output ONLY the new resume as structured JSON, no extra text or markdown.

STRUCTURED RESUME INFO:
{resume}

SUGGESTIONS:
{suggestions}

KEYWORD GAPS:
{keyword_gaps}"#;

/// System prompt for the plain-text rewrite.
pub const REWRITE_SYSTEM: &str = "You are an expert resume writer and ATS optimization specialist. \
    Output only the revised resume as plain text. \
    Do NOT use JSON or markdown code fences. \
    Do NOT include explanations or commentary.";

/// Plain-text rewrite task. Replace `{resume_text}`, `{suggestions}` and `{keyword_gaps}`.
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"TASK:
Rewrite the resume below so that it incorporates the suggestions and covers the keyword gaps.
- Keep every true fact from the original; do not invent employers or degrees.
- Work keyword gaps into the relevant sections, especially Skills and Experience.
- Use active voice and concise bullet points.

ORIGINAL RESUME:
{resume_text}

SUGGESTIONS (bullet points):
{suggestions}

KEYWORD GAPS (bullet points):
{keyword_gaps}"#;
