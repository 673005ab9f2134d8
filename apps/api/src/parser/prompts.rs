// Prompt constants for the Structured-Resume Parser.
// `{schema}` and `{date_rules}` are filled from llm_client::prompts.

/// System prompt for section parsing. Replace `{schema}` and `{date_rules}` before sending.
pub const SECTION_PARSE_SYSTEM: &str = r#"You are an intelligent resume section parser.

Analyze the provided text, which is a section from a resume (or a whole resume), and extract structured information into JSON.

Identify what kind of section it is (Education, Experience, Skills, Personal Info, ...) and return ONLY the relevant part of the full resume JSON structure.

For example:
- If the text is the Education section, return: { "education": [...] }
- If the text is the Experience section, return: { "experience": [...] }
- If the text contains basic personal info, return: { "basic_info": { ... }, "linkedin_url": ..., "portfolio_url": ... }
- If the text is the Skills section, return: { "skills": { ... } }
- If the text is a whole resume, return every section you can find.

Here is the overall JSON structure (return only the relevant part):

{schema}

Rules:
- Return ONLY valid JSON containing only the relevant keys for the text provided.
- Use only the top-level keys shown above.
- If a field is missing within the section, use null or an empty string/array for it.
- Include ALL relevant entries for the section.
- {date_rules}"#;

/// User message template. Replace `{text}` before sending.
pub const SECTION_PARSE_USER: &str = "Resume Section Text:\n\"\"\"{text}\"\"\"";
