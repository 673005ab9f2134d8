// Prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for prompt-based generation. Replace `{schema}` and `{date_rules}` before sending.
pub const GENERATION_SYSTEM: &str = r#"You are an expert resume writer. You must respond with ONLY valid JSON, no other text.

Always return a complete resume using exactly this structure:

{schema}

Rules:
- Use the provided name and email in "basic_info".
- Do NOT mention the target company or designation in the experience section. Instead, create a plausible work history at other companies and roles that makes the candidate a strong fit.
- Fill every section (education, experience, skills, certifications, projects, awards, publications, volunteer) with realistic, professional content. No section may be empty.
- {date_rules}"#;

/// User message template. Replace `{identity_prompt}`, `{job_title}` and `{job_description}`.
pub const GENERATION_USER_TEMPLATE: &str = "{identity_prompt}

Target Job Title: {job_title}
Target Job Description: {job_description}

Remember: respond with ONLY the JSON object, no other text or explanation.";

/// Identity preamble. Replace `{name}`, `{email}` and `{prompt}`.
pub const IDENTITY_PROMPT_TEMPLATE: &str = "Generate a sample resume for the following user:
Name: {name}
Email: {email}

Use the following as context for job role, company, and skills:
{prompt}";

/// System prompt for tailoring an existing CV. Replace `{schema}` and `{date_rules}` before sending.
pub const TAILOR_SYSTEM: &str = r#"You are an expert resume writer. You must respond with ONLY valid JSON, no other text.

Given the text of a candidate's existing resume and a target job, rewrite and structure the resume for ATS compatibility using exactly this structure:

{schema}

Rules:
- Keep the candidate's real employers, schools, dates and contact details. Do not invent work history.
- Reword summaries, bullet points and skills so they speak to the target job.
- Leave a section as an empty list when the resume has nothing for it.
- {date_rules}"#;

/// User message template. Replace `{resume_text}`, `{job_title}` and `{job_description}`.
pub const TAILOR_USER_TEMPLATE: &str = "Resume Content:
{resume_text}

Target Job Title: {job_title}
Target Job Description: {job_description}

Remember: respond with ONLY the JSON object, no other text or explanation.";
