// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// The resume JSON contract every structured call is asked to follow.
pub const RESUME_SCHEMA: &str = r#"{
  "basic_info": {
    "name": string,
    "email": string,
    "phone": string,
    "location": string,
    "title": string,
    "summary": string
  },
  "education": [
    {
      "degree": string,
      "institution": string,
      "field_of_study": string,
      "location": string,
      "start_date": string,
      "end_date": string
    }
  ],
  "experience": [
    {
      "company": string,
      "designation": string,
      "location": string,
      "start_date": string,
      "end_date": string,
      "duration": string,
      "description": string
    }
  ],
  "skills": {
    "technical_skills": [string],
    "soft_skills": [string],
    "languages": [string],
    "tools": [string]
  },
  "certifications": [
    { "name": string, "issuer": string, "date": string }
  ],
  "projects": [
    {
      "title": string,
      "description": string,
      "technologies": [string],
      "role": string,
      "duration": string
    }
  ],
  "awards": [
    { "name": string, "issuer": string, "date": string, "description": string }
  ],
  "publications": [
    { "title": string, "publisher": string, "date": string, "url": string }
  ],
  "volunteer": [
    {
      "organization": string,
      "role": string,
      "start_date": string,
      "end_date": string,
      "description": string
    }
  ],
  "linkedin_url": string,
  "portfolio_url": string
}"#;

/// Date conventions shared by every structured prompt.
pub const DATE_RULES: &str = "\
    Normalize every date to a readable form such as \"Jan 2022\", and ranges to \
    \"Jan 2022 - Dec 2023\". Use \"Present\" for ongoing roles. \
    For experience entries, calculate \"duration\" if it is not explicitly stated.";

/// Substitutes `{key}` placeholders in one pass over `template`.
///
/// Inserted values are never scanned again, so a value that itself contains
/// `{key}` text reaches the model verbatim. Unknown placeholders are left as is.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = values.iter().find(|(key, _)| {
            after.starts_with(key) && after[key.len()..].starts_with('}')
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &after[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_substitutes_every_occurrence() {
        let filled = fill("{a} and {b}, then {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(filled, "x and y, then x");
    }

    #[test]
    fn test_fill_does_not_rescan_inserted_values() {
        let filled = fill(
            "Title: {job_title}\nDescription: {job_description}",
            &[("job_title", "Engineer {job_description}"), ("job_description", "Payments")],
        );
        assert_eq!(filled, "Title: Engineer {job_description}\nDescription: Payments");
    }

    #[test]
    fn test_fill_keeps_unknown_braces() {
        assert_eq!(fill(r#"{"k": {v}} {"#, &[("v", "1")]), r#"{"k": 1} {"#);
    }
}
