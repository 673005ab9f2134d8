// Rewrites driven by a stored optimization analysis: a structured regeneration
// (complete resume JSON) and a plain-text rewrite stored as a blob.

pub mod handlers;
pub mod lock;
pub mod prompts;
pub mod regenerate;
pub mod rewrite;
