pub mod onboarding;
pub mod optimization;
pub mod resume;
pub mod user;
