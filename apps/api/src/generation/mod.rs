// Resume generation from a free-form prompt.
// All completion calls go through llm_client; persistence goes through the gateway.

pub mod generator;
pub mod handlers;
pub mod prompts;
