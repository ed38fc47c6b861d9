//! Blog post generator service: gathers source text from the web, drafts a
//! markdown post with an LLM and fills its image slots.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod feedback;
pub mod generate;
pub mod models;
pub mod pipeline;
pub mod placeholder;
pub mod search;
pub mod terms;
