//! Remote text generation: chat-completions client, prompt construction, retry.

pub mod client;
pub mod prompt;
pub mod retry;

pub use client::{ChatCompletionsClient, TextGenerator, clean_message, parse_chat_response};
pub use prompt::{build_commit_prompt, sanitize_diff};
pub use retry::retry_with_backoff;

#[cfg(test)]
pub use client::MockTextGenerator;
