//! OpenAI-compatible model backend for PageMind.
//!
//! Talks to any server exposing `GET /models` and `POST /chat/completions`
//! (Ollama, llama.cpp, vLLM, OpenAI itself).

mod api;
mod client;
mod instructions;
mod model;
mod session;

pub use model::OpenAiCompatModel;
