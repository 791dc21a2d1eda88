//! Pipeline stages for comparing two policy documents.
//!
//! Each submodule implements exactly one step, so every stage can be tested
//! on its own with plain strings or mock collaborators.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ request ──▶ llm ──▶ recover
//! (bytes)   (backends)  (prompt)   (model)  (csv block)
//! ```
//!
//! 1. [`input`]: read a local file or download a URL into memory
//! 2. [`extract`]: best-effort text through the [`backend`] chain; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`request`]: truncate both texts and fill in the prompt template
//! 4. [`llm`]: the one remote call, bounded by a timeout
//! 5. [`recover`]: find the fenced CSV block and parse it

pub mod backend;
pub mod extract;
pub mod input;
pub mod llm;
pub mod recover;
pub mod request;
