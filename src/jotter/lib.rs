//! # Jotter Architecture
//!
//! Jotter is a **rich-text note editor core**. The interesting part is not
//! storing notes but keeping one live editor document and the note store
//! consistent while the user jumps between notes, pastes images and inserts
//! links. Everything here is UI-agnostic; the bundled binary is one host.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host (main.rs, shell.rs in the binary)                     │
//! │  - Parses arguments, renders lists, reads the terminal      │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                              │
//!                 ▼                              ▼
//! ┌───────────────────────────────┐  ┌──────────────────────────┐
//! │  Host Facade (api.rs)         │  │  Commands (commands/)    │
//! │  - Note list, shortcuts       │  │  - One-shot store ops    │
//! │  - Flush-before-leave order   │  │    for the CLI           │
//! └───────────────────────────────┘  └──────────────────────────┘
//!                 │                              │
//!                 ▼                              │
//! ┌───────────────────────────────┐              │
//! │  Editing Session (session.rs) │              │
//! │  - Owns the engine            │              │
//! │  - Debounced autosave         │              │
//! │  - Paste and link pipelines   │              │
//! └───────────────────────────────┘              │
//!                 │                              │
//!                 ▼                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - ContentStore trait                                       │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: One Live Document
//!
//! At most one engine exists per session and it always belongs to the active
//! note. Content is only ever written under the id it was loaded from; the
//! session guarantees this across switches, late timers and late pastes.
//!
//! ## Async
//!
//! The session runs on tokio. Store calls are synchronous and short; only the
//! autosave timer, the settle delay and image encoding are asynchronous.
//!
//! ## Testing Strategy
//!
//! 1. **Session** (`session.rs`): lifecycle properties against
//!    `InMemoryStore`'s operation journal, on tokio's paused clock.
//! 2. **Commands** (`commands/*.rs`): plain unit tests.
//! 3. **Store** (`store/fs.rs`): temp directories.
//! 4. **Binary** (`tests/`): `assert_cmd` against a temp `JOTTER_HOME`.
//!
//! ## Module Overview
//!
//! - [`api`]: Host facade, note list and shortcuts
//! - [`session`]: Editing session lifecycle and autosave
//! - [`engine`]: Rich-text engine seam and the bundled markup engine
//! - [`clipboard`]: Clipboard image pipeline
//! - [`link`]: Link insertion protocol
//! - [`keymap`]: Key chords and shortcut bindings
//! - [`commands`]: Store operations for the CLI
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Core data types (`NoteId`, `NoteRef`, `Document`)
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod api;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod keymap;
pub mod link;
pub mod model;
pub mod session;
pub mod store;
