//! # Polity Linker
//!
//! Link a constitutional concept across the chapters of a textbook, synthesize
//! a study note from the matching chapters with a hosted generative-text
//! model, and export that note as a PDF.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────────┐   ┌──────────────┐
//! │  Corpus  │──▶│ Concept      │──▶│ Note generator │──▶│ Document     │
//! │  (text)  │   │ search       │   │ (Gemini)       │   │ renderer/PDF │
//! └──────────┘   └──────────────┘   └────────────────┘   └──────────────┘
//!                        │                  │                    │
//!                        └──────────┬───────┴────────────────────┘
//!                              ┌────┴─────┐
//!                              │ CLI/HTTP │
//!                              └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! polity search "Money Bill"
//! polity notes "Money Bill" --pdf money_bill.pdf
//! polity render notes.md --title "Money Bill"
//! polity serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Search result type |
//! | [`error`] | Typed errors per component |
//! | [`corpus`] | Bundled vs. uploaded corpus |
//! | [`chapter`] | Chapter splitting and titles |
//! | [`search`] | Literal, case-insensitive concept search |
//! | [`notes`] | Note generator abstraction |
//! | [`notes_cmd`] | The `polity notes` command |
//! | [`classify`] | Line classifier for note text |
//! | [`render`] | Page layout and PDF output |
//! | [`export`] | Writing PDFs to disk |
//! | [`progress`] | Progress reporting on stderr |
//! | [`server`] | HTTP API |

pub mod chapter;
pub mod classify;
pub mod config;
pub mod corpus;
pub mod error;
pub mod export;
pub mod models;
pub mod notes;
pub mod notes_cmd;
pub mod progress;
pub mod render;
pub mod search;
pub mod server;
