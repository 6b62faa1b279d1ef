//! # Docpile
//!
//! Backend for a document reading and sense-making frontend. One HTTP
//! service dispatches model tasks: chat-style document analysis (analyze,
//! summarize, extract, classify, question generation, and friends) and
//! embedding-based relatedness (corpus search and sentence comparison),
//! all against an OpenAI-compatible model API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────┐
//! │ Frontend │──▶│ HTTP server │──▶│  Dispatcher   │
//! │ (browser)│   │  (axum)    │   │ task routing  │
//! └──────────┘   └────────────┘   └──────┬───────┘
//!                                        │
//!                     ┌──────────────────┼──────────────────┐
//!                     ▼                  ▼                  ▼
//!               ┌──────────┐      ┌───────────┐      ┌──────────┐
//!               │ Prompts  │      │  Ranker   │      │  Client  │
//!               │ chat fmt │      │ cosine/NN │      │ OpenAI   │
//!               └──────────┘      └───────────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docpile --config ./config/docpile.toml check    # validate config + corpora
//! docpile --config ./config/docpile.toml serve    # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and wire shapes |
//! | [`tasks`] | Task identifiers and classification |
//! | [`prompts`] | Prompt template registry |
//! | [`params`] | Endpoint parameter defaults and overrides |
//! | [`client`] | Remote model client |
//! | [`corpus`] | Precomputed embedding corpora |
//! | [`segment`] | Sentence segmentation |
//! | [`ranker`] | Cosine ranking and sentence linking |
//! | [`rouge`] | Summary overlap scoring |
//! | [`dispatch`] | Task dispatch and result normalization |
//! | [`library`] | Plain-text document library |
//! | [`usage`] | Token-usage accounting |
//! | [`server`] | HTTP server |

pub mod client;
pub mod config;
pub mod corpus;
pub mod dispatch;
pub mod error;
pub mod library;
pub mod models;
pub mod params;
pub mod prompts;
pub mod ranker;
pub mod rouge;
pub mod segment;
pub mod server;
pub mod tasks;
pub mod usage;
