//! Gram Core Library
//!
//! This crate provides the shared foundation for Gram:
//! - The recipe document tree produced by the parser
//! - Canonical identities (slugs) for ingredients and cookware
//! - Metadata-driven overrides and project configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Parser    │────▶│  Document   │────▶│  Compiler   │
//! │ (external)  │     │    Tree     │     │ (gram-comp) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use gram_core::{Overrides, Recipe};
//!
//! let recipe = Recipe::load("./tarte.json")?;
//! let overrides = Overrides::from_meta(&recipe.meta);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod error;
pub mod ident;

pub use config::{Overrides, ProjectConfig};
pub use document::Recipe;
pub use error::{Error, Result};
pub use ident::slugify;
