//! Gram Recipe Compiler
//!
//! This crate turns a parsed recipe document tree into a fully resolved
//! model: registry, shopping list, cook schedule and diagnostics.
//!
//! # Pipeline Overview
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐
//! │ Document │────▶│ Sections │────▶│ Shopping │────▶│  Output  │
//! │   Tree   │     │(Resolve) │     │ (Merge)  │     │(Sanitize)│
//! └──────────┘     └──────────┘     └──────────┘     └──────────┘
//!                       │                 │
//!                       ▼                 ▼
//!                 ┌──────────┐      ┌──────────┐
//!                 │   Mass   │      │  Cycles  │
//!                 │Normalizer│      │ Detector │
//!                 └──────────┘      └──────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use gram_compiler::{Compiler, CompileOptions};
//!
//! let compiler = Compiler::new(CompileOptions::default());
//! let compilation = compiler.compile_file("recipes/tarte.json")?;
//! println!("{}", compilation.to_json(true)?);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod compiler;
pub mod error;
pub mod graph;
pub mod ingredients;
pub mod mass;
pub mod metrics;
pub mod model;
pub mod output;
mod resolve;
pub mod scope;
pub mod sections;
pub mod shopping;
pub mod units;

pub use compiler::{CompileOptions, Compiler};
pub use error::{Error, Result};
pub use ingredients::{BuiltinIngredients, IngredientSource, IngredientTable};
pub use model::{Compilation, Warning, WarningCode};
pub use shopping::ShoppingItem;

/// Compile a document tree with the built-in ingredient table and no
/// project overrides
pub fn compile(recipe: &gram_core::Recipe) -> Result<Compilation> {
    Compiler::default().compile(recipe)
}
