//! # api-dist
//!
//! Generates an API-only distribution of a compiled Java library: every
//! concrete class keeps its declared shape, while each method and
//! constructor body is replaced with
//! `throw new UnsupportedOperationException(...)`.
//!
//! ## Architecture
//!
//! - **classfile**: Class file model, parser and writer with an interning constant pool
//! - **scan**: Lazy discovery of `.class` files below the class root
//! - **classpath**: Ordered class resolution over directories and jars
//! - **eligibility**: Filters out interfaces, abstract classes and module descriptors
//! - **rewrite**: Method body replacement
//! - **emit**: Writes rewritten classes to the output tree
//! - **driver**: Batch orchestration producing a [`report::BatchReport`]
//! - **package**: Optional jar packaging of the output tree
//! - **shape**: Body-free view of a class used for inspection and comparison

pub mod classfile;
pub mod classpath;
pub mod cli;
pub mod config;
pub mod driver;
pub mod eligibility;
pub mod emit;
pub mod error;
pub mod logging;
pub mod package;
pub mod report;
pub mod rewrite;
pub mod scan;
pub mod shape;
