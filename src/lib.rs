//! bffgen core library.
//!
//! This library models a build as a graph of named targets, resolves their
//! dependencies, propagates compile flags along the edges and emits a
//! FASTBuild `.bff` descriptor. Projects are assembled in code through
//! [`project::Project`] or loaded from a YAML manifest with [`manifest`].

pub mod ast;
pub mod bff_gen;
pub mod cli;
pub mod compiler;
pub mod flags;
pub mod graph;
pub mod manifest;
pub mod project;
pub mod runner;
pub mod target;
pub mod writer;
