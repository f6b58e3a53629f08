//! Builds an index of package name -> feedstock repository by reading the
//! `recipe/meta.yaml` of every feedstock in a GitHub organization, and
//! fuzzy-matches package names against it.

pub mod commands;
pub mod github;
pub mod http;
pub mod index;
pub mod matcher;
pub mod recipe;
pub mod runtime;
pub mod template;
