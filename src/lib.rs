//! Builds a JSON manifest that pairs UniProt accessions from a CSV file with
//! their Boltz-2 structure and FASTA sequence files in a dataset tree.

pub mod app;
pub mod config;
pub mod dialect;
pub mod domain;
pub mod error;
pub mod fs;
pub mod header;
pub mod manifest;
pub mod output;
pub mod records;
pub mod resolver;
