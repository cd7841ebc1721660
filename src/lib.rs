//! Export the compounds of every KEGG pathway of an organism as a TSV table.
//!
//! The pipeline lists an organism's pathways, downloads each pathway's KGML
//! on a bounded pool of worker threads, extracts `C#####` compound codes from
//! the compound entries and writes a column-per-pathway table.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fanout;
pub mod kegg;
pub mod kgml;
pub mod output;
pub mod table;
