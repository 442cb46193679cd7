//! Library half of the `htmlpdf` binary: argument surface, config file
//! handling and logging setup.

pub mod cli;
pub mod config;
pub mod logging;
