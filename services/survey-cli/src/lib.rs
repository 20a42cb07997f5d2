//! Line-survey command-line tool.
//!
//! Summarises, queries and grids airborne survey line data held in NetCDF
//! files.

pub mod commands;
pub mod config;
pub mod output;
