//! Core library for the aideon-consolidator command line application.
//!
//! The library merges the rows of many spreadsheet files into one workbook.
//! Decoding and encoding live under [`aideon::consolidator::io`], the data
//! representations inside [`aideon::consolidator::model`], the per-row
//! transforms in [`aideon::consolidator::strategy`], the run loop in
//! [`aideon::consolidator::engine`], and the caller-owned queue and result
//! state in [`aideon::consolidator::session`].

pub mod aideon;

pub use aideon::consolidator::{
    ConsolidateError, Result, engine, error, io, model, session, strategy,
};
