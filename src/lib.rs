#![doc(test(attr(deny(warnings))))]

//! Cashflow Engine resolves recurring incomes, expenses, and investments into
//! month-by-month figures and multi-year balance projections.
//!
//! Stored records enter through [`storage`], are resolved per month by [`schedule`]
//! (with CPF handled by [`cpf`]), and are rolled into balance frames by [`projection`].

pub mod cli;
pub mod config;
pub mod core;
pub mod cpf;
pub mod domain;
pub mod errors;
pub mod projection;
pub mod schedule;
pub mod storage;
pub mod utils;

pub use errors::{EngineError, EngineResult};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Cashflow engine tracing initialized.");
    });
}
