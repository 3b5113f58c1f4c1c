//! Flip the sign of the credit card balance in OFX/QFX exports.
//!
//! Card issuers report the ledger balance as a positive number, while apps
//! such as Quicken expect a debt to be negative. Only the sign character of
//! `<LEDGERBAL><BALAMT>` is touched; every other byte of the file is kept.
//!
//! ```rust,ignore
//! use credit_balance_flipper::{BalanceFlipper, Mode};
//!
//! let report = BalanceFlipper::builder()
//!     .mode(Mode::Flip)
//!     .build()
//!     .process_files(&["statement.qfx"]);
//! ```

mod builder;
mod types;

pub mod errors;
pub mod parsers;

pub use builder::{BYTES_PER_MEBIBYTE, BalanceFlipper, DEFAULT_MAX_FILE_SIZE, FlipperBuilder};
pub use parsers::prelude::*;
pub use types::{BatchReport, FailureKind, Mode, Outcome, ProcessingResult};
