pub mod flipper;
pub mod locator;
pub mod types;

pub mod prelude {
    pub use super::flipper::{FlipSummary, apply};
    pub use super::locator::{LocatorConfig, QfxLocator};
    pub use super::types::{BalanceField, Sign, SignedAmount};
}
