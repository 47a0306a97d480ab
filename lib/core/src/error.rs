//! Error handling foundation for dial-settings.
//!
//! Only the `Result` alias lives here. Each crate defines its own error
//! enums in its `error` module and wraps them in a rootcause `Report`
//! where they cross an I/O boundary.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
