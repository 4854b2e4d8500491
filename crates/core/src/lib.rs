//! Form and submission logic for collexo-rs.
//!
//! Forms carry a dynamic [`FormSchema`]; submissions are checked against the
//! form's acceptance window, filtered for duplicates and bots, validated field
//! by field and then stored.

pub mod services;

pub use services::*;
