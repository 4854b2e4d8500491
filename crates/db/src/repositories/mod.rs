//! Data access repositories.

mod form;
mod form_response;

pub use form::FormRepository;
pub use form_response::FormResponseRepository;
