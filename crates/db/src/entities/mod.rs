//! Database entities.

pub mod form_response;
pub mod society_form;

pub use form_response::Entity as FormResponse;
pub use society_form::Entity as SocietyForm;
