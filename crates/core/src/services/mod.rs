//! Business logic services.

#![allow(missing_docs)]

pub mod acceptance;
pub mod filter;
pub mod form;
pub mod form_schema;
pub mod pagination;
pub mod processor;
pub mod submission;

pub use acceptance::{FormState, NotAcceptingReason};
pub use filter::{RejectReason, SubmissionFilter, Verdict};
pub use form::{CreateFormInput, FormService, UpdateFormInput};
pub use form_schema::{FieldDefinition, FieldKind, FormSchema};
pub use pagination::{Page, Pagination};
pub use processor::{
    FieldValue, ProcessedSubmission, RawSubmission, UploadedFile, ValidationMode, process,
};
pub use submission::{ClientInfo, SubmissionOutcome, SubmissionService, SubmitterContact};
