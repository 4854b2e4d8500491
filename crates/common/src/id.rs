//! ID generation utilities.

use ulid::Ulid;

/// ID generator for forms, submissions and stored files.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new lower-case ULID.
    ///
    /// ULIDs sort by creation time, so submissions listed by ID come out in
    /// submission order.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Short random suffix for stored file names.
    #[must_use]
    pub fn generate_short(&self) -> String {
        let id = Ulid::new().to_string().to_lowercase();
        // The random component lives in the trailing 16 characters.
        id[id.len() - 8..].to_string()
    }
}
