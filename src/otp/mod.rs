pub mod engine;
pub mod record;

pub use engine::{CodeGenerationError, CodeGenerator, OtpParams, TotpEngine};
pub use record::{FieldParseError, Record, RecordDraft};
