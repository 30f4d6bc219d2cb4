//! Schema model and synthesis
//!
//! The JSON Schema fragment type, annotation parsing, keyword validation,
//! `$ref` resolution and the synthesizer that ties them together.

pub mod annotation;
pub mod model;
pub mod reference;
pub mod synthesize;
pub mod validation;

pub use model::{AdditionalProperties, DRAFT_07, OneOrMany, Required, Schema, SchemaType};
pub use synthesize::Synthesizer;
pub use validation::{ValidationError, validate};
