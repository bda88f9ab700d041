//! Model catalog: provider and model definitions, validation, and the
//! embedded fallback set.

pub mod defaults;
pub mod entities;
pub mod validation;
