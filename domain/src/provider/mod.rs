//! Provider boundary types: generation results and the closed error taxonomy.

pub mod error;
pub mod response;
