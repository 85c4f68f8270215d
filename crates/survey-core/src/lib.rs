//! Survey domain model: questions, surveys, responses and feedback tickets,
//! plus the pure rules that operate on them (submission validation, answer
//! normalization, analytics and status lifecycles).

pub mod analytics;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod model;
pub mod normalize;
pub mod serialize;
pub mod validate;
