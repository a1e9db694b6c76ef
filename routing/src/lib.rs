pub mod errors;
pub mod journey;
pub mod raptor;
