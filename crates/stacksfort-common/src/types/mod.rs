//! Core domain types for StacksFort

pub mod proposal;
pub mod signature_record;
pub mod signer_set;
pub mod status;
