//! Identity verification against the upstream identity provider

pub mod verifier;
