// staywake-mobile - native bindings artifact for the host platforms
// This crate exports the staywake core API via UniFFI

pub use staywake_core::*;
