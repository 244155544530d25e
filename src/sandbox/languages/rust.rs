//! Rust language profile

use super::RuntimeProfile;
use crate::constants::{container_images, languages};

/// Get profile for Rust
pub fn profile() -> RuntimeProfile {
    super::profile(
        languages::RUST,
        "Rust 1.85",
        container_images::RUST,
        "main.rs",
        Some("rustc -O --edition 2021 -o main {source}"),
        "{workdir}/main",
    )
}
