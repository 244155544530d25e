//! C++ language profile

use super::RuntimeProfile;
use crate::constants::{container_images, languages};

/// Get profile for C++
pub fn profile() -> RuntimeProfile {
    super::profile(
        languages::CPP,
        "C++ (G++ 14, C++20)",
        container_images::CPP,
        "main.cpp",
        Some("g++ -O2 -std=c++20 -o main {source}"),
        "{workdir}/main",
    )
}
