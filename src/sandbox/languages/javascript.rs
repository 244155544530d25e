//! JavaScript language profile

use super::RuntimeProfile;
use crate::constants::{container_images, languages};

/// Get profile for JavaScript (Node.js)
pub fn profile() -> RuntimeProfile {
    super::profile(
        languages::JAVASCRIPT,
        "JavaScript (Node.js)",
        container_images::JAVASCRIPT,
        "script.js",
        None,
        "node {workdir}/{entry}",
    )
}
