//! Python language profile

use super::RuntimeProfile;
use crate::constants::{container_images, languages};

/// Get profile for Python
pub fn profile() -> RuntimeProfile {
    super::profile(
        languages::PYTHON,
        "Python 3.9",
        container_images::PYTHON,
        "script.py",
        None,
        "python {workdir}/{entry}",
    )
}
