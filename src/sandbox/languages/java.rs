//! Java language profile

use super::RuntimeProfile;
use crate::constants::{container_images, languages};

/// Get profile for Java
pub fn profile() -> RuntimeProfile {
    super::profile(
        languages::JAVA,
        "Java (OpenJDK 17)",
        container_images::JAVA,
        "Main.java",
        Some("javac {source}"),
        "java -cp {workdir} Main",
    )
}
