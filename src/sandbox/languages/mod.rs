//! Runtime profile registry
//!
//! Maps a language identifier to the container image and command templates
//! used to compile and run a single-file submission. Built once at startup
//! and shared read-only afterwards.

pub mod cpp;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::{
    constants::{self, CONTAINER_WORKDIR},
    error::{AppError, AppResult},
};

/// How one language is compiled and run inside the sandbox.
///
/// Templates are split on whitespace into an argv after substitution.
/// Placeholders: `{source}` (entry file name, compile only), `{workdir}`
/// (mount point inside the container) and `{entry}` (entry file name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeProfile {
    language: String,
    display_name: String,
    image: String,
    entry_file: String,
    compile_template: Option<String>,
    run_template: String,
}

impl RuntimeProfile {
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Base image the submission runs in
    pub fn image(&self) -> &str {
        &self.image
    }

    /// File name the source is staged under
    pub fn entry_file(&self) -> &str {
        &self.entry_file
    }

    /// Check if this runtime requires compilation
    pub fn requires_compilation(&self) -> bool {
        self.compile_template.is_some()
    }

    /// Build the compile argv, if the language has a compile step
    pub fn compile_command(&self) -> Option<Vec<String>> {
        self.compile_template.as_deref().map(|t| self.expand(t))
    }

    /// Build the run argv
    pub fn run_command(&self) -> Vec<String> {
        self.expand(&self.run_template)
    }

    fn expand(&self, template: &str) -> Vec<String> {
        template
            .split_whitespace()
            .map(|part| {
                part.replace("{source}", &self.entry_file)
                    .replace("{entry}", &self.entry_file)
                    .replace("{workdir}", CONTAINER_WORKDIR)
            })
            .collect()
    }

    fn with_image(mut self, image: &str) -> Self {
        self.image = image.to_string();
        self
    }
}

/// Read-only language registry
#[derive(Debug, Clone)]
pub struct RuntimeRegistry {
    profiles: BTreeMap<String, RuntimeProfile>,
}

impl RuntimeRegistry {
    /// Registry with the built-in images
    pub fn with_defaults() -> Self {
        Self::with_image_overrides(&HashMap::new())
    }

    /// Registry with images replaced per language id
    pub fn with_image_overrides(overrides: &HashMap<String, String>) -> Self {
        let profiles = [
            java::profile(),
            python::profile(),
            javascript::profile(),
            cpp::profile(),
            rust::profile(),
        ]
        .into_iter()
        .map(|profile| {
            let profile = match overrides.get(profile.language()) {
                Some(image) => profile.with_image(image),
                None => profile,
            };
            (profile.language().to_string(), profile)
        })
        .collect();

        Self { profiles }
    }

    /// Resolve a language id to its profile
    pub fn resolve(&self, language: &str) -> AppResult<&RuntimeProfile> {
        self.profiles
            .get(language)
            .ok_or_else(|| AppError::UnsupportedLanguage(language.to_string()))
    }

    /// Supported language ids, sorted
    pub fn languages(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &RuntimeProfile> {
        self.profiles.values()
    }
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Shorthand used by the per-language modules
fn profile(
    language: &str,
    display_name: &str,
    image: &str,
    entry_file: &str,
    compile_template: Option<&str>,
    run_template: &str,
) -> RuntimeProfile {
    debug_assert!(constants::languages::ALL.contains(&language));
    RuntimeProfile {
        language: language.to_string(),
        display_name: display_name.to_string(),
        image: image.to_string(),
        entry_file: entry_file.to_string(),
        compile_template: compile_template.map(str::to_string),
        run_template: run_template.to_string(),
    }
}
