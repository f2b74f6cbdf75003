//! Include/exclude glob patterns for discovery.
//!
//! Patterns are matched against the path relative to the scan root, with `/`
//! separators:
//!
//! - `**` matches any number of directories (including none)
//! - `*` matches any characters within one path segment
//! - `{a,b}` matches either alternative

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};

/// Default include patterns: Rust sources.
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.rs"];

/// Default exclude patterns: build output, dependency trees, generated and
/// minified artefacts, and build scripts.
pub const DEFAULT_EXCLUDE: &[&str] = &[
    "**/target/**",
    "**/.git/**",
    "**/node_modules/**",
    "**/vendor/**",
    "**/build.rs",
    "**/benches/**",
    "**/*.min.*",
    "**/*.map",
];

/// Test sources, skipped regardless of the include list when
/// `skip_test_sources` is enabled.
pub const TEST_SOURCE_PATTERNS: &[&str] = &[
    "**/*.test.*",
    "**/*.spec.*",
    "**/*_test.rs",
    "**/*_tests.rs",
    "**/tests/**",
];

fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| (*p).to_string()).collect()
}

/// Uncompiled include and exclude lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPatterns {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for ScanPatterns {
    fn default() -> Self {
        Self {
            include: owned(DEFAULT_INCLUDE),
            exclude: owned(DEFAULT_EXCLUDE),
        }
    }
}

impl ScanPatterns {
    /// Builds a pattern set from explicit lists.
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    /// Replaces the exclude list.
    pub fn with_exclude<E>(mut self, exclude: E) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    /// Compiles the lists into matchers.
    pub fn compile(&self, skip_test_sources: bool) -> ScanResult<CompiledPatterns> {
        let test_sources = if skip_test_sources {
            Some(build_set(TEST_SOURCE_PATTERNS.iter().copied())?)
        } else {
            None
        };

        Ok(CompiledPatterns {
            include: build_set(self.include.iter().map(String::as_str))?,
            exclude: build_set(self.exclude.iter().map(String::as_str))?,
            test_sources,
        })
    }
}

/// Checks that a single pattern compiles.
pub fn validate_pattern(pattern: &str) -> ScanResult<()> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|_| ())
        .map_err(|e| ScanError::Pattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })
}

fn build_set<'a>(patterns: impl Iterator<Item = &'a str>) -> ScanResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| ScanError::Pattern {
                pattern: pattern.to_string(),
                reason: e.kind().to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ScanError::Pattern {
        pattern: e.glob().unwrap_or_default().to_string(),
        reason: e.kind().to_string(),
    })
}

/// Compiled matchers for one scan.
#[derive(Debug, Clone)]
pub struct CompiledPatterns {
    include: GlobSet,
    exclude: GlobSet,
    test_sources: Option<GlobSet>,
}

impl CompiledPatterns {
    /// Returns `true` if a root-relative path is a discovery candidate.
    pub fn is_candidate(&self, relative: &str) -> bool {
        self.include.is_match(relative)
            && !self.exclude.is_match(relative)
            && !self
                .test_sources
                .as_ref()
                .is_some_and(|tests| tests.is_match(relative))
    }
}
