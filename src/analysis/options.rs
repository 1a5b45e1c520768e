//! Analysis options

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Knobs of a signature-analysis run
///
/// Every field has a default, so a JSON override only needs the keys it
/// changes:
///
/// ```rust
/// use fnsig::AnalysisOptions;
///
/// let options = AnalysisOptions::from_json_str(r#"{ "block_summaries": true }"#).unwrap();
/// assert!(options.block_summaries);
/// assert_eq!(options.max_type_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Opaque record names whose fields are never sized
    pub struct_denylist: Vec<String>,
    /// Callee name prefixes that produce no record (debug/lifetime markers)
    pub ignored_call_prefixes: Vec<String>,
    /// Callee name prefixes reported as a blank write (memory-set intrinsics)
    pub memset_prefixes: Vec<String>,
    /// Deepest type nesting the size resolver follows
    pub max_type_depth: usize,
    /// Deepest loop nesting that still opens a loop block
    pub max_loop_depth: u32,
    /// Emit a `BB[...]` summary before each block's records
    pub block_summaries: bool,
    /// Indentation unit of the text report
    pub indent: String,
    /// Worker threads for parallel module analysis, 0 for one per CPU
    pub threads: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            struct_denylist: vec!["struct._IO_marker".to_string(), "struct._IO_FILE".to_string()],
            ignored_call_prefixes: vec!["llvm.dbg.".to_string(), "llvm.lifetime.".to_string()],
            memset_prefixes: vec!["llvm.memset".to_string()],
            max_type_depth: 64,
            max_loop_depth: 128,
            block_summaries: false,
            indent: "  ".to_string(),
            threads: 0,
        }
    }
}

impl AnalysisOptions {
    /// Parse options from JSON; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: AnalysisOptions =
            serde_json::from_str(json).map_err(|e| Error::config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject settings that would disable the analysis outright
    pub fn validate(&self) -> Result<()> {
        if self.max_type_depth == 0 {
            return Err(Error::config("max_type_depth must be at least 1"));
        }
        if self.max_loop_depth == 0 {
            return Err(Error::config("max_loop_depth must be at least 1"));
        }
        Ok(())
    }

    /// True if `name` is an opaque record that contributes no size
    pub fn is_denylisted(&self, name: &str) -> bool {
        self.struct_denylist.iter().any(|n| n == name)
    }

    /// True for debug/lifetime intrinsics
    pub fn is_ignored_call(&self, callee: &str) -> bool {
        self.ignored_call_prefixes
            .iter()
            .any(|p| callee.starts_with(p.as_str()))
    }

    /// True for memory-set intrinsics
    pub fn is_memset(&self, callee: &str) -> bool {
        self.memset_prefixes
            .iter()
            .any(|p| callee.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AnalysisOptions::default();
        assert!(options.is_denylisted("struct._IO_FILE"));
        assert!(!options.is_denylisted("struct.FILE"));
        assert!(options.is_ignored_call("llvm.dbg.value"));
        assert!(options.is_ignored_call("llvm.lifetime.start.p0i8"));
        assert!(options.is_memset("llvm.memset.p0i8.i64"));
        assert!(!options.is_memset("memcpy"));
    }

    #[test]
    fn test_json_overrides() {
        let options = AnalysisOptions::from_json_str(
            r#"{ "struct_denylist": ["struct.opaque"], "indent": "\t" }"#,
        )
        .unwrap();
        assert!(options.is_denylisted("struct.opaque"));
        assert!(!options.is_denylisted("struct._IO_FILE"));
        assert_eq!(options.indent, "\t");
        assert_eq!(options.max_loop_depth, 128);
    }

    #[test]
    fn test_invalid_options() {
        assert!(matches!(
            AnalysisOptions::from_json_str(r#"{ "max_type_depth": 0 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AnalysisOptions::from_json_str("not json"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AnalysisOptions::from_json_file("/nonexistent/options.json"),
            Err(Error::Io(_))
        ));
    }
}
