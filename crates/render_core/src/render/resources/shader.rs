//! Shader stage descriptions and preprocessing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage a shader runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
    /// Geometry stage
    Geometry,
    /// Tessellation control stage
    TessControl,
    /// Tessellation evaluation stage
    TessEvaluation,
    /// Compute stage
    Compute,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Geometry => "geometry",
            Self::TessControl => "tessellation control",
            Self::TessEvaluation => "tessellation evaluation",
            Self::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// Shader source text for one stage, plus preprocessor definitions
///
/// Definitions are injected as `#define NAME VALUE` lines directly after
/// the `#version` directive (or at the top when there is none), so the
/// same source can be compiled into several configurations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderSource {
    /// Stage the source is compiled for
    pub stage: ShaderStage,
    /// Source text as written by the client
    pub source: String,
    /// Preprocessor definitions, in insertion order
    pub definitions: Vec<(String, String)>,
}

impl ShaderSource {
    /// Create a shader source without definitions
    pub fn new(stage: ShaderStage, source: impl Into<String>) -> Self {
        Self { stage, source: source.into(), definitions: Vec::new() }
    }

    /// Add a preprocessor definition
    pub fn with_definition(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.definitions.push((name.into(), value.into()));
        self
    }

    /// Final text handed to the backend compiler
    pub fn preprocessed(&self) -> String {
        if self.definitions.is_empty() {
            return self.source.clone();
        }

        let defines: String = self
            .definitions
            .iter()
            .map(|(name, value)| {
                if value.is_empty() {
                    format!("#define {name}\n")
                } else {
                    format!("#define {name} {value}\n")
                }
            })
            .collect();

        // Find the #version line, if any. It has to stay first.
        let mut offset = 0;
        for line in self.source.split_inclusive('\n') {
            let trimmed = line.trim_start();
            if trimmed.starts_with("#version") {
                let end = offset + line.len();
                let mut text = String::with_capacity(self.source.len() + defines.len() + 1);
                text.push_str(&self.source[..end]);
                if !line.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&defines);
                text.push_str(&self.source[end..]);
                return text;
            }
            if !trimmed.trim().is_empty() && !trimmed.starts_with("//") {
                break;
            }
            offset += line.len();
        }

        format!("{defines}{}", self.source)
    }
}
