//! ESSL 1.00 to HLSL shader translation
//!
//! `translate` runs the whole pipeline on one shader and returns a
//! `ConvertedShader` holding the HLSL, the resolved shader interface and any
//! diagnostics.

pub use glt_sequence_glsl_to_hlsl::translate;
pub use glt_sequence_glsl_to_hlsl::CompileError;
pub use glt_sequence_glsl_to_hlsl::ConvertedShader;

pub use glt_shared::{BindingKind, BindingType, Diagnostic, ErrorCode, FeatureLevel, ShaderBinding, ShaderStage,
                     TranslateOptions};

#[cfg(test)]
pub mod tests;
