//! Translates ESSL source to HLSL and reports the shader interface

use glt_transform_eir_to_hst::TranspiledShader;
use glt_transform_est_to_eir::TyperError;
use glt_transform_etk_to_est::ParseError;
use glt_transform_hst_printer::HlslSource;
use glt_transform_lexer::LexError;
use glt_transform_preprocess::PreprocessError;
use std::error;
use std::fmt;
use std::panic;
use std::thread;
use tracing::{debug, info, info_span, warn};

pub use glt_shared::{BindingKind, BindingType, Diagnostic, ErrorCode, FeatureLevel, ShaderBinding, ShaderStage,
                     TranslateOptions};

#[derive(PartialEq, Debug, Clone)]
pub enum CompileError {
    ShaderTooLong(usize, usize),
    PreprocessError(PreprocessError),
    LexError(LexError),
    ParseError(ParseError),
    TyperErrors(Vec<TyperError>),
}

impl CompileError {
    /// The errors as reported to hosts, in the order they were found
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            CompileError::ShaderTooLong(_, _) => {
                vec![Diagnostic::new(ErrorCode::ShaderTooLong, 1, self.to_string())]
            }
            CompileError::PreprocessError(ref err) => {
                vec![Diagnostic::new(err.get_code(), err.1.line(), err.to_string())]
            }
            CompileError::LexError(ref err) => {
                vec![Diagnostic::new(err.get_code(), err.get_location().line(), err.to_string())]
            }
            CompileError::ParseError(ref err) => {
                vec![Diagnostic::new(err.get_code(), err.get_location().line(), err.to_string())]
            }
            CompileError::TyperErrors(errors) => {
                errors.into_iter()
                    .map(|err| Diagnostic::new(err.get_code(), err.get_location().line(), err.to_string()))
                    .collect()
            }
        }
    }
}

/// Result of one translation. The HLSL is only usable when no diagnostics
/// were reported.
#[derive(PartialEq, Debug, Clone)]
pub struct ConvertedShader {
    pub hlsl: String,
    pub bindings: Vec<ShaderBinding>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConvertedShader {
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn failed(diagnostics: Vec<Diagnostic>) -> ConvertedShader {
        ConvertedShader {
            hlsl: String::new(),
            bindings: vec![],
            diagnostics,
        }
    }
}

/// Stack for the recursive stages. Sized for the deepest nesting the
/// expression depth limit lets through in an unoptimized build.
pub const TRANSLATE_STACK_SIZE: usize = 64 * 1024 * 1024;

fn glsl_to_hlsl(source: &str,
                stage: ShaderStage,
                options: TranslateOptions,
                feature_level: FeatureLevel)
                -> Result<(HlslSource, TranspiledShader), CompileError> {
    let feature_level = feature_level.effective(options);
    let limits = glt_shared::Limits::for_feature_level(feature_level);
    if source.len() > limits.max_source_length {
        return Err(CompileError::ShaderTooLong(source.len(), limits.max_source_length));
    }

    let extensions = glt_shared::ExtensionState::new(stage, options);
    let preprocessed = glt_transform_preprocess::preprocess(source, stage, extensions)?;
    debug!("preprocessed");

    let tokens = glt_transform_lexer::lex(&preprocessed)?;
    debug!(tokens = tokens.stream.len(), "lexed");

    let ast = glt_transform_etk_to_est::parse(&tokens.stream, limits.max_expression_depth)?;
    debug!(root_definitions = ast.root_definitions.len(), "parsed");

    let ir = glt_transform_est_to_eir::typeparse(&ast,
                                                 stage,
                                                 preprocessed.extensions(),
                                                 &limits,
                                                 feature_level)
        .map_err(CompileError::TyperErrors)?;
    debug!("verified");

    let shader = match glt_transform_eir_to_hst::transpile(&ir, options) {
        Ok(shader) => shader,
        Err(err) => panic!("failed to emit a verified shader: {}", err),
    };
    let hlsl = HlslSource::from_hst(&shader.module);
    debug!(bindings = shader.bindings.len(), "emitted");
    Ok((hlsl, shader))
}

/// Translate one ESSL shader to HLSL
pub fn translate(source: &str,
                 stage: ShaderStage,
                 options: TranslateOptions,
                 feature_level: FeatureLevel)
                 -> ConvertedShader {
    let span = info_span!("translate", ?stage, length = source.len());
    let _enter = span.enter();
    let result = thread::scope(|scope| {
        let worker = thread::Builder::new()
            .stack_size(TRANSLATE_STACK_SIZE)
            .spawn_scoped(scope, || {
                let _enter = span.enter();
                glsl_to_hlsl(source, stage, options, feature_level)
            });
        match worker {
            Ok(handle) => handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)),
            Err(err) => {
                warn!(%err, "failed to start translation thread");
                glsl_to_hlsl(source, stage, options, feature_level)
            }
        }
    });
    match result {
        Ok((hlsl, shader)) => {
            ConvertedShader {
                hlsl: hlsl.into_string(),
                bindings: shader.bindings,
                diagnostics: vec![],
            }
        }
        Err(err) => {
            let diagnostics = err.into_diagnostics();
            info!(count = diagnostics.len(), "translation failed");
            ConvertedShader::failed(diagnostics)
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CompileError::ShaderTooLong(length, limit) => {
                write!(f, "shader is {} bytes, the limit is {}", length, limit)
            }
            CompileError::PreprocessError(ref err) => write!(f, "{}", err),
            CompileError::LexError(ref err) => write!(f, "{}", err),
            CompileError::ParseError(ref err) => write!(f, "{}", err),
            CompileError::TyperErrors(ref errors) => {
                match errors.first() {
                    Some(err) => write!(f, "{}", err),
                    None => write!(f, "verification failed"),
                }
            }
        }
    }
}

impl error::Error for CompileError {}

impl From<PreprocessError> for CompileError {
    fn from(err: PreprocessError) -> CompileError {
        CompileError::PreprocessError(err)
    }
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> CompileError {
        CompileError::LexError(err)
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> CompileError {
        CompileError::ParseError(err)
    }
}

#[test]
fn test_translate_vertex_body() {
    let shader = translate("void foo() { int bar; }",
                           ShaderStage::Vertex,
                           TranslateOptions::DISABLE_WRITE_INPUTS,
                           FeatureLevel::Level10_0);
    assert!(shader.is_success());
    assert_eq!(shader.hlsl, "void fn_0_0()\n{\nint var_1_1=0;\n}\n");
}

#[test]
fn test_shader_too_long() {
    let source = " ".repeat(256 * 1024 + 1);
    let shader = translate(&source, ShaderStage::Vertex, TranslateOptions::empty(), FeatureLevel::Level10_0);
    assert!(!shader.is_success());
    assert_eq!(shader.diagnostics[0].code, ErrorCode::ShaderTooLong);
    assert_eq!(shader.diagnostics[0].line, 1);
    assert!(shader.hlsl.is_empty());
}

#[test]
fn test_errors_become_diagnostics() {
    let shader = translate("int j[0];", ShaderStage::Vertex, TranslateOptions::empty(), FeatureLevel::Level10_0);
    assert_eq!(shader.diagnostics[0].code, ErrorCode::ArraySizeLEQZero);
    assert_eq!(shader.diagnostics[0].line, 1);
    assert!(shader.bindings.is_empty());

    let shader = translate("void main() {\n  float $b;\n}", ShaderStage::Vertex, TranslateOptions::empty(), FeatureLevel::Level10_0);
    assert_eq!(shader.diagnostics[0].code, ErrorCode::InvalidCharacter);
    assert_eq!(shader.diagnostics[0].line, 2);
}
