#![allow(non_camel_case_types)]

use glt::{translate, BindingKind, ConvertedShader, FeatureLevel, ShaderStage, TranslateOptions};
use libc::c_char;
use std::ffi::CStr;
use std::ffi::CString;
use std::mem;
use std::ptr;
use std::thread;

#[repr(C)]
pub struct glt_translate_input {
    pub source: *const c_char,
    /// 0 for a vertex shader, 1 for a fragment shader
    pub stage: u32,
    /// Bitmask of translate options
    pub options: u32,
    /// 0 to 4 for feature levels 9_1, 9_3, 10_0, 10_1 and 11_0
    pub feature_level: u32,
}

#[repr(C)]
pub struct glt_binding {
    /// 0 attribute, 1 varying, 2 uniform, 3 sampler
    pub kind: u32,
    pub name: *mut c_char,
    pub hlsl_name: *mut c_char,
    pub register: *mut c_char,
    pub binding_type: *mut c_char,
}

#[repr(C)]
pub struct glt_diagnostic {
    pub code: *mut c_char,
    pub line: u64,
    pub message: *mut c_char,
}

#[repr(C)]
pub struct glt_translate_output {
    pub success: bool,
    /// Set when the input could not be translated at all
    pub error: *mut c_char,
    pub hlsl: *mut c_char,
    pub binding_count: u32,
    pub bindings: *mut glt_binding,
    pub diagnostic_count: u32,
    pub diagnostics: *mut glt_diagnostic,
}

fn to_raw(string: String) -> *mut c_char {
    // Strings from the translator never hold a nul
    CString::new(string.replace('\0', "")).map(CString::into_raw).unwrap_or(ptr::null_mut())
}

unsafe fn free_raw(string: *mut c_char) {
    if !string.is_null() {
        drop(CString::from_raw(string));
    }
}

fn new_table<T>(items: Vec<T>) -> (*mut T, u32) {
    let len = items.len();
    if len == 0 {
        return (ptr::null_mut(), 0);
    }
    let mut boxed = items.into_boxed_slice();
    let table = boxed.as_mut_ptr();
    mem::forget(boxed);
    (table, len as u32)
}

unsafe fn free_table<T>(table: *mut T, count: u32) -> Vec<T> {
    if table.is_null() {
        vec![]
    } else {
        Vec::from_raw_parts(table, count as usize, count as usize)
    }
}

fn binding_kind(kind: BindingKind) -> u32 {
    match kind {
        BindingKind::Attribute => 0,
        BindingKind::Varying => 1,
        BindingKind::Uniform => 2,
        BindingKind::Sampler => 3,
    }
}

fn stage_from_raw(stage: u32) -> Result<ShaderStage, String> {
    match stage {
        0 => Ok(ShaderStage::Vertex),
        1 => Ok(ShaderStage::Fragment),
        other => Err(format!("invalid shader stage {}", other)),
    }
}

fn feature_level_from_raw(level: u32) -> Result<FeatureLevel, String> {
    Ok(match level {
        0 => FeatureLevel::Level9_1,
        1 => FeatureLevel::Level9_3,
        2 => FeatureLevel::Level10_0,
        3 => FeatureLevel::Level10_1,
        4 => FeatureLevel::Level11_0,
        other => return Err(format!("invalid feature level {}", other)),
    })
}

fn output_from_shader(shader: ConvertedShader) -> glt_translate_output {
    let success = shader.is_success();
    let bindings = shader.bindings
        .into_iter()
        .map(|binding| {
            glt_binding {
                kind: binding_kind(binding.kind),
                name: to_raw(binding.name),
                hlsl_name: to_raw(binding.hlsl_name),
                register: to_raw(binding.register),
                binding_type: to_raw(binding.binding_type.to_string()),
            }
        })
        .collect();
    let diagnostics = shader.diagnostics
        .into_iter()
        .map(|diagnostic| {
            glt_diagnostic {
                code: to_raw(diagnostic.code.name().to_string()),
                line: diagnostic.line,
                message: to_raw(diagnostic.message),
            }
        })
        .collect();
    let (bindings, binding_count) = new_table(bindings);
    let (diagnostics, diagnostic_count) = new_table(diagnostics);
    glt_translate_output {
        success,
        error: ptr::null_mut(),
        hlsl: if success { to_raw(shader.hlsl) } else { ptr::null_mut() },
        binding_count,
        bindings,
        diagnostic_count,
        diagnostics,
    }
}

fn output_from_error(error: String) -> glt_translate_output {
    glt_translate_output {
        success: false,
        error: to_raw(error),
        hlsl: ptr::null_mut(),
        binding_count: 0,
        bindings: ptr::null_mut(),
        diagnostic_count: 0,
        diagnostics: ptr::null_mut(),
    }
}

/// Translate a shader. The returned output must be released with
/// glt_free_output.
#[no_mangle]
pub unsafe extern "C" fn glt_translate(input: *const glt_translate_input) -> *mut glt_translate_output {
    unsafe fn glt_translate_impl(input: *const glt_translate_input) -> Result<glt_translate_output, String> {
        if input.is_null() || (*input).source.is_null() {
            return Err("missing input".to_string());
        }
        let input = &*input;
        let source = CStr::from_ptr(input.source).to_string_lossy().into_owned();
        let stage = stage_from_raw(input.stage)?;
        let feature_level = feature_level_from_raw(input.feature_level)?;
        let options = TranslateOptions::from_bits_truncate(input.options);

        let join_handle = thread::Builder::new()
            .stack_size(8 * 1024 * 1024)
            .spawn(move || translate(&source, stage, options, feature_level))
            .map_err(|_| "Failed to start worker thread".to_string())?;

        match join_handle.join() {
            Ok(shader) => Ok(output_from_shader(shader)),
            Err(_) => Err("Translator failed on an internal error".to_string()),
        }
    }

    let output = match glt_translate_impl(input) {
        Ok(output) => output,
        Err(error) => output_from_error(error),
    };
    Box::into_raw(Box::new(output))
}

#[no_mangle]
pub unsafe extern "C" fn glt_free_output(output: *mut glt_translate_output) {
    if output.is_null() {
        return;
    }
    let output = Box::from_raw(output);
    free_raw(output.error);
    free_raw(output.hlsl);
    for binding in free_table(output.bindings, output.binding_count) {
        free_raw(binding.name);
        free_raw(binding.hlsl_name);
        free_raw(binding.register);
        free_raw(binding.binding_type);
    }
    for diagnostic in free_table(output.diagnostics, output.diagnostic_count) {
        free_raw(diagnostic.code);
        free_raw(diagnostic.message);
    }
}

#[cfg(test)]
unsafe fn c_str(string: *const c_char) -> String {
    CStr::from_ptr(string).to_string_lossy().into_owned()
}

#[test]
fn test_translate_through_c() {
    let source = CString::new("attribute vec4 p; void main() { gl_Position = p; }").unwrap();
    let input = glt_translate_input {
        source: source.as_ptr(),
        stage: 0,
        options: 0,
        feature_level: 2,
    };
    unsafe {
        let output = glt_translate(&input);
        assert!((*output).success);
        assert!((*output).error.is_null());
        assert!(c_str((*output).hlsl).contains("VS_OUTPUT main(VS_INPUT input)"));
        assert_eq!((*output).binding_count, 1);
        let binding = &*(*output).bindings;
        assert_eq!(binding.kind, 0);
        assert_eq!(c_str(binding.name), "p");
        assert_eq!(c_str(binding.register), "TEXCOORD0");
        assert_eq!(c_str(binding.binding_type), "vec4");
        glt_free_output(output);
    }
}

#[test]
fn test_diagnostics_through_c() {
    let source = CString::new("int j[0];").unwrap();
    let input = glt_translate_input {
        source: source.as_ptr(),
        stage: 1,
        options: 0,
        feature_level: 4,
    };
    unsafe {
        let output = glt_translate(&input);
        assert!(!(*output).success);
        assert!((*output).hlsl.is_null());
        assert_eq!((*output).diagnostic_count, 1);
        let diagnostic = &*(*output).diagnostics;
        assert_eq!(c_str(diagnostic.code), "E_GLSLERROR_ARRAYSIZELEQZERO");
        assert_eq!(diagnostic.line, 1);
        glt_free_output(output);
    }
}

#[test]
fn test_invalid_stage() {
    let source = CString::new("void main() {}").unwrap();
    let input = glt_translate_input {
        source: source.as_ptr(),
        stage: 7,
        options: 0,
        feature_level: 0,
    };
    unsafe {
        let output = glt_translate(&input);
        assert!(!(*output).success);
        assert_eq!(c_str((*output).error), "invalid shader stage 7");
        glt_free_output(output);
    }
    assert!(stage_from_raw(1).is_ok());
}
