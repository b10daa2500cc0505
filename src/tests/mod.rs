use crate::*;

fn run_full(source: &'static str, stage: ShaderStage, options: TranslateOptions, hlsl: &'static str) {
    let shader = translate(&source.replace("\r\n", "\n"), stage, options, FeatureLevel::Level10_0);
    assert!(shader.is_success(), "{:?}", shader.diagnostics);

    let expected = hlsl.to_string().replace("\r\n", "\n");
    for (code_line, expected_line) in shader.hlsl.lines().zip(expected.lines()) {
        assert_eq!(code_line, expected_line);
    }
    assert_eq!(shader.hlsl, expected);
}

fn first_error(source: &str, stage: ShaderStage) -> (ErrorCode, u64) {
    let shader = translate(source, stage, TranslateOptions::empty(), FeatureLevel::Level10_0);
    assert!(!shader.is_success(), "{} translated", source);
    (shader.diagnostics[0].code, shader.diagnostics[0].line)
}

#[test]
fn textured_vertex_full() {
    const GLSL: &'static str = include_str!("textured.vert");
    const HLSL: &'static str = include_str!("textured_vert.hlsl");
    run_full(GLSL, ShaderStage::Vertex, TranslateOptions::DISABLE_BOILERPLATE, HLSL);
}

#[test]
fn textured_fragment_full() {
    const GLSL: &'static str = include_str!("textured.frag");
    const HLSL: &'static str = include_str!("textured_frag.hlsl");
    run_full(GLSL, ShaderStage::Fragment, TranslateOptions::DISABLE_BOILERPLATE, HLSL);
}

#[test]
fn textured_bindings() {
    let vertex = translate(include_str!("textured.vert"),
                           ShaderStage::Vertex,
                           TranslateOptions::empty(),
                           FeatureLevel::Level10_0);
    let summary = vertex.bindings
        .iter()
        .map(|b| (b.kind, b.name.as_str(), b.register.as_str(), b.binding_type.to_string()))
        .collect::<Vec<_>>();
    assert_eq!(summary,
               [(BindingKind::Attribute, "texcoord", "TEXCOORD0", "vec2".to_string()),
                (BindingKind::Attribute, "position", "TEXCOORD1", "vec4".to_string()),
                (BindingKind::Varying, "v_texcoord", "TEXCOORD0", "vec2".to_string()),
                (BindingKind::Uniform, "transform", "c0", "mat4".to_string())]);

    let fragment = translate(include_str!("textured.frag"),
                             ShaderStage::Fragment,
                             TranslateOptions::empty(),
                             FeatureLevel::Level10_0);
    let sampler = &fragment.bindings[1];
    assert_eq!(sampler.kind, BindingKind::Sampler);
    assert_eq!(sampler.hlsl_name, "tex_var_0_1");
    assert_eq!(sampler.register, "s0");
    assert_eq!(sampler.binding_type, BindingType::Sampler2D);
}

#[test]
fn translation_is_deterministic() {
    let source = include_str!("textured.frag");
    let first = translate(source, ShaderStage::Fragment, TranslateOptions::empty(), FeatureLevel::Level11_0);
    let second = translate(source, ShaderStage::Fragment, TranslateOptions::empty(), FeatureLevel::Level11_0);
    assert_eq!(first, second);
    assert!(first.hlsl.contains("float4 GLSLfwidth(float4 p)"));
}

#[test]
fn body_only_scenarios() {
    let options = TranslateOptions::DISABLE_WRITE_INPUTS;
    let body = |source: &str| {
        let shader = translate(source, ShaderStage::Vertex, options, FeatureLevel::Level10_0);
        assert!(shader.is_success(), "{:?}", shader.diagnostics);
        shader.hlsl
    };
    assert_eq!(body("void foo() { int bar; }"), "void fn_0_0()\n{\nint var_1_1=0;\n}\n");
    assert!(body("void foo() { float x; x = 1.0, x += 2.0; }")
        .contains("var_1_1=1.000000e+000,var_1_1+=2.000000e+000;"));
    assert!(!body("void foo() { float a; float b; a = (b < 0.0) ? 1.0 : 2.0; }").contains("?"));
    assert!(body("void foo() { for (int i = 0; i < 65; i++) { } }").contains("[loop]"));
    assert!(body("void foo() { for (int i = 0; i < 64; i++) { } }").contains("[unroll]"));
    assert!(body("void foo() { for (int i = 0; i < 4; i += 0) { } }").contains("[loop]"));
    assert!(body("struct S {int a;}; void foo() { S a, b; bool x = a == b; }")
        .contains("return (val1.fld_a==val2.fld_a);"));
}

#[test]
fn diagnostics() {
    let vs = ShaderStage::Vertex;
    let fs = ShaderStage::Fragment;
    assert_eq!(first_error("int j[0];", vs), (ErrorCode::ArraySizeLEQZero, 1));
    assert_eq!(first_error("float a;\nfloat gl_x;", vs), (ErrorCode::InvalidIdentifierName, 2));
    assert_eq!(first_error("void main() {\n  break;\n}", fs), (ErrorCode::InvalidBreakLocation, 2));
    assert_eq!(first_error("uniform vec4 c;", fs).0, ErrorCode::NoPrecisionSpecified);
    assert_eq!(first_error("void f(); void main() { f(); }", vs).0, ErrorCode::FunctionNotDefined);
    assert_eq!(first_error("#line 10\nfloat f = 1;", vs), (ErrorCode::IncompatibleTypes, 10));
}

#[test]
fn nesting_at_limit() {
    let nested = |negated: usize, parens: usize| {
        format!("void main() {{ float x = {}{}1.0{}{}; }}",
                "-(".repeat(negated),
                "(".repeat(parens),
                ")".repeat(parens),
                ")".repeat(negated))
    };
    let limit = glt_shared::Limits::for_feature_level(FeatureLevel::Level10_0).max_expression_depth as usize;

    // The body brace counts towards the bracket depth
    let deepest = translate(&nested(200, limit - 201), ShaderStage::Vertex, TranslateOptions::empty(), FeatureLevel::Level10_0);
    assert!(deepest.is_success(), "{:?}", deepest.diagnostics);
    assert!(deepest.hlsl.contains(&format!("{}1.000000e+000", "(-".repeat(200))));

    let too_deep = nested(200, limit - 200);
    assert_eq!(first_error(&too_deep, ShaderStage::Vertex), (ErrorCode::ShaderComplexity, 1));

    let unbracketed = format!("void main() {{ float x = {}1.0; }}", "- ".repeat(limit * 2));
    assert_eq!(first_error(&unbracketed, ShaderStage::Vertex).0, ErrorCode::ShaderComplexity);
}
