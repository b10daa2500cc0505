use glt_shared::{BindingKind, BindingType, ShaderBinding, ShaderStage};
use glt_lang_eir as src;
use glt_lang_eir::BuiltinVariable;
use glt_lang_hst as dst;
use super::transpiler::{Context, TranspileError, TranspileResult};

/// One member of the entry point input or output struct
#[derive(PartialEq, Debug, Clone)]
pub struct InterfaceMember {
    pub name: String,
    pub semantic: String,
    /// The user variable behind the member, None for built in variables
    pub variable: Option<src::VariableId>,
    pub ty: src::Type,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct InterfaceLayout {
    pub inputs: Vec<InterfaceMember>,
    pub outputs: Vec<InterfaceMember>,
}

/// Hands out TEXCOORD semantics, a value taking one per register it spans
struct TexcoordAllocator {
    next: u32,
}

impl TexcoordAllocator {
    fn new() -> TexcoordAllocator {
        TexcoordAllocator { next: 0 }
    }

    fn allocate(&mut self, ty: &src::Type, table: &src::IdentifierTable) -> String {
        let semantic = format!("TEXCOORD{}", self.next);
        self.next += table.get_register_count(ty);
        semantic
    }
}

fn builtin_member(builtin: BuiltinVariable, semantic: &str) -> InterfaceMember {
    InterfaceMember {
        name: builtin.get_name().to_string(),
        semantic: semantic.to_string(),
        variable: None,
        ty: builtin.get_type(),
    }
}

fn variable_member(id: src::VariableId, semantic: String, table: &src::IdentifierTable) -> InterfaceMember {
    InterfaceMember {
        name: table.get_variable_name(id),
        semantic,
        variable: Some(id),
        ty: table.variable(id).ty.clone(),
    }
}

/// Statically used varyings in declaration order
fn used_varyings(module: &src::Module) -> Vec<src::VariableId> {
    let mut varyings = vec![];
    for root in &module.root_definitions {
        if let src::RootDefinition::GlobalVariable(ref defs) = *root {
            for def in defs {
                let info = module.table.variable(def.id);
                if info.qualifier == src::VariableQualifier::Varying && module.is_statically_used(def.id) {
                    varyings.push(def.id);
                }
            }
        }
    }
    varyings
}

/// Place the used inputs and outputs of a stage at their semantics.
/// Attributes are placed in order of first use, varyings in order of
/// declaration.
pub fn assign_semantics(module: &src::Module) -> InterfaceLayout {
    let table = &module.table;
    let mut layout = InterfaceLayout::default();
    match module.stage {
        ShaderStage::Vertex => {
            let mut attributes = TexcoordAllocator::new();
            for &id in &module.static_uses {
                let ty = &table.variable(id).ty;
                if table.variable(id).qualifier == src::VariableQualifier::Attribute {
                    let semantic = attributes.allocate(ty, table);
                    layout.inputs.push(variable_member(id, semantic, table));
                }
            }

            layout.outputs.push(builtin_member(BuiltinVariable::Position, "SV_Position"));
            if module.uses_builtin(BuiltinVariable::PointSize) {
                layout.outputs.push(builtin_member(BuiltinVariable::PointSize, "PSIZE"));
            }
            let mut varyings = TexcoordAllocator::new();
            for id in used_varyings(module) {
                let semantic = varyings.allocate(&table.variable(id).ty, table);
                layout.outputs.push(variable_member(id, semantic, table));
            }
        }
        ShaderStage::Fragment => {
            if module.uses_builtin(BuiltinVariable::FragCoord) {
                layout.inputs.push(builtin_member(BuiltinVariable::FragCoord, "SV_Position"));
            }
            let mut varyings = TexcoordAllocator::new();
            for id in used_varyings(module) {
                let semantic = varyings.allocate(&table.variable(id).ty, table);
                layout.inputs.push(variable_member(id, semantic, table));
            }
            if module.uses_builtin(BuiltinVariable::PointCoord) {
                let ty = BuiltinVariable::PointCoord.get_type();
                let semantic = varyings.allocate(&ty, table);
                layout.inputs.push(builtin_member(BuiltinVariable::PointCoord, &semantic));
            }
            if module.uses_builtin(BuiltinVariable::FrontFacing) {
                layout.inputs.push(builtin_member(BuiltinVariable::FrontFacing, "SV_IsFrontFace"));
            }

            layout.outputs.push(builtin_member(BuiltinVariable::FragColor, "SV_Target0"));
            if module.uses_builtin(BuiltinVariable::FragDepth) {
                layout.outputs.push(builtin_member(BuiltinVariable::FragDepth, "SV_Depth"));
            }
        }
    }
    layout
}

pub fn binding_type(ty: &src::Type, table: &src::IdentifierTable) -> TranspileResult<BindingType> {
    Ok(match *ty {
        src::Type::Scalar(src::ScalarType::Bool) => BindingType::Bool,
        src::Type::Scalar(src::ScalarType::Int) => BindingType::Int,
        src::Type::Scalar(src::ScalarType::Float) => BindingType::Float,
        src::Type::Vector(src::ScalarType::Bool, dim) => BindingType::BoolVector(dim),
        src::Type::Vector(src::ScalarType::Int, dim) => BindingType::IntVector(dim),
        src::Type::Vector(src::ScalarType::Float, dim) => BindingType::FloatVector(dim),
        src::Type::Matrix(dim) => BindingType::Matrix(dim),
        src::Type::Sampler(src::SamplerType::Sampler2D) => BindingType::Sampler2D,
        src::Type::Sampler(src::SamplerType::SamplerCube) => BindingType::SamplerCube,
        src::Type::Struct(id) => {
            let info = table.structure(id);
            let name = match info.name {
                Some(ref name) => name.clone(),
                None => table.get_struct_name(id),
            };
            let mut members = vec![];
            for member in &info.members {
                members.push((member.name.clone(), binding_type(&member.ty, table)?));
            }
            BindingType::Struct(name, members)
        }
        src::Type::Array(ref inner, size) => BindingType::Array(Box::new(binding_type(inner, table)?), size),
        src::Type::Void => return Err(TranspileError::Internal("void type in the shader interface".to_string())),
    })
}

/// Bindings for the user variables of the interface, inputs first
pub fn interface_bindings(layout: &InterfaceLayout, module: &src::Module) -> TranspileResult<Vec<ShaderBinding>> {
    let table = &module.table;
    let mut bindings = vec![];
    for member in layout.inputs.iter().chain(layout.outputs.iter()) {
        let id = match member.variable {
            Some(id) => id,
            None => continue,
        };
        let info = table.variable(id);
        let kind = match info.qualifier {
            src::VariableQualifier::Attribute => BindingKind::Attribute,
            src::VariableQualifier::Varying => BindingKind::Varying,
            _ => return Err(TranspileError::Internal(format!("{} is not an interface variable", info.name))),
        };
        bindings.push(ShaderBinding {
            kind,
            name: info.name.clone(),
            hlsl_name: member.name.clone(),
            register: member.semantic.clone(),
            binding_type: binding_type(&member.ty, table)?,
        });
    }
    Ok(bindings)
}

fn struct_names(stage: ShaderStage) -> (&'static str, &'static str) {
    match stage {
        ShaderStage::Vertex => ("VS_INPUT", "VS_OUTPUT"),
        ShaderStage::Fragment => ("PS_INPUT", "PS_OUTPUT"),
    }
}

fn emit_interface_struct(name: &str,
                         members: &[InterfaceMember],
                         ctx: &mut Context)
                         -> TranspileResult<dst::RootDefinition> {
    let mut converted = vec![];
    for member in members {
        converted.push(dst::StructMember {
            name: member.name.clone(),
            typename: ctx.convert_type(&member.ty)?,
            semantic: Some(member.semantic.clone()),
        });
    }
    Ok(dst::RootDefinition::Struct(dst::StructDefinition {
        name: name.to_string(),
        members: converted,
    }))
}

fn copy(target: dst::Expression, value: dst::Expression) -> dst::Statement {
    dst::Statement::Expression(dst::Expression::assign(target, value))
}

fn float(value: f32) -> dst::Expression {
    dst::Expression::Literal(dst::Literal::Float(value))
}

fn swizzle(expr: dst::Expression, slot: dst::SwizzleSlot) -> dst::Expression {
    dst::Expression::Swizzle(Box::new(expr), vec![slot])
}

fn zero_vec4() -> dst::Expression {
    dst::Expression::Cast(dst::Type::floatn(4), Box::new(dst::Expression::Literal(dst::Literal::Int(0))))
}

/// The value written to an output member
fn output_value(member: &InterfaceMember, module: &src::Module) -> dst::Expression {
    match BuiltinVariable::from_name(&member.name) {
        Some(BuiltinVariable::Position) if !module.uses_builtin(BuiltinVariable::Position) => zero_vec4(),
        Some(BuiltinVariable::FragColor) => {
            if module.uses_builtin(BuiltinVariable::FragColor) {
                dst::Expression::var(&member.name)
            } else if module.uses_builtin(BuiltinVariable::FragData) {
                let data = dst::Expression::var(BuiltinVariable::FragData.get_name());
                dst::Expression::ArraySubscript(Box::new(data),
                                                Box::new(dst::Expression::Literal(dst::Literal::Int(0))))
            } else {
                zero_vec4()
            }
        }
        _ => dst::Expression::var(&member.name),
    }
}

/// Generate the input and output structs with the HLSL main function that
/// moves values between them and the globals used by the translated code
pub fn emit_entry_point(layout: &InterfaceLayout, ctx: &mut Context) -> TranspileResult<Vec<dst::RootDefinition>> {
    let module = ctx.module;
    let (input_name, output_name) = struct_names(module.stage);
    let mut definitions = vec![];
    let mut body = vec![];
    let mut params = vec![];

    if !layout.inputs.is_empty() {
        definitions.push(emit_interface_struct(input_name, &layout.inputs, ctx)?);
        params.push(dst::FunctionParam::input("input", dst::Type::Struct(input_name.to_string())));
        let input = dst::Expression::var("input");
        for member in &layout.inputs {
            body.push(copy(dst::Expression::var(&member.name), input.clone().member(&member.name)));
            if member.name == BuiltinVariable::FragCoord.get_name() {
                let w = swizzle(input.clone().member(&member.name), dst::SwizzleSlot::W);
                let reciprocal = dst::Expression::binary(dst::BinOp::Divide, float(1.0), w);
                body.push(copy(swizzle(dst::Expression::var(&member.name), dst::SwizzleSlot::W), reciprocal));
            }
        }
    }
    definitions.push(emit_interface_struct(output_name, &layout.outputs, ctx)?);

    if let Some(main) = module.main {
        body.push(dst::Statement::Expression(dst::Expression::Call(ctx.function_name(main), vec![])));
    }

    let output_type = dst::Type::Struct(output_name.to_string());
    body.push(dst::Statement::Var(dst::VarDef::single("output".to_string(), output_type.clone(), None)));
    let output = dst::Expression::var("output");
    for member in &layout.outputs {
        let target = output.clone().member(&member.name);
        body.push(copy(target.clone(), output_value(member, module)));
        let remap_depth = member.name == BuiltinVariable::Position.get_name() &&
                          module.uses_builtin(BuiltinVariable::Position);
        if remap_depth {
            // Clip space depth from [-w, w] to [0, w]
            let position = dst::Expression::var(&member.name);
            let sum = dst::Expression::binary(dst::BinOp::Add,
                                              swizzle(position.clone(), dst::SwizzleSlot::Z),
                                              swizzle(position, dst::SwizzleSlot::W));
            let depth = dst::Expression::binary(dst::BinOp::Multiply, sum, float(0.5));
            body.push(copy(swizzle(target, dst::SwizzleSlot::Z), depth));
        }
    }
    body.push(dst::Statement::Return(Some(output)));

    definitions.push(dst::RootDefinition::Function(dst::FunctionDefinition {
        name: "main".to_string(),
        returntype: output_type,
        params,
        body,
    }));
    Ok(definitions)
}

#[cfg(test)]
use glt_shared::TranslateOptions;

#[cfg(test)]
fn with_entry(source: &str, stage: ShaderStage) -> (Vec<ShaderBinding>, String) {
    let (shader, hlsl) = super::transpiler::transpile_source(source, stage, TranslateOptions::DISABLE_BOILERPLATE);
    (shader.bindings, hlsl)
}

#[test]
fn test_vertex_entry() {
    let (bindings, hlsl) = with_entry("attribute vec4 pos; attribute vec2 uv; varying vec2 v_uv; uniform mat4 m;\n\
                                       void main() { v_uv = uv; gl_Position = m * pos; }",
                                      ShaderStage::Vertex);
    assert!(hlsl.ends_with("struct VS_INPUT\n{\nfloat2 var_0_1 : TEXCOORD0;\nfloat4 var_0_0 : TEXCOORD1;\n};\n\
                            struct VS_OUTPUT\n{\nfloat4 gl_Position : SV_Position;\nfloat2 var_0_2 : TEXCOORD0;\n};\n\
                            VS_OUTPUT main(VS_INPUT input)\n{\nvar_0_1=input.var_0_1;\nvar_0_0=input.var_0_0;\n\
                            fn_0_4();\nVS_OUTPUT output;\noutput.gl_Position=gl_Position;\n\
                            output.gl_Position.z=((gl_Position.z+gl_Position.w)*5.000000e-001);\n\
                            output.var_0_2=var_0_2;\nreturn output;\n}\n"));

    let summary = bindings.iter()
        .map(|b| (b.kind, b.name.as_str(), b.register.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(summary,
               [(BindingKind::Attribute, "uv", "TEXCOORD0"),
                (BindingKind::Attribute, "pos", "TEXCOORD1"),
                (BindingKind::Varying, "v_uv", "TEXCOORD0"),
                (BindingKind::Uniform, "m", "c0")]);
    assert_eq!(bindings[0].hlsl_name, "var_0_1");
    assert_eq!(bindings[3].binding_type, BindingType::Matrix(4));
}

#[test]
fn test_vertex_entry_without_position() {
    let (_, hlsl) = with_entry("void main() { gl_PointSize = 1.0; }", ShaderStage::Vertex);
    assert!(!hlsl.contains("VS_INPUT"));
    assert!(hlsl.contains("struct VS_OUTPUT\n{\nfloat4 gl_Position : SV_Position;\nfloat gl_PointSize : PSIZE;\n};\n"));
    assert!(hlsl.ends_with("VS_OUTPUT main()\n{\nfn_0_0();\nVS_OUTPUT output;\noutput.gl_Position=(float4)0;\n\
                            output.gl_PointSize=gl_PointSize;\nreturn output;\n}\n"));
}

#[test]
fn test_attribute_matrix_spans_texcoords() {
    let (bindings, _) = with_entry("attribute mat3 a; attribute vec4 b;\n\
                                    void main() { gl_Position = vec4(a[0], 1.0) + b; }",
                                   ShaderStage::Vertex);
    let registers = bindings.iter().map(|b| b.register.as_str()).collect::<Vec<_>>();
    assert_eq!(registers, ["TEXCOORD0", "TEXCOORD3"]);
}

#[test]
fn test_fragment_entry() {
    let (bindings, hlsl) = with_entry("precision mediump float; varying vec2 v_uv;\n\
                                       void main() { gl_FragColor = vec4(v_uv, gl_FragCoord.x, 1.0); }",
                                      ShaderStage::Fragment);
    assert!(hlsl.ends_with("struct PS_INPUT\n{\nfloat4 gl_FragCoord : SV_Position;\nfloat2 var_0_0 : TEXCOORD0;\n};\n\
                            struct PS_OUTPUT\n{\nfloat4 gl_FragColor : SV_Target0;\n};\n\
                            PS_OUTPUT main(PS_INPUT input)\n{\ngl_FragCoord=input.gl_FragCoord;\n\
                            gl_FragCoord.w=(1.000000e+000/input.gl_FragCoord.w);\nvar_0_0=input.var_0_0;\n\
                            fn_0_1();\nPS_OUTPUT output;\noutput.gl_FragColor=gl_FragColor;\nreturn output;\n}\n"));
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].kind, BindingKind::Varying);
    assert_eq!(bindings[0].binding_type, BindingType::FloatVector(2));
}

#[test]
fn test_fragment_data_output() {
    let (_, hlsl) = with_entry("precision mediump float; void main() { gl_FragData[0] = vec4(1.0); }",
                               ShaderStage::Fragment);
    assert!(!hlsl.contains("PS_INPUT"));
    assert!(hlsl.contains("output.gl_FragColor=gl_FragData[0];\n"));
}

#[test]
fn test_fragment_system_inputs() {
    let (_, hlsl) = with_entry("precision mediump float; varying vec2 a;\n\
                                void main() { gl_FragColor = vec4(gl_PointCoord, a) * (gl_FrontFacing ? 1.0 : 0.0); }",
                               ShaderStage::Fragment);
    assert!(hlsl.contains("struct PS_INPUT\n{\nfloat2 var_0_0 : TEXCOORD0;\nfloat2 gl_PointCoord : TEXCOORD1;\n\
                           bool gl_FrontFacing : SV_IsFrontFace;\n};\n"));
    assert!(hlsl.contains("gl_FrontFacing=input.gl_FrontFacing;\n"));
}

#[test]
fn test_no_entry_without_inputs_option() {
    let (shader, hlsl) = super::transpiler::transpile_source("attribute vec4 p; void main() { gl_Position = p; }",
                                                             ShaderStage::Vertex,
                                                             TranslateOptions::DISABLE_WRITE_INPUTS);
    assert!(!hlsl.contains("VS_INPUT"));
    assert_eq!(shader.bindings.len(), 1);
    assert_eq!(shader.bindings[0].register, "TEXCOORD0");
}
