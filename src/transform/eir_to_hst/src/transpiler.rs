use std::error;
use std::fmt;
use std::collections::HashSet;
use glt_shared::*;
use glt_lang_eir as src;
use glt_lang_hst as dst;
use glt_lang_hst::Fragment;
use super::expressions::{emit_expression, equality, needs_lift, zero_initializer};
use super::statements::{emit_statement, emit_statements};
use super::entry::{assign_semantics, interface_bindings, binding_type, emit_entry_point};

#[derive(PartialEq, Debug, Clone)]
pub enum TranspileError {
    Internal(String),
    InternalTypeError(src::TypeError),
}

impl error::Error for TranspileError {}

impl fmt::Display for TranspileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TranspileError::Internal(ref msg) => write!(f, "internal error: {}", msg),
            TranspileError::InternalTypeError(ref err) => write!(f, "internal type error: {}", err),
        }
    }
}

impl From<src::TypeError> for TranspileError {
    fn from(err: src::TypeError) -> TranspileError {
        TranspileError::InternalTypeError(err)
    }
}

pub type TranspileResult<T> = Result<T, TranspileError>;

/// The emitted module with the interface it exposes to the host
#[derive(PartialEq, Debug, Clone)]
pub struct TranspiledShader {
    pub module: dst::Module,
    pub bindings: Vec<ShaderBinding>,
}

/// Name of the generated function that runs deferred global initializers
pub const GLOBAL_INITIALIZER: &str = "initializeGlobals";

/// Functions generated for user structs
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
enum StructHelper {
    Equality(src::StructId),
    Constructor(src::StructId),
}

pub struct Context<'a> {
    pub module: &'a src::Module,
    pub table: &'a src::IdentifierTable,
    lift: bool,
    next_temp: u32,
    /// Structs to declare, dependencies first
    structs: Vec<src::StructId>,
    fragments: HashSet<Fragment>,
    /// Struct helpers in first use order, nested helpers first
    helpers: Vec<StructHelper>,
}

impl<'a> Context<'a> {
    fn new(module: &'a src::Module) -> Context<'a> {
        Context {
            module,
            table: &module.table,
            lift: true,
            next_temp: 0,
            structs: vec![],
            fragments: HashSet::new(),
            helpers: vec![],
        }
    }

    /// True if the expression has to be split into statements before it is
    /// evaluated
    pub fn requires_lift(&self, expr: &src::Expression) -> bool {
        self.lift && needs_lift(expr)
    }

    pub fn can_lift(&self) -> bool {
        self.lift
    }

    /// Run an emit with lifting switched on or off. Places that can only
    /// hold an expression, such as loop headers, emit without lifting.
    pub fn with_lifting<T, F>(&mut self, lift: bool, f: F) -> T
        where F: FnOnce(&mut Context<'a>) -> T
    {
        let last = self.lift;
        self.lift = lift;
        let result = f(self);
        self.lift = last;
        result
    }

    pub fn new_temp(&mut self) -> String {
        let name = format!("tmp_{}", self.next_temp);
        self.next_temp += 1;
        name
    }

    pub fn variable_name(&self, id: src::VariableId) -> String {
        self.table.get_variable_name(id)
    }

    pub fn function_name(&self, id: src::FunctionId) -> String {
        self.table.get_function_name(id)
    }

    pub fn struct_name(&self, id: src::StructId) -> String {
        self.table.get_struct_name(id)
    }

    /// Register a struct for declaration after the structs it contains
    pub fn use_struct(&mut self, id: src::StructId) -> TranspileResult<()> {
        if self.structs.contains(&id) {
            return Ok(());
        }
        let table = self.table;
        for member in &table.structure(id).members {
            if let src::Type::Struct(inner) = *member.ty.base_type() {
                self.use_struct(inner)?;
            }
        }
        self.structs.push(id);
        Ok(())
    }

    pub fn use_fragment(&mut self, fragment: Fragment) -> String {
        self.fragments.insert(fragment);
        fragment.get_name()
    }

    /// Name of the equality function for a struct
    pub fn eq_helper(&mut self, id: src::StructId) -> TranspileResult<String> {
        let helper = StructHelper::Equality(id);
        if !self.helpers.contains(&helper) {
            let table = self.table;
            for member in &table.structure(id).members {
                match member.ty {
                    src::Type::Struct(inner) => {
                        self.eq_helper(inner)?;
                    }
                    src::Type::Array(_, _) => {
                        return Err(TranspileError::Internal(format!("struct {} with an array compared",
                                                                    self.struct_name(id))));
                    }
                    _ => {}
                }
            }
            self.use_struct(id)?;
            self.helpers.push(helper);
        }
        Ok(format!("eq_{}", self.struct_name(id)))
    }

    /// Name of the constructor function for a struct
    pub fn ctor_helper(&mut self, id: src::StructId) -> TranspileResult<String> {
        let helper = StructHelper::Constructor(id);
        if !self.helpers.contains(&helper) {
            self.use_struct(id)?;
            self.helpers.push(helper);
        }
        Ok(format!("ctor_{}", self.struct_name(id)))
    }

    pub fn convert_type(&mut self, ty: &src::Type) -> TranspileResult<dst::Type> {
        Ok(match *ty {
            src::Type::Void => dst::Type::Void,
            src::Type::Scalar(scalar) => dst::Type::Scalar(convert_scalar(scalar)),
            src::Type::Vector(scalar, x) => dst::Type::Vector(convert_scalar(scalar), x),
            src::Type::Matrix(x) => dst::Type::Matrix(x),
            src::Type::Struct(id) => {
                self.use_struct(id)?;
                dst::Type::Struct(self.struct_name(id))
            }
            src::Type::Array(ref inner, size) => {
                dst::Type::Array(Box::new(self.convert_type(inner)?), size)
            }
            src::Type::Sampler(_) => {
                return Err(TranspileError::Internal("sampler used as a value type".to_string()))
            }
        })
    }
}

pub fn convert_scalar(scalar: src::ScalarType) -> dst::ScalarType {
    match scalar {
        src::ScalarType::Bool => dst::ScalarType::Bool,
        src::ScalarType::Int => dst::ScalarType::Int,
        src::ScalarType::Float => dst::ScalarType::Float,
    }
}

pub fn member_name(name: &str) -> String {
    format!("fld_{}", name)
}

pub fn texture_name(name: &str) -> String {
    format!("tex_{}", name)
}

pub fn sampler_name(name: &str) -> String {
    format!("smp_{}", name)
}

/// Texture and sampler state types a sampler splits into
pub fn texture_types(ty: &src::Type) -> TranspileResult<(dst::Type, dst::Type)> {
    match *ty {
        src::Type::Sampler(src::SamplerType::Sampler2D) => {
            Ok((dst::Type::Texture2D, dst::Type::SamplerState))
        }
        src::Type::Sampler(src::SamplerType::SamplerCube) => {
            Ok((dst::Type::TextureCube, dst::Type::SamplerState))
        }
        src::Type::Array(ref inner, size) => {
            let (texture, sampler) = texture_types(inner)?;
            Ok((dst::Type::Array(Box::new(texture), size),
                dst::Type::Array(Box::new(sampler), size)))
        }
        _ => Err(TranspileError::Internal("expected a sampler type".to_string())),
    }
}

/// Next free constant and sampler registers, and the bindings assigned so far
#[derive(Default)]
struct Registers {
    constant: u32,
    sampler: u32,
    bindings: Vec<ShaderBinding>,
}

fn is_deferred(def: &src::VarDef, module: &src::Module) -> bool {
    module.table.variable(def.id).qualifier == src::VariableQualifier::None &&
    def.init.is_some() && !def.constant_init
}

/// Global initializers move into a function when they can not be evaluated
/// where they are declared
fn has_deferred_initializers(module: &src::Module) -> bool {
    module.has_function_definitions() &&
    module.root_definitions.iter().any(|root| match *root {
        src::RootDefinition::GlobalVariable(ref defs) => defs.iter().any(|def| is_deferred(def, module)),
        _ => false,
    })
}

fn inline_initializer(init: &src::Expression, ctx: &mut Context) -> TranspileResult<dst::Initializer> {
    ctx.with_lifting(false, |ctx| {
        let mut pre = vec![];
        let expr = emit_expression(init, &mut pre, ctx)?;
        if !pre.is_empty() {
            return Err(TranspileError::Internal("statements emitted for a global initializer".to_string()));
        }
        Ok(dst::Initializer::Expression(expr))
    })
}

fn static_global(name: String, typename: dst::Type, init: dst::Initializer) -> dst::RootDefinition {
    dst::RootDefinition::GlobalVariable(dst::GlobalVariable {
        name,
        typename,
        storage: dst::GlobalStorage::Static,
        register: None,
        init: Some(init),
    })
}

fn emit_global(def: &src::VarDef,
               deferred: bool,
               registers: &mut Registers,
               code: &mut Vec<dst::RootDefinition>,
               initializers: &mut Vec<dst::Statement>,
               ctx: &mut Context)
               -> TranspileResult<()> {
    let table = ctx.table;
    let info = table.variable(def.id);
    let name = ctx.variable_name(def.id);
    match info.qualifier {
        src::VariableQualifier::Uniform if info.ty.is_sampler() => {
            let (texture, sampler) = texture_types(&info.ty)?;
            let count = match info.ty {
                src::Type::Array(_, size) => size,
                _ => 1,
            };
            let index = registers.sampler;
            registers.sampler += count;
            code.push(dst::RootDefinition::GlobalVariable(dst::GlobalVariable {
                name: texture_name(&name),
                typename: texture,
                storage: dst::GlobalStorage::Resource,
                register: Some(dst::Register::Texture(index)),
                init: None,
            }));
            code.push(dst::RootDefinition::GlobalVariable(dst::GlobalVariable {
                name: sampler_name(&name),
                typename: sampler,
                storage: dst::GlobalStorage::Resource,
                register: Some(dst::Register::Sampler(index)),
                init: None,
            }));
            registers.bindings.push(ShaderBinding {
                kind: BindingKind::Sampler,
                name: info.name.clone(),
                hlsl_name: texture_name(&name),
                register: format!("s{}", index),
                binding_type: binding_type(&info.ty, table)?,
            });
        }
        src::VariableQualifier::Uniform => {
            let index = registers.constant;
            registers.constant += table.get_register_count(&info.ty);
            code.push(dst::RootDefinition::GlobalVariable(dst::GlobalVariable {
                name: name.clone(),
                typename: ctx.convert_type(&info.ty)?,
                storage: dst::GlobalStorage::Uniform,
                register: Some(dst::Register::Constant(index)),
                init: None,
            }));
            registers.bindings.push(ShaderBinding {
                kind: BindingKind::Uniform,
                name: info.name.clone(),
                hlsl_name: name,
                register: format!("c{}", index),
                binding_type: binding_type(&info.ty, table)?,
            });
        }
        src::VariableQualifier::Attribute | src::VariableQualifier::Varying => {
            // Unused interface variables are dropped
            if ctx.module.is_statically_used(def.id) {
                let typename = ctx.convert_type(&info.ty)?;
                code.push(static_global(name, typename, zero_initializer(&info.ty, ctx)?));
            }
        }
        src::VariableQualifier::Const => {
            let init = match def.init {
                Some(ref init) => inline_initializer(init, ctx)?,
                None => zero_initializer(&info.ty, ctx)?,
            };
            code.push(dst::RootDefinition::GlobalVariable(dst::GlobalVariable {
                name,
                typename: ctx.convert_type(&info.ty)?,
                storage: dst::GlobalStorage::StaticConst,
                register: None,
                init: Some(init),
            }));
        }
        _ => {
            let init = match def.init {
                Some(ref init) if deferred && !def.constant_init => {
                    let assignment = src::Expression::Assignment(src::AssignOp::Assign,
                                                                 Box::new(src::Expression::Variable(def.id)),
                                                                 Box::new(init.clone()));
                    emit_statement(&src::Statement::Expression(assignment), initializers, ctx)?;
                    zero_initializer(&info.ty, ctx)?
                }
                Some(ref init) => inline_initializer(init, ctx)?,
                None => zero_initializer(&info.ty, ctx)?,
            };
            let typename = ctx.convert_type(&info.ty)?;
            code.push(static_global(name, typename, init));
        }
    }
    Ok(())
}

fn emit_params(info: &src::FunctionInfo,
               names: &[Option<src::VariableId>],
               ctx: &mut Context)
               -> TranspileResult<Vec<dst::FunctionParam>> {
    let mut params = vec![];
    for (index, param) in info.params.iter().enumerate() {
        let name = match names.get(index) {
            Some(&Some(id)) => ctx.variable_name(id),
            _ => ctx.new_temp(),
        };
        if param.ty.is_sampler() {
            let (texture, sampler) = texture_types(&param.ty)?;
            params.push(dst::FunctionParam::input(&texture_name(&name), texture));
            params.push(dst::FunctionParam::input(&sampler_name(&name), sampler));
            continue;
        }
        let modifier = match param.qualifier {
            src::ParamQualifier::In => dst::InputModifier::In,
            src::ParamQualifier::Out => dst::InputModifier::Out,
            src::ParamQualifier::InOut => dst::InputModifier::InOut,
        };
        params.push(dst::FunctionParam {
            name,
            typename: ctx.convert_type(&param.ty)?,
            modifier,
        });
    }
    Ok(params)
}

fn emit_prototype(id: src::FunctionId, ctx: &mut Context) -> TranspileResult<dst::FunctionDeclaration> {
    let info = ctx.table.function(id);
    Ok(dst::FunctionDeclaration {
        name: ctx.function_name(id),
        returntype: ctx.convert_type(&info.returntype)?,
        params: emit_params(info, &[], ctx)?,
    })
}

fn emit_function(def: &src::FunctionDefinition,
                 deferred: bool,
                 ctx: &mut Context)
                 -> TranspileResult<dst::FunctionDefinition> {
    let info = ctx.table.function(def.id);
    let params = emit_params(info, &def.params, ctx)?;
    let mut body = emit_statements(&def.body, ctx)?;
    if deferred && ctx.module.main == Some(def.id) {
        body.insert(0, dst::Statement::Expression(dst::Expression::call(GLOBAL_INITIALIZER, vec![])));
    }
    Ok(dst::FunctionDefinition {
        name: ctx.function_name(def.id),
        returntype: ctx.convert_type(&info.returntype)?,
        params,
        body,
    })
}

fn emit_struct(id: src::StructId, ctx: &mut Context) -> TranspileResult<dst::StructDefinition> {
    let table = ctx.table;
    let mut members = vec![];
    for member in &table.structure(id).members {
        members.push(dst::StructMember {
            name: member_name(&member.name),
            typename: ctx.convert_type(&member.ty)?,
            semantic: None,
        });
    }
    Ok(dst::StructDefinition {
        name: ctx.struct_name(id),
        members,
    })
}

/// bool eq_typ(typ val1, typ val2) comparing every member
fn emit_eq_helper(id: src::StructId, ctx: &mut Context) -> TranspileResult<dst::FunctionDefinition> {
    let table = ctx.table;
    let typename = dst::Type::Struct(ctx.struct_name(id));
    let mut result = None;
    for member in &table.structure(id).members {
        let field = member_name(&member.name);
        let eq = equality(src::BinOp::Equality,
                          &member.ty,
                          dst::Expression::var("val1").member(&field),
                          dst::Expression::var("val2").member(&field),
                          ctx)?;
        result = Some(match result {
            None => eq,
            Some(previous) => dst::Expression::binary(dst::BinOp::LogicalAnd, previous, eq),
        });
    }
    let result = result.unwrap_or(dst::Expression::Literal(dst::Literal::Bool(true)));
    Ok(dst::FunctionDefinition {
        name: ctx.eq_helper(id)?,
        returntype: dst::Type::bool(),
        params: vec![dst::FunctionParam::input("val1", typename.clone()),
                     dst::FunctionParam::input("val2", typename)],
        body: vec![dst::Statement::Return(Some(result))],
    })
}

/// typ ctor_typ(T fld_a, ...) assigning each member in order
fn emit_ctor_helper(id: src::StructId, ctx: &mut Context) -> TranspileResult<dst::FunctionDefinition> {
    let table = ctx.table;
    let typename = dst::Type::Struct(ctx.struct_name(id));
    let mut params = vec![];
    let mut body = vec![dst::Statement::Var(dst::VarDef::single("ret".to_string(), typename.clone(), None))];
    for member in &table.structure(id).members {
        let field = member_name(&member.name);
        params.push(dst::FunctionParam::input(&field, ctx.convert_type(&member.ty)?));
        body.push(dst::Statement::Expression(dst::Expression::assign(dst::Expression::var("ret").member(&field),
                                                                     dst::Expression::var(&field))));
    }
    body.push(dst::Statement::Return(Some(dst::Expression::var("ret"))));
    Ok(dst::FunctionDefinition {
        name: ctx.ctor_helper(id)?,
        returntype: typename,
        params,
        body,
    })
}

pub fn transpile(module: &src::Module, options: TranslateOptions) -> TranspileResult<TranspiledShader> {
    let mut ctx = Context::new(module);
    let deferred = has_deferred_initializers(module);

    let mut registers = Registers::default();
    let mut code = vec![];
    let mut initializers = vec![];
    for root in &module.root_definitions {
        match *root {
            src::RootDefinition::GlobalVariable(ref defs) => {
                for def in defs {
                    emit_global(def, deferred, &mut registers, &mut code, &mut initializers, &mut ctx)?;
                }
            }
            src::RootDefinition::FunctionPrototype(id) => {
                code.push(dst::RootDefinition::FunctionDeclaration(emit_prototype(id, &mut ctx)?));
            }
            src::RootDefinition::Function(ref def) => {
                code.push(dst::RootDefinition::Function(emit_function(def, deferred, &mut ctx)?));
            }
        }
    }

    let layout = assign_semantics(module);
    let entry = if options.contains(TranslateOptions::DISABLE_WRITE_INPUTS) {
        vec![]
    } else {
        emit_entry_point(&layout, &mut ctx)?
    };

    let mut root_definitions = vec![];
    for id in ctx.structs.clone() {
        root_definitions.push(dst::RootDefinition::Struct(emit_struct(id, &mut ctx)?));
    }

    let whole_preamble = !options.intersects(TranslateOptions::DISABLE_BOILERPLATE |
                                             TranslateOptions::DISABLE_WRITE_INPUTS);
    for fragment in Fragment::preamble(module.stage) {
        if whole_preamble || ctx.fragments.contains(&fragment) {
            root_definitions.push(dst::RootDefinition::Function(fragment.generate()));
        }
    }

    for helper in ctx.helpers.clone() {
        let function = match helper {
            StructHelper::Equality(id) => emit_eq_helper(id, &mut ctx)?,
            StructHelper::Constructor(id) => emit_ctor_helper(id, &mut ctx)?,
        };
        root_definitions.push(dst::RootDefinition::Function(function));
    }

    for builtin in &module.builtin_uses {
        let ty = builtin.get_type();
        let typename = ctx.convert_type(&ty)?;
        root_definitions.push(static_global(builtin.get_name().to_string(),
                                            typename,
                                            zero_initializer(&ty, &mut ctx)?));
    }

    if deferred {
        root_definitions.push(dst::RootDefinition::FunctionDeclaration(dst::FunctionDeclaration {
            name: GLOBAL_INITIALIZER.to_string(),
            returntype: dst::Type::Void,
            params: vec![],
        }));
    }
    root_definitions.extend(code);
    if deferred {
        root_definitions.push(dst::RootDefinition::Function(dst::FunctionDefinition {
            name: GLOBAL_INITIALIZER.to_string(),
            returntype: dst::Type::Void,
            params: vec![],
            body: initializers,
        }));
    }
    root_definitions.extend(entry);

    let mut bindings = interface_bindings(&layout, module)?;
    bindings.extend(registers.bindings);
    Ok(TranspiledShader {
        module: dst::Module { root_definitions },
        bindings,
    })
}

#[cfg(test)]
pub fn transpile_source(source: &str,
                        stage: ShaderStage,
                        options: TranslateOptions)
                        -> (TranspiledShader, String) {
    use glt_transform_preprocess::preprocess;
    use glt_transform_lexer::lex;
    use glt_transform_etk_to_est::parse;
    use glt_transform_est_to_eir::typeparse;
    use glt_transform_hst_printer::HlslSource;
    let extensions = options | TranslateOptions::ENABLE_FRAG_DEPTH |
                     TranslateOptions::ENABLE_STANDARD_DERIVATIVES;
    let text = preprocess(source, stage, ExtensionState::new(stage, extensions)).expect("preprocess failed");
    let tokens = lex(&text).expect("lex failed");
    let module = parse(&tokens.stream, 256).expect("parse failed");
    let limits = Limits::for_feature_level(FeatureLevel::Level10_0);
    let ir = typeparse(&module, stage, text.extensions(), &limits, FeatureLevel::Level10_0)
        .expect("verify failed");
    let shader = transpile(&ir, options).expect("transpile failed");
    let hlsl = HlslSource::from_hst(&shader.module).into_string();
    (shader, hlsl)
}

#[cfg(test)]
fn body_only(source: &str) -> String {
    transpile_source(source, ShaderStage::Vertex, TranslateOptions::DISABLE_WRITE_INPUTS).1
}

#[test]
fn test_uninitialized_local() {
    assert_eq!(body_only("void foo() { int bar; }"),
               "void fn_0_0()\n{\nint var_1_1=0;\n}\n");
}

#[test]
fn test_struct_equality_helper() {
    let hlsl = body_only("struct S {int a;}; void foo() { S a, b; bool x = a == b; }");
    assert!(hlsl.starts_with("struct typ_0_0\n{\nint fld_a;\n};\n"));
    assert!(hlsl.contains("bool eq_typ_0_0(typ_0_0 val1,typ_0_0 val2)\n{\nreturn (val1.fld_a==val2.fld_a);\n}\n"));
    assert!(hlsl.contains("bool var_1_4=eq_typ_0_0(var_1_2,var_1_3);"));
}

#[test]
fn test_struct_inequality_negates_helper() {
    let hlsl = body_only("struct S {vec2 a; int b;}; void foo() { S a, b; bool x = a != b; }");
    assert!(hlsl.contains("return (all((val1.fld_a==val2.fld_a))&&(val1.fld_b==val2.fld_b));"));
    assert!(hlsl.contains("bool var_1_4=(!eq_typ_0_0(var_1_2,var_1_3));"));
}

#[test]
fn test_nested_struct_helpers() {
    let hlsl = body_only("struct A {float x;}; struct B {A a;}; \
                          void foo() { B b = B(A(1.0)); bool e = b == b; }");
    let inner = hlsl.find("struct typ_0_0").expect("inner struct");
    let outer = hlsl.find("struct typ_0_1").expect("outer struct");
    assert!(inner < outer);
    let inner_eq = hlsl.find("bool eq_typ_0_0(").expect("inner helper");
    let outer_eq = hlsl.find("bool eq_typ_0_1(").expect("outer helper");
    assert!(inner_eq < outer_eq);
    assert!(hlsl.contains("return eq_typ_0_0(val1.fld_a,val2.fld_a);"));
    assert!(hlsl.contains("typ_0_1 ctor_typ_0_1(typ_0_0 fld_a)\n{\ntyp_0_1 ret;\nret.fld_a=fld_a;\nreturn ret;\n}\n"));
    assert!(hlsl.contains("typ_0_1 var_1_3=ctor_typ_0_1(ctor_typ_0_0(1.000000e+000));"));
}

#[test]
fn test_unused_struct_not_declared() {
    let hlsl = body_only("struct S {int a;}; void foo() { }");
    assert!(!hlsl.contains("struct"));
}

#[test]
fn test_uniform_registers() {
    let (shader, hlsl) = transpile_source("uniform mat4 m; uniform vec4 v[2]; uniform float f;\n\
                                           void main() { gl_Position = v[0] * f; }",
                                          ShaderStage::Vertex,
                                          TranslateOptions::DISABLE_WRITE_INPUTS);
    assert!(hlsl.contains("uniform row_major float4x4 var_0_0 : register(c0);"));
    assert!(hlsl.contains("uniform float4 var_0_1[2] : register(c4);"));
    assert!(hlsl.contains("uniform float var_0_2 : register(c6);"));
    let registers = shader.bindings.iter().map(|b| b.register.as_str()).collect::<Vec<_>>();
    assert_eq!(registers, ["c0", "c4", "c6"]);
    assert_eq!(shader.bindings[1].binding_type,
               BindingType::Array(Box::new(BindingType::FloatVector(4)), 2));
}

#[test]
fn test_sampler_registers() {
    let (shader, hlsl) = transpile_source("precision mediump float;\n\
                                           uniform sampler2D a[2]; uniform samplerCube b;\n\
                                           void main() { gl_FragColor = textureCube(b, vec3(0.0)); }",
                                          ShaderStage::Fragment,
                                          TranslateOptions::DISABLE_BOILERPLATE);
    assert!(hlsl.contains("Texture2D tex_var_0_0[2] : register(t0);"));
    assert!(hlsl.contains("SamplerState smp_var_0_0[2] : register(s0);"));
    assert!(hlsl.contains("TextureCube tex_var_0_1 : register(t2);"));
    assert!(hlsl.contains("SamplerState smp_var_0_1 : register(s2);"));
    assert!(hlsl.contains("gl_FragColor=GLSLtextureCube(tex_var_0_1,smp_var_0_1,(float3)0.000000e+000);"));
    assert!(hlsl.contains("float4 GLSLtextureCube(TextureCube t,SamplerState s,float3 c)"));
    assert!(!hlsl.contains("GLSLmod"));
    assert_eq!(shader.bindings.iter().map(|b| b.register.as_str()).collect::<Vec<_>>(),
               ["s0", "s2"]);
}

#[test]
fn test_deferred_global_initializer() {
    let hlsl = body_only("uniform float u; float g = u * 2.0; const float c = 3.0; float h = c;\n\
                          void main() { gl_Position = vec4(g + h); }");
    assert!(hlsl.contains("static float var_0_1=0.000000e+000;\n"));
    assert!(hlsl.contains("static const float var_0_2=3.000000e+000;\n"));
    assert!(hlsl.contains("static float var_0_3=var_0_2;\n"));
    let prototype = hlsl.find("void initializeGlobals();").expect("prototype");
    let user = hlsl.find("uniform float var_0_0").expect("uniform");
    assert!(prototype < user);
    assert!(hlsl.contains("void fn_0_4()\n{\ninitializeGlobals();\n"));
    assert!(hlsl.ends_with("void initializeGlobals()\n{\nvar_0_1=(var_0_0*2.000000e+000);\n}\n"));
}

#[test]
fn test_no_function_definitions_keeps_initializers_inline() {
    let hlsl = body_only("uniform float u; float g = u > 0.0 ? u : 1.0;");
    assert!(hlsl.contains("static float var_0_1=((var_0_0>0.000000e+000)?var_0_0:1.000000e+000);"));
    assert!(!hlsl.contains("initializeGlobals"));
}

#[test]
fn test_whole_preamble() {
    let (_, hlsl) = transpile_source("void main() { }", ShaderStage::Vertex, TranslateOptions::empty());
    assert!(hlsl.starts_with("float GLSLmod(float x,float y)\n"));
    assert!(hlsl.contains("float4 GLSLtexture2DLod("));
    assert!(!hlsl.contains("GLSLfwidth"));
}

#[test]
fn test_vector_from_matrix_call_evaluated_once() {
    let (_, hlsl) = transpile_source("float c; mat2 g() { c += 1.0; return mat2(c); }\n\
                                      void foo() { vec4 v = vec4(g()); mat2 m; vec4 w = vec4(m); }",
                                     ShaderStage::Vertex,
                                     TranslateOptions::DISABLE_WRITE_INPUTS | TranslateOptions::DISABLE_BOILERPLATE);
    assert!(hlsl.contains("float4 var_1_3=GLSLvec4FromMat2(fn_0_1());"));
    assert!(hlsl.contains("float4 GLSLvec4FromMat2(float2x2 m)\n{\nreturn float4(m._m00,m._m01,m._m10,m._m11);\n}\n"));
    assert!(!hlsl.contains("fn_0_1()._m"));
    assert!(hlsl.contains("float4 var_1_5=float4(var_1_4._m00,var_1_4._m01,var_1_4._m10,var_1_4._m11);"));
}
