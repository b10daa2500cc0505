use std::error;
use std::fmt;
use std::collections::HashMap;
use std::collections::HashSet;
use glt_shared::*;
use glt_lang_etk::{RESERVED_WORDS, TYPE_KEYWORDS};
use glt_lang_est as ast;
use glt_lang_eir as ir;
use glt_lang_eir::{Type, ScalarType, Constant, ScalarConstant, Precision, ParamQualifier};
use glt_lang_eir::{VariableId, FunctionId, StructId, VariableQualifier, BuiltinVariable};
use glt_lang_eir::globals_analysis::GlobalUsage;
use super::expressions::parse_expr;
use super::loops::parse_for;

/// A verification failure at a point in the source
#[derive(PartialEq, Debug, Clone)]
pub struct TyperError {
    pub code: ErrorCode,
    pub location: FileLocation,
    pub message: String,
}

impl TyperError {
    pub fn new(code: ErrorCode, location: FileLocation, message: String) -> TyperError {
        TyperError {
            code,
            location,
            message,
        }
    }

    pub fn get_code(&self) -> ErrorCode {
        self.code
    }

    pub fn get_location(&self) -> FileLocation {
        self.location
    }
}

impl error::Error for TyperError {}

impl fmt::Display for TyperError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub type TyperResult<T> = Result<T, TyperError>;

pub fn fail<T>(code: ErrorCode, location: FileLocation, message: String) -> TyperResult<T> {
    Err(TyperError::new(code, location, message))
}

/// What a name resolves to in a scope
#[derive(PartialEq, Debug, Clone)]
pub enum Symbol {
    Variable(VariableId),
    Struct(StructId),
    /// Every overload declared with the name
    Functions(Vec<FunctionId>),
}

struct Scope {
    symbols: HashMap<String, Symbol>,
    float_precision: Option<Precision>,
    int_precision: Option<Precision>,
}

impl Scope {
    fn new() -> Scope {
        Scope {
            symbols: HashMap::new(),
            float_precision: None,
            int_precision: None,
        }
    }
}

/// Verification state for one shader
pub struct Context<'e> {
    pub stage: ShaderStage,
    pub extensions: &'e ExtensionState,
    pub limits: &'e Limits,
    pub feature_level: FeatureLevel,
    pub table: ir::IdentifierTable,
    scopes: Vec<Scope>,
    errors: Vec<TyperError>,
    pub return_type: Option<Type>,
    pub loop_depth: u32,
    pub loop_indices: Vec<VariableId>,
    pub statement_depth: u32,
    pub expression_depth: u32,
    pub static_uses: Vec<VariableId>,
    pub builtin_uses: Vec<BuiltinVariable>,
    pub calls: Vec<(FunctionId, FileLocation)>,
    pub uniform_registers: u32,
    pub sampler_units: u32,
    pub attribute_registers: u32,
    pub varying_registers: u32,
    /// Resource limits already reported
    exceeded_limits: Vec<ErrorCode>,
    /// Constants whose value was folded through a ternary or struct field
    pub indirect_constants: HashSet<VariableId>,
    main: Option<FunctionId>,
}

impl<'e> Context<'e> {
    fn new(stage: ShaderStage,
           extensions: &'e ExtensionState,
           limits: &'e Limits,
           feature_level: FeatureLevel)
           -> Context<'e> {
        let mut global = Scope::new();
        match stage {
            ShaderStage::Vertex => {
                global.float_precision = Some(Precision::High);
                global.int_precision = Some(Precision::High);
            }
            ShaderStage::Fragment => {
                global.int_precision = Some(Precision::Medium);
            }
        }
        Context {
            stage,
            extensions,
            limits,
            feature_level,
            table: ir::IdentifierTable::new(),
            scopes: vec![global],
            errors: vec![],
            return_type: None,
            loop_depth: 0,
            loop_indices: vec![],
            statement_depth: 0,
            expression_depth: 0,
            static_uses: vec![],
            builtin_uses: vec![],
            calls: vec![],
            uniform_registers: 0,
            sampler_units: 0,
            attribute_registers: 0,
            varying_registers: 0,
            exceeded_limits: vec![],
            indirect_constants: HashSet::new(),
            main: None,
        }
    }

    /// Fail with a resource limit error. Each limit is reported once.
    pub fn exceed_limit(&mut self, code: ErrorCode, location: FileLocation, message: String) -> TyperResult<()> {
        if self.exceeded_limits.contains(&code) {
            return Ok(());
        }
        self.exceeded_limits.push(code);
        fail(code, location, message)
    }

    /// Nesting level of the current scope, 0 for global
    pub fn depth(&self) -> u32 {
        self.scopes.len() as u32 - 1
    }

    /// Run a parse inside a new scope. The scope is left even on failure.
    pub fn with_scope<T, F>(&mut self, f: F) -> TyperResult<T>
        where F: FnOnce(&mut Context<'e>) -> TyperResult<T>
    {
        self.scopes.push(Scope::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    pub fn find_symbol(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.symbols.get(name))
    }

    fn is_declared_in_scope(&self, name: &str) -> bool {
        match self.scopes.last() {
            Some(scope) => scope.symbols.contains_key(name),
            None => false,
        }
    }

    fn declare(&mut self, name: String, symbol: Symbol) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.symbols.insert(name, symbol);
        }
    }

    fn add_overload(&mut self, name: &str, id: FunctionId) {
        let global = &mut self.scopes[0].symbols;
        match global.get_mut(name) {
            Some(&mut Symbol::Functions(ref mut ids)) => ids.push(id),
            _ => {
                global.insert(name.to_string(), Symbol::Functions(vec![id]));
            }
        }
    }

    fn default_precision(&self, ty: &Type) -> Option<Precision> {
        if ty.is_float_family() {
            self.scopes.iter().rev().find_map(|scope| scope.float_precision)
        } else if ty.is_int_family() {
            self.scopes.iter().rev().find_map(|scope| scope.int_precision)
        } else {
            None
        }
    }

    fn set_default_precision(&mut self, ty: ScalarType, precision: Precision) {
        if let Some(scope) = self.scopes.last_mut() {
            match ty {
                ScalarType::Float => scope.float_precision = Some(precision),
                _ => scope.int_precision = Some(precision),
            }
        }
    }

    pub fn report(&mut self, error: TyperError) {
        self.errors.push(error);
    }

    pub fn type_name(&self, ty: &Type) -> String {
        self.table.get_type_name(ty)
    }
}

/// Reject names reserved by the language or by the translator
pub fn check_identifier(name: &Located<String>) -> TyperResult<()> {
    let reserved_prefix = name.starts_with("gl_") || name.starts_with("webgl_") ||
                          name.starts_with("_webgl_");
    if reserved_prefix || name.contains("__") || RESERVED_WORDS.contains(&name.as_str()) ||
       TYPE_KEYWORDS.contains(&name.as_str()) {
        return fail(ErrorCode::InvalidIdentifierName,
                    name.location,
                    format!("'{}' is a reserved name", name.node));
    }
    Ok(())
}

/// Resolve a type and the precision it is declared with
pub fn parse_typename(typename: &ast::TypeName,
                      ctx: &mut Context)
                      -> TyperResult<(Type, Option<Precision>)> {
    let location = typename.specifier.location;
    let ty = match typename.specifier.node {
        ast::TypeSpecifier::Named(ref name) => {
            match Type::from_keyword(name) {
                Some(ty) => ty,
                None => {
                    match ctx.find_symbol(name) {
                        Some(&Symbol::Struct(id)) => Type::Struct(id),
                        _ => return fail(ErrorCode::SyntaxError,
                                         location,
                                         format!("'{}' is not a type", name)),
                    }
                }
            }
        }
        ast::TypeSpecifier::Struct(ref definition) => {
            Type::Struct(parse_struct_definition(definition, location, ctx)?)
        }
    };
    let precision = match typename.precision {
        Some(precision) => {
            match ty {
                Type::Void => {
                    return fail(ErrorCode::PrecisionNotAllowedForType,
                                location,
                                "precision can not be used with void".to_string())
                }
                Type::Struct(_) => {
                    return fail(ErrorCode::PrecisionSpecifiedForStruct,
                                location,
                                "precision can not be used with structs".to_string())
                }
                _ if ty.is_bool_family() => {
                    return fail(ErrorCode::PrecisionNotAllowedForType,
                                location,
                                format!("precision can not be used with {}", ctx.type_name(&ty)))
                }
                _ => Some(precision),
            }
        }
        None => ctx.default_precision(&ty),
    };
    if ty.is_float_family() && precision.is_none() {
        return fail(ErrorCode::NoPrecisionSpecified,
                    location,
                    format!("no precision specified for {}", ctx.type_name(&ty)));
    }
    Ok((ty, precision))
}

fn parse_array_size(dim: &Located<ast::Expression>, ctx: &mut Context) -> TyperResult<u32> {
    let size = parse_expr(dim, ctx)?;
    match size.value {
        Some(Constant::Scalar(ScalarConstant::Int(n))) if n <= 0 => {
            fail(ErrorCode::ArraySizeLEQZero,
                 dim.location,
                 format!("array size must be greater than zero but is {}", n))
        }
        Some(Constant::Scalar(ScalarConstant::Int(n))) => Ok(n as u32),
        _ => {
            fail(ErrorCode::ArrayDeclaratorNotConst,
                 dim.location,
                 "array size must be a constant integer expression".to_string())
        }
    }
}

pub fn apply_array_dim(ty: Type,
                       dim: &Option<Located<ast::Expression>>,
                       ctx: &mut Context)
                       -> TyperResult<Type> {
    match *dim {
        Some(ref dim) => Ok(Type::Array(Box::new(ty), parse_array_size(dim, ctx)?)),
        None => Ok(ty),
    }
}

fn parse_struct_definition(definition: &ast::StructDefinition,
                           location: FileLocation,
                           ctx: &mut Context)
                           -> TyperResult<StructId> {
    if let Some(ref name) = definition.name {
        check_identifier(name)?;
        if ctx.is_declared_in_scope(name) {
            return fail(ErrorCode::IdentifierAlreadyDeclared,
                        name.location,
                        format!("'{}' is already declared", name.node));
        }
    }

    let mut members: Vec<ir::StructMember> = vec![];
    for member in &definition.members {
        let member_location = member.typename.specifier.location;
        let (ty, precision) = parse_typename(&member.typename, ctx)?;
        if ty.is_sampler() {
            return fail(ErrorCode::InvalidSamplerUsage,
                        member_location,
                        "samplers can not be struct members".to_string());
        }
        if ty == Type::Void {
            return fail(ErrorCode::IncompatibleTypes,
                        member_location,
                        "struct members can not be void".to_string());
        }
        for declarator in &member.declarators {
            check_identifier(&declarator.name)?;
            if members.iter().any(|m| m.name == *declarator.name) {
                return fail(ErrorCode::IdentifierAlreadyDeclared,
                            declarator.name.location,
                            format!("struct member '{}' is already declared", declarator.name.node));
            }
            let ty = apply_array_dim(ty.clone(), &declarator.array_dim, ctx)?;
            members.push(ir::StructMember {
                name: declarator.name.node.clone(),
                ty,
                precision,
            });
        }
    }

    let nesting = 1 + members.iter().map(|m| ctx.table.get_struct_nesting(&m.ty)).max().unwrap_or(0);
    if nesting > ctx.limits.max_struct_nesting {
        return fail(ErrorCode::MaxStructNestingExceeded,
                    location,
                    format!("struct nesting of {} exceeds the limit of {}",
                            nesting,
                            ctx.limits.max_struct_nesting));
    }

    let id = ctx.table.add_struct(ir::StructInfo {
        name: definition.name.as_ref().map(|name| name.node.clone()),
        members,
        depth: ctx.depth(),
        location,
    });
    if let Some(ref name) = definition.name {
        ctx.declare(name.node.clone(), Symbol::Struct(id));
    }
    Ok(id)
}

fn qualifier_name(qualifier: ast::TypeQualifier) -> &'static str {
    match qualifier {
        ast::TypeQualifier::Const => "const",
        ast::TypeQualifier::Attribute => "attribute",
        ast::TypeQualifier::Varying => "varying",
        ast::TypeQualifier::InvariantVarying => "invariant varying",
        ast::TypeQualifier::Uniform => "uniform",
    }
}

fn variable_qualifier(qualifier: Option<ast::TypeQualifier>) -> VariableQualifier {
    match qualifier {
        None => VariableQualifier::None,
        Some(ast::TypeQualifier::Const) => VariableQualifier::Const,
        Some(ast::TypeQualifier::Attribute) => VariableQualifier::Attribute,
        Some(ast::TypeQualifier::Varying) |
        Some(ast::TypeQualifier::InvariantVarying) => VariableQualifier::Varying,
        Some(ast::TypeQualifier::Uniform) => VariableQualifier::Uniform,
    }
}

fn is_storage_qualifier(qualifier: Option<ast::TypeQualifier>) -> bool {
    matches!(qualifier,
             Some(ast::TypeQualifier::Attribute) | Some(ast::TypeQualifier::Varying) |
             Some(ast::TypeQualifier::InvariantVarying) | Some(ast::TypeQualifier::Uniform))
}

fn check_qualifier_scope(qualifier: &Located<ast::TypeQualifier>, ctx: &Context) -> TyperResult<()> {
    match qualifier.node {
        ast::TypeQualifier::Const => Ok(()),
        q if ctx.depth() > 0 => {
            fail(ErrorCode::InvalidQualifierInScope,
                 qualifier.location,
                 format!("'{}' is only allowed at global scope", qualifier_name(q)))
        }
        ast::TypeQualifier::Attribute if ctx.stage == ShaderStage::Fragment => {
            fail(ErrorCode::InvalidQualifierInScope,
                 qualifier.location,
                 "attributes are not allowed in fragment shaders".to_string())
        }
        _ => Ok(()),
    }
}

fn check_qualifier_type(qualifier: Option<ast::TypeQualifier>,
                        ty: &Type,
                        location: FileLocation,
                        ctx: &Context)
                        -> TyperResult<()> {
    if *ty.base_type() == Type::Void {
        return fail(ErrorCode::IncompatibleTypes,
                    location,
                    "variables can not be void".to_string());
    }
    if ty.is_sampler() && qualifier != Some(ast::TypeQualifier::Uniform) {
        return fail(ErrorCode::InvalidSamplerUsage,
                    location,
                    "samplers must be uniforms".to_string());
    }
    let valid = match qualifier {
        Some(ast::TypeQualifier::Attribute) => !ty.is_array() && ty.is_float_family(),
        Some(ast::TypeQualifier::Varying) |
        Some(ast::TypeQualifier::InvariantVarying) => ty.is_float_family(),
        _ => true,
    };
    match (valid, qualifier) {
        (false, Some(qualifier)) => {
            fail(ErrorCode::InvalidQualifierForType,
                 location,
                 format!("'{}' can not be used with {}",
                         qualifier_name(qualifier),
                         ctx.type_name(ty)))
        }
        _ => Ok(()),
    }
}

fn reserve_uniform(ty: &Type, location: FileLocation, ctx: &mut Context) -> TyperResult<()> {
    if ty.is_sampler() {
        ctx.sampler_units += match *ty {
            Type::Array(_, size) => size,
            _ => 1,
        };
        let limit = ctx.limits.max_samplers(ctx.stage);
        if ctx.sampler_units > limit {
            return ctx.exceed_limit(ErrorCode::MaxSamplerExceeded,
                                    location,
                                    format!("more than {} samplers used", limit));
        }
    } else {
        ctx.uniform_registers += ctx.table.get_register_count(ty);
        let limit = ctx.limits.max_uniform_vectors(ctx.stage);
        if ctx.uniform_registers > limit {
            return ctx.exceed_limit(ErrorCode::MaxUniformExceeded,
                                    location,
                                    format!("more than {} uniform vectors used", limit));
        }
    }
    Ok(())
}

/// A declared variable with the folded value of its initializer
pub struct DeclaredVariable {
    pub def: ir::VarDef,
    pub value: Option<Constant>,
    pub indirect: bool,
}

fn parse_declarator(declarator: &ast::Declarator,
                    qualifier: Option<ast::TypeQualifier>,
                    base: &Type,
                    precision: Option<Precision>,
                    ctx: &mut Context)
                    -> TyperResult<DeclaredVariable> {
    let name = &declarator.name;
    check_identifier(name)?;
    let ty = apply_array_dim(base.clone(), &declarator.array_dim, ctx)?;
    check_qualifier_type(qualifier, &ty, name.location, ctx)?;

    let init = match declarator.initializer {
        Some(ref init) => {
            if is_storage_qualifier(qualifier) || ty.is_array() {
                return fail(ErrorCode::InitializerNotAllowed,
                            init.location,
                            format!("'{}' can not have an initializer", name.node));
            }
            let typed = parse_expr(init, ctx)?;
            if typed.ty != ty {
                return fail(ErrorCode::IncompatibleTypes,
                            init.location,
                            format!("can not initialize {} with {}",
                                    ctx.type_name(&ty),
                                    ctx.type_name(&typed.ty)));
            }
            Some(typed)
        }
        None => None,
    };

    let is_const = qualifier == Some(ast::TypeQualifier::Const);
    let value = init.as_ref().and_then(|init| init.value.clone());
    if is_const {
        match init {
            None => {
                return fail(ErrorCode::ConstRequiresInitialization,
                            name.location,
                            format!("const '{}' must be initialized", name.node))
            }
            Some(_) if value.is_none() => {
                return fail(ErrorCode::ConstInitializerNotConst,
                            name.location,
                            format!("initializer of const '{}' is not a constant expression",
                                    name.node))
            }
            Some(_) => {}
        }
    }

    if ctx.is_declared_in_scope(name) {
        return fail(ErrorCode::IdentifierAlreadyDeclared,
                    name.location,
                    format!("'{}' is already declared", name.node));
    }
    let reserved = if qualifier == Some(ast::TypeQualifier::Uniform) {
        reserve_uniform(&ty, name.location, ctx)
    } else {
        Ok(())
    };

    let indirect = init.as_ref().map_or(false, |init| init.indirect);
    let id = ctx.table.add_variable(ir::VariableInfo {
        name: name.node.clone(),
        ty,
        qualifier: variable_qualifier(qualifier),
        precision,
        value: if is_const { value.clone() } else { None },
        depth: ctx.depth(),
        invariant: qualifier == Some(ast::TypeQualifier::InvariantVarying),
        location: name.location,
    });
    ctx.declare(name.node.clone(), Symbol::Variable(id));
    if is_const && indirect {
        ctx.indirect_constants.insert(id);
    }
    // Over the limit is still declared so later uses resolve
    reserved?;

    Ok(DeclaredVariable {
        def: ir::VarDef {
            id,
            init: init.map(|init| init.expr),
            constant_init: value.is_some(),
        },
        value,
        indirect,
    })
}

pub fn parse_declaration_variables(declaration: &ast::Declaration,
                                   ctx: &mut Context)
                                   -> TyperResult<Vec<DeclaredVariable>> {
    let qualifier = match declaration.qualifier {
        Some(ref qualifier) => {
            check_qualifier_scope(qualifier, ctx)?;
            Some(qualifier.node)
        }
        None => None,
    };
    let (base, precision) = parse_typename(&declaration.typename, ctx)?;
    let mut variables = vec![];
    for declarator in &declaration.declarators {
        variables.push(parse_declarator(declarator, qualifier, &base, precision, ctx)?);
    }
    Ok(variables)
}

fn parse_declaration(declaration: &ast::Declaration,
                     ctx: &mut Context)
                     -> TyperResult<Vec<ir::VarDef>> {
    let variables = parse_declaration_variables(declaration, ctx)?;
    Ok(variables.into_iter().map(|variable| variable.def).collect())
}

fn parse_precision(declaration: &ast::PrecisionDeclaration, ctx: &mut Context) -> TyperResult<()> {
    match declaration.typename.as_str() {
        "float" => ctx.set_default_precision(ScalarType::Float, declaration.precision),
        "int" => ctx.set_default_precision(ScalarType::Int, declaration.precision),
        "sampler2D" | "samplerCube" => {}
        name => {
            return fail(ErrorCode::PrecisionNotAllowedForType,
                        declaration.typename.location,
                        format!("default precision can not be set for '{}'", name))
        }
    }
    Ok(())
}

fn parse_invariant(names: &[Located<String>],
                   location: FileLocation,
                   ctx: &mut Context)
                   -> TyperResult<()> {
    if ctx.depth() > 0 {
        return fail(ErrorCode::InvalidInvariant,
                    location,
                    "invariant is only allowed at global scope".to_string());
    }
    for name in names {
        match BuiltinVariable::from_name(name) {
            Some(BuiltinVariable::Position) |
            Some(BuiltinVariable::PointSize) if ctx.stage == ShaderStage::Vertex => continue,
            Some(_) => {
                return fail(ErrorCode::InvalidInvariant,
                            name.location,
                            format!("'{}' can not be invariant", name.node))
            }
            None => {}
        }
        let id = match ctx.find_symbol(name) {
            Some(&Symbol::Variable(id)) => id,
            Some(_) => {
                return fail(ErrorCode::InvalidInvariant,
                            name.location,
                            format!("'{}' can not be invariant", name.node))
            }
            None => {
                return fail(ErrorCode::UndeclaredIdentifier,
                            name.location,
                            format!("undeclared identifier '{}'", name.node))
            }
        };
        if ctx.table.variable(id).qualifier != VariableQualifier::Varying {
            return fail(ErrorCode::InvalidInvariant,
                        name.location,
                        format!("'{}' is not a varying", name.node));
        }
        ctx.table.variable_mut(id).invariant = true;
    }
    Ok(())
}

fn parse_param(param: &ast::FunctionParam,
               ctx: &mut Context)
               -> TyperResult<(ir::ParamInfo, Option<Precision>)> {
    let (ty, precision) = parse_typename(&param.typename, ctx)?;
    let ty = apply_array_dim(ty, &param.array_dim, ctx)?;
    if let Some(ref name) = param.name {
        check_identifier(name)?;
    }
    if *ty.base_type() == Type::Void {
        return fail(ErrorCode::IncompatibleTypes,
                    param.location,
                    "parameters can not be void".to_string());
    }
    let qualifier = param.qualifier.unwrap_or(ParamQualifier::In);
    if qualifier != ParamQualifier::In {
        if ty.is_sampler() {
            return fail(ErrorCode::InvalidSamplerUsage,
                        param.location,
                        "samplers can only be in parameters".to_string());
        }
        if param.is_const {
            return fail(ErrorCode::InvalidQualifierForType,
                        param.location,
                        "const can only be used with in parameters".to_string());
        }
    }
    Ok((ir::ParamInfo {
            ty,
            qualifier,
            is_const: param.is_const,
        },
        precision))
}

fn param_qualifier(param: &ir::ParamInfo) -> VariableQualifier {
    match param.qualifier {
        ParamQualifier::In if param.is_const => VariableQualifier::ParamConstIn,
        ParamQualifier::In => VariableQualifier::ParamIn,
        ParamQualifier::Out => VariableQualifier::ParamOut,
        ParamQualifier::InOut => VariableQualifier::ParamInOut,
    }
}

fn parse_function_prototype(prototype: &ast::FunctionPrototype,
                            is_definition: bool,
                            location: FileLocation,
                            ctx: &mut Context)
                            -> TyperResult<(FunctionId, Vec<Option<Precision>>)> {
    let name = &prototype.name;
    check_identifier(name)?;
    let (returntype, _) = parse_typename(&prototype.returntype, ctx)?;
    let mut params = vec![];
    let mut precisions = vec![];
    for param in &prototype.params {
        let (info, precision) = parse_param(param, ctx)?;
        params.push(info);
        precisions.push(precision);
    }

    if name.node == "main" && (returntype != Type::Void || !params.is_empty()) {
        return fail(ErrorCode::InvalidMainSignature,
                    name.location,
                    "main must be declared as void main()".to_string());
    }

    let param_types = params.iter().map(|param| param.ty.clone()).collect::<Vec<_>>();
    if let Some((intrinsic, ty)) = ir::resolve_intrinsic(name, &param_types) {
        if intrinsic.is_available(ctx.stage, ctx.extensions) {
            let code = if ty == returntype {
                ErrorCode::KnownFunctionDeclaredOrDefined
            } else {
                ErrorCode::FuncOverloadOnReturnType
            };
            return fail(code, name.location, format!("'{}' is a built in function", name.node));
        }
    }

    let existing = match ctx.scopes[0].symbols.get(&name.node) {
        Some(&Symbol::Functions(ref ids)) => {
            ids.iter().cloned().find(|id| {
                let info = ctx.table.function(*id);
                info.params.len() == params.len() &&
                info.params.iter().zip(&params).all(|(a, b)| a.ty == b.ty)
            })
        }
        Some(_) => {
            return fail(ErrorCode::IdentifierAlreadyDeclared,
                        name.location,
                        format!("'{}' is already declared", name.node))
        }
        None => None,
    };

    if let Some(id) = existing {
        let info = ctx.table.function(id);
        if info.params.iter().zip(&params).any(|(a, b)| a.qualifier != b.qualifier || a.is_const != b.is_const) {
            return fail(ErrorCode::FunctionMismatchedQualifiers,
                        name.location,
                        format!("parameter qualifiers of '{}' do not match its declaration",
                                name.node));
        }
        if info.returntype != returntype {
            return fail(ErrorCode::FuncOverloadOnReturnType,
                        name.location,
                        format!("'{}' differs from its declaration only by return type",
                                name.node));
        }
        if !is_definition {
            return fail(ErrorCode::FunctionRedeclaration,
                        name.location,
                        format!("'{}' is already declared", name.node));
        }
        if info.defined {
            return fail(ErrorCode::FunctionRedefinition,
                        name.location,
                        format!("'{}' is already defined", name.node));
        }
        let info = ctx.table.function_mut(id);
        info.defined = true;
        info.location = location;
        return Ok((id, precisions));
    }

    let id = ctx.table.add_function(ir::FunctionInfo {
        name: name.node.clone(),
        returntype,
        params,
        defined: is_definition,
        location,
    });
    ctx.add_overload(name, id);
    Ok((id, precisions))
}

fn parse_function_definition(definition: &ast::FunctionDefinition,
                             location: FileLocation,
                             ctx: &mut Context)
                             -> TyperResult<ir::FunctionDefinition> {
    let (id, precisions) = parse_function_prototype(&definition.prototype, true, location, ctx)?;
    if definition.prototype.name.node == "main" {
        ctx.main = Some(id);
    }
    let infos = ctx.table.function(id).params.clone();
    let returntype = ctx.table.function(id).returntype.clone();
    ctx.with_scope(|ctx| {
        let mut params = vec![];
        let declared = definition.prototype.params.iter().zip(infos).zip(precisions);
        for ((param, info), precision) in declared {
            let name = match param.name {
                Some(ref name) => name,
                None => {
                    params.push(None);
                    continue;
                }
            };
            if ctx.is_declared_in_scope(name) {
                return fail(ErrorCode::IdentifierAlreadyDeclared,
                            name.location,
                            format!("parameter '{}' is already declared", name.node));
            }
            let qualifier = param_qualifier(&info);
            let var = ctx.table.add_variable(ir::VariableInfo {
                name: name.node.clone(),
                ty: info.ty,
                qualifier,
                precision,
                value: None,
                depth: ctx.depth(),
                invariant: false,
                location: name.location,
            });
            ctx.declare(name.node.clone(), Symbol::Variable(var));
            params.push(Some(var));
        }
        ctx.return_type = Some(returntype);
        let body = parse_statement_list(&definition.body, ctx);
        ctx.return_type = None;
        Ok(ir::FunctionDefinition { id, params, body })
    })
}

fn parse_bool_condition(expr: &Located<ast::Expression>,
                        ctx: &mut Context)
                        -> TyperResult<ir::Expression> {
    let cond = parse_expr(expr, ctx)?;
    if cond.ty != Type::bool() {
        return fail(ErrorCode::IncompatibleTypes,
                    expr.location,
                    format!("condition must be bool but is {}", ctx.type_name(&cond.ty)));
    }
    Ok(cond.expr)
}

fn parse_condition(condition: &ast::Condition, ctx: &mut Context) -> TyperResult<ir::Condition> {
    match *condition {
        ast::Condition::Expr(ref expr) => Ok(ir::Condition::Expr(parse_bool_condition(expr, ctx)?)),
        ast::Condition::Assignment(ref typename, ref name, ref init) => {
            let (ty, precision) = parse_typename(typename, ctx)?;
            if ty != Type::bool() {
                return fail(ErrorCode::IncompatibleTypes,
                            name.location,
                            format!("condition must be bool but is {}", ctx.type_name(&ty)));
            }
            let declarator = ast::Declarator {
                name: name.clone(),
                array_dim: None,
                initializer: Some(init.clone()),
            };
            Ok(ir::Condition::Assignment(parse_declarator(&declarator, None, &ty, precision, ctx)?.def))
        }
    }
}

/// Parse a statement list in the current scope, reporting failed statements
/// and carrying on with the next one
pub fn parse_statement_list(statements: &[Located<ast::Statement>],
                            ctx: &mut Context)
                            -> Vec<ir::Statement> {
    let mut parsed = vec![];
    for statement in statements {
        match parse_statement(statement, ctx) {
            Ok(Some(statement)) => parsed.push(statement),
            Ok(None) => {}
            Err(err) => ctx.report(err),
        }
    }
    parsed
}

/// Parse the body of a control statement in the current scope. A block body
/// shares the scope instead of opening another.
pub fn parse_body(statement: &Located<ast::Statement>,
                  ctx: &mut Context)
                  -> TyperResult<ir::Statement> {
    match statement.node {
        ast::Statement::Block(ref statements) => {
            Ok(ir::Statement::Block(parse_statement_list(statements, ctx)))
        }
        _ => Ok(parse_statement(statement, ctx)?.unwrap_or(ir::Statement::Block(vec![]))),
    }
}

fn parse_loop_body(statement: &Located<ast::Statement>,
                   ctx: &mut Context)
                   -> TyperResult<ir::Statement> {
    ctx.loop_depth += 1;
    let body = parse_body(statement, ctx);
    ctx.loop_depth -= 1;
    body
}

fn parse_statement(statement: &Located<ast::Statement>,
                   ctx: &mut Context)
                   -> TyperResult<Option<ir::Statement>> {
    ctx.statement_depth += 1;
    let result = if ctx.statement_depth > ctx.limits.max_statement_depth {
        fail(ErrorCode::ShaderComplexity,
             statement.location,
             "statements are nested too deeply".to_string())
    } else {
        parse_statement_inner(statement, ctx)
    };
    ctx.statement_depth -= 1;
    result
}

fn parse_statement_inner(statement: &Located<ast::Statement>,
                         ctx: &mut Context)
                         -> TyperResult<Option<ir::Statement>> {
    let location = statement.location;
    match statement.node {
        ast::Statement::Empty => Ok(None),
        ast::Statement::Expression(ref expr) => {
            Ok(Some(ir::Statement::Expression(parse_expr(expr, ctx)?.expr)))
        }
        ast::Statement::Declaration(ref declaration) => {
            let defs = parse_declaration(declaration, ctx)?;
            Ok(if defs.is_empty() { None } else { Some(ir::Statement::Var(defs)) })
        }
        ast::Statement::Precision(ref declaration) => {
            parse_precision(declaration, ctx)?;
            Ok(None)
        }
        ast::Statement::Invariant(ref names) => {
            parse_invariant(names, location, ctx)?;
            Ok(None)
        }
        ast::Statement::Block(ref statements) => {
            ctx.with_scope(|ctx| Ok(Some(ir::Statement::Block(parse_statement_list(statements, ctx)))))
        }
        ast::Statement::If(ref cond, ref then_branch, ref else_branch) => {
            let cond = parse_bool_condition(cond, ctx)?;
            let then_branch = ctx.with_scope(|ctx| parse_body(then_branch, ctx))?;
            let else_branch = match *else_branch {
                Some(ref else_branch) => {
                    Some(Box::new(ctx.with_scope(|ctx| parse_body(else_branch, ctx))?))
                }
                None => None,
            };
            Ok(Some(ir::Statement::If(cond, Box::new(then_branch), else_branch)))
        }
        ast::Statement::For(ref init, ref cond, ref iteration, ref body) => {
            Ok(Some(parse_for(init, cond, iteration, body, location, ctx)?))
        }
        ast::Statement::While(ref cond, ref body) => {
            ctx.with_scope(|ctx| {
                let cond = parse_condition(cond, ctx)?;
                let body = parse_loop_body(body, ctx)?;
                Ok(Some(ir::Statement::While(cond, Box::new(body))))
            })
        }
        ast::Statement::DoWhile(ref body, ref cond) => {
            let body = ctx.with_scope(|ctx| parse_loop_body(body, ctx))?;
            let cond = parse_bool_condition(cond, ctx)?;
            Ok(Some(ir::Statement::DoWhile(Box::new(body), cond)))
        }
        ast::Statement::Break => {
            if ctx.loop_depth == 0 {
                return fail(ErrorCode::InvalidBreakLocation,
                            location,
                            "break must be inside a loop".to_string());
            }
            Ok(Some(ir::Statement::Break))
        }
        ast::Statement::Continue => {
            if ctx.loop_depth == 0 {
                return fail(ErrorCode::InvalidContinueLocation,
                            location,
                            "continue must be inside a loop".to_string());
            }
            Ok(Some(ir::Statement::Continue))
        }
        ast::Statement::Discard => {
            if ctx.stage != ShaderStage::Fragment {
                return fail(ErrorCode::InvalidDiscardLocation,
                            location,
                            "discard is only allowed in fragment shaders".to_string());
            }
            Ok(Some(ir::Statement::Discard))
        }
        ast::Statement::Return(ref value) => {
            let expected = ctx.return_type.clone().unwrap_or(Type::Void);
            match *value {
                None if expected == Type::Void => Ok(Some(ir::Statement::Return(None))),
                None => {
                    fail(ErrorCode::IncompatibleReturn,
                         location,
                         format!("function must return {}", ctx.type_name(&expected)))
                }
                Some(ref expr) => {
                    let typed = parse_expr(expr, ctx)?;
                    if expected == Type::Void || typed.ty != expected {
                        return fail(ErrorCode::IncompatibleReturn,
                                    expr.location,
                                    format!("can not return {} from a function returning {}",
                                            ctx.type_name(&typed.ty),
                                            ctx.type_name(&expected)));
                    }
                    Ok(Some(ir::Statement::Return(Some(typed.expr))))
                }
            }
        }
    }
}

fn parse_rootdefinition(root: &Located<ast::RootDefinition>,
                        ctx: &mut Context)
                        -> TyperResult<Option<ir::RootDefinition>> {
    match root.node {
        ast::RootDefinition::Declaration(ref declaration) => {
            let defs = parse_declaration(declaration, ctx)?;
            Ok(if defs.is_empty() { None } else { Some(ir::RootDefinition::GlobalVariable(defs)) })
        }
        ast::RootDefinition::Precision(ref declaration) => {
            parse_precision(declaration, ctx)?;
            Ok(None)
        }
        ast::RootDefinition::Invariant(ref names) => {
            parse_invariant(names, root.location, ctx)?;
            Ok(None)
        }
        ast::RootDefinition::FunctionPrototype(ref prototype) => {
            let (id, _) = parse_function_prototype(prototype, false, root.location, ctx)?;
            Ok(Some(ir::RootDefinition::FunctionPrototype(id)))
        }
        ast::RootDefinition::Function(ref definition) => {
            let definition = parse_function_definition(definition, root.location, ctx)?;
            Ok(Some(ir::RootDefinition::Function(definition)))
        }
    }
}

fn check_calls(ctx: &mut Context) {
    let calls = std::mem::take(&mut ctx.calls);
    let mut reported = HashSet::new();
    for (id, location) in calls {
        if !ctx.table.function(id).defined && reported.insert(id) {
            let message = format!("'{}' is called but never defined", ctx.table.function(id).name);
            ctx.report(TyperError::new(ErrorCode::FunctionNotDefined, location, message));
        }
    }
}

fn check_call_graph(root_definitions: &[ir::RootDefinition], ctx: &mut Context) {
    let usage = GlobalUsage::analyse(root_definitions);
    let recursive = usage.find_recursion();
    if !recursive.is_empty() {
        for id in recursive {
            let info = ctx.table.function(id);
            let message = format!("'{}' is recursive", info.name);
            let location = info.location;
            ctx.report(TyperError::new(ErrorCode::RecursionNotAllowed, location, message));
        }
        return;
    }
    let mut ids = usage.functions.keys().cloned().collect::<Vec<_>>();
    ids.sort();
    let deepest = ids.into_iter().map(|id| (usage.get_call_depth(id), id)).max_by_key(|&(depth, _)| depth);
    if let Some((depth, id)) = deepest {
        if depth > ctx.limits.max_function_depth {
            let location = ctx.table.function(id).location;
            let message = format!("call depth of {} exceeds the limit of {}",
                                  depth,
                                  ctx.limits.max_function_depth);
            ctx.report(TyperError::new(ErrorCode::MaxFunctionDepthExceeded, location, message));
        }
    }
}

/// Verify a parsed shader and build its typed tree. Every failure found is
/// returned in the order it was found.
pub fn typeparse(module: &ast::Module,
                 stage: ShaderStage,
                 extensions: &ExtensionState,
                 limits: &Limits,
                 feature_level: FeatureLevel)
                 -> Result<ir::Module, Vec<TyperError>> {
    let mut ctx = Context::new(stage, extensions, limits, feature_level);
    let mut root_definitions = vec![];
    for root in &module.root_definitions {
        match parse_rootdefinition(root, &mut ctx) {
            Ok(Some(root)) => root_definitions.push(root),
            Ok(None) => {}
            Err(err) => ctx.report(err),
        }
    }
    check_calls(&mut ctx);
    check_call_graph(&root_definitions, &mut ctx);

    if !ctx.errors.is_empty() {
        return Err(ctx.errors);
    }
    Ok(ir::Module {
        stage,
        table: ctx.table,
        root_definitions,
        static_uses: ctx.static_uses,
        builtin_uses: ctx.builtin_uses,
        main: ctx.main,
    })
}

#[cfg(test)]
pub fn verify_at_level(source: &str,
                       stage: ShaderStage,
                       feature_level: FeatureLevel)
                       -> Result<ir::Module, Vec<TyperError>> {
    use glt_transform_preprocess::preprocess;
    use glt_transform_lexer::lex;
    use glt_transform_etk_to_est::parse;
    let options = TranslateOptions::ENABLE_FRAG_DEPTH | TranslateOptions::ENABLE_STANDARD_DERIVATIVES;
    let extensions = ExtensionState::new(stage, options);
    let text = preprocess(source, stage, extensions).expect("preprocess failed");
    let tokens = lex(&text).expect("lex failed");
    let module = parse(&tokens.stream, 256).expect("parse failed");
    let limits = Limits::for_feature_level(feature_level);
    typeparse(&module, stage, text.extensions(), &limits, feature_level)
}

#[cfg(test)]
pub fn verify(source: &str, stage: ShaderStage) -> Result<ir::Module, Vec<TyperError>> {
    verify_at_level(source, stage, FeatureLevel::Level10_0)
}

#[cfg(test)]
pub fn error_codes(source: &str, stage: ShaderStage) -> Vec<ErrorCode> {
    match verify(source, stage) {
        Ok(_) => vec![],
        Err(errors) => errors.iter().map(|err| err.code).collect(),
    }
}

#[cfg(test)]
const FRAGMENT_HEADER: &str = "precision mediump float;\n";

#[cfg(test)]
pub fn fragment_errors(source: &str) -> Vec<ErrorCode> {
    error_codes(&format!("{}{}", FRAGMENT_HEADER, source), ShaderStage::Fragment)
}

#[test]
fn test_typeparse() {
    let module = verify("void foo() { int bar; }", ShaderStage::Vertex).expect("verify failed");
    assert_eq!(module.table.get_function_name(FunctionId(0)), "fn_0_0");
    assert_eq!(module.table.get_variable_name(VariableId(1)), "var_1_1");
    assert_eq!(module.root_definitions,
               vec![ir::RootDefinition::Function(ir::FunctionDefinition {
                        id: FunctionId(0),
                        params: vec![],
                        body: vec![ir::Statement::Var(vec![ir::VarDef {
                                                               id: VariableId(1),
                                                               init: None,
                                                               constant_init: false,
                                                           }])],
                    })]);
    assert_eq!(module.main, None);
}

#[test]
fn test_identifier_names() {
    let vs = ShaderStage::Vertex;
    assert_eq!(error_codes("float gl_x;", vs), vec![ErrorCode::InvalidIdentifierName]);
    assert_eq!(error_codes("float webgl_x;", vs), vec![ErrorCode::InvalidIdentifierName]);
    assert_eq!(error_codes("float a__b;", vs), vec![ErrorCode::InvalidIdentifierName]);
    assert_eq!(error_codes("float switch;", vs), vec![ErrorCode::InvalidIdentifierName]);
    assert_eq!(error_codes("float f; int f;", vs), vec![ErrorCode::IdentifierAlreadyDeclared]);
    assert_eq!(error_codes("float f; void f() {}", vs), vec![ErrorCode::IdentifierAlreadyDeclared]);
    assert_eq!(error_codes("void f() { float f; { float f; } }", vs), vec![]);
    assert_eq!(error_codes("void f() { g(); }", vs), vec![ErrorCode::UndeclaredIdentifier]);
}

#[test]
fn test_precision() {
    let fs = ShaderStage::Fragment;
    assert_eq!(error_codes("uniform vec4 c;", fs), vec![ErrorCode::NoPrecisionSpecified]);
    assert_eq!(error_codes("uniform mediump vec4 c; uniform int i;", fs), vec![]);
    assert_eq!(error_codes("void f() { precision highp float; float x; }", fs), vec![]);
    assert_eq!(error_codes("void f() { { precision highp float; } float x; }", fs),
               vec![ErrorCode::NoPrecisionSpecified]);
    assert_eq!(error_codes("precision lowp bool;", fs), vec![ErrorCode::PrecisionNotAllowedForType]);
    assert_eq!(error_codes("precision lowp sampler2D;", fs), vec![]);
    assert_eq!(error_codes("lowp bool b;", fs), vec![ErrorCode::PrecisionNotAllowedForType]);
    assert_eq!(error_codes("struct S { int a; }; lowp S s;", fs),
               vec![ErrorCode::PrecisionSpecifiedForStruct]);
    assert_eq!(error_codes("float f;", ShaderStage::Vertex), vec![]);
}

#[test]
fn test_qualifiers() {
    let vs = ShaderStage::Vertex;
    assert_eq!(error_codes("attribute vec4 a; attribute mat2 m;", vs), vec![]);
    assert_eq!(error_codes("attribute int a;", vs), vec![ErrorCode::InvalidQualifierForType]);
    assert_eq!(error_codes("attribute vec4 a[2];", vs), vec![ErrorCode::InvalidQualifierForType]);
    assert_eq!(fragment_errors("attribute vec4 a;"), vec![ErrorCode::InvalidQualifierInScope]);
    assert_eq!(error_codes("varying bool v;", vs), vec![ErrorCode::InvalidQualifierForType]);
    assert_eq!(error_codes("varying vec2 v[3];", vs), vec![]);
    assert_eq!(error_codes("void f() { uniform float u; }", vs),
               vec![ErrorCode::InvalidQualifierInScope]);
    assert_eq!(error_codes("uniform float u = 1.0;", vs), vec![ErrorCode::InitializerNotAllowed]);
    assert_eq!(error_codes("float a[2] = 1.0;", vs), vec![ErrorCode::InitializerNotAllowed]);
    assert_eq!(error_codes("const float c;", vs), vec![ErrorCode::ConstRequiresInitialization]);
    assert_eq!(error_codes("uniform float u; const float c = u;", vs),
               vec![ErrorCode::ConstInitializerNotConst]);
    assert_eq!(error_codes("float f = 1;", vs), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(error_codes("void v;", vs), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(error_codes("sampler2D s;", vs), vec![ErrorCode::InvalidSamplerUsage]);
    assert_eq!(error_codes("struct S { sampler2D s; };", vs), vec![ErrorCode::InvalidSamplerUsage]);
}

#[test]
fn test_arrays() {
    let vs = ShaderStage::Vertex;
    assert_eq!(error_codes("const int n = 2; float a[n * 2];", vs), vec![]);
    assert_eq!(error_codes("float a[0];", vs), vec![ErrorCode::ArraySizeLEQZero]);
    assert_eq!(error_codes("float a[-1];", vs), vec![ErrorCode::ArraySizeLEQZero]);
    assert_eq!(error_codes("uniform int n; float a[n];", vs), vec![ErrorCode::ArrayDeclaratorNotConst]);
    assert_eq!(error_codes("float a[2.0];", vs), vec![ErrorCode::ArrayDeclaratorNotConst]);
}

#[test]
fn test_structs() {
    let vs = ShaderStage::Vertex;
    let module = verify("struct S { float a; vec2 b; } s; void main() { s.a = s.b.y; }", vs)
        .expect("verify failed");
    assert_eq!(module.table.get_struct_name(StructId(0)), "typ_0_0");
    assert_eq!(error_codes("struct S { float a; int a; };", vs),
               vec![ErrorCode::IdentifierAlreadyDeclared]);
    assert_eq!(error_codes("struct A { float x; }; struct B { A a; }; struct C { B b; }; \
                            struct D { C c; }; struct E { D d; };",
                           vs),
               vec![ErrorCode::MaxStructNestingExceeded]);
    assert_eq!(error_codes("struct A { float x; }; struct B { A a; }; struct C { B b; }; \
                            struct D { C c; };",
                           vs),
               vec![]);
    assert_eq!(error_codes("float s; s t;", vs), vec![ErrorCode::SyntaxError]);
}

#[test]
fn test_functions() {
    let vs = ShaderStage::Vertex;
    assert_eq!(error_codes("int main() { return 0; }", vs), vec![ErrorCode::InvalidMainSignature]);
    assert_eq!(error_codes("void main(float x) {}", vs), vec![ErrorCode::InvalidMainSignature]);
    assert_eq!(error_codes("void main(void) {}", vs), vec![]);
    assert_eq!(error_codes("float sin(float x) { return x; }", vs),
               vec![ErrorCode::KnownFunctionDeclaredOrDefined]);
    assert_eq!(error_codes("int sin(float x) { return 0; }", vs),
               vec![ErrorCode::FuncOverloadOnReturnType]);
    assert_eq!(error_codes("float sin(int x) { return 1.0; }", vs), vec![]);
    assert_eq!(error_codes("void f(float x); void f(float y) {}", vs), vec![]);
    assert_eq!(error_codes("void f(float x); void f(float x);", vs),
               vec![ErrorCode::FunctionRedeclaration]);
    assert_eq!(error_codes("void f() {} void f() {}", vs), vec![ErrorCode::FunctionRedefinition]);
    assert_eq!(error_codes("void f(float x); void f(out float x) {}", vs),
               vec![ErrorCode::FunctionMismatchedQualifiers]);
    assert_eq!(error_codes("void f(float x); int f(float x) { return 0; }", vs),
               vec![ErrorCode::FuncOverloadOnReturnType]);
    assert_eq!(error_codes("void f(float x) {} void f(int x) {}", vs), vec![]);
    assert_eq!(error_codes("void f(float x, float x) {}", vs),
               vec![ErrorCode::IdentifierAlreadyDeclared]);
    assert_eq!(error_codes("void f(); void main() { f(); }", vs), vec![ErrorCode::FunctionNotDefined]);
    assert_eq!(error_codes("void f(); void main() {}", vs), vec![]);
    assert_eq!(error_codes("float f() { return 1; }", vs), vec![ErrorCode::IncompatibleReturn]);
    assert_eq!(error_codes("float f() { return; }", vs), vec![ErrorCode::IncompatibleReturn]);
    assert_eq!(error_codes("void f() { return 1.0; }", vs), vec![ErrorCode::IncompatibleReturn]);
}

#[test]
fn test_call_graph() {
    let vs = ShaderStage::Vertex;
    assert_eq!(error_codes("void g(); void f() { g(); } void g() { f(); }", vs),
               vec![ErrorCode::RecursionNotAllowed, ErrorCode::RecursionNotAllowed]);
    assert_eq!(error_codes("void f(); void f() { f(); }", vs), vec![ErrorCode::RecursionNotAllowed]);
    assert_eq!(error_codes("void a() {} void b() { a(); } void main() { b(); a(); }", vs),
               vec![]);
}

#[test]
fn test_statements() {
    let fs = ShaderStage::Fragment;
    assert_eq!(fragment_errors("void main() { if (1.0) {} }"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(fragment_errors("void main() { while (true) { break; } }"), vec![]);
    assert_eq!(fragment_errors("void main() { break; }"), vec![ErrorCode::InvalidBreakLocation]);
    assert_eq!(fragment_errors("void main() { continue; }"), vec![ErrorCode::InvalidContinueLocation]);
    assert_eq!(fragment_errors("void main() { discard; }"), vec![]);
    assert_eq!(error_codes("void main() { discard; }", ShaderStage::Vertex),
               vec![ErrorCode::InvalidDiscardLocation]);
    assert_eq!(fragment_errors("void main() { do { continue; } while (false); }"), vec![]);
    assert_eq!(fragment_errors("void main() { while (bool b = true) { b = false; } }"), vec![]);
    assert_eq!(fragment_errors("void main() { while (float f = 1.0) {} }"),
               vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(error_codes("void main() { x = 1; y = 2; }", fs),
               vec![ErrorCode::UndeclaredIdentifier, ErrorCode::UndeclaredIdentifier]);
}

#[test]
fn test_invariant() {
    let vs = ShaderStage::Vertex;
    let module = verify("varying vec4 v; invariant v; invariant gl_Position;", vs).expect("verify failed");
    assert!(module.table.variable(VariableId(0)).invariant);
    assert_eq!(error_codes("uniform vec4 u; invariant u;", vs), vec![ErrorCode::InvalidInvariant]);
    assert_eq!(error_codes("invariant w;", vs), vec![ErrorCode::UndeclaredIdentifier]);
    assert_eq!(error_codes("varying vec4 v; void main() { invariant v; }", vs),
               vec![ErrorCode::InvalidInvariant]);
    assert_eq!(fragment_errors("invariant gl_FragCoord;"), vec![ErrorCode::InvalidInvariant]);
}

#[test]
fn test_limits() {
    let vs = ShaderStage::Vertex;
    let uniforms = (0..1025).map(|i| format!("uniform vec4 u{};", i)).collect::<String>();
    assert_eq!(error_codes(&uniforms, vs), vec![ErrorCode::MaxUniformExceeded]);
    assert_eq!(error_codes("uniform mat4 u[256];", vs), vec![]);
    assert_eq!(error_codes("uniform sampler2D s[4];", vs), vec![]);
    assert_eq!(error_codes("uniform sampler2D s[4]; uniform samplerCube c;", vs),
               vec![ErrorCode::MaxSamplerExceeded]);
    let attributes = (0..17).map(|i| format!("attribute vec4 a{};", i)).collect::<String>();
    let reads = (0..17).map(|i| format!("a{};", i)).collect::<String>();
    assert_eq!(error_codes(&format!("{} void main() {{ {} }}", attributes, reads), vs),
               vec![ErrorCode::MaxAttributeExceeded]);
    assert_eq!(error_codes(&format!("{} void main() {{}}", attributes), vs), vec![]);
}

#[test]
fn test_limit_reported_once() {
    let vs = ShaderStage::Vertex;
    assert_eq!(error_codes("uniform vec4 u[1025]; void main() { gl_Position = u[0]; }", vs),
               vec![ErrorCode::MaxUniformExceeded]);
    assert_eq!(error_codes("uniform vec4 a[1024]; uniform vec4 b; uniform vec4 c;\n\
                            void main() { gl_Position = b + c; }", vs),
               vec![ErrorCode::MaxUniformExceeded]);
    let varyings = (0..12).map(|i| format!("varying vec4 v{};", i)).collect::<String>();
    let writes = (0..12).map(|i| format!("v{} = vec4(0.0);", i)).collect::<String>();
    assert_eq!(error_codes(&format!("{} void main() {{ {} v11 = v10; }}", varyings, writes), vs),
               vec![ErrorCode::MaxVaryingExceeded]);
    assert_eq!(error_codes("uniform sampler2D s[5]; uniform sampler2D t;", vs),
               vec![ErrorCode::MaxSamplerExceeded]);
}
