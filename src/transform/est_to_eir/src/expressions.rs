use glt_shared::*;
use glt_lang_est as ast;
use glt_lang_eir as ir;
use glt_lang_eir::{Type, ScalarType, Constant, ScalarConstant, FoldError, SwizzleSlot};
use glt_lang_eir::{UnaryOp, BinOp, AssignOp, ParamQualifier, VariableQualifier, BuiltinVariable};
use super::typer::{Context, Symbol, TyperResult, fail};
use super::constructors::{parse_constructor, parse_struct_constructor};

/// An expression with its type and its value when it could be folded
#[derive(PartialEq, Debug, Clone)]
pub struct TypedExpression {
    pub expr: ir::Expression,
    pub ty: Type,
    pub value: Option<Constant>,
    /// The value was taken through a ternary or a struct field
    pub indirect: bool,
    /// Built only from constants and loop indices
    pub constant_index: bool,
}

impl TypedExpression {
    pub fn new(expr: ir::Expression, ty: Type) -> TypedExpression {
        TypedExpression {
            expr,
            ty,
            value: None,
            indirect: false,
            constant_index: false,
        }
    }

    pub fn folded(expr: ir::Expression, ty: Type, value: Option<Constant>) -> TypedExpression {
        let constant_index = value.is_some();
        TypedExpression {
            expr,
            ty,
            value,
            indirect: false,
            constant_index,
        }
    }
}

/// Parse an expression that may not produce a sampler
pub fn parse_expr(expr: &Located<ast::Expression>, ctx: &mut Context) -> TyperResult<TypedExpression> {
    let typed = parse_expr_unchecked(expr, ctx)?;
    if typed.ty.is_sampler() {
        return fail(ErrorCode::InvalidSamplerUsage,
                    expr.location,
                    "samplers can only be used as function arguments".to_string());
    }
    Ok(typed)
}

/// Parse an expression that is allowed to be a sampler, such as a call
/// argument or the base of a subscript
pub fn parse_expr_unchecked(expr: &Located<ast::Expression>,
                            ctx: &mut Context)
                            -> TyperResult<TypedExpression> {
    ctx.expression_depth += 1;
    let result = if ctx.expression_depth > ctx.limits.max_expression_depth {
        fail(ErrorCode::ShaderComplexity,
             expr.location,
             "expression is nested too deeply".to_string())
    } else {
        parse_expr_inner(expr, ctx)
    };
    ctx.expression_depth -= 1;
    result
}

fn parse_expr_inner(expr: &Located<ast::Expression>, ctx: &mut Context) -> TyperResult<TypedExpression> {
    let location = expr.location;
    match expr.node {
        ast::Expression::Literal(ref literal) => parse_literal(literal, location),
        ast::Expression::Variable(ref name) => parse_variable(name, location, ctx),
        ast::Expression::UnaryOperation(op, ref inner) => parse_unary(op, inner, location, ctx),
        ast::Expression::BinaryOperation(op, ref lhs, ref rhs) => {
            parse_binary(op, lhs, rhs, location, ctx)
        }
        ast::Expression::Assignment(op, ref lhs, ref rhs) => {
            parse_assignment(op, lhs, rhs, location, ctx)
        }
        ast::Expression::TernaryConditional(ref cond, ref left, ref right) => {
            parse_ternary(cond, left, right, ctx)
        }
        ast::Expression::Sequence(ref exprs) => {
            let mut parsed = vec![];
            let mut ty = Type::Void;
            for expr in exprs {
                let typed = parse_expr(expr, ctx)?;
                ty = typed.ty;
                parsed.push(typed.expr);
            }
            Ok(TypedExpression::new(ir::Expression::Sequence(parsed), ty))
        }
        ast::Expression::ArraySubscript(ref base, ref index) => {
            parse_subscript(base, index, location, ctx)
        }
        ast::Expression::Member(ref base, ref name) => parse_member(base, name, ctx),
        ast::Expression::Call(ref name, ref args) => parse_call(name, args, location, ctx),
    }
}

fn parse_literal(literal: &ast::Literal, location: FileLocation) -> TyperResult<TypedExpression> {
    let value = match *literal {
        ast::Literal::Bool(b) => ScalarConstant::Bool(b),
        ast::Literal::Int(i) if i > 1 << 31 => {
            return fail(ErrorCode::IntegerLiteralTooLarge,
                        location,
                        format!("integer literal {} is too large", i))
        }
        ast::Literal::Int(i) => ScalarConstant::Int(i as u32 as i32),
        ast::Literal::Float(f) => ScalarConstant::Float(f),
    };
    let ty = Type::Scalar(value.get_type());
    Ok(TypedExpression::folded(ir::Expression::Literal(value), ty, Some(Constant::Scalar(value))))
}

fn builtin_constant(name: &str, limits: &Limits) -> Option<u32> {
    Some(match name {
        "gl_MaxVertexAttribs" => limits.max_vertex_attribs,
        "gl_MaxVertexUniformVectors" => limits.max_vertex_uniform_vectors,
        "gl_MaxVaryingVectors" => limits.max_varying_vectors,
        "gl_MaxVertexTextureImageUnits" => limits.max_vertex_texture_image_units,
        "gl_MaxCombinedTextureImageUnits" => limits.max_combined_texture_image_units(),
        "gl_MaxTextureImageUnits" => limits.max_texture_image_units,
        "gl_MaxFragmentUniformVectors" => limits.max_fragment_uniform_vectors,
        "gl_MaxDrawBuffers" => limits.max_draw_buffers,
        _ => return None,
    })
}

fn is_builtin_available(builtin: BuiltinVariable, ctx: &Context) -> bool {
    if builtin.get_stage() != ctx.stage {
        return false;
    }
    match builtin {
        BuiltinVariable::FrontFacing => !ctx.feature_level.is_level_9(),
        BuiltinVariable::FragDepth => ctx.extensions.is_enabled(Extension::FragDepth),
        _ => true,
    }
}

fn parse_builtin(builtin: BuiltinVariable,
                 location: FileLocation,
                 ctx: &mut Context)
                 -> TyperResult<TypedExpression> {
    if !is_builtin_available(builtin, ctx) {
        return fail(ErrorCode::UndeclaredIdentifier,
                    location,
                    format!("'{}' is not available", builtin.get_name()));
    }
    let conflict = match builtin {
        BuiltinVariable::FragColor => Some(BuiltinVariable::FragData),
        BuiltinVariable::FragData => Some(BuiltinVariable::FragColor),
        _ => None,
    };
    if let Some(conflict) = conflict {
        if ctx.builtin_uses.contains(&conflict) {
            return fail(ErrorCode::FragColorAndFragData,
                        location,
                        "gl_FragColor and gl_FragData can not both be used".to_string());
        }
    }
    if !ctx.builtin_uses.contains(&builtin) {
        ctx.builtin_uses.push(builtin);
    }
    Ok(TypedExpression::new(ir::Expression::Builtin(builtin), builtin.get_type()))
}

/// Count a global on first reference and charge the interface registers it uses
fn record_static_use(id: ir::VariableId, location: FileLocation, ctx: &mut Context) -> TyperResult<()> {
    if ctx.static_uses.contains(&id) {
        return Ok(());
    }
    ctx.static_uses.push(id);
    let info = ctx.table.variable(id);
    let registers = ctx.table.get_register_count(&info.ty);
    match info.qualifier {
        VariableQualifier::Attribute => {
            ctx.attribute_registers += registers;
            if ctx.attribute_registers > ctx.limits.max_vertex_attribs {
                let message = format!("more than {} attributes used", ctx.limits.max_vertex_attribs);
                return ctx.exceed_limit(ErrorCode::MaxAttributeExceeded, location, message);
            }
        }
        VariableQualifier::Varying => {
            ctx.varying_registers += registers;
            if ctx.varying_registers > ctx.limits.max_varying_vectors {
                let message = format!("more than {} varyings used", ctx.limits.max_varying_vectors);
                return ctx.exceed_limit(ErrorCode::MaxVaryingExceeded, location, message);
            }
        }
        _ => {}
    }
    Ok(())
}

fn parse_variable(name: &str, location: FileLocation, ctx: &mut Context) -> TyperResult<TypedExpression> {
    if let Some(builtin) = BuiltinVariable::from_name(name) {
        return parse_builtin(builtin, location, ctx);
    }
    if let Some(value) = builtin_constant(name, ctx.limits) {
        return parse_literal(&ast::Literal::Int(value as u64), location);
    }
    let id = match ctx.find_symbol(name) {
        Some(&Symbol::Variable(id)) => id,
        _ => {
            return fail(ErrorCode::UndeclaredIdentifier,
                        location,
                        format!("undeclared identifier '{}'", name))
        }
    };
    if ctx.table.variable(id).depth == 0 {
        record_static_use(id, location, ctx)?;
    }
    let info = ctx.table.variable(id);
    let is_index = ctx.loop_indices.contains(&id);
    Ok(TypedExpression {
        expr: ir::Expression::Variable(id),
        ty: info.ty.clone(),
        value: info.value.clone(),
        indirect: ctx.indirect_constants.contains(&id),
        constant_index: info.value.is_some() || is_index,
    })
}

fn is_arithmetic(ty: &Type) -> bool {
    ty.is_numeric() && !ty.is_bool_family()
}

fn parse_unary(op: UnaryOp,
               inner: &Located<ast::Expression>,
               location: FileLocation,
               ctx: &mut Context)
               -> TyperResult<TypedExpression> {
    if op == UnaryOp::BitwiseNot {
        return fail(ErrorCode::ReservedOperator,
                    location,
                    "operator '~' is reserved".to_string());
    }
    let typed = parse_expr(inner, ctx)?;
    let valid = match op {
        UnaryOp::LogicalNot => typed.ty == Type::bool(),
        _ => is_arithmetic(&typed.ty),
    };
    if !valid {
        return fail(ErrorCode::IncompatibleTypes,
                    location,
                    format!("operator can not be used with {}", ctx.type_name(&typed.ty)));
    }
    match op {
        UnaryOp::PrefixIncrement | UnaryOp::PrefixDecrement | UnaryOp::PostfixIncrement |
        UnaryOp::PostfixDecrement => {
            check_lvalue(&typed.expr, location, ErrorCode::InvalidForLoopIndexWrite, ctx)?;
            Ok(TypedExpression::new(ir::Expression::UnaryOperation(op, Box::new(typed.expr)),
                                    typed.ty))
        }
        _ => {
            let value = typed.value.as_ref().and_then(|value| ir::fold_unary(&op, value).ok());
            let mut result = TypedExpression::folded(ir::Expression::UnaryOperation(op,
                                                                                    Box::new(typed.expr)),
                                                     typed.ty,
                                                     value);
            result.indirect = typed.indirect;
            result.constant_index = typed.constant_index;
            Ok(result)
        }
    }
}

fn is_reserved_binop(op: BinOp) -> bool {
    matches!(op,
             BinOp::Modulus | BinOp::LeftShift | BinOp::RightShift | BinOp::BitwiseAnd |
             BinOp::BitwiseOr | BinOp::BitwiseXor)
}

fn binop_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Subtract => "-",
        BinOp::Multiply => "*",
        BinOp::Divide => "/",
        BinOp::Modulus => "%",
        BinOp::LeftShift => "<<",
        BinOp::RightShift => ">>",
        BinOp::LessThan => "<",
        BinOp::LessEqual => "<=",
        BinOp::GreaterThan => ">",
        BinOp::GreaterEqual => ">=",
        BinOp::Equality => "==",
        BinOp::Inequality => "!=",
        BinOp::BitwiseAnd => "&",
        BinOp::BitwiseOr => "|",
        BinOp::BitwiseXor => "^",
        BinOp::BooleanAnd => "&&",
        BinOp::BooleanOr => "||",
        BinOp::BooleanXor => "^^",
    }
}

/// Result type of an arithmetic operator, if the operands are compatible
fn arithmetic_type(op: BinOp, left: &Type, right: &Type) -> Option<Type> {
    if !is_arithmetic(left) || !is_arithmetic(right) || left.to_scalar() != right.to_scalar() {
        return None;
    }
    if left == right || left.is_scalar() || right.is_scalar() {
        return Some(ir::TypeParser::get_arithmetic_type(&op, left, right));
    }
    match (op, left, right) {
        (BinOp::Multiply, &Type::Matrix(n), &Type::Vector(_, m)) |
        (BinOp::Multiply, &Type::Vector(_, m), &Type::Matrix(n)) if n == m => {
            Some(ir::TypeParser::get_arithmetic_type(&op, left, right))
        }
        _ => None,
    }
}

fn check_divisor(divisor: &TypedExpression, location: FileLocation) -> TyperResult<()> {
    if let Some(ref value) = divisor.value {
        if value.get_components().iter().any(|c| c.is_zero()) {
            return fail(ErrorCode::DivideOrModByZero, location, "division by zero".to_string());
        }
    }
    Ok(())
}

/// Values that can be compared with == and !=
fn is_comparable(ty: &Type, ctx: &Context) -> bool {
    match *ty {
        Type::Void | Type::Sampler(_) | Type::Array(_, _) => false,
        Type::Struct(_) => !ctx.table.contains_array(ty),
        _ => true,
    }
}

fn parse_binary(op: BinOp,
                lhs: &Located<ast::Expression>,
                rhs: &Located<ast::Expression>,
                location: FileLocation,
                ctx: &mut Context)
                -> TyperResult<TypedExpression> {
    if is_reserved_binop(op) {
        return fail(ErrorCode::ReservedOperator,
                    location,
                    format!("operator '{}' is reserved", binop_symbol(op)));
    }
    let left = parse_expr(lhs, ctx)?;
    let right = parse_expr(rhs, ctx)?;
    let ty = match op {
        BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide => {
            arithmetic_type(op, &left.ty, &right.ty)
        }
        BinOp::LessThan | BinOp::LessEqual | BinOp::GreaterThan | BinOp::GreaterEqual => {
            let valid = left.ty == right.ty &&
                        (left.ty == Type::int() || left.ty == Type::float());
            if valid { Some(Type::bool()) } else { None }
        }
        BinOp::Equality | BinOp::Inequality => {
            let valid = left.ty == right.ty && is_comparable(&left.ty, ctx);
            if valid { Some(Type::bool()) } else { None }
        }
        _ => {
            let valid = left.ty == Type::bool() && right.ty == Type::bool();
            if valid { Some(Type::bool()) } else { None }
        }
    };
    let ty = match ty {
        Some(ty) => ty,
        None => {
            return fail(ErrorCode::IncompatibleTypes,
                        location,
                        format!("operator '{}' can not be used with {} and {}",
                                binop_symbol(op),
                                ctx.type_name(&left.ty),
                                ctx.type_name(&right.ty)))
        }
    };
    if op == BinOp::Divide {
        check_divisor(&right, rhs.location)?;
    }

    let value = match (&left.value, &right.value) {
        (&Some(ref l), &Some(ref r)) => {
            match ir::fold_binary(&op, l, r) {
                Ok(value) => Some(value),
                Err(FoldError::DivideByZero) => {
                    return fail(ErrorCode::DivideOrModByZero,
                                location,
                                "division by zero".to_string())
                }
                Err(FoldError::Unsupported) => None,
            }
        }
        _ => None,
    };
    let expr = ir::Expression::BinaryOperation(op, Box::new(left.expr), Box::new(right.expr));
    let mut result = TypedExpression::folded(expr, ty, value);
    result.indirect = left.indirect || right.indirect;
    result.constant_index = left.constant_index && right.constant_index;
    Ok(result)
}

fn assign_binop(op: AssignOp) -> Option<BinOp> {
    match op {
        AssignOp::Add => Some(BinOp::Add),
        AssignOp::Subtract => Some(BinOp::Subtract),
        AssignOp::Multiply => Some(BinOp::Multiply),
        AssignOp::Divide => Some(BinOp::Divide),
        _ => None,
    }
}

fn parse_assignment(op: AssignOp,
                    lhs: &Located<ast::Expression>,
                    rhs: &Located<ast::Expression>,
                    location: FileLocation,
                    ctx: &mut Context)
                    -> TyperResult<TypedExpression> {
    let binop = assign_binop(op);
    if op != AssignOp::Assign && binop.is_none() {
        return fail(ErrorCode::ReservedOperator,
                    location,
                    "assignment operator is reserved".to_string());
    }
    let left = parse_expr(lhs, ctx)?;
    check_lvalue(&left.expr, lhs.location, ErrorCode::InvalidForLoopIndexWrite, ctx)?;
    if left.ty.is_array() {
        return fail(ErrorCode::InvalidLValue,
                    lhs.location,
                    "arrays can not be assigned".to_string());
    }
    let right = parse_expr(rhs, ctx)?;
    let valid = match binop {
        None => left.ty == right.ty,
        Some(binop) => arithmetic_type(binop, &left.ty, &right.ty).as_ref() == Some(&left.ty),
    };
    if !valid {
        return fail(ErrorCode::IncompatibleTypes,
                    location,
                    format!("can not assign {} to {}",
                            ctx.type_name(&right.ty),
                            ctx.type_name(&left.ty)));
    }
    if binop == Some(BinOp::Divide) {
        check_divisor(&right, rhs.location)?;
    }
    let expr = ir::Expression::Assignment(op, Box::new(left.expr), Box::new(right.expr));
    Ok(TypedExpression::new(expr, left.ty))
}

fn parse_ternary(cond: &Located<ast::Expression>,
                 left: &Located<ast::Expression>,
                 right: &Located<ast::Expression>,
                 ctx: &mut Context)
                 -> TyperResult<TypedExpression> {
    let cond = parse_expr(cond, ctx)?;
    if cond.ty != Type::bool() {
        return fail(ErrorCode::IncompatibleTypes,
                    left.location,
                    format!("ternary condition must be bool but is {}", ctx.type_name(&cond.ty)));
    }
    let l = parse_expr(left, ctx)?;
    let r = parse_expr(right, ctx)?;
    if l.ty != r.ty || l.ty.is_array() {
        return fail(ErrorCode::IncompatibleTypes,
                    left.location,
                    format!("ternary arms have types {} and {}",
                            ctx.type_name(&l.ty),
                            ctx.type_name(&r.ty)));
    }
    let value = match cond.value.as_ref().and_then(|c| c.to_scalar()) {
        Some(ScalarConstant::Bool(true)) => l.value.clone(),
        Some(ScalarConstant::Bool(false)) => r.value.clone(),
        _ => None,
    };
    let constant_index = cond.constant_index && l.constant_index && r.constant_index;
    let ty = l.ty;
    let expr = ir::Expression::TernaryConditional(Box::new(cond.expr),
                                                  Box::new(l.expr),
                                                  Box::new(r.expr));
    Ok(TypedExpression {
        expr,
        ty,
        indirect: value.is_some(),
        value,
        constant_index,
    })
}

fn parse_subscript(base: &Located<ast::Expression>,
                   index: &Located<ast::Expression>,
                   location: FileLocation,
                   ctx: &mut Context)
                   -> TyperResult<TypedExpression> {
    let base = parse_expr_unchecked(base, ctx)?;
    let index_typed = parse_expr(index, ctx)?;
    if index_typed.ty != Type::int() {
        return fail(ErrorCode::IncompatibleTypes,
                    index.location,
                    format!("index must be int but is {}", ctx.type_name(&index_typed.ty)));
    }
    let (ty, size) = match base.ty {
        Type::Array(ref inner, size) => ((**inner).clone(), size),
        Type::Vector(scalar, size) => (Type::Scalar(scalar), size),
        Type::Matrix(size) => (Type::floatn(size), size),
        ref ty => {
            return fail(ErrorCode::IncompatibleTypes,
                        location,
                        format!("{} can not be indexed", ctx.type_name(ty)))
        }
    };
    let constant = index_typed.value.as_ref().and_then(|v| v.to_scalar()).map(|v| v.to_int());
    if let Some(i) = constant {
        if i < 0 || i as u32 >= size {
            return fail(ErrorCode::IndexOutOfRange,
                        index.location,
                        format!("index {} is out of range", i));
        }
    }
    if base.ty.is_sampler() && !index_typed.constant_index {
        return fail(ErrorCode::InvalidIndexExpression,
                    index.location,
                    "sampler arrays must be indexed by a constant index expression".to_string());
    }
    let value = match (&base.value, constant) {
        (&Some(ref value), Some(i)) => value.index(i as u32),
        _ => None,
    };
    let expr = ir::Expression::ArraySubscript(Box::new(base.expr), Box::new(index_typed.expr));
    let mut result = TypedExpression::folded(expr, ty, value);
    result.indirect = base.indirect || index_typed.indirect;
    result.constant_index = base.constant_index && index_typed.constant_index;
    Ok(result)
}

fn parse_swizzle(name: &Located<String>, size: u32) -> TyperResult<Vec<SwizzleSlot>> {
    const SETS: [&str; 3] = ["xyzw", "rgba", "stpq"];
    let invalid = || {
        fail(ErrorCode::InvalidSwizzle,
             name.location,
             format!("invalid swizzle '{}'", name.node))
    };
    if name.is_empty() || name.len() > 4 {
        return invalid();
    }
    let first = match name.chars().next() {
        Some(first) => first,
        None => return invalid(),
    };
    let set = match SETS.iter().find(|set| set.contains(first)) {
        Some(set) => set,
        None => return invalid(),
    };
    let mut slots = vec![];
    for c in name.chars() {
        match set.find(c) {
            Some(index) if (index as u32) < size => slots.push(SwizzleSlot::from_index(index as u32)),
            _ => return invalid(),
        }
    }
    Ok(slots)
}

fn parse_member(base: &Located<ast::Expression>,
                name: &Located<String>,
                ctx: &mut Context)
                -> TyperResult<TypedExpression> {
    let base = parse_expr(base, ctx)?;
    match base.ty {
        Type::Struct(id) => {
            let structure = ctx.table.structure(id);
            let index = match structure.members.iter().position(|m| m.name == name.node) {
                Some(index) => index,
                None => {
                    return fail(ErrorCode::InvalidStructFieldName,
                                name.location,
                                format!("'{}' is not a field of {}", name.node, ctx.type_name(&base.ty)))
                }
            };
            let ty = structure.members[index].ty.clone();
            let value = base.value.as_ref().and_then(|value| value.member(index));
            let expr = ir::Expression::Member(Box::new(base.expr), name.node.clone());
            let mut result = TypedExpression::folded(expr, ty, value);
            result.indirect = true;
            result.constant_index = base.constant_index;
            Ok(result)
        }
        Type::Vector(scalar, size) => {
            let slots = parse_swizzle(name, size)?;
            let ty = Type::from_numeric(scalar, slots.len() as u32);
            let value = base.value.as_ref().and_then(|value| value.swizzle(&slots));
            let expr = ir::Expression::Swizzle(Box::new(base.expr), slots);
            let mut result = TypedExpression::folded(expr, ty, value);
            result.indirect = base.indirect;
            result.constant_index = base.constant_index;
            Ok(result)
        }
        ref ty => {
            fail(ErrorCode::InvalidSwizzle,
                 name.location,
                 format!("'{}' can not be selected from {}", name.node, ctx.type_name(ty)))
        }
    }
}

fn parse_call(name: &Located<String>,
              args: &[Located<ast::Expression>],
              location: FileLocation,
              ctx: &mut Context)
              -> TyperResult<TypedExpression> {
    let mut typed_args = vec![];
    for arg in args {
        typed_args.push(parse_expr_unchecked(arg, ctx)?);
    }

    if let Some(ty) = Type::from_keyword(name) {
        return parse_constructor(ty, typed_args, location, ctx);
    }

    let overloads = match ctx.find_symbol(name) {
        Some(&Symbol::Struct(id)) => return parse_struct_constructor(id, typed_args, location, ctx),
        Some(&Symbol::Variable(_)) => {
            return fail(ErrorCode::UndeclaredIdentifier,
                        name.location,
                        format!("'{}' is not a function", name.node))
        }
        Some(&Symbol::Functions(ref ids)) => ids.clone(),
        None => vec![],
    };

    let arg_types = typed_args.iter().map(|arg| arg.ty.clone()).collect::<Vec<_>>();
    let exact = overloads.iter().cloned().find(|id| {
        let params = &ctx.table.function(*id).params;
        params.len() == arg_types.len() && params.iter().zip(&arg_types).all(|(p, a)| p.ty == *a)
    });
    if let Some(id) = exact {
        return parse_user_call(id, typed_args, args, location, ctx);
    }

    if let Some((intrinsic, ty)) = ir::resolve_intrinsic(name, &arg_types) {
        if intrinsic.is_available(ctx.stage, ctx.extensions) {
            let values = typed_args.iter().map(|arg| arg.value.clone()).collect::<Option<Vec<_>>>();
            let value = values.and_then(|values| ir::fold_intrinsic(intrinsic, &values, &ty));
            let indirect = typed_args.iter().any(|arg| arg.indirect);
            let exprs = typed_args.into_iter().map(|arg| arg.expr).collect();
            let mut result = TypedExpression::folded(ir::Expression::Intrinsic(intrinsic,
                                                                               exprs,
                                                                               ty.clone()),
                                                     ty,
                                                     value);
            result.indirect = indirect;
            return Ok(result);
        }
    }

    let known_intrinsic = ir::get_intrinsics()
        .iter()
        .any(|&(_, n, _, intrinsic)| n == name.as_str() && intrinsic.is_available(ctx.stage, ctx.extensions));
    if !overloads.is_empty() || known_intrinsic {
        let types = arg_types.iter().map(|ty| ctx.type_name(ty)).collect::<Vec<_>>();
        return fail(ErrorCode::InvalidArguments,
                    name.location,
                    format!("no overload of '{}' takes ({})", name.node, types.join(", ")));
    }
    fail(ErrorCode::UndeclaredIdentifier,
         name.location,
         format!("undeclared function '{}'", name.node))
}

fn parse_user_call(id: ir::FunctionId,
                   typed_args: Vec<TypedExpression>,
                   args: &[Located<ast::Expression>],
                   location: FileLocation,
                   ctx: &mut Context)
                   -> TyperResult<TypedExpression> {
    let params = ctx.table.function(id).params.clone();
    for ((param, typed), arg) in params.iter().zip(&typed_args).zip(args) {
        if param.qualifier != ParamQualifier::In {
            check_lvalue(&typed.expr, arg.location, ErrorCode::LoopIndexOutParam, ctx)?;
        }
    }
    ctx.calls.push((id, location));
    let ty = ctx.table.function(id).returntype.clone();
    let exprs = typed_args.into_iter().map(|arg| arg.expr).collect();
    Ok(TypedExpression::new(ir::Expression::Call(id, exprs), ty))
}

/// Check an expression can be written to. Writes to a loop index report the
/// given code.
pub fn check_lvalue(expr: &ir::Expression,
                    location: FileLocation,
                    loop_index_code: ErrorCode,
                    ctx: &Context)
                    -> TyperResult<()> {
    match *expr {
        ir::Expression::Variable(id) => {
            if ctx.loop_indices.contains(&id) {
                return fail(loop_index_code,
                            location,
                            "loop index can not be written in the loop body".to_string());
            }
            let info = ctx.table.variable(id);
            let read_only = match info.qualifier {
                VariableQualifier::Const | VariableQualifier::Uniform |
                VariableQualifier::Attribute | VariableQualifier::ParamConstIn => true,
                VariableQualifier::Varying => ctx.stage == ShaderStage::Fragment,
                _ => false,
            };
            if read_only {
                return fail(ErrorCode::InvalidLValue,
                            location,
                            format!("'{}' is read only", info.name));
            }
            Ok(())
        }
        ir::Expression::Builtin(builtin) => {
            if builtin.is_read_only() {
                return fail(ErrorCode::InvalidLValue,
                            location,
                            format!("'{}' is read only", builtin.get_name()));
            }
            Ok(())
        }
        ir::Expression::Member(ref base, _) |
        ir::Expression::ArraySubscript(ref base, _) => check_lvalue(base, location, loop_index_code, ctx),
        ir::Expression::Swizzle(ref base, ref slots) => {
            let duplicate = slots.iter().enumerate().any(|(i, slot)| slots[..i].contains(slot));
            if duplicate {
                return fail(ErrorCode::InvalidLValue,
                            location,
                            "swizzle with repeated components can not be written".to_string());
            }
            check_lvalue(base, location, loop_index_code, ctx)
        }
        _ => fail(ErrorCode::InvalidLValue, location, "expression can not be written".to_string()),
    }
}

#[cfg(test)]
use super::typer::{fragment_errors, error_codes, verify};

#[cfg(test)]
fn vertex_errors(body: &str) -> Vec<ErrorCode> {
    error_codes(&format!("void main() {{ {} }}", body), ShaderStage::Vertex)
}

#[test]
fn test_reserved_operators() {
    assert_eq!(vertex_errors("int a = 1 % 2;"), vec![ErrorCode::ReservedOperator]);
    assert_eq!(vertex_errors("int a = ~1;"), vec![ErrorCode::ReservedOperator]);
    assert_eq!(vertex_errors("int a = 1 << 2;"), vec![ErrorCode::ReservedOperator]);
    assert_eq!(vertex_errors("int a = 1; a |= 2;"), vec![ErrorCode::ReservedOperator]);
    assert_eq!(vertex_errors("int a = 1; a %= 2;"), vec![ErrorCode::ReservedOperator]);
}

#[test]
fn test_arithmetic() {
    assert_eq!(vertex_errors("float f = 1.0 + 2.0 * 3.0;"), vec![]);
    assert_eq!(vertex_errors("float f = 1.0 + 2;"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("vec2 v = vec2(1.0) * 2.0;"), vec![]);
    assert_eq!(vertex_errors("vec2 v = vec3(1.0) * vec2(1.0);"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("vec3 v = mat3(1.0) * vec3(1.0);"), vec![]);
    assert_eq!(vertex_errors("vec3 v = vec3(1.0) * mat3(1.0);"), vec![]);
    assert_eq!(vertex_errors("vec4 v = mat3(1.0) * vec4(1.0);"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("mat2 m = mat2(1.0) * mat2(2.0);"), vec![]);
    assert_eq!(vertex_errors("bool b = true + false;"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("int i = 1; i++; ++i; i--;"), vec![]);
    assert_eq!(vertex_errors("bool b = true; b++;"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("bool b = !1;"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("float f = -1.0; f += 2.0; f *= 2.0;"), vec![]);
    assert_eq!(vertex_errors("vec2 v = vec2(1.0); v *= mat2(1.0);"), vec![]);
    assert_eq!(vertex_errors("float f = 1.0; f += vec2(1.0);"), vec![ErrorCode::IncompatibleTypes]);
}

#[test]
fn test_divide_by_zero() {
    assert_eq!(vertex_errors("int i = 1 / 0;"), vec![ErrorCode::DivideOrModByZero]);
    assert_eq!(vertex_errors("float f = 1.0; f = f / 0.0;"), vec![ErrorCode::DivideOrModByZero]);
    assert_eq!(vertex_errors("vec2 v = vec2(1.0) / vec2(1.0, 0.0);"),
               vec![ErrorCode::DivideOrModByZero]);
    assert_eq!(vertex_errors("float f = 1.0; f /= 0.0;"), vec![ErrorCode::DivideOrModByZero]);
    assert_eq!(vertex_errors("float f = 0.0; f = 1.0 / f;"), vec![]);
}

#[test]
fn test_comparisons() {
    assert_eq!(vertex_errors("bool b = 1 < 2;"), vec![]);
    assert_eq!(vertex_errors("bool b = vec2(1.0) < vec2(2.0);"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("bool b = vec2(1.0) == vec2(2.0);"), vec![]);
    assert_eq!(vertex_errors("bool b = 1 == 1.0;"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("bool b = true && 1 < 2 ^^ false;"), vec![]);
    assert_eq!(vertex_errors("bool b = 1 || true;"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(error_codes("struct S { float a[2]; }; void main() { S s; S t; bool b = s == t; }",
                           ShaderStage::Vertex),
               vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("float a[2]; float b[2]; bool c = a == b;"),
               vec![ErrorCode::IncompatibleTypes]);
}

#[test]
fn test_lvalues() {
    let vs = ShaderStage::Vertex;
    assert_eq!(vertex_errors("1.0 = 2.0;"), vec![ErrorCode::InvalidLValue]);
    assert_eq!(error_codes("uniform float u; void main() { u = 1.0; }", vs),
               vec![ErrorCode::InvalidLValue]);
    assert_eq!(error_codes("const float c = 1.0; void main() { c = 1.0; }", vs),
               vec![ErrorCode::InvalidLValue]);
    assert_eq!(error_codes("attribute float a; void main() { a = 1.0; }", vs),
               vec![ErrorCode::InvalidLValue]);
    assert_eq!(error_codes("varying float v; void main() { v = 1.0; }", vs), vec![]);
    assert_eq!(fragment_errors("varying float v; void main() { v = 1.0; }"),
               vec![ErrorCode::InvalidLValue]);
    assert_eq!(fragment_errors("void main() { gl_FragCoord = vec4(1.0); }"),
               vec![ErrorCode::InvalidLValue]);
    assert_eq!(vertex_errors("vec4 v; v.xy = vec2(1.0); v.xx = vec2(1.0);"),
               vec![ErrorCode::InvalidLValue]);
    assert_eq!(vertex_errors("float a[2]; float b[2]; a = b;"), vec![ErrorCode::InvalidLValue]);
    assert_eq!(error_codes("void f(const float x) { x = 1.0; }", vs), vec![ErrorCode::InvalidLValue]);
    assert_eq!(error_codes("void f(inout float x) { x = 1.0; } void main() { f(1.0); }", vs),
               vec![ErrorCode::InvalidLValue]);
}

#[test]
fn test_ternary() {
    assert_eq!(vertex_errors("float f = true ? 1.0 : 2.0;"), vec![]);
    assert_eq!(vertex_errors("float f = 1 ? 1.0 : 2.0;"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("float f = true ? 1.0 : 2;"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("const float f = true ? 1.0 : 2.0; float a[int(f)];"), vec![]);
}

#[test]
fn test_subscripts() {
    let vs = ShaderStage::Vertex;
    assert_eq!(vertex_errors("float a[2]; float f = a[1];"), vec![]);
    assert_eq!(vertex_errors("float a[2]; float f = a[2];"), vec![ErrorCode::IndexOutOfRange]);
    assert_eq!(vertex_errors("float a[2]; float f = a[-1];"), vec![ErrorCode::IndexOutOfRange]);
    assert_eq!(vertex_errors("vec3 v; float f = v[3];"), vec![ErrorCode::IndexOutOfRange]);
    assert_eq!(vertex_errors("mat3 m; vec3 c = m[2];"), vec![]);
    assert_eq!(vertex_errors("float a[2]; float f = a[1.0];"), vec![ErrorCode::IncompatibleTypes]);
    assert_eq!(vertex_errors("float f; float g = f[0];"), vec![ErrorCode::IncompatibleTypes]);
    let samplers = "uniform sampler2D s[2]; uniform int n;";
    assert_eq!(error_codes(&format!("{} void main() {{ texture2D(s[1], vec2(0.0)); }}", samplers), vs),
               vec![]);
    assert_eq!(error_codes(&format!("{} void main() {{ texture2D(s[n], vec2(0.0)); }}", samplers), vs),
               vec![ErrorCode::InvalidIndexExpression]);
    assert_eq!(error_codes(&format!("{} void main() {{ for (int i = 0; i < 2; i++) {{ \
                                     texture2D(s[i], vec2(0.0)); }} }}",
                                    samplers),
                           vs),
               vec![]);
}

#[test]
fn test_members() {
    let vs = ShaderStage::Vertex;
    assert_eq!(vertex_errors("vec4 v; vec2 a = v.xy; vec3 b = v.rgb; vec4 c = v.stpq;"), vec![]);
    assert_eq!(vertex_errors("vec4 v; vec2 a = v.xg;"), vec![ErrorCode::InvalidSwizzle]);
    assert_eq!(vertex_errors("vec2 v; float a = v.z;"), vec![ErrorCode::InvalidSwizzle]);
    assert_eq!(vertex_errors("vec4 v; vec4 a = v.xyzwx;"), vec![ErrorCode::InvalidSwizzle]);
    assert_eq!(vertex_errors("float f; float a = f.x;"), vec![ErrorCode::InvalidSwizzle]);
    assert_eq!(error_codes("struct S { float a; }; void main() { S s; float f = s.b; }", vs),
               vec![ErrorCode::InvalidStructFieldName]);
}

#[test]
fn test_samplers() {
    let vs = ShaderStage::Vertex;
    assert_eq!(error_codes("uniform sampler2D s; void main() { sampler2D t = s; }", vs),
               vec![ErrorCode::InvalidSamplerUsage]);
    assert_eq!(error_codes("uniform sampler2D s; void main() { s; }", vs),
               vec![ErrorCode::InvalidSamplerUsage]);
    assert_eq!(error_codes("uniform sampler2D s; vec4 f(sampler2D t) { return texture2D(t, vec2(0.0)); } \
                            void main() { f(s); }",
                           vs),
               vec![]);
}

#[test]
fn test_calls() {
    let vs = ShaderStage::Vertex;
    assert_eq!(vertex_errors("float f = sin(1.0);"), vec![]);
    assert_eq!(vertex_errors("float f = sin(1);"), vec![ErrorCode::InvalidArguments]);
    assert_eq!(vertex_errors("float f = foo(1.0);"), vec![ErrorCode::UndeclaredIdentifier]);
    assert_eq!(vertex_errors("float f; f(1.0);"), vec![ErrorCode::UndeclaredIdentifier]);
    assert_eq!(error_codes("void f(float x) {} void main() { f(1); }", vs),
               vec![ErrorCode::InvalidArguments]);
    assert_eq!(error_codes("float sin(int x) { return 1.0; } void main() { sin(1); sin(1.0); }", vs),
               vec![]);
    assert_eq!(vertex_errors("vec2 d = dFdx(vec2(1.0));"), vec![ErrorCode::UndeclaredIdentifier]);
    assert_eq!(fragment_errors("#extension GL_OES_standard_derivatives : enable\n\
                                void main() { vec2 d = dFdx(vec2(1.0)); }"),
               vec![]);
    assert_eq!(vertex_errors("const float f = max(1.0, 2.0); float a[int(f)];"), vec![]);
}

#[test]
fn test_builtins() {
    let vs = ShaderStage::Vertex;
    assert_eq!(vertex_errors("gl_Position = vec4(1.0); gl_PointSize = 1.0;"), vec![]);
    assert_eq!(vertex_errors("gl_FragColor = vec4(1.0);"), vec![ErrorCode::UndeclaredIdentifier]);
    assert_eq!(fragment_errors("void main() { gl_FragColor = vec4(1.0); gl_FragData[0] = vec4(1.0); }"),
               vec![ErrorCode::FragColorAndFragData]);
    assert_eq!(fragment_errors("void main() { bool b = gl_FrontFacing; }"), vec![]);
    assert_eq!(error_codes("float a[gl_MaxDrawBuffers]; void main() {}", vs), vec![]);
    let module = verify("void main() { gl_Position = vec4(1.0); gl_Position = vec4(0.0); }", vs)
        .expect("verify failed");
    assert_eq!(module.builtin_uses, vec![BuiltinVariable::Position]);
    assert_eq!(fragment_errors("void main() { gl_FragDepthEXT = 1.0; }"),
               vec![ErrorCode::UndeclaredIdentifier]);
    assert_eq!(fragment_errors("#extension GL_EXT_frag_depth : enable\n\
                                void main() { gl_FragDepthEXT = 1.0; }"),
               vec![]);
}

#[test]
fn test_front_facing_level_9() {
    use super::typer::verify_at_level;
    let source = "precision mediump float; void main() { bool b = gl_FrontFacing; }";
    let codes = match verify_at_level(source, ShaderStage::Fragment, FeatureLevel::Level9_3) {
        Ok(_) => vec![],
        Err(errors) => errors.iter().map(|err| err.code).collect(),
    };
    assert_eq!(codes, vec![ErrorCode::UndeclaredIdentifier]);
}

#[test]
fn test_literals() {
    assert_eq!(vertex_errors("int i = 2147483647;"), vec![]);
    assert_eq!(vertex_errors("int i = -2147483648;"), vec![]);
    assert_eq!(vertex_errors("int i = 2147483649;"), vec![ErrorCode::IntegerLiteralTooLarge]);
}

#[test]
fn test_static_uses() {
    let module = verify("attribute vec4 a; attribute vec4 b; uniform vec4 u; \
                         void main() { gl_Position = b + u; gl_Position = a; }",
                        ShaderStage::Vertex)
        .expect("verify failed");
    assert_eq!(module.static_uses,
               vec![ir::VariableId(1), ir::VariableId(2), ir::VariableId(0)]);
}
