use glt_lang_eir as src;
use glt_lang_eir::{Intrinsic, TypeParser};
use glt_lang_hst as dst;
use glt_lang_hst::{Fragment, TextureLookup};
use super::transpiler::{Context, TranspileError, TranspileResult};
use super::transpiler::{convert_scalar, member_name, texture_name, sampler_name};

/// True if an expression holds a ternary or a short circuiting operator
pub fn needs_lift(expr: &src::Expression) -> bool {
    match *expr {
        src::Expression::Literal(_) |
        src::Expression::Variable(_) |
        src::Expression::Builtin(_) => false,
        src::Expression::TernaryConditional(_, _, _) => true,
        src::Expression::BinaryOperation(src::BinOp::BooleanAnd, _, _) |
        src::Expression::BinaryOperation(src::BinOp::BooleanOr, _, _) => true,
        src::Expression::UnaryOperation(_, ref expr) |
        src::Expression::Swizzle(ref expr, _) |
        src::Expression::Member(ref expr, _) => needs_lift(expr),
        src::Expression::BinaryOperation(_, ref lhs, ref rhs) |
        src::Expression::ArraySubscript(ref lhs, ref rhs) => needs_lift(lhs) || needs_lift(rhs),
        // A matrix product assignment reads its target twice
        src::Expression::Assignment(op, ref lhs, ref rhs) => {
            needs_lift(lhs) || needs_lift(rhs) || (op == src::AssignOp::Multiply && has_side_effects(lhs))
        }
        src::Expression::Sequence(ref exprs) |
        src::Expression::Call(_, ref exprs) |
        src::Expression::Intrinsic(_, ref exprs, _) |
        src::Expression::Constructor(_, ref exprs) |
        src::Expression::StructConstructor(_, ref exprs) => exprs.iter().any(needs_lift),
    }
}

/// True if evaluating the expression can write to a variable
pub fn has_side_effects(expr: &src::Expression) -> bool {
    match *expr {
        src::Expression::Literal(_) |
        src::Expression::Variable(_) |
        src::Expression::Builtin(_) => false,
        src::Expression::Assignment(_, _, _) |
        src::Expression::Call(_, _) => true,
        src::Expression::UnaryOperation(op, ref expr) => {
            match op {
                src::UnaryOp::PrefixIncrement |
                src::UnaryOp::PrefixDecrement |
                src::UnaryOp::PostfixIncrement |
                src::UnaryOp::PostfixDecrement => true,
                _ => has_side_effects(expr),
            }
        }
        src::Expression::Swizzle(ref expr, _) |
        src::Expression::Member(ref expr, _) => has_side_effects(expr),
        src::Expression::BinaryOperation(_, ref lhs, ref rhs) |
        src::Expression::ArraySubscript(ref lhs, ref rhs) => {
            has_side_effects(lhs) || has_side_effects(rhs)
        }
        src::Expression::TernaryConditional(ref cond, ref lhs, ref rhs) => {
            has_side_effects(cond) || has_side_effects(lhs) || has_side_effects(rhs)
        }
        src::Expression::Sequence(ref exprs) |
        src::Expression::Intrinsic(_, ref exprs, _) |
        src::Expression::Constructor(_, ref exprs) |
        src::Expression::StructConstructor(_, ref exprs) => exprs.iter().any(has_side_effects),
    }
}

pub fn type_of(expr: &src::Expression, ctx: &Context) -> TranspileResult<src::Type> {
    Ok(TypeParser::get_expression_type(expr, ctx.table)?)
}

fn internal<T>(message: &str) -> TranspileResult<T> {
    Err(TranspileError::Internal(message.to_string()))
}

fn literal(value: &src::ScalarConstant) -> dst::Literal {
    match *value {
        src::ScalarConstant::Bool(b) => dst::Literal::Bool(b),
        src::ScalarConstant::Int(i) => dst::Literal::Int(i),
        src::ScalarConstant::Float(f) => dst::Literal::Float(f),
    }
}

fn swizzle_slot(slot: &src::SwizzleSlot) -> dst::SwizzleSlot {
    match *slot {
        src::SwizzleSlot::X => dst::SwizzleSlot::X,
        src::SwizzleSlot::Y => dst::SwizzleSlot::Y,
        src::SwizzleSlot::Z => dst::SwizzleSlot::Z,
        src::SwizzleSlot::W => dst::SwizzleSlot::W,
    }
}

fn first_slots(count: u32) -> Vec<dst::SwizzleSlot> {
    [dst::SwizzleSlot::X, dst::SwizzleSlot::Y, dst::SwizzleSlot::Z, dst::SwizzleSlot::W]
        .iter()
        .take(count as usize)
        .cloned()
        .collect()
}

/// Zero value of a type, used for variables declared without an initializer
pub fn zero_initializer(ty: &src::Type, ctx: &mut Context) -> TranspileResult<dst::Initializer> {
    let expr = match *ty {
        src::Type::Scalar(src::ScalarType::Bool) => dst::Expression::Literal(dst::Literal::Bool(false)),
        src::Type::Scalar(src::ScalarType::Int) => dst::Expression::Literal(dst::Literal::Int(0)),
        src::Type::Scalar(src::ScalarType::Float) => dst::Expression::Literal(dst::Literal::Float(0.0)),
        src::Type::Vector(_, _) |
        src::Type::Matrix(_) |
        src::Type::Struct(_) => {
            dst::Expression::Cast(ctx.convert_type(ty)?,
                                  Box::new(dst::Expression::Literal(dst::Literal::Int(0))))
        }
        src::Type::Array(ref inner, size) => {
            let element = zero_initializer(inner, ctx)?;
            return Ok(dst::Initializer::Aggregate(vec![element; size as usize]));
        }
        src::Type::Void | src::Type::Sampler(_) => return internal("no zero value for type"),
    };
    Ok(dst::Initializer::Expression(expr))
}

/// Compare two values of a type with == or !=
pub fn equality(op: src::BinOp,
                ty: &src::Type,
                lhs: dst::Expression,
                rhs: dst::Expression,
                ctx: &mut Context)
                -> TranspileResult<dst::Expression> {
    let equal = op == src::BinOp::Equality;
    let binop = if equal {
        dst::BinOp::Equality
    } else {
        dst::BinOp::Inequality
    };
    match *ty {
        src::Type::Scalar(_) => Ok(dst::Expression::binary(binop, lhs, rhs)),
        src::Type::Vector(_, _) | src::Type::Matrix(_) => {
            let reduce = if equal { "all" } else { "any" };
            Ok(dst::Expression::call(reduce, vec![dst::Expression::binary(binop, lhs, rhs)]))
        }
        src::Type::Struct(id) => {
            let call = dst::Expression::Call(ctx.eq_helper(id)?, vec![lhs, rhs]);
            if equal {
                Ok(call)
            } else {
                Ok(dst::Expression::UnaryOperation(dst::UnaryOp::LogicalNot, Box::new(call)))
            }
        }
        _ => internal("type can not be compared"),
    }
}

/// Texture and sampler halves of a sampler expression
fn sampler_pair(expr: &src::Expression,
                pre: &mut Vec<dst::Statement>,
                ctx: &mut Context)
                -> TranspileResult<(dst::Expression, dst::Expression)> {
    match *expr {
        src::Expression::Variable(id) => {
            let name = ctx.variable_name(id);
            Ok((dst::Expression::Variable(texture_name(&name)),
                dst::Expression::Variable(sampler_name(&name))))
        }
        src::Expression::ArraySubscript(ref array, ref index) => {
            let (texture, sampler) = sampler_pair(array, pre, ctx)?;
            let index = emit_expression(index, pre, ctx)?;
            Ok((dst::Expression::ArraySubscript(Box::new(texture), Box::new(index.clone())),
                dst::Expression::ArraySubscript(Box::new(sampler), Box::new(index))))
        }
        _ => internal("sampler expression is not a variable"),
    }
}

/// Emit sibling operands in order. When a later operand lifts statements out,
/// earlier operands with side effects are evaluated into temporaries first.
/// Pinned operands are written through and stay in place.
pub fn emit_operands(args: &[&src::Expression],
                     pinned: &[bool],
                     pre: &mut Vec<dst::Statement>,
                     ctx: &mut Context)
                     -> TranspileResult<Vec<dst::Expression>> {
    let last_lift = args.iter().rposition(|arg| ctx.requires_lift(arg));
    let mut emitted = vec![];
    for (index, arg) in args.iter().enumerate() {
        let ty = type_of(arg, ctx)?;
        if ty.is_sampler() {
            let (texture, sampler) = sampler_pair(arg, pre, ctx)?;
            emitted.push(texture);
            emitted.push(sampler);
            continue;
        }
        let value = emit_expression(arg, pre, ctx)?;
        let is_pinned = pinned.get(index).cloned().unwrap_or(false);
        let hoist = match last_lift {
            Some(last) => index < last && !is_pinned && has_side_effects(arg),
            None => false,
        };
        if hoist {
            emitted.push(bind_temp(&ty, value, pre, ctx)?);
        } else {
            emitted.push(value);
        }
    }
    Ok(emitted)
}

/// Evaluate a value into a new temporary and return the temporary
fn bind_temp(ty: &src::Type,
             value: dst::Expression,
             pre: &mut Vec<dst::Statement>,
             ctx: &mut Context)
             -> TranspileResult<dst::Expression> {
    let typename = ctx.convert_type(ty)?;
    let temp = ctx.new_temp();
    pre.push(dst::Statement::Var(dst::VarDef::single(temp.clone(),
                                                     typename,
                                                     Some(dst::Initializer::Expression(value)))));
    Ok(dst::Expression::Variable(temp))
}

fn declare_temp(ty: &src::Type,
                pre: &mut Vec<dst::Statement>,
                ctx: &mut Context)
                -> TranspileResult<String> {
    let typename = ctx.convert_type(ty)?;
    let temp = ctx.new_temp();
    pre.push(dst::Statement::Var(dst::VarDef::single(temp.clone(), typename, None)));
    Ok(temp)
}

/// Statements that evaluate an expression and store it to a variable
fn assign_block(target: &str,
                expr: &src::Expression,
                ctx: &mut Context)
                -> TranspileResult<dst::Statement> {
    let mut statements = vec![];
    let value = emit_expression(expr, &mut statements, ctx)?;
    statements.push(dst::Statement::Expression(dst::Expression::assign(dst::Expression::var(target), value)));
    Ok(dst::Statement::Block(statements))
}

fn constant_block(target: &str, value: bool) -> dst::Statement {
    let value = dst::Expression::Literal(dst::Literal::Bool(value));
    dst::Statement::Block(vec![dst::Statement::Expression(dst::Expression::assign(dst::Expression::var(target), value))])
}

/// c ? a : b evaluated through an if into a temporary
fn lift_ternary(cond: &src::Expression,
                lhs: &src::Expression,
                rhs: &src::Expression,
                pre: &mut Vec<dst::Statement>,
                ctx: &mut Context)
                -> TranspileResult<dst::Expression> {
    let cond = emit_expression(cond, pre, ctx)?;
    let temp = declare_temp(&type_of(lhs, ctx)?, pre, ctx)?;
    let then_block = assign_block(&temp, lhs, ctx)?;
    let else_block = assign_block(&temp, rhs, ctx)?;
    pre.push(dst::Statement::IfElse(cond, Box::new(then_block), Box::new(else_block)));
    Ok(dst::Expression::Variable(temp))
}

/// a && b and a || b only evaluating the right side when it decides the result
fn lift_logical(op: src::BinOp,
                lhs: &src::Expression,
                rhs: &src::Expression,
                pre: &mut Vec<dst::Statement>,
                ctx: &mut Context)
                -> TranspileResult<dst::Expression> {
    let cond = emit_expression(lhs, pre, ctx)?;
    let temp = declare_temp(&src::Type::bool(), pre, ctx)?;
    let evaluated = assign_block(&temp, rhs, ctx)?;
    let statement = if op == src::BinOp::BooleanAnd {
        dst::Statement::IfElse(cond, Box::new(evaluated), Box::new(constant_block(&temp, false)))
    } else {
        dst::Statement::IfElse(cond, Box::new(constant_block(&temp, true)), Box::new(evaluated))
    };
    pre.push(statement);
    Ok(dst::Expression::Variable(temp))
}

fn effect_block(expr: &src::Expression, ctx: &mut Context) -> TranspileResult<dst::Statement> {
    let mut statements = vec![];
    emit_effect(expr, &mut statements, ctx)?;
    Ok(dst::Statement::Block(statements))
}

fn flush_group(group: &mut Vec<dst::Expression>, out: &mut Vec<dst::Statement>) {
    match group.len() {
        0 => {}
        1 => out.extend(group.drain(..).map(dst::Statement::Expression)),
        _ => out.push(dst::Statement::Expression(dst::Expression::Sequence(std::mem::take(group)))),
    }
}

/// Comma separated expressions evaluated for their effects. Runs of
/// expressions that do not lift stay together as one sequence.
fn emit_sequence_effects(exprs: &[src::Expression],
                         out: &mut Vec<dst::Statement>,
                         ctx: &mut Context)
                         -> TranspileResult<()> {
    let mut group = vec![];
    for expr in exprs {
        if ctx.requires_lift(expr) {
            flush_group(&mut group, out);
            emit_effect(expr, out, ctx)?;
        } else {
            group.push(emit_expression(expr, out, ctx)?);
        }
    }
    flush_group(&mut group, out);
    Ok(())
}

/// Emit an expression whose value is discarded
pub fn emit_effect(expr: &src::Expression,
                   out: &mut Vec<dst::Statement>,
                   ctx: &mut Context)
                   -> TranspileResult<()> {
    if !ctx.requires_lift(expr) {
        let expr = emit_expression(expr, out, ctx)?;
        out.push(dst::Statement::Expression(expr));
        return Ok(());
    }
    match *expr {
        src::Expression::TernaryConditional(ref cond, ref lhs, ref rhs) => {
            let cond = emit_expression(cond, out, ctx)?;
            let then_block = effect_block(lhs, ctx)?;
            let else_block = effect_block(rhs, ctx)?;
            out.push(dst::Statement::IfElse(cond, Box::new(then_block), Box::new(else_block)));
        }
        src::Expression::BinaryOperation(src::BinOp::BooleanAnd, ref lhs, ref rhs) => {
            let cond = emit_expression(lhs, out, ctx)?;
            out.push(dst::Statement::If(cond, Box::new(effect_block(rhs, ctx)?)));
        }
        src::Expression::BinaryOperation(src::BinOp::BooleanOr, ref lhs, ref rhs) => {
            let cond = emit_expression(lhs, out, ctx)?;
            let cond = dst::Expression::UnaryOperation(dst::UnaryOp::LogicalNot, Box::new(cond));
            out.push(dst::Statement::If(cond, Box::new(effect_block(rhs, ctx)?)));
        }
        src::Expression::Sequence(ref exprs) => emit_sequence_effects(exprs, out, ctx)?,
        _ => {
            let expr = emit_expression(expr, out, ctx)?;
            out.push(dst::Statement::Expression(expr));
        }
    }
    Ok(())
}

fn is_matrix(ty: &src::Type) -> bool {
    match *ty {
        src::Type::Matrix(_) => true,
        _ => false,
    }
}

/// Matrix products use mul with the operands swapped as matrices are
/// stored transposed
fn is_matrix_product(lhs: &src::Type, rhs: &src::Type) -> bool {
    (is_matrix(lhs) || is_matrix(rhs)) && !lhs.is_scalar() && !rhs.is_scalar()
}

fn emit_binary(op: src::BinOp,
               lhs: &src::Expression,
               rhs: &src::Expression,
               pre: &mut Vec<dst::Statement>,
               ctx: &mut Context)
               -> TranspileResult<dst::Expression> {
    let left_ty = type_of(lhs, ctx)?;
    let right_ty = type_of(rhs, ctx)?;
    let mut operands = emit_operands(&[lhs, rhs], &[], pre, ctx)?;
    let right = operands.pop().ok_or_else(|| TranspileError::Internal("missing operand".to_string()))?;
    let left = operands.pop().ok_or_else(|| TranspileError::Internal("missing operand".to_string()))?;
    let binop = match op {
        src::BinOp::Add => dst::BinOp::Add,
        src::BinOp::Subtract => dst::BinOp::Subtract,
        src::BinOp::Multiply => {
            if is_matrix_product(&left_ty, &right_ty) {
                return Ok(dst::Expression::call("mul", vec![right, left]));
            }
            dst::BinOp::Multiply
        }
        src::BinOp::Divide => dst::BinOp::Divide,
        src::BinOp::LessThan => dst::BinOp::LessThan,
        src::BinOp::LessEqual => dst::BinOp::LessEqual,
        src::BinOp::GreaterThan => dst::BinOp::GreaterThan,
        src::BinOp::GreaterEqual => dst::BinOp::GreaterEqual,
        src::BinOp::Equality | src::BinOp::Inequality => {
            return equality(op, &left_ty, left, right, ctx);
        }
        src::BinOp::BooleanAnd => dst::BinOp::LogicalAnd,
        src::BinOp::BooleanOr => dst::BinOp::LogicalOr,
        src::BinOp::BooleanXor => dst::BinOp::Inequality,
        src::BinOp::Modulus |
        src::BinOp::LeftShift |
        src::BinOp::RightShift |
        src::BinOp::BitwiseAnd |
        src::BinOp::BitwiseOr |
        src::BinOp::BitwiseXor => return internal("reserved operator reached the emitter"),
    };
    Ok(dst::Expression::binary(binop, left, right))
}

/// Emit an assignment target with every non constant index evaluated into
/// a temporary, so the target can be read again or after lifted statements
fn emit_stable_lvalue(expr: &src::Expression,
                      pre: &mut Vec<dst::Statement>,
                      ctx: &mut Context)
                      -> TranspileResult<dst::Expression> {
    match *expr {
        src::Expression::Swizzle(ref vec, ref slots) => {
            let vec = emit_stable_lvalue(vec, pre, ctx)?;
            Ok(dst::Expression::Swizzle(Box::new(vec), slots.iter().map(swizzle_slot).collect()))
        }
        src::Expression::Member(ref composite, ref name) => {
            let composite = emit_stable_lvalue(composite, pre, ctx)?;
            Ok(composite.member(&member_name(name)))
        }
        src::Expression::ArraySubscript(ref array, ref index) => {
            let array = emit_stable_lvalue(array, pre, ctx)?;
            let value = emit_expression(index, pre, ctx)?;
            let index = match **index {
                src::Expression::Literal(_) => value,
                _ => bind_temp(&type_of(index, ctx)?, value, pre, ctx)?,
            };
            Ok(dst::Expression::ArraySubscript(Box::new(array), Box::new(index)))
        }
        _ => emit_expression(expr, pre, ctx),
    }
}

fn emit_assignment(op: src::AssignOp,
                   lhs: &src::Expression,
                   rhs: &src::Expression,
                   pre: &mut Vec<dst::Statement>,
                   ctx: &mut Context)
                   -> TranspileResult<dst::Expression> {
    let left_ty = type_of(lhs, ctx)?;
    let right_ty = type_of(rhs, ctx)?;
    let matrix_product = op == src::AssignOp::Multiply && is_matrix_product(&left_ty, &right_ty);
    // The target is located before the value is computed
    let stable = (ctx.requires_lift(rhs) && (has_side_effects(lhs) || has_side_effects(rhs))) ||
                 (matrix_product && ctx.can_lift() && has_side_effects(lhs));
    let left = if stable {
        emit_stable_lvalue(lhs, pre, ctx)?
    } else {
        emit_expression(lhs, pre, ctx)?
    };
    let right = emit_expression(rhs, pre, ctx)?;
    if matrix_product {
        let product = dst::Expression::call("mul", vec![right, left.clone()]);
        return Ok(dst::Expression::assign(left, product));
    }
    let binop = match op {
        src::AssignOp::Assign => dst::BinOp::Assignment,
        src::AssignOp::Add => dst::BinOp::SumAssignment,
        src::AssignOp::Subtract => dst::BinOp::DifferenceAssignment,
        src::AssignOp::Multiply => dst::BinOp::ProductAssignment,
        src::AssignOp::Divide => dst::BinOp::QuotientAssignment,
        _ => return internal("reserved assignment operator reached the emitter"),
    };
    Ok(dst::Expression::binary(binop, left, right))
}

fn intrinsic_name(intrinsic: Intrinsic) -> Option<&'static str> {
    Some(match intrinsic {
        Intrinsic::Radians => "radians",
        Intrinsic::Degrees => "degrees",
        Intrinsic::Sin => "sin",
        Intrinsic::Cos => "cos",
        Intrinsic::Tan => "tan",
        Intrinsic::Asin => "asin",
        Intrinsic::Acos => "acos",
        Intrinsic::Atan => "atan",
        Intrinsic::Atan2 => "atan2",
        Intrinsic::Pow => "pow",
        Intrinsic::Exp => "exp",
        Intrinsic::Log => "log",
        Intrinsic::Exp2 => "exp2",
        Intrinsic::Log2 => "log2",
        Intrinsic::Sqrt => "sqrt",
        Intrinsic::InverseSqrt => "rsqrt",
        Intrinsic::Abs => "abs",
        Intrinsic::Floor => "floor",
        Intrinsic::Ceil => "ceil",
        Intrinsic::Fract => "frac",
        Intrinsic::Min => "min",
        Intrinsic::Max => "max",
        Intrinsic::Clamp => "clamp",
        Intrinsic::Mix => "lerp",
        Intrinsic::Step => "step",
        Intrinsic::SmoothStep => "smoothstep",
        Intrinsic::Length => "length",
        Intrinsic::Distance => "distance",
        Intrinsic::Dot => "dot",
        Intrinsic::Cross => "cross",
        Intrinsic::Normalize => "normalize",
        Intrinsic::FaceForward => "faceforward",
        Intrinsic::Reflect => "reflect",
        Intrinsic::Refract => "refract",
        Intrinsic::Any => "any",
        Intrinsic::All => "all",
        Intrinsic::DFdx => "ddx",
        Intrinsic::DFdy => "ddy",
        _ => return None,
    })
}

fn texture_lookup(intrinsic: Intrinsic, coord: &src::Type) -> Option<TextureLookup> {
    let dim = coord.get_num_components().unwrap_or(0);
    Some(match intrinsic {
        Intrinsic::Texture2D => TextureLookup::Texture2D,
        Intrinsic::Texture2DBias => TextureLookup::Texture2DBias,
        Intrinsic::Texture2DProj => TextureLookup::Texture2DProj(dim),
        Intrinsic::Texture2DProjBias => TextureLookup::Texture2DProjBias(dim),
        Intrinsic::Texture2DLod => TextureLookup::Texture2DLod,
        Intrinsic::Texture2DProjLod => TextureLookup::Texture2DProjLod(dim),
        Intrinsic::TextureCube => TextureLookup::TextureCube,
        Intrinsic::TextureCubeBias => TextureLookup::TextureCubeBias,
        Intrinsic::TextureCubeLod => TextureLookup::TextureCubeLod,
        _ => return None,
    })
}

fn emit_intrinsic(intrinsic: Intrinsic,
                  args: &[src::Expression],
                  ty: &src::Type,
                  pre: &mut Vec<dst::Statement>,
                  ctx: &mut Context)
                  -> TranspileResult<dst::Expression> {
    let arg_types = args.iter().map(|arg| type_of(arg, ctx)).collect::<TranspileResult<Vec<_>>>()?;
    let operands = args.iter().collect::<Vec<_>>();
    let mut emitted = emit_operands(&operands, &[], pre, ctx)?;
    let width = |index: usize| arg_types.get(index).and_then(|ty| ty.get_num_components()).unwrap_or(1);

    if let Some(name) = intrinsic_name(intrinsic) {
        return Ok(dst::Expression::call(name, emitted));
    }
    if intrinsic.is_texture_lookup() {
        let coord = arg_types.get(1).cloned().unwrap_or(src::Type::Void);
        let lookup = texture_lookup(intrinsic, &coord)
            .ok_or_else(|| TranspileError::Internal("unknown texture lookup".to_string()))?;
        let stage = ctx.module.stage;
        let name = ctx.use_fragment(Fragment::Texture(lookup, stage));
        return Ok(dst::Expression::Call(name, emitted));
    }

    let binop = match intrinsic {
        Intrinsic::Sign => {
            let typename = ctx.convert_type(ty)?;
            return Ok(dst::Expression::Cast(typename, Box::new(dst::Expression::call("sign", emitted))));
        }
        Intrinsic::Mod => {
            let name = ctx.use_fragment(Fragment::Mod(width(0), width(1)));
            return Ok(dst::Expression::Call(name, emitted));
        }
        Intrinsic::Fwidth => {
            let name = ctx.use_fragment(Fragment::Fwidth(width(0)));
            return Ok(dst::Expression::Call(name, emitted));
        }
        Intrinsic::Not => {
            let value = emitted.pop().ok_or_else(|| TranspileError::Internal("missing argument".to_string()))?;
            return Ok(dst::Expression::UnaryOperation(dst::UnaryOp::LogicalNot, Box::new(value)));
        }
        Intrinsic::MatrixCompMult => dst::BinOp::Multiply,
        Intrinsic::LessThan => dst::BinOp::LessThan,
        Intrinsic::LessThanEqual => dst::BinOp::LessEqual,
        Intrinsic::GreaterThan => dst::BinOp::GreaterThan,
        Intrinsic::GreaterThanEqual => dst::BinOp::GreaterEqual,
        Intrinsic::Equal => dst::BinOp::Equality,
        Intrinsic::NotEqual => dst::BinOp::Inequality,
        _ => return internal("intrinsic has no translation"),
    };
    if emitted.len() != 2 {
        return internal("componentwise intrinsic expects two arguments");
    }
    let right = emitted.remove(1);
    let left = emitted.remove(0);
    Ok(dst::Expression::binary(binop, left, right))
}

/// Cast a scalar or vector argument to a different component type
fn cast_components(expr: dst::Expression, ty: &src::Type, to: src::ScalarType) -> dst::Expression {
    match *ty {
        src::Type::Scalar(from) if from != to => dst::Expression::Cast(dst::Type::Scalar(convert_scalar(to)), Box::new(expr)),
        src::Type::Vector(from, dim) if from != to => {
            dst::Expression::Cast(dst::Type::Vector(convert_scalar(to), dim), Box::new(expr))
        }
        _ => expr,
    }
}

fn emit_constructor(ty: &src::Type,
                    args: &[src::Expression],
                    pre: &mut Vec<dst::Statement>,
                    ctx: &mut Context)
                    -> TranspileResult<dst::Expression> {
    let arg_types = args.iter().map(|arg| type_of(arg, ctx)).collect::<TranspileResult<Vec<_>>>()?;
    let operands = args.iter().collect::<Vec<_>>();
    let mut emitted = emit_operands(&operands, &[], pre, ctx)?;
    if emitted.len() != arg_types.len() || emitted.is_empty() {
        return internal("constructor arguments do not match their types");
    }

    if emitted.len() > 1 {
        let scalar = ty.to_scalar().unwrap_or(src::ScalarType::Float);
        let components = emitted.into_iter()
            .zip(&arg_types)
            .map(|(expr, arg_ty)| cast_components(expr, arg_ty, scalar))
            .collect();
        return Ok(dst::Expression::NumericConstructor(ctx.convert_type(ty)?, components));
    }

    let arg = emitted.remove(0);
    let arg_ty = &arg_types[0];
    match (ty, arg_ty) {
        (&src::Type::Scalar(to), &src::Type::Scalar(from)) => {
            Ok(if to == from {
                arg
            } else {
                dst::Expression::Cast(dst::Type::Scalar(convert_scalar(to)), Box::new(arg))
            })
        }
        (&src::Type::Scalar(to), &src::Type::Vector(from, _)) => {
            let first = dst::Expression::Swizzle(Box::new(arg), first_slots(1));
            Ok(cast_components(first, &src::Type::Scalar(from), to))
        }
        (&src::Type::Scalar(to), &src::Type::Matrix(_)) => {
            let first = arg.member("_m00");
            Ok(cast_components(first, &src::Type::float(), to))
        }
        (&src::Type::Vector(_, _), &src::Type::Scalar(_)) => {
            Ok(dst::Expression::Cast(ctx.convert_type(ty)?, Box::new(arg)))
        }
        (&src::Type::Vector(to, dim), &src::Type::Vector(from, from_dim)) => {
            let value = if dim == from_dim {
                arg
            } else {
                dst::Expression::Swizzle(Box::new(arg), first_slots(dim))
            };
            Ok(cast_components(value, &src::Type::Vector(from, dim), to))
        }
        (&src::Type::Vector(to, dim), &src::Type::Matrix(size)) if has_side_effects(&args[0]) => {
            let name = ctx.use_fragment(Fragment::VectorFromMatrix(dim, size));
            let value = dst::Expression::Call(name, vec![arg]);
            Ok(cast_components(value, &src::Type::Vector(src::ScalarType::Float, dim), to))
        }
        (&src::Type::Vector(_, dim), &src::Type::Matrix(size)) => {
            let components = (0..dim)
                .map(|k| arg.clone().member(&format!("_m{}{}", k / size, k % size)))
                .collect();
            Ok(dst::Expression::NumericConstructor(ctx.convert_type(ty)?, components))
        }
        (&src::Type::Matrix(size), &src::Type::Scalar(from)) => {
            let name = ctx.use_fragment(Fragment::MatrixFromScalar(size));
            let value = cast_components(arg, &src::Type::Scalar(from), src::ScalarType::Float);
            Ok(dst::Expression::Call(name, vec![value]))
        }
        (&src::Type::Matrix(size), &src::Type::Matrix(from)) => {
            if size == from {
                Ok(arg)
            } else {
                let name = ctx.use_fragment(Fragment::MatrixFromMatrix(size, from));
                Ok(dst::Expression::Call(name, vec![arg]))
            }
        }
        (&src::Type::Matrix(size), &src::Type::Vector(_, _)) => {
            let value = cast_components(arg, arg_ty, src::ScalarType::Float);
            Ok(dst::Expression::NumericConstructor(dst::Type::Matrix(size), vec![value]))
        }
        _ => internal("invalid constructor reached the emitter"),
    }
}

pub fn emit_expression(expr: &src::Expression,
                       pre: &mut Vec<dst::Statement>,
                       ctx: &mut Context)
                       -> TranspileResult<dst::Expression> {
    match *expr {
        src::Expression::Literal(ref value) => Ok(dst::Expression::Literal(literal(value))),
        src::Expression::Variable(id) => {
            if ctx.table.variable(id).ty.is_sampler() {
                return internal("sampler used outside of a call");
            }
            Ok(dst::Expression::Variable(ctx.variable_name(id)))
        }
        src::Expression::Builtin(builtin) => Ok(dst::Expression::var(builtin.get_name())),
        src::Expression::UnaryOperation(op, ref inner) => {
            let op = match op {
                src::UnaryOp::PrefixIncrement => dst::UnaryOp::PrefixIncrement,
                src::UnaryOp::PrefixDecrement => dst::UnaryOp::PrefixDecrement,
                src::UnaryOp::PostfixIncrement => dst::UnaryOp::PostfixIncrement,
                src::UnaryOp::PostfixDecrement => dst::UnaryOp::PostfixDecrement,
                src::UnaryOp::Plus => dst::UnaryOp::Plus,
                src::UnaryOp::Minus => dst::UnaryOp::Minus,
                src::UnaryOp::LogicalNot => dst::UnaryOp::LogicalNot,
                src::UnaryOp::BitwiseNot => return internal("reserved operator reached the emitter"),
            };
            let inner = emit_expression(inner, pre, ctx)?;
            Ok(dst::Expression::UnaryOperation(op, Box::new(inner)))
        }
        src::Expression::BinaryOperation(op, ref lhs, ref rhs) => {
            let short_circuit = op == src::BinOp::BooleanAnd || op == src::BinOp::BooleanOr;
            if short_circuit && ctx.requires_lift(expr) {
                return lift_logical(op, lhs, rhs, pre, ctx);
            }
            emit_binary(op, lhs, rhs, pre, ctx)
        }
        src::Expression::Assignment(op, ref lhs, ref rhs) => emit_assignment(op, lhs, rhs, pre, ctx),
        src::Expression::TernaryConditional(ref cond, ref lhs, ref rhs) => {
            if ctx.requires_lift(expr) {
                return lift_ternary(cond, lhs, rhs, pre, ctx);
            }
            let cond = emit_expression(cond, pre, ctx)?;
            let lhs = emit_expression(lhs, pre, ctx)?;
            let rhs = emit_expression(rhs, pre, ctx)?;
            Ok(dst::Expression::TernaryConditional(Box::new(cond), Box::new(lhs), Box::new(rhs)))
        }
        src::Expression::Sequence(ref exprs) => {
            let (last, rest) = match exprs.split_last() {
                Some(split) => split,
                None => return internal("empty sequence"),
            };
            if ctx.requires_lift(expr) {
                emit_sequence_effects(rest, pre, ctx)?;
                return emit_expression(last, pre, ctx);
            }
            let exprs = exprs.iter().map(|expr| emit_expression(expr, pre, ctx)).collect::<TranspileResult<Vec<_>>>()?;
            Ok(dst::Expression::Sequence(exprs))
        }
        src::Expression::Swizzle(ref vec, ref slots) => {
            let vec = emit_expression(vec, pre, ctx)?;
            Ok(dst::Expression::Swizzle(Box::new(vec), slots.iter().map(swizzle_slot).collect()))
        }
        src::Expression::ArraySubscript(ref array, ref index) => {
            let mut operands = emit_operands(&[&**array, &**index], &[], pre, ctx)?;
            let index = operands.pop().ok_or_else(|| TranspileError::Internal("missing index".to_string()))?;
            let array = operands.pop().ok_or_else(|| TranspileError::Internal("missing array".to_string()))?;
            Ok(dst::Expression::ArraySubscript(Box::new(array), Box::new(index)))
        }
        src::Expression::Member(ref composite, ref name) => {
            let composite = emit_expression(composite, pre, ctx)?;
            Ok(composite.member(&member_name(name)))
        }
        src::Expression::Call(id, ref args) => {
            let pinned = ctx.table
                .function(id)
                .params
                .iter()
                .map(|param| param.qualifier != src::ParamQualifier::In)
                .collect::<Vec<_>>();
            let operands = args.iter().collect::<Vec<_>>();
            let args = emit_operands(&operands, &pinned, pre, ctx)?;
            Ok(dst::Expression::Call(ctx.function_name(id), args))
        }
        src::Expression::Intrinsic(intrinsic, ref args, ref ty) => {
            emit_intrinsic(intrinsic, args, ty, pre, ctx)
        }
        src::Expression::Constructor(ref ty, ref args) => emit_constructor(ty, args, pre, ctx),
        src::Expression::StructConstructor(id, ref args) => {
            let operands = args.iter().collect::<Vec<_>>();
            let args = emit_operands(&operands, &[], pre, ctx)?;
            Ok(dst::Expression::Call(ctx.ctor_helper(id)?, args))
        }
    }
}
