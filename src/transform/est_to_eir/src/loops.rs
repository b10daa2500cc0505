use glt_shared::*;
use glt_lang_est as ast;
use glt_lang_eir as ir;
use glt_lang_eir::{Type, Constant, ScalarConstant, VariableId, UnaryOp, BinOp, AssignOp};
use super::typer::{Context, Symbol, TyperResult, fail, parse_body, parse_declaration_variables};
use super::expressions::parse_expr;

/// A number taken from a loop header with where it came from
#[derive(PartialEq, Debug, Clone, Copy)]
struct LoopConstant {
    value: f64,
    indirect: bool,
}

fn to_number(value: &Constant) -> Option<f64> {
    match value.to_scalar()? {
        ScalarConstant::Int(i) => Some(i as f64),
        ScalarConstant::Float(f) => Some(f as f64),
        ScalarConstant::Bool(_) => None,
    }
}

/// Parse a loop in the restricted form loops must take. The index is scoped
/// to the loop and can not be written in the body.
pub fn parse_for(init: &ast::InitStatement,
                 cond: &Option<ast::Condition>,
                 iteration: &Option<Located<ast::Expression>>,
                 body: &Located<ast::Statement>,
                 location: FileLocation,
                 ctx: &mut Context)
                 -> TyperResult<ir::Statement> {
    ctx.with_scope(|ctx| {
        let (init, index, start) = parse_for_init(init, location, ctx)?;
        let (condition, bound) = parse_for_condition(cond, index, location, ctx)?;
        let (iteration, step) = parse_for_iteration(iteration, index, location, ctx)?;

        ctx.loop_indices.push(index);
        ctx.loop_depth += 1;
        let body = parse_body(body, ctx);
        ctx.loop_depth -= 1;
        ctx.loop_indices.pop();
        let body = body?;

        Ok(ir::Statement::For(ir::ForLoop {
            init,
            condition,
            iteration,
            body: Box::new(body),
            iterations: count_iterations(start, bound, step),
        }))
    })
}

fn parse_for_init(init: &ast::InitStatement,
                  location: FileLocation,
                  ctx: &mut Context)
                  -> TyperResult<(ir::VarDef, VariableId, LoopConstant)> {
    let invalid = |location| {
        fail(ErrorCode::InvalidForLoopInit,
             location,
             "loop must declare one int or float index initialized with a constant".to_string())
    };
    let declaration = match *init {
        ast::InitStatement::Declaration(ref declaration) => declaration,
        _ => return invalid(location),
    };
    let valid_form = declaration.qualifier.is_none() && declaration.declarators.len() == 1 &&
                     declaration.declarators[0].initializer.is_some() &&
                     declaration.declarators[0].array_dim.is_none();
    if !valid_form {
        return invalid(location);
    }
    let index_location = declaration.declarators[0].name.location;
    let variable = match parse_declaration_variables(declaration, ctx)?.pop() {
        Some(variable) => variable,
        None => return invalid(location),
    };
    let ty = &ctx.table.variable(variable.def.id).ty;
    if *ty != Type::int() && *ty != Type::float() {
        return invalid(index_location);
    }
    let start = match variable.value.as_ref().and_then(to_number) {
        Some(value) => value,
        None => return invalid(index_location),
    };
    let id = variable.def.id;
    let start = LoopConstant {
        value: start,
        indirect: variable.indirect,
    };
    Ok((variable.def, id, start))
}

fn is_index(expr: &Located<ast::Expression>, index: VariableId, ctx: &Context) -> bool {
    match expr.node {
        ast::Expression::Variable(ref name) => ctx.find_symbol(name) == Some(&Symbol::Variable(index)),
        _ => false,
    }
}

/// Parse the constant side of a loop header, which must match the index type
fn parse_loop_constant(expr: &Located<ast::Expression>,
                       index: VariableId,
                       ctx: &mut Context)
                       -> TyperResult<Option<(ir::Expression, LoopConstant)>> {
    let typed = parse_expr(expr, ctx)?;
    if typed.ty != ctx.table.variable(index).ty {
        return Ok(None);
    }
    Ok(typed.value.as_ref().and_then(to_number).map(|value| {
        (typed.expr,
         LoopConstant {
             value,
             indirect: typed.indirect,
         })
    }))
}

fn parse_for_condition(cond: &Option<ast::Condition>,
                       index: VariableId,
                       location: FileLocation,
                       ctx: &mut Context)
                       -> TyperResult<(ir::Expression, LoopConstant)> {
    let invalid = |location| {
        fail(ErrorCode::InvalidForLoopCond,
             location,
             "loop condition must compare the index with a constant".to_string())
    };
    let expr = match *cond {
        Some(ast::Condition::Expr(ref expr)) => expr,
        _ => return invalid(location),
    };
    let (op, lhs, rhs) = match expr.node {
        ast::Expression::BinaryOperation(op, ref lhs, ref rhs) => (op, lhs, rhs),
        _ => return invalid(expr.location),
    };
    let relational = matches!(op,
                              BinOp::LessThan | BinOp::LessEqual | BinOp::GreaterThan |
                              BinOp::GreaterEqual | BinOp::Inequality);
    if !relational || !is_index(lhs, index, ctx) {
        return invalid(expr.location);
    }
    let (bound_expr, bound) = match parse_loop_constant(rhs, index, ctx)? {
        Some(bound) => bound,
        None => return invalid(rhs.location),
    };
    let condition = ir::Expression::BinaryOperation(op,
                                                    Box::new(ir::Expression::Variable(index)),
                                                    Box::new(bound_expr));
    Ok((condition, bound))
}

fn parse_for_iteration(iteration: &Option<Located<ast::Expression>>,
                       index: VariableId,
                       location: FileLocation,
                       ctx: &mut Context)
                       -> TyperResult<(ir::Expression, LoopConstant)> {
    let invalid = |location| {
        fail(ErrorCode::InvalidForLoopIter,
             location,
             "loop iteration must step the index by a constant".to_string())
    };
    let expr = match *iteration {
        Some(ref expr) => expr,
        None => return invalid(location),
    };
    let variable = Box::new(ir::Expression::Variable(index));
    match expr.node {
        ast::Expression::UnaryOperation(op, ref inner) if is_index(inner, index, ctx) => {
            let value = match op {
                UnaryOp::PrefixIncrement | UnaryOp::PostfixIncrement => 1.0,
                UnaryOp::PrefixDecrement | UnaryOp::PostfixDecrement => -1.0,
                _ => return invalid(expr.location),
            };
            let step = LoopConstant {
                value,
                indirect: false,
            };
            Ok((ir::Expression::UnaryOperation(op, variable), step))
        }
        ast::Expression::Assignment(op, ref lhs, ref rhs) if is_index(lhs, index, ctx) => {
            let sign = match op {
                AssignOp::Add => 1.0,
                AssignOp::Subtract => -1.0,
                _ => return invalid(expr.location),
            };
            let (step_expr, step) = match parse_loop_constant(rhs, index, ctx)? {
                Some(step) => step,
                None => return invalid(rhs.location),
            };
            let step = LoopConstant {
                value: sign * step.value,
                indirect: step.indirect,
            };
            Ok((ir::Expression::Assignment(op, variable, Box::new(step_expr)), step))
        }
        _ => invalid(expr.location),
    }
}

/// Iterations a loop runs for, when every part of its header is a direct
/// constant. The direction of the comparison is not considered.
fn count_iterations(start: LoopConstant, bound: LoopConstant, step: LoopConstant) -> Option<u64> {
    if start.indirect || bound.indirect || step.indirect {
        return None;
    }
    if step.value == 0.0 {
        return Some(0);
    }
    Some(((bound.value - start.value).abs() / step.value.abs()).ceil() as u64)
}

#[cfg(test)]
use super::typer::{error_codes, verify};

#[cfg(test)]
fn loop_errors(header: &str) -> Vec<ErrorCode> {
    error_codes(&format!("void main() {{ for ({}) {{}} }}", header), ShaderStage::Vertex)
}

#[cfg(test)]
fn iterations(source: &str) -> Option<u64> {
    let module = verify(source, ShaderStage::Vertex).expect("verify failed");
    for root in &module.root_definitions {
        if let ir::RootDefinition::Function(ref function) = *root {
            for statement in &function.body {
                if let ir::Statement::For(ref for_loop) = *statement {
                    return for_loop.iterations;
                }
            }
        }
    }
    panic!("no loop found")
}

#[test]
fn test_loop_forms() {
    assert_eq!(loop_errors("int i = 0; i < 10; i++"), vec![]);
    assert_eq!(loop_errors("float f = 1.0; f >= 0.0; f -= 0.1"), vec![]);
    assert_eq!(loop_errors("int i = 10; i != 0; --i"), vec![]);
    assert_eq!(loop_errors("int i = 0, j = 0; i < 10; i++"), vec![ErrorCode::InvalidForLoopInit]);
    assert_eq!(loop_errors("bool b = true; b != false; b++"), vec![ErrorCode::InvalidForLoopInit]);
    assert_eq!(loop_errors("; true; "), vec![ErrorCode::InvalidForLoopInit]);
    assert_eq!(error_codes("uniform int n; void main() { for (int i = n; i < 10; i++) {} }",
                           ShaderStage::Vertex),
               vec![ErrorCode::InvalidForLoopInit]);
    assert_eq!(loop_errors("int i = 0; 10 > i; i++"), vec![ErrorCode::InvalidForLoopCond]);
    assert_eq!(loop_errors("int i = 0; i == 10; i++"), vec![ErrorCode::InvalidForLoopCond]);
    assert_eq!(loop_errors("int i = 0; i < 10.0; i++"), vec![ErrorCode::InvalidForLoopCond]);
    assert_eq!(loop_errors("int i = 0; i < 10; i *= 2"), vec![ErrorCode::InvalidForLoopIter]);
    assert_eq!(loop_errors("int i = 0; i < 10; "), vec![ErrorCode::InvalidForLoopIter]);
    assert_eq!(loop_errors("int i = 0; i < 10; i = i + 1"), vec![ErrorCode::InvalidForLoopIter]);
}

#[test]
fn test_loop_index_writes() {
    let vs = ShaderStage::Vertex;
    assert_eq!(error_codes("void main() { for (int i = 0; i < 2; i++) { i = 1; } }", vs),
               vec![ErrorCode::InvalidForLoopIndexWrite]);
    assert_eq!(error_codes("void main() { for (int i = 0; i < 2; i++) { i++; } }", vs),
               vec![ErrorCode::InvalidForLoopIndexWrite]);
    assert_eq!(error_codes("void f(out int x) { x = 1; } \
                            void main() { for (int i = 0; i < 2; i++) { f(i); } }",
                           vs),
               vec![ErrorCode::LoopIndexOutParam]);
    assert_eq!(error_codes("void f(int x) {} void main() { for (int i = 0; i < 2; i++) { f(i); } }",
                           vs),
               vec![]);
    assert_eq!(error_codes("void main() { for (int i = 0; i < 2; i++) {} int i = 3; i = 4; }", vs),
               vec![]);
}

#[test]
fn test_iteration_counts() {
    assert_eq!(iterations("void main() { for (int i = 0; i < 10; i++) {} }"), Some(10));
    assert_eq!(iterations("void main() { for (int i = 10; i > 0; i -= 3) {} }"), Some(4));
    assert_eq!(iterations("void main() { for (float f = 0.0; f < 1.0; f += 0.25) {} }"), Some(4));
    assert_eq!(iterations("void main() { for (int i = 0; i < 100; i += 0) {} }"), Some(0));
    assert_eq!(iterations("const int n = true ? 5 : 6; \
                           void main() { for (int i = 0; i < n; i++) {} }"),
               None);
    assert_eq!(iterations("struct S { int n; }; const S s = S(5); \
                           void main() { for (int i = 0; i < s.n; i++) {} }"),
               None);
}
