use std::slice;
use glt_lang_eir as src;
use glt_lang_hst as dst;
use super::transpiler::{Context, TranspileResult};
use super::expressions::{emit_expression, emit_effect, zero_initializer};

/// Loops with a known trip count up to this are unrolled
pub const UNROLL_LIMIT: u64 = 64;

/// Loops with an unknown trip count are optimistically unrolled. A count of
/// zero comes from a zero step and is left as a loop.
pub fn loop_attribute(iterations: Option<u64>) -> dst::LoopAttribute {
    match iterations {
        None => dst::LoopAttribute::Unroll,
        Some(0) => dst::LoopAttribute::Loop,
        Some(count) if count <= UNROLL_LIMIT => dst::LoopAttribute::Unroll,
        Some(_) => dst::LoopAttribute::Loop,
    }
}

pub fn emit_statements(statements: &[src::Statement], ctx: &mut Context) -> TranspileResult<Vec<dst::Statement>> {
    let mut out = vec![];
    for statement in statements {
        emit_statement(statement, &mut out, ctx)?;
    }
    Ok(out)
}

/// Bodies of control flow are always emitted as blocks
fn emit_body(statement: &src::Statement, ctx: &mut Context) -> TranspileResult<Vec<dst::Statement>> {
    match *statement {
        src::Statement::Block(ref statements) => emit_statements(statements, ctx),
        ref other => emit_statements(slice::from_ref(other), ctx),
    }
}

fn break_unless(cond: dst::Expression) -> dst::Statement {
    let negated = dst::Expression::UnaryOperation(dst::UnaryOp::LogicalNot, Box::new(cond));
    dst::Statement::If(negated, Box::new(dst::Statement::Block(vec![dst::Statement::Break])))
}

fn infinite_loop(body: Vec<dst::Statement>) -> dst::Statement {
    dst::Statement::While(dst::Expression::Literal(dst::Literal::Bool(true)),
                          Box::new(dst::Statement::Block(body)))
}

fn emit_declarator(def: &src::VarDef,
                   out: &mut Vec<dst::Statement>,
                   ctx: &mut Context)
                   -> TranspileResult<dst::Declarator> {
    let ty = &ctx.table.variable(def.id).ty;
    let init = match def.init {
        Some(ref init) if def.constant_init => {
            ctx.with_lifting(false, |ctx| emit_expression(init, out, ctx))?
        }
        Some(ref init) => emit_expression(init, out, ctx)?,
        None => return Ok(declarator(def, ty, Some(zero_initializer(ty, ctx)?), ctx)),
    };
    Ok(declarator(def, ty, Some(dst::Initializer::Expression(init)), ctx))
}

fn declarator(def: &src::VarDef,
              ty: &src::Type,
              init: Option<dst::Initializer>,
              ctx: &Context)
              -> dst::Declarator {
    dst::Declarator {
        name: ctx.variable_name(def.id),
        array_dim: match *ty {
            src::Type::Array(_, size) => Some(size),
            _ => None,
        },
        init,
    }
}

fn base_typename(def: &src::VarDef, ctx: &mut Context) -> TranspileResult<dst::Type> {
    let table = ctx.table;
    let ty = &table.variable(def.id).ty;
    match *ty {
        src::Type::Array(ref inner, _) => ctx.convert_type(inner),
        ref ty => ctx.convert_type(ty),
    }
}

/// Declare variables sharing a base type. The list is split into single
/// declarations when an initializer lifts statements, so each variable is
/// declared before the initializers that follow it run.
pub fn emit_vardefs(defs: &[src::VarDef], out: &mut Vec<dst::Statement>, ctx: &mut Context) -> TranspileResult<()> {
    let first = match defs.first() {
        Some(first) => first,
        None => return Ok(()),
    };
    let split = defs.iter().any(|def| {
        !def.constant_init && def.init.as_ref().map_or(false, |init| ctx.requires_lift(init))
    });
    if split {
        for def in defs {
            let typename = base_typename(def, ctx)?;
            let declarator = emit_declarator(def, out, ctx)?;
            out.push(dst::Statement::Var(dst::VarDef {
                typename,
                declarators: vec![declarator],
            }));
        }
    } else {
        let typename = base_typename(first, ctx)?;
        let mut declarators = vec![];
        for def in defs {
            declarators.push(emit_declarator(def, out, ctx)?);
        }
        out.push(dst::Statement::Var(dst::VarDef {
            typename,
            declarators,
        }));
    }
    Ok(())
}

fn emit_for(lp: &src::ForLoop, out: &mut Vec<dst::Statement>, ctx: &mut Context) -> TranspileResult<()> {
    let (init, condition, iteration) = ctx.with_lifting(false, |ctx| -> TranspileResult<_> {
        let mut pre = vec![];
        let typename = base_typename(&lp.init, ctx)?;
        let declarator = emit_declarator(&lp.init, &mut pre, ctx)?;
        let init = dst::VarDef {
            typename,
            declarators: vec![declarator],
        };
        let condition = emit_expression(&lp.condition, &mut pre, ctx)?;
        let iteration = emit_expression(&lp.iteration, &mut pre, ctx)?;
        Ok((init, condition, iteration))
    })?;
    let body = emit_body(&lp.body, ctx)?;
    out.push(dst::Statement::For(loop_attribute(lp.iterations),
                                 init,
                                 condition,
                                 iteration,
                                 Box::new(dst::Statement::Block(body))));
    Ok(())
}

fn emit_while(cond: &src::Condition,
              body: &src::Statement,
              out: &mut Vec<dst::Statement>,
              ctx: &mut Context)
              -> TranspileResult<()> {
    if let src::Condition::Expr(ref expr) = *cond {
        if !ctx.requires_lift(expr) {
            let cond = emit_expression(expr, out, ctx)?;
            let body = emit_body(body, ctx)?;
            out.push(dst::Statement::While(cond, Box::new(dst::Statement::Block(body))));
            return Ok(());
        }
    }
    // The condition is evaluated at the top of an infinite loop
    let mut inner = vec![];
    let cond = match *cond {
        src::Condition::Expr(ref expr) => emit_expression(expr, &mut inner, ctx)?,
        src::Condition::Assignment(ref def) => {
            emit_vardefs(slice::from_ref(def), &mut inner, ctx)?;
            dst::Expression::Variable(ctx.variable_name(def.id))
        }
    };
    inner.push(break_unless(cond));
    inner.extend(emit_body(body, ctx)?);
    out.push(infinite_loop(inner));
    Ok(())
}

fn emit_do_while(body: &src::Statement,
                 cond: &src::Expression,
                 out: &mut Vec<dst::Statement>,
                 ctx: &mut Context)
                 -> TranspileResult<()> {
    let body = emit_body(body, ctx)?;
    if !ctx.requires_lift(cond) {
        let cond = emit_expression(cond, out, ctx)?;
        out.push(dst::Statement::DoWhile(Box::new(dst::Statement::Block(body)), cond));
        return Ok(());
    }
    // The condition is checked at the top of every pass but the first so a
    // continue in the body still reaches it
    let first = ctx.new_temp();
    let flag_type = ctx.convert_type(&src::Type::Scalar(src::ScalarType::Bool))?;
    let flag = |value| dst::Expression::Literal(dst::Literal::Bool(value));
    out.push(dst::Statement::Var(dst::VarDef::single(first.clone(),
                                                     flag_type,
                                                     Some(dst::Initializer::Expression(flag(true))))));
    let mut check = vec![];
    let cond = emit_expression(cond, &mut check, ctx)?;
    check.push(break_unless(cond));
    let not_first = dst::Expression::UnaryOperation(dst::UnaryOp::LogicalNot, Box::new(dst::Expression::var(&first)));
    let mut inner = vec![dst::Statement::If(not_first, Box::new(dst::Statement::Block(check))),
                         dst::Statement::Expression(dst::Expression::assign(dst::Expression::var(&first), flag(false)))];
    inner.extend(body);
    out.push(infinite_loop(inner));
    Ok(())
}

pub fn emit_statement(statement: &src::Statement,
                      out: &mut Vec<dst::Statement>,
                      ctx: &mut Context)
                      -> TranspileResult<()> {
    match *statement {
        src::Statement::Expression(ref expr) => emit_effect(expr, out, ctx)?,
        src::Statement::Var(ref defs) => emit_vardefs(defs, out, ctx)?,
        src::Statement::Block(ref statements) => {
            out.push(dst::Statement::Block(emit_statements(statements, ctx)?));
        }
        src::Statement::If(ref cond, ref then_body, ref else_body) => {
            let cond = emit_expression(cond, out, ctx)?;
            let then_body = Box::new(dst::Statement::Block(emit_body(then_body, ctx)?));
            out.push(match *else_body {
                Some(ref else_body) => {
                    let else_body = Box::new(dst::Statement::Block(emit_body(else_body, ctx)?));
                    dst::Statement::IfElse(cond, then_body, else_body)
                }
                None => dst::Statement::If(cond, then_body),
            });
        }
        src::Statement::For(ref lp) => emit_for(lp, out, ctx)?,
        src::Statement::While(ref cond, ref body) => emit_while(cond, body, out, ctx)?,
        src::Statement::DoWhile(ref body, ref cond) => emit_do_while(body, cond, out, ctx)?,
        src::Statement::Break => out.push(dst::Statement::Break),
        src::Statement::Continue => out.push(dst::Statement::Continue),
        src::Statement::Discard => out.push(dst::Statement::Discard),
        src::Statement::Return(ref expr) => {
            let expr = match *expr {
                Some(ref expr) => Some(emit_expression(expr, out, ctx)?),
                None => None,
            };
            out.push(dst::Statement::Return(expr));
        }
    }
    Ok(())
}

#[cfg(test)]
use glt_shared::{ShaderStage, TranslateOptions};

#[cfg(test)]
fn function_body(source: &str) -> String {
    super::transpiler::transpile_source(source, ShaderStage::Vertex, TranslateOptions::DISABLE_WRITE_INPUTS).1
}

#[test]
fn test_loop_attribute() {
    assert_eq!(loop_attribute(None), dst::LoopAttribute::Unroll);
    assert_eq!(loop_attribute(Some(0)), dst::LoopAttribute::Loop);
    assert_eq!(loop_attribute(Some(64)), dst::LoopAttribute::Unroll);
    assert_eq!(loop_attribute(Some(65)), dst::LoopAttribute::Loop);
}

#[test]
fn test_loop_hints() {
    let unrolled = function_body("void foo() { for (int i = 0; i < 64; i++) { } }");
    assert!(unrolled.contains("[unroll]\nfor (int var_2_1=0;(var_2_1<64);(var_2_1++))\n{\n}\n"));
    let looped = function_body("void foo() { for (int i = 0; i < 65; i++) { } }");
    assert!(looped.contains("[loop]\nfor ("));
}

#[test]
fn test_sequence_kept_in_order() {
    let hlsl = function_body("void foo() { float x; x = 1.0, x += 2.0; }");
    assert!(hlsl.contains("\nvar_1_1=1.000000e+000,var_1_1+=2.000000e+000;\n"));
}

#[test]
fn test_ternary_lifted() {
    let hlsl = function_body("void foo() { float a; float b; a = (b < 0.0) ? 1.0 : 2.0; }");
    assert_eq!(hlsl,
               "void fn_0_0()\n{\nfloat var_1_1=0.000000e+000;\nfloat var_1_2=0.000000e+000;\n\
                float tmp_0;\nif ((var_1_2<0.000000e+000))\n{\ntmp_0=1.000000e+000;\n}\nelse\n{\n\
                tmp_0=2.000000e+000;\n}\nvar_1_1=tmp_0;\n}\n");
}

#[test]
fn test_short_circuit_lifted() {
    let hlsl = function_body("void foo() { bool a; bool b; bool c = a && b; bool d = a || b; }");
    assert!(hlsl.contains("bool tmp_0;\nif (var_1_1)\n{\ntmp_0=var_1_2;\n}\nelse\n{\ntmp_0=false;\n}\n\
                           bool var_1_3=tmp_0;\n"));
    assert!(hlsl.contains("bool tmp_1;\nif (var_1_1)\n{\ntmp_1=true;\n}\nelse\n{\ntmp_1=var_1_2;\n}\n\
                           bool var_1_4=tmp_1;\n"));
}

#[test]
fn test_statement_level_short_circuit() {
    let hlsl = function_body("void foo() { bool a; float x; a && (x = 1.0) > 0.0; a || (x = 2.0) > 0.0; }");
    assert!(hlsl.contains("if (var_1_1)\n{\n((var_1_2=1.000000e+000)>0.000000e+000);\n}\n"));
    assert!(hlsl.contains("if ((!var_1_1))\n{\n((var_1_2=2.000000e+000)>0.000000e+000);\n}\n"));
    assert!(!hlsl.contains("tmp_"));
}

#[test]
fn test_declarator_list_split() {
    let hlsl = function_body("void foo() { bool c; float a = 1.0, b = c ? 2.0 : 3.0, d; }");
    assert!(hlsl.contains("float var_1_2=1.000000e+000;\nfloat tmp_0;\n"));
    assert!(hlsl.contains("float var_1_3=tmp_0;\nfloat var_1_4=0.000000e+000;\n"));
    let joined = function_body("void foo() { float a = 1.0, b; }");
    assert!(joined.contains("float var_1_1=1.000000e+000,var_1_2=0.000000e+000;\n"));
}

#[test]
fn test_side_effects_hoisted_before_lift() {
    let hlsl = function_body("void foo() { float x; bool c; float y = (x += 1.0) + (c ? x : 0.0); }");
    let hoisted = hlsl.find("float tmp_0=var_1_1+=1.000000e+000;").expect("hoisted operand");
    let lifted = hlsl.find("if (var_1_2)").expect("lifted ternary");
    assert!(hoisted < lifted);
    assert!(hlsl.contains("float var_1_3=(tmp_0+tmp_1);"));
}

#[test]
fn test_assignment_target_located_before_lift() {
    let hlsl = function_body("void foo() { float a[2]; int i; bool c; a[i++] = c ? 1.0 : 2.0; }");
    let target = hlsl.find("int tmp_0=(var_1_2++);").expect("target index");
    let lifted = hlsl.find("if (var_1_3)").expect("lifted ternary");
    assert!(target < lifted);
    assert!(hlsl.contains("var_1_1[tmp_0]=tmp_1;\n"));
    assert_eq!(hlsl.matches("var_1_2++").count(), 1);
}

#[test]
fn test_matrix_product_assignment_target_evaluated_once() {
    let hlsl = function_body("void foo() { mat2 m[2]; mat2 n; int i; m[i++] *= n; }");
    assert!(hlsl.contains("int tmp_0=(var_1_3++);\nvar_1_1[tmp_0]=mul(var_1_2,var_1_1[tmp_0]);\n"));
    assert_eq!(hlsl.matches("var_1_3++").count(), 1);

    let plain = function_body("void foo() { mat2 m; mat2 n; m *= n; }");
    assert!(plain.contains("var_1_1=mul(var_1_2,var_1_1);\n"));
    assert!(!plain.contains("tmp_"));
}

#[test]
fn test_while_with_lifted_condition() {
    let hlsl = function_body("void foo() { bool a; bool b; while (a && b) { } }");
    assert!(hlsl.contains("while (true)\n{\nbool tmp_0;\n"));
    assert!(hlsl.contains("if ((!tmp_0))\n{\nbreak;\n}\n"));
}

#[test]
fn test_do_while() {
    let hlsl = function_body("void foo() { int i = 0; do { i++; } while (i < 3); }");
    assert!(hlsl.contains("do\n{\n(var_1_1++);\n}\nwhile ((var_1_1<3));\n"));

    let source = "void foo() { int i = 0; do { i++; if (i > 2) continue; } while (i < 5 && i > 0); }";
    let hlsl = function_body(source);
    assert!(hlsl.contains("bool tmp_0=true;\nwhile (true)\n{\nif ((!tmp_0))\n{\n"));
    assert!(hlsl.contains("break;\n}\n}\ntmp_0=false;\n(var_1_1++);\n"));
    assert!(!hlsl.contains("do\n"));
    let check = hlsl.find("if ((!tmp_0))").unwrap();
    let skip = hlsl.find("continue;").unwrap();
    assert!(check < skip);
}
