use glt_shared::*;
use glt_lang_eir as ir;
use glt_lang_eir::{Type, Constant, ScalarConstant, StructId};
use super::typer::{Context, TyperResult, fail};
use super::expressions::TypedExpression;

fn finish(ty: Type, args: Vec<TypedExpression>, value: Option<Constant>) -> TypedExpression {
    let indirect = args.iter().any(|arg| arg.indirect);
    let constant_index = args.iter().all(|arg| arg.constant_index);
    let exprs = args.into_iter().map(|arg| arg.expr).collect();
    let mut result = TypedExpression::folded(ir::Expression::Constructor(ty.clone(), exprs), ty, value);
    result.indirect = indirect;
    result.constant_index = constant_index;
    result
}

/// Every argument value flattened in order, when all of them are known
fn flatten_values(args: &[TypedExpression]) -> Option<Vec<ScalarConstant>> {
    let mut components = vec![];
    for arg in args {
        components.extend(arg.value.as_ref()?.get_components());
    }
    Some(components)
}

fn count_error<T>(ty: &Type, location: FileLocation, ctx: &Context) -> TyperResult<T> {
    fail(ErrorCode::InvalidTensorCtorComponentCount,
         location,
         format!("wrong number of components to construct {}", ctx.type_name(ty)))
}

fn type_error<T>(ty: &Type, location: FileLocation, ctx: &Context) -> TyperResult<T> {
    fail(ErrorCode::InvalidTensorCtorComponentType,
         location,
         format!("invalid argument type to construct {}", ctx.type_name(ty)))
}

/// Build a scalar, vector or matrix from constructor arguments
pub fn parse_constructor(ty: Type,
                         args: Vec<TypedExpression>,
                         location: FileLocation,
                         ctx: &mut Context)
                         -> TyperResult<TypedExpression> {
    if args.is_empty() || ty == Type::Void || ty.is_sampler() {
        return fail(ErrorCode::CtorRequiresArguments,
                    location,
                    format!("{} can not be constructed from no arguments", ctx.type_name(&ty)));
    }
    if args.iter().any(|arg| arg.ty.is_sampler() || arg.ty.is_array()) {
        return type_error(&ty, location, ctx);
    }
    match ty {
        Type::Scalar(scalar) => {
            if args.len() > 1 {
                return count_error(&ty, location, ctx);
            }
            if !args[0].ty.is_numeric() {
                return type_error(&ty, location, ctx);
            }
            let value = flatten_values(&args).map(|c| Constant::Scalar(c[0].cast(scalar)));
            Ok(finish(ty, args, value))
        }
        Type::Vector(_, size) => parse_vector_constructor(ty, size, args, location, ctx),
        Type::Matrix(size) => parse_matrix_constructor(size, args, location, ctx),
        _ => type_error(&ty, location, ctx),
    }
}

fn parse_vector_constructor(ty: Type,
                            size: u32,
                            args: Vec<TypedExpression>,
                            location: FileLocation,
                            ctx: &mut Context)
                            -> TyperResult<TypedExpression> {
    if args.len() == 1 {
        let first = args[0].ty.clone();
        let components = match first {
            Type::Scalar(_) => {
                let value = flatten_values(&args).map(|c| vec![c[0]; size as usize]);
                let value = value.and_then(|c| Constant::from_components(&ty, &c));
                return Ok(finish(ty, args, value));
            }
            Type::Vector(_, n) => n,
            Type::Matrix(n) => n * n,
            _ => {
                return fail(ErrorCode::InvalidVecCtor,
                            location,
                            format!("{} can not be constructed from {}",
                                    ctx.type_name(&ty),
                                    ctx.type_name(&first)))
            }
        };
        if components < size {
            return count_error(&ty, location, ctx);
        }
    } else {
        let mut total = 0;
        for arg in &args {
            match arg.ty.get_num_components() {
                Some(n) => total += n,
                None => return type_error(&ty, location, ctx),
            }
        }
        if total != size {
            return count_error(&ty, location, ctx);
        }
    }
    let value = flatten_values(&args).and_then(|c| Constant::from_components(&ty, &c));
    Ok(finish(ty, args, value))
}

fn parse_matrix_constructor(size: u32,
                            args: Vec<TypedExpression>,
                            location: FileLocation,
                            ctx: &mut Context)
                            -> TyperResult<TypedExpression> {
    let ty = Type::Matrix(size);
    let n = size as usize;
    if args.len() == 1 {
        let value = match args[0].ty {
            Type::Scalar(_) => {
                flatten_values(&args).map(|c| {
                    let diagonal = c[0].to_float();
                    let values = (0..n * n)
                        .map(|i| if i % (n + 1) == 0 { diagonal } else { 0.0 })
                        .collect();
                    Constant::Matrix(size, values)
                })
            }
            Type::Matrix(from) => {
                let from = from as usize;
                flatten_values(&args).map(|c| {
                    let values = (0..n * n)
                        .map(|i| {
                            let (col, row) = (i / n, i % n);
                            if col < from && row < from {
                                c[col * from + row].to_float()
                            } else if col == row {
                                1.0
                            } else {
                                0.0
                            }
                        })
                        .collect();
                    Constant::Matrix(size, values)
                })
            }
            Type::Vector(_, components) => {
                if components != size * size {
                    return count_error(&ty, location, ctx);
                }
                flatten_values(&args).and_then(|c| Constant::from_components(&ty, &c))
            }
            _ => {
                return fail(ErrorCode::InvalidMatCtorType,
                            location,
                            format!("{} can not be constructed from {}",
                                    ctx.type_name(&ty),
                                    ctx.type_name(&args[0].ty)))
            }
        };
        return Ok(finish(ty, args, value));
    }

    let mut total = 0;
    for arg in &args {
        match arg.ty {
            Type::Scalar(_) | Type::Vector(_, _) => {
                total += arg.ty.get_num_components().unwrap_or(0);
            }
            _ => {
                return fail(ErrorCode::InvalidMatCtorType,
                            location,
                            format!("{} can not be constructed from {}",
                                    ctx.type_name(&ty),
                                    ctx.type_name(&arg.ty)))
            }
        }
    }
    if total != size * size {
        return count_error(&ty, location, ctx);
    }
    let value = flatten_values(&args).and_then(|c| Constant::from_components(&ty, &c));
    Ok(finish(ty, args, value))
}

/// Build a struct from one argument per member
pub fn parse_struct_constructor(id: StructId,
                                args: Vec<TypedExpression>,
                                location: FileLocation,
                                ctx: &mut Context)
                                -> TyperResult<TypedExpression> {
    let ty = Type::Struct(id);
    let members = &ctx.table.structure(id).members;
    let valid = members.len() == args.len() &&
                members.iter().zip(&args).all(|(member, arg)| member.ty == arg.ty);
    if !valid {
        return fail(ErrorCode::InvalidTypesForStructCtor,
                    location,
                    format!("invalid arguments to construct {}", ctx.type_name(&ty)));
    }
    let value = args.iter()
        .map(|arg| arg.value.clone())
        .collect::<Option<Vec<_>>>()
        .map(|values| Constant::Struct(id, values));
    let indirect = args.iter().any(|arg| arg.indirect);
    let constant_index = args.iter().all(|arg| arg.constant_index);
    let exprs = args.into_iter().map(|arg| arg.expr).collect();
    let mut result = TypedExpression::folded(ir::Expression::StructConstructor(id, exprs), ty, value);
    result.indirect = indirect;
    result.constant_index = constant_index;
    Ok(result)
}

#[cfg(test)]
use super::typer::{error_codes, verify};

#[cfg(test)]
fn ctor_errors(body: &str) -> Vec<ErrorCode> {
    error_codes(&format!("void main() {{ {} }}", body), ShaderStage::Vertex)
}

#[test]
fn test_scalar_constructors() {
    assert_eq!(ctor_errors("float f = float(1); int i = int(2.5); bool b = bool(1.0);"), vec![]);
    assert_eq!(ctor_errors("float f = float(vec2(1.0));"), vec![]);
    assert_eq!(ctor_errors("float f = float(1, 2);"),
               vec![ErrorCode::InvalidTensorCtorComponentCount]);
    assert_eq!(ctor_errors("float f = float();"), vec![ErrorCode::CtorRequiresArguments]);
    assert_eq!(error_codes("struct S { float a; }; void main() { S s = S(1.0); float f = float(s); }",
                           ShaderStage::Vertex),
               vec![ErrorCode::InvalidTensorCtorComponentType]);
}

#[test]
fn test_vector_constructors() {
    assert_eq!(ctor_errors("vec4 v = vec4(1.0); vec4 w = vec4(vec2(1.0), 1, true);"), vec![]);
    assert_eq!(ctor_errors("vec2 v = vec2(vec4(1.0)); vec4 w = vec4(mat2(1.0));"), vec![]);
    assert_eq!(ctor_errors("vec4 v = vec4(vec2(1.0));"),
               vec![ErrorCode::InvalidTensorCtorComponentCount]);
    assert_eq!(ctor_errors("vec2 v = vec2(1.0, 2.0, 3.0);"),
               vec![ErrorCode::InvalidTensorCtorComponentCount]);
    assert_eq!(error_codes("struct S { float a; }; void main() { vec2 v = vec2(S(1.0)); }",
                           ShaderStage::Vertex),
               vec![ErrorCode::InvalidVecCtor]);
    assert_eq!(ctor_errors("const ivec2 v = ivec2(1.5, 2.5); float a[v.y];"), vec![]);
}

#[test]
fn test_matrix_constructors() {
    assert_eq!(ctor_errors("mat2 m = mat2(1.0); mat3 n = mat3(m); mat2 o = mat2(n);"), vec![]);
    assert_eq!(ctor_errors("mat2 m = mat2(vec4(1.0)); mat2 n = mat2(vec2(1.0), 1.0, 2.0);"), vec![]);
    assert_eq!(ctor_errors("mat2 m = mat2(vec3(1.0));"),
               vec![ErrorCode::InvalidTensorCtorComponentCount]);
    assert_eq!(ctor_errors("mat2 m = mat2(1.0, 2.0, 3.0);"),
               vec![ErrorCode::InvalidTensorCtorComponentCount]);
    assert_eq!(ctor_errors("mat3 m = mat3(mat2(1.0), 1.0);"), vec![ErrorCode::InvalidMatCtorType]);
    assert_eq!(ctor_errors("const mat3 m = mat3(mat2(2.0)); float a[int(m[2][2])];"), vec![]);
}

#[test]
fn test_struct_constructors() {
    let vs = ShaderStage::Vertex;
    assert_eq!(error_codes("struct S { float a; int b; }; void main() { S s = S(1.0, 2); }", vs),
               vec![]);
    assert_eq!(error_codes("struct S { float a; int b; }; void main() { S s = S(1.0); }", vs),
               vec![ErrorCode::InvalidTypesForStructCtor]);
    assert_eq!(error_codes("struct S { float a; int b; }; void main() { S s = S(1, 2); }", vs),
               vec![ErrorCode::InvalidTypesForStructCtor]);
    let module = verify("struct S { int n; }; const S s = S(3); float a[s.n]; void main() {}", vs)
        .expect("verify failed");
    assert_eq!(module.table.variable(ir::VariableId(1)).value,
               Some(Constant::Struct(StructId(0), vec![Constant::int(3)])));
}
