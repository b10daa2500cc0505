use glt_shared::ShaderStage;
use super::hst::*;

/// Texture lookup functions of the shading language. Projective lookups
/// carry the width of their coordinate.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum TextureLookup {
    Texture2D,
    Texture2DBias,
    Texture2DProj(u32),
    Texture2DProjBias(u32),
    Texture2DLod,
    Texture2DProjLod(u32),
    TextureCube,
    TextureCubeBias,
    TextureCubeLod,
}

/// HLSL function fragments
/// For helper functions required by the emitter. Used fragments are detected
/// and emitted at the top of the module.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Fragment {
    /// Floored modulus of a vector by a vector or scalar of the given widths
    Mod(u32, u32),
    Fwidth(u32),
    /// Diagonal matrix from a scalar
    MatrixFromScalar(u32),
    /// Resize a matrix (to, from), padding with the identity
    MatrixFromMatrix(u32, u32),
    /// Leading components of a matrix as a vector (dim, size)
    VectorFromMatrix(u32, u32),
    /// Texture sampling through a split texture and sampler. Lookups without
    /// a level of detail sample the top level in the vertex stage.
    Texture(TextureLookup, ShaderStage),
}

fn scalar_or_vector(dim: u32) -> Type {
    match dim {
        1 => Type::float(),
        n => Type::floatn(n),
    }
}

fn float(value: f32) -> Expression {
    Expression::Literal(Literal::Float(value))
}

fn returns(expr: Expression) -> Vec<Statement> {
    vec![Statement::Return(Some(expr))]
}

impl Fragment {
    /// Every helper available to a stage, in the order they are emitted
    pub fn preamble(stage: ShaderStage) -> Vec<Fragment> {
        let mut fragments = vec![Fragment::Mod(1, 1)];
        for dim in 2..5 {
            fragments.push(Fragment::Mod(dim, dim));
            fragments.push(Fragment::Mod(dim, 1));
        }
        if stage == ShaderStage::Fragment {
            for dim in 1..5 {
                fragments.push(Fragment::Fwidth(dim));
            }
        }
        for to in 2..5 {
            fragments.push(Fragment::MatrixFromScalar(to));
            for from in 2..5 {
                if from != to {
                    fragments.push(Fragment::MatrixFromMatrix(to, from));
                }
            }
        }
        for dim in 2..5 {
            for size in 2..5 {
                fragments.push(Fragment::VectorFromMatrix(dim, size));
            }
        }
        let lookups = match stage {
            ShaderStage::Vertex => {
                vec![TextureLookup::Texture2D,
                     TextureLookup::Texture2DProj(3),
                     TextureLookup::Texture2DProj(4),
                     TextureLookup::Texture2DLod,
                     TextureLookup::Texture2DProjLod(3),
                     TextureLookup::Texture2DProjLod(4),
                     TextureLookup::TextureCube,
                     TextureLookup::TextureCubeLod]
            }
            ShaderStage::Fragment => {
                vec![TextureLookup::Texture2D,
                     TextureLookup::Texture2DBias,
                     TextureLookup::Texture2DProj(3),
                     TextureLookup::Texture2DProj(4),
                     TextureLookup::Texture2DProjBias(3),
                     TextureLookup::Texture2DProjBias(4),
                     TextureLookup::TextureCube,
                     TextureLookup::TextureCubeBias]
            }
        };
        fragments.extend(lookups.into_iter().map(|lookup| Fragment::Texture(lookup, stage)));
        fragments
    }

    pub fn get_name(&self) -> String {
        match *self {
            Fragment::Mod(_, _) => "GLSLmod".to_string(),
            Fragment::Fwidth(_) => "GLSLfwidth".to_string(),
            Fragment::MatrixFromScalar(to) => format!("GLSLmat{}FromScalar", to),
            Fragment::MatrixFromMatrix(to, from) => format!("GLSLmat{}FromMat{}", to, from),
            Fragment::VectorFromMatrix(dim, size) => format!("GLSLvec{}FromMat{}", dim, size),
            Fragment::Texture(lookup, _) => {
                match lookup {
                    TextureLookup::Texture2D => "GLSLtexture2D",
                    TextureLookup::Texture2DBias => "GLSLtexture2DBias",
                    TextureLookup::Texture2DProj(_) => "GLSLtexture2DProj",
                    TextureLookup::Texture2DProjBias(_) => "GLSLtexture2DProjBias",
                    TextureLookup::Texture2DLod => "GLSLtexture2DLod",
                    TextureLookup::Texture2DProjLod(_) => "GLSLtexture2DProjLod",
                    TextureLookup::TextureCube => "GLSLtextureCube",
                    TextureLookup::TextureCubeBias => "GLSLtextureCubeBias",
                    TextureLookup::TextureCubeLod => "GLSLtextureCubeLod",
                }
                .to_string()
            }
        }
    }

    pub fn generate(&self) -> FunctionDefinition {
        let name = self.get_name();
        match *self {
            Fragment::Mod(dim_x, dim_y) => {
                let x = Expression::var("x");
                let y = Expression::var("y");
                let floor = Expression::call("floor",
                                             vec![Expression::binary(BinOp::Divide,
                                                                     x.clone(),
                                                                     y.clone())]);
                let body = Expression::binary(BinOp::Subtract,
                                              x,
                                              Expression::binary(BinOp::Multiply, y, floor));
                FunctionDefinition {
                    name,
                    returntype: scalar_or_vector(dim_x),
                    params: vec![FunctionParam::input("x", scalar_or_vector(dim_x)),
                                 FunctionParam::input("y", scalar_or_vector(dim_y))],
                    body: returns(body),
                }
            }
            Fragment::Fwidth(dim) => {
                let p = Expression::var("p");
                let ddx = Expression::call("abs", vec![Expression::call("ddx", vec![p.clone()])]);
                let ddy = Expression::call("abs", vec![Expression::call("ddy", vec![p])]);
                FunctionDefinition {
                    name,
                    returntype: scalar_or_vector(dim),
                    params: vec![FunctionParam::input("p", scalar_or_vector(dim))],
                    body: returns(Expression::binary(BinOp::Add, ddx, ddy)),
                }
            }
            Fragment::MatrixFromScalar(to) => {
                let s = Expression::var("s");
                let components = (0..to * to)
                    .map(|i| if i % (to + 1) == 0 { s.clone() } else { float(0.0) })
                    .collect();
                FunctionDefinition {
                    name,
                    returntype: Type::Matrix(to),
                    params: vec![FunctionParam::input("s", Type::float())],
                    body: returns(Expression::NumericConstructor(Type::Matrix(to), components)),
                }
            }
            Fragment::MatrixFromMatrix(to, from) => {
                let m = Expression::var("m");
                let mut components = vec![];
                for row in 0..to {
                    for col in 0..to {
                        components.push(if row < from && col < from {
                            let row_expr = Expression::ArraySubscript(Box::new(m.clone()),
                                                                      Box::new(Expression::Literal(Literal::Int(row as i32))));
                            Expression::ArraySubscript(Box::new(row_expr),
                                                       Box::new(Expression::Literal(Literal::Int(col as i32))))
                        } else if row == col {
                            float(1.0)
                        } else {
                            float(0.0)
                        });
                    }
                }
                FunctionDefinition {
                    name,
                    returntype: Type::Matrix(to),
                    params: vec![FunctionParam::input("m", Type::Matrix(from))],
                    body: returns(Expression::NumericConstructor(Type::Matrix(to), components)),
                }
            }
            Fragment::VectorFromMatrix(dim, size) => {
                let m = Expression::var("m");
                let components = (0..dim)
                    .map(|k| m.clone().member(&format!("_m{}{}", k / size, k % size)))
                    .collect();
                FunctionDefinition {
                    name,
                    returntype: Type::floatn(dim),
                    params: vec![FunctionParam::input("m", Type::Matrix(size))],
                    body: returns(Expression::NumericConstructor(Type::floatn(dim), components)),
                }
            }
            Fragment::Texture(lookup, stage) => Fragment::generate_texture(name, lookup, stage),
        }
    }

    fn generate_texture(name: String, lookup: TextureLookup, stage: ShaderStage) -> FunctionDefinition {
        let (texture_type, coord_dim) = match lookup {
            TextureLookup::Texture2D |
            TextureLookup::Texture2DBias |
            TextureLookup::Texture2DLod => (Type::Texture2D, 2),
            TextureLookup::Texture2DProj(dim) |
            TextureLookup::Texture2DProjBias(dim) |
            TextureLookup::Texture2DProjLod(dim) => (Type::Texture2D, dim),
            TextureLookup::TextureCube |
            TextureLookup::TextureCubeBias |
            TextureLookup::TextureCubeLod => (Type::TextureCube, 3),
        };
        let mut params = vec![FunctionParam::input("t", texture_type),
                              FunctionParam::input("s", Type::SamplerState),
                              FunctionParam::input("c", Type::floatn(coord_dim))];

        let coord = Expression::var("c");
        let coord = match lookup {
            TextureLookup::Texture2DProj(dim) |
            TextureLookup::Texture2DProjBias(dim) |
            TextureLookup::Texture2DProjLod(dim) => {
                let divisor = if dim == 3 { SwizzleSlot::Z } else { SwizzleSlot::W };
                Expression::binary(BinOp::Divide,
                                   Expression::Swizzle(Box::new(coord.clone()),
                                                       vec![SwizzleSlot::X, SwizzleSlot::Y]),
                                   Expression::Swizzle(Box::new(coord), vec![divisor]))
            }
            _ => coord,
        };

        let (method, extra) = match lookup {
            TextureLookup::Texture2DBias |
            TextureLookup::Texture2DProjBias(_) |
            TextureLookup::TextureCubeBias => {
                params.push(FunctionParam::input("b", Type::float()));
                ("SampleBias", Some(Expression::var("b")))
            }
            TextureLookup::Texture2DLod |
            TextureLookup::Texture2DProjLod(_) |
            TextureLookup::TextureCubeLod => {
                params.push(FunctionParam::input("l", Type::float()));
                ("SampleLevel", Some(Expression::var("l")))
            }
            _ if stage == ShaderStage::Vertex => ("SampleLevel", Some(float(0.0))),
            _ => ("Sample", None),
        };

        let mut args = vec![Expression::var("s"), coord];
        args.extend(extra);
        let sample = Expression::MethodCall(Box::new(Expression::var("t")), method.to_string(), args);
        FunctionDefinition {
            name,
            returntype: Type::floatn(4),
            params,
            body: returns(sample),
        }
    }
}

#[test]
fn test_fragment_names() {
    assert_eq!(Fragment::Mod(3, 1).get_name(), "GLSLmod");
    assert_eq!(Fragment::MatrixFromMatrix(3, 2).get_name(), "GLSLmat3FromMat2");
    assert_eq!(Fragment::VectorFromMatrix(4, 2).get_name(), "GLSLvec4FromMat2");
    let lookup = Fragment::Texture(TextureLookup::Texture2DProj(4), ShaderStage::Fragment);
    assert_eq!(lookup.get_name(), "GLSLtexture2DProj");
    assert_eq!(lookup.generate().params.len(), 3);
}

#[test]
fn test_preamble() {
    let vertex = Fragment::preamble(ShaderStage::Vertex);
    let fragment = Fragment::preamble(ShaderStage::Fragment);
    assert!(!vertex.contains(&Fragment::Fwidth(2)));
    assert!(fragment.contains(&Fragment::Fwidth(2)));
    assert!(vertex.contains(&Fragment::Texture(TextureLookup::Texture2DLod, ShaderStage::Vertex)));
    assert!(!fragment.contains(&Fragment::Texture(TextureLookup::Texture2DLod,
                                                  ShaderStage::Fragment)));
    assert_eq!(vertex.iter().filter(|f| matches!(f, Fragment::MatrixFromMatrix(_, _))).count(), 6);
}

#[test]
fn test_vertex_lookup_samples_top_level() {
    let def = Fragment::Texture(TextureLookup::Texture2D, ShaderStage::Vertex).generate();
    match def.body[0] {
        Statement::Return(Some(Expression::MethodCall(_, ref method, ref args))) => {
            assert_eq!(method, "SampleLevel");
            assert_eq!(args.len(), 3);
        }
        ref other => panic!("unexpected body {:?}", other),
    }
}
