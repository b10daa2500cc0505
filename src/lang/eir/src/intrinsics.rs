use glt_shared::*;
use crate::eir::*;
use crate::constants::*;

/// Built in functions of the shading language
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Intrinsic {
    Radians,
    Degrees,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    /// Two argument atan(y, x)
    Atan2,

    Pow,
    Exp,
    Log,
    Exp2,
    Log2,
    Sqrt,
    InverseSqrt,

    Abs,
    Sign,
    Floor,
    Ceil,
    Fract,
    Mod,
    Min,
    Max,
    Clamp,
    Mix,
    Step,
    SmoothStep,

    Length,
    Distance,
    Dot,
    Cross,
    Normalize,
    FaceForward,
    Reflect,
    Refract,

    MatrixCompMult,

    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Equal,
    NotEqual,
    Any,
    All,
    Not,

    Texture2D,
    Texture2DBias,
    Texture2DProj,
    Texture2DProjBias,
    Texture2DLod,
    Texture2DProjLod,
    TextureCube,
    TextureCubeBias,
    TextureCubeLod,

    DFdx,
    DFdy,
    Fwidth,
}

impl Intrinsic {
    /// Some functions only exist in one stage or behind an extension
    pub fn is_available(&self, stage: ShaderStage, extensions: &ExtensionState) -> bool {
        match *self {
            Intrinsic::Texture2DLod |
            Intrinsic::Texture2DProjLod |
            Intrinsic::TextureCubeLod => stage == ShaderStage::Vertex,
            Intrinsic::Texture2DBias |
            Intrinsic::Texture2DProjBias |
            Intrinsic::TextureCubeBias => stage == ShaderStage::Fragment,
            Intrinsic::DFdx | Intrinsic::DFdy | Intrinsic::Fwidth => {
                stage == ShaderStage::Fragment &&
                extensions.is_enabled(Extension::StandardDerivatives)
            }
            _ => true,
        }
    }

    pub fn is_texture_lookup(&self) -> bool {
        match *self {
            Intrinsic::Texture2D |
            Intrinsic::Texture2DBias |
            Intrinsic::Texture2DProj |
            Intrinsic::Texture2DProjBias |
            Intrinsic::Texture2DLod |
            Intrinsic::Texture2DProjLod |
            Intrinsic::TextureCube |
            Intrinsic::TextureCubeBias |
            Intrinsic::TextureCubeLod => true,
            _ => false,
        }
    }
}

/// Parameter pattern in the overload table. Generic kinds share one width
/// within an overload so genType(x, y) requires x and y to match.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ParamKind {
    /// float or vecN
    GenType,
    Float,
    Vec2,
    Vec3,
    Vec4,
    /// vecN with N > 1
    Vec,
    IVec,
    BVec,
    Mat,
    Sampler2D,
    SamplerCube,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ReturnKind {
    GenType,
    Float,
    Bool,
    Vec3,
    Vec4,
    BVec,
    Mat,
}

pub type IntrinsicDefinition = (ReturnKind, &'static str, &'static [ParamKind], Intrinsic);

use self::ParamKind::GenType as G;
use self::ParamKind::Float as F;
use self::ParamKind::Vec2 as V2;
use self::ParamKind::Vec3 as V3;
use self::ParamKind::Vec4 as V4;
use self::ParamKind::Vec as V;
use self::ParamKind::IVec as IV;
use self::ParamKind::BVec as BV;
use self::ParamKind::Mat as M;
use self::ParamKind::Sampler2D as S2;
use self::ParamKind::SamplerCube as SC;

const INTRINSICS: &[IntrinsicDefinition] = &[
    (ReturnKind::GenType, "radians", &[G], Intrinsic::Radians),
    (ReturnKind::GenType, "degrees", &[G], Intrinsic::Degrees),
    (ReturnKind::GenType, "sin", &[G], Intrinsic::Sin),
    (ReturnKind::GenType, "cos", &[G], Intrinsic::Cos),
    (ReturnKind::GenType, "tan", &[G], Intrinsic::Tan),
    (ReturnKind::GenType, "asin", &[G], Intrinsic::Asin),
    (ReturnKind::GenType, "acos", &[G], Intrinsic::Acos),
    (ReturnKind::GenType, "atan", &[G], Intrinsic::Atan),
    (ReturnKind::GenType, "atan", &[G, G], Intrinsic::Atan2),

    (ReturnKind::GenType, "pow", &[G, G], Intrinsic::Pow),
    (ReturnKind::GenType, "exp", &[G], Intrinsic::Exp),
    (ReturnKind::GenType, "log", &[G], Intrinsic::Log),
    (ReturnKind::GenType, "exp2", &[G], Intrinsic::Exp2),
    (ReturnKind::GenType, "log2", &[G], Intrinsic::Log2),
    (ReturnKind::GenType, "sqrt", &[G], Intrinsic::Sqrt),
    (ReturnKind::GenType, "inversesqrt", &[G], Intrinsic::InverseSqrt),

    (ReturnKind::GenType, "abs", &[G], Intrinsic::Abs),
    (ReturnKind::GenType, "sign", &[G], Intrinsic::Sign),
    (ReturnKind::GenType, "floor", &[G], Intrinsic::Floor),
    (ReturnKind::GenType, "ceil", &[G], Intrinsic::Ceil),
    (ReturnKind::GenType, "fract", &[G], Intrinsic::Fract),
    (ReturnKind::GenType, "mod", &[G, F], Intrinsic::Mod),
    (ReturnKind::GenType, "mod", &[G, G], Intrinsic::Mod),
    (ReturnKind::GenType, "min", &[G, F], Intrinsic::Min),
    (ReturnKind::GenType, "min", &[G, G], Intrinsic::Min),
    (ReturnKind::GenType, "max", &[G, F], Intrinsic::Max),
    (ReturnKind::GenType, "max", &[G, G], Intrinsic::Max),
    (ReturnKind::GenType, "clamp", &[G, F, F], Intrinsic::Clamp),
    (ReturnKind::GenType, "clamp", &[G, G, G], Intrinsic::Clamp),
    (ReturnKind::GenType, "mix", &[G, G, F], Intrinsic::Mix),
    (ReturnKind::GenType, "mix", &[G, G, G], Intrinsic::Mix),
    (ReturnKind::GenType, "step", &[F, G], Intrinsic::Step),
    (ReturnKind::GenType, "step", &[G, G], Intrinsic::Step),
    (ReturnKind::GenType, "smoothstep", &[F, F, G], Intrinsic::SmoothStep),
    (ReturnKind::GenType, "smoothstep", &[G, G, G], Intrinsic::SmoothStep),

    (ReturnKind::Float, "length", &[G], Intrinsic::Length),
    (ReturnKind::Float, "distance", &[G, G], Intrinsic::Distance),
    (ReturnKind::Float, "dot", &[G, G], Intrinsic::Dot),
    (ReturnKind::Vec3, "cross", &[V3, V3], Intrinsic::Cross),
    (ReturnKind::GenType, "normalize", &[G], Intrinsic::Normalize),
    (ReturnKind::GenType, "faceforward", &[G, G, G], Intrinsic::FaceForward),
    (ReturnKind::GenType, "reflect", &[G, G], Intrinsic::Reflect),
    (ReturnKind::GenType, "refract", &[G, G, F], Intrinsic::Refract),

    (ReturnKind::Mat, "matrixCompMult", &[M, M], Intrinsic::MatrixCompMult),

    (ReturnKind::BVec, "lessThan", &[V, V], Intrinsic::LessThan),
    (ReturnKind::BVec, "lessThan", &[IV, IV], Intrinsic::LessThan),
    (ReturnKind::BVec, "lessThanEqual", &[V, V], Intrinsic::LessThanEqual),
    (ReturnKind::BVec, "lessThanEqual", &[IV, IV], Intrinsic::LessThanEqual),
    (ReturnKind::BVec, "greaterThan", &[V, V], Intrinsic::GreaterThan),
    (ReturnKind::BVec, "greaterThan", &[IV, IV], Intrinsic::GreaterThan),
    (ReturnKind::BVec, "greaterThanEqual", &[V, V], Intrinsic::GreaterThanEqual),
    (ReturnKind::BVec, "greaterThanEqual", &[IV, IV], Intrinsic::GreaterThanEqual),
    (ReturnKind::BVec, "equal", &[V, V], Intrinsic::Equal),
    (ReturnKind::BVec, "equal", &[IV, IV], Intrinsic::Equal),
    (ReturnKind::BVec, "equal", &[BV, BV], Intrinsic::Equal),
    (ReturnKind::BVec, "notEqual", &[V, V], Intrinsic::NotEqual),
    (ReturnKind::BVec, "notEqual", &[IV, IV], Intrinsic::NotEqual),
    (ReturnKind::BVec, "notEqual", &[BV, BV], Intrinsic::NotEqual),
    (ReturnKind::Bool, "any", &[BV], Intrinsic::Any),
    (ReturnKind::Bool, "all", &[BV], Intrinsic::All),
    (ReturnKind::BVec, "not", &[BV], Intrinsic::Not),

    (ReturnKind::Vec4, "texture2D", &[S2, V2], Intrinsic::Texture2D),
    (ReturnKind::Vec4, "texture2D", &[S2, V2, F], Intrinsic::Texture2DBias),
    (ReturnKind::Vec4, "texture2DProj", &[S2, V3], Intrinsic::Texture2DProj),
    (ReturnKind::Vec4, "texture2DProj", &[S2, V4], Intrinsic::Texture2DProj),
    (ReturnKind::Vec4, "texture2DProj", &[S2, V3, F], Intrinsic::Texture2DProjBias),
    (ReturnKind::Vec4, "texture2DProj", &[S2, V4, F], Intrinsic::Texture2DProjBias),
    (ReturnKind::Vec4, "texture2DLod", &[S2, V2, F], Intrinsic::Texture2DLod),
    (ReturnKind::Vec4, "texture2DProjLod", &[S2, V3, F], Intrinsic::Texture2DProjLod),
    (ReturnKind::Vec4, "texture2DProjLod", &[S2, V4, F], Intrinsic::Texture2DProjLod),
    (ReturnKind::Vec4, "textureCube", &[SC, V3], Intrinsic::TextureCube),
    (ReturnKind::Vec4, "textureCube", &[SC, V3, F], Intrinsic::TextureCubeBias),
    (ReturnKind::Vec4, "textureCubeLod", &[SC, V3, F], Intrinsic::TextureCubeLod),

    (ReturnKind::GenType, "dFdx", &[G], Intrinsic::DFdx),
    (ReturnKind::GenType, "dFdy", &[G], Intrinsic::DFdy),
    (ReturnKind::GenType, "fwidth", &[G], Intrinsic::Fwidth),
];

pub fn get_intrinsics() -> &'static [IntrinsicDefinition] {
    INTRINSICS
}

/// True if any built in function has the name, in any stage
pub fn is_intrinsic_name(name: &str) -> bool {
    INTRINSICS.iter().any(|&(_, n, _, _)| n == name)
}

/// Widths bound while matching generic parameters
#[derive(Default)]
struct Binding {
    width: Option<u32>,
    matrix: Option<u32>,
}

impl Binding {
    fn bind(slot: &mut Option<u32>, value: u32) -> bool {
        match *slot {
            Some(bound) => bound == value,
            None => {
                *slot = Some(value);
                true
            }
        }
    }

    fn accept(&mut self, kind: ParamKind, ty: &Type) -> bool {
        match (kind, ty) {
            (ParamKind::GenType, &Type::Scalar(ScalarType::Float)) => {
                Binding::bind(&mut self.width, 1)
            }
            (ParamKind::GenType, &Type::Vector(ScalarType::Float, x)) |
            (ParamKind::Vec, &Type::Vector(ScalarType::Float, x)) |
            (ParamKind::IVec, &Type::Vector(ScalarType::Int, x)) |
            (ParamKind::BVec, &Type::Vector(ScalarType::Bool, x)) => {
                Binding::bind(&mut self.width, x)
            }
            (ParamKind::Mat, &Type::Matrix(x)) => Binding::bind(&mut self.matrix, x),
            (ParamKind::Float, &Type::Scalar(ScalarType::Float)) => true,
            (ParamKind::Vec2, &Type::Vector(ScalarType::Float, 2)) => true,
            (ParamKind::Vec3, &Type::Vector(ScalarType::Float, 3)) => true,
            (ParamKind::Vec4, &Type::Vector(ScalarType::Float, 4)) => true,
            (ParamKind::Sampler2D, &Type::Sampler(SamplerType::Sampler2D)) => true,
            (ParamKind::SamplerCube, &Type::Sampler(SamplerType::SamplerCube)) => true,
            _ => false,
        }
    }

    fn return_type(&self, kind: ReturnKind) -> Type {
        let width = self.width.unwrap_or(1);
        match kind {
            ReturnKind::GenType => Type::from_numeric(ScalarType::Float, width),
            ReturnKind::Float => Type::float(),
            ReturnKind::Bool => Type::bool(),
            ReturnKind::Vec3 => Type::floatn(3),
            ReturnKind::Vec4 => Type::floatn(4),
            ReturnKind::BVec => Type::booln(width),
            ReturnKind::Mat => Type::Matrix(self.matrix.unwrap_or(2)),
        }
    }
}

/// Find the overload of a built in function for exact argument types
pub fn resolve_intrinsic(name: &str, args: &[Type]) -> Option<(Intrinsic, Type)> {
    for &(returns, n, params, intrinsic) in INTRINSICS {
        if n != name || params.len() != args.len() {
            continue;
        }
        let mut binding = Binding::default();
        if params.iter().zip(args).all(|(kind, ty)| binding.accept(*kind, ty)) {
            return Some((intrinsic, binding.return_type(returns)));
        }
    }
    None
}

fn float_components(value: &Constant) -> Vec<f32> {
    value.get_components().iter().map(|c| c.to_float()).collect()
}

/// Component i of an argument, broadcasting scalars
fn lane(values: &[f32], i: usize) -> f32 {
    if values.len() == 1 { values[0] } else { values[i] }
}

fn per_component<F>(args: &[Vec<f32>], f: F) -> Vec<f32>
    where F: Fn(&[f32]) -> f32
{
    let count = args.iter().map(|a| a.len()).max().unwrap_or(0);
    (0..count)
        .map(|i| {
            let lanes = args.iter().map(|a| lane(a, i)).collect::<Vec<_>>();
            f(&lanes)
        })
        .collect()
}

fn compare(args: &[Constant], f: fn(ScalarConstant, ScalarConstant) -> bool) -> Option<Constant> {
    let left = args[0].get_components();
    let right = args[1].get_components();
    if left.len() != right.len() {
        return None;
    }
    Some(Constant::Vector(left.iter()
                              .zip(&right)
                              .map(|(l, r)| ScalarConstant::Bool(f(*l, *r)))
                              .collect()))
}

fn ordered(l: ScalarConstant, r: ScalarConstant) -> Option<std::cmp::Ordering> {
    match (l, r) {
        (ScalarConstant::Int(l), ScalarConstant::Int(r)) => Some(l.cmp(&r)),
        _ => l.to_float().partial_cmp(&r.to_float()),
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Evaluate a built in function with constant arguments. Functions that
/// depend on runtime state, and results that are not finite, do not fold.
pub fn fold_intrinsic(intrinsic: Intrinsic,
                      args: &[Constant],
                      return_type: &Type)
                      -> Option<Constant> {
    let floats = args.iter().map(float_components).collect::<Vec<_>>();
    let components: Vec<f32> = match intrinsic {
        Intrinsic::Radians => per_component(&floats, |x| x[0].to_radians()),
        Intrinsic::Degrees => per_component(&floats, |x| x[0].to_degrees()),
        Intrinsic::Sin => per_component(&floats, |x| x[0].sin()),
        Intrinsic::Cos => per_component(&floats, |x| x[0].cos()),
        Intrinsic::Tan => per_component(&floats, |x| x[0].tan()),
        Intrinsic::Asin => per_component(&floats, |x| x[0].asin()),
        Intrinsic::Acos => per_component(&floats, |x| x[0].acos()),
        Intrinsic::Atan => per_component(&floats, |x| x[0].atan()),
        Intrinsic::Atan2 => per_component(&floats, |x| x[0].atan2(x[1])),
        Intrinsic::Pow => per_component(&floats, |x| x[0].powf(x[1])),
        Intrinsic::Exp => per_component(&floats, |x| x[0].exp()),
        Intrinsic::Log => per_component(&floats, |x| x[0].ln()),
        Intrinsic::Exp2 => per_component(&floats, |x| x[0].exp2()),
        Intrinsic::Log2 => per_component(&floats, |x| x[0].log2()),
        Intrinsic::Sqrt => per_component(&floats, |x| x[0].sqrt()),
        Intrinsic::InverseSqrt => per_component(&floats, |x| 1.0 / x[0].sqrt()),
        Intrinsic::Abs => per_component(&floats, |x| x[0].abs()),
        Intrinsic::Sign => {
            per_component(&floats, |x| if x[0] > 0.0 {
                1.0
            } else if x[0] < 0.0 {
                -1.0
            } else {
                0.0
            })
        }
        Intrinsic::Floor => per_component(&floats, |x| x[0].floor()),
        Intrinsic::Ceil => per_component(&floats, |x| x[0].ceil()),
        Intrinsic::Fract => per_component(&floats, |x| x[0] - x[0].floor()),
        Intrinsic::Mod => per_component(&floats, |x| x[0] - x[1] * (x[0] / x[1]).floor()),
        Intrinsic::Min => per_component(&floats, |x| x[0].min(x[1])),
        Intrinsic::Max => per_component(&floats, |x| x[0].max(x[1])),
        Intrinsic::Clamp => per_component(&floats, |x| x[0].max(x[1]).min(x[2])),
        Intrinsic::Mix => per_component(&floats, |x| x[0] * (1.0 - x[2]) + x[1] * x[2]),
        Intrinsic::Step => per_component(&floats, |x| if x[1] < x[0] { 0.0 } else { 1.0 }),
        Intrinsic::SmoothStep => {
            per_component(&floats, |x| {
                let t = ((x[2] - x[0]) / (x[1] - x[0])).max(0.0).min(1.0);
                t * t * (3.0 - 2.0 * t)
            })
        }
        Intrinsic::Length => vec![dot(&floats[0], &floats[0]).sqrt()],
        Intrinsic::Distance => {
            let delta = per_component(&floats, |x| x[0] - x[1]);
            vec![dot(&delta, &delta).sqrt()]
        }
        Intrinsic::Dot => vec![dot(&floats[0], &floats[1])],
        Intrinsic::Cross => {
            let (a, b) = (&floats[0], &floats[1]);
            vec![a[1] * b[2] - b[1] * a[2], a[2] * b[0] - b[2] * a[0], a[0] * b[1] - b[0] * a[1]]
        }
        Intrinsic::Normalize => {
            let length = dot(&floats[0], &floats[0]).sqrt();
            floats[0].iter().map(|x| x / length).collect()
        }
        Intrinsic::MatrixCompMult => per_component(&floats, |x| x[0] * x[1]),
        Intrinsic::LessThan => return compare(args, |l, r| ordered(l, r).map_or(false, |o| o.is_lt())),
        Intrinsic::LessThanEqual => return compare(args, |l, r| ordered(l, r).map_or(false, |o| o.is_le())),
        Intrinsic::GreaterThan => return compare(args, |l, r| ordered(l, r).map_or(false, |o| o.is_gt())),
        Intrinsic::GreaterThanEqual => return compare(args, |l, r| ordered(l, r).map_or(false, |o| o.is_ge())),
        Intrinsic::Equal => return compare(args, |l, r| l == r),
        Intrinsic::NotEqual => return compare(args, |l, r| l != r),
        Intrinsic::Any => {
            return Some(Constant::bool(args[0].get_components().iter().any(|c| c.to_bool())))
        }
        Intrinsic::All => {
            return Some(Constant::bool(args[0].get_components().iter().all(|c| c.to_bool())))
        }
        Intrinsic::Not => {
            return Some(map_components(&args[0], |c| ScalarConstant::Bool(!c.to_bool())))
        }
        _ => return None,
    };
    if components.iter().any(|c| !c.is_finite()) {
        return None;
    }
    let scalars = components.into_iter().map(ScalarConstant::Float).collect::<Vec<_>>();
    Constant::from_components(return_type, &scalars)
}

#[test]
fn test_resolve_overloads() {
    assert_eq!(resolve_intrinsic("mod", &[Type::floatn(3), Type::float()]),
               Some((Intrinsic::Mod, Type::floatn(3))));
    assert_eq!(resolve_intrinsic("mod", &[Type::floatn(3), Type::floatn(2)]), None);
    assert_eq!(resolve_intrinsic("atan", &[Type::float(), Type::float()]),
               Some((Intrinsic::Atan2, Type::float())));
    assert_eq!(resolve_intrinsic("smoothstep", &[Type::float(), Type::float(), Type::floatn(2)]),
               Some((Intrinsic::SmoothStep, Type::floatn(2))));
    assert_eq!(resolve_intrinsic("lessThan",
                                 &[Type::Vector(ScalarType::Int, 2),
                                   Type::Vector(ScalarType::Int, 2)]),
               Some((Intrinsic::LessThan, Type::booln(2))));
    assert_eq!(resolve_intrinsic("lessThan", &[Type::float(), Type::float()]), None);
    assert_eq!(resolve_intrinsic("matrixCompMult", &[Type::Matrix(3), Type::Matrix(3)]),
               Some((Intrinsic::MatrixCompMult, Type::Matrix(3))));
    let sampler = Type::Sampler(SamplerType::Sampler2D);
    assert_eq!(resolve_intrinsic("texture2DProj", &[sampler.clone(), Type::floatn(4)]),
               Some((Intrinsic::Texture2DProj, Type::floatn(4))));
    assert_eq!(resolve_intrinsic("texture2D", &[sampler, Type::floatn(2), Type::float()]),
               Some((Intrinsic::Texture2DBias, Type::floatn(4))));
    assert_eq!(resolve_intrinsic("sin", &[Type::int()]), None);
    assert!(is_intrinsic_name("fwidth"));
    assert!(!is_intrinsic_name("saturate"));
}

#[test]
fn test_availability() {
    let vertex = ExtensionState::new(ShaderStage::Vertex, TranslateOptions::empty());
    let mut fragment = ExtensionState::new(ShaderStage::Fragment,
                                           TranslateOptions::ENABLE_STANDARD_DERIVATIVES);
    assert!(Intrinsic::Texture2DLod.is_available(ShaderStage::Vertex, &vertex));
    assert!(!Intrinsic::Texture2DLod.is_available(ShaderStage::Fragment, &fragment));
    assert!(!Intrinsic::Texture2DBias.is_available(ShaderStage::Vertex, &vertex));
    assert!(!Intrinsic::DFdx.is_available(ShaderStage::Fragment, &fragment));
    fragment.set_behavior(Extension::StandardDerivatives, ExtensionBehavior::Enable);
    assert!(Intrinsic::DFdx.is_available(ShaderStage::Fragment, &fragment));
}

#[test]
fn test_fold_intrinsics() {
    let v = Constant::Vector(vec![ScalarConstant::Float(3.0), ScalarConstant::Float(4.0)]);
    assert_eq!(fold_intrinsic(Intrinsic::Length, &[v.clone()], &Type::float()),
               Some(Constant::float(5.0)));
    assert_eq!(fold_intrinsic(Intrinsic::Max, &[v.clone(), Constant::float(3.5)], &Type::floatn(2)),
               Some(Constant::Vector(vec![ScalarConstant::Float(3.5), ScalarConstant::Float(4.0)])));
    assert_eq!(fold_intrinsic(Intrinsic::Mod, &[Constant::float(5.5), Constant::float(2.0)], &Type::float()),
               Some(Constant::float(1.5)));
    assert_eq!(fold_intrinsic(Intrinsic::Sqrt, &[Constant::float(-1.0)], &Type::float()), None);
    assert_eq!(fold_intrinsic(Intrinsic::Texture2D, &[], &Type::floatn(4)), None);
    let w = Constant::Vector(vec![ScalarConstant::Float(3.0), ScalarConstant::Float(5.0)]);
    assert_eq!(fold_intrinsic(Intrinsic::LessThan, &[v, w], &Type::booln(2)),
               Some(Constant::Vector(vec![ScalarConstant::Bool(false), ScalarConstant::Bool(true)])));
}
