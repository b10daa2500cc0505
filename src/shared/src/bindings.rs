use std::fmt;

/// Type of a value crossing the shader interface
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum BindingType {
    Bool,
    Int,
    Float,
    BoolVector(u32),
    IntVector(u32),
    FloatVector(u32),
    Matrix(u32),
    Sampler2D,
    SamplerCube,
    Struct(String, Vec<(String, BindingType)>),
    Array(Box<BindingType>, u32),
}

impl fmt::Display for BindingType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BindingType::Bool => write!(f, "bool"),
            BindingType::Int => write!(f, "int"),
            BindingType::Float => write!(f, "float"),
            BindingType::BoolVector(n) => write!(f, "bvec{}", n),
            BindingType::IntVector(n) => write!(f, "ivec{}", n),
            BindingType::FloatVector(n) => write!(f, "vec{}", n),
            BindingType::Matrix(n) => write!(f, "mat{}", n),
            BindingType::Sampler2D => write!(f, "sampler2D"),
            BindingType::SamplerCube => write!(f, "samplerCube"),
            BindingType::Struct(ref name, _) => write!(f, "{}", name),
            BindingType::Array(ref inner, size) => write!(f, "{}[{}]", inner, size),
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BindingKind {
    Attribute,
    Varying,
    Uniform,
    Sampler,
}

/// One resolved member of the shader interface
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ShaderBinding {
    pub kind: BindingKind,
    /// Name as written in the GLSL source
    pub name: String,
    /// Name used in the emitted HLSL
    pub hlsl_name: String,
    /// Register (c4, s0) or semantic (TEXCOORD2) assigned to the binding
    pub register: String,
    pub binding_type: BindingType,
}

#[test]
fn test_binding_type_display() {
    let ty = BindingType::Array(Box::new(BindingType::FloatVector(4)), 3);
    assert_eq!(ty.to_string(), "vec4[3]");
    assert_eq!(BindingType::Struct("Light".to_string(), vec![]).to_string(), "Light");
}
