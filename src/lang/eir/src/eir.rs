use std::error;
use std::fmt;
use glt_shared::*;
use crate::intrinsics::Intrinsic;
use crate::constants::{Constant, ScalarConstant};

pub use glt_lang_est::{Precision, UnaryOp, BinOp, AssignOp};

/// Basic scalar types
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum ScalarType {
    Bool,
    Int,
    Float,
}

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum SamplerType {
    Sampler2D,
    SamplerCube,
}

/// A fully resolved ESSL type. Struct types are nominal: two structs with
/// the same members are different types.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub enum Type {
    Void,
    Scalar(ScalarType),
    Vector(ScalarType, u32),
    /// Square float matrix
    Matrix(u32),
    Sampler(SamplerType),
    Struct(StructId),
    Array(Box<Type>, u32),
}

impl Type {
    pub fn bool() -> Type {
        Type::Scalar(ScalarType::Bool)
    }
    pub fn int() -> Type {
        Type::Scalar(ScalarType::Int)
    }
    pub fn float() -> Type {
        Type::Scalar(ScalarType::Float)
    }
    pub fn floatn(dim: u32) -> Type {
        Type::Vector(ScalarType::Float, dim)
    }
    pub fn booln(dim: u32) -> Type {
        Type::Vector(ScalarType::Bool, dim)
    }

    /// Build a scalar for one component or a vector otherwise
    pub fn from_numeric(scalar: ScalarType, components: u32) -> Type {
        match components {
            1 => Type::Scalar(scalar),
            n => Type::Vector(scalar, n),
        }
    }

    /// Resolve the name of a built in type
    pub fn from_keyword(name: &str) -> Option<Type> {
        Some(match name {
            "void" => Type::Void,
            "bool" => Type::bool(),
            "int" => Type::int(),
            "float" => Type::float(),
            "vec2" => Type::floatn(2),
            "vec3" => Type::floatn(3),
            "vec4" => Type::floatn(4),
            "bvec2" => Type::booln(2),
            "bvec3" => Type::booln(3),
            "bvec4" => Type::booln(4),
            "ivec2" => Type::Vector(ScalarType::Int, 2),
            "ivec3" => Type::Vector(ScalarType::Int, 3),
            "ivec4" => Type::Vector(ScalarType::Int, 4),
            "mat2" => Type::Matrix(2),
            "mat3" => Type::Matrix(3),
            "mat4" => Type::Matrix(4),
            "sampler2D" => Type::Sampler(SamplerType::Sampler2D),
            "samplerCube" => Type::Sampler(SamplerType::SamplerCube),
            _ => return None,
        })
    }

    pub fn to_scalar(&self) -> Option<ScalarType> {
        match *self {
            Type::Scalar(scalar) | Type::Vector(scalar, _) => Some(scalar),
            Type::Matrix(_) => Some(ScalarType::Float),
            _ => None,
        }
    }

    /// Number of scalar components in a numeric type
    pub fn get_num_components(&self) -> Option<u32> {
        match *self {
            Type::Scalar(_) => Some(1),
            Type::Vector(_, x) => Some(x),
            Type::Matrix(x) => Some(x * x),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.get_num_components().is_some()
    }

    pub fn is_scalar(&self) -> bool {
        match *self {
            Type::Scalar(_) => true,
            _ => false,
        }
    }

    pub fn is_array(&self) -> bool {
        match *self {
            Type::Array(_, _) => true,
            _ => false,
        }
    }

    pub fn is_sampler(&self) -> bool {
        match *self {
            Type::Sampler(_) => true,
            Type::Array(ref inner, _) => inner.is_sampler(),
            _ => false,
        }
    }

    /// The innermost non array type
    pub fn base_type(&self) -> &Type {
        match *self {
            Type::Array(ref inner, _) => inner.base_type(),
            ref ty => ty,
        }
    }

    /// float, vecN or matN
    pub fn is_float_family(&self) -> bool {
        self.base_type().to_scalar() == Some(ScalarType::Float)
    }

    pub fn is_int_family(&self) -> bool {
        self.base_type().to_scalar() == Some(ScalarType::Int)
    }

    pub fn is_bool_family(&self) -> bool {
        self.base_type().to_scalar() == Some(ScalarType::Bool)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::Int => write!(f, "int"),
            ScalarType::Float => write!(f, "float"),
        }
    }
}

/// Id to a function. Shares the index space of the identifier table.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct FunctionId(pub u32);
/// Id to a user defined struct
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct StructId(pub u32);
/// Id to a variable at any scope
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct VariableId(pub u32);

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum VariableQualifier {
    None,
    Const,
    Uniform,
    Attribute,
    Varying,
    ParamIn,
    ParamConstIn,
    ParamOut,
    ParamInOut,
}

pub use glt_lang_est::ParamQualifier;

#[derive(PartialEq, Debug, Clone)]
pub struct VariableInfo {
    pub name: String,
    pub ty: Type,
    pub qualifier: VariableQualifier,
    pub precision: Option<Precision>,
    /// Folded value of const variables
    pub value: Option<Constant>,
    pub depth: u32,
    pub invariant: bool,
    pub location: FileLocation,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ParamInfo {
    pub ty: Type,
    pub qualifier: ParamQualifier,
    pub is_const: bool,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    pub returntype: Type,
    pub params: Vec<ParamInfo>,
    pub defined: bool,
    pub location: FileLocation,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StructMember {
    pub name: String,
    pub ty: Type,
    pub precision: Option<Precision>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StructInfo {
    /// Anonymous structs have no name
    pub name: Option<String>,
    pub members: Vec<StructMember>,
    pub depth: u32,
    pub location: FileLocation,
}

impl StructInfo {
    pub fn get_member(&self, name: &str) -> Option<&StructMember> {
        self.members.iter().find(|member| member.name == name)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Identifier {
    Variable(VariableInfo),
    Function(FunctionInfo),
    Struct(StructInfo),
}

/// Every identifier declared in a shader, in declaration order. Entries
/// outlive the scopes that declared them so they can be emitted later.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct IdentifierTable {
    entries: Vec<Identifier>,
}

impl IdentifierTable {
    pub fn new() -> IdentifierTable {
        IdentifierTable { entries: vec![] }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_variable(&mut self, info: VariableInfo) -> VariableId {
        self.entries.push(Identifier::Variable(info));
        VariableId(self.entries.len() as u32 - 1)
    }

    pub fn add_function(&mut self, info: FunctionInfo) -> FunctionId {
        self.entries.push(Identifier::Function(info));
        FunctionId(self.entries.len() as u32 - 1)
    }

    pub fn add_struct(&mut self, info: StructInfo) -> StructId {
        self.entries.push(Identifier::Struct(info));
        StructId(self.entries.len() as u32 - 1)
    }

    pub fn variable(&self, id: VariableId) -> &VariableInfo {
        match self.entries[id.0 as usize] {
            Identifier::Variable(ref info) => info,
            _ => panic!("identifier {} is not a variable", id.0),
        }
    }

    pub fn variable_mut(&mut self, id: VariableId) -> &mut VariableInfo {
        match self.entries[id.0 as usize] {
            Identifier::Variable(ref mut info) => info,
            _ => panic!("identifier {} is not a variable", id.0),
        }
    }

    pub fn function(&self, id: FunctionId) -> &FunctionInfo {
        match self.entries[id.0 as usize] {
            Identifier::Function(ref info) => info,
            _ => panic!("identifier {} is not a function", id.0),
        }
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionInfo {
        match self.entries[id.0 as usize] {
            Identifier::Function(ref mut info) => info,
            _ => panic!("identifier {} is not a function", id.0),
        }
    }

    pub fn structure(&self, id: StructId) -> &StructInfo {
        match self.entries[id.0 as usize] {
            Identifier::Struct(ref info) => info,
            _ => panic!("identifier {} is not a struct", id.0),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<Identifier> {
        self.entries.iter()
    }

    /// Unique output name for a variable
    pub fn get_variable_name(&self, id: VariableId) -> String {
        format!("var_{}_{}", self.variable(id).depth, id.0)
    }

    /// Unique output name for a function
    pub fn get_function_name(&self, id: FunctionId) -> String {
        format!("fn_0_{}", id.0)
    }

    /// Unique output name for a struct
    pub fn get_struct_name(&self, id: StructId) -> String {
        format!("typ_{}_{}", self.structure(id).depth, id.0)
    }

    /// ESSL spelling of a type for diagnostics
    pub fn get_type_name(&self, ty: &Type) -> String {
        match *ty {
            Type::Void => "void".to_string(),
            Type::Scalar(scalar) => scalar.to_string(),
            Type::Vector(scalar, x) => {
                let prefix = match scalar {
                    ScalarType::Bool => "b",
                    ScalarType::Int => "i",
                    ScalarType::Float => "",
                };
                format!("{}vec{}", prefix, x)
            }
            Type::Matrix(x) => format!("mat{}", x),
            Type::Sampler(SamplerType::Sampler2D) => "sampler2D".to_string(),
            Type::Sampler(SamplerType::SamplerCube) => "samplerCube".to_string(),
            Type::Struct(id) => {
                match self.structure(id).name {
                    Some(ref name) => name.clone(),
                    None => "<anonymous struct>".to_string(),
                }
            }
            Type::Array(ref inner, size) => format!("{}[{}]", self.get_type_name(inner), size),
        }
    }

    /// Number of vector registers a value of the type occupies
    pub fn get_register_count(&self, ty: &Type) -> u32 {
        match *ty {
            Type::Void => 0,
            Type::Scalar(_) | Type::Vector(_, _) | Type::Sampler(_) => 1,
            Type::Matrix(x) => x,
            Type::Struct(id) => {
                self.structure(id)
                    .members
                    .iter()
                    .map(|member| self.get_register_count(&member.ty))
                    .sum()
            }
            Type::Array(ref inner, size) => self.get_register_count(inner) * size,
        }
    }

    /// Depth of struct nesting, 1 for a struct of only non struct members
    pub fn get_struct_nesting(&self, ty: &Type) -> u32 {
        match *ty.base_type() {
            Type::Struct(id) => {
                1 + self.structure(id)
                    .members
                    .iter()
                    .map(|member| self.get_struct_nesting(&member.ty))
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// True if a type has an array anywhere inside it
    pub fn contains_array(&self, ty: &Type) -> bool {
        match *ty {
            Type::Array(_, _) => true,
            Type::Struct(id) => {
                self.structure(id).members.iter().any(|member| self.contains_array(&member.ty))
            }
            _ => false,
        }
    }
}

/// Variables that exist without a declaration
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum BuiltinVariable {
    Position,
    PointSize,
    FragCoord,
    FrontFacing,
    FragColor,
    FragData,
    PointCoord,
    FragDepth,
}

impl BuiltinVariable {
    pub fn from_name(name: &str) -> Option<BuiltinVariable> {
        Some(match name {
            "gl_Position" => BuiltinVariable::Position,
            "gl_PointSize" => BuiltinVariable::PointSize,
            "gl_FragCoord" => BuiltinVariable::FragCoord,
            "gl_FrontFacing" => BuiltinVariable::FrontFacing,
            "gl_FragColor" => BuiltinVariable::FragColor,
            "gl_FragData" => BuiltinVariable::FragData,
            "gl_PointCoord" => BuiltinVariable::PointCoord,
            "gl_FragDepthEXT" => BuiltinVariable::FragDepth,
            _ => return None,
        })
    }

    pub fn get_name(&self) -> &'static str {
        match *self {
            BuiltinVariable::Position => "gl_Position",
            BuiltinVariable::PointSize => "gl_PointSize",
            BuiltinVariable::FragCoord => "gl_FragCoord",
            BuiltinVariable::FrontFacing => "gl_FrontFacing",
            BuiltinVariable::FragColor => "gl_FragColor",
            BuiltinVariable::FragData => "gl_FragData",
            BuiltinVariable::PointCoord => "gl_PointCoord",
            BuiltinVariable::FragDepth => "gl_FragDepthEXT",
        }
    }

    pub fn get_type(&self) -> Type {
        match *self {
            BuiltinVariable::Position |
            BuiltinVariable::FragCoord |
            BuiltinVariable::FragColor => Type::floatn(4),
            BuiltinVariable::PointSize | BuiltinVariable::FragDepth => Type::float(),
            BuiltinVariable::FrontFacing => Type::bool(),
            BuiltinVariable::FragData => Type::Array(Box::new(Type::floatn(4)), 1),
            BuiltinVariable::PointCoord => Type::floatn(2),
        }
    }

    pub fn get_stage(&self) -> ShaderStage {
        match *self {
            BuiltinVariable::Position | BuiltinVariable::PointSize => ShaderStage::Vertex,
            _ => ShaderStage::Fragment,
        }
    }

    /// Inputs from the rasterizer can not be written
    pub fn is_read_only(&self) -> bool {
        match *self {
            BuiltinVariable::FragCoord |
            BuiltinVariable::FrontFacing |
            BuiltinVariable::PointCoord => true,
            _ => false,
        }
    }

    pub fn is_input(&self) -> bool {
        self.is_read_only()
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum SwizzleSlot {
    X, // x or r or s
    Y, // y or g or t
    Z, // z or b or p
    W, // w or a or q
}

impl SwizzleSlot {
    pub fn get_index(&self) -> u32 {
        match *self {
            SwizzleSlot::X => 0,
            SwizzleSlot::Y => 1,
            SwizzleSlot::Z => 2,
            SwizzleSlot::W => 3,
        }
    }

    pub fn from_index(index: u32) -> SwizzleSlot {
        match index {
            0 => SwizzleSlot::X,
            1 => SwizzleSlot::Y,
            2 => SwizzleSlot::Z,
            3 => SwizzleSlot::W,
            _ => panic!("swizzle index {} out of range", index),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Expression {
    Literal(ScalarConstant),
    Variable(VariableId),
    Builtin(BuiltinVariable),
    UnaryOperation(UnaryOp, Box<Expression>),
    BinaryOperation(BinOp, Box<Expression>, Box<Expression>),
    Assignment(AssignOp, Box<Expression>, Box<Expression>),
    TernaryConditional(Box<Expression>, Box<Expression>, Box<Expression>),
    Sequence(Vec<Expression>),
    Swizzle(Box<Expression>, Vec<SwizzleSlot>),
    ArraySubscript(Box<Expression>, Box<Expression>),
    Member(Box<Expression>, String),
    Call(FunctionId, Vec<Expression>),
    /// Built in function call with its resolved return type
    Intrinsic(Intrinsic, Vec<Expression>, Type),
    /// Constructors for scalar, vector and matrix types
    Constructor(Type, Vec<Expression>),
    StructConstructor(StructId, Vec<Expression>),
}

#[derive(PartialEq, Debug, Clone)]
pub struct VarDef {
    pub id: VariableId,
    pub init: Option<Expression>,
    /// The initializer folded to a constant
    pub constant_init: bool,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Condition {
    Expr(Expression),
    Assignment(VarDef),
}

/// A loop in the restricted form: one index variable, a comparison against
/// a constant and a constant step
#[derive(PartialEq, Debug, Clone)]
pub struct ForLoop {
    pub init: VarDef,
    pub condition: Expression,
    pub iteration: Expression,
    pub body: Box<Statement>,
    /// Iteration count when it could be computed from direct constants
    pub iterations: Option<u64>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Statement {
    Expression(Expression),
    /// Declaration of one or more variables of the same base type
    Var(Vec<VarDef>),
    Block(Vec<Statement>),
    If(Expression, Box<Statement>, Option<Box<Statement>>),
    For(ForLoop),
    While(Condition, Box<Statement>),
    DoWhile(Box<Statement>, Expression),
    Break,
    Continue,
    Discard,
    Return(Option<Expression>),
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionDefinition {
    pub id: FunctionId,
    /// Parameter variables, None for unnamed parameters
    pub params: Vec<Option<VariableId>>,
    pub body: Vec<Statement>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum RootDefinition {
    GlobalVariable(Vec<VarDef>),
    FunctionPrototype(FunctionId),
    Function(FunctionDefinition),
}

#[derive(PartialEq, Debug, Clone)]
pub struct Module {
    pub stage: ShaderStage,
    pub table: IdentifierTable,
    pub root_definitions: Vec<RootDefinition>,
    /// Global variables in order of first reference
    pub static_uses: Vec<VariableId>,
    /// Built in variables in order of first reference
    pub builtin_uses: Vec<BuiltinVariable>,
    pub main: Option<FunctionId>,
}

impl Module {
    pub fn is_statically_used(&self, id: VariableId) -> bool {
        self.static_uses.contains(&id)
    }

    pub fn uses_builtin(&self, builtin: BuiltinVariable) -> bool {
        self.builtin_uses.contains(&builtin)
    }

    pub fn has_function_definitions(&self) -> bool {
        self.root_definitions.iter().any(|root| match *root {
            RootDefinition::Function(_) => true,
            _ => false,
        })
    }
}

/// Error in finding the type of an expression
/// These are internal errors as they represent incorrectly generated trees
#[derive(PartialEq, Debug, Clone)]
pub enum TypeError {
    StructMemberDoesNotExist(StructId, String),
    InvalidTypeForSwizzle(Type),
    MemberNodeMustBeUsedOnStruct(Type, String),
    ArrayIndexMustBeUsedOnArrayType(Type),
    EmptySequence,
}

impl error::Error for TypeError {}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TypeError::StructMemberDoesNotExist(_, ref name) => {
                write!(f, "struct member {} does not exist", name)
            }
            TypeError::InvalidTypeForSwizzle(_) => write!(f, "swizzle nodes must be used on vectors"),
            TypeError::MemberNodeMustBeUsedOnStruct(_, ref name) => {
                write!(f, "member {} used on non-struct type", name)
            }
            TypeError::ArrayIndexMustBeUsedOnArrayType(_) => {
                write!(f, "array index used on non-indexable type")
            }
            TypeError::EmptySequence => write!(f, "empty sequence expression"),
        }
    }
}

/// An object to hold the types of every declared identifier
pub trait TypeContext {
    fn get_variable(&self, id: &VariableId) -> Type;
    fn get_struct_member(&self, id: &StructId, name: &str) -> Result<Type, TypeError>;
    fn get_function_return(&self, id: &FunctionId) -> Type;
}

impl TypeContext for IdentifierTable {
    fn get_variable(&self, id: &VariableId) -> Type {
        self.variable(*id).ty.clone()
    }

    fn get_struct_member(&self, id: &StructId, name: &str) -> Result<Type, TypeError> {
        match self.structure(*id).get_member(name) {
            Some(member) => Ok(member.ty.clone()),
            None => Err(TypeError::StructMemberDoesNotExist(*id, name.to_string())),
        }
    }

    fn get_function_return(&self, id: &FunctionId) -> Type {
        self.function(*id).returntype.clone()
    }
}

pub struct TypeParser;

impl TypeParser {
    fn get_literal_type(literal: &ScalarConstant) -> Type {
        match *literal {
            ScalarConstant::Bool(_) => Type::bool(),
            ScalarConstant::Int(_) => Type::int(),
            ScalarConstant::Float(_) => Type::float(),
        }
    }

    /// Result type of a binary arithmetic operation on verified operands
    pub fn get_arithmetic_type(op: &BinOp, left: &Type, right: &Type) -> Type {
        match (op, left, right) {
            (&BinOp::Multiply, &Type::Matrix(_), &Type::Vector(_, _)) => right.clone(),
            (&BinOp::Multiply, &Type::Vector(_, _), &Type::Matrix(_)) => left.clone(),
            (_, &Type::Scalar(_), _) => right.clone(),
            _ => left.clone(),
        }
    }

    pub fn get_expression_type(expression: &Expression,
                               context: &dyn TypeContext)
                               -> Result<Type, TypeError> {
        match *expression {
            Expression::Literal(ref lit) => Ok(TypeParser::get_literal_type(lit)),
            Expression::Variable(ref id) => Ok(context.get_variable(id)),
            Expression::Builtin(ref builtin) => Ok(builtin.get_type()),
            Expression::UnaryOperation(ref op, ref expr) => {
                match *op {
                    UnaryOp::LogicalNot => Ok(Type::bool()),
                    _ => TypeParser::get_expression_type(expr, context),
                }
            }
            Expression::BinaryOperation(ref op, ref lhs, ref rhs) => {
                match *op {
                    BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide |
                    BinOp::Modulus => {
                        let left = TypeParser::get_expression_type(lhs, context)?;
                        let right = TypeParser::get_expression_type(rhs, context)?;
                        Ok(TypeParser::get_arithmetic_type(op, &left, &right))
                    }
                    BinOp::LeftShift | BinOp::RightShift | BinOp::BitwiseAnd |
                    BinOp::BitwiseOr | BinOp::BitwiseXor => {
                        TypeParser::get_expression_type(lhs, context)
                    }
                    _ => Ok(Type::bool()),
                }
            }
            Expression::Assignment(_, ref lhs, _) => TypeParser::get_expression_type(lhs, context),
            Expression::TernaryConditional(_, ref left, _) => {
                TypeParser::get_expression_type(left, context)
            }
            Expression::Sequence(ref exprs) => {
                match exprs.last() {
                    Some(last) => TypeParser::get_expression_type(last, context),
                    None => Err(TypeError::EmptySequence),
                }
            }
            Expression::Swizzle(ref vec, ref swizzle) => {
                let vec_ty = TypeParser::get_expression_type(vec, context)?;
                match vec_ty {
                    Type::Vector(scalar, _) => {
                        Ok(Type::from_numeric(scalar, swizzle.len() as u32))
                    }
                    _ => Err(TypeError::InvalidTypeForSwizzle(vec_ty)),
                }
            }
            Expression::ArraySubscript(ref array, _) => {
                let array_ty = TypeParser::get_expression_type(array, context)?;
                match array_ty {
                    Type::Array(element, _) => Ok(*element),
                    Type::Vector(scalar, _) => Ok(Type::Scalar(scalar)),
                    Type::Matrix(x) => Ok(Type::floatn(x)),
                    ty => Err(TypeError::ArrayIndexMustBeUsedOnArrayType(ty)),
                }
            }
            Expression::Member(ref expr, ref name) => {
                let expr_ty = TypeParser::get_expression_type(expr, context)?;
                match expr_ty {
                    Type::Struct(id) => context.get_struct_member(&id, name),
                    ty => Err(TypeError::MemberNodeMustBeUsedOnStruct(ty, name.clone())),
                }
            }
            Expression::Call(ref id, _) => Ok(context.get_function_return(id)),
            Expression::Intrinsic(_, _, ref ty) => Ok(ty.clone()),
            Expression::Constructor(ref ty, _) => Ok(ty.clone()),
            Expression::StructConstructor(ref id, _) => Ok(Type::Struct(*id)),
        }
    }
}

#[cfg(test)]
fn test_table() -> IdentifierTable {
    let mut table = IdentifierTable::new();
    table.add_struct(StructInfo {
        name: Some("S".to_string()),
        members: vec![StructMember {
                          name: "a".to_string(),
                          ty: Type::int(),
                          precision: None,
                      },
                      StructMember {
                          name: "m".to_string(),
                          ty: Type::Array(Box::new(Type::Matrix(3)), 2),
                          precision: None,
                      }],
        depth: 0,
        location: FileLocation::none(),
    });
    table.add_function(FunctionInfo {
        name: "foo".to_string(),
        returntype: Type::Void,
        params: vec![],
        defined: true,
        location: FileLocation::none(),
    });
    table.add_variable(VariableInfo {
        name: "s".to_string(),
        ty: Type::Struct(StructId(0)),
        qualifier: VariableQualifier::None,
        precision: None,
        value: None,
        depth: 1,
        invariant: false,
        location: FileLocation::none(),
    });
    table
}

#[test]
fn test_mangled_names() {
    let table = test_table();
    assert_eq!(table.get_struct_name(StructId(0)), "typ_0_0");
    assert_eq!(table.get_function_name(FunctionId(1)), "fn_0_1");
    assert_eq!(table.get_variable_name(VariableId(2)), "var_1_2");
}

#[test]
fn test_register_count() {
    let table = test_table();
    assert_eq!(table.get_register_count(&Type::Struct(StructId(0))), 7);
    assert_eq!(table.get_register_count(&Type::Array(Box::new(Type::floatn(4)), 3)), 3);
    assert_eq!(table.get_struct_nesting(&Type::Struct(StructId(0))), 1);
    assert!(table.contains_array(&Type::Struct(StructId(0))));
    assert_eq!(table.get_type_name(&Type::Array(Box::new(Type::Vector(ScalarType::Int, 2)), 4)),
               "ivec2[4]");
}

#[test]
fn test_expression_type() {
    let table = test_table();
    let s = Box::new(Expression::Variable(VariableId(2)));
    let m = Expression::Member(s.clone(), "m".to_string());
    let column = Expression::ArraySubscript(Box::new(Expression::ArraySubscript(Box::new(m),
                                                    Box::new(Expression::Literal(ScalarConstant::Int(0))))),
                                            Box::new(Expression::Literal(ScalarConstant::Int(1))));
    assert_eq!(TypeParser::get_expression_type(&column, &table), Ok(Type::floatn(3)));

    let swizzle = Expression::Swizzle(Box::new(column), vec![SwizzleSlot::X, SwizzleSlot::X]);
    assert_eq!(TypeParser::get_expression_type(&swizzle, &table), Ok(Type::floatn(2)));

    let mul = Expression::BinaryOperation(BinOp::Multiply,
                                          Box::new(Expression::Constructor(Type::Matrix(2), vec![])),
                                          Box::new(Expression::Constructor(Type::floatn(2), vec![])));
    assert_eq!(TypeParser::get_expression_type(&mul, &table), Ok(Type::floatn(2)));

    let bad = Expression::Member(s, "b".to_string());
    assert_eq!(TypeParser::get_expression_type(&bad, &table),
               Err(TypeError::StructMemberDoesNotExist(StructId(0), "b".to_string())));
}
