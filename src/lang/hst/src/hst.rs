pub type Identifier = String;

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum ScalarType {
    Bool,
    Int,
    Float,
}

#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub enum Type {
    Void,
    Scalar(ScalarType),
    Vector(ScalarType, u32),
    /// Square float matrix
    Matrix(u32),
    Struct(Identifier),
    Array(Box<Type>, u32),
    Texture2D,
    TextureCube,
    SamplerState,
}

impl Type {
    pub fn float() -> Type {
        Type::Scalar(ScalarType::Float)
    }
    pub fn floatn(dim: u32) -> Type {
        Type::Vector(ScalarType::Float, dim)
    }
    pub fn bool() -> Type {
        Type::Scalar(ScalarType::Bool)
    }

    /// Split an array type into its element type and length
    pub fn split_array(&self) -> (&Type, Option<u32>) {
        match *self {
            Type::Array(ref inner, size) => (inner, Some(size)),
            ref ty => (ty, None),
        }
    }

    pub fn is_matrix(&self) -> bool {
        match *self.split_array().0 {
            Type::Matrix(_) => true,
            _ => false,
        }
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Equality,
    Inequality,
    LogicalAnd,
    LogicalOr,
    Assignment,
    SumAssignment,
    DifferenceAssignment,
    ProductAssignment,
    QuotientAssignment,
}

impl BinOp {
    pub fn is_assignment(&self) -> bool {
        match *self {
            BinOp::Assignment |
            BinOp::SumAssignment |
            BinOp::DifferenceAssignment |
            BinOp::ProductAssignment |
            BinOp::QuotientAssignment => true,
            _ => false,
        }
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum UnaryOp {
    PrefixIncrement,
    PrefixDecrement,
    PostfixIncrement,
    PostfixDecrement,
    Plus,
    Minus,
    LogicalNot,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Literal {
    Bool(bool),
    Int(i32),
    Float(f32),
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum SwizzleSlot {
    X,
    Y,
    Z,
    W,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Expression {
    Literal(Literal),
    Variable(Identifier),
    UnaryOperation(UnaryOp, Box<Expression>),
    BinaryOperation(BinOp, Box<Expression>, Box<Expression>),
    TernaryConditional(Box<Expression>, Box<Expression>, Box<Expression>),
    Sequence(Vec<Expression>),
    Swizzle(Box<Expression>, Vec<SwizzleSlot>),
    ArraySubscript(Box<Expression>, Box<Expression>),
    Member(Box<Expression>, Identifier),
    Call(Identifier, Vec<Expression>),
    /// Method on an object, used for texture sampling
    MethodCall(Box<Expression>, Identifier, Vec<Expression>),
    NumericConstructor(Type, Vec<Expression>),
    Cast(Type, Box<Expression>),
}

impl Expression {
    pub fn var(name: &str) -> Expression {
        Expression::Variable(name.to_string())
    }

    pub fn member(self, name: &str) -> Expression {
        Expression::Member(Box::new(self), name.to_string())
    }

    pub fn binary(op: BinOp, lhs: Expression, rhs: Expression) -> Expression {
        Expression::BinaryOperation(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn assign(lhs: Expression, rhs: Expression) -> Expression {
        Expression::binary(BinOp::Assignment, lhs, rhs)
    }

    pub fn call(name: &str, args: Vec<Expression>) -> Expression {
        Expression::Call(name.to_string(), args)
    }
}

/// The node for representing the initial value of a variable
#[derive(PartialEq, Debug, Clone)]
pub enum Initializer {
    Expression(Expression),
    /// Arrays are initialized element by element
    Aggregate(Vec<Initializer>),
}

#[derive(PartialEq, Debug, Clone)]
pub struct Declarator {
    pub name: Identifier,
    pub array_dim: Option<u32>,
    pub init: Option<Initializer>,
}

/// Local declaration of one or more variables sharing a base type
#[derive(PartialEq, Debug, Clone)]
pub struct VarDef {
    pub typename: Type,
    pub declarators: Vec<Declarator>,
}

impl VarDef {
    /// Declare a single variable, splitting an array type into its declarator
    pub fn single(name: Identifier, ty: Type, init: Option<Initializer>) -> VarDef {
        let (typename, array_dim) = match ty {
            Type::Array(inner, size) => (*inner, Some(size)),
            ty => (ty, None),
        };
        VarDef {
            typename,
            declarators: vec![Declarator {
                                  name,
                                  array_dim,
                                  init,
                              }],
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum LoopAttribute {
    Unroll,
    Loop,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Statement {
    Expression(Expression),
    Var(VarDef),
    Block(Vec<Statement>),
    If(Expression, Box<Statement>),
    IfElse(Expression, Box<Statement>, Box<Statement>),
    For(LoopAttribute, VarDef, Expression, Expression, Box<Statement>),
    While(Expression, Box<Statement>),
    DoWhile(Box<Statement>, Expression),
    Break,
    Continue,
    Discard,
    Return(Option<Expression>),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Register {
    /// Constant register c<n>
    Constant(u32),
    /// Texture register t<n>
    Texture(u32),
    /// Sampler register s<n>
    Sampler(u32),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum GlobalStorage {
    Static,
    StaticConst,
    Uniform,
    /// Resource objects bound to a register without a storage keyword
    Resource,
}

#[derive(PartialEq, Debug, Clone)]
pub struct GlobalVariable {
    pub name: Identifier,
    pub typename: Type,
    pub storage: GlobalStorage,
    pub register: Option<Register>,
    pub init: Option<Initializer>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StructMember {
    pub name: Identifier,
    pub typename: Type,
    /// Semantic for members of entry point input and output structs
    pub semantic: Option<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StructDefinition {
    pub name: Identifier,
    pub members: Vec<StructMember>,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum InputModifier {
    In,
    Out,
    InOut,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionParam {
    pub name: Identifier,
    pub typename: Type,
    pub modifier: InputModifier,
}

impl FunctionParam {
    pub fn input(name: &str, typename: Type) -> FunctionParam {
        FunctionParam {
            name: name.to_string(),
            typename,
            modifier: InputModifier::In,
        }
    }
}

/// A function signature without a body
#[derive(PartialEq, Debug, Clone)]
pub struct FunctionDeclaration {
    pub name: Identifier,
    pub returntype: Type,
    pub params: Vec<FunctionParam>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionDefinition {
    pub name: Identifier,
    pub returntype: Type,
    pub params: Vec<FunctionParam>,
    pub body: Vec<Statement>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum RootDefinition {
    Struct(StructDefinition),
    GlobalVariable(GlobalVariable),
    FunctionDeclaration(FunctionDeclaration),
    Function(FunctionDefinition),
}

#[derive(PartialEq, Debug, Clone)]
pub struct Module {
    pub root_definitions: Vec<RootDefinition>,
}

#[test]
fn test_single_vardef() {
    let def = VarDef::single("a".to_string(), Type::Array(Box::new(Type::floatn(4)), 3), None);
    assert_eq!(def.typename, Type::floatn(4));
    assert_eq!(def.declarators[0].array_dim, Some(3));
    assert!(Type::Array(Box::new(Type::Matrix(2)), 2).is_matrix());
    assert!(!Type::floatn(2).is_matrix());
}
