use glt_shared::*;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Precision {
    Low,
    Medium,
    High,
}

/// Storage qualifiers for declarations
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TypeQualifier {
    Const,
    Attribute,
    Varying,
    InvariantVarying,
    Uniform,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ParamQualifier {
    In,
    Out,
    InOut,
}

/// A type as written in the source. Built in type names stay as names until
/// the typer resolves them, as they share a namespace with user structs.
#[derive(PartialEq, Debug, Clone)]
pub enum TypeSpecifier {
    Named(String),
    Struct(StructDefinition),
}

#[derive(PartialEq, Debug, Clone)]
pub struct TypeName {
    pub precision: Option<Precision>,
    pub specifier: Located<TypeSpecifier>,
}

impl TypeName {
    pub fn named(name: &str, loc: FileLocation) -> TypeName {
        TypeName {
            precision: None,
            specifier: Located::new(TypeSpecifier::Named(name.to_string()), loc),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Literal {
    Bool(bool),
    Int(u64),
    Float(f32),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum UnaryOp {
    PrefixIncrement,
    PrefixDecrement,
    PostfixIncrement,
    PostfixDecrement,
    Plus,
    Minus,
    LogicalNot,
    BitwiseNot,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    LeftShift,
    RightShift,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Equality,
    Inequality,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BooleanAnd,
    BooleanOr,
    BooleanXor,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum AssignOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    LeftShift,
    RightShift,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
}

#[derive(PartialEq, Debug, Clone)]
pub enum Expression {
    Literal(Literal),
    Variable(String),
    UnaryOperation(UnaryOp, Box<Located<Expression>>),
    BinaryOperation(BinOp, Box<Located<Expression>>, Box<Located<Expression>>),
    Assignment(AssignOp, Box<Located<Expression>>, Box<Located<Expression>>),
    TernaryConditional(Box<Located<Expression>>,
                       Box<Located<Expression>>,
                       Box<Located<Expression>>),
    /// Comma operator
    Sequence(Vec<Located<Expression>>),
    ArraySubscript(Box<Located<Expression>>, Box<Located<Expression>>),
    Member(Box<Located<Expression>>, Located<String>),
    /// Function call, constructor call or struct constructor
    Call(Located<String>, Vec<Located<Expression>>),
}

#[derive(PartialEq, Debug, Clone)]
pub struct Declarator {
    pub name: Located<String>,
    pub array_dim: Option<Located<Expression>>,
    pub initializer: Option<Located<Expression>>,
}

/// A declaration statement. May have no declarators when it only declares a
/// struct type.
#[derive(PartialEq, Debug, Clone)]
pub struct Declaration {
    pub qualifier: Option<Located<TypeQualifier>>,
    pub typename: TypeName,
    pub declarators: Vec<Declarator>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PrecisionDeclaration {
    pub precision: Precision,
    pub typename: Located<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum InitStatement {
    Empty,
    Expression(Located<Expression>),
    Declaration(Declaration),
}

#[derive(PartialEq, Debug, Clone)]
pub enum Condition {
    Expr(Located<Expression>),
    Assignment(TypeName, Located<String>, Located<Expression>),
}

#[derive(PartialEq, Debug, Clone)]
pub enum Statement {
    Empty,
    Expression(Located<Expression>),
    Declaration(Declaration),
    Precision(PrecisionDeclaration),
    Invariant(Vec<Located<String>>),
    Block(Vec<Located<Statement>>),
    If(Located<Expression>, Box<Located<Statement>>, Option<Box<Located<Statement>>>),
    For(InitStatement,
        Option<Condition>,
        Option<Located<Expression>>,
        Box<Located<Statement>>),
    While(Condition, Box<Located<Statement>>),
    DoWhile(Box<Located<Statement>>, Located<Expression>),
    Break,
    Continue,
    Discard,
    Return(Option<Located<Expression>>),
}

#[derive(PartialEq, Debug, Clone)]
pub struct StructMemberDeclarator {
    pub name: Located<String>,
    pub array_dim: Option<Located<Expression>>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StructMember {
    pub typename: TypeName,
    pub declarators: Vec<StructMemberDeclarator>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct StructDefinition {
    pub name: Option<Located<String>>,
    pub members: Vec<StructMember>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionParam {
    pub is_const: bool,
    pub qualifier: Option<ParamQualifier>,
    pub typename: TypeName,
    pub name: Option<Located<String>>,
    pub array_dim: Option<Located<Expression>>,
    pub location: FileLocation,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionPrototype {
    pub returntype: TypeName,
    pub name: Located<String>,
    pub params: Vec<FunctionParam>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FunctionDefinition {
    pub prototype: FunctionPrototype,
    pub body: Vec<Located<Statement>>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum RootDefinition {
    Declaration(Declaration),
    Precision(PrecisionDeclaration),
    Invariant(Vec<Located<String>>),
    FunctionPrototype(FunctionPrototype),
    Function(FunctionDefinition),
}

#[derive(PartialEq, Debug, Clone)]
pub struct Module {
    pub root_definitions: Vec<Located<RootDefinition>>,
}

impl Expression {
    pub fn variable(name: &str) -> Expression {
        Expression::Variable(name.to_string())
    }
}
