use std::error;
use std::fmt;
use glt_shared::*;
use glt_lang_etk::*;
use glt_lang_est::*;
use nom::branch::alt;
use nom::combinator::{map, opt, value};
use nom::error::ErrorKind;
use nom::multi::{many1, separated_list0, separated_list1};
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;

#[derive(PartialEq, Debug, Clone)]
pub struct ParseError(pub ParseErrorReason, pub Option<LexToken>);

#[derive(PartialEq, Debug, Clone)]
pub enum ParseErrorReason {
    Unknown,
    UnexpectedEndOfStream,
    FailedToParse,
    WrongToken,
    NestingTooDeep,
}

impl ParseError {
    pub fn get_code(&self) -> ErrorCode {
        match self.0 {
            ParseErrorReason::NestingTooDeep => ErrorCode::ShaderComplexity,
            _ => ErrorCode::SyntaxError,
        }
    }

    pub fn get_location(&self) -> FileLocation {
        match self.1 {
            Some(LexToken(_, location)) => location,
            None => FileLocation::none(),
        }
    }
}

impl error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.0, &self.1) {
            (&ParseErrorReason::NestingTooDeep, _) => write!(f, "brackets nested too deeply"),
            (&ParseErrorReason::UnexpectedEndOfStream, _) |
            (_, &Some(LexToken(Token::Eof, _))) => write!(f, "unexpected end of file"),
            (_, &Some(LexToken(ref token, _))) => write!(f, "syntax error near '{}'", token),
            (_, &None) => write!(f, "syntax error"),
        }
    }
}

/// Error state while parsing: the remaining tokens at the point of failure
#[derive(PartialEq, Debug, Clone)]
struct ParseErrorContext<'t>(&'t [LexToken], ParseErrorReason);

impl<'t> nom::error::ParseError<&'t [LexToken]> for ParseErrorContext<'t> {
    fn from_error_kind(input: &'t [LexToken], _: ErrorKind) -> Self {
        ParseErrorContext(input, ParseErrorReason::WrongToken)
    }

    fn append(_: &'t [LexToken], _: ErrorKind, other: Self) -> Self {
        other
    }

    // Keep the error that got furthest through the stream
    fn or(self, other: Self) -> Self {
        if other.0.len() < self.0.len() {
            other
        } else {
            self
        }
    }
}

type PResult<'t, T> = IResult<&'t [LexToken], T, ParseErrorContext<'t>>;

fn wrong_token(input: &[LexToken]) -> nom::Err<ParseErrorContext<'_>> {
    nom::Err::Error(ParseErrorContext(input, ParseErrorReason::WrongToken))
}

fn token<'t>(expected: Token) -> impl Fn(&'t [LexToken]) -> PResult<'t, FileLocation> {
    move |input: &'t [LexToken]| match input.first() {
        Some(&LexToken(ref next, location)) if *next == expected => Ok((&input[1..], location)),
        _ => Err(wrong_token(input)),
    }
}

fn get_most_relevant_error<'t>(lhs: nom::Err<ParseErrorContext<'t>>,
                               rhs: nom::Err<ParseErrorContext<'t>>)
                               -> nom::Err<ParseErrorContext<'t>> {
    use nom::error::ParseError as NomParseError;
    match (lhs, rhs) {
        (nom::Err::Error(lhs), nom::Err::Error(rhs)) => nom::Err::Error(lhs.or(rhs)),
        (nom::Err::Error(_), other) | (other, _) => other,
    }
}

fn first_location(input: &[LexToken]) -> FileLocation {
    match input.first() {
        Some(&LexToken(_, location)) => location,
        None => FileLocation::none(),
    }
}

/// Names are identifiers or reserved words. Reserved words are rejected when
/// the name is declared.
fn identifier(input: &[LexToken]) -> PResult<'_, Located<String>> {
    match input.first() {
        Some(&LexToken(Token::Id(Identifier(ref name)), location)) |
        Some(&LexToken(Token::Reserved(Identifier(ref name)), location)) => {
            Ok((&input[1..], Located::new(name.clone(), location)))
        }
        _ => Err(wrong_token(input)),
    }
}

fn keyword_void(input: &[LexToken]) -> PResult<'_, FileLocation> {
    token(Token::Id(Identifier("void".to_string())))(input)
}

fn precision(input: &[LexToken]) -> PResult<'_, Precision> {
    alt((value(Precision::Low, token(Token::LowP)),
         value(Precision::Medium, token(Token::MediumP)),
         value(Precision::High, token(Token::HighP))))(input)
}

fn array_dim(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    delimited(token(Token::LeftSquareBracket),
              expr,
              token(Token::RightSquareBracket))(input)
}

fn struct_member(input: &[LexToken]) -> PResult<'_, StructMember> {
    let member_declarator = map(pair(identifier, opt(array_dim)),
                                |(name, array_dim)| StructMemberDeclarator { name, array_dim });
    let (rest, typename) = type_name(input)?;
    let (rest, declarators) = separated_list1(token(Token::Comma), member_declarator)(rest)?;
    let (rest, _) = token(Token::Semicolon)(rest)?;
    Ok((rest, StructMember { typename, declarators }))
}

fn struct_definition(input: &[LexToken]) -> PResult<'_, Located<TypeSpecifier>> {
    let (rest, location) = token(Token::Struct)(input)?;
    let (rest, name) = opt(identifier)(rest)?;
    let (rest, members) = delimited(token(Token::LeftBrace),
                                    many1(struct_member),
                                    token(Token::RightBrace))(rest)?;
    let definition = StructDefinition { name, members };
    Ok((rest, Located::new(TypeSpecifier::Struct(definition), location)))
}

fn type_specifier(input: &[LexToken]) -> PResult<'_, Located<TypeSpecifier>> {
    alt((struct_definition,
         map(identifier,
             |name| Located::new(TypeSpecifier::Named(name.node), name.location))))(input)
}

fn type_name(input: &[LexToken]) -> PResult<'_, TypeName> {
    map(pair(opt(precision), type_specifier),
        |(precision, specifier)| TypeName { precision, specifier })(input)
}

fn literal(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    let (literal, location) = match input.first() {
        Some(&LexToken(Token::LiteralInt(i), location)) => (Literal::Int(i), location),
        Some(&LexToken(Token::LiteralFloat(f), location)) => (Literal::Float(f), location),
        Some(&LexToken(Token::True, location)) => (Literal::Bool(true), location),
        Some(&LexToken(Token::False, location)) => (Literal::Bool(false), location),
        _ => return Err(wrong_token(input)),
    };
    Ok((&input[1..], Located::new(Expression::Literal(literal), location)))
}

fn call_args(input: &[LexToken]) -> PResult<'_, Vec<Located<Expression>>> {
    let (rest, _) = token(Token::LeftParen)(input)?;
    if let Ok((rest, _)) = pair(keyword_void, token(Token::RightParen))(rest) {
        return Ok((rest, vec![]));
    }
    let (rest, args) = separated_list0(token(Token::Comma), expr_assignment)(rest)?;
    let (rest, _) = token(Token::RightParen)(rest)?;
    Ok((rest, args))
}

fn expr_primary(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    match input.first() {
        Some(&LexToken(Token::LeftParen, location)) => {
            let (rest, inner) = delimited(token(Token::LeftParen),
                                          expr,
                                          token(Token::RightParen))(input)?;
            Ok((rest, Located::new(inner.node, location)))
        }
        Some(&LexToken(Token::Id(_), _)) |
        Some(&LexToken(Token::Reserved(_), _)) => {
            let (rest, name) = identifier(input)?;
            match rest.first() {
                Some(&LexToken(Token::LeftParen, _)) => {
                    let (rest, args) = call_args(rest)?;
                    let location = name.location;
                    Ok((rest, Located::new(Expression::Call(name, args), location)))
                }
                _ => Ok((rest, Located::new(Expression::Variable(name.node), name.location))),
            }
        }
        _ => literal(input),
    }
}

fn expr_postfix(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    let (mut rest, mut expression) = expr_primary(input)?;
    loop {
        let location = expression.location;
        let node = match rest.first() {
            Some(&LexToken(Token::Increment, _)) => {
                rest = &rest[1..];
                Expression::UnaryOperation(UnaryOp::PostfixIncrement, Box::new(expression))
            }
            Some(&LexToken(Token::Decrement, _)) => {
                rest = &rest[1..];
                Expression::UnaryOperation(UnaryOp::PostfixDecrement, Box::new(expression))
            }
            Some(&LexToken(Token::Period, _)) => {
                let (remaining, member) = identifier(&rest[1..])?;
                rest = remaining;
                Expression::Member(Box::new(expression), member)
            }
            Some(&LexToken(Token::LeftSquareBracket, _)) => {
                let (remaining, index) = array_dim(rest)?;
                rest = remaining;
                Expression::ArraySubscript(Box::new(expression), Box::new(index))
            }
            _ => return Ok((rest, expression)),
        };
        expression = Located::new(node, location);
    }
}

fn expr_unary(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    let mut operators = vec![];
    let mut rest = input;
    loop {
        let op = match rest.first() {
            Some(&LexToken(Token::Increment, _)) => UnaryOp::PrefixIncrement,
            Some(&LexToken(Token::Decrement, _)) => UnaryOp::PrefixDecrement,
            Some(&LexToken(Token::Plus, _)) => UnaryOp::Plus,
            Some(&LexToken(Token::Minus, _)) => UnaryOp::Minus,
            Some(&LexToken(Token::ExclamationPoint, _)) => UnaryOp::LogicalNot,
            Some(&LexToken(Token::Tilde, _)) => UnaryOp::BitwiseNot,
            _ => break,
        };
        operators.push(Located::new(op, first_location(rest)));
        rest = &rest[1..];
    }
    let (rest, mut expression) = expr_postfix(rest)?;
    while let Some(op) = operators.pop() {
        let Located { node: op, location } = op;
        expression = Located::new(Expression::UnaryOperation(op, Box::new(expression)), location);
    }
    Ok((rest, expression))
}

type ExprParser = for<'t> fn(&'t [LexToken]) -> PResult<'t, Located<Expression>>;
type BinOpParser = for<'t> fn(&'t [LexToken]) -> PResult<'t, BinOp>;

/// Parse a left associative chain of binary operators at one precedence level
fn binary_chain<'t>(input: &'t [LexToken],
                    operand: ExprParser,
                    operator: BinOpParser)
                    -> PResult<'t, Located<Expression>> {
    let (mut rest, mut left) = operand(input)?;
    loop {
        match operator(rest) {
            Ok((after_op, op)) => {
                let (after_right, right) = operand(after_op)?;
                let location = left.location;
                left = Located::new(Expression::BinaryOperation(op,
                                                                Box::new(left),
                                                                Box::new(right)),
                                    location);
                rest = after_right;
            }
            Err(nom::Err::Error(_)) => return Ok((rest, left)),
            Err(err) => return Err(err),
        }
    }
}

fn op_multiplicative(input: &[LexToken]) -> PResult<'_, BinOp> {
    alt((value(BinOp::Multiply, token(Token::Asterix)),
         value(BinOp::Divide, token(Token::ForwardSlash)),
         value(BinOp::Modulus, token(Token::Percent))))(input)
}

fn op_additive(input: &[LexToken]) -> PResult<'_, BinOp> {
    alt((value(BinOp::Add, token(Token::Plus)),
         value(BinOp::Subtract, token(Token::Minus))))(input)
}

fn op_shift(input: &[LexToken]) -> PResult<'_, BinOp> {
    alt((value(BinOp::LeftShift, token(Token::LeftShift)),
         value(BinOp::RightShift, token(Token::RightShift))))(input)
}

fn op_relational(input: &[LexToken]) -> PResult<'_, BinOp> {
    alt((value(BinOp::LessThan, token(Token::LeftAngleBracket)),
         value(BinOp::GreaterThan, token(Token::RightAngleBracket)),
         value(BinOp::LessEqual, token(Token::LessEqual)),
         value(BinOp::GreaterEqual, token(Token::GreaterEqual))))(input)
}

fn op_equality(input: &[LexToken]) -> PResult<'_, BinOp> {
    alt((value(BinOp::Equality, token(Token::DoubleEquals)),
         value(BinOp::Inequality, token(Token::ExclamationEquals))))(input)
}

fn op_bitwise_and(input: &[LexToken]) -> PResult<'_, BinOp> {
    value(BinOp::BitwiseAnd, token(Token::Ampersand))(input)
}

fn op_bitwise_xor(input: &[LexToken]) -> PResult<'_, BinOp> {
    value(BinOp::BitwiseXor, token(Token::Hat))(input)
}

fn op_bitwise_or(input: &[LexToken]) -> PResult<'_, BinOp> {
    value(BinOp::BitwiseOr, token(Token::VerticalBar))(input)
}

fn op_logical_and(input: &[LexToken]) -> PResult<'_, BinOp> {
    value(BinOp::BooleanAnd, token(Token::DoubleAmpersand))(input)
}

fn op_logical_xor(input: &[LexToken]) -> PResult<'_, BinOp> {
    value(BinOp::BooleanXor, token(Token::DoubleHat))(input)
}

fn op_logical_or(input: &[LexToken]) -> PResult<'_, BinOp> {
    value(BinOp::BooleanOr, token(Token::DoubleVerticalBar))(input)
}

fn expr_multiplicative(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_unary, op_multiplicative)
}

fn expr_additive(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_multiplicative, op_additive)
}

fn expr_shift(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_additive, op_shift)
}

fn expr_relational(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_shift, op_relational)
}

fn expr_equality(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_relational, op_equality)
}

fn expr_bitwise_and(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_equality, op_bitwise_and)
}

fn expr_bitwise_xor(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_bitwise_and, op_bitwise_xor)
}

fn expr_bitwise_or(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_bitwise_xor, op_bitwise_or)
}

fn expr_logical_and(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_bitwise_or, op_logical_and)
}

fn expr_logical_xor(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_logical_and, op_logical_xor)
}

fn expr_logical_or(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    binary_chain(input, expr_logical_xor, op_logical_or)
}

fn expr_conditional(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    let (rest, cond) = expr_logical_or(input)?;
    match token(Token::QuestionMark)(rest) {
        Ok((rest, _)) => {
            let (rest, lhs) = expr(rest)?;
            let (rest, _) = token(Token::Colon)(rest)?;
            let (rest, rhs) = expr_assignment(rest)?;
            let location = cond.location;
            let ternary = Expression::TernaryConditional(Box::new(cond),
                                                         Box::new(lhs),
                                                         Box::new(rhs));
            Ok((rest, Located::new(ternary, location)))
        }
        Err(nom::Err::Error(_)) => Ok((rest, cond)),
        Err(err) => Err(err),
    }
}

fn op_assignment(input: &[LexToken]) -> PResult<'_, AssignOp> {
    alt((value(AssignOp::Assign, token(Token::Equals)),
         value(AssignOp::Add, token(Token::PlusEquals)),
         value(AssignOp::Subtract, token(Token::MinusEquals)),
         value(AssignOp::Multiply, token(Token::AsterixEquals)),
         value(AssignOp::Divide, token(Token::ForwardSlashEquals)),
         value(AssignOp::Modulus, token(Token::PercentEquals)),
         value(AssignOp::LeftShift, token(Token::LeftShiftEquals)),
         value(AssignOp::RightShift, token(Token::RightShiftEquals)),
         value(AssignOp::BitwiseAnd, token(Token::AmpersandEquals)),
         value(AssignOp::BitwiseOr, token(Token::VerticalBarEquals)),
         value(AssignOp::BitwiseXor, token(Token::HatEquals))))(input)
}

fn expr_assignment(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    let (rest, lhs) = expr_conditional(input)?;
    match op_assignment(rest) {
        Ok((rest, op)) => {
            let (rest, rhs) = expr_assignment(rest)?;
            let location = lhs.location;
            let assignment = Expression::Assignment(op, Box::new(lhs), Box::new(rhs));
            Ok((rest, Located::new(assignment, location)))
        }
        Err(nom::Err::Error(_)) => Ok((rest, lhs)),
        Err(err) => Err(err),
    }
}

fn expr(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    let (rest, mut expressions) = separated_list1(token(Token::Comma), expr_assignment)(input)?;
    let expression = if expressions.len() == 1 {
        expressions.remove(0)
    } else {
        let location = expressions[0].location;
        Located::new(Expression::Sequence(expressions), location)
    };
    Ok((rest, expression))
}

fn type_qualifier(input: &[LexToken]) -> PResult<'_, Located<TypeQualifier>> {
    fn keyword<'t>(qualifier: TypeQualifier,
                   tok: Token)
                   -> impl Fn(&'t [LexToken]) -> PResult<'t, Located<TypeQualifier>> {
        move |input: &'t [LexToken]| {
            map(token(tok.clone()), |location| Located::new(qualifier, location))(input)
        }
    }
    alt((keyword(TypeQualifier::Const, Token::Const),
         keyword(TypeQualifier::Attribute, Token::Attribute),
         keyword(TypeQualifier::Varying, Token::Varying),
         keyword(TypeQualifier::Uniform, Token::Uniform),
         map(pair(token(Token::Invariant), token(Token::Varying)),
             |(location, _)| Located::new(TypeQualifier::InvariantVarying, location))))(input)
}

fn declarator(input: &[LexToken]) -> PResult<'_, Declarator> {
    let (rest, name) = identifier(input)?;
    let (rest, array_dim) = opt(array_dim)(rest)?;
    let (rest, initializer) = opt(preceded(token(Token::Equals), expr_assignment))(rest)?;
    Ok((rest, Declarator { name, array_dim, initializer }))
}

/// Parse a full declaration statement including the trailing semicolon
fn declaration(input: &[LexToken]) -> PResult<'_, Declaration> {
    let (rest, qualifier) = opt(type_qualifier)(input)?;
    let (rest, typename) = type_name(rest)?;
    let (rest, declarators) = match typename.specifier.node {
        TypeSpecifier::Struct(_) => separated_list0(token(Token::Comma), declarator)(rest)?,
        TypeSpecifier::Named(_) => separated_list1(token(Token::Comma), declarator)(rest)?,
    };
    let (rest, _) = token(Token::Semicolon)(rest)?;
    Ok((rest, Declaration { qualifier, typename, declarators }))
}

fn precision_declaration(input: &[LexToken]) -> PResult<'_, PrecisionDeclaration> {
    let (rest, _) = token(Token::Precision)(input)?;
    let (rest, precision) = precision(rest)?;
    let (rest, typename) = identifier(rest)?;
    let (rest, _) = token(Token::Semicolon)(rest)?;
    Ok((rest, PrecisionDeclaration { precision, typename }))
}

fn invariant_declaration(input: &[LexToken]) -> PResult<'_, Vec<Located<String>>> {
    delimited(token(Token::Invariant),
              separated_list1(token(Token::Comma), identifier),
              token(Token::Semicolon))(input)
}

fn is_invariant_declaration(input: &[LexToken]) -> bool {
    matches!((input.first(), input.get(1)),
             (Some(&LexToken(Token::Invariant, _)), Some(&LexToken(Token::Id(_), _))))
}

fn init_statement(input: &[LexToken]) -> PResult<'_, InitStatement> {
    if let Ok((rest, _)) = token(Token::Semicolon)(input) {
        return Ok((rest, InitStatement::Empty));
    }
    let err = match declaration(input) {
        Ok((rest, declaration)) => return Ok((rest, InitStatement::Declaration(declaration))),
        Err(err) => err,
    };
    match expression_statement(input) {
        Ok((rest, expression)) => Ok((rest, InitStatement::Expression(expression))),
        Err(e) => Err(get_most_relevant_error(err, e)),
    }
}

fn condition(input: &[LexToken]) -> PResult<'_, Condition> {
    let declared = tuple((type_name, identifier, token(Token::Equals), expr_assignment))(input);
    let err = match declared {
        Ok((rest, (typename, name, _, init))) => {
            return Ok((rest, Condition::Assignment(typename, name, init)))
        }
        Err(err) => err,
    };
    match expr(input) {
        Ok((rest, expression)) => Ok((rest, Condition::Expr(expression))),
        Err(e) => Err(get_most_relevant_error(err, e)),
    }
}

fn expression_statement(input: &[LexToken]) -> PResult<'_, Located<Expression>> {
    let (rest, expression) = expr(input)?;
    let (rest, _) = token(Token::Semicolon)(rest)?;
    Ok((rest, expression))
}

fn boxed_statement(input: &[LexToken]) -> PResult<'_, Box<Located<Statement>>> {
    map(statement, Box::new)(input)
}

fn statement(input: &[LexToken]) -> PResult<'_, Located<Statement>> {
    let (head, tail) = match input.split_first() {
        Some((head, tail)) => (head, tail),
        None => return Err(wrong_token(input)),
    };
    let location = head.1;
    let (rest, statement) = match head.0 {
        Token::Semicolon => (tail, Statement::Empty),
        Token::LeftBrace => map(statement_block, Statement::Block)(input)?,
        Token::If => {
            let (rest, cond) = delimited(token(Token::LeftParen),
                                         expr,
                                         token(Token::RightParen))(tail)?;
            let (rest, inner) = boxed_statement(rest)?;
            let (rest, else_part) = opt(preceded(token(Token::Else), boxed_statement))(rest)?;
            (rest, Statement::If(cond, inner, else_part))
        }
        Token::For => {
            let (rest, _) = token(Token::LeftParen)(tail)?;
            let (rest, init) = init_statement(rest)?;
            let (rest, cond) = opt(condition)(rest)?;
            let (rest, _) = token(Token::Semicolon)(rest)?;
            let (rest, iter) = opt(expr)(rest)?;
            let (rest, _) = token(Token::RightParen)(rest)?;
            let (rest, inner) = boxed_statement(rest)?;
            (rest, Statement::For(init, cond, iter, inner))
        }
        Token::While => {
            let (rest, cond) = delimited(token(Token::LeftParen),
                                         condition,
                                         token(Token::RightParen))(tail)?;
            let (rest, inner) = boxed_statement(rest)?;
            (rest, Statement::While(cond, inner))
        }
        Token::Do => {
            let (rest, inner) = boxed_statement(tail)?;
            let (rest, _) = token(Token::While)(rest)?;
            let (rest, cond) = delimited(token(Token::LeftParen),
                                         expr,
                                         token(Token::RightParen))(rest)?;
            let (rest, _) = token(Token::Semicolon)(rest)?;
            (rest, Statement::DoWhile(inner, cond))
        }
        Token::Break => (token(Token::Semicolon)(tail)?.0, Statement::Break),
        Token::Continue => (token(Token::Semicolon)(tail)?.0, Statement::Continue),
        Token::Discard => (token(Token::Semicolon)(tail)?.0, Statement::Discard),
        Token::Return => {
            let (rest, value) = opt(expr)(tail)?;
            let (rest, _) = token(Token::Semicolon)(rest)?;
            (rest, Statement::Return(value))
        }
        Token::Precision => map(precision_declaration, Statement::Precision)(input)?,
        Token::Invariant if is_invariant_declaration(input) => {
            map(invariant_declaration, Statement::Invariant)(input)?
        }
        _ => {
            // Try parsing a variable definition, then an expression statement
            match declaration(input) {
                Ok((rest, declaration)) => (rest, Statement::Declaration(declaration)),
                Err(err) => {
                    match expression_statement(input) {
                        Ok((rest, expression)) => (rest, Statement::Expression(expression)),
                        Err(e) => return Err(get_most_relevant_error(err, e)),
                    }
                }
            }
        }
    };
    Ok((rest, Located::new(statement, location)))
}

fn statement_block(input: &[LexToken]) -> PResult<'_, Vec<Located<Statement>>> {
    let mut statements = Vec::new();
    let (mut rest, _) = token(Token::LeftBrace)(input)?;
    loop {
        match statement(rest) {
            Ok((remaining, statement)) => {
                statements.push(statement);
                rest = remaining;
            }
            Err(err) => {
                return match token(Token::RightBrace)(rest) {
                    Ok((rest, _)) => Ok((rest, statements)),
                    Err(_) => Err(err),
                };
            }
        }
    }
}

fn function_param(input: &[LexToken]) -> PResult<'_, FunctionParam> {
    let location = first_location(input);
    let (rest, is_const) = map(opt(token(Token::Const)), |c| c.is_some())(input)?;
    let (rest, qualifier) = opt(alt((value(ParamQualifier::In, token(Token::In)),
                                     value(ParamQualifier::Out, token(Token::Out)),
                                     value(ParamQualifier::InOut, token(Token::InOut)))))(rest)?;
    let (rest, typename) = type_name(rest)?;
    let (rest, name) = opt(identifier)(rest)?;
    let (rest, array_dim) = opt(array_dim)(rest)?;
    Ok((rest,
        FunctionParam {
            is_const,
            qualifier,
            typename,
            name,
            array_dim,
            location,
        }))
}

fn is_void_param_list(params: &[FunctionParam]) -> bool {
    match params {
        [FunctionParam { is_const: false, qualifier: None, name: None, array_dim: None, typename, .. }] => {
            typename.precision.is_none() &&
            typename.specifier.node == TypeSpecifier::Named("void".to_string())
        }
        _ => false,
    }
}

fn function_prototype(input: &[LexToken]) -> PResult<'_, FunctionPrototype> {
    let (rest, returntype) = type_name(input)?;
    let (rest, name) = identifier(rest)?;
    let (rest, mut params) = delimited(token(Token::LeftParen),
                                       separated_list0(token(Token::Comma), function_param),
                                       token(Token::RightParen))(rest)?;
    if is_void_param_list(&params) {
        params.clear();
    }
    Ok((rest, FunctionPrototype { returntype, name, params }))
}

fn function(input: &[LexToken]) -> PResult<'_, RootDefinition> {
    let (rest, prototype) = function_prototype(input)?;
    if let Ok((rest, _)) = token(Token::Semicolon)(rest) {
        return Ok((rest, RootDefinition::FunctionPrototype(prototype)));
    }
    let (rest, body) = statement_block(rest)?;
    Ok((rest, RootDefinition::Function(FunctionDefinition { prototype, body })))
}

fn root_definition(input: &[LexToken]) -> PResult<'_, Located<RootDefinition>> {
    let location = first_location(input);
    let (rest, root) = match input.first() {
        Some(&LexToken(Token::Precision, _)) => {
            map(precision_declaration, RootDefinition::Precision)(input)?
        }
        _ if is_invariant_declaration(input) => {
            map(invariant_declaration, RootDefinition::Invariant)(input)?
        }
        _ => {
            let err = match function(input) {
                Ok((rest, function)) => return Ok((rest, Located::new(function, location))),
                Err(err) => err,
            };
            match declaration(input) {
                Ok((rest, declaration)) => (rest, RootDefinition::Declaration(declaration)),
                Err(e) => return Err(get_most_relevant_error(err, e)),
            }
        }
    };
    Ok((rest, Located::new(root, location)))
}

fn module(input: &[LexToken]) -> PResult<'_, Vec<Located<RootDefinition>>> {
    let mut roots = Vec::new();
    let mut rest = input;
    loop {
        match root_definition(rest) {
            Ok((remaining, root)) => {
                roots.push(root);
                rest = remaining;
            }
            Err(err) => {
                return match rest {
                    [LexToken(Token::Eof, _)] => Ok((&rest[1..], roots)),
                    _ => Err(err),
                };
            }
        }
    }
}

/// Reject bracket nesting deeper than the parser is allowed to recurse
fn check_nesting(source: &[LexToken], max_depth: u32) -> Result<(), ParseError> {
    let mut depth = 0u32;
    for tok in source {
        match tok.0 {
            Token::LeftParen | Token::LeftSquareBracket | Token::LeftBrace => {
                depth += 1;
                if depth > max_depth {
                    return Err(ParseError(ParseErrorReason::NestingTooDeep, Some(tok.clone())));
                }
            }
            Token::RightParen | Token::RightSquareBracket | Token::RightBrace => {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }
    Ok(())
}

pub fn parse(source: &[LexToken], max_depth: u32) -> Result<Module, ParseError> {
    check_nesting(source, max_depth)?;
    match module(source) {
        Ok((rest, _)) if !rest.is_empty() => {
            Err(ParseError(ParseErrorReason::FailedToParse, Some(rest[0].clone())))
        }
        Ok((_, root_definitions)) => Ok(Module { root_definitions }),
        Err(nom::Err::Error(ParseErrorContext(rest, reason))) |
        Err(nom::Err::Failure(ParseErrorContext(rest, reason))) => {
            match rest.first() {
                Some(tok) => Err(ParseError(reason, Some(tok.clone()))),
                None => Err(ParseError(ParseErrorReason::UnexpectedEndOfStream, None)),
            }
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(ParseError(ParseErrorReason::UnexpectedEndOfStream, None))
        }
    }
}

#[cfg(test)]
fn exp_var(var_name: &'static str, line: u64, column: u64) -> Located<Expression> {
    Located::loc(line, column, Expression::Variable(var_name.to_string()))
}

#[cfg(test)]
fn bexp_var(var_name: &'static str, line: u64, column: u64) -> Box<Located<Expression>> {
    Box::new(exp_var(var_name, line, column))
}

#[cfg(test)]
fn parse_from_str<T>(parse_func: for<'t> fn(&'t [LexToken]) -> PResult<'t, T>,
                     string: &str)
                     -> Result<T, ParseErrorReason> {
    use glt_transform_preprocess::preprocess_single;
    use glt_transform_lexer::lex;
    let modified_string = string.to_string() + "\n";
    let preprocessed_text = preprocess_single(&modified_string).expect("preprocess failed");
    let tokens = lex(&preprocessed_text).expect("lex failed");
    match parse_func(&tokens.stream) {
        Ok(([LexToken(Token::Eof, _)], result)) => Ok(result),
        Ok(_) => Err(ParseErrorReason::FailedToParse),
        Err(nom::Err::Error(ParseErrorContext(_, reason))) |
        Err(nom::Err::Failure(ParseErrorContext(_, reason))) => Err(reason),
        Err(nom::Err::Incomplete(_)) => Err(ParseErrorReason::UnexpectedEndOfStream),
    }
}

#[test]
fn test_expr() {
    let loc = |column| FileLocation(File::Unknown, Line(1), Column(column));
    assert_eq!(expr(&[LexToken(Token::Id(Identifier("a".to_string())), loc(1)),
                      LexToken(Token::Asterix, loc(2)),
                      LexToken(Token::Id(Identifier("b".to_string())), loc(3)),
                      LexToken(Token::Eof, loc(4))][..]),
               Ok((&[LexToken(Token::Eof, loc(4))][..],
                   Located::loc(1,
                                1,
                                Expression::BinaryOperation(BinOp::Multiply,
                                                            bexp_var("a", 1, 1),
                                                            bexp_var("b", 1, 3))))));

    let expr_str = |s| parse_from_str(expr, s).unwrap();

    assert_eq!(expr_str("a"), exp_var("a", 1, 1));
    assert_eq!(expr_str("4"), Located::loc(1, 1, Expression::Literal(Literal::Int(4))));
    assert_eq!(expr_str("true"), Located::loc(1, 1, Expression::Literal(Literal::Bool(true))));
    assert_eq!(expr_str("a+b*c"),
               Located::loc(1,
                            1,
                            Expression::BinaryOperation(BinOp::Add,
                                                        bexp_var("a", 1, 1),
                                                        Box::new(Located::loc(1, 3,
                                                            Expression::BinaryOperation(BinOp::Multiply,
                                                                                        bexp_var("b", 1, 3),
                                                                                        bexp_var("c", 1, 5)))))));
    assert_eq!(expr_str("a-b-c"),
               Located::loc(1,
                            1,
                            Expression::BinaryOperation(BinOp::Subtract,
                                                        Box::new(Located::loc(1, 1,
                                                            Expression::BinaryOperation(BinOp::Subtract,
                                                                                        bexp_var("a", 1, 1),
                                                                                        bexp_var("b", 1, 3)))),
                                                        bexp_var("c", 1, 5))));
    assert_eq!(expr_str("-a++"),
               Located::loc(1,
                            1,
                            Expression::UnaryOperation(UnaryOp::Minus,
                                                       Box::new(Located::loc(1, 2,
                                                           Expression::UnaryOperation(UnaryOp::PostfixIncrement,
                                                                                      bexp_var("a", 1, 2)))))));
    assert_eq!(expr_str("a.xy[1]"),
               Located::loc(1,
                            1,
                            Expression::ArraySubscript(Box::new(Located::loc(1, 1,
                                                           Expression::Member(bexp_var("a", 1, 1),
                                                                              Located::loc(1, 3, "xy".to_string())))),
                                                       Box::new(Located::loc(1, 6, Expression::Literal(Literal::Int(1)))))));
    assert_eq!(expr_str("vec2(a, 1.0)"),
               Located::loc(1,
                            1,
                            Expression::Call(Located::loc(1, 1, "vec2".to_string()),
                                             vec![exp_var("a", 1, 6),
                                                  Located::loc(1, 9, Expression::Literal(Literal::Float(1.0)))])));
    assert_eq!(expr_str("f(void)"),
               Located::loc(1, 1, Expression::Call(Located::loc(1, 1, "f".to_string()), vec![])));
    assert_eq!(expr_str("a = b = c"),
               Located::loc(1,
                            1,
                            Expression::Assignment(AssignOp::Assign,
                                                   bexp_var("a", 1, 1),
                                                   Box::new(Located::loc(1, 5,
                                                       Expression::Assignment(AssignOp::Assign,
                                                                              bexp_var("b", 1, 5),
                                                                              bexp_var("c", 1, 9)))))));
    assert_eq!(expr_str("a += 1.0, a"),
               Located::loc(1,
                            1,
                            Expression::Sequence(vec![
                                Located::loc(1, 1, Expression::Assignment(AssignOp::Add,
                                                                          bexp_var("a", 1, 1),
                                                                          Box::new(Located::loc(1, 6, Expression::Literal(Literal::Float(1.0)))))),
                                exp_var("a", 1, 11)])));
    assert_eq!(expr_str("a ? b : c"),
               Located::loc(1,
                            1,
                            Expression::TernaryConditional(bexp_var("a", 1, 1),
                                                           bexp_var("b", 1, 5),
                                                           bexp_var("c", 1, 9))));
    assert_eq!(expr_str("a && b ^^ c || d"),
               Located::loc(1,
                            1,
                            Expression::BinaryOperation(BinOp::BooleanOr,
                                Box::new(Located::loc(1, 1, Expression::BinaryOperation(BinOp::BooleanXor,
                                    Box::new(Located::loc(1, 1, Expression::BinaryOperation(BinOp::BooleanAnd,
                                                                                            bexp_var("a", 1, 1),
                                                                                            bexp_var("b", 1, 6)))),
                                    bexp_var("c", 1, 11)))),
                                bexp_var("d", 1, 16))));

    assert!(parse_from_str(expr, "a +").is_err());
    assert!(parse_from_str(expr, "(a").is_err());
}

#[test]
fn test_statement() {
    let statement_str = |s| parse_from_str(statement, s).unwrap().node;

    assert_eq!(statement_str(";"), Statement::Empty);
    assert_eq!(statement_str("break;"), Statement::Break);
    assert_eq!(statement_str("return;"), Statement::Return(None));
    assert_eq!(statement_str("a;"), Statement::Expression(exp_var("a", 1, 1)));
    assert_eq!(statement_str("float x;"),
               Statement::Declaration(Declaration {
                   qualifier: None,
                   typename: TypeName::named("float", FileLocation(File::Unknown, Line(1), Column(1))),
                   declarators: vec![Declarator {
                                         name: Located::loc(1, 7, "x".to_string()),
                                         array_dim: None,
                                         initializer: None,
                                     }],
               }));
    assert_eq!(statement_str("const int x[2], y = 1;"),
               Statement::Declaration(Declaration {
                   qualifier: Some(Located::loc(1, 1, TypeQualifier::Const)),
                   typename: TypeName::named("int", FileLocation(File::Unknown, Line(1), Column(7))),
                   declarators: vec![Declarator {
                                         name: Located::loc(1, 11, "x".to_string()),
                                         array_dim: Some(Located::loc(1, 13, Expression::Literal(Literal::Int(2)))),
                                         initializer: None,
                                     },
                                     Declarator {
                                         name: Located::loc(1, 17, "y".to_string()),
                                         array_dim: None,
                                         initializer: Some(Located::loc(1, 21, Expression::Literal(Literal::Int(1)))),
                                     }],
               }));
    assert_eq!(statement_str("if (a) b; else c;"),
               Statement::If(exp_var("a", 1, 5),
                             Box::new(Located::loc(1, 8, Statement::Expression(exp_var("b", 1, 8)))),
                             Some(Box::new(Located::loc(1, 16, Statement::Expression(exp_var("c", 1, 16)))))));
    assert_eq!(statement_str("{ a; }"),
               Statement::Block(vec![Located::loc(1, 3, Statement::Expression(exp_var("a", 1, 3)))]));
    assert_eq!(statement_str("do a; while (b);"),
               Statement::DoWhile(Box::new(Located::loc(1, 4, Statement::Expression(exp_var("a", 1, 4)))),
                                  exp_var("b", 1, 14)));
    assert_eq!(statement_str("precision mediump float;"),
               Statement::Precision(PrecisionDeclaration {
                   precision: Precision::Medium,
                   typename: Located::loc(1, 19, "float".to_string()),
               }));

    match statement_str("for (int i = 0; i < 4; i++) {}") {
        Statement::For(InitStatement::Declaration(_), Some(Condition::Expr(_)), Some(_), body) => {
            assert_eq!(body.node, Statement::Block(vec![]));
        }
        other => panic!("unexpected for loop parse: {:?}", other),
    }
    match statement_str("while (bool b = c) {}") {
        Statement::While(Condition::Assignment(_, name, _), _) => assert_eq!(name.node, "b"),
        other => panic!("unexpected while loop parse: {:?}", other),
    }

    assert!(parse_from_str(statement, "if a; ").is_err());
    assert!(parse_from_str(statement, "{ a; ").is_err());
}

#[test]
fn test_rootdefinition() {
    let root_str = |s| parse_from_str(root_definition, s).unwrap().node;

    let test_struct_ast = StructDefinition {
        name: Some(Located::loc(1, 8, "S".to_string())),
        members: vec![StructMember {
                          typename: TypeName::named("int", FileLocation(File::Unknown, Line(1), Column(12))),
                          declarators: vec![StructMemberDeclarator {
                                                name: Located::loc(1, 16, "a".to_string()),
                                                array_dim: None,
                                            }],
                      }],
    };
    assert_eq!(root_str("struct S { int a; };"),
               RootDefinition::Declaration(Declaration {
                   qualifier: None,
                   typename: TypeName {
                       precision: None,
                       specifier: Located::loc(1, 1, TypeSpecifier::Struct(test_struct_ast)),
                   },
                   declarators: vec![],
               }));

    let test_func_proto = FunctionPrototype {
        returntype: TypeName::named("void", FileLocation(File::Unknown, Line(1), Column(1))),
        name: Located::loc(1, 6, "func".to_string()),
        params: vec![FunctionParam {
                         is_const: false,
                         qualifier: Some(ParamQualifier::Out),
                         typename: TypeName::named("float", FileLocation(File::Unknown, Line(1), Column(15))),
                         name: Some(Located::loc(1, 21, "x".to_string())),
                         array_dim: None,
                         location: FileLocation(File::Unknown, Line(1), Column(11)),
                     }],
    };
    assert_eq!(root_str("void func(out float x) { }"),
               RootDefinition::Function(FunctionDefinition {
                   prototype: test_func_proto.clone(),
                   body: vec![],
               }));
    assert_eq!(root_str("void func(out float x);"),
               RootDefinition::FunctionPrototype(test_func_proto));

    match root_str("void main(void) {}") {
        RootDefinition::Function(ref def) => assert!(def.prototype.params.is_empty()),
        ref other => panic!("unexpected root: {:?}", other),
    }
    assert_eq!(root_str("invariant a, b;"),
               RootDefinition::Invariant(vec![Located::loc(1, 11, "a".to_string()),
                                              Located::loc(1, 14, "b".to_string())]));
    match root_str("invariant varying vec4 v;") {
        RootDefinition::Declaration(ref decl) => {
            assert_eq!(decl.qualifier, Some(Located::loc(1, 1, TypeQualifier::InvariantVarying)));
        }
        ref other => panic!("unexpected root: {:?}", other),
    }
    match root_str("uniform highp vec4 u[3];") {
        RootDefinition::Declaration(ref decl) => {
            assert_eq!(decl.typename.precision, Some(Precision::High));
            assert_eq!(decl.declarators.len(), 1);
        }
        ref other => panic!("unexpected root: {:?}", other),
    }
}

#[test]
fn test_parse_errors() {
    use glt_transform_preprocess::preprocess_single;
    use glt_transform_lexer::lex;

    let run = |s: &str| {
        let preprocessed_text = preprocess_single(s).expect("preprocess failed");
        let tokens = lex(&preprocessed_text).expect("lex failed");
        parse(&tokens.stream, 256)
    };

    assert!(run("void main() {}").is_ok());
    let err = run("void main() {\nfloat x = ;\n}").unwrap_err();
    assert_eq!(err.get_code(), ErrorCode::SyntaxError);
    assert_eq!(err.get_location().line(), 2);

    let deep = format!("void main() {{ float x = {}1.0{}; }}", "(".repeat(300), ")".repeat(300));
    assert_eq!(run(&deep).unwrap_err().get_code(), ErrorCode::ShaderComplexity);
}
