use std::fmt;
use glt_lang_hst::*;

/// The final HLSL source text
#[derive(PartialEq, Debug, Clone)]
pub struct HlslSource {
    source: String,
}

impl HlslSource {
    pub fn from_hst(module: &Module) -> HlslSource {
        let printer = print(module);
        HlslSource { source: printer.buffer }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn into_string(self) -> String {
        self.source
    }
}

impl fmt::Display for HlslSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

struct Printer {
    buffer: String,
}

impl Printer {
    fn new() -> Printer {
        Printer { buffer: String::new() }
    }

    fn print(&mut self, string: &str) {
        self.buffer.push_str(string);
    }

    fn space(&mut self) {
        self.buffer.push(' ');
    }

    fn line(&mut self) {
        self.buffer.push('\n');
    }

    fn separated<T, F>(&mut self, items: &[T], mut f: F)
        where F: FnMut(&T, &mut Printer)
    {
        for (index, item) in items.iter().enumerate() {
            if index != 0 {
                self.print(",");
            }
            f(item, self);
        }
    }
}

// Precedence levels. Unary, binary and ternary operations always bracket
// themselves so only these forms need tracking.
const PREC_POSTFIX: u32 = 1;
const PREC_CAST: u32 = 2;
const PREC_OPERAND: u32 = 14;
const PREC_ASSIGNMENT: u32 = 15;
const PREC_SEQUENCE: u32 = 16;
const PREC_TOP: u32 = 17;

fn print_scalar(scalar: &ScalarType, printer: &mut Printer) {
    printer.print(match *scalar {
        ScalarType::Bool => "bool",
        ScalarType::Int => "int",
        ScalarType::Float => "float",
    });
}

fn print_typename(typename: &Type, printer: &mut Printer) {
    match *typename {
        Type::Void => printer.print("void"),
        Type::Scalar(ref scalar) => print_scalar(scalar, printer),
        Type::Vector(ref scalar, dim) => {
            print_scalar(scalar, printer);
            printer.print(&dim.to_string());
        }
        Type::Matrix(dim) => printer.print(&format!("float{}x{}", dim, dim)),
        Type::Struct(ref name) => printer.print(name),
        Type::Array(ref inner, size) => {
            print_typename(inner, printer);
            printer.print(&format!("[{}]", size));
        }
        Type::Texture2D => printer.print("Texture2D"),
        Type::TextureCube => printer.print("TextureCube"),
        Type::SamplerState => printer.print("SamplerState"),
    }
}

/// Print a type and a name, moving array dimensions after the name
fn print_declaration(typename: &Type, name: &str, printer: &mut Printer) {
    let (inner, dim) = typename.split_array();
    print_typename(inner, printer);
    printer.space();
    printer.print(name);
    if let Some(dim) = dim {
        printer.print(&format!("[{}]", dim));
    }
}

/// Floats print in exponent form with a three digit exponent
fn format_float(value: f32) -> String {
    let formatted = format!("{:.6e}", value);
    match formatted.find('e') {
        Some(split) => {
            let (mantissa, exponent) = formatted.split_at(split);
            let exponent = exponent[1..].parse::<i32>().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:03}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}

fn print_literal(lit: &Literal, printer: &mut Printer) {
    let text = match *lit {
        Literal::Bool(b) => b.to_string(),
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => format_float(f),
    };
    if text.starts_with('-') {
        printer.print("(");
        printer.print(&text);
        printer.print(")");
    } else {
        printer.print(&text);
    }
}

fn binop_symbol(binop: &BinOp) -> &'static str {
    match *binop {
        BinOp::Add => "+",
        BinOp::Subtract => "-",
        BinOp::Multiply => "*",
        BinOp::Divide => "/",
        BinOp::LessThan => "<",
        BinOp::LessEqual => "<=",
        BinOp::GreaterThan => ">",
        BinOp::GreaterEqual => ">=",
        BinOp::Equality => "==",
        BinOp::Inequality => "!=",
        BinOp::LogicalAnd => "&&",
        BinOp::LogicalOr => "||",
        BinOp::Assignment => "=",
        BinOp::SumAssignment => "+=",
        BinOp::DifferenceAssignment => "-=",
        BinOp::ProductAssignment => "*=",
        BinOp::QuotientAssignment => "/=",
    }
}

fn print_binaryoperation(binop: &BinOp,
                         lhs: &Expression,
                         rhs: &Expression,
                         last_precedence: u32,
                         printer: &mut Printer) {
    if binop.is_assignment() {
        let bracket = last_precedence < PREC_ASSIGNMENT;
        if bracket {
            printer.print("(");
        }
        print_expression_inner(lhs, PREC_POSTFIX, printer);
        printer.print(binop_symbol(binop));
        print_expression_inner(rhs, PREC_ASSIGNMENT, printer);
        if bracket {
            printer.print(")");
        }
    } else {
        printer.print("(");
        print_expression_inner(lhs, PREC_OPERAND, printer);
        printer.print(binop_symbol(binop));
        print_expression_inner(rhs, PREC_OPERAND, printer);
        printer.print(")");
    }
}

fn print_unaryoperation(unaryop: &UnaryOp, expr: &Expression, printer: &mut Printer) {
    let (prefix, postfix) = match *unaryop {
        UnaryOp::PrefixIncrement => ("++", ""),
        UnaryOp::PrefixDecrement => ("--", ""),
        UnaryOp::PostfixIncrement => ("", "++"),
        UnaryOp::PostfixDecrement => ("", "--"),
        UnaryOp::Plus => ("+", ""),
        UnaryOp::Minus => ("-", ""),
        UnaryOp::LogicalNot => ("!", ""),
    };
    printer.print("(");
    printer.print(prefix);
    print_expression_inner(expr, PREC_POSTFIX, printer);
    printer.print(postfix);
    printer.print(")");
}

fn print_arguments(args: &[Expression], printer: &mut Printer) {
    printer.print("(");
    printer.separated(args, |arg, printer| print_expression_inner(arg, PREC_ASSIGNMENT, printer));
    printer.print(")");
}

fn print_swizzle_slot(slot: &SwizzleSlot, printer: &mut Printer) {
    printer.print(match *slot {
        SwizzleSlot::X => "x",
        SwizzleSlot::Y => "y",
        SwizzleSlot::Z => "z",
        SwizzleSlot::W => "w",
    });
}

fn print_expression_inner(expression: &Expression, last_precedence: u32, printer: &mut Printer) {
    match *expression {
        Expression::Literal(ref lit) => print_literal(lit, printer),
        Expression::Variable(ref name) => printer.print(name),
        Expression::UnaryOperation(ref unaryop, ref expr) => {
            print_unaryoperation(unaryop, expr, printer)
        }
        Expression::BinaryOperation(ref binop, ref lhs, ref rhs) => {
            print_binaryoperation(binop, lhs, rhs, last_precedence, printer)
        }
        Expression::TernaryConditional(ref cond, ref lhs, ref rhs) => {
            printer.print("(");
            print_expression_inner(cond, PREC_OPERAND, printer);
            printer.print("?");
            print_expression_inner(lhs, PREC_OPERAND, printer);
            printer.print(":");
            print_expression_inner(rhs, PREC_OPERAND, printer);
            printer.print(")");
        }
        Expression::Sequence(ref exprs) => {
            let bracket = last_precedence < PREC_SEQUENCE;
            if bracket {
                printer.print("(");
            }
            printer.separated(exprs,
                              |expr, printer| print_expression_inner(expr, PREC_ASSIGNMENT, printer));
            if bracket {
                printer.print(")");
            }
        }
        Expression::Swizzle(ref vec, ref slots) => {
            print_expression_inner(vec, PREC_POSTFIX, printer);
            printer.print(".");
            for slot in slots {
                print_swizzle_slot(slot, printer);
            }
        }
        Expression::ArraySubscript(ref array, ref sub) => {
            print_expression_inner(array, PREC_POSTFIX, printer);
            printer.print("[");
            print_expression_inner(sub, PREC_TOP, printer);
            printer.print("]");
        }
        Expression::Member(ref composite, ref name) => {
            print_expression_inner(composite, PREC_POSTFIX, printer);
            printer.print(".");
            printer.print(name);
        }
        Expression::Call(ref name, ref args) => {
            printer.print(name);
            print_arguments(args, printer);
        }
        Expression::MethodCall(ref object, ref name, ref args) => {
            print_expression_inner(object, PREC_POSTFIX, printer);
            printer.print(".");
            printer.print(name);
            print_arguments(args, printer);
        }
        Expression::NumericConstructor(ref ty, ref args) => {
            print_typename(ty, printer);
            print_arguments(args, printer);
        }
        Expression::Cast(ref ty, ref expr) => {
            let bracket = last_precedence < PREC_CAST;
            if bracket {
                printer.print("(");
            }
            printer.print("(");
            print_typename(ty, printer);
            printer.print(")");
            print_expression_inner(expr, PREC_CAST, printer);
            if bracket {
                printer.print(")");
            }
        }
    }
}

/// Print a single expression as it would appear in a statement
pub fn print_expression(expression: &Expression) -> String {
    let mut printer = Printer::new();
    print_expression_inner(expression, PREC_TOP, &mut printer);
    printer.buffer
}

fn print_initializer(init: &Initializer, printer: &mut Printer) {
    match *init {
        Initializer::Expression(ref expr) => print_expression_inner(expr, PREC_ASSIGNMENT, printer),
        Initializer::Aggregate(ref inits) => {
            printer.print("{");
            printer.separated(inits, |init, printer| print_initializer(init, printer));
            printer.print("}");
        }
    }
}

fn print_vardef(vardef: &VarDef, printer: &mut Printer) {
    print_typename(&vardef.typename, printer);
    printer.space();
    printer.separated(&vardef.declarators, |declarator, printer| {
        printer.print(&declarator.name);
        if let Some(dim) = declarator.array_dim {
            printer.print(&format!("[{}]", dim));
        }
        if let Some(ref init) = declarator.init {
            printer.print("=");
            print_initializer(init, printer);
        }
    });
}

fn print_block(statements: &[Statement], printer: &mut Printer) {
    printer.print("{");
    printer.line();
    print_statements(statements, printer);
    printer.print("}");
    printer.line();
}

/// Bodies of control flow print as blocks
fn print_body(statement: &Statement, printer: &mut Printer) {
    match *statement {
        Statement::Block(ref statements) => print_block(statements, printer),
        ref other => print_block(std::slice::from_ref(other), printer),
    }
}

fn print_condition(keyword: &str, cond: &Expression, printer: &mut Printer) {
    printer.print(keyword);
    printer.space();
    printer.print("(");
    print_expression_inner(cond, PREC_TOP, printer);
    printer.print(")");
}

fn print_statement(statement: &Statement, printer: &mut Printer) {
    match *statement {
        Statement::Expression(ref expr) => {
            print_expression_inner(expr, PREC_TOP, printer);
            printer.print(";");
            printer.line();
        }
        Statement::Var(ref vd) => {
            print_vardef(vd, printer);
            printer.print(";");
            printer.line();
        }
        Statement::Block(ref statements) => print_block(statements, printer),
        Statement::If(ref cond, ref body) => {
            print_condition("if", cond, printer);
            printer.line();
            print_body(body, printer);
        }
        Statement::IfElse(ref cond, ref then_body, ref else_body) => {
            print_condition("if", cond, printer);
            printer.line();
            print_body(then_body, printer);
            printer.print("else");
            printer.line();
            print_body(else_body, printer);
        }
        Statement::For(ref attribute, ref init, ref cond, ref iter, ref body) => {
            printer.print(match *attribute {
                LoopAttribute::Unroll => "[unroll]",
                LoopAttribute::Loop => "[loop]",
            });
            printer.line();
            printer.print("for (");
            print_vardef(init, printer);
            printer.print(";");
            print_expression_inner(cond, PREC_TOP, printer);
            printer.print(";");
            print_expression_inner(iter, PREC_TOP, printer);
            printer.print(")");
            printer.line();
            print_body(body, printer);
        }
        Statement::While(ref cond, ref body) => {
            print_condition("while", cond, printer);
            printer.line();
            print_body(body, printer);
        }
        Statement::DoWhile(ref body, ref cond) => {
            printer.print("do");
            printer.line();
            print_body(body, printer);
            print_condition("while", cond, printer);
            printer.print(";");
            printer.line();
        }
        Statement::Break => {
            printer.print("break;");
            printer.line();
        }
        Statement::Continue => {
            printer.print("continue;");
            printer.line();
        }
        Statement::Discard => {
            printer.print("discard;");
            printer.line();
        }
        Statement::Return(ref expr) => {
            printer.print("return");
            if let Some(ref expr) = *expr {
                printer.space();
                print_expression_inner(expr, PREC_TOP, printer);
            }
            printer.print(";");
            printer.line();
        }
    }
}

fn print_statements(statements: &[Statement], printer: &mut Printer) {
    for statement in statements {
        print_statement(statement, printer);
    }
}

fn print_register(register: &Register, printer: &mut Printer) {
    printer.print(&match *register {
        Register::Constant(slot) => format!(" : register(c{})", slot),
        Register::Texture(slot) => format!(" : register(t{})", slot),
        Register::Sampler(slot) => format!(" : register(s{})", slot),
    });
}

fn print_rootdefinition_globalvariable(global: &GlobalVariable, printer: &mut Printer) {
    match global.storage {
        GlobalStorage::Static => printer.print("static "),
        GlobalStorage::StaticConst => printer.print("static const "),
        GlobalStorage::Uniform => {
            printer.print("uniform ");
            if global.typename.is_matrix() {
                printer.print("row_major ");
            }
        }
        GlobalStorage::Resource => {}
    }
    print_declaration(&global.typename, &global.name, printer);
    if let Some(ref register) = global.register {
        print_register(register, printer);
    }
    if let Some(ref init) = global.init {
        printer.print("=");
        print_initializer(init, printer);
    }
    printer.print(";");
    printer.line();
}

fn print_rootdefinition_struct(sd: &StructDefinition, printer: &mut Printer) {
    printer.print("struct ");
    printer.print(&sd.name);
    printer.line();
    printer.print("{");
    printer.line();
    for member in &sd.members {
        if member.typename.is_matrix() {
            printer.print("row_major ");
        }
        print_declaration(&member.typename, &member.name, printer);
        if let Some(ref semantic) = member.semantic {
            printer.print(" : ");
            printer.print(semantic);
        }
        printer.print(";");
        printer.line();
    }
    printer.print("};");
    printer.line();
}

fn print_signature(returntype: &Type, name: &str, params: &[FunctionParam], printer: &mut Printer) {
    print_typename(returntype, printer);
    printer.space();
    printer.print(name);
    printer.print("(");
    printer.separated(params, |param, printer| {
        match param.modifier {
            InputModifier::In => {}
            InputModifier::Out => printer.print("out "),
            InputModifier::InOut => printer.print("inout "),
        }
        print_declaration(&param.typename, &param.name, printer);
    });
    printer.print(")");
}

fn print_rootdefinition_function(function: &FunctionDefinition, printer: &mut Printer) {
    print_signature(&function.returntype, &function.name, &function.params, printer);
    printer.line();
    print_block(&function.body, printer);
}

fn print_rootdefinition(rootdef: &RootDefinition, printer: &mut Printer) {
    match *rootdef {
        RootDefinition::Struct(ref sd) => print_rootdefinition_struct(sd, printer),
        RootDefinition::GlobalVariable(ref gv) => print_rootdefinition_globalvariable(gv, printer),
        RootDefinition::FunctionDeclaration(ref decl) => {
            print_signature(&decl.returntype, &decl.name, &decl.params, printer);
            printer.print(";");
            printer.line();
        }
        RootDefinition::Function(ref fd) => print_rootdefinition_function(fd, printer),
    }
}

fn print(module: &Module) -> Printer {
    let mut printer = Printer::new();
    for rootdef in &module.root_definitions {
        print_rootdefinition(rootdef, &mut printer);
    }
    printer
}

#[test]
fn test_float_format() {
    assert_eq!(format_float(1.0), "1.000000e+000");
    assert_eq!(format_float(0.5), "5.000000e-001");
    assert_eq!(format_float(0.0), "0.000000e+000");
    assert_eq!(format_float(-2.5), "-2.500000e+000");
    assert_eq!(format_float(12345.0), "1.234500e+004");
}

#[test]
fn test_print_expression() {
    let a = Expression::var("a");
    let b = Expression::var("b");
    let sum = Expression::binary(BinOp::Add, a.clone(), Expression::Literal(Literal::Float(1.0)));
    assert_eq!(print_expression(&Expression::assign(a.clone(), sum.clone())),
               "a=(a+1.000000e+000)");

    let sequence = Expression::Sequence(vec![Expression::assign(a.clone(), b.clone()),
                                             Expression::binary(BinOp::SumAssignment,
                                                                a.clone(),
                                                                b.clone())]);
    assert_eq!(print_expression(&sequence), "a=b,a+=b");
    assert_eq!(print_expression(&Expression::call("f", vec![sequence])), "f((a=b,a+=b))");

    let cast = Expression::Cast(Type::floatn(3), Box::new(a.clone()));
    assert_eq!(print_expression(&cast), "(float3)a");
    assert_eq!(print_expression(&Expression::Swizzle(Box::new(cast), vec![SwizzleSlot::X])),
               "((float3)a).x");
    assert_eq!(print_expression(&Expression::UnaryOperation(UnaryOp::Minus,
                                                            Box::new(Expression::Literal(Literal::Int(-3))))),
               "(-(-3))");
    let nested = Expression::binary(BinOp::Add, a.clone(), Expression::assign(b, a));
    assert_eq!(print_expression(&nested), "(a+(b=a))");
}

#[test]
fn test_print_function() {
    let module = Module {
        root_definitions: vec![RootDefinition::Function(FunctionDefinition {
                                   name: "fn_0_0".to_string(),
                                   returntype: Type::Void,
                                   params: vec![],
                                   body: vec![Statement::Var(VarDef::single("var_1_1".to_string(),
                                                                            Type::Scalar(ScalarType::Int),
                                                                            Some(Initializer::Expression(Expression::Literal(Literal::Int(0))))))],
                               })],
    };
    assert_eq!(HlslSource::from_hst(&module).to_string(),
               "void fn_0_0()\n{\nint var_1_1=0;\n}\n");
}

#[test]
fn test_print_globals() {
    let module = Module {
        root_definitions: vec![RootDefinition::GlobalVariable(GlobalVariable {
                                   name: "var_0_0".to_string(),
                                   typename: Type::Array(Box::new(Type::Matrix(4)), 2),
                                   storage: GlobalStorage::Uniform,
                                   register: Some(Register::Constant(4)),
                                   init: None,
                               }),
                               RootDefinition::GlobalVariable(GlobalVariable {
                                   name: "var_0_1".to_string(),
                                   typename: Type::Array(Box::new(Type::float()), 2),
                                   storage: GlobalStorage::Static,
                                   register: None,
                                   init: Some(Initializer::Aggregate(vec![
                                       Initializer::Expression(Expression::Literal(Literal::Float(0.0))),
                                       Initializer::Expression(Expression::Literal(Literal::Float(0.0))),
                                   ])),
                               }),
                               RootDefinition::GlobalVariable(GlobalVariable {
                                   name: "tex_var_0_2".to_string(),
                                   typename: Type::Texture2D,
                                   storage: GlobalStorage::Resource,
                                   register: Some(Register::Texture(0)),
                                   init: None,
                               })],
    };
    assert_eq!(HlslSource::from_hst(&module).to_string(),
               "uniform row_major float4x4 var_0_0[2] : register(c4);\n\
                static float var_0_1[2]={0.000000e+000,0.000000e+000};\n\
                Texture2D tex_var_0_2 : register(t0);\n");
}

#[test]
fn test_print_control_flow() {
    let cond = Expression::binary(BinOp::LessThan, Expression::var("i"), Expression::Literal(Literal::Int(4)));
    let init = VarDef::single("i".to_string(),
                              Type::Scalar(ScalarType::Int),
                              Some(Initializer::Expression(Expression::Literal(Literal::Int(0)))));
    let iter = Expression::UnaryOperation(UnaryOp::PostfixIncrement, Box::new(Expression::var("i")));
    let mut printer = Printer::new();
    print_statement(&Statement::For(LoopAttribute::Unroll, init, cond.clone(), iter, Box::new(Statement::Break)),
                    &mut printer);
    print_statement(&Statement::IfElse(cond,
                                       Box::new(Statement::Block(vec![Statement::Discard])),
                                       Box::new(Statement::Return(None))),
                    &mut printer);
    assert_eq!(printer.buffer,
               "[unroll]\nfor (int i=0;(i<4);(i++))\n{\nbreak;\n}\n\
                if ((i<4))\n{\ndiscard;\n}\nelse\n{\nreturn;\n}\n");
}
