use std::fmt;
use glt_shared::*;

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Identifier(pub String);

#[derive(PartialEq, Debug, Clone)]
pub enum Token {
    Eof, // Marks the end of a stream

    Id(Identifier),
    Reserved(Identifier), // Keyword reserved for future use, never a valid name
    LiteralInt(u64), // GLSL ints have no sign, the - is an operator on the literal
    LiteralFloat(f32),
    True,
    False,

    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftSquareBracket,
    RightSquareBracket,
    LeftAngleBracket,
    RightAngleBracket,
    LessEqual,
    GreaterEqual,
    Semicolon,
    Comma,
    QuestionMark,
    Colon,
    Period,

    Plus,
    Minus,
    ForwardSlash,
    Percent,
    Asterix,
    VerticalBar,
    Ampersand,
    Hat,
    Tilde,
    ExclamationPoint,
    Equals,
    DoubleEquals,
    ExclamationEquals,
    DoubleAmpersand,
    DoubleVerticalBar,
    DoubleHat,
    Increment,
    Decrement,
    LeftShift,
    RightShift,

    PlusEquals,
    MinusEquals,
    AsterixEquals,
    ForwardSlashEquals,
    PercentEquals,
    LeftShiftEquals,
    RightShiftEquals,
    AmpersandEquals,
    HatEquals,
    VerticalBarEquals,

    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Return,
    Discard,

    Struct,
    Const,
    Attribute,
    Uniform,
    Varying,
    Invariant,
    In,
    Out,
    InOut,

    Precision,
    LowP,
    MediumP,
    HighP,
}

impl Token {
    /// Words the lexer turns into keyword tokens
    pub fn from_keyword(word: &str) -> Option<Token> {
        Some(match word {
            "true" => Token::True,
            "false" => Token::False,
            "if" => Token::If,
            "else" => Token::Else,
            "for" => Token::For,
            "while" => Token::While,
            "do" => Token::Do,
            "break" => Token::Break,
            "continue" => Token::Continue,
            "return" => Token::Return,
            "discard" => Token::Discard,
            "struct" => Token::Struct,
            "const" => Token::Const,
            "attribute" => Token::Attribute,
            "uniform" => Token::Uniform,
            "varying" => Token::Varying,
            "invariant" => Token::Invariant,
            "in" => Token::In,
            "out" => Token::Out,
            "inout" => Token::InOut,
            "precision" => Token::Precision,
            "lowp" => Token::LowP,
            "mediump" => Token::MediumP,
            "highp" => Token::HighP,
            _ => return None,
        })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match *self {
            Token::Eof => "end of file",
            Token::Id(Identifier(ref name)) | Token::Reserved(Identifier(ref name)) => {
                return write!(f, "{}", name)
            }
            Token::LiteralInt(i) => return write!(f, "{}", i),
            Token::LiteralFloat(v) => return write!(f, "{:?}", v),
            Token::True => "true",
            Token::False => "false",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftSquareBracket => "[",
            Token::RightSquareBracket => "]",
            Token::LeftAngleBracket => "<",
            Token::RightAngleBracket => ">",
            Token::LessEqual => "<=",
            Token::GreaterEqual => ">=",
            Token::Semicolon => ";",
            Token::Comma => ",",
            Token::QuestionMark => "?",
            Token::Colon => ":",
            Token::Period => ".",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::ForwardSlash => "/",
            Token::Percent => "%",
            Token::Asterix => "*",
            Token::VerticalBar => "|",
            Token::Ampersand => "&",
            Token::Hat => "^",
            Token::Tilde => "~",
            Token::ExclamationPoint => "!",
            Token::Equals => "=",
            Token::DoubleEquals => "==",
            Token::ExclamationEquals => "!=",
            Token::DoubleAmpersand => "&&",
            Token::DoubleVerticalBar => "||",
            Token::DoubleHat => "^^",
            Token::Increment => "++",
            Token::Decrement => "--",
            Token::LeftShift => "<<",
            Token::RightShift => ">>",
            Token::PlusEquals => "+=",
            Token::MinusEquals => "-=",
            Token::AsterixEquals => "*=",
            Token::ForwardSlashEquals => "/=",
            Token::PercentEquals => "%=",
            Token::LeftShiftEquals => "<<=",
            Token::RightShiftEquals => ">>=",
            Token::AmpersandEquals => "&=",
            Token::HatEquals => "^=",
            Token::VerticalBarEquals => "|=",
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::While => "while",
            Token::Do => "do",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Return => "return",
            Token::Discard => "discard",
            Token::Struct => "struct",
            Token::Const => "const",
            Token::Attribute => "attribute",
            Token::Uniform => "uniform",
            Token::Varying => "varying",
            Token::Invariant => "invariant",
            Token::In => "in",
            Token::Out => "out",
            Token::InOut => "inout",
            Token::Precision => "precision",
            Token::LowP => "lowp",
            Token::MediumP => "mediump",
            Token::HighP => "highp",
        };
        write!(f, "{}", text)
    }
}

/// Keywords GLSL ES 1.00 reserves for future use
pub const RESERVED_WORDS: &[&str] = &["asm", "class", "union", "enum", "typedef", "template",
                                      "this", "packed", "goto", "switch", "default", "inline",
                                      "noinline", "volatile", "public", "static", "extern",
                                      "external", "interface", "flat", "long", "short",
                                      "double", "half", "fixed", "unsigned", "superp", "input",
                                      "output", "hvec2", "hvec3", "hvec4", "dvec2", "dvec3",
                                      "dvec4", "fvec2", "fvec3", "fvec4", "sampler1D",
                                      "sampler3D", "sampler1DShadow", "sampler2DShadow",
                                      "sampler2DRect", "sampler3DRect", "sampler2DRectShadow",
                                      "sizeof", "cast", "namespace", "using"];

/// Type names that reach the parser as identifiers
pub const TYPE_KEYWORDS: &[&str] = &["void", "bool", "int", "float", "vec2", "vec3", "vec4",
                                     "bvec2", "bvec3", "bvec4", "ivec2", "ivec3", "ivec4",
                                     "mat2", "mat3", "mat4", "sampler2D", "samplerCube"];

#[derive(PartialEq, Debug, Clone)]
pub struct LexToken(pub Token, pub FileLocation);

impl LexToken {
    pub fn to_loc(self) -> FileLocation {
        self.1
    }
    pub fn with_no_loc(token: Token) -> LexToken {
        LexToken(token, FileLocation::none())
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Tokens {
    pub stream: Vec<LexToken>,
}
