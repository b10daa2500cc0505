use std::error;
use std::fmt;
use std::str;
use glt_shared::*;
use glt_lang_etk::*;
use glt_transform_preprocess::PreprocessedText;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while, take_while1};
use nom::character::complete::{digit0, digit1, hex_digit1, multispace1, one_of};
use nom::combinator::{map, map_res, opt, recognize, value};
use nom::multi::many0;
use nom::sequence::{pair, preceded, tuple};
use nom::IResult;

#[derive(PartialEq, Debug, Clone)]
pub enum LexError {
    Unknown,
    FailedToParse(Vec<u8>, FileLocation),
}

impl LexError {
    pub fn get_code(&self) -> ErrorCode {
        match *self {
            LexError::Unknown => ErrorCode::SyntaxError,
            LexError::FailedToParse(_, _) => ErrorCode::InvalidCharacter,
        }
    }

    pub fn get_location(&self) -> FileLocation {
        match *self {
            LexError::Unknown => FileLocation::none(),
            LexError::FailedToParse(_, location) => location,
        }
    }
}

impl error::Error for LexError {}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LexError::Unknown => write!(f, "unknown lexer error"),
            LexError::FailedToParse(ref rest, _) => {
                let shown = rest.iter().take(16).cloned().collect::<Vec<u8>>();
                write!(f, "failed to parse stream at '{}'", String::from_utf8_lossy(&shown))
            }
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
struct StreamToken(pub Token, pub StreamLocation);

fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_identifier_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn fold_digits(digits: &[u8], radix: u32) -> Option<u64> {
    let mut value = 0u64;
    for digit in digits {
        let digit = (*digit as char).to_digit(radix)?;
        // Saturate so the verifier can report the literal as too large
        value = value.saturating_mul(radix as u64).saturating_add(digit as u64);
    }
    Some(value)
}

fn literal_int(input: &[u8]) -> IResult<&[u8], Token> {
    alt((map_res(preceded(alt((tag("0x"), tag("0X"))), hex_digit1), |digits: &[u8]| {
             fold_digits(digits, 16).map(Token::LiteralInt).ok_or(())
         }),
         map_res(digit1, |digits: &[u8]| {
             let value = if digits.len() > 1 && digits[0] == b'0' {
                 fold_digits(&digits[1..], 8)
             } else {
                 fold_digits(digits, 10)
             };
             value.map(Token::LiteralInt).ok_or(())
         })))(input)
}

fn exponent(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn literal_float(input: &[u8]) -> IResult<&[u8], Token> {
    let text = recognize(alt((recognize(tuple((digit1, tag("."), digit0, opt(exponent)))),
                              recognize(tuple((tag("."), digit1, opt(exponent)))),
                              recognize(pair(digit1, exponent)))));
    map_res(text, |bytes: &[u8]| -> Result<Token, ()> {
        let text = str::from_utf8(bytes).map_err(|_| ())?;
        text.parse::<f32>().map(Token::LiteralFloat).map_err(|_| ())
    })(input)
}

fn identifier(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(take_while1(is_identifier_start), take_while(is_identifier_char)))(input)
}

fn word(input: &[u8]) -> IResult<&[u8], Token> {
    map(identifier, |bytes: &[u8]| {
        let name = String::from_utf8_lossy(bytes).into_owned();
        match Token::from_keyword(&name) {
            Some(token) => token,
            None if RESERVED_WORDS.contains(&&name[..]) => Token::Reserved(Identifier(name)),
            None => Token::Id(Identifier(name)),
        }
    })(input)
}

fn symbol_long(input: &[u8]) -> IResult<&[u8], Token> {
    alt((value(Token::LeftShiftEquals, tag("<<=")),
         value(Token::RightShiftEquals, tag(">>=")),
         alt((value(Token::Increment, tag("++")),
              value(Token::Decrement, tag("--")),
              value(Token::LessEqual, tag("<=")),
              value(Token::GreaterEqual, tag(">=")),
              value(Token::DoubleEquals, tag("==")),
              value(Token::ExclamationEquals, tag("!=")),
              value(Token::DoubleAmpersand, tag("&&")),
              value(Token::DoubleVerticalBar, tag("||")),
              value(Token::DoubleHat, tag("^^")),
              value(Token::PlusEquals, tag("+=")),
              value(Token::MinusEquals, tag("-=")),
              value(Token::AsterixEquals, tag("*=")),
              value(Token::ForwardSlashEquals, tag("/=")),
              value(Token::PercentEquals, tag("%=")),
              value(Token::AmpersandEquals, tag("&=")),
              value(Token::VerticalBarEquals, tag("|=")),
              value(Token::HatEquals, tag("^=")),
              value(Token::LeftShift, tag("<<")),
              value(Token::RightShift, tag(">>"))))))(input)
}

fn symbol_bracket(input: &[u8]) -> IResult<&[u8], Token> {
    alt((value(Token::LeftBrace, tag("{")),
         value(Token::RightBrace, tag("}")),
         value(Token::LeftParen, tag("(")),
         value(Token::RightParen, tag(")")),
         value(Token::LeftSquareBracket, tag("[")),
         value(Token::RightSquareBracket, tag("]")),
         value(Token::LeftAngleBracket, tag("<")),
         value(Token::RightAngleBracket, tag(">"))))(input)
}

fn symbol_short(input: &[u8]) -> IResult<&[u8], Token> {
    alt((value(Token::Semicolon, tag(";")),
         value(Token::Comma, tag(",")),
         value(Token::QuestionMark, tag("?")),
         value(Token::Colon, tag(":")),
         value(Token::Period, tag(".")),
         value(Token::Plus, tag("+")),
         value(Token::Minus, tag("-")),
         value(Token::ForwardSlash, tag("/")),
         value(Token::Percent, tag("%")),
         value(Token::Asterix, tag("*")),
         value(Token::VerticalBar, tag("|")),
         value(Token::Ampersand, tag("&")),
         value(Token::Hat, tag("^")),
         value(Token::Tilde, tag("~")),
         value(Token::ExclamationPoint, tag("!")),
         value(Token::Equals, tag("="))))(input)
}

fn token(input: &[u8]) -> IResult<&[u8], Token> {
    alt((literal_float, literal_int, word, symbol_long, symbol_bracket, symbol_short))(input)
}

fn line_comment(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(tag("//"), take_while(|c| c != b'\n')))(input)
}

fn block_comment(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

fn whitespace(input: &[u8]) -> IResult<&[u8], ()> {
    value((), many0(alt((multispace1, line_comment, block_comment))))(input)
}

fn token_stream(input: &[u8]) -> Result<Vec<StreamToken>, StreamLocation> {
    let total_length = input.len() as u64;
    let mut stream = vec![];
    let mut remaining = input;
    loop {
        if let Ok((rest, _)) = whitespace(remaining) {
            remaining = rest;
        }
        let location = StreamLocation(total_length - remaining.len() as u64);
        if remaining.is_empty() {
            stream.push(StreamToken(Token::Eof, location));
            return Ok(stream);
        }
        match token(remaining) {
            Ok((rest, tok)) => {
                stream.push(StreamToken(tok, location));
                remaining = rest;
            }
            Err(_) => return Err(location),
        }
    }
}

pub fn lex(preprocessed: &PreprocessedText) -> Result<Tokens, LexError> {
    let code_bytes = preprocessed.as_bytes();
    match token_stream(code_bytes) {
        Ok(stream) => {
            let mut lex_tokens = Vec::with_capacity(stream.len());
            for StreamToken(token, stream_location) in stream {
                let loc = match preprocessed.get_file_location(&stream_location) {
                    Ok(file_location) => file_location,
                    Err(()) => return Err(LexError::Unknown),
                };
                lex_tokens.push(LexToken(token, loc));
            }
            Ok(Tokens { stream: lex_tokens })
        }
        Err(stream_location) => {
            let loc = preprocessed.get_file_location(&stream_location)
                .map_err(|()| LexError::Unknown)?;
            Err(LexError::FailedToParse(code_bytes[stream_location.0 as usize..].to_vec(), loc))
        }
    }
}

#[test]
fn test_token() {
    fn done(rest: &'static [u8], tok: Token) -> IResult<&'static [u8], Token> {
        Ok((rest, tok))
    }
    fn id(name: &str) -> Token {
        Token::Id(Identifier(name.to_string()))
    }

    assert!(token(&b""[..]).is_err());
    assert_eq!(token(&b";"[..]), done(b"", Token::Semicolon));
    assert_eq!(token(&b"name"[..]), done(b"", id("name")));
    assert_eq!(token(&b"vec4("[..]), done(b"(", id("vec4")));
    assert_eq!(token(&b"_a1 "[..]), done(b" ", id("_a1")));

    assert_eq!(token(&b"12 "[..]), done(b" ", Token::LiteralInt(12)));
    assert_eq!(token(&b"0x1F"[..]), done(b"", Token::LiteralInt(31)));
    assert_eq!(token(&b"017"[..]), done(b"", Token::LiteralInt(15)));
    assert_eq!(token(&b"0"[..]), done(b"", Token::LiteralInt(0)));
    assert_eq!(token(&b"99999999999999999999999"[..]),
               done(b"", Token::LiteralInt(u64::MAX)));

    assert_eq!(token(&b"1.0"[..]), done(b"", Token::LiteralFloat(1.0)));
    assert_eq!(token(&b"2."[..]), done(b"", Token::LiteralFloat(2.0)));
    assert_eq!(token(&b".5"[..]), done(b"", Token::LiteralFloat(0.5)));
    assert_eq!(token(&b"1e2"[..]), done(b"", Token::LiteralFloat(100.0)));
    assert_eq!(token(&b"1.5e-1"[..]), done(b"", Token::LiteralFloat(0.15)));
    assert_eq!(token(&b"1.0f"[..]), done(b"f", Token::LiteralFloat(1.0)));

    assert_eq!(token(&b"++"[..]), done(b"", Token::Increment));
    assert_eq!(token(&b"+="[..]), done(b"", Token::PlusEquals));
    assert_eq!(token(&b"+ "[..]), done(b" ", Token::Plus));
    assert_eq!(token(&b"<="[..]), done(b"", Token::LessEqual));
    assert_eq!(token(&b"<<="[..]), done(b"", Token::LeftShiftEquals));
    assert_eq!(token(&b"<<"[..]), done(b"", Token::LeftShift));
    assert_eq!(token(&b"< "[..]), done(b" ", Token::LeftAngleBracket));
    assert_eq!(token(&b"&&"[..]), done(b"", Token::DoubleAmpersand));
    assert_eq!(token(&b"^^"[..]), done(b"", Token::DoubleHat));
    assert_eq!(token(&b"."[..]), done(b"", Token::Period));
    assert_eq!(token(&b"=="[..]), done(b"", Token::DoubleEquals));
    assert_eq!(token(&b"!"[..]), done(b"", Token::ExclamationPoint));

    assert_eq!(token(&b"if"[..]), done(b"", Token::If));
    assert_eq!(token(&b"iffy"[..]), done(b"", id("iffy")));
    assert_eq!(token(&b"uniform"[..]), done(b"", Token::Uniform));
    assert_eq!(token(&b"mediump"[..]), done(b"", Token::MediumP));
    assert_eq!(token(&b"true"[..]), done(b"", Token::True));
    assert_eq!(token(&b"goto"[..]),
               done(b"", Token::Reserved(Identifier("goto".to_string()))));
}

#[test]
fn test_lex() {
    use glt_transform_preprocess::preprocess_single;

    fn run(input: &str) -> Vec<(Token, u64, u64)> {
        let preprocessed = preprocess_single(input).unwrap();
        lex(&preprocessed)
            .unwrap()
            .stream
            .into_iter()
            .map(|LexToken(tok, loc)| (tok, (loc.1).0, (loc.2).0))
            .collect()
    }

    assert_eq!(run("void f();"),
               vec![(Token::Id(Identifier("void".to_string())), 1, 1),
                    (Token::Id(Identifier("f".to_string())), 1, 6),
                    (Token::LeftParen, 1, 7),
                    (Token::RightParen, 1, 8),
                    (Token::Semicolon, 1, 9),
                    (Token::Eof, 1, 10)]);
    assert_eq!(run("a\n  -1 /* x */ b"),
               vec![(Token::Id(Identifier("a".to_string())), 1, 1),
                    (Token::Minus, 2, 3),
                    (Token::LiteralInt(1), 2, 4),
                    (Token::Id(Identifier("b".to_string())), 2, 14),
                    (Token::Eof, 2, 15)]);
}

#[test]
fn test_lex_error() {
    use glt_transform_preprocess::preprocess_single;

    let preprocessed = preprocess_single("float a;\nfloat $b;").unwrap();
    let error = lex(&preprocessed).unwrap_err();
    assert_eq!(error.get_code(), ErrorCode::InvalidCharacter);
    assert_eq!(error.get_location().line(), 2);
}
