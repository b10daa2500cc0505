mod lexer;

pub use lexer::LexError;
pub use lexer::lex;
