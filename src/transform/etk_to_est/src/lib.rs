mod parser;

pub use parser::ParseError;
pub use parser::ParseErrorReason;
pub use parser::parse;
