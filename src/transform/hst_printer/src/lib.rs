mod printer;

pub use printer::HlslSource;
pub use printer::print_expression;
