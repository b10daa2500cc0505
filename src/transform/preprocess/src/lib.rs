mod condition_parser;
mod preprocess;

pub use preprocess::PreprocessError;
pub use preprocess::PreprocessErrorReason;
pub use preprocess::PreprocessedText;
pub use preprocess::preprocess;
pub use preprocess::preprocess_single;
