mod transpiler;
mod expressions;
mod statements;
mod entry;

pub use transpiler::TranspileError;
pub use transpiler::TranspiledShader;
pub use transpiler::transpile;
