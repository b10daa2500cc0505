mod typer;
mod expressions;
mod constructors;
mod loops;

pub use typer::TyperError;
pub use typer::typeparse;
