#[macro_use]
extern crate bitflags;

mod bindings;
mod diagnostics;
mod extensions;
mod options;

pub use bindings::*;
pub use diagnostics::*;
pub use extensions::*;
pub use options::*;

/// A source string used as an input
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum File {
    Unknown,
    SourceString(u64),
}

/// A line number in a file
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct Line(pub u64);

/// The column index in a line
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Column(pub u64);

/// Fully qualified location
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct FileLocation(pub File, pub Line, pub Column);

impl FileLocation {
    pub fn none() -> FileLocation {
        FileLocation(File::Unknown, Line(0), Column(0))
    }

    pub fn line(&self) -> u64 {
        (self.1).0
    }
}

/// The raw number of bytes from the start of a stream
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct StreamLocation(pub u64);

/// Wrapper to pair a node with a FileLocation
#[derive(PartialEq, Debug, Clone)]
pub struct Located<T> {
    pub node: T,
    pub location: FileLocation,
}

impl<T> Located<T> {
    pub fn new(node: T, loc: FileLocation) -> Located<T> {
        Located {
            node,
            location: loc,
        }
    }
    pub fn to_node(self) -> T {
        self.node
    }
    pub fn to_loc(self) -> FileLocation {
        self.location
    }
    pub fn loc(line: u64, column: u64, node: T) -> Located<T> {
        Located {
            node,
            location: FileLocation(File::Unknown, Line(line), Column(column)),
        }
    }
    pub fn none(node: T) -> Located<T> {
        Located {
            node,
            location: FileLocation::none(),
        }
    }
}

impl<T> std::ops::Deref for Located<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.node
    }
}

/// Which programmable stage a shader is compiled for
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}
