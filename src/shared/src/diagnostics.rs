use std::fmt;

/// Stable identity of every condition that fails a compile
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum ErrorCode {
    SyntaxError,
    InvalidCharacter,
    InvalidIdentifierName,
    IdentifierAlreadyDeclared,
    UndeclaredIdentifier,
    FunctionRedeclaration,
    FuncOverloadOnReturnType,
    FunctionMismatchedQualifiers,
    FunctionRedefinition,
    KnownFunctionDeclaredOrDefined,
    InvalidStructFieldName,
    CtorRequiresArguments,
    InvalidTypesForStructCtor,
    InvalidTensorCtorComponentCount,
    InvalidTensorCtorComponentType,
    InvalidVecCtor,
    InvalidMatCtorType,
    ArrayDeclaratorNotConst,
    ArraySizeLEQZero,
    DivideOrModByZero,
    InvalidLValue,
    ConstRequiresInitialization,
    NoPrecisionSpecified,
    PrecisionSpecifiedForStruct,
    PrecisionNotAllowedForType,
    IncompatibleTypes,
    InvalidArguments,
    IncompatibleReturn,
    InvalidBreakLocation,
    InvalidContinueLocation,
    InvalidDiscardLocation,
    InvalidForLoopInit,
    InvalidForLoopCond,
    InvalidForLoopIter,
    InvalidForLoopIndexWrite,
    LoopIndexOutParam,
    MaxUniformExceeded,
    MaxVaryingExceeded,
    MaxAttributeExceeded,
    ShaderComplexity,
    MaxFunctionDepthExceeded,
    MaxStructNestingExceeded,
    ShaderTooLong,
    UnknownExtension,
    RequiredExtensionUnsupported,
    ReservedOperator,
    InvalidQualifierInScope,
    InitializerNotAllowed,
    InvalidQualifierForType,
    InvalidSamplerUsage,
    ConstInitializerNotConst,
    InvalidIndexExpression,
    IndexOutOfRange,
    InvalidSwizzle,
    InvalidMainSignature,
    RecursionNotAllowed,
    FunctionNotDefined,
    FragColorAndFragData,
    PreprocessorError,
    InvalidVersion,
    InvalidInvariant,
    IntegerLiteralTooLarge,
    MaxSamplerExceeded,
}

impl ErrorCode {
    /// Symbolic name as reported to hosts
    pub fn name(&self) -> &'static str {
        match *self {
            ErrorCode::SyntaxError => "E_GLSLERROR_SYNTAXERROR",
            ErrorCode::InvalidCharacter => "E_GLSLERROR_INVALIDCHARACTER",
            ErrorCode::InvalidIdentifierName => "E_GLSLERROR_INVALIDIDENTIFIERNAME",
            ErrorCode::IdentifierAlreadyDeclared => "E_GLSLERROR_IDENTIFIERALREADYDECLARED",
            ErrorCode::UndeclaredIdentifier => "E_GLSLERROR_UNDECLAREDIDENTIFIER",
            ErrorCode::FunctionRedeclaration => "E_GLSLERROR_FUNCTIONREDECLARATION",
            ErrorCode::FuncOverloadOnReturnType => "E_GLSLERROR_FUNCOVERLOADONRETURNTYPE",
            ErrorCode::FunctionMismatchedQualifiers => "E_GLSLERROR_FUNCTIONMISMATCHEDQUALIFIERS",
            ErrorCode::FunctionRedefinition => "E_GLSLERROR_FUNCTIONREDEFINITION",
            ErrorCode::KnownFunctionDeclaredOrDefined => "E_GLSLERROR_KNOWNFUNCTIONDECLAREDORDEFINED",
            ErrorCode::InvalidStructFieldName => "E_GLSLERROR_INVALIDSTRUCTFIELDNAME",
            ErrorCode::CtorRequiresArguments => "E_GLSLERROR_CTORREQUIRESARGUMENTS",
            ErrorCode::InvalidTypesForStructCtor => "E_GLSLERROR_INVALIDTYPESFORSTRUCTCTOR",
            ErrorCode::InvalidTensorCtorComponentCount => "E_GLSLERROR_INVALIDTENSORCTORCOMPONENTCOUNT",
            ErrorCode::InvalidTensorCtorComponentType => "E_GLSLERROR_INVALIDTENSORCTORCOMPONENTTYPE",
            ErrorCode::InvalidVecCtor => "E_GLSLERROR_INVALIDVECCTOR",
            ErrorCode::InvalidMatCtorType => "E_GLSLERROR_INVALIDMATCTORTYPE",
            ErrorCode::ArrayDeclaratorNotConst => "E_GLSLERROR_ARRAYDECLARATORNOTCONST",
            ErrorCode::ArraySizeLEQZero => "E_GLSLERROR_ARRAYSIZELEQZERO",
            ErrorCode::DivideOrModByZero => "E_GLSLERROR_DIVIDEORMODBYZERO",
            ErrorCode::InvalidLValue => "E_GLSLERROR_INVALIDLVALUE",
            ErrorCode::ConstRequiresInitialization => "E_GLSLERROR_CONSTREQUIRESINITIALIZATION",
            ErrorCode::NoPrecisionSpecified => "E_GLSLERROR_NOPRECISIONSPECIFIED",
            ErrorCode::PrecisionSpecifiedForStruct => "E_GLSLERROR_PRECISIONSPECIFIEDFORSTRUCT",
            ErrorCode::PrecisionNotAllowedForType => "E_GLSLERROR_PRECISIONNOTALLOWEDFORTYPE",
            ErrorCode::IncompatibleTypes => "E_GLSLERROR_INCOMPATIBLETYPES",
            ErrorCode::InvalidArguments => "E_GLSLERROR_INVALIDARGUMENTS",
            ErrorCode::IncompatibleReturn => "E_GLSLERROR_INCOMPATIBLERETURN",
            ErrorCode::InvalidBreakLocation => "E_GLSLERROR_INVALIDBREAKLOCATION",
            ErrorCode::InvalidContinueLocation => "E_GLSLERROR_INVALIDCONTINUELOCATION",
            ErrorCode::InvalidDiscardLocation => "E_GLSLERROR_INVALIDDISCARDLOCATION",
            ErrorCode::InvalidForLoopInit => "E_GLSLERROR_INVALIDFORLOOPINIT",
            ErrorCode::InvalidForLoopCond => "E_GLSLERROR_INVALIDFORLOOPCOND",
            ErrorCode::InvalidForLoopIter => "E_GLSLERROR_INVALIDFORLOOPITER",
            ErrorCode::InvalidForLoopIndexWrite => "E_GLSLERROR_INVALIDFORLOOPINDEXWRITE",
            ErrorCode::LoopIndexOutParam => "E_GLSLERROR_LOOPINDEXOUTPARAM",
            ErrorCode::MaxUniformExceeded => "E_GLSLERROR_MAXUNIFORMEXCEEDED",
            ErrorCode::MaxVaryingExceeded => "E_GLSLERROR_MAXVARYINGEXCEEDED",
            ErrorCode::MaxAttributeExceeded => "E_GLSLERROR_MAXATTRIBUTEEXCEEDED",
            ErrorCode::ShaderComplexity => "E_GLSLERROR_SHADERCOMPLEXITY",
            ErrorCode::MaxFunctionDepthExceeded => "E_GLSLERROR_MAXFUNCTIONDEPTHEXCEEDED",
            ErrorCode::MaxStructNestingExceeded => "E_GLSLERROR_MAXSTRUCTNESTINGEXCEEDED",
            ErrorCode::ShaderTooLong => "E_GLSLERROR_SHADERTOOLONG",
            ErrorCode::UnknownExtension => "E_GLSLERROR_UNKNOWNEXTENSION",
            ErrorCode::RequiredExtensionUnsupported => "E_GLSLERROR_REQUIREDEXTENSIONUNSUPPORTED",
            ErrorCode::ReservedOperator => "E_GLSLERROR_RESERVEDOPERATOR",
            ErrorCode::InvalidQualifierInScope => "E_GLSLERROR_INVALIDQUALIFIERINSCOPE",
            ErrorCode::InitializerNotAllowed => "E_GLSLERROR_INITIALIZERNOTALLOWED",
            ErrorCode::InvalidQualifierForType => "E_GLSLERROR_INVALIDQUALIFIERFORTYPE",
            ErrorCode::InvalidSamplerUsage => "E_GLSLERROR_INVALIDSAMPLERUSAGE",
            ErrorCode::ConstInitializerNotConst => "E_GLSLERROR_CONSTINITIALIZERNOTCONST",
            ErrorCode::InvalidIndexExpression => "E_GLSLERROR_INVALIDINDEXEXPRESSION",
            ErrorCode::IndexOutOfRange => "E_GLSLERROR_INDEXOUTOFRANGE",
            ErrorCode::InvalidSwizzle => "E_GLSLERROR_INVALIDSWIZZLE",
            ErrorCode::InvalidMainSignature => "E_GLSLERROR_INVALIDMAINSIGNATURE",
            ErrorCode::RecursionNotAllowed => "E_GLSLERROR_RECURSIONNOTALLOWED",
            ErrorCode::FunctionNotDefined => "E_GLSLERROR_FUNCTIONNOTDEFINED",
            ErrorCode::FragColorAndFragData => "E_GLSLERROR_FRAGCOLORANDFRAGDATA",
            ErrorCode::PreprocessorError => "E_GLSLERROR_PREPROCESSORERROR",
            ErrorCode::InvalidVersion => "E_GLSLERROR_INVALIDVERSION",
            ErrorCode::InvalidInvariant => "E_GLSLERROR_INVALIDINVARIANT",
            ErrorCode::IntegerLiteralTooLarge => "E_GLSLERROR_INTEGERLITERALTOOLARGE",
            ErrorCode::MaxSamplerExceeded => "E_GLSLERROR_MAXSAMPLEREXCEEDED",
        }
    }

    pub fn description(&self) -> &'static str {
        match *self {
            ErrorCode::SyntaxError => "syntax error",
            ErrorCode::InvalidCharacter => "invalid character",
            ErrorCode::InvalidIdentifierName => "invalid identifier name",
            ErrorCode::IdentifierAlreadyDeclared => "identifier already declared in this scope",
            ErrorCode::UndeclaredIdentifier => "undeclared identifier",
            ErrorCode::FunctionRedeclaration => "function already declared",
            ErrorCode::FuncOverloadOnReturnType => "function overloads differ only by return type",
            ErrorCode::FunctionMismatchedQualifiers => "function redeclared with different parameter qualifiers",
            ErrorCode::FunctionRedefinition => "function already has a body",
            ErrorCode::KnownFunctionDeclaredOrDefined => "built-in function cannot be redeclared",
            ErrorCode::InvalidStructFieldName => "struct has no field with this name",
            ErrorCode::CtorRequiresArguments => "constructor requires arguments",
            ErrorCode::InvalidTypesForStructCtor => "struct constructor arguments do not match fields",
            ErrorCode::InvalidTensorCtorComponentCount => "wrong number of components for constructor",
            ErrorCode::InvalidTensorCtorComponentType => "constructor component is not a scalar, vector or matrix",
            ErrorCode::InvalidVecCtor => "invalid vector constructor argument",
            ErrorCode::InvalidMatCtorType => "invalid matrix constructor argument",
            ErrorCode::ArrayDeclaratorNotConst => "array size must be a constant integer expression",
            ErrorCode::ArraySizeLEQZero => "array size must be greater than zero",
            ErrorCode::DivideOrModByZero => "division by constant zero",
            ErrorCode::InvalidLValue => "expression is not assignable",
            ErrorCode::ConstRequiresInitialization => "const variable requires an initializer",
            ErrorCode::NoPrecisionSpecified => "no precision specified",
            ErrorCode::PrecisionSpecifiedForStruct => "precision qualifier not allowed on struct",
            ErrorCode::PrecisionNotAllowedForType => "precision qualifier not allowed for this type",
            ErrorCode::IncompatibleTypes => "incompatible types",
            ErrorCode::InvalidArguments => "no overload matches the arguments",
            ErrorCode::IncompatibleReturn => "return value does not match function return type",
            ErrorCode::InvalidBreakLocation => "break outside of a loop",
            ErrorCode::InvalidContinueLocation => "continue outside of a loop",
            ErrorCode::InvalidDiscardLocation => "discard outside of a fragment shader",
            ErrorCode::InvalidForLoopInit => "invalid for loop initializer",
            ErrorCode::InvalidForLoopCond => "invalid for loop condition",
            ErrorCode::InvalidForLoopIter => "invalid for loop iteration expression",
            ErrorCode::InvalidForLoopIndexWrite => "loop index cannot be written in the loop body",
            ErrorCode::LoopIndexOutParam => "loop index cannot be passed as an out or inout argument",
            ErrorCode::MaxUniformExceeded => "too many uniforms",
            ErrorCode::MaxVaryingExceeded => "too many varyings",
            ErrorCode::MaxAttributeExceeded => "too many attributes",
            ErrorCode::ShaderComplexity => "shader nesting is too deep",
            ErrorCode::MaxFunctionDepthExceeded => "function calls are nested too deeply",
            ErrorCode::MaxStructNestingExceeded => "structs are nested too deeply",
            ErrorCode::ShaderTooLong => "shader source is too long",
            ErrorCode::UnknownExtension => "invalid extension directive",
            ErrorCode::RequiredExtensionUnsupported => "required extension is not supported",
            ErrorCode::ReservedOperator => "operator is reserved",
            ErrorCode::InvalidQualifierInScope => "qualifier is only allowed at global scope",
            ErrorCode::InitializerNotAllowed => "variables with this qualifier cannot be initialized",
            ErrorCode::InvalidQualifierForType => "qualifier cannot be used with this type",
            ErrorCode::InvalidSamplerUsage => "invalid use of a sampler",
            ErrorCode::ConstInitializerNotConst => "const variable initializer is not a constant expression",
            ErrorCode::InvalidIndexExpression => "invalid index expression",
            ErrorCode::IndexOutOfRange => "constant index out of range",
            ErrorCode::InvalidSwizzle => "invalid vector field selection",
            ErrorCode::InvalidMainSignature => "main must be declared as void main()",
            ErrorCode::RecursionNotAllowed => "recursion is not allowed",
            ErrorCode::FunctionNotDefined => "function is called but never defined",
            ErrorCode::FragColorAndFragData => "gl_FragColor and gl_FragData cannot both be used",
            ErrorCode::PreprocessorError => "preprocessor error",
            ErrorCode::InvalidVersion => "unsupported #version",
            ErrorCode::InvalidInvariant => "invariant can only qualify output varyings",
            ErrorCode::IntegerLiteralTooLarge => "integer literal is too large",
            ErrorCode::MaxSamplerExceeded => "too many samplers",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One reported failure with the source line it was found on
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub line: u64,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, line: u64, message: String) -> Diagnostic {
        Diagnostic {
            code,
            line,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}: {}", self.line, self.code.name(), self.message)
    }
}

#[test]
fn test_diagnostic_display() {
    let diagnostic = Diagnostic::new(ErrorCode::ArraySizeLEQZero, 3, "j".to_string());
    assert_eq!(diagnostic.to_string(), "3: E_GLSLERROR_ARRAYSIZELEQZERO: j");
    assert_eq!(ErrorCode::SyntaxError.description(), "syntax error");
}
