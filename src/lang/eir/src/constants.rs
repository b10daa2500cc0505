use std::fmt;
use crate::eir::*;

/// A single compile time scalar value
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ScalarConstant {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl ScalarConstant {
    pub fn get_type(&self) -> ScalarType {
        match *self {
            ScalarConstant::Bool(_) => ScalarType::Bool,
            ScalarConstant::Int(_) => ScalarType::Int,
            ScalarConstant::Float(_) => ScalarType::Float,
        }
    }

    pub fn to_bool(&self) -> bool {
        match *self {
            ScalarConstant::Bool(b) => b,
            ScalarConstant::Int(i) => i != 0,
            ScalarConstant::Float(f) => f != 0.0,
        }
    }

    pub fn to_int(&self) -> i32 {
        match *self {
            ScalarConstant::Bool(b) => b as i32,
            ScalarConstant::Int(i) => i,
            ScalarConstant::Float(f) => f as i32,
        }
    }

    pub fn to_float(&self) -> f32 {
        match *self {
            ScalarConstant::Bool(b) => if b { 1.0 } else { 0.0 },
            ScalarConstant::Int(i) => i as f32,
            ScalarConstant::Float(f) => f,
        }
    }

    /// Convert the value as a constructor of the target type would
    pub fn cast(&self, to: ScalarType) -> ScalarConstant {
        match to {
            ScalarType::Bool => ScalarConstant::Bool(self.to_bool()),
            ScalarType::Int => ScalarConstant::Int(self.to_int()),
            ScalarType::Float => ScalarConstant::Float(self.to_float()),
        }
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            ScalarConstant::Bool(_) => false,
            ScalarConstant::Int(i) => i == 0,
            ScalarConstant::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for ScalarConstant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ScalarConstant::Bool(b) => write!(f, "{}", b),
            ScalarConstant::Int(i) => write!(f, "{}", i),
            ScalarConstant::Float(v) => write!(f, "{:?}", v),
        }
    }
}

/// A compile time value of any constructible type
#[derive(PartialEq, Debug, Clone)]
pub enum Constant {
    Scalar(ScalarConstant),
    Vector(Vec<ScalarConstant>),
    /// Column major components of a square matrix
    Matrix(u32, Vec<f32>),
    Struct(StructId, Vec<Constant>),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum FoldError {
    /// Division by zero or overflowing division
    DivideByZero,
    /// The operation has no compile time evaluation
    Unsupported,
}

impl Constant {
    pub fn bool(value: bool) -> Constant {
        Constant::Scalar(ScalarConstant::Bool(value))
    }

    pub fn int(value: i32) -> Constant {
        Constant::Scalar(ScalarConstant::Int(value))
    }

    pub fn float(value: f32) -> Constant {
        Constant::Scalar(ScalarConstant::Float(value))
    }

    /// Flatten a numeric value into scalars, matrices in column order
    pub fn get_components(&self) -> Vec<ScalarConstant> {
        match *self {
            Constant::Scalar(ref scalar) => vec![*scalar],
            Constant::Vector(ref components) => components.clone(),
            Constant::Matrix(_, ref values) => {
                values.iter().map(|v| ScalarConstant::Float(*v)).collect()
            }
            Constant::Struct(_, _) => vec![],
        }
    }

    /// Build a numeric value of the given type from enough scalars
    pub fn from_components(ty: &Type, components: &[ScalarConstant]) -> Option<Constant> {
        match *ty {
            Type::Scalar(scalar) => {
                components.first().map(|c| Constant::Scalar(c.cast(scalar)))
            }
            Type::Vector(scalar, x) if components.len() >= x as usize => {
                Some(Constant::Vector(components[..x as usize]
                                          .iter()
                                          .map(|c| c.cast(scalar))
                                          .collect()))
            }
            Type::Matrix(x) if components.len() >= (x * x) as usize => {
                Some(Constant::Matrix(x,
                                      components[..(x * x) as usize]
                                          .iter()
                                          .map(|c| c.to_float())
                                          .collect()))
            }
            _ => None,
        }
    }

    /// Rebuild a value with the same shape as this one
    fn with_components(&self, components: Vec<ScalarConstant>) -> Constant {
        match *self {
            Constant::Scalar(_) => Constant::Scalar(components[0]),
            Constant::Vector(_) => Constant::Vector(components),
            Constant::Matrix(x, _) => {
                Constant::Matrix(x, components.iter().map(|c| c.to_float()).collect())
            }
            Constant::Struct(_, _) => panic!("struct constants have no components"),
        }
    }

    pub fn to_scalar(&self) -> Option<ScalarConstant> {
        match *self {
            Constant::Scalar(ref scalar) => Some(*scalar),
            _ => None,
        }
    }

    /// Element of a vector or column of a matrix
    pub fn index(&self, index: u32) -> Option<Constant> {
        match *self {
            Constant::Vector(ref components) => {
                components.get(index as usize).map(|c| Constant::Scalar(*c))
            }
            Constant::Matrix(x, ref values) if index < x => {
                let start = (index * x) as usize;
                Some(Constant::Vector(values[start..start + x as usize]
                                          .iter()
                                          .map(|v| ScalarConstant::Float(*v))
                                          .collect()))
            }
            _ => None,
        }
    }

    pub fn swizzle(&self, slots: &[SwizzleSlot]) -> Option<Constant> {
        let components = match *self {
            Constant::Vector(ref components) => components,
            _ => return None,
        };
        let mut selected = vec![];
        for slot in slots {
            selected.push(*components.get(slot.get_index() as usize)?);
        }
        Some(if selected.len() == 1 {
            Constant::Scalar(selected[0])
        } else {
            Constant::Vector(selected)
        })
    }

    pub fn member(&self, index: usize) -> Option<Constant> {
        match *self {
            Constant::Struct(_, ref members) => members.get(index).cloned(),
            _ => None,
        }
    }
}

/// Apply an operation to every component
pub fn map_components<F>(value: &Constant, f: F) -> Constant
    where F: Fn(ScalarConstant) -> ScalarConstant
{
    value.with_components(value.get_components().into_iter().map(f).collect())
}

/// Apply an operation to each pair of components, broadcasting scalars
pub fn zip_components<F>(left: &Constant, right: &Constant, f: F) -> Result<Constant, FoldError>
    where F: Fn(ScalarConstant, ScalarConstant) -> Result<ScalarConstant, FoldError>
{
    let lc = left.get_components();
    let rc = right.get_components();
    let (template, count) = match (lc.len(), rc.len()) {
        (l, r) if l == r => (left, l),
        (1, r) => (right, r),
        (l, 1) => (left, l),
        _ => return Err(FoldError::Unsupported),
    };
    let mut components = Vec::with_capacity(count);
    for i in 0..count {
        let l = if lc.len() == 1 { lc[0] } else { lc[i] };
        let r = if rc.len() == 1 { rc[0] } else { rc[i] };
        components.push(f(l, r)?);
    }
    Ok(template.with_components(components))
}

fn fold_arithmetic(op: &BinOp,
                   l: ScalarConstant,
                   r: ScalarConstant)
                   -> Result<ScalarConstant, FoldError> {
    Ok(match (l, r) {
        (ScalarConstant::Int(l), ScalarConstant::Int(r)) => {
            ScalarConstant::Int(match *op {
                BinOp::Add => l.wrapping_add(r),
                BinOp::Subtract => l.wrapping_sub(r),
                BinOp::Multiply => l.wrapping_mul(r),
                BinOp::Divide => l.checked_div(r).ok_or(FoldError::DivideByZero)?,
                _ => return Err(FoldError::Unsupported),
            })
        }
        (ScalarConstant::Float(l), ScalarConstant::Float(r)) => {
            ScalarConstant::Float(match *op {
                BinOp::Add => l + r,
                BinOp::Subtract => l - r,
                BinOp::Multiply => l * r,
                BinOp::Divide if r == 0.0 => return Err(FoldError::DivideByZero),
                BinOp::Divide => l / r,
                _ => return Err(FoldError::Unsupported),
            })
        }
        _ => return Err(FoldError::Unsupported),
    })
}

fn fold_matrix_multiply(left: &Constant, right: &Constant) -> Option<Constant> {
    match (left, right) {
        (&Constant::Matrix(n, ref m), &Constant::Vector(ref v)) if v.len() == n as usize => {
            let n = n as usize;
            let column = (0..n)
                .map(|r| {
                    ScalarConstant::Float((0..n).map(|c| m[c * n + r] * v[c].to_float()).sum())
                })
                .collect();
            Some(Constant::Vector(column))
        }
        (&Constant::Vector(ref v), &Constant::Matrix(n, ref m)) if v.len() == n as usize => {
            let n = n as usize;
            let row = (0..n)
                .map(|c| {
                    ScalarConstant::Float((0..n).map(|r| v[r].to_float() * m[c * n + r]).sum())
                })
                .collect();
            Some(Constant::Vector(row))
        }
        (&Constant::Matrix(n, ref a), &Constant::Matrix(n2, ref b)) if n == n2 => {
            let n = n as usize;
            let mut values = vec![0.0; n * n];
            for c in 0..n {
                for r in 0..n {
                    values[c * n + r] = (0..n).map(|k| a[k * n + r] * b[c * n + k]).sum();
                }
            }
            Some(Constant::Matrix(n as u32, values))
        }
        _ => None,
    }
}

pub fn fold_unary(op: &UnaryOp, value: &Constant) -> Result<Constant, FoldError> {
    match *op {
        UnaryOp::Plus => Ok(value.clone()),
        UnaryOp::Minus => {
            Ok(map_components(value, |c| match c {
                ScalarConstant::Int(i) => ScalarConstant::Int(i.wrapping_neg()),
                ScalarConstant::Float(f) => ScalarConstant::Float(-f),
                ScalarConstant::Bool(b) => ScalarConstant::Bool(b),
            }))
        }
        UnaryOp::LogicalNot => {
            match value.to_scalar() {
                Some(ScalarConstant::Bool(b)) => Ok(Constant::bool(!b)),
                _ => Err(FoldError::Unsupported),
            }
        }
        _ => Err(FoldError::Unsupported),
    }
}

pub fn fold_binary(op: &BinOp, left: &Constant, right: &Constant) -> Result<Constant, FoldError> {
    match *op {
        BinOp::Multiply => {
            match fold_matrix_multiply(left, right) {
                Some(value) => Ok(value),
                None => zip_components(left, right, |l, r| fold_arithmetic(op, l, r)),
            }
        }
        BinOp::Add | BinOp::Subtract | BinOp::Divide => {
            zip_components(left, right, |l, r| fold_arithmetic(op, l, r))
        }
        BinOp::LessThan | BinOp::LessEqual | BinOp::GreaterThan | BinOp::GreaterEqual => {
            let (l, r) = match (left.to_scalar(), right.to_scalar()) {
                (Some(l), Some(r)) => (l, r),
                _ => return Err(FoldError::Unsupported),
            };
            let ordering = match (l, r) {
                (ScalarConstant::Int(l), ScalarConstant::Int(r)) => l.partial_cmp(&r),
                (ScalarConstant::Float(l), ScalarConstant::Float(r)) => l.partial_cmp(&r),
                _ => return Err(FoldError::Unsupported),
            };
            let result = match ordering {
                Some(ordering) => {
                    match *op {
                        BinOp::LessThan => ordering.is_lt(),
                        BinOp::LessEqual => ordering.is_le(),
                        BinOp::GreaterThan => ordering.is_gt(),
                        _ => ordering.is_ge(),
                    }
                }
                None => false,
            };
            Ok(Constant::bool(result))
        }
        BinOp::Equality => Ok(Constant::bool(left == right)),
        BinOp::Inequality => Ok(Constant::bool(left != right)),
        BinOp::BooleanAnd | BinOp::BooleanOr | BinOp::BooleanXor => {
            match (left.to_scalar(), right.to_scalar()) {
                (Some(ScalarConstant::Bool(l)), Some(ScalarConstant::Bool(r))) => {
                    Ok(Constant::bool(match *op {
                        BinOp::BooleanAnd => l && r,
                        BinOp::BooleanOr => l || r,
                        _ => l != r,
                    }))
                }
                _ => Err(FoldError::Unsupported),
            }
        }
        _ => Err(FoldError::Unsupported),
    }
}

#[test]
fn test_fold_arithmetic() {
    let two = Constant::int(2);
    let three = Constant::int(3);
    assert_eq!(fold_binary(&BinOp::Add, &two, &three), Ok(Constant::int(5)));
    assert_eq!(fold_binary(&BinOp::Divide, &three, &two), Ok(Constant::int(1)));
    assert_eq!(fold_binary(&BinOp::Divide, &three, &Constant::int(0)),
               Err(FoldError::DivideByZero));
    assert_eq!(fold_binary(&BinOp::Divide, &Constant::int(i32::MIN), &Constant::int(-1)),
               Err(FoldError::DivideByZero));
    assert_eq!(fold_binary(&BinOp::Divide, &Constant::float(1.0), &Constant::float(0.0)),
               Err(FoldError::DivideByZero));
    assert_eq!(fold_binary(&BinOp::Add, &two, &Constant::float(1.0)),
               Err(FoldError::Unsupported));

    let v = Constant::Vector(vec![ScalarConstant::Float(1.0), ScalarConstant::Float(2.0)]);
    assert_eq!(fold_binary(&BinOp::Multiply, &Constant::float(2.0), &v),
               Ok(Constant::Vector(vec![ScalarConstant::Float(2.0), ScalarConstant::Float(4.0)])));
    assert_eq!(fold_unary(&UnaryOp::Minus, &two), Ok(Constant::int(-2)));
    assert_eq!(fold_unary(&UnaryOp::LogicalNot, &Constant::bool(true)), Ok(Constant::bool(false)));
}

#[test]
fn test_fold_matrix() {
    // Columns (1, 2) and (3, 4)
    let m = Constant::Matrix(2, vec![1.0, 2.0, 3.0, 4.0]);
    let v = Constant::Vector(vec![ScalarConstant::Float(1.0), ScalarConstant::Float(1.0)]);
    assert_eq!(fold_binary(&BinOp::Multiply, &m, &v),
               Ok(Constant::Vector(vec![ScalarConstant::Float(4.0), ScalarConstant::Float(6.0)])));
    assert_eq!(fold_binary(&BinOp::Multiply, &v, &m),
               Ok(Constant::Vector(vec![ScalarConstant::Float(3.0), ScalarConstant::Float(7.0)])));
    let identity = Constant::Matrix(2, vec![1.0, 0.0, 0.0, 1.0]);
    assert_eq!(fold_binary(&BinOp::Multiply, &m, &identity), Ok(m.clone()));
    assert_eq!(m.index(1),
               Some(Constant::Vector(vec![ScalarConstant::Float(3.0), ScalarConstant::Float(4.0)])));
}

#[test]
fn test_from_components() {
    let components = [ScalarConstant::Int(1), ScalarConstant::Int(0), ScalarConstant::Int(3)];
    assert_eq!(Constant::from_components(&Type::booln(2), &components),
               Some(Constant::Vector(vec![ScalarConstant::Bool(true), ScalarConstant::Bool(false)])));
    assert_eq!(Constant::from_components(&Type::float(), &components),
               Some(Constant::float(1.0)));
    assert_eq!(Constant::from_components(&Type::Matrix(2), &components), None);
    let v = Constant::from_components(&Type::floatn(3), &components).unwrap();
    assert_eq!(v.swizzle(&[SwizzleSlot::Z, SwizzleSlot::X]),
               Some(Constant::Vector(vec![ScalarConstant::Float(3.0), ScalarConstant::Float(1.0)])));
}
