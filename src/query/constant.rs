use std::cmp::Ordering;
use std::fmt;

/// A literal value that flows through predicates and projected output: an
/// integer, a float, or a string.
///
/// `Int` and `Float` compare by coercing through `f64`. Any other pairing
/// (including `Str` against a number) is incomparable and `partial_cmp`
/// returns `None` — there is no cross-type total order here.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i32),
    Float(f32),
    Str(String),
}

impl Constant {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Constant::Int(val) => Some(*val),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Constant::Float(val) => Some(*val),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Str(val) => Some(val),
            _ => None,
        }
    }
}

impl PartialOrd for Constant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Constant::Int(a), Constant::Int(b)) => a.partial_cmp(b),
            (Constant::Str(a), Constant::Str(b)) => a.partial_cmp(b),
            (Constant::Float(a), Constant::Float(b)) => a.partial_cmp(b),
            (Constant::Int(a), Constant::Float(b)) => (*a as f64).partial_cmp(&(*b as f64)),
            (Constant::Float(a), Constant::Int(b)) => (*a as f64).partial_cmp(&(*b as f64)),
            _ => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(val) => write!(f, "{}", val),
            Constant::Float(val) => write!(f, "{}", val),
            Constant::Str(val) => write!(f, "{}", val),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Constant;

    #[test]
    fn int_and_float_compare_through_f64_coercion() {
        assert!(Constant::Int(3) < Constant::Float(3.5));
        assert!(Constant::Float(3.5) > Constant::Int(3));
        assert_eq!(
            Constant::Int(4).partial_cmp(&Constant::Float(4.0)),
            Some(std::cmp::Ordering::Equal)
        );
    }

    #[test]
    fn strings_and_numbers_are_incomparable() {
        assert_eq!(Constant::Int(1).partial_cmp(&Constant::Str("1".into())), None);
    }
}
