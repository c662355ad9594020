use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::ops::{Add, BitAnd, BitOr, Div, Mul, Not, Rem, Sub};

use num_traits::Zero;

/// A value that may be missing (NA, Not Available)
///
/// Missing data is modelled in the type system instead of with sentinel
/// values. Arithmetic on `NA<T>` propagates missingness: any operation that
/// touches `NA::NA` yields `NA::NA`.
#[derive(Clone, Copy)]
pub enum NA<T> {
    /// A known value
    Value(T),
    /// A missing value
    NA,
}

/// Three-valued logical (true / false / missing)
///
/// `&` and `|` follow Kleene logic, so a missing operand only decides the
/// result when the other side cannot.
pub type Logical = NA<bool>;

impl<T> NA<T> {
    /// Check whether the value is missing
    pub fn is_na(&self) -> bool {
        matches!(self, NA::NA)
    }

    /// Check whether a value is present
    pub fn is_value(&self) -> bool {
        !self.is_na()
    }

    /// Borrow the value, if present
    pub fn value(&self) -> Option<&T> {
        match self {
            NA::Value(v) => Some(v),
            NA::NA => None,
        }
    }

    /// Borrow the value, or `default` when missing
    pub fn value_or<'a>(&'a self, default: &'a T) -> &'a T {
        match self {
            NA::Value(v) => v,
            NA::NA => default,
        }
    }

    /// Transform the value, keeping missingness
    pub fn map<U, F>(&self, f: F) -> NA<U>
    where
        F: FnOnce(&T) -> U,
    {
        match self {
            NA::Value(v) => NA::Value(f(v)),
            NA::NA => NA::NA,
        }
    }
}

impl NA<bool> {
    /// Kleene AND: `NA & false == false`, `NA & true == NA`
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (NA::Value(false), _) | (_, NA::Value(false)) => NA::Value(false),
            (NA::Value(true), NA::Value(true)) => NA::Value(true),
            _ => NA::NA,
        }
    }

    /// Kleene OR: `NA | true == true`, `NA | false == NA`
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (NA::Value(true), _) | (_, NA::Value(true)) => NA::Value(true),
            (NA::Value(false), NA::Value(false)) => NA::Value(false),
            _ => NA::NA,
        }
    }

    /// True only when the value is known and true
    pub fn is_true(&self) -> bool {
        matches!(self, NA::Value(true))
    }
}

impl<T> From<T> for NA<T> {
    fn from(value: T) -> Self {
        NA::Value(value)
    }
}

impl<T> From<Option<T>> for NA<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => NA::Value(v),
            None => NA::NA,
        }
    }
}

impl<T> From<NA<T>> for Option<T> {
    fn from(na: NA<T>) -> Self {
        match na {
            NA::Value(v) => Some(v),
            NA::NA => None,
        }
    }
}

impl<T: Debug> Debug for NA<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NA::Value(v) => write!(f, "{:?}", v),
            NA::NA => write!(f, "NA"),
        }
    }
}

impl<T: Display> Display for NA<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NA::Value(v) => write!(f, "{}", v),
            NA::NA => write!(f, "NA"),
        }
    }
}

// Structural equality: NA == NA. This is identity, not the three-valued `==`
// the expression evaluator implements.
impl<T: PartialEq> PartialEq for NA<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NA::Value(a), NA::Value(b)) => a == b,
            (NA::NA, NA::NA) => true,
            _ => false,
        }
    }
}

impl<T: Eq> Eq for NA<T> {}

impl<T: PartialOrd> PartialOrd for NA<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (NA::Value(a), NA::Value(b)) => a.partial_cmp(b),
            (NA::NA, NA::NA) => Some(Ordering::Equal),
            // Missing values sort after every known value
            (NA::NA, _) => Some(Ordering::Greater),
            (_, NA::NA) => Some(Ordering::Less),
        }
    }
}

impl<T: Ord> Ord for NA<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NA::Value(a), NA::Value(b)) => a.cmp(b),
            (NA::NA, NA::NA) => Ordering::Equal,
            (NA::NA, _) => Ordering::Greater,
            (_, NA::NA) => Ordering::Less,
        }
    }
}

impl<T: Hash> Hash for NA<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            NA::Value(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            NA::NA => 1u8.hash(state),
        }
    }
}

impl<T: Add<Output = T>> Add for NA<T> {
    type Output = NA<T>;

    fn add(self, other: Self) -> Self::Output {
        match (self, other) {
            (NA::Value(a), NA::Value(b)) => NA::Value(a + b),
            _ => NA::NA,
        }
    }
}

impl<T: Sub<Output = T>> Sub for NA<T> {
    type Output = NA<T>;

    fn sub(self, other: Self) -> Self::Output {
        match (self, other) {
            (NA::Value(a), NA::Value(b)) => NA::Value(a - b),
            _ => NA::NA,
        }
    }
}

impl<T: Mul<Output = T>> Mul for NA<T> {
    type Output = NA<T>;

    fn mul(self, other: Self) -> Self::Output {
        match (self, other) {
            (NA::Value(a), NA::Value(b)) => NA::Value(a * b),
            _ => NA::NA,
        }
    }
}

impl<T: Div<Output = T> + Zero> Div for NA<T> {
    type Output = NA<T>;

    fn div(self, other: Self) -> Self::Output {
        match (self, other) {
            // Division by zero is missing
            (NA::Value(_), NA::Value(b)) if b.is_zero() => NA::NA,
            (NA::Value(a), NA::Value(b)) => NA::Value(a / b),
            _ => NA::NA,
        }
    }
}

impl<T: Rem<Output = T> + Zero> Rem for NA<T> {
    type Output = NA<T>;

    fn rem(self, other: Self) -> Self::Output {
        match (self, other) {
            (NA::Value(_), NA::Value(b)) if b.is_zero() => NA::NA,
            (NA::Value(a), NA::Value(b)) => NA::Value(a % b),
            _ => NA::NA,
        }
    }
}

impl<T: Not<Output = T>> Not for NA<T> {
    type Output = NA<T>;

    fn not(self) -> Self::Output {
        match self {
            NA::Value(v) => NA::Value(!v),
            NA::NA => NA::NA,
        }
    }
}

impl BitAnd for NA<bool> {
    type Output = NA<bool>;

    fn bitand(self, other: Self) -> Self::Output {
        self.and(other)
    }
}

impl BitOr for NA<bool> {
    type Output = NA<bool>;

    fn bitor(self, other: Self) -> Self::Output {
        self.or(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Logical = NA::Value(true);
    const F: Logical = NA::Value(false);
    const M: Logical = NA::NA;

    #[test]
    fn kleene_and() {
        assert_eq!(T & T, T);
        assert_eq!(T & F, F);
        assert_eq!(M & F, F);
        assert_eq!(F & M, F);
        assert_eq!(M & T, M);
        assert_eq!(M & M, M);
    }

    #[test]
    fn kleene_or() {
        assert_eq!(F | F, F);
        assert_eq!(M | T, T);
        assert_eq!(T | M, T);
        assert_eq!(M | F, M);
        assert_eq!(M | M, M);
    }

    #[test]
    fn not_keeps_missing() {
        assert_eq!(!T, F);
        assert_eq!(!F, T);
        assert_eq!(!M, M);
    }

    #[test]
    fn arithmetic_propagates_missing() {
        let a: NA<f64> = NA::Value(6.0);
        let b: NA<f64> = NA::Value(3.0);
        assert_eq!(a + b, NA::Value(9.0));
        assert_eq!(a / b, NA::Value(2.0));
        assert_eq!(a + NA::NA, NA::NA);
        assert_eq!(a / NA::Value(0.0), NA::NA);
        assert_eq!(NA::Value(7i64) % NA::Value(0i64), NA::NA);
    }

    #[test]
    fn missing_sorts_last() {
        let mut values = vec![NA::NA, NA::Value(2), NA::Value(1)];
        values.sort();
        assert_eq!(values, vec![NA::Value(1), NA::Value(2), NA::NA]);
    }
}
