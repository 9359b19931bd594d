use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Variance {
    Covariant,
    Contravariant,
    Invariant,
}

impl Default for Variance {
    fn default() -> Variance {
        Variance::Invariant
    }
}

impl Variance {
    pub fn invert(self) -> Variance {
        match self {
            Variance::Contravariant => Variance::Covariant,
            Variance::Covariant => Variance::Contravariant,
            _ => self,
        }
    }

    /// Prefix used when rendering a type variable, following the `+T`/`-T`/`~T` convention.
    pub fn sigil(self) -> char {
        match self {
            Variance::Covariant => '+',
            Variance::Contravariant => '-',
            Variance::Invariant => '~',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert() {
        assert_eq!(Variance::Covariant.invert(), Variance::Contravariant);
        assert_eq!(Variance::Contravariant.invert(), Variance::Covariant);
        assert_eq!(Variance::Invariant.invert(), Variance::Invariant);
        assert_eq!(Variance::default(), Variance::Invariant);
    }
}
