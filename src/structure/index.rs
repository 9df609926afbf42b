use std::fmt::{Debug, Display};

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A concrete value of an index, counting from zero.
pub type ConcreteIndex = usize;

/// The kind of leg an [`Index`] represents.
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    Serialize,
    Deserialize,
)]
pub enum IndexType {
    /// Internal bond between tensors of a network
    #[default]
    #[display(fmt = "Link")]
    Link,
    /// Physical degree of freedom
    #[display(fmt = "Site")]
    Site,
}

/// A named, dimensioned tensor leg.
///
/// Two indices are the same leg iff they agree on name, dimension, type and prime level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Index {
    name: String,
    dim: usize,
    index_type: IndexType,
    prime_level: u32,
}

impl Index {
    /// A [`IndexType::Link`] index with prime level zero.
    pub fn new(name: impl Into<String>, dim: usize) -> Self {
        Index {
            name: name.into(),
            dim,
            index_type: IndexType::Link,
            prime_level: 0,
        }
    }

    pub fn site(name: impl Into<String>, dim: usize) -> Self {
        Index::new(name, dim).with_type(IndexType::Site)
    }

    #[must_use]
    pub fn with_type(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn prime_level(&self) -> u32 {
        self.prime_level
    }

    /// Same leg, prime level raised by one.
    #[must_use]
    pub fn prime(&self) -> Self {
        self.primed(1)
    }

    /// Same leg, prime level raised by `inc`.
    #[must_use]
    pub fn primed(&self, inc: u32) -> Self {
        self.with_prime_level(self.prime_level + inc)
    }

    #[must_use]
    pub fn noprime(&self) -> Self {
        self.with_prime_level(0)
    }

    #[must_use]
    pub fn with_prime_level(&self, prime_level: u32) -> Self {
        Index {
            prime_level,
            ..self.clone()
        }
    }

    /// Fixes this index to the value `val`.
    ///
    /// No bounds check happens here, tensor element access verifies `val < dim`.
    pub fn at(&self, val: ConcreteIndex) -> IndexVal {
        IndexVal {
            index: self.clone(),
            val,
        }
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        for _ in 0..self.prime_level {
            write!(f, "'")?;
        }
        write!(f, "({})", self.dim)
    }
}

/// An [`Index`] fixed to one of its values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexVal {
    pub index: Index,
    pub val: ConcreteIndex,
}

impl PartialEq<Index> for IndexVal {
    fn eq(&self, other: &Index) -> bool {
        &self.index == other
    }
}

impl Display for IndexVal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.index, self.val)
    }
}
