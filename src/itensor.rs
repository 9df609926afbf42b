/*!

Labeled, arbitrary rank tensors ([`ITensor`]s) whose legs are named [`Index`] objects instead of positions.

Two tensors can be added whenever they carry the same set of indices, in whatever order each of them stores them,
and any two tensors can be contracted: indices they share are summed over, all others propagate to the result.

The engine underneath is small:
- [`matching`] computes the permutation that aligns two equal index sets, optionally mapping values as it goes,
- [`contraction`] classifies the indices of two operands into common, left-only and right-only groups and lays out the result,
- [`invoke`] hands tensor elements of a real or complex storage to user functions that may only accept one of the two,
  turning a missing call form into an [`InvokeError`] instead of a type error.

Data lives in a dense [`Storage`], either real or complex. Everything else (arithmetic, element access, random tensors)
is built on top of those three pieces.

[`ITensor`]: tensors::ITensor
[`Index`]: structure::index::Index
[`InvokeError`]: invoke::InvokeError
[`Storage`]: tensors::storage::Storage
*/

/// Indices, index values and index sets
pub mod structure;

/// Permutations of positions
pub mod permutation;

/// Order independent matching of index sets
pub mod matching;

/// Contraction planning and the dense contraction kernel
pub mod contraction;

/// Capability checked invocation of user supplied element functions
pub mod invoke;

/// Tensors with data
pub mod tensors;

/// Adding, subtracting, scalar multiplication of tensors
pub mod arithmetic;

/// Explicitly seeded random number generation and random tensors
pub mod random;

#[cfg(test)]
mod tests;
