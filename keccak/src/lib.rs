//! The Keccak-f[b] permutations: their geometry, the lane/slice view of the state,
//! and a straightforward reference implementation of the round function.
//!
//! This crate is what the code generator and the Keccak-f\[25\] lookup table consume.
//! Fast implementations are what `kt-codegen` produces.

#![no_std]

extern crate alloc;

mod geometry;
mod reference;
mod state;

pub use geometry::*;
pub use reference::*;
pub use state::*;

/// A permutation in the mathematical sense, applied in place.
pub trait Permutation<T: Clone>: Clone {
    fn permute_mut(&self, input: &mut T);

    fn permute(&self, mut input: T) -> T {
        self.permute_mut(&mut input);
        input
    }
}
