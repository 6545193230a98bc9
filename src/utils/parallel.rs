//! Abstraction layer for parallel iteration.
//!
//! With the `parallel` feature the module re-exports Rayon's iterator traits. Without it,
//! serial shims expose the same `into_par_iter()` / `par_iter()` entry points over plain
//! iterators, so per-cell bond detection and per-entry row computation are written once.

#[cfg(feature = "parallel")]
pub use rayon::prelude::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};

#[cfg(not(feature = "parallel"))]
pub use self::serial::*;

#[cfg(not(feature = "parallel"))]
mod serial {
    pub use std::iter::Iterator as ParallelIterator;

    /// Serial stand-in for `rayon::iter::IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Item;
        type Iter: Iterator<Item = Self::Item>;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Item = I::Item;
        type Iter = I::IntoIter;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }

    /// Serial stand-in for `rayon::iter::IntoParallelRefIterator`.
    pub trait IntoParallelRefIterator<'data> {
        type Item;
        type Iter: Iterator<Item = Self::Item>;
        fn par_iter(&'data self) -> Self::Iter;
    }

    impl<'data, I: 'data + ?Sized> IntoParallelRefIterator<'data> for I
    where
        &'data I: IntoIterator,
    {
        type Item = <&'data I as IntoIterator>::Item;
        type Iter = <&'data I as IntoIterator>::IntoIter;
        fn par_iter(&'data self) -> Self::Iter {
            self.into_iter()
        }
    }
}
