//! Core collections: non-owning views, fixed and paged lists, dense bitset.

mod bitmap;
mod checked;
mod fixed;
mod paged;

#[cfg(test)]
mod checked_tests;
#[cfg(test)]
mod paged_tests;

pub use bitmap::{LongBoolMap, SetBits};
pub use checked::CheckedArray;
pub use fixed::FixedPodList;
pub use paged::PagedList;
