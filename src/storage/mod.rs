//! Persisted run state. The only state kept between runs is the [`SeenSet`].

mod seen;

pub use seen::{SeenSet, SeenSetError};
