//! Content hashing for Cairn.
//!
//! Provides domain-separated BLAKE3 hashing. Structure elements and commits
//! hash under different domains so that a commit record can never collide
//! with an element carrying the same bytes.

pub mod hasher;

pub use hasher::{ContentHasher, HasherError};
