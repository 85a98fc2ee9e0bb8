//! Graph rewrite passes.

mod fuse_cast_into_initializer;

pub use fuse_cast_into_initializer::{FuseCastDecline, FuseCastIntoInitializer};
