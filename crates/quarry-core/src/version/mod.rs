//! Version selectors and latest-version selection.

mod matcher;

pub use matcher::{
    DefaultVersionMatcher, LatestStrategy, SemverLatestStrategy, VersionConstraint,
    VersionMatcher,
};
