//! Parsing many documents against one shared profile.

use rayon::prelude::*;

use super::event::EventSource;
use super::options::ParseOptions;
use super::parse::Parser;
use crate::model::{ExtensionKind, ExtensionProfile, ModelError};

/// Parse independent documents in parallel.
///
/// Each document is owned by one worker; the profile is only read. Results
/// come back in input order, one per source.
pub fn parse_many<T, S>(
    profile: &ExtensionProfile,
    sources: Vec<S>,
    options: &ParseOptions,
) -> Vec<Result<T, ModelError>>
where
    T: ExtensionKind,
    S: EventSource + Send,
{
    sources
        .into_par_iter()
        .map(|source| Parser::with_options(profile, options.clone()).parse::<T>(source))
        .collect()
}
