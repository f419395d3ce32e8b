//! Detection across several videos at once.
//!
//! Each worker opens its own [`VideoSource`], so no decoder state is shared
//! between threads. Available when the `rayon` feature is enabled.

use std::path::PathBuf;

use ::rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    configuration::DetectionOptions, detection::Detection, error::RallyError,
    source::VideoSource,
};

/// Detect rallies in every video of `paths`, in parallel.
///
/// Results come back in the order of `paths`. A failure on one video does
/// not affect the others.
pub fn detect_rallies_parallel<I, P>(
    paths: I,
    options: &DetectionOptions,
) -> Vec<Result<Detection, RallyError>>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
    log::debug!("Detecting rallies in {} videos in parallel", paths.len());

    paths
        .into_par_iter()
        .map(|path| VideoSource::open(&path)?.detect_rallies(options))
        .collect()
}
