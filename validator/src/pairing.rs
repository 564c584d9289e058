//! Pairing strategies: which synthetic image is scored against which reference.

use crate::corpus::ImageCorpus;
use crate::error::{Result, ValidationError};
use crate::report::{SimilarityRecord, SimilarityTable};
use crate::ssim::{score, GrayscaleMode, SsimParams};
use clap::ValueEnum;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How synthetic and reference images are matched up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum PairingStrategy {
    /// Image `i` against image `i`; both corpora must be the same size
    #[default]
    Standard,
    /// Each synthetic image against every reference, keeping the highest score
    BestMatch,
}

impl PairingStrategy {
    /// File name of the score table this strategy writes
    pub fn table_file(self) -> &'static str {
        match self {
            PairingStrategy::Standard => "ssims.csv",
            PairingStrategy::BestMatch => "ssims_best_match.csv",
        }
    }

    /// Number of progress ticks [`PairingStrategy::run`] will emit
    pub fn work(self, synthetic: &ImageCorpus, reference: &ImageCorpus) -> usize {
        match self {
            PairingStrategy::Standard => synthetic.len(),
            PairingStrategy::BestMatch => synthetic.len() * reference.len(),
        }
    }

    /// Check corpus sizes before any image is decoded
    pub fn check_sizes(self, synthetic: usize, reference: usize) -> Result<()> {
        if self == PairingStrategy::Standard && synthetic != reference {
            return Err(ValidationError::CorpusLengthMismatch {
                synthetic,
                reference,
            });
        }
        Ok(())
    }

    /// Score the corpora; `on_score` is called once per scorer invocation
    pub fn run<F>(
        self,
        synthetic: &ImageCorpus,
        reference: &ImageCorpus,
        mode: GrayscaleMode,
        params: &SsimParams,
        on_score: F,
    ) -> Result<SimilarityTable>
    where
        F: Fn() + Sync,
    {
        params.validate()?;
        info!(
            "Scoring {} synthetic against {} reference image(s) ({:?}, grayscale {:?})",
            synthetic.len(),
            reference.len(),
            self,
            mode
        );
        match self {
            PairingStrategy::Standard => standard(synthetic, reference, mode, params, on_score),
            PairingStrategy::BestMatch => best_match(synthetic, reference, mode, params, on_score),
        }
    }
}

fn score_pair(
    synthetic: &ImageCorpus,
    i: usize,
    reference: &ImageCorpus,
    j: usize,
    mode: GrayscaleMode,
    params: &SsimParams,
) -> Result<f64> {
    let (synth_name, ref_name) = (&synthetic.names()[i], &reference.names()[j]);
    score(
        &synthetic.images()[i].view(),
        &reference.images()[j].view(),
        mode,
        params,
    )
    .map_err(|source| ValidationError::Pair {
        synthetic: synth_name.clone(),
        reference: ref_name.clone(),
        source: Box::new(source),
    })
}

/// Score aligned pairs; the corpora must have equal length
pub fn standard<F: Fn()>(
    synthetic: &ImageCorpus,
    reference: &ImageCorpus,
    mode: GrayscaleMode,
    params: &SsimParams,
    on_score: F,
) -> Result<SimilarityTable> {
    PairingStrategy::Standard.check_sizes(synthetic.len(), reference.len())?;

    let mut table = SimilarityTable::with_capacity(synthetic.len());
    for i in 0..synthetic.len() {
        let ssim = score_pair(synthetic, i, reference, i, mode, params)?;
        on_score();
        table.push(SimilarityRecord {
            synthetic: synthetic.names()[i].clone(),
            reference: reference.names()[i].clone(),
            reference_index: Some(i),
            ssim,
        });
    }
    Ok(table)
}

/// Exhaustive search for each synthetic image's highest-scoring reference.
///
/// Synthetic images are processed in parallel; the table is still in
/// synthetic order. Ties keep the lowest reference index.
pub fn best_match<F: Fn() + Sync>(
    synthetic: &ImageCorpus,
    reference: &ImageCorpus,
    mode: GrayscaleMode,
    params: &SsimParams,
    on_score: F,
) -> Result<SimilarityTable> {
    if reference.is_empty() {
        return Err(ValidationError::EmptyCorpus {
            dir: reference.dir().to_path_buf(),
        });
    }

    let records = (0..synthetic.len())
        .into_par_iter()
        .map(|i| -> Result<SimilarityRecord> {
            let mut best: Option<(usize, f64)> = None;
            for j in 0..reference.len() {
                let ssim = score_pair(synthetic, i, reference, j, mode, params)?;
                on_score();
                if best.map_or(true, |(_, top)| ssim > top) {
                    best = Some((j, ssim));
                }
            }
            let (j, ssim) = best.ok_or_else(|| ValidationError::EmptyCorpus {
                dir: reference.dir().to_path_buf(),
            })?;
            debug!(
                "{} best matches {} (SSIM {ssim:.4})",
                synthetic.names()[i],
                reference.names()[j]
            );
            Ok(SimilarityRecord {
                synthetic: synthetic.names()[i].clone(),
                reference: reference.names()[j].clone(),
                reference_index: Some(j),
                ssim,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SimilarityTable::from(records))
}
