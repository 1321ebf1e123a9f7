//! Town boundary generation.
//!
//! Each town is built independently into a [`TownResult`]; the run collects
//! them into a [`RunReport`] and writes one FeatureCollection at the end.
//! Per-file and per-town failures are recorded on the result instead of
//! aborting, so the only fatal error is a missing towns directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use geo::Polygon;
use geojson::FeatureCollection;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::config::BoundaryConfig;
use crate::discovery::{classify_files, discover_towns};
use crate::error::{FileError, Result, SkipReason};
use crate::geometry::{dissolve, feature_polygons};
use crate::models::{Town, TownBoundary};
use crate::output::write_json;

#[derive(Debug, Clone)]
pub enum TownOutcome {
    Built(TownBoundary),
    Skipped(SkipReason),
}

/// A file that failed to read or parse, with the error message
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Everything learned while building one town
#[derive(Debug, Clone)]
pub struct TownResult {
    pub town_id: String,
    pub has_noise_data: bool,
    pub noise_files: usize,
    pub no_data_files: usize,
    pub file_failures: Vec<FileFailure>,
    /// Normalized polygons fed into the dissolve
    pub polygons: usize,
    pub outcome: TownOutcome,
}

impl TownResult {
    fn skipped(town: &Town, reason: SkipReason) -> Self {
        Self {
            town_id: town.id.clone(),
            has_noise_data: false,
            noise_files: 0,
            no_data_files: 0,
            file_failures: Vec::new(),
            polygons: 0,
            outcome: TownOutcome::Skipped(reason),
        }
    }

    pub fn boundary(&self) -> Option<&TownBoundary> {
        match &self.outcome {
            TownOutcome::Built(b) => Some(b),
            TownOutcome::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.outcome {
            TownOutcome::Built(_) => None,
            TownOutcome::Skipped(r) => Some(r),
        }
    }
}

/// Aggregated outcome of a full run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub towns: Vec<TownResult>,
}

impl RunReport {
    pub fn towns_found(&self) -> usize {
        self.towns.len()
    }

    pub fn boundaries(&self) -> impl Iterator<Item = &TownBoundary> {
        self.towns.iter().filter_map(TownResult::boundary)
    }

    pub fn built(&self) -> usize {
        self.boundaries().count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.towns
            .iter()
            .filter_map(|t| t.skip_reason().map(|r| (t.town_id.as_str(), r)))
    }

    pub fn files_failed(&self) -> usize {
        self.towns.iter().map(|t| t.file_failures.len()).sum()
    }

    pub fn feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.boundaries().map(TownBoundary::to_feature).collect(),
            foreign_members: None,
        }
    }
}

/// Read one GeoJSON file and normalize every usable feature in it.
///
/// A file without a `features` array contributes nothing; features without
/// usable geometry are dropped silently.
pub fn read_file_polygons(
    path: &Path,
    point_margin: f64,
) -> std::result::Result<Vec<Polygon<f64>>, FileError> {
    let file = File::open(path)?;
    let doc: JsonValue = serde_json::from_reader(BufReader::new(file))?;

    let features = match doc {
        JsonValue::Object(mut obj) => match obj.remove("features") {
            Some(JsonValue::Array(features)) => features,
            _ => return Ok(Vec::new()),
        },
        _ => return Ok(Vec::new()),
    };

    Ok(features
        .into_iter()
        .flat_map(|f| feature_polygons(f, point_margin))
        .collect())
}

pub struct BoundaryBuilder {
    config: BoundaryConfig,
}

impl BoundaryBuilder {
    pub fn new(config: BoundaryConfig) -> Self {
        Self { config }
    }

    /// Build the outline for a single town. Never fails; problems end up in
    /// the returned result.
    pub fn build_town(&self, town: &Town) -> TownResult {
        let files = match classify_files(&town.dir, &self.config.extension, &self.config.no_data_prefix)
        {
            Ok(f) => f,
            Err(e) => return TownResult::skipped(town, SkipReason::Unreadable(e.to_string())),
        };

        if files.is_empty() {
            return TownResult::skipped(town, SkipReason::NoGeojsonFiles);
        }

        let mut result = TownResult {
            town_id: town.id.clone(),
            has_noise_data: files.has_noise_data(),
            noise_files: files.noise.len(),
            no_data_files: files.no_data.len(),
            file_failures: Vec::new(),
            polygons: 0,
            outcome: TownOutcome::Skipped(SkipReason::NoValidPolygons),
        };

        let mut polygons = Vec::new();
        for path in files.selected() {
            match read_file_polygons(path, self.config.point_margin) {
                Ok(found) => {
                    debug!("{}: {} polygons", path.display(), found.len());
                    polygons.extend(found);
                }
                Err(e) => result.file_failures.push(FileFailure {
                    path: path.clone(),
                    message: e.to_string(),
                }),
            }
        }
        result.polygons = polygons.len();

        if polygons.is_empty() {
            return result;
        }

        result.outcome = match dissolve(
            &polygons,
            self.config.buffer_margin,
            self.config.simplify_tolerance,
        ) {
            Ok(geometry) => TownOutcome::Built(TownBoundary {
                town_id: town.id.clone(),
                name: town.display_name().to_string(),
                has_noise_data: result.has_noise_data,
                geometry,
            }),
            Err(e) => TownOutcome::Skipped(SkipReason::Dissolve(e)),
        };

        result
    }

    /// Build every town, in order. With `parallel` set the towns are spread
    /// over the rayon pool; the returned order is the same either way.
    pub fn build_towns(&self, towns: &[Town], progress: &ProgressBar) -> Vec<TownResult> {
        if !self.config.parallel {
            return towns
                .iter()
                .map(|town| {
                    info!("Processing town {}", town.id);
                    let result = self.build_town(town);
                    log_town_result(&result);
                    progress.inc(1);
                    result
                })
                .collect();
        }

        let results: Vec<TownResult> = towns
            .par_iter()
            .map(|town| {
                let result = self.build_town(town);
                progress.inc(1);
                result
            })
            .collect();

        // Logged once all towns are done so the output order is stable
        for result in &results {
            info!("Processing town {}", result.town_id);
            log_town_result(result);
        }

        results
    }

    /// Discover, build and write. Fails only if the towns directory is
    /// missing or the output cannot be written; an empty collection is
    /// still a valid output.
    pub fn run(&self, data_root: &Path, output: &Path, progress: &ProgressBar) -> Result<RunReport> {
        info!("Generating town boundaries from {}", data_root.display());

        let towns = discover_towns(data_root)?;
        info!("Found {} town directories", towns.len());

        progress.set_length(towns.len() as u64);
        let report = RunReport {
            towns: self.build_towns(&towns, progress),
        };
        progress.finish_and_clear();

        write_json(output, &report.feature_collection())?;

        info!("Town boundaries saved to {}", output.display());
        info!(
            "Generated {} town boundaries ({} towns skipped, {} files failed)",
            report.built(),
            report.towns_found() - report.built(),
            report.files_failed()
        );

        Ok(report)
    }
}

fn log_town_result(result: &TownResult) {
    if result.noise_files + result.no_data_files > 0 {
        info!(
            "Town {}: Has noise data: {}, Noise files: {}, No_Data files: {}",
            result.town_id, result.has_noise_data, result.noise_files, result.no_data_files
        );
    }

    for failure in &result.file_failures {
        error!(
            "Error processing file {}: {}",
            failure.path.display(),
            failure.message
        );
    }

    match &result.outcome {
        TownOutcome::Built(boundary) => info!(
            "Added boundary for town {} ({} polygons, {} parts)",
            result.town_id,
            result.polygons,
            boundary.geometry.0.len()
        ),
        TownOutcome::Skipped(reason @ SkipReason::Dissolve(_)) => {
            error!("Town {}: {}", result.town_id, reason)
        }
        TownOutcome::Skipped(reason) => warn!("Town {}: {}", result.town_id, reason),
    }
}
