//! Lightweight noise layer: a random sample of each town's noise-band
//! features, tagged with their level and town.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::config::{SamplerConfig, DIRECTORY_MAP_FILE};
use crate::discovery::list_towns;
use crate::error::{BoundaryError, FileError, Result};
use crate::models::{noise_level, FileKind};
use crate::output::write_json;

/// town_id -> file names, as stored in `directory_map.json`
pub type DirectoryMap = BTreeMap<String, Vec<String>>;

/// Counters accumulated over a sampling run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleStats {
    pub processed_towns: usize,
    pub towns_with_features: usize,
    pub total_features_added: usize,
    pub missing_files: usize,
    pub error_files: usize,
    pub noise_levels: BTreeSet<String>,
    /// Towns listed in the directory map with no folder on disk
    pub missing_town_folders: Vec<String>,
    pub snapshots: Vec<PathBuf>,
}

#[derive(Serialize)]
struct FeatureCollectionRef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: &'a [JsonValue],
}

impl<'a> FeatureCollectionRef<'a> {
    fn new(features: &'a [JsonValue]) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }
}

pub fn load_directory_map(noise_dir: &Path) -> Result<DirectoryMap> {
    let path = noise_dir.join(DIRECTORY_MAP_FILE);
    let map_err = |reason: String| BoundaryError::DirectoryMap {
        path: path.clone(),
        reason,
    };

    let file = File::open(&path).map_err(|e| map_err(e.to_string()))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| map_err(e.to_string()))
}

/// Snapshot path for progress after `towns` towns, next to `output`.
pub fn progress_path(output: &Path, towns: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("simplified_noise_map");
    output.with_file_name(format!("{}_progress_{}_towns.geojson", stem, towns))
}

/// True if `coords` holds at least one `[x, y, ...]` position at any depth.
fn contains_position(coords: &JsonValue) -> bool {
    match coords {
        JsonValue::Array(items) => {
            (items.len() >= 2 && items.iter().all(JsonValue::is_number))
                || items.iter().any(contains_position)
        }
        _ => false,
    }
}

fn has_usable_geometry(feature: &JsonValue) -> bool {
    feature
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .is_some_and(contains_position)
}

/// Add `noiseLevel` and `townId`, creating the properties object if needed.
fn tag_feature(feature: &mut JsonValue, level: &str, town_id: &str) -> bool {
    let Some(obj) = feature.as_object_mut() else {
        return false;
    };
    let props = obj
        .entry("properties")
        .or_insert_with(|| JsonValue::Object(Default::default()));
    if !props.is_object() {
        *props = JsonValue::Object(Default::default());
    }
    if let Some(props) = props.as_object_mut() {
        props.insert("noiseLevel".to_string(), JsonValue::from(level));
        props.insert("townId".to_string(), JsonValue::from(town_id));
    }
    true
}

pub struct Sampler<R: Rng> {
    config: SamplerConfig,
    no_data_prefix: String,
    rng: R,
}

impl Sampler<StdRng> {
    /// Seeded from `config.seed` when set, otherwise from OS entropy.
    pub fn from_config(config: SamplerConfig, no_data_prefix: impl Into<String>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, no_data_prefix, rng)
    }
}

impl<R: Rng> Sampler<R> {
    pub fn new(config: SamplerConfig, no_data_prefix: impl Into<String>, rng: R) -> Self {
        Self {
            config,
            no_data_prefix: no_data_prefix.into(),
            rng,
        }
    }

    /// Pick up to `per_file` features from one noise file.
    fn sample_file(&mut self, path: &Path) -> std::result::Result<Vec<JsonValue>, FileError> {
        let file = File::open(path)?;
        let doc: JsonValue = serde_json::from_reader(BufReader::new(file))?;

        let Some(features) = doc.get("features").and_then(JsonValue::as_array) else {
            return Ok(Vec::new());
        };

        if features.len() <= self.config.per_file {
            return Ok(features.clone());
        }

        Ok(features
            .choose_multiple(&mut self.rng, self.config.per_file)
            .cloned()
            .collect())
    }

    pub fn run(
        &mut self,
        noise_dir: &Path,
        output: &Path,
        progress: &ProgressBar,
    ) -> Result<SampleStats> {
        if !noise_dir.is_dir() {
            return Err(BoundaryError::MissingRoot {
                path: noise_dir.to_path_buf(),
            });
        }

        info!(
            "Looking for {} in: {}",
            DIRECTORY_MAP_FILE,
            noise_dir.display()
        );
        let directory_map = load_directory_map(noise_dir)?;
        info!("Processing {} towns...", directory_map.len());

        let on_disk: HashSet<String> = list_towns(noise_dir)?.into_iter().map(|t| t.id).collect();
        info!("Found {} town folders in noise directory", on_disk.len());

        let mut stats = SampleStats {
            missing_town_folders: directory_map
                .keys()
                .filter(|id| !on_disk.contains(id.as_str()))
                .cloned()
                .collect(),
            ..Default::default()
        };
        if !stats.missing_town_folders.is_empty() {
            let preview: Vec<_> = stats.missing_town_folders.iter().take(10).cloned().collect();
            warn!(
                "{} towns in {} don't exist on disk: {}",
                stats.missing_town_folders.len(),
                DIRECTORY_MAP_FILE,
                preview.join(", ")
            );
        }

        progress.set_length(directory_map.len() as u64);
        let mut features: Vec<JsonValue> = Vec::new();

        for (i, (town_id, file_names)) in directory_map.iter().enumerate() {
            let mut town_has_features = false;

            for file_name in file_names {
                if FileKind::classify(file_name, &self.no_data_prefix) == FileKind::NoData {
                    continue;
                }

                let level = noise_level(file_name);
                let path = noise_dir.join(town_id).join(file_name);

                if !path.exists() {
                    warn!("File not found: {}", path.display());
                    stats.missing_files += 1;
                    continue;
                }

                let sampled = match self.sample_file(&path) {
                    Ok(s) => s,
                    Err(e) => {
                        error!("Error processing {} for town {}: {}", file_name, town_id, e);
                        stats.error_files += 1;
                        continue;
                    }
                };

                let mut added = 0;
                for mut feature in sampled {
                    if !has_usable_geometry(&feature) || !tag_feature(&mut feature, level, town_id)
                    {
                        continue;
                    }
                    features.push(feature);
                    added += 1;
                }

                if added > 0 {
                    town_has_features = true;
                    stats.total_features_added += added;
                    stats.noise_levels.insert(level.to_string());
                }
                debug!("Added {} features for {} - {}", added, town_id, level);
            }

            if town_has_features {
                stats.towns_with_features += 1;
            }
            stats.processed_towns += 1;
            progress.inc(1);

            let every = self.config.progress_every;
            if every > 0 && i > 0 && i % every == 0 {
                let snapshot = progress_path(output, i);
                write_json(&snapshot, &FeatureCollectionRef::new(&features))?;
                info!(
                    "Saved progress with {} features after processing {} towns",
                    features.len(),
                    i
                );
                stats.snapshots.push(snapshot);
            }
        }
        progress.finish_and_clear();

        write_json(output, &FeatureCollectionRef::new(&features))?;

        info!(
            "Created simplified noise map at {} with {} features",
            output.display(),
            features.len()
        );
        info!(
            "Processed {} towns, {} towns with features, {} total features added",
            stats.processed_towns, stats.towns_with_features, stats.total_features_added
        );
        info!(
            "Missing files: {}, Error files: {}",
            stats.missing_files, stats.error_files
        );
        let levels: Vec<&str> = stats.noise_levels.iter().map(String::as_str).collect();
        info!("Noise levels found: {}", levels.join(", "));

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn collection(n: usize) -> JsonValue {
        let features: Vec<_> = (0..n)
            .map(|i| {
                json!({
                    "type": "Feature",
                    "properties": {"PARCEL": i},
                    "geometry": {"type": "Point", "coordinates": [i as f64, 1.5]}
                })
            })
            .collect();
        json!({"type": "FeatureCollection", "features": features})
    }

    fn setup(root: &Path, map: JsonValue, files: &[(&str, &str, JsonValue)]) {
        fs::create_dir_all(root).unwrap();
        fs::write(root.join(DIRECTORY_MAP_FILE), map.to_string()).unwrap();
        for (town, name, body) in files {
            let dir = root.join(town);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(name), body.to_string()).unwrap();
        }
    }

    fn sampler(per_file: usize, progress_every: usize) -> Sampler<StdRng> {
        Sampler::new(
            SamplerConfig {
                per_file,
                progress_every,
                seed: None,
            },
            "No_Data",
            StdRng::seed_from_u64(42),
        )
    }

    fn read(path: &Path) -> JsonValue {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_samples_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        let noise_dir = dir.path().join("noise_by_town");
        setup(
            &noise_dir,
            json!({
                "Concord-1": ["Red.geojson", "Orange.geojson", "No_Data.geojson", "Gone.geojson"],
                "Ghost-2": ["Red.geojson"]
            }),
            &[
                ("Concord-1", "Red.geojson", collection(25)),
                ("Concord-1", "Orange.geojson", collection(3)),
                ("Concord-1", "No_Data.geojson", collection(5)),
            ],
        );
        let output = dir.path().join("out/simplified_noise_map.geojson");

        let stats = sampler(10, 0)
            .run(&noise_dir, &output, &ProgressBar::hidden())
            .unwrap();

        assert_eq!(stats.processed_towns, 2);
        assert_eq!(stats.towns_with_features, 1);
        assert_eq!(stats.total_features_added, 13);
        assert_eq!(stats.missing_files, 2);
        assert_eq!(stats.error_files, 0);
        assert_eq!(stats.missing_town_folders, vec!["Ghost-2".to_string()]);
        assert_eq!(
            stats.noise_levels.iter().cloned().collect::<Vec<_>>(),
            vec!["Orange".to_string(), "Red".to_string()]
        );

        let written = read(&output);
        let features = written["features"].as_array().unwrap();
        assert_eq!(features.len(), 13);
        for feature in features {
            assert_eq!(feature["properties"]["townId"], "Concord-1");
            assert!(feature["properties"]["PARCEL"].is_number());
            assert_ne!(feature["properties"]["noiseLevel"], "No_Data");
        }
    }

    #[test]
    fn test_bad_file_counted_and_unusable_features_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let noise_dir = dir.path().join("noise_by_town");
        setup(
            &noise_dir,
            json!({"Acton-1": ["Bad.geojson", "Red.geojson"]}),
            &[(
                "Acton-1",
                "Red.geojson",
                json!({"type": "FeatureCollection", "features": [
                    {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[]]}},
                    {"type": "Feature", "geometry": null},
                    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}}
                ]}),
            )],
        );
        fs::write(noise_dir.join("Acton-1/Bad.geojson"), "{ nope").unwrap();
        let output = dir.path().join("sample.geojson");

        let stats = sampler(10, 0)
            .run(&noise_dir, &output, &ProgressBar::hidden())
            .unwrap();

        assert_eq!(stats.error_files, 1);
        assert_eq!(stats.total_features_added, 1);

        let written = read(&output);
        let feature = &written["features"][0];
        assert_eq!(feature["properties"]["noiseLevel"], "Red");
        assert_eq!(feature["properties"]["townId"], "Acton-1");
    }

    #[test]
    fn test_progress_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let noise_dir = dir.path().join("noise_by_town");
        let towns: Vec<String> = (0..5).map(|i| format!("T{}", i)).collect();
        let map: serde_json::Map<_, _> = towns
            .iter()
            .map(|t| (t.clone(), json!(["Red.geojson"])))
            .collect();
        let files: Vec<_> = towns
            .iter()
            .map(|t| (t.as_str(), "Red.geojson", collection(1)))
            .collect();
        setup(&noise_dir, JsonValue::Object(map), &files);
        let output = dir.path().join("simplified_noise_map.geojson");

        let stats = sampler(10, 2)
            .run(&noise_dir, &output, &ProgressBar::hidden())
            .unwrap();

        assert_eq!(
            stats.snapshots,
            vec![progress_path(&output, 2), progress_path(&output, 4)]
        );
        // Snapshot after index 2 holds towns 0..=2
        assert_eq!(read(&stats.snapshots[0])["features"].as_array().unwrap().len(), 3);
        assert_eq!(read(&output)["features"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_progress_path() {
        assert_eq!(
            progress_path(Path::new("static/data/parcels/simplified_noise_map.geojson"), 20),
            PathBuf::from("static/data/parcels/simplified_noise_map_progress_20_towns.geojson")
        );
    }

    #[test]
    fn test_contains_position() {
        assert!(contains_position(&json!([1.0, 2.0])));
        assert!(contains_position(&json!([[[0.0, 0.0], [1.0, 1.0]]])));
        assert!(!contains_position(&json!([[]])));
        assert!(!contains_position(&json!([])));
        assert!(!contains_position(&json!([1.0])));
    }

    #[test]
    fn test_missing_directory_map() {
        let dir = tempfile::tempdir().unwrap();
        let err = sampler(10, 0)
            .run(dir.path(), &dir.path().join("out.geojson"), &ProgressBar::hidden())
            .unwrap_err();
        assert!(matches!(err, BoundaryError::DirectoryMap { .. }));
    }
}
