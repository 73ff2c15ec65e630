//! Dataset Loader: fetch a point catalogue or fall back to a synthetic one.
//!
//! [`try_fetch`] reports every failure as a [`DataError`]. [`load`] is the
//! production path: it never fails, it logs the error and substitutes the
//! seeded synthetic catalogue, so a visualiser always has points to draw.

use crate::error::DataError;
use crate::record::{resolve_all, PointRecord, ResolvedPoint};
use crate::synth::{self, SyntheticKind};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use walkdir::WalkDir;

pub const DEFAULT_SYNTHETIC_COUNT: usize = 50_000;
pub const DEFAULT_SEED: u64 = 0x57a2_c0de;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a catalogue comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
    /// Every `*.json` below the directory, in sorted path order.
    Directory(PathBuf),
    Synthetic {
        kind: SyntheticKind,
        count: usize,
        seed: u64,
    },
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(u) => write!(f, "{u}"),
            DataSource::File(p) | DataSource::Directory(p) => write!(f, "{}", p.display()),
            DataSource::Synthetic { kind, count, seed } => {
                write!(f, "synthetic:{kind}:{count} (seed {seed:#x})")
            }
        }
    }
}

impl FromStr for DataSource {
    type Err = String;

    /// `http(s)://…` is a URL, `synthetic:<kind>[:count]` a generated
    /// catalogue, an existing directory a directory, anything else a file.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(DataSource::Url(s.to_string()));
        }
        if let Some(rest) = s.strip_prefix("synthetic:") {
            let mut parts = rest.splitn(2, ':');
            let kind: SyntheticKind = parts.next().unwrap_or_default().parse()?;
            let count = match parts.next() {
                Some(n) => n
                    .parse::<usize>()
                    .map_err(|e| format!("bad synthetic count '{n}': {e}"))?,
                None => DEFAULT_SYNTHETIC_COUNT,
            };
            return Ok(DataSource::Synthetic {
                kind,
                count,
                seed: DEFAULT_SEED,
            });
        }
        if s.is_empty() {
            return Err("empty data source".to_string());
        }
        let path = PathBuf::from(s);
        if path.is_dir() {
            Ok(DataSource::Directory(path))
        } else {
            Ok(DataSource::File(path))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadOptions {
    /// Keep only the `limit` brightest points.
    pub limit: Option<usize>,
    pub timeout: Duration,
    /// Catalogue substituted when the source is unavailable.
    pub fallback_kind: SyntheticKind,
    pub fallback_count: usize,
    pub seed: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            limit: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
            fallback_kind: SyntheticKind::Stars,
            fallback_count: DEFAULT_SYNTHETIC_COUNT,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Provenance {
    /// Loaded from the requested source.
    Source(String),
    /// The requested source failed; the points are synthetic.
    Fallback { reason: String },
}

/// A loaded, resolved catalogue.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub points: Vec<ResolvedPoint>,
    pub provenance: Provenance,
    /// Total number of fields filled by fallback rules.
    pub fallback_fields: usize,
}

impl Dataset {
    pub fn from_records(records: &[PointRecord], provenance: Provenance) -> Self {
        let points = resolve_all(records);
        let fallback_fields = points.iter().map(|p| p.fallbacks.count() as usize).sum();
        Self {
            points,
            provenance,
            fallback_fields,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.provenance, Provenance::Fallback { .. })
    }
}

/// Accepted document shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Bare(Vec<PointRecord>),
    Wrapped { records: Vec<PointRecord> },
}

impl Document {
    fn into_records(self) -> Vec<PointRecord> {
        match self {
            Document::Bare(r) | Document::Wrapped { records: r } => r,
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<PointRecord>, DataError> {
    let reader = BufReader::new(File::open(path)?);
    let doc: Document = serde_json::from_reader(reader)?;
    Ok(doc.into_records())
}

fn read_directory(root: &Path) -> Result<Vec<PointRecord>, DataError> {
    if !root.is_dir() {
        return Err(DataError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        )));
    }
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .map(|e| e.path().to_path_buf())
        .collect();
    paths.sort();
    log::debug!("{} catalogue files under {}", paths.len(), root.display());

    let mut records = Vec::new();
    for path in &paths {
        records.extend(read_file(path)?);
    }
    Ok(records)
}

fn fetch_url(url: &str, timeout: Duration) -> Result<Vec<PointRecord>, DataError> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into();
    let response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::StatusCode(code) => DataError::Status(code),
        other => DataError::Http(other.to_string()),
    })?;
    let doc: Document = serde_json::from_reader(response.into_body().into_reader())?;
    Ok(doc.into_records())
}

/// Fetches raw records from `source`. Empty catalogues are an error.
pub fn try_fetch(source: &DataSource, timeout: Duration) -> Result<Vec<PointRecord>, DataError> {
    let records = match source {
        DataSource::Url(url) => fetch_url(url, timeout)?,
        DataSource::File(path) => read_file(path)?,
        DataSource::Directory(root) => read_directory(root)?,
        DataSource::Synthetic { kind, count, seed } => synth::generate(*kind, *count, *seed),
    };
    if records.is_empty() {
        return Err(DataError::Empty(source.to_string()));
    }
    Ok(records)
}

/// Stable sort by apparent magnitude (brightest first), then truncate.
pub fn apply_limit(points: &mut Vec<ResolvedPoint>, limit: usize) {
    points.sort_by(|a, b| a.apparent_mag.total_cmp(&b.apparent_mag));
    points.truncate(limit);
}

/// Loads `source`, substituting the synthetic fallback on any error.
pub fn load(source: &DataSource, opts: &LoadOptions) -> Dataset {
    let mut dataset = match try_fetch(source, opts.timeout) {
        Ok(records) => Dataset::from_records(&records, Provenance::Source(source.to_string())),
        Err(e) => {
            log::warn!("catalogue {source} unavailable ({e}); using synthetic fallback");
            let records = synth::generate(opts.fallback_kind, opts.fallback_count, opts.seed);
            Dataset::from_records(
                &records,
                Provenance::Fallback {
                    reason: e.to_string(),
                },
            )
        }
    };

    if let Some(limit) = opts.limit {
        apply_limit(&mut dataset.points, limit);
        dataset.fallback_fields = dataset
            .points
            .iter()
            .map(|p| p.fallbacks.count() as usize)
            .sum();
    }

    log::info!(
        "loaded {} points from {source}{}",
        dataset.len(),
        if dataset.is_fallback() { " (fallback)" } else { "" }
    );
    if dataset.fallback_fields > 0 {
        log::debug!("{} fields filled by fallback rules", dataset.fallback_fields);
    }
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FallbackMask;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn opts() -> LoadOptions {
        LoadOptions {
            fallback_count: 64,
            timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    #[test]
    fn parses_source_strings() {
        assert_eq!(
            "https://example.org/stars.json".parse::<DataSource>(),
            Ok(DataSource::Url("https://example.org/stars.json".into()))
        );
        assert_eq!(
            "synthetic:exoplanets:120".parse::<DataSource>(),
            Ok(DataSource::Synthetic {
                kind: SyntheticKind::Exoplanets,
                count: 120,
                seed: DEFAULT_SEED
            })
        );
        assert!(matches!(
            "synthetic:stars".parse::<DataSource>(),
            Ok(DataSource::Synthetic { count: DEFAULT_SYNTHETIC_COUNT, .. })
        ));
        assert!("synthetic:stars:many".parse::<DataSource>().is_err());
        assert_eq!(
            "no/such/file.json".parse::<DataSource>(),
            Ok(DataSource::File("no/such/file.json".into()))
        );
    }

    #[test]
    fn reads_bare_and_wrapped_documents() {
        let dir = TempDir::new().unwrap();
        let bare = write(dir.path(), "a.json", r#"[{"ra": 10.0, "dec": 5.0, "mag": 3.0}]"#);
        let wrapped = write(
            dir.path(),
            "b.json",
            r#"{"records": [{"ra": 1.0}, {"bp_rp": 1.2, "parallax": 100.0, "phot_g_mean_mag": 5.0}]}"#,
        );
        let a = try_fetch(&DataSource::File(bare), opts().timeout).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].lon_deg, Some(10.0));
        let b = try_fetch(&DataSource::File(wrapped), opts().timeout).unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b[1].parallax_mas, Some(100.0));
    }

    #[test]
    fn directory_concatenates_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "2.json", r#"[{"ra": 2.0}]"#);
        write(dir.path(), "1.json", r#"[{"ra": 1.0}]"#);
        write(dir.path(), "notes.txt", "not a catalogue");
        let src: DataSource = dir.path().to_str().unwrap().parse().unwrap();
        assert!(matches!(src, DataSource::Directory(_)));
        let records = try_fetch(&src, opts().timeout).unwrap();
        let ras: Vec<_> = records.iter().map(|r| r.lon_deg).collect();
        assert_eq!(ras, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn missing_file_falls_back_to_synthetic() {
        let ds = load(&DataSource::File("/definitely/missing.json".into()), &opts());
        assert!(ds.is_fallback());
        assert_eq!(ds.len(), 64);
        // Deterministic fallback.
        let again = load(&DataSource::File("/definitely/missing.json".into()), &opts());
        assert_eq!(ds.points, again.points);
    }

    #[test]
    fn malformed_document_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "bad.json", "{ this is not json");
        let err = try_fetch(&DataSource::File(path.clone()), opts().timeout).unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
        assert!(load(&DataSource::File(path), &opts()).is_fallback());
    }

    #[test]
    fn wrong_typed_fields_keep_the_catalogue() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "mixed.json",
            r#"[{"ra": 10.0, "dec": 5.0, "mag": 6.0, "parallax": "n/a"},
                {"ra": 20.0, "year": 2014.0, "method": "Transit"},
                {"ra": 30.0, "mag": 4.0, "parallax": 100.0}]"#,
        );
        let ds = load(&DataSource::File(path), &opts());
        assert!(!ds.is_fallback());
        assert_eq!(ds.len(), 3);
        assert!(ds.points[0].fallbacks.contains(FallbackMask::ABS_MAG));
        assert_eq!(ds.points[1].discovery_year, 2014);
        assert!(!ds.points[2].fallbacks.contains(FallbackMask::ABS_MAG));
    }

    #[test]
    fn empty_catalogue_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "empty.json", "[]");
        let err = try_fetch(&DataSource::File(path), opts().timeout).unwrap_err();
        assert!(matches!(err, DataError::Empty(_)));
    }

    #[test]
    fn unreachable_url_falls_back() {
        let ds = load(&DataSource::Url("http://127.0.0.1:1/catalogue.json".into()), &opts());
        assert!(ds.is_fallback());
        assert!(!ds.is_empty());
    }

    #[test]
    fn limit_keeps_brightest_in_stable_order() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "c.json",
            r#"[{"ra": 1, "mag": 9.0}, {"ra": 2, "mag": 1.0}, {"ra": 3, "mag": 5.0},
                {"ra": 4, "mag": 1.0}, {"ra": 5}]"#,
        );
        let ds = load(
            &DataSource::File(path),
            &LoadOptions {
                limit: Some(3),
                ..opts()
            },
        );
        assert!(!ds.is_fallback());
        let ras: Vec<_> = ds.points.iter().map(|p| p.lon_deg).collect();
        assert_eq!(ras, vec![2.0, 4.0, 3.0]);
    }

    #[test]
    fn fallback_fields_are_counted() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "d.json", r#"[{"ra": 1.0, "dec": 2.0}]"#);
        let ds = load(&DataSource::File(path), &opts());
        // Everything but lon/lat.
        assert_eq!(ds.fallback_fields, 7);
    }
}
