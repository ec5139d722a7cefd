//! On-disk cache of rendered satellite images and legends.
//!
//! All files live in one flat directory:
//!
//! ```text
//! latest_band_{band}_{palette}_{YYYYMMDDTHHMM}_{token}.png
//! legend_{band}_{palette}_{YYYYMMDDTHHMM}_{token}.png
//! ```
//!
//! The timestamp is the start of the time bucket the render belongs to and
//! `token` is 8 hex characters that keep concurrent writers apart. An image
//! only counts as cached when the legend with the same token sits next to it.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use sat_common::{Band, SatError, SatResult};
use tracing::{debug, info, instrument, warn};

const IMAGE_PREFIX: &str = "latest_band_";
const LEGEND_PREFIX: &str = "legend_";
const TEMP_SUFFIX: &str = ".tmp";
const EXTENSION: &str = ".png";

/// Which half of a cached pair a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheFileKind {
    Image,
    Legend,
}

impl CacheFileKind {
    fn prefix(self) -> &'static str {
        match self {
            CacheFileKind::Image => IMAGE_PREFIX,
            CacheFileKind::Legend => LEGEND_PREFIX,
        }
    }
}

/// Identity of a cached render: band, palette and time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub band: Band,
    pub palette: String,
    pub bucket_start: DateTime<Utc>,
}

impl CacheKey {
    pub fn new(band: Band, palette: impl Into<String>, bucket_start: DateTime<Utc>) -> Self {
        Self {
            band,
            palette: palette.into(),
            bucket_start,
        }
    }

    pub fn stamp(&self) -> String {
        self.bucket_start.format("%Y%m%dT%H%M").to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.band, self.palette, self.stamp())
    }
}

/// A parsed cache file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFileName {
    pub kind: CacheFileKind,
    pub band: u8,
    pub palette: String,
    pub stamp: String,
    pub token: String,
}

impl CacheFileName {
    pub fn for_key(kind: CacheFileKind, key: &CacheKey, token: &str) -> Self {
        Self {
            kind,
            band: key.band.number(),
            palette: key.palette.clone(),
            stamp: key.stamp(),
            token: token.to_string(),
        }
    }

    /// Parse a file name; anything that is not a cache file yields `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(EXTENSION)?;
        let (kind, rest) = if let Some(rest) = stem.strip_prefix(IMAGE_PREFIX) {
            (CacheFileKind::Image, rest)
        } else if let Some(rest) = stem.strip_prefix(LEGEND_PREFIX) {
            (CacheFileKind::Legend, rest)
        } else {
            return None;
        };

        let parts: Vec<&str> = rest.split('_').collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        Some(Self {
            kind,
            band: parts[0].parse().ok()?,
            palette: parts[1].to_string(),
            stamp: parts[2].to_string(),
            token: parts[3].to_string(),
        })
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}{}_{}_{}_{}{}",
            self.kind.prefix(),
            self.band,
            self.palette,
            self.stamp,
            self.token,
            EXTENSION
        )
    }

    /// Name of the other half of the pair.
    pub fn sibling(&self) -> Self {
        let kind = match self.kind {
            CacheFileKind::Image => CacheFileKind::Legend,
            CacheFileKind::Legend => CacheFileKind::Image,
        };
        Self { kind, ..self.clone() }
    }

    fn matches(&self, key: &CacheKey) -> bool {
        self.band == key.band.number() && self.palette == key.palette && self.stamp == key.stamp()
    }

    fn group(&self) -> (CacheFileKind, u8, String) {
        (self.kind, self.band, self.palette.clone())
    }
}

impl fmt::Display for CacheFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Fresh 8-hex-character uniqueness token.
pub fn new_token() -> String {
    let mut token = uuid::Uuid::new_v4().simple().to_string();
    token.truncate(8);
    token
}

/// A cached image/legend pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub image_path: PathBuf,
    pub legend_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of the cache directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskUsage {
    pub total_size_mb: f64,
    pub file_count: usize,
    pub oldest_file: Option<String>,
    pub newest_file: Option<String>,
}

/// How much the sweeper keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Files kept per (kind, band, palette).
    pub retention: usize,
    /// Any `.png` older than this is removed.
    pub max_age: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention: 4,
            max_age: Duration::hours(24),
        }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub scanned: usize,
    pub deleted_over_retention: usize,
    pub deleted_expired: usize,
    pub failed: usize,
}

impl SweepStats {
    pub fn deleted(&self) -> usize {
        self.deleted_over_retention + self.deleted_expired
    }
}

struct DirFile {
    path: PathBuf,
    name: String,
    size: u64,
    modified: DateTime<Utc>,
}

/// Handle on the cache directory.
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> SatResult<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Newest complete pair for `key` that is younger than `max_age`.
    ///
    /// Directory errors are logged and reported as a miss.
    #[instrument(skip(self), fields(key = %key))]
    pub fn lookup(&self, key: &CacheKey, max_age: Duration, now: DateTime<Utc>) -> Option<CacheEntry> {
        let files = match self.scan() {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, dir = %self.dir.display(), "Cache directory unreadable, treating as miss");
                return None;
            }
        };

        let best = files
            .iter()
            .filter_map(|f| CacheFileName::parse(&f.name).map(|n| (f, n)))
            .filter(|(_, n)| n.kind == CacheFileKind::Image && n.matches(key))
            .filter(|(f, _)| now - f.modified < max_age)
            .filter(|(_, n)| self.dir.join(n.sibling().file_name()).is_file())
            .max_by_key(|(f, _)| f.modified)?;

        let (file, name) = best;
        debug!(file = %file.name, "Cache hit");
        Some(CacheEntry {
            key: key.clone(),
            image_path: file.path.clone(),
            legend_path: self.dir.join(name.sibling().file_name()),
            created_at: file.modified,
        })
    }

    /// Write a new pair for `key`.
    ///
    /// The legend is written first so a visible image always has its legend.
    /// Each file goes to a hidden temporary name and is renamed into place.
    #[instrument(skip(self, image_png, legend_png), fields(key = %key))]
    pub fn store(&self, key: &CacheKey, image_png: &[u8], legend_png: &[u8]) -> SatResult<CacheEntry> {
        self.ensure_dir()?;
        let token = new_token();
        let image = CacheFileName::for_key(CacheFileKind::Image, key, &token);
        let legend = image.sibling();

        let legend_path = self.write_atomic(&legend.file_name(), legend_png)?;
        let image_path = self.write_atomic(&image.file_name(), image_png)?;

        let created_at = fs::metadata(&image_path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        info!(image = %image.file_name(), "Stored render");
        Ok(CacheEntry {
            key: key.clone(),
            image_path,
            legend_path,
            created_at,
        })
    }

    /// Size and age summary of every `.png` in the directory.
    pub fn disk_usage(&self) -> SatResult<DiskUsage> {
        let files: Vec<DirFile> = self
            .scan()?
            .into_iter()
            .filter(|f| f.name.ends_with(EXTENSION))
            .collect();

        let total: u64 = files.iter().map(|f| f.size).sum();
        let oldest = files.iter().min_by_key(|f| f.modified).map(|f| f.name.clone());
        let newest = files.iter().max_by_key(|f| f.modified).map(|f| f.name.clone());

        Ok(DiskUsage {
            total_size_mb: ((total as f64 / (1024.0 * 1024.0)) * 100.0).round() / 100.0,
            file_count: files.len(),
            oldest_file: oldest,
            newest_file: newest,
        })
    }

    /// Apply the retention policy.
    ///
    /// Cache files are grouped by (kind, band, palette) and only the
    /// `retention` most recently modified per group survive. Then any `.png`,
    /// and any temp file left behind by an interrupted write, older than
    /// `max_age` is removed. Failures are logged and counted.
    #[instrument(skip(self))]
    pub fn sweep(&self, policy: RetentionPolicy, now: DateTime<Utc>) -> SweepStats {
        let mut stats = SweepStats::default();
        let files = match self.scan() {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, dir = %self.dir.display(), "Cannot scan cache directory");
                stats.failed += 1;
                return stats;
            }
        };
        stats.scanned = files.len();

        let mut groups: HashMap<(CacheFileKind, u8, String), Vec<&DirFile>> = HashMap::new();
        for file in &files {
            if let Some(name) = CacheFileName::parse(&file.name) {
                groups.entry(name.group()).or_default().push(file);
            }
        }

        let mut removed: Vec<&Path> = Vec::new();
        for (_, mut members) in groups {
            members.sort_by(|a, b| b.modified.cmp(&a.modified));
            for file in members.into_iter().skip(policy.retention) {
                if remove(&file.path) {
                    stats.deleted_over_retention += 1;
                    removed.push(&file.path);
                } else {
                    stats.failed += 1;
                }
            }
        }

        for file in &files {
            if !(file.name.ends_with(EXTENSION) || is_temp_name(&file.name))
                || removed.contains(&file.path.as_path())
            {
                continue;
            }
            if now - file.modified > policy.max_age {
                if remove(&file.path) {
                    stats.deleted_expired += 1;
                } else {
                    stats.failed += 1;
                }
            }
        }

        if stats.deleted() > 0 || stats.failed > 0 {
            info!(
                deleted_over_retention = stats.deleted_over_retention,
                deleted_expired = stats.deleted_expired,
                failed = stats.failed,
                "Cache sweep complete"
            );
        }
        stats
    }

    fn write_atomic(&self, name: &str, bytes: &[u8]) -> SatResult<PathBuf> {
        let final_path = self.dir.join(name);
        let tmp_path = self.dir.join(format!(".{}{}", name, TEMP_SUFFIX));
        fs::write(&tmp_path, bytes)
            .and_then(|_| fs::rename(&tmp_path, &final_path))
            .map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                SatError::CacheIo(format!("writing {}: {}", final_path.display(), e))
            })?;
        Ok(final_path)
    }

    fn scan(&self) -> std::io::Result<Vec<DirFile>> {
        let mut files = Vec::new();
        // Entries can vanish between read_dir and stat when another request
        // renames a temp file or sweeps; those are skipped.
        for entry in fs::read_dir(&self.dir)? {
            let Ok(entry) = entry else { continue };
            let Ok(metadata) = entry.metadata() else { continue };
            if !metadata.is_file() {
                continue;
            }
            let Ok(modified) = metadata.modified() else { continue };
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            files.push(DirFile {
                path: entry.path(),
                name,
                size: metadata.len(),
                modified: DateTime::<Utc>::from(modified),
            });
        }
        Ok(files)
    }
}

/// Hidden in-progress name written by `write_atomic`.
fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

fn remove(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to delete cache file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key() -> CacheKey {
        CacheKey::new(
            Band::new(13),
            "inferno",
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_key_string_form() {
        assert_eq!(key().to_string(), "13_inferno_20250314T0930");
    }

    #[test]
    fn test_file_name_round_trip() {
        let name = CacheFileName::for_key(CacheFileKind::Image, &key(), "ab12cd34");
        assert_eq!(name.file_name(), "latest_band_13_inferno_20250314T0930_ab12cd34.png");
        assert_eq!(CacheFileName::parse(&name.file_name()), Some(name.clone()));

        let legend = name.sibling();
        assert_eq!(legend.file_name(), "legend_13_inferno_20250314T0930_ab12cd34.png");
        assert_eq!(CacheFileName::parse(&legend.file_name()).map(|n| n.kind), Some(CacheFileKind::Legend));
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        assert!(CacheFileName::parse("notes.txt").is_none());
        assert!(CacheFileName::parse("latest_band_13_inferno.png").is_none());
        assert!(CacheFileName::parse("latest_band_x_inferno_20250314T0930_ab12cd34.png").is_none());
        assert!(CacheFileName::parse("legend_13_inferno_20250314T0930_ab12cd34.png.tmp").is_none());
    }

    #[test]
    fn test_token_is_eight_hex() {
        let token = new_token();
        assert_eq!(token.len(), 8);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, new_token());
    }

    #[test]
    fn test_sweep_stats_total() {
        let stats = SweepStats {
            deleted_over_retention: 2,
            deleted_expired: 1,
            ..Default::default()
        };
        assert_eq!(stats.deleted(), 3);
    }
}
