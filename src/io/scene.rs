use crate::types::{Polarization, SarError, SarResult};
use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Where the scene contents live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneSource {
    /// Unpacked `.SAFE` directory
    Directory(PathBuf),
    /// `.zip` archive as distributed
    Archive(PathBuf),
}

/// Entry names of the four per-band documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandFiles {
    pub measurement: String,
    pub annotation: String,
    pub calibration: String,
    pub noise: String,
}

/// Read-only handle to the contents of a Sentinel-1 scene.
///
/// Every read opens its own file handle, so one reader can be shared by
/// both band workers.
#[derive(Debug, Clone)]
pub struct SceneReader {
    source: SceneSource,
    entries: Vec<String>,
}

impl SceneReader {
    /// Open a `.SAFE` directory or a `.zip` archive
    pub fn open<P: AsRef<Path>>(path: P) -> SarResult<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(SarError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Scene not found: {}", path.display()),
            )));
        }

        let (source, entries) = if path.is_dir() {
            let mut entries = Vec::new();
            collect_directory_entries(&path, &path, &mut entries)?;
            (SceneSource::Directory(path), entries)
        } else {
            let archive = open_archive(&path)?;
            let entries = archive.file_names().map(|n| n.to_string()).collect();
            (SceneSource::Archive(path), entries)
        };

        log::info!("Opened scene with {} entries", entries.len());
        Ok(Self { source, entries })
    }

    pub fn source(&self) -> &SceneSource {
        &self.source
    }

    /// All file entries, relative to the scene root, `/`-separated
    pub fn list_files(&self) -> &[String] {
        &self.entries
    }

    /// Scene identifier (file or directory name without extension)
    pub fn scene_name(&self) -> String {
        let path = match &self.source {
            SceneSource::Directory(p) | SceneSource::Archive(p) => p,
        };
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Scene start time, taken from the scene name or, failing that, the
    /// first measurement file name
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        scene_time(&self.scene_name()).or_else(|| {
            self.entries
                .iter()
                .filter(|e| e.contains("measurement/"))
                .find_map(|e| scene_time(file_name(e)))
        })
    }

    /// Locate measurement, annotation, calibration and noise files per channel
    pub fn find_band_files(&self) -> SarResult<HashMap<Polarization, BandFiles>> {
        let mut measurement = HashMap::new();
        let mut annotation = HashMap::new();
        let mut calibration = HashMap::new();
        let mut noise = HashMap::new();

        for entry in &self.entries {
            let name = file_name(entry);
            let pol = match Polarization::from_file_name(name) {
                Some(p) => p,
                None => continue,
            };
            let lower = name.to_lowercase();

            if entry.contains("measurement/") && (lower.ends_with(".tiff") || lower.ends_with(".tif")) {
                measurement.insert(pol, entry.clone());
            } else if entry.contains("annotation/calibration/") && lower.ends_with(".xml") {
                if lower.starts_with("calibration-") {
                    calibration.insert(pol, entry.clone());
                } else if lower.starts_with("noise-") {
                    noise.insert(pol, entry.clone());
                }
            } else if is_band_annotation(entry) {
                annotation.insert(pol, entry.clone());
            }
        }

        let mut bands = HashMap::new();
        for pol in Polarization::ALL {
            let files = BandFiles {
                measurement: take_file(&mut measurement, pol, "measurement")?,
                annotation: take_file(&mut annotation, pol, "annotation")?,
                calibration: take_file(&mut calibration, pol, "calibration")?,
                noise: take_file(&mut noise, pol, "noise")?,
            };
            log::debug!("{} files: {:?}", pol, files);
            bands.insert(pol, files);
        }

        Ok(bands)
    }

    /// Read an entry into memory
    pub fn read_bytes(&self, entry: &str) -> SarResult<Vec<u8>> {
        match &self.source {
            SceneSource::Directory(root) => Ok(std::fs::read(root.join(entry))?),
            SceneSource::Archive(path) => {
                let mut archive = open_archive(path)?;
                let mut file = archive.by_name(entry).map_err(|e| {
                    SarError::InvalidFormat(format!("Failed to access {}: {}", entry, e))
                })?;
                let mut buffer = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut buffer)?;
                Ok(buffer)
            }
        }
    }

    /// Read a text entry (XML metadata)
    pub fn read_string(&self, entry: &str) -> SarResult<String> {
        let bytes = self.read_bytes(entry)?;
        String::from_utf8(bytes)
            .map_err(|e| SarError::InvalidFormat(format!("{} is not valid UTF-8: {}", entry, e)))
    }
}

/// Reads the scene start time from a scene or file name, e.g.
/// `S1A_EW_GRDM_1SDH_20200107T033938_20200107T034038_030689_038489_92D9`.
/// Usable as a sort key for lists of scenes.
pub fn scene_time(name: &str) -> Option<NaiveDateTime> {
    let re = Regex::new(r"(\d{8})[tT](\d{6})").ok()?;
    let caps = re.captures(name)?;
    let stamp = format!("{}T{}", &caps[1], &caps[2]);
    NaiveDateTime::parse_from_str(&stamp, "%Y%m%dT%H%M%S").ok()
}

fn open_archive(path: &Path) -> SarResult<ZipArchive<File>> {
    let file = File::open(path)?;
    ZipArchive::new(file)
        .map_err(|e| SarError::InvalidFormat(format!("Failed to open ZIP: {}", e)))
}

fn collect_directory_entries(root: &Path, dir: &Path, out: &mut Vec<String>) -> SarResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_directory_entries(root, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            out.push(parts.join("/"));
        }
    }
    Ok(())
}

fn file_name(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

/// Band annotation documents sit directly under `annotation/`
fn is_band_annotation(entry: &str) -> bool {
    let mut parts = entry.rsplit('/');
    let name = parts.next().unwrap_or("");
    let parent = parts.next().unwrap_or("");
    parent == "annotation" && name.to_lowercase().ends_with(".xml")
}

fn take_file(
    files: &mut HashMap<Polarization, String>,
    pol: Polarization,
    kind: &str,
) -> SarResult<String> {
    files.remove(&pol).ok_or_else(|| {
        SarError::InvalidFormat(format!("No {} file found for polarization {}", kind, pol))
    })
}
