//! Synthetic dual-polarization GRD scenes for integration tests
#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tiff::encoder::{colortype, TiffEncoder};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const SCENE_NAME: &str = "S1A_EW_GRDM_1SDH_20200107T033938_20200107T034038_030689_038489_92D9";
pub const ROWS: usize = 40;
pub const COLS: usize = 300;

/// Interior DN, noisy edge DN and edge widths (left, right) per channel
pub const CO_DN: u16 = 400;
pub const CROSS_DN: u16 = 90;
pub const EDGE_DN: u16 = 5;
pub const CO_EDGES: (usize, usize) = (12, 8);
pub const CROSS_EDGES: (usize, usize) = (20, 6);

/// Pixel with DN 0 in the co-pol raster
pub const ZERO_PIXEL: (usize, usize) = (10, 150);

pub const NOISE: f32 = 100.0;
pub const GAMMA: f32 = 10.0;
pub const GCP_LINES: [usize; 3] = [0, 20, 39];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 10 log10((dn^2 - noise) / gamma^2)
pub fn expected_db(dn: u16) -> f32 {
    let dn = dn as f64;
    (10.0 * ((dn * dn - NOISE as f64) / (GAMMA as f64 * GAMMA as f64)).log10()) as f32
}

pub fn pixel_of(index: usize, per_line: usize) -> usize {
    index * (COLS - 1) / (per_line - 1)
}

pub fn elevation_at(pixel: f64) -> f64 {
    30.0 + pixel * 0.01
}

fn band_dn(interior: u16, edges: (usize, usize)) -> Vec<u16> {
    let mut data = vec![interior; ROWS * COLS];
    for row in 0..ROWS {
        for col in (0..edges.0).chain(COLS - edges.1..COLS) {
            data[row * COLS + col] = EDGE_DN;
        }
    }
    data
}

pub fn co_pol_dn() -> Vec<u16> {
    let mut data = band_dn(CO_DN, CO_EDGES);
    data[ZERO_PIXEL.0 * COLS + ZERO_PIXEL.1] = 0;
    data
}

pub fn cross_pol_dn() -> Vec<u16> {
    band_dn(CROSS_DN, CROSS_EDGES)
}

pub fn encode_tiff(data: &[u16]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buffer).expect("Failed to create TIFF encoder");
        encoder
            .write_image::<colortype::Gray16>(COLS as u32, ROWS as u32, data)
            .expect("Failed to encode TIFF");
    }
    buffer.into_inner()
}

fn join(values: impl Iterator<Item = String>) -> String {
    values.collect::<Vec<_>>().join(" ")
}

/// Noise document whose range vectors sample different pixels per line
pub fn noise_xml() -> String {
    let vectors = [
        (0usize, vec![0usize, 60, 120, 180, 240, 299]),
        (20, vec![0, 75, 150, 225, 299]),
        (39, vec![0, 60, 120, 180, 240, 299]),
    ];
    let mut range = String::new();
    for (line, pixels) in &vectors {
        range.push_str(&format!(
            r#"
    <noiseRangeVector>
      <azimuthTime>2020-01-07T03:39:38.000000</azimuthTime>
      <line>{}</line>
      <pixel count="{}">{}</pixel>
      <noiseRangeLut count="{}">{}</noiseRangeLut>
    </noiseRangeVector>"#,
            line,
            pixels.len(),
            join(pixels.iter().map(|p| p.to_string())),
            pixels.len(),
            join(pixels.iter().map(|_| format!("{:.6e}", NOISE))),
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<noise>
  <adsHeader>
    <missionId>S1A</missionId>
    <polarisation>HH</polarisation>
  </adsHeader>
  <noiseRangeVectorList count="{}">{}
  </noiseRangeVectorList>
  <noiseAzimuthVectorList count="1">
    <noiseAzimuthVector>
      <swath>EW1</swath>
      <firstAzimuthLine>0</firstAzimuthLine>
      <firstRangeSample>0</firstRangeSample>
      <lastAzimuthLine>{}</lastAzimuthLine>
      <lastRangeSample>{}</lastRangeSample>
      <line count="2">0 {}</line>
      <noiseAzimuthLut count="2">1.000000e+00 1.000000e+00</noiseAzimuthLut>
    </noiseAzimuthVector>
  </noiseAzimuthVectorList>
</noise>
"#,
        vectors.len(),
        range,
        ROWS - 1,
        COLS - 1,
        ROWS - 1
    )
}

/// Pre-2015 noise document with a single `noiseVectorList`
pub fn legacy_noise_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<noise>
  <noiseVectorList count="2">
    <noiseVector>
      <azimuthTime>2015-01-07T03:39:38.000000</azimuthTime>
      <line>0</line>
      <pixel count="3">0 150 {cols}</pixel>
      <noiseLut count="3">1.0e-02 2.0e-02 1.0e-02</noiseLut>
    </noiseVector>
    <noiseVector>
      <azimuthTime>2015-01-07T03:39:40.000000</azimuthTime>
      <line>{rows}</line>
      <pixel count="3">0 150 {cols}</pixel>
      <noiseLut count="3">1.0e-02 2.0e-02 1.0e-02</noiseLut>
    </noiseVector>
  </noiseVectorList>
</noise>
"#,
        rows = ROWS - 1,
        cols = COLS - 1
    )
}

pub fn calibration_xml() -> String {
    let pixels = [0usize, 100, 200, 299];
    let list = |v: f32| join(pixels.iter().map(|_| format!("{:.6e}", v)));
    let mut vectors = String::new();
    for line in [0usize, ROWS - 1] {
        vectors.push_str(&format!(
            r#"
    <calibrationVector>
      <azimuthTime>2020-01-07T03:39:38.000000</azimuthTime>
      <line>{}</line>
      <pixel count="4">{}</pixel>
      <sigmaNought count="4">{}</sigmaNought>
      <betaNought count="4">{}</betaNought>
      <gamma count="4">{}</gamma>
      <dn count="4">{}</dn>
    </calibrationVector>"#,
            line,
            join(pixels.iter().map(|p| p.to_string())),
            list(GAMMA * 1.1),
            list(GAMMA * 1.2),
            list(GAMMA),
            list(1.0),
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<calibration>
  <calibrationInformation>
    <absoluteCalibrationConstant>1.000000e+00</absoluteCalibrationConstant>
  </calibrationInformation>
  <calibrationVectorList count="2">{}
  </calibrationVectorList>
</calibration>
"#,
        vectors
    )
}

/// Product annotation with `per_line` geolocation points on each of
/// `GCP_LINES`
pub fn annotation_xml(per_line: usize) -> String {
    let mut points = String::new();
    for line in GCP_LINES {
        for i in 0..per_line {
            let pixel = pixel_of(i, per_line);
            points.push_str(&format!(
                r#"
      <geolocationGridPoint>
        <azimuthTime>2020-01-07T03:39:38.000000</azimuthTime>
        <slantRangeTime>5.3e-03</slantRangeTime>
        <line>{}</line>
        <pixel>{}</pixel>
        <latitude>{}</latitude>
        <longitude>{}</longitude>
        <height>1.0e+01</height>
        <incidenceAngle>{}</incidenceAngle>
        <elevationAngle>{}</elevationAngle>
      </geolocationGridPoint>"#,
                line,
                pixel,
                78.0 + line as f64 * 0.001,
                15.0 + pixel as f64 * 0.002,
                32.0 + pixel as f64 * 0.01,
                elevation_at(pixel as f64),
            ));
        }
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<product>
  <imageAnnotation>
    <imageInformation>
      <productFirstLineUtcTime>2020-01-07T03:39:38.000000</productFirstLineUtcTime>
      <numberOfSamples>{}</numberOfSamples>
      <numberOfLines>{}</numberOfLines>
    </imageInformation>
  </imageAnnotation>
  <geolocationGrid>
    <geolocationGridPointList count="{}">{}
    </geolocationGridPointList>
  </geolocationGrid>
</product>
"#,
        COLS,
        ROWS,
        per_line * GCP_LINES.len(),
        points
    )
}

/// Relative entry paths and contents of a complete scene
pub fn scene_entries() -> Vec<(String, Vec<u8>)> {
    let mut entries = vec![("manifest.safe".to_string(), b"<xfdu/>".to_vec())];
    for (designator, index, dn) in [("hh", 1, co_pol_dn()), ("hv", 2, cross_pol_dn())] {
        let stem = format!(
            "s1a-ew-grd-{}-20200107t033938-20200107t034038-030689-038489-{:03}",
            designator, index
        );
        entries.push((format!("measurement/{}.tiff", stem), encode_tiff(&dn)));
        entries.push((format!("annotation/{}.xml", stem), annotation_xml(21).into_bytes()));
        entries.push((
            format!("annotation/calibration/calibration-{}.xml", stem),
            calibration_xml().into_bytes(),
        ));
        entries.push((
            format!("annotation/calibration/noise-{}.xml", stem),
            noise_xml().into_bytes(),
        ));
    }
    entries
}

/// Write the scene as `<SCENE_NAME>.SAFE` under `root`
pub fn write_safe_dir(root: &Path) -> PathBuf {
    write_safe_dir_with(root, scene_entries())
}

pub fn write_safe_dir_with(root: &Path, entries: Vec<(String, Vec<u8>)>) -> PathBuf {
    let scene = root.join(format!("{}.SAFE", SCENE_NAME));
    for (name, content) in entries {
        let path = scene.join(&name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create scene directory");
        }
        fs::write(&path, content).expect("Failed to write scene file");
    }
    scene
}

/// Write the scene as `<SCENE_NAME>.zip` with a `<SCENE_NAME>.SAFE/` prefix
pub fn write_safe_zip(root: &Path) -> PathBuf {
    let path = root.join(format!("{}.zip", SCENE_NAME));
    let file = fs::File::create(&path).expect("Failed to create archive");
    let mut zip = ZipWriter::new(file);
    for (name, content) in scene_entries() {
        zip.start_file(format!("{}.SAFE/{}", SCENE_NAME, name), FileOptions::default())
            .expect("Failed to start archive entry");
        zip.write_all(&content).expect("Failed to write archive entry");
    }
    zip.finish().expect("Failed to finish archive");
    path
}
