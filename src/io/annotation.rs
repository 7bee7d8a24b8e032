use crate::types::{SarError, SarResult};
use ndarray::Array2;
use quick_xml::de::from_str;
use serde::Deserialize;

/// Whitespace-separated numeric list element, e.g. `<pixel count="3">0 40 80</pixel>`
#[derive(Debug, Default, Deserialize)]
pub struct ValueList {
    #[serde(rename = "$text", default)]
    pub text: String,
}

impl ValueList {
    fn parse<T>(&self, field: &str) -> SarResult<Vec<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        parse_space_separated_numbers(&self.text)
            .map_err(|e| SarError::MetadataParse(format!("{}: {}", field, e)))
    }
}

// Noise document (`annotation/calibration/noise-*.xml`)

#[derive(Debug, Deserialize)]
pub struct NoiseDocument {
    #[serde(rename = "noiseRangeVectorList")]
    pub range_vector_list: Option<NoiseRangeVectorList>,
    #[serde(rename = "noiseAzimuthVectorList")]
    pub azimuth_vector_list: Option<NoiseAzimuthVectorList>,
    /// Products from before IPF 2.9 carry a single noise list
    #[serde(rename = "noiseVectorList")]
    pub legacy_vector_list: Option<LegacyNoiseVectorList>,
}

#[derive(Debug, Deserialize)]
pub struct NoiseRangeVectorList {
    #[serde(rename = "noiseRangeVector", default)]
    pub vectors: Vec<NoiseRangeVector>,
}

#[derive(Debug, Deserialize)]
pub struct NoiseRangeVector {
    #[serde(rename = "azimuthTime", default)]
    pub azimuth_time: String,
    pub line: i64,
    #[serde(default)]
    pub pixel: ValueList,
    #[serde(rename = "noiseRangeLut", default)]
    pub noise_range_lut: ValueList,
}

#[derive(Debug, Deserialize)]
pub struct LegacyNoiseVectorList {
    #[serde(rename = "noiseVector", default)]
    pub vectors: Vec<LegacyNoiseVector>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyNoiseVector {
    #[serde(rename = "azimuthTime", default)]
    pub azimuth_time: String,
    pub line: i64,
    #[serde(default)]
    pub pixel: ValueList,
    #[serde(rename = "noiseLut", default)]
    pub noise_lut: ValueList,
}

#[derive(Debug, Deserialize)]
pub struct NoiseAzimuthVectorList {
    #[serde(rename = "noiseAzimuthVector", default)]
    pub vectors: Vec<NoiseAzimuthVector>,
}

#[derive(Debug, Deserialize)]
pub struct NoiseAzimuthVector {
    #[serde(default)]
    pub swath: String,
    #[serde(rename = "firstAzimuthLine")]
    pub first_azimuth_line: usize,
    #[serde(rename = "firstRangeSample")]
    pub first_range_sample: usize,
    #[serde(rename = "lastAzimuthLine")]
    pub last_azimuth_line: usize,
    #[serde(rename = "lastRangeSample")]
    pub last_range_sample: usize,
    #[serde(default)]
    pub line: ValueList,
    #[serde(rename = "noiseAzimuthLut", default)]
    pub noise_azimuth_lut: ValueList,
}

// Calibration document (`annotation/calibration/calibration-*.xml`)

#[derive(Debug, Deserialize)]
pub struct CalibrationDocument {
    #[serde(rename = "calibrationVectorList")]
    pub vector_list: Option<CalibrationVectorList>,
}

#[derive(Debug, Deserialize)]
pub struct CalibrationVectorList {
    #[serde(rename = "calibrationVector", default)]
    pub vectors: Vec<CalibrationVectorXml>,
}

#[derive(Debug, Deserialize)]
pub struct CalibrationVectorXml {
    #[serde(rename = "azimuthTime", default)]
    pub azimuth_time: String,
    pub line: usize,
    #[serde(default)]
    pub pixel: ValueList,
    #[serde(rename = "sigmaNought", default)]
    pub sigma_nought: ValueList,
    #[serde(rename = "betaNought", default)]
    pub beta_nought: ValueList,
    #[serde(default)]
    pub gamma: ValueList,
    #[serde(default)]
    pub dn: ValueList,
}

// Product annotation (`annotation/*.xml`)

#[derive(Debug, Deserialize)]
pub struct ProductAnnotation {
    #[serde(rename = "imageAnnotation")]
    pub image_annotation: Option<ImageAnnotation>,
    #[serde(rename = "geolocationGrid")]
    pub geolocation_grid: Option<GeolocationGridXml>,
}

#[derive(Debug, Deserialize)]
pub struct ImageAnnotation {
    #[serde(rename = "imageInformation")]
    pub image_information: Option<ImageInformation>,
}

#[derive(Debug, Deserialize)]
pub struct ImageInformation {
    #[serde(rename = "numberOfSamples")]
    pub number_of_samples: Option<usize>,
    #[serde(rename = "numberOfLines")]
    pub number_of_lines: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct GeolocationGridXml {
    #[serde(rename = "geolocationGridPointList")]
    pub point_list: Option<GeolocationGridPointList>,
}

#[derive(Debug, Deserialize)]
pub struct GeolocationGridPointList {
    #[serde(rename = "geolocationGridPoint", default)]
    pub points: Vec<GroundControlPoint>,
}

/// Sparse range noise samples. Each line may carry a different number of
/// pixel positions.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseTable {
    pub lines: Vec<NoiseLine>,
}

/// Noise samples of one azimuth line
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseLine {
    pub line: i64,
    pub pixels: Vec<i64>,
    pub values: Vec<f32>,
}

impl NoiseTable {
    /// All samples as `(line, pixel, value)` triples
    pub fn points(&self) -> impl Iterator<Item = (i64, i64, f32)> + '_ {
        self.lines.iter().flat_map(|l| {
            l.pixels
                .iter()
                .zip(l.values.iter())
                .map(move |(&p, &v)| (l.line, p, v))
        })
    }

    pub fn sample_count(&self) -> usize {
        self.lines.iter().map(|l| l.pixels.len()).sum()
    }

    /// True when every line has the same pixel positions
    pub fn is_regular(&self) -> bool {
        match self.lines.first() {
            Some(first) => self.lines.iter().all(|l| l.pixels == first.pixels),
            None => true,
        }
    }
}

/// One along-track noise segment covering a rectangular block of the image
#[derive(Debug, Clone, PartialEq)]
pub struct ScallopingPatch {
    pub line_min: usize,
    pub line_max: usize,
    pub sample_min: usize,
    pub sample_max: usize,
    pub lines: Vec<i64>,
    pub values: Vec<f32>,
}

/// Calibration vectors on a rectangular (line x pixel) grid
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    pub lines: Vec<usize>,
    pub pixels: Vec<usize>,
    pub sigma_nought: Array2<f32>,
    pub beta_nought: Array2<f32>,
    pub gamma: Array2<f32>,
    pub dn: Array2<f32>,
}

impl CalibrationTable {
    /// DN reference used to rescale noise tables stored in pre-rescale units
    pub fn dn_reference(&self) -> Option<f32> {
        self.dn.iter().next().copied()
    }
}

/// Ground control point from the annotation geolocation grid
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroundControlPoint {
    #[serde(rename = "azimuthTime", default)]
    pub azimuth_time: String,
    #[serde(rename = "slantRangeTime", default)]
    pub slant_range_time: f64,
    pub line: usize,
    pub pixel: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub height: f64,
    #[serde(rename = "incidenceAngle")]
    pub incidence_angle: f64,
    #[serde(rename = "elevationAngle")]
    pub elevation_angle: f64,
}

/// Geolocation grid with a fixed number of points per azimuth line
#[derive(Debug, Clone)]
pub struct GeolocationGrid {
    points: Vec<GroundControlPoint>,
    per_line: usize,
}

impl GeolocationGrid {
    /// Build a grid, rejecting point counts that do not fill whole lines
    pub fn new(points: Vec<GroundControlPoint>, per_line: usize) -> SarResult<Self> {
        if per_line == 0 || points.is_empty() || points.len() % per_line != 0 {
            return Err(SarError::GridInconsistency {
                count: points.len(),
                per_line,
            });
        }
        Ok(Self { points, per_line })
    }

    pub fn points(&self) -> &[GroundControlPoint] {
        &self.points
    }

    pub fn per_line(&self) -> usize {
        self.per_line
    }

    /// Azimuth line of each grid row
    pub fn lines(&self) -> Vec<f64> {
        self.points
            .iter()
            .step_by(self.per_line)
            .map(|p| p.line as f64)
            .collect()
    }

    /// Range pixel of each grid column, taken from the first row
    pub fn pixels(&self) -> Vec<f64> {
        self.points[..self.per_line]
            .iter()
            .map(|p| p.pixel as f64)
            .collect()
    }

    /// Arrange one attribute as a (rows x per_line) grid
    pub fn field<F>(&self, attribute: F) -> SarResult<Array2<f64>>
    where
        F: Fn(&GroundControlPoint) -> f64,
    {
        let rows = self.points.len() / self.per_line;
        let values: Vec<f64> = self.points.iter().map(attribute).collect();
        Array2::from_shape_vec((rows, self.per_line), values)
            .map_err(|e| SarError::Processing(format!("Failed to shape geolocation field: {}", e)))
    }
}

/// Parser for Sentinel-1 noise, calibration and product annotation XML
pub struct MetadataParser;

impl MetadataParser {
    /// Parse the range noise table and any scalloping patches.
    ///
    /// A missing `noiseAzimuthVectorList` yields an empty patch list.
    pub fn parse_noise(xml_content: &str) -> SarResult<(NoiseTable, Vec<ScallopingPatch>)> {
        let doc: NoiseDocument = from_str(xml_content)
            .map_err(|e| SarError::MetadataParse(format!("Failed to parse noise XML: {}", e)))?;

        let mut lines = Vec::new();
        if let Some(list) = &doc.range_vector_list {
            for v in &list.vectors {
                lines.push(noise_line(v.line, &v.pixel, &v.noise_range_lut, "noiseRangeLut")?);
            }
        } else if let Some(list) = &doc.legacy_vector_list {
            log::debug!("Using legacy noiseVectorList");
            for v in &list.vectors {
                lines.push(noise_line(v.line, &v.pixel, &v.noise_lut, "noiseLut")?);
            }
        }

        if lines.iter().all(|l| l.pixels.is_empty()) {
            return Err(SarError::MetadataParse(
                "Noise document has no range noise vectors".to_string(),
            ));
        }

        let mut patches = Vec::new();
        if let Some(list) = &doc.azimuth_vector_list {
            for v in &list.vectors {
                let line_positions = v.line.parse::<i64>("line")?;
                let values = v.noise_azimuth_lut.parse::<f32>("noiseAzimuthLut")?;
                if line_positions.len() != values.len() || values.is_empty() {
                    return Err(SarError::MetadataParse(format!(
                        "Azimuth noise vector has {} lines but {} values",
                        line_positions.len(),
                        values.len()
                    )));
                }
                if v.last_azimuth_line < v.first_azimuth_line || v.last_range_sample < v.first_range_sample {
                    return Err(SarError::MetadataParse(format!(
                        "Azimuth noise vector has inverted bounds: lines {}..={}, samples {}..={}",
                        v.first_azimuth_line, v.last_azimuth_line, v.first_range_sample, v.last_range_sample
                    )));
                }
                patches.push(ScallopingPatch {
                    line_min: v.first_azimuth_line,
                    line_max: v.last_azimuth_line,
                    sample_min: v.first_range_sample,
                    sample_max: v.last_range_sample,
                    lines: line_positions,
                    values,
                });
            }
        }

        let table = NoiseTable { lines };
        log::debug!(
            "Parsed {} noise lines ({} samples), {} scalloping patches",
            table.lines.len(),
            table.sample_count(),
            patches.len()
        );
        Ok((table, patches))
    }

    /// Parse calibration vectors into a rectangular table
    pub fn parse_calibration(xml_content: &str) -> SarResult<CalibrationTable> {
        let doc: CalibrationDocument = from_str(xml_content).map_err(|e| {
            SarError::MetadataParse(format!("Failed to parse calibration XML: {}", e))
        })?;

        let vectors = doc.vector_list.map(|l| l.vectors).unwrap_or_default();
        if vectors.is_empty() {
            return Err(SarError::MetadataParse(
                "No calibration vectors found in XML".to_string(),
            ));
        }

        let pixels = vectors[0].pixel.parse::<usize>("pixel")?;
        let cols = pixels.len();
        if cols == 0 {
            return Err(SarError::MetadataParse(
                "Calibration vector has no pixel positions".to_string(),
            ));
        }

        let rows = vectors.len();
        let mut lines = Vec::with_capacity(rows);
        let mut sigma = Vec::with_capacity(rows * cols);
        let mut beta = Vec::with_capacity(rows * cols);
        let mut gamma = Vec::with_capacity(rows * cols);
        let mut dn = Vec::with_capacity(rows * cols);

        for v in &vectors {
            let row_pixels = v.pixel.parse::<usize>("pixel")?;
            let s = v.sigma_nought.parse::<f32>("sigmaNought")?;
            let b = v.beta_nought.parse::<f32>("betaNought")?;
            let g = v.gamma.parse::<f32>("gamma")?;
            let d = v.dn.parse::<f32>("dn")?;

            if [row_pixels.len(), s.len(), b.len(), g.len(), d.len()]
                .iter()
                .any(|&n| n != cols)
            {
                return Err(SarError::MetadataParse(format!(
                    "Calibration vector at line {} does not have {} samples",
                    v.line, cols
                )));
            }

            lines.push(v.line);
            sigma.extend(s);
            beta.extend(b);
            gamma.extend(g);
            dn.extend(d);
        }

        let shape = (rows, cols);
        let to_array = |values: Vec<f32>| {
            Array2::from_shape_vec(shape, values)
                .map_err(|e| SarError::MetadataParse(format!("Calibration table shape: {}", e)))
        };

        log::debug!("Parsed calibration table {} x {}", rows, cols);
        Ok(CalibrationTable {
            lines,
            pixels,
            sigma_nought: to_array(sigma)?,
            beta_nought: to_array(beta)?,
            gamma: to_array(gamma)?,
            dn: to_array(dn)?,
        })
    }

    /// Parse the geolocation grid, `per_line` points per azimuth line
    pub fn parse_geolocation_grid(xml_content: &str, per_line: usize) -> SarResult<GeolocationGrid> {
        let annotation = Self::parse_product_annotation(xml_content)?;
        let points = annotation
            .geolocation_grid
            .and_then(|g| g.point_list)
            .map(|l| l.points)
            .unwrap_or_default();

        if points.is_empty() {
            return Err(SarError::MetadataParse(
                "Annotation has no geolocation grid points".to_string(),
            ));
        }

        log::debug!("Parsed {} geolocation grid points", points.len());
        GeolocationGrid::new(points, per_line)
    }

    /// Image size `(lines, samples)` when the annotation records it
    pub fn parse_image_dimensions(xml_content: &str) -> SarResult<Option<(usize, usize)>> {
        let annotation = Self::parse_product_annotation(xml_content)?;
        let dims = annotation
            .image_annotation
            .and_then(|a| a.image_information)
            .and_then(|info| match (info.number_of_lines, info.number_of_samples) {
                (Some(l), Some(s)) => Some((l, s)),
                _ => None,
            });
        Ok(dims)
    }

    fn parse_product_annotation(xml_content: &str) -> SarResult<ProductAnnotation> {
        from_str::<ProductAnnotation>(xml_content)
            .map_err(|e| SarError::MetadataParse(format!("Failed to parse annotation XML: {}", e)))
    }
}

fn noise_line(line: i64, pixel: &ValueList, lut: &ValueList, lut_name: &str) -> SarResult<NoiseLine> {
    let pixels = pixel.parse::<i64>("pixel")?;
    let values = lut.parse::<f32>(lut_name)?;
    if pixels.len() != values.len() {
        return Err(SarError::MetadataParse(format!(
            "Noise vector at line {} has {} pixels but {} values",
            line,
            pixels.len(),
            values.len()
        )));
    }
    Ok(NoiseLine { line, pixels, values })
}

/// Parse space-separated numbers from a string
pub fn parse_space_separated_numbers<T>(input: &str) -> SarResult<Vec<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    input
        .split_whitespace()
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| SarError::MetadataParse(format!("Parse error for '{}': {}", s, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOISE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<noise>
  <adsHeader><polarisation>HH</polarisation></adsHeader>
  <noiseRangeVectorList count="2">
    <noiseRangeVector>
      <azimuthTime>2020-01-07T03:39:38.000000</azimuthTime>
      <line>0</line>
      <pixel count="3">0 50 99</pixel>
      <noiseRangeLut count="3">1.0e+02 2.0e+02 3.0e+02</noiseRangeLut>
    </noiseRangeVector>
    <noiseRangeVector>
      <azimuthTime>2020-01-07T03:39:39.000000</azimuthTime>
      <line>99</line>
      <pixel count="2">0 99</pixel>
      <noiseRangeLut count="2">1.5e+02 3.5e+02</noiseRangeLut>
    </noiseRangeVector>
  </noiseRangeVectorList>
  <noiseAzimuthVectorList count="1">
    <noiseAzimuthVector>
      <swath>EW1</swath>
      <firstAzimuthLine>0</firstAzimuthLine>
      <firstRangeSample>0</firstRangeSample>
      <lastAzimuthLine>99</lastAzimuthLine>
      <lastRangeSample>49</lastRangeSample>
      <line count="3">0 50 99</line>
      <noiseAzimuthLut count="3">1.0 0.9 1.1</noiseAzimuthLut>
    </noiseAzimuthVector>
  </noiseAzimuthVectorList>
</noise>"#;

    const CALIBRATION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<calibration>
  <calibrationVectorList count="2">
    <calibrationVector>
      <azimuthTime>2020-01-03T17:08:15.674828</azimuthTime>
      <line>0</line>
      <pixel count="3">0 40 80</pixel>
      <sigmaNought count="3">3.3e+02 3.3e+02 3.3e+02</sigmaNought>
      <betaNought count="3">2.37e+02 2.37e+02 2.37e+02</betaNought>
      <gamma count="3">3.1e+02 3.0e+02 2.9e+02</gamma>
      <dn count="3">2.37e+02 2.37e+02 2.37e+02</dn>
    </calibrationVector>
    <calibrationVector>
      <azimuthTime>2020-01-03T17:08:16.674828</azimuthTime>
      <line>60</line>
      <pixel count="3">0 40 80</pixel>
      <sigmaNought count="3">3.3e+02 3.3e+02 3.3e+02</sigmaNought>
      <betaNought count="3">2.37e+02 2.37e+02 2.37e+02</betaNought>
      <gamma count="3">3.2e+02 3.1e+02 3.0e+02</gamma>
      <dn count="3">2.37e+02 2.37e+02 2.37e+02</dn>
    </calibrationVector>
  </calibrationVectorList>
</calibration>"#;

    fn gcp_xml(count: usize) -> String {
        let mut points = String::new();
        for i in 0..count {
            let (row, col) = (i / 21, i % 21);
            points.push_str(&format!(
                "<geolocationGridPoint><azimuthTime>2020-01-07T03:39:38</azimuthTime>\
                 <slantRangeTime>5.3e-03</slantRangeTime><line>{}</line><pixel>{}</pixel>\
                 <latitude>{}</latitude><longitude>{}</longitude><height>0</height>\
                 <incidenceAngle>{}</incidenceAngle><elevationAngle>{}</elevationAngle>\
                 </geolocationGridPoint>",
                row * 10,
                col * 5,
                70.0 + row as f64 * 0.1,
                10.0 + col as f64 * 0.2,
                20.0 + col as f64,
                18.0 + col as f64
            ));
        }
        format!(
            "<product><imageAnnotation><imageInformation><numberOfSamples>101</numberOfSamples>\
             <numberOfLines>21</numberOfLines></imageInformation></imageAnnotation>\
             <geolocationGrid><geolocationGridPointList count=\"{}\">{}</geolocationGridPointList>\
             </geolocationGrid></product>",
            count, points
        )
    }

    #[test]
    fn test_parse_noise_range_and_azimuth() {
        let (table, patches) = MetadataParser::parse_noise(NOISE_XML).unwrap();
        assert_eq!(table.lines.len(), 2);
        assert_eq!(table.lines[0].pixels, vec![0, 50, 99]);
        assert_eq!(table.lines[1].values, vec![150.0, 350.0]);
        assert_eq!(table.sample_count(), 5);
        assert!(!table.is_regular());

        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].line_max, 99);
        assert_eq!(patches[0].sample_max, 49);
        assert_eq!(patches[0].lines, vec![0, 50, 99]);
    }

    #[test]
    fn test_parse_noise_without_azimuth_section() {
        let xml = r#"<noise><noiseRangeVectorList count="1"><noiseRangeVector>
            <line>0</line><pixel count="2">0 10</pixel>
            <noiseRangeLut count="2">1 2</noiseRangeLut>
            </noiseRangeVector></noiseRangeVectorList></noise>"#;
        let (table, patches) = MetadataParser::parse_noise(xml).unwrap();
        assert_eq!(table.lines.len(), 1);
        assert!(patches.is_empty());
    }

    #[test]
    fn test_parse_legacy_noise() {
        let xml = r#"<noise><noiseVectorList count="1"><noiseVector>
            <azimuthTime>2016-01-01T00:00:00</azimuthTime>
            <line>0</line><pixel count="2">0 10</pixel>
            <noiseLut count="2">0.001 0.002</noiseLut>
            </noiseVector></noiseVectorList></noise>"#;
        let (table, patches) = MetadataParser::parse_noise(xml).unwrap();
        assert_eq!(table.lines[0].values, vec![0.001, 0.002]);
        assert!(patches.is_empty());
    }

    #[test]
    fn test_parse_noise_missing_table() {
        let result = MetadataParser::parse_noise("<noise><adsHeader/></noise>");
        assert!(matches!(result, Err(SarError::MetadataParse(_))));
    }

    #[test]
    fn test_parse_noise_length_mismatch() {
        let xml = r#"<noise><noiseRangeVectorList count="1"><noiseRangeVector>
            <line>0</line><pixel count="3">0 10 20</pixel>
            <noiseRangeLut count="2">1 2</noiseRangeLut>
            </noiseRangeVector></noiseRangeVectorList></noise>"#;
        assert!(matches!(
            MetadataParser::parse_noise(xml),
            Err(SarError::MetadataParse(_))
        ));
    }

    #[test]
    fn test_parse_noise_inverted_patch_bounds() {
        let samples = NOISE_XML.replace(
            "<firstRangeSample>0</firstRangeSample>",
            "<firstRangeSample>60</firstRangeSample>",
        );
        let samples = samples.replace(
            "<lastRangeSample>49</lastRangeSample>",
            "<lastRangeSample>10</lastRangeSample>",
        );
        assert!(matches!(
            MetadataParser::parse_noise(&samples),
            Err(SarError::MetadataParse(_))
        ));

        let lines = NOISE_XML.replace(
            "<firstAzimuthLine>0</firstAzimuthLine>",
            "<firstAzimuthLine>120</firstAzimuthLine>",
        );
        assert!(matches!(
            MetadataParser::parse_noise(&lines),
            Err(SarError::MetadataParse(_))
        ));

        // A single-sample patch is valid
        let single = NOISE_XML.replace(
            "<firstRangeSample>0</firstRangeSample>",
            "<firstRangeSample>49</firstRangeSample>",
        );
        assert_eq!(MetadataParser::parse_noise(&single).unwrap().1[0].sample_min, 49);
    }

    #[test]
    fn test_parse_calibration_table() {
        let table = MetadataParser::parse_calibration(CALIBRATION_XML).unwrap();
        assert_eq!(table.lines, vec![0, 60]);
        assert_eq!(table.pixels, vec![0, 40, 80]);
        assert_eq!(table.gamma.dim(), (2, 3));
        assert!((table.gamma[[1, 0]] - 320.0).abs() < 1e-3);
        assert_eq!(table.dn_reference(), Some(237.0));
    }

    #[test]
    fn test_parse_calibration_missing_vectors() {
        let result = MetadataParser::parse_calibration("<calibration></calibration>");
        assert!(matches!(result, Err(SarError::MetadataParse(_))));
    }

    #[test]
    fn test_parse_geolocation_grid() {
        let grid = MetadataParser::parse_geolocation_grid(&gcp_xml(42), 21).unwrap();
        assert_eq!(grid.points().len(), 42);
        assert_eq!(grid.lines(), vec![0.0, 10.0]);
        assert_eq!(grid.pixels().len(), 21);
        assert_eq!(grid.pixels()[20], 100.0);

        let elevation = grid.field(|p| p.elevation_angle).unwrap();
        assert_eq!(elevation.dim(), (2, 21));
        assert_eq!(elevation[[1, 3]], 21.0);
    }

    #[test]
    fn test_geolocation_grid_inconsistent_count() {
        let result = MetadataParser::parse_geolocation_grid(&gcp_xml(43), 21);
        assert!(matches!(
            result,
            Err(SarError::GridInconsistency { count: 43, per_line: 21 })
        ));
    }

    #[test]
    fn test_parse_image_dimensions() {
        let dims = MetadataParser::parse_image_dimensions(&gcp_xml(21)).unwrap();
        assert_eq!(dims, Some((21, 101)));
    }

    #[test]
    fn test_parse_space_separated_numbers() {
        let values: Vec<f32> = parse_space_separated_numbers(" 1.5  2e+01\n3 ").unwrap();
        assert_eq!(values, vec![1.5, 20.0, 3.0]);
        assert!(parse_space_separated_numbers::<usize>("1 x 3").is_err());
    }
}
