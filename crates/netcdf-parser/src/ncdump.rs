//! Scene decoding through the `ncdump` command-line tool.
//!
//! This needs no native libraries in the process: `ncdump` is run once with
//! `-v band_id,t,CMI` and its CDL text output (header followed by a `data:`
//! section) is parsed.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, instrument};

use crate::error::{NetCdfError, NetCdfResult};
use crate::projection::GoesProjection;
use crate::scene::{AxisEncoding, GoesScene};
use crate::SceneDecoder;

const DATA_VARIABLE: &str = "CMI";
const PROJECTION_VARIABLE: &str = "goes_imager_projection";

/// Decoder backed by the `ncdump` binary.
#[derive(Debug, Clone)]
pub struct NcdumpDecoder {
    binary: PathBuf,
}

impl NcdumpDecoder {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ncdump"),
        }
    }

    /// Use a specific `ncdump` executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for NcdumpDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneDecoder for NcdumpDecoder {
    #[instrument(skip(self), fields(binary = %self.binary.display()))]
    fn decode(&self, path: &Path) -> NetCdfResult<GoesScene> {
        let output = Command::new(&self.binary)
            .arg("-v")
            .arg(format!("band_id,t,{}", DATA_VARIABLE))
            .arg("-p")
            .arg("9,17")
            .arg(path)
            .output()
            .map_err(|e| NetCdfError::CommandError(format!("Failed to run ncdump: {}", e)))?;

        if !output.status.success() {
            return Err(NetCdfError::CommandError(format!(
                "ncdump failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let scene = parse_cdl(&text)?;
        debug!(
            width = scene.width,
            height = scene.height,
            valid = scene.valid_count(),
            "Decoded scene via ncdump"
        );
        Ok(scene)
    }
}

/// Parse the CDL text produced by `ncdump -v band_id,t,CMI`.
pub fn parse_cdl(text: &str) -> NetCdfResult<GoesScene> {
    let (header, data) = match text.find("data:") {
        Some(pos) => (&text[..pos], &text[pos + "data:".len()..]),
        None => return Err(NetCdfError::MissingData("data section".to_string())),
    };

    let width = parse_dimension(header, "x")?;
    let height = parse_dimension(header, "y")?;

    let scale_factor = parse_attribute(header, DATA_VARIABLE, "scale_factor").unwrap_or(1.0);
    let add_offset = parse_attribute(header, DATA_VARIABLE, "add_offset").unwrap_or(0.0);
    let fill_value = parse_attribute(header, DATA_VARIABLE, "_FillValue")
        .map(|v| v as i64)
        .unwrap_or(-1);
    let unsigned = parse_string_attribute(header, DATA_VARIABLE, "_Unsigned")
        .map(|s| s.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let x = AxisEncoding::new(
        parse_attribute(header, "x", "scale_factor").unwrap_or(1.4e-05),
        parse_attribute(header, "x", "add_offset").unwrap_or(-0.101353),
    );
    let y = AxisEncoding::new(
        parse_attribute(header, "y", "scale_factor").unwrap_or(-1.4e-05),
        parse_attribute(header, "y", "add_offset").unwrap_or(0.128233),
    );

    let projection = GoesProjection {
        perspective_point_height: parse_attribute(header, PROJECTION_VARIABLE, "perspective_point_height")?,
        semi_major_axis: parse_attribute(header, PROJECTION_VARIABLE, "semi_major_axis")?,
        semi_minor_axis: parse_attribute(header, PROJECTION_VARIABLE, "semi_minor_axis")?,
        longitude_origin: parse_attribute(header, PROJECTION_VARIABLE, "longitude_of_projection_origin")?,
        sweep_angle_axis: parse_string_attribute(header, PROJECTION_VARIABLE, "sweep_angle_axis")
            .unwrap_or_else(|| "x".to_string()),
    };

    let block = data_block(data, DATA_VARIABLE)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} data section", DATA_VARIABLE)))?;

    let mut values = Vec::with_capacity(width * height);
    for token in block.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        if token == "_" {
            // Fill value marker
            values.push(f32::NAN);
            continue;
        }
        let raw: i64 = token
            .parse()
            .map_err(|_| NetCdfError::InvalidFormat(format!("Bad {} value '{}'", DATA_VARIABLE, token)))?;
        if raw == fill_value {
            values.push(f32::NAN);
            continue;
        }
        let raw = if unsigned && raw < 0 { raw + 65536 } else { raw };
        values.push((raw as f64 * scale_factor + add_offset) as f32);
    }

    if values.len() != width * height {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} has {} values, expected {}x{}",
            DATA_VARIABLE,
            values.len(),
            width,
            height
        )));
    }

    let band_id = data_block(data, "band_id")
        .and_then(|b| first_number(b))
        .map(|v| v as u8);
    let time = data_block(data, "t")
        .and_then(|b| first_number(b))
        .and_then(j2000_seconds_to_utc);

    Ok(GoesScene {
        data: values,
        width,
        height,
        projection,
        x,
        y,
        band_id,
        time,
    })
}

/// ABI times are seconds since 2000-01-01 12:00:00 UTC.
fn j2000_seconds_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).single()?;
    Some(j2000 + Duration::milliseconds((seconds * 1000.0) as i64))
}

fn parse_dimension(header: &str, name: &str) -> NetCdfResult<usize> {
    // Look for pattern like "x = 5424 ;" inside the dimensions block
    for line in header.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix(name) {
            if let Some(value) = rest.trim_start().strip_prefix('=') {
                let num_str = value.trim().trim_end_matches(';').trim();
                return num_str
                    .parse()
                    .map_err(|_| NetCdfError::InvalidFormat(format!("Failed to parse dimension {}", name)));
            }
        }
    }
    Err(NetCdfError::MissingData(format!("dimension {}", name)))
}

/// Raw right-hand side of `var:name = ... ;`.
fn attribute_text<'a>(header: &'a str, var: &str, name: &str) -> Option<&'a str> {
    let pattern = format!("{}:{} =", var, name);
    header.lines().find_map(|line| {
        let trimmed = line.trim();
        trimmed
            .strip_prefix(pattern.as_str())
            .map(|rest| rest.trim().trim_end_matches(';').trim())
    })
}

fn parse_attribute(header: &str, var: &str, name: &str) -> NetCdfResult<f64> {
    let text = attribute_text(header, var, name)
        .ok_or_else(|| NetCdfError::MissingData(format!("attribute {}:{}", var, name)))?;
    // Arrays keep their first element
    let first = text.split(',').next().unwrap_or(text).trim();
    // CDL type suffixes: 1.5f, -1s, 7b, 12L
    let clean = first
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .trim_end_matches('.');
    clean.parse().map_err(|_| {
        NetCdfError::InvalidFormat(format!("Failed to parse attribute {}:{}: '{}'", var, name, first))
    })
}

fn parse_string_attribute(header: &str, var: &str, name: &str) -> Option<String> {
    attribute_text(header, var, name).map(|s| s.trim_matches('"').to_string())
}

/// Values of `var = ... ;` in the data section.
fn data_block<'a>(data: &'a str, var: &str) -> Option<&'a str> {
    data.split(';').find_map(|chunk| {
        let rest = chunk.trim_start().strip_prefix(var)?;
        rest.trim_start().strip_prefix('=')
    })
}

fn first_number(block: &str) -> Option<f64> {
    block
        .split(|c: char| c == ',' || c.is_whitespace())
        .find(|t| !t.is_empty())
        .and_then(|t| t.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"netcdf OR_ABI-L2-CMIPF-M6C13_G19_s20250731500 {
dimensions:
	y = 2 ;
	x = 3 ;
	band = 1 ;
variables:
	short CMI(y, x) ;
		CMI:_FillValue = -1s ;
		CMI:long_name = "ABI L2+ Cloud and Moisture Imagery brightness temperature" ;
		CMI:scale_factor = 0.01f ;
		CMI:add_offset = 200.f ;
		CMI:units = "K" ;
		CMI:_Unsigned = "true" ;
	short y(y) ;
		y:scale_factor = -5.6e-05f ;
		y:add_offset = 0.151844f ;
	short x(x) ;
		x:scale_factor = 5.6e-05f ;
		x:add_offset = -0.151844f ;
	int goes_imager_projection ;
		goes_imager_projection:long_name = "GOES-R ABI fixed grid projection" ;
		goes_imager_projection:perspective_point_height = 35786023. ;
		goes_imager_projection:semi_major_axis = 6378137. ;
		goes_imager_projection:semi_minor_axis = 6356752.31414 ;
		goes_imager_projection:longitude_of_projection_origin = -75.2 ;
		goes_imager_projection:sweep_angle_axis = "x" ;
	byte band_id(band) ;
	double t ;

// global attributes:
		:scene_id = "Full Disk" ;
data:

 band_id = 13 ;

 t = 797439300.5 ;

 CMI =
  100, -1, 200,
  _, 300, -32768 ;
}
"#;

    #[test]
    fn test_parse_sample_scene() {
        let scene = parse_cdl(SAMPLE).unwrap();
        assert_eq!(scene.width, 3);
        assert_eq!(scene.height, 2);
        assert_eq!(scene.band_id, Some(13));
        assert!(scene.time.is_some());

        assert!((scene.data[0] - 201.0).abs() < 1e-4);
        assert!(scene.data[1].is_nan(), "fill value should become NaN");
        assert!((scene.data[2] - 202.0).abs() < 1e-4);
        assert!(scene.data[3].is_nan(), "'_' marker should become NaN");
        assert!((scene.data[4] - 203.0).abs() < 1e-4);
        // -32768 read as unsigned is 32768
        assert!((scene.data[5] - 527.68).abs() < 1e-2);
    }

    #[test]
    fn test_parse_projection_and_axes() {
        let scene = parse_cdl(SAMPLE).unwrap();
        assert_eq!(scene.projection.perspective_point_height, 35786023.0);
        assert_eq!(scene.projection.longitude_origin, -75.2);
        assert_eq!(scene.projection.sweep_angle_axis, "x");
        assert!((scene.x.scale_factor - 5.6e-05).abs() < 1e-12);
        assert!((scene.y.add_offset - 0.151844).abs() < 1e-9);
    }

    #[test]
    fn test_missing_data_section() {
        let header_only = SAMPLE.split("data:").next().unwrap();
        let err = parse_cdl(header_only).unwrap_err();
        assert!(matches!(err, NetCdfError::MissingData(_)));
    }

    #[test]
    fn test_value_count_mismatch() {
        let truncated = SAMPLE.replace("_, 300, -32768 ;", "_ ;");
        let err = parse_cdl(&truncated).unwrap_err();
        assert!(matches!(err, NetCdfError::InvalidFormat(_)));
    }

    #[test]
    fn test_attribute_suffixes() {
        let header = "\t\tCMI:scale_factor = 0.0001564351f ;\n\t\tCMI:_FillValue = -1s ;\n";
        assert!((parse_attribute(header, "CMI", "scale_factor").unwrap() - 0.0001564351).abs() < 1e-12);
        assert_eq!(parse_attribute(header, "CMI", "_FillValue").unwrap(), -1.0);
        assert!(parse_attribute(header, "CMI", "add_offset").is_err());
    }

    #[test]
    fn test_missing_binary_is_command_error() {
        let decoder = NcdumpDecoder::with_binary("/nonexistent/ncdump");
        let err = decoder.decode(Path::new("/tmp/none.nc")).unwrap_err();
        assert!(matches!(err, NetCdfError::CommandError(_)));
    }
}
