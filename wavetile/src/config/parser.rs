//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [throttle] section
    if let Some(section) = ini.section(Some("throttle")) {
        if let Some(v) = section.get("max_concurrent") {
            config.throttle.max_concurrent = parse_positive("throttle", "max_concurrent", v)?;
        }
        if let Some(v) = section.get("max_per_domain") {
            config.throttle.max_per_domain = parse_positive("throttle", "max_per_domain", v)?;
        }
        if let Some(v) = section.get("min_delay_ms") {
            config.throttle.min_delay_ms = parse_number(
                "throttle",
                "min_delay_ms",
                v,
                "must be a non-negative integer (milliseconds)",
            )?;
        }
        if let Some(v) = section.get("tile_timeout_ms") {
            config.throttle.tile_timeout_ms = parse_positive("throttle", "tile_timeout_ms", v)?;
        }
    }

    // [burst] section
    if let Some(section) = ini.section(Some("burst")) {
        if let Some(v) = section.get("threshold") {
            config.burst.threshold = parse_number(
                "burst",
                "threshold",
                v,
                "must be a non-negative integer",
            )?;
        }
        if let Some(v) = section.get("step_delay_ms") {
            config.burst.step_delay_ms = parse_number(
                "burst",
                "step_delay_ms",
                v,
                "must be a non-negative integer (milliseconds)",
            )?;
        }
    }

    // [wms] section
    if let Some(section) = ini.section(Some("wms")) {
        if let Some(v) = non_empty(section.get("url")) {
            if crate::wms::origin_of(v).is_err() {
                return Err(invalid("wms", "url", v, "must be an absolute http(s) URL"));
            }
            config.wms.url = Some(v.to_string());
        }
        if let Some(v) = non_empty(section.get("layer")) {
            config.wms.layer = Some(v.to_string());
        }
        if let Some(v) = section.get("styles") {
            config.wms.styles = v.trim().to_string();
        }
        if let Some(v) = non_empty(section.get("format")) {
            if !v.contains('/') {
                return Err(invalid("wms", "format", v, "must be a MIME type like image/png"));
            }
            config.wms.format = v.to_string();
        }
        if let Some(v) = non_empty(section.get("colorscalerange")) {
            config.wms.color_scale_range = Some(parse_range(v).ok_or_else(|| {
                invalid(
                    "wms",
                    "colorscalerange",
                    v,
                    "expected 'min,max' with min < max",
                )
            })?);
        }
        if let Some(v) = non_empty(section.get("numcolorbands")) {
            config.wms.num_color_bands = Some(parse_positive("wms", "numcolorbands", v)?);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    let reason = "must be a positive integer";
    let parsed: T = parse_number(section, key, value, reason)?;
    if parsed <= T::default() {
        return Err(invalid(section, key, value, reason));
    }
    Ok(parsed)
}

/// Parses `min,max` into an ordered pair.
fn parse_range(value: &str) -> Option<(f64, f64)> {
    let (min, max) = value.split_once(',')?;
    let min: f64 = min.trim().parse().ok()?;
    let max: f64 = max.trim().parse().ok()?;
    (min.is_finite() && max.is_finite() && min < max).then_some((min, max))
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_throttle_and_burst_overrides() {
        let config = parse(
            "[throttle]\nmax_concurrent = 8\nmin_delay_ms = 0\n\n[burst]\nthreshold = 0\nstep_delay_ms = 25\n",
        )
        .unwrap();

        assert_eq!(config.throttle.max_concurrent, 8);
        assert_eq!(config.throttle.max_per_domain, 2);
        assert_eq!(config.throttle.min_delay_ms, 0);
        assert_eq!(config.burst.threshold, 0);
        assert_eq!(config.burst.step_delay_ms, 25);
    }

    #[test]
    fn test_zero_limits_rejected() {
        let err = parse("[throttle]\nmax_concurrent = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "max_concurrent"
        ));

        assert!(parse("[throttle]\ntile_timeout_ms = 0\n").is_err());
    }

    #[test]
    fn test_wms_section() {
        let config = parse(
            "[wms]\nurl = https://ocean.example.org/ncWMS/wms\nlayer = tp\nstyles = default-scalar/seq-Blues\ncolorscalerange = 0, 20\nnumcolorbands = 100\n",
        )
        .unwrap();

        assert_eq!(
            config.wms.url.as_deref(),
            Some("https://ocean.example.org/ncWMS/wms")
        );
        assert_eq!(config.wms.layer.as_deref(), Some("tp"));
        assert_eq!(config.wms.styles, "default-scalar/seq-Blues");
        assert_eq!(config.wms.format, "image/png");
        assert_eq!(config.wms.color_scale_range, Some((0.0, 20.0)));
        assert_eq!(config.wms.num_color_bands, Some(100));
    }

    #[test]
    fn test_empty_wms_values_stay_unset() {
        let config = parse("[wms]\nurl =\nlayer =\ncolorscalerange =\n").unwrap();
        assert_eq!(config.wms.url, None);
        assert_eq!(config.wms.layer, None);
        assert_eq!(config.wms.color_scale_range, None);
    }

    #[test]
    fn test_invalid_wms_values() {
        assert!(parse("[wms]\nurl = thredds\n").is_err());
        assert!(parse("[wms]\ncolorscalerange = 5,1\n").is_err());
        assert!(parse("[wms]\nformat = png\n").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
        if dirs::home_dir().is_some() {
            assert_eq!(expand_tilde("~/logs"), home.join("logs"));
        }
        assert_eq!(expand_tilde("/var/log/wavetile"), PathBuf::from("/var/log/wavetile"));
    }
}
