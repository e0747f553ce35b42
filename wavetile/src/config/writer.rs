//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let url = config.wms.url.as_deref().unwrap_or("");
    let layer = config.wms.layer.as_deref().unwrap_or("");
    let color_scale_range = config
        .wms
        .color_scale_range
        .map(|(min, max)| format!("{},{}", min, max))
        .unwrap_or_default();
    let num_color_bands = config
        .wms
        .num_color_bands
        .map(|bands| bands.to_string())
        .unwrap_or_default();

    format!(
        r#"[throttle]
; Maximum number of tile requests in flight across all servers (default: 3)
max_concurrent = {}
; Maximum number of tile requests in flight per server host (default: 2)
max_per_domain = {}
; Minimum spacing between two request starts, in milliseconds (default: 50)
min_delay_ms = {}
; A tile load still running after this many milliseconds is failed (default: 10000)
; Time spent waiting in the queue does not count
tile_timeout_ms = {}

[burst]
; After a layer or time step change, the first tiles are delayed by
; 1x, 2x, 3x ... step_delay_ms until this many tiles have been seen (default: 10)
threshold = {}
step_delay_ms = {}

[wms]
; THREDDS/ncWMS endpoint used by `wavetile fetch` when --url is not given
; Example: url = https://gem-thredds.spc.int/thredds/wms/POP/model/regional/fiji/forecast/hourly/Fiji
url = {}
; Layer name (LAYERS parameter), e.g. Hs, Tm, Dir
layer = {}
; STYLES parameter, e.g. default-scalar/x-Sst (empty for server default)
styles = {}
; Image MIME type (default: image/png)
format = {}
; ncWMS colour scale as min,max (empty for server default)
colorscalerange = {}
; ncWMS number of colour bands (empty for server default)
numcolorbands = {}

[logging]
; Directory for the log file (default: ~/.wavetile/logs)
directory = {}
file = {}
"#,
        config.throttle.max_concurrent,
        config.throttle.max_per_domain,
        config.throttle.min_delay_ms,
        config.throttle.tile_timeout_ms,
        config.burst.threshold,
        config.burst.step_delay_ms,
        url,
        layer,
        config.wms.styles,
        config.wms.format,
        color_scale_range,
        num_color_bands,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
