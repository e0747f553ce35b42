//! Application bootstrap implementation.

use std::sync::Arc;

use tracing::info;

use super::error::AppError;
use crate::burst::BurstStager;
use crate::config::{ConfigFile, WmsSettings};
use crate::layer::TileLoader;
use crate::target::HttpTileTarget;
use crate::throttle::RequestThrottler;
use crate::wms::WmsLayer;

/// WaveTile application: the shared tile loading stack for one map view.
///
/// Every layer of the view loads through the same [`TileLoader`], so the
/// throttler limits apply across layers and a layer or time step change
/// restarts burst staging for all of them.
#[derive(Debug)]
pub struct WaveTileApp {
    loader: TileLoader<HttpTileTarget>,
    target: HttpTileTarget,
    layer: Option<WmsLayer>,
}

impl WaveTileApp {
    /// Builds the application from a loaded configuration file.
    ///
    /// The default layer is created when both `wms.url` and `wms.layer` are
    /// set; setting only one of them is an error.
    pub fn from_config(config: &ConfigFile) -> Result<Self, AppError> {
        let throttle_config = config.throttle_config();
        throttle_config.validate().map_err(AppError::Config)?;

        let target = HttpTileTarget::new()?;
        let stager = Arc::new(BurstStager::new(config.burst_config()));
        let throttler = RequestThrottler::new(throttle_config);

        let layer = match (config.wms.url.as_deref(), config.wms.layer.as_deref()) {
            (Some(url), Some(name)) => Some(build_layer(url, name, &config.wms)?),
            (None, None) => None,
            (Some(_), None) => {
                return Err(AppError::Config(
                    "wms.layer must be set when wms.url is".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(AppError::Config(
                    "wms.url must be set when wms.layer is".to_string(),
                ))
            }
        };

        info!(
            burst_threshold = config.burst.threshold,
            layer = layer.as_ref().map(WmsLayer::name).unwrap_or("<none>"),
            "WaveTile application initialized"
        );

        Ok(Self {
            loader: TileLoader::new(stager, throttler),
            target,
            layer,
        })
    }

    /// Replaces the default layer.
    pub fn with_layer(mut self, layer: WmsLayer) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Shared tile loader.
    pub fn loader(&self) -> &TileLoader<HttpTileTarget> {
        &self.loader
    }

    /// HTTP target to clone for each tile load.
    pub fn target(&self) -> &HttpTileTarget {
        &self.target
    }

    /// The configured default layer, if any.
    pub fn layer(&self) -> Option<&WmsLayer> {
        self.layer.as_ref()
    }
}

/// Builds a WMS layer applying the optional `[wms]` settings.
pub fn build_layer(url: &str, name: &str, settings: &WmsSettings) -> Result<WmsLayer, AppError> {
    let mut layer = WmsLayer::new(url, name)?
        .with_styles(settings.styles.clone())
        .with_format(settings.format.clone());

    if let Some((min, max)) = settings.color_scale_range {
        layer = layer.with_color_scale_range(min, max);
    }
    if let Some(bands) = settings.num_color_bands {
        layer = layer.with_num_color_bands(bands);
    }

    Ok(layer)
}
