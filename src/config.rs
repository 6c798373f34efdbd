use std::{fs, path::Path};

use serde::Deserialize;

use crate::{FlowCanvasError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// viewport config
    pub viewport: ViewportConfig,
    /// graph config
    pub graph: GraphConfig,
    /// local cache config
    pub cache: CacheConfig,
    /// workflow service config
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// lower zoom bound
    pub min_scale: f64,
    /// upper zoom bound
    pub max_scale: f64,
    /// margin added around the content box on fit-to-content
    pub fit_padding: f64,
    /// zoom used when focusing a single node, capped by `max_scale`
    pub focus_scale: f64,
    /// default animation duration in milliseconds
    pub animation_ms: u64,
    /// keyboard pan distance in screen pixels
    pub pan_step: f64,
    /// zoom-in factor of the zoom buttons; zoom-out uses `2 - zoom_step`
    pub zoom_step: f64,
    /// screen-space origin of the canvas element
    pub left: f64,
    pub top: f64,
    /// screen-space size of the canvas element
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.3,
            max_scale: 3.0,
            fit_padding: 50.0,
            focus_scale: 1.5,
            animation_ms: 500,
            pan_step: 50.0,
            zoom_step: 1.2,
            left: 0.0,
            top: 0.0,
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// node width used until the host reports a measured size
    pub node_width: f64,
    /// node height used until the host reports a measured size
    pub node_height: f64,
    /// local cache key holding the in-progress session
    pub cache_key: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 80.0,
            cache_key: "workflow_data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// cache type
    pub cache_type: CacheType,
    /// max entries kept by the mem cache
    pub capacity: usize,
    /// directory used by the file cache
    pub path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::Mem,
            capacity: 64,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    #[default]
    Mem,
    File,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// service type
    pub service_type: ServiceType,
    /// base url of the http service
    pub base_url: String,
    /// request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_type: ServiceType::Mem,
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    #[default]
    Mem,
    Http,
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| FlowCanvasError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let v = &self.viewport;
        if !(v.min_scale > 0.0 && v.min_scale <= v.max_scale) {
            return Err(FlowCanvasError::Config(format!("invalid zoom bounds [{}, {}]", v.min_scale, v.max_scale)));
        }
        if v.width <= 0.0 || v.height <= 0.0 {
            return Err(FlowCanvasError::Config("viewport size must be positive".to_string()));
        }
        if self.cache.cache_type == CacheType::File && self.cache.path.is_none() {
            return Err(FlowCanvasError::Config("file cache requires a path".to_string()));
        }
        Ok(())
    }
}
