use glam::Vec3;
use log::{debug, warn};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::atmosphere::{FOG_DENSITY, FOG_HORIZON_TINT, FOG_TINT_MIX};
use crate::display::DISPLAY_GAMMA;
use crate::error::ConfigError;
use crate::lighting::{
    DETAIL_NOISE_STRENGTH, FRESNEL_POWER, GROUND_COLOR, RIM_STRENGTH, SHADOW_STRENGTH, SKY_COLOR,
    SUN_COLOR,
};
use crate::noise::TRIPLANAR_SHARPNESS;
use crate::shadow::{ShadowFilter, BIAS_MIN, BIAS_SLOPE, FILTER_FALLOFF};
use crate::transform::NORMAL_OFFSET;

/// Tunable constants of the shading pipeline.
///
/// The defaults reproduce the terrain look the pipeline was tuned for; the
/// fog density in particular assumes the default planet scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    pub sun_color: Vec3,
    pub sky_color: Vec3,
    pub ground_color: Vec3,
    pub shadow_strength: f32,
    pub normal_offset: f32,
    pub bias_slope: f32,
    pub bias_min: f32,
    pub filter_falloff: f32,
    pub detail_noise_strength: f32,
    pub triplanar_sharpness: f32,
    pub rim_strength: f32,
    pub fresnel_power: f32,
    pub fog_density: f32,
    pub fog_horizon_tint: Vec3,
    pub fog_tint_mix: f32,
    pub gamma: f32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            sun_color: SUN_COLOR,
            sky_color: SKY_COLOR,
            ground_color: GROUND_COLOR,
            shadow_strength: SHADOW_STRENGTH,
            normal_offset: NORMAL_OFFSET,
            bias_slope: BIAS_SLOPE,
            bias_min: BIAS_MIN,
            filter_falloff: FILTER_FALLOFF,
            detail_noise_strength: DETAIL_NOISE_STRENGTH,
            triplanar_sharpness: TRIPLANAR_SHARPNESS,
            rim_strength: RIM_STRENGTH,
            fresnel_power: FRESNEL_POWER,
            fog_density: FOG_DENSITY,
            fog_horizon_tint: FOG_HORIZON_TINT,
            fog_tint_mix: FOG_TINT_MIX,
            gamma: DISPLAY_GAMMA,
        }
    }
}

impl ShadingConfig {
    /// Parses a `<shading>` document, starting from the defaults.
    ///
    /// ```xml
    /// <shading>
    ///     <fog_density>0.002</fog_density>
    ///     <sun_color>1.6 1.5 1.3</sun_color>
    /// </shading>
    /// ```
    pub fn from_xml(xml: &str) -> Result<Self, ConfigError> {
        let document = Document::parse(xml)?;
        let root = document.root_element();
        if !root.has_tag_name("shading") {
            return Err(ConfigError::UnexpectedRoot(
                root.tag_name().name().to_string(),
            ));
        }

        let mut config = Self::default();
        for node in root.children().filter(Node::is_element) {
            let field = node.tag_name().name();
            let text = node.text().map(str::trim).unwrap_or_default();
            match field {
                "sun_color" => config.sun_color = parse_vec3(field, text)?,
                "sky_color" => config.sky_color = parse_vec3(field, text)?,
                "ground_color" => config.ground_color = parse_vec3(field, text)?,
                "shadow_strength" => config.shadow_strength = parse_f32(field, text)?,
                "normal_offset" => config.normal_offset = parse_f32(field, text)?,
                "bias_slope" => config.bias_slope = parse_f32(field, text)?,
                "bias_min" => config.bias_min = parse_f32(field, text)?,
                "filter_falloff" => config.filter_falloff = parse_f32(field, text)?,
                "detail_noise_strength" => config.detail_noise_strength = parse_f32(field, text)?,
                "triplanar_sharpness" => config.triplanar_sharpness = parse_f32(field, text)?,
                "rim_strength" => config.rim_strength = parse_f32(field, text)?,
                "fresnel_power" => config.fresnel_power = parse_f32(field, text)?,
                "fog_density" => config.fog_density = parse_f32(field, text)?,
                "fog_horizon_tint" => config.fog_horizon_tint = parse_vec3(field, text)?,
                "fog_tint_mix" => config.fog_tint_mix = parse_f32(field, text)?,
                "gamma" => config.gamma = parse_f32(field, text)?,
                other => warn!("ignoring unknown shading setting <{other}>"),
            }
        }

        config.validate()?;
        debug!("loaded shading config: {config:?}");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let vectors = [
            self.sun_color,
            self.sky_color,
            self.ground_color,
            self.fog_horizon_tint,
        ];
        let scalars = [
            self.shadow_strength,
            self.normal_offset,
            self.bias_slope,
            self.bias_min,
            self.filter_falloff,
            self.detail_noise_strength,
            self.triplanar_sharpness,
            self.rim_strength,
            self.fresnel_power,
            self.fog_density,
            self.fog_tint_mix,
            self.gamma,
        ];
        if !vectors.iter().all(|v| v.is_finite()) || !scalars.iter().all(|s| s.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "shading config",
                reason: "contains a non-finite value",
            });
        }
        if !(0.0..=1.0).contains(&self.shadow_strength) {
            return Err(ConfigError::OutOfRange {
                field: "shadow_strength",
                reason: "must be within [0, 1]",
            });
        }
        if self.fog_density < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "fog_density",
                reason: "must not be negative",
            });
        }
        if self.gamma <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "gamma",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Shadow bias and filter settings.
    pub fn shadow_filter(&self) -> ShadowFilter {
        ShadowFilter {
            bias_slope: self.bias_slope,
            bias_min: self.bias_min,
            falloff: self.filter_falloff,
        }
    }

    pub fn fog_color(&self) -> Vec3 {
        crate::atmosphere::fog_color(self.sky_color, self.fog_horizon_tint, self.fog_tint_mix)
    }
}

fn parse_f32(field: &str, text: &str) -> Result<f32, ConfigError> {
    text.parse::<f32>().map_err(|_| ConfigError::InvalidNumber {
        field: field.to_string(),
        value: text.to_string(),
    })
}

fn parse_vec3(field: &str, text: &str) -> Result<Vec3, ConfigError> {
    let invalid = || ConfigError::InvalidVector {
        field: field.to_string(),
        value: text.to_string(),
    };
    let components = text
        .split_whitespace()
        .map(|component| component.parse::<f32>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    match components.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(invalid()),
    }
}
