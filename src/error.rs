use thiserror::Error;

/// Errors raised while loading or validating a [`crate::ShadingConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid shading XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("expected a <shading> root element, found <{0}>")]
    UnexpectedRoot(String),
    #[error("<{field}> is not a valid number: {value:?}")]
    InvalidNumber { field: String, value: String },
    #[error("<{field}> needs three components, got {value:?}")]
    InvalidVector { field: String, value: String },
    #[error("{field} {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}

/// Errors raised while building a [`crate::DepthShadowMap`].
#[derive(Debug, Error, PartialEq)]
pub enum ShadowMapError {
    #[error("shadow map must have a non-zero size, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("shadow map expects {expected} depth texels, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("depth texel {index} is not finite")]
    NonFiniteDepth { index: usize },
}
