//! plotrace-export: Pure SVG serializer (sans-IO)
//!
//! Converts ordered pixel paths into an SVG document for pen-plotter
//! software, plus a diagnostic rendering of the pen-up moves between
//! paths.

pub mod svg;

pub use svg::{SvgMetadata, VectorDocument, build_path_data, to_svg, to_travel_diagnostic_svg};
