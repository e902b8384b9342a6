//! SVG export serializer.
//!
//! Converts traced paths into an SVG string with `<path>` elements using
//! the [`svg`] crate for document construction, XML escaping, and path
//! data formatting.
//!
//! Each path becomes a separate `<path>` element using `M` (move to)
//! and `L` (line to) commands, in the order given. The document's
//! coordinate space is the source pixel grid.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use plotrace_pipeline::{Dimensions, PathSet, PipelineConfig, Polyline, ProcessResult};

/// Namespace for the `<plotrace:pipeline>` metadata element.
const METADATA_NAMESPACE: &str = "urn:plotrace:pipeline:1";

/// Everything needed to render one plot: the ordered paths plus the
/// page and stroke settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorDocument {
    /// Page size; also the `viewBox`.
    pub dimensions: Dimensions,
    /// Paths in plotting order.
    pub paths: PathSet,
    /// Stroke color applied to every path.
    pub stroke_color: String,
    /// Stroke width in user units.
    pub stroke_width: u32,
}

impl VectorDocument {
    /// Stroke width used for every exported path.
    pub const STROKE_WIDTH: u32 = 1;

    /// Wrap paths and dimensions with the given stroke color.
    #[must_use]
    pub fn new(dimensions: Dimensions, paths: PathSet, stroke_color: impl Into<String>) -> Self {
        Self {
            dimensions,
            paths,
            stroke_color: stroke_color.into(),
            stroke_width: Self::STROKE_WIDTH,
        }
    }

    /// Build a document from a pipeline result, taking the stroke color
    /// from `config.line_color`.
    #[must_use]
    pub fn from_result(result: ProcessResult, config: &PipelineConfig) -> Self {
        Self::new(result.dimensions, result.paths, config.line_color.clone())
    }
}

/// Metadata to embed in the SVG document.
///
/// All fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized [`PipelineConfig`] JSON, emitted inside a `<metadata>`
    /// element wrapped in a namespaced `<plotrace:pipeline>` element so
    /// exported files carry the settings that produced them.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a path.
///
/// Uses `M` for the first point and `L` for subsequent points.
/// Returns an empty string for paths with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use plotrace_pipeline::{PixelCoordinate, Polyline};
/// use plotrace_export::build_path_data;
///
/// let path = Polyline::new(vec![
///     PixelCoordinate::new(10, 20),
///     PixelCoordinate::new(30, 40),
/// ]);
/// assert_eq!(build_path_data(&path), "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(polyline: &Polyline) -> String {
    let points = polyline.points();
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((f64::from(first.x), f64::from(first.y)));
    for p in &points[1..] {
        data = data.line_to((f64::from(p.x), f64::from(p.y)));
    }
    String::from(Value::from(data))
}

/// Serialize a [`VectorDocument`] into an SVG document string.
///
/// The root element carries `width`, `height`, and a `viewBox` of
/// `0 0 width height`, so one user unit is one source pixel. Each path
/// with 2 or more points becomes a `<path>` element with
/// `fill="none"`, the document's stroke color, and its stroke width.
/// Shorter paths are skipped. An empty document is still a valid SVG
/// with the right size and no `<path>` children.
///
/// # Examples
///
/// ```
/// use plotrace_pipeline::{Dimensions, PixelCoordinate, Polyline};
/// use plotrace_export::{SvgMetadata, VectorDocument, to_svg};
///
/// let paths = vec![Polyline::new(vec![
///     PixelCoordinate::new(10, 15),
///     PixelCoordinate::new(12, 18),
/// ])];
/// let doc = VectorDocument::new(Dimensions { width: 800, height: 600 }, paths, "#000000");
/// let metadata = SvgMetadata {
///     title: Some("sketch"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&doc, &metadata);
/// assert!(svg.contains("<title>sketch</title>"));
/// assert!(svg.contains("M10,15 L12,18"));
/// ```
#[must_use]
pub fn to_svg(document: &VectorDocument, metadata: &SvgMetadata<'_>) -> String {
    let w = document.dimensions.width;
    let h = document.dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut pipeline_el = Element::new("plotrace:pipeline");
        pipeline_el.assign("xmlns:plotrace", METADATA_NAMESPACE);
        pipeline_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(pipeline_el);
        doc = doc.add(metadata_el);
    }

    let mut written = 0usize;
    for polyline in &document.paths {
        let d = build_path_data(polyline);
        if d.is_empty() {
            continue;
        }

        let path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", document.stroke_color.as_str())
            .set("stroke-width", document.stroke_width);
        doc = doc.add(path);
        written += 1;
    }

    tracing::debug!(
        width = w,
        height = h,
        paths = written,
        skipped = document.paths.len() - written,
        "serialized svg",
    );

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

// ---------------------------------------------------------------------------
// Travel diagnostic SVG (manual string formatting)
// ---------------------------------------------------------------------------

/// Escape the five XML special characters for safe embedding in element
/// text content and attribute values.
///
/// Handles `&` (must be first), `<`, `>`, `"`, and `'`.
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Write the XML declaration, opening `<svg>` tag, and optional
/// `<title>` / `<desc>` elements.
fn write_svg_preamble(out: &mut String, dimensions: Dimensions, metadata: &SvgMetadata<'_>) {
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        dimensions.width, dimensions.height, dimensions.width, dimensions.height,
    );
    if let Some(title) = metadata.title {
        let _ = writeln!(out, "  <title>{}</title>", xml_escape(title));
    }
    if let Some(description) = metadata.description {
        let _ = writeln!(out, "  <desc>{}</desc>", xml_escape(description));
    }
}

/// Render the document with every pen-up move drawn as a dashed red
/// line, for inspecting how well the path order cuts travel.
///
/// Paths are drawn in the document's stroke color under
/// `<g id="paths">`. Each move from one path's last point to the next
/// path's first point becomes a `<line>` under `<g id="pen-up-moves">`
/// carrying `data-index` and `data-distance` attributes. A closing
/// comment records the total pen-up distance.
#[must_use]
pub fn to_travel_diagnostic_svg(document: &VectorDocument, metadata: &SvgMetadata<'_>) -> String {
    let mut out = String::new();

    write_svg_preamble(&mut out, document.dimensions, metadata);

    let _ = writeln!(
        out,
        r#"  <g id="paths" stroke="{}" stroke-width="{}" fill="none">"#,
        xml_escape(&document.stroke_color),
        document.stroke_width,
    );
    for polyline in &document.paths {
        let d = build_path_data(polyline);
        if !d.is_empty() {
            let _ = writeln!(out, r#"    <path d="{d}"/>"#);
        }
    }
    let _ = writeln!(out, "  </g>");

    let moves: Vec<_> = document
        .paths
        .windows(2)
        .filter_map(|pair| Some((*pair[0].last()?, *pair[1].first()?)))
        .collect();
    let total: f64 = moves.iter().map(|(from, to)| from.distance(*to)).sum();

    if !moves.is_empty() {
        let _ = writeln!(
            out,
            r#"  <g id="pen-up-moves" stroke="red" stroke-width="0.5" stroke-dasharray="2,2" opacity="0.8">"#,
        );
        for (i, (from, to)) in moves.iter().enumerate() {
            let _ = writeln!(
                out,
                r#"    <line x1="{}" y1="{}" x2="{}" y2="{}" data-index="{i}" data-distance="{:.2}"/>"#,
                from.x,
                from.y,
                to.x,
                to.y,
                from.distance(*to),
            );
        }
        let _ = writeln!(out, "  </g>");
    }

    let _ = writeln!(
        out,
        "  <!-- pen-up moves: {}, total distance: {total:.2}px -->",
        moves.len(),
    );
    let _ = writeln!(out, "</svg>");

    out
}
