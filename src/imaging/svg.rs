//! Declared size of an SVG document.
//!
//! Reads the root `<svg>` element's `width`/`height` attributes, falling back
//! to the `viewBox`. Unit-less and `px` lengths are accepted; percentages and
//! other units are treated as undeclared. The markup is read with
//! `quick-xml`, so only the real document element counts.

use super::backend::{BackendError, Dimensions};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::path::Path;

/// Dimensions declared by the SVG at `path`, if any.
pub fn svg_dimensions(path: &Path) -> Result<Option<Dimensions>, BackendError> {
    let markup = std::fs::read_to_string(path)?;
    Ok(parse_svg_dimensions(&markup))
}

/// Dimensions declared by SVG markup, if any.
pub fn parse_svg_dimensions(markup: &str) -> Option<Dimensions> {
    let root = root_attributes(markup)?;
    let get = |name: &str| {
        root.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    let width = get("width").and_then(parse_length);
    let height = get("height").and_then(parse_length);
    let view_box = get("viewBox").and_then(parse_view_box);

    let (width, height) = match (width, height, view_box) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some((vw, vh))) => (w, w * vh / vw),
        (None, Some(h), Some((vw, vh))) => (h * vw / vh, h),
        (None, None, Some(view_box)) => view_box,
        _ => return None,
    };

    let (width, height) = (width.round(), height.round());
    if width < 1.0 || height < 1.0 {
        return None;
    }
    Some(Dimensions {
        width: width as u32,
        height: height as u32,
    })
}

/// Attributes of the document element, if it is an `svg` element.
///
/// The prolog, comments, DOCTYPE and processing instructions are skipped by
/// the XML reader, so markup inside them is never mistaken for the root.
fn root_attributes(markup: &str) -> Option<Vec<(String, String)>> {
    let mut reader = Reader::from_str(markup);
    loop {
        match reader.read_event().ok()? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() != b"svg" {
                    return None;
                }
                let attrs = e
                    .attributes()
                    .flatten()
                    .map(|attr| {
                        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                        let value = attr.unescape_value().map_or_else(
                            |_| String::from_utf8_lossy(&attr.value).into_owned(),
                            std::borrow::Cow::into_owned,
                        );
                        (key, value)
                    })
                    .collect();
                return Some(attrs);
            }
            Event::Eof => return None,
            _ => {}
        }
    }
}

fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|n| n.is_finite() && *n > 0.0)
}

fn parse_view_box(value: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some((*w, *h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(markup: &str) -> Option<(u32, u32)> {
        parse_svg_dimensions(markup).map(|d| (d.width, d.height))
    }

    #[test]
    fn width_and_height() {
        assert_eq!(
            dims(r#"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="80"></svg>"#),
            Some((120, 80))
        );
    }

    #[test]
    fn px_units_and_single_quotes() {
        assert_eq!(dims("<svg width='64px' height='32px'/>"), Some((64, 32)));
    }

    #[test]
    fn view_box_only() {
        assert_eq!(dims(r#"<svg viewBox="0 0 300 150"></svg>"#), Some((300, 150)));
        assert_eq!(dims(r#"<svg viewBox="0,0,10.4,20.6"></svg>"#), Some((10, 21)));
    }

    #[test]
    fn width_with_view_box_aspect() {
        assert_eq!(
            dims(r#"<svg width="600" viewBox="0 0 300 150"></svg>"#),
            Some((600, 300))
        );
        assert_eq!(
            dims(r#"<svg height="50" viewBox="0 0 300 150"></svg>"#),
            Some((100, 50))
        );
    }

    #[test]
    fn xml_prolog_and_multiline_tag() {
        let markup = "<?xml version=\"1.0\"?>\n<!-- logo -->\n<svg\n  width=\"40\"\n  height=\"40\"\n>";
        assert_eq!(dims(markup), Some((40, 40)));
    }

    #[test]
    fn comment_and_doctype_before_root_are_skipped() {
        let commented = "<!-- old: <svg width=\"1\" height=\"1\"> -->\n<svg width=\"100\" height=\"200\">";
        assert_eq!(dims(commented), Some((100, 200)));

        let doctype = concat!(
            "<?xml version=\"1.0\"?>\n",
            "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" ",
            "\"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n",
            "<svg viewBox=\"0 0 30 60\"/>"
        );
        assert_eq!(dims(doctype), Some((30, 60)));
    }

    #[test]
    fn non_svg_root_is_undeclared() {
        assert_eq!(dims(r#"<html><svg width="10" height="10"/></html>"#), None);
    }

    #[test]
    fn stroke_width_is_not_width() {
        assert_eq!(
            dims(r#"<svg stroke-width="3" viewBox="0 0 30 10"></svg>"#),
            Some((30, 10))
        );
    }

    #[test]
    fn percentages_are_undeclared() {
        assert_eq!(dims(r#"<svg width="100%" height="100%"></svg>"#), None);
    }

    #[test]
    fn no_dimensions() {
        assert_eq!(dims("<svg><rect/></svg>"), None);
        assert_eq!(dims("not svg at all"), None);
        assert_eq!(dims("<svgx width=\"1\" height=\"1\">"), None);
    }

    #[test]
    fn reads_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("logo.svg");
        std::fs::write(&path, r#"<svg width="10" height="20"/>"#).unwrap();
        let d = svg_dimensions(&path).unwrap().unwrap();
        assert_eq!((d.width, d.height), (10, 20));
        assert!(svg_dimensions(&tmp.path().join("missing.svg")).is_err());
    }
}
