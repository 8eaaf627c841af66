//! PDF compositing via lopdf.
//!
//! Stamps land on a page as RGB image XObjects with a DeviceGray soft mask
//! carrying the alpha channel. The original page content is wrapped in a
//! saved graphics state (`q` ... `Q`) so stamp transforms never leak into
//! it, and each stamp draws in its own state after the restore.

use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use serde::Serialize;

use super::placement::PlacedRect;
use super::StampError;

// ═══════════════════════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════════════════════

/// Per-page dimensions in PDF points, for the placement editor.
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfInfo {
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
}

/// One stamp ready to draw on a page: its registered XObject plus the
/// rectangle it covers.
pub(super) struct PageOverlay {
    pub xobject_name: String,
    pub image_id: ObjectId,
    pub rect: PlacedRect,
}

// ═══════════════════════════════════════════════════════════════════════════
// Inspection
// ═══════════════════════════════════════════════════════════════════════════

/// Check the leading byte signature, not the filename.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

pub(super) fn load_pdf(bytes: &[u8]) -> Result<Document, StampError> {
    if !is_pdf(bytes) {
        return Err(StampError::NotAPdf);
    }
    Document::load_mem(bytes)
        .map_err(|e| StampError::PdfParsing(format!("Failed to parse PDF: {e}")))
}

/// Page count and per-page dimensions of a PDF.
pub fn pdf_info(pdf_bytes: &[u8]) -> Result<PdfInfo, StampError> {
    let doc = load_pdf(pdf_bytes)?;
    let page_ids: Vec<ObjectId> = doc.page_iter().collect();
    let mut pages = Vec::with_capacity(page_ids.len());
    for page_id in &page_ids {
        let (width, height) = page_dimensions(&doc, *page_id)?;
        pages.push(PageInfo { width, height });
    }
    Ok(PdfInfo { page_count: pages.len(), pages })
}

/// Width and height of a page from its `MediaBox`, walking `Parent` links
/// when the page inherits the box from the page tree.
pub(super) fn page_dimensions(doc: &Document, page_id: ObjectId) -> Result<(f32, f32), StampError> {
    let rect = find_media_box(doc, page_id, 0)?;
    Ok(((rect[2] - rect[0]).abs(), (rect[3] - rect[1]).abs()))
}

fn find_media_box(doc: &Document, node_id: ObjectId, depth: u8) -> Result<[f32; 4], StampError> {
    if depth > 16 {
        return Err(StampError::PdfParsing("Page tree too deep resolving MediaBox".into()));
    }
    let dict = page_dict(doc, node_id)?;
    if let Ok(obj) = dict.get(b"MediaBox") {
        let array = resolve_object(doc, obj)
            .as_array()
            .map_err(|_| StampError::PdfParsing("MediaBox is not an array".into()))?;
        if array.len() != 4 {
            return Err(StampError::PdfParsing(format!(
                "MediaBox has {} entries, expected 4",
                array.len()
            )));
        }
        let mut rect = [0f32; 4];
        for (i, entry) in array.iter().enumerate() {
            rect[i] = number(resolve_object(doc, entry)).ok_or_else(|| {
                StampError::PdfParsing("MediaBox entry is not a number".into())
            })?;
        }
        return Ok(rect);
    }
    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => find_media_box(doc, *parent_id, depth + 1),
        _ => Err(StampError::PdfParsing("Page has no MediaBox".into())),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Compositing
// ═══════════════════════════════════════════════════════════════════════════

/// Embed an RGBA bitmap as an image XObject pair: DeviceRGB pixels plus a
/// DeviceGray `SMask` for the alpha channel.
pub(super) fn embed_stamp_image(doc: &mut Document, bitmap: &RgbaImage) -> ObjectId {
    let (width, height) = bitmap.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in bitmap.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let mask_stream = Stream::new(
        dictionary! {
            "Type" => Object::Name(b"XObject".to_vec()),
            "Subtype" => Object::Name(b"Image".to_vec()),
            "Width" => Object::Integer(i64::from(width)),
            "Height" => Object::Integer(i64::from(height)),
            "ColorSpace" => Object::Name(b"DeviceGray".to_vec()),
            "BitsPerComponent" => Object::Integer(8),
        },
        alpha,
    );
    let mask_id = doc.add_object(Object::Stream(mask_stream));

    let image_stream = Stream::new(
        dictionary! {
            "Type" => Object::Name(b"XObject".to_vec()),
            "Subtype" => Object::Name(b"Image".to_vec()),
            "Width" => Object::Integer(i64::from(width)),
            "Height" => Object::Integer(i64::from(height)),
            "ColorSpace" => Object::Name(b"DeviceRGB".to_vec()),
            "BitsPerComponent" => Object::Integer(8),
            "SMask" => Object::Reference(mask_id),
        },
        rgb,
    );
    doc.add_object(Object::Stream(image_stream))
}

/// Merge the page's stamp overlays: register their XObjects in the page
/// resources, wrap the original content in `q`/`Q`, and append one `Do`
/// per stamp positioned by a `cm` transform.
pub(super) fn overlay_page(
    doc: &mut Document,
    page_id: ObjectId,
    overlays: &[PageOverlay],
) -> Result<(), StampError> {
    register_xobjects(doc, page_id, overlays)?;

    let prefix = Content { operations: vec![Operation::new("q", vec![])] };
    let mut operations = vec![Operation::new("Q", vec![])];
    for overlay in overlays {
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            vec![
                Object::Real(overlay.rect.width),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(overlay.rect.height),
                Object::Real(overlay.rect.x),
                Object::Real(overlay.rect.y),
            ],
        ));
        operations.push(Operation::new(
            "Do",
            vec![Object::Name(overlay.xobject_name.clone().into_bytes())],
        ));
        operations.push(Operation::new("Q", vec![]));
    }
    let suffix = Content { operations };

    let prefix_bytes = encode_content(prefix)?;
    let suffix_bytes = encode_content(suffix)?;
    let prefix_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, prefix_bytes)));
    let suffix_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, suffix_bytes)));

    let existing: Vec<Object> = match page_dict(doc, page_id)?.get(b"Contents") {
        Ok(Object::Array(entries)) => entries.clone(),
        Ok(other) => vec![other.clone()],
        Err(_) => Vec::new(),
    };
    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(prefix_id));
    contents.extend(existing);
    contents.push(Object::Reference(suffix_id));

    if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
        dict.set("Contents", Object::Array(contents));
    }
    Ok(())
}

/// Add the overlay XObjects to the page's resource dictionary. Referenced
/// resource dictionaries are copied inline first so a resource object
/// shared between pages never picks up another page's stamps.
fn register_xobjects(
    doc: &mut Document,
    page_id: ObjectId,
    overlays: &[PageOverlay],
) -> Result<(), StampError> {
    let resources_entry = page_dict(doc, page_id)?.get(b"Resources").ok().cloned();
    let mut resources: Dictionary = match resources_entry {
        Some(Object::Reference(id)) => doc
            .get_object(id)
            .ok()
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new),
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };

    let mut xobjects: Dictionary = match resources.get(b"XObject") {
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .ok()
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    for overlay in overlays {
        xobjects.set(overlay.xobject_name.as_str(), Object::Reference(overlay.image_id));
    }
    resources.set("XObject", Object::Dictionary(xobjects));

    if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
        dict.set("Resources", Object::Dictionary(resources));
    }
    Ok(())
}

fn encode_content(content: Content) -> Result<Vec<u8>, StampError> {
    content
        .encode()
        .map_err(|e| StampError::PdfEncoding(format!("Content stream encode failed: {e}")))
}

pub(super) fn save_pdf(doc: &mut Document) -> Result<Vec<u8>, StampError> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| StampError::PdfEncoding(format!("Failed to serialize PDF: {e}")))?;
    if buf.is_empty() {
        return Err(StampError::PdfEncoding("Serialized PDF is empty".into()));
    }
    Ok(buf)
}

// ═══════════════════════════════════════════════════════════════════════════
// Object helpers
// ═══════════════════════════════════════════════════════════════════════════

fn page_dict(doc: &Document, id: ObjectId) -> Result<&Dictionary, StampError> {
    doc.get_object(id)
        .map_err(|e| StampError::PdfParsing(format!("Page object error: {e}")))?
        .as_dict()
        .map_err(|_| StampError::PdfParsing("Page is not a dictionary".into()))
}

fn resolve_object<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════

/// Minimal multi-page PDF for tests. Pages carry no MediaBox of their own;
/// the shared Pages node provides it, which exercises the Parent walk.
#[cfg(test)]
pub(super) fn make_blank_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");

    let mut page_ids = Vec::new();
    for _ in 0..page_count {
        let content_stream = Stream::new(dictionary! {}, b"q Q".to_vec());
        let content_id = doc.add_object(Object::Stream(content_stream));
        let page_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Page".to_vec()),
            "Contents" => Object::Reference(content_id),
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let pages_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Pages".to_vec()),
        "Kids" => kids,
        "Count" => Object::Integer(page_count as i64),
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });

    for page_id in &page_ids {
        if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(*page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => Object::Name(b"Catalog".to_vec()),
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_signature_check_inspects_leading_bytes() {
        assert!(is_pdf(b"%PDF-1.4 rest"));
        assert!(!is_pdf(b"PK\x03\x04 zip"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn pdf_info_reports_pages_and_inherited_media_box() {
        let pdf = make_blank_pdf(3);
        let info = pdf_info(&pdf).unwrap();
        assert_eq!(info.page_count, 3);
        assert_eq!(info.pages.len(), 3);
        assert_eq!(info.pages[0].width, 612.0);
        assert_eq!(info.pages[0].height, 792.0);
    }

    #[test]
    fn pdf_info_rejects_non_pdf_bytes() {
        assert!(matches!(pdf_info(b"not a pdf"), Err(StampError::NotAPdf)));
    }

    #[test]
    fn overlay_rewrites_contents_and_registers_xobject() {
        let pdf = make_blank_pdf(1);
        let mut doc = Document::load_mem(&pdf).unwrap();
        let page_id = doc.page_iter().next().unwrap();

        let bitmap = RgbaImage::from_pixel(4, 4, image::Rgba([200, 10, 10, 255]));
        let image_id = embed_stamp_image(&mut doc, &bitmap);
        let overlays = vec![PageOverlay {
            xobject_name: "EdoStamp1".to_string(),
            image_id,
            rect: PlacedRect { x: 20.0, y: 20.0, width: 40.0, height: 40.0 },
        }];
        overlay_page(&mut doc, page_id, &overlays).unwrap();
        let stamped = save_pdf(&mut doc).unwrap();

        // The result re-parses and the page still reports its size.
        let reparsed = pdf_info(&stamped).unwrap();
        assert_eq!(reparsed.page_count, 1);

        let reloaded = Document::load_mem(&stamped).unwrap();
        let page_id = reloaded.page_iter().next().unwrap();
        let dict = page_dict(&reloaded, page_id).unwrap();

        // Original stream sits between the q wrapper and the overlay.
        let contents = dict.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 3);

        let resources = resolve_object(&reloaded, dict.get(b"Resources").unwrap())
            .as_dict()
            .unwrap();
        let xobjects = resolve_object(&reloaded, resources.get(b"XObject").unwrap())
            .as_dict()
            .unwrap();
        assert!(xobjects.get(b"EdoStamp1").is_ok());
    }

    #[test]
    fn embedded_stamp_carries_soft_mask() {
        let pdf = make_blank_pdf(1);
        let mut doc = Document::load_mem(&pdf).unwrap();

        let mut bitmap = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));
        bitmap.put_pixel(0, 0, image::Rgba([0, 0, 255, 0]));
        let image_id = embed_stamp_image(&mut doc, &bitmap);

        let stream = match doc.get_object(image_id).unwrap() {
            Object::Stream(s) => s,
            other => panic!("expected stream, got {other:?}"),
        };
        assert_eq!(stream.content.len(), 2 * 2 * 3);
        let mask_id = match stream.dict.get(b"SMask").unwrap() {
            Object::Reference(id) => *id,
            other => panic!("expected reference, got {other:?}"),
        };
        let mask = match doc.get_object(mask_id).unwrap() {
            Object::Stream(s) => s,
            other => panic!("expected stream, got {other:?}"),
        };
        // One alpha byte per pixel, with the transparent corner first.
        assert_eq!(mask.content.len(), 4);
        assert_eq!(mask.content[0], 0);
        assert_eq!(mask.content[1], 255);
    }

    #[test]
    fn missing_media_box_is_a_parse_error() {
        let mut doc = Document::with_version("1.4");
        let page_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Page".to_vec()),
        });
        let pages_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Pages".to_vec()),
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        });
        if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
        let catalog_id = doc.add_object(dictionary! {
            "Type" => Object::Name(b"Catalog".to_vec()),
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let page_id = doc.page_iter().next().unwrap();
        assert!(matches!(
            page_dimensions(&doc, page_id),
            Err(StampError::PdfParsing(_))
        ));
    }
}
