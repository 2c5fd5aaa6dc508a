//! PDF text and image extraction using lopdf and pdf-extract.

use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageBuffer, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{ImageLister, ImageXref, PdftoppmRasterizer, Rasterizer, Result, TextLayerReader};
use crate::error::{PagewiseError, PdfError};

/// A PDF opened for page-by-page processing.
#[derive(Debug)]
pub struct PdfDocument {
    document: Document,
    raw_data: Vec<u8>,
    path: Option<PathBuf>,
    rasterizer: PdftoppmRasterizer,
}

/// An image extracted from a PDF.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// File extension matching `data` (jpeg, jpx, png).
    pub extension: String,
}

impl PdfDocument {
    /// Open a PDF file.
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PagewiseError::InputNotFound(path.to_path_buf()),
            _ => PdfError::Parse(format!("{}: {}", path.display(), e)).into(),
        })?;
        let mut doc = Self::from_bytes(&data)?;
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Load a PDF from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // PDFs with an empty user password open without prompting.
        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self {
            document,
            raw_data,
            path: None,
            rasterizer: PdftoppmRasterizer::default(),
        })
    }

    /// Use a specific rasterizer for scanned pages.
    pub fn with_rasterizer(mut self, rasterizer: PdftoppmRasterizer) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    fn page_id(&self, page_index: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&(page_index + 1))
            .copied()
            .ok_or(PdfError::InvalidPage(page_index))
    }

    /// Get resources dictionary for a page, handling inheritance
    fn page_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let mut node_id = page_id;
        loop {
            let dict = match self.document.get_object(node_id).ok()? {
                Object::Dictionary(dict) => dict,
                _ => return None,
            };

            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(res_dict))) = self.document.dereference(resources) {
                    return Some(res_dict.clone());
                }
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => node_id = *parent_id,
                _ => return None,
            }
        }
    }

    fn decode_raw(&self, dict: &Dictionary, data: Vec<u8>, width: u32, height: u32) -> Result<DynamicImage> {
        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            return Err(PdfError::ImageExtraction(format!(
                "unsupported bits per component: {}",
                bits
            )));
        }

        let components = self.color_components(dict)?;
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| PdfError::ImageExtraction(format!("image too large: {}x{}", width, height)))?;
        let required = pixels.checked_mul(components).ok_or_else(|| {
            PdfError::ImageExtraction(format!("image too large: {}x{}x{}", width, height, components))
        })?;
        if data.len() < required {
            return Err(PdfError::ImageExtraction(format!(
                "truncated image data: {} bytes for {}x{}x{}",
                data.len(),
                width,
                height,
                components
            )));
        }

        trace!("Decoding raw image {}x{} with {} components", width, height, components);

        let image = match components {
            1 => GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(width, height, data[..pixels * 3].to_vec()).map(DynamicImage::ImageRgb8),
            4 => {
                let rgb: Vec<u8> = data[..pixels * 4]
                    .chunks_exact(4)
                    .flat_map(|cmyk| cmyk_to_rgb(cmyk[0], cmyk[1], cmyk[2], cmyk[3]))
                    .collect();
                ImageBuffer::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
            }
            _ => None,
        };

        image.ok_or_else(|| PdfError::ImageExtraction("could not build pixel buffer".to_string()))
    }

    fn color_components(&self, dict: &Dictionary) -> Result<usize> {
        let color_space = match dict.get(b"ColorSpace") {
            Ok(obj) => self
                .document
                .dereference(obj)
                .map(|(_, o)| o.clone())
                .map_err(|e| PdfError::ImageExtraction(e.to_string()))?,
            Err(_) => return Ok(3),
        };

        match &color_space {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"G" | b"CalGray" => Ok(1),
                b"DeviceRGB" | b"RGB" | b"CalRGB" => Ok(3),
                b"DeviceCMYK" | b"CMYK" => Ok(4),
                other => Err(PdfError::ImageExtraction(format!(
                    "unsupported color space: {}",
                    String::from_utf8_lossy(other)
                ))),
            },
            Object::Array(arr) => match arr.first().and_then(|o| o.as_name().ok()) {
                Some(b"ICCBased") => {
                    let n = arr
                        .get(1)
                        .and_then(|o| self.document.dereference(o).ok())
                        .and_then(|(_, o)| o.as_stream().ok())
                        .and_then(|s| s.dict.get(b"N").ok())
                        .and_then(|n| n.as_i64().ok())
                        .unwrap_or(3);
                    match n {
                        1 | 3 | 4 => Ok(n as usize),
                        _ => Err(PdfError::ImageExtraction(format!(
                            "unsupported ICC component count: {}",
                            n
                        ))),
                    }
                }
                Some(b"CalRGB") => Ok(3),
                Some(b"CalGray") => Ok(1),
                _ => Err(PdfError::ImageExtraction("unsupported color space array".to_string())),
            },
            _ => Err(PdfError::ImageExtraction("invalid color space".to_string())),
        }
    }
}

impl TextLayerReader for PdfDocument {
    fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    fn text_layer(&self, page_index: u32) -> Result<String> {
        self.page_id(page_index)?;
        self.document
            .extract_text(&[page_index + 1])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn document_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

impl Rasterizer for PdfDocument {
    fn render(&self, page_index: u32, dpi: u32) -> Result<DynamicImage> {
        self.page_id(page_index)?;
        match &self.path {
            Some(path) => self.rasterizer.render_file(path, page_index, dpi),
            None => self.rasterizer.render_bytes(&self.raw_data, page_index, dpi),
        }
    }
}

impl ImageLister for PdfDocument {
    fn list_images(&self, page_index: u32) -> Result<Vec<ImageXref>> {
        let page_id = self.page_id(page_index)?;
        let mut images = Vec::new();

        let Some(resources) = self.page_resources(page_id) else {
            return Ok(images);
        };

        if let Ok(xobjects) = resources.get(b"XObject") {
            if let Ok((_, Object::Dictionary(xobj_dict))) = self.document.dereference(xobjects) {
                for (_name, obj_ref) in xobj_dict.iter() {
                    let Object::Reference(id) = obj_ref else {
                        continue;
                    };
                    let is_image = self
                        .document
                        .get_object(*id)
                        .and_then(|o| o.as_stream())
                        .ok()
                        .and_then(|s| s.dict.get(b"Subtype").ok())
                        .and_then(|s| s.as_name().ok())
                        == Some(b"Image".as_slice());
                    if is_image && !images.contains(&ImageXref::from(*id)) {
                        images.push(ImageXref::from(*id));
                    }
                }
            }
        }

        debug!("Found {} images on page {}", images.len(), page_index + 1);
        Ok(images)
    }

    fn extract_image(&self, xref: ImageXref) -> Result<ExtractedImage> {
        let stream = self
            .document
            .get_object(xref.into())
            .and_then(|o| o.as_stream())
            .map_err(|e| PdfError::ImageExtraction(format!("object {:?}: {}", xref, e)))?;
        let dict = &stream.dict;

        let width = dimension(dict, b"Width");
        let height = dimension(dict, b"Height");
        let (Some(width), Some(height)) = (width, height) else {
            return Err(PdfError::ImageExtraction(format!(
                "object {:?} has missing or invalid dimensions",
                xref
            )));
        };

        let filters: Vec<&[u8]> = match dict.get(b"Filter") {
            Ok(Object::Name(name)) => vec![name.as_slice()],
            Ok(Object::Array(arr)) => arr.iter().filter_map(|o| o.as_name().ok()).collect(),
            _ => Vec::new(),
        };

        // Encoded formats are passed through untouched.
        match filters.as_slice() {
            [b"DCTDecode"] => {
                return Ok(ExtractedImage {
                    data: stream.content.clone(),
                    width,
                    height,
                    extension: "jpeg".to_string(),
                });
            }
            [b"JPXDecode"] => {
                return Ok(ExtractedImage {
                    data: stream.content.clone(),
                    width,
                    height,
                    extension: "jpx".to_string(),
                });
            }
            _ => {}
        }

        if let Some(unsupported) = filters
            .iter()
            .copied()
            .find(|f| matches!(*f, b"DCTDecode" | b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode"))
        {
            return Err(PdfError::ImageExtraction(format!(
                "unsupported image filter: {}",
                String::from_utf8_lossy(unsupported)
            )));
        }

        let data = if filters.is_empty() {
            stream.content.clone()
        } else {
            stream
                .decompressed_content()
                .map_err(|e| PdfError::ImageExtraction(e.to_string()))?
        };

        let image = self.decode_raw(dict, data, width, height)?;
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| PdfError::ImageExtraction(e.to_string()))?;

        Ok(ExtractedImage {
            data: png,
            width,
            height,
            extension: "png".to_string(),
        })
    }
}

/// Positive image dimension from the stream dictionary.
fn dimension(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .and_then(|o| o.as_i64())
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|&v| v > 0)
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 255 - k as u16;
    [
        ((255 - c as u16) * k / 255) as u8,
        ((255 - m as u16) * k / 255) as u8,
        ((255 - y as u16) * k / 255) as u8,
    ]
}
