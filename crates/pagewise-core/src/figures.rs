//! Contour-based figure detection on scanned page rasters.
//!
//! Figures are found as dense clusters of edges: the page is reduced to a
//! Canny edge map, edges are dilated until the strokes of one visual object
//! merge into a blob, and the outer contour of every blob becomes a candidate.
//! Candidates are filtered by area, aspect ratio, and ink density. The filter
//! favours recall; overlapping or split regions are returned as found.

use image::{DynamicImage, GenericImageView, GrayImage, imageops};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::dilate;
use imageproc::point::Point;
use tracing::{debug, trace};

use crate::models::{BoundingBox, FigureRegion};

/// Canny hysteresis thresholds.
pub const CANNY_LOW: f32 = 50.0;
pub const CANNY_HIGH: f32 = 150.0;

/// Dilation uses a 5x5 square, i.e. Chebyshev radius 2, applied 3 times.
pub const DILATION_RADIUS: u8 = 2;
pub const DILATION_ITERATIONS: usize = 3;

/// Contour area bounds as fractions of the page area (exclusive).
pub const MIN_AREA_FRACTION: f64 = 0.05;
pub const MAX_AREA_FRACTION: f64 = 0.8;

/// Width/height bounds (exclusive).
pub const MIN_ASPECT_RATIO: f64 = 0.2;
pub const MAX_ASPECT_RATIO: f64 = 5.0;

/// Grayscale values below this count as ink.
pub const INK_LEVEL: u8 = 240;
/// Fraction of ink pixels a region must exceed.
pub const MIN_INK_RATIO: f64 = 0.1;

/// Anything that can locate figure regions in a page raster.
pub trait FigureFinder {
    fn find_figures(&self, image: &DynamicImage) -> Vec<FigureRegion>;
}

/// Edge/contour heuristic figure detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct FigureDetector;

impl FigureDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect figure regions, in contour discovery order.
    ///
    /// Crops come from the colour image (normalised to RGB) while all
    /// measurements use its grayscale version.
    pub fn detect(&self, image: &DynamicImage) -> Vec<FigureRegion> {
        let color = image.to_rgb8();
        let gray = DynamicImage::ImageRgb8(color.clone()).to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let page_area = width as f64 * height as f64;
        let min_area = page_area * MIN_AREA_FRACTION;
        let max_area = page_area * MAX_AREA_FRACTION;

        let edges = canny(&gray, CANNY_LOW, CANNY_HIGH);
        let mut blobs = edges;
        for _ in 0..DILATION_ITERATIONS {
            blobs = dilate(&blobs, Norm::LInf, DILATION_RADIUS);
        }

        let contours = find_contours::<u32>(&blobs);
        let mut regions = Vec::new();

        for contour in contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        {
            let area = polygon_area(&contour.points);
            if !(min_area < area && area < max_area) {
                trace!("Rejected contour: area {:.0} outside ({:.0}, {:.0})", area, min_area, max_area);
                continue;
            }

            let Some(bbox) = bounding_box(&contour.points) else {
                continue;
            };

            let ratio = bbox.aspect_ratio();
            if !(MIN_ASPECT_RATIO < ratio && ratio < MAX_ASPECT_RATIO) {
                trace!("Rejected contour: aspect ratio {:.2}", ratio);
                continue;
            }

            let ink = ink_ratio(&gray, &bbox);
            if ink <= MIN_INK_RATIO {
                trace!("Rejected contour: ink ratio {:.3}", ink);
                continue;
            }

            let crop = imageops::crop_imm(&color, bbox.x, bbox.y, bbox.width, bbox.height).to_image();
            debug!(
                "Figure at ({}, {}) {}x{}, ink ratio {:.2}",
                bbox.x, bbox.y, bbox.width, bbox.height, ink
            );
            regions.push(FigureRegion {
                bbox,
                image: DynamicImage::ImageRgb8(crop),
            });
        }

        debug!("Detected {} figure regions", regions.len());
        regions
    }
}

impl FigureFinder for FigureDetector {
    fn find_figures(&self, image: &DynamicImage) -> Vec<FigureRegion> {
        self.detect(image)
    }
}

/// Shoelace area of the closed polygon through the contour points.
fn polygon_area(points: &[Point<u32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();

    twice_area.abs() as f64 / 2.0
}

/// Smallest upright box containing every point, inclusive of edge pixels.
fn bounding_box(points: &[Point<u32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Fraction of pixels inside `bbox` darker than [`INK_LEVEL`].
fn ink_ratio(gray: &GrayImage, bbox: &BoundingBox) -> f64 {
    let total = bbox.area();
    if total == 0 {
        return 0.0;
    }

    let view = imageops::crop_imm(gray, bbox.x, bbox.y, bbox.width, bbox.height);
    let dark = view.pixels().filter(|(_, _, p)| p.0[0] < INK_LEVEL).count();

    dark as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use pretty_assertions::assert_eq;

    const PAGE_W: u32 = 400;
    const PAGE_H: u32 = 300;
    const TOLERANCE: i64 = 12;

    fn blank_page() -> RgbImage {
        RgbImage::from_pixel(PAGE_W, PAGE_H, Rgb([255, 255, 255]))
    }

    fn fill(page: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        for yy in y..y + h {
            for xx in x..x + w {
                page.put_pixel(xx, yy, Rgb(color));
            }
        }
    }

    fn assert_close(actual: u32, expected: u32, what: &str) {
        let diff = (actual as i64 - expected as i64).abs();
        assert!(
            diff <= TOLERANCE,
            "{}: got {}, expected {} (+/- {})",
            what,
            actual,
            expected,
            TOLERANCE
        );
    }

    #[test]
    fn test_blank_page_has_no_figures() {
        let page = DynamicImage::ImageRgb8(blank_page());
        assert!(FigureDetector::new().detect(&page).is_empty());
    }

    #[test]
    fn test_single_dark_rectangle() {
        // 186x124: aspect 1.5, about 19% of the page.
        let mut page = blank_page();
        fill(&mut page, 100, 80, 186, 124, [20, 20, 20]);

        let regions = FigureDetector::new().detect(&DynamicImage::ImageRgb8(page));
        assert_eq!(regions.len(), 1);

        // Dilation grows the blob by 6px on each side, plus edge placement.
        let bbox = regions[0].bbox;
        assert_close(bbox.x, 100, "x");
        assert_close(bbox.y, 80, "y");
        assert!(bbox.x <= 100 && bbox.y <= 80, "box must enclose the rectangle: {:?}", bbox);
        assert!(bbox.x + bbox.width >= 286 && bbox.y + bbox.height >= 204, "{:?}", bbox);
        assert_close(bbox.x + bbox.width, 286, "right edge");
        assert_close(bbox.y + bbox.height, 204, "bottom edge");

        let crop = &regions[0].image;
        assert_eq!((crop.width(), crop.height()), (bbox.width, bbox.height));
    }

    #[test]
    fn test_crop_keeps_color() {
        let mut page = blank_page();
        fill(&mut page, 100, 80, 186, 124, [200, 10, 10]);

        let regions = FigureDetector::new().detect(&DynamicImage::ImageRgb8(page));
        assert_eq!(regions.len(), 1);

        let crop = regions[0].image.to_rgb8();
        let center = crop.get_pixel(crop.width() / 2, crop.height() / 2);
        assert_eq!(center.0, [200, 10, 10]);
    }

    #[test]
    fn test_near_full_page_region_is_rejected() {
        // 390x292 covers about 95% of the page.
        let mut page = blank_page();
        fill(&mut page, 5, 4, 390, 292, [0, 0, 0]);
        assert!(FigureDetector::new().detect(&DynamicImage::ImageRgb8(page)).is_empty());
    }

    #[test]
    fn test_tiny_region_is_rejected() {
        // 40x30 covers 1% of the page.
        let mut page = blank_page();
        fill(&mut page, 180, 135, 40, 30, [0, 0, 0]);
        assert!(FigureDetector::new().detect(&DynamicImage::ImageRgb8(page)).is_empty());
    }

    #[test]
    fn test_sliver_is_rejected_by_aspect_ratio() {
        // Long horizontal band: area is fine but width/height is far above 5.
        let mut page = blank_page();
        fill(&mut page, 10, 140, 380, 40, [0, 0, 0]);
        assert!(FigureDetector::new().detect(&DynamicImage::ImageRgb8(page)).is_empty());
    }

    #[test]
    fn test_hollow_frame_is_rejected_by_ink_ratio() {
        let mut page = blank_page();
        let (x, y, w, h) = (100, 80, 200, 140);
        fill(&mut page, x, y, w, 2, [0, 0, 0]);
        fill(&mut page, x, y + h - 2, w, 2, [0, 0, 0]);
        fill(&mut page, x, y, 2, h, [0, 0, 0]);
        fill(&mut page, x + w - 2, y, 2, h, [0, 0, 0]);

        assert!(FigureDetector::new().detect(&DynamicImage::ImageRgb8(page)).is_empty());
    }

    #[test]
    fn test_regions_in_discovery_order() {
        let mut page = blank_page();
        fill(&mut page, 250, 20, 120, 80, [0, 0, 0]);
        fill(&mut page, 30, 160, 120, 80, [0, 0, 0]);

        let regions = FigureDetector::new().detect(&DynamicImage::ImageRgb8(page));
        assert_eq!(regions.len(), 2);
        assert!(regions[0].bbox.y < regions[1].bbox.y);
        assert_close(regions[0].bbox.x, 250, "first x");
        assert_close(regions[1].bbox.x, 30, "second x");
    }

    #[test]
    fn test_accepts_rgba_and_gray_input() {
        let mut page = blank_page();
        fill(&mut page, 100, 80, 186, 124, [0, 0, 0]);
        let rgb = DynamicImage::ImageRgb8(page);

        let rgba = DynamicImage::ImageRgba8(rgb.to_rgba8());
        let gray = DynamicImage::ImageLuma8(rgb.to_luma8());

        assert_eq!(FigureDetector::new().detect(&rgba).len(), 1);
        let regions = FigureDetector::new().detect(&gray);
        assert_eq!(regions.len(), 1);
        assert!(matches!(regions[0].image, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_polygon_area_and_bbox() {
        let square = [
            Point::new(0u32, 0u32),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(polygon_area(&square), 100.0);
        assert_eq!(polygon_area(&square[..2]), 0.0);
        assert_eq!(
            bounding_box(&square),
            Some(BoundingBox { x: 0, y: 0, width: 11, height: 11 })
        );
        assert_eq!(bounding_box(&[]), None);
    }

    #[test]
    fn test_ink_ratio() {
        let mut gray = GrayImage::from_pixel(10, 10, image::Luma([255]));
        for x in 0..10 {
            gray.put_pixel(x, 0, image::Luma([0]));
        }
        let bbox = BoundingBox { x: 0, y: 0, width: 10, height: 10 };
        assert!((ink_ratio(&gray, &bbox) - 0.1).abs() < 1e-9);
    }
}
