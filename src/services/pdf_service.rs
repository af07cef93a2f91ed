use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, Line, Mm, PdfDocument, PdfLayerReference, Point,
    Rgb,
};
use qrcode::QrCode;
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::ProductUnit,
    services::qr_service,
};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const PAGE_MARGIN_MM: f32 = 10.0;

/// Canonical A4 sticker grid: 5 columns by 7 rows, 35 stickers per page.
#[derive(Debug, Clone, Copy)]
pub struct PageLayout {
    pub columns: usize,
    pub rows: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            columns: 5,
            rows: 7,
        }
    }
}

impl PageLayout {
    pub fn capacity(self) -> usize {
        self.columns * self.rows
    }
}

#[derive(Debug, Serialize)]
pub struct StickerPage {
    pub page_number: usize,
    pub rows: Vec<Vec<ProductUnit>>,
    pub total_units: usize,
}

/// Partitions units into print pages, row-major. Lossless and
/// order-preserving: flattening the pages reproduces the input.
pub fn layout_stickers(units: &[ProductUnit], layout: PageLayout) -> Vec<StickerPage> {
    let capacity = layout.capacity();
    if capacity == 0 {
        return Vec::new();
    }

    units
        .chunks(capacity)
        .enumerate()
        .map(|(i, page_units)| StickerPage {
            page_number: i + 1,
            rows: page_units
                .chunks(layout.columns)
                .map(|row| row.to_vec())
                .collect(),
            total_units: page_units.len(),
        })
        .collect()
}

/// Renders the batch's stickers as an A4 PDF: QR code, serial key and
/// product name per cell, with a light border for cutting.
pub fn generate_batch_pdf(
    units: &[ProductUnit],
    batch_number: &str,
    product_name: Option<&str>,
    public_url: &str,
) -> Result<Vec<u8>> {
    let layout = PageLayout::default();
    let pages = layout_stickers(units, layout);

    let (doc, first_page, first_layer) = PdfDocument::new(
        format!("QR Codes - Batch {}", batch_number),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "stickers",
    );

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let sticker_width = (PAGE_WIDTH_MM - 2.0 * PAGE_MARGIN_MM) / layout.columns as f32;
    let sticker_height = (PAGE_HEIGHT_MM - 2.0 * PAGE_MARGIN_MM) / layout.rows as f32;

    for (page_index, page) in pages.iter().enumerate() {
        let layer = if page_index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "stickers");
            doc.get_page(page_ref).get_layer(layer_ref)
        };

        if page_index == 0 {
            layer.use_text(
                format!("QR Codes - Batch: {}", batch_number),
                12.0,
                Mm(PAGE_MARGIN_MM),
                Mm(PAGE_HEIGHT_MM - 7.0),
                &font_bold,
            );
            if let Some(name) = product_name {
                layer.use_text(
                    name.to_string(),
                    10.0,
                    Mm(PAGE_MARGIN_MM),
                    Mm(PAGE_HEIGHT_MM - 3.5),
                    &font,
                );
            }
        }

        for (row_index, row) in page.rows.iter().enumerate() {
            for (col_index, unit) in row.iter().enumerate() {
                let x = PAGE_MARGIN_MM + col_index as f32 * sticker_width;
                let y_top = PAGE_HEIGHT_MM - PAGE_MARGIN_MM - row_index as f32 * sticker_height;
                draw_sticker(
                    &layer,
                    unit,
                    product_name,
                    public_url,
                    &font,
                    &font_bold,
                    x,
                    y_top,
                    sticker_width,
                    sticker_height,
                )?;
            }
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

#[allow(clippy::too_many_arguments)]
fn draw_sticker(
    layer: &PdfLayerReference,
    unit: &ProductUnit,
    product_name: Option<&str>,
    public_url: &str,
    font: &printpdf::IndirectFontRef,
    font_bold: &printpdf::IndirectFontRef,
    x: f32,
    y_top: f32,
    width: f32,
    height: f32,
) -> Result<()> {
    let qr_size = width.min(height) * 0.6;
    let qr_x = x + (width - qr_size) / 2.0;
    let qr_y = y_top - 3.0 - qr_size;

    let url = qr_service::activation_url(public_url, &unit.qr_token);
    let (image, pixel_dim) = qr_image(&url)?;

    // printpdf places images at their natural size for the given DPI;
    // scale the matrix to the target sticker dimensions.
    let natural_mm = pixel_dim as f32 * 25.4 / 300.0;
    let scale = qr_size / natural_mm;
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(qr_x)),
            translate_y: Some(Mm(qr_y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(300.0),
            ..Default::default()
        },
    );

    // Rough centering for the 12-character serial at 8pt.
    let serial_width_mm = unit.serial_key.len() as f32 * 8.0 * 0.6 * 0.3528;
    layer.use_text(
        unit.serial_key.clone(),
        8.0,
        Mm(x + (width - serial_width_mm) / 2.0),
        Mm(qr_y - 4.0),
        font_bold,
    );

    if let Some(name) = product_name {
        let label: String = name.chars().take(28).collect();
        let label_width_mm = label.len() as f32 * 6.0 * 0.5 * 0.3528;
        layer.use_text(
            label,
            6.0,
            Mm(x + (width - label_width_mm) / 2.0),
            Mm(qr_y - 7.5),
            font,
        );
    }

    layer.set_outline_color(Color::Rgb(Rgb::new(0.78, 0.78, 0.78, None)));
    layer.set_outline_thickness(0.1);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x), Mm(y_top - height)), false),
            (Point::new(Mm(x + width), Mm(y_top - height)), false),
            (Point::new(Mm(x + width), Mm(y_top)), false),
            (Point::new(Mm(x), Mm(y_top)), false),
        ],
        is_closed: true,
    });

    Ok(())
}

/// Renders the QR matrix into a grayscale bitmap, 4px per module with a
/// 4-module quiet zone. Returns the image and its pixel dimension.
fn qr_image(data: &str) -> Result<(Image, u32)> {
    const MODULE_PX: usize = 4;
    const QUIET_MODULES: usize = 4;

    let code = QrCode::new(data.as_bytes())
        .map_err(|e| AppError::InternalError(format!("QR encoding failed: {}", e)))?;
    let width = code.width();
    let colors = code.to_colors();

    let dim = ((width + 2 * QUIET_MODULES) * MODULE_PX) as u32;
    let mut img = printpdf::image_crate::GrayImage::from_pixel(
        dim,
        dim,
        printpdf::image_crate::Luma([255u8]),
    );

    for (i, color) in colors.iter().enumerate() {
        if *color == qrcode::Color::Dark {
            let module_x = (i % width + QUIET_MODULES) * MODULE_PX;
            let module_y = (i / width + QUIET_MODULES) * MODULE_PX;
            for dy in 0..MODULE_PX {
                for dx in 0..MODULE_PX {
                    img.put_pixel(
                        (module_x + dx) as u32,
                        (module_y + dy) as u32,
                        printpdf::image_crate::Luma([0u8]),
                    );
                }
            }
        }
    }

    let image = Image::from_dynamic_image(&printpdf::image_crate::DynamicImage::ImageLuma8(img));
    Ok((image, dim))
}

fn pdf_error(err: printpdf::Error) -> AppError {
    AppError::InternalError(format!("PDF generation failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitStatus;
    use chrono::Utc;

    fn unit(n: usize) -> ProductUnit {
        ProductUnit {
            id: n as i32,
            product_id: 1,
            batch_id: 1,
            serial_key: format!("SER{:09}", n),
            qr_token: format!("token{:027}", n),
            qr_code_url: format!("https://api.qrserver.com/v1/create-qr-code/?data={}", n),
            status: UnitStatus::Created,
            activated_at: None,
            warranty_expires_at: None,
            customer_name: None,
            customer_email: None,
            customer_phone: None,
            shop_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn units(n: usize) -> Vec<ProductUnit> {
        (0..n).map(unit).collect()
    }

    #[test]
    fn empty_input_yields_zero_pages() {
        assert!(layout_stickers(&[], PageLayout::default()).is_empty());
    }

    #[test]
    fn layout_is_lossless_and_order_preserving() {
        let input = units(83);
        let pages = layout_stickers(&input, PageLayout::default());

        let flattened: Vec<i32> = pages
            .iter()
            .flat_map(|p| p.rows.iter())
            .flat_map(|r| r.iter())
            .map(|u| u.id)
            .collect();
        let expected: Vec<i32> = input.iter().map(|u| u.id).collect();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn no_page_exceeds_capacity_and_no_row_exceeds_columns() {
        let layout = PageLayout::default();
        let pages = layout_stickers(&units(100), layout);

        assert_eq!(pages.len(), 3); // 35 + 35 + 30
        for page in &pages {
            let count: usize = page.rows.iter().map(|r| r.len()).sum();
            assert_eq!(count, page.total_units);
            assert!(count <= layout.capacity());
            for row in &page.rows {
                assert!(row.len() <= layout.columns);
            }
        }
        assert_eq!(pages[2].total_units, 30);
    }

    #[test]
    fn exact_multiple_fills_final_page() {
        let pages = layout_stickers(&units(70), PageLayout::default());
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].total_units, 35);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[1].page_number, 2);
    }

    #[test]
    fn custom_grid_is_respected() {
        let layout = PageLayout {
            columns: 10,
            rows: 5,
        };
        let pages = layout_stickers(&units(51), layout);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].rows.len(), 5);
        assert_eq!(pages[0].rows[0].len(), 10);
        assert_eq!(pages[1].total_units, 1);
    }

    #[test]
    fn pdf_contains_all_pages() {
        let bytes = generate_batch_pdf(
            &units(36),
            "BATCH-001",
            Some("Smart Watch X2"),
            "https://warranty.example.com",
        )
        .unwrap();
        assert!(!bytes.is_empty());
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
