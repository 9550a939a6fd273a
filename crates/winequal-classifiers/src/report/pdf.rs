//! Paginated PDF rendering with printpdf's builtin Helvetica.
//!
//! Layout runs top to bottom on A4 pages with a moving cursor. Anything that
//! would cross the bottom margin starts a new page.
use std::io::BufWriter;

use printpdf::image_crate::{self, GenericImageView};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};

use crate::error::{PipelineError, ReportSink, Result};
use crate::report::content::{FigureRef, ReportContent, METRIC_HEADERS};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP: f32 = 282.0;
const BOTTOM_MARGIN: f32 = 15.0;
const LEFT: f32 = 10.0;
const FIGURE_WIDTH: f32 = 180.0;
const CELL_WIDTH: f32 = 40.0;
const CELL_HEIGHT: f32 = 10.0;
const PT_TO_MM: f32 = 0.3528;

fn render_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::render(ReportSink::Pdf, e)
}

/// Approximate Helvetica advance width of `text` in mm.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * PT_TO_MM
}

/// Simple word-wrap helper for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

struct PageCursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl PageCursor {
    fn new(title: &str) -> Self {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        PageCursor {
            doc,
            layer,
            y: TOP,
            pages: 1,
        }
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", self.pages));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.layer.set_outline_thickness(0.5);
        self.y = TOP;
    }

    /// Start a new page unless `height` mm still fit above the margin.
    fn reserve(&mut self, height: f32) {
        if self.y - height < BOTTOM_MARGIN {
            self.new_page();
        }
    }

    fn skip(&mut self, height: f32) {
        self.y -= height;
    }

    fn text(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        let line_height = size * PT_TO_MM + 1.5;
        self.reserve(line_height);
        self.y -= line_height;
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn centered(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        let x = ((PAGE_WIDTH - text_width(text, size)) / 2.0).max(LEFT);
        self.text(text, size, x, font);
    }

    fn paragraph(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        for line in wrap_text(text, 90) {
            self.text(&line, size, LEFT, font);
        }
    }

    fn rect(&self, x: f32, top: f32, w: f32, h: f32) {
        let points = vec![
            (Point::new(Mm(x), Mm(top)), false),
            (Point::new(Mm(x + w), Mm(top)), false),
            (Point::new(Mm(x + w), Mm(top - h)), false),
            (Point::new(Mm(x), Mm(top - h)), false),
        ];
        self.layer.add_line(Line {
            points,
            is_closed: true,
        });
    }

    fn table_row(&mut self, cells: &[&str], font: &IndirectFontRef) {
        self.reserve(CELL_HEIGHT);
        let top = self.y;
        for (i, cell) in cells.iter().enumerate() {
            let x = LEFT + i as f32 * CELL_WIDTH;
            self.rect(x, top, CELL_WIDTH, CELL_HEIGHT);
            self.layer.use_text(*cell, 12.0, Mm(x + 2.0), Mm(top - 7.0), font);
        }
        self.y -= CELL_HEIGHT;
    }

    /// Embed `figure` scaled to the figure width. Returns false if the image
    /// could not be read or decoded.
    fn figure(&mut self, figure: &FigureRef, fonts: &Fonts) -> bool {
        let image = match image_crate::open(&figure.path) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Could not insert {}: {}", figure.path.display(), e);
                return false;
            }
        };
        let (w_px, h_px) = image.dimensions();
        let (w_px, h_px) = (w_px as f32, h_px as f32);
        if w_px == 0.0 || h_px == 0.0 {
            log::warn!("Could not insert {}: empty image", figure.path.display());
            return false;
        }
        let height = (h_px * FIGURE_WIDTH / w_px).min(TOP - BOTTOM_MARGIN - 15.0);
        let dpi = h_px * 25.4 / height;

        self.reserve(height + 12.0);
        let bottom = self.y - height;
        Image::from_dynamic_image(&image).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(LEFT)),
                translate_y: Some(Mm(bottom)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.y = bottom - 5.0;
        self.centered(&figure.file_name, 10.0, &fonts.regular);
        self.skip(10.0);
        true
    }

    fn finish(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc.save(&mut buf).map_err(render_err)?;
        buf.into_inner().map_err(render_err)
    }
}

/// Render the PDF report. `footer` is printed at the bottom of the last page.
pub fn render_pdf(content: &ReportContent, footer: Option<&str>) -> Result<Vec<u8>> {
    let mut cursor = PageCursor::new(&content.title);
    let fonts = Fonts {
        regular: cursor
            .doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_err)?,
        bold: cursor
            .doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_err)?,
    };
    cursor.layer.set_outline_thickness(0.5);

    cursor.centered(&content.title, 16.0, &fonts.bold);
    cursor.skip(15.0);

    cursor.paragraph(&content.introduction, 12.0, &fonts.regular);
    cursor.skip(10.0);

    if content.summary.is_some() {
        cursor.text("Dataset Summary", 14.0, LEFT, &fonts.bold);
        cursor.skip(3.0);
        for (depth, line) in content.summary_lines() {
            cursor.text(&format!("- {}", line), 12.0, LEFT + 6.0 * depth as f32, &fonts.regular);
        }
        cursor.skip(10.0);
    }

    cursor.text("Model Performance", 14.0, LEFT, &fonts.bold);
    cursor.skip(5.0);
    cursor.table_row(&METRIC_HEADERS, &fonts.regular);
    for record in &content.metrics {
        let cells = record.cells();
        let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
        cursor.table_row(&cells, &fonts.regular);
    }
    cursor.skip(15.0);

    if content.figures_dir.is_dir() {
        cursor.text("Visualizations", 14.0, LEFT, &fonts.bold);
        cursor.skip(10.0);
        for figure in &content.figures {
            if !cursor.figure(figure, &fonts) {
                cursor.paragraph(&format!("Could not insert {}", figure.file_name), 12.0, &fonts.regular);
                cursor.skip(5.0);
            }
        }
    } else {
        log::warn!(
            "Figures directory {} not found, no visualizations embedded",
            content.figures_dir.display()
        );
        cursor.paragraph("No visualizations available", 12.0, &fonts.regular);
        cursor.skip(5.0);
    }

    if let Some(footer) = footer {
        cursor
            .layer
            .use_text(footer, 8.0, Mm(LEFT), Mm(BOTTOM_MARGIN / 2.0), &fonts.regular);
    }

    log::debug!("PDF report laid out on {} page(s)", cursor.pages);
    cursor.finish()
}
