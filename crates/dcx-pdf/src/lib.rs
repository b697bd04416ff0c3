//! PDF renderer (printpdf).
//!
//! This crate implements the `dcx-core` DocumentRenderer port. Layout is pure
//! and lives in [`layout`]; this module only turns pages into PDF objects.

use std::{fs::File, io::BufWriter, path::Path};

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};
use tracing::debug;

pub mod layout;
pub mod metrics;

use dcx_core::{domain::MessageRecord, errors::Error, ports::DocumentRenderer, Result};

use crate::{
    layout::{layout, Page, HEADER_TITLE, PAGE_HEIGHT, PAGE_WIDTH},
    metrics::FontStyle,
};

const LAYER_NAME: &str = "Layer 1";

#[derive(Clone, Copy, Debug, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }

    fn map_err(e: printpdf::Error) -> Error {
        Error::Render(format!("pdf error: {e}"))
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Oblique => &self.oblique,
        }
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, records: &[MessageRecord], out: &Path) -> Result<()> {
        let pages = layout(records);
        write_pdf(&pages, out)?;
        debug!(pages = pages.len(), records = records.len(), path = %out.display(), "pdf written");
        Ok(())
    }
}

fn write_pdf(pages: &[Page], out: &Path) -> Result<()> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        HEADER_TITLE,
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        LAYER_NAME,
    );

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(PdfRenderer::map_err)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(PdfRenderer::map_err)?,
        oblique: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(PdfRenderer::map_err)?,
    };

    for (idx, page) in pages.iter().enumerate() {
        let (page_idx, layer_idx) = if idx == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME)
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);

        for run in &page.runs {
            // PDF user space grows upwards from the bottom edge.
            layer.use_text(
                run.text.clone(),
                run.size_pt,
                Mm(run.x),
                Mm(PAGE_HEIGHT - run.baseline),
                fonts.get(run.style),
            );
        }
    }

    let mut writer = BufWriter::new(File::create(out)?);
    doc.save(&mut writer).map_err(PdfRenderer::map_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_pdf(prefix: &str) -> std::path::PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let pid = std::process::id();
        std::path::PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.pdf"))
    }

    fn rec(ts: &str, author: &str, content: &str) -> MessageRecord {
        MessageRecord {
            author: author.to_string(),
            content: content.to_string(),
            timestamp: ts.to_string(),
            channel_name: "general".to_string(),
        }
    }

    #[test]
    fn writes_a_pdf_file() {
        let out = tmp_pdf("dcx-pdf-test");
        let records = vec![
            rec("2024-01-01 09:00:00", "ann", "hello"),
            rec("2024-01-01 09:01:00", "bo", "ünïcödé and 🎉"),
        ];

        PdfRenderer::new().render(&records, &out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let _ = std::fs::remove_file(&out);
    }

    #[test]
    fn renders_multi_page_documents() {
        let out = tmp_pdf("dcx-pdf-multi");
        let records: Vec<MessageRecord> = (0..40)
            .map(|i| rec(&format!("2024-01-01 10:{:02}:00", i), "ann", "line"))
            .collect();

        assert!(layout(&records).len() > 1);
        PdfRenderer::new().render(&records, &out).unwrap();
        assert!(std::fs::metadata(&out).unwrap().len() > 0);
        let _ = std::fs::remove_file(&out);
    }

    #[test]
    fn empty_export_still_renders_heading_page() {
        let out = tmp_pdf("dcx-pdf-empty");
        PdfRenderer::new().render(&[], &out).unwrap();
        assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
        let _ = std::fs::remove_file(&out);
    }
}
