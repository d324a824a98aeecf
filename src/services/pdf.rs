//! PDF rendering for report downloads.
//!
//! Behind the `pdf-reports` feature; without it the render function returns
//! an error so the endpoint degrades to a clear 500 instead of crashing.

#[cfg(feature = "pdf-reports")]
pub fn render_report_pdf(title: &str, lines: &[String]) -> anyhow::Result<Vec<u8>> {
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    // US letter
    const PAGE_WIDTH: f32 = 215.9;
    const PAGE_HEIGHT: f32 = 279.4;
    const MARGIN: f32 = 25.4;
    const LINE_STEP: f32 = 5.0;

    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("Failed to load PDF font: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow::anyhow!("Failed to load PDF font: {e}"))?;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - MARGIN;

    current.use_text(title, 16.0, Mm(MARGIN), Mm(y), &bold);
    y -= LINE_STEP * 2.0;

    for line in lines {
        if y < MARGIN {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
            current = doc.get_page(next_page).get_layer(next_layer);
            y = PAGE_HEIGHT - MARGIN;
        }
        if !line.is_empty() {
            current.use_text(line, 10.0, Mm(MARGIN), Mm(y), &font);
        }
        y -= LINE_STEP;
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow::anyhow!("PDF generation failed: {e}"))
}

#[cfg(not(feature = "pdf-reports"))]
pub fn render_report_pdf(_title: &str, _lines: &[String]) -> anyhow::Result<Vec<u8>> {
    anyhow::bail!("PDF support is not available in this build (pdf-reports feature disabled)")
}

#[cfg(all(test, feature = "pdf-reports"))]
mod tests {
    use super::*;

    #[test]
    fn renders_a_nonempty_document() {
        let lines = vec!["Total alumni: 3".to_string(), String::new(), "- BS: 2".to_string()];
        let bytes = render_report_pdf("Alumni Summary Report", &lines).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_reports_paginate() {
        let lines: Vec<String> = (0..200).map(|i| format!("line {i}")).collect();
        let bytes = render_report_pdf("Paged", &lines).unwrap();
        assert!(!bytes.is_empty());
    }
}
