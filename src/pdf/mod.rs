//! Vector PDF output: one PDF page per laid-out page, text drawn with the
//! same fonts and line builder the metrics measurer uses.

mod layout;
mod table;

use std::collections::{HashMap, HashSet};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::error::Result;
use crate::fonts::{FontSet, FontVariant, PdfFont, register_font};
use crate::geometry::GeometryProfile;
use crate::model::{ImageData, ImageFormat, Layout};
use crate::style::StyleSheet;

use layout::{Composer, Mark, PageMarks, PlacedLine};

fn embed_image(pdf: &mut Pdf, xobj_ref: Ref, img: &ImageData, alloc: &mut impl FnMut() -> Ref) -> Result<()> {
    match img.format {
        ImageFormat::Jpeg => {
            let mut xobj = pdf.image_xobject(xobj_ref, &img.data);
            xobj.filter(Filter::DctDecode);
            xobj.width(img.pixel_width as i32);
            xobj.height(img.pixel_height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        ImageFormat::Png => {
            let reader = image::ImageReader::with_format(
                std::io::Cursor::new(&img.data[..]),
                image::ImageFormat::Png,
            );
            let rgba = reader.decode()?.to_rgba8();
            let (w, h) = (rgba.width(), rgba.height());
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

            let rgb: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb, 6);

            let smask_ref = if has_alpha {
                let alpha: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w as i32);
                mask.height(h as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w as i32);
            xobj.height(h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    Ok(())
}

fn draw_text(content: &mut Content, placed: &PlacedLine, fonts: &HashMap<FontVariant, PdfFont>) {
    if placed.line.chunks.is_empty() {
        return;
    }
    let mut underlines: Vec<(f32, f32, f32, f32)> = Vec::new();
    content.begin_text();
    let (mut td_x, mut td_y) = (0.0_f32, 0.0_f32);
    let mut current: Option<(FontVariant, f32)> = None;
    for (i, chunk) in placed.line.chunks.iter().enumerate() {
        let Some(font) = fonts.get(&chunk.variant) else {
            continue;
        };
        if current != Some((chunk.variant, chunk.font_size)) {
            content.set_font(Name(font.pdf_name.as_bytes()), chunk.font_size);
            current = Some((chunk.variant, chunk.font_size));
        }
        let x = placed.x + chunk.x_offset + i as f32 * placed.extra_per_gap;
        content.next_line(x - td_x, placed.baseline - td_y);
        td_x = x;
        td_y = placed.baseline;
        content.show(Str(&font.encode(&chunk.text)));

        if chunk.underline {
            let thick = (chunk.font_size * 0.05).max(0.5);
            let mut width = chunk.width;
            // Extend through the gap to an underlined neighbour.
            if let Some(next) = placed.line.chunks.get(i + 1).filter(|n| n.underline) {
                let next_x = placed.x + next.x_offset + (i + 1) as f32 * placed.extra_per_gap;
                width = next_x - x;
            }
            underlines.push((x, placed.baseline - chunk.font_size * 0.12 - thick, width, thick));
        }
    }
    content.end_text();
    for (x, y, w, h) in underlines {
        content.rect(x, y, w, h).fill_nonzero();
    }
}

fn draw_page(
    page: &PageMarks,
    fonts: &HashMap<FontVariant, PdfFont>,
    images: &[(String, Ref)],
) -> Vec<u8> {
    let mut content = Content::new();
    for mark in &page.marks {
        match mark {
            Mark::Fill { x, y, w, h, gray } => {
                content.save_state();
                content.set_fill_gray(*gray);
                content.rect(*x, *y, *w, *h).fill_nonzero();
                content.restore_state();
            }
            Mark::Stroke {
                x,
                y,
                w,
                h,
                line_width,
            } => {
                content.save_state();
                content.set_line_width(*line_width);
                content.rect(*x, *y, *w, *h).stroke();
                content.restore_state();
            }
            Mark::Image { index, x, y, w, h } => {
                if let Some((name, _)) = images.get(*index) {
                    content.save_state();
                    content.transform([*w, 0.0, 0.0, *h, *x, *y]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                }
            }
            Mark::Text(placed) => draw_text(&mut content, placed, fonts),
        }
    }
    let buf = content.finish();
    buf.as_slice().to_vec()
}

/// Render a paginated layout to PDF bytes.
pub fn render(
    layout: &Layout,
    profile: &GeometryProfile,
    sheet: &StyleSheet,
    fonts: &FontSet,
) -> Result<Vec<u8>> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let mut composer = Composer::new(layout, profile, sheet, fonts);
    let pages: Vec<PageMarks> = layout
        .pages
        .iter()
        .enumerate()
        .map(|(i, page)| composer.page(i, page))
        .collect();
    let t_compose = t0.elapsed();

    // Characters per face, for subsetting.
    let mut used: HashMap<FontVariant, HashSet<char>> = HashMap::new();
    for mark in pages.iter().flat_map(|p| p.marks.iter()) {
        if let Mark::Text(placed) = mark {
            for chunk in &placed.line.chunks {
                used.entry(chunk.variant).or_default().extend(chunk.text.chars());
            }
        }
    }
    let mut variants: Vec<FontVariant> = used.keys().copied().collect();
    variants.sort_by_key(|v| (v.bold, v.italic));
    let mut pdf_fonts: HashMap<FontVariant, PdfFont> = HashMap::new();
    for (i, variant) in variants.into_iter().enumerate() {
        let mut chars = used.remove(&variant).unwrap_or_default();
        chars.insert(' ');
        let font = register_font(&mut pdf, fonts.face(variant), format!("F{}", i + 1), &mut alloc, &chars);
        pdf_fonts.insert(variant, font);
    }
    let t_fonts = t0.elapsed();

    let mut images: Vec<(String, Ref)> = Vec::with_capacity(composer.images.len());
    for (i, img) in composer.images.iter().enumerate() {
        let xobj_ref = alloc();
        embed_image(&mut pdf, xobj_ref, img, &mut alloc)?;
        images.push((format!("Im{}", i + 1), xobj_ref));
    }
    let t_images = t0.elapsed();

    let page_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();

    for (i, page) in pages.iter().enumerate() {
        let raw = draw_page(page, &pdf_fonts, &images);
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(pages.len() as i32);

    for (i, page) in pages.iter().enumerate() {
        let mut p = pdf.page(page_ids[i]);
        p.media_box(Rect::new(0.0, 0.0, page.width, page.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = p.resources();
        {
            let mut f = resources.fonts();
            for font in pdf_fonts.values() {
                f.pair(Name(font.pdf_name.as_bytes()), font.font_ref);
            }
        }
        if !images.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &images {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    log::info!(
        "Render phases: compose={:.1}ms, font_embed={:.1}ms, images={:.1}ms, assembly={:.1}ms ({} pages)",
        t_compose.as_secs_f64() * 1000.0,
        (t_fonts - t_compose).as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t0.elapsed() - t_images).as_secs_f64() * 1000.0,
        pages.len(),
    );

    Ok(pdf.finish())
}
