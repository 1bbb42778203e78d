mod common;

use std::fs;
use std::io::Cursor;

use common::{Call, RecordingEngine};
use tablestyle_pdf::{Color, Document, Error, FontFamily, FontStyle, PageLayout, PageMargin, RenderContext};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn png(width: u32, height: u32, alpha: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, alpha]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn pdf_doc() -> Document<tablestyle_pdf::PdfEngine> {
    let layout = PageLayout::default().with_margin(PageMargin::new(40.0, 40.0, 40.0, 40.0));
    Document::pdf(Some(layout))
}

#[test]
fn link_uses_the_given_or_default_font() {
    let mut doc = Document::new(RecordingEngine::with_body_width(300.0), None);
    doc.write_link("docs", "https://example.com/docs", None);
    let bold = FontStyle::new(FontFamily::Times, 9.0, 0.0, None, true, false, false);
    doc.write_link("more", "https://example.com/more", Some(&bold));

    let calls = &doc.engine().calls[1..];
    assert_eq!(
        calls,
        &[
            Call::Font {
                family: FontFamily::Helvetica,
                emphasis: String::new(),
                size: 12.0,
            },
            Call::TextColor(Color::BLACK),
            Call::Link {
                line_height: 12.0,
                text: "docs".into(),
                url: "https://example.com/docs".into(),
            },
            Call::Font {
                family: FontFamily::Times,
                emphasis: "B".into(),
                size: 9.0,
            },
            Call::TextColor(Color::BLACK),
            Call::Link {
                line_height: 9.0,
                text: "more".into(),
                url: "https://example.com/more".into(),
            },
        ]
    );
}

#[test]
fn image_without_width_spans_the_body() {
    let mut doc = Document::new(RecordingEngine::with_body_width(300.0), None);
    doc.line_break(None);
    let height = doc.write_image_bytes(&png(2, 2, 255), 0.0, 0.0, true).unwrap();

    assert_eq!(height, 300.0);
    assert_eq!(
        doc.engine().calls.last(),
        Some(&Call::Image {
            x: 20.0,
            y: 32.0,
            width: 300.0,
            height: 300.0,
            flow: true,
        })
    );
    assert_eq!(doc.engine().cursor().1, 332.0);
}

#[test]
fn image_without_flow_leaves_the_cursor() {
    let mut doc = Document::new(RecordingEngine::with_body_width(300.0), None);
    doc.write_image_bytes(&png(2, 2, 255), 80.0, 40.0, false).unwrap();
    assert_eq!(doc.engine().cursor(), (20.0, 20.0));
}

#[test]
fn missing_image_file_is_an_io_error() {
    let mut doc = Document::new(RecordingEngine::with_body_width(300.0), None);
    let missing = std::env::temp_dir().join("tablestyle-pdf-no-such-image.png");
    assert!(matches!(
        doc.write_image(&missing, 10.0, 10.0, true),
        Err(Error::Io(_))
    ));
}

#[test]
fn pdf_links_become_uri_annotations() {
    let mut doc = pdf_doc();
    doc.write_text("See ", None);
    doc.write_link("the docs", "https://example.com/docs", None);
    let bytes = doc.to_bytes().unwrap();

    assert!(contains(&bytes, b"/Annots"));
    assert!(contains(&bytes, b"/Subtype /Link"));
    assert!(contains(&bytes, b"/S /URI"));
    assert!(contains(&bytes, b"(https://example.com/docs)"));
}

#[test]
fn pdf_image_keeps_aspect_ratio_and_flows() {
    let mut doc = pdf_doc();
    let height = doc.write_image_bytes(&png(4, 2, 128), 100.0, 0.0, true).unwrap();
    assert_eq!(height, 50.0);
    assert_eq!(doc.engine().cursor().1, 90.0);

    let bytes = doc.to_bytes().unwrap();
    assert!(contains(&bytes, b"/Subtype /Image"));
    assert!(contains(&bytes, b"/SMask"));
    assert!(contains(&bytes, b"/Im1 Do"));
    assert!(contains(&bytes, b"/XObject"));
}

#[test]
fn undecodable_image_bytes_are_an_error() {
    let mut doc = pdf_doc();
    assert!(matches!(
        doc.write_image_bytes(b"not an image", 50.0, 0.0, true),
        Err(Error::Image(_))
    ));
}

#[test]
fn sheet_images_resolve_next_to_the_sheet() {
    let dir = std::env::temp_dir().join(format!("tablestyle-pdf-img-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("logo.png"), png(3, 3, 255)).unwrap();
    let input = dir.join("sheet.xml");
    fs::write(
        &input,
        r#"<sheet>
  <image src="logo.png" width="60"/>
  <link href="https://example.com">home</link>
</sheet>"#,
    )
    .unwrap();

    let output = dir.join("sheet.pdf");
    tablestyle_pdf::convert_markup_to_pdf(&input, &output).unwrap();
    let bytes = fs::read(&output).unwrap();
    assert!(contains(&bytes, b"/Im1 Do"));
    assert!(contains(&bytes, b"(https://example.com)"));
    fs::remove_dir_all(&dir).ok();
}
