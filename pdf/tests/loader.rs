use docqa_pdf::{PdfError, PdfLoader};
use docqa_rag::{DocumentLoader, RagError};
use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};

fn build_pdf(title: Option<&str>, pages: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = i64::try_from(kids.len()).unwrap();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

#[test]
fn pages_are_numbered_in_order_with_title() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annual_report.pdf");
    std::fs::write(
        &path,
        build_pdf(
            Some("Annual Report 2024"),
            &["Letter to shareholders", "Total B2C orders: 1.2 billion"],
        ),
    )
    .unwrap();

    let document = PdfLoader.load(&path).unwrap();
    assert_eq!(document.id, "annual_report");
    assert_eq!(document.title.as_deref(), Some("Annual Report 2024"));
    assert_eq!(document.pages.len(), 2);
    assert_eq!(document.pages[0].index, 1);
    assert_eq!(document.pages[1].index, 2);
    assert!(document.pages[1].text.contains("Total B2C orders"));
    assert!(!document.pages[0].text.contains("B2C"));
}

#[test]
fn untitled_pdf_has_no_title() {
    let document = PdfLoader::load_bytes(&build_pdf(None, &["hello"]), "memo").unwrap();
    assert_eq!(document.id, "memo");
    assert!(document.title.is_none());
}

#[test]
fn missing_file_is_missing_document() {
    let dir = tempfile::tempdir().unwrap();
    let err = PdfLoader.load(&dir.path().join("nope.pdf")).unwrap_err();
    assert!(matches!(err, RagError::MissingDocument(_)));
}

#[test]
fn corrupt_file_is_loader_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.pdf");
    std::fs::write(&path, b"%PDF-1.5 definitely not a pdf").unwrap();

    let err = PdfLoader.load(&path).unwrap_err();
    assert!(matches!(err, RagError::Loader { .. }));
    assert!(matches!(
        PdfLoader::load_file(&path),
        Err(PdfError::Parse(_))
    ));
}
