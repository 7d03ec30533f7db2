use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

pub const PAGE_HEIGHT: i64 = 842;

/// A fragment placed at `x` and `y`, with `y` measured down from the page top.
pub type Placed<'a> = (&'a str, i64, i64);

/// Builds a PDF with one text-showing operation per fragment, positioned
/// through `Tm` so the extracted coordinates match the fixture exactly.
pub fn create_positioned_pdf(
    path: &Path,
    pages: &[Vec<Placed<'_>>],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();

    for fragments in pages {
        let mut operations = Vec::new();
        for (text, x, y) in fragments {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), Object::Integer(10)]));
            operations.push(Operation::new(
                "Tm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Integer(*x),
                    Object::Integer(PAGE_HEIGHT - *y),
                ],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path)?;
    Ok(())
}

/// Two pages: an account block and a transaction grid, then a balance grid.
pub fn bank_statement() -> Vec<Vec<Placed<'static>>> {
    vec![
        vec![
            ("Statement of Account", 40, 60),
            ("Account No: 1234567890", 40, 70),
            ("Branch: Central", 40, 80),
            ("Date", 40, 130),
            ("Particulars", 120, 130),
            ("Amount", 300, 130),
            ("----------------------------", 40, 135),
            ("01-Jan-2024", 40, 140),
            ("Opening", 120, 140),
            ("1,000.00", 300, 140),
            ("02-Jan-2024", 40, 150),
            ("ATM", 120, 150),
            ("200.00", 300, 150),
        ],
        vec![
            ("Date", 40, 100),
            ("Balance", 300, 100),
            ("03-Jan-2024", 40, 110),
            ("800.00", 300, 110),
            ("04-Jan-2024", 40, 120),
            ("650.00", 300, 120),
        ],
    ]
}
