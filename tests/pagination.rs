use vulntrack_report::{Cursor, Document, FontSet, ReportStyle};

fn fixture() -> (Document, Cursor, ReportStyle) {
    let style = ReportStyle::default();
    let doc = Document::new(FontSet::default(), &style);
    let cursor = Cursor::new(&style);
    (doc, cursor, style)
}

#[test]
fn cursor_starts_below_the_top_margin() {
    let (doc, cursor, style) = fixture();
    assert_eq!(doc.pages().len(), 1);
    assert_eq!(cursor.page(), 0);
    assert_eq!(cursor.y(), style.page_height - style.margin);
}

#[test]
fn advance_moves_down_without_breaking() {
    let (doc, mut cursor, style) = fixture();
    cursor.advance(100.0);
    assert_eq!(cursor.y(), style.page_top() - 100.0);
    assert_eq!(cursor.page(), 0);
    assert_eq!(doc.pages().len(), 1);
}

#[test]
fn ensure_space_is_a_no_op_when_the_block_fits() {
    let (mut doc, mut cursor, _) = fixture();
    cursor.advance(200.0);
    let y = cursor.y();
    assert!(!cursor.ensure_space(&mut doc, 300.0));
    assert_eq!(cursor.y(), y);
    assert_eq!(doc.pages().len(), 1);
}

#[test]
fn ensure_space_breaks_once_and_is_then_idempotent() {
    let (mut doc, mut cursor, style) = fixture();
    cursor.advance(730.0);
    assert!(cursor.y() - 20.0 < style.margin);

    assert!(cursor.ensure_space(&mut doc, 20.0));
    assert_eq!(doc.pages().len(), 2);
    assert_eq!(cursor.page(), 1);
    assert_eq!(cursor.y(), style.page_top());

    assert!(!cursor.ensure_space(&mut doc, 20.0));
    assert_eq!(doc.pages().len(), 2);
    assert_eq!(cursor.y(), style.page_top());
}

#[test]
fn fits_respects_the_bottom_margin() {
    let (_, mut cursor, style) = fixture();
    cursor.advance(700.0);
    let room = cursor.y() - style.margin;
    assert!(cursor.fits(room - 0.5));
    assert!(!cursor.fits(room + 0.5));
}

#[test]
fn break_page_appends_pages_in_order() {
    let (mut doc, mut cursor, style) = fixture();
    for expected in 1..=3 {
        cursor.advance(10.0);
        cursor.break_page(&mut doc);
        assert_eq!(cursor.page(), expected);
        assert_eq!(cursor.y(), style.page_top());
    }
    assert_eq!(doc.pages().len(), 4);
    for page in doc.pages() {
        assert_eq!(page.width, style.page_width);
        assert_eq!(page.height, style.page_height);
        assert!(page.ops().is_empty());
    }
}
