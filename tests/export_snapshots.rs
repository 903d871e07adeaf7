use tgformat::export::ExportFormat;
use tgformat::richtext::document_tree::{Document, Element, Node, TagKind};
use tgformat::richtext::range::Range;
use tgformat::session::{ClipboardPayload, FormatterSession};

fn announcement() -> Document {
    Document::from_nodes(vec![
        Node::element(TagKind::Bold, vec![Node::text("Release 1.2!")]),
        Node::line_break(),
        Node::text("Fixes (see "),
        Node::Element(Element::link(
            "https://example.com/notes?a=1&b=2",
            vec![Node::text("notes")],
        )),
        Node::text(") for "),
        Node::element(TagKind::Code, vec![Node::text("parse_args")]),
        Node::text("."),
        Node::line_break(),
        Node::line_break(),
        Node::element(
            TagKind::Blockquote,
            vec![
                Node::text("Thanks to "),
                Node::element(TagKind::Italic, vec![Node::text("everyone")]),
                Node::line_break(),
                Node::element(TagKind::Spoiler, vec![Node::text("see you soon")]),
            ],
        ),
    ])
}

#[test]
fn announcement_html() {
    let doc = announcement();
    insta::assert_snapshot!(ExportFormat::Html.export(&doc), @r#"
    <b>Release 1.2!</b>
    Fixes (see <a href="https://example.com/notes?a=1&amp;b=2">notes</a>) for <code>parse_args</code>.

    <blockquote>Thanks to <i>everyone</i>
    <span class="tg-spoiler">see you soon</span></blockquote>
    "#);
}

#[test]
fn announcement_markdown() {
    let doc = announcement();
    insta::assert_snapshot!(ExportFormat::MarkdownV2.export(&doc), @r"
    *Release 1\.2\!*
    Fixes \(see [notes](https://example\.com/notes?a\=1&b\=2)\) for `parse\_args`\.

    > Thanks to _everyone_
    > ||see you soon||
    ");
}

#[test]
fn announcement_calculator() {
    let doc = Document::from_nodes(vec![
        Node::element(TagKind::Bold, vec![Node::text("a")]),
        Node::line_break(),
        Node::line_break(),
        Node::text("b"),
    ]);
    insta::assert_snapshot!(
        ExportFormat::Calculator.export(&doc),
        @r"'<b>a</b>' + '\n' + '\n' + 'b'"
    );
}

#[test]
fn pasted_google_docs_markup() {
    let html = concat!(
        "<meta charset=\"utf-8\">",
        "<b style=\"font-weight:normal;\" id=\"docs-internal-guid-42\">",
        "<p dir=\"ltr\"><span style=\"font-weight:700;\">Heads up</span></p>",
        "<p dir=\"ltr\"><span style=\"font-style:italic;\">tomorrow</span>",
        "<span> at </span>",
        "<span style=\"text-decoration:line-through;\">9</span><span>10</span></p>",
        "<br></b>",
    );
    let mut session = FormatterSession::new();
    session.paste(&ClipboardPayload::html(html));

    insta::assert_snapshot!(session.document().to_string(), @r#"
    Document (3 nodes):
      paragraph
        bold
          "Heads up"
      paragraph
        italic
          "tomorrow"
        " at "
        strikethrough
          "9"
        "10"
      line-break
    "#);
    insta::assert_snapshot!(session.export(ExportFormat::Html).text, @r"
    <b>Heads up</b>
    <i>tomorrow</i> at <s>9</s>10
    ");
}

#[test]
fn session_formatting_flow() {
    let mut session = FormatterSession::new();
    session.insert_text("Meet at noon\nBring snacks");

    session.set_selection(Range::in_text(vec![0], 8, 12)).unwrap();
    session.toggle(TagKind::Bold);
    session.set_selection(Range::in_text(vec![3], 6, 12)).unwrap();
    session.toggle(TagKind::Spoiler);

    insta::assert_snapshot!(session.export(ExportFormat::MarkdownV2).text, @r"
    Meet at *noon*
    Bring ||snacks||
    ");

    session.clear_formatting();
    insta::assert_snapshot!(session.export(ExportFormat::Html).text, @r"
    Meet at noon
    Bring snacks
    ");
}
