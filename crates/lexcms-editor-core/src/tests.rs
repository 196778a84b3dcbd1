//! Scenario tests driving an [`EditorSession`] the way the admin console does.
//!
//! Persisted markup is checked with inline snapshots.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::*;

/// Host that records notices and answers prompts from a queue.
#[derive(Debug, Default)]
struct RecordingHost {
    alerts: RefCell<Vec<String>>,
    answers: RefCell<VecDeque<Option<String>>>,
}

impl RecordingHost {
    fn answering(answers: &[Option<&str>]) -> Self {
        Self {
            alerts: RefCell::default(),
            answers: RefCell::new(answers.iter().map(|a| a.map(String::from)).collect()),
        }
    }

    fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }
}

impl EditorHost for RecordingHost {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn prompt(&self, _message: &str, _default: &str) -> Option<String> {
        self.answers.borrow_mut().pop_front().flatten()
    }
}

const TOOLBAR: &str = "<div id=\"tb\">\
    <button data-cmd=\"bold\"><b>B</b></button>\
    <button data-cmd=\"formatBlock\" data-value=\"h2\">H2</button>\
    <select data-cmd=\"fontSizePx\"><option value=\"18\">18</option></select>\
    </div>";

fn page_with(host: RecordingHost, content: &str) -> (EditorSession<RecordingHost>, SurfaceId, NodeId) {
    let doc = Document::parse(&format!(
        "<body>{TOOLBAR}<div id=\"ed\">{content}</div><footer>outside</footer></body>"
    ));
    let mut session = EditorSession::new(doc, host);
    assert_eq!(
        session.setup_rich_editor("tb", "ed"),
        SetupOutcome::Bound(SurfaceId::from("ed"))
    );
    let s = SurfaceId::from("ed");
    let root = session.surface_root(&s).unwrap();
    (session, s, root)
}

fn page(content: &str) -> (EditorSession<RecordingHost>, SurfaceId, NodeId) {
    page_with(RecordingHost::default(), content)
}

fn two_editors() -> EditorSession<RecordingHost> {
    let doc = Document::parse(
        "<body><div id=\"tb1\"></div><div id=\"ed1\"><p>a<img src=\"https://x/1.png\"></p></div>\
         <div id=\"tb2\"></div><div id=\"ed2\"><p>b<img src=\"https://x/2.png\"></p></div></body>",
    );
    let mut session = EditorSession::new(doc, RecordingHost::default());
    session.setup_rich_editor("tb1", "ed1");
    session.setup_rich_editor("tb2", "ed2");
    session
}

fn text_node(session: &EditorSession<RecordingHost>, needle: &str) -> NodeId {
    let doc = session.document();
    doc.descendants(doc.root())
        .into_iter()
        .find(|&n| doc.text(n).is_some_and(|t| t.contains(needle)))
        .unwrap()
}

/// Select `needle` inside the text node that contains it.
fn select_text(session: &mut EditorSession<RecordingHost>, needle: &str) {
    let node = text_node(session, needle);
    let text = session.document().text(node).unwrap().to_string();
    let start = text[..text.find(needle).unwrap()].chars().count();
    let end = start + needle.chars().count();
    session.set_selection(Some(TextSelection::new(
        Position::new(node, start),
        Position::new(node, end),
    )));
}

fn first_image(session: &EditorSession<RecordingHost>, root: NodeId) -> NodeId {
    session.document().query(root, |el| el.is("img")).unwrap()
}

fn wrapper_count(session: &EditorSession<RecordingHost>, root: NodeId) -> usize {
    session
        .document()
        .query_all(root, |el| el.has_class("img-resizable"))
        .len()
}

#[test]
fn test_picker_inserts_one_centered_wrapped_image() {
    let (mut session, s, root) = page("<p>hello</p>");
    let outcome = session.insert_image_from_picker(&s, "https://x/y.png").unwrap();
    assert_eq!(outcome, CommandOutcome::Applied);
    assert_eq!(wrapper_count(&session, root), 1);

    let img = first_image(&session, root);
    let doc = session.document();
    let wrapper = doc.parent(img).unwrap();
    assert!(doc.has_class(img, "img-align-center"));
    assert!(doc.has_class(wrapper, "img-align-center"));
    assert_eq!(doc.style(img, "max-width").as_deref(), Some("100%"));
    assert_eq!(doc.style(wrapper, "max-width").as_deref(), Some("100%"));
    assert_eq!(session.resolve_image(&s), Some(img));
    assert!(session.host().alerts().is_empty());

    insta::assert_snapshot!(session.serialize(&s).unwrap(), @r#"<p>hello</p><img src="https://x/y.png" style="width: 100%; height: auto; max-width: 100%;" class="img-align-center" data-img-width="100%">"#);
}

#[test]
fn test_image_url_must_be_http() {
    let (mut session, s, root) = page("<p>hello</p>");
    let before = session.document().inner_html(root);

    for url in ["javascript:alert(1)", "ftp://x/y.png", "/relative.png"] {
        assert_eq!(
            session.insert_image_from_picker(&s, url),
            Ok(CommandOutcome::Rejected(Notice::InvalidImageUrl))
        );
    }
    assert_eq!(session.document().inner_html(root), before);
    assert_eq!(session.host().alerts().len(), 3);
    assert_eq!(
        session.host().alerts()[0],
        "Please enter a valid http(s) image URL."
    );
    assert!(!session.can_undo(&s));

    assert_eq!(
        session.insert_image_from_picker(&s, "   "),
        Ok(CommandOutcome::NoOp)
    );
    assert_eq!(session.host().alerts().len(), 3);
}

#[test]
fn test_image_prompt_answer_and_cancel() {
    let host = RecordingHost::answering(&[None, Some(" HTTPS://x/z.png ")]);
    let (mut session, s, root) = page_with(host, "<p>hello</p>");
    let insert = EditorCommand::InsertImage { url: None };

    assert_eq!(session.dispatch(&s, &insert), Ok(CommandOutcome::NoOp));
    assert_eq!(wrapper_count(&session, root), 0);

    assert_eq!(session.dispatch(&s, &insert), Ok(CommandOutcome::Applied));
    let img = first_image(&session, root);
    assert_eq!(session.document().attr(img, "src"), Some("HTTPS://x/z.png"));
}

#[test]
fn test_image_round_trips_through_persisted_markup() {
    let (mut session, s, root) = page("<p>intro</p>");
    session.insert_image_from_picker(&s, "https://x/y.png").unwrap();
    assert_eq!(
        session.dispatch(&s, &EditorCommand::WrapSquare),
        Ok(CommandOutcome::Applied)
    );
    let img = first_image(&session, root);
    assert_eq!(
        session.on_pointer_up(&s, img, WrapperRect::new(240.0, 0.0)),
        Ok(true)
    );

    let saved = session.serialize(&s).unwrap();
    insta::assert_snapshot!(saved, @r#"<p>intro</p><img src="https://x/y.png" style="width: 240px; height: auto; max-width: 100%;" class="img-wrap-square img-align-center" data-img-width="240px" data-img-height="auto">"#);

    session.deserialize(&s, &saved).unwrap();
    assert_eq!(wrapper_count(&session, root), 1);
    let img = first_image(&session, root);
    let doc = session.document();
    let wrapper = doc.parent(img).unwrap();
    assert!(doc.has_class(wrapper, "img-resizable"));
    assert!(doc.has_class(wrapper, "img-wrap-square"));
    assert!(doc.has_class(wrapper, "img-align-center"));
    assert_eq!(doc.style(wrapper, "width").as_deref(), Some("240px"));
    assert_eq!(doc.style(img, "width").as_deref(), Some("240px"));
    assert_eq!(session.serialize(&s).unwrap(), saved);
    assert!(!session.can_undo(&s));
}

#[test]
fn test_serialize_leaves_live_surface_alone() {
    let (mut session, s, root) = page("<p>a<img src=\"https://x/y.png\">b</p>");
    let img = first_image(&session, root);
    session.on_click(&s, img).unwrap();
    let live = session.document().inner_html(root);
    insta::assert_snapshot!(session.serialize(&s).unwrap(), @r#"<p>a<img src="https://x/y.png" style="width: 100%; height: auto; max-width: 100%;" data-img-width="100%">b</p>"#);
    assert_eq!(session.document().inner_html(root), live);
    assert!(session.document().has_class(img, "img-selected"));
}

#[test]
fn test_wrap_commands_need_an_image() {
    let (mut session, s, root) = page("<p>text only</p>");
    let before = session.document().inner_html(root);
    for command in [
        EditorCommand::WrapSquare,
        EditorCommand::WrapBlock,
        EditorCommand::AlignRight,
    ] {
        assert_eq!(
            session.dispatch(&s, &command),
            Ok(CommandOutcome::Rejected(Notice::SelectImage))
        );
    }
    assert_eq!(session.document().inner_html(root), before);
    assert_eq!(
        session.host().alerts(),
        vec!["Click an image in the editor first."; 3]
    );
    assert!(!session.can_undo(&s));
}

#[test]
fn test_align_image_is_exclusive_and_justifies_line() {
    let (mut session, s, root) = page("<p>a<img src=\"https://x/y.png\" class=\"img-align-right\">b</p>");
    let img = first_image(&session, root);
    session.on_click(&s, img).unwrap();
    assert_eq!(
        session.dispatch(&s, &EditorCommand::AlignLeft),
        Ok(CommandOutcome::Applied)
    );
    let doc = session.document();
    let wrapper = doc.parent(img).unwrap();
    let p = doc.parent(wrapper).unwrap();
    for node in [img, wrapper] {
        assert!(doc.has_class(node, "img-align-left"));
        assert!(!doc.has_class(node, "img-align-right"));
    }
    assert_eq!(doc.style(p, "text-align").as_deref(), Some("left"));
}

#[test]
fn test_wrap_block_drops_alignment() {
    let (mut session, s, root) = page("<p><img src=\"https://x/y.png\" class=\"img-wrap-square img-align-left\"></p>");
    let img = first_image(&session, root);
    session.on_click(&s, img).unwrap();
    session.dispatch(&s, &EditorCommand::WrapBlock).unwrap();
    let doc = session.document();
    assert_eq!(doc.attr(img, "class"), Some("img-selected img-wrap-block"));

    session.dispatch(&s, &EditorCommand::WrapSquare).unwrap();
    let doc = session.document();
    assert!(doc.has_class(img, "img-wrap-square"));
    assert!(!doc.has_class(img, "img-align-left"));
}

#[test]
fn test_font_size_bounds_are_inclusive() {
    let (mut session, s, root) = page("<p>hello world</p>");
    select_text(&mut session, "world");
    let before = session.document().inner_html(root);
    for size in ["7", "97", "12.5", "huge"] {
        assert_eq!(
            session.dispatch(&s, &EditorCommand::FontSizePx { size: size.into() }),
            Ok(CommandOutcome::Rejected(Notice::InvalidFontSize))
        );
    }
    assert_eq!(session.document().inner_html(root), before);
    assert_eq!(session.host().alerts().len(), 4);

    assert_eq!(
        session.dispatch(&s, &EditorCommand::FontSizePx { size: "8".into() }),
        Ok(CommandOutcome::Applied)
    );
    assert_eq!(
        session.document().inner_html(root),
        "<p>hello <span style=\"font-size: 8px;\">world</span></p>"
    );

    let (mut session, s, root) = page("<p>hello world</p>");
    select_text(&mut session, "hello");
    assert_eq!(
        session.dispatch(&s, &EditorCommand::FontSizePx { size: "96".into() }),
        Ok(CommandOutcome::Applied)
    );
    assert!(
        session
            .document()
            .query(root, |el| el.style("font-size").as_deref() == Some("96px"))
            .is_some()
    );
}

#[test]
fn test_create_link_validates_and_opens_in_new_tab() {
    let (mut session, s, root) = page("<p>our team page</p>");
    select_text(&mut session, "team");
    assert_eq!(
        session.dispatch(
            &s,
            &EditorCommand::CreateLink {
                url: Some(" JavaScript:alert(1)".into())
            }
        ),
        Ok(CommandOutcome::Rejected(Notice::InvalidLinkUrl))
    );
    assert_eq!(session.document().inner_html(root), "<p>our team page</p>");

    assert_eq!(
        session.dispatch(
            &s,
            &EditorCommand::CreateLink {
                url: Some("/team".into())
            }
        ),
        Ok(CommandOutcome::Applied)
    );
    insta::assert_snapshot!(session.document().inner_html(root), @r#"<p>our <a href="/team" target="_blank" rel="noopener noreferrer">team</a> page</p>"#);
}

#[test]
fn test_text_commands_need_a_selection_in_the_surface() {
    let (mut session, s, root) = page("<p>hello world</p>");
    let before = session.document().inner_html(root);
    assert_eq!(session.dispatch(&s, &EditorCommand::Bold), Ok(CommandOutcome::NoOp));

    // A selection in the page outside the surface does not count.
    select_text(&mut session, "outside");
    assert_eq!(session.dispatch(&s, &EditorCommand::Bold), Ok(CommandOutcome::NoOp));
    assert_eq!(
        session.dispatch(&s, &EditorCommand::StyleTitle),
        Ok(CommandOutcome::NoOp)
    );
    assert_eq!(session.document().inner_html(root), before);
}

#[test]
fn test_title_and_subtitle_are_exclusive() {
    let (mut session, s, root) = page("<p>heading</p>");
    select_text(&mut session, "heading");
    session.dispatch(&s, &EditorCommand::StyleTitle).unwrap();
    let p = session.document().first_child(root).unwrap();
    assert!(session.document().has_class(p, "text-title"));

    session.dispatch(&s, &EditorCommand::StyleSubtitle).unwrap();
    let doc = session.document();
    assert!(doc.has_class(p, "text-subtitle"));
    assert!(!doc.has_class(p, "text-title"));
}

#[test]
fn test_toolbar_click_and_change() {
    let (mut session, s, root) = page("<p>hello world</p>");
    select_text(&mut session, "world");
    let bold_label = session
        .document()
        .query(session.document().root(), |el| el.is("b"))
        .unwrap();
    assert_eq!(
        session.on_toolbar_click("tb", bold_label),
        Ok(CommandOutcome::Applied)
    );
    assert_eq!(session.document().inner_html(root), "<p>hello <b>world</b></p>");

    let toolbar = session.document().get_element_by_id("tb").unwrap();
    assert_eq!(session.on_toolbar_click("tb", toolbar), Ok(CommandOutcome::NoOp));

    let select = session
        .document()
        .query(toolbar, |el| el.is("select"))
        .unwrap();
    let option = session.document().first_child(select).unwrap();
    assert_eq!(
        session.on_toolbar_change("tb", option, "200"),
        Ok(CommandOutcome::Rejected(Notice::InvalidFontSize))
    );
    assert_eq!(
        session.on_toolbar_change("nope", option, "18"),
        Err(EditorError::UnknownToolbar("nope".into()))
    );
    assert!(session.can_undo(&s));
}

#[test]
fn test_undo_and_redo_restore_markup() {
    let (mut session, s, root) = page("<p>hello world</p>");
    select_text(&mut session, "world");
    session.dispatch(&s, &EditorCommand::Bold).unwrap();
    assert_eq!(session.document().inner_html(root), "<p>hello <b>world</b></p>");

    assert_eq!(session.dispatch(&s, &EditorCommand::Undo), Ok(CommandOutcome::Applied));
    assert_eq!(session.document().inner_html(root), "<p>hello world</p>");
    assert!(session.can_redo(&s));
    assert_eq!(session.selection(), None);

    assert_eq!(session.dispatch(&s, &EditorCommand::Redo), Ok(CommandOutcome::Applied));
    assert_eq!(session.document().inner_html(root), "<p>hello <b>world</b></p>");
    assert_eq!(session.dispatch(&s, &EditorCommand::Redo), Ok(CommandOutcome::NoOp));
}

#[test]
fn test_undo_after_image_removal_rewraps() {
    let (mut session, s, root) = page("<p>a<img src=\"https://x/y.png\">b</p>");
    let img = first_image(&session, root);
    session.on_click(&s, img).unwrap();
    session.on_keydown(&s, &Key::Backspace).unwrap();
    assert_eq!(wrapper_count(&session, root), 0);

    assert_eq!(session.undo(&s), Ok(true));
    assert_eq!(wrapper_count(&session, root), 1);
    assert!(
        session
            .document()
            .query(root, |el| el.has_class("img-selected"))
            .is_none()
    );
    assert_eq!(session.resolve_image(&s), None);
}

#[test]
fn test_backspace_removes_only_the_image() {
    let (mut session, s, root) = page("<p>a<img src=\"https://x/y.png\">b</p>");
    let img = first_image(&session, root);
    assert_eq!(session.on_click(&s, img), Ok(ClickResult::Selected(img)));

    assert_eq!(
        session.on_keydown(&s, &Key::from_key_value("Backspace")),
        Ok(KeydownResult::Handled)
    );
    assert_eq!(session.document().inner_html(root), "<p>ab</p>");
    assert_eq!(session.resolve_image(&s), None);
    assert_eq!(
        session.on_keydown(&s, &Key::Backspace),
        Ok(KeydownResult::NotHandled)
    );
}

#[test]
fn test_backspace_with_caret_before_image_keeps_image() {
    let (mut session, s, root) = page("<p>ab<img src=\"https://x/y.png\"></p>");
    let img = first_image(&session, root);
    let p = session.document().first_child(root).unwrap();
    let before = session.document().inner_html(root);

    for offset in [1, 2] {
        session.set_selection(Some(TextSelection::caret(Position::new(p, offset))));
        assert_eq!(session.resolve_image(&s), None);
        assert_eq!(
            session.on_keydown(&s, &Key::Backspace),
            Ok(KeydownResult::NotHandled)
        );
        assert_eq!(session.document().inner_html(root), before);
    }

    // Pressing the image selects its wrapper node, which Backspace then removes.
    assert_eq!(session.on_pointer_down(&s, img), Ok(Some(img)));
    assert_eq!(
        session.on_keydown(&s, &Key::Backspace),
        Ok(KeydownResult::Handled)
    );
    assert_eq!(session.document().inner_html(root), "<p>ab</p>");
}

#[test]
fn test_text_commands_leave_selected_wrapper_alone() {
    let (mut session, s, root) = page("<p>ab<img src=\"https://x/y.png\"></p>");
    let img = first_image(&session, root);
    assert_eq!(session.on_pointer_down(&s, img), Ok(Some(img)));

    for command in [
        EditorCommand::Bold,
        EditorCommand::FontSizePx { size: "18".into() },
        EditorCommand::RemoveFormat,
        EditorCommand::CreateLink {
            url: Some("https://example.com".into()),
        },
    ] {
        session.dispatch(&s, &command).unwrap();
        let html = session.document().inner_html(root);
        assert!(
            html.contains("<button type=\"button\" class=\"img-delete\">×</button>"),
            "{command:?} touched the delete button: {html}"
        );
        assert!(!html.contains("<b>"), "{html}");
        assert!(!html.contains("font-size"), "{html}");
        assert!(!html.contains("<a "), "{html}");
    }
    let wrapper = session.document().parent(img).unwrap();
    assert!(session.document().has_class(wrapper, "img-resizable"));
    assert_eq!(session.document().children(wrapper).len(), 2);
}

#[test]
fn test_image_selection_is_per_surface() {
    let mut session = two_editors();
    let (s1, s2) = (SurfaceId::from("ed1"), SurfaceId::from("ed2"));
    let root1 = session.surface_root(&s1).unwrap();
    let root2 = session.surface_root(&s2).unwrap();
    let img1 = first_image(&session, root1);
    let img2 = first_image(&session, root2);

    session.on_click(&s1, img1).unwrap();
    session.on_click(&s2, img2).unwrap();
    assert!(session.document().has_class(img1, "img-selected"));
    assert!(session.document().has_class(img2, "img-selected"));
    assert_eq!(session.resolve_image(&s1), Some(img1));
    assert_eq!(session.resolve_image(&s2), Some(img2));

    let p2 = session.document().first_child(root2).unwrap();
    assert_eq!(session.on_click(&s2, p2), Ok(ClickResult::Cleared));
    assert_eq!(session.resolve_image(&s2), None);
    assert_eq!(session.resolve_image(&s1), Some(img1));
    assert!(session.document().has_class(img1, "img-selected"));

    // An image from another surface cannot be selected here.
    assert_eq!(session.select_image(&s2, Some(img1)), Ok(None));
    assert!(session.document().has_class(img1, "img-selected"));
}

#[test]
fn test_backspace_leaves_other_surface_alone() {
    let mut session = two_editors();
    let (s1, s2) = (SurfaceId::from("ed1"), SurfaceId::from("ed2"));
    let root1 = session.surface_root(&s1).unwrap();
    let root2 = session.surface_root(&s2).unwrap();
    let other = session.document().inner_html(root2);

    let img1 = first_image(&session, root1);
    session.on_click(&s1, img1).unwrap();
    assert_eq!(
        session.on_keydown(&s2, &Key::Delete),
        Ok(KeydownResult::NotHandled)
    );
    assert_eq!(session.on_keydown(&s1, &Key::Delete), Ok(KeydownResult::Handled));
    assert_eq!(session.document().inner_html(root1), "<p>a</p>");
    assert_eq!(session.document().inner_html(root2), other);
}

#[test]
fn test_drag_moves_wrapper_within_surface() {
    let (mut session, s, root) = page("<p>one<img src=\"https://x/1.png\">two</p><p>three</p>");
    let img = first_image(&session, root);
    let start = session.drag_start(&s, img).unwrap().unwrap();
    assert_eq!(start.data, "img-drag");
    assert!(session.drag().is_active());

    let three = text_node(&session, "three");
    assert!(session.drag_over(three));
    let result = session.drop(three, Some(Position::new(three, 5)));
    assert!(result.prevent_default);
    assert_eq!(result.outcome, Some(DropOutcome::AtCaret));
    assert_eq!(session.drag_end(), None);
    assert!(!session.drag().is_active());
    assert!(!session.document().is_connected(start.drag_image));

    insta::assert_snapshot!(session.serialize(&s).unwrap(), @r#"<p>onetwo</p><p>three<img src="https://x/1.png" style="width: 100%; height: auto; max-width: 100%;" data-img-width="100%"></p>"#);
}

#[test]
fn test_drop_outside_any_surface_rolls_back() {
    let (mut session, s, root) = page("<p>one<img src=\"https://x/1.png\">two</p>");
    let before = session.document().inner_html(root);
    let img = first_image(&session, root);
    let start = session.drag_start(&s, img).unwrap().unwrap();

    let footer = text_node(&session, "outside");
    assert!(session.drag_over(footer));
    let result = session.drop(footer, None);
    assert_eq!(
        result.outcome,
        Some(DropOutcome::RolledBack(RollbackReason::OutsideEditor))
    );
    assert!(result.prevent_default);
    assert_eq!(session.document().inner_html(root), before);
    assert!(!session.document().is_connected(start.drag_image));
    assert!(!session.drag_over(footer));
}

#[test]
fn test_drop_into_other_surface_is_refused() {
    let mut session = two_editors();
    let (s1, s2) = (SurfaceId::from("ed1"), SurfaceId::from("ed2"));
    let root1 = session.surface_root(&s1).unwrap();
    let root2 = session.surface_root(&s2).unwrap();
    let (before1, before2) = (
        session.document().inner_html(root1),
        session.document().inner_html(root2),
    );

    let img1 = first_image(&session, root1);
    session.drag_start(&s1, img1).unwrap().unwrap();
    let b = text_node(&session, "b");
    let result = session.drop(b, Some(Position::new(b, 1)));
    assert_eq!(
        result.outcome,
        Some(DropOutcome::RolledBack(RollbackReason::ForeignEditor))
    );
    assert_eq!(session.document().inner_html(root1), before1);
    assert_eq!(session.document().inner_html(root2), before2);
}

#[test]
fn test_escape_cancels_drag() {
    let (mut session, s, root) = page("<p>one<img src=\"https://x/1.png\">two</p><p>three</p>");
    let before = session.document().inner_html(root);
    let img = first_image(&session, root);
    session.drag_start(&s, img).unwrap();
    assert_eq!(session.on_keydown(&s, &Key::Escape), Ok(KeydownResult::Handled));
    assert!(!session.drag().is_active());
    assert_eq!(session.document().inner_html(root), before);
    assert_eq!(session.drop(img, None), DropResult::default());
}

#[test]
fn test_setup_twice_does_not_double_wrap() {
    let (mut session, _, root) = page("<p><img src=\"https://x/1.png\"><img src=\"https://x/2.png\"></p>");
    let html = session.document().inner_html(root);
    assert_eq!(session.setup_rich_editor("tb", "ed"), SetupOutcome::AlreadyBound);
    assert_eq!(session.document().inner_html(root), html);
    assert_eq!(wrapper_count(&session, root), 2);
}

#[test]
fn test_setup_adds_link_targets() {
    let (session, _, root) = page("<p><a href=\"/contact\">contact</a></p>");
    insta::assert_snapshot!(session.document().inner_html(root), @r#"<p><a href="/contact" target="_blank" rel="noopener noreferrer">contact</a></p>"#);
}
