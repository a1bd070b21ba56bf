//! Commands applied through the version controller

use folio_editor::{
    CommandError, CommandKind, EditorConfig, EditorError, MemoryVersionStore, NoPrompt, SelectionRange,
    VersionController, CHART_PROMPT,
};
use folio_parser::{parse, ConfidenceLevel, Inline, Marks, Node};
use std::sync::Arc;

async fn loaded(raw: &str) -> VersionController {
    let controller = VersionController::new(Arc::new(MemoryVersionStore::new()), EditorConfig::default());
    controller.capture_initial(parse(raw)).await.unwrap();
    // start each test without the load's timer
    controller.cancel_autosave();
    controller
}

#[tokio::test]
async fn test_bold_without_selection_changes_nothing() {
    let controller = loaded("Revenue grew").await;
    let document = controller.document();
    let content = controller.content();

    let result = controller.apply_command(CommandKind::Bold, SelectionRange::caret(3), &mut NoPrompt);

    assert_eq!(result, Err(EditorError::Command(CommandError::EmptySelection)));
    assert_eq!(controller.document(), document);
    assert_eq!(controller.content(), content);
    assert!(!controller.has_pending_autosave());
}

#[tokio::test]
async fn test_bold_marks_selection_and_arms_autosave() {
    let controller = loaded("Revenue grew").await;

    let document = controller
        .apply_command(CommandKind::Bold, SelectionRange::new(0, 7), &mut NoPrompt)
        .unwrap();

    let Node::Paragraph { content } = &document.nodes[0] else {
        panic!("expected paragraph, got {:?}", document.nodes[0]);
    };
    assert_eq!(content[0].as_text(), "Revenue");
    assert_eq!(
        content[0].marks(),
        Marks {
            bold: true,
            ..Marks::default()
        }
    );
    assert!(controller.content().contains("<strong>Revenue</strong>"));
    assert!(controller.has_pending_autosave());
    controller.shutdown();
}

#[tokio::test]
async fn test_confidence_insert_wraps_selection() {
    let controller = loaded("Costs fell sharply").await;

    let document = controller
        .apply_command(
            CommandKind::ConfidenceInsert(ConfidenceLevel::Low),
            SelectionRange::new(6, 10),
            &mut NoPrompt,
        )
        .unwrap();

    assert_eq!(document.confidence_markers().len(), 1);
    assert_eq!(document.confidence_markers()[0].level, ConfidenceLevel::Low);
    assert_eq!(document.confidence_markers()[0].text, "fell");
    assert!(controller.content().contains("confidence-low"));
    controller.shutdown();
}

#[tokio::test]
async fn test_dismissed_source_prompt_leaves_document() {
    let controller = loaded("Costs fell").await;
    let before = controller.content();

    let mut dismiss = |_: &str| -> Option<String> { None };
    let result = controller.apply_command(CommandKind::SourceInsert, SelectionRange::new(0, 5), &mut dismiss);

    assert_eq!(result, Err(EditorError::Command(CommandError::Dismissed)));
    assert_eq!(controller.content(), before);
}

#[tokio::test]
async fn test_chart_insert_after_selected_block() {
    let controller = loaded("# Sales\nBody text").await;

    let mut asked = None;
    let mut prompt = |message: &str| -> Option<String> {
        asked = Some(message.to_string());
        Some("Monthly sales".to_string())
    };
    let document = controller
        .apply_command(CommandKind::ChartInsert, SelectionRange::caret(2), &mut prompt)
        .unwrap();

    assert_eq!(asked.as_deref(), Some(CHART_PROMPT));
    assert_eq!(
        document.nodes[1],
        Node::ChartPlaceholder {
            description: "Monthly sales".to_string()
        }
    );
    assert_eq!(document.nodes[2], Node::paragraph(vec![Inline::text("Body text")]));
    controller.shutdown();
}

#[tokio::test]
async fn test_surface_edit_replaces_document() {
    let controller = loaded("Original").await;
    let edited = folio_editor::format_to_html("# Edited\nNew body");

    let document = controller.update_from_surface(&edited).unwrap();
    assert_eq!(document, parse("# Edited\nNew body"));
    assert_eq!(controller.content(), edited);
    assert!(controller.has_pending_autosave());
    controller.shutdown();
}
