//! Streaming renderer driven on a paused clock

use folio_editor::{format, format_to_html, StreamState, StreamingRenderer, StreamingSession};
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

const RAW: &str = "# Outlook\n[Medium Confidence] Demand holds\n- first\n- second";

#[test]
fn test_session_reveals_every_length_once() {
    let mut session = StreamingSession::new(RAW);
    let total = RAW.chars().count();

    let mut lengths = vec![session.revealed_len()];
    while let Some(frame) = session.advance() {
        lengths.push(frame.revealed_len);
    }

    assert_eq!(lengths, (0..=total).collect::<Vec<_>>());
    assert_eq!(session.state(), StreamState::Complete);
    assert_eq!(session.document(), format(RAW));
}

#[tokio::test(start_paused = true)]
async fn test_renderer_frames_are_monotonic() {
    let renderer = StreamingRenderer::new(Duration::from_millis(15));
    let frames = WatchStream::new(renderer.subscribe());
    let handle = renderer.start(RAW);
    let id = handle.id();

    let seen: Vec<_> = frames
        .filter(|display| display.session_id == id)
        .take_while(|display| display.frame.state != StreamState::Complete)
        .map(|display| display.frame.revealed_len)
        .collect()
        .await;

    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(seen.iter().all(|len| *len < RAW.chars().count()));

    let document = handle.finished().await.expect("stream completes");
    assert_eq!(document, format(RAW));

    let last = renderer.current();
    assert_eq!(last.session_id, id);
    assert_eq!(last.frame.state, StreamState::Complete);
    assert_eq!(last.frame.revealed_len, RAW.chars().count());
    assert_eq!(last.frame.html, format_to_html(RAW));
}

#[tokio::test(start_paused = true)]
async fn test_new_session_supersedes_old() {
    let renderer = StreamingRenderer::default();
    let first = renderer.start("first report");
    tokio::time::sleep(Duration::from_millis(40)).await;

    let second = renderer.start("second");
    assert_eq!(first.finished().await, None);
    assert_eq!(second.finished().await, Some(format("second")));
    assert_eq!(renderer.state(), StreamState::Complete);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_partial_output() {
    let renderer = StreamingRenderer::default();
    let handle = renderer.start("a report that never finishes");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(renderer.state(), StreamState::Streaming);

    renderer.cancel();
    assert_eq!(handle.finished().await, None);
    assert_eq!(renderer.state(), StreamState::Idle);
    assert!(renderer.current().frame.document.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_handle_cancel_resets_display() {
    let renderer = StreamingRenderer::default();
    let handle = renderer.start("partial");
    tokio::time::sleep(Duration::from_millis(20)).await;

    handle.cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(renderer.state(), StreamState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_empty_text_completes_immediately() {
    let renderer = StreamingRenderer::default();
    let handle = renderer.start("");
    let document = handle.finished().await.expect("empty stream completes");
    assert!(document.is_empty());
}
