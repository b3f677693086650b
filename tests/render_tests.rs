//! Rendering tests: draw preconditions, pass order and the render queue.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use stavelib::error::{ConfigurationError, StateError};
use stavelib::glyphs::Glyph;
use stavelib::{
    render_svg, ConnectorType, DrawOp, DrawScope, Drawable, Element, EngineConfig, NoteAnchor, RecordingContext,
    Session, SessionState, SharedContext, Stave, StaveHandle, System, Voice, VoiceId,
};

fn recording() -> (Rc<RefCell<RecordingContext>>, SharedContext) {
    let rec = Rc::new(RefCell::new(RecordingContext::new()));
    let shared: SharedContext = rec.clone();
    (rec, shared)
}

fn melody(keys: &[&str]) -> Voice {
    let mut voice = Voice::parse(&format!("{}/4", keys.len())).unwrap();
    for key in keys {
        voice.add_tickable(Element::note(&[key], "q").unwrap()).unwrap();
    }
    voice
}

/// Register a treble stave and one formatted voice on it.
fn stave_with_melody(session: &mut Session, keys: &[&str]) -> (StaveHandle, VoiceId) {
    let mut stave = Stave::new(10.0, 40.0, 300.0);
    stave.add_clef("treble").unwrap();
    let stave = session.add_stave(stave).unwrap();
    let id = session.add_voice(melody(keys)).unwrap();
    session.format_to_stave(&[id], &stave).unwrap();
    (stave, id)
}

#[test]
fn stave_dependent_element_needs_a_stave() {
    let (rec, shared) = recording();
    let mut note = Element::note(&["c/4"], "q").unwrap();
    note.set_context(shared);

    let err = note.draw(&DrawScope::empty()).unwrap_err();
    assert_eq!(err, StateError::MissingStave("note").into());
    assert!(!note.is_rendered());
    assert!(rec.borrow().is_empty());
}

#[test]
fn draw_emits_stave_voice_and_queue() {
    let (rec, shared) = recording();
    let mut session = Session::default();
    session.set_context(shared).unwrap();
    let (_, id) = stave_with_melody(&mut session, &["c/5", "c/5", "e/5", "g/5"]);
    session.queue(Element::tie(NoteAnchor::new(id, 0), NoteAnchor::new(id, 1))).unwrap();
    session.beam(id, 2..4).unwrap();
    session.draw().unwrap();

    let rec = rec.borrow();
    assert_eq!(rec.count_glyph(Glyph::TrebleClef), 1);
    assert_eq!(rec.count_glyph(Glyph::NoteheadBlack), 4);
    assert_eq!(rec.ops().iter().filter(|op| matches!(op, DrawOp::Quadratic { .. })).count(), 1);
    assert!(rec.ops().iter().any(|op| matches!(op, DrawOp::Polygon(_))));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn rendered_queue_members_are_skipped() {
    let (rec, shared) = recording();
    let mut session = Session::default();
    session.set_context(shared).unwrap();
    let (_, id) = stave_with_melody(&mut session, &["a/4", "a/4"]);

    let mut tie = Element::tie(NoteAnchor::new(id, 0), NoteAnchor::new(id, 1));
    tie.mark_rendered();
    session.queue(tie).unwrap();
    session.draw().unwrap();

    let quadratics = rec.borrow().ops().iter().filter(|op| matches!(op, DrawOp::Quadratic { .. })).count();
    assert_eq!(quadratics, 0);
}

#[test]
fn second_draw_adds_nothing() {
    let (rec, shared) = recording();
    let mut session = Session::default();
    session.set_context(shared).unwrap();
    let (_, id) = stave_with_melody(&mut session, &["c/4", "d/4"]);
    session.queue(Element::curve(NoteAnchor::new(id, 0), NoteAnchor::new(id, 1))).unwrap();

    session.draw().unwrap();
    let first = rec.borrow().len();
    assert!(first > 0);
    session.draw().unwrap();
    assert_eq!(rec.borrow().len(), first);
}

#[test]
fn passes_run_in_order() {
    let (rec, shared) = recording();
    let mut session = Session::default();
    session.set_context(shared).unwrap();

    let mut treble = Stave::new(30.0, 40.0, 300.0);
    treble.add_clef("treble").unwrap();
    let treble = session.add_stave(treble).unwrap();
    let mut bass = Stave::new(30.0, 140.0, 300.0);
    bass.add_clef("bass").unwrap();
    let bass = session.add_stave(bass).unwrap();

    let upper = session.add_voice(melody(&["e/5", "e/5"])).unwrap();
    let lower = session.add_voice(melody(&["c/3", "e/3"])).unwrap();
    let mut system = System::new();
    system
        .add_stave(treble, &[upper])
        .add_stave(bass, &[lower])
        .add_connector(ConnectorType::Brace)
        .add_connector(ConnectorType::BoldDoubleRight);
    session.add_system(system).unwrap();
    session.queue(Element::tie(NoteAnchor::new(upper, 0), NoteAnchor::new(upper, 1))).unwrap();
    session.draw().unwrap();

    let rec = rec.borrow();
    let ops = rec.ops();
    assert!(matches!(ops[0], DrawOp::Bezier { .. }), "brace comes first");
    assert!(matches!(ops[1], DrawOp::Bezier { .. }));

    let tie = ops.iter().rposition(|op| matches!(op, DrawOp::Quadratic { .. })).unwrap();
    let head = ops.iter().rposition(|op| matches!(op, DrawOp::Glyph { glyph: Glyph::NoteheadBlack, .. })).unwrap();
    let clef = ops.iter().position(|op| matches!(op, DrawOp::Glyph { glyph: Glyph::BassClef, .. })).unwrap();
    assert!(clef < head, "staves before voices");
    assert!(head < tie, "voices before the queue");
    assert_eq!(tie, ops.len() - 3, "overlay connectors close the draw");
    assert!(matches!(ops[ops.len() - 1], DrawOp::Line { .. }));
}

#[test]
fn missing_surface_is_a_configuration_error() {
    let mut session = Session::default();
    session.queue(Element::bar(stavelib::BarType::End)).unwrap();
    assert_eq!(session.draw().unwrap_err(), ConfigurationError::MissingRenderSurface.into());
    assert_eq!(session.state(), SessionState::Collecting);
    assert_eq!(session.render_queue().len(), 1);
}

#[test]
fn busy_surface_fails_fast() {
    let (rec, shared) = recording();
    let mut session = Session::default();
    session.set_context(shared).unwrap();
    stave_with_melody(&mut session, &["c/4"]);

    let held = rec.borrow_mut();
    assert_eq!(session.draw().unwrap_err(), StateError::ReentrantDraw.into());
    drop(held);

    assert_eq!(session.state(), SessionState::Drawing);
    assert_eq!(session.add_stave(Stave::new(0.0, 0.0, 100.0)).unwrap_err(), StateError::SessionBusy.into());
    session.reset();
    session.add_stave(Stave::new(0.0, 0.0, 100.0)).unwrap();
    assert_eq!(session.state(), SessionState::Collecting);
}

#[test]
fn svg_document_contains_the_music() {
    let svg = render_svg(&EngineConfig::default(), |session| {
        let mut stave = Stave::new(10.0, 40.0, 400.0);
        stave.add_clef("treble")?.add_key_signature("G")?.add_time_signature("3/4")?;
        let stave = session.add_stave(stave)?;
        let id = session.add_voice(melody(&["g/4", "b/4", "d/5"]))?;
        session.format_to_stave(&[id], &stave)?;
        session.beam(id, 0..3)?;
        Ok(())
    })
    .expect("render");

    assert!(svg.starts_with("<svg"), "Output should be SVG");
    assert!(svg.contains("</svg>"), "SVG should be closed");
    assert!(svg.contains("<line"), "SVG should contain staff lines");
    assert!(svg.contains("<path"), "SVG should contain glyph paths");
}

#[test]
fn configured_font_reaches_the_document() {
    let config = EngineConfig::from_json(r#"{ "font": { "face": "Petaluma Script" }, "stave": { "space": 11 } }"#)
        .unwrap();
    let svg = render_svg(&config, |session| {
        let mut stave = session.new_stave(60.0, 40.0, 300.0);
        stave.add_clef("treble")?;
        assert_eq!(stave.space(), 11.0);
        let stave = session.add_stave(stave)?;
        let id = session.add_voice(melody(&["a/4", "b/4"]))?;
        let mut system = System::new();
        system.add_stave(stave, &[id]).set_label("Flute");
        session.add_system(system)?;
        Ok(())
    })
    .unwrap();

    assert!(svg.contains("font-family: Petaluma Script;"));
    assert!(svg.contains(r#"font-family="Petaluma Script""#));
    assert!(svg.contains(">Flute</text>"));
}
