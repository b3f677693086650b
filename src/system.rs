//! Systems: staves played together, aligned and joined by connectors.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};
use crate::formatter::{FormatSummary, Formatter};
use crate::renderer::staff::{draw_connector, draw_connector_label};
use crate::renderer::{RenderContext, SharedContext};
use crate::stave::StaveHandle;
use crate::voice::{Voice, VoiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorType {
    Brace,
    Bracket,
    SingleLeft,
    SingleRight,
    Double,
    BoldDoubleRight,
}

impl ConnectorType {
    /// Right-hand connectors are drawn over the finished staves.
    pub fn is_overlay(&self) -> bool {
        matches!(self, Self::SingleRight | Self::BoldDoubleRight)
    }
}

#[derive(Debug)]
struct SystemRow {
    stave: StaveHandle,
    voices: Vec<VoiceId>,
}

#[derive(Default)]
pub struct System {
    rows: Vec<SystemRow>,
    connectors: Vec<ConnectorType>,
    label: Option<String>,
    context: Option<SharedContext>,
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("rows", &self.rows)
            .field("connectors", &self.connectors)
            .field("label", &self.label)
            .finish()
    }
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stave and the voices that render on it, top to bottom.
    pub fn add_stave(&mut self, stave: StaveHandle, voices: &[VoiceId]) -> &mut Self {
        self.rows.push(SystemRow { stave, voices: voices.to_vec() });
        self
    }

    pub fn add_connector(&mut self, kind: ConnectorType) -> &mut Self {
        self.connectors.push(kind);
        self
    }

    /// Text drawn left of the system, such as an instrument name.
    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    pub fn staves(&self) -> impl Iterator<Item = &StaveHandle> {
        self.rows.iter().map(|r| &r.stave)
    }

    pub fn voice_ids(&self) -> impl Iterator<Item = VoiceId> + '_ {
        self.rows.iter().flat_map(|r| r.voices.iter().copied())
    }

    pub fn connectors(&self) -> &[ConnectorType] {
        &self.connectors
    }

    pub fn set_context(&mut self, context: SharedContext) -> &mut Self {
        self.context = Some(context);
        self
    }

    /// Align the note start of every stave, bind each voice to its stave
    /// and format all voices together across the narrowest note area.
    pub fn format(&mut self, voices: &mut [Voice], formatter: &mut Formatter) -> Result<FormatSummary> {
        for id in self.voice_ids() {
            if id.0 >= voices.len() {
                return Err(StateError::UnknownVoice(id.0).into());
            }
        }

        let start = self.rows.iter().map(|r| r.stave.borrow().note_start_x()).fold(f64::MIN, f64::max);
        let mut width = f64::INFINITY;
        for row in &self.rows {
            let mut stave = row.stave.borrow_mut();
            stave.set_note_start_x(start);
            width = width.min(stave.note_end_x() - stave.note_start_x());
            drop(stave);
            for id in &row.voices {
                voices[id.0].set_stave(&row.stave);
            }
        }

        let ids: Vec<VoiceId> = self.voice_ids().collect();
        let mut members: Vec<&mut Voice> = voices
            .iter_mut()
            .enumerate()
            .filter(|(i, _)| ids.contains(&VoiceId(*i)))
            .map(|(_, v)| v)
            .collect();
        let target = width.is_finite().then_some(width.max(0.0));
        formatter.format_all(&mut members, target)
    }

    /// Vertical extent from the top line of the first stave to the bottom
    /// line of the last, plus the left and right x.
    fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.rows.first()?.stave.borrow();
        let last = self.rows.last()?.stave.borrow();
        Some((first.x(), first.end_x(), first.y(), last.bottom_y()))
    }

    fn draw_pass(&self, overlay: bool) -> Result<()> {
        let context = self.context.as_ref().ok_or(StateError::MissingContext)?;
        let Some((left, right, top, bottom)) = self.extent() else {
            return Ok(());
        };
        let mut guard = context.try_borrow_mut().map_err(|_| StateError::ReentrantDraw)?;
        let ctx: &mut dyn RenderContext = &mut *guard;

        for kind in self.connectors.iter().filter(|c| c.is_overlay() == overlay) {
            let x = if overlay { right } else { left };
            draw_connector(ctx, *kind, x, top, bottom);
        }
        if !overlay {
            if let Some(label) = &self.label {
                draw_connector_label(ctx, left, top, bottom, label);
            }
        }
        Ok(())
    }

    /// Begin-of-system connectors and the label, drawn before the staves.
    pub fn draw_begin(&self) -> Result<()> {
        self.draw_pass(false)
    }

    /// Right-hand connectors, drawn after everything else.
    pub fn draw_end(&self) -> Result<()> {
        self.draw_pass(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::model::TimeSignature;
    use crate::renderer::{DrawOp, RecordingContext};
    use crate::stave::Stave;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn voice(keys: &[&str]) -> Voice {
        let mut v = Voice::new(TimeSignature::new(keys.len() as u32, 4)).unwrap();
        for k in keys {
            v.add_tickable(Element::note(&[k], "q").unwrap()).unwrap();
        }
        v
    }

    fn grand_staff() -> (System, StaveHandle, StaveHandle) {
        let mut treble = Stave::new(10.0, 40.0, 300.0);
        treble.add_clef("treble").unwrap().add_key_signature("D").unwrap();
        let mut bass = Stave::new(10.0, 140.0, 300.0);
        bass.add_clef("bass").unwrap();
        let (treble, bass) = (treble.into_handle(), bass.into_handle());

        let mut system = System::new();
        system
            .add_stave(treble.clone(), &[VoiceId(0)])
            .add_stave(bass.clone(), &[VoiceId(1)])
            .add_connector(ConnectorType::Brace)
            .add_connector(ConnectorType::BoldDoubleRight);
        (system, treble, bass)
    }

    #[test]
    fn format_aligns_note_starts() {
        let (mut system, treble, bass) = grand_staff();
        let mut voices = vec![voice(&["c/5", "d/5"]), voice(&["c/3", "g/2"])];
        let summary = system.format(&mut voices, &mut Formatter::new()).unwrap();

        assert_eq!(treble.borrow().note_start_x(), bass.borrow().note_start_x());
        assert_eq!(summary.tick_count, 2);
        assert_eq!(voices[0].tickables()[1].x(), voices[1].tickables()[1].x());
        assert!(voices[1].tickables()[0].x() >= treble.borrow().note_start_x());
    }

    #[test]
    fn unknown_voices_are_rejected() {
        let (mut system, _, _) = grand_staff();
        let mut voices = vec![voice(&["c/5"])];
        assert_eq!(
            system.format(&mut voices, &mut Formatter::new()).unwrap_err(),
            StateError::UnknownVoice(1).into()
        );
    }

    #[test]
    fn connectors_split_between_passes() {
        let (mut system, _, _) = grand_staff();
        let recording = Rc::new(RefCell::new(RecordingContext::new()));
        system.set_context(recording.clone());

        system.draw_begin().unwrap();
        let begin = recording.borrow().len();
        assert!(recording.borrow().ops().iter().all(|op| !matches!(op, DrawOp::Line { .. })));

        recording.borrow_mut().clear();
        system.draw_end().unwrap();
        let lines = recording.borrow().ops().iter().filter(|op| matches!(op, DrawOp::Line { .. })).count();
        assert!(begin > 0);
        assert_eq!(lines, 2);
    }

    #[test]
    fn drawing_needs_context() {
        let (system, _, _) = grand_staff();
        assert_eq!(system.draw_begin().unwrap_err(), StateError::MissingContext.into());
    }
}
