//! Drawing sessions.
//!
//! A [`Session`] collects staves, voices, systems and standalone elements,
//! then draws them in one fixed sequence of passes:
//!
//! 1. format every system and draw its begin-of-system connectors
//! 2. draw every stave
//! 3. draw every voice
//! 4. draw queued elements not yet rendered, marking each one
//! 5. draw the systems' overlay connectors
//!
//! Everything registered is transient: a successful draw clears the session
//! and returns it to [`SessionState::Idle`]. A failed draw leaves it in
//! [`SessionState::Drawing`] until [`Session::reset`] is called.

use log::{debug, info, trace};

use crate::config::EngineConfig;
use crate::element::{DrawScope, Drawable, Element};
use crate::error::{ConfigurationError, Result, StateError};
use crate::formatter::{FormatSummary, Formatter};
use crate::renderer::SharedContext;
use crate::stave::{Stave, StaveHandle};
use crate::system::System;
use crate::voice::{Voice, VoiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Collecting,
    Drawing,
}

/// Elements drawn after the voices: ties, curves, beams, brackets and
/// anything else not reachable through a stave or voice.
#[derive(Debug, Default)]
pub struct RenderQueue {
    items: Vec<Element>,
}

impl RenderQueue {
    pub fn push(&mut self, element: Element) {
        self.items.push(element);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

pub struct Session {
    config: EngineConfig,
    state: SessionState,
    context: Option<SharedContext>,
    staves: Vec<StaveHandle>,
    voices: Vec<Voice>,
    systems: Vec<System>,
    queue: RenderQueue,
    formatter: Formatter,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("has_context", &self.context.is_some())
            .field("staves", &self.staves.len())
            .field("voices", &self.voices.len())
            .field("systems", &self.systems.len())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        let formatter = Formatter::with_options(config.layout, config.debug);
        Self {
            config,
            state: SessionState::Idle,
            context: None,
            staves: Vec::new(),
            voices: Vec::new(),
            systems: Vec::new(),
            queue: RenderQueue::default(),
            formatter,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Supply the render surface. It survives `reset()`.
    pub fn set_context(&mut self, context: SharedContext) -> Result<&mut Self> {
        self.check_not_drawing()?;
        self.context = Some(context);
        Ok(self)
    }

    pub fn context(&self) -> Option<&SharedContext> {
        self.context.as_ref()
    }

    fn check_not_drawing(&self) -> Result<()> {
        if self.state == SessionState::Drawing {
            return Err(StateError::SessionBusy.into());
        }
        Ok(())
    }

    fn collect(&mut self) -> Result<()> {
        self.check_not_drawing()?;
        self.state = SessionState::Collecting;
        Ok(())
    }

    // ── Registration ────────────────────────────────────────────────

    /// A stave using this session's line spacing and layout options. It is
    /// not registered until passed to [`Session::add_stave`].
    pub fn new_stave(&self, x: f64, y: f64, width: f64) -> Stave {
        Stave::with_config(x, y, width, &self.config)
    }

    pub fn add_stave(&mut self, stave: Stave) -> Result<StaveHandle> {
        self.collect()?;
        let handle = stave.into_handle();
        self.staves.push(handle.clone());
        Ok(handle)
    }

    pub fn add_voice(&mut self, voice: Voice) -> Result<VoiceId> {
        self.collect()?;
        self.voices.push(voice);
        Ok(VoiceId(self.voices.len() - 1))
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(id.0)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices.get_mut(id.0)
    }

    pub fn add_system(&mut self, system: System) -> Result<usize> {
        self.collect()?;
        self.systems.push(system);
        Ok(self.systems.len() - 1)
    }

    pub fn queue(&mut self, element: Element) -> Result<()> {
        self.collect()?;
        self.queue.push(element);
        Ok(())
    }

    pub fn render_queue(&self) -> &RenderQueue {
        &self.queue
    }

    /// Beam a run of notes in a registered voice and queue the beam.
    pub fn beam(&mut self, id: VoiceId, range: std::ops::Range<usize>) -> Result<()> {
        self.collect()?;
        let voice = self.voices.get_mut(id.0).ok_or(StateError::UnknownVoice(id.0))?;
        let beam = voice.create_beam(id, range)?;
        self.queue.push(beam);
        Ok(())
    }

    /// Format voices that are not part of a system against one stave.
    pub fn format_to_stave(&mut self, ids: &[VoiceId], stave: &StaveHandle) -> Result<FormatSummary> {
        self.collect()?;
        if let Some(missing) = ids.iter().find(|id| id.0 >= self.voices.len()) {
            return Err(StateError::UnknownVoice(missing.0).into());
        }
        let voices = self
            .voices
            .iter_mut()
            .enumerate()
            .filter(|(i, _)| ids.contains(&VoiceId(*i)))
            .map(|(_, v)| v);
        self.formatter.format_to_stave(voices, stave)
    }

    // ── Drawing ─────────────────────────────────────────────────────

    pub fn draw(&mut self) -> Result<()> {
        self.check_not_drawing()?;
        let context = self.context.clone().ok_or(ConfigurationError::MissingRenderSurface)?;
        self.state = SessionState::Drawing;
        context
            .try_borrow_mut()
            .map_err(|_| StateError::ReentrantDraw)?
            .set_font(&self.config.font);
        let verbose = self.config.debug.pipeline;
        if verbose {
            info!(
                "pipeline: drawing {} systems, {} staves, {} voices, {} queued",
                self.systems.len(),
                self.staves.len(),
                self.voices.len(),
                self.queue.len()
            );
        }

        self.bind(&context);

        for system in &mut self.systems {
            system.format(&mut self.voices, &mut self.formatter)?;
            system.draw_begin()?;
        }
        if verbose {
            debug!("pipeline: systems formatted");
        }

        let empty = DrawScope::empty();
        for stave in &self.staves {
            stave.borrow().draw(&empty)?;
        }

        let scope = DrawScope::new(&self.voices);
        for voice in &self.voices {
            voice.draw(&scope)?;
        }
        if verbose {
            debug!("pipeline: {} voices drawn", self.voices.len());
        }

        for item in self.queue.items.iter_mut() {
            if item.is_rendered() {
                if verbose {
                    trace!("pipeline: skipping rendered {}", item.kind().name());
                }
                continue;
            }
            item.draw(&scope)?;
            item.mark_rendered();
        }

        for system in &self.systems {
            system.draw_end()?;
        }

        for voice in &mut self.voices {
            voice.mark_rendered();
        }
        self.reset();
        if verbose {
            debug!("pipeline: session reset");
        }
        Ok(())
    }

    fn bind(&mut self, context: &SharedContext) {
        for stave in &self.staves {
            stave.borrow_mut().set_context(context.clone());
        }
        for voice in &mut self.voices {
            voice.set_context(context);
        }
        for system in &mut self.systems {
            system.set_context(context.clone());
        }
        for item in self.queue.items.iter_mut() {
            item.set_context(context.clone());
        }
    }

    /// Drop everything registered and return to `Idle`. The render surface
    /// is kept.
    pub fn reset(&mut self) {
        self.staves.clear();
        self.voices.clear();
        self.systems.clear();
        self.queue.clear();
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{RecordingContext, RenderContext};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn registration_moves_to_collecting() {
        let mut session = Session::default();
        assert_eq!(session.state(), SessionState::Idle);
        session.add_stave(Stave::new(0.0, 0.0, 200.0)).unwrap();
        assert_eq!(session.state(), SessionState::Collecting);
    }

    #[test]
    fn drawing_without_surface_fails_and_keeps_state() {
        let mut session = Session::default();
        session.add_stave(Stave::new(0.0, 0.0, 200.0)).unwrap();
        assert_eq!(session.draw().unwrap_err(), ConfigurationError::MissingRenderSurface.into());
        assert_eq!(session.state(), SessionState::Collecting);
    }

    #[test]
    fn successful_draw_resets() {
        let recording = Rc::new(RefCell::new(RecordingContext::new()));
        let mut session = Session::default();
        session.set_context(recording.clone()).unwrap();
        session.add_stave(Stave::new(0.0, 0.0, 200.0)).unwrap();
        session.draw().unwrap();

        assert_eq!(session.state(), SessionState::Idle);
        let drawn = recording.borrow().len();
        assert!(drawn > 0);
        session.draw().unwrap();
        assert_eq!(recording.borrow().len(), drawn);
    }

    #[test]
    fn session_config_reaches_staves_and_surface() {
        let config = EngineConfig::from_json(
            r#"{ "stave": { "space": 12 }, "font": { "face": "Bravura Text", "point": 14 } }"#,
        )
        .unwrap();
        let recording = Rc::new(RefCell::new(RecordingContext::new()));
        let mut session = Session::new(config);
        session.set_context(recording.clone()).unwrap();

        let stave = session.new_stave(0.0, 0.0, 200.0);
        assert_eq!(stave.space(), 12.0);
        session.add_stave(stave).unwrap();
        session.draw().unwrap();
        assert_eq!(recording.borrow().font().face, "Bravura Text");
        assert_eq!(recording.borrow().font().point, 14.0);
    }

    #[test]
    fn failed_draw_blocks_until_reset() {
        let recording = Rc::new(RefCell::new(RecordingContext::new()));
        let mut session = Session::default();
        session.set_context(recording.clone()).unwrap();
        session.queue(Element::note(&["c/4"], "q").unwrap()).unwrap();

        assert_eq!(session.draw().unwrap_err(), StateError::MissingStave("note").into());
        assert_eq!(session.state(), SessionState::Drawing);
        assert_eq!(session.draw().unwrap_err(), StateError::SessionBusy.into());
        assert_eq!(
            session.add_voice(Voice::parse("4/4").unwrap()).unwrap_err(),
            StateError::SessionBusy.into()
        );
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.render_queue().is_empty());
    }
}
