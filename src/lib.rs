//! stavelib: music notation layout and rendering engine.
//!
//! Notes, rests and signatures are [`Element`]s collected into [`Voice`]s.
//! The [`Formatter`] groups simultaneous tickables into tick contexts, sizes
//! their modifiers and justifies the result across a stave; a [`Session`]
//! then draws staves, voices and queued spanners onto any [`RenderContext`].
//!
//! # Example
//! ```no_run
//! use stavelib::{render_svg, Element, EngineConfig, Formatter, Stave, Voice};
//!
//! let svg = render_svg(&EngineConfig::default(), |session| {
//!     let mut stave = Stave::new(10.0, 40.0, 400.0);
//!     stave.add_clef("treble")?.add_time_signature("4/4")?;
//!     let stave = session.add_stave(stave)?;
//!
//!     let mut voice = Voice::parse("4/4")?;
//!     for key in ["c/4", "e/4", "g/4", "c/5"] {
//!         voice.add_tickable(Element::note(&[key], "q")?)?;
//!     }
//!     Formatter::new().format_to_stave([&mut voice], &stave)?;
//!     session.add_voice(voice)?;
//!     Ok(())
//! })
//! .unwrap();
//! println!("{svg}");
//! ```

pub mod config;
pub mod element;
pub mod error;
pub mod formatter;
pub mod glyphs;
pub mod model;
pub mod modifier;
pub mod modifier_context;
pub mod pipeline;
pub mod renderer;
pub mod stave;
pub mod system;
pub mod tick_context;
pub mod voice;

use std::cell::RefCell;
use std::rc::Rc;

pub use config::{DebugFlags, EngineConfig, LayoutOptions};
pub use element::{DrawScope, Drawable, Element, ElementKind, NoteAnchor};
pub use error::{EngineError, Result};
pub use formatter::{FormatSummary, Formatter};
pub use model::*;
pub use modifier::{Modifier, ModifierCategory, ModifierPosition};
pub use pipeline::{RenderQueue, Session, SessionState};
pub use renderer::{DrawOp, RecordingContext, RenderContext, SharedContext, SvgContext};
pub use stave::{Stave, StaveHandle};
pub use system::{ConnectorType, System};
pub use voice::{Voice, VoiceId, VoiceMode};

/// Build a session against an SVG surface sized from `config`, draw it and
/// return the document.
pub fn render_svg<F>(config: &EngineConfig, build: F) -> Result<String>
where
    F: FnOnce(&mut Session) -> Result<()>,
{
    let svg = Rc::new(RefCell::new(SvgContext::from_config(&config.renderer)));
    let mut session = Session::new(config.clone());
    session.set_context(svg.clone())?;
    build(&mut session)?;
    session.draw()?;
    let document = svg.borrow().build();
    Ok(document)
}
