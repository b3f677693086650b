//! Cross-voice horizontal layout.
//!
//! The formatter groups simultaneous tickables into [`TickContext`]s, lets
//! each context size its modifiers, sums the minimum widths and spreads any
//! surplus proportionally. Positions and modifier offsets are then written
//! back into the voices. A formatter can be reused; every call rebuilds the
//! contexts from the current voice contents.

use std::collections::BTreeMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::config::{DebugFlags, LayoutOptions};
use crate::element::Drawable;
use crate::error::Result;
use crate::modifier_context::is_delayed;
use crate::stave::StaveHandle;
use crate::tick_context::TickContext;
use crate::voice::Voice;

/// Slot shared by all timed tickables at one tick.
const TIMED_SLOT: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FormatSummary {
    /// Sum of the contexts' minimum widths
    pub min_total_width: f64,
    /// Width actually used: the target when it exceeded the minimum
    pub justified_width: f64,
    pub tick_count: usize,
}

#[derive(Debug, Default)]
pub struct Formatter {
    options: LayoutOptions,
    debug: DebugFlags,
    contexts: Vec<TickContext>,
}

/// Position and modifier placement computed for one tickable.
struct Placement {
    voice: usize,
    index: usize,
    x: f64,
    /// `(slot, x_shift, text_line)` per modifier
    modifiers: Vec<(usize, f64, f64)>,
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LayoutOptions, debug: DebugFlags) -> Self {
        Self { options, debug, contexts: Vec::new() }
    }

    /// Tick contexts of the last call, in time order.
    pub fn tick_contexts(&self) -> &[TickContext] {
        &self.contexts
    }

    /// Bind every voice to `stave` and fill its note area.
    pub fn format_to_stave<'v, I>(&mut self, voices: I, stave: &StaveHandle) -> Result<FormatSummary>
    where
        I: IntoIterator<Item = &'v mut Voice>,
    {
        let mut voices: Vec<&mut Voice> = voices.into_iter().collect();
        for voice in &mut voices {
            voice.set_stave(stave);
        }
        let width = {
            let s = stave.borrow();
            s.note_end_x() - s.note_start_x()
        };
        self.format_all(&mut voices, Some(width))
    }

    /// Lay the voices out side by side. With a `width` larger than the
    /// minimum the surplus is distributed; otherwise contexts get their
    /// minimum widths.
    pub fn format<'v, I>(&mut self, voices: I, width: Option<f64>) -> Result<FormatSummary>
    where
        I: IntoIterator<Item = &'v mut Voice>,
    {
        let mut voices: Vec<&mut Voice> = voices.into_iter().collect();
        self.format_all(&mut voices, width)
    }

    pub(crate) fn format_all(&mut self, voices: &mut [&mut Voice], width: Option<f64>) -> Result<FormatSummary> {
        for voice in voices.iter() {
            voice.validate()?;
        }
        for voice in voices.iter_mut() {
            for tickable in voice.tickables_mut() {
                tickable.pre_format()?;
            }
        }

        self.contexts = self.build_contexts(voices);
        for ctx in &mut self.contexts {
            ctx.pre_format();
        }

        let natural: Vec<f64> = self.contexts.iter().map(TickContext::width).collect();
        let min_total_width: f64 = natural.iter().sum();
        let widths = justify_widths(&natural, width);
        let mut x = 0.0;
        for (ctx, w) in self.contexts.iter_mut().zip(&widths) {
            ctx.set_x(x);
            ctx.set_justified_width(*w);
            x += w;
        }

        for placement in self.placements() {
            let Some(element) = voices[placement.voice].tickable_mut(placement.index) else {
                continue;
            };
            let (origin, y) = match element.stave() {
                Some(handle) => {
                    let stave = handle.borrow();
                    (stave.note_start_x(), element.natural_y(&stave))
                }
                None => (0.0, element.y()),
            };
            element.set_position(origin + placement.x, y);
            let modifiers = element.modifiers_mut();
            for (slot, x_shift, text_line) in placement.modifiers {
                if let Some(m) = modifiers.get_mut(slot) {
                    m.x_shift = x_shift;
                    m.text_line = text_line;
                }
            }
        }

        let summary = FormatSummary {
            min_total_width,
            justified_width: widths.iter().sum(),
            tick_count: self.contexts.len(),
        };
        if self.debug.formatter {
            debug!(
                "formatter: {} voices, {} tick contexts, min width {:.2}, justified {:.2}",
                voices.len(),
                summary.tick_count,
                summary.min_total_width,
                summary.justified_width
            );
        }
        Ok(summary)
    }

    /// Group tickables by `(tick, slot)` and link the contexts in order.
    fn build_contexts(&self, voices: &[&mut Voice]) -> Vec<TickContext> {
        let common = voices.iter().map(|v| v.resolution()).fold(1, lcm);
        let mut by_tick: BTreeMap<(u64, u32), TickContext> = BTreeMap::new();

        for (vi, voice) in voices.iter().enumerate() {
            let factor = common / voice.resolution();
            let mut tick = 0u64;
            let mut zero_slot = 0u32;
            for (index, tickable) in voice.tickables().iter().enumerate() {
                let ticks = voice.tickable_ticks(index) * factor;
                let slot = if ticks == 0 {
                    zero_slot += 1;
                    zero_slot - 1
                } else {
                    zero_slot = 0;
                    TIMED_SLOT
                };
                by_tick
                    .entry((tick, slot))
                    .or_insert_with(|| TickContext::new(tick, slot, self.options, self.debug.modifiers))
                    .add_element(vi, index, tickable);
                tick += ticks;
            }
        }

        let mut contexts: Vec<TickContext> = by_tick.into_values().collect();
        let count = contexts.len();
        for (i, ctx) in contexts.iter_mut().enumerate() {
            let prev = i.checked_sub(1);
            let next = (i + 1 < count).then_some(i + 1);
            ctx.link(prev, next);
        }
        contexts
    }

    fn placements(&self) -> Vec<Placement> {
        let mut out = Vec::new();
        for ctx in &self.contexts {
            let left_shift = ctx.metrics().map_or(0.0, |m| m.left_shift);
            let next_x = ctx.next().and_then(|n| self.contexts.get(n)).map(TickContext::x);
            let mc = ctx.modifier_context();

            for (member_index, member) in ctx.members().iter().enumerate() {
                let modifiers = mc
                    .entries()
                    .filter(|e| e.member == member_index)
                    .map(|e| {
                        let x_shift = if is_delayed(&e.modifier) {
                            next_x.map_or(e.width / 2.0, |nx| (nx - ctx.x()) / 2.0)
                        } else {
                            e.modifier.x_shift
                        };
                        (e.slot, x_shift, e.modifier.text_line)
                    })
                    .collect();
                let x = ctx.x() + left_shift + mc.host_shift(member_index);
                if self.debug.formatter {
                    trace!(
                        "formatter: tick {} slot {} voice {} #{} at x {:.2}",
                        ctx.tick(),
                        ctx.slot(),
                        member.voice,
                        member.index,
                        x
                    );
                }
                out.push(Placement { voice: member.voice, index: member.index, x, modifiers });
            }
        }
        out
    }
}

/// Final context widths for the given minimum widths. A target above the
/// minimum total is distributed in proportion to each width, or evenly when
/// every width is zero.
pub fn justify_widths(natural: &[f64], target: Option<f64>) -> Vec<f64> {
    let min: f64 = natural.iter().sum();
    let Some(target) = target.filter(|t| *t > min) else {
        return natural.to_vec();
    };
    if natural.is_empty() {
        return Vec::new();
    }
    let extra = target - min;
    if min > 0.0 {
        natural.iter().map(|w| w + extra * w / min).collect()
    } else {
        let each = extra / natural.len() as f64;
        natural.iter().map(|w| w + each).collect()
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: u64, b: u64) -> u64 {
    a / gcd(a, b) * b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKind};
    use crate::model::{BarType, TimeSignature, DEFAULT_RESOLUTION};
    use pretty_assertions::assert_eq;

    fn quarters(keys: &[&str]) -> Voice {
        let mut voice = Voice::new(TimeSignature::new(keys.len() as u32, 4)).unwrap();
        for key in keys {
            voice.add_tickable(Element::note(&[key], "q").unwrap()).unwrap();
        }
        voice
    }

    #[test]
    fn surplus_is_proportional() {
        assert_eq!(justify_widths(&[20.0, 30.0, 10.0], Some(90.0)), vec![30.0, 45.0, 15.0]);
        assert_eq!(justify_widths(&[20.0, 30.0], Some(40.0)), vec![20.0, 30.0]);
        assert_eq!(justify_widths(&[0.0, 0.0], Some(10.0)), vec![5.0, 5.0]);
        assert_eq!(justify_widths(&[], Some(10.0)), Vec::<f64>::new());
    }

    #[test]
    fn simultaneous_notes_share_a_context() {
        let mut a = quarters(&["c/4", "d/4"]);
        let mut b = quarters(&["e/5", "f/5"]);
        let mut formatter = Formatter::new();
        let summary = formatter.format([&mut a, &mut b], None).unwrap();

        assert_eq!(summary.tick_count, 2);
        let ticks: Vec<u64> = formatter.tick_contexts().iter().map(TickContext::tick).collect();
        assert_eq!(ticks, vec![0, 4096]);
        assert_eq!(formatter.tick_contexts()[0].members().len(), 2);
        assert_eq!(a.tickables()[1].x(), b.tickables()[1].x());
    }

    #[test]
    fn mixed_resolutions_align_on_a_common_grid() {
        let mut plain = quarters(&["c/4"]);
        let mut triplets = Voice::with_resolution(TimeSignature::new(1, 4), 3 * DEFAULT_RESOLUTION).unwrap();
        for key in ["c/5", "d/5", "e/5"] {
            let mut note = Element::note(&[key], "8").unwrap();
            note.set_tuplet(3, 2).unwrap();
            triplets.add_tickable(note).unwrap();
        }
        let mut formatter = Formatter::new();
        let summary = formatter.format([&mut plain, &mut triplets], None).unwrap();
        assert_eq!(summary.tick_count, 3);
        assert_eq!(formatter.tick_contexts()[0].members().len(), 2);
    }

    #[test]
    fn bars_lead_the_notes_at_their_tick() {
        let mut voice = Voice::new(TimeSignature::new(2, 4)).unwrap();
        voice.add_tickable(Element::note(&["c/4"], "q").unwrap()).unwrap();
        voice.add_tickable(Element::bar(BarType::Single)).unwrap();
        voice.add_tickable(Element::note(&["d/4"], "q").unwrap()).unwrap();

        let mut formatter = Formatter::new();
        formatter.format([&mut voice], None).unwrap();
        let keys: Vec<(u64, u32)> = formatter.tick_contexts().iter().map(|c| (c.tick(), c.slot())).collect();
        assert_eq!(keys, vec![(0, TIMED_SLOT), (4096, 0), (4096, TIMED_SLOT)]);
        assert!(matches!(voice.tickables()[1].kind(), ElementKind::Bar(_)));
        assert!(voice.tickables()[1].x() < voice.tickables()[2].x());
    }

    #[test]
    fn incomplete_strict_voice_is_rejected() {
        let mut voice = Voice::new(TimeSignature::new(4, 4)).unwrap();
        voice.add_tickable(Element::note(&["c/4"], "q").unwrap()).unwrap();
        assert!(Formatter::new().format([&mut voice], Some(200.0)).is_err());
        assert!(!voice.tickables()[0].is_formatted());
    }
}
