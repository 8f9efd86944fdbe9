//! Animated maps that step through categorical states.
//!
//! Each state (e.g. a subject race) is held on screen, then cross-faded into
//! the next with a cubic-in-out easing curve. The output is one
//! self-contained SVG: the boundary layer is drawn once, each state's points
//! are defined once, and every time step is a frame group made visible for
//! exactly its slot of the loop by a discrete SMIL animation.

use std::fmt::Write as _;

use crate::map::{MapPlan, MapText, draw_base, draw_legend, draw_titles};
use crate::svg::{Anchor, SvgDoc, TextStyle, escape};
use crate::{RenderError, ReportTheme};

/// Cubic ease-in-out: slow start, fast middle, slow end. Maps `[0, 1]` onto
/// `[0, 1]`; inputs outside are clamped.
#[must_use]
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0f64).mul_add(t, 2.0).powi(3) / 2.0
    }
}

/// Timing of a state animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeline {
    /// Seconds spent cross-fading between two states.
    pub transition_secs: f64,
    /// Seconds each state is shown on its own.
    pub hold_secs: f64,
    /// Frames per second.
    pub fps: u32,
    /// Whether the last state transitions back to the first.
    pub wrap: bool,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            transition_secs: 1.0,
            hold_secs: 2.0,
            fps: 10,
            wrap: true,
        }
    }
}

/// One time step: state `from` fading into state `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Outgoing state.
    pub from: usize,
    /// Incoming state (equal to `from` while holding).
    pub to: usize,
    /// Eased transition progress in `[0, 1]`.
    pub progress: f64,
}

impl Frame {
    /// The state this frame mostly shows.
    #[must_use]
    pub fn closest(&self) -> usize {
        if self.progress < 0.5 { self.from } else { self.to }
    }
}

impl Timeline {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn frame_count(&self, secs: f64) -> usize {
        (secs * f64::from(self.fps)).round().max(0.0) as usize
    }

    /// Every frame for `states` states, in playback order.
    #[must_use]
    pub fn frames(&self, states: usize) -> Vec<Frame> {
        let hold = self.frame_count(self.hold_secs).max(1);
        let transition = self.frame_count(self.transition_secs);
        let mut frames = Vec::new();

        for from in 0..states {
            frames.extend((0..hold).map(|_| Frame {
                from,
                to: from,
                progress: 0.0,
            }));

            let to = if from + 1 < states {
                from + 1
            } else if self.wrap && states > 1 {
                0
            } else {
                continue;
            };
            #[allow(clippy::cast_precision_loss)]
            frames.extend((0..transition).map(|j| Frame {
                from,
                to,
                progress: ease_cubic_in_out((j + 1) as f64 / (transition + 1) as f64),
            }));
        }

        frames
    }

    /// Loop length in seconds for `frames` frames.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self, frames: usize) -> f64 {
        frames as f64 / f64::from(self.fps.max(1))
    }
}

/// Renders `plan` as a looping animation over `states`: the points whose
/// category is `states[i]` make up state `i`. Points in no listed state are
/// never shown.
///
/// # Errors
///
/// Returns [`RenderError::Empty`] if `states` is empty.
pub fn render_animated_map(
    plan: &MapPlan,
    states: &[String],
    timeline: &Timeline,
    text: &MapText,
    theme: &ReportTheme,
) -> Result<String, RenderError> {
    if states.is_empty() {
        return Err(RenderError::Empty(format!(
            "animation {:?} has no states",
            text.title
        )));
    }

    let frames = timeline.frames(states.len());
    let duration = timeline.duration_secs(frames.len());
    log::debug!(
        "Animating {} states over {} frames ({duration}s)",
        states.len(),
        frames.len()
    );

    let mut doc = SvgDoc::new(theme.width, theme.height, theme)?;

    let mut defs = String::from("<defs>\n");
    for (i, state) in states.iter().enumerate() {
        writeln!(defs, r#"<g id="state-{i}">"#)?;
        for point in plan
            .points
            .iter()
            .filter(|p| p.category.as_deref() == Some(state.as_str()))
        {
            writeln!(
                defs,
                r#"<circle cx="{:.2}" cy="{:.2}" r="{}" fill="{}" fill-opacity="{}"/>"#,
                point.x,
                point.y,
                theme.point_radius,
                escape(theme.color(i)),
                theme.point_opacity
            )?;
        }
        defs.push_str("</g>\n");
    }
    defs.push_str("</defs>");
    doc.raw(&defs);

    draw_base(&mut doc, plan, theme)?;

    let label_style = TextStyle {
        size: theme.body_size,
        color: &theme.foreground,
        anchor: Anchor::End,
        bold: true,
    };
    #[allow(clippy::cast_precision_loss)]
    let n = frames.len() as f64;
    for (k, frame) in frames.iter().enumerate() {
        doc.open_group(if frames.len() > 1 { r#"visibility="hidden""# } else { "" })?;
        if frames.len() > 1 {
            #[allow(clippy::cast_precision_loss)]
            let (start, end) = (k as f64 / n, (k + 1) as f64 / n);
            let (values, key_times) = if k == 0 {
                ("visible;hidden".to_string(), format!("0;{end:.6}"))
            } else {
                (
                    "hidden;visible;hidden".to_string(),
                    format!("0;{start:.6};{end:.6}"),
                )
            };
            doc.raw(&format!(
                r#"<animate attributeName="visibility" values="{values}" keyTimes="{key_times}" dur="{duration}s" calcMode="discrete" repeatCount="indefinite"/>"#
            ));
        }

        if frame.from == frame.to {
            doc.raw(&format!(r##"<use href="#state-{}"/>"##, frame.from));
        } else {
            doc.raw(&format!(
                r##"<use href="#state-{}" opacity="{:.3}"/>"##,
                frame.from,
                1.0 - frame.progress
            ));
            doc.raw(&format!(
                r##"<use href="#state-{}" opacity="{:.3}"/>"##,
                frame.to, frame.progress
            ));
        }

        doc.text(
            plan.panel.max().x,
            plan.panel.min().y,
            label_style,
            &states[frame.closest()],
        )?;
        doc.close_group();
    }

    draw_titles(&mut doc, text, theme)?;
    draw_legend(&mut doc, plan, states, text.legend_title.as_deref(), theme)?;

    Ok(doc.finish())
}
