/// Busy indicator drawn on a canvas
/// Shown over the upload while cropping and in the result panel while generating
use iced::widget::canvas::{self, path::Arc, LineCap, Path, Stroke};
use iced::{Color, Element, Length, Radians, Rectangle};
use std::f32::consts::{PI, TAU};
use std::time::Duration;

use crate::Message;

/// Full turns per second
const TURNS_PER_SECOND: f32 = 1.0;

/// Rotating arc over a faint track
#[derive(Debug, Clone, Copy)]
pub struct Spinner {
    /// Start of the arc in radians
    pub angle: f32,
    pub color: Color,
    pub thickness: f32,
}

/// Rotate `angle` by the time elapsed, wrapped to [0, TAU)
pub fn advance(angle: f32, elapsed: Duration) -> f32 {
    (angle + elapsed.as_secs_f32() * TURNS_PER_SECOND * TAU).rem_euclid(TAU)
}

/// Square spinner widget of `size` pixels
pub fn view<'a>(angle: f32, size: f32, color: Color) -> Element<'a, Message> {
    iced::widget::canvas(Spinner {
        angle,
        color,
        thickness: (size / 16.0).max(2.0),
    })
    .width(Length::Fixed(size))
    .height(Length::Fixed(size))
    .into()
}

impl canvas::Program<Message> for Spinner {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &iced::Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let center = frame.center();
        let radius = (bounds.width.min(bounds.height) - self.thickness) / 2.0;
        if radius <= 0.0 {
            return vec![frame.into_geometry()];
        }

        let track = Path::circle(center, radius);
        frame.stroke(
            &track,
            Stroke::default()
                .with_color(Color { a: 0.2, ..self.color })
                .with_width(self.thickness),
        );

        // Three quarters of a circle, like a CSS border spinner
        let arc = Path::new(|builder| {
            builder.arc(Arc {
                center,
                radius,
                start_angle: Radians(self.angle),
                end_angle: Radians(self.angle + 1.5 * PI),
            });
        });
        frame.stroke(
            &arc,
            Stroke::default()
                .with_color(self.color)
                .with_width(self.thickness)
                .with_line_cap(LineCap::Round),
        );

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_one_second_is_full_turn() {
        let angle = advance(1.0, Duration::from_secs(1));
        assert!((angle - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_advance_wraps() {
        let angle = advance(TAU - 0.1, Duration::from_millis(100));
        assert!(angle >= 0.0 && angle < TAU);
        assert!(angle < 1.0);
    }
}
