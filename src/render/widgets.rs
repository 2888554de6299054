//! Drawing primitives for the dashboard: battery gauge, filter indicator,
//! clipped text and the alert bar.

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Circle, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment,
};
use embedded_graphics::text::{Baseline, Text};

/// Outer size of the battery gauge body, without the terminal nub.
pub const BATTERY_BODY: Size = Size::new(28, 14);
/// Width of the terminal nub on the right of the body.
pub const BATTERY_NUB_WIDTH: u32 = 3;
const BATTERY_STROKE: u32 = 2;
const BATTERY_GAP: u32 = 1;

/// Maximum width of the gauge's fill bar.
pub const fn battery_bar_max() -> u32 {
    BATTERY_BODY.width - 2 * (BATTERY_STROKE + BATTERY_GAP)
}

/// Width in pixels of the fill bar for `percent`.
///
/// `percent` is clamped into 0..=100 (NaN counts as 0) and mapped
/// monotonically onto 0..=`bar_max`.
pub fn battery_fill_width(percent: f32, bar_max: u32) -> u32 {
    let clamped = if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    };
    let width = (clamped / 100.0 * bar_max as f32).round() as u32;
    width.min(bar_max)
}

/// Draw a battery outline at `origin` filled according to `percent`.
/// `None` draws an empty gauge.
pub fn draw_battery<D>(display: &mut D, origin: Point, percent: Option<f32>)
where
    D: DrawTarget<Color = BinaryColor>,
{
    Rectangle::new(origin, BATTERY_BODY)
        .into_styled(inside_stroke(BATTERY_STROKE))
        .draw(display)
        .ok();

    let nub_height = BATTERY_BODY.height / 2;
    Rectangle::new(
        origin + Point::new(BATTERY_BODY.width as i32, ((BATTERY_BODY.height - nub_height) / 2) as i32),
        Size::new(BATTERY_NUB_WIDTH, nub_height),
    )
    .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
    .draw(display)
    .ok();

    let fill = battery_fill_width(percent.unwrap_or(0.0), battery_bar_max());
    if fill > 0 {
        let inset = (BATTERY_STROKE + BATTERY_GAP) as i32;
        Rectangle::new(
            origin + Point::new(inset, inset),
            Size::new(fill, BATTERY_BODY.height - 2 * (BATTERY_STROKE + BATTERY_GAP)),
        )
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(display)
        .ok();
    }
}

fn inside_stroke(width: u32) -> PrimitiveStyle<BinaryColor> {
    PrimitiveStyleBuilder::new()
        .stroke_color(BinaryColor::On)
        .stroke_width(width)
        .stroke_alignment(StrokeAlignment::Inside)
        .build()
}

/// A small disc: filled when the filter is blocking, hollow otherwise.
pub fn draw_filter_indicator<D>(display: &mut D, top_left: Point, diameter: u32, active: bool)
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = if active {
        PrimitiveStyle::with_fill(BinaryColor::On)
    } else {
        inside_stroke(1)
    };
    Circle::new(top_left, diameter).into_styled(style).draw(display).ok();
}

/// Horizontal advance of one character in `font`.
pub fn char_advance(font: &MonoFont<'_>) -> u32 {
    font.character_size.width + font.character_spacing
}

/// Shorten `text` so it fits in `max_width` pixels, marking the cut with `~`.
pub fn ellipsize(text: &str, font: &MonoFont<'_>, max_width: u32) -> String {
    let advance = char_advance(font).max(1);
    // The last glyph does not need its trailing spacing.
    let fits = ((max_width + font.character_spacing) / advance) as usize;
    let count = text.chars().count();
    if count <= fits {
        return text.to_string();
    }
    if fits == 0 {
        return String::new();
    }
    let mut shortened: String = text.chars().take(fits - 1).collect();
    shortened.push('~');
    shortened
}

/// Draw `text` with its top-left corner at `origin`, clipped to `max_width`.
/// Returns the y coordinate just below the line.
pub fn draw_text_line<D>(
    display: &mut D,
    text: &str,
    origin: Point,
    font: &MonoFont<'_>,
    color: BinaryColor,
    max_width: u32,
) -> i32
where
    D: DrawTarget<Color = BinaryColor>,
{
    let line = ellipsize(text, font, max_width);
    Text::with_baseline(&line, origin, MonoTextStyle::new(font, color), Baseline::Top)
        .draw(display)
        .ok();
    origin.y + font.character_size.height as i32
}

/// Horizontal padding inside an alert bar.
pub const ALERT_PADDING: u32 = 4;

/// Pack `messages` into as few lines of `max_width` pixels as possible,
/// joined with ` | `. Messages are never split; one that does not fit on a
/// line of its own gets a line to itself and is ellipsized when drawn.
pub fn pack_messages(messages: &[String], font: &MonoFont<'_>, max_width: u32) -> Vec<String> {
    let capacity = ((max_width + font.character_spacing) / char_advance(font).max(1)) as usize;
    let mut lines: Vec<String> = Vec::new();
    for message in messages {
        match lines.last_mut() {
            Some(line) if line.chars().count() + 3 + message.chars().count() <= capacity => {
                line.push_str(" | ");
                line.push_str(message);
            }
            _ => lines.push(message.clone()),
        }
    }
    lines
}

/// Inverted bar spanning `area`, with the message centred vertically.
pub fn draw_alert_bar<D>(display: &mut D, area: Rectangle, message: &str, font: &MonoFont<'_>)
where
    D: DrawTarget<Color = BinaryColor>,
{
    area.into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(display)
        .ok();

    let padding = ALERT_PADDING as i32;
    let text_height = font.character_size.height as i32;
    let y = area.top_left.y + (area.size.height as i32 - text_height).max(0) / 2;
    draw_text_line(
        display,
        message,
        Point::new(area.top_left.x + padding, y),
        font,
        BinaryColor::Off,
        area.size.width.saturating_sub(2 * ALERT_PADDING),
    );
}
