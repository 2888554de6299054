//! Dashboard layout for the landscape 2.13" panel.
//!
//! ```text
//! +-----------------------------------------------+
//! | 19/10/2026 14:05                  87% [####]> |
//! |-----------------------------------------------|
//! | pihole-a              | pihole-b              |
//! | 192.168.1.10          | 192.168.1.11          |
//! | o DNS ON              | o DNS ON              |
//! | Blocked 12.3%         | Blocked 9.8%          |
//! | Up 3d 4h              | Up 12h 5m             |
//! | CPU 48.2C             | CPU 51.0C             |
//! | Disk 12.3G free                     Net OK    |
//! |###### LOW BATTERY 12% | DNS OFF: b ###########|
//! +-----------------------------------------------+
//! ```
//!
//! When the alerts do not fit one bar they wrap onto further bars stacked
//! upward, drawn over the bottom of the columns.

use crate::metrics::data::{DeviceStatus, StatusSnapshot};
use crate::metrics::local::{format_bytes, format_uptime};
use crate::render::canvas::Frame;
use crate::render::widgets::{
    char_advance, draw_alert_bar, draw_battery, draw_filter_indicator, draw_text_line,
    pack_messages, ALERT_PADDING, BATTERY_BODY, BATTERY_NUB_WIDTH,
};
use chrono::NaiveDateTime;
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_6X13_BOLD};
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use profont::PROFONT_12_POINT;

const MARGIN: i32 = 3;
const LINE_GAP: i32 = 1;

const HEADER_FONT: &MonoFont<'static> = &PROFONT_12_POINT;
const NAME_FONT: &MonoFont<'static> = &FONT_6X13_BOLD;
const BODY_FONT: &MonoFont<'static> = &FONT_6X10;

/// Inputs to the layout that do not come from the metrics.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Time printed in the header
    pub now: NaiveDateTime,
    /// Battery percentage below which the alert bar warns
    pub low_battery_threshold: f32,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
}

impl RenderOptions {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            low_battery_threshold: crate::DEFAULT_LOW_BATTERY_THRESHOLD,
            width: crate::PANEL_WIDTH,
            height: crate::PANEL_HEIGHT,
        }
    }

    pub fn with_low_battery_threshold(mut self, percent: f32) -> Self {
        self.low_battery_threshold = percent;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

fn line_height(font: &MonoFont<'_>) -> i32 {
    font.character_size.height as i32 + LINE_GAP
}

/// Height of the alert bar at the bottom of the canvas.
pub fn alert_bar_height() -> u32 {
    BODY_FONT.character_size.height + 6
}

/// Paint `snapshot` onto a fresh frame.
pub fn render_dashboard(snapshot: &StatusSnapshot, options: &RenderOptions) -> Frame {
    let mut frame = Frame::new(options.width, options.height);
    let width = options.width as i32;

    let header_bottom = draw_header(&mut frame, snapshot, options);
    Line::new(Point::new(0, header_bottom), Point::new(width - 1, header_bottom))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(&mut frame)
        .ok();

    let devices: Vec<&DeviceStatus> = snapshot.devices().collect();
    let column_width = options.width / devices.len().max(1) as u32;
    let columns_top = header_bottom + 1 + LINE_GAP;
    let mut columns_bottom = columns_top;
    for (index, device) in devices.iter().enumerate() {
        let left = index as i32 * column_width as i32;
        let bottom = draw_device_column(
            &mut frame,
            device,
            Point::new(left + MARGIN, columns_top),
            column_width.saturating_sub(2 * MARGIN as u32),
        );
        columns_bottom = columns_bottom.max(bottom);
    }
    for index in 1..devices.len() {
        let x = index as i32 * column_width as i32;
        Line::new(Point::new(x, columns_top), Point::new(x, columns_bottom - 1))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut frame)
            .ok();
    }

    draw_footer(&mut frame, snapshot, columns_bottom + LINE_GAP, options.width);

    for (area, line) in alert_bars(snapshot, options) {
        draw_alert_bar(&mut frame, area, &line, BODY_FONT);
    }

    frame
}

/// Alert bars stacked upward from the bottom edge, one per packed line of
/// alert messages. Lines that would not fit on the canvas are dropped.
pub fn alert_bars(snapshot: &StatusSnapshot, options: &RenderOptions) -> Vec<(Rectangle, String)> {
    let messages: Vec<String> = snapshot
        .alerts(options.low_battery_threshold)
        .iter()
        .map(|alert| alert.to_string())
        .collect();
    let mut lines = pack_messages(
        &messages,
        BODY_FONT,
        options.width.saturating_sub(2 * ALERT_PADDING),
    );

    let bar_height = alert_bar_height();
    lines.truncate((options.height / bar_height) as usize);
    let top = (options.height - lines.len() as u32 * bar_height) as i32;

    lines
        .into_iter()
        .enumerate()
        .map(|(row, line)| {
            let area = Rectangle::new(
                Point::new(0, top + (row as u32 * bar_height) as i32),
                Size::new(options.width, bar_height),
            );
            (area, line)
        })
        .collect()
}

/// Clock on the left, battery gauge and percentage on the right. Returns the
/// y coordinate of the separator line.
fn draw_header(frame: &mut Frame, snapshot: &StatusSnapshot, options: &RenderOptions) -> i32 {
    let width = options.width as i32;
    let header_height = (HEADER_FONT.character_size.height).max(BATTERY_BODY.height) as i32;

    let gauge_width = (BATTERY_BODY.width + BATTERY_NUB_WIDTH) as i32;
    let gauge_origin = Point::new(
        width - MARGIN - gauge_width,
        MARGIN + (header_height - BATTERY_BODY.height as i32) / 2,
    );
    draw_battery(frame, gauge_origin, snapshot.battery_percent.into_option());

    let percent = snapshot
        .battery_percent
        .format_with(|percent| format!("{percent:.0}%"));
    let percent_width = (percent.chars().count() as u32 * char_advance(BODY_FONT)) as i32;
    let percent_x = gauge_origin.x - 4 - percent_width;
    draw_text_line(
        frame,
        &percent,
        Point::new(percent_x, MARGIN + (header_height - BODY_FONT.character_size.height as i32) / 2),
        BODY_FONT,
        BinaryColor::On,
        percent_width as u32,
    );

    let clock = options.now.format("%d/%m/%Y %H:%M").to_string();
    draw_text_line(
        frame,
        &clock,
        Point::new(MARGIN, MARGIN + (header_height - HEADER_FONT.character_size.height as i32) / 2),
        HEADER_FONT,
        BinaryColor::On,
        (percent_x - 2 * MARGIN).max(0) as u32,
    );

    MARGIN + header_height + 1
}

/// One device's name and metrics. Returns the y coordinate below the column.
fn draw_device_column(frame: &mut Frame, device: &DeviceStatus, origin: Point, width: u32) -> i32 {
    let mut y = origin.y;
    draw_text_line(frame, &device.name, Point::new(origin.x, y), NAME_FONT, BinaryColor::On, width);
    y += line_height(NAME_FONT);

    draw_text_line(
        frame,
        &device.address.to_string(),
        Point::new(origin.x, y),
        BODY_FONT,
        BinaryColor::On,
        width,
    );
    y += line_height(BODY_FONT);

    let indicator = BODY_FONT.character_size.height - 2;
    draw_filter_indicator(frame, Point::new(origin.x, y + 1), indicator, device.filter_active());
    let dns = format!("DNS {}", device.filter.blocking);
    let offset = indicator as i32 + 3;
    draw_text_line(
        frame,
        &dns,
        Point::new(origin.x + offset, y),
        BODY_FONT,
        BinaryColor::On,
        width.saturating_sub(offset as u32),
    );
    y += line_height(BODY_FONT);

    let rows = [
        format!(
            "Blocked {}",
            device.filter.blocked_percent.format_with(|p| format!("{p:.1}%"))
        ),
        format!(
            "Up {}",
            device.vitals.uptime_seconds.format_with(|s| format_uptime(*s))
        ),
        format!(
            "CPU {}",
            device.vitals.cpu_celsius.format_with(|t| format!("{t:.1}C"))
        ),
    ];
    for row in rows {
        draw_text_line(frame, &row, Point::new(origin.x, y), BODY_FONT, BinaryColor::On, width);
        y += line_height(BODY_FONT);
    }

    y
}

fn draw_footer(frame: &mut Frame, snapshot: &StatusSnapshot, top: i32, width: u32) {
    let disk = format!(
        "Disk {} free",
        snapshot.disk_free_bytes.format_with(|bytes| format_bytes(*bytes))
    );
    let network = if snapshot.online { "Net OK" } else { "Net DOWN" };

    let half = width / 2;
    draw_text_line(
        frame,
        &disk,
        Point::new(MARGIN, top),
        BODY_FONT,
        BinaryColor::On,
        half.saturating_sub(MARGIN as u32),
    );
    let network_width = (network.len() as u32 * char_advance(BODY_FONT)) as i32;
    draw_text_line(
        frame,
        network,
        Point::new(width as i32 - MARGIN - network_width, top),
        BODY_FONT,
        BinaryColor::On,
        network_width as u32,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::data::{BlockingState, Reading};
    use chrono::NaiveDate;

    fn options() -> RenderOptions {
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        RenderOptions::new(now)
    }

    fn healthy_snapshot() -> StatusSnapshot {
        let mut snapshot = StatusSnapshot::new("pihole-a");
        snapshot.battery_percent = Reading::Value(87.0);
        snapshot.online = true;
        snapshot.disk_free_bytes = Reading::Value(12 * 1024 * 1024 * 1024);
        snapshot.local.address = Reading::Value("192.168.1.10".into());
        snapshot.local.filter.blocking = Reading::Value(BlockingState::Enabled);
        snapshot.local.filter.blocked_percent = Reading::Value(12.3);
        snapshot.local.vitals.uptime_seconds = Reading::Value(3 * 86_400 + 4 * 3600);
        snapshot.local.vitals.cpu_celsius = Reading::Value(48.2);
        snapshot
    }

    #[test]
    fn test_header_has_ink() {
        let frame = render_dashboard(&healthy_snapshot(), &options());
        assert_eq!(frame.clipped_pixels(), 0);
        let header = Rectangle::new(Point::zero(), Size::new(crate::PANEL_WIDTH, 18));
        assert!(frame.ink_in(&header) > 0);
    }

    #[test]
    fn test_no_alert_bar_when_healthy() {
        let frame = render_dashboard(&healthy_snapshot(), &options());
        let bar = Rectangle::new(
            Point::new(0, (crate::PANEL_HEIGHT - alert_bar_height()) as i32),
            Size::new(crate::PANEL_WIDTH, alert_bar_height()),
        );
        // The footer may reach into the band, but it must not be a solid bar.
        assert!(frame.ink_in(&bar) < (bar.size.width * bar.size.height / 2) as usize);
    }

    #[test]
    fn test_alert_bar_when_filter_down() {
        let mut snapshot = healthy_snapshot();
        snapshot.local.filter.blocking = Reading::Value(BlockingState::Disabled);
        let frame = render_dashboard(&snapshot, &options());
        let bar = Rectangle::new(
            Point::new(0, (crate::PANEL_HEIGHT - alert_bar_height()) as i32),
            Size::new(crate::PANEL_WIDTH, alert_bar_height()),
        );
        assert!(frame.ink_in(&bar) > (bar.size.width * bar.size.height / 2) as usize);
        assert_eq!(frame.clipped_pixels(), 0);
    }

    #[test]
    fn test_every_alert_gets_drawn() {
        let mut snapshot = healthy_snapshot();
        snapshot.battery_percent = Reading::Value(12.0);
        snapshot.online = false;
        let mut remote = DeviceStatus::unavailable("backup.lan");
        remote.filter.blocking = Reading::Value(BlockingState::Disabled);
        snapshot.remote = Some(remote);

        let options = options();
        let bars = alert_bars(&snapshot, &options);
        let drawn: Vec<&str> = bars.iter().map(|(_, line)| line.as_str()).collect();
        assert_eq!(drawn, vec!["LOW BATTERY 12% | DNS OFF: backup.lan", "OFFLINE"]);

        let text_width = crate::PANEL_WIDTH - 2 * ALERT_PADDING;
        for alert in snapshot.alerts(options.low_battery_threshold) {
            let message = alert.to_string();
            assert!(
                bars.iter().any(|(_, line)| line.contains(&message)),
                "{message} missing"
            );
        }
        for (_, line) in &bars {
            assert!(line.chars().count() as u32 * char_advance(BODY_FONT) <= text_width);
        }

        // Stacked flush against the bottom edge, each one solid.
        let frame = render_dashboard(&snapshot, &options);
        assert_eq!(frame.clipped_pixels(), 0);
        let (last, _) = bars.last().unwrap();
        assert_eq!(last.top_left.y + last.size.height as i32, crate::PANEL_HEIGHT as i32);
        for (area, _) in &bars {
            assert!(frame.ink_in(area) > (area.size.width * area.size.height / 2) as usize);
        }
    }

    #[test]
    fn test_battery_level_changes_gauge() {
        let gauge = Rectangle::new(
            Point::new((crate::PANEL_WIDTH - 40) as i32, 0),
            Size::new(40, 20),
        );
        let mut low = healthy_snapshot();
        low.battery_percent = Reading::Value(5.0);
        let low_frame = render_dashboard(&low, &options());
        let high_frame = render_dashboard(&healthy_snapshot(), &options());
        assert!(high_frame.ink_in(&gauge) > low_frame.ink_in(&gauge));
    }

    #[test]
    fn test_single_device_uses_full_width() {
        let frame = render_dashboard(&healthy_snapshot(), &options());
        let right_half = Rectangle::new(
            Point::new((crate::PANEL_WIDTH / 2) as i32, 30),
            Size::new(crate::PANEL_WIDTH / 2, 50),
        );
        // Only one column: nothing but paper right of the short metric rows.
        assert_eq!(frame.ink_in(&right_half), 0);
    }
}
