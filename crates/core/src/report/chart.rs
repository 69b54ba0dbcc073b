//! Bar chart of total occurrences per violation class.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::shared::draw;
use crate::violations::aggregate::AggregatedEvent;
use crate::violations::class::ViolationClass;

const CHART_WIDTH: u32 = 640;
const CHART_HEIGHT: u32 = 480;
const MARGIN: u32 = 48;
const TEXT_SCALE: u32 = 2;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS_COLOR: [u8; 3] = [0, 0, 0];

/// Render the chart, one bar per class present, in class display order.
/// Returns `None` when there is nothing to chart.
pub fn render(events: &[AggregatedEvent]) -> Option<RgbImage> {
    if events.is_empty() {
        return None;
    }

    let mut totals: Vec<(ViolationClass, usize)> = Vec::new();
    for class in ViolationClass::ALL {
        let total: usize = events
            .iter()
            .filter(|e| e.class == class)
            .map(|e| e.count)
            .sum();
        if total > 0 {
            totals.push((class, total));
        }
    }
    let max_count = totals.iter().map(|&(_, total)| total).max()?;

    let mut image = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);

    let axis_y = (CHART_HEIGHT - MARGIN) as f32;
    draw_line_segment_mut(
        &mut image,
        (MARGIN as f32, MARGIN as f32),
        (MARGIN as f32, axis_y),
        Rgb(AXIS_COLOR),
    );
    draw_line_segment_mut(
        &mut image,
        (MARGIN as f32, axis_y),
        ((CHART_WIDTH - MARGIN) as f32, axis_y),
        Rgb(AXIS_COLOR),
    );

    // y-axis scale marker at the top of the plot area
    draw::draw_text(
        &mut image,
        &max_count.to_string(),
        4,
        MARGIN as i32 - 3,
        1,
        AXIS_COLOR,
    );

    let plot_w = CHART_WIDTH - 2 * MARGIN;
    let plot_h = CHART_HEIGHT - 2 * MARGIN;
    let slot = plot_w / totals.len() as u32;
    let bar_w = (slot * 3 / 5).max(1);

    for (i, &(class, total)) in totals.iter().enumerate() {
        let bar_h = ((plot_h as f64) * (total as f64) / (max_count as f64)).round() as u32;
        let bar_h = bar_h.max(1);
        let x0 = MARGIN + i as u32 * slot + (slot - bar_w) / 2;
        let y0 = CHART_HEIGHT - MARGIN - bar_h;

        draw_filled_rect_mut(
            &mut image,
            Rect::at(x0 as i32, y0 as i32).of_size(bar_w, bar_h),
            Rgb(class.color()),
        );

        // count caption above the bar
        let caption = total.to_string();
        let caption_x =
            (x0 + bar_w / 2) as i32 - (draw::text_width(&caption, TEXT_SCALE) / 2) as i32;
        let caption_y = y0 as i32 - draw::text_height(TEXT_SCALE) as i32 - 4;
        draw::draw_text(
            &mut image,
            &caption,
            caption_x,
            caption_y,
            TEXT_SCALE,
            AXIS_COLOR,
        );

        // class name under the axis
        let label = class.name();
        let label_x = (x0 + bar_w / 2) as i32 - (draw::text_width(label, TEXT_SCALE) / 2) as i32;
        let label_y = (CHART_HEIGHT - MARGIN) as i32 + 8;
        draw::draw_text(&mut image, label, label_x, label_y, TEXT_SCALE, AXIS_COLOR);
    }

    Some(image)
}
