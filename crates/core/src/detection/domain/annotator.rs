use super::violation_detector::Detection;
use crate::shared::draw;
use crate::shared::frame::Frame;

const BOX_THICKNESS: u32 = 2;
const LABEL_SCALE: u32 = 2;
const LABEL_TEXT: [u8; 3] = [0, 0, 0];

/// Draws each detection's box and a `class confidence` caption onto the
/// frame, in the class display color.
pub fn annotate(frame: &mut Frame, detections: &[Detection]) {
    if detections.is_empty() {
        return;
    }
    let Some(mut canvas) = draw::frame_canvas(frame) else {
        return;
    };
    for detection in detections {
        let color = detection.class.color();
        draw::draw_box(&mut canvas, &detection.bbox, color, BOX_THICKNESS);

        let caption = format!("{} {:.2}", detection.class.name(), detection.confidence);
        let label_y = detection.bbox.y1 - draw::text_height(LABEL_SCALE) as i32 - 4;
        draw::draw_label(
            &mut canvas,
            &caption,
            detection.bbox.x1,
            label_y,
            LABEL_SCALE,
            LABEL_TEXT,
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bbox::BBox;
    use crate::violations::class::ViolationClass;
    use std::time::Duration;

    fn frame(width: u32, height: u32) -> Frame {
        Frame::new(
            vec![0u8; (width * height * 3) as usize],
            width,
            height,
            3,
            0,
            Duration::ZERO,
        )
    }

    fn detection(class: ViolationClass, bbox: BBox) -> Detection {
        Detection {
            class,
            confidence: 0.87,
            bbox,
        }
    }

    #[test]
    fn test_no_detections_leaves_frame_untouched() {
        let mut f = frame(32, 32);
        let before = f.data().to_vec();
        annotate(&mut f, &[]);
        assert_eq!(f.data(), &before[..]);
    }

    #[test]
    fn test_box_drawn_in_class_color() {
        let mut f = frame(120, 120);
        annotate(
            &mut f,
            &[detection(ViolationClass::Phone, BBox::new(30, 60, 90, 110))],
        );
        // top-left corner of the outline
        let offset = (60 * 120 + 30) * 3;
        assert_eq!(
            &f.data()[offset..offset + 3],
            &ViolationClass::Phone.color()
        );
    }

    #[test]
    fn test_label_clamps_for_box_at_top_edge() {
        let mut f = frame(120, 120);
        annotate(
            &mut f,
            &[detection(ViolationClass::Sleeping, BBox::new(10, 0, 60, 40))],
        );
        // label background lands inside the frame instead of above it
        let offset = 10 * 3;
        assert_eq!(
            &f.data()[offset..offset + 3],
            &ViolationClass::Sleeping.color()
        );
    }

    #[test]
    fn test_dimensions_unchanged() {
        let mut f = frame(64, 48);
        annotate(
            &mut f,
            &[detection(ViolationClass::Bottle, BBox::new(5, 20, 40, 45))],
        );
        assert_eq!(f.width(), 64);
        assert_eq!(f.height(), 48);
        assert_eq!(f.data().len(), 64 * 48 * 3);
    }
}
