// Detector output -> pixel landmarks, plus the skeleton overlay.
// Visual expectation: every detected hand gets grey bones and red joints drawn
// on the mirrored frame; only the first hand drives brightness.

use crate::draw::{draw_thick_line, fill_circle};
use crate::types::{FrameBuffer, HandObservation, Landmark, NormalizedPoint};

pub const THUMB_TIP: usize = 4;
pub const INDEX_FINGER_TIP: usize = 8;

const BONE_COLOR: u32 = 0x00_E0_E0_E0;
const BONE_THICKNESS: i32 = 2;
const JOINT_COLOR: u32 = 0x00_FF_00_00;
const JOINT_RADIUS: i32 = 2;

/// Bones of the 21-point hand topology: thumb, four fingers, palm edges.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (17, 18), (18, 19), (19, 20),
    (0, 17),
];

/// Scale a normalized point to pixels, truncating toward zero. No clamping.
#[inline]
pub fn to_pixel(p: NormalizedPoint, width: usize, height: usize) -> (i32, i32) {
    ((p.x * width as f32) as i32, (p.y * height as f32) as i32)
}

/// Pixel landmarks for one hand, ids in topology order.
pub fn hand_to_landmarks(hand: &HandObservation, width: usize, height: usize) -> Vec<Landmark> {
    hand.landmarks
        .iter()
        .enumerate()
        .map(|(id, &p)| {
            let (x, y) = to_pixel(p, width, height);
            Landmark { id, x, y }
        })
        .collect()
}

/// Draw bones then joints for one hand.
pub fn draw_hand(fb: &mut FrameBuffer, hand: &HandObservation) {
    let (w, h) = (fb.width, fb.height);
    for &(a, b) in HAND_CONNECTIONS.iter() {
        let (x0, y0) = to_pixel(hand.landmarks[a], w, h);
        let (x1, y1) = to_pixel(hand.landmarks[b], w, h);
        draw_thick_line(fb, x0, y0, x1, y1, BONE_THICKNESS, BONE_COLOR);
    }
    for &p in hand.landmarks.iter() {
        let (x, y) = to_pixel(p, w, h);
        fill_circle(fb, x, y, JOINT_RADIUS, JOINT_COLOR);
    }
}

/// Overlay every hand and return the landmarks of the first one.
///
/// "First" is index 0 of the detector's result: an arbitrary but deterministic
/// choice, not the closest or most confident hand. No hands gives an empty list.
pub fn extract_landmarks(fb: &mut FrameBuffer, hands: &[HandObservation]) -> Vec<Landmark> {
    for hand in hands {
        draw_hand(fb, hand);
    }
    hands
        .first()
        .map(|hand| hand_to_landmarks(hand, fb.width, fb.height))
        .unwrap_or_default()
}

/// Thumb tip and index fingertip, if both ids are present.
pub fn fingertips(landmarks: &[Landmark]) -> Option<(Landmark, Landmark)> {
    let find = |id| landmarks.iter().find(|l| l.id == id).copied();
    Some((find(THUMB_TIP)?, find(INDEX_FINGER_TIP)?))
}
