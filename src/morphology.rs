//! Binary morphology on row-major boolean masks.
//!
//! Pixels outside the image are treated as background (`false`) by both
//! erosion and dilation, so foreground touching the border erodes inwards.

/// Neighborhood shape used by erosion and dilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StructuringElement {
    /// 3x3 cross (4-connected): the pixel and its horizontal/vertical neighbors.
    #[default]
    Cross,
    /// 3x3 square (8-connected).
    Square,
}

const CROSS: [(isize, isize); 5] = [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)];

const SQUARE: [(isize, isize); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl StructuringElement {
    /// `(dx, dy)` offsets covered by the element, origin included.
    #[must_use]
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Cross => &CROSS,
            Self::Square => &SQUARE,
        }
    }
}

/// Look up `(x + dx, y + dy)`, returning `false` outside the image.
#[inline]
fn neighbor(
    mask: &[bool],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    d: (isize, isize),
) -> bool {
    match (x.checked_add_signed(d.0), y.checked_add_signed(d.1)) {
        (Some(nx), Some(ny)) if nx < width && ny < height => mask[ny * width + nx],
        _ => false,
    }
}

/// Binary erosion: a pixel stays set only if every pixel under the element is set.
#[must_use]
pub fn erode(
    mask: &[bool],
    width: usize,
    height: usize,
    element: StructuringElement,
) -> Vec<bool> {
    debug_assert_eq!(mask.len(), width * height);
    let offsets = element.offsets();
    let mut result = vec![false; mask.len()];

    for y in 0..height {
        for x in 0..width {
            result[y * width + x] = offsets
                .iter()
                .all(|&d| neighbor(mask, width, height, x, y, d));
        }
    }

    result
}

/// Binary dilation: a pixel becomes set if any pixel under the element is set.
#[must_use]
pub fn dilate(
    mask: &[bool],
    width: usize,
    height: usize,
    element: StructuringElement,
) -> Vec<bool> {
    debug_assert_eq!(mask.len(), width * height);
    let offsets = element.offsets();
    let mut result = vec![false; mask.len()];

    for y in 0..height {
        for x in 0..width {
            result[y * width + x] = offsets
                .iter()
                .any(|&d| neighbor(mask, width, height, x, y, d));
        }
    }

    result
}

/// Morphological opening: `iterations` erosions followed by `iterations` dilations.
///
/// Removes foreground specks smaller than the eroded footprint while keeping
/// large regions. Zero iterations returns the mask unchanged.
#[must_use]
pub fn binary_opening(
    mask: &[bool],
    width: usize,
    height: usize,
    element: StructuringElement,
    iterations: u32,
) -> Vec<bool> {
    let mut current = mask.to_vec();
    for _ in 0..iterations {
        current = erode(&current, width, height, element);
    }
    for _ in 0..iterations {
        current = dilate(&current, width, height, element);
    }
    current
}
