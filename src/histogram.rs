use std::cmp::Ordering;
use std::collections::BTreeMap;

use rgb::RGBA8;

use crate::TextureSource;

/// The colors found at one pixel position across every source image, in
/// image order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combo(Vec<RGBA8>);

impl Combo {
    pub fn new(colors: Vec<RGBA8>) -> Self {
        Self(colors)
    }

    pub fn colors(&self) -> &[RGBA8] {
        &self.0
    }

    /// Number of images this combo spans.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Color contributed by image `image`.
    pub fn color(&self, image: usize) -> RGBA8 {
        self.0[image]
    }

    /// How many different colors appear within this combo.
    pub fn distinct_colors(&self) -> usize {
        let mut seen: Vec<[u8; 4]> = self.0.iter().map(|c| channels(*c)).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    pub fn alpha_sum(&self) -> u32 {
        self.0.iter().map(|c| c.a as u32).sum()
    }

    pub fn rgb_sum(&self) -> u32 {
        self.0
            .iter()
            .map(|c| c.r as u32 + c.g as u32 + c.b as u32)
            .sum()
    }
}

/// Byte-lexicographic over `(r, g, b, a)` of each color in turn.
impl Ord for Combo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .map(|c| channels(*c))
            .cmp(other.0.iter().map(|c| channels(*c)))
    }
}

impl PartialOrd for Combo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[inline]
pub(crate) fn channels(c: RGBA8) -> [u8; 4] {
    [c.r, c.g, c.b, c.a]
}

/// A distinct combo and the number of pixel positions that share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedPoint {
    pub combo: Combo,
    pub count: u32,
}

/// Gather one combo per pixel position, row-major.
///
/// All sources must share the dimensions of the first one; callers validate
/// this before collecting.
pub fn collect_combos<S: TextureSource>(images: &[S]) -> Vec<Combo> {
    let Some(first) = images.first() else {
        return Vec::new();
    };
    let (width, height) = (first.width(), first.height());

    let mut combos = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            combos.push(Combo::new(
                images.iter().map(|img| img.pixel(x, y)).collect(),
            ));
        }
    }
    combos
}

/// Collapse equal combos into weighted points, in ascending combo order.
///
/// The result does not depend on the order of `combos`, and the counts sum to
/// `combos.len()`.
pub fn group_combos<'a>(combos: impl IntoIterator<Item = &'a Combo>) -> Vec<WeightedPoint> {
    let mut buckets: BTreeMap<&Combo, u32> = BTreeMap::new();

    for combo in combos {
        *buckets.entry(combo).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|(combo, count)| WeightedPoint {
            combo: combo.clone(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo(colors: &[(u8, u8, u8, u8)]) -> Combo {
        Combo::new(
            colors
                .iter()
                .map(|&(r, g, b, a)| RGBA8::new(r, g, b, a))
                .collect(),
        )
    }

    #[test]
    fn grouping_conserves_weight() {
        let a = combo(&[(1, 2, 3, 4)]);
        let b = combo(&[(5, 6, 7, 8)]);
        let combos = vec![a.clone(), b.clone(), a.clone(), a.clone()];
        let points = group_combos(&combos);

        assert_eq!(points.len(), 2);
        assert_eq!(points.iter().map(|p| p.count).sum::<u32>(), 4);
        assert_eq!(points[0], WeightedPoint { combo: a, count: 3 });
        assert_eq!(points[1], WeightedPoint { combo: b, count: 1 });
    }

    #[test]
    fn grouping_ignores_input_order() {
        let combos: Vec<Combo> = (0..20u8)
            .map(|i| combo(&[(i % 3, 0, 0, 255), (0, i % 2, 0, 255)]))
            .collect();
        let mut reversed = combos.clone();
        reversed.reverse();
        assert_eq!(group_combos(&combos), group_combos(&reversed));
    }

    #[test]
    fn ordering_is_channel_lexicographic() {
        let low = combo(&[(0, 0, 0, 255), (9, 9, 9, 9)]);
        let high = combo(&[(0, 0, 1, 0), (0, 0, 0, 0)]);
        assert!(low < high);
    }

    #[test]
    fn distinct_colors_counts_unique_entries() {
        let flat = combo(&[(1, 1, 1, 1), (1, 1, 1, 1), (1, 1, 1, 1)]);
        let mixed = combo(&[(1, 1, 1, 1), (2, 2, 2, 2), (1, 1, 1, 1)]);
        assert_eq!(flat.distinct_colors(), 1);
        assert_eq!(mixed.distinct_colors(), 2);
        assert_eq!(mixed.alpha_sum(), 4);
        assert_eq!(mixed.rgb_sum(), 12);
    }
}
