use std::collections::{BTreeMap, BTreeSet};

use rgb::RGBA8;

use crate::error::QuantizeError;
use crate::histogram::{Combo, WeightedPoint};
use crate::kmeans::Clustering;
use crate::tlut::PaletteFormat;

/// The palette shared by every image in a set, in canonical order, together
/// with the index of every combo seen in the input.
#[derive(Debug, Clone)]
pub struct SharedPalette {
    /// Centers in canonical order; position is the palette index.
    entries: Vec<Combo>,
    /// Every distinct input combo mapped to its palette index.
    index_of: BTreeMap<Combo, u8>,
}

impl SharedPalette {
    /// Order the centers `clustering` actually uses and index every point.
    ///
    /// `points` must be the slice `clustering` was computed from. Fails if more
    /// than 256 distinct centers are in use.
    pub fn from_clustering(
        points: &[WeightedPoint],
        clustering: &Clustering,
    ) -> Result<Self, QuantizeError> {
        let used: BTreeSet<usize> = clustering.assignments.iter().copied().collect();
        let entries = canonical_order(used.into_iter().map(|c| &clustering.centers[c]));

        let position = entries
            .iter()
            .enumerate()
            .map(|(i, center)| {
                u8::try_from(i)
                    .map(|index| (center, index))
                    .map_err(|_| QuantizeError::TooManyCenters(entries.len()))
            })
            .collect::<Result<BTreeMap<&Combo, u8>, _>>()?;

        let index_of = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.combo.clone(), position[clustering.center_of(i)]))
            .collect();

        Ok(Self { entries, index_of })
    }

    /// Palette entries (one combo per index).
    pub fn entries(&self) -> &[Combo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Palette index of a combo seen in the input.
    pub fn index_of(&self, combo: &Combo) -> Option<u8> {
        self.index_of.get(combo).copied()
    }

    /// Palette index of every combo in `combos`, in order.
    ///
    /// Every combo must have been among the points the palette was built from.
    pub fn map_indices(&self, combos: &[Combo]) -> Vec<u8> {
        combos
            .iter()
            .map(|c| {
                let index = self.index_of(c);
                debug_assert!(index.is_some(), "combo {c:?} is missing from the palette");
                index.unwrap_or(0)
            })
            .collect()
    }

    /// The palette as seen by image `image`: that image's color from each entry.
    pub fn image_colors(&self, image: usize) -> impl Iterator<Item = RGBA8> + '_ {
        self.entries.iter().map(move |c| c.color(image))
    }

    /// Image `image`'s palette encoded as a TLUT blob.
    pub fn encode(&self, image: usize, format: PaletteFormat) -> Vec<u8> {
        format.encode_palette(self.image_colors(image))
    }
}

/// Deduplicate centers and sort them into the canonical palette order.
///
/// Flatter combos (fewer distinct colors) come first, then lower total alpha,
/// then lower total RGB. Remaining ties fall back to byte order, so the result
/// depends only on the set of centers, not on the order they arrive in.
pub fn canonical_order<'a>(centers: impl IntoIterator<Item = &'a Combo>) -> Vec<Combo> {
    let mut entries: Vec<Combo> = centers.into_iter().cloned().collect();
    entries.sort_by_cached_key(|c| (c.distinct_colors(), c.alpha_sum(), c.rgb_sum(), c.clone()));
    entries.dedup();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo(colors: &[[u8; 4]]) -> Combo {
        Combo::new(
            colors
                .iter()
                .map(|c| RGBA8::new(c[0], c[1], c[2], c[3]))
                .collect(),
        )
    }

    #[test]
    fn flat_combos_sort_first() {
        let mixed = combo(&[[0, 0, 0, 0], [1, 1, 1, 1]]);
        let flat = combo(&[[200, 200, 200, 255], [200, 200, 200, 255]]);
        assert_eq!(canonical_order([&mixed, &flat]), vec![flat, mixed]);
    }

    #[test]
    fn alpha_then_rgb_break_ties() {
        let opaque_dark = combo(&[[0, 0, 0, 255]]);
        let clear_bright = combo(&[[255, 255, 255, 0]]);
        let opaque_bright = combo(&[[255, 255, 255, 255]]);
        assert_eq!(
            canonical_order([&opaque_bright, &opaque_dark, &clear_bright]),
            vec![clear_bright, opaque_dark, opaque_bright]
        );
    }

    #[test]
    fn byte_order_is_the_last_tie_break() {
        let a = combo(&[[0, 0, 30, 255]]);
        let b = combo(&[[0, 30, 0, 255]]);
        let c = combo(&[[30, 0, 0, 255]]);
        assert_eq!(canonical_order([&c, &a, &b]), vec![a, b, c]);
    }

    #[test]
    fn order_ignores_discovery_order_and_duplicates() {
        let centers: Vec<Combo> = (0..10u8)
            .map(|i| combo(&[[i * 20, 255 - i * 20, i, 255], [i, i, i, i * 10]]))
            .collect();
        let mut shuffled: Vec<&Combo> = centers.iter().rev().collect();
        shuffled.extend(centers.iter().step_by(3));
        assert_eq!(canonical_order(&centers), canonical_order(shuffled));
        assert_eq!(canonical_order(&centers).len(), 10);
    }

    #[test]
    fn maps_points_through_their_centers() {
        let points = vec![
            WeightedPoint { combo: combo(&[[255, 255, 255, 255]]), count: 1 },
            WeightedPoint { combo: combo(&[[0, 0, 0, 255]]), count: 1 },
            WeightedPoint { combo: combo(&[[4, 4, 4, 255]]), count: 1 },
        ];
        let clustering = Clustering {
            centers: vec![combo(&[[255, 255, 255, 255]]), combo(&[[2, 2, 2, 255]])],
            assignments: vec![0, 1, 1],
            iterations: 1,
        };
        let palette = SharedPalette::from_clustering(&points, &clustering).unwrap();

        assert_eq!(palette.len(), 2);
        assert_eq!(palette.entries()[0], combo(&[[2, 2, 2, 255]]));
        assert_eq!(palette.index_of(&points[0].combo), Some(1));
        assert_eq!(palette.index_of(&points[1].combo), Some(0));
        assert_eq!(palette.index_of(&points[2].combo), Some(0));
        assert_eq!(palette.index_of(&combo(&[[9, 9, 9, 9]])), None);
    }

    #[test]
    fn unused_centers_are_left_out() {
        let points = vec![WeightedPoint { combo: combo(&[[1, 2, 3, 4]]), count: 5 }];
        let clustering = Clustering {
            centers: vec![combo(&[[9, 9, 9, 9]]), combo(&[[1, 2, 3, 4]])],
            assignments: vec![1],
            iterations: 1,
        };
        let palette = SharedPalette::from_clustering(&points, &clustering).unwrap();
        assert_eq!(palette.entries(), &[combo(&[[1, 2, 3, 4]])]);
    }

    #[test]
    fn more_than_256_centers_is_an_error() {
        let points: Vec<WeightedPoint> = (0..300u32)
            .map(|i| WeightedPoint {
                combo: combo(&[[i as u8, (i >> 8) as u8, 0, 255]]),
                count: 1,
            })
            .collect();
        let clustering = Clustering {
            centers: points.iter().map(|p| p.combo.clone()).collect(),
            assignments: (0..300).collect(),
            iterations: 1,
        };
        let err = SharedPalette::from_clustering(&points, &clustering).unwrap_err();
        assert_eq!(err, QuantizeError::TooManyCenters(300));
    }

    #[test]
    fn exactly_256_centers_fit() {
        let points: Vec<WeightedPoint> = (0..256u32)
            .map(|i| WeightedPoint {
                combo: combo(&[[i as u8, 0, 0, 255]]),
                count: 1,
            })
            .collect();
        let clustering = Clustering {
            centers: points.iter().map(|p| p.combo.clone()).collect(),
            assignments: (0..256).collect(),
            iterations: 1,
        };
        let palette = SharedPalette::from_clustering(&points, &clustering).unwrap();
        assert_eq!(palette.len(), 256);
        assert_eq!(palette.index_of(&points[255].combo), Some(255));
    }

    #[test]
    fn map_indices_follows_input_order() {
        let points = vec![
            WeightedPoint { combo: combo(&[[0, 0, 0, 255]]), count: 2 },
            WeightedPoint { combo: combo(&[[255, 255, 255, 255]]), count: 1 },
        ];
        let clustering = Clustering {
            centers: points.iter().map(|p| p.combo.clone()).collect(),
            assignments: vec![0, 1],
            iterations: 1,
        };
        let palette = SharedPalette::from_clustering(&points, &clustering).unwrap();
        let pixels = [
            points[1].combo.clone(),
            points[0].combo.clone(),
            points[1].combo.clone(),
        ];
        assert_eq!(palette.map_indices(&pixels), vec![1, 0, 1]);
    }
}
