// Copyright (c) 2026 rezky_nightky

use crate::grid::{Grid, LayerKind};

/// Finds the cell under `(x, y)`, art before trail. A position inside the
/// art rect never reaches the trail.
pub fn route(art: Option<&Grid>, trail: Option<&Grid>, x: i32, y: i32) -> Option<(LayerKind, usize)> {
    let layers = [(LayerKind::Art, art), (LayerKind::Trail, trail)];
    layers
        .into_iter()
        .find_map(|(kind, grid)| grid.and_then(|g| g.locate(x, y)).map(|i| (kind, i)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rect;

    fn trail() -> Grid {
        Grid::blank(10, 10, 6, Rect::new(0, 0, 60, 60), 12, 1)
    }

    fn art() -> Grid {
        Grid::blank(4, 4, 6, Rect::new(18, 18, 24, 24), 12, 2)
    }

    #[test]
    fn art_wins_where_both_cover() {
        let (a, t) = (art(), trail());
        assert_eq!(route(Some(&a), Some(&t), 18, 18), Some((LayerKind::Art, 0)));
        assert_eq!(route(Some(&a), Some(&t), 41, 41), Some((LayerKind::Art, 15)));
    }

    #[test]
    fn trail_catches_the_rest() {
        let (a, t) = (art(), trail());
        assert_eq!(route(Some(&a), Some(&t), 17, 18), Some((LayerKind::Trail, 3 * 10 + 2)));
        assert_eq!(route(Some(&a), Some(&t), 59, 0), Some((LayerKind::Trail, 9)));
    }

    #[test]
    fn nothing_mounted_or_outside_is_no_hit() {
        assert_eq!(route(None, None, 5, 5), None);
        let t = trail();
        assert_eq!(route(None, Some(&t), 60, 5), None);
        let a = art();
        assert_eq!(route(Some(&a), None, 5, 5), None);
    }
}
