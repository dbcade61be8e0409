use crate::model::game_state::HexCoord;

/// At most one selected hex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<HexCoord>,
}

impl Selection {
    pub fn selected(&self) -> Option<HexCoord> {
        self.selected
    }

    pub fn is_selected(&self, coord: HexCoord) -> bool {
        self.selected == Some(coord)
    }

    /// Selects `coord` if it resolves to a rendered cell, otherwise clears.
    pub fn select(&mut self, coord: HexCoord, resolves: impl Fn(HexCoord) -> bool) {
        self.selected = resolves(coord).then_some(coord);
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Drops a selection whose cell is no longer rendered.
    pub fn reconcile(&mut self, resolves: impl Fn(HexCoord) -> bool) {
        if let Some(coord) = self.selected {
            if !resolves(coord) {
                self.selected = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_a_second_hex_replaces_the_first() {
        let mut selection = Selection::default();
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(1, -1);

        selection.select(a, |_| true);
        selection.select(b, |_| true);

        assert_eq!(selection.selected(), Some(b));
        assert!(!selection.is_selected(a));
    }

    #[test]
    fn unresolvable_hex_clears_selection() {
        let mut selection = Selection::default();
        selection.select(HexCoord::new(0, 0), |_| true);
        selection.select(HexCoord::new(9, 9), |_| false);
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn reconcile_drops_vanished_cell() {
        let mut selection = Selection::default();
        let kept = HexCoord::new(2, 2);
        selection.select(kept, |_| true);

        selection.reconcile(|c| c == kept);
        assert_eq!(selection.selected(), Some(kept));

        selection.reconcile(|_| false);
        assert_eq!(selection.selected(), None);
    }
}
