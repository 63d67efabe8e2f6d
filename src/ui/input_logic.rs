/// Move selection cursor one item down, wrapping to the first item.
pub fn cycle_next(selected: usize, item_count: usize) -> usize {
    if item_count == 0 {
        return 0;
    }
    (selected + 1) % item_count
}
