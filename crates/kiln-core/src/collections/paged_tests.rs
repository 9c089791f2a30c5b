use crate::arena::LinearArena;
use crate::collections::PagedList;

#[test]
fn iteration_preserves_insertion_order_across_pages() {
    let arena = LinearArena::with_capacity(1 << 20, 8192).unwrap();
    let mut list: PagedList<u32> = PagedList::new(&arena, 4);
    for i in 0..11 {
        assert!(list.push(i));
    }
    assert_eq!(list.len(), 11);
    let collected: Vec<u32> = list.iter().copied().collect();
    assert_eq!(collected, (0..11).collect::<Vec<u32>>());
}

#[test]
fn empty_list_iterates_nothing() {
    let arena = LinearArena::with_capacity(1 << 20, 8192).unwrap();
    let list: PagedList<u64> = PagedList::new(&arena, 8);
    assert!(list.is_empty());
    assert_eq!(list.iter().count(), 0);
}

#[test]
fn exactly_one_page() {
    let arena = LinearArena::with_capacity(1 << 20, 8192).unwrap();
    let mut list: PagedList<u8> = PagedList::new(&arena, 3);
    list.push(1);
    list.push(2);
    list.push(3);
    let collected: Vec<u8> = list.iter().copied().collect();
    assert_eq!(collected, vec![1, 2, 3]);
}

#[test]
fn arena_exhaustion_reports_failure() {
    let arena = LinearArena::with_capacity(4096, 8192).unwrap();
    let mut list: PagedList<u64> = PagedList::new(&arena, 64);
    let mut pushed = 0usize;
    while list.push(0) {
        pushed += 1;
        assert!(pushed < 10_000, "runaway push loop");
    }
    assert!(pushed > 0);
    assert_eq!(list.len(), pushed);
}
