use crate::collections::CheckedArray;

#[test]
fn get_and_index() {
    let data = [10, 20, 30];
    let view = CheckedArray::new(&data);
    assert_eq!(view.len(), 3);
    assert_eq!(*view.get(0), 10);
    assert_eq!(view[2], 30);
    assert_eq!(view.first(), Some(&10));
    assert_eq!(view.last(), Some(&30));
}

#[test]
#[should_panic(expected = "index 3 out of bounds")]
fn out_of_bounds_panics() {
    let data = [1, 2, 3];
    let view = CheckedArray::new(&data);
    view.get(3);
}

#[test]
fn sub_slicing() {
    let data = [0, 1, 2, 3, 4];
    let view = CheckedArray::new(&data);
    let mid = view.slice(1, 4);
    assert_eq!(mid.as_slice(), &[1, 2, 3]);
    let empty = mid.slice(3, 3);
    assert!(empty.is_empty());
}

#[test]
#[should_panic(expected = "slice 2..6 out of bounds")]
fn bad_slice_panics() {
    let data = [0, 1, 2];
    CheckedArray::new(&data).slice(2, 6);
}

#[test]
fn iteration_order() {
    let data = ['a', 'b', 'c'];
    let view = CheckedArray::new(&data);
    let collected: Vec<char> = view.iter().copied().collect();
    assert_eq!(collected, vec!['a', 'b', 'c']);
}
