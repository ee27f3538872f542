use livevideo::*;

#[test]
fn test_allocator_starts_at_zero_and_increases() {
    let mut ids = ObjectIdAllocator::new();
    let issued: Vec<u32> = (0..5).map(|_| ids.next().unwrap().as_raw()).collect();
    assert_eq!(issued, vec![0, 1, 2, 3, 4]);
    assert_eq!(ids.issued(), 5);
}

#[test]
fn test_host_conversion() {
    assert_eq!(ObjectId::from_raw(-1), None);
    assert_eq!(ObjectId::from_raw(i32::MIN), None);

    let id = ObjectId::from_raw(42).unwrap();
    assert_eq!(id.as_raw(), 42);
    assert_eq!(id.as_host(), 42);
    assert_eq!(id.to_string(), "#42");
}
